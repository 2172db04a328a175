//! Little-endian float32 vector <-> blob conversions and cosine similarity
//! (spec.md §4.1 "Vector storage", §8 round-trip property).

/// Serialize a vector as a packed little-endian `f32` blob.
pub fn vector_to_blob(v: &[f32]) -> Vec<u8> {
    let mut out = Vec::with_capacity(v.len() * 4);
    for x in v {
        out.extend_from_slice(&x.to_le_bytes());
    }
    out
}

/// Deserialize a packed little-endian `f32` blob. Returns `None` if the
/// blob length is not a multiple of 4 (treated as corrupt per spec.md §4.1).
pub fn blob_to_vector(blob: &[u8]) -> Option<Vec<f32>> {
    if blob.len() % 4 != 0 {
        return None;
    }
    Some(
        blob.chunks_exact(4)
            .map(|c| f32::from_le_bytes([c[0], c[1], c[2], c[3]]))
            .collect(),
    )
}

/// Cosine similarity between two equal-length vectors.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }
    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let norm_a = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        0.0
    } else {
        dot / (norm_a * norm_b)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trip_is_bit_identical() {
        let v = vec![1.0_f32, -2.5, 0.0, f32::MIN_POSITIVE, 3.75];
        let blob = vector_to_blob(&v);
        let back = blob_to_vector(&blob).unwrap();
        assert_eq!(v, back);
    }

    #[test]
    fn corrupt_blob_length_is_rejected() {
        assert_eq!(blob_to_vector(&[0u8, 1, 2]), None);
    }

    #[test]
    fn cosine_similarity_properties() {
        let v = vec![1.0_f32, 2.0, 3.0];
        let neg: Vec<f32> = v.iter().map(|x| -x).collect();
        let ortho = vec![2.0_f32, -1.0, 0.0];

        assert!((cosine_similarity(&v, &v) - 1.0).abs() < 1e-3);
        assert!((cosine_similarity(&v, &neg) + 1.0).abs() < 1e-3);
        assert!(cosine_similarity(&v, &ortho).abs() < 1e-3);
    }
}
