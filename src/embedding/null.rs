//! Null embedding provider: deterministic fixed vectors, used as a safe
//! default when no provider is configured and in tests.

use crate::domain::error::Result;
use crate::domain::ports::EmbeddingProvider;
use async_trait::async_trait;

/// Returns fixed-size vectors filled with a constant value. Never makes a
/// network call.
pub struct NullEmbeddingProvider {
    dimensions: usize,
}

impl NullEmbeddingProvider {
    /// Build a null provider with the given (arbitrary) output dimension.
    pub fn new(dimensions: usize) -> Self {
        Self { dimensions }
    }
}

impl Default for NullEmbeddingProvider {
    fn default() -> Self {
        Self::new(1)
    }
}

#[async_trait]
impl EmbeddingProvider for NullEmbeddingProvider {
    async fn embed(&self, _text: &str) -> Result<Vec<f32>> {
        Ok(vec![0.1; self.dimensions])
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        Ok(texts.iter().map(|_| vec![0.1; self.dimensions]).collect())
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    fn provider_name(&self) -> &str {
        "null"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn embed_batch_preserves_order_and_count() {
        let provider = NullEmbeddingProvider::new(4);
        let out = provider
            .embed_batch(&["a".to_string(), "b".to_string(), "c".to_string()])
            .await
            .unwrap();
        assert_eq!(out.len(), 3);
        assert!(out.iter().all(|v| v.len() == 4));
    }
}
