//! # Store
//!
//! A single SQLite file combining relational tables, an FTS5 keyword index,
//! and binary-blob vector storage (spec.md §4.1). Opens/creates the file,
//! installs the schema on first use, and exposes transactional batch writes
//! plus point lookups used by the Indexer, Retriever, and Evidence Builder.

mod queries;
mod schema;
pub mod vector;

pub use queries::{EdgeDirection, SqliteStore};

use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};

/// Compute the on-disk database path for a repository root, per spec.md §6:
/// `<sanitized-repo-name>-<hex-hash-prefix>.db` under `~/.bcindex/data/`.
pub fn default_db_path(repo_root: &Path) -> crate::domain::error::Result<PathBuf> {
    let data_dir = dirs::home_dir()
        .ok_or_else(|| crate::domain::error::Error::config("cannot resolve home directory"))?
        .join(".bcindex")
        .join("data");

    let absolute = std::fs::canonicalize(repo_root).unwrap_or_else(|_| repo_root.to_path_buf());
    let name = absolute
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| "repo".to_string());
    let sanitized = sanitize_name(&name);
    let hash_prefix = sha1_hex_prefix(&absolute.to_string_lossy(), 12);
    Ok(data_dir.join(format!("{sanitized}-{hash_prefix}.db")))
}

/// Replace any character outside `[A-Za-z0-9._-]` with `_`.
fn sanitize_name(name: &str) -> String {
    name.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '.' || c == '_' || c == '-' {
                c
            } else {
                '_'
            }
        })
        .collect()
}

/// First `len` hex digits of SHA-1 of `input`, per spec.md §6's db-filename
/// scheme. SHA-1 is used only as a stable path-naming hash, never for
/// anything security-sensitive.
fn sha1_hex_prefix(input: &str, len: usize) -> String {
    use sha1::{Digest as _, Sha1};
    let mut hasher = Sha1::new();
    hasher.update(input.as_bytes());
    let digest = format!("{:x}", hasher.finalize());
    digest[..len.min(digest.len())].to_string()
}

/// Repository id: stable hash of the absolute root path (spec.md §3 "Repository").
pub fn repo_id(repo_root: &Path) -> String {
    let absolute = std::fs::canonicalize(repo_root).unwrap_or_else(|_| repo_root.to_path_buf());
    let mut hasher = Sha256::new();
    hasher.update(absolute.to_string_lossy().as_bytes());
    format!("{:x}", hasher.finalize())[..16].to_string()
}

/// Sanitize an FTS query string for retry after a parse failure (spec.md
/// §4.1): keep only letters/digits, collapse separators to single spaces.
/// Idempotent by construction.
pub fn sanitize_fts_query(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut last_was_space = true;
    for c in input.chars() {
        if c.is_ascii_alphanumeric() {
            out.push(c);
            last_was_space = false;
        } else if !last_was_space {
            out.push(' ');
            last_was_space = true;
        }
    }
    out.trim_end().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sanitize_is_idempotent_and_restricted() {
        let s = sanitize_fts_query("a\"b: c-d  e");
        assert_eq!(sanitize_fts_query(&s), s);
        assert!(s.chars().all(|c| c.is_ascii_alphanumeric() || c == ' '));
        assert!(!s.contains("  "));
    }

    #[test]
    fn sanitize_empty_input_yields_empty() {
        assert_eq!(sanitize_fts_query(":::"), "");
    }

    #[test]
    fn db_path_is_deterministic_for_same_root() {
        let dir = std::env::temp_dir();
        let a = default_db_path(&dir).unwrap();
        let b = default_db_path(&dir).unwrap();
        assert_eq!(a, b);
    }
}
