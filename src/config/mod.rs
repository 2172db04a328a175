//! # Configuration
//!
//! Layered TOML + environment-variable configuration (spec.md §6
//! "Configuration (recognized options)"), matching the teacher's
//! `config`-crate-plus-embedded-defaults idiom.

mod loader;
mod types;

pub use loader::{default_config_toml, ConfigLoader};
pub use types::{Config, DatabaseConfig, EmbeddingConfig, EvidenceConfig, IndexerConfig, SearchConfig};
