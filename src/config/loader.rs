//! Layered configuration loading from embedded defaults, an optional user
//! file, and environment variables (spec.md §6 "Configuration (recognized
//! options)").

use crate::domain::error::{Error, Result};
use config::{Config as ConfigBuilder, Environment, FileFormat};
use std::path::Path;
use validator::Validate;

use super::types::Config;

/// Embedded default configuration from `config/default.toml`. The single
/// source of truth for defaults; works from any working directory because
/// it is compiled into the binary.
const DEFAULT_CONFIG_TOML: &str = include_str!("../../config/default.toml");

/// Returns the embedded default config TOML, exposed for tests that verify
/// parsing of the shipped defaults.
pub fn default_config_toml() -> &'static str {
    DEFAULT_CONFIG_TOML
}

/// Loads [`Config`] from embedded defaults, an optional user file, and
/// environment variables, in ascending priority order.
#[derive(Debug, Clone, Copy, Default)]
pub struct ConfigLoader;

impl ConfigLoader {
    /// Construct a loader.
    pub fn new() -> Self {
        Self
    }

    /// Load configuration from embedded defaults plus a user config file at
    /// `~/.config/bcindex/config.toml` (if present) plus environment
    /// variables (`BCINDEX__SECTION__KEY`), in that priority order.
    pub fn load(&self) -> Result<Config> {
        let mut builder = ConfigBuilder::builder().add_source(config::File::from_str(DEFAULT_CONFIG_TOML, FileFormat::Toml));

        if let Some(dir) = dirs::config_dir() {
            let user_config_path = dir.join("bcindex").join("config.toml");
            if user_config_path.exists() {
                builder = builder.add_source(config::File::from(user_config_path).required(false));
            }
        }

        self.finish(builder)
    }

    /// Load configuration from embedded defaults, a specific TOML file, and
    /// environment variables, in that priority order.
    pub fn load_with_file(&self, path: &Path) -> Result<Config> {
        let builder = ConfigBuilder::builder()
            .add_source(config::File::from_str(DEFAULT_CONFIG_TOML, FileFormat::Toml))
            .add_source(config::File::from(path.to_path_buf()).required(false));

        self.finish(builder)
    }

    fn finish(&self, builder: config::ConfigBuilder<config::builder::DefaultState>) -> Result<Config> {
        let builder = builder.add_source(Environment::with_prefix("BCINDEX").separator("__").try_parsing(true));

        let raw = builder.build()?;
        let config: Config = raw.try_deserialize().map_err(|e| Error::config(format!("failed to deserialize configuration: {e}")))?;

        config.validate().map_err(|e| Error::config(format!("configuration validation failed: {e}")))?;

        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn embedded_defaults_parse_and_validate() {
        let loader = ConfigLoader::new();
        let config = loader.load().expect("embedded defaults must load without a user config file");
        assert_eq!(config.embedding.provider, "null");
        assert_eq!(config.search.default_top_k, 10);
        assert_eq!(config.evidence.max_packages, 3);
    }

    #[test]
    fn user_file_overrides_embedded_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[search]\ndefault_top_k = 25\n").unwrap();

        let loader = ConfigLoader::new();
        let config = loader.load_with_file(&path).unwrap();
        assert_eq!(config.search.default_top_k, 25);
        assert_eq!(config.embedding.provider, "null", "unrelated sections keep their defaults");
    }

    #[test]
    fn invalid_batch_size_fails_validation() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[embedding]\nbatch_size = 0\n").unwrap();

        let loader = ConfigLoader::new();
        assert!(loader.load_with_file(&path).is_err());
    }
}
