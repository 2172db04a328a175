//! # Embedding Service
//!
//! Turns text into fixed-dimension float vectors via an external provider
//! (spec.md §4.2 component table, §6 "Embedding provider contract").

mod http;
mod null;

pub use http::HttpEmbeddingProvider;
pub use null::NullEmbeddingProvider;

use crate::config::EmbeddingConfig;
use crate::domain::error::{Error, Result};
use crate::domain::ports::EmbeddingProvider;
use std::sync::Arc;

/// Dimensions the core accepts from any provider (spec.md §6).
pub const ACCEPTED_DIMENSIONS: &[usize] = &[1024, 1536, 2048, 3072];

/// Construct the configured provider by name (spec.md §9 "Polymorphism
/// across providers": an interface abstraction with concrete variants
/// selected at construction time by the provider-name string).
pub fn build_provider(config: &EmbeddingConfig) -> Result<Arc<dyn EmbeddingProvider>> {
    match config.provider.as_str() {
        "null" => Ok(Arc::new(NullEmbeddingProvider::new(config.dimensions))),
        "http" | "openai" => {
            if !ACCEPTED_DIMENSIONS.contains(&config.dimensions) {
                return Err(Error::config(format!(
                    "embedding.dimensions {} is not one of {:?}",
                    config.dimensions, ACCEPTED_DIMENSIONS
                )));
            }
            let api_key = config
                .api_key
                .clone()
                .ok_or_else(|| Error::config("embedding.api_key is required for provider \"http\""))?;
            let endpoint = config
                .endpoint
                .clone()
                .ok_or_else(|| Error::config("embedding.endpoint is required for provider \"http\""))?;
            Ok(Arc::new(HttpEmbeddingProvider::new(
                api_key,
                endpoint,
                config.model.clone(),
                config.dimensions,
                config.batch_size,
                config.encoding_format.clone(),
            )?))
        }
        other => Err(Error::config(format!("unknown embedding provider \"{other}\""))),
    }
}
