//! Generic HTTP embedding provider: an OpenAI-style batch contract
//! (`{input: [...]}` -> `{data: [{embedding: [...]}]}`), float or base64
//! encoding (spec.md §6).

use crate::domain::error::{Error, Result};
use crate::domain::ports::EmbeddingProvider;
use async_trait::async_trait;
use base64::Engine as _;
use serde::{Deserialize, Serialize};

/// Calls a remote embedding endpoint over HTTP, chunking requests to
/// `batch_size` texts at a time.
pub struct HttpEmbeddingProvider {
    api_key: String,
    endpoint: String,
    model: String,
    dimensions: usize,
    batch_size: usize,
    encoding_format: String,
    client: reqwest::Client,
}

impl HttpEmbeddingProvider {
    /// Construct a provider. `encoding_format` must be `"float"` or
    /// `"base64"` (spec.md §6).
    pub fn new(
        api_key: String,
        endpoint: String,
        model: String,
        dimensions: usize,
        batch_size: usize,
        encoding_format: String,
    ) -> Result<Self> {
        if encoding_format != "float" && encoding_format != "base64" {
            return Err(Error::config(format!(
                "embedding.encoding_format must be \"float\" or \"base64\", got \"{encoding_format}\""
            )));
        }
        Ok(Self {
            api_key,
            endpoint,
            model,
            dimensions,
            batch_size: batch_size.clamp(1, 100),
            encoding_format,
            client: reqwest::Client::new(),
        })
    }

    async fn embed_chunk(&self, chunk: &[String]) -> Result<Vec<Vec<f32>>> {
        let body = EmbeddingRequest {
            input: chunk.to_vec(),
            model: self.model.clone(),
            encoding_format: self.encoding_format.clone(),
        };

        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            return Err(Error::embedding(format!("provider returned {status}: {text}")));
        }

        let parsed: EmbeddingResponse = response.json().await?;
        parsed
            .data
            .into_iter()
            .map(|d| d.embedding.decode(&self.encoding_format))
            .collect()
    }
}

#[async_trait]
impl EmbeddingProvider for HttpEmbeddingProvider {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let mut out = self.embed_batch(&[text.to_string()]).await?;
        out.pop().ok_or_else(|| Error::embedding("provider returned no embeddings"))
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }
        use futures::stream::{self, StreamExt, TryStreamExt};

        // Sub-chunks of one logical batch are independent HTTP requests;
        // dispatch up to four concurrently and reassemble in input order
        // (spec.md §4.4/§5 "bounded worker pool ... reassembled in input
        // order").
        const MAX_CONCURRENT_REQUESTS: usize = 4;

        let mut indexed: Vec<(usize, Vec<Vec<f32>>)> = stream::iter(texts.chunks(self.batch_size).enumerate())
            .map(|(index, chunk)| async move {
                let vectors = self.embed_chunk(chunk).await?;
                Ok::<_, Error>((index, vectors))
            })
            .buffer_unordered(MAX_CONCURRENT_REQUESTS)
            .try_collect()
            .await?;

        indexed.sort_by_key(|(index, _)| *index);
        Ok(indexed.into_iter().flat_map(|(_, vectors)| vectors).collect())
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    fn provider_name(&self) -> &str {
        "http"
    }
}

#[derive(Debug, Serialize)]
struct EmbeddingRequest {
    input: Vec<String>,
    model: String,
    encoding_format: String,
}

#[derive(Debug, Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingDatum>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingDatum {
    embedding: EmbeddingValue,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum EmbeddingValue {
    Float(Vec<f32>),
    Base64(String),
}

impl EmbeddingValue {
    fn decode(self, expected_format: &str) -> Result<Vec<f32>> {
        match self {
            EmbeddingValue::Float(v) => Ok(v),
            EmbeddingValue::Base64(s) => {
                let bytes = base64::engine::general_purpose::STANDARD
                    .decode(s)
                    .map_err(|e| Error::embedding(format!("invalid base64 embedding: {e}")))?;
                crate::store::vector::blob_to_vector(&bytes)
                    .ok_or_else(|| Error::embedding("base64 embedding blob length is not a multiple of 4"))
            }
        }
        .map(|v| {
            let _ = expected_format;
            v
        })
    }
}
