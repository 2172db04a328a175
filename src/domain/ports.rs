//! Port traits: capability contracts implemented by concrete adapters.

use crate::domain::error::Result;
use async_trait::async_trait;

/// AI semantic-understanding contract for embedding providers (spec.md §6).
///
/// Concrete providers are selected at construction time by provider name
/// (`domain::ports::EmbeddingProvider` implementors live under
/// [`crate::embedding::providers`]).
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Embed a single text.
    async fn embed(&self, text: &str) -> Result<Vec<f32>>;

    /// Embed a batch of texts. Implementors may call the provider once per
    /// `batch_size` chunk internally; callers get back one vector per input
    /// text, in input order.
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>>;

    /// Fixed output dimension for this provider/model pair.
    fn dimensions(&self) -> usize;

    /// Provider name, used in stored `Embedding.model` identifiers and logs.
    fn provider_name(&self) -> &str;
}

/// Cooperative cancellation token threaded through Indexer/Retriever entry
/// points (spec.md §5 "Cooperative suspension").
#[derive(Clone, Default)]
pub struct CancellationToken {
    inner: std::sync::Arc<std::sync::atomic::AtomicBool>,
}

impl CancellationToken {
    /// Construct a fresh, uncancelled token.
    pub fn new() -> Self {
        Self::default()
    }

    /// Signal cancellation to every clone of this token.
    pub fn cancel(&self) {
        self.inner.store(true, std::sync::atomic::Ordering::SeqCst);
    }

    /// True once `cancel` has been called on any clone.
    pub fn is_cancelled(&self) -> bool {
        self.inner.load(std::sync::atomic::Ordering::SeqCst)
    }

    /// Convenience check that returns a cancellation error at a suspension point.
    pub fn check(&self) -> Result<()> {
        if self.is_cancelled() {
            Err(crate::domain::error::Error::Cancelled)
        } else {
            Ok(())
        }
    }
}
