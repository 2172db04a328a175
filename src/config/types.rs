//! Configuration type tree: one struct per subsystem, matching spec.md §6's
//! recognized-options table.

use serde::{Deserialize, Serialize};
use validator::Validate;

/// Root configuration, deserialized from the layered TOML + environment
/// sources assembled by [`super::loader::ConfigLoader`].
#[derive(Debug, Clone, Serialize, Deserialize, Validate, Default)]
pub struct Config {
    /// Embedding provider selection and credentials.
    #[serde(default)]
    #[validate(nested)]
    pub embedding: EmbeddingConfig,
    /// Per-repository database path override.
    #[serde(default)]
    #[validate(nested)]
    pub database: DatabaseConfig,
    /// Extraction/indexing pipeline settings.
    #[serde(default)]
    #[validate(nested)]
    pub indexer: IndexerConfig,
    /// Hybrid retrieval defaults.
    #[serde(default)]
    #[validate(nested)]
    pub search: SearchConfig,
    /// Evidence pack budgets.
    #[serde(default)]
    #[validate(nested)]
    pub evidence: EvidenceConfig,
}

/// `embedding.*` (spec.md §6 "Embedding provider contract").
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct EmbeddingConfig {
    /// Selects the provider module: `"null"`, `"http"`, or `"openai"`.
    #[serde(default = "default_provider")]
    pub provider: String,
    /// Bearer credential for HTTP-backed providers.
    #[serde(default)]
    pub api_key: Option<String>,
    /// HTTP endpoint for HTTP-backed providers.
    #[serde(default)]
    pub endpoint: Option<String>,
    /// Model identifier passed through to the provider.
    #[serde(default = "default_model")]
    pub model: String,
    /// Output vector width; must match the provider's model and be one of
    /// {1024, 1536, 2048, 3072} for non-null providers.
    #[serde(default = "default_dimensions")]
    pub dimensions: usize,
    /// Embedding request batch size.
    #[serde(default = "default_batch_size")]
    #[validate(range(min = 1, max = 100))]
    pub batch_size: usize,
    /// `"float"` or `"base64"`.
    #[serde(default = "default_encoding_format")]
    pub encoding_format: String,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            provider: default_provider(),
            api_key: None,
            endpoint: None,
            model: default_model(),
            dimensions: default_dimensions(),
            batch_size: default_batch_size(),
            encoding_format: default_encoding_format(),
        }
    }
}

fn default_provider() -> String {
    "null".to_string()
}
fn default_model() -> String {
    "text-embedding-3-small".to_string()
}
fn default_dimensions() -> usize {
    1536
}
fn default_batch_size() -> usize {
    32
}
fn default_encoding_format() -> String {
    "float".to_string()
}

/// `database.*`.
#[derive(Debug, Clone, Serialize, Deserialize, Validate, Default)]
pub struct DatabaseConfig {
    /// Override the default `~/.bcindex/data/<name>-<hash>.db` path.
    #[serde(default)]
    pub path: Option<String>,
}

/// `indexer.*`.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct IndexerConfig {
    /// Bounded concurrency for embedding requests during indexing.
    #[serde(default = "default_max_workers")]
    #[validate(range(min = 1))]
    pub max_workers: usize,
    /// Skip `_test.go` source files during extraction.
    #[serde(default = "default_skip_tests")]
    pub skip_tests: bool,
    /// Glob patterns excluded from package discovery, in addition to the
    /// fixed `.git`/`vendor`/`third_party` skip list.
    #[serde(default = "default_exclude")]
    pub exclude: Vec<String>,
}

impl Default for IndexerConfig {
    fn default() -> Self {
        Self {
            max_workers: default_max_workers(),
            skip_tests: default_skip_tests(),
            exclude: default_exclude(),
        }
    }
}

fn default_max_workers() -> usize {
    4
}
fn default_skip_tests() -> bool {
    true
}
fn default_exclude() -> Vec<String> {
    vec![
        "**/vendor/**".to_string(),
        "**/third_party/**".to_string(),
        "**/testdata/**".to_string(),
    ]
}

/// `search.*`.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct SearchConfig {
    /// Default TopK when a caller does not supply one.
    #[serde(default = "default_top_k")]
    #[validate(range(min = 1))]
    pub default_top_k: usize,
    /// Weight applied to the vector-similarity signal.
    #[serde(default = "default_vector_weight")]
    #[validate(range(min = 0.0))]
    pub vector_weight: f32,
    /// Weight applied to the keyword (FTS) signal.
    #[serde(default = "default_keyword_weight")]
    #[validate(range(min = 0.0))]
    pub keyword_weight: f32,
    /// Weight applied to the graph-derived signal.
    #[serde(default = "default_graph_weight")]
    #[validate(range(min = 0.0))]
    pub graph_weight: f32,
    /// Toggle PageRank/graph-feature scoring.
    #[serde(default = "default_enable_graph_rank")]
    pub enable_graph_rank: bool,
    /// Optional repo-relative YAML of alias groups for query expansion.
    #[serde(default)]
    pub synonyms_file: Option<String>,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            default_top_k: default_top_k(),
            vector_weight: default_vector_weight(),
            keyword_weight: default_keyword_weight(),
            graph_weight: default_graph_weight(),
            enable_graph_rank: default_enable_graph_rank(),
            synonyms_file: None,
        }
    }
}

fn default_top_k() -> usize {
    10
}
fn default_vector_weight() -> f32 {
    0.5
}
fn default_keyword_weight() -> f32 {
    0.3
}
fn default_graph_weight() -> f32 {
    0.2
}
fn default_enable_graph_rank() -> bool {
    true
}

/// `evidence.*` pack budgets.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct EvidenceConfig {
    /// Maximum number of packages included in an evidence pack.
    #[serde(default = "default_max_packages")]
    #[validate(range(min = 1))]
    pub max_packages: usize,
    /// Maximum number of symbols included.
    #[serde(default = "default_max_symbols")]
    #[validate(range(min = 1))]
    pub max_symbols: usize,
    /// Maximum number of source snippets included.
    #[serde(default = "default_max_snippets")]
    #[validate(range(min = 1))]
    pub max_snippets: usize,
    /// Maximum total source lines across all snippets.
    #[serde(default = "default_max_lines")]
    #[validate(range(min = 1))]
    pub max_lines: usize,
}

impl Default for EvidenceConfig {
    fn default() -> Self {
        Self {
            max_packages: default_max_packages(),
            max_symbols: default_max_symbols(),
            max_snippets: default_max_snippets(),
            max_lines: default_max_lines(),
        }
    }
}

fn default_max_packages() -> usize {
    3
}
fn default_max_symbols() -> usize {
    10
}
fn default_max_snippets() -> usize {
    5
}
fn default_max_lines() -> usize {
    200
}
