//! Tool argument types for the MCP server
//!
//! One struct per tool, matching spec.md §6's MCP tool I/O shapes. These are
//! extracted from `mod.rs` to keep the tool-registration impl block focused.

use schemars::JsonSchema;
use serde::Deserialize;

/// Arguments for the `locate` tool.
#[derive(Debug, Deserialize, JsonSchema)]
#[schemars(description = "Parameters for locating symbols by natural-language or keyword query")]
pub struct LocateArgs {
    /// Natural language or keyword query.
    #[schemars(description = "Search query text")]
    pub query: String,
    /// Repository root; defaults to the server's configured repository.
    #[schemars(description = "Absolute path to the indexed repository root")]
    pub repo: Option<String>,
    /// Maximum number of results to return.
    #[schemars(description = "Maximum number of results")]
    pub top_k: Option<usize>,
    /// Restrict to vector-similarity scoring only.
    #[schemars(description = "Use only vector similarity, ignoring keyword and graph signals")]
    #[serde(default)]
    pub vector_only: bool,
    /// Restrict to keyword (FTS) scoring only.
    #[schemars(description = "Use only keyword search, ignoring vector and graph signals")]
    #[serde(default)]
    pub keyword_only: bool,
    /// Include unexported symbols in the result set.
    #[schemars(description = "Include unexported (lowercase) symbols")]
    #[serde(default)]
    pub include_unexported: bool,
}

/// Arguments for the `context` tool.
#[derive(Debug, Deserialize, JsonSchema)]
#[schemars(description = "Parameters for assembling a budgeted evidence pack for a query")]
pub struct ContextArgs {
    /// Natural language or keyword query.
    #[schemars(description = "Search query text")]
    pub query: String,
    /// Repository root; defaults to the server's configured repository.
    #[schemars(description = "Absolute path to the indexed repository root")]
    pub repo: Option<String>,
    /// Maximum number of search results fed into the evidence pack.
    #[schemars(description = "Maximum number of underlying search results")]
    pub top_k: Option<usize>,
    /// Maximum number of package cards.
    #[schemars(description = "Maximum number of package cards in the pack")]
    pub max_packages: Option<usize>,
    /// Maximum number of symbol cards.
    #[schemars(description = "Maximum number of symbol cards in the pack")]
    pub max_symbols: Option<usize>,
    /// Maximum number of source snippets.
    #[schemars(description = "Maximum number of source snippets in the pack")]
    pub max_snippets: Option<usize>,
    /// Maximum total source lines across all snippets.
    #[schemars(description = "Maximum total source lines across all snippets")]
    pub max_lines: Option<usize>,
    /// Include unexported symbols in the underlying search.
    #[schemars(description = "Include unexported (lowercase) symbols")]
    #[serde(default)]
    pub include_unexported: bool,
}

/// Edge traversal direction, mirrors [`crate::store::EdgeDirection`] for the
/// wire representation.
#[derive(Debug, Clone, Copy, Deserialize, JsonSchema, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum RefsDirection {
    /// Edges pointing into the symbol.
    Incoming,
    /// Edges pointing out of the symbol.
    Outgoing,
    /// Both directions.
    Both,
}

/// Arguments for the `refs` tool.
#[derive(Debug, Deserialize, JsonSchema)]
#[schemars(description = "Parameters for listing graph edges touching a symbol")]
pub struct RefsArgs {
    /// Symbol id, exact match.
    #[schemars(description = "Exact symbol id")]
    pub symbol_id: Option<String>,
    /// Symbol name, resolved by lookup (optionally scoped by `package_path`).
    #[schemars(description = "Symbol name, resolved via lookup")]
    pub symbol_name: Option<String>,
    /// Narrows a `symbol_name` lookup to one package.
    #[schemars(description = "Package path to disambiguate a symbol_name lookup")]
    pub package_path: Option<String>,
    /// Repository root; defaults to the server's configured repository.
    #[schemars(description = "Absolute path to the indexed repository root")]
    pub repo: Option<String>,
    /// Restrict to one edge type.
    #[schemars(description = "One of calls, implements, imports, references, embeds")]
    pub edge_type: Option<String>,
    /// Traversal direction, default incoming.
    #[schemars(description = "incoming, outgoing, or both (default incoming)")]
    pub direction: Option<RefsDirection>,
    /// Maximum number of edges to return.
    #[schemars(description = "Maximum number of edges to return")]
    pub top_k: Option<usize>,
}

/// Arguments for the `read` tool.
#[derive(Debug, Deserialize, JsonSchema)]
#[schemars(description = "Parameters for reading source lines, by symbol or explicit range")]
pub struct ReadArgs {
    /// Symbol id whose declaration span should be read.
    #[schemars(description = "Symbol id to read; mutually exclusive with file_path/start_line/end_line")]
    pub symbol_id: Option<String>,
    /// Explicit file path, repo-relative.
    #[schemars(description = "Repo-relative file path; used with start_line/end_line")]
    pub file_path: Option<String>,
    /// Explicit start line, 1-based.
    #[schemars(description = "1-based inclusive start line")]
    pub start_line: Option<u32>,
    /// Explicit end line, 1-based.
    #[schemars(description = "1-based inclusive end line")]
    pub end_line: Option<u32>,
    /// Repository root; defaults to the server's configured repository.
    #[schemars(description = "Absolute path to the indexed repository root")]
    pub repo: Option<String>,
    /// Extra context lines added on each side of the requested range.
    #[schemars(description = "Extra lines of context on each side of the range")]
    pub context_lines: Option<u32>,
    /// Caps the total number of lines returned.
    #[schemars(description = "Maximum number of lines to return")]
    pub max_lines: Option<u32>,
    /// Prefix each returned line with its line number.
    #[schemars(description = "Prefix each line with its 1-based line number")]
    #[serde(default)]
    pub include_line_no: bool,
}

/// Arguments for the `status` tool.
#[derive(Debug, Deserialize, JsonSchema)]
#[schemars(description = "Parameters for checking a repository's indexing status")]
pub struct StatusArgs {
    /// Repository root; defaults to the server's configured repository.
    #[schemars(description = "Absolute path to the indexed repository root")]
    pub repo: Option<String>,
}
