//! Core domain types (spec.md §3): Symbol, Edge, Package, Embedding, Repository,
//! plus the retrieval/evidence value types produced downstream.

use serde::{Deserialize, Serialize};

/// The closed set of symbol kinds the extractor ever produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SymbolKind {
    /// A package, one per directory-scoped unit of source.
    Package,
    /// A source file, a terminal leaf symbol.
    File,
    /// An interface type.
    Interface,
    /// A struct type.
    Struct,
    /// A top-level function.
    Func,
    /// A method with a receiver.
    Method,
    /// A constant declaration.
    Const,
    /// A variable declaration.
    Var,
    /// A struct field (including embedded/anonymous fields).
    Field,
}

impl SymbolKind {
    /// Kinds eligible for embedding per spec.md §4.4 step 6.
    pub fn is_embeddable(self) -> bool {
        matches!(
            self,
            SymbolKind::Func | SymbolKind::Method | SymbolKind::Struct | SymbolKind::Interface
        )
    }

    /// Short label used in ids and semantic cards.
    pub fn as_str(self) -> &'static str {
        match self {
            SymbolKind::Package => "package",
            SymbolKind::File => "file",
            SymbolKind::Interface => "interface",
            SymbolKind::Struct => "struct",
            SymbolKind::Func => "func",
            SymbolKind::Method => "method",
            SymbolKind::Const => "const",
            SymbolKind::Var => "var",
            SymbolKind::Field => "field",
        }
    }
}

/// Structured type-detail payload, present only for kinds that carry one
/// (struct fields, interface methods, func/method signatures).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TypeDetail {
    /// Field names, for kind=struct.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub fields: Vec<String>,
    /// Method names, for kind=interface.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub methods: Vec<String>,
    /// Receiver type name, for kind=method.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub receiver: Option<String>,
    /// Parameter type strings, for kind=func/method.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub params: Vec<String>,
    /// Return type strings, for kind=func/method.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub returns: Vec<String>,
}

/// The unit of indexing (spec.md §3 "Symbol").
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Symbol {
    /// Stable textual identifier, unique with `repo_root`.
    pub id: String,
    /// Closed-set kind.
    pub kind: SymbolKind,
    /// Owning package path.
    pub package_path: String,
    /// Package short name (final path segment).
    pub package_short_name: String,
    /// Symbol name.
    pub name: String,
    /// Optional signature string (func/method/interface-method).
    pub signature: Option<String>,
    /// Repository-relative, forward-slash source file path.
    pub file_path: String,
    /// 1-based inclusive start line.
    pub line_start: u32,
    /// 1-based inclusive end line.
    pub line_end: u32,
    /// Documentation-comment text, empty string when absent.
    pub doc: String,
    /// True if the name is exported (capitalized, Go convention).
    pub exported: bool,
    /// Deterministic semantic-text description (spec.md §4.3).
    pub semantic_text: String,
    /// Keyword tokens, at minimum name and kind.
    pub keywords: Vec<String>,
    /// Optional structured type detail.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub type_detail: Option<TypeDetail>,
    /// Repository root this symbol belongs to.
    pub repo_root: String,
}

impl Symbol {
    /// `line_start <= line_end` invariant check (spec.md §3).
    pub fn is_valid(&self) -> bool {
        self.line_start <= self.line_end
    }
}

/// The closed set of edge types (spec.md §3/§4.2).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EdgeType {
    /// A call expression resolving to a known symbol.
    Calls,
    /// A struct satisfying an interface's method set.
    Implements,
    /// A file's import of a package.
    Imports,
    /// A type reference in a signature or field type.
    References,
    /// An anonymous/embedded struct field.
    Embeds,
}

impl EdgeType {
    /// Stable lowercase label, used as both the storage column value and the
    /// wire representation for the `refs` MCP tool.
    pub fn as_str(self) -> &'static str {
        match self {
            EdgeType::Calls => "calls",
            EdgeType::Implements => "implements",
            EdgeType::Imports => "imports",
            EdgeType::References => "references",
            EdgeType::Embeds => "embeds",
        }
    }

    /// Parse back from the storage/wire label.
    pub fn parse(s: &str) -> Option<Self> {
        Some(match s {
            "calls" => EdgeType::Calls,
            "implements" => EdgeType::Implements,
            "imports" => EdgeType::Imports,
            "references" => EdgeType::References,
            "embeds" => EdgeType::Embeds,
            _ => return None,
        })
    }
}

/// A directed relation between two symbols (spec.md §3 "Edge").
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Edge {
    /// Source symbol id.
    pub from_id: String,
    /// Destination symbol id.
    pub to_id: String,
    /// Edge kind.
    pub edge_type: EdgeType,
    /// Weight, at least 1; duplicates merge by taking the max.
    pub weight: u32,
    /// Textual import path, present for `imports` edges.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub import_path: Option<String>,
    /// Repository root this edge belongs to.
    pub repo_root: String,
}

/// Aggregated view of a package path (spec.md §3 "Package").
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Package {
    /// Package path, primary key.
    pub path: String,
    /// Short name (final path segment).
    pub short_name: String,
    /// Inferred role (spec.md §4.3).
    pub role: String,
    /// Summary text.
    pub summary: String,
    /// Exported type names.
    pub key_types: Vec<String>,
    /// Exported function/method names starting with a known verb.
    pub key_funcs: Vec<String>,
    /// Interface names declared in the package.
    pub interfaces: Vec<String>,
    /// Import paths referenced by this package.
    pub imports: Vec<String>,
    /// Package paths that import this one.
    pub imported_by: Vec<String>,
    /// Number of files in the package.
    pub file_count: u32,
    /// Number of symbols in the package.
    pub symbol_count: u32,
    /// Repository root this package belongs to.
    pub repo_root: String,
}

/// A vector attached to a symbol id (spec.md §3 "Embedding").
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmbeddingRecord {
    /// Symbol id, primary key and foreign key.
    pub symbol_id: String,
    /// Dense float vector.
    pub vector: Vec<f32>,
    /// Model identifier string.
    pub model: String,
    /// Creation timestamp, UTC.
    pub created_at: chrono::DateTime<chrono::Utc>,
}

/// Per-repository metadata (spec.md §3 "Repository").
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Repository {
    /// Stable id, a hash of the root path.
    pub id: String,
    /// Absolute root path, unique.
    pub root_path: String,
    /// Timestamp of the last successful index, if any.
    pub last_indexed_at: Option<chrono::DateTime<chrono::Utc>>,
    /// Cached symbol count.
    pub symbol_count: u64,
    /// Cached package count.
    pub package_count: u64,
    /// Cached edge count.
    pub edge_count: u64,
    /// Whether any embeddings have been stored for this repository.
    pub has_embeddings: bool,
    /// Creation timestamp.
    pub created_at: chrono::DateTime<chrono::Utc>,
    /// Last-updated timestamp.
    pub updated_at: chrono::DateTime<chrono::Utc>,
}

/// Graph-derived features for one candidate symbol (spec.md §4.5).
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct GraphFeatures {
    /// Sum of incoming edge weights.
    pub in_degree: u32,
    /// Sum of outgoing edge weights.
    pub out_degree: u32,
    /// Inferred architectural layer.
    #[serde(skip)]
    pub layer: Layer,
    /// True for interface-kind symbols.
    pub is_interface: bool,
    /// True if the symbol looks like a process/request entry point.
    pub is_entry_point: bool,
    /// PageRank value in roughly [0, 1].
    pub pagerank: f64,
}

/// Architectural layer taxonomy (spec.md §4.3/§4.5, GLOSSARY).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Layer {
    /// API/transport boundary.
    Handler,
    /// Application/business service.
    Service,
    /// Data-access layer.
    Repository,
    /// Domain model/logic.
    Domain,
    /// Cross-cutting middleware.
    Middleware,
    /// Generic utility code.
    Util,
    /// No substring matched.
    #[default]
    Unknown,
}

impl Layer {
    /// Stable lowercase label.
    pub fn as_str(self) -> &'static str {
        match self {
            Layer::Handler => "handler",
            Layer::Service => "service",
            Layer::Repository => "repository",
            Layer::Domain => "domain",
            Layer::Middleware => "middleware",
            Layer::Util => "util",
            Layer::Unknown => "unknown",
        }
    }

    /// Fixed layer_score table used in graph score fusion (spec.md §4.5).
    pub fn score(self) -> f64 {
        match self {
            Layer::Handler => 0.8,
            Layer::Service => 0.9,
            Layer::Middleware => 0.7,
            Layer::Domain => 0.6,
            Layer::Repository => 0.4,
            Layer::Util => 0.3,
            Layer::Unknown => 0.5,
        }
    }

    /// Role string used by the Evidence Builder's package cards.
    pub fn role_label(self) -> &'static str {
        match self {
            Layer::Handler => "interface/http",
            Layer::Service => "application/business",
            Layer::Repository => "infrastructure/persistence",
            Layer::Domain => "domain/model",
            Layer::Middleware => "application/middleware",
            Layer::Util => "infrastructure/utility",
            Layer::Unknown => "general",
        }
    }
}

/// One search/locate result, scored and annotated (spec.md §4.5).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchResultItem {
    /// Matching symbol, flattened onto the result for transport convenience.
    pub symbol: Symbol,
    /// Vector-similarity component, 0 if not computed.
    pub vector_score: f32,
    /// Keyword (FTS rank-derived) component, 0 if not computed.
    pub keyword_score: f32,
    /// `w_vec*vector + w_kw*keyword`.
    pub combined_score: f32,
    /// Graph-derived score, 0 if graph ranking disabled.
    pub graph_score: f32,
    /// Final fused score results are ordered by.
    pub final_score: f32,
    /// Graph features computed for this candidate, if graph ranking ran.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub graph_features: Option<GraphFeatures>,
    /// Human-readable reasons (spec.md §4.5 "Reasons").
    pub reasons: Vec<String>,
}

/// An edge plus both resolved endpoints, returned by the `refs` tool.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EdgeWithEndpoints {
    /// The edge itself.
    pub edge: Edge,
    /// The `from` symbol, if resolvable.
    pub from: Option<Symbol>,
    /// The `to` symbol, if resolvable.
    pub to: Option<Symbol>,
}

/// One package card in an evidence pack (spec.md §4.6).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PackageCard {
    /// Package path.
    pub path: String,
    /// Role string, mapped from the layer taxonomy.
    pub role: String,
    /// One-line summary.
    pub summary: String,
    /// Up to three "why" reasons.
    pub reasons: Vec<String>,
    /// Up to five key symbols, preferring exported/entry-point ones.
    pub key_symbols: Vec<String>,
    /// Imports list from the Package record.
    pub imports: Vec<String>,
    /// Imported-by list from the Package record.
    pub imported_by: Vec<String>,
}

/// One symbol card in an evidence pack (spec.md §4.6).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SymbolCard {
    /// Symbol id.
    pub id: String,
    /// Symbol name.
    pub name: String,
    /// Symbol kind label.
    pub kind: String,
    /// Signature string, if any.
    pub signature: Option<String>,
    /// Source file path.
    pub file: String,
    /// 1-based start line.
    pub line: u32,
    /// Reasons carried over from the matching search result.
    pub reasons: Vec<String>,
    /// A <=300-character snippet of semantic text, present for the first three cards.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub snippet: Option<String>,
}

/// One code snippet in an evidence pack (spec.md §4.6).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Snippet {
    /// Source file path.
    pub file: String,
    /// 1-based inclusive start line actually returned.
    pub start_line: u32,
    /// 1-based inclusive end line actually returned.
    pub end_line: u32,
    /// File content for the line range.
    pub content: String,
    /// Reason string naming the symbol and kind, with "(truncated)" suffix
    /// when the snippet was shortened to fit the line budget.
    pub reason: String,
}

/// Evidence pack metadata (spec.md §4.6).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvidenceMetadata {
    /// Total packages considered before truncation.
    pub total_packages: usize,
    /// Total symbols considered before truncation.
    pub total_symbols: usize,
    /// UTC generation timestamp.
    pub generated_at: chrono::DateTime<chrono::Utc>,
    /// True if any result carried a positive vector score.
    pub has_vector_search: bool,
}

/// The complete evidence pack returned by the `context` MCP tool.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvidencePack {
    /// Top package cards, budgeted.
    pub packages: Vec<PackageCard>,
    /// Top symbol cards, budgeted.
    pub symbols: Vec<SymbolCard>,
    /// Human-readable graph hints.
    pub graph_hints: Vec<String>,
    /// Code snippets, budgeted by count and total lines.
    pub snippets: Vec<Snippet>,
    /// Pack metadata.
    pub metadata: EvidenceMetadata,
}

/// Retrieval intent inferred from a query (spec.md §4.5, GLOSSARY).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Intent {
    /// Design/architecture/pattern questions.
    Design,
    /// Bug/error/fix/implementation questions.
    Implementation,
    /// Interface/extension/plugin questions.
    Extension,
}
