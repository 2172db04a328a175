//! Tool handler logic for the MCP server
//!
//! Pure request/response logic, independent of the `rmcp` transport and
//! macro plumbing in `mod.rs`, so it can be unit-tested directly.

use serde::Serialize;

use crate::domain::error::{Error, Result};
use crate::domain::types::{EdgeType, EdgeWithEndpoints, EvidencePack, Symbol};
use crate::evidence::EvidenceBuilder;
use crate::retrieval::{Retriever, SearchOptions};
use crate::store::{EdgeDirection, SqliteStore};

use super::args::{ContextArgs, LocateArgs, ReadArgs, RefsArgs, RefsDirection, StatusArgs};

/// One flattened search result, the wire shape for the `locate` tool
/// (spec.md §6: "id/name/kind/package/file/line/signature/scores/reasons").
#[derive(Debug, Serialize)]
pub struct LocateResultItem {
    pub id: String,
    pub name: String,
    pub kind: String,
    pub package: String,
    pub file: String,
    pub line: u32,
    pub signature: Option<String>,
    pub vector_score: f32,
    pub keyword_score: f32,
    pub graph_score: f32,
    pub final_score: f32,
    pub reasons: Vec<String>,
}

/// Response for the `locate` tool.
#[derive(Debug, Serialize)]
pub struct LocateResult {
    pub results: Vec<LocateResultItem>,
}

/// Run the `locate` tool (spec.md §6).
pub async fn locate(store: &SqliteStore, retriever: &Retriever, config: &crate::config::SearchConfig, args: LocateArgs) -> Result<LocateResult> {
    let repo_root = resolve_repo_root(args.repo.as_deref())?;
    if args.vector_only && args.keyword_only {
        return Err(Error::invalid_argument("vector_only and keyword_only are mutually exclusive"));
    }

    let options = SearchOptions {
        top_k: args.top_k.unwrap_or(config.default_top_k),
        vector_weight: if args.keyword_only { 0.0 } else { config.vector_weight },
        keyword_weight: if args.vector_only { 0.0 } else { config.keyword_weight },
        graph_weight: config.graph_weight,
        exported_only: !args.include_unexported,
        kind: None,
        package_path: None,
        enable_graph_rank: config.enable_graph_rank,
        intent: None,
    };

    let results = retriever.search(&repo_root, &args.query, &options).await?;
    let results = results
        .into_iter()
        .map(|r| LocateResultItem {
            id: r.symbol.id,
            name: r.symbol.name,
            kind: r.symbol.kind.as_str().to_string(),
            package: r.symbol.package_path,
            file: r.symbol.file_path,
            line: r.symbol.line_start,
            signature: r.symbol.signature,
            vector_score: r.vector_score,
            keyword_score: r.keyword_score,
            graph_score: r.graph_score,
            final_score: r.final_score,
            reasons: r.reasons,
        })
        .collect();

    Ok(LocateResult { results })
}

/// Run the `context` tool (spec.md §6).
pub async fn context(
    store: &SqliteStore,
    retriever: &Retriever,
    search_defaults: &crate::config::SearchConfig,
    evidence_defaults: &crate::config::EvidenceConfig,
    args: ContextArgs,
) -> Result<EvidencePack> {
    let repo_root = resolve_repo_root(args.repo.as_deref())?;

    let options = SearchOptions {
        top_k: args.top_k.unwrap_or(search_defaults.default_top_k),
        vector_weight: search_defaults.vector_weight,
        keyword_weight: search_defaults.keyword_weight,
        graph_weight: search_defaults.graph_weight,
        exported_only: !args.include_unexported,
        kind: None,
        package_path: None,
        enable_graph_rank: search_defaults.enable_graph_rank,
        intent: None,
    };
    let results = retriever.search(&repo_root, &args.query, &options).await?;

    let mut config = evidence_defaults.clone();
    if let Some(v) = args.max_packages {
        config.max_packages = v;
    }
    if let Some(v) = args.max_symbols {
        config.max_symbols = v;
    }
    if let Some(v) = args.max_snippets {
        config.max_snippets = v;
    }
    if let Some(v) = args.max_lines {
        config.max_lines = v;
    }

    let builder = EvidenceBuilder::new(store, config);
    builder.build(&repo_root, &results)
}

/// Response for the `refs` tool.
#[derive(Debug, Serialize)]
pub struct RefsResult {
    pub edges: Vec<EdgeWithEndpoints>,
}

/// Run the `refs` tool (spec.md §6).
pub fn refs(store: &SqliteStore, args: RefsArgs) -> Result<RefsResult> {
    let repo_root = resolve_repo_root(args.repo.as_deref())?;

    let symbol_id = match (&args.symbol_id, &args.symbol_name) {
        (Some(id), _) => id.clone(),
        (None, Some(name)) => {
            let mut candidates = store.get_symbols_by_name(&repo_root, name)?;
            if let Some(package_path) = &args.package_path {
                candidates.retain(|s| &s.package_path == package_path);
            }
            candidates
                .into_iter()
                .next()
                .ok_or_else(|| Error::not_found(format!("symbol named \"{name}\"")))?
                .id
        }
        (None, None) => return Err(Error::invalid_argument("one of symbol_id or symbol_name is required")),
    };

    let edge_type = args
        .edge_type
        .as_deref()
        .map(|s| EdgeType::parse(s).ok_or_else(|| Error::invalid_argument(format!("unknown edge_type \"{s}\""))))
        .transpose()?;
    let direction = match args.direction.unwrap_or(RefsDirection::Incoming) {
        RefsDirection::Incoming => EdgeDirection::Incoming,
        RefsDirection::Outgoing => EdgeDirection::Outgoing,
        RefsDirection::Both => EdgeDirection::Both,
    };
    let top_k = args.top_k.unwrap_or(50);

    let edges = store.edges_for_symbol(&repo_root, &symbol_id, edge_type, direction, top_k)?;
    let edges = edges
        .into_iter()
        .map(|edge| {
            let from = store.get_symbol(&repo_root, &edge.from_id).ok().flatten();
            let to = store.get_symbol(&repo_root, &edge.to_id).ok().flatten();
            EdgeWithEndpoints { edge, from, to }
        })
        .collect();

    Ok(RefsResult { edges })
}

/// Response for the `read` tool.
#[derive(Debug, Serialize)]
pub struct ReadResult {
    pub file: String,
    pub start_line: u32,
    pub end_line: u32,
    pub lines: Vec<String>,
    pub symbol: Option<Symbol>,
}

/// Run the `read` tool (spec.md §6).
pub fn read(store: &SqliteStore, args: ReadArgs) -> Result<ReadResult> {
    let repo_root = resolve_repo_root(args.repo.as_deref())?;

    let (file_path, start_line, end_line, symbol) = if let Some(id) = &args.symbol_id {
        let symbol = store.get_symbol(&repo_root, id)?.ok_or_else(|| Error::not_found(format!("symbol \"{id}\"")))?;
        (symbol.file_path.clone(), symbol.line_start, symbol.line_end, Some(symbol))
    } else {
        let file_path = args.file_path.clone().ok_or_else(|| Error::invalid_argument("file_path is required without symbol_id"))?;
        let start_line = args.start_line.ok_or_else(|| Error::invalid_argument("start_line is required without symbol_id"))?;
        let end_line = args.end_line.unwrap_or(start_line);
        (file_path, start_line, end_line, None)
    };

    let context_lines = args.context_lines.unwrap_or(0);
    let start_line = start_line.saturating_sub(context_lines).max(1);
    let end_line = end_line.saturating_add(context_lines);

    let content = std::fs::read_to_string(std::path::Path::new(&repo_root).join(&file_path))
        .map_err(|e| Error::not_found(format!("{file_path}: {e}")))?;
    let all_lines: Vec<&str> = content.lines().collect();

    let start_idx = (start_line as usize).saturating_sub(1).min(all_lines.len());
    let mut end_idx = (end_line as usize).min(all_lines.len());
    if let Some(max_lines) = args.max_lines {
        end_idx = end_idx.min(start_idx + max_lines as usize);
    }

    let lines: Vec<String> = all_lines[start_idx..end_idx]
        .iter()
        .enumerate()
        .map(|(i, line)| {
            if args.include_line_no {
                format!("{}: {}", start_idx + i + 1, line)
            } else {
                (*line).to_string()
            }
        })
        .collect();

    Ok(ReadResult {
        file: file_path,
        start_line: (start_idx + 1) as u32,
        end_line: end_idx as u32,
        lines,
        symbol,
    })
}

/// Response for the `status` tool.
#[derive(Debug, Serialize)]
pub struct StatusResult {
    pub indexed: bool,
    pub last_indexed_at: Option<chrono::DateTime<chrono::Utc>>,
    pub age_seconds: Option<i64>,
    pub symbol_count: u64,
    pub package_count: u64,
    pub edge_count: u64,
    pub has_embeddings: bool,
    pub stale: bool,
    pub stale_reason: Option<String>,
}

/// Staleness threshold: indices older than this are flagged stale (spec.md §6).
const STALE_AFTER_SECONDS: i64 = 24 * 60 * 60;

/// Run the `status` tool (spec.md §6).
pub fn status(store: &SqliteStore, args: StatusArgs) -> Result<StatusResult> {
    let repo_root = resolve_repo_root(args.repo.as_deref())?;
    let repository = store.get_repository(&repo_root)?;

    let Some(repository) = repository else {
        return Ok(StatusResult {
            indexed: false,
            last_indexed_at: None,
            age_seconds: None,
            symbol_count: 0,
            package_count: 0,
            edge_count: 0,
            has_embeddings: false,
            stale: false,
            stale_reason: None,
        });
    };

    let age_seconds = repository.last_indexed_at.map(|t| (chrono::Utc::now() - t).num_seconds());
    let stale = age_seconds.is_none_or(|age| age > STALE_AFTER_SECONDS);
    let stale_reason = if stale {
        Some(match age_seconds {
            Some(age) => format!("last indexed {}h ago, exceeds the 24h staleness window", age / 3600),
            None => "never indexed".to_string(),
        })
    } else {
        None
    };

    Ok(StatusResult {
        indexed: true,
        last_indexed_at: repository.last_indexed_at,
        age_seconds,
        symbol_count: repository.symbol_count,
        package_count: repository.package_count,
        edge_count: repository.edge_count,
        has_embeddings: repository.has_embeddings,
        stale,
        stale_reason,
    })
}

/// Canonicalize an explicit `repo` argument, or fall back to the current
/// working directory (spec.md §6: `repo?` is optional on every tool).
fn resolve_repo_root(repo: Option<&str>) -> Result<String> {
    let path = match repo {
        Some(p) => std::path::PathBuf::from(p),
        None => std::env::current_dir()?,
    };
    let absolute = std::fs::canonicalize(&path).unwrap_or(path);
    Ok(absolute.to_string_lossy().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_reports_unindexed_repo() {
        let store = SqliteStore::open_in_memory().unwrap();
        let result = status(&store, StatusArgs { repo: Some("/tmp/nonexistent-repo-xyz".to_string()) }).unwrap();
        assert!(!result.indexed);
        assert!(!result.stale);
    }

    #[test]
    fn refs_requires_symbol_id_or_name() {
        let store = SqliteStore::open_in_memory().unwrap();
        let err = refs(&store, RefsArgs {
            symbol_id: None,
            symbol_name: None,
            package_path: None,
            repo: None,
            edge_type: None,
            direction: None,
            top_k: None,
        });
        assert!(err.is_err());
    }
}
