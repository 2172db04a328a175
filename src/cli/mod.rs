//! Command-line entry point (spec.md §6 "CLI surface").
//!
//! Subcommands: `index`, `search`, `evidence`, `stats`, `mcp`. Exit 0 on
//! success, 1 on any error (enforced by the process exit code in [`run`],
//! mirroring the teacher's thin `main.rs` + library-does-the-work split).

use std::path::{Path, PathBuf};
use std::sync::Arc;

use clap::{Args, Parser, Subcommand};
use tracing::info;

use crate::config::ConfigLoader;
use crate::domain::error::{Error, Result};
use crate::domain::ports::{CancellationToken, EmbeddingProvider};
use crate::embedding;
use crate::evidence::EvidenceBuilder;
use crate::indexer::Indexer;
use crate::retrieval::{Retriever, SearchOptions};
use crate::server::BcIndexServer;
use crate::store::{self, SqliteStore};

#[derive(Parser, Debug)]
#[command(name = "bcindex")]
#[command(about = "Code context indexer and hybrid retrieval server")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Path to a TOML config file, overriding the default search path.
    #[arg(long, global = true)]
    config: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Index (or re-index) a repository.
    Index(IndexArgs),
    /// Run a hybrid search and print ranked results.
    Search(SearchArgs),
    /// Assemble and print a budgeted evidence pack for a query.
    Evidence(EvidenceArgs),
    /// Print indexing status and staleness for a repository.
    Stats(StatsArgs),
    /// Run the MCP server over stdio.
    Mcp(McpArgs),
}

#[derive(Args, Debug)]
struct IndexArgs {
    /// Repository root; defaults to the current directory.
    #[arg(long)]
    repo: Option<PathBuf>,
}

#[derive(Args, Debug)]
struct SearchArgs {
    /// Query text.
    query: String,
    /// Repository root; defaults to the current directory.
    #[arg(long)]
    repo: Option<PathBuf>,
    /// Maximum number of results.
    #[arg(long)]
    top_k: Option<usize>,
    /// Use only vector similarity. Mutually exclusive with `--keyword-only`
    /// (checked in `search`, not via clap's `conflicts_with`, so the
    /// violation produces spec.md §6's exit code 1 rather than clap's
    /// own exit code 2 for usage errors).
    #[arg(long)]
    vector_only: bool,
    /// Use only keyword (FTS) search. See `vector_only` for why this isn't
    /// a clap-level `conflicts_with`.
    #[arg(long)]
    keyword_only: bool,
    /// Include unexported symbols.
    #[arg(long)]
    include_unexported: bool,
}

#[derive(Args, Debug)]
struct EvidenceArgs {
    /// Query text.
    query: String,
    /// Repository root; defaults to the current directory.
    #[arg(long)]
    repo: Option<PathBuf>,
    /// Maximum number of underlying search results.
    #[arg(long)]
    top_k: Option<usize>,
}

#[derive(Args, Debug)]
struct StatsArgs {
    /// Repository root; defaults to the current directory.
    #[arg(long)]
    repo: Option<PathBuf>,
}

#[derive(Args, Debug)]
struct McpArgs {
    /// Repository root; defaults to the current directory.
    #[arg(long)]
    repo: Option<PathBuf>,
}

/// Parse arguments, run the selected subcommand, and translate its result
/// into a process exit (spec.md §6: exit 0 success, 1 any error).
pub async fn run() -> std::result::Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let subcommand_name = subcommand_name(&cli.command);
    let repo_root = resolve_repo_root(repo_arg(&cli.command))?;

    let _guard = init_tracing(subcommand_name, &repo_root)?;

    let config = match &cli.config {
        Some(path) => ConfigLoader::new().load_with_file(path)?,
        None => ConfigLoader::new().load()?,
    };

    let result = match cli.command {
        Command::Index(args) => index(config, args, &repo_root).await,
        Command::Search(args) => search(config, args, &repo_root).await,
        Command::Evidence(args) => evidence(config, args, &repo_root).await,
        Command::Stats(args) => stats(config, &repo_root).await,
        Command::Mcp(_) => mcp(config, &repo_root).await,
    };

    if let Err(err) = result {
        tracing::error!(error = %err, "command failed");
        eprintln!("error: {err}");
        std::process::exit(1);
    }
    Ok(())
}

fn subcommand_name(command: &Command) -> &'static str {
    match command {
        Command::Index(_) => "index",
        Command::Search(_) => "search",
        Command::Evidence(_) => "evidence",
        Command::Stats(_) => "stats",
        Command::Mcp(_) => "mcp",
    }
}

fn repo_arg(command: &Command) -> Option<&Path> {
    match command {
        Command::Index(a) => a.repo.as_deref(),
        Command::Search(a) => a.repo.as_deref(),
        Command::Evidence(a) => a.repo.as_deref(),
        Command::Stats(a) => a.repo.as_deref(),
        Command::Mcp(a) => a.repo.as_deref(),
    }
}

fn resolve_repo_root(repo: Option<&Path>) -> Result<PathBuf> {
    let path = match repo {
        Some(p) => p.to_path_buf(),
        None => std::env::current_dir()?,
    };
    Ok(std::fs::canonicalize(&path).unwrap_or(path))
}

/// Open the store and build an embedding provider + retriever for `repo_root`.
fn open_store_and_retriever(
    config: &crate::config::Config,
    repo_root: &Path,
) -> Result<(Arc<SqliteStore>, Arc<dyn EmbeddingProvider>, Retriever)> {
    let db_path = match &config.database.path {
        Some(p) => PathBuf::from(shellexpand::tilde(p).into_owned()),
        None => store::default_db_path(repo_root)?,
    };
    if let Some(parent) = db_path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let store = Arc::new(SqliteStore::open(&db_path)?);
    let embedding = embedding::build_provider(&config.embedding)?;
    let retriever = Retriever::new(Arc::clone(&store), Arc::clone(&embedding));
    Ok((store, embedding, retriever))
}

async fn index(config: crate::config::Config, _args: IndexArgs, repo_root: &Path) -> Result<()> {
    let (store, embedding, _) = open_store_and_retriever(&config, repo_root)?;
    let indexer = Indexer::new(store, embedding, config.indexer.clone());
    let cancellation = CancellationToken::new();
    let report = indexer.index_repository(repo_root, &cancellation).await?;

    info!(
        symbols = report.symbol_count,
        packages = report.package_count,
        edges = report.edge_count,
        "indexing complete"
    );
    println!("{}", serde_json::to_string_pretty(&IndexSummary::from(&report))?);
    Ok(())
}

#[derive(serde::Serialize)]
struct IndexSummary {
    repo_root: String,
    full_reindex: bool,
    changed_packages: Vec<String>,
    symbol_count: u64,
    package_count: u64,
    edge_count: u64,
    embedded_count: usize,
    warnings: Vec<String>,
}

impl From<&crate::indexer::IndexReport> for IndexSummary {
    fn from(r: &crate::indexer::IndexReport) -> Self {
        Self {
            repo_root: r.repo_root.clone(),
            full_reindex: r.full_reindex,
            changed_packages: r.changed_packages.clone(),
            symbol_count: r.symbol_count,
            package_count: r.package_count,
            edge_count: r.edge_count,
            embedded_count: r.embedded_count,
            warnings: r.warnings.clone(),
        }
    }
}

async fn search(config: crate::config::Config, args: SearchArgs, repo_root: &Path) -> Result<()> {
    if args.vector_only && args.keyword_only {
        return Err(Error::invalid_argument("vector_only and keyword_only are mutually exclusive"));
    }
    let (_store, _embedding, retriever) = open_store_and_retriever(&config, repo_root)?;

    let options = SearchOptions {
        top_k: args.top_k.unwrap_or(config.search.default_top_k),
        vector_weight: if args.keyword_only { 0.0 } else { config.search.vector_weight },
        keyword_weight: if args.vector_only { 0.0 } else { config.search.keyword_weight },
        graph_weight: config.search.graph_weight,
        exported_only: !args.include_unexported,
        kind: None,
        package_path: None,
        enable_graph_rank: config.search.enable_graph_rank,
        intent: None,
    };

    let results = retriever.search(&repo_root.to_string_lossy(), &args.query, &options).await?;
    println!("{}", serde_json::to_string_pretty(&results)?);
    Ok(())
}

async fn evidence(config: crate::config::Config, args: EvidenceArgs, repo_root: &Path) -> Result<()> {
    let (store, _embedding, retriever) = open_store_and_retriever(&config, repo_root)?;

    let options = SearchOptions {
        top_k: args.top_k.unwrap_or(config.search.default_top_k),
        vector_weight: config.search.vector_weight,
        keyword_weight: config.search.keyword_weight,
        graph_weight: config.search.graph_weight,
        exported_only: false,
        kind: None,
        package_path: None,
        enable_graph_rank: config.search.enable_graph_rank,
        intent: None,
    };
    let results = retriever.search(&repo_root.to_string_lossy(), &args.query, &options).await?;

    let builder = EvidenceBuilder::new(&store, config.evidence.clone());
    let pack = builder.build(&repo_root.to_string_lossy(), &results)?;
    println!("{}", serde_json::to_string_pretty(&pack)?);
    Ok(())
}

async fn stats(config: crate::config::Config, repo_root: &Path) -> Result<()> {
    let (store, _embedding, _retriever) = open_store_and_retriever(&config, repo_root)?;
    let args = crate::server::args::StatusArgs { repo: Some(repo_root.to_string_lossy().to_string()) };
    let result = crate::server::handlers::status(&store, args)?;
    println!("{}", serde_json::to_string_pretty(&result)?);
    Ok(())
}

async fn mcp(config: crate::config::Config, repo_root: &Path) -> Result<()> {
    let server = BcIndexServer::new(config, repo_root)?;
    server.serve_stdio().await
}

/// Initialize tracing: an stderr layer plus a rolling file layer under
/// `~/.bcindex/logs/<subcommand>-<repo>-<timestamp>-<hash>.log` (spec.md §6
/// "Persisted state layout"). Returns a guard that must be held for the
/// process lifetime to flush buffered log writes.
///
/// The `mcp` subcommand never writes to stdout outside the JSON-RPC
/// protocol, so all logging here targets stderr and the log file only.
fn init_tracing(subcommand: &str, repo_root: &Path) -> Result<tracing_appender::non_blocking::WorkerGuard> {
    use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

    let logs_dir = dirs::home_dir()
        .ok_or_else(|| Error::config("cannot resolve home directory"))?
        .join(".bcindex")
        .join("logs");
    std::fs::create_dir_all(&logs_dir)?;

    let repo_name = repo_root.file_name().map(|n| n.to_string_lossy().to_string()).unwrap_or_else(|| "repo".to_string());
    let timestamp = chrono::Utc::now().format("%Y%m%dT%H%M%SZ");
    let hash = &store::repo_id(repo_root)[..8];
    let log_file_name = format!("{subcommand}-{repo_name}-{timestamp}-{hash}.log");

    let file_appender = tracing_appender::rolling::never(&logs_dir, log_file_name);
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let file_layer = fmt::layer().with_writer(non_blocking).with_ansi(false).json();
    let stderr_layer = fmt::layer().with_writer(std::io::stderr).with_ansi(true);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(file_layer)
        .with(stderr_layer)
        .try_init()
        .map_err(|e| Error::config(format!("failed to initialize logging: {e}")))?;

    Ok(guard)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolve_repo_root_falls_back_to_cwd() {
        let root = resolve_repo_root(None).unwrap();
        assert!(root.is_absolute());
    }
}
