//! Integration tests for MCP tool handler logic (spec.md §6 tool surface),
//! exercised directly without a transport.

use std::fs;
use std::path::Path;
use std::sync::Arc;

use bcindex::config::{Config, EmbeddingConfig};
use bcindex::domain::ports::CancellationToken;
use bcindex::embedding;
use bcindex::indexer::Indexer;
use bcindex::retrieval::Retriever;
use bcindex::server::args::{LocateArgs, ReadArgs, RefsArgs, StatusArgs};
use bcindex::server::handlers;
use bcindex::store::SqliteStore;

fn write_file(root: &Path, rel: &str, content: &str) {
    let path = root.join(rel);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, content).unwrap();
}

async fn indexed_fixture() -> (tempfile::TempDir, Arc<SqliteStore>, String) {
    let dir = tempfile::tempdir().unwrap();
    write_file(dir.path(), "go.mod", "module example.com/widgets\n\ngo 1.21\n");
    write_file(
        dir.path(),
        "pkg/widgets/widgets.go",
        "package widgets\n\n// Build constructs a Widget.\nfunc Build() *Widget {\n\treturn &Widget{}\n}\n\n// Widget is a thing.\ntype Widget struct {\n\tName string\n}\n",
    );

    let store = Arc::new(SqliteStore::open_in_memory().unwrap());
    let embedding_config = EmbeddingConfig::default();
    let provider = embedding::build_provider(&embedding_config).unwrap();
    let indexer = Indexer::new(Arc::clone(&store), provider, Default::default());
    indexer.index_repository(dir.path(), &CancellationToken::new()).await.unwrap();

    let repo_root = fs::canonicalize(dir.path()).unwrap().to_string_lossy().to_string();
    (dir, store, repo_root)
}

#[tokio::test]
async fn locate_finds_the_indexed_function() {
    let (_dir, store, repo_root) = indexed_fixture().await;
    let config = Config::default();
    let embedding_provider = embedding::build_provider(&config.embedding).unwrap();
    let retriever = Retriever::new(Arc::clone(&store), embedding_provider);

    let args = LocateArgs {
        query: "Build".to_string(),
        repo: Some(repo_root),
        top_k: None,
        vector_only: false,
        keyword_only: false,
        include_unexported: false,
    };
    let result = handlers::locate(&store, &retriever, &config.search, args).await.unwrap();
    assert!(result.results.iter().any(|r| r.name == "Build"));
}

#[tokio::test]
async fn locate_rejects_mutually_exclusive_flags() {
    let (_dir, store, repo_root) = indexed_fixture().await;
    let config = Config::default();
    let embedding_provider = embedding::build_provider(&config.embedding).unwrap();
    let retriever = Retriever::new(Arc::clone(&store), embedding_provider);

    let args = LocateArgs {
        query: "Build".to_string(),
        repo: Some(repo_root),
        top_k: None,
        vector_only: true,
        keyword_only: true,
        include_unexported: false,
    };
    let err = handlers::locate(&store, &retriever, &config.search, args).await.unwrap_err();
    assert!(matches!(err, bcindex::domain::error::Error::InvalidArgument { .. }));
}

#[tokio::test]
async fn refs_by_name_lists_outgoing_edges() {
    let (_dir, store, repo_root) = indexed_fixture().await;

    let args = RefsArgs {
        symbol_id: None,
        symbol_name: Some("Build".to_string()),
        package_path: None,
        repo: Some(repo_root),
        edge_type: None,
        direction: None,
        top_k: None,
    };
    let result = handlers::refs(&store, args).unwrap();
    assert!(result.edges.iter().any(|e| e.to.as_ref().map(|s| s.name.as_str()) == Some("Widget")));
}

#[tokio::test]
async fn read_by_symbol_id_returns_its_source_lines() {
    let (_dir, store, repo_root) = indexed_fixture().await;
    let symbols = store.get_symbols_by_name(&repo_root, "Build").unwrap();
    let symbol = symbols.into_iter().next().expect("Build symbol indexed");

    let args = ReadArgs {
        symbol_id: Some(symbol.id),
        file_path: None,
        start_line: None,
        end_line: None,
        context_lines: None,
        max_lines: None,
        include_line_no: false,
        repo: Some(repo_root),
    };
    let result = handlers::read(&store, args).unwrap();
    assert!(result.lines.iter().any(|l| l.contains("func Build")));
}

#[tokio::test]
async fn status_reports_freshly_indexed_repository() {
    let (_dir, store, repo_root) = indexed_fixture().await;
    let args = StatusArgs { repo: Some(repo_root) };
    let result = handlers::status(&store, args).unwrap();
    assert!(result.indexed);
    assert!(result.symbol_count > 0);
    assert!(!result.stale, "freshly indexed repo must not be reported stale");
}
