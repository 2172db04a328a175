//! Integration tests for the evidence builder (spec.md §8: truncated
//! snippet under a tight line budget, package/symbol card budgets honored).

use std::fs;
use std::path::Path;
use std::sync::Arc;

use bcindex::config::{EmbeddingConfig, EvidenceConfig};
use bcindex::domain::ports::CancellationToken;
use bcindex::embedding;
use bcindex::evidence::EvidenceBuilder;
use bcindex::indexer::Indexer;
use bcindex::retrieval::{Retriever, SearchOptions};
use bcindex::store::SqliteStore;

fn write_file(root: &Path, rel: &str, content: &str) {
    let path = root.join(rel);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, content).unwrap();
}

#[tokio::test]
async fn snippet_is_truncated_to_the_configured_line_budget() {
    let dir = tempfile::tempdir().unwrap();
    write_file(dir.path(), "go.mod", "module example.com/widgets\n\ngo 1.21\n");

    let mut body = String::from("package widgets\n\n// LongFunc has a very long body.\nfunc LongFunc() {\n");
    for i in 0..50 {
        body.push_str(&format!("\tvar x{i} = {i}\n"));
    }
    body.push_str("}\n");
    write_file(dir.path(), "pkg/widgets/widgets.go", &body);

    let store = Arc::new(SqliteStore::open_in_memory().unwrap());
    let embedding_config = EmbeddingConfig::default();
    let provider = embedding::build_provider(&embedding_config).unwrap();
    let indexer = Indexer::new(Arc::clone(&store), provider, Default::default());
    indexer.index_repository(dir.path(), &CancellationToken::new()).await.unwrap();

    let provider = embedding::build_provider(&embedding_config).unwrap();
    let retriever = Retriever::new(Arc::clone(&store), provider);
    let repo_root = fs::canonicalize(dir.path()).unwrap().to_string_lossy().to_string();
    let results = retriever.search(&repo_root, "LongFunc", &SearchOptions::default()).await.unwrap();
    assert!(!results.is_empty());

    let tight_budget = EvidenceConfig { max_lines: 10, ..Default::default() };
    let builder = EvidenceBuilder::new(&store, tight_budget);
    let pack = builder.build(&repo_root, &results).unwrap();

    let total_lines: usize = pack.snippets.iter().map(|s| s.content.lines().count()).sum();
    assert!(total_lines <= 10, "snippet line budget exceeded: {total_lines}");
}

#[tokio::test]
async fn package_and_symbol_card_counts_respect_budgets() {
    let dir = tempfile::tempdir().unwrap();
    write_file(dir.path(), "go.mod", "module example.com/widgets\n\ngo 1.21\n");
    for i in 0..5 {
        write_file(
            dir.path(),
            &format!("pkg/p{i}/p{i}.go"),
            &format!("package p{i}\n\n// Run{i} does something.\nfunc Run{i}() {{}}\n"),
        );
    }

    let store = Arc::new(SqliteStore::open_in_memory().unwrap());
    let embedding_config = EmbeddingConfig::default();
    let provider = embedding::build_provider(&embedding_config).unwrap();
    let indexer = Indexer::new(Arc::clone(&store), provider, Default::default());
    indexer.index_repository(dir.path(), &CancellationToken::new()).await.unwrap();

    let provider = embedding::build_provider(&embedding_config).unwrap();
    let retriever = Retriever::new(Arc::clone(&store), provider);
    let repo_root = fs::canonicalize(dir.path()).unwrap().to_string_lossy().to_string();
    let options = SearchOptions { top_k: 20, enable_graph_rank: false, ..Default::default() };
    let results = retriever.search(&repo_root, "Run", &options).await.unwrap();
    assert!(results.len() >= 5);

    let config = EvidenceConfig { max_packages: 2, max_symbols: 3, ..Default::default() };
    let builder = EvidenceBuilder::new(&store, config);
    let pack = builder.build(&repo_root, &results).unwrap();

    assert!(pack.packages.len() <= 2);
    assert!(pack.symbols.len() <= 3);
}
