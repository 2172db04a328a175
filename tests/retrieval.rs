//! Integration tests for hybrid retrieval (spec.md §8: retrieval tie-break,
//! FTS keyword recovery when vectors are uninformative).

use std::fs;
use std::path::Path;
use std::sync::Arc;

use bcindex::config::EmbeddingConfig;
use bcindex::domain::ports::CancellationToken;
use bcindex::embedding;
use bcindex::indexer::Indexer;
use bcindex::retrieval::{Retriever, SearchOptions};
use bcindex::store::SqliteStore;

fn write_file(root: &Path, rel: &str, content: &str) {
    let path = root.join(rel);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, content).unwrap();
}

async fn index_fixture(root: &Path) -> Arc<SqliteStore> {
    let store = Arc::new(SqliteStore::open_in_memory().unwrap());
    let embedding_config = EmbeddingConfig::default();
    let provider = embedding::build_provider(&embedding_config).unwrap();
    let indexer = Indexer::new(Arc::clone(&store), provider, Default::default());
    indexer.index_repository(root, &CancellationToken::new()).await.unwrap();
    store
}

/// The null embedding provider returns an identical vector for every query,
/// so with vector_weight > 0 and keyword_weight == 0 every symbol ties on
/// vector score; FTS keyword matching is what should break the tie in favor
/// of the symbol whose name actually matches the query text.
#[tokio::test]
async fn keyword_search_finds_exact_name_match_even_with_uninformative_vectors() {
    let dir = tempfile::tempdir().unwrap();
    write_file(dir.path(), "go.mod", "module example.com/widgets\n\ngo 1.21\n");
    write_file(
        dir.path(),
        "pkg/widgets/widgets.go",
        "package widgets\n\n// ParseManifest reads a widget manifest file.\nfunc ParseManifest() {}\n\n// Unrelated does something else entirely.\nfunc Unrelated() {}\n",
    );

    let store = index_fixture(dir.path()).await;
    let embedding_config = EmbeddingConfig::default();
    let provider = embedding::build_provider(&embedding_config).unwrap();
    let retriever = Retriever::new(Arc::clone(&store), provider);

    let repo_root = fs::canonicalize(dir.path()).unwrap().to_string_lossy().to_string();
    let options = SearchOptions { vector_weight: 0.0, keyword_weight: 1.0, graph_weight: 0.0, enable_graph_rank: false, ..Default::default() };
    let results = retriever.search(&repo_root, "ParseManifest", &options).await.unwrap();

    assert!(!results.is_empty());
    assert_eq!(results[0].symbol.name, "ParseManifest");
    assert!(results[0].final_score >= results.last().unwrap().final_score);
}

#[tokio::test]
async fn exported_only_filters_out_lowercase_symbols() {
    let dir = tempfile::tempdir().unwrap();
    write_file(dir.path(), "go.mod", "module example.com/widgets\n\ngo 1.21\n");
    write_file(
        dir.path(),
        "pkg/widgets/widgets.go",
        "package widgets\n\n// Public is exported.\nfunc Public() {}\n\n// private is not exported.\nfunc private() {}\n",
    );

    let store = index_fixture(dir.path()).await;
    let embedding_config = EmbeddingConfig::default();
    let provider = embedding::build_provider(&embedding_config).unwrap();
    let retriever = Retriever::new(Arc::clone(&store), provider);

    let repo_root = fs::canonicalize(dir.path()).unwrap().to_string_lossy().to_string();
    let options = SearchOptions { exported_only: true, enable_graph_rank: false, ..Default::default() };
    let results = retriever.search(&repo_root, "widgets function", &options).await.unwrap();

    assert!(results.iter().all(|r| r.symbol.exported));
}
