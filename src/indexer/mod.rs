//! # Indexer
//!
//! Orchestrates Extractor -> Semantic Generator -> Embedding Service ->
//! Store, detects changed packages, and guarantees consistent
//! delete-then-replace semantics per package or per repo (spec.md §4.4).

use std::collections::{HashMap, HashSet};
use std::path::Path;
use std::sync::Arc;

use chrono::Utc;
use tracing::{info, warn};

use crate::config::IndexerConfig;
use crate::domain::error::Result;
use crate::domain::ports::{CancellationToken, EmbeddingProvider};
use crate::domain::types::{EdgeType, EmbeddingRecord, Package, Repository, Symbol, SymbolKind};
use crate::extractor::{self, ids, symbol_index::SymbolIndex, GoExtractor};
use crate::semantic;
use crate::store::SqliteStore;

/// Outcome of one [`Indexer::index_repository`] call.
#[derive(Debug, Clone, Default)]
pub struct IndexReport {
    /// Absolute repository root path used as the store scoping key.
    pub repo_root: String,
    /// True if this run performed a full rebuild rather than an incremental one.
    pub full_reindex: bool,
    /// Package paths that were (re-)extracted this run.
    pub changed_packages: Vec<String>,
    /// Symbol count after this run.
    pub symbol_count: u64,
    /// Package count after this run.
    pub package_count: u64,
    /// Edge count after this run.
    pub edge_count: u64,
    /// Number of symbols successfully embedded this run.
    pub embedded_count: usize,
    /// Non-fatal warnings accumulated during extraction and embedding.
    pub warnings: Vec<String>,
}

/// The ingestion orchestrator (spec.md §4.4).
pub struct Indexer {
    store: Arc<SqliteStore>,
    embedding: Arc<dyn EmbeddingProvider>,
    config: IndexerConfig,
}

impl Indexer {
    /// Build an indexer over an already-open store and a constructed
    /// embedding provider.
    pub fn new(store: Arc<SqliteStore>, embedding: Arc<dyn EmbeddingProvider>, config: IndexerConfig) -> Self {
        Self { store, embedding, config }
    }

    /// Index (or re-index) a repository rooted at `repo_root`.
    pub async fn index_repository(&self, repo_root: &Path, cancellation: &CancellationToken) -> Result<IndexReport> {
        cancellation.check()?;

        let absolute = std::fs::canonicalize(repo_root).unwrap_or_else(|_| repo_root.to_path_buf());
        let repo_root_str = absolute.to_string_lossy().to_string();

        let existing = self.store.get_repository(&repo_root_str)?;
        let full_reindex = existing.as_ref().map(|r| r.last_indexed_at.is_none()).unwrap_or(true);

        let all_packages = extractor::discover_packages(&absolute)?;
        let mut warnings = Vec::new();

        let targets: Vec<String> = if full_reindex {
            if existing.is_some() {
                self.store.delete_by_repo(&repo_root_str)?;
            }
            all_packages.clone()
        } else {
            let last_indexed_at = existing.as_ref().and_then(|r| r.last_indexed_at);
            self.changed_packages(&absolute, &repo_root_str, &all_packages, last_indexed_at, &mut warnings)?
        };

        info!(repo = %repo_root_str, packages = targets.len(), full = full_reindex, "indexing repository");

        for package_path in &targets {
            self.store.delete_by_package(&repo_root_str, package_path)?;
        }

        cancellation.check()?;

        // Seed the symbol index with symbols from unchanged packages so
        // cross-package edges into them still resolve.
        let mut index = SymbolIndex::new();
        for package_path in all_packages.iter().filter(|p| !targets.contains(p)) {
            index.extend(self.store.list_symbols_for_package(&repo_root_str, package_path)?);
        }

        let go_extractor = GoExtractor::new(&absolute);
        let output = go_extractor.extract(&targets, self.config.skip_tests, &mut index)?;
        warnings.extend(output.warnings);

        cancellation.check()?;

        let mut symbols = output.symbols;
        for s in &mut symbols {
            s.repo_root = repo_root_str.clone();
        }
        let mut edges = output.edges;
        for e in &mut edges {
            e.repo_root = repo_root_str.clone();
        }

        let mut by_package: HashMap<String, Vec<usize>> = HashMap::new();
        for (i, s) in symbols.iter().enumerate() {
            by_package.entry(s.package_path.clone()).or_default().push(i);
        }

        // Semantic text per package, then per symbol (spec.md §4.3).
        let mut package_cards: HashMap<String, semantic::PackageCardText> = HashMap::new();
        for package_path in &targets {
            let package_symbols: Vec<Symbol> = by_package
                .get(package_path)
                .into_iter()
                .flatten()
                .map(|&i| symbols[i].clone())
                .collect();
            let external_imports = output
                .package_external_imports
                .get(package_path)
                .cloned()
                .unwrap_or_default();
            package_cards.insert(package_path.clone(), semantic::package_card(package_path, &package_symbols, &external_imports));
        }

        for s in symbols.iter_mut() {
            let package_card = package_cards
                .get(&s.package_path)
                .map(|c| c.text.clone())
                .unwrap_or_default();
            if s.kind == SymbolKind::Package {
                s.semantic_text = package_card;
            } else {
                s.semantic_text = semantic::symbol_card(s, &package_card);
            }
        }

        if !symbols.is_empty() {
            self.store.insert_symbols(&symbols)?;
        }

        // Packages: aggregate symbol-stream counts, then pull imported_by
        // from the persisted edge set (includes edges from unchanged
        // packages written on earlier runs).
        if !edges.is_empty() {
            self.store.insert_edges(&edges)?;
        }

        let mut packages = Vec::new();
        for package_path in &targets {
            let package_symbols: Vec<&Symbol> = by_package
                .get(package_path)
                .into_iter()
                .flatten()
                .map(|&i| &symbols[i])
                .collect();
            let card = package_cards.get(package_path).cloned().unwrap_or_else(|| {
                semantic::package_card(package_path, &[], &[])
            });

            let file_count = package_symbols.iter().filter(|s| s.kind == SymbolKind::File).count() as u32;
            let interfaces: Vec<String> = {
                let mut v: Vec<String> = package_symbols
                    .iter()
                    .filter(|s| s.kind == SymbolKind::Interface)
                    .map(|s| s.name.clone())
                    .collect();
                v.sort();
                v
            };

            let imports = output.package_imports.get(package_path).cloned().unwrap_or_default();
            let imported_by = self.imported_by(&repo_root_str, package_path)?;

            packages.push(Package {
                path: package_path.clone(),
                short_name: short_name(package_path),
                role: card.role.clone(),
                summary: card.text.clone(),
                key_types: card.key_types.clone(),
                key_funcs: card.entry_points.clone(),
                interfaces,
                imports,
                imported_by,
                file_count,
                symbol_count: package_symbols.len() as u32,
                repo_root: repo_root_str.clone(),
            });
        }

        if !packages.is_empty() {
            self.store.insert_packages(&packages)?;
        }

        cancellation.check()?;

        // Embeddings: only func/method/struct/interface kinds (spec.md §4.4
        // step 6), bounded concurrency, reassembled in input order.
        let embeddable: Vec<&Symbol> = symbols.iter().filter(|s| s.kind.is_embeddable()).collect();
        let (embedded_count, embed_warnings) = self.embed_symbols(&embeddable, &repo_root_str, cancellation).await?;
        warnings.extend(embed_warnings);

        let (symbol_count, package_count, edge_count) = self.store.counts(&repo_root_str)?;
        let has_embeddings = self.store.has_embeddings(&repo_root_str)?;

        let now = Utc::now();
        self.store.upsert_repository(&Repository {
            id: crate::store::repo_id(&absolute),
            root_path: repo_root_str.clone(),
            last_indexed_at: Some(now),
            symbol_count,
            package_count,
            edge_count,
            has_embeddings,
            created_at: existing.as_ref().map(|r| r.created_at).unwrap_or(now),
            updated_at: now,
        })?;

        Ok(IndexReport {
            repo_root: repo_root_str,
            full_reindex,
            changed_packages: targets,
            symbol_count,
            package_count,
            edge_count,
            embedded_count,
            warnings,
        })
    }

    fn imported_by(&self, repo_root: &str, package_path: &str) -> Result<Vec<String>> {
        let target = ids::package_id(package_path);
        let edges = self.store.all_edges(repo_root, Some(EdgeType::Imports))?;
        let mut from: Vec<String> = edges
            .into_iter()
            .filter(|e| e.to_id == target)
            .filter_map(|e| e.from_id.strip_prefix("pkg:").map(str::to_string))
            .collect();
        from.sort();
        from.dedup();
        Ok(from)
    }

    /// Embed eligible symbols in a bounded worker pool (spec.md §4.4/§5: "a
    /// bounded worker pool (configurable N, default 4) for concurrent
    /// embedding requests", results "reassembled in input order"). Each batch
    /// of `CHUNK_SIZE` symbols is one `embed_batch` request; at most
    /// `indexer.max_workers` requests are in flight at a time, gated by a
    /// `tokio::sync::Semaphore`. Batches that the provider rejects are logged
    /// and skipped, not failed (spec.md §7 "embedding errors").
    async fn embed_symbols(
        &self,
        symbols: &[&Symbol],
        repo_root: &str,
        cancellation: &CancellationToken,
    ) -> Result<(usize, Vec<String>)> {
        const CHUNK_SIZE: usize = 8;

        if symbols.is_empty() {
            return Ok((0, Vec::new()));
        }

        cancellation.check()?;

        let chunks: Vec<Vec<Symbol>> = symbols.chunks(CHUNK_SIZE).map(|c| c.iter().map(|s| (**s).clone()).collect()).collect();
        let chunk_count = chunks.len();
        let semaphore = Arc::new(tokio::sync::Semaphore::new(self.config.max_workers.max(1)));
        let mut join_set = tokio::task::JoinSet::new();

        for (index, chunk) in chunks.into_iter().enumerate() {
            let semaphore = Arc::clone(&semaphore);
            let embedding = Arc::clone(&self.embedding);
            join_set.spawn(async move {
                let _permit = semaphore.acquire_owned().await.expect("semaphore is never closed");
                let texts: Vec<String> = chunk.iter().map(|s| s.semantic_text.clone()).collect();
                let result = embedding.embed_batch(&texts).await;
                (index, chunk, result)
            });
        }

        let mut by_index: Vec<Option<(Vec<Symbol>, Result<Vec<Vec<f32>>>)>> = (0..chunk_count).map(|_| None).collect();
        while let Some(joined) = join_set.join_next().await {
            let (index, chunk, result) = joined.expect("embedding worker task panicked");
            by_index[index] = Some((chunk, result));
        }

        let now = Utc::now();
        let mut warnings = Vec::new();
        let mut records: Vec<EmbeddingRecord> = Vec::new();

        for (chunk, result) in by_index.into_iter().flatten() {
            match result {
                Ok(vectors) => {
                    for (sym, vector) in chunk.iter().zip(vectors.into_iter()) {
                        records.push(EmbeddingRecord {
                            symbol_id: sym.id.clone(),
                            vector,
                            model: self.embedding.provider_name().to_string(),
                            created_at: now,
                        });
                    }
                }
                Err(e) => {
                    let message = format!("embedding batch of {} symbols failed: {e}", chunk.len());
                    warn!("{message}");
                    warnings.push(message);
                }
            }
        }

        let count = records.len();
        if !records.is_empty() {
            self.store.insert_embeddings(&records, repo_root)?;
        }
        Ok((count, warnings))
    }

    /// A package is changed if a file in it was modified after
    /// `last_indexed_at`, a known file disappeared, or a new file appeared
    /// (spec.md §4.4 "Change detection").
    fn changed_packages(
        &self,
        repo_root: &Path,
        repo_root_str: &str,
        all_packages: &[String],
        last_indexed_at: Option<chrono::DateTime<Utc>>,
        warnings: &mut Vec<String>,
    ) -> Result<Vec<String>> {
        let known_files: HashSet<String> = self.store.list_known_files(repo_root_str)?.into_iter().collect();
        let known_packages: HashSet<String> = self.store.list_known_packages(repo_root_str)?.into_iter().collect();

        let mut changed: HashSet<String> = HashSet::new();

        for package_path in all_packages {
            if !known_packages.contains(package_path) {
                changed.insert(package_path.clone());
                continue;
            }
            let dir = repo_root.join(package_path);
            let Ok(entries) = std::fs::read_dir(&dir) else {
                warnings.push(format!("{package_path}: could not read directory during change detection"));
                continue;
            };
            for entry in entries.filter_map(|e| e.ok()) {
                let path = entry.path();
                if path.extension().and_then(|e| e.to_str()) != Some("go") {
                    continue;
                }
                let relative = extractor::paths::to_repo_relative(repo_root, &path);
                if !known_files.contains(&relative) {
                    changed.insert(package_path.clone());
                    continue;
                }
                if let Some(last) = last_indexed_at {
                    match entry.metadata().and_then(|m| m.modified()) {
                        Ok(modified) => {
                            let modified: chrono::DateTime<Utc> = modified.into();
                            if modified > last {
                                changed.insert(package_path.clone());
                            }
                        }
                        Err(e) => warnings.push(format!("{relative}: could not read mtime: {e}")),
                    }
                }
            }
        }

        // A previously known file whose package directory no longer exists,
        // or whose file vanished, also marks that package changed.
        let all_package_set: HashSet<&str> = all_packages.iter().map(String::as_str).collect();
        for package_path in &known_packages {
            if !all_package_set.contains(package_path.as_str()) {
                changed.insert(package_path.clone());
            }
        }
        for file_path in &known_files {
            let package_path = extractor::paths::parent_dir_relative(repo_root, &repo_root.join(file_path));
            if !repo_root.join(file_path).exists() {
                changed.insert(package_path);
            }
        }

        let mut out: Vec<String> = changed.into_iter().collect();
        out.sort();
        Ok(out)
    }
}

/// Final path segment of a package path, `"main"` for the repo root.
fn short_name(package_path: &str) -> String {
    package_path
        .rsplit('/')
        .next()
        .filter(|s| !s.is_empty())
        .unwrap_or("main")
        .to_string()
}
