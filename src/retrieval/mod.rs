//! # Retriever
//!
//! Hybrid vector/keyword/graph search over a single repository's store
//! (spec.md §4.5).

mod graph;
mod pagerank;

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use crate::domain::error::Result;
use crate::domain::ports::EmbeddingProvider;
use crate::domain::types::{EdgeType, GraphFeatures, Intent, SearchResultItem, SymbolKind};
use crate::store::vector::cosine_similarity;
use crate::store::SqliteStore;

pub use graph::compute_graph_features;
pub use pagerank::page_rank;

/// Search options accepted by [`Retriever::search`] (spec.md §4.5).
#[derive(Debug, Clone)]
pub struct SearchOptions {
    /// Maximum number of results returned.
    pub top_k: usize,
    /// Weight applied to the vector-similarity signal before normalization.
    pub vector_weight: f32,
    /// Weight applied to the keyword signal before normalization.
    pub keyword_weight: f32,
    /// Weight applied to the graph-derived signal.
    pub graph_weight: f32,
    /// Restrict results to exported symbols only.
    pub exported_only: bool,
    /// Restrict results to a specific symbol kind.
    pub kind: Option<SymbolKind>,
    /// Restrict results to a specific package path.
    pub package_path: Option<String>,
    /// Toggle PageRank/graph-feature computation.
    pub enable_graph_rank: bool,
    /// Explicit intent override; detected from the query text when absent.
    pub intent: Option<Intent>,
}

impl Default for SearchOptions {
    fn default() -> Self {
        Self {
            top_k: 10,
            vector_weight: 0.5,
            keyword_weight: 0.3,
            graph_weight: 0.2,
            exported_only: false,
            kind: None,
            package_path: None,
            enable_graph_rank: true,
            intent: None,
        }
    }
}

/// The hybrid retrieval engine (spec.md §4.5).
pub struct Retriever {
    store: Arc<SqliteStore>,
    embedding: Arc<dyn EmbeddingProvider>,
}

impl Retriever {
    /// Build a retriever over an open store and embedding provider.
    pub fn new(store: Arc<SqliteStore>, embedding: Arc<dyn EmbeddingProvider>) -> Self {
        Self { store, embedding }
    }

    /// Run a hybrid search and return ranked, annotated results.
    pub async fn search(&self, repo_root: &str, query: &str, options: &SearchOptions) -> Result<Vec<SearchResultItem>> {
        let (w_vec, w_kw) = normalize_weights(options.vector_weight, options.keyword_weight);

        let mut vector_scores: HashMap<String, f32> = HashMap::new();
        if w_vec > 0.0 {
            let query_vector = self.embedding.embed(query).await?;
            let stored = self.store.all_vectors(repo_root)?;
            let mut candidates: Vec<(String, f32)> = stored
                .into_iter()
                .filter(|(_, v)| v.len() == query_vector.len())
                .map(|(id, v)| (id, cosine_similarity(&query_vector, &v)))
                .collect();
            candidates.sort_by(|a, b| b.1.total_cmp(&a.1));
            candidates.truncate(options.top_k.saturating_mul(2).max(2));
            vector_scores.extend(candidates);
        }

        let mut keyword_scores: HashMap<String, f32> = HashMap::new();
        if w_kw > 0.0 {
            let limit = options.top_k.saturating_mul(2).max(2);
            let ids = self.store.fts_search(repo_root, query, limit)?;
            let n = ids.len();
            for (i, id) in ids.into_iter().enumerate() {
                let score = 1.0 - (i as f32 / n.max(1) as f32);
                keyword_scores.insert(id, score);
            }
        }

        let mut candidate_ids: HashSet<String> = HashSet::new();
        candidate_ids.extend(vector_scores.keys().cloned());
        candidate_ids.extend(keyword_scores.keys().cloned());

        let mut results = Vec::new();
        for id in candidate_ids {
            let Some(symbol) = self.store.get_symbol(repo_root, &id)? else {
                continue;
            };
            if options.exported_only && !symbol.exported {
                continue;
            }
            if let Some(kind) = options.kind {
                if symbol.kind != kind {
                    continue;
                }
            }
            if let Some(package_path) = &options.package_path {
                if &symbol.package_path != package_path {
                    continue;
                }
            }

            let vector_score = vector_scores.get(&id).copied().unwrap_or(0.0);
            let keyword_score = keyword_scores.get(&id).copied().unwrap_or(0.0);
            let combined_score = w_vec * vector_score + w_kw * keyword_score;

            results.push(SearchResultItem {
                symbol,
                vector_score,
                keyword_score,
                combined_score,
                graph_score: 0.0,
                final_score: combined_score,
                graph_features: None,
                reasons: Vec::new(),
            });
        }

        if options.enable_graph_rank && !results.is_empty() {
            self.apply_graph_ranking(repo_root, &mut results, options.graph_weight)?;
        } else {
            for r in &mut results {
                r.final_score = r.combined_score;
            }
        }

        results.sort_by(|a, b| b.final_score.total_cmp(&a.final_score).then_with(|| a.symbol.id.cmp(&b.symbol.id)));

        let intent = options.intent.or_else(|| detect_intent(query));
        if let Some(intent) = intent {
            reorder_by_intent(&mut results, intent);
        }

        for r in &mut results {
            r.reasons = assemble_reasons(r);
        }

        results.truncate(options.top_k);
        Ok(results)
    }

    fn apply_graph_ranking(&self, repo_root: &str, results: &mut [SearchResultItem], graph_weight: f32) -> Result<()> {
        let candidate_ids: HashSet<String> = results.iter().map(|r| r.symbol.id.clone()).collect();
        let all_edges = self.store.all_edges(repo_root, None)?;
        let call_edges = self.store.all_edges(repo_root, Some(EdgeType::Calls))?;

        let ranks = page_rank(&candidate_ids, &call_edges);

        for r in results.iter_mut() {
            let features = compute_graph_features(&r.symbol, &all_edges, &candidate_ids, ranks.get(&r.symbol.id).copied().unwrap_or(0.0));
            let graph_score = graph_score(&features);
            r.graph_score = graph_score;
            r.final_score = (1.0 - graph_weight) * r.combined_score + graph_weight * graph_score;
            r.graph_features = Some(features);
        }
        Ok(())
    }
}

/// Rescale vector+keyword weights to sum to 1; force vector=1 if both zero
/// (spec.md §4.5 "Normalization").
fn normalize_weights(vector_weight: f32, keyword_weight: f32) -> (f32, f32) {
    let sum = vector_weight + keyword_weight;
    if sum <= 0.0 {
        (1.0, 0.0)
    } else {
        (vector_weight / sum, keyword_weight / sum)
    }
}

/// `0.4*PR + 0.2*min(in_deg/100, 1) + 0.2*is_entry + 0.1*is_interface +
/// 0.1*layer_score`, clipped to 1.0 (spec.md §4.5 "Graph score").
pub fn graph_score(features: &GraphFeatures) -> f32 {
    let pr = features.pagerank as f32;
    let in_deg_component = (features.in_degree as f32 / 100.0).min(1.0);
    let score = 0.4 * pr
        + 0.2 * in_deg_component
        + 0.2 * if features.is_entry_point { 1.0 } else { 0.0 }
        + 0.1 * if features.is_interface { 1.0 } else { 0.0 }
        + 0.1 * features.layer.score() as f32;
    score.min(1.0)
}

/// Detect intent from substrings, including the non-ASCII keyword list
/// (spec.md §4.5 "Intent reordering", GLOSSARY).
pub fn detect_intent(query: &str) -> Option<Intent> {
    let lower = query.to_lowercase();

    const DESIGN_WORDS: &[&str] = &["design", "architecture", "pattern", "设计", "方案", "架构", "模式"];
    const IMPLEMENTATION_WORDS: &[&str] = &["bug", "error", "fix", "implementation", "问题", "调试"];
    const EXTENSION_WORDS: &[&str] = &["interface", "extend", "plugin", "接口", "扩展", "插件"];

    if DESIGN_WORDS.iter().any(|w| lower.contains(w)) {
        Some(Intent::Design)
    } else if IMPLEMENTATION_WORDS.iter().any(|w| lower.contains(w)) {
        Some(Intent::Implementation)
    } else if EXTENSION_WORDS.iter().any(|w| lower.contains(w)) {
        Some(Intent::Extension)
    } else {
        None
    }
}

/// Stable bucket-sort promoting results matching the detected intent
/// (spec.md §4.5 "Intent reordering").
fn reorder_by_intent(results: &mut Vec<SearchResultItem>, intent: Intent) {
    let matches_intent = |r: &SearchResultItem| -> bool {
        let features = match &r.graph_features {
            Some(f) => f,
            None => return false,
        };
        match intent {
            Intent::Design => features.is_interface || matches!(features.layer, crate::domain::types::Layer::Service),
            Intent::Implementation => matches!(r.symbol.kind, SymbolKind::Func | SymbolKind::Method),
            Intent::Extension => features.is_interface,
        }
    };

    let (mut promoted, mut rest): (Vec<_>, Vec<_>) = results.drain(..).partition(matches_intent);
    promoted.append(&mut rest);
    *results = promoted;
}

/// Assemble human-readable reasons from thresholds (spec.md §4.5 "Reasons").
fn assemble_reasons(result: &SearchResultItem) -> Vec<String> {
    let mut reasons = Vec::new();
    if result.vector_score > 0.7 {
        reasons.push("strong semantic match".to_string());
    }
    if result.keyword_score > 0.7 {
        reasons.push("exact keyword match".to_string());
    }
    if let Some(features) = &result.graph_features {
        if features.is_entry_point {
            reasons.push("system entry point".to_string());
        }
        if features.pagerank > 0.01 {
            reasons.push("highly connected".to_string());
        }
        if features.is_interface {
            reasons.push("interface".to_string());
        }
        reasons.push(format!("{} layer", features.layer.as_str()));
    }
    reasons
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn weight_normalization_sums_to_one() {
        let (v, k) = normalize_weights(0.5, 0.3);
        assert!((v + k - 1.0).abs() < 1e-6);
        assert!((v - 0.625).abs() < 1e-3);
    }

    #[test]
    fn both_zero_weights_force_vector_only() {
        let (v, k) = normalize_weights(0.0, 0.0);
        assert_eq!(v, 1.0);
        assert_eq!(k, 0.0);
    }

    #[test]
    fn design_intent_detected_from_substring() {
        assert_eq!(detect_intent("show me the architecture"), Some(Intent::Design));
        assert_eq!(detect_intent("设计模式"), Some(Intent::Design));
        assert_eq!(detect_intent("list all files"), None);
    }

    #[test]
    fn graph_score_is_clipped_to_one() {
        let features = GraphFeatures {
            in_degree: 1000,
            out_degree: 0,
            layer: crate::domain::types::Layer::Service,
            is_interface: true,
            is_entry_point: true,
            pagerank: 1.0,
        };
        assert_eq!(graph_score(&features), 1.0);
    }
}
