//! # Evidence Builder
//!
//! Turns ranked search results into a budgeted evidence pack: top packages,
//! top symbols, graph hints, and source snippets (spec.md §4.6).

use std::collections::HashMap;

use chrono::Utc;

use crate::config::EvidenceConfig;
use crate::domain::error::Result;
use crate::domain::types::{
    EvidenceMetadata, EvidencePack, PackageCard, SearchResultItem, Snippet, SymbolCard,
};
use crate::store::SqliteStore;

/// Builds evidence packs from a result set already ranked by the Retriever.
pub struct EvidenceBuilder<'a> {
    store: &'a SqliteStore,
    config: EvidenceConfig,
}

impl<'a> EvidenceBuilder<'a> {
    /// Build an evidence builder over an open store with pack budgets.
    pub fn new(store: &'a SqliteStore, config: EvidenceConfig) -> Self {
        Self { store, config }
    }

    /// Assemble the evidence pack for a ranked result set (spec.md §4.6).
    pub fn build(&self, repo_root: &str, results: &[SearchResultItem]) -> Result<EvidencePack> {
        let packages_by_path = self.group_by_package(results);
        let total_packages = packages_by_path.len();
        let total_symbols = results.len();

        let packages = self.top_packages(repo_root, &packages_by_path)?;
        let symbols = self.top_symbols(results);
        let graph_hints = self.graph_hints(results);
        let snippets = self.snippets(results)?;

        let has_vector_search = results.iter().any(|r| r.vector_score > 0.0);

        Ok(EvidencePack {
            packages,
            symbols,
            graph_hints,
            snippets,
            metadata: EvidenceMetadata {
                total_packages,
                total_symbols,
                generated_at: Utc::now(),
                has_vector_search,
            },
        })
    }

    fn group_by_package<'r>(&self, results: &'r [SearchResultItem]) -> HashMap<String, Vec<&'r SearchResultItem>> {
        let mut by_package: HashMap<String, Vec<&SearchResultItem>> = HashMap::new();
        for r in results {
            by_package.entry(r.symbol.package_path.clone()).or_default().push(r);
        }
        by_package
    }

    /// Top packages by `sum(combined) + 0.2*count(graph>0.5) + 0.1*count(is_entry)`
    /// (spec.md §4.6 "Top packages").
    fn top_packages(&self, repo_root: &str, by_package: &HashMap<String, Vec<&SearchResultItem>>) -> Result<Vec<PackageCard>> {
        let mut scored: Vec<(String, f32, &Vec<&SearchResultItem>)> = by_package
            .iter()
            .map(|(path, group)| {
                let sum_combined: f32 = group.iter().map(|r| r.combined_score).sum();
                let high_graph = group.iter().filter(|r| r.graph_score > 0.5).count() as f32;
                let entry_count = group
                    .iter()
                    .filter(|r| r.graph_features.as_ref().is_some_and(|f| f.is_entry_point))
                    .count() as f32;
                (path.clone(), sum_combined + 0.2 * high_graph + 0.1 * entry_count, group)
            })
            .collect();
        scored.sort_by(|a, b| b.1.total_cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        scored.truncate(self.config.max_packages);

        let mut cards = Vec::new();
        for (path, _, group) in scored {
            let package = self.store.get_package(repo_root, &path)?;

            let role = group
                .first()
                .and_then(|r| r.graph_features.as_ref())
                .map(|f| f.layer.role_label().to_string())
                .unwrap_or_else(|| "general".to_string());

            let summary = self.package_summary(&path, group.as_slice());

            let mut reasons: Vec<String> = group.iter().flat_map(|r| r.reasons.iter().cloned()).collect();
            reasons.sort();
            reasons.dedup();
            reasons.truncate(3);

            let mut key_symbols: Vec<&SearchResultItem> = group.to_vec();
            key_symbols.sort_by(|a, b| {
                let a_priority = (a.symbol.exported, a.graph_features.as_ref().is_some_and(|f| f.is_entry_point));
                let b_priority = (b.symbol.exported, b.graph_features.as_ref().is_some_and(|f| f.is_entry_point));
                b_priority.cmp(&a_priority).then_with(|| b.final_score.total_cmp(&a.final_score))
            });
            let key_symbols: Vec<String> = key_symbols.into_iter().take(5).map(|r| r.symbol.name.clone()).collect();

            let (imports, imported_by) = package
                .map(|p| (p.imports, p.imported_by))
                .unwrap_or_default();

            cards.push(PackageCard {
                path,
                role,
                summary,
                reasons,
                key_symbols,
                imports,
                imported_by,
            });
        }
        Ok(cards)
    }

    /// One-line summary from symbol-kind counts and the first result's
    /// truncated semantic text (spec.md §4.6).
    fn package_summary(&self, path: &str, group: &[&SearchResultItem]) -> String {
        let mut counts: HashMap<&'static str, usize> = HashMap::new();
        for r in group {
            *counts.entry(r.symbol.kind.as_str()).or_insert(0) += 1;
        }
        let mut parts: Vec<String> = counts.into_iter().map(|(kind, n)| format!("{n} {kind}")).collect();
        parts.sort();
        let counts_str = if parts.is_empty() { "no matched symbols".to_string() } else { parts.join(", ") };

        let preview = group
            .first()
            .map(|r| truncate_chars(&r.symbol.semantic_text, 120))
            .unwrap_or_default();

        if preview.is_empty() {
            format!("{path}: {counts_str}")
        } else {
            format!("{path}: {counts_str} — {preview}")
        }
    }

    /// Top symbols (spec.md §4.6 "Top symbols"): first three get a snippet.
    fn top_symbols(&self, results: &[SearchResultItem]) -> Vec<SymbolCard> {
        results
            .iter()
            .take(self.config.max_symbols)
            .enumerate()
            .map(|(i, r)| SymbolCard {
                id: r.symbol.id.clone(),
                name: r.symbol.name.clone(),
                kind: r.symbol.kind.as_str().to_string(),
                signature: r.symbol.signature.clone(),
                file: r.symbol.file_path.clone(),
                line: r.symbol.line_start,
                reasons: r.reasons.clone(),
                snippet: if i < 3 { Some(truncate_chars(&r.symbol.semantic_text, 300)) } else { None },
            })
            .collect()
    }

    /// At most a handful of human strings (spec.md §4.6 "Graph hints").
    fn graph_hints(&self, results: &[SearchResultItem]) -> Vec<String> {
        let mut hints = Vec::new();

        if let Some(common_caller) = self.top_common_caller(results) {
            hints.push(format!("Common caller: {common_caller}"));
        }

        let entry_points: Vec<String> = results
            .iter()
            .filter(|r| r.graph_features.as_ref().is_some_and(|f| f.is_entry_point))
            .map(|r| r.symbol.name.clone())
            .collect();
        if !entry_points.is_empty() {
            hints.push(format!("Entry points: {}", entry_points.join(", ")));
        }

        if let Some(hub) = results
            .iter()
            .filter(|r| r.graph_features.as_ref().is_some_and(|f| f.pagerank > 0.1))
            .max_by(|a, b| {
                a.graph_features.as_ref().unwrap().pagerank.total_cmp(&b.graph_features.as_ref().unwrap().pagerank)
            })
        {
            hints.push(format!("Hub: {}", hub.symbol.name));
        }

        hints
    }

    fn top_common_caller(&self, results: &[SearchResultItem]) -> Option<String> {
        let ids: Vec<&str> = results.iter().map(|r| r.symbol.id.as_str()).collect();
        if ids.len() < 2 {
            return None;
        }
        let mut caller_counts: HashMap<String, usize> = HashMap::new();
        for r in results {
            if let Ok(edges) = self.store.edges_for_symbol(
                &r.symbol.repo_root,
                &r.symbol.id,
                Some(crate::domain::types::EdgeType::Calls),
                crate::store::EdgeDirection::Incoming,
                64,
            ) {
                for edge in edges {
                    if ids.contains(&edge.from_id.as_str()) {
                        continue;
                    }
                    *caller_counts.entry(edge.from_id).or_insert(0) += 1;
                }
            }
        }
        caller_counts.into_iter().filter(|(_, n)| *n > 1).max_by_key(|(_, n)| *n).map(|(id, _)| id)
    }

    /// Re-prioritized, budget-truncated source snippets (spec.md §4.6
    /// "Snippets").
    fn snippets(&self, results: &[SearchResultItem]) -> Result<Vec<Snippet>> {
        let mut prioritized: Vec<&SearchResultItem> = results.iter().collect();
        prioritized.sort_by(|a, b| {
            let score_a = snippet_priority(a);
            let score_b = snippet_priority(b);
            score_b.total_cmp(&score_a)
        });

        let mut snippets = Vec::new();
        let mut remaining_lines = self.config.max_lines;

        for r in prioritized {
            if snippets.len() >= self.config.max_snippets || remaining_lines == 0 {
                break;
            }

            let Ok(content) = std::fs::read_to_string(repo_relative_path(&r.symbol.repo_root, &r.symbol.file_path)) else {
                continue;
            };
            let lines: Vec<&str> = content.lines().collect();
            let start = r.symbol.line_start.max(1) as usize;
            let end = r.symbol.line_end.max(r.symbol.line_start) as usize;
            if start > lines.len() {
                continue;
            }
            let end = end.min(lines.len());
            let span = end.saturating_sub(start) + 1;

            let (actual_end, truncated) = if span > remaining_lines {
                if remaining_lines < 5 {
                    break;
                }
                (start + remaining_lines - 1, true)
            } else {
                (end, false)
            };

            let snippet_lines = &lines[start - 1..actual_end.min(lines.len())];
            let line_count = snippet_lines.len();
            remaining_lines = remaining_lines.saturating_sub(line_count);

            let mut reason = format!("{} {}", r.symbol.kind.as_str(), r.symbol.name);
            if truncated {
                reason.push_str(" (truncated)");
            }

            snippets.push(Snippet {
                file: r.symbol.file_path.clone(),
                start_line: start as u32,
                end_line: actual_end as u32,
                content: snippet_lines.join("\n"),
                reason,
            });
        }

        Ok(snippets)
    }
}

/// `combined + 0.2*exported + 0.3*is_entry` (spec.md §4.6 "Snippets").
fn snippet_priority(r: &SearchResultItem) -> f32 {
    r.combined_score
        + 0.2 * if r.symbol.exported { 1.0 } else { 0.0 }
        + 0.3 * if r.graph_features.as_ref().is_some_and(|f| f.is_entry_point) { 1.0 } else { 0.0 }
}

fn truncate_chars(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        text.to_string()
    } else {
        text.chars().take(max_chars).collect()
    }
}

fn repo_relative_path(repo_root: &str, file_path: &str) -> std::path::PathBuf {
    std::path::Path::new(repo_root).join(file_path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::types::{GraphFeatures, Layer, Symbol, SymbolKind};

    fn result(name: &str, package_path: &str, exported: bool, combined: f32) -> SearchResultItem {
        SearchResultItem {
            symbol: Symbol {
                id: format!("{package_path}:func:{name}"),
                kind: SymbolKind::Func,
                package_path: package_path.to_string(),
                package_short_name: "pkg".to_string(),
                name: name.to_string(),
                signature: Some(format!("func {name}()")),
                file_path: "order.go".to_string(),
                line_start: 1,
                line_end: 3,
                doc: String::new(),
                exported,
                semantic_text: "Role: service\nResponsibilities: handles orders".to_string(),
                keywords: Vec::new(),
                type_detail: None,
                repo_root: "/repo".to_string(),
            },
            vector_score: 0.8,
            keyword_score: 0.0,
            combined_score: combined,
            graph_score: 0.0,
            final_score: combined,
            graph_features: Some(GraphFeatures {
                in_degree: 1,
                out_degree: 1,
                layer: Layer::Service,
                is_interface: false,
                is_entry_point: false,
                pagerank: 0.02,
            }),
            reasons: vec!["strong semantic match".to_string()],
        }
    }

    #[test]
    fn snippet_priority_rewards_exported_entry_points() {
        let plain = result("helper", "internal/order", false, 0.5);
        let mut entry = result("Create", "internal/order", true, 0.5);
        entry.graph_features.as_mut().unwrap().is_entry_point = true;
        assert!(snippet_priority(&entry) > snippet_priority(&plain));
    }

    #[test]
    fn truncate_chars_respects_unicode_boundaries() {
        let s = "héllo wôrld";
        let truncated = truncate_chars(s, 5);
        assert_eq!(truncated.chars().count(), 5);
    }
}
