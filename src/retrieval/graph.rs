//! Graph-feature computation: in/out-degree, layer, interface flag,
//! entry-point heuristic (spec.md §4.5).

use std::collections::HashSet;

use crate::domain::types::{Edge, GraphFeatures, Symbol, SymbolKind};
use crate::semantic::infer_layer;

const ENTRY_NAME_PREFIXES: &[&str] = &["main", "serve", "start", "run", "handle"];
const ENTRY_SIGNATURE_HINTS: &[&str] = &["http.", "rpc.", "context.context"];
const ENTRY_PATH_SUBSTRINGS: &[&str] = &["/handler/", "/controller/", "/cmd/", "/api/"];

/// Compute [`GraphFeatures`] for one candidate symbol against the full edge
/// set and the candidate set used for PageRank.
pub fn compute_graph_features(symbol: &Symbol, all_edges: &[Edge], candidate_ids: &HashSet<String>, pagerank: f64) -> GraphFeatures {
    let mut in_degree = 0u32;
    let mut out_degree = 0u32;
    for edge in all_edges {
        if edge.to_id == symbol.id {
            in_degree += edge.weight;
        }
        if edge.from_id == symbol.id {
            out_degree += edge.weight;
        }
    }
    let _ = candidate_ids;

    GraphFeatures {
        in_degree,
        out_degree,
        layer: infer_layer(&symbol.package_path),
        is_interface: symbol.kind == SymbolKind::Interface,
        is_entry_point: is_entry_point(symbol),
        pagerank,
    }
}

/// True if the symbol looks like a process/request entry point (spec.md
/// §4.5 "Graph ranking").
fn is_entry_point(symbol: &Symbol) -> bool {
    if !matches!(symbol.kind, SymbolKind::Func | SymbolKind::Method) {
        return false;
    }

    let name_lower = symbol.name.to_lowercase();
    if ENTRY_NAME_PREFIXES.iter().any(|p| name_lower.starts_with(p)) {
        return true;
    }

    if symbol.exported {
        if let Some(signature) = &symbol.signature {
            let sig_lower = signature.to_lowercase();
            if ENTRY_SIGNATURE_HINTS.iter().any(|h| sig_lower.contains(h)) {
                return true;
            }
        }
        let path_lower = symbol.package_path.to_lowercase();
        if ENTRY_PATH_SUBSTRINGS.iter().any(|s| format!("/{path_lower}/").contains(s)) {
            return true;
        }
    }

    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::types::SymbolKind;

    fn symbol(name: &str, package_path: &str, exported: bool, signature: Option<&str>) -> Symbol {
        Symbol {
            id: format!("{package_path}:func:{name}"),
            kind: SymbolKind::Func,
            package_path: package_path.to_string(),
            package_short_name: "pkg".to_string(),
            name: name.to_string(),
            signature: signature.map(str::to_string),
            file_path: "f.go".to_string(),
            line_start: 1,
            line_end: 5,
            doc: String::new(),
            exported,
            semantic_text: String::new(),
            keywords: Vec::new(),
            type_detail: None,
            repo_root: "/repo".to_string(),
        }
    }

    #[test]
    fn name_prefix_marks_entry_point() {
        let s = symbol("StartServer", "internal/server", true, None);
        assert!(is_entry_point(&s));
    }

    #[test]
    fn handler_path_and_exported_marks_entry_point() {
        let s = symbol("CreateOrder", "internal/handler/order", true, None);
        assert!(is_entry_point(&s));
    }

    #[test]
    fn unexported_non_matching_name_is_not_entry_point() {
        let s = symbol("helper", "internal/util", false, None);
        assert!(!is_entry_point(&s));
    }

    #[test]
    fn degree_sums_edge_weights() {
        let s = symbol("Create", "internal/order", true, None);
        let edges = vec![
            Edge { from_id: "a".into(), to_id: s.id.clone(), edge_type: crate::domain::types::EdgeType::Calls, weight: 2, import_path: None, repo_root: "/repo".into() },
            Edge { from_id: s.id.clone(), to_id: "b".into(), edge_type: crate::domain::types::EdgeType::Calls, weight: 3, import_path: None, repo_root: "/repo".into() },
        ];
        let candidates: HashSet<String> = HashSet::new();
        let features = compute_graph_features(&s, &edges, &candidates, 0.0);
        assert_eq!(features.in_degree, 2);
        assert_eq!(features.out_degree, 3);
    }
}
