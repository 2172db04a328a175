//! Deterministic PageRank over an induced `calls`-edge subgraph (spec.md
//! §4.5 "PageRank", §5 "no floating-point nondeterminism").

use std::collections::{HashMap, HashSet};

use crate::domain::types::Edge;

const DAMPING: f64 = 0.85;
const ITERATIONS: usize = 20;

/// Run PageRank over the subgraph induced by `candidate_ids`, considering
/// only edges whose both endpoints are candidates. Iteration order is fixed
/// by sorted symbol id so the result is reproducible across runs.
pub fn page_rank(candidate_ids: &HashSet<String>, call_edges: &[Edge]) -> HashMap<String, f64> {
    let mut ids: Vec<String> = candidate_ids.iter().cloned().collect();
    ids.sort();
    let n = ids.len();
    if n == 0 {
        return HashMap::new();
    }

    let mut out_links: HashMap<&str, Vec<&str>> = HashMap::new();
    let mut out_degree: HashMap<&str, usize> = HashMap::new();
    for edge in call_edges {
        if candidate_ids.contains(&edge.from_id) && candidate_ids.contains(&edge.to_id) {
            out_links.entry(edge.from_id.as_str()).or_default().push(edge.to_id.as_str());
            *out_degree.entry(edge.from_id.as_str()).or_insert(0) += 1;
        }
    }

    let mut in_links: HashMap<&str, Vec<&str>> = HashMap::new();
    for id in &ids {
        in_links.entry(id.as_str()).or_default();
    }
    for (from, targets) in &out_links {
        for to in targets {
            in_links.entry(to).or_default().push(from);
        }
    }

    let mut rank: HashMap<String, f64> = ids.iter().map(|id| (id.clone(), 1.0 / n as f64)).collect();

    for _ in 0..ITERATIONS {
        let dangling_mass: f64 = ids
            .iter()
            .filter(|id| out_degree.get(id.as_str()).copied().unwrap_or(0) == 0)
            .map(|id| rank[id])
            .sum();

        let mut next: HashMap<String, f64> = HashMap::new();
        for id in &ids {
            let incoming: f64 = in_links
                .get(id.as_str())
                .into_iter()
                .flatten()
                .map(|from| rank[*from] / out_degree.get(from).copied().unwrap_or(1).max(1) as f64)
                .sum();
            let value = (1.0 - DAMPING) / n as f64 + DAMPING * (incoming + dangling_mass / n as f64);
            next.insert(id.clone(), value);
        }
        rank = next;
    }

    rank
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::types::EdgeType;

    fn edge(from: &str, to: &str) -> Edge {
        Edge {
            from_id: from.to_string(),
            to_id: to.to_string(),
            edge_type: EdgeType::Calls,
            weight: 1,
            import_path: None,
            repo_root: "/repo".to_string(),
        }
    }

    #[test]
    fn rank_sums_to_roughly_one() {
        let ids: HashSet<String> = ["a", "b", "c"].iter().map(|s| s.to_string()).collect();
        let edges = vec![edge("a", "b"), edge("b", "c"), edge("c", "a")];
        let ranks = page_rank(&ids, &edges);
        let total: f64 = ranks.values().sum();
        assert!((total - 1.0).abs() < 1e-6, "total = {total}");
    }

    #[test]
    fn hub_with_more_incoming_links_ranks_higher() {
        let ids: HashSet<String> = ["a", "b", "hub"].iter().map(|s| s.to_string()).collect();
        let edges = vec![edge("a", "hub"), edge("b", "hub")];
        let ranks = page_rank(&ids, &edges);
        assert!(ranks["hub"] > ranks["a"]);
        assert!(ranks["hub"] > ranks["b"]);
    }

    #[test]
    fn empty_candidate_set_yields_empty_map() {
        let ids: HashSet<String> = HashSet::new();
        assert!(page_rank(&ids, &[]).is_empty());
    }
}
