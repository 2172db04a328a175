//! Role and layer inference: first-match-wins substring rule table over
//! lowercased path segments (spec.md §4.3, §4.5, GLOSSARY).

use crate::domain::types::Layer;

/// First rule: `repo|repository` (spec.md §4.3 role table, position 1).
const REPO_SUBSTRINGS: &[&str] = &["repo", "repository"];

/// Second rule: `domain|model` (spec.md §4.3 role table, position 2). Checked
/// separately from [`ROLE_RULES`] because its result depends on whether the
/// package also declares interfaces.
const DOMAIN_SUBSTRINGS: &[&str] = &["domain", "model"];

/// Remaining rules, in spec.md §4.3 role table order: `service|svc` (3rd),
/// `api|...` (4th), `infra|config` (5th), `util|...` (6th).
const ROLE_RULES: &[(&[&str], &str)] = &[
    (&["service", "svc"], "application service"),
    (&["api", "http", "handler", "controller", "grpc", "rest"], "api transport"),
    (&["infra", "config"], "infrastructure"),
    (&["util", "helper", "common"], "utility"),
];

/// Infer a package's role string (spec.md §4.3 "Role inference").
pub fn infer_role(package_path: &str, has_interfaces: bool, has_structs: bool, has_methods: bool) -> String {
    let lower = package_path.to_lowercase();
    let segments: Vec<&str> = lower.split('/').collect();
    let has = |needles: &[&str]| segments.iter().any(|seg| needles.iter().any(|n| seg.contains(n)));

    if has(REPO_SUBSTRINGS) {
        return "data access".to_string();
    }

    if has(DOMAIN_SUBSTRINGS) {
        return if has_interfaces {
            "domain interface".to_string()
        } else {
            "domain model".to_string()
        };
    }

    for (needles, role) in ROLE_RULES {
        if has(needles) {
            return role.to_string();
        }
    }

    if has_interfaces && has_structs {
        "domain logic".to_string()
    } else if has_methods {
        "business logic".to_string()
    } else {
        "general".to_string()
    }
}

/// Infer the architectural layer for a package path, using the same
/// substring taxonomy as role inference (GLOSSARY "Layer").
pub fn infer_layer(package_path: &str) -> Layer {
    let lower = package_path.to_lowercase();
    let segments: Vec<&str> = lower.split('/').collect();
    let has = |needles: &[&str]| segments.iter().any(|seg| needles.iter().any(|n| seg.contains(n)));

    if has(&["handler", "controller", "api", "http", "grpc", "rest"]) {
        Layer::Handler
    } else if has(&["service", "svc"]) {
        Layer::Service
    } else if has(&["repo", "repository"]) {
        Layer::Repository
    } else if has(&["domain", "model"]) {
        Layer::Domain
    } else if has(&["middleware"]) {
        Layer::Middleware
    } else if has(&["util", "helper", "common"]) {
        Layer::Util
    } else {
        Layer::Unknown
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_rules_match_first_hit() {
        assert_eq!(infer_role("internal/repository/order", false, false, false), "data access");
        assert_eq!(infer_role("internal/service/order", false, false, false), "application service");
        assert_eq!(infer_role("internal/api/order", false, false, false), "api transport");
    }

    #[test]
    fn domain_role_depends_on_interfaces() {
        assert_eq!(infer_role("internal/domain/order", true, true, false), "domain interface");
        assert_eq!(infer_role("internal/domain/order", false, true, false), "domain model");
    }

    #[test]
    fn domain_rule_outranks_later_buckets_on_the_same_path() {
        // "services/domain" has a segment matching the service rule (3rd)
        // and a segment matching the domain rule (2nd); domain must win.
        assert_eq!(infer_role("services/domain", false, true, false), "domain model");
        assert_eq!(infer_role("api/domain", true, true, false), "domain interface");
    }

    #[test]
    fn fallbacks_match_structural_signals() {
        assert_eq!(infer_role("internal/order", true, true, false), "domain logic");
        assert_eq!(infer_role("internal/order", false, false, true), "business logic");
        assert_eq!(infer_role("internal/order", false, false, false), "general");
    }

    #[test]
    fn layer_taxonomy_matches_role_substrings() {
        assert_eq!(infer_layer("internal/handler/order"), Layer::Handler);
        assert_eq!(infer_layer("internal/util"), Layer::Util);
        assert_eq!(infer_layer("internal/order"), Layer::Unknown);
    }
}
