//! Responsibility phrase inference (spec.md §4.3 "Responsibilities").

const PHRASE_RULES: &[(&[&str], &str)] = &[
    (&["user", "auth"], "user authentication and authorization"),
    (&["order"], "order lifecycle management"),
    (&["payment", "billing"], "payment processing"),
    (&["notif"], "notification delivery"),
    (&["inventory", "stock"], "inventory tracking"),
    (&["catalog", "product"], "product catalog management"),
];

/// Produce responsibility phrases for a package path, falling back to
/// generic phrases derived from structural signals when no rule matches.
pub fn infer(package_path: &str, has_interfaces: bool, has_structs: bool, has_methods: bool) -> Vec<String> {
    let lower = package_path.to_lowercase();
    let segments: Vec<&str> = lower.split('/').collect();

    let mut phrases: Vec<String> = PHRASE_RULES
        .iter()
        .filter(|(needles, _)| segments.iter().any(|seg| needles.iter().any(|n| seg.contains(n))))
        .map(|(_, phrase)| phrase.to_string())
        .collect();

    if phrases.is_empty() {
        if has_interfaces {
            phrases.push("defining extension points".to_string());
        }
        if has_structs {
            phrases.push("modeling domain state".to_string());
        }
        if has_methods && phrases.is_empty() {
            phrases.push("implementing business operations".to_string());
        }
        if phrases.is_empty() {
            phrases.push("supporting utility functions".to_string());
        }
    }

    phrases
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn phrase_rules_match_segments() {
        assert_eq!(
            infer("internal/order", false, false, false),
            vec!["order lifecycle management".to_string()]
        );
        assert_eq!(
            infer("internal/auth", false, false, false),
            vec!["user authentication and authorization".to_string()]
        );
    }

    #[test]
    fn fallback_reflects_structural_signals() {
        assert_eq!(infer("internal/misc", true, false, false), vec!["defining extension points".to_string()]);
        assert_eq!(infer("internal/misc", false, false, false), vec!["supporting utility functions".to_string()]);
    }
}
