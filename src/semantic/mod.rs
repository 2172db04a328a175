//! # Semantic Generator
//!
//! Composes deterministic natural-language "cards" for packages and symbols
//! from purely structural signals (spec.md §4.3). No I/O, no async.

mod responsibilities;
mod role;

use crate::domain::types::{Layer, Symbol, SymbolKind};

const ENTRY_VERBS: &[&str] = &[
    "Create", "New", "Get", "List", "Update", "Delete", "Handle", "Process", "Run", "Start", "Stop", "Init",
];

/// A package card, the fixed-shape text fed to FTS and (via symbol cards)
/// the embedding service (spec.md §4.3).
#[derive(Debug, Clone)]
pub struct PackageCardText {
    /// Inferred role string.
    pub role: String,
    /// Comma-separated responsibility phrases.
    pub responsibilities: Vec<String>,
    /// Exported type names, or empty if none.
    pub key_types: Vec<String>,
    /// Exported verb-prefixed function/method names, or empty if none.
    pub entry_points: Vec<String>,
    /// External (non-internal) import paths.
    pub dependencies: Vec<String>,
    /// The rendered fixed-shape card text.
    pub text: String,
}

/// Generate a package card from its symbols and import list.
///
/// `package_path` is matched case-insensitively segment by segment against
/// the role/responsibility rule tables; `external_imports` are import paths
/// already known not to resolve to an internal package (spec.md §4.2).
pub fn package_card(
    package_path: &str,
    symbols: &[Symbol],
    external_imports: &[String],
) -> PackageCardText {
    let has_interfaces = symbols.iter().any(|s| s.kind == SymbolKind::Interface);
    let has_structs = symbols.iter().any(|s| s.kind == SymbolKind::Struct);
    let has_methods = symbols.iter().any(|s| s.kind == SymbolKind::Method);

    let role = role::infer_role(package_path, has_interfaces, has_structs, has_methods);
    let responsibilities = responsibilities::infer(package_path, has_interfaces, has_structs, has_methods);

    let mut key_types: Vec<String> = symbols
        .iter()
        .filter(|s| matches!(s.kind, SymbolKind::Struct | SymbolKind::Interface) && s.exported)
        .map(|s| s.name.clone())
        .collect();
    key_types.sort();

    let mut entry_points: Vec<String> = symbols
        .iter()
        .filter(|s| matches!(s.kind, SymbolKind::Func | SymbolKind::Method) && s.exported)
        .filter(|s| ENTRY_VERBS.iter().any(|v| s.name.starts_with(v)))
        .map(|s| s.name.clone())
        .collect();
    if entry_points.is_empty() {
        entry_points = symbols
            .iter()
            .filter(|s| matches!(s.kind, SymbolKind::Func | SymbolKind::Method) && s.exported)
            .take(5)
            .map(|s| s.name.clone())
            .collect();
    }
    entry_points.sort();
    entry_points.dedup();

    let mut dependencies = external_imports.to_vec();
    dependencies.sort();
    dependencies.dedup();

    let key_types_str = if key_types.is_empty() { "N/A".to_string() } else { key_types.join(", ") };
    let entry_points_str = if entry_points.is_empty() { "N/A".to_string() } else { entry_points.join(", ") };
    let dependencies_str = if dependencies.is_empty() { "N/A".to_string() } else { dependencies.join(", ") };

    let text = format!(
        "Role: {role}\nResponsibilities: {}\nKey Types: {key_types_str}\nEntry Points: {entry_points_str}\nDependencies: {dependencies_str}",
        responsibilities.join(", "),
    );

    PackageCardText {
        role,
        responsibilities,
        key_types,
        entry_points,
        dependencies,
        text,
    }
}

/// Compose a symbol's semantic text: the package card plus the symbol's own
/// signature, kind, and doc string (spec.md §4.3 "Symbol cards").
pub fn symbol_card(symbol: &Symbol, package_card_text: &str) -> String {
    let signature = symbol.signature.as_deref().unwrap_or("");
    let doc = if symbol.doc.is_empty() { "no documentation" } else { symbol.doc.as_str() };
    format!(
        "{package_card_text}\n\n{} {} ({}): {signature}\n{doc}",
        symbol.kind.as_str(),
        symbol.name,
        symbol.package_path,
    )
}

/// Layer inference shares the same substring taxonomy used by role
/// inference (spec.md §4.3/§4.5, GLOSSARY).
pub fn infer_layer(package_path: &str) -> Layer {
    role::infer_layer(package_path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::types::TypeDetail;

    fn func(name: &str, exported: bool) -> Symbol {
        Symbol {
            id: format!("pkg:func:{name}"),
            kind: SymbolKind::Func,
            package_path: "internal/order".to_string(),
            package_short_name: "order".to_string(),
            name: name.to_string(),
            signature: Some(format!("func {name}()")),
            file_path: "internal/order/order.go".to_string(),
            line_start: 1,
            line_end: 2,
            doc: String::new(),
            exported,
            semantic_text: String::new(),
            keywords: vec![name.to_string()],
            type_detail: Some(TypeDetail::default()),
            repo_root: "internal/order".to_string(),
        }
    }

    #[test]
    fn card_has_the_fixed_five_line_shape() {
        let symbols = vec![func("CreateOrder", true)];
        let card = package_card("internal/order", &symbols, &["github.com/lib/pq".to_string()]);
        let lines: Vec<&str> = card.text.lines().collect();
        assert_eq!(lines.len(), 5);
        assert!(lines[0].starts_with("Role: "));
        assert!(lines[1].starts_with("Responsibilities: "));
        assert!(lines[2].starts_with("Key Types: "));
        assert!(lines[3].starts_with("Entry Points: "));
        assert!(lines[4].starts_with("Dependencies: "));
        assert_eq!(card.entry_points, vec!["CreateOrder".to_string()]);
    }

    #[test]
    fn empty_package_uses_na_placeholders() {
        let card = package_card("internal/empty", &[], &[]);
        assert!(card.text.contains("Key Types: N/A"));
        assert!(card.text.contains("Entry Points: N/A"));
        assert!(card.text.contains("Dependencies: N/A"));
    }
}
