//! In-memory symbol lookup built from freshly extracted symbols plus
//! whatever the caller carries over from unchanged packages, used to resolve
//! calls/implements/embeds/references edges that cross package boundaries
//! (spec.md §4.2 "Relationships").

use crate::domain::types::{Symbol, SymbolKind};
use std::collections::HashMap;

/// Lookup table over every known symbol visible during one extraction pass.
#[derive(Debug, Default, Clone)]
pub struct SymbolIndex {
    by_id: HashMap<String, Symbol>,
    by_package_and_name: HashMap<(String, String), Vec<String>>,
}

impl SymbolIndex {
    /// An empty index.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or overwrite a symbol.
    pub fn insert(&mut self, symbol: Symbol) {
        self.by_package_and_name
            .entry((symbol.package_path.clone(), symbol.name.clone()))
            .or_default()
            .push(symbol.id.clone());
        self.by_id.insert(symbol.id.clone(), symbol);
    }

    /// Insert every symbol from an iterator.
    pub fn extend(&mut self, symbols: impl IntoIterator<Item = Symbol>) {
        for s in symbols {
            self.insert(s);
        }
    }

    /// Fetch a symbol by its full id.
    pub fn get(&self, id: &str) -> Option<&Symbol> {
        self.by_id.get(id)
    }

    /// Find symbols declared in `package_path` named `name`, optionally
    /// restricted to a kind set (an empty slice matches any kind).
    pub fn find(&self, package_path: &str, name: &str, kinds: &[SymbolKind]) -> Vec<&Symbol> {
        self.by_package_and_name
            .get(&(package_path.to_string(), name.to_string()))
            .into_iter()
            .flatten()
            .filter_map(|id| self.by_id.get(id))
            .filter(|s| kinds.is_empty() || kinds.contains(&s.kind))
            .collect()
    }

    /// Every interface-kind symbol known anywhere in the repo.
    pub fn interfaces(&self) -> impl Iterator<Item = &Symbol> {
        self.by_id.values().filter(|s| s.kind == SymbolKind::Interface)
    }

    /// Methods whose id marks them as belonging to `struct_name` in
    /// `package_path`, sorted by name for deterministic comparison.
    pub fn struct_methods(&self, package_path: &str, struct_name: &str) -> Vec<&Symbol> {
        let prefix = format!("{package_path}:method:{struct_name}.");
        let mut methods: Vec<&Symbol> = self
            .by_id
            .values()
            .filter(|s| s.kind == SymbolKind::Method && s.id.starts_with(&prefix))
            .collect();
        methods.sort_by(|a, b| a.name.cmp(&b.name));
        methods
    }

    /// Method specs declared on `interface_name` in `package_path`, sorted
    /// by name for deterministic comparison.
    pub fn interface_methods(&self, package_path: &str, interface_name: &str) -> Vec<&Symbol> {
        let prefix = format!("{package_path}:interface-method:{interface_name}.");
        let mut methods: Vec<&Symbol> = self
            .by_id
            .values()
            .filter(|s| s.kind == SymbolKind::Method && s.id.starts_with(&prefix))
            .collect();
        methods.sort_by(|a, b| a.name.cmp(&b.name));
        methods
    }

    /// Every symbol of `kind` whose id starts with `prefix`, sorted by id
    /// (spec.md §5 "fixed iteration order keyed by sorted symbol id").
    pub fn all_with_prefix(&self, prefix: &str, kind: SymbolKind) -> Vec<&Symbol> {
        let mut out: Vec<&Symbol> = self
            .by_id
            .values()
            .filter(|s| s.kind == kind && s.id.starts_with(prefix))
            .collect();
        out.sort_by(|a, b| a.id.cmp(&b.id));
        out
    }

    /// Number of symbols held.
    pub fn len(&self) -> usize {
        self.by_id.len()
    }

    /// True if no symbols are held.
    pub fn is_empty(&self) -> bool {
        self.by_id.is_empty()
    }
}
