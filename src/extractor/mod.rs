//! # Extractor
//!
//! Walks a Go repository and produces `Symbol`/`Edge` streams (spec.md
//! §4.2): one symbol per package, file, type, function, method, const, var,
//! and field, plus calls/implements/imports/embeds/references edges.

mod go;
mod gomod;
pub mod ids;
pub mod paths;
pub mod symbol_index;

pub use go::{ExtractionOutput, GoExtractor};
pub use symbol_index::SymbolIndex;

use std::path::Path;

/// Directories always skipped during a repository walk (spec.md §4.4).
pub const SKIP_DIRS: &[&str] = &[".git", "vendor", "third_party"];

/// Discover every repo-relative package directory (a directory containing at
/// least one `.go` file), honoring the skip list. Directories are walked with
/// `ignore::WalkBuilder` so `.gitignore` rules apply on top of the fixed
/// skip list.
pub fn discover_packages(repo_root: &Path) -> crate::domain::error::Result<Vec<String>> {
    use std::collections::BTreeSet;

    let mut packages = BTreeSet::new();
    let walker = ignore::WalkBuilder::new(repo_root).hidden(false).build();
    for entry in walker {
        let entry = match entry {
            Ok(e) => e,
            Err(_) => continue,
        };
        let path = entry.path();
        if paths::has_skipped_component(path, SKIP_DIRS) {
            continue;
        }
        if path.extension().and_then(|e| e.to_str()) == Some("go") {
            let package_path = paths::parent_dir_relative(repo_root, path);
            packages.insert(package_path);
        }
    }
    Ok(packages.into_iter().collect())
}
