//! Path normalization (spec.md §4.2 "Path normalization").

use std::path::{Path, PathBuf};

/// Convert `path` (assumed to live under `repo_root`) to a repo-relative,
/// forward-slash string. Paths outside the root are returned absolute and
/// unchanged, flagged by the caller logging a warning.
pub fn to_repo_relative(repo_root: &Path, path: &Path) -> String {
    match path.strip_prefix(repo_root) {
        Ok(rel) => to_forward_slash(rel),
        Err(_) => to_forward_slash(path),
    }
}

fn to_forward_slash(path: &Path) -> String {
    path.components()
        .map(|c| c.as_os_str().to_string_lossy().into_owned())
        .collect::<Vec<_>>()
        .join("/")
}

/// Resolve the repository root once: canonicalize, following a root-level
/// symlink exactly once (spec.md §4.2).
pub fn resolve_root(root: &Path) -> std::io::Result<PathBuf> {
    std::fs::canonicalize(root)
}

/// True if `path` has a component equal to one of `skip_dirs` anywhere along
/// it, used to honor the `.git`/`vendor`/`third_party` skip list (spec.md §4.4).
pub fn has_skipped_component(path: &Path, skip_dirs: &[&str]) -> bool {
    path.components().any(|c| {
        let s = c.as_os_str().to_string_lossy();
        skip_dirs.iter().any(|d| *d == s)
    })
}

/// The repo-relative directory path a file belongs to (its package path),
/// forward-slash, `""` for files at the repo root.
pub fn parent_dir_relative(repo_root: &Path, file_path: &Path) -> String {
    match file_path.strip_prefix(repo_root) {
        Ok(rel) => rel
            .parent()
            .map(to_forward_slash)
            .unwrap_or_default(),
        Err(_) => file_path
            .parent()
            .map(to_forward_slash)
            .unwrap_or_default(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn relative_paths_use_forward_slashes() {
        let root = Path::new("/repo");
        let file = Path::new("/repo/internal/order/service.go");
        assert_eq!(to_repo_relative(root, file), "internal/order/service.go");
    }

    #[test]
    fn skip_list_matches_any_component() {
        let p = Path::new("/repo/vendor/lib/pkg.go");
        assert!(has_skipped_component(p, &[".git", "vendor", "third_party"]));
        let p2 = Path::new("/repo/internal/pkg.go");
        assert!(!has_skipped_component(p2, &[".git", "vendor", "third_party"]));
    }

    #[test]
    fn parent_dir_is_the_package_path() {
        let root = Path::new("/repo");
        let file = Path::new("/repo/internal/order/service.go");
        assert_eq!(parent_dir_relative(root, file), "internal/order");
    }
}
