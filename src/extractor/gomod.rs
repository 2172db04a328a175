//! Reads the `module` directive from `go.mod`, used to map import paths back
//! onto repo-relative package paths.

use std::path::Path;

/// Returns the module path declared by `go.mod` at the repository root, if
/// the file exists and the first `module` line parses.
pub fn read_module_path(repo_root: &Path) -> Option<String> {
    let content = std::fs::read_to_string(repo_root.join("go.mod")).ok()?;
    for line in content.lines() {
        let line = line.trim();
        if let Some(rest) = line.strip_prefix("module ") {
            return Some(rest.trim().to_string());
        }
    }
    None
}

/// Map an import path onto a repo-relative package path, when the import is
/// internal to this module (`module_path` is a prefix of `import_path`).
/// External imports (standard library or third-party) return `None`.
pub fn import_to_package_path(module_path: &str, import_path: &str) -> Option<String> {
    if import_path == module_path {
        return Some(String::new());
    }
    let prefix = format!("{module_path}/");
    import_path.strip_prefix(&prefix).map(|rest| rest.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn internal_imports_resolve_to_package_paths() {
        assert_eq!(
            import_to_package_path("example.com/widget", "example.com/widget/internal/order"),
            Some("internal/order".to_string())
        );
    }

    #[test]
    fn external_imports_return_none() {
        assert_eq!(import_to_package_path("example.com/widget", "fmt"), None);
        assert_eq!(
            import_to_package_path("example.com/widget", "github.com/other/lib"),
            None
        );
    }
}
