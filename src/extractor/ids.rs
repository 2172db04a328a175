//! Stable identifier scheme (spec.md §4.2).

/// `pkg:<package-path>`
pub fn package_id(package_path: &str) -> String {
    format!("pkg:{package_path}")
}

/// `file:<relative-file-path>`
pub fn file_id(relative_file_path: &str) -> String {
    format!("file:{relative_file_path}")
}

/// `<package-path>:<kind>:<name>` for struct/interface/const/var declarations.
pub fn symbol_id(package_path: &str, kind: &str, name: &str) -> String {
    format!("{package_path}:{kind}:{name}")
}

/// `<package-path>:method:<receiver>.<name>`
pub fn method_id(package_path: &str, receiver: &str, name: &str) -> String {
    format!("{package_path}:method:{receiver}.{name}")
}

/// `<package-path>:field:<struct>.<field>`
pub fn field_id(package_path: &str, struct_name: &str, field_name: &str) -> String {
    format!("{package_path}:field:{struct_name}.{field_name}")
}

/// `<package-path>:interface-method:<iface>.<method>`
pub fn interface_method_id(package_path: &str, interface_name: &str, method_name: &str) -> String {
    format!("{package_path}:interface-method:{interface_name}.{method_name}")
}

/// Synthesized name for an anonymous/embedded struct field at position `index`.
pub fn embedded_field_name(index: usize) -> String {
    format!("embedded-{index}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_match_the_documented_scheme() {
        assert_eq!(package_id("internal/order"), "pkg:internal/order");
        assert_eq!(file_id("internal/order/service.go"), "file:internal/order/service.go");
        assert_eq!(symbol_id("internal/order", "struct", "Order"), "internal/order:struct:Order");
        assert_eq!(
            method_id("internal/order", "Service", "Create"),
            "internal/order:method:Service.Create"
        );
        assert_eq!(
            field_id("internal/order", "Order", "ID"),
            "internal/order:field:Order.ID"
        );
        assert_eq!(
            interface_method_id("internal/order", "Repository", "Save"),
            "internal/order:interface-method:Repository.Save"
        );
        assert_eq!(embedded_field_name(0), "embedded-0");
    }
}
