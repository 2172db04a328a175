//! Go source extraction via `tree-sitter-go` (spec.md §4.2).
//!
//! Declaration extraction (symbols) is a straightforward AST walk. Edge
//! resolution is intentionally bounded: it does not perform full Go type
//! inference. Calls resolve when the callee is an unqualified function in
//! the same package, a call through an import alias, or a call on the
//! current method's own receiver; anything requiring whole-program type
//! inference (arbitrary local-variable method calls) is left unresolved,
//! consistent with spec.md §4.2's "whose callee resolves to a known symbol
//! id" — unresolvable calls are simply not emitted, never an error.

use crate::domain::error::{Error, Result};
use crate::domain::types::{Edge, EdgeType, Symbol, SymbolKind, TypeDetail};
use crate::extractor::{gomod, ids, paths, symbol_index::SymbolIndex};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tree_sitter::{Node, Parser};

/// Output of one extraction pass.
#[derive(Debug, Default)]
pub struct ExtractionOutput {
    /// Symbols declared by the processed packages (including package/file
    /// pseudo-symbols).
    pub symbols: Vec<Symbol>,
    /// Edges resolved among those symbols and the supplied context index.
    pub edges: Vec<Edge>,
    /// Raw import path strings per processed package (internal and
    /// external), deduplicated and sorted. Used for Package.imports.
    pub package_imports: HashMap<String, Vec<String>>,
    /// The external-only subset of `package_imports` (import paths that do
    /// not resolve to a package inside this repository), used for the
    /// Semantic Generator's Dependencies line.
    pub package_external_imports: HashMap<String, Vec<String>>,
    /// Non-fatal per-file warnings (malformed source, skipped files).
    pub warnings: Vec<String>,
}

struct ImportRef {
    import_path: String,
    package_path: Option<String>,
}

/// A file's import aliases, keyed by the name used to qualify a reference
/// (explicit alias, or the import path's final segment).
struct FileImports {
    by_alias: HashMap<String, ImportRef>,
}

struct DeclPass {
    symbols: Vec<Symbol>,
    warnings: Vec<String>,
}

/// Extracts Go packages rooted at `repo_root`.
pub struct GoExtractor {
    repo_root: PathBuf,
    module_path: Option<String>,
}

impl GoExtractor {
    /// Build an extractor for a repository, reading `go.mod` once.
    pub fn new(repo_root: &Path) -> Self {
        Self {
            repo_root: repo_root.to_path_buf(),
            module_path: gomod::read_module_path(repo_root),
        }
    }

    /// Extract the given repo-relative package directories. `index` is
    /// seeded by the caller with symbols from unchanged packages (for
    /// cross-package edge resolution) and is extended in place with newly
    /// extracted symbols.
    pub fn extract(
        &self,
        package_dirs: &[String],
        skip_tests: bool,
        index: &mut SymbolIndex,
    ) -> Result<ExtractionOutput> {
        let mut output = ExtractionOutput::default();
        let mut file_imports: HashMap<String, FileImports> = HashMap::new();

        for package_path in package_dirs {
            let decl = self.extract_package_declarations(package_path, skip_tests, &mut file_imports);
            output.warnings.extend(decl.warnings);
            index.extend(decl.symbols.clone());
            output.symbols.extend(decl.symbols);
        }

        for package_path in package_dirs {
            let edges = self.extract_package_edges(package_path, skip_tests, index, &file_imports);
            output.edges.extend(edges);
        }

        output.edges.extend(self.resolve_implements(package_dirs, index));

        for package_path in package_dirs {
            let refs: Vec<&ImportRef> = self
                .package_files(package_path, skip_tests)
                .iter()
                .map(|f| paths::to_repo_relative(&self.repo_root, f))
                .filter_map(|relative| file_imports.get(&relative))
                .flat_map(|imports| imports.by_alias.values())
                .collect();

            let mut all: Vec<String> = refs.iter().map(|i| i.import_path.clone()).collect();
            all.sort();
            all.dedup();

            let mut external: Vec<String> = refs
                .iter()
                .filter(|i| i.package_path.is_none())
                .map(|i| i.import_path.clone())
                .collect();
            external.sort();
            external.dedup();

            output.package_imports.insert(package_path.clone(), all);
            output.package_external_imports.insert(package_path.clone(), external);
        }

        Ok(output)
    }

    fn package_files(&self, package_path: &str, skip_tests: bool) -> Vec<PathBuf> {
        let dir = self.repo_root.join(package_path);
        let Ok(entries) = std::fs::read_dir(&dir) else {
            return Vec::new();
        };
        let mut files: Vec<PathBuf> = entries
            .filter_map(|e| e.ok())
            .map(|e| e.path())
            .filter(|p| p.extension().and_then(|e| e.to_str()) == Some("go"))
            .filter(|p| {
                !skip_tests
                    || !p
                        .file_name()
                        .and_then(|n| n.to_str())
                        .is_some_and(|n| n.ends_with("_test.go"))
            })
            .collect();
        files.sort();
        files
    }

    fn short_name(package_path: &str) -> String {
        package_path
            .rsplit('/')
            .next()
            .filter(|s| !s.is_empty())
            .unwrap_or("main")
            .to_string()
    }

    fn extract_package_declarations(
        &self,
        package_path: &str,
        skip_tests: bool,
        file_imports: &mut HashMap<String, FileImports>,
    ) -> DeclPass {
        let mut symbols = Vec::new();
        let mut warnings = Vec::new();
        let files = self.package_files(package_path, skip_tests);

        let package_id = ids::package_id(package_path);
        let short_name = Self::short_name(package_path);

        for file_path in &files {
            let relative = paths::to_repo_relative(&self.repo_root, file_path);
            match self.extract_file_declarations(package_path, &short_name, file_path, &relative) {
                Ok((file_symbols, imports)) => {
                    file_imports.insert(relative.clone(), imports);
                    symbols.push(Symbol {
                        id: ids::file_id(&relative),
                        kind: SymbolKind::File,
                        package_path: package_path.to_string(),
                        package_short_name: short_name.clone(),
                        name: relative.clone(),
                        signature: None,
                        file_path: relative.clone(),
                        line_start: 1,
                        line_end: 1,
                        doc: format!("source file with {} symbols", file_symbols.len()),
                        exported: false,
                        semantic_text: String::new(),
                        keywords: vec![relative.clone()],
                        type_detail: None,
                        repo_root: package_path.to_string(),
                    });
                    symbols.extend(file_symbols);
                }
                Err(e) => warnings.push(format!("{relative}: {e}")),
            }
        }

        symbols.push(Symbol {
            id: package_id,
            kind: SymbolKind::Package,
            package_path: package_path.to_string(),
            package_short_name: short_name.clone(),
            name: package_path.to_string(),
            signature: None,
            file_path: package_path.to_string(),
            line_start: 1,
            line_end: 1,
            doc: String::new(),
            exported: false,
            semantic_text: String::new(),
            keywords: vec![short_name],
            type_detail: None,
            repo_root: package_path.to_string(),
        });

        DeclPass { symbols, warnings }
    }

    #[allow(clippy::type_complexity)]
    fn extract_file_declarations(
        &self,
        package_path: &str,
        short_name: &str,
        file_path: &Path,
        relative: &str,
    ) -> Result<(Vec<Symbol>, FileImports)> {
        let source = std::fs::read_to_string(file_path)?;
        let mut parser = Parser::new();
        parser
            .set_language(&tree_sitter_go::LANGUAGE.into())
            .map_err(|e| Error::extraction(relative, e.to_string()))?;
        let tree = parser
            .parse(&source, None)
            .ok_or_else(|| Error::extraction(relative, "tree-sitter produced no parse tree"))?;
        let root = tree.root_node();
        let bytes = source.as_bytes();

        let mut symbols = Vec::new();
        let mut imports = FileImports {
            by_alias: HashMap::new(),
        };

        let mut cursor = root.walk();
        for node in root.children(&mut cursor) {
            match node.kind() {
                "import_declaration" => {
                    self.collect_imports(node, bytes, &mut imports);
                }
                "function_declaration" => {
                    if let Some(sym) = self.extract_function(node, bytes, package_path, short_name, relative) {
                        symbols.push(sym);
                    }
                }
                "method_declaration" => {
                    if let Some(sym) = self.extract_method(node, bytes, package_path, short_name, relative) {
                        symbols.push(sym);
                    }
                }
                "type_declaration" => {
                    symbols.extend(self.extract_type_decl(node, bytes, package_path, short_name, relative));
                }
                "const_declaration" => {
                    symbols.extend(self.extract_value_decl(
                        node, bytes, package_path, short_name, relative, "const", SymbolKind::Const,
                    ));
                }
                "var_declaration" => {
                    symbols.extend(self.extract_value_decl(
                        node, bytes, package_path, short_name, relative, "var", SymbolKind::Var,
                    ));
                }
                _ => {}
            }
        }

        Ok((symbols, imports))
    }

    fn collect_imports(&self, node: Node, bytes: &[u8], imports: &mut FileImports) {
        let mut cursor = node.walk();
        for spec in node.children(&mut cursor).filter(|n| n.kind() == "import_spec_list" || n.kind() == "import_spec") {
            if spec.kind() == "import_spec_list" {
                let mut inner = spec.walk();
                for child in spec.children(&mut inner).filter(|n| n.kind() == "import_spec") {
                    self.register_import(child, bytes, imports);
                }
            } else {
                self.register_import(spec, bytes, imports);
            }
        }
    }

    fn register_import(&self, spec: Node, bytes: &[u8], imports: &mut FileImports) {
        let Some(path_node) = spec.child_by_field_name("path") else {
            return;
        };
        let raw = text(path_node, bytes);
        let import_path = raw.trim_matches('"').to_string();
        let alias = spec
            .child_by_field_name("name")
            .map(|n| text(n, bytes).to_string())
            .unwrap_or_else(|| {
                import_path
                    .rsplit('/')
                    .next()
                    .unwrap_or(&import_path)
                    .to_string()
            });
        let package_path = self
            .module_path
            .as_deref()
            .and_then(|m| gomod::import_to_package_path(m, &import_path));
        imports.by_alias.insert(
            alias,
            ImportRef {
                import_path,
                package_path,
            },
        );
    }

    fn extract_function(
        &self,
        node: Node,
        bytes: &[u8],
        package_path: &str,
        short_name: &str,
        relative: &str,
    ) -> Option<Symbol> {
        let name_node = node.child_by_field_name("name")?;
        let name = text(name_node, bytes).to_string();
        let params = node
            .child_by_field_name("parameters")
            .map(|p| param_types(p, bytes))
            .unwrap_or_default();
        let returns = node
            .child_by_field_name("result")
            .map(|r| result_types(r, bytes))
            .unwrap_or_default();
        let signature = format!("func {name}({}) {}", params.join(", "), returns.join(", "));
        let (line_start, line_end) = line_span(node);
        Some(Symbol {
            id: ids::symbol_id(package_path, "func", &name),
            kind: SymbolKind::Func,
            package_path: package_path.to_string(),
            package_short_name: short_name.to_string(),
            name: name.clone(),
            signature: Some(signature.trim().to_string()),
            file_path: relative.to_string(),
            line_start,
            line_end,
            doc: doc_comment(node, bytes),
            exported: is_exported(&name),
            semantic_text: String::new(),
            keywords: vec![name, "func".to_string()],
            type_detail: Some(TypeDetail {
                params,
                returns,
                ..Default::default()
            }),
            repo_root: package_path.to_string(),
        })
    }

    fn extract_method(
        &self,
        node: Node,
        bytes: &[u8],
        package_path: &str,
        short_name: &str,
        relative: &str,
    ) -> Option<Symbol> {
        let name_node = node.child_by_field_name("name")?;
        let name = text(name_node, bytes).to_string();
        let receiver_node = node.child_by_field_name("receiver")?;
        let receiver_type = receiver_type_name(receiver_node, bytes)?;
        let params = node
            .child_by_field_name("parameters")
            .map(|p| param_types(p, bytes))
            .unwrap_or_default();
        let returns = node
            .child_by_field_name("result")
            .map(|r| result_types(r, bytes))
            .unwrap_or_default();
        let signature = format!(
            "func ({receiver_type}) {name}({}) {}",
            params.join(", "),
            returns.join(", ")
        );
        let (line_start, line_end) = line_span(node);
        Some(Symbol {
            id: ids::method_id(package_path, &receiver_type, &name),
            kind: SymbolKind::Method,
            package_path: package_path.to_string(),
            package_short_name: short_name.to_string(),
            name: name.clone(),
            signature: Some(signature.trim().to_string()),
            file_path: relative.to_string(),
            line_start,
            line_end,
            doc: doc_comment(node, bytes),
            exported: is_exported(&name),
            semantic_text: String::new(),
            keywords: vec![name, receiver_type, "method".to_string()],
            type_detail: Some(TypeDetail {
                params,
                returns,
                ..Default::default()
            }),
            repo_root: package_path.to_string(),
        })
    }

    fn extract_type_decl(
        &self,
        node: Node,
        bytes: &[u8],
        package_path: &str,
        short_name: &str,
        relative: &str,
    ) -> Vec<Symbol> {
        let mut out = Vec::new();
        let mut cursor = node.walk();
        for spec in node.children(&mut cursor).filter(|n| n.kind() == "type_spec") {
            let Some(name_node) = spec.child_by_field_name("name") else {
                continue;
            };
            let name = text(name_node, bytes).to_string();
            let Some(type_node) = spec.child_by_field_name("type") else {
                continue;
            };
            let (line_start, line_end) = line_span(node);
            let doc = doc_comment(node, bytes);
            match type_node.kind() {
                "struct_type" => {
                    let (fields, field_symbols, embed_symbols) =
                        self.extract_struct_fields(type_node, bytes, package_path, short_name, relative, &name);
                    out.push(Symbol {
                        id: ids::symbol_id(package_path, "struct", &name),
                        kind: SymbolKind::Struct,
                        package_path: package_path.to_string(),
                        package_short_name: short_name.to_string(),
                        name: name.clone(),
                        signature: Some(format!("type {name} struct")),
                        file_path: relative.to_string(),
                        line_start,
                        line_end,
                        doc,
                        exported: is_exported(&name),
                        semantic_text: String::new(),
                        keywords: vec![name, "struct".to_string()],
                        type_detail: Some(TypeDetail {
                            fields,
                            ..Default::default()
                        }),
                        repo_root: package_path.to_string(),
                    });
                    out.extend(field_symbols);
                    out.extend(embed_symbols);
                }
                "interface_type" => {
                    let (methods, method_symbols) =
                        self.extract_interface_methods(type_node, bytes, package_path, short_name, relative, &name);
                    out.push(Symbol {
                        id: ids::symbol_id(package_path, "interface", &name),
                        kind: SymbolKind::Interface,
                        package_path: package_path.to_string(),
                        package_short_name: short_name.to_string(),
                        name: name.clone(),
                        signature: Some(format!("type {name} interface")),
                        file_path: relative.to_string(),
                        line_start,
                        line_end,
                        doc,
                        exported: is_exported(&name),
                        semantic_text: String::new(),
                        keywords: vec![name, "interface".to_string()],
                        type_detail: Some(TypeDetail {
                            methods,
                            ..Default::default()
                        }),
                        repo_root: package_path.to_string(),
                    });
                    out.extend(method_symbols);
                }
                _ => {
                    // Type alias or other named type: record as a struct-less
                    // declaration so it still participates in references.
                    out.push(Symbol {
                        id: ids::symbol_id(package_path, "struct", &name),
                        kind: SymbolKind::Struct,
                        package_path: package_path.to_string(),
                        package_short_name: short_name.to_string(),
                        name: name.clone(),
                        signature: Some(format!("type {name} {}", text(type_node, bytes))),
                        file_path: relative.to_string(),
                        line_start,
                        line_end,
                        doc,
                        exported: is_exported(&name),
                        semantic_text: String::new(),
                        keywords: vec![name, "type".to_string()],
                        type_detail: None,
                        repo_root: package_path.to_string(),
                    });
                }
            }
        }
        out
    }

    fn extract_struct_fields(
        &self,
        struct_node: Node,
        bytes: &[u8],
        package_path: &str,
        short_name: &str,
        relative: &str,
        struct_name: &str,
    ) -> (Vec<String>, Vec<Symbol>, Vec<Symbol>) {
        let mut names = Vec::new();
        let mut symbols = Vec::new();
        let mut embeds = Vec::new();
        let mut embed_index = 0usize;

        let Some(field_list) = struct_node.child_by_field_name("body") else {
            return (names, symbols, embeds);
        };
        let mut cursor = field_list.walk();
        for field in field_list.children(&mut cursor).filter(|n| n.kind() == "field_declaration") {
            let type_node = field.child_by_field_name("type");
            if let Some(name_node) = field.child_by_field_name("name") {
                let field_name = text(name_node, bytes).to_string();
                names.push(field_name.clone());
                let (line_start, line_end) = line_span(field);
                symbols.push(Symbol {
                    id: ids::field_id(package_path, struct_name, &field_name),
                    kind: SymbolKind::Field,
                    package_path: package_path.to_string(),
                    package_short_name: short_name.to_string(),
                    name: field_name.clone(),
                    signature: type_node.map(|t| text(t, bytes).to_string()),
                    file_path: relative.to_string(),
                    line_start,
                    line_end,
                    doc: String::new(),
                    exported: is_exported(&field_name),
                    semantic_text: String::new(),
                    keywords: vec![field_name, "field".to_string()],
                    type_detail: None,
                    repo_root: package_path.to_string(),
                });
            } else if let Some(type_node) = type_node {
                // Anonymous/embedded field: name comes from the type itself.
                let type_text = text(type_node, bytes).to_string();
                let embedded_name = ids::embedded_field_name(embed_index);
                embed_index += 1;
                names.push(embedded_name.clone());
                let (line_start, line_end) = line_span(field);
                embeds.push(Symbol {
                    id: ids::field_id(package_path, struct_name, &embedded_name),
                    kind: SymbolKind::Field,
                    package_path: package_path.to_string(),
                    package_short_name: short_name.to_string(),
                    name: embedded_name.clone(),
                    signature: Some(type_text.clone()),
                    file_path: relative.to_string(),
                    line_start,
                    line_end,
                    doc: String::new(),
                    exported: false,
                    semantic_text: String::new(),
                    keywords: vec![embedded_name, "field".to_string(), "embedded".to_string()],
                    type_detail: None,
                    repo_root: package_path.to_string(),
                });
            }
        }

        (names, symbols, embeds)
    }

    fn extract_interface_methods(
        &self,
        iface_node: Node,
        bytes: &[u8],
        package_path: &str,
        short_name: &str,
        relative: &str,
        iface_name: &str,
    ) -> (Vec<String>, Vec<Symbol>) {
        let mut names = Vec::new();
        let mut symbols = Vec::new();

        let Some(method_list) = iface_node.child_by_field_name("body") else {
            return (names, symbols);
        };
        let mut cursor = method_list.walk();
        for spec in method_list
            .children(&mut cursor)
            .filter(|n| n.kind() == "method_spec")
        {
            let Some(name_node) = spec.child_by_field_name("name") else {
                continue;
            };
            let method_name = text(name_node, bytes).to_string();
            names.push(method_name.clone());
            let params = spec
                .child_by_field_name("parameters")
                .map(|p| param_types(p, bytes))
                .unwrap_or_default();
            let returns = spec
                .child_by_field_name("result")
                .map(|r| result_types(r, bytes))
                .unwrap_or_default();
            let (line_start, line_end) = line_span(spec);
            symbols.push(Symbol {
                id: ids::interface_method_id(package_path, iface_name, &method_name),
                kind: SymbolKind::Method,
                package_path: package_path.to_string(),
                package_short_name: short_name.to_string(),
                name: method_name.clone(),
                signature: Some(format!("{method_name}({}) {}", params.join(", "), returns.join(", "))),
                file_path: relative.to_string(),
                line_start,
                line_end,
                doc: String::new(),
                exported: is_exported(&method_name),
                semantic_text: String::new(),
                keywords: vec![method_name, "interface-method".to_string()],
                type_detail: Some(TypeDetail {
                    params,
                    returns,
                    ..Default::default()
                }),
                repo_root: package_path.to_string(),
            });
        }

        (names, symbols)
    }

    fn extract_value_decl(
        &self,
        node: Node,
        bytes: &[u8],
        package_path: &str,
        short_name: &str,
        relative: &str,
        keyword: &str,
        kind: SymbolKind,
    ) -> Vec<Symbol> {
        let mut out = Vec::new();
        let spec_kind = format!("{keyword}_spec");
        let spec_list_kind = format!("{keyword}_spec_list");
        let mut cursor = node.walk();
        for spec in node
            .children(&mut cursor)
            .filter(|n| n.kind() == spec_kind || n.kind() == spec_list_kind)
        {
            let specs: Vec<Node> = if spec.kind() == spec_list_kind {
                let mut inner = spec.walk();
                spec.children(&mut inner).filter(|n| n.kind() == spec_kind).collect()
            } else {
                vec![spec]
            };
            for s in specs {
                let mut name_cursor = s.walk();
                for name_node in s.children(&mut name_cursor).filter(|n| n.kind() == "identifier") {
                    let name = text(name_node, bytes).to_string();
                    let (line_start, line_end) = line_span(s);
                    out.push(Symbol {
                        id: ids::symbol_id(package_path, keyword, &name),
                        kind,
                        package_path: package_path.to_string(),
                        package_short_name: short_name.to_string(),
                        name: name.clone(),
                        signature: None,
                        file_path: relative.to_string(),
                        line_start,
                        line_end,
                        doc: doc_comment(node, bytes),
                        exported: is_exported(&name),
                        semantic_text: String::new(),
                        keywords: vec![name, keyword.to_string()],
                        type_detail: None,
                        repo_root: package_path.to_string(),
                    });
                }
            }
        }
        out
    }

    fn extract_package_edges(
        &self,
        package_path: &str,
        skip_tests: bool,
        index: &SymbolIndex,
        file_imports: &HashMap<String, FileImports>,
    ) -> Vec<Edge> {
        let mut edges = Vec::new();
        let package_sym = ids::package_id(package_path);

        for file_path in self.package_files(package_path, skip_tests) {
            let relative = paths::to_repo_relative(&self.repo_root, &file_path);
            let Ok(source) = std::fs::read_to_string(&file_path) else {
                continue;
            };
            let mut parser = Parser::new();
            if parser.set_language(&tree_sitter_go::LANGUAGE.into()).is_err() {
                continue;
            }
            let Some(tree) = parser.parse(&source, None) else {
                continue;
            };
            let bytes = source.as_bytes();
            let root = tree.root_node();
            let Some(imports) = file_imports.get(&relative) else {
                continue;
            };

            for (alias, import) in &imports.by_alias {
                if let Some(target_package) = &import.package_path {
                    edges.push(Edge {
                        from_id: package_sym.clone(),
                        to_id: ids::package_id(target_package),
                        edge_type: EdgeType::Imports,
                        weight: 1,
                        import_path: Some(import.import_path.clone()),
                        repo_root: package_path.to_string(),
                    });
                }
                let _ = alias;
            }

            let mut cursor = root.walk();
            for node in root.children(&mut cursor) {
                match node.kind() {
                    "function_declaration" => {
                        if let Some(name_node) = node.child_by_field_name("name") {
                            let owner = ids::symbol_id(package_path, "func", text(name_node, bytes));
                            self.walk_body_for_calls(node, bytes, package_path, &owner, None, index, imports, &mut edges);
                            self.emit_reference_edges(node, bytes, package_path, &owner, index, imports, &mut edges);
                        }
                    }
                    "method_declaration" => {
                        if let (Some(name_node), Some(receiver_node)) =
                            (node.child_by_field_name("name"), node.child_by_field_name("receiver"))
                        {
                            if let Some(receiver_type) = receiver_type_name(receiver_node, bytes) {
                                let owner = ids::method_id(package_path, &receiver_type, text(name_node, bytes));
                                let receiver_var = receiver_var_name(receiver_node, bytes);
                                self.walk_body_for_calls(
                                    node,
                                    bytes,
                                    package_path,
                                    &owner,
                                    receiver_var.map(|v| (v, receiver_type)),
                                    index,
                                    imports,
                                    &mut edges,
                                );
                                self.emit_reference_edges(node, bytes, package_path, &owner, index, imports, &mut edges);
                            }
                        }
                    }
                    "type_declaration" => {
                        self.emit_embeds_edges(node, bytes, package_path, index, imports, &mut edges);
                        self.emit_field_reference_edges(node, bytes, package_path, index, imports, &mut edges);
                    }
                    _ => {}
                }
            }
        }

        edges
    }

    fn emit_embeds_edges(
        &self,
        decl: Node,
        bytes: &[u8],
        package_path: &str,
        index: &SymbolIndex,
        imports: &FileImports,
        edges: &mut Vec<Edge>,
    ) {
        let mut cursor = decl.walk();
        for spec in decl.children(&mut cursor).filter(|n| n.kind() == "type_spec") {
            let Some(name_node) = spec.child_by_field_name("name") else {
                continue;
            };
            let Some(type_node) = spec.child_by_field_name("type") else {
                continue;
            };
            if type_node.kind() != "struct_type" {
                continue;
            }
            let struct_name = text(name_node, bytes);
            let owner = ids::symbol_id(package_path, "struct", struct_name);
            let Some(field_list) = type_node.child_by_field_name("body") else {
                continue;
            };
            let mut field_cursor = field_list.walk();
            for field in field_list.children(&mut field_cursor).filter(|n| n.kind() == "field_declaration") {
                if field.child_by_field_name("name").is_some() {
                    continue;
                }
                let Some(embed_type) = field.child_by_field_name("type") else {
                    continue;
                };
                let stripped = strip_type_decorations(text(embed_type, bytes));
                if let Some(target) = self.resolve_type_reference(&stripped, package_path, index, imports) {
                    edges.push(Edge {
                        from_id: owner.clone(),
                        to_id: target,
                        edge_type: EdgeType::Embeds,
                        weight: 1,
                        import_path: None,
                        repo_root: package_path.to_string(),
                    });
                }
            }
        }
    }

    /// Named (non-embedded) struct fields are type references, not embeds
    /// (spec.md §4.2 "references: type references in signatures and field
    /// types"). Anonymous fields are handled by `emit_embeds_edges` instead.
    fn emit_field_reference_edges(
        &self,
        decl: Node,
        bytes: &[u8],
        package_path: &str,
        index: &SymbolIndex,
        imports: &FileImports,
        edges: &mut Vec<Edge>,
    ) {
        let mut cursor = decl.walk();
        for spec in decl.children(&mut cursor).filter(|n| n.kind() == "type_spec") {
            let Some(name_node) = spec.child_by_field_name("name") else {
                continue;
            };
            let Some(type_node) = spec.child_by_field_name("type") else {
                continue;
            };
            if type_node.kind() != "struct_type" {
                continue;
            }
            let struct_name = text(name_node, bytes);
            let owner = ids::symbol_id(package_path, "struct", struct_name);
            let Some(field_list) = type_node.child_by_field_name("body") else {
                continue;
            };
            let mut field_cursor = field_list.walk();
            for field in field_list.children(&mut field_cursor).filter(|n| n.kind() == "field_declaration") {
                if field.child_by_field_name("name").is_none() {
                    continue;
                }
                let Some(field_type) = field.child_by_field_name("type") else {
                    continue;
                };
                let stripped = strip_type_decorations(text(field_type, bytes));
                if let Some(target) = self.resolve_type_reference(&stripped, package_path, index, imports) {
                    edges.push(Edge {
                        from_id: owner.clone(),
                        to_id: target,
                        edge_type: EdgeType::References,
                        weight: 1,
                        import_path: None,
                        repo_root: package_path.to_string(),
                    });
                }
            }
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn walk_body_for_calls(
        &self,
        decl: Node,
        bytes: &[u8],
        package_path: &str,
        owner_id: &str,
        receiver: Option<(String, String)>,
        index: &SymbolIndex,
        imports: &FileImports,
        edges: &mut Vec<Edge>,
    ) {
        let Some(body) = decl.child_by_field_name("body") else {
            return;
        };
        let mut stack = vec![body];
        while let Some(node) = stack.pop() {
            if node.kind() == "call_expression" {
                if let Some(function_node) = node.child_by_field_name("function") {
                    if let Some(callee_id) =
                        self.resolve_callee(function_node, bytes, package_path, &receiver, index, imports)
                    {
                        edges.push(Edge {
                            from_id: owner_id.to_string(),
                            to_id: callee_id,
                            edge_type: EdgeType::Calls,
                            weight: 1,
                            import_path: None,
                            repo_root: package_path.to_string(),
                        });
                    }
                }
            }
            let mut cursor = node.walk();
            stack.extend(node.children(&mut cursor));
        }
    }

    fn resolve_callee(
        &self,
        function_node: Node,
        bytes: &[u8],
        package_path: &str,
        receiver: &Option<(String, String)>,
        index: &SymbolIndex,
        imports: &FileImports,
    ) -> Option<String> {
        match function_node.kind() {
            "identifier" => {
                let name = text(function_node, bytes);
                index
                    .find(package_path, name, &[SymbolKind::Func])
                    .first()
                    .map(|s| s.id.clone())
            }
            "selector_expression" => {
                let operand = function_node.child_by_field_name("operand")?;
                let field = function_node.child_by_field_name("field")?;
                let method_name = text(field, bytes);
                if operand.kind() == "identifier" {
                    let operand_name = text(operand, bytes);
                    if let Some((recv_var, recv_type)) = receiver {
                        if operand_name == recv_var {
                            return index
                                .find(package_path, method_name, &[SymbolKind::Method])
                                .into_iter()
                                .find(|s| s.id.starts_with(&format!("{package_path}:method:{recv_type}.")))
                                .map(|s| s.id.clone());
                        }
                    }
                    if let Some(import) = imports.by_alias.get(operand_name) {
                        if let Some(target_package) = &import.package_path {
                            return index
                                .find(target_package, method_name, &[SymbolKind::Func])
                                .first()
                                .map(|s| s.id.clone());
                        }
                    }
                }
                None
            }
            _ => None,
        }
    }

    fn emit_reference_edges(
        &self,
        decl: Node,
        bytes: &[u8],
        package_path: &str,
        owner_id: &str,
        index: &SymbolIndex,
        imports: &FileImports,
        edges: &mut Vec<Edge>,
    ) {
        let mut type_names = Vec::new();
        if let Some(params) = decl.child_by_field_name("parameters") {
            type_names.extend(param_types(params, bytes));
        }
        if let Some(result) = decl.child_by_field_name("result") {
            type_names.extend(result_types(result, bytes));
        }
        for raw in type_names {
            let stripped = strip_type_decorations(&raw);
            if let Some(target) = self.resolve_type_reference(&stripped, package_path, index, imports) {
                edges.push(Edge {
                    from_id: owner_id.to_string(),
                    to_id: target,
                    edge_type: EdgeType::References,
                    weight: 1,
                    import_path: None,
                    repo_root: package_path.to_string(),
                });
            }
        }
    }

    fn resolve_type_reference(
        &self,
        type_name: &str,
        package_path: &str,
        index: &SymbolIndex,
        imports: &FileImports,
    ) -> Option<String> {
        if let Some((alias, name)) = type_name.split_once('.') {
            let import = imports.by_alias.get(alias)?;
            let target_package = import.package_path.as_ref()?;
            return index
                .find(target_package, name, &[SymbolKind::Struct, SymbolKind::Interface])
                .first()
                .map(|s| s.id.clone());
        }
        index
            .find(package_path, type_name, &[SymbolKind::Struct, SymbolKind::Interface])
            .first()
            .map(|s| s.id.clone())
    }

    fn resolve_implements(&self, package_dirs: &[String], index: &SymbolIndex) -> Vec<Edge> {
        let mut edges = Vec::new();

        for package_path in package_dirs {
            for struct_sym in self.structs_in_package(package_path, index) {
                let struct_methods = index.struct_methods(package_path, &struct_sym.name);
                if struct_methods.is_empty() {
                    continue;
                }
                for iface in index.interfaces() {
                    let iface_methods = index.interface_methods(&iface.package_path, &iface.name);
                    if iface_methods.is_empty() {
                        continue;
                    }
                    let satisfies = iface_methods.iter().all(|im| {
                        struct_methods.iter().any(|sm| {
                            sm.name == im.name
                                && param_count(sm) == param_count(im)
                                && return_count(sm) == return_count(im)
                        })
                    });
                    if satisfies {
                        edges.push(Edge {
                            from_id: struct_sym.id.clone(),
                            to_id: iface.id.clone(),
                            edge_type: EdgeType::Implements,
                            weight: 1,
                            import_path: None,
                            repo_root: package_path.to_string(),
                        });
                    }
                }
            }
        }
        edges
    }

    fn structs_in_package<'a>(&self, package_path: &str, index: &'a SymbolIndex) -> Vec<&'a Symbol> {
        let prefix = format!("{package_path}:struct:");
        index.all_with_prefix(&prefix, SymbolKind::Struct)
    }
}

fn param_count(s: &Symbol) -> usize {
    s.type_detail.as_ref().map(|t| t.params.len()).unwrap_or(0)
}

fn return_count(s: &Symbol) -> usize {
    s.type_detail.as_ref().map(|t| t.returns.len()).unwrap_or(0)
}

fn text<'a>(node: Node, bytes: &'a [u8]) -> &'a str {
    node.utf8_text(bytes).unwrap_or("")
}

fn line_span(node: Node) -> (u32, u32) {
    (
        node.start_position().row as u32 + 1,
        node.end_position().row as u32 + 1,
    )
}

fn is_exported(name: &str) -> bool {
    name.chars().next().is_some_and(|c| c.is_uppercase())
}

fn doc_comment(node: Node, bytes: &[u8]) -> String {
    let mut lines = Vec::new();
    let mut sibling = node.prev_sibling();
    while let Some(n) = sibling {
        if n.kind() == "comment" {
            lines.push(text(n, bytes).trim_start_matches("//").trim().to_string());
            sibling = n.prev_sibling();
        } else {
            break;
        }
    }
    lines.reverse();
    lines.join(" ")
}

fn param_types(params: Node, bytes: &[u8]) -> Vec<String> {
    let mut out = Vec::new();
    let mut cursor = params.walk();
    for decl in params
        .children(&mut cursor)
        .filter(|n| n.kind() == "parameter_declaration" || n.kind() == "variadic_parameter_declaration")
    {
        if let Some(type_node) = decl.child_by_field_name("type") {
            out.push(text(type_node, bytes).to_string());
        }
    }
    out
}

fn result_types(result: Node, bytes: &[u8]) -> Vec<String> {
    match result.kind() {
        "parameter_list" => param_types(result, bytes),
        _ => vec![text(result, bytes).to_string()],
    }
}

fn receiver_type_name(receiver: Node, bytes: &[u8]) -> Option<String> {
    let mut cursor = receiver.walk();
    let decl = receiver
        .children(&mut cursor)
        .find(|n| n.kind() == "parameter_declaration")?;
    let type_node = decl.child_by_field_name("type")?;
    let raw = text(type_node, bytes);
    Some(strip_type_decorations(raw))
}

fn receiver_var_name(receiver: Node, bytes: &[u8]) -> Option<String> {
    let mut cursor = receiver.walk();
    let decl = receiver
        .children(&mut cursor)
        .find(|n| n.kind() == "parameter_declaration")?;
    let name_node = decl.child_by_field_name("name")?;
    Some(text(name_node, bytes).to_string())
}

fn strip_type_decorations(raw: &str) -> String {
    raw.trim_start_matches('*').trim_start_matches("[]").to_string()
}
