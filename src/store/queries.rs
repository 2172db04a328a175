//! CRUD, batch-write, and query surface of the Store (spec.md §4.1).

use crate::domain::error::{Error, Result};
use crate::domain::types::{Edge, EdgeType, EmbeddingRecord, Package, Repository, Symbol, SymbolKind};
use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;
use std::sync::Mutex;

use super::schema;
use super::vector::{blob_to_vector, vector_to_blob};

/// Direction filter for edge traversal (`refs` MCP tool, spec.md §6).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EdgeDirection {
    /// Edges pointing into the symbol.
    Incoming,
    /// Edges pointing out of the symbol.
    Outgoing,
    /// Both directions.
    Both,
}

/// The embedded SQLite store.
pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    /// Open (creating parent directories and the file as needed) and install
    /// the schema if this is a fresh database.
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let conn = Connection::open(path)?;
        conn.pragma_update(None, "foreign_keys", "ON")?;
        conn.pragma_update(None, "journal_mode", "WAL")?;
        conn.pragma_update(None, "synchronous", "NORMAL")?;
        schema::ensure_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Open an in-memory store, used by tests.
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        conn.pragma_update(None, "foreign_keys", "ON")?;
        schema::ensure_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Wipe every table (spec.md §4.1 `Clear()`).
    pub fn clear(&self) -> Result<()> {
        let conn = self.conn.lock().unwrap();
        schema::clear_all(&conn)?;
        Ok(())
    }

    // ---- batch writes -----------------------------------------------

    /// Insert symbols in a single all-or-nothing transaction. Conflicting
    /// ids are a hard failure; callers replacing symbols must delete first
    /// (spec.md §4.1).
    pub fn insert_symbols(&self, symbols: &[Symbol]) -> Result<()> {
        let mut conn = self.conn.lock().unwrap();
        let tx = conn.transaction()?;
        for s in symbols {
            let keywords = serde_json::to_string(&s.keywords)?;
            let type_detail = match &s.type_detail {
                Some(td) => Some(serde_json::to_string(td)?),
                None => None,
            };
            tx.execute(
                "INSERT INTO symbols (
                    id, repo_root, kind, package_path, package_short_name, name, signature,
                    file_path, line_start, line_end, doc, exported, semantic_text, keywords, type_detail
                ) VALUES (?1,?2,?3,?4,?5,?6,?7,?8,?9,?10,?11,?12,?13,?14,?15)",
                params![
                    s.id,
                    s.repo_root,
                    s.kind.as_str(),
                    s.package_path,
                    s.package_short_name,
                    s.name,
                    s.signature,
                    s.file_path,
                    s.line_start,
                    s.line_end,
                    s.doc,
                    s.exported as i64,
                    s.semantic_text,
                    keywords,
                    type_detail,
                ],
            )?;
        }
        tx.commit()?;
        Ok(())
    }

    /// Insert edges in a single all-or-nothing transaction. On conflict of
    /// `(from_id, to_id, edge_type)`, merge weight (keep max) and preserve a
    /// non-null import path (spec.md §3/§4.1).
    pub fn insert_edges(&self, edges: &[Edge]) -> Result<()> {
        let mut conn = self.conn.lock().unwrap();
        let tx = conn.transaction()?;
        for e in edges {
            tx.execute(
                "INSERT INTO edges (repo_root, from_id, to_id, edge_type, weight, import_path)
                 VALUES (?1,?2,?3,?4,?5,?6)
                 ON CONFLICT(repo_root, from_id, to_id, edge_type) DO UPDATE SET
                    weight = MAX(weight, excluded.weight),
                    import_path = COALESCE(edges.import_path, excluded.import_path)",
                params![
                    e.repo_root,
                    e.from_id,
                    e.to_id,
                    e.edge_type.as_str(),
                    e.weight,
                    e.import_path,
                ],
            )?;
        }
        tx.commit()?;
        Ok(())
    }

    /// Insert packages in a single all-or-nothing transaction. Conflicting
    /// paths are a hard failure, same replace-by-delete contract as symbols.
    pub fn insert_packages(&self, packages: &[Package]) -> Result<()> {
        let mut conn = self.conn.lock().unwrap();
        let tx = conn.transaction()?;
        for p in packages {
            tx.execute(
                "INSERT INTO packages (
                    path, repo_root, short_name, role, summary, key_types, key_funcs,
                    interfaces, imports, imported_by, file_count, symbol_count
                ) VALUES (?1,?2,?3,?4,?5,?6,?7,?8,?9,?10,?11,?12)",
                params![
                    p.path,
                    p.repo_root,
                    p.short_name,
                    p.role,
                    p.summary,
                    serde_json::to_string(&p.key_types)?,
                    serde_json::to_string(&p.key_funcs)?,
                    serde_json::to_string(&p.interfaces)?,
                    serde_json::to_string(&p.imports)?,
                    serde_json::to_string(&p.imported_by)?,
                    p.file_count,
                    p.symbol_count,
                ],
            )?;
        }
        tx.commit()?;
        Ok(())
    }

    /// Insert embeddings in a single all-or-nothing transaction.
    pub fn insert_embeddings(&self, embeddings: &[EmbeddingRecord], repo_root: &str) -> Result<()> {
        let mut conn = self.conn.lock().unwrap();
        let tx = conn.transaction()?;
        for e in embeddings {
            let blob = vector_to_blob(&e.vector);
            tx.execute(
                "INSERT INTO embeddings (symbol_id, repo_root, vector, dimension, model, created_at)
                 VALUES (?1,?2,?3,?4,?5,?6)",
                params![
                    e.symbol_id,
                    repo_root,
                    blob,
                    e.vector.len() as i64,
                    e.model,
                    e.created_at.to_rfc3339(),
                ],
            )?;
        }
        tx.commit()?;
        Ok(())
    }

    // ---- deletion -----------------------------------------------------

    /// Delete every row belonging to a repository, cascading to edges and
    /// embeddings via foreign keys.
    pub fn delete_by_repo(&self, repo_root: &str) -> Result<()> {
        let mut conn = self.conn.lock().unwrap();
        let tx = conn.transaction()?;
        tx.execute("DELETE FROM symbols WHERE repo_root = ?1", params![repo_root])?;
        tx.execute("DELETE FROM packages WHERE repo_root = ?1", params![repo_root])?;
        tx.execute(
            "DELETE FROM repositories WHERE root_path = ?1 OR id = ?1",
            params![repo_root],
        )?;
        tx.commit()?;
        Ok(())
    }

    /// Delete every symbol/edge/embedding/package row for one package path,
    /// cascading via foreign keys.
    pub fn delete_by_package(&self, repo_root: &str, package_path: &str) -> Result<()> {
        let mut conn = self.conn.lock().unwrap();
        let tx = conn.transaction()?;
        tx.execute(
            "DELETE FROM symbols WHERE repo_root = ?1 AND package_path = ?2",
            params![repo_root, package_path],
        )?;
        tx.execute(
            "DELETE FROM packages WHERE repo_root = ?1 AND path = ?2",
            params![repo_root, package_path],
        )?;
        tx.commit()?;
        Ok(())
    }

    /// Delete a single symbol row, cascading to its edges and embedding.
    pub fn delete_by_symbol(&self, repo_root: &str, id: &str) -> Result<()> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "DELETE FROM symbols WHERE repo_root = ?1 AND id = ?2",
            params![repo_root, id],
        )?;
        Ok(())
    }

    // ---- repository metadata -------------------------------------------

    /// Returns `None` (not an error) when the repository has never been
    /// recorded (spec.md §4.1).
    pub fn get_repository(&self, root_path: &str) -> Result<Option<Repository>> {
        let conn = self.conn.lock().unwrap();
        let row = conn
            .query_row(
                "SELECT id, root_path, last_indexed_at, symbol_count, package_count, edge_count,
                        has_embeddings, created_at, updated_at
                 FROM repositories WHERE root_path = ?1",
                params![root_path],
                |row| {
                    let last_indexed_at: Option<String> = row.get(2)?;
                    let created_at: String = row.get(7)?;
                    let updated_at: String = row.get(8)?;
                    Ok(Repository {
                        id: row.get(0)?,
                        root_path: row.get(1)?,
                        last_indexed_at: last_indexed_at
                            .and_then(|s| chrono::DateTime::parse_from_rfc3339(&s).ok())
                            .map(|d| d.with_timezone(&Utc)),
                        symbol_count: row.get::<_, i64>(3)? as u64,
                        package_count: row.get::<_, i64>(4)? as u64,
                        edge_count: row.get::<_, i64>(5)? as u64,
                        has_embeddings: row.get::<_, i64>(6)? != 0,
                        created_at: chrono::DateTime::parse_from_rfc3339(&created_at)
                            .map(|d| d.with_timezone(&Utc))
                            .unwrap_or_else(|_| Utc::now()),
                        updated_at: chrono::DateTime::parse_from_rfc3339(&updated_at)
                            .map(|d| d.with_timezone(&Utc))
                            .unwrap_or_else(|_| Utc::now()),
                    })
                },
            )
            .optional()?;
        Ok(row)
    }

    /// Set created-at on first write, always bump updated-at. `last_indexed_at`
    /// serializes as SQL null when absent (spec.md §4.1).
    pub fn upsert_repository(&self, repo: &Repository) -> Result<()> {
        let conn = self.conn.lock().unwrap();
        let existing_created_at: Option<String> = conn
            .query_row(
                "SELECT created_at FROM repositories WHERE id = ?1",
                params![repo.id],
                |row| row.get(0),
            )
            .optional()?;

        let created_at = existing_created_at.unwrap_or_else(|| repo.created_at.to_rfc3339());
        let now = Utc::now().to_rfc3339();
        let last_indexed_at = repo.last_indexed_at.map(|d| d.to_rfc3339());

        conn.execute(
            "INSERT INTO repositories (
                id, root_path, last_indexed_at, symbol_count, package_count, edge_count,
                has_embeddings, created_at, updated_at
             ) VALUES (?1,?2,?3,?4,?5,?6,?7,?8,?9)
             ON CONFLICT(root_path) DO UPDATE SET
                last_indexed_at = excluded.last_indexed_at,
                symbol_count = excluded.symbol_count,
                package_count = excluded.package_count,
                edge_count = excluded.edge_count,
                has_embeddings = excluded.has_embeddings,
                updated_at = excluded.updated_at",
            params![
                repo.id,
                repo.root_path,
                last_indexed_at,
                repo.symbol_count as i64,
                repo.package_count as i64,
                repo.edge_count as i64,
                repo.has_embeddings as i64,
                created_at,
                now,
            ],
        )?;
        Ok(())
    }

    // ---- symbol/package lookups -----------------------------------------

    fn row_to_symbol(row: &rusqlite::Row) -> rusqlite::Result<Symbol> {
        let kind_str: String = row.get(2)?;
        let keywords_json: String = row.get(13)?;
        let type_detail_json: Option<String> = row.get(14)?;
        Ok(Symbol {
            id: row.get(0)?,
            repo_root: row.get(1)?,
            kind: parse_kind(&kind_str),
            package_path: row.get(3)?,
            package_short_name: row.get(4)?,
            name: row.get(5)?,
            signature: row.get(6)?,
            file_path: row.get(7)?,
            line_start: row.get::<_, i64>(8)? as u32,
            line_end: row.get::<_, i64>(9)? as u32,
            doc: row.get(10)?,
            exported: row.get::<_, i64>(11)? != 0,
            semantic_text: row.get(12)?,
            keywords: serde_json::from_str(&keywords_json).unwrap_or_default(),
            type_detail: type_detail_json.and_then(|s| serde_json::from_str(&s).ok()),
        })
    }

    const SYMBOL_COLUMNS: &'static str = "id, repo_root, kind, package_path, package_short_name, \
        name, signature, file_path, line_start, line_end, doc, exported, semantic_text, keywords, type_detail";

    /// Fetch a symbol by id.
    pub fn get_symbol(&self, repo_root: &str, id: &str) -> Result<Option<Symbol>> {
        let conn = self.conn.lock().unwrap();
        let sql = format!(
            "SELECT {} FROM symbols WHERE repo_root = ?1 AND id = ?2",
            Self::SYMBOL_COLUMNS
        );
        let row = conn
            .query_row(&sql, params![repo_root, id], Self::row_to_symbol)
            .optional()?;
        Ok(row)
    }

    /// Fetch symbols matching a name (used by MCP tools that accept a name
    /// instead of an id).
    pub fn get_symbols_by_name(&self, repo_root: &str, name: &str) -> Result<Vec<Symbol>> {
        let conn = self.conn.lock().unwrap();
        let sql = format!(
            "SELECT {} FROM symbols WHERE repo_root = ?1 AND name = ?2",
            Self::SYMBOL_COLUMNS
        );
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
            .query_map(params![repo_root, name], Self::row_to_symbol)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
    }

    /// All symbols belonging to a package.
    pub fn list_symbols_for_package(&self, repo_root: &str, package_path: &str) -> Result<Vec<Symbol>> {
        let conn = self.conn.lock().unwrap();
        let sql = format!(
            "SELECT {} FROM symbols WHERE repo_root = ?1 AND package_path = ?2",
            Self::SYMBOL_COLUMNS
        );
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
            .query_map(params![repo_root, package_path], Self::row_to_symbol)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
    }

    /// All known file paths for a repo, used by change detection.
    pub fn list_known_files(&self, repo_root: &str) -> Result<Vec<String>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(
            "SELECT DISTINCT file_path FROM symbols WHERE repo_root = ?1 AND kind = 'file'",
        )?;
        let rows = stmt
            .query_map(params![repo_root], |row| row.get::<_, String>(0))?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
    }

    /// All packages known for a repo, keyed by package path.
    pub fn list_known_packages(&self, repo_root: &str) -> Result<Vec<String>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare("SELECT path FROM packages WHERE repo_root = ?1")?;
        let rows = stmt
            .query_map(params![repo_root], |row| row.get::<_, String>(0))?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
    }

    fn row_to_package(row: &rusqlite::Row) -> rusqlite::Result<Package> {
        let key_types: String = row.get(5)?;
        let key_funcs: String = row.get(6)?;
        let interfaces: String = row.get(7)?;
        let imports: String = row.get(8)?;
        let imported_by: String = row.get(9)?;
        Ok(Package {
            path: row.get(0)?,
            repo_root: row.get(1)?,
            short_name: row.get(2)?,
            role: row.get(3)?,
            summary: row.get(4)?,
            key_types: serde_json::from_str(&key_types).unwrap_or_default(),
            key_funcs: serde_json::from_str(&key_funcs).unwrap_or_default(),
            interfaces: serde_json::from_str(&interfaces).unwrap_or_default(),
            imports: serde_json::from_str(&imports).unwrap_or_default(),
            imported_by: serde_json::from_str(&imported_by).unwrap_or_default(),
            file_count: row.get::<_, i64>(10)? as u32,
            symbol_count: row.get::<_, i64>(11)? as u32,
        })
    }

    const PACKAGE_COLUMNS: &'static str = "path, repo_root, short_name, role, summary, key_types, \
        key_funcs, interfaces, imports, imported_by, file_count, symbol_count";

    /// Fetch a package by path.
    pub fn get_package(&self, repo_root: &str, path: &str) -> Result<Option<Package>> {
        let conn = self.conn.lock().unwrap();
        let sql = format!(
            "SELECT {} FROM packages WHERE repo_root = ?1 AND path = ?2",
            Self::PACKAGE_COLUMNS
        );
        let row = conn
            .query_row(&sql, params![repo_root, path], Self::row_to_package)
            .optional()?;
        Ok(row)
    }

    /// All packages for a repository.
    pub fn list_packages(&self, repo_root: &str) -> Result<Vec<Package>> {
        let conn = self.conn.lock().unwrap();
        let sql = format!(
            "SELECT {} FROM packages WHERE repo_root = ?1",
            Self::PACKAGE_COLUMNS
        );
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
            .query_map(params![repo_root], Self::row_to_package)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
    }

    // ---- vectors --------------------------------------------------------

    /// Every stored `(symbol_id, vector)` pair for a repo. Blobs with a
    /// corrupt (non-multiple-of-4) length are skipped (spec.md §4.1).
    pub fn all_vectors(&self, repo_root: &str) -> Result<Vec<(String, Vec<f32>)>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt =
            conn.prepare("SELECT symbol_id, vector FROM embeddings WHERE repo_root = ?1")?;
        let rows = stmt
            .query_map(params![repo_root], |row| {
                let id: String = row.get(0)?;
                let blob: Vec<u8> = row.get(1)?;
                Ok((id, blob))
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows
            .into_iter()
            .filter_map(|(id, blob)| blob_to_vector(&blob).map(|v| (id, v)))
            .collect())
    }

    /// True if the repo has at least one stored embedding.
    pub fn has_embeddings(&self, repo_root: &str) -> Result<bool> {
        let conn = self.conn.lock().unwrap();
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM embeddings WHERE repo_root = ?1",
            params![repo_root],
            |row| row.get(0),
        )?;
        Ok(count > 0)
    }

    // ---- full-text search -------------------------------------------------

    /// Run the FTS query, retrying with a sanitized variant on a syntax
    /// error (spec.md §4.1). Returns symbol ids ranked best-first.
    pub fn fts_search(&self, repo_root: &str, query: &str, limit: usize) -> Result<Vec<String>> {
        match self.fts_search_raw(repo_root, query, limit) {
            Ok(ids) => Ok(ids),
            Err(_) => {
                let sanitized = super::sanitize_fts_query(query);
                if sanitized.is_empty() {
                    Ok(Vec::new())
                } else {
                    self.fts_search_raw(repo_root, &sanitized, limit)
                }
            }
        }
    }

    fn fts_search_raw(&self, repo_root: &str, query: &str, limit: usize) -> Result<Vec<String>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(
            "SELECT s.id FROM symbol_fts f
             JOIN symbols s ON s.rowid_pk = f.rowid
             WHERE f.symbol_fts MATCH ?1 AND s.repo_root = ?2
             ORDER BY bm25(f.symbol_fts)
             LIMIT ?3",
        )?;
        let rows = stmt
            .query_map(params![query, repo_root, limit as i64], |row| {
                row.get::<_, String>(0)
            })
            .map_err(Error::from)?
            .collect::<rusqlite::Result<Vec<_>>>()
            .map_err(Error::from)?;
        Ok(rows)
    }

    // ---- edges --------------------------------------------------------

    /// Edges touching `symbol_id`, filtered by direction and optionally by
    /// edge type (`refs` MCP tool).
    pub fn edges_for_symbol(
        &self,
        repo_root: &str,
        symbol_id: &str,
        edge_type: Option<EdgeType>,
        direction: EdgeDirection,
        limit: usize,
    ) -> Result<Vec<Edge>> {
        let conn = self.conn.lock().unwrap();
        let direction_clause = match direction {
            EdgeDirection::Incoming => "to_id = ?2",
            EdgeDirection::Outgoing => "from_id = ?2",
            EdgeDirection::Both => "(from_id = ?2 OR to_id = ?2)",
        };
        let sql = format!(
            "SELECT from_id, to_id, edge_type, weight, import_path, repo_root FROM edges
             WHERE repo_root = ?1 AND {direction_clause}
             {type_clause}
             LIMIT ?3",
            type_clause = if edge_type.is_some() { "AND edge_type = ?4" } else { "" }
        );
        let mut stmt = conn.prepare(&sql)?;
        let map_row = |row: &rusqlite::Row| -> rusqlite::Result<Edge> {
            let edge_type_str: String = row.get(2)?;
            Ok(Edge {
                from_id: row.get(0)?,
                to_id: row.get(1)?,
                edge_type: parse_edge_type(&edge_type_str),
                weight: row.get::<_, i64>(3)? as u32,
                import_path: row.get(4)?,
                repo_root: row.get(5)?,
            })
        };
        let rows = if let Some(et) = edge_type {
            stmt.query_map(
                params![repo_root, symbol_id, limit as i64, et.as_str()],
                map_row,
            )?
            .collect::<rusqlite::Result<Vec<_>>>()?
        } else {
            stmt.query_map(params![repo_root, symbol_id, limit as i64], map_row)?
                .collect::<rusqlite::Result<Vec<_>>>()?
        };
        Ok(rows)
    }

    /// All edges for a repo (used by PageRank's induced subgraph construction).
    pub fn all_edges(&self, repo_root: &str, edge_type: Option<EdgeType>) -> Result<Vec<Edge>> {
        let conn = self.conn.lock().unwrap();
        let sql = if edge_type.is_some() {
            "SELECT from_id, to_id, edge_type, weight, import_path, repo_root FROM edges
             WHERE repo_root = ?1 AND edge_type = ?2"
        } else {
            "SELECT from_id, to_id, edge_type, weight, import_path, repo_root FROM edges
             WHERE repo_root = ?1"
        };
        let mut stmt = conn.prepare(sql)?;
        let map_row = |row: &rusqlite::Row| -> rusqlite::Result<Edge> {
            let edge_type_str: String = row.get(2)?;
            Ok(Edge {
                from_id: row.get(0)?,
                to_id: row.get(1)?,
                edge_type: parse_edge_type(&edge_type_str),
                weight: row.get::<_, i64>(3)? as u32,
                import_path: row.get(4)?,
                repo_root: row.get(5)?,
            })
        };
        let rows = if let Some(et) = edge_type {
            stmt.query_map(params![repo_root, et.as_str()], map_row)?
                .collect::<rusqlite::Result<Vec<_>>>()?
        } else {
            stmt.query_map(params![repo_root], map_row)?
                .collect::<rusqlite::Result<Vec<_>>>()?
        };
        Ok(rows)
    }

    // ---- counts ---------------------------------------------------------

    /// `(symbol_count, package_count, edge_count)` for a repo.
    pub fn counts(&self, repo_root: &str) -> Result<(u64, u64, u64)> {
        let conn = self.conn.lock().unwrap();
        let symbols: i64 = conn.query_row(
            "SELECT COUNT(*) FROM symbols WHERE repo_root = ?1",
            params![repo_root],
            |row| row.get(0),
        )?;
        let packages: i64 = conn.query_row(
            "SELECT COUNT(*) FROM packages WHERE repo_root = ?1",
            params![repo_root],
            |row| row.get(0),
        )?;
        let edges: i64 = conn.query_row(
            "SELECT COUNT(*) FROM edges WHERE repo_root = ?1",
            params![repo_root],
            |row| row.get(0),
        )?;
        Ok((symbols as u64, packages as u64, edges as u64))
    }
}

fn parse_kind(s: &str) -> SymbolKind {
    match s {
        "package" => SymbolKind::Package,
        "file" => SymbolKind::File,
        "interface" => SymbolKind::Interface,
        "struct" => SymbolKind::Struct,
        "func" => SymbolKind::Func,
        "method" => SymbolKind::Method,
        "const" => SymbolKind::Const,
        "var" => SymbolKind::Var,
        _ => SymbolKind::Field,
    }
}

fn parse_edge_type(s: &str) -> EdgeType {
    EdgeType::parse(s).unwrap_or(EdgeType::References)
}
