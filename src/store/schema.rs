//! Schema install and additive, numbered migrations (spec.md §4.1).

use rusqlite::Connection;

/// Migrations applied in order, each wrapped in its own transaction by the
/// caller. Index 0 is "version 1", etc. — additive only, never rewritten.
const MIGRATIONS: &[&str] = &[MIGRATION_1];

const MIGRATION_1: &str = r#"
CREATE TABLE repositories (
    id TEXT PRIMARY KEY,
    root_path TEXT NOT NULL UNIQUE,
    last_indexed_at TEXT,
    symbol_count INTEGER NOT NULL DEFAULT 0,
    package_count INTEGER NOT NULL DEFAULT 0,
    edge_count INTEGER NOT NULL DEFAULT 0,
    has_embeddings INTEGER NOT NULL DEFAULT 0,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL
);

CREATE TABLE packages (
    path TEXT NOT NULL,
    repo_root TEXT NOT NULL,
    short_name TEXT NOT NULL,
    role TEXT NOT NULL DEFAULT '',
    summary TEXT NOT NULL DEFAULT '',
    key_types TEXT NOT NULL DEFAULT '[]',
    key_funcs TEXT NOT NULL DEFAULT '[]',
    interfaces TEXT NOT NULL DEFAULT '[]',
    imports TEXT NOT NULL DEFAULT '[]',
    imported_by TEXT NOT NULL DEFAULT '[]',
    file_count INTEGER NOT NULL DEFAULT 0,
    symbol_count INTEGER NOT NULL DEFAULT 0,
    PRIMARY KEY (repo_root, path)
);

CREATE TABLE symbols (
    rowid_pk INTEGER PRIMARY KEY AUTOINCREMENT,
    id TEXT NOT NULL,
    repo_root TEXT NOT NULL,
    kind TEXT NOT NULL,
    package_path TEXT NOT NULL,
    package_short_name TEXT NOT NULL,
    name TEXT NOT NULL,
    signature TEXT,
    file_path TEXT NOT NULL,
    line_start INTEGER NOT NULL,
    line_end INTEGER NOT NULL,
    doc TEXT NOT NULL DEFAULT '',
    exported INTEGER NOT NULL DEFAULT 0,
    semantic_text TEXT NOT NULL DEFAULT '',
    keywords TEXT NOT NULL DEFAULT '[]',
    type_detail TEXT,
    UNIQUE (repo_root, id)
);

CREATE INDEX idx_symbols_repo_package ON symbols (repo_root, package_path);
CREATE INDEX idx_symbols_repo_file ON symbols (repo_root, file_path);
CREATE INDEX idx_symbols_name ON symbols (name);

CREATE TABLE edges (
    edge_id INTEGER PRIMARY KEY AUTOINCREMENT,
    repo_root TEXT NOT NULL,
    from_id TEXT NOT NULL,
    to_id TEXT NOT NULL,
    edge_type TEXT NOT NULL,
    weight INTEGER NOT NULL DEFAULT 1,
    import_path TEXT,
    UNIQUE (repo_root, from_id, to_id, edge_type),
    FOREIGN KEY (repo_root, from_id) REFERENCES symbols (repo_root, id) ON DELETE CASCADE,
    FOREIGN KEY (repo_root, to_id) REFERENCES symbols (repo_root, id) ON DELETE CASCADE
);

CREATE INDEX idx_edges_from ON edges (repo_root, from_id, edge_type);
CREATE INDEX idx_edges_to ON edges (repo_root, to_id, edge_type);

CREATE TABLE embeddings (
    symbol_id TEXT NOT NULL,
    repo_root TEXT NOT NULL,
    vector BLOB NOT NULL,
    dimension INTEGER NOT NULL,
    model TEXT NOT NULL,
    created_at TEXT NOT NULL,
    PRIMARY KEY (repo_root, symbol_id),
    FOREIGN KEY (repo_root, symbol_id) REFERENCES symbols (repo_root, id) ON DELETE CASCADE
);

CREATE VIRTUAL TABLE symbol_fts USING fts5(
    name,
    semantic_text,
    content = 'symbols',
    content_rowid = 'rowid_pk'
);

CREATE TRIGGER symbols_fts_insert AFTER INSERT ON symbols BEGIN
    INSERT INTO symbol_fts(rowid, name, semantic_text)
    VALUES (new.rowid_pk, new.name, new.semantic_text);
END;

CREATE TRIGGER symbols_fts_delete AFTER DELETE ON symbols BEGIN
    INSERT INTO symbol_fts(symbol_fts, rowid, name, semantic_text)
    VALUES ('delete', old.rowid_pk, old.name, old.semantic_text);
END;

CREATE TRIGGER symbols_fts_update AFTER UPDATE ON symbols BEGIN
    INSERT INTO symbol_fts(symbol_fts, rowid, name, semantic_text)
    VALUES ('delete', old.rowid_pk, old.name, old.semantic_text);
    INSERT INTO symbol_fts(rowid, name, semantic_text)
    VALUES (new.rowid_pk, new.name, new.semantic_text);
END;
"#;

/// Install the schema if absent, then apply any migrations newer than the
/// currently recorded version. One-shot on a fresh file; additive after that.
pub fn ensure_schema(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS schema_version (version INTEGER NOT NULL, applied_at TEXT NOT NULL)",
    )?;

    let current: i64 = conn
        .query_row(
            "SELECT COALESCE(MAX(version), 0) FROM schema_version",
            [],
            |row| row.get(0),
        )
        .unwrap_or(0);

    for (idx, migration) in MIGRATIONS.iter().enumerate() {
        let version = (idx + 1) as i64;
        if version <= current {
            continue;
        }
        conn.execute_batch(migration)?;
        conn.execute(
            "INSERT INTO schema_version (version, applied_at) VALUES (?1, datetime('now'))",
            [version],
        )?;
    }

    Ok(())
}

/// Wipe every table's contents and re-record the current schema version
/// (spec.md §4.1 `Clear()`).
pub fn clear_all(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(
        "DELETE FROM embeddings;
         DELETE FROM edges;
         DELETE FROM symbols;
         DELETE FROM packages;
         DELETE FROM repositories;",
    )?;
    let version = MIGRATIONS.len() as i64;
    conn.execute("DELETE FROM schema_version", [])?;
    conn.execute(
        "INSERT INTO schema_version (version, applied_at) VALUES (?1, datetime('now'))",
        [version],
    )?;
    Ok(())
}
