use crate::map::norms::{NormOrigin, NormSetDocument, NormTable};
use rusqlite::{Connection, OptionalExtension};
use std::path::Path;
use uuid::Uuid;

pub const DB_FILE_NAME: &str = "mapnorms.sqlite3";

pub fn open_db(workspace: &Path) -> anyhow::Result<Connection> {
    std::fs::create_dir_all(workspace)?;
    let db_path = workspace.join(DB_FILE_NAME);
    let conn = Connection::open(db_path)?;
    conn.execute("PRAGMA foreign_keys = ON", [])?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS settings(
            key TEXT PRIMARY KEY,
            value_json TEXT NOT NULL
        )",
        [],
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS norm_sets(
            id TEXT PRIMARY KEY,
            academic_year TEXT NOT NULL UNIQUE,
            format TEXT NOT NULL,
            fingerprint TEXT NOT NULL,
            document_json TEXT NOT NULL,
            imported_at TEXT NOT NULL
        )",
        [],
    )?;
    // Workspaces created before sources were tracked lack this column.
    ensure_norm_sets_source(&conn)?;
    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_norm_sets_fingerprint ON norm_sets(fingerprint)",
        [],
    )?;

    Ok(conn)
}

pub fn settings_get_json(
    conn: &Connection,
    key: &str,
) -> anyhow::Result<Option<serde_json::Value>> {
    let raw: Option<String> = conn
        .query_row(
            "SELECT value_json FROM settings WHERE key = ?",
            [key],
            |r| r.get(0),
        )
        .optional()?;
    match raw {
        None => Ok(None),
        Some(s) => Ok(Some(serde_json::from_str(&s)?)),
    }
}

pub fn settings_set_json(
    conn: &Connection,
    key: &str,
    value: &serde_json::Value,
) -> anyhow::Result<()> {
    conn.execute(
        "INSERT INTO settings(key, value_json) VALUES(?, ?)
         ON CONFLICT(key) DO UPDATE SET value_json = excluded.value_json",
        (key, serde_json::to_string(value)?),
    )?;
    Ok(())
}

#[derive(Debug, Clone)]
pub struct StoredNormSet {
    pub id: String,
    pub academic_year: String,
    pub fingerprint: String,
    pub document_json: String,
    pub imported_at: String,
}

/// Replaces any stored norm set for the same academic year. Returns the row id.
pub fn norm_set_upsert(conn: &Connection, table: &NormTable) -> anyhow::Result<String> {
    let NormOrigin::Imported {
        fingerprint,
        source,
    } = table.origin()
    else {
        anyhow::bail!("built-in norm tables are not stored in the workspace");
    };
    let doc: NormSetDocument = table.to_document();
    let document_json = serde_json::to_string(&doc)?;
    let id = Uuid::new_v4().to_string();
    let imported_at = chrono::Utc::now().to_rfc3339();

    conn.execute(
        "INSERT INTO norm_sets(
            id, academic_year, format, fingerprint, document_json, imported_at, source
         )
         VALUES(?, ?, ?, ?, ?, ?, ?)
         ON CONFLICT(academic_year) DO UPDATE SET
            id = excluded.id,
            format = excluded.format,
            fingerprint = excluded.fingerprint,
            document_json = excluded.document_json,
            imported_at = excluded.imported_at,
            source = excluded.source",
        (
            &id,
            table.academic_year(),
            &doc.format,
            fingerprint,
            &document_json,
            &imported_at,
            source.as_deref(),
        ),
    )?;
    Ok(id)
}

pub fn norm_sets_load(conn: &Connection) -> anyhow::Result<Vec<StoredNormSet>> {
    let mut stmt = conn.prepare(
        "SELECT id, academic_year, fingerprint, document_json, imported_at
         FROM norm_sets
         ORDER BY academic_year",
    )?;
    let rows = stmt
        .query_map([], |r| {
            Ok(StoredNormSet {
                id: r.get(0)?,
                academic_year: r.get(1)?,
                fingerprint: r.get(2)?,
                document_json: r.get(3)?,
                imported_at: r.get(4)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}

fn ensure_norm_sets_source(conn: &Connection) -> anyhow::Result<()> {
    if table_has_column(conn, "norm_sets", "source")? {
        return Ok(());
    }
    conn.execute("ALTER TABLE norm_sets ADD COLUMN source TEXT", [])?;
    Ok(())
}

fn table_has_column(conn: &Connection, table: &str, column: &str) -> anyhow::Result<bool> {
    let sql = format!("PRAGMA table_info({})", table);
    let mut stmt = conn.prepare(&sql)?;
    let mut rows = stmt.query([])?;
    while let Some(row) = rows.next()? {
        let name: String = row.get(1)?;
        if name == column {
            return Ok(true);
        }
    }
    Ok(false)
}
