//! Chunk database schema and versioned migrations.

use rusqlite::Connection;

use crate::error::StorageError;
use crate::Result;

/// Current schema version.
pub const SCHEMA_VERSION: i32 = 1;

const TABLES: &[&str] = &["chunks"];

/// Apply every migration newer than the database's recorded version.
///
/// # Errors
///
/// Returns [`StorageError::Migration`] if a migration fails.
pub fn migrate(conn: &Connection) -> Result<()> {
    conn.execute(
        "CREATE TABLE IF NOT EXISTS schema_migrations (
            version INTEGER PRIMARY KEY,
            applied_at INTEGER NOT NULL
        )",
        [],
    )
    .map_err(|e| StorageError::Migration(format!("failed to create migrations table: {e}")))?;

    let current = current_version(conn)?;
    if current > SCHEMA_VERSION {
        return Err(StorageError::Migration(format!(
            "database schema v{current} is newer than supported v{SCHEMA_VERSION}"
        ))
        .into());
    }

    if current < 1 {
        apply(conn, 1, V1)?;
    }

    Ok(())
}

const V1: &str = r"
    CREATE TABLE IF NOT EXISTS chunks (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        source TEXT NOT NULL,
        chunk_index INTEGER NOT NULL,
        total_chunks INTEGER NOT NULL,
        content TEXT NOT NULL,
        boundary_kind TEXT,
        boundary_types TEXT,
        start_index INTEGER,
        file_hash TEXT NOT NULL,
        indexed_at INTEGER NOT NULL,
        UNIQUE(source, chunk_index)
    );

    CREATE INDEX IF NOT EXISTS idx_chunks_source ON chunks(source);
";

fn apply(conn: &Connection, version: i32, sql: &str) -> Result<()> {
    tracing::info!(version, "Applying chunk database migration");

    conn.execute_batch(sql)
        .map_err(|e| StorageError::Migration(format!("v{version} migration failed: {e}")))?;

    conn.execute(
        "INSERT INTO schema_migrations (version, applied_at) VALUES (?, ?)",
        rusqlite::params![version, super::models::now_unix()],
    )
    .map_err(|e| StorageError::Migration(format!("failed to record migration: {e}")))?;

    Ok(())
}

fn current_version(conn: &Connection) -> Result<i32> {
    conn.query_row(
        "SELECT COALESCE(MAX(version), 0) FROM schema_migrations",
        [],
        |row| row.get(0),
    )
    .map_err(|e| StorageError::Migration(format!("failed to read schema version: {e}")).into())
}

/// Check that every expected table exists.
///
/// # Errors
///
/// Returns [`StorageError::Migration`] naming the first missing table.
pub fn verify_schema(conn: &Connection) -> Result<()> {
    for table in TABLES {
        let exists = conn
            .query_row(
                "SELECT 1 FROM sqlite_master WHERE type = 'table' AND name = ?",
                [table],
                |_| Ok(()),
            )
            .is_ok();

        if !exists {
            return Err(StorageError::Migration(format!("table '{table}' not found")).into());
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::Database;

    #[test]
    fn test_migrate_is_idempotent() {
        let db = Database::open_in_memory().unwrap();
        db.with_conn(|conn| {
            migrate(conn)?;
            migrate(conn)?;
            verify_schema(conn)?;
            assert_eq!(current_version(conn)?, SCHEMA_VERSION);
            Ok(())
        })
        .unwrap();
    }

    #[test]
    fn test_unique_source_chunk_index() {
        let db = Database::open_in_memory().unwrap();
        db.with_conn(|conn| {
            migrate(conn)?;

            let insert = "INSERT INTO chunks (source, chunk_index, total_chunks, content, \
                          file_hash, indexed_at) VALUES ('a.rs', 0, 1, 'fn a() {}', 'h', 0)";
            conn.execute(insert, []).unwrap();
            assert!(conn.execute(insert, []).is_err());
            Ok(())
        })
        .unwrap();
    }

    #[test]
    fn test_newer_schema_is_rejected() {
        let db = Database::open_in_memory().unwrap();
        db.with_conn(|conn| {
            migrate(conn)?;
            conn.execute(
                "INSERT INTO schema_migrations (version, applied_at) VALUES (99, 0)",
                [],
            )
            .unwrap();
            assert!(migrate(conn).is_err());
            Ok(())
        })
        .unwrap();
    }

    #[test]
    fn test_verify_schema_detects_missing_table() {
        let db = Database::open_in_memory().unwrap();
        db.with_conn(|conn| {
            assert!(verify_schema(conn).is_err());
            Ok(())
        })
        .unwrap();
    }
}
