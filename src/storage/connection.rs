//! `SQLite` connection handling.
//!
//! One connection per chunk database, guarded by a `parking_lot::Mutex` and
//! configured for WAL so readers in other processes are not blocked by the
//! indexer.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::Mutex;
use rusqlite::{Connection, OpenFlags, TransactionBehavior};

use crate::error::StorageError;
use crate::Result;

/// Shared handle to one chunk database. Clone is cheap.
#[derive(Clone)]
pub struct Database {
    conn: Arc<Mutex<Connection>>,
    path: Option<PathBuf>,
}

impl Database {
    /// Open (creating if needed) the database at `path`.
    ///
    /// # Errors
    ///
    /// Returns an error if the file or its parent directories cannot be
    /// created, or the connection cannot be configured.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let conn = Connection::open_with_flags(
            path,
            OpenFlags::SQLITE_OPEN_READ_WRITE
                | OpenFlags::SQLITE_OPEN_CREATE
                | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )
        .map_err(|e| StorageError::Database(format!("failed to open '{}': {e}", path.display())))?;

        Self::configured(conn, Some(path.to_path_buf()))
    }

    /// Open a private in-memory database.
    ///
    /// # Errors
    ///
    /// Returns an error if `SQLite` cannot allocate the database.
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()
            .map_err(|e| StorageError::Database(format!("failed to open in-memory database: {e}")))?;
        Self::configured(conn, None)
    }

    fn configured(conn: Connection, path: Option<PathBuf>) -> Result<Self> {
        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            PRAGMA temp_store = MEMORY;
            PRAGMA busy_timeout = 5000;
            ",
        )
        .map_err(|e| StorageError::Database(format!("failed to configure database: {e}")))?;

        let db = Self {
            conn: Arc::new(Mutex::new(conn)),
            path,
        };
        tracing::debug!(path = %db.display_path(), "Database opened");
        Ok(db)
    }

    /// Run `f` with the connection locked.
    ///
    /// # Errors
    ///
    /// Propagates the error returned by `f`.
    pub fn with_conn<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&Connection) -> Result<T>,
    {
        let conn = self.conn.lock();
        f(&conn)
    }

    /// Run `f` inside a `BEGIN IMMEDIATE` transaction.
    ///
    /// The transaction commits if `f` succeeds and rolls back otherwise.
    ///
    /// # Errors
    ///
    /// Propagates the error returned by `f`, or a storage error if the
    /// transaction cannot be started or committed.
    pub fn with_transaction<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&Connection) -> Result<T>,
    {
        let mut conn = self.conn.lock();
        let tx = conn
            .transaction_with_behavior(TransactionBehavior::Immediate)
            .map_err(|e| StorageError::Database(format!("failed to begin transaction: {e}")))?;

        let value = f(&tx)?;

        tx.commit()
            .map_err(|e| StorageError::Database(format!("failed to commit: {e}")))?;
        Ok(value)
    }

    /// Database file, or `None` for in-memory databases.
    #[must_use]
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    fn display_path(&self) -> String {
        self.path
            .as_ref()
            .map_or_else(|| ":memory:".to_string(), |p| p.display().to_string())
    }
}

impl std::fmt::Debug for Database {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Database")
            .field("path", &self.display_path())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn count(db: &Database) -> i64 {
        db.with_conn(|conn| {
            conn.query_row("SELECT COUNT(*) FROM t", [], |row| row.get(0))
                .map_err(|e| StorageError::Database(e.to_string()).into())
        })
        .unwrap()
    }

    fn create_table(db: &Database) {
        db.with_conn(|conn| {
            conn.execute("CREATE TABLE t (id INTEGER PRIMARY KEY)", [])
                .map_err(|e| StorageError::Database(e.to_string()))?;
            Ok(())
        })
        .unwrap();
    }

    #[test]
    fn test_open_creates_parent_dirs() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("index").join("aqchat-0123abcd.db");

        let db = Database::open(&path).unwrap();
        assert!(path.exists());
        assert_eq!(db.path(), Some(path.as_path()));
    }

    #[test]
    fn test_in_memory_has_no_path() {
        let db = Database::open_in_memory().unwrap();
        assert!(db.path().is_none());
        assert!(format!("{db:?}").contains(":memory:"));
    }

    #[test]
    fn test_transaction_commits() {
        let db = Database::open_in_memory().unwrap();
        create_table(&db);

        db.with_transaction(|conn| {
            conn.execute("INSERT INTO t (id) VALUES (1), (2)", [])
                .map_err(|e| StorageError::Database(e.to_string()))?;
            Ok(())
        })
        .unwrap();

        assert_eq!(count(&db), 2);
    }

    #[test]
    fn test_transaction_rolls_back_on_error() {
        let db = Database::open_in_memory().unwrap();
        create_table(&db);

        let result: Result<()> = db.with_transaction(|conn| {
            conn.execute("INSERT INTO t (id) VALUES (1)", [])
                .map_err(|e| StorageError::Database(e.to_string()))?;
            Err(crate::Error::internal("simulated failure"))
        });

        assert!(result.is_err());
        assert_eq!(count(&db), 0);
    }

    #[test]
    fn test_clones_share_connection() {
        let db = Database::open_in_memory().unwrap();
        create_table(&db);
        let other = db.clone();

        other
            .with_conn(|conn| {
                conn.execute("INSERT INTO t (id) VALUES (7)", [])
                    .map_err(|e| StorageError::Database(e.to_string()))?;
                Ok(())
            })
            .unwrap();

        assert_eq!(count(&db), 1);
    }
}
