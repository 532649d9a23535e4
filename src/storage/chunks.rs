//! Chunk storage operations.

use rusqlite::{params, Connection, Row};

use super::connection::Database;
use super::models::ChunkRecord;
use crate::error::StorageError;
use crate::indexer::ChunkStore;
use crate::splitter::Document;
use crate::Result;

const SELECT_COLUMNS: &str = "id, source, chunk_index, total_chunks, content, boundary_kind, \
                              boundary_types, start_index, file_hash, indexed_at";

fn row_to_record(row: &Row<'_>) -> rusqlite::Result<ChunkRecord> {
    Ok(ChunkRecord {
        id: Some(row.get(0)?),
        source: row.get(1)?,
        chunk_index: row.get(2)?,
        total_chunks: row.get(3)?,
        content: row.get(4)?,
        boundary_kind: row.get(5)?,
        boundary_types: row.get(6)?,
        start_index: row.get(7)?,
        file_hash: row.get(8)?,
        indexed_at: row.get(9)?,
    })
}

/// Insert a chunk, returning its row id.
///
/// # Errors
///
/// Returns an error if the insertion fails, including when `(source,
/// chunk_index)` is already taken.
pub fn insert_chunk(conn: &Connection, chunk: &ChunkRecord) -> Result<i64> {
    conn.execute(
        "INSERT INTO chunks (source, chunk_index, total_chunks, content, boundary_kind,
                             boundary_types, start_index, file_hash, indexed_at)
         VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)",
        params![
            chunk.source,
            chunk.chunk_index,
            chunk.total_chunks,
            chunk.content,
            chunk.boundary_kind,
            chunk.boundary_types,
            chunk.start_index,
            chunk.file_hash,
            chunk.indexed_at,
        ],
    )
    .map_err(|e| StorageError::Database(format!("failed to insert chunk: {e}")))?;

    let id = conn.last_insert_rowid();
    tracing::trace!(id, source = %chunk.source, index = chunk.chunk_index, "Inserted chunk");
    Ok(id)
}

/// All chunks of `source`, ordered by chunk index.
///
/// # Errors
///
/// Returns an error if the query fails.
pub fn get_chunks_by_source(conn: &Connection, source: &str) -> Result<Vec<ChunkRecord>> {
    let mut stmt = conn
        .prepare(&format!(
            "SELECT {SELECT_COLUMNS} FROM chunks WHERE source = ? ORDER BY chunk_index"
        ))
        .map_err(|e| StorageError::Database(format!("failed to prepare query: {e}")))?;

    let rows = stmt
        .query_map([source], row_to_record)
        .map_err(|e| StorageError::Database(format!("failed to query chunks: {e}")))?;

    rows.collect::<std::result::Result<Vec<_>, _>>()
        .map_err(|e| StorageError::Database(format!("failed to read chunk row: {e}")).into())
}

/// Delete every chunk of `source`, returning how many rows went away.
///
/// # Errors
///
/// Returns an error if the delete fails.
pub fn delete_chunks_by_source(conn: &Connection, source: &str) -> Result<usize> {
    let deleted = conn
        .execute("DELETE FROM chunks WHERE source = ?", [source])
        .map_err(|e| StorageError::Database(format!("failed to delete chunks: {e}")))?;

    tracing::debug!(source, deleted, "Deleted chunks");
    Ok(deleted)
}

/// Total number of stored chunks.
///
/// # Errors
///
/// Returns an error if the query fails.
pub fn count_chunks(conn: &Connection) -> Result<i64> {
    conn.query_row("SELECT COUNT(*) FROM chunks", [], |row| row.get(0))
        .map_err(|e| StorageError::Database(format!("failed to count chunks: {e}")).into())
}

/// Distinct sources with at least one chunk, sorted.
///
/// # Errors
///
/// Returns an error if the query fails.
pub fn list_sources(conn: &Connection) -> Result<Vec<String>> {
    let mut stmt = conn
        .prepare("SELECT DISTINCT source FROM chunks ORDER BY source")
        .map_err(|e| StorageError::Database(format!("failed to prepare query: {e}")))?;

    let rows = stmt
        .query_map([], |row| row.get(0))
        .map_err(|e| StorageError::Database(format!("failed to list sources: {e}")))?;

    rows.collect::<std::result::Result<Vec<String>, _>>()
        .map_err(|e| StorageError::Database(format!("failed to read source row: {e}")).into())
}

/// Hash recorded for `source`, if it has chunks.
///
/// # Errors
///
/// Returns an error if the query fails.
pub fn get_source_hash(conn: &Connection, source: &str) -> Result<Option<String>> {
    match conn.query_row(
        "SELECT file_hash FROM chunks WHERE source = ? LIMIT 1",
        [source],
        |row| row.get(0),
    ) {
        Ok(hash) => Ok(Some(hash)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(StorageError::Database(format!("failed to read file hash: {e}")).into()),
    }
}

impl Database {
    /// Chunks of `source` as documents, ordered by chunk index.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub fn documents(&self, source: &str) -> Result<Vec<Document>> {
        self.with_conn(|conn| {
            Ok(get_chunks_by_source(conn, source)?
                .into_iter()
                .map(ChunkRecord::into_document)
                .collect())
        })
    }

    /// Total number of stored chunks.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub fn chunk_count(&self) -> Result<usize> {
        self.with_conn(|conn| {
            let count = count_chunks(conn)?;
            Ok(usize::try_from(count).unwrap_or_default())
        })
    }
}

impl ChunkStore for Database {
    fn replace_source(&self, source: &str, documents: &[Document], file_hash: &str) -> Result<usize> {
        self.with_transaction(|conn| {
            delete_chunks_by_source(conn, source)?;
            for document in documents {
                insert_chunk(conn, &ChunkRecord::from_document(document, file_hash))?;
            }
            Ok(documents.len())
        })
    }

    fn delete_source(&self, source: &str) -> Result<usize> {
        self.with_transaction(|conn| delete_chunks_by_source(conn, source))
    }

    fn source_hash(&self, source: &str) -> Result<Option<String>> {
        self.with_conn(|conn| get_source_hash(conn, source))
    }

    fn sources(&self) -> Result<Vec<String>> {
        self.with_conn(list_sources)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::splitter::{BoundaryKind, ChunkMetadata};
    use crate::storage::init_storage;

    fn setup_db() -> Database {
        let db = Database::open_in_memory().unwrap();
        init_storage(&db).unwrap();
        db
    }

    fn doc(source: &str, index: usize, total: usize, content: &str) -> Document {
        Document {
            content: content.to_string(),
            metadata: ChunkMetadata {
                source: source.to_string(),
                chunk_index: index,
                total_chunks: total,
                boundary_types: Some(vec![BoundaryKind::Function]),
                boundary_kind: Some(BoundaryKind::Function),
                start_index: None,
            },
        }
    }

    #[test]
    fn test_insert_chunk_rows() {
        let db = setup_db();
        let record = ChunkRecord::from_document(&doc("src/lib.rs", 0, 1, "fn a() {}"), "h1");

        db.with_conn(|conn| {
            let id = insert_chunk(conn, &record)?;
            let stored = get_chunks_by_source(conn, "src/lib.rs")?;
            assert_eq!(stored.len(), 1);
            assert_eq!(stored[0].id, Some(id));
            assert_eq!(stored[0].content, "fn a() {}");
            assert_eq!(stored[0].boundary_kind.as_deref(), Some("function"));

            // Same (source, chunk_index) twice is rejected.
            assert!(insert_chunk(conn, &record).is_err());
            Ok(())
        })
        .unwrap();
        assert_eq!(db.chunk_count().unwrap(), 1);
    }

    #[test]
    fn test_replace_source_supersedes_old_chunks() {
        let db = setup_db();
        let old = [doc("a.py", 0, 2, "one"), doc("a.py", 1, 2, "two")];
        assert_eq!(db.replace_source("a.py", &old, "h1").unwrap(), 2);

        let new = [doc("a.py", 0, 1, "three")];
        assert_eq!(db.replace_source("a.py", &new, "h2").unwrap(), 1);

        let documents = db.documents("a.py").unwrap();
        assert_eq!(documents, new.to_vec());
        assert_eq!(db.source_hash("a.py").unwrap().as_deref(), Some("h2"));
    }

    #[test]
    fn test_failed_replace_keeps_previous_chunks() {
        let db = setup_db();
        db.replace_source("a.py", &[doc("a.py", 0, 1, "kept")], "h1")
            .unwrap();

        // Duplicate chunk_index violates the unique constraint mid-transaction.
        let bad = [doc("a.py", 0, 2, "x"), doc("a.py", 0, 2, "y")];
        assert!(db.replace_source("a.py", &bad, "h2").is_err());

        let documents = db.documents("a.py").unwrap();
        assert_eq!(documents.len(), 1);
        assert_eq!(documents[0].content, "kept");
        assert_eq!(db.source_hash("a.py").unwrap().as_deref(), Some("h1"));
    }

    #[test]
    fn test_delete_source_and_listing() {
        let db = setup_db();
        db.replace_source("b.rs", &[doc("b.rs", 0, 1, "b")], "h").unwrap();
        db.replace_source("a.rs", &[doc("a.rs", 0, 1, "a")], "h").unwrap();

        assert_eq!(db.sources().unwrap(), vec!["a.rs", "b.rs"]);
        assert_eq!(db.delete_source("a.rs").unwrap(), 1);
        assert_eq!(db.delete_source("a.rs").unwrap(), 0);
        assert_eq!(db.sources().unwrap(), vec!["b.rs"]);
        assert_eq!(db.source_hash("a.rs").unwrap(), None);

        assert_eq!(db.chunk_count().unwrap(), 1);
    }

    #[test]
    fn test_empty_replace_clears_source() {
        let db = setup_db();
        db.replace_source("a.rs", &[doc("a.rs", 0, 1, "a")], "h").unwrap();
        assert_eq!(db.replace_source("a.rs", &[], "h2").unwrap(), 0);
        assert!(db.sources().unwrap().is_empty());
    }
}
