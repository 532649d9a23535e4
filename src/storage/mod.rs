//! `SQLite` chunk storage.
//!
//! One database per synced repository, holding the chunks of every indexed
//! file. [`Database`] implements [`ChunkStore`](crate::indexer::ChunkStore).

mod chunks;
mod connection;
mod models;
mod schema;

pub use chunks::{
    count_chunks, delete_chunks_by_source, get_chunks_by_source, get_source_hash, insert_chunk,
    list_sources,
};
pub use connection::Database;
pub use models::ChunkRecord;
pub use schema::{migrate, verify_schema, SCHEMA_VERSION};

/// Run migrations and verify the schema.
///
/// # Errors
///
/// Returns an error if a migration fails or a table is missing afterwards.
pub fn init_storage(db: &Database) -> crate::Result<()> {
    db.with_conn(|conn| {
        migrate(conn)?;
        verify_schema(conn)?;
        tracing::info!(version = SCHEMA_VERSION, "Storage initialized");
        Ok(())
    })
}
