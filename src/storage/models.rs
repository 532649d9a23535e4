//! Row types for the chunk database.

use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};

use crate::splitter::{BoundaryKind, ChunkMetadata, Document};

/// Current Unix timestamp in seconds.
pub(crate) fn now_unix() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| i64::try_from(d.as_secs()).unwrap_or(0))
        .unwrap_or(0)
}

/// One stored chunk.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChunkRecord {
    /// Database primary key, `None` before insertion.
    pub id: Option<i64>,
    pub source: String,
    pub chunk_index: i64,
    pub total_chunks: i64,
    pub content: String,
    pub boundary_kind: Option<String>,
    /// JSON array of boundary kind tags.
    pub boundary_types: Option<String>,
    pub start_index: Option<i64>,
    /// blake3 hash of the whole source file.
    pub file_hash: String,
    pub indexed_at: i64,
}

impl ChunkRecord {
    /// Build a record from a split document.
    #[must_use]
    pub fn from_document(document: &Document, file_hash: &str) -> Self {
        let metadata = &document.metadata;
        Self {
            id: None,
            source: metadata.source.clone(),
            chunk_index: to_i64(metadata.chunk_index),
            total_chunks: to_i64(metadata.total_chunks),
            content: document.content.clone(),
            boundary_kind: metadata.boundary_kind.map(|k| k.as_str().to_string()),
            boundary_types: metadata
                .boundary_types
                .as_ref()
                .and_then(|kinds| serde_json::to_string(kinds).ok()),
            start_index: metadata.start_index.map(to_i64),
            file_hash: file_hash.to_string(),
            indexed_at: now_unix(),
        }
    }

    /// Convert back into the document handed to consumers.
    ///
    /// Unknown kind tags are dropped rather than rejected.
    #[must_use]
    pub fn into_document(self) -> Document {
        Document {
            metadata: ChunkMetadata {
                source: self.source,
                chunk_index: to_usize(self.chunk_index),
                total_chunks: to_usize(self.total_chunks),
                boundary_types: self
                    .boundary_types
                    .as_deref()
                    .and_then(|json| serde_json::from_str::<Vec<BoundaryKind>>(json).ok()),
                boundary_kind: self.boundary_kind.as_deref().and_then(BoundaryKind::parse),
                start_index: self.start_index.map(to_usize),
            },
            content: self.content,
        }
    }
}

fn to_i64(value: usize) -> i64 {
    i64::try_from(value).unwrap_or(i64::MAX)
}

fn to_usize(value: i64) -> usize {
    usize::try_from(value).unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_document_round_trip_keeps_metadata() {
        let document = Document {
            content: "impl A {}".to_string(),
            metadata: ChunkMetadata {
                source: "src/a.rs".to_string(),
                chunk_index: 3,
                total_chunks: 4,
                boundary_types: Some(vec![BoundaryKind::Function, BoundaryKind::Impl]),
                boundary_kind: Some(BoundaryKind::Impl),
                start_index: Some(42),
            },
        };

        let record = ChunkRecord::from_document(&document, "hash");
        assert_eq!(record.boundary_kind.as_deref(), Some("impl"));
        assert_eq!(record.boundary_types.as_deref(), Some(r#"["function","impl"]"#));
        assert_eq!(record.file_hash, "hash");
        assert!(record.indexed_at > 0);

        assert_eq!(record.into_document(), document);
    }

    #[test]
    fn test_unknown_kind_is_dropped() {
        let record = ChunkRecord {
            id: Some(1),
            source: "a.rs".to_string(),
            chunk_index: 0,
            total_chunks: 1,
            content: "x".to_string(),
            boundary_kind: Some("module".to_string()),
            boundary_types: Some("not json".to_string()),
            start_index: None,
            file_hash: "h".to_string(),
            indexed_at: 0,
        };

        let document = record.into_document();
        assert_eq!(document.metadata.boundary_kind, None);
        assert_eq!(document.metadata.boundary_types, None);
    }
}
