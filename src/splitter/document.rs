//! Chunk output schema.

use serde::{Deserialize, Serialize};

use super::boundary::BoundaryKind;

/// One file's text, tagged with its path relative to the repository root.
#[derive(Debug, Clone, Copy)]
pub struct SourceText<'a> {
    pub source: &'a str,
    pub text: &'a str,
}

impl<'a> SourceText<'a> {
    #[must_use]
    pub const fn new(source: &'a str, text: &'a str) -> Self {
        Self { source, text }
    }
}

/// Metadata attached to every chunk.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChunkMetadata {
    /// Path relative to the repository root.
    pub source: String,

    /// Position of the chunk within its file.
    pub chunk_index: usize,

    /// Number of chunks the file produced.
    pub total_chunks: usize,

    /// Kinds the file's detector can report; absent for fallback splitting.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub boundary_types: Option<Vec<BoundaryKind>>,

    /// Kind of the boundary the chunk was cut from.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub boundary_kind: Option<BoundaryKind>,

    /// Character offset of the chunk's first occurrence in the file.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_index: Option<usize>,
}

/// A retrieval unit handed to the index.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    pub content: String,
    pub metadata: ChunkMetadata,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_optional_fields_are_omitted() {
        let doc = Document {
            content: "# Title".to_string(),
            metadata: ChunkMetadata {
                source: "README.md".to_string(),
                chunk_index: 0,
                total_chunks: 1,
                boundary_types: None,
                boundary_kind: None,
                start_index: None,
            },
        };

        let json = serde_json::to_value(&doc).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "content": "# Title",
                "metadata": { "source": "README.md", "chunk_index": 0, "total_chunks": 1 }
            })
        );
    }

    #[test]
    fn test_boundary_metadata_serializes_as_tags() {
        let metadata = ChunkMetadata {
            source: "src/lib.rs".to_string(),
            chunk_index: 2,
            total_chunks: 5,
            boundary_types: Some(vec![BoundaryKind::Function, BoundaryKind::Impl]),
            boundary_kind: Some(BoundaryKind::Impl),
            start_index: Some(120),
        };

        let json = serde_json::to_string(&metadata).unwrap();
        assert!(json.contains(r#""boundary_types":["function","impl"]"#));
        assert!(json.contains(r#""boundary_kind":"impl""#));

        let back: ChunkMetadata = serde_json::from_str(&json).unwrap();
        assert_eq!(back, metadata);
    }
}
