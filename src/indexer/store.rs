//! Chunk store abstraction.

use std::collections::HashMap;

use parking_lot::Mutex;

use crate::splitter::Document;
use crate::Result;

/// Destination for the chunks of indexed files.
///
/// Implementations must make [`replace_source`](Self::replace_source)
/// atomic: a reader never observes a source with zero chunks mid-update, nor
/// a mix of old and new chunks.
pub trait ChunkStore: Send + Sync {
    /// Replace every chunk of `source` with `documents`.
    ///
    /// Returns the number of chunks written.
    ///
    /// # Errors
    ///
    /// Returns an error if the store rejects the write; the previous chunks
    /// are kept in that case.
    fn replace_source(&self, source: &str, documents: &[Document], file_hash: &str) -> Result<usize>;

    /// Delete every chunk of `source`, returning how many were removed.
    ///
    /// # Errors
    ///
    /// Returns an error if the store rejects the delete.
    fn delete_source(&self, source: &str) -> Result<usize>;

    /// Content hash recorded by the last `replace_source` of `source`.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be read.
    fn source_hash(&self, source: &str) -> Result<Option<String>>;

    /// All sources that currently have chunks, sorted.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be read.
    fn sources(&self) -> Result<Vec<String>>;
}

/// In-process store, used by `repochunk split` and in tests.
#[derive(Debug, Default)]
pub struct MemoryChunkStore {
    entries: Mutex<HashMap<String, (String, Vec<Document>)>>,
}

impl MemoryChunkStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Chunks currently stored for `source`.
    #[must_use]
    pub fn documents(&self, source: &str) -> Vec<Document> {
        self.entries
            .lock()
            .get(source)
            .map(|(_, docs)| docs.clone())
            .unwrap_or_default()
    }

    /// Total number of stored chunks.
    #[must_use]
    pub fn chunk_count(&self) -> usize {
        self.entries.lock().values().map(|(_, docs)| docs.len()).sum()
    }
}

impl ChunkStore for MemoryChunkStore {
    fn replace_source(&self, source: &str, documents: &[Document], file_hash: &str) -> Result<usize> {
        let mut entries = self.entries.lock();
        if documents.is_empty() {
            entries.remove(source);
        } else {
            entries.insert(source.to_string(), (file_hash.to_string(), documents.to_vec()));
        }
        Ok(documents.len())
    }

    fn delete_source(&self, source: &str) -> Result<usize> {
        Ok(self
            .entries
            .lock()
            .remove(source)
            .map_or(0, |(_, docs)| docs.len()))
    }

    fn source_hash(&self, source: &str) -> Result<Option<String>> {
        Ok(self.entries.lock().get(source).map(|(hash, _)| hash.clone()))
    }

    fn sources(&self) -> Result<Vec<String>> {
        let mut sources: Vec<String> = self.entries.lock().keys().cloned().collect();
        sources.sort();
        Ok(sources)
    }
}
