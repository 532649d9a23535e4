//! Incremental indexing of repository files.
//!
//! This module provides:
//! - The `ChunkStore` seam the index sits behind
//! - Extension and gitignore-aware file filtering
//! - Full ingestion and per-file re-indexing
//! - Change callbacks that connect a repository to the indexer

mod filter;
mod handler;
#[allow(clippy::module_inception)]
mod indexer;
mod scanner;
mod store;

pub use filter::{in_ignored_dir, FileFilter, IGNORED_DIRS};
pub use handler::{change_callbacks, IndexerStats, IndexerStatsSnapshot};
pub use indexer::{content_hash, FileOutcome, IncrementalIndexer, IngestReport};
pub use scanner::{scan_repository, ScanResult};
pub use store::{ChunkStore, MemoryChunkStore};
