//! Wiring of repository change callbacks to the indexer.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use super::indexer::{FileOutcome, IncrementalIndexer};
use crate::repo::{ChangeCallbacks, ChangeKind};

/// Counters updated by the callbacks from [`change_callbacks`].
#[derive(Debug, Default)]
pub struct IndexerStats {
    pub files_indexed: AtomicU64,
    pub files_removed: AtomicU64,
    pub chunks_written: AtomicU64,
    pub errors: AtomicU64,
}

impl IndexerStats {
    /// Create new stats tracker.
    #[must_use]
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Get snapshot of current stats.
    #[must_use]
    pub fn snapshot(&self) -> IndexerStatsSnapshot {
        IndexerStatsSnapshot {
            files_indexed: self.files_indexed.load(Ordering::Relaxed),
            files_removed: self.files_removed.load(Ordering::Relaxed),
            chunks_written: self.chunks_written.load(Ordering::Relaxed),
            errors: self.errors.load(Ordering::Relaxed),
        }
    }

    fn record(&self, outcome: FileOutcome) {
        match outcome {
            FileOutcome::Indexed(chunks) => {
                self.files_indexed.fetch_add(1, Ordering::Relaxed);
                self.chunks_written.fetch_add(chunks as u64, Ordering::Relaxed);
            }
            FileOutcome::Removed(_) => {
                self.files_removed.fetch_add(1, Ordering::Relaxed);
            }
            FileOutcome::Unchanged => {}
        }
    }
}

/// Snapshot of indexer stats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IndexerStatsSnapshot {
    pub files_indexed: u64,
    pub files_removed: u64,
    pub chunks_written: u64,
    pub errors: u64,
}

/// Callbacks that keep `indexer` in step with a repository's changes.
///
/// Added and modified files are re-indexed; removed files are deleted from
/// the store. Failures are counted in `stats` and returned to the caller,
/// which logs them.
#[must_use]
pub fn change_callbacks(indexer: Arc<IncrementalIndexer>, stats: Arc<IndexerStats>) -> ChangeCallbacks {
    let mut callbacks = ChangeCallbacks::new();

    for kind in [ChangeKind::Added, ChangeKind::Modified] {
        let indexer = Arc::clone(&indexer);
        let stats = Arc::clone(&stats);
        callbacks.register(kind, move |path| match indexer.index_file(path) {
            Ok(outcome) => {
                stats.record(outcome);
                Ok(())
            }
            Err(e) => {
                stats.errors.fetch_add(1, Ordering::Relaxed);
                Err(e)
            }
        });
    }

    callbacks.register(ChangeKind::Removed, move |path| match indexer.remove_file(path) {
        Ok(_) => {
            stats.files_removed.fetch_add(1, Ordering::Relaxed);
            Ok(())
        }
        Err(e) => {
            stats.errors.fetch_add(1, Ordering::Relaxed);
            Err(e)
        }
    });

    callbacks
}
