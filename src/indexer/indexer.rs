//! Incremental indexing of repository files.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use super::filter::FileFilter;
use super::scanner::{relative_source, scan_repository};
use super::store::ChunkStore;
use crate::config::Config;
use crate::error::IndexingError;
use crate::metrics::{CHUNKS_WRITTEN_TOTAL, FILES_REMOVED_TOTAL};
use crate::observability::spans;
use crate::splitter::{BoundaryAwareSplitter, DetectorRegistry, SplitterConfig};
use crate::Result;

/// What [`IncrementalIndexer::index_file`] did with a file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileOutcome {
    /// Chunks were replaced; holds the number written.
    Indexed(usize),
    /// The stored chunks already match the file's content.
    Unchanged,
    /// The file is gone, filtered out or not text; holds the number of chunks deleted.
    Removed(usize),
}

/// Totals of one [`IncrementalIndexer::ingest`] run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IngestReport {
    pub files_indexed: u64,
    pub files_unchanged: u64,
    pub files_removed: u64,
    pub chunks_written: u64,
    pub errors: u64,
}

/// Keeps a [`ChunkStore`] in step with the files of one repository checkout.
///
/// Sources are paths relative to the repository root with `/` separators.
pub struct IncrementalIndexer {
    root: PathBuf,
    filter: FileFilter,
    splitter: BoundaryAwareSplitter,
    registry: DetectorRegistry,
    store: Arc<dyn ChunkStore>,
}

impl IncrementalIndexer {
    /// Create an indexer for the checkout at `root`.
    ///
    /// # Errors
    ///
    /// Returns an error if `root` cannot be canonicalized or the splitter
    /// settings in `config` are invalid.
    pub fn new(root: impl AsRef<Path>, store: Arc<dyn ChunkStore>, config: &Config) -> Result<Self> {
        let root = root.as_ref().canonicalize()?;
        let splitter = BoundaryAwareSplitter::new(SplitterConfig::from(config))?;

        Ok(Self {
            filter: FileFilter::new(&root, &config.include_extensions),
            root,
            splitter,
            registry: DetectorRegistry::with_defaults(),
            store,
        })
    }

    /// Replace the detector registry.
    #[must_use]
    pub fn with_registry(mut self, registry: DetectorRegistry) -> Self {
        self.registry = registry;
        self
    }

    /// Repository root.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Source key of `path`.
    ///
    /// # Errors
    ///
    /// Returns [`IndexingError::OutsideRoot`] if `path` is not under the root.
    pub fn source_of(&self, path: &Path) -> Result<String> {
        let absolute = if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.root.join(path)
        };

        relative_source(&self.root, &absolute).ok_or_else(|| {
            IndexingError::OutsideRoot {
                path: path.display().to_string(),
                root: self.root.display().to_string(),
            }
            .into()
        })
    }

    /// Re-split `path` and replace its chunks.
    ///
    /// Files that no longer exist, fail the filter or are not UTF-8 have their
    /// chunks deleted instead.
    ///
    /// # Errors
    ///
    /// Returns an error if `path` is outside the root, cannot be read, or the
    /// store rejects the update.
    pub fn index_file(&self, path: &Path) -> Result<FileOutcome> {
        let source = self.source_of(path)?;
        let span = spans::index_span(&source);
        let _enter = span.enter();

        let absolute = self.root.join(&source);
        if !absolute.is_file() || !self.filter.accepts(Path::new(&source)) {
            return self.remove_source(&source).map(FileOutcome::Removed);
        }

        let bytes = std::fs::read(&absolute).map_err(|e| IndexingError::ProcessFailed {
            path: source.clone(),
            reason: e.to_string(),
        })?;

        self.index_bytes(&source, bytes)
    }

    /// Delete the chunks of `path`.
    ///
    /// # Errors
    ///
    /// Returns an error if `path` is outside the root or the store rejects
    /// the delete.
    pub fn remove_file(&self, path: &Path) -> Result<usize> {
        let source = self.source_of(path)?;
        self.remove_source(&source)
    }

    /// Index the whole checkout.
    ///
    /// Files whose content hash matches the stored one are skipped, and
    /// stored sources that are no longer present (or no longer accepted) are
    /// deleted. Per-file failures are logged and counted, not returned.
    ///
    /// # Errors
    ///
    /// Returns an error only if the store cannot list its sources.
    pub fn ingest(&self) -> Result<IngestReport> {
        let scan = scan_repository(&self.filter);
        let mut report = IngestReport {
            errors: scan.errors,
            ..IngestReport::default()
        };
        let mut seen = HashSet::new();

        for file in &scan.files {
            let Some(source) = relative_source(&self.root, file) else {
                continue;
            };
            seen.insert(source.clone());

            match self.ingest_one(&source, file) {
                Ok(FileOutcome::Indexed(chunks)) => {
                    report.files_indexed += 1;
                    report.chunks_written += chunks as u64;
                }
                Ok(FileOutcome::Unchanged) => report.files_unchanged += 1,
                Ok(FileOutcome::Removed(_)) => report.files_removed += 1,
                Err(e) => {
                    tracing::error!(source = %source, error = %e, "Failed to index file");
                    report.errors += 1;
                }
            }
        }

        for stale in self.store.sources()? {
            if seen.contains(&stale) {
                continue;
            }
            match self.remove_source(&stale) {
                Ok(_) => report.files_removed += 1,
                Err(e) => {
                    tracing::error!(source = %stale, error = %e, "Failed to remove stale source");
                    report.errors += 1;
                }
            }
        }

        tracing::info!(
            root = %self.root.display(),
            indexed = report.files_indexed,
            unchanged = report.files_unchanged,
            removed = report.files_removed,
            chunks = report.chunks_written,
            errors = report.errors,
            "Ingest complete"
        );

        Ok(report)
    }

    fn ingest_one(&self, source: &str, file: &Path) -> Result<FileOutcome> {
        let bytes = std::fs::read(file).map_err(|e| IndexingError::ProcessFailed {
            path: source.to_string(),
            reason: e.to_string(),
        })?;

        let hash = content_hash(&bytes);
        if self.store.source_hash(source)?.as_deref() == Some(hash.as_str()) {
            tracing::debug!(source, "File unchanged, skipping");
            return Ok(FileOutcome::Unchanged);
        }

        self.index_bytes(source, bytes)
    }

    fn index_bytes(&self, source: &str, bytes: Vec<u8>) -> Result<FileOutcome> {
        let hash = content_hash(&bytes);
        let Ok(text) = String::from_utf8(bytes) else {
            tracing::debug!(source, "Not UTF-8, dropping from index");
            return self.remove_source(source).map(FileOutcome::Removed);
        };

        let documents = self.splitter.split_file(source, &text, &self.registry);
        let written = self.store.replace_source(source, &documents, &hash)?;
        CHUNKS_WRITTEN_TOTAL.inc_by(written as u64);

        tracing::info!(source, chunks = written, "Indexed file");
        Ok(FileOutcome::Indexed(written))
    }

    fn remove_source(&self, source: &str) -> Result<usize> {
        let deleted = self.store.delete_source(source)?;
        if deleted > 0 {
            FILES_REMOVED_TOTAL.inc();
            tracing::info!(source, chunks = deleted, "Removed file from index");
        }
        Ok(deleted)
    }
}

/// blake3 digest of file content, hex encoded.
#[must_use]
pub fn content_hash(bytes: &[u8]) -> String {
    blake3::hash(bytes).to_hex().to_string()
}
