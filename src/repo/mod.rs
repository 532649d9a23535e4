//! Repository synchronization.
//!
//! This module provides:
//! - URL parsing and credential injection
//! - A local checkout that fast-forwards to its remote and reports
//!   file-level changes to registered callbacks
//! - A registry that opens each remote once

pub mod events;
mod git;
pub mod registry;
pub mod source;
pub mod url;

use std::sync::Arc;

pub use events::{ChangeCallback, ChangeCallbacks, ChangeEvent, ChangeKind};
pub use registry::RepositoryRegistry;
pub use source::{RepositorySource, SyncReport};
pub use url::{extract_repo_name, repo_key, with_credentials};

/// Run [`RepositorySource::sync`] on the blocking thread pool.
///
/// # Errors
///
/// Returns the sync error, or an internal error if the task panicked.
pub async fn sync_in_background(
    source: Arc<RepositorySource>,
    callbacks: Arc<ChangeCallbacks>,
) -> crate::Result<SyncReport> {
    tokio::task::spawn_blocking(move || source.sync(&callbacks))
        .await
        .map_err(|e| crate::Error::internal(format!("Sync task failed: {e}")))?
}
