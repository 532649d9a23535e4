//! Explicit registry of open repositories.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::Mutex;

use super::source::RepositorySource;
use super::url::repo_key;
use crate::config::Credentials;
use crate::Result;

/// Opens each remote at most once and hands out shared handles to it.
///
/// Checkouts live under `<repos_dir>/<key>`. The registry lock is held while
/// a repository is being cloned, so concurrent requests for the same URL
/// never clone twice.
#[derive(Debug)]
pub struct RepositoryRegistry {
    repos_dir: PathBuf,
    credentials: Option<Credentials>,
    sources: Mutex<HashMap<String, Arc<RepositorySource>>>,
}

impl RepositoryRegistry {
    /// Create an empty registry rooted at `repos_dir`.
    #[must_use]
    pub fn new(repos_dir: impl Into<PathBuf>, credentials: Option<Credentials>) -> Self {
        Self {
            repos_dir: repos_dir.into(),
            credentials,
            sources: Mutex::new(HashMap::new()),
        }
    }

    /// Return the source for `url`, opening (and cloning) it on first use.
    ///
    /// # Errors
    ///
    /// Propagates [`RepositorySource::open`] failures; nothing is cached in
    /// that case.
    pub fn get_or_open(&self, url: &str) -> Result<Arc<RepositorySource>> {
        let url = url.trim();
        let mut sources = self.sources.lock();

        if let Some(source) = sources.get(url) {
            return Ok(Arc::clone(source));
        }

        let local_path = self.repos_dir.join(repo_key(url)?);
        let source = Arc::new(RepositorySource::open(
            url,
            &local_path,
            self.credentials.as_ref(),
        )?);

        tracing::debug!(repo = %source.name(), key = %source.key(), "Registered repository");
        sources.insert(url.to_string(), Arc::clone(&source));
        Ok(source)
    }

    /// Source for `url` if it has already been opened.
    #[must_use]
    pub fn get(&self, url: &str) -> Option<Arc<RepositorySource>> {
        self.sources.lock().get(url.trim()).cloned()
    }

    /// Number of open repositories.
    #[must_use]
    pub fn len(&self) -> usize {
        self.sources.lock().len()
    }

    /// Check if no repository has been opened.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Directory holding the checkouts.
    #[must_use]
    pub fn repos_dir(&self) -> &Path {
        &self.repos_dir
    }
}
