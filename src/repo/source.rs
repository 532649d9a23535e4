//! Local checkout of one remote repository.

use std::any::Any;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::path::{Path, PathBuf};

use parking_lot::Mutex;
use serde::Serialize;

use super::events::{ChangeCallbacks, ChangeEvent};
use super::git;
use super::url::{extract_repo_name, redact, repo_key, with_credentials};
use crate::config::Credentials;
use crate::error::RepositoryError;
use crate::metrics::{CALLBACK_FAILURES_TOTAL, CHANGES_TOTAL, SYNCS_TOTAL};
use crate::observability::spans;
use crate::Result;

const REMOTE: &str = "origin";

/// Outcome of one [`RepositorySource::sync`] call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SyncReport {
    /// Head recorded before the call.
    pub previous_head: String,
    /// Head recorded after the call.
    pub current_head: String,
    /// Changed files, in diff order.
    pub changes: Vec<ChangeEvent>,
    /// Callbacks that returned an error or panicked.
    pub callback_failures: usize,
}

impl SyncReport {
    /// Whether the remote had no new commits.
    #[must_use]
    pub fn is_unchanged(&self) -> bool {
        self.previous_head == self.current_head
    }
}

/// A remote repository tracked through a local working copy.
///
/// The checkout is only ever moved by [`sync`](Self::sync), which holds the
/// head lock for the whole pull, diff and callback dispatch. Concurrent
/// `sync` calls on the same source therefore serialize, while different
/// sources sync independently.
pub struct RepositorySource {
    remote_url: String,
    auth_url: String,
    local_path: PathBuf,
    name: String,
    key: String,
    head: Mutex<String>,
}

impl RepositorySource {
    /// Clone `remote_url` into `local_path`, or open the checkout already there.
    ///
    /// An existing checkout whose `origin` is missing or points elsewhere is
    /// repointed. Credentials are embedded into HTTP(S) URLs only.
    ///
    /// # Errors
    ///
    /// Returns [`RepositoryError::InvalidUrl`] for an unrecognized URL and
    /// [`RepositoryError::Open`] when `local_path` holds something other than
    /// a git checkout or when cloning fails.
    pub fn open(
        remote_url: &str,
        local_path: impl AsRef<Path>,
        credentials: Option<&Credentials>,
    ) -> Result<Self> {
        let local_path = local_path.as_ref();
        let name = extract_repo_name(remote_url)?;
        let key = repo_key(remote_url)?;
        let auth_url = with_credentials(remote_url, credentials);
        let display_path = local_path.display().to_string();
        let scrub = |reason: String| reason.replace(&auth_url, &redact(&auth_url));

        if local_path.join(".git").exists() {
            if !git::is_work_tree(local_path) {
                return Err(RepositoryError::open(&display_path, "not a valid git work tree").into());
            }
            git::ensure_remote(local_path, REMOTE, &auth_url)
                .map_err(|reason| RepositoryError::open(&display_path, scrub(reason)))?;
            tracing::debug!(repo = %name, path = %display_path, "Opened existing checkout");
        } else {
            if local_path.exists() && !is_empty_dir(local_path)? {
                return Err(RepositoryError::open(
                    &display_path,
                    "path exists and is not a git repository",
                )
                .into());
            }
            if let Some(parent) = local_path.parent() {
                std::fs::create_dir_all(parent)?;
            }
            tracing::info!(repo = %name, url = %redact(&auth_url), path = %display_path, "Cloning repository");
            git::clone(&auth_url, local_path)
                .map_err(|reason| RepositoryError::open(&display_path, scrub(reason)))?;
        }

        let local_path = local_path.canonicalize()?;
        let head = git::head(&local_path)
            .map_err(|reason| RepositoryError::open(&display_path, reason))?;

        tracing::info!(repo = %name, head = %head, "Repository ready");

        Ok(Self {
            remote_url: remote_url.trim().to_string(),
            auth_url,
            local_path,
            name,
            key,
            head: Mutex::new(head),
        })
    }

    /// Fast-forward to the remote head and report what changed.
    ///
    /// Callbacks for every changed file run before this returns, while the
    /// head lock is still held, so they must not call back into this source.
    /// A failing or panicking callback is logged and counted; the remaining
    /// callbacks and files are still delivered.
    ///
    /// # Errors
    ///
    /// Returns [`RepositoryError::Sync`] if pulling or diffing fails. The
    /// recorded head is left unchanged, so retrying is safe.
    pub fn sync(&self, callbacks: &ChangeCallbacks) -> Result<SyncReport> {
        let span = spans::sync_span(&self.name);
        let _enter = span.enter();

        let mut head = self.head.lock();
        let previous_head = head.clone();

        let current_head = match self.fetch_head() {
            Ok(current) => current,
            Err(e) => {
                SYNCS_TOTAL.with_label_values(&["failed"]).inc();
                tracing::warn!(repo = %self.name, error = %e, "Sync failed");
                return Err(e);
            }
        };

        if current_head == previous_head {
            SYNCS_TOTAL.with_label_values(&["unchanged"]).inc();
            tracing::debug!(repo = %self.name, head = %current_head, "Already up to date");
            return Ok(SyncReport {
                previous_head,
                current_head,
                changes: Vec::new(),
                callback_failures: 0,
            });
        }

        let entries = match git::diff(&self.local_path, &previous_head, &current_head) {
            Ok(entries) => entries,
            Err(reason) => {
                SYNCS_TOTAL.with_label_values(&["failed"]).inc();
                return Err(RepositoryError::sync(&self.name, reason).into());
            }
        };

        *head = current_head.clone();

        let changes: Vec<ChangeEvent> = entries
            .into_iter()
            .map(|entry| ChangeEvent {
                path: self.local_path.join(entry.path),
                kind: entry.kind,
            })
            .collect();

        tracing::info!(
            repo = %self.name,
            from = %previous_head,
            to = %current_head,
            changes = changes.len(),
            "Pulled new commits"
        );

        let callback_failures = self.dispatch(&changes, callbacks);
        SYNCS_TOTAL.with_label_values(&["updated"]).inc();

        drop(head);

        Ok(SyncReport {
            previous_head,
            current_head,
            changes,
            callback_failures,
        })
    }

    fn fetch_head(&self) -> Result<String> {
        git::pull(&self.local_path)
            .and_then(|()| git::head(&self.local_path))
            .map_err(|reason| {
                let reason = reason.replace(&self.auth_url, &redact(&self.auth_url));
                RepositoryError::sync(&self.name, reason).into()
            })
    }

    fn dispatch(&self, changes: &[ChangeEvent], callbacks: &ChangeCallbacks) -> usize {
        let mut failures = 0;

        for change in changes {
            CHANGES_TOTAL.with_label_values(&[change.kind.as_str()]).inc();

            for callback in callbacks.for_kind(change.kind) {
                let reason = match panic::catch_unwind(AssertUnwindSafe(|| callback(&change.path))) {
                    Ok(Ok(())) => continue,
                    Ok(Err(e)) => e.to_string(),
                    Err(payload) => format!("panicked: {}", panic_message(payload.as_ref())),
                };

                failures += 1;
                CALLBACK_FAILURES_TOTAL.inc();

                let err = RepositoryError::Callback {
                    kind: change.kind.as_str(),
                    path: change.path.display().to_string(),
                    reason,
                };
                tracing::warn!(repo = %self.name, error = %err, "Change callback failed");
            }
        }

        failures
    }

    /// Commit recorded by the last successful open or sync.
    ///
    /// Blocks while a sync is in progress.
    #[must_use]
    pub fn head(&self) -> String {
        self.head.lock().clone()
    }

    /// Short repository name derived from the URL.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Remote URL as given by the caller, without injected credentials.
    #[must_use]
    pub fn remote_url(&self) -> &str {
        &self.remote_url
    }

    /// Canonical path of the working copy.
    #[must_use]
    pub fn local_path(&self) -> &Path {
        &self.local_path
    }

    /// Stable key (name plus URL digest) used for on-disk locations.
    #[must_use]
    pub fn key(&self) -> &str {
        &self.key
    }
}

impl fmt::Debug for RepositorySource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let head = self.head.try_lock().map(|h| h.clone());
        f.debug_struct("RepositorySource")
            .field("name", &self.name)
            .field("remote_url", &redact(&self.remote_url))
            .field("local_path", &self.local_path)
            .field("head", &head.as_deref().unwrap_or("<syncing>"))
            .finish_non_exhaustive()
    }
}

fn is_empty_dir(path: &Path) -> Result<bool> {
    if !path.is_dir() {
        return Ok(false);
    }
    Ok(std::fs::read_dir(path)?.next().is_none())
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    payload
        .downcast_ref::<&str>()
        .map(|s| (*s).to_string())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "unknown panic".to_string())
}
