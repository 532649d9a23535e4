//! Change events and callback registration.

#![allow(clippy::missing_const_for_fn)]

use std::fmt;
use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::Result;

/// Kind of file-level change between two sync points.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeKind {
    /// File appeared.
    Added,
    /// File was deleted.
    Removed,
    /// File content, mode or name changed.
    Modified,
}

impl ChangeKind {
    /// All kinds, in reporting order.
    pub const ALL: [Self; 3] = [Self::Added, Self::Removed, Self::Modified];

    /// Lowercase tag used in logs and metrics.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Added => "added",
            Self::Removed => "removed",
            Self::Modified => "modified",
        }
    }

    /// Classify a `git diff --name-status` letter.
    ///
    /// Renames, copies, type changes and anything unexpected count as
    /// modifications.
    #[must_use]
    pub fn from_git_status(status: &str) -> Self {
        match status.chars().next() {
            Some('A') => Self::Added,
            Some('D') => Self::Removed,
            _ => Self::Modified,
        }
    }
}

impl fmt::Display for ChangeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One changed file, reported with its absolute path in the checkout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChangeEvent {
    /// Absolute path of the file.
    pub path: PathBuf,
    /// What happened to it.
    pub kind: ChangeKind,
}

/// Callback invoked with the absolute path of a changed file.
pub type ChangeCallback = Box<dyn Fn(&Path) -> Result<()> + Send + Sync>;

/// Ordered callback lists keyed by [`ChangeKind`].
///
/// Callbacks run while the repository's sync lock is held, so they must not
/// call back into the `RepositorySource` that fires them.
#[derive(Default)]
pub struct ChangeCallbacks {
    added: Vec<ChangeCallback>,
    removed: Vec<ChangeCallback>,
    modified: Vec<ChangeCallback>,
}

impl ChangeCallbacks {
    /// Create an empty set of callbacks.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a callback for `kind`.
    pub fn register<F>(&mut self, kind: ChangeKind, callback: F)
    where
        F: Fn(&Path) -> Result<()> + Send + Sync + 'static,
    {
        self.list_mut(kind).push(Box::new(callback));
    }

    /// Builder form of [`register`](Self::register).
    #[must_use]
    pub fn on<F>(mut self, kind: ChangeKind, callback: F) -> Self
    where
        F: Fn(&Path) -> Result<()> + Send + Sync + 'static,
    {
        self.register(kind, callback);
        self
    }

    /// Callbacks registered for `kind`, in registration order.
    #[must_use]
    pub fn for_kind(&self, kind: ChangeKind) -> &[ChangeCallback] {
        match kind {
            ChangeKind::Added => &self.added,
            ChangeKind::Removed => &self.removed,
            ChangeKind::Modified => &self.modified,
        }
    }

    /// Check if no callback is registered at all.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Total number of registered callbacks.
    #[must_use]
    pub fn len(&self) -> usize {
        self.added.len() + self.removed.len() + self.modified.len()
    }

    fn list_mut(&mut self, kind: ChangeKind) -> &mut Vec<ChangeCallback> {
        match kind {
            ChangeKind::Added => &mut self.added,
            ChangeKind::Removed => &mut self.removed,
            ChangeKind::Modified => &mut self.modified,
        }
    }
}

impl fmt::Debug for ChangeCallbacks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChangeCallbacks")
            .field("added", &self.added.len())
            .field("removed", &self.removed.len())
            .field("modified", &self.modified.len())
            .finish()
    }
}
