//! Decides which repository files are indexed.

use std::path::{Component, Path, PathBuf};

use ignore::gitignore::{Gitignore, GitignoreBuilder};

use crate::splitter::extension_from_path;

/// Directories never indexed, wherever they appear in the tree.
pub const IGNORED_DIRS: &[&str] = &[
    ".git",
    ".venv",
    "__pycache__",
    "dist",
    "build",
    ".idea",
    "node_modules",
    "target",
];

/// Extension and ignore-rule filter for one repository root.
///
/// Mirrors what the ingestion walk skips, so a file accepted on sync is
/// also found by the next full ingest.
#[derive(Debug)]
pub struct FileFilter {
    root: PathBuf,
    extensions: Vec<String>,
}

impl FileFilter {
    /// Create a filter for `root` accepting `extensions` (with leading dot).
    pub fn new(root: impl AsRef<Path>, extensions: &[String]) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
            extensions: extensions.iter().map(|ext| ext.to_lowercase()).collect(),
        }
    }

    /// Repository root the filter was built for.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Check if the file at `relative` (to the root) should be indexed.
    ///
    /// Applies [`matches_path`](Self::matches_path) and then the ignore
    /// files on disk. Existence is checked by the caller.
    #[must_use]
    pub fn accepts(&self, relative: &Path) -> bool {
        self.matches_path(relative) && !self.is_gitignored(relative)
    }

    /// Path-only rules: included extension, no ignored directory and no
    /// hidden component.
    #[must_use]
    pub fn matches_path(&self, relative: &Path) -> bool {
        self.has_included_extension(relative) && !in_ignored_dir(relative) && !is_hidden(relative)
    }

    /// Check if the extension of `path` is one of the configured ones.
    #[must_use]
    pub fn has_included_extension(&self, path: &Path) -> bool {
        extension_from_path(&path.to_string_lossy())
            .is_some_and(|ext| self.extensions.iter().any(|e| *e == ext))
    }

    /// Whether `relative` is ignored by `.git/info/exclude` or any
    /// `.gitignore` between the root and the file.
    ///
    /// The deepest file with a matching rule decides, so a nested `!pattern`
    /// re-includes what a parent ignores.
    #[must_use]
    pub fn is_gitignored(&self, relative: &Path) -> bool {
        let mut dirs = vec![PathBuf::new()];
        if let Some(parent) = relative.parent() {
            let mut dir = PathBuf::new();
            for component in parent.components() {
                dir.push(component);
                dirs.push(dir.clone());
            }
        }

        for dir in dirs.iter().rev() {
            let Some(gitignore) = self.load_ignore_rules(dir) else {
                continue;
            };
            let within = relative.strip_prefix(dir).unwrap_or(relative);
            let matched = gitignore.matched_path_or_any_parents(within, false);
            if matched.is_ignore() {
                return true;
            }
            if matched.is_whitelist() {
                return false;
            }
        }
        false
    }

    /// Ignore rules declared in `dir` (relative to the root), read fresh
    /// from disk.
    fn load_ignore_rules(&self, dir: &Path) -> Option<Gitignore> {
        let base = self.root.join(dir);
        let mut files = Vec::with_capacity(2);
        if dir.as_os_str().is_empty() {
            files.push(self.root.join(".git").join("info").join("exclude"));
        }
        files.push(base.join(".gitignore"));

        let mut builder = GitignoreBuilder::new(&base);
        let mut found = false;
        for file in files.iter().filter(|f| f.is_file()) {
            found = true;
            if let Some(e) = builder.add(file) {
                tracing::warn!(path = %file.display(), error = %e, "Skipping unreadable ignore rules");
            }
        }
        if !found {
            return None;
        }

        builder
            .build()
            .map_err(|e| tracing::warn!(path = %base.display(), error = %e, "Invalid ignore rules"))
            .ok()
    }
}

/// Whether any component of `path` starts with a dot.
#[must_use]
pub fn is_hidden(path: &Path) -> bool {
    path.components().any(|component| match component {
        Component::Normal(name) => name.to_string_lossy().starts_with('.'),
        _ => false,
    })
}

/// Whether any directory component of `path` is in [`IGNORED_DIRS`].
#[must_use]
pub fn in_ignored_dir(path: &Path) -> bool {
    let mut components = path.components().peekable();
    while let Some(component) = components.next() {
        if components.peek().is_none() {
            break;
        }
        if let Component::Normal(name) = component {
            if IGNORED_DIRS.iter().any(|dir| name == *dir) {
                return true;
            }
        }
    }
    false
}
