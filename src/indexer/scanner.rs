//! Repository walk for full ingestion.
//!
//! Walks the checkout respecting `.gitignore` and returns the files that
//! pass the [`FileFilter`]. The filter is applied to every walked file, so
//! the walk never yields a file that `FileFilter::accepts` rejects.

use std::path::{Path, PathBuf};

use ignore::WalkBuilder;

use super::filter::{FileFilter, IGNORED_DIRS};

/// Result of one repository walk.
#[derive(Debug, Clone, Default)]
pub struct ScanResult {
    /// Accepted files, sorted by path.
    pub files: Vec<PathBuf>,
    pub files_found: u64,
    pub files_skipped: u64,
    pub errors: u64,
}

/// Walk `filter.root()` and collect the files to index.
#[must_use]
pub fn scan_repository(filter: &FileFilter) -> ScanResult {
    let root = filter.root();
    let mut result = ScanResult::default();

    tracing::info!(path = %root.display(), "Starting repository scan");

    let walker = WalkBuilder::new(root)
        .hidden(true)
        .ignore(false)
        .git_ignore(true)
        .git_global(false)
        .git_exclude(true)
        .require_git(false)
        .parents(false)
        .filter_entry(|entry| {
            let is_dir = entry.file_type().is_some_and(|ft| ft.is_dir());
            !(is_dir && IGNORED_DIRS.iter().any(|dir| entry.file_name() == *dir))
        })
        .build();

    for entry in walker {
        match entry {
            Ok(entry) => {
                if !entry.file_type().is_some_and(|ft| ft.is_file()) {
                    continue;
                }

                result.files_found += 1;

                let accepted = entry
                    .path()
                    .strip_prefix(root)
                    .is_ok_and(|relative| filter.accepts(relative));

                if accepted {
                    result.files.push(entry.into_path());
                } else {
                    result.files_skipped += 1;
                }
            }
            Err(e) => {
                tracing::warn!(error = %e, "Error walking repository");
                result.errors += 1;
            }
        }
    }

    result.files.sort();

    tracing::info!(
        path = %root.display(),
        found = result.files_found,
        accepted = result.files.len(),
        skipped = result.files_skipped,
        errors = result.errors,
        "Repository scan complete"
    );

    result
}

/// Path of `file` relative to `root`, with `/` separators.
pub(crate) fn relative_source(root: &Path, file: &Path) -> Option<String> {
    let relative = file.strip_prefix(root).ok()?;
    let parts: Vec<String> = relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy().into_owned())
        .collect();
    (!parts.is_empty()).then(|| parts.join("/"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_scan_repository() {
        let tmp = TempDir::new().unwrap();

        let src = tmp.path().join("src");
        fs::create_dir(&src).unwrap();
        fs::write(src.join("main.rs"), "fn main() {}").unwrap();
        fs::write(src.join("util.py"), "def f():\n    pass\n").unwrap();
        fs::write(tmp.path().join("README.md"), "# Readme").unwrap();
        fs::write(tmp.path().join("logo.png"), [0_u8, 1, 2]).unwrap();

        let node_modules = tmp.path().join("node_modules");
        fs::create_dir(&node_modules).unwrap();
        fs::write(node_modules.join("pkg.json"), "{}").unwrap();

        let target = tmp.path().join("target");
        fs::create_dir(&target).unwrap();
        fs::write(target.join("out.rs"), "fn generated() {}").unwrap();

        fs::write(tmp.path().join(".gitignore"), "secret.txt\n").unwrap();
        fs::write(tmp.path().join("secret.txt"), "hunter2").unwrap();

        fs::create_dir(tmp.path().join(".github")).unwrap();
        fs::write(tmp.path().join(".github/ci.json"), "{}").unwrap();
        fs::write(src.join(".gitignore"), "util.py\n").unwrap();

        let extensions: Vec<String> = [".rs", ".py", ".md", ".txt", ".json"]
            .iter()
            .map(|e| (*e).to_string())
            .collect();
        let filter = FileFilter::new(tmp.path(), &extensions);
        let result = scan_repository(&filter);

        let names: Vec<String> = result
            .files
            .iter()
            .filter_map(|p| relative_source(tmp.path(), p))
            .collect();
        assert_eq!(names, vec!["README.md", "src/main.rs"]);
        for name in &names {
            assert!(filter.accepts(Path::new(name)));
        }
        assert!(result.files_skipped >= 1);
        assert_eq!(result.errors, 0);
    }

    #[test]
    fn test_relative_source() {
        let root = Path::new("/repo");
        assert_eq!(
            relative_source(root, Path::new("/repo/src/lib.rs")).as_deref(),
            Some("src/lib.rs")
        );
        assert_eq!(relative_source(root, Path::new("/elsewhere/lib.rs")), None);
        assert_eq!(relative_source(root, root), None);
    }
}
