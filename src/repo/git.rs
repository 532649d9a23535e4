//! Thin wrapper over the `git` executable.
//!
//! Every helper returns the failing command's trimmed stderr as the error
//! string; callers wrap it in the matching [`crate::error::RepositoryError`].

use std::path::Path;
use std::process::Command;

use super::events::ChangeKind;

type GitResult<T> = std::result::Result<T, String>;

/// One entry of `git diff --name-status`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiffEntry {
    /// Classified change.
    pub kind: ChangeKind,
    /// Path relative to the repository root (the new path for renames).
    pub path: String,
}

fn git(dir: Option<&Path>, args: &[&str]) -> GitResult<String> {
    let mut cmd = Command::new("git");
    cmd.args(args).env("GIT_TERMINAL_PROMPT", "0");
    if let Some(dir) = dir {
        cmd.current_dir(dir);
    }

    let output = cmd
        .output()
        .map_err(|e| format!("failed to execute 'git {}': {e}", args.join(" ")))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(format!("git {} failed: {}", args[0], stderr.trim()));
    }

    Ok(String::from_utf8_lossy(&output.stdout).into_owned())
}

/// Clone `url` into `dest`.
pub fn clone(url: &str, dest: &Path) -> GitResult<()> {
    let dest = dest.to_string_lossy();
    git(None, &["clone", "--quiet", url, &dest]).map(|_| ())
}

/// Whether `dir` is the top level of a work tree.
pub fn is_work_tree(dir: &Path) -> bool {
    git(Some(dir), &["rev-parse", "--is-inside-work-tree"])
        .is_ok_and(|out| out.trim() == "true")
}

/// URL of remote `name`, if it exists.
pub fn remote_url(dir: &Path, name: &str) -> Option<String> {
    git(Some(dir), &["remote", "get-url", name])
        .ok()
        .map(|out| out.trim().to_string())
}

/// Create remote `name` or repoint it at `url`.
pub fn ensure_remote(dir: &Path, name: &str, url: &str) -> GitResult<()> {
    match remote_url(dir, name) {
        Some(current) if current == url => Ok(()),
        Some(_) => git(Some(dir), &["remote", "set-url", name, url]).map(|_| ()),
        None => git(Some(dir), &["remote", "add", name, url]).map(|_| ()),
    }
}

/// Commit id of `HEAD`.
pub fn head(dir: &Path) -> GitResult<String> {
    git(Some(dir), &["rev-parse", "HEAD"]).map(|out| out.trim().to_string())
}

/// Fast-forward the checked out branch to `origin`'s `HEAD`.
pub fn pull(dir: &Path) -> GitResult<()> {
    git(
        Some(dir),
        &["pull", "--quiet", "--ff-only", "--no-rebase", "origin", "HEAD"],
    )
    .map(|_| ())
}

/// File-level changes between two commits.
pub fn diff(dir: &Path, old: &str, new: &str) -> GitResult<Vec<DiffEntry>> {
    let out = git(
        Some(dir),
        &["diff", "--name-status", "-z", "-M", "--no-ext-diff", old, new],
    )?;
    Ok(parse_name_status(&out))
}

/// Parse NUL-separated `--name-status -z` output.
///
/// Renames and copies carry two paths; the second (new) one is reported.
fn parse_name_status(out: &str) -> Vec<DiffEntry> {
    let mut fields = out.split('\0').filter(|f| !f.is_empty());
    let mut entries = Vec::new();

    while let Some(status) = fields.next() {
        let two_paths = status.starts_with('R') || status.starts_with('C');
        let Some(mut path) = fields.next() else {
            break;
        };
        if two_paths {
            match fields.next() {
                Some(new_path) => path = new_path,
                None => break,
            }
        }
        entries.push(DiffEntry {
            kind: ChangeKind::from_git_status(status),
            path: path.to_string(),
        });
    }

    entries
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_name_status() {
        let out = "A\0new.md\0D\0gone.rs\0M\0src/lib.rs\0R087\0old.py\0renamed.py\0T\0link\0";
        let entries = parse_name_status(out);

        assert_eq!(
            entries,
            vec![
                DiffEntry { kind: ChangeKind::Added, path: "new.md".into() },
                DiffEntry { kind: ChangeKind::Removed, path: "gone.rs".into() },
                DiffEntry { kind: ChangeKind::Modified, path: "src/lib.rs".into() },
                DiffEntry { kind: ChangeKind::Modified, path: "renamed.py".into() },
                DiffEntry { kind: ChangeKind::Modified, path: "link".into() },
            ]
        );
    }

    #[test]
    fn test_parse_name_status_empty() {
        assert!(parse_name_status("").is_empty());
    }

    #[test]
    fn test_parse_paths_with_spaces() {
        let entries = parse_name_status("M\0docs/read me.md\0");
        assert_eq!(entries[0].path, "docs/read me.md");
    }
}
