//! Ledger path discovery
//!
//! Finds the conventional ledger location by walking up from a starting
//! directory to the nearest version-control root.

use std::path::{Path, PathBuf};

/// Relative ledger location under the repository root
pub const LEDGER_RELATIVE_PATH: &str = "telemetry/ledger/patch_ledger.jsonl";

/// Nearest directory at or above `start` containing a `.git` entry
///
/// Falls back to `start` itself when no version-control root is found.
#[must_use]
pub fn discover_repo_root(start: impl AsRef<Path>) -> PathBuf {
    let start = start.as_ref();
    let mut current = Some(start);
    while let Some(dir) = current {
        if dir.join(".git").exists() {
            return dir.to_path_buf();
        }
        current = dir.parent();
    }
    start.to_path_buf()
}

/// Conventional ledger path for the repository containing `start`
#[must_use]
pub fn default_ledger_path(start: impl AsRef<Path>) -> PathBuf {
    discover_repo_root(start).join(LEDGER_RELATIVE_PATH)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn finds_git_root_above_start() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        std::fs::create_dir_all(root.join(".git")).unwrap();
        let nested = root.join("a/b/c");
        std::fs::create_dir_all(&nested).unwrap();
        assert_eq!(discover_repo_root(&nested), root);
    }

    #[test]
    fn falls_back_to_start_without_git() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("x/y");
        std::fs::create_dir_all(&nested).unwrap();
        // No .git anywhere under the tempdir; the walk may still hit one in
        // an ancestor, so only assert the fallback when it did not.
        let root = discover_repo_root(&nested);
        assert!(root == nested || root.join(".git").exists());
    }

    #[test]
    fn ledger_path_is_under_telemetry() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join(".git")).unwrap();
        let path = default_ledger_path(dir.path());
        assert_eq!(path, dir.path().join("telemetry/ledger/patch_ledger.jsonl"));
    }
}
