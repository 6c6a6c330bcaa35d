//! Idempotent patch application
//!
//! Applies [`PatchSpec`] ops in list order under a [`PathPolicy`]. Every op
//! is safe to re-apply: content already present in the target is a no-op.
//! Runs are explicitly non-transactional; a failure on op N leaves ops
//! 1..N-1 committed and is reported in the run outcome.

use crate::error::PatchError;
use crate::safety::PathPolicy;
use crate::spec::{PatchMode, PatchOp, PatchSpec};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::ErrorKind;
use std::path::Path;

/// Per-op application result
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PatchResult {
    /// Target path as supplied in the op
    pub path: String,
    /// Mode that was applied
    pub mode: PatchMode,
    /// Whether the file was modified (false for idempotent no-ops)
    pub changed: bool,
}

/// Aggregated run summary, written as the JSON summary artifact
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunSummary {
    /// Results of the ops that were actually attempted, in order
    pub results: Vec<PatchResult>,
}

/// Outcome of one patch run
///
/// The summary always reflects what was done, even when the run aborted
/// partway through.
#[derive(Debug)]
pub struct RunOutcome {
    /// What was applied
    pub summary: RunSummary,
    /// The error that aborted the run, if any
    pub failure: Option<PatchError>,
}

impl RunOutcome {
    /// Whether every op completed
    #[inline]
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.failure.is_none()
    }

    /// Number of ops that modified their target
    #[inline]
    #[must_use]
    pub fn changed_count(&self) -> usize {
        self.summary.results.iter().filter(|r| r.changed).count()
    }

    /// Write the summary artifact, overwriting any previous one
    ///
    /// # Errors
    /// Returns [`PatchError::Io`] when the summary cannot be written.
    pub fn write_summary(&self, path: impl AsRef<Path>) -> Result<(), PatchError> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| PatchError::io(parent, e))?;
        }
        let json = serde_json::to_string_pretty(&self.summary)
            .map_err(|e| PatchError::Validation(e.to_string()))?;
        fs::write(path, json).map_err(|e| PatchError::io(path, e))
    }
}

/// Applies SIP operations under a path policy
#[derive(Debug, Clone)]
pub struct PatchApplier {
    policy: PathPolicy,
}

impl PatchApplier {
    /// Create an applier over a path policy
    #[inline]
    #[must_use]
    pub fn new(policy: PathPolicy) -> Self {
        Self { policy }
    }

    /// The active path policy
    #[inline]
    #[must_use]
    pub fn policy(&self) -> &PathPolicy {
        &self.policy
    }

    /// Apply one op
    ///
    /// # Errors
    /// Returns [`PatchError::Validation`] for a missing anchor,
    /// [`PatchError::Policy`] for path violations (both before any
    /// mutation), [`PatchError::TargetNotFound`] / [`PatchError::AnchorNotFound`]
    /// per mode semantics, and [`PatchError::Io`] for filesystem failures.
    pub fn apply_op(&self, op: &PatchOp) -> Result<PatchResult, PatchError> {
        if op.mode.requires_anchor() && op.anchor.as_deref().map_or(true, str::is_empty) {
            return Err(PatchError::Validation(format!(
                "mode '{}' requires a match anchor (path '{}')",
                op.mode.as_str(),
                op.path
            )));
        }

        let target = self.policy.ensure_safe_path(&op.path)?;
        let changed = match op.mode {
            PatchMode::Append => self.apply_append(&target, &op.content)?,
            PatchMode::ReplaceBlock => {
                self.apply_anchored(&target, op, |existing, anchor, content| {
                    existing.replacen(anchor, content, 1)
                })?
            }
            PatchMode::InsertBefore => {
                self.apply_anchored(&target, op, |existing, anchor, content| {
                    let at = existing.find(anchor).unwrap_or(0);
                    let mut out = String::with_capacity(existing.len() + content.len());
                    out.push_str(&existing[..at]);
                    out.push_str(content);
                    out.push_str(&existing[at..]);
                    out
                })?
            }
            PatchMode::InsertAfter => {
                self.apply_anchored(&target, op, |existing, anchor, content| {
                    let at = existing.find(anchor).map_or(existing.len(), |i| i + anchor.len());
                    let mut out = String::with_capacity(existing.len() + content.len());
                    out.push_str(&existing[..at]);
                    out.push_str(content);
                    out.push_str(&existing[at..]);
                    out
                })?
            }
        };

        tracing::debug!(path = %op.path, mode = op.mode.as_str(), changed, "applied patch op");
        Ok(PatchResult {
            path: op.path.clone(),
            mode: op.mode,
            changed,
        })
    }

    /// Run a whole spec, aborting on the first failure
    ///
    /// The spec is validated before any file is touched. Already-applied ops
    /// stay committed when a later op fails; the outcome's summary reflects
    /// exactly what was attempted.
    #[must_use]
    pub fn run(&self, spec: &PatchSpec) -> RunOutcome {
        let mut summary = RunSummary::default();
        if let Err(err) = spec.validate() {
            return RunOutcome {
                summary,
                failure: Some(err),
            };
        }

        for op in &spec.ops {
            match self.apply_op(op) {
                Ok(result) => summary.results.push(result),
                Err(err) => {
                    tracing::warn!(path = %op.path, %err, "patch run aborted");
                    return RunOutcome {
                        summary,
                        failure: Some(err),
                    };
                }
            }
        }
        RunOutcome {
            summary,
            failure: None,
        }
    }

    fn apply_append(&self, target: &Path, content: &str) -> Result<bool, PatchError> {
        let existing = match fs::read_to_string(target) {
            Ok(text) => text,
            Err(e) if e.kind() == ErrorKind::NotFound => String::new(),
            Err(e) => return Err(PatchError::io(target, e)),
        };

        if existing.contains(content) {
            return Ok(false);
        }

        let mut out = existing;
        if !out.is_empty() && !out.ends_with('\n') {
            out.push('\n');
        }
        out.push_str(content);
        out.push('\n');
        fs::write(target, out).map_err(|e| PatchError::io(target, e))?;
        Ok(true)
    }

    /// Shared existence/idempotence/anchor checks for the anchored modes
    fn apply_anchored(
        &self,
        target: &Path,
        op: &PatchOp,
        splice: impl Fn(&str, &str, &str) -> String,
    ) -> Result<bool, PatchError> {
        let anchor = op.anchor.as_deref().unwrap_or_default();
        let existing = match fs::read_to_string(target) {
            Ok(text) => text,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Err(PatchError::TargetNotFound {
                    path: target.to_path_buf(),
                })
            }
            Err(e) => return Err(PatchError::io(target, e)),
        };

        if existing.contains(&op.content) {
            return Ok(false);
        }
        if !existing.contains(anchor) {
            return Err(PatchError::AnchorNotFound {
                path: target.to_path_buf(),
            });
        }

        let updated = splice(&existing, anchor, &op.content);
        fs::write(target, updated).map_err(|e| PatchError::io(target, e))?;
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn applier() -> (tempfile::TempDir, PatchApplier) {
        let dir = tempfile::tempdir().unwrap();
        let applier = PatchApplier::new(PathPolicy::with_default_roots(dir.path()));
        (dir, applier)
    }

    fn append_op(path: &str, content: &str) -> PatchOp {
        PatchOp {
            path: path.to_string(),
            mode: PatchMode::Append,
            content: content.to_string(),
            anchor: None,
        }
    }

    fn anchored_op(path: &str, mode: PatchMode, content: &str, anchor: &str) -> PatchOp {
        PatchOp {
            path: path.to_string(),
            mode,
            content: content.to_string(),
            anchor: Some(anchor.to_string()),
        }
    }

    #[test]
    fn append_creates_file_with_trailing_newline() {
        let (dir, applier) = applier();
        let result = applier.apply_op(&append_op("g/tools/sample.txt", "hello")).unwrap();
        assert!(result.changed);
        let text = fs::read_to_string(dir.path().join("g/tools/sample.txt")).unwrap();
        assert_eq!(text, "hello\n");
    }

    #[test]
    fn append_twice_is_idempotent() {
        let (dir, applier) = applier();
        let op = append_op("g/tools/sample.txt", "hello");
        assert!(applier.apply_op(&op).unwrap().changed);
        assert!(!applier.apply_op(&op).unwrap().changed);
        let text = fs::read_to_string(dir.path().join("g/tools/sample.txt")).unwrap();
        assert_eq!(text, "hello\n");
    }

    #[test]
    fn append_separates_with_single_newline() {
        let (dir, applier) = applier();
        let target = dir.path().join("docs/notes.md");
        fs::create_dir_all(target.parent().unwrap()).unwrap();
        fs::write(&target, "existing text").unwrap();

        applier.apply_op(&append_op("docs/notes.md", "more")).unwrap();
        assert_eq!(fs::read_to_string(&target).unwrap(), "existing text\nmore\n");
    }

    #[test]
    fn append_superstring_still_applies() {
        let (dir, applier) = applier();
        let op = append_op("g/tools/sample.txt", "hello");
        applier.apply_op(&op).unwrap();
        // "hello world" is not a substring of "hello\n", so it appends
        let result = applier.apply_op(&append_op("g/tools/sample.txt", "hello world")).unwrap();
        assert!(result.changed);
        let text = fs::read_to_string(dir.path().join("g/tools/sample.txt")).unwrap();
        assert_eq!(text, "hello\nhello world\n");
    }

    #[test]
    fn replace_block_substitutes_first_occurrence() {
        let (dir, applier) = applier();
        let target = dir.path().join("config/app.conf");
        fs::create_dir_all(target.parent().unwrap()).unwrap();
        fs::write(&target, "key=old\nother=old\n").unwrap();

        let op = anchored_op("config/app.conf", PatchMode::ReplaceBlock, "key=new", "key=old");
        assert!(applier.apply_op(&op).unwrap().changed);
        assert_eq!(fs::read_to_string(&target).unwrap(), "key=new\nother=old\n");
    }

    #[test]
    fn replace_block_is_idempotent() {
        let (dir, applier) = applier();
        let target = dir.path().join("config/app.conf");
        fs::create_dir_all(target.parent().unwrap()).unwrap();
        fs::write(&target, "key=old\n").unwrap();

        let op = anchored_op("config/app.conf", PatchMode::ReplaceBlock, "key=new", "key=old");
        assert!(applier.apply_op(&op).unwrap().changed);
        assert!(!applier.apply_op(&op).unwrap().changed);
        assert_eq!(fs::read_to_string(&target).unwrap(), "key=new\n");
    }

    #[test]
    fn replace_block_missing_target_fails() {
        let (_dir, applier) = applier();
        let op = anchored_op("config/absent.conf", PatchMode::ReplaceBlock, "new", "old");
        let result = applier.apply_op(&op);
        assert!(matches!(result, Err(PatchError::TargetNotFound { .. })));
    }

    #[test]
    fn replace_block_missing_anchor_fails_and_leaves_file() {
        let (dir, applier) = applier();
        let target = dir.path().join("config/app.conf");
        fs::create_dir_all(target.parent().unwrap()).unwrap();
        fs::write(&target, "untouched\n").unwrap();

        let op = anchored_op("config/app.conf", PatchMode::ReplaceBlock, "new", "no such anchor");
        let result = applier.apply_op(&op);
        assert!(matches!(result, Err(PatchError::AnchorNotFound { .. })));
        assert_eq!(fs::read_to_string(&target).unwrap(), "untouched\n");
    }

    #[test]
    fn anchored_mode_without_anchor_is_validation_error() {
        let (_dir, applier) = applier();
        let op = PatchOp {
            path: "config/app.conf".to_string(),
            mode: PatchMode::InsertAfter,
            content: "x".to_string(),
            anchor: None,
        };
        assert!(matches!(applier.apply_op(&op), Err(PatchError::Validation(_))));
    }

    #[test]
    fn insert_before_splices_at_anchor() {
        let (dir, applier) = applier();
        let target = dir.path().join("docs/guide.md");
        fs::create_dir_all(target.parent().unwrap()).unwrap();
        fs::write(&target, "alpha beta").unwrap();

        let op = anchored_op("docs/guide.md", PatchMode::InsertBefore, "pre-", "beta");
        assert!(applier.apply_op(&op).unwrap().changed);
        assert_eq!(fs::read_to_string(&target).unwrap(), "alpha pre-beta");
    }

    #[test]
    fn insert_after_splices_at_anchor() {
        let (dir, applier) = applier();
        let target = dir.path().join("docs/guide.md");
        fs::create_dir_all(target.parent().unwrap()).unwrap();
        fs::write(&target, "alpha beta").unwrap();

        let op = anchored_op("docs/guide.md", PatchMode::InsertAfter, "-post", "alpha");
        assert!(applier.apply_op(&op).unwrap().changed);
        assert_eq!(fs::read_to_string(&target).unwrap(), "alpha-post beta");
    }

    #[test]
    fn insert_is_idempotent_once_content_present() {
        let (dir, applier) = applier();
        let target = dir.path().join("docs/guide.md");
        fs::create_dir_all(target.parent().unwrap()).unwrap();
        fs::write(&target, "alpha beta").unwrap();

        let op = anchored_op("docs/guide.md", PatchMode::InsertAfter, "-post", "alpha");
        assert!(applier.apply_op(&op).unwrap().changed);
        assert!(!applier.apply_op(&op).unwrap().changed);
    }

    #[test]
    fn run_aborts_on_failure_but_keeps_prior_ops() {
        let (dir, applier) = applier();
        let spec = PatchSpec {
            ops: vec![
                append_op("g/tools/a.txt", "first"),
                anchored_op("config/absent.conf", PatchMode::ReplaceBlock, "new", "old"),
                append_op("g/tools/b.txt", "never reached"),
            ],
        };
        let outcome = applier.run(&spec);
        assert!(!outcome.is_success());
        assert_eq!(outcome.summary.results.len(), 1);
        assert!(dir.path().join("g/tools/a.txt").exists());
        assert!(!dir.path().join("g/tools/b.txt").exists());
    }

    #[test]
    fn run_rejects_empty_spec_before_touching_files() {
        let (_dir, applier) = applier();
        let outcome = applier.run(&PatchSpec { ops: vec![] });
        assert!(matches!(outcome.failure, Some(PatchError::Validation(_))));
        assert!(outcome.summary.results.is_empty());
    }

    #[test]
    fn summary_artifact_overwrites_previous_run() {
        let (dir, applier) = applier();
        let summary_path = dir.path().join("logs/sip_summary.json");

        let outcome = applier.run(&PatchSpec {
            ops: vec![append_op("g/tools/a.txt", "one")],
        });
        outcome.write_summary(&summary_path).unwrap();

        let outcome = applier.run(&PatchSpec {
            ops: vec![append_op("g/tools/a.txt", "one")],
        });
        outcome.write_summary(&summary_path).unwrap();

        let summary: RunSummary =
            serde_json::from_str(&fs::read_to_string(&summary_path).unwrap()).unwrap();
        assert_eq!(summary.results.len(), 1);
        assert!(!summary.results[0].changed);
    }
}
