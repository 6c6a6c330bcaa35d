//! Path allow-list enforcement
//!
//! All patch targets resolve through [`PathPolicy::ensure_safe_path`], which
//! confines writes to allow-listed top-level segments under a base
//! directory and rejects escapes via `..`, absolute paths, or symlinked
//! ancestors.

use crate::error::PatchError;
use std::fs;
use std::path::{Component, Path, PathBuf};

/// Top-level segments writable by default: g (tools), config, docs, logs
pub const DEFAULT_ALLOWED_ROOTS: &[&str] = &["g", "config", "docs", "logs"];

/// Confines patch targets to allow-listed subtrees of a base directory
#[derive(Debug, Clone)]
pub struct PathPolicy {
    base_dir: PathBuf,
    allowed_roots: Vec<String>,
}

impl PathPolicy {
    /// Create a policy with an explicit allow-list
    #[inline]
    #[must_use]
    pub fn new(base_dir: impl Into<PathBuf>, allowed_roots: Vec<String>) -> Self {
        Self {
            base_dir: base_dir.into(),
            allowed_roots,
        }
    }

    /// Create a policy with [`DEFAULT_ALLOWED_ROOTS`]
    #[inline]
    #[must_use]
    pub fn with_default_roots(base_dir: impl Into<PathBuf>) -> Self {
        Self::new(
            base_dir,
            DEFAULT_ALLOWED_ROOTS.iter().map(|r| (*r).to_string()).collect(),
        )
    }

    /// The base directory targets resolve under
    #[inline]
    #[must_use]
    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    /// The allow-listed top-level segments
    #[inline]
    #[must_use]
    pub fn allowed_roots(&self) -> &[String] {
        &self.allowed_roots
    }

    /// Validate and resolve a relative target path
    ///
    /// Rejects absolute paths, any `..` segment, and first segments outside
    /// the allow-list; verifies the resolved location cannot escape the base
    /// directory through a symlinked ancestor; creates missing parent
    /// directories; returns the resolved absolute path.
    ///
    /// # Errors
    /// Returns [`PatchError::Policy`] for any rule violation and
    /// [`PatchError::Io`] for filesystem failures during resolution.
    pub fn ensure_safe_path(&self, relative: &str) -> Result<PathBuf, PatchError> {
        let rel = Path::new(relative);
        if rel.is_absolute() {
            return Err(PatchError::policy(relative, "absolute paths are not allowed"));
        }

        let mut first_segment: Option<&str> = None;
        for component in rel.components() {
            match component {
                Component::Normal(seg) => {
                    if first_segment.is_none() {
                        first_segment = Some(seg.to_str().ok_or_else(|| {
                            PatchError::policy(relative, "path is not valid unicode")
                        })?);
                    }
                }
                Component::ParentDir => {
                    return Err(PatchError::policy(
                        relative,
                        "parent references ('..') are not allowed",
                    ));
                }
                Component::CurDir => {}
                Component::RootDir | Component::Prefix(_) => {
                    return Err(PatchError::policy(relative, "absolute paths are not allowed"));
                }
            }
        }

        let Some(first) = first_segment else {
            return Err(PatchError::policy(relative, "path has no segments"));
        };
        if !self.allowed_roots.iter().any(|root| root == first) {
            return Err(PatchError::policy(
                relative,
                format!("top-level segment '{first}' is not allow-listed"),
            ));
        }

        let base = fs::canonicalize(&self.base_dir)
            .map_err(|e| PatchError::io(&self.base_dir, e))?;
        let candidate = base.join(rel);

        // Resolve the deepest existing ancestor before creating anything, so
        // a symlinked directory inside the base cannot redirect the write
        // outside it.
        let parent = candidate.parent().unwrap_or(&base).to_path_buf();
        let mut anchor = parent.clone();
        while !anchor.exists() {
            match anchor.parent() {
                Some(p) => anchor = p.to_path_buf(),
                None => break,
            }
        }
        let resolved_anchor =
            fs::canonicalize(&anchor).map_err(|e| PatchError::io(&anchor, e))?;
        if !resolved_anchor.starts_with(&base) {
            return Err(PatchError::policy(
                relative,
                "path resolution escapes the base directory",
            ));
        }

        fs::create_dir_all(&parent).map_err(|e| PatchError::io(&parent, e))?;
        Ok(candidate)
    }
}
