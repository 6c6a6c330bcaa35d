//! Error taxonomy for patch execution
//!
//! Validation and policy errors are raised before any mutation; not-found
//! errors signal a missing anchor or target (a configuration mistake, never
//! silently skipped); io errors abort the remaining ops of a run.

use std::path::PathBuf;

/// Errors raised by patch validation and application
#[derive(Debug, thiserror::Error)]
pub enum PatchError {
    /// Malformed patch spec or op
    #[error("invalid patch spec: {0}")]
    Validation(String),

    /// Path allow-list or containment violation
    #[error("path policy violation on '{path}': {reason}")]
    Policy {
        /// Offending path as supplied by the caller
        path: String,
        /// What the path violated
        reason: String,
    },

    /// The op's target file does not exist
    #[error("target file not found: {path}")]
    TargetNotFound {
        /// Resolved target path
        path: PathBuf,
    },

    /// The op's anchor text is absent from the target file
    #[error("anchor text not found in {path}")]
    AnchorNotFound {
        /// Resolved target path
        path: PathBuf,
    },

    /// Filesystem failure
    #[error("io error on {path}: {source}")]
    Io {
        /// Path the failure occurred on
        path: PathBuf,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },
}

impl PatchError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn policy(path: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Policy {
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Whether this error was raised before any file was touched
    #[must_use]
    pub fn is_pre_mutation(&self) -> bool {
        matches!(self, PatchError::Validation(_) | PatchError::Policy { .. })
    }
}
