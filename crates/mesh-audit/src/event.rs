//! Audit events and the append-only emitter
//!
//! One JSON object per line, fixed schema version, closed vocabularies for
//! category, status, and severity. Invalid vocabulary values are rejected at
//! the boundary, before anything is written. Events are never mutated or
//! deleted.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Schema version stamped into every event
pub const AUDIT_SCHEMA_VERSION: u32 = 1;

/// Event category vocabulary
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AuditCategory {
    Routing,
    Patch,
    Ledger,
    System,
    Security,
}

impl FromStr for AuditCategory {
    type Err = AuditError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "routing" => Ok(Self::Routing),
            "patch" => Ok(Self::Patch),
            "ledger" => Ok(Self::Ledger),
            "system" => Ok(Self::System),
            "security" => Ok(Self::Security),
            other => Err(AuditError::InvalidVocabulary {
                field: "category",
                value: other.to_string(),
            }),
        }
    }
}

/// Event status vocabulary
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AuditStatus {
    Ok,
    Error,
    Skipped,
}

impl FromStr for AuditStatus {
    type Err = AuditError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ok" => Ok(Self::Ok),
            "error" => Ok(Self::Error),
            "skipped" => Ok(Self::Skipped),
            other => Err(AuditError::InvalidVocabulary {
                field: "status",
                value: other.to_string(),
            }),
        }
    }
}

/// Event severity vocabulary
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AuditSeverity {
    Info,
    Warning,
    Error,
    Critical,
}

impl FromStr for AuditSeverity {
    type Err = AuditError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "info" => Ok(Self::Info),
            "warning" => Ok(Self::Warning),
            "error" => Ok(Self::Error),
            "critical" => Ok(Self::Critical),
            other => Err(AuditError::InvalidVocabulary {
                field: "severity",
                value: other.to_string(),
            }),
        }
    }
}

/// One immutable audit record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditEvent {
    /// Fixed schema version
    pub schema_version: u32,
    /// UTC timestamp, second precision, `Z` suffix
    pub timestamp: String,
    /// Acting agent identifier
    pub agent: String,
    /// What happened
    pub action: String,
    /// Category vocabulary
    pub category: AuditCategory,
    /// Status vocabulary
    pub status: AuditStatus,
    /// Severity vocabulary
    pub severity: AuditSeverity,
    /// Origin of the action
    pub source: String,
    /// Human-readable message
    pub message: String,
    /// Optional structured payload
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<Value>,
}

/// Errors raised by the audit logger
#[derive(Debug, thiserror::Error)]
pub enum AuditError {
    /// A vocabulary field carried a value outside its closed set
    #[error("invalid {field} value: '{value}'")]
    InvalidVocabulary {
        /// Which field was rejected
        field: &'static str,
        /// The rejected value
        value: String,
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

    /// Event could not be encoded
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Append-only JSON-Lines audit emitter
#[derive(Debug, Clone)]
pub struct AuditLogger {
    path: PathBuf,
    agent: String,
}

impl AuditLogger {
    /// Create a logger writing to `path` on behalf of `agent`
    #[inline]
    #[must_use]
    pub fn new(path: impl Into<PathBuf>, agent: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            agent: agent.into(),
        }
    }

    /// The audit file path
    #[inline]
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append one event record
    ///
    /// # Errors
    /// Returns [`AuditError::Io`] on filesystem failure and
    /// [`AuditError::Serialization`] when the event cannot be encoded.
    pub fn emit(
        &self,
        action: &str,
        category: AuditCategory,
        status: AuditStatus,
        severity: AuditSeverity,
        source: &str,
        message: &str,
        details: Option<Value>,
    ) -> Result<(), AuditError> {
        self.emit_at(action, category, status, severity, source, message, details, Utc::now())
    }

    /// Append one event with an explicit timestamp (deterministic)
    ///
    /// # Errors
    /// Same as [`AuditLogger::emit`].
    #[allow(clippy::too_many_arguments)]
    pub fn emit_at(
        &self,
        action: &str,
        category: AuditCategory,
        status: AuditStatus,
        severity: AuditSeverity,
        source: &str,
        message: &str,
        details: Option<Value>,
        now: DateTime<Utc>,
    ) -> Result<(), AuditError> {
        let event = AuditEvent {
            schema_version: AUDIT_SCHEMA_VERSION,
            timestamp: now.format("%Y-%m-%dT%H:%M:%SZ").to_string(),
            agent: self.agent.clone(),
            action: action.to_string(),
            category,
            status,
            severity,
            source: source.to_string(),
            message: message.to_string(),
            details,
        };
        self.append(&event)
    }

    fn append(&self, event: &AuditEvent) -> Result<(), AuditError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(|e| AuditError::Io {
                path: parent.to_path_buf(),
                source: e,
            })?;
        }
        let line = serde_json::to_string(event)?;
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(|e| AuditError::Io {
                path: self.path.clone(),
                source: e,
            })?;
        writeln!(file, "{line}").map_err(|e| AuditError::Io {
            path: self.path.clone(),
            source: e,
        })?;
        tracing::debug!(path = %self.path.display(), action = %event.action, "appended audit event");
        Ok(())
    }
}
