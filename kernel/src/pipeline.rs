//! Patch-execution pipeline
//!
//! Wires the routing, ledger, patch, and audit components into the
//! single-process flow: load spec → idempotency check → apply → ledger
//! append → audit. The ledger append for a completed run is durable before
//! the pipeline returns; retries of the same spec content become skips.

use crate::config::KernelConfig;
use mesh_audit::{AuditCategory, AuditError, AuditLogger, AuditSeverity, AuditStatus};
use mesh_ledger::{IdempotencyKey, Ledger, LedgerEntry, LedgerError, LedgerResult};
use mesh_patch::{PatchApplier, PatchError, PatchSpec, PathPolicy, RunOutcome, RunSummary};
use std::path::Path;

/// Errors surfaced by a pipeline run
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    /// Patch validation, policy, or application failure
    #[error(transparent)]
    Patch(#[from] PatchError),

    /// Ledger read/write failure
    #[error(transparent)]
    Ledger(#[from] LedgerError),

    /// Audit trail failure
    #[error(transparent)]
    Audit(#[from] AuditError),
}

/// What a pipeline run did
#[derive(Debug)]
pub enum PipelineOutcome {
    /// The key was already resolved; the recorded result was replayed
    Skipped {
        /// Key that short-circuited the run
        key: IdempotencyKey,
        /// The recorded success entry
        entry: LedgerEntry,
    },
    /// The patch ran to completion
    Applied {
        /// Key recorded for this run
        key: IdempotencyKey,
        /// What was applied
        summary: RunSummary,
    },
}

/// Single-process pipeline over one kernel configuration
#[derive(Debug)]
pub struct Pipeline {
    config: KernelConfig,
    applier: PatchApplier,
    ledger: Ledger,
    audit: AuditLogger,
}

impl Pipeline {
    /// Wire a pipeline from its configuration
    #[must_use]
    pub fn new(config: KernelConfig) -> Self {
        let applier = PatchApplier::new(PathPolicy::with_default_roots(&config.base_dir));
        let ledger = Ledger::new(&config.ledger_path);
        let audit = AuditLogger::new(&config.audit_path, &config.agent);
        Self {
            config,
            applier,
            ledger,
            audit,
        }
    }

    /// The active configuration
    #[inline]
    #[must_use]
    pub fn config(&self) -> &KernelConfig {
        &self.config
    }

    /// Execute a patch spec file idempotently
    ///
    /// The spec is loaded and validated before any ledger or filesystem
    /// work. A key with a recorded success short-circuits to
    /// [`PipelineOutcome::Skipped`]. Otherwise the patch runs; the outcome
    /// (success or failure) is appended to the ledger and the audit trail,
    /// and the run summary artifact is rewritten either way.
    ///
    /// # Errors
    /// Returns the first validation, policy, not-found, ledger, or io error
    /// hit. A patch failure is still recorded in the ledger and audit trail
    /// before it propagates.
    pub fn apply_spec(&self, spec_path: impl AsRef<Path>) -> Result<PipelineOutcome, PipelineError> {
        let spec_path = spec_path.as_ref();
        let spec = PatchSpec::from_file(spec_path)?;
        let (key, content_hash) = Ledger::compute_key(spec_path)?;

        if let Some(entry) = self.ledger.find_success(&key)? {
            tracing::info!(key = %key, "idempotency key already resolved, skipping");
            self.audit.emit(
                "patch_skipped",
                AuditCategory::Ledger,
                AuditStatus::Skipped,
                AuditSeverity::Info,
                "pipeline",
                &format!("spec {} already applied", spec_path.display()),
                Some(serde_json::json!({"idempotency_key": key.to_hex()})),
            )?;
            return Ok(PipelineOutcome::Skipped { key, entry });
        }

        let outcome = self.applier.run(&spec);
        outcome.write_summary(&self.config.summary_path)?;
        let changed = outcome.changed_count();

        let RunOutcome { summary, failure } = outcome;
        let summary_json = serde_json::to_value(&summary).unwrap_or(serde_json::Value::Null);
        match failure {
            None => {
                let entry = LedgerEntry::new(
                    key,
                    content_hash,
                    LedgerResult::success().with_extra("summary", summary_json),
                );
                self.ledger.append_entry(&entry)?;
                self.audit.emit(
                    "patch_applied",
                    AuditCategory::Patch,
                    AuditStatus::Ok,
                    AuditSeverity::Info,
                    "pipeline",
                    &format!("applied {} op(s), {changed} changed", summary.results.len()),
                    Some(serde_json::json!({"idempotency_key": key.to_hex()})),
                )?;
                Ok(PipelineOutcome::Applied { key, summary })
            }
            Some(failure) => {
                let entry = LedgerEntry::new(
                    key,
                    content_hash,
                    LedgerResult::failure()
                        .with_extra("summary", summary_json)
                        .with_extra("error", serde_json::json!(failure.to_string())),
                );
                self.ledger.append_entry(&entry)?;
                self.audit.emit(
                    "patch_failed",
                    AuditCategory::Patch,
                    AuditStatus::Error,
                    AuditSeverity::Error,
                    "pipeline",
                    &failure.to_string(),
                    Some(serde_json::json!({"idempotency_key": key.to_hex()})),
                )?;
                Err(failure.into())
            }
        }
    }
}
