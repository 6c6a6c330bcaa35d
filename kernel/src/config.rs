//! Kernel configuration
//!
//! One explicit configuration struct, constructed by the composing process
//! and passed to each component. No module-level state, no
//! environment-variable singletons.

use mesh_ledger::{default_ledger_path, discover_repo_root};
use std::path::{Path, PathBuf};

/// Relative audit-trail location under the repository root
pub const AUDIT_RELATIVE_PATH: &str = "telemetry/audit/events.jsonl";

/// Relative run-summary location under the repository root
pub const SUMMARY_RELATIVE_PATH: &str = "telemetry/sip_summary.json";

/// Relative lane-config location under the repository root
pub const LANE_CONFIG_RELATIVE_PATH: &str = "config/lanes.yaml";

/// Agent identifier stamped into audit records
pub const KERNEL_AGENT: &str = "mesh-kernel";

/// Everything the kernel needs to wire its components
#[derive(Debug, Clone)]
pub struct KernelConfig {
    /// Managed repository root; patch targets resolve under it
    pub base_dir: PathBuf,
    /// Idempotency ledger file
    pub ledger_path: PathBuf,
    /// Audit trail file
    pub audit_path: PathBuf,
    /// Patch run-summary artifact
    pub summary_path: PathBuf,
    /// Lane-selection rules (missing/unparseable falls back to defaults)
    pub lane_config_path: PathBuf,
    /// Agent identifier for audit records
    pub agent: String,
}

impl KernelConfig {
    /// Build a config rooted at the repository containing `start`
    ///
    /// Walks up from `start` to the nearest version-control root (falling
    /// back to `start`) and places the conventional telemetry files under
    /// it.
    #[must_use]
    pub fn discover(start: impl AsRef<Path>) -> Self {
        let root = discover_repo_root(start);
        Self {
            ledger_path: default_ledger_path(&root),
            audit_path: root.join(AUDIT_RELATIVE_PATH),
            summary_path: root.join(SUMMARY_RELATIVE_PATH),
            lane_config_path: root.join(LANE_CONFIG_RELATIVE_PATH),
            base_dir: root,
            agent: KERNEL_AGENT.to_string(),
        }
    }
}
