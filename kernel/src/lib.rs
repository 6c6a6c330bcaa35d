//! Mesh kernel - composition layer for the mesh core
//!
//! Owns the lifecycle of every component: one [`KernelConfig`] constructed
//! by the composing process, one [`Pipeline`] wiring routing, ledger, patch,
//! and audit together. The CLI binary is a thin shell over this crate.

#![warn(unreachable_pub)]

pub mod config;
pub mod pipeline;

pub use config::{
    KernelConfig, AUDIT_RELATIVE_PATH, KERNEL_AGENT, LANE_CONFIG_RELATIVE_PATH,
    SUMMARY_RELATIVE_PATH,
};
pub use pipeline::{Pipeline, PipelineError, PipelineOutcome};
