//! Mesh patch - safe idempotent patch (SIP) execution
//!
//! Text-mutation operations that are safe to re-apply without duplicating
//! effects, confined to allow-listed subtrees of a base directory. This is
//! the only component of the mesh core that mutates files.

#![warn(unreachable_pub)]

pub mod apply;
pub mod error;
pub mod safety;
pub mod spec;

pub use apply::{PatchApplier, PatchResult, RunOutcome, RunSummary};
pub use error::PatchError;
pub use safety::{PathPolicy, DEFAULT_ALLOWED_ROOTS};
pub use spec::{PatchMode, PatchOp, PatchSpec};
