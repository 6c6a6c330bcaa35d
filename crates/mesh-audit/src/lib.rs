//! Mesh audit - append-only structured event trail
//!
//! Immutable JSON-Lines audit records with a fixed schema version and
//! closed vocabularies, shared by every component of the mesh core.

#![warn(unreachable_pub)]

pub mod event;

pub use event::{
    AuditCategory, AuditError, AuditEvent, AuditLogger, AuditSeverity, AuditStatus,
    AUDIT_SCHEMA_VERSION,
};
