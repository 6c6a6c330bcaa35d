//! Mesh ledger - idempotency for the automation mesh
//!
//! Derives content-addressed idempotency keys and records operation
//! outcomes in an append-only JSON-Lines ledger. Once a success entry exists
//! for a key, callers skip re-execution and may replay the recorded result.

#![warn(unreachable_pub)]

pub mod digest;
pub mod discover;
pub mod ledger;

pub use digest::{ContentDigest, DigestParseError, IdempotencyKey};
pub use discover::{default_ledger_path, discover_repo_root, LEDGER_RELATIVE_PATH};
pub use ledger::{
    Ledger, LedgerEntry, LedgerError, LedgerResult, LedgerStatus, KEY_NAMESPACE,
};
