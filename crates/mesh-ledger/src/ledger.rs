//! Append-only success ledger
//!
//! Records the outcome of logical operations keyed by their idempotency key.
//! Entries are JSON-Lines, never mutated or deleted; once a success entry
//! exists for a key, that key is resolved and callers must skip re-execution.

use crate::digest::{ContentDigest, IdempotencyKey};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fs::{self, File, OpenOptions};
use std::io::{BufRead, BufReader, ErrorKind, Write};
use std::path::{Path, PathBuf};

/// Namespace salt mixed into every idempotency key
pub const KEY_NAMESPACE: &str = "mesh.sip";

/// Outcome vocabulary for ledger entries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LedgerStatus {
    /// Operation completed; the key is resolved
    Success,
    /// Operation failed; the key may be retried
    Failure,
}

/// Result block of a ledger entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerResult {
    /// Outcome status
    pub status: LedgerStatus,
    /// Additional result payload, carried verbatim
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl LedgerResult {
    /// A bare success result
    #[inline]
    #[must_use]
    pub fn success() -> Self {
        Self {
            status: LedgerStatus::Success,
            extra: Map::new(),
        }
    }

    /// A bare failure result
    #[inline]
    #[must_use]
    pub fn failure() -> Self {
        Self {
            status: LedgerStatus::Failure,
            extra: Map::new(),
        }
    }

    /// Attach an extra payload field
    #[inline]
    #[must_use]
    pub fn with_extra(mut self, field: impl Into<String>, value: Value) -> Self {
        self.extra.insert(field.into(), value);
        self
    }
}

/// One append-only ledger record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerEntry {
    /// Key identifying the logical operation
    pub idempotency_key: IdempotencyKey,
    /// UTC timestamp, second precision, `Z` suffix
    pub ts: String,
    /// Digest of the operation's input content
    pub content_hash: ContentDigest,
    /// Recorded outcome
    pub result: LedgerResult,
}

impl LedgerEntry {
    /// Create an entry stamped with the current UTC clock
    #[must_use]
    pub fn new(key: IdempotencyKey, content_hash: ContentDigest, result: LedgerResult) -> Self {
        Self::new_at(key, content_hash, result, Utc::now())
    }

    /// Create an entry with an explicit timestamp (deterministic)
    #[must_use]
    pub fn new_at(
        key: IdempotencyKey,
        content_hash: ContentDigest,
        result: LedgerResult,
        ts: DateTime<Utc>,
    ) -> Self {
        Self {
            idempotency_key: key,
            ts: ts.format("%Y-%m-%dT%H:%M:%SZ").to_string(),
            content_hash,
            result,
        }
    }
}

/// Errors raised by ledger operations
#[derive(Debug, thiserror::Error)]
pub enum LedgerError {
    /// Filesystem failure
    #[error("io error on {path}: {source}")]
    Io {
        /// Path the failure occurred on
        path: PathBuf,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },

    /// Entry could not be encoded
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl LedgerError {
    fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

/// The append-only JSON-Lines ledger file
#[derive(Debug, Clone)]
pub struct Ledger {
    path: PathBuf,
}

impl Ledger {
    /// Open a ledger at an explicit path (the file need not exist yet)
    #[inline]
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// The ledger file path
    #[inline]
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Derive the idempotency key for a file's current content
    ///
    /// Resolves symlinks to a canonical absolute path, digests the exact
    /// bytes, then digests
    /// `canonical_path + "\n" + hex_digest + "\n" + "<namespace>:v1"`.
    ///
    /// # Errors
    /// Returns [`LedgerError::Io`] when the path cannot be canonicalized or
    /// read.
    pub fn compute_key(
        input_path: impl AsRef<Path>,
    ) -> Result<(IdempotencyKey, ContentDigest), LedgerError> {
        let input_path = input_path.as_ref();
        let canonical = fs::canonicalize(input_path)
            .map_err(|e| LedgerError::io(input_path, e))?;
        let content = fs::read(&canonical).map_err(|e| LedgerError::io(&canonical, e))?;
        let content_hash = ContentDigest::compute(&content);

        let material = format!(
            "{}\n{}\n{KEY_NAMESPACE}:v1",
            canonical.display(),
            content_hash.to_hex()
        );
        let key = IdempotencyKey::new(ContentDigest::compute(material.as_bytes()));
        Ok((key, content_hash))
    }

    /// First success entry recorded for `key`, by file order (oldest first)
    ///
    /// Streams the ledger line by line, skipping unparsable lines. A missing
    /// ledger file is not an error: there is simply nothing recorded yet.
    ///
    /// # Errors
    /// Returns [`LedgerError::Io`] only for read failures other than the
    /// file being absent.
    pub fn find_success(&self, key: &IdempotencyKey) -> Result<Option<LedgerEntry>, LedgerError> {
        let file = match File::open(&self.path) {
            Ok(file) => file,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(LedgerError::io(&self.path, e)),
        };

        let reader = BufReader::new(file);
        for line in reader.lines() {
            let line = line.map_err(|e| LedgerError::io(&self.path, e))?;
            let Ok(entry) = serde_json::from_str::<LedgerEntry>(&line) else {
                tracing::debug!(path = %self.path.display(), "skipping unparsable ledger line");
                continue;
            };
            if &entry.idempotency_key == key && entry.result.status == LedgerStatus::Success {
                return Ok(Some(entry));
            }
        }
        Ok(None)
    }

    /// Append one entry and force it to durable storage
    ///
    /// Creates the parent directory on demand, writes a single
    /// newline-terminated JSON record, then flushes and `sync_all`s so a
    /// crash immediately after return never loses the record.
    ///
    /// # Errors
    /// Returns [`LedgerError::Io`] on any filesystem failure and
    /// [`LedgerError::Serialization`] when the entry cannot be encoded.
    pub fn append_entry(&self, entry: &LedgerEntry) -> Result<(), LedgerError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(|e| LedgerError::io(parent, e))?;
        }

        let line = serde_json::to_string(entry)?;
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(|e| LedgerError::io(&self.path, e))?;
        writeln!(file, "{line}").map_err(|e| LedgerError::io(&self.path, e))?;
        file.flush().map_err(|e| LedgerError::io(&self.path, e))?;
        file.sync_all().map_err(|e| LedgerError::io(&self.path, e))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::io::Write as _;

    fn write_file(dir: &Path, name: &str, content: &[u8]) -> PathBuf {
        let path = dir.join(name);
        fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn compute_key_is_deterministic_across_calls() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(dir.path(), "input.txt", b"payload");
        let (k1, h1) = Ledger::compute_key(&path).unwrap();
        let (k2, h2) = Ledger::compute_key(&path).unwrap();
        assert_eq!(k1, k2);
        assert_eq!(h1, h2);
    }

    #[test]
    fn compute_key_changes_with_content() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(dir.path(), "input.txt", b"payload");
        let (before, _) = Ledger::compute_key(&path).unwrap();
        fs::write(&path, b"payload!").unwrap();
        let (after, _) = Ledger::compute_key(&path).unwrap();
        assert_ne!(before, after);
    }

    #[test]
    fn compute_key_differs_by_path() {
        let dir = tempfile::tempdir().unwrap();
        let a = write_file(dir.path(), "a.txt", b"same");
        let b = write_file(dir.path(), "b.txt", b"same");
        let (ka, _) = Ledger::compute_key(&a).unwrap();
        let (kb, _) = Ledger::compute_key(&b).unwrap();
        assert_ne!(ka, kb);
    }

    #[cfg(unix)]
    #[test]
    fn compute_key_resolves_symlinks() {
        let dir = tempfile::tempdir().unwrap();
        let target = write_file(dir.path(), "real.txt", b"via link");
        let link = dir.path().join("link.txt");
        std::os::unix::fs::symlink(&target, &link).unwrap();
        let (direct, _) = Ledger::compute_key(&target).unwrap();
        let (via_link, _) = Ledger::compute_key(&link).unwrap();
        assert_eq!(direct, via_link);
    }

    #[test]
    fn compute_key_missing_file_is_io_error() {
        let result = Ledger::compute_key("/nonexistent/input.txt");
        assert!(matches!(result, Err(LedgerError::Io { .. })));
    }

    #[test]
    fn find_success_on_missing_ledger_is_none() {
        let dir = tempfile::tempdir().unwrap();
        let ledger = Ledger::new(dir.path().join("absent.jsonl"));
        let key = IdempotencyKey::new(ContentDigest::compute(b"k"));
        assert_eq!(ledger.find_success(&key).unwrap(), None);
    }

    #[test]
    fn append_then_find_success() {
        let dir = tempfile::tempdir().unwrap();
        let ledger = Ledger::new(dir.path().join("nested/ledger.jsonl"));
        let key = IdempotencyKey::new(ContentDigest::compute(b"op-1"));
        let entry = LedgerEntry::new(key, ContentDigest::compute(b"content"), LedgerResult::success());
        ledger.append_entry(&entry).unwrap();

        let found = ledger.find_success(&key).unwrap().unwrap();
        assert_eq!(found, entry);
    }

    #[test]
    fn failure_entries_do_not_resolve_a_key() {
        let dir = tempfile::tempdir().unwrap();
        let ledger = Ledger::new(dir.path().join("ledger.jsonl"));
        let key = IdempotencyKey::new(ContentDigest::compute(b"op-2"));
        let entry =
            LedgerEntry::new(key, ContentDigest::compute(b"content"), LedgerResult::failure());
        ledger.append_entry(&entry).unwrap();
        assert_eq!(ledger.find_success(&key).unwrap(), None);
    }

    #[test]
    fn first_success_by_file_order_wins() {
        let dir = tempfile::tempdir().unwrap();
        let ledger = Ledger::new(dir.path().join("ledger.jsonl"));
        let key = IdempotencyKey::new(ContentDigest::compute(b"op-3"));
        let first = LedgerEntry::new(
            key,
            ContentDigest::compute(b"content"),
            LedgerResult::success().with_extra("run", serde_json::json!(1)),
        );
        let second = LedgerEntry::new(
            key,
            ContentDigest::compute(b"content"),
            LedgerResult::success().with_extra("run", serde_json::json!(2)),
        );
        ledger.append_entry(&first).unwrap();
        ledger.append_entry(&second).unwrap();

        let found = ledger.find_success(&key).unwrap().unwrap();
        assert_eq!(found.result.extra["run"], serde_json::json!(1));
    }

    #[test]
    fn malformed_lines_are_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ledger.jsonl");
        let ledger = Ledger::new(&path);
        let key = IdempotencyKey::new(ContentDigest::compute(b"op-4"));

        {
            let mut file = File::create(&path).unwrap();
            writeln!(file, "not json at all").unwrap();
            writeln!(file, "{{\"half\": ").unwrap();
        }
        let entry = LedgerEntry::new(key, ContentDigest::compute(b"content"), LedgerResult::success());
        ledger.append_entry(&entry).unwrap();

        let found = ledger.find_success(&key).unwrap();
        assert_eq!(found, Some(entry));
    }

    #[test]
    fn entry_timestamp_is_second_precision_utc() {
        let key = IdempotencyKey::new(ContentDigest::compute(b"ts"));
        let ts = chrono::TimeZone::with_ymd_and_hms(&Utc, 2025, 1, 2, 3, 4, 5).unwrap();
        let entry = LedgerEntry::new_at(key, ContentDigest::compute(b"c"), LedgerResult::success(), ts);
        assert_eq!(entry.ts, "2025-01-02T03:04:05Z");
    }

    #[test]
    fn extra_result_fields_round_trip_flattened() {
        let key = IdempotencyKey::new(ContentDigest::compute(b"extra"));
        let entry = LedgerEntry::new(
            key,
            ContentDigest::compute(b"c"),
            LedgerResult::success().with_extra("summary", serde_json::json!({"changed": 2})),
        );
        let json = serde_json::to_value(&entry).unwrap();
        assert_eq!(json["result"]["status"], "success");
        assert_eq!(json["result"]["summary"]["changed"], 2);
        let back: LedgerEntry = serde_json::from_value(json).unwrap();
        assert_eq!(back, entry);
    }
}
