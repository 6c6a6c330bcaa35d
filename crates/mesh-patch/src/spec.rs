//! Patch spec documents
//!
//! A patch spec is a YAML or JSON document with a top-level `ops` list.
//! Unknown modes and missing fields are rejected at the deserialization
//! boundary, before any file is touched.

use crate::error::PatchError;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Text-mutation mode of one patch op
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PatchMode {
    /// Append content unless it is already a substring of the file
    Append,
    /// Replace the first occurrence of the anchor with the content
    ReplaceBlock,
    /// Splice the content immediately before the first anchor occurrence
    InsertBefore,
    /// Splice the content immediately after the first anchor occurrence
    InsertAfter,
}

impl PatchMode {
    /// Stable snake_case label used in run summaries
    #[inline]
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            PatchMode::Append => "append",
            PatchMode::ReplaceBlock => "replace_block",
            PatchMode::InsertBefore => "insert_before",
            PatchMode::InsertAfter => "insert_after",
        }
    }

    /// Whether this mode requires an anchor (`match`) to locate its edit
    #[inline]
    #[must_use]
    pub const fn requires_anchor(self) -> bool {
        !matches!(self, PatchMode::Append)
    }
}

/// One patch operation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PatchOp {
    /// Target path, relative to the patch base directory
    pub path: String,
    /// Mutation mode
    pub mode: PatchMode,
    /// Content to insert, append, or substitute
    pub content: String,
    /// Anchor text locating the edit (required for all modes but `append`)
    #[serde(rename = "match", default, skip_serializing_if = "Option::is_none")]
    pub anchor: Option<String>,
}

/// A validated list of patch operations
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PatchSpec {
    /// Operations, applied in list order
    pub ops: Vec<PatchOp>,
}

impl PatchSpec {
    /// Parse a spec from YAML (JSON is a YAML subset and parses too)
    ///
    /// # Errors
    /// Returns [`PatchError::Validation`] for syntax errors, unknown modes,
    /// missing fields, or an empty/absent `ops` list.
    pub fn from_yaml_str(raw: &str) -> Result<Self, PatchError> {
        let spec: PatchSpec = serde_yaml::from_str(raw)
            .map_err(|e| PatchError::Validation(e.to_string()))?;
        spec.validate()?;
        Ok(spec)
    }

    /// Read and parse a spec file
    ///
    /// # Errors
    /// Returns [`PatchError::Io`] when the file cannot be read and
    /// [`PatchError::Validation`] when it does not parse.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, PatchError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|e| PatchError::io(path, e))?;
        Self::from_yaml_str(&raw)
    }

    /// Reject specs with no operations
    ///
    /// # Errors
    /// Returns [`PatchError::Validation`] when `ops` is empty.
    pub fn validate(&self) -> Result<(), PatchError> {
        if self.ops.is_empty() {
            return Err(PatchError::Validation("ops list is empty".to_string()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn parses_yaml_spec() {
        let spec = PatchSpec::from_yaml_str(
            "ops:\n  - path: g/tools/sample.txt\n    mode: append\n    content: hello\n",
        )
        .unwrap();
        assert_eq!(spec.ops.len(), 1);
        assert_eq!(spec.ops[0].mode, PatchMode::Append);
        assert_eq!(spec.ops[0].anchor, None);
    }

    #[test]
    fn parses_json_spec() {
        let spec = PatchSpec::from_yaml_str(
            r#"{"ops": [{"path": "docs/a.md", "mode": "replace_block", "content": "new", "match": "old"}]}"#,
        )
        .unwrap();
        assert_eq!(spec.ops[0].mode, PatchMode::ReplaceBlock);
        assert_eq!(spec.ops[0].anchor.as_deref(), Some("old"));
    }

    #[test]
    fn unknown_mode_is_a_validation_error() {
        let result = PatchSpec::from_yaml_str(
            "ops:\n  - path: g/x\n    mode: delete_file\n    content: ''\n",
        );
        assert!(matches!(result, Err(PatchError::Validation(_))));
    }

    #[test]
    fn missing_ops_key_is_a_validation_error() {
        let result = PatchSpec::from_yaml_str("operations: []\n");
        assert!(matches!(result, Err(PatchError::Validation(_))));
    }

    #[test]
    fn empty_ops_list_is_a_validation_error() {
        let result = PatchSpec::from_yaml_str("ops: []\n");
        assert!(matches!(result, Err(PatchError::Validation(_))));
    }

    #[test]
    fn non_list_ops_is_a_validation_error() {
        let result = PatchSpec::from_yaml_str("ops: not-a-list\n");
        assert!(matches!(result, Err(PatchError::Validation(_))));
    }

    #[test]
    fn anchor_requirement_by_mode() {
        assert!(!PatchMode::Append.requires_anchor());
        assert!(PatchMode::ReplaceBlock.requires_anchor());
        assert!(PatchMode::InsertBefore.requires_anchor());
        assert!(PatchMode::InsertAfter.requires_anchor());
    }
}
