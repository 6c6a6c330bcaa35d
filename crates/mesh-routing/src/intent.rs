//! Intent → engine routing
//!
//! Maps an inbound intent and its payload to the execution engine allowed to
//! act on it. The bias is always toward the restrictive engine: only
//! explicitly whitelisted heavy intents escape it, and a locked-zone payload
//! never does.

use crate::zone::ZoneClassifier;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Execution engine assigned to an intent
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Engine {
    /// Restrictive, fail-safe default engine
    Clc,
    /// High-throughput engine for whitelisted heavy intents
    Gemini,
}

impl Engine {
    /// Stable uppercase identifier used in work orders and audit records
    #[inline]
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Engine::Clc => "CLC",
            Engine::Gemini => "GEMINI",
        }
    }
}

impl std::fmt::Display for Engine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Intents whitelisted onto the heavy engine when no lock applies
pub const DEFAULT_HEAVY_INTENTS: &[&str] = &[
    "bulk_test_generation",
    "bulk_doc_generation",
    "repo_wide_refactor",
    "large_context_summary",
];

/// Routing payload attached to an inbound request
///
/// Defaults are applied once, at the deserialization boundary. The
/// `impact_zone` field is deliberately loose on the wire (a scalar zone name
/// or a list of them); [`RoutePayload::impact_zones`] normalizes it.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RoutePayload {
    /// Explicit lock flag set by the caller
    #[serde(default)]
    pub locked_zone: bool,
    /// Declared impact zone(s): a string, a list, or absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub impact_zone: Option<Value>,
}

impl RoutePayload {
    /// Payload with no lock flag and no impact declaration
    #[inline]
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// Payload declaring a single impact zone
    #[inline]
    #[must_use]
    pub fn with_impact_zone(zone: impl Into<String>) -> Self {
        Self {
            locked_zone: false,
            impact_zone: Some(Value::String(zone.into())),
        }
    }

    /// Payload with the explicit lock flag set
    #[inline]
    #[must_use]
    pub fn locked() -> Self {
        Self {
            locked_zone: true,
            impact_zone: None,
        }
    }

    /// Normalized impact-zone strings
    ///
    /// Accepts a scalar string or a list; non-string and empty entries are
    /// dropped. Absent declarations normalize to an empty list.
    #[must_use]
    pub fn impact_zones(&self) -> Vec<String> {
        match &self.impact_zone {
            None | Some(Value::Null) => Vec::new(),
            Some(Value::String(s)) => normalize_one(s).into_iter().collect(),
            Some(Value::Array(items)) => items
                .iter()
                .filter_map(|item| match item {
                    Value::String(s) => normalize_one(s),
                    _ => None,
                })
                .collect(),
            Some(_) => Vec::new(),
        }
    }
}

fn normalize_one(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

/// Routes intents to engines under locked-zone and whitelist policy
#[derive(Debug, Clone)]
pub struct IntentRouter {
    classifier: ZoneClassifier,
    heavy_intents: Vec<String>,
}

impl IntentRouter {
    /// Create a router over a zone classifier with an explicit heavy-intent set
    #[inline]
    #[must_use]
    pub fn new(classifier: ZoneClassifier, heavy_intents: Vec<String>) -> Self {
        Self {
            classifier,
            heavy_intents,
        }
    }

    /// Create a router with [`DEFAULT_HEAVY_INTENTS`]
    #[inline]
    #[must_use]
    pub fn with_default_intents(classifier: ZoneClassifier) -> Self {
        Self::new(
            classifier,
            DEFAULT_HEAVY_INTENTS.iter().map(|i| (*i).to_string()).collect(),
        )
    }

    /// The zone classifier backing lock detection
    #[inline]
    #[must_use]
    pub fn classifier(&self) -> &ZoneClassifier {
        &self.classifier
    }

    /// Whether a payload touches a locked zone
    ///
    /// True when the explicit `locked_zone` flag is set, or when any
    /// normalized impact-zone string names a protected zone
    /// (case-insensitive).
    #[must_use]
    pub fn is_locked_zone(&self, payload: &RoutePayload) -> bool {
        if payload.locked_zone {
            return true;
        }
        payload
            .impact_zones()
            .iter()
            .any(|zone| self.classifier.is_protected_name(zone))
    }

    /// Choose the engine for an intent
    ///
    /// Locked payloads route to [`Engine::Clc`] regardless of intent. An
    /// empty intent is ambiguous input and also fails safe to `Clc`. Only
    /// intents in the heavy whitelist reach [`Engine::Gemini`].
    #[must_use]
    pub fn route_engine(&self, intent: &str, payload: &RoutePayload) -> Engine {
        if self.is_locked_zone(payload) {
            return Engine::Clc;
        }
        let intent = intent.trim();
        if intent.is_empty() {
            return Engine::Clc;
        }
        if self.heavy_intents.iter().any(|heavy| heavy == intent) {
            Engine::Gemini
        } else {
            Engine::Clc
        }
    }
}
