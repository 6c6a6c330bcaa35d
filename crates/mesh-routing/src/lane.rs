//! Dev-lane selection
//!
//! Maps `(source, complexity, cost sensitivity)` to a dev-lane id using an
//! ordered rule list from configuration, with built-in fallback heuristics.
//! Configuration problems never take lane selection down: a missing or
//! malformed config file falls back to the built-in default set.

use serde::{Deserialize, Serialize};
use std::path::Path;

/// Canonical lane id the `dev_gmx` alias resolves to
pub const LANE_GMX_CLI: &str = "dev_gmxcli";

/// Logical lane id promoted work is assigned before alias normalization
pub const LANE_GMX: &str = "dev_gmx";

/// Lane id for the codex track
pub const LANE_CODEX: &str = "dev_codex";

/// Default lane when nothing more specific applies
pub const LANE_DEFAULT: &str = "dev_oss";

/// Task complexity declared by the caller
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Complexity {
    Simple,
    Moderate,
    Complex,
}

impl Complexity {
    /// Whether this complexity qualifies for lane promotion
    #[inline]
    #[must_use]
    pub const fn is_promotable(self) -> bool {
        matches!(self, Complexity::Moderate | Complexity::Complex)
    }
}

/// Cost sensitivity declared by the caller
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CostSensitivity {
    Low,
    Normal,
    High,
}

/// Match condition of one lane rule
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LaneRuleWhen {
    /// Source the rule applies to
    pub source: String,
}

/// One ordered routing rule: first match wins
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LaneRule {
    /// Match condition
    pub when: LaneRuleWhen,
    /// Lane id assigned when the rule fires (alias-normalized on return)
    pub lane: String,
}

/// Lane-selection configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LaneConfig {
    /// Lane used when no rule and no built-in heuristic applies
    #[serde(default = "default_lane")]
    pub default_lane: String,
    /// Ordered rule list, evaluated top to bottom
    #[serde(default)]
    pub rules: Vec<LaneRule>,
}

fn default_lane() -> String {
    LANE_DEFAULT.to_string()
}

impl Default for LaneConfig {
    fn default() -> Self {
        Self {
            default_lane: default_lane(),
            rules: Vec::new(),
        }
    }
}

impl LaneConfig {
    /// First rule whose `when.source` equals `source`, in list order
    ///
    /// The linear scan is the contract: list order is the tie-break order.
    #[must_use]
    pub fn first_match(&self, source: &str) -> Option<&LaneRule> {
        self.rules.iter().find(|rule| rule.when.source == source)
    }
}

/// Selects dev lanes from configuration plus built-in heuristics
#[derive(Debug, Clone, Default)]
pub struct LaneSelector {
    config: LaneConfig,
}

impl LaneSelector {
    /// Create a selector over an explicit configuration
    #[inline]
    #[must_use]
    pub fn new(config: LaneConfig) -> Self {
        Self { config }
    }

    /// Load configuration from a YAML file
    ///
    /// A missing or unparseable file is logged and replaced with the
    /// built-in defaults; this constructor never fails.
    #[must_use]
    pub fn from_yaml_file(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        let config = match std::fs::read_to_string(path) {
            Ok(raw) => match serde_yaml::from_str::<LaneConfig>(&raw) {
                Ok(config) => config,
                Err(err) => {
                    tracing::warn!(path = %path.display(), %err, "lane config unparseable, using defaults");
                    LaneConfig::default()
                }
            },
            Err(err) => {
                tracing::warn!(path = %path.display(), %err, "lane config unreadable, using defaults");
                LaneConfig::default()
            }
        };
        Self::new(config)
    }

    /// The active configuration
    #[inline]
    #[must_use]
    pub fn config(&self) -> &LaneConfig {
        &self.config
    }

    /// Choose the dev lane for `(source, complexity, cost_sensitivity)`
    ///
    /// Rule order: explicit config rule (first match wins), then the
    /// complexity/cost promotion, then the built-in source defaults, then
    /// the configured default lane. The returned id is alias-normalized.
    #[must_use]
    pub fn choose_dev_lane(
        &self,
        source: &str,
        complexity: Complexity,
        cost_sensitivity: CostSensitivity,
    ) -> String {
        if let Some(rule) = self.config.first_match(source) {
            return normalize_lane_alias(&rule.lane);
        }

        // No explicit rule fired; heavier work escapes the cheap lanes
        // unless the caller is cost-sensitive.
        if complexity.is_promotable() && cost_sensitivity != CostSensitivity::Low {
            return normalize_lane_alias(LANE_GMX);
        }

        let lane = match source {
            "liam" => LANE_GMX,
            "cls" => LANE_CODEX,
            _ => self.config.default_lane.as_str(),
        };
        normalize_lane_alias(lane)
    }
}

/// Map the logical `dev_gmx` alias to its canonical lane id
///
/// All other ids pass through unchanged.
#[must_use]
pub fn normalize_lane_alias(lane: &str) -> String {
    if lane == LANE_GMX {
        LANE_GMX_CLI.to_string()
    } else {
        lane.to_string()
    }
}
