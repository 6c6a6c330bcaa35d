//! Lane/agent route decisions
//!
//! Decides how much autonomy an operation receives based on who asked
//! (source), where it lands (zone), and what it does (op). Background
//! automation is never trusted with a permissive lane, and unknown sources
//! fall through to manual handling.

use crate::zone::{Zone, ZoneClassifier};
use serde::{Deserialize, Serialize};

/// Execution track governing autonomy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Lane {
    /// Auto-execute without confirmation
    Fast,
    /// Restricted execution under the fail-safe engine
    Strict,
    /// Requires explicit human override before execution
    Warn,
    /// Source not recognized; route to manual handling
    Unknown,
}

impl Lane {
    /// Stable uppercase label
    #[inline]
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Lane::Fast => "FAST",
            Lane::Strict => "STRICT",
            Lane::Warn => "WARN",
            Lane::Unknown => "UNKNOWN",
        }
    }
}

/// Agent assigned to execute a routed operation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RouteAgent {
    /// Fail-safe engine
    Clc,
    /// Fail-safe engine, pending explicit human override
    ClcOrOverride,
    /// Permissive interactive agent
    GmxCodex,
    /// No automated agent; a human must act
    Manual,
}

impl RouteAgent {
    /// Stable identifier used in audit records
    #[inline]
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            RouteAgent::Clc => "CLC",
            RouteAgent::ClcOrOverride => "CLC_OR_OVERRIDE",
            RouteAgent::GmxCodex => "GMX_CODEX",
            RouteAgent::Manual => "MANUAL",
        }
    }
}

/// Filesystem operation class carried by a routing request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Op {
    Read,
    Write,
    Delete,
}

impl Op {
    /// Whether the operation mutates its target
    #[inline]
    #[must_use]
    pub const fn is_mutating(self) -> bool {
        matches!(self, Op::Write | Op::Delete)
    }
}

/// Origin of a routing request
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Source {
    /// A human at a chat or CLI front end
    Interactive,
    /// Unattended automation (watchers, schedulers)
    Background,
    /// Anything else; never granted an automated lane
    #[serde(untagged)]
    Other(String),
}

impl Source {
    /// Parse a raw source string; unrecognized values become [`Source::Other`]
    #[must_use]
    pub fn parse(raw: &str) -> Self {
        match raw {
            "interactive" => Source::Interactive,
            "background" => Source::Background,
            other => Source::Other(other.to_string()),
        }
    }
}

/// Result of routing one request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouteDecision {
    /// Execution track
    pub lane: Lane,
    /// Assigned agent
    pub agent: RouteAgent,
    /// Short human-readable explanation naming the rule that fired
    pub reason: String,
    /// Zone of the target path
    pub zone: Zone,
}

/// Decide the lane and agent for `(source, zone, op)`
///
/// Background automation always lands on the strict lane irrespective of
/// zone. Interactive mutations of a locked zone require an explicit human
/// override; everything else interactive rides the fast lane. Unrecognized
/// sources are routed to manual handling.
#[must_use]
pub fn decide_route(source: &Source, zone: Zone, op: Op) -> RouteDecision {
    match source {
        Source::Background => RouteDecision {
            lane: Lane::Strict,
            agent: RouteAgent::Clc,
            reason: "background automation is always strict".to_string(),
            zone,
        },
        Source::Interactive => {
            if zone == Zone::Locked && op.is_mutating() {
                RouteDecision {
                    lane: Lane::Warn,
                    agent: RouteAgent::ClcOrOverride,
                    reason: "locked zone mutation requires explicit override".to_string(),
                    zone,
                }
            } else {
                RouteDecision {
                    lane: Lane::Fast,
                    agent: RouteAgent::GmxCodex,
                    reason: "interactive request in permitted zone".to_string(),
                    zone,
                }
            }
        }
        Source::Other(raw) => RouteDecision {
            lane: Lane::Unknown,
            agent: RouteAgent::Manual,
            reason: format!("unrecognized source '{raw}'"),
            zone,
        },
    }
}

/// Classify a relative path and route it in one step
#[must_use]
pub fn decide_route_for_path(
    classifier: &ZoneClassifier,
    source: &Source,
    rel_path: &str,
    op: Op,
) -> RouteDecision {
    decide_route(source, classifier.classify(rel_path), op)
}
