//! Work-order assembly
//!
//! Turns a routed request into the normalized [`WorkOrder`] record handed to
//! external execution engines. Pure: no I/O, defaults applied exactly once
//! here.

use crate::intent::{Engine, IntentRouter, RoutePayload};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Work-order priority vocabulary
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Low,
    #[default]
    Normal,
    High,
}

/// Inbound request a work order is assembled from
///
/// All fields are optional on the wire; defaults land here, not in the
/// consumers.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WorkOrderRequest {
    /// Caller-supplied id; generated deterministically when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// Free-form instructions for the executing engine
    #[serde(default)]
    pub instructions: String,
    /// Files the work is expected to touch
    #[serde(default)]
    pub target_files: Vec<String>,
    /// Arbitrary execution context
    #[serde(default)]
    pub context: Map<String, Value>,
    /// Declared impact zone(s); scalar or list
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub impact_zone: Option<Value>,
    /// Explicit lock flag
    #[serde(default)]
    pub locked_zone: bool,
    /// Requested priority
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<Priority>,
    /// Opaque metadata passed through to the work order
    #[serde(default)]
    pub meta: Map<String, Value>,
}

impl WorkOrderRequest {
    /// The routing view of this request
    #[must_use]
    pub fn route_payload(&self) -> RoutePayload {
        RoutePayload {
            locked_zone: self.locked_zone,
            impact_zone: self.impact_zone.clone(),
        }
    }
}

/// Input block of a work order
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkOrderInput {
    /// Instructions for the executing engine
    pub instructions: String,
    /// Files the work is expected to touch
    pub target_files: Vec<String>,
    /// Arbitrary execution context
    pub context: Map<String, Value>,
    /// Primary impact zone, `"apps"` when the caller declared none
    pub impact_zone: String,
    /// Resolved lock state (flag or protected impact zone)
    pub locked_zone: bool,
}

/// Normalized record describing one unit of work and its assigned engine
///
/// Immutable once created: there are no mutators, and consumers treat the
/// record as a value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkOrder {
    /// Unique id, `<engine>_<UTC timestamp>` when not caller-supplied
    pub id: String,
    /// Engine assigned by the intent router
    pub engine: Engine,
    /// The intent the order was built from
    pub task_type: String,
    /// Execution priority
    pub priority: Priority,
    /// Input block
    pub input: WorkOrderInput,
    /// Opaque metadata
    pub meta: Map<String, Value>,
}

/// Fallback impact zone when the caller declares none
pub const DEFAULT_IMPACT_ZONE: &str = "apps";

/// Assembles work orders from routed requests
#[derive(Debug, Clone)]
pub struct WorkOrderBuilder {
    router: IntentRouter,
}

impl WorkOrderBuilder {
    /// Create a builder over an intent router
    #[inline]
    #[must_use]
    pub fn new(router: IntentRouter) -> Self {
        Self { router }
    }

    /// Build a work order, stamping ids with the current UTC clock
    #[must_use]
    pub fn build(&self, intent: &str, request: WorkOrderRequest) -> WorkOrder {
        self.build_at(intent, request, Utc::now())
    }

    /// Build a work order with an explicit timestamp (deterministic)
    #[must_use]
    pub fn build_at(
        &self,
        intent: &str,
        request: WorkOrderRequest,
        now: DateTime<Utc>,
    ) -> WorkOrder {
        let payload = request.route_payload();
        let engine = self.router.route_engine(intent, &payload);
        let locked = self.router.is_locked_zone(&payload);

        let impact_zone = payload
            .impact_zones()
            .into_iter()
            .next()
            .unwrap_or_else(|| DEFAULT_IMPACT_ZONE.to_string());

        let id = request.id.unwrap_or_else(|| {
            format!("{}_{}", engine.as_str(), now.format("%Y%m%dT%H%M%SZ"))
        });

        WorkOrder {
            id,
            engine,
            task_type: intent.to_string(),
            priority: request.priority.unwrap_or_default(),
            input: WorkOrderInput {
                instructions: request.instructions,
                target_files: request.target_files,
                context: request.context,
                impact_zone,
                locked_zone: locked,
            },
            meta: request.meta,
        }
    }
}
