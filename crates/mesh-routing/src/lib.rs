//! Mesh routing - policy core for the automation mesh
//!
//! Decides which execution engine and lane may act on a given intent and
//! target path:
//! - Zone classification (OPEN / LOCKED / EXTERNAL) against a protected-zone
//!   list
//! - Intent → engine routing with a fail-safe restrictive bias
//! - Lane/agent decisions per source, zone, and operation
//! - Dev-lane selection from ordered configuration rules
//! - Work-order assembly

#![warn(unreachable_pub)]

pub mod intent;
pub mod lane;
pub mod route;
pub mod work_order;
pub mod zone;

pub use intent::{Engine, IntentRouter, RoutePayload, DEFAULT_HEAVY_INTENTS};
pub use lane::{
    normalize_lane_alias, Complexity, CostSensitivity, LaneConfig, LaneRule, LaneRuleWhen,
    LaneSelector,
};
pub use route::{decide_route, decide_route_for_path, Lane, Op, RouteAgent, RouteDecision, Source};
pub use work_order::{
    Priority, WorkOrder, WorkOrderBuilder, WorkOrderInput, WorkOrderRequest, DEFAULT_IMPACT_ZONE,
};
pub use zone::{Zone, ZoneClassifier, DEFAULT_PROTECTED_ZONES};
