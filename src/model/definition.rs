//! Serde DTOs for server-provided workflow definitions.
//!
//! These mirror the JSON the server ships; [`Workflow::from_definition`]
//! (in `workflow.rs`) turns them into the richer local model, folding the
//! synthetic iteration self-loops into node attributes along the way.
//!
//! [`Workflow::from_definition`]: crate::model::Workflow::from_definition

use chrono::{DateTime, Utc};
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use super::label::Alignment;
use crate::types::{EdgeId, EdgeKind, LabelId, Position, ServiceId, ServiceKind, WorkflowId};

/// Wire form of a service node.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ServiceDefinition {
    pub id: ServiceId,
    #[serde(rename = "type")]
    pub kind: ServiceKind,
    pub scoped_name: String,
    #[serde(default)]
    pub shared: bool,
    /// Per-parent-workflow skip flags, keyed by workflow name.
    #[serde(default)]
    pub skip: FxHashMap<String, bool>,
    /// Per-parent-workflow canvas positions, keyed by workflow name.
    #[serde(default)]
    pub positions: FxHashMap<String, Position>,
    #[serde(default)]
    pub iteration_values: Vec<serde_json::Value>,
    #[serde(default)]
    pub iteration_devices: Vec<String>,
    #[serde(default)]
    pub iteration_variable_name: Option<String>,
}

/// Wire form of an edge.
///
/// A definition whose id is negative and whose endpoints coincide is the
/// server's iteration annotation for that node, not a real transition.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct EdgeDefinition {
    pub id: EdgeId,
    pub subtype: EdgeKind,
    pub source_id: ServiceId,
    pub destination_id: ServiceId,
}

/// Wire form of a canvas label.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct LabelDefinition {
    pub id: LabelId,
    pub content: String,
    #[serde(default)]
    pub alignment: Alignment,
    pub positions: Position,
}

/// Wire form of a complete workflow definition.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct WorkflowDefinition {
    pub id: WorkflowId,
    pub name: String,
    pub scoped_name: String,
    #[serde(default)]
    pub superworkflow: Option<WorkflowId>,
    pub last_modified: DateTime<Utc>,
    #[serde(default)]
    pub services: Vec<ServiceDefinition>,
    #[serde(default)]
    pub edges: Vec<EdgeDefinition>,
    #[serde(default)]
    pub labels: Vec<LabelDefinition>,
}
