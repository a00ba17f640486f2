//! Service nodes and their iteration specification.

use rustc_hash::{FxHashMap, FxHashSet};
use serde::{Deserialize, Serialize};

use crate::types::{Position, ServiceId, ServiceKind};

/// Scoped name the generic placeholder slot of a superworkflow carries.
pub(crate) const PLACEHOLDER_NAME: &str = "Placeholder";

/// Loop specification attached to a node.
///
/// At run time the node executes once per element of `values` and/or once
/// per device in `devices`, with the current element bound to `variable`.
/// The server surfaces this as a degenerate self-loop edge with a synthetic
/// negative id; locally it is an attribute of the node, carrying no
/// traversal semantics.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct IterationSpec {
    #[serde(default)]
    pub values: Vec<serde_json::Value>,
    #[serde(default)]
    pub devices: Vec<String>,
    #[serde(default)]
    pub variable: String,
}

impl IterationSpec {
    /// Whether any loop dimension is configured.
    #[must_use]
    pub fn is_configured(&self) -> bool {
        !self.values.is_empty() || !self.devices.is_empty()
    }

    /// Short annotation text a renderer can attach to the node.
    #[must_use]
    pub fn summary(&self) -> String {
        let mut parts = Vec::new();
        if !self.values.is_empty() {
            parts.push(format!("{} values", self.values.len()));
        }
        if !self.devices.is_empty() {
            parts.push(format!("{} devices", self.devices.len()));
        }
        if parts.is_empty() {
            return "no iteration".to_string();
        }
        let over = parts.join(", ");
        if self.variable.is_empty() {
            over
        } else {
            format!("{over} as {}", self.variable)
        }
    }
}

/// A node in a workflow graph: an atomic job, a nested sub-workflow, or one
/// of the `Start`/`End` sentinels.
///
/// The same underlying service object can appear, shared, inside multiple
/// parent workflows. Everything that depends on *which* parent is rendering
/// it is therefore keyed by parent workflow name: the canvas position and
/// the skip flag.
#[derive(Clone, Debug, PartialEq)]
pub struct Service {
    pub id: ServiceId,
    pub kind: ServiceKind,
    pub scoped_name: String,
    /// Reused across multiple parent workflows; affects visual emphasis only.
    pub shared: bool,
    /// Names of the parent workflows in which this service is skipped.
    pub skipped_in: FxHashSet<String>,
    /// Canvas position per parent workflow name.
    pub positions: FxHashMap<String, Position>,
    pub iteration: Option<IterationSpec>,
}

impl Service {
    #[must_use]
    pub fn is_sentinel(&self) -> bool {
        self.kind.is_sentinel()
    }

    /// Whether this node is the parametrized slot of a superworkflow.
    #[must_use]
    pub fn is_placeholder(&self) -> bool {
        self.scoped_name == PLACEHOLDER_NAME
    }

    /// Skip flag under the named parent workflow.
    #[must_use]
    pub fn is_skipped_in(&self, workflow_name: &str) -> bool {
        self.skipped_in.contains(workflow_name)
    }

    /// Canvas position under the named parent workflow, if one was saved.
    #[must_use]
    pub fn position_in(&self, workflow_name: &str) -> Option<Position> {
        self.positions.get(workflow_name).copied()
    }
}
