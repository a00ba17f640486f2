//! Incremental reconciliation of poll snapshots into renderable view state.

use rustc_hash::FxHashMap;
use tracing::trace;

use super::registry::PathState;
use crate::model::Workflow;
use crate::path::WorkflowPath;
use crate::progress::{NodeStatus, derive_node_status};
use crate::types::{EdgeId, ServiceId};

/// The colors and labels a renderer paints the displayed workflow with.
///
/// Purely derived data: applying the same snapshot twice yields the same
/// view, and a full reload simply starts from an empty one.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ViewState {
    /// Visual summary per node of the displayed workflow.
    pub nodes: FxHashMap<ServiceId, NodeStatus>,
    /// Traversal label per edge of the displayed workflow.
    pub edges: FxHashMap<EdgeId, String>,
}

impl ViewState {
    pub fn clear(&mut self) {
        self.nodes.clear();
        self.edges.clear();
    }
}

/// Fold an authoritative state snapshot into the view.
///
/// Entries whose trailing node id is a sentinel or absent from the
/// displayed workflow are stale or foreign and are skipped, not errors.
/// Edge labels are taken only from the entry addressing the displayed path
/// exactly, and only for edges the workflow still knows.
pub fn apply_path_states(
    view: &mut ViewState,
    workflow: &Workflow,
    displayed: &WorkflowPath,
    state: &FxHashMap<WorkflowPath, PathState>,
) {
    for (sub_path, path_state) in state {
        if sub_path == displayed {
            for (edge_id, count) in &path_state.edges {
                if workflow.edge(*edge_id).is_some() {
                    view.edges.insert(*edge_id, format_edge_label(*count));
                }
            }
        }
        let tip = sub_path.tip();
        let Some(service) = workflow.service(tip) else {
            trace!(path = %sub_path, "skipping foreign state entry");
            continue;
        };
        if service.is_sentinel() {
            continue;
        }
        view.nodes.insert(tip, derive_node_status(path_state));
    }
}

/// Label for an edge traversed by `count` devices.
#[must_use]
pub fn format_edge_label(count: u64) -> String {
    if count == 1 {
        "1 DEVICE".to_string()
    } else {
        format!("{count} DEVICES")
    }
}
