//! Aggregation of per-target execution outcomes into a node summary.
//!
//! [`derive_node_status`] reduces a path's [`PathState`] to the color and
//! count label a renderer paints the node with. The function is pure and
//! deterministic: identical input always yields the identical summary,
//! which keeps it trivially table-testable.
//!
//! # Examples
//!
//! ```rust
//! use flowsync::progress::{ProgressCounts, TargetClass, derive_node_status};
//! use flowsync::runs::PathState;
//! use flowsync::types::StatusColor;
//!
//! let mut state = PathState::default();
//! state.progress.insert(
//!     TargetClass::Device,
//!     ProgressCounts { total: 4, success: 4, failure: 0, skipped: 0 },
//! );
//! let status = derive_node_status(&state);
//! assert_eq!(status.color, StatusColor::Green);
//! assert_eq!(status.label, "4/4 (4 passed)");
//! ```

use serde::{Deserialize, Serialize};

use crate::runs::PathState;
use crate::types::StatusColor;

/// The class of execution target a progress bucket counts.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TargetClass {
    #[serde(rename = "device")]
    Device,
    #[serde(rename = "iteration_device")]
    IterationDevice,
}

/// Per-target outcome counters for one path.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgressCounts {
    #[serde(default)]
    pub total: u64,
    #[serde(default)]
    pub success: u64,
    #[serde(default)]
    pub failure: u64,
    #[serde(default)]
    pub skipped: u64,
}

impl ProgressCounts {
    /// Targets with a reported outcome so far.
    #[must_use]
    pub fn done(&self) -> u64 {
        self.success + self.failure + self.skipped
    }
}

/// Visual summary of a node's execution state.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NodeStatus {
    pub color: StatusColor,
    pub label: String,
}

/// Reduce a path's state to the node's visual summary.
///
/// Without progress counters the color follows the path's overall outcome
/// (`success` true/false/unknown → green/red/blue) and the label is empty.
/// With counters, a fully-skipped node is gray, an under-total node is
/// still-running blue, any failure is red, full success is green, and a
/// complete but mixed outcome is cyan. Zero-valued categories are omitted
/// from the label's parenthetical but still counted in the total.
#[must_use]
pub fn derive_node_status(state: &PathState) -> NodeStatus {
    let counts = [TargetClass::Device, TargetClass::IterationDevice]
        .iter()
        .find_map(|class| state.progress.get(class).filter(|c| c.total > 0));

    let Some(counts) = counts else {
        let color = match state.success {
            Some(true) => StatusColor::Green,
            Some(false) => StatusColor::Red,
            None => StatusColor::Blue,
        };
        return NodeStatus {
            color,
            label: String::new(),
        };
    };

    let color = if counts.skipped == counts.total {
        StatusColor::Gray
    } else if counts.done() < counts.total {
        StatusColor::Blue
    } else if counts.failure > 0 {
        StatusColor::Red
    } else if counts.success == counts.total || state.success == Some(true) {
        StatusColor::Green
    } else {
        StatusColor::Cyan
    };

    NodeStatus {
        color,
        label: format_counts(counts),
    }
}

fn format_counts(counts: &ProgressCounts) -> String {
    let mut parts = Vec::new();
    if counts.success > 0 {
        parts.push(format!("{} passed", counts.success));
    }
    if counts.failure > 0 {
        parts.push(format!("{} failed", counts.failure));
    }
    if counts.skipped > 0 {
        parts.push(format!("{} skipped", counts.skipped));
    }
    let head = format!("{}/{}", counts.done(), counts.total);
    if parts.is_empty() {
        head
    } else {
        format!("{head} ({})", parts.join(", "))
    }
}
