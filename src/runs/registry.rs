//! Per-runtime execution records.

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::path::WorkflowPath;
use crate::placeholder::PlaceholderBinding;
use crate::progress::{ProgressCounts, TargetClass};
use crate::types::{EdgeId, RunStatus, RuntimeId};

/// Authoritative execution state of one path within one runtime.
///
/// Distinct paths sharing a trailing node id but differing in ancestry are
/// distinct entries: the same sub-workflow definition invoked from two call
/// sites has independent state at each site.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct PathState {
    #[serde(default)]
    pub status: RunStatus,
    #[serde(default)]
    pub success: Option<bool>,
    /// Outcome counters keyed by target class.
    #[serde(default)]
    pub progress: FxHashMap<TargetClass, ProgressCounts>,
    /// Concrete node filling a placeholder slot at this path, if any.
    #[serde(default)]
    pub placeholder: Option<PlaceholderBinding>,
    /// Per-edge traversal counts (number of devices that took the edge).
    #[serde(default)]
    pub edges: FxHashMap<EdgeId, u64>,
}

/// One execution ("runtime") of a workflow.
///
/// Appended to by the engine while live, immutable once its status is
/// terminal, retained for later inspection until purged.
#[derive(Clone, Debug, PartialEq)]
pub struct Run {
    pub runtime_id: RuntimeId,
    pub status: RunStatus,
    pub creator: Option<String>,
    /// `None` while running or indeterminate.
    pub success: Option<bool>,
    pub state: FxHashMap<WorkflowPath, PathState>,
}

/// Registry of the distinct runtimes seen for the current workflow.
///
/// Multiple independent runs may be in flight concurrently; the registry
/// retains them all even though only one is rendered at a time.
#[derive(Clone, Debug, Default)]
pub struct RunRegistry {
    runs: FxHashMap<RuntimeId, Run>,
    order: Vec<RuntimeId>,
    choices: Vec<(RuntimeId, String)>,
}

impl RunRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or refresh a run's snapshot.
    ///
    /// Returns the run's previous status, if it was already known. A
    /// terminal run changing shape indicates a server bug; it is logged and
    /// the newer snapshot kept, since the server stays authoritative.
    pub fn upsert(&mut self, run: Run) -> Option<RunStatus> {
        let id = run.runtime_id.clone();
        let previous = self.runs.insert(id.clone(), run);
        let previous_status = previous.as_ref().map(|r| r.status.clone());
        if let Some(prev) = &previous_status {
            if prev.is_terminal() {
                debug!(runtime = %id, "terminal run re-reported");
            }
        } else {
            self.order.push(id);
        }
        previous_status
    }

    #[must_use]
    pub fn get(&self, id: &RuntimeId) -> Option<&Run> {
        self.runs.get(id)
    }

    /// The most recently created runtime.
    #[must_use]
    pub fn latest(&self) -> Option<&Run> {
        self.order.last().and_then(|id| self.runs.get(id))
    }

    pub fn iter(&self) -> impl Iterator<Item = &Run> {
        self.order.iter().filter_map(|id| self.runs.get(id))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.order.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Drop a retained run (explicit purge).
    pub fn purge(&mut self, id: &RuntimeId) -> Option<Run> {
        self.order.retain(|known| known != id);
        self.runs.remove(id)
    }

    /// Remember the server's `(runtime id, display label)` choices.
    pub fn set_choices(&mut self, choices: Vec<(RuntimeId, String)>) {
        self.choices = choices;
    }

    #[must_use]
    pub fn choices(&self) -> &[(RuntimeId, String)] {
        &self.choices
    }
}
