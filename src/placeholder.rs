//! Per-path resolution of superworkflow placeholder slots.
//!
//! A superworkflow is a reusable template containing exactly one generic
//! placeholder node. When the template is entered as a sub-workflow from a
//! parent path, the run's state for that path carries a
//! [`PlaceholderBinding`] naming the concrete node that fills the slot for
//! this invocation. The binding is per-path, not per-definition: two call
//! sites of the same template may bind different sub-workflows at the same
//! time.

use serde::{Deserialize, Serialize};

use crate::model::{Service, Workflow};
use crate::runs::PathState;
use crate::types::ServiceId;

/// The concrete node bound into a placeholder slot for one path.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlaceholderBinding {
    pub id: ServiceId,
    pub name: String,
}

impl Workflow {
    /// The placeholder slot of this workflow, if it is a superworkflow
    /// template.
    #[must_use]
    pub fn placeholder(&self) -> Option<&Service> {
        self.services().find(|s| s.is_placeholder())
    }

    /// Whether this workflow is a reusable template with a parametrized slot.
    #[must_use]
    pub fn is_template(&self) -> bool {
        self.placeholder().is_some()
    }
}

/// Display name for a node, resolving placeholder slots through the path's
/// state.
///
/// A placeholder node rendered standalone keeps its generic name; rendered
/// at a path whose state carries a binding, it takes the bound node's name.
/// Every other node displays its scoped name unchanged.
#[must_use]
pub fn resolve_display_name(service: &Service, state: Option<&PathState>) -> String {
    if service.is_placeholder() {
        if let Some(binding) = state.and_then(|s| s.placeholder.as_ref()) {
            return binding.name.clone();
        }
    }
    service.scoped_name.clone()
}
