//! Conditional transition edges.

use crate::types::{EdgeId, EdgeKind, ServiceId};

/// A directed transition between two nodes of a workflow.
///
/// `Success`/`Failure` edges are traversed only when the source's outcome
/// matches; `Prerequisite` edges impose ordering alone. The display label is
/// derived from the kind rather than stored.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Edge {
    pub id: EdgeId,
    pub kind: EdgeKind,
    pub source: ServiceId,
    pub destination: ServiceId,
}

impl Edge {
    #[must_use]
    pub fn label(&self) -> &'static str {
        self.kind.label()
    }
}
