//! Pre-submission validation of edge creation.
//!
//! Edge creation is validated entirely client-side before any request is
//! sent; a rejected proposal never reaches the server. A valid
//! [`EdgeProposal`] is then submitted through the transport, and the
//! server-confirmed [`Edge`](super::Edge) (id assigned server-side) is
//! inserted with [`Workflow::confirm_edge`](super::Workflow::confirm_edge).

use miette::Diagnostic;
use thiserror::Error;

use super::workflow::Workflow;
use crate::types::{EdgeKind, LabelId, ServiceId};

/// Invalid edge creation attempts, each rejected before submission.
#[derive(Debug, Error, Diagnostic)]
pub enum EdgeError {
    /// Nothing may target the entry sentinel.
    #[error("an edge cannot target the Start sentinel")]
    #[diagnostic(code(flowsync::edge::targets_start))]
    TargetsStart,

    /// Nothing may originate from the exit sentinel.
    #[error("an edge cannot originate from the End sentinel")]
    #[diagnostic(code(flowsync::edge::sources_end))]
    SourcesEnd,

    /// Self-loops carry no traversal semantics; iteration is a node
    /// attribute, not an edge.
    #[error("an edge cannot loop from node {id} to itself")]
    #[diagnostic(
        code(flowsync::edge::self_loop),
        help("Configure iteration on the node instead of drawing a loop.")
    )]
    SelfLoop { id: ServiceId },

    /// Labels are cosmetic and cannot participate in edges.
    #[error("label {id} cannot be an edge endpoint")]
    #[diagnostic(code(flowsync::edge::label_endpoint))]
    LabelEndpoint { id: LabelId },

    /// The endpoint names neither a node nor a label of this workflow.
    #[error("edge endpoint {id} does not exist in this workflow")]
    #[diagnostic(code(flowsync::edge::endpoint_not_found))]
    EndpointNotFound { id: ServiceId },
}

/// A validated edge creation request, ready for submission.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EdgeProposal {
    pub kind: EdgeKind,
    pub source: ServiceId,
    pub destination: ServiceId,
}

/// Validate an edge creation attempt against the workflow's invariants.
///
/// Rejections, in order of detection: label endpoints, unknown endpoints,
/// edges targeting `Start`, edges leaving `End`, and self-loops.
pub fn propose_edge(
    workflow: &Workflow,
    source: ServiceId,
    destination: ServiceId,
    kind: EdgeKind,
) -> Result<EdgeProposal, EdgeError> {
    for id in [source, destination] {
        if workflow.label(LabelId(id.0)).is_some() {
            return Err(EdgeError::LabelEndpoint { id: LabelId(id.0) });
        }
        if !workflow.contains_node(id) {
            return Err(EdgeError::EndpointNotFound { id });
        }
    }
    let from = workflow
        .service(source)
        .expect("checked above");
    let to = workflow
        .service(destination)
        .expect("checked above");
    if to.kind.is_start() {
        return Err(EdgeError::TargetsStart);
    }
    if from.kind.is_end() {
        return Err(EdgeError::SourcesEnd);
    }
    if source == destination {
        return Err(EdgeError::SelfLoop { id: source });
    }
    Ok(EdgeProposal {
        kind,
        source,
        destination,
    })
}
