mod common;

use common::*;
use flowsync::model::{EdgeError, Workflow, propose_edge};
use flowsync::types::{EdgeKind, ServiceId};

fn sample_workflow() -> Workflow {
    Workflow::from_definition(sample_definition()).unwrap()
}

#[test]
fn valid_proposal_carries_its_parts() {
    let workflow = sample_workflow();
    let proposal = propose_edge(&workflow, NODE_A, NODE_B, EdgeKind::Prerequisite).unwrap();
    assert_eq!(proposal.source, NODE_A);
    assert_eq!(proposal.destination, NODE_B);
    assert_eq!(proposal.kind, EdgeKind::Prerequisite);
}

#[test]
fn nothing_may_target_the_entry_sentinel() {
    let workflow = sample_workflow();
    let err = propose_edge(&workflow, NODE_A, START, EdgeKind::Success).unwrap_err();
    assert!(matches!(err, EdgeError::TargetsStart));
}

#[test]
fn nothing_may_originate_from_the_exit_sentinel() {
    let workflow = sample_workflow();
    let err = propose_edge(&workflow, END, NODE_A, EdgeKind::Success).unwrap_err();
    assert!(matches!(err, EdgeError::SourcesEnd));
}

#[test]
fn self_loops_are_rejected() {
    let workflow = sample_workflow();
    let err = propose_edge(&workflow, NODE_A, NODE_A, EdgeKind::Success).unwrap_err();
    assert!(matches!(err, EdgeError::SelfLoop { id } if id == NODE_A));
}

#[test]
fn labels_cannot_participate_in_edges() {
    let workflow = sample_workflow();
    // The label's canvas id used as either endpoint.
    let as_node = ServiceId(LABEL.0);
    let err = propose_edge(&workflow, as_node, NODE_A, EdgeKind::Success).unwrap_err();
    assert!(matches!(err, EdgeError::LabelEndpoint { .. }));
    let err = propose_edge(&workflow, NODE_A, as_node, EdgeKind::Failure).unwrap_err();
    assert!(matches!(err, EdgeError::LabelEndpoint { .. }));
}

#[test]
fn unknown_endpoints_are_rejected() {
    let workflow = sample_workflow();
    let err = propose_edge(&workflow, ServiceId(999), NODE_A, EdgeKind::Success).unwrap_err();
    assert!(matches!(err, EdgeError::EndpointNotFound { id } if id == ServiceId(999)));
}

#[test]
fn prerequisite_edges_are_ordinary_for_validation() {
    let workflow = sample_workflow();
    // Ordering-only edges obey the same sentinel rules.
    let err = propose_edge(&workflow, NODE_A, START, EdgeKind::Prerequisite).unwrap_err();
    assert!(matches!(err, EdgeError::TargetsStart));
}
