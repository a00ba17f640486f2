#![allow(dead_code)]

//! Shared fixtures for integration tests.

use std::sync::Arc;

use chrono::{TimeZone, Utc};
use rustc_hash::FxHashMap;

use flowsync::model::{
    EdgeDefinition, LabelDefinition, ServiceDefinition, WorkflowDefinition,
};
use flowsync::path::WorkflowPath;
use flowsync::progress::{ProgressCounts, TargetClass};
use flowsync::runs::PathState;
use flowsync::transport::{InMemoryTransport, RunSummary, ServerRun};
use flowsync::types::{
    EdgeId, EdgeKind, LabelId, Position, RunStatus, RuntimeId, ServiceId, ServiceKind, WorkflowId,
};

pub const WORKFLOW_NODE: ServiceId = ServiceId(100);
pub const START: ServiceId = ServiceId(1);
pub const END: ServiceId = ServiceId(2);
pub const NODE_A: ServiceId = ServiceId(3);
pub const NODE_B: ServiceId = ServiceId(4);
pub const LABEL: LabelId = LabelId(50);
pub const EDGE_START_A: EdgeId = EdgeId(10);
pub const EDGE_A_END_SUCCESS: EdgeId = EdgeId(11);
pub const EDGE_A_END_FAILURE: EdgeId = EdgeId(12);

pub fn service_def(id: ServiceId, kind: ServiceKind, scoped_name: &str) -> ServiceDefinition {
    ServiceDefinition {
        id,
        kind,
        scoped_name: scoped_name.to_string(),
        shared: false,
        skip: FxHashMap::default(),
        positions: FxHashMap::default(),
        iteration_values: Vec::new(),
        iteration_devices: Vec::new(),
        iteration_variable_name: None,
    }
}

pub fn edge_def(
    id: EdgeId,
    subtype: EdgeKind,
    source: ServiceId,
    destination: ServiceId,
) -> EdgeDefinition {
    EdgeDefinition {
        id,
        subtype,
        source_id: source,
        destination_id: destination,
    }
}

/// `Start -> A (success)`, `A -> End (success)`, `A -> End (failure)`, one
/// label, and a synthetic iteration self-loop on `A`.
pub fn sample_definition() -> WorkflowDefinition {
    let mut node_a = service_def(NODE_A, ServiceKind::Custom("netmiko_command".into()), "validate_config");
    node_a.iteration_devices = vec!["edge-router-1".into(), "edge-router-2".into()];
    node_a.iteration_variable_name = Some("device".into());
    WorkflowDefinition {
        id: WorkflowId(100),
        name: "device_upgrade".to_string(),
        scoped_name: "device_upgrade".to_string(),
        superworkflow: None,
        last_modified: Utc.with_ymd_and_hms(2026, 8, 1, 12, 0, 0).unwrap(),
        services: vec![
            service_def(START, ServiceKind::Start, "Start"),
            service_def(END, ServiceKind::End, "End"),
            node_a,
            service_def(NODE_B, ServiceKind::Workflow, "backup"),
        ],
        edges: vec![
            edge_def(EDGE_START_A, EdgeKind::Success, START, NODE_A),
            edge_def(EDGE_A_END_SUCCESS, EdgeKind::Success, NODE_A, END),
            edge_def(EDGE_A_END_FAILURE, EdgeKind::Failure, NODE_A, END),
            // The server's iteration annotation for A.
            edge_def(EdgeId(-3), EdgeKind::Success, NODE_A, NODE_A),
        ],
        labels: vec![LabelDefinition {
            id: LABEL,
            content: "maintenance window only".to_string(),
            alignment: Default::default(),
            positions: Position(40.0, 80.0),
        }],
    }
}

/// A superworkflow template whose slot is the node `21`.
pub fn superworkflow_definition() -> WorkflowDefinition {
    WorkflowDefinition {
        id: WorkflowId(200),
        name: "generic_rollout".to_string(),
        scoped_name: "generic_rollout".to_string(),
        superworkflow: None,
        last_modified: Utc.with_ymd_and_hms(2026, 8, 1, 12, 0, 0).unwrap(),
        services: vec![
            service_def(ServiceId(23), ServiceKind::Start, "Start"),
            service_def(ServiceId(24), ServiceKind::End, "End"),
            service_def(ServiceId(21), ServiceKind::Workflow, "Placeholder"),
        ],
        edges: vec![
            edge_def(EdgeId(30), EdgeKind::Success, ServiceId(23), ServiceId(21)),
            edge_def(EdgeId(31), EdgeKind::Success, ServiceId(21), ServiceId(24)),
        ],
        labels: Vec::new(),
    }
}

pub fn root_path() -> WorkflowPath {
    WorkflowPath::root(WORKFLOW_NODE)
}

pub fn path(s: &str) -> WorkflowPath {
    s.parse().expect("fixture path is well-formed")
}

/// Transport pre-seeded with the sample workflow bound at the root path.
pub fn seeded_transport() -> (Arc<InMemoryTransport>, WorkflowPath) {
    let transport = InMemoryTransport::new();
    transport.seed_workflow(sample_definition());
    transport.bind_path(root_path(), WorkflowId(100));
    (Arc::new(transport), root_path())
}

pub fn device_counts(total: u64, success: u64, failure: u64, skipped: u64) -> PathState {
    let mut state = PathState::default();
    state.progress.insert(
        TargetClass::Device,
        ProgressCounts {
            total,
            success,
            failure,
            skipped,
        },
    );
    state
}

pub fn running_run(runtime: &str) -> ServerRun {
    ServerRun {
        summary: RunSummary {
            runtime_id: RuntimeId::from(runtime),
            status: RunStatus::Running,
            creator: Some("admin".to_string()),
            success: None,
        },
        state: FxHashMap::default(),
    }
}
