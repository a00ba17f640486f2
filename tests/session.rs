mod common;

use std::sync::Arc;
use std::time::Duration;

use common::*;
use rustc_hash::FxHashMap;

use flowsync::model::EdgeProposal;
use flowsync::path::WorkflowPath;
use flowsync::runs::{PathState, Poller, PollerConfig};
use flowsync::session::{Command, PollEvent, SessionError, SyncOutcome, WorkflowSession};
use flowsync::transport::{ErrorEnvelope, InMemoryTransport, Transport, TransportError};
use flowsync::types::{
    EdgeKind, Position, RunStatus, RuntimeSelector, ServiceId, StatusColor, WorkflowId,
};

async fn loaded_session() -> (Arc<InMemoryTransport>, WorkflowPath, WorkflowSession) {
    let (transport, path) = seeded_transport();
    let mut session = WorkflowSession::new(transport.clone(), path.clone());
    session
        .switch_to(path.clone(), RuntimeSelector::Latest)
        .await
        .unwrap();
    (transport, path, session)
}

#[tokio::test]
async fn first_fetch_reloads_then_polls_incrementally() {
    let (transport, path) = seeded_transport();
    let mut session = WorkflowSession::new(transport, path.clone());
    let outcome = session
        .switch_to(path, RuntimeSelector::Latest)
        .await
        .unwrap();
    assert_eq!(outcome, SyncOutcome::FullReload);
    let workflow = session.workflow().unwrap();
    assert_eq!(workflow.id, WorkflowId(100));
    // The synthetic self-loop stayed an attribute, not an edge.
    assert_eq!(workflow.edges().count(), 3);

    let outcome = session.poll_once().await.unwrap();
    assert_eq!(outcome, SyncOutcome::Incremental);
}

#[tokio::test]
async fn own_mutations_keep_polling_incremental() {
    let (_transport, _path, mut session) = loaded_session().await;
    session
        .apply(Command::DeleteEdge { edge: EDGE_START_A })
        .await
        .unwrap();
    // The adopted update_time matches the server's token, so the next poll
    // must not trigger a structural reload.
    assert_eq!(session.poll_once().await.unwrap(), SyncOutcome::Incremental);
    assert!(session.workflow().unwrap().edge(EDGE_START_A).is_none());
}

#[tokio::test]
async fn foreign_structural_changes_force_a_full_reload() {
    let (transport, _path, mut session) = loaded_session().await;
    // A concurrent editor adds an edge behind this session's back.
    transport
        .add_edge(
            WorkflowId(100),
            &EdgeProposal {
                kind: EdgeKind::Prerequisite,
                source: NODE_B,
                destination: END,
            },
        )
        .await
        .unwrap();
    assert_eq!(session.poll_once().await.unwrap(), SyncOutcome::FullReload);
    assert_eq!(session.workflow().unwrap().edges().count(), 4);
}

#[tokio::test]
async fn rejected_mutations_roll_back_and_notify() {
    let (transport, _path, mut session) = loaded_session().await;
    let events = session.subscribe();
    while events.try_recv().is_ok() {}

    transport.fail_next(ErrorEnvelope::Forbidden {
        message: "workflow is locked".to_string(),
    });
    let err = session
        .apply(Command::DeleteEdge { edge: EDGE_START_A })
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        SessionError::Transport(TransportError::Forbidden { .. })
    ));
    // Optimistic edit rolled back wholesale.
    assert!(session.workflow().unwrap().edge(EDGE_START_A).is_some());
    assert!(matches!(
        events.try_recv(),
        Ok(PollEvent::Notification { .. })
    ));
}

#[tokio::test]
async fn invalid_edges_never_reach_the_server() {
    let (_transport, _path, mut session) = loaded_session().await;
    let err = session
        .apply(Command::AddEdge {
            source: NODE_A,
            destination: START,
            kind: EdgeKind::Success,
        })
        .await
        .unwrap_err();
    assert!(matches!(err, SessionError::Edge(_)));
    // Nothing was created server-side: the next poll stays incremental
    // and the edge count is unchanged.
    assert_eq!(session.poll_once().await.unwrap(), SyncOutcome::Incremental);
    assert_eq!(session.workflow().unwrap().edges().count(), 3);
}

#[tokio::test]
async fn confirmed_edges_carry_the_server_assigned_id() {
    let (_transport, _path, mut session) = loaded_session().await;
    session
        .apply(Command::AddEdge {
            source: NODE_B,
            destination: END,
            kind: EdgeKind::Success,
        })
        .await
        .unwrap();
    let workflow = session.workflow().unwrap();
    assert_eq!(workflow.edges().count(), 4);
    assert!(
        workflow
            .edges()
            .any(|e| e.source == NODE_B && e.destination == END && !e.id.is_synthetic())
    );
    assert_eq!(session.poll_once().await.unwrap(), SyncOutcome::Incremental);
}

#[tokio::test]
async fn skip_toggle_round_trips_with_the_server() {
    let (_transport, _path, mut session) = loaded_session().await;
    session
        .apply(Command::ToggleSkip {
            nodes: vec![NODE_A],
        })
        .await
        .unwrap();
    assert!(
        session
            .workflow()
            .unwrap()
            .service(NODE_A)
            .unwrap()
            .is_skipped_in("device_upgrade")
    );
    session
        .apply(Command::ToggleSkip {
            nodes: vec![NODE_A],
        })
        .await
        .unwrap();
    assert!(
        !session
            .workflow()
            .unwrap()
            .service(NODE_A)
            .unwrap()
            .is_skipped_in("device_upgrade")
    );
    assert_eq!(session.poll_once().await.unwrap(), SyncOutcome::Incremental);
}

#[tokio::test]
async fn skip_toggle_with_an_unknown_node_leaves_no_residue() {
    let (_transport, _path, mut session) = loaded_session().await;
    let err = session
        .apply(Command::ToggleSkip {
            nodes: vec![NODE_A, ServiceId(999)],
        })
        .await
        .unwrap_err();
    assert!(matches!(err, SessionError::Model(_)));
    // The valid node was toggled before the unknown one aborted the
    // command; that partial edit must not survive.
    assert!(
        !session
            .workflow()
            .unwrap()
            .service(NODE_A)
            .unwrap()
            .is_skipped_in("device_upgrade")
    );
    // Nothing reached the server either.
    assert_eq!(session.poll_once().await.unwrap(), SyncOutcome::Incremental);
}

#[tokio::test]
async fn position_save_with_an_unknown_node_leaves_no_residue() {
    let (_transport, _path, mut session) = loaded_session().await;
    let mut positions = FxHashMap::default();
    positions.insert(NODE_A, Position(120.0, 60.0));
    positions.insert(ServiceId(999), Position(5.0, 5.0));
    let err = session
        .apply(Command::SavePositions { positions })
        .await
        .unwrap_err();
    assert!(matches!(err, SessionError::Model(_)));
    assert_eq!(
        session
            .workflow()
            .unwrap()
            .service(NODE_A)
            .unwrap()
            .position_in("device_upgrade"),
        None
    );
    assert_eq!(session.poll_once().await.unwrap(), SyncOutcome::Incremental);
}

#[tokio::test]
async fn saved_positions_survive_reconciliation() {
    let (_transport, _path, mut session) = loaded_session().await;
    let mut positions = FxHashMap::default();
    positions.insert(NODE_A, Position(120.0, 60.0));
    session
        .apply(Command::SavePositions { positions })
        .await
        .unwrap();
    assert_eq!(session.poll_once().await.unwrap(), SyncOutcome::Incremental);
    assert_eq!(
        session
            .workflow()
            .unwrap()
            .service(NODE_A)
            .unwrap()
            .position_in("device_upgrade"),
        Some(Position(120.0, 60.0))
    );
}

#[tokio::test]
async fn running_then_stopping_is_advisory() {
    let (_transport, _path, mut session) = loaded_session().await;
    let started = session.run(None).await.unwrap();
    assert!(matches!(session.selector(), RuntimeSelector::Id(_)));

    session.poll_once().await.unwrap();
    let config = PollerConfig {
        active_interval: Duration::from_millis(10),
        idle_interval: Duration::from_millis(500),
        inactivity_timeout: Duration::from_secs(60),
    };
    assert_eq!(session.poll_interval(&config), config.active_interval);

    let ack = session.stop_run(&started.runtime).await.unwrap();
    assert!(ack.accepted);
    assert!(ack.message.contains("after the current unit of work"));

    // A second stop finds nothing running.
    let ack = session.stop_run(&started.runtime).await.unwrap();
    assert!(!ack.accepted);

    // Polling carried on and observed the terminal status.
    let events = session.subscribe();
    while events.try_recv().is_ok() {}
    session.poll_once().await.unwrap();
    assert_eq!(
        session.selected_run().unwrap().status,
        RunStatus::Stopped
    );
    let mut saw_run_ended = false;
    while let Ok(event) = events.try_recv() {
        if matches!(event, PollEvent::RunEnded { .. }) {
            saw_run_ended = true;
        }
    }
    assert!(saw_run_ended);
    assert_eq!(session.poll_interval(&config), config.idle_interval);
}

#[tokio::test]
async fn end_to_end_success_scenario() {
    let (transport, path, mut session) = loaded_session().await;
    transport.push_run(running_run("rt-1"));
    let runtime = flowsync::types::RuntimeId::from("rt-1");

    let mut node_state = device_counts(3, 3, 0, 0);
    node_state.success = Some(true);
    node_state.status = RunStatus::Completed;
    transport.set_run_state(&runtime, path.child(NODE_A), node_state);

    let mut workflow_state = PathState::default();
    workflow_state.edges.insert(EDGE_A_END_SUCCESS, 3);
    transport.set_run_state(&runtime, path.clone(), workflow_state);
    transport.finish_run(&runtime, RunStatus::Completed, Some(true));

    session
        .switch_to(path, RuntimeSelector::Id(runtime))
        .await
        .unwrap();

    let status = session.view().nodes.get(&NODE_A).unwrap();
    assert_eq!(status.color, StatusColor::Green);
    assert_eq!(status.label, "3/3 (3 passed)");
    assert_eq!(
        session.view().edges.get(&EDGE_A_END_SUCCESS),
        Some(&"3 DEVICES".to_string())
    );
    // The failure branch was never traversed.
    assert!(!session.view().edges.contains_key(&EDGE_A_END_FAILURE));
    assert_eq!(
        session.display_name(NODE_A),
        Some("validate_config".to_string())
    );
}

#[tokio::test]
async fn sentinel_deletion_is_stopped_before_submission() {
    let (_transport, _path, mut session) = loaded_session().await;
    let err = session
        .apply(Command::DeleteNode { node: START })
        .await
        .unwrap_err();
    assert!(matches!(err, SessionError::Model(_)));
    assert!(session.workflow().unwrap().contains_node(START));
}

#[tokio::test]
async fn editing_before_the_first_fetch_is_rejected() {
    let (transport, path) = seeded_transport();
    let mut session = WorkflowSession::new(transport, path);
    let err = session
        .apply(Command::DeleteEdge { edge: EDGE_START_A })
        .await
        .unwrap_err();
    assert!(matches!(err, SessionError::NotLoaded));
}

#[tokio::test]
async fn unknown_paths_surface_domain_errors() {
    let (transport, _path) = seeded_transport();
    let mut session = WorkflowSession::new(transport, path("555"));
    let err = session.poll_once().await.unwrap_err();
    assert!(matches!(
        err,
        SessionError::Transport(TransportError::Domain { .. })
    ));
}

#[tokio::test]
async fn poller_ticks_and_stops_deterministically() {
    let (transport, path) = seeded_transport();
    transport.push_run(running_run("rt-1"));
    let mut session = WorkflowSession::new(transport, path.clone());
    session
        .switch_to(path, RuntimeSelector::Id("rt-1".into()))
        .await
        .unwrap();
    let events = session.subscribe();
    while events.try_recv().is_ok() {}

    let session = Arc::new(tokio::sync::Mutex::new(session));
    let handle = Poller::spawn(
        session,
        PollerConfig {
            active_interval: Duration::from_millis(10),
            idle_interval: Duration::from_millis(10),
            inactivity_timeout: Duration::from_secs(60),
        },
    );

    // At least one tick produces a recolor event.
    let event = tokio::time::timeout(Duration::from_secs(2), events.recv_async())
        .await
        .expect("poller should tick")
        .unwrap();
    assert!(matches!(
        event,
        PollEvent::Recolored { .. } | PollEvent::FullReload { .. }
    ));

    handle.stop();
    tokio::time::sleep(Duration::from_millis(100)).await;
    assert!(handle.is_finished());
}

#[tokio::test]
async fn poller_parks_while_the_user_is_inactive() {
    let (transport, path) = seeded_transport();
    transport.push_run(running_run("rt-1"));
    let mut session = WorkflowSession::new(transport, path.clone());
    session
        .switch_to(path, RuntimeSelector::Id("rt-1".into()))
        .await
        .unwrap();
    let events = session.subscribe();
    let session = Arc::new(tokio::sync::Mutex::new(session));
    let handle = Poller::spawn(
        session.clone(),
        PollerConfig {
            active_interval: Duration::from_millis(10),
            idle_interval: Duration::from_millis(10),
            inactivity_timeout: Duration::from_millis(50),
        },
    );

    // Let the inactivity window lapse, then confirm the loop went quiet.
    tokio::time::sleep(Duration::from_millis(200)).await;
    while events.try_recv().is_ok() {}
    tokio::time::sleep(Duration::from_millis(150)).await;
    assert!(events.try_recv().is_err());

    // The next interaction wakes it for an immediate poll.
    session.lock().await.touch();
    let event = tokio::time::timeout(Duration::from_secs(2), events.recv_async()).await;
    assert!(event.is_ok());

    handle.shutdown().await;
}
