//! The session object owning one displayed workflow and its live state.
//!
//! [`WorkflowSession`] replaces the ambient globals a workflow UI tends to
//! accumulate: it owns the graph model, the currently displayed path, the
//! runtime selector, the derived [`ViewState`], the run registry, and the
//! activity tracker the poller consults. Graph-editing operations arrive as
//! tagged [`Command`]s, are applied optimistically, submitted over the
//! transport, and rolled back wholesale if the server rejects them.
//!
//! State synchronization ([`poll_once`](WorkflowSession::poll_once))
//! fetches the authoritative snapshot for the current (path, runtime) pair
//! and either fully reloads the model (the definition's `last_modified`
//! fencing token moved) or incrementally recolors the view. Observers
//! subscribe to [`PollEvent`]s over a channel instead of the core knowing
//! anything about rendering.

use chrono::{DateTime, Utc};
use miette::Diagnostic;
use rustc_hash::FxHashMap;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, instrument};

use crate::model::{
    Edge, EdgeError, Label, ModelError, Workflow, propose_edge,
};
use crate::path::WorkflowPath;
use crate::placeholder::resolve_display_name;
use crate::runs::poller::{ActivityTracker, PollerConfig};
use crate::runs::reconcile::{ViewState, apply_path_states};
use crate::runs::registry::{Run, RunRegistry};
use crate::transport::{
    RunStarted, ServiceStateResponse, SkipAction, Transport, TransportError,
};
use crate::types::{
    EdgeId, EdgeKind, LabelId, Position, RunStatus, RuntimeId, RuntimeSelector, ServiceId,
    WorkflowId,
};

/// Errors surfaced by session operations.
#[derive(Debug, Error, Diagnostic)]
pub enum SessionError {
    #[error(transparent)]
    #[diagnostic(transparent)]
    Model(#[from] ModelError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Edge(#[from] EdgeError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Transport(#[from] TransportError),

    /// A graph-editing command arrived before the first successful fetch.
    #[error("no workflow is loaded yet")]
    #[diagnostic(
        code(flowsync::session::not_loaded),
        help("Call switch_to (or poll_once) before editing the graph.")
    )]
    NotLoaded,
}

/// Outcome of applying one poll response.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SyncOutcome {
    /// The definition changed structurally; the model was replaced wholesale.
    FullReload,
    /// Only run state moved; the view was recolored in place.
    Incremental,
    /// The response was superseded by navigation and dropped.
    Discarded,
}

/// Events published to rendering hosts.
#[derive(Clone, Debug, PartialEq)]
pub enum PollEvent {
    /// The graph model was replaced; re-render everything.
    FullReload { workflow: WorkflowId },
    /// Node colors/labels or edge labels changed for the displayed path.
    Recolored { path: WorkflowPath },
    /// The selected run reached a terminal status.
    RunEnded { runtime: RuntimeId, status: RunStatus },
    /// A message to show the user as a single notification.
    Notification { message: String },
}

/// Graph-editing operations, dispatched exhaustively by `match`.
#[derive(Clone, Debug)]
pub enum Command {
    AddEdge {
        source: ServiceId,
        destination: ServiceId,
        kind: EdgeKind,
    },
    DeleteEdge {
        edge: EdgeId,
    },
    DeleteNode {
        node: ServiceId,
    },
    /// Toggle the skip flag of the given nodes within the displayed workflow.
    ToggleSkip {
        nodes: Vec<ServiceId>,
    },
    SavePositions {
        positions: FxHashMap<ServiceId, Position>,
    },
}

/// Acknowledgement of an advisory stop request.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StopAck {
    /// `false` if the run was not running.
    pub accepted: bool,
    pub message: String,
}

/// One displayed workflow, its live run state, and the machinery to keep
/// both synchronized with the server.
pub struct WorkflowSession {
    transport: Arc<dyn Transport>,
    workflow: Option<Workflow>,
    view: ViewState,
    registry: RunRegistry,
    current_path: WorkflowPath,
    selector: RuntimeSelector,
    /// Last adopted fencing token per workflow id.
    tokens: FxHashMap<WorkflowId, DateTime<Utc>>,
    activity: ActivityTracker,
    events: flume::Sender<PollEvent>,
    events_rx: flume::Receiver<PollEvent>,
}

impl WorkflowSession {
    /// Create a session viewing `path`; nothing is fetched until the first
    /// poll.
    pub fn new(transport: Arc<dyn Transport>, path: WorkflowPath) -> Self {
        let (events, events_rx) = flume::unbounded();
        WorkflowSession {
            transport,
            workflow: None,
            view: ViewState::default(),
            registry: RunRegistry::new(),
            current_path: path,
            selector: RuntimeSelector::Normal,
            tokens: FxHashMap::default(),
            activity: ActivityTracker::new(),
            events,
            events_rx,
        }
    }

    /// Subscribe to the session's event stream.
    #[must_use]
    pub fn subscribe(&self) -> flume::Receiver<PollEvent> {
        self.events_rx.clone()
    }

    #[must_use]
    pub fn activity(&self) -> &ActivityTracker {
        &self.activity
    }

    /// Record a user interaction (delegates to the activity tracker).
    pub fn touch(&self) {
        self.activity.touch();
    }

    #[must_use]
    pub fn workflow(&self) -> Option<&Workflow> {
        self.workflow.as_ref()
    }

    #[must_use]
    pub fn view(&self) -> &ViewState {
        &self.view
    }

    #[must_use]
    pub fn registry(&self) -> &RunRegistry {
        &self.registry
    }

    #[must_use]
    pub fn current_path(&self) -> &WorkflowPath {
        &self.current_path
    }

    #[must_use]
    pub fn selector(&self) -> &RuntimeSelector {
        &self.selector
    }

    /// The run the current selector resolves to, if the registry knows it.
    #[must_use]
    pub fn selected_run(&self) -> Option<&Run> {
        match &self.selector {
            RuntimeSelector::Id(id) => self.registry.get(id),
            RuntimeSelector::Normal | RuntimeSelector::Latest => self.registry.latest(),
        }
    }

    /// Tick period the poller should use right now.
    #[must_use]
    pub fn poll_interval(&self, config: &PollerConfig) -> std::time::Duration {
        match self.selected_run() {
            Some(run) if run.status.is_running() => config.active_interval,
            _ => config.idle_interval,
        }
    }

    /// Display name of a node, resolving placeholder bindings through the
    /// selected run's state for the node's path.
    #[must_use]
    pub fn display_name(&self, node: ServiceId) -> Option<String> {
        let service = self.workflow.as_ref()?.service(node)?;
        let state = self
            .selected_run()
            .and_then(|run| run.state.get(&self.current_path.child(node)));
        Some(resolve_display_name(service, state))
    }

    /// Navigate to another path/runtime pair and synchronize immediately.
    #[instrument(skip(self), fields(path = %path, runtime = %selector))]
    pub async fn switch_to(
        &mut self,
        path: WorkflowPath,
        selector: RuntimeSelector,
    ) -> Result<SyncOutcome, SessionError> {
        self.activity.touch();
        self.current_path = path;
        self.selector = selector;
        self.poll_once().await
    }

    /// Fetch and apply the authoritative snapshot for the current pair.
    ///
    /// Each response is a complete snapshot for the pair it was requested
    /// for; if navigation moved on while the request was in flight the
    /// response is discarded rather than clobbering the newer view.
    pub async fn poll_once(&mut self) -> Result<SyncOutcome, SessionError> {
        let requested_path = self.current_path.clone();
        let requested_selector = self.selector.clone();
        let transport = Arc::clone(&self.transport);
        let response = transport
            .get_service_state(&requested_path, &requested_selector, None)
            .await?;
        if requested_path != self.current_path || requested_selector != self.selector {
            debug!(path = %requested_path, "dropping superseded poll response");
            return Ok(SyncOutcome::Discarded);
        }
        self.apply_response(response)
    }

    fn apply_response(
        &mut self,
        response: ServiceStateResponse,
    ) -> Result<SyncOutcome, SessionError> {
        self.registry.set_choices(response.runtimes);
        if let Some(summary) = &response.run {
            let previous = self.registry.upsert(Run {
                runtime_id: summary.runtime_id.clone(),
                status: summary.status.clone(),
                creator: summary.creator.clone(),
                success: summary.success,
                state: response.state.clone(),
            });
            let newly_terminal =
                summary.status.is_terminal() && previous.is_none_or(|p| !p.is_terminal());
            if newly_terminal {
                self.emit(PollEvent::RunEnded {
                    runtime: summary.runtime_id.clone(),
                    status: summary.status.clone(),
                });
            }
        }

        let incoming = response.service.last_modified;
        let workflow_id = response.service.id;
        let structurally_changed = self.tokens.get(&workflow_id) != Some(&incoming)
            || self.workflow.as_ref().map(|w| w.id) != Some(workflow_id);
        if structurally_changed {
            let workflow = Workflow::from_definition(response.service)?;
            self.view.clear();
            self.tokens.insert(workflow_id, incoming);
            self.workflow = Some(workflow);
            self.emit(PollEvent::FullReload {
                workflow: workflow_id,
            });
        }
        let workflow = self
            .workflow
            .as_ref()
            .expect("workflow was just loaded or already present");
        apply_path_states(&mut self.view, workflow, &self.current_path, &response.state);
        if structurally_changed {
            Ok(SyncOutcome::FullReload)
        } else {
            self.emit(PollEvent::Recolored {
                path: self.current_path.clone(),
            });
            Ok(SyncOutcome::Incremental)
        }
    }

    /// Apply a graph-editing command: locally first, then to the server,
    /// rolling the optimistic edit back wholesale on rejection.
    ///
    /// Returns the server's authoritative `update_time`.
    #[instrument(skip(self))]
    pub async fn apply(&mut self, command: Command) -> Result<DateTime<Utc>, SessionError> {
        self.activity.touch();
        let workflow = self.workflow.as_ref().ok_or(SessionError::NotLoaded)?;
        let workflow_id = workflow.id;
        let transport = Arc::clone(&self.transport);
        match command {
            Command::AddEdge {
                source,
                destination,
                kind,
            } => {
                // Validation errors never leave the client; the edge is
                // only inserted once the server has assigned its id.
                let proposal = propose_edge(workflow, source, destination, kind)?;
                let created = transport.add_edge(workflow_id, &proposal).await?;
                let workflow = self.workflow_mut()?;
                workflow.confirm_edge(Edge {
                    id: created.edge.id,
                    kind: created.edge.subtype,
                    source: created.edge.source_id,
                    destination: created.edge.destination_id,
                });
                Ok(self.adopt_token(workflow_id, created.update_time))
            }
            Command::DeleteEdge { edge } => {
                let undo = workflow.clone();
                self.workflow_mut()?.remove_edge(edge)?;
                match transport.delete_edge(workflow_id, edge).await {
                    Ok(ack) => Ok(self.adopt_token(workflow_id, ack.update_time)),
                    Err(err) => Err(self.rollback(undo, err)),
                }
            }
            Command::DeleteNode { node } => {
                let undo = workflow.clone();
                self.workflow_mut()?.remove_service(node)?;
                match transport.delete_node(workflow_id, node).await {
                    Ok(removed) => Ok(self.adopt_token(workflow_id, removed.update_time)),
                    Err(err) => Err(self.rollback(undo, err)),
                }
            }
            Command::ToggleSkip { nodes } => {
                let undo = workflow.clone();
                let name = workflow.name.clone();
                // Mirror the server's rule: skip as long as any target is
                // still active, otherwise unskip all.
                let skip = nodes.iter().any(|id| {
                    workflow
                        .service(*id)
                        .is_some_and(|s| !s.is_sentinel() && !s.is_skipped_in(&name))
                });
                if let Err(err) = Self::set_skip_flags(self.workflow_mut()?, &nodes, &name, skip)
                {
                    self.workflow = Some(undo);
                    return Err(err.into());
                }
                match transport.skip_services(workflow_id, &nodes).await {
                    Ok(outcome) => {
                        let confirmed = matches!(outcome.skip, SkipAction::Skip);
                        if confirmed != skip {
                            // Server disagreed; its answer wins.
                            Self::set_skip_flags(self.workflow_mut()?, &nodes, &name, confirmed)?;
                        }
                        Ok(self.adopt_token(workflow_id, outcome.update_time))
                    }
                    Err(err) => Err(self.rollback(undo, err)),
                }
            }
            Command::SavePositions { positions } => {
                let undo = workflow.clone();
                let name = workflow.name.clone();
                if let Err(err) = Self::set_positions(self.workflow_mut()?, &positions, &name) {
                    self.workflow = Some(undo);
                    return Err(err.into());
                }
                match transport.save_positions(workflow_id, &positions).await {
                    Ok(ack) => Ok(self.adopt_token(workflow_id, ack.update_time)),
                    Err(err) => Err(self.rollback(undo, err)),
                }
            }
        }
    }

    /// Add a cosmetic label to the displayed workflow.
    pub fn add_label(&mut self, label: Label) -> Result<DateTime<Utc>, SessionError> {
        Ok(self.workflow_mut()?.add_label(label))
    }

    /// Remove a cosmetic label from the displayed workflow.
    pub fn remove_label(&mut self, id: LabelId) -> Result<DateTime<Utc>, SessionError> {
        Ok(self.workflow_mut()?.remove_label(id)?)
    }

    /// Start a new run of the displayed path and select its runtime.
    #[instrument(skip_all)]
    pub async fn run(
        &mut self,
        parametrization: Option<serde_json::Value>,
    ) -> Result<RunStarted, SessionError> {
        self.activity.touch();
        let transport = Arc::clone(&self.transport);
        let started = transport
            .run_service(&self.current_path, parametrization)
            .await?;
        self.selector = RuntimeSelector::Id(started.runtime.clone());
        Ok(started)
    }

    /// Request a run to stop.
    ///
    /// Advisory: the engine halts after the currently executing unit of
    /// work, not instantaneously. Polling continues until the run reaches
    /// a terminal status.
    #[instrument(skip(self), fields(runtime = %runtime))]
    pub async fn stop_run(&mut self, runtime: &RuntimeId) -> Result<StopAck, SessionError> {
        let transport = Arc::clone(&self.transport);
        let accepted = transport.stop_run(runtime).await?;
        let message = if accepted {
            format!("run {runtime} will stop after the current unit of work completes")
        } else {
            format!("run {runtime} is not running")
        };
        self.emit(PollEvent::Notification {
            message: message.clone(),
        });
        Ok(StopAck { accepted, message })
    }

    fn workflow_mut(&mut self) -> Result<&mut Workflow, SessionError> {
        self.workflow.as_mut().ok_or(SessionError::NotLoaded)
    }

    /// Set the skip flag on every non-sentinel target; an unknown id aborts
    /// mid-loop, so callers must restore their undo copy on `Err`.
    fn set_skip_flags(
        workflow: &mut Workflow,
        nodes: &[ServiceId],
        name: &str,
        skip: bool,
    ) -> Result<(), ModelError> {
        for node in nodes {
            if workflow.service(*node).is_some_and(|s| s.is_sentinel()) {
                continue;
            }
            workflow.set_skip(*node, name, skip)?;
        }
        Ok(())
    }

    /// Record every position; an unknown id aborts mid-loop, so callers
    /// must restore their undo copy on `Err`.
    fn set_positions(
        workflow: &mut Workflow,
        positions: &FxHashMap<ServiceId, Position>,
        name: &str,
    ) -> Result<(), ModelError> {
        for (node, position) in positions {
            workflow.set_position(*node, name, *position)?;
        }
        Ok(())
    }

    fn adopt_token(&mut self, workflow_id: WorkflowId, token: DateTime<Utc>) -> DateTime<Utc> {
        if let Some(workflow) = self.workflow.as_mut() {
            workflow.set_last_modified(token);
        }
        self.tokens.insert(workflow_id, token);
        token
    }

    fn rollback(&mut self, undo: Workflow, err: TransportError) -> SessionError {
        debug!(error = %err, "mutation rejected; rolling back optimistic edit");
        self.workflow = Some(undo);
        if let TransportError::Forbidden { message } = &err {
            self.emit(PollEvent::Notification {
                message: message.clone(),
            });
        }
        err.into()
    }

    fn emit(&self, event: PollEvent) {
        let _ = self.events.send(event);
    }
}
