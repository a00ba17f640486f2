//! In-process transport backed by a mutable server image.
//!
//! Serves tests and demos without a server: it holds workflow definitions,
//! a path that binds each addressable context to its definition, and the
//! runs the "engine" has produced. Mutations behave like the real server's
//! (id assignment, fencing-token bumps), and a scripted failure hook lets
//! tests exercise optimistic rollback.

use async_trait::async_trait;
use chrono::Utc;
use rustc_hash::FxHashMap;
use std::sync::Mutex;
use uuid::Uuid;

use super::{
    DisplayMode, EdgeCreated, ErrorEnvelope, NodeRemoved, RunStarted, RunSummary,
    ServiceStateResponse, SkipAction, SkipOutcome, Transport, TransportError, UpdateAck,
};
use crate::model::{EdgeDefinition, EdgeProposal, WorkflowDefinition};
use crate::path::WorkflowPath;
use crate::runs::PathState;
use crate::types::{
    EdgeId, Position, RunStatus, RuntimeId, RuntimeSelector, ServiceId, ServiceKind, WorkflowId,
};

/// One run as the in-memory engine stores it.
#[derive(Clone, Debug)]
pub struct ServerRun {
    pub summary: RunSummary,
    pub state: FxHashMap<WorkflowPath, PathState>,
}

#[derive(Debug, Default)]
struct Image {
    definitions: FxHashMap<WorkflowId, WorkflowDefinition>,
    bindings: FxHashMap<WorkflowPath, WorkflowId>,
    runs: Vec<ServerRun>,
    next_edge_id: i64,
    fail_next: Option<ErrorEnvelope>,
}

/// Transport implementation over an in-process server image.
#[derive(Debug, Default)]
pub struct InMemoryTransport {
    inner: Mutex<Image>,
}

impl InMemoryTransport {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn image(&self) -> std::sync::MutexGuard<'_, Image> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Register a workflow definition.
    pub fn seed_workflow(&self, definition: WorkflowDefinition) {
        let mut image = self.image();
        image.next_edge_id = image
            .next_edge_id
            .max(definition.edges.iter().map(|e| e.id.0 + 1).max().unwrap_or(1));
        image.definitions.insert(definition.id, definition);
    }

    /// Bind an addressable path to the workflow it displays.
    pub fn bind_path(&self, path: WorkflowPath, workflow: WorkflowId) {
        self.image().bindings.insert(path, workflow);
    }

    /// Append a run to the engine's record.
    pub fn push_run(&self, run: ServerRun) {
        self.image().runs.push(run);
    }

    /// Overwrite one path's state within a run.
    pub fn set_run_state(&self, runtime: &RuntimeId, path: WorkflowPath, state: PathState) {
        let mut image = self.image();
        if let Some(run) = image
            .runs
            .iter_mut()
            .find(|r| &r.summary.runtime_id == runtime)
        {
            run.state.insert(path, state);
        }
    }

    /// Move a run to a (possibly terminal) status.
    pub fn finish_run(&self, runtime: &RuntimeId, status: RunStatus, success: Option<bool>) {
        let mut image = self.image();
        if let Some(run) = image
            .runs
            .iter_mut()
            .find(|r| &r.summary.runtime_id == runtime)
        {
            run.summary.status = status;
            run.summary.success = success;
        }
    }

    /// Make the next mutating operation fail with the given envelope.
    pub fn fail_next(&self, envelope: ErrorEnvelope) {
        self.image().fail_next = Some(envelope);
    }

    fn take_scripted_failure(image: &mut Image) -> Result<(), TransportError> {
        match image.fail_next.take() {
            Some(envelope) => Err(envelope.into()),
            None => Ok(()),
        }
    }

    fn definition_mut<'a>(
        image: &'a mut Image,
        workflow: WorkflowId,
    ) -> Result<&'a mut WorkflowDefinition, TransportError> {
        image
            .definitions
            .get_mut(&workflow)
            .ok_or_else(|| TransportError::Domain {
                message: format!("unknown workflow {workflow}"),
            })
    }

    fn select_run<'a>(runs: &'a [ServerRun], selector: &RuntimeSelector) -> Option<&'a ServerRun> {
        match selector {
            RuntimeSelector::Normal | RuntimeSelector::Latest => runs.last(),
            RuntimeSelector::Id(id) => runs.iter().find(|r| &r.summary.runtime_id == id),
        }
    }
}

#[async_trait]
impl Transport for InMemoryTransport {
    async fn get_service_state(
        &self,
        path: &WorkflowPath,
        runtime: &RuntimeSelector,
        _display: Option<DisplayMode>,
    ) -> Result<ServiceStateResponse, TransportError> {
        let image = self.image();
        let workflow = image
            .bindings
            .get(path)
            .ok_or_else(|| TransportError::Domain {
                message: format!("nothing is addressable at path {path}"),
            })?;
        let service = image
            .definitions
            .get(workflow)
            .cloned()
            .ok_or_else(|| TransportError::Domain {
                message: format!("unknown workflow {workflow}"),
            })?;
        let selected = Self::select_run(&image.runs, runtime);
        let runtimes = image
            .runs
            .iter()
            .map(|r| {
                let creator = r.summary.creator.as_deref().unwrap_or("unknown");
                (
                    r.summary.runtime_id.clone(),
                    format!("{} ({creator})", r.summary.runtime_id),
                )
            })
            .collect();
        Ok(ServiceStateResponse {
            service,
            run: selected.map(|r| r.summary.clone()),
            runtimes,
            state: selected.map(|r| r.state.clone()).unwrap_or_default(),
        })
    }

    async fn add_edge(
        &self,
        workflow: WorkflowId,
        proposal: &EdgeProposal,
    ) -> Result<EdgeCreated, TransportError> {
        let mut image = self.image();
        Self::take_scripted_failure(&mut image)?;
        let id = EdgeId(image.next_edge_id);
        image.next_edge_id += 1;
        let def = Self::definition_mut(&mut image, workflow)?;
        let edge = EdgeDefinition {
            id,
            subtype: proposal.kind,
            source_id: proposal.source,
            destination_id: proposal.destination,
        };
        def.edges.push(edge.clone());
        def.last_modified = Utc::now();
        Ok(EdgeCreated {
            edge,
            update_time: def.last_modified,
        })
    }

    async fn delete_edge(
        &self,
        workflow: WorkflowId,
        edge: EdgeId,
    ) -> Result<UpdateAck, TransportError> {
        let mut image = self.image();
        Self::take_scripted_failure(&mut image)?;
        let def = Self::definition_mut(&mut image, workflow)?;
        let before = def.edges.len();
        def.edges.retain(|e| e.id != edge);
        if def.edges.len() == before {
            return Err(TransportError::Domain {
                message: format!("no edge {edge} in workflow {workflow}"),
            });
        }
        def.last_modified = Utc::now();
        Ok(UpdateAck {
            update_time: def.last_modified,
        })
    }

    async fn delete_node(
        &self,
        workflow: WorkflowId,
        node: ServiceId,
    ) -> Result<NodeRemoved, TransportError> {
        let mut image = self.image();
        Self::take_scripted_failure(&mut image)?;
        let def = Self::definition_mut(&mut image, workflow)?;
        let service = def
            .services
            .iter()
            .find(|s| s.id == node)
            .ok_or_else(|| TransportError::Domain {
                message: format!("no node {node} in workflow {workflow}"),
            })?;
        if service.kind.is_sentinel() {
            return Err(TransportError::Domain {
                message: "sentinel nodes cannot be deleted".to_string(),
            });
        }
        let scoped_name = service.scoped_name.clone();
        def.services.retain(|s| s.id != node);
        def.edges
            .retain(|e| e.source_id != node && e.destination_id != node);
        def.last_modified = Utc::now();
        Ok(NodeRemoved {
            id: node,
            scoped_name,
            update_time: def.last_modified,
        })
    }

    async fn skip_services(
        &self,
        workflow: WorkflowId,
        nodes: &[ServiceId],
    ) -> Result<SkipOutcome, TransportError> {
        let mut image = self.image();
        Self::take_scripted_failure(&mut image)?;
        let def = Self::definition_mut(&mut image, workflow)?;
        let name = def.name.clone();
        let any_active = def
            .services
            .iter()
            .filter(|s| nodes.contains(&s.id))
            .any(|s| !s.skip.get(&name).copied().unwrap_or(false));
        let action = if any_active {
            SkipAction::Skip
        } else {
            SkipAction::Unskip
        };
        for service in def.services.iter_mut().filter(|s| nodes.contains(&s.id)) {
            if service.kind == ServiceKind::Start || service.kind == ServiceKind::End {
                continue;
            }
            service
                .skip
                .insert(name.clone(), matches!(action, SkipAction::Skip));
        }
        def.last_modified = Utc::now();
        Ok(SkipOutcome {
            skip: action,
            update_time: def.last_modified,
        })
    }

    async fn save_positions(
        &self,
        workflow: WorkflowId,
        positions: &FxHashMap<ServiceId, Position>,
    ) -> Result<UpdateAck, TransportError> {
        let mut image = self.image();
        Self::take_scripted_failure(&mut image)?;
        let def = Self::definition_mut(&mut image, workflow)?;
        let name = def.name.clone();
        for service in def.services.iter_mut() {
            if let Some(position) = positions.get(&service.id) {
                service.positions.insert(name.clone(), *position);
            }
        }
        def.last_modified = Utc::now();
        Ok(UpdateAck {
            update_time: def.last_modified,
        })
    }

    async fn stop_run(&self, runtime: &RuntimeId) -> Result<bool, TransportError> {
        let mut image = self.image();
        let Some(run) = image
            .runs
            .iter_mut()
            .find(|r| &r.summary.runtime_id == runtime)
        else {
            return Ok(false);
        };
        if !run.summary.status.is_running() {
            return Ok(false);
        }
        run.summary.status = RunStatus::Stopped;
        Ok(true)
    }

    async fn run_service(
        &self,
        path: &WorkflowPath,
        _parametrization: Option<serde_json::Value>,
    ) -> Result<RunStarted, TransportError> {
        let mut image = self.image();
        Self::take_scripted_failure(&mut image)?;
        let workflow = *image
            .bindings
            .get(path)
            .ok_or_else(|| TransportError::Domain {
                message: format!("nothing is runnable at path {path}"),
            })?;
        let runtime = RuntimeId::new(Uuid::new_v4().to_string());
        image.runs.push(ServerRun {
            summary: RunSummary {
                runtime_id: runtime.clone(),
                status: RunStatus::Running,
                creator: Some("admin".to_string()),
                success: None,
            },
            state: FxHashMap::default(),
        });
        Ok(RunStarted {
            service: workflow,
            runtime,
            restart: false,
        })
    }
}
