//! Transport-agnostic contract between the client core and the server.
//!
//! The [`Transport`] trait mirrors the server's logical request/response
//! operations; the core never cares whether they travel over HTTP+JSON
//! (see [`HttpTransport`], feature `http`) or stay in-process
//! ([`InMemoryTransport`], used by tests and demos).
//!
//! All operations are idempotent to repeated identical calls except
//! `run_service` (each call starts a new run) and the mutations (each call
//! creates/removes state). Errors use the uniform [`TransportError`]
//! envelope: per-field validation, forbidden, domain, or network.

mod memory;

#[cfg(feature = "http")]
mod http;

pub use memory::{InMemoryTransport, ServerRun};

#[cfg(feature = "http")]
pub use http::HttpTransport;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use miette::Diagnostic;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::{EdgeDefinition, EdgeProposal, WorkflowDefinition};
use crate::path::WorkflowPath;
use crate::runs::PathState;
use crate::types::{
    EdgeId, Position, RunStatus, RuntimeId, RuntimeSelector, ServiceId, WorkflowId,
};

/// How per-target outcomes are aggregated in a state fetch.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DisplayMode {
    /// Aggregate outcomes per device.
    Device,
    /// Aggregate outcomes per triggering user.
    User,
}

/// Summary of one run as reported by the server.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RunSummary {
    pub runtime_id: RuntimeId,
    pub status: RunStatus,
    #[serde(default)]
    pub creator: Option<String>,
    #[serde(default)]
    pub success: Option<bool>,
}

/// Response of `get_service_state`: the authoritative snapshot for one
/// (path, runtime) pair.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ServiceStateResponse {
    /// Current definition of the workflow at the requested path.
    pub service: WorkflowDefinition,
    /// The selected run, if any exists.
    #[serde(default)]
    pub run: Option<RunSummary>,
    /// Every known runtime as `(id, display label)`.
    #[serde(default)]
    pub runtimes: Vec<(RuntimeId, String)>,
    /// Per-path execution state of the selected run.
    #[serde(default)]
    pub state: FxHashMap<WorkflowPath, PathState>,
}

/// Confirmation of `add_edge`: the server-assigned edge plus the new token.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct EdgeCreated {
    pub edge: EdgeDefinition,
    pub update_time: DateTime<Utc>,
}

/// Confirmation carrying only the new fencing token.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct UpdateAck {
    pub update_time: DateTime<Utc>,
}

/// Summary of a removed node.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct NodeRemoved {
    pub id: ServiceId,
    pub scoped_name: String,
    pub update_time: DateTime<Utc>,
}

/// Which way `skip_services` toggled the given nodes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SkipAction {
    Skip,
    Unskip,
}

/// Confirmation of `skip_services`.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SkipOutcome {
    pub skip: SkipAction,
    pub update_time: DateTime<Utc>,
}

/// Confirmation of `run_service`.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RunStarted {
    pub service: WorkflowId,
    pub runtime: RuntimeId,
    #[serde(default)]
    pub restart: bool,
}

/// Wire envelope distinguishing the server's error families.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(tag = "error", rename_all = "snake_case")]
pub enum ErrorEnvelope {
    /// Field-level validation problems, rendered per field.
    Validation { fields: FxHashMap<String, String> },
    /// The server denied the operation; rendered as one notification.
    Forbidden { message: String },
    /// A domain conflict (e.g. deleting the target of in-flight iteration).
    Invalid { message: String },
}

/// Uniform error surface of every transport operation.
#[derive(Debug, Error, Diagnostic)]
pub enum TransportError {
    /// Per-field validation failures.
    #[error("validation failed on {} field(s)", fields.len())]
    #[diagnostic(code(flowsync::transport::validation))]
    Validation { fields: FxHashMap<String, String> },

    /// The server denied the operation; no partial state was applied.
    #[error("forbidden: {message}")]
    #[diagnostic(code(flowsync::transport::forbidden))]
    Forbidden { message: String },

    /// Domain conflict rejected by the server.
    #[error("{message}")]
    #[diagnostic(code(flowsync::transport::domain))]
    Domain { message: String },

    /// The request never completed; safe to retry on the next tick.
    #[error("network failure: {message}")]
    #[diagnostic(
        code(flowsync::transport::network),
        help("Transient failures are retried by the poller; nothing to do.")
    )]
    Network { message: String },
}

impl From<ErrorEnvelope> for TransportError {
    fn from(envelope: ErrorEnvelope) -> Self {
        match envelope {
            ErrorEnvelope::Validation { fields } => TransportError::Validation { fields },
            ErrorEnvelope::Forbidden { message } => TransportError::Forbidden { message },
            ErrorEnvelope::Invalid { message } => TransportError::Domain { message },
        }
    }
}

/// The server's logical operation surface.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Fetch the authoritative snapshot for `(path, runtime)`.
    async fn get_service_state(
        &self,
        path: &WorkflowPath,
        runtime: &RuntimeSelector,
        display: Option<DisplayMode>,
    ) -> Result<ServiceStateResponse, TransportError>;

    /// Submit a validated edge proposal; the server assigns the id.
    async fn add_edge(
        &self,
        workflow: WorkflowId,
        proposal: &EdgeProposal,
    ) -> Result<EdgeCreated, TransportError>;

    async fn delete_edge(
        &self,
        workflow: WorkflowId,
        edge: EdgeId,
    ) -> Result<UpdateAck, TransportError>;

    async fn delete_node(
        &self,
        workflow: WorkflowId,
        node: ServiceId,
    ) -> Result<NodeRemoved, TransportError>;

    /// Toggle the skip flag of the given nodes within `workflow`.
    async fn skip_services(
        &self,
        workflow: WorkflowId,
        nodes: &[ServiceId],
    ) -> Result<SkipOutcome, TransportError>;

    async fn save_positions(
        &self,
        workflow: WorkflowId,
        positions: &FxHashMap<ServiceId, Position>,
    ) -> Result<UpdateAck, TransportError>;

    /// Advisory stop: the engine halts after the current unit of work.
    /// Returns `false` if the run was not running.
    async fn stop_run(&self, runtime: &RuntimeId) -> Result<bool, TransportError>;

    /// Start a new run of the service/workflow at `path`.
    async fn run_service(
        &self,
        path: &WorkflowPath,
        parametrization: Option<serde_json::Value>,
    ) -> Result<RunStarted, TransportError>;
}
