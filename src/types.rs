//! Core identifier and classification types for the flowsync workflow model.
//!
//! This module defines the fundamental vocabulary used throughout the crate:
//! node/edge/workflow identities, the node classification [`ServiceKind`],
//! the conditional-edge classification [`EdgeKind`], run lifecycle statuses,
//! and the runtime-selection handle used when synchronizing state.
//!
//! Wire encodings are deliberately string-shaped where the server speaks
//! strings (`ServiceKind`, `RunStatus`, `RuntimeSelector`) and numeric where
//! it speaks numbers (the id newtypes). Unknown strings decode leniently so
//! a newer server cannot break an older client.
//!
//! # Examples
//!
//! ```rust
//! use flowsync::types::{EdgeKind, RuntimeSelector, ServiceKind};
//!
//! let kind = ServiceKind::decode("workflow");
//! assert!(kind.is_subworkflow());
//!
//! assert_eq!(EdgeKind::Success.label(), "Success");
//! assert_eq!(RuntimeSelector::Latest.encode(), "latest");
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;

/// Identity of a service node, assigned by the server.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ServiceId(pub i64);

impl fmt::Display for ServiceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i64> for ServiceId {
    fn from(id: i64) -> Self {
        ServiceId(id)
    }
}

/// Identity of an edge, assigned by the server.
///
/// Negative ids are synthetic: the server uses them to mark the degenerate
/// self-loop carrying a node's iteration annotation. Those never become
/// [`Edge`](crate::model::Edge)s in the local model; definition ingestion
/// folds them into the node's iteration spec instead.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EdgeId(pub i64);

impl EdgeId {
    /// Whether this id denotes a synthetic iteration annotation.
    #[must_use]
    pub fn is_synthetic(&self) -> bool {
        self.0 < 0
    }
}

impl fmt::Display for EdgeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i64> for EdgeId {
    fn from(id: i64) -> Self {
        EdgeId(id)
    }
}

/// Identity of a free-form label annotation.
///
/// Labels live in the same canvas id space as nodes, which is why edge
/// validation must check both: an id handed to `propose_edge` may turn out
/// to name a label rather than a service.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LabelId(pub i64);

impl fmt::Display for LabelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i64> for LabelId {
    fn from(id: i64) -> Self {
        LabelId(id)
    }
}

/// Identity of a workflow definition.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WorkflowId(pub i64);

impl fmt::Display for WorkflowId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i64> for WorkflowId {
    fn from(id: i64) -> Self {
        WorkflowId(id)
    }
}

/// Opaque token identifying one execution ("runtime") of a workflow.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RuntimeId(pub String);

impl RuntimeId {
    #[must_use]
    pub fn new(token: impl Into<String>) -> Self {
        RuntimeId(token.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RuntimeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for RuntimeId {
    fn from(s: &str) -> Self {
        RuntimeId(s.to_string())
    }
}

/// Classifies a node within a workflow graph.
///
/// `Start` and `End` are the sentinel anchors present exactly once per
/// workflow; they are never deletable and never carry execution logic of
/// their own. `Workflow` marks a nested sub-workflow instance, and
/// `Custom` carries the job type of an atomic automation service.
///
/// # Examples
///
/// ```rust
/// use flowsync::types::ServiceKind;
///
/// assert_eq!(ServiceKind::Start.encode(), "start");
/// assert_eq!(ServiceKind::decode("netmiko_command"),
///            ServiceKind::Custom("netmiko_command".to_string()));
/// assert_eq!(ServiceKind::decode(ServiceKind::Workflow.encode().as_str()),
///            ServiceKind::Workflow);
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "String", from = "String")]
pub enum ServiceKind {
    /// Entry sentinel. Every execution path begins here.
    Start,
    /// Exit sentinel. Every execution path terminates here.
    End,
    /// A nested sub-workflow instance.
    Workflow,
    /// An atomic automation job, identified by its job type.
    Custom(String),
}

impl ServiceKind {
    /// Wire string form of this kind.
    #[must_use]
    pub fn encode(&self) -> String {
        match self {
            ServiceKind::Start => "start".to_string(),
            ServiceKind::End => "end".to_string(),
            ServiceKind::Workflow => "workflow".to_string(),
            ServiceKind::Custom(s) => s.clone(),
        }
    }

    /// Decode a wire string; unrecognized job types become `Custom`.
    pub fn decode(s: &str) -> Self {
        match s {
            "start" => ServiceKind::Start,
            "end" => ServiceKind::End,
            "workflow" => ServiceKind::Workflow,
            other => ServiceKind::Custom(other.to_string()),
        }
    }

    /// Returns `true` for the entry or exit sentinel.
    #[must_use]
    pub fn is_sentinel(&self) -> bool {
        matches!(self, ServiceKind::Start | ServiceKind::End)
    }

    #[must_use]
    pub fn is_start(&self) -> bool {
        matches!(self, ServiceKind::Start)
    }

    #[must_use]
    pub fn is_end(&self) -> bool {
        matches!(self, ServiceKind::End)
    }

    /// Returns `true` if the node is a nested sub-workflow.
    #[must_use]
    pub fn is_subworkflow(&self) -> bool {
        matches!(self, ServiceKind::Workflow)
    }
}

impl fmt::Display for ServiceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.encode())
    }
}

impl From<ServiceKind> for String {
    fn from(kind: ServiceKind) -> Self {
        kind.encode()
    }
}

impl From<String> for ServiceKind {
    fn from(s: String) -> Self {
        ServiceKind::decode(&s)
    }
}

/// Conditional-edge classification.
///
/// `Success` and `Failure` edges are only traversable when the source
/// node's outcome matches; `Prerequisite` edges impose ordering alone,
/// independent of outcome.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EdgeKind {
    Success,
    Failure,
    Prerequisite,
}

impl EdgeKind {
    /// Human-readable label derived from the kind.
    #[must_use]
    pub fn label(&self) -> &'static str {
        match self {
            EdgeKind::Success => "Success",
            EdgeKind::Failure => "Failure",
            EdgeKind::Prerequisite => "Prerequisite",
        }
    }
}

impl fmt::Display for EdgeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// Lifecycle status of a run.
///
/// Unknown wire strings decode to [`RunStatus::Other`] so the client keeps
/// working against servers that grow new statuses.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "String", from = "String")]
pub enum RunStatus {
    #[default]
    Idle,
    Running,
    Completed,
    Stopped,
    Aborted,
    Other(String),
}

impl RunStatus {
    #[must_use]
    pub fn encode(&self) -> String {
        match self {
            RunStatus::Idle => "Idle".to_string(),
            RunStatus::Running => "Running".to_string(),
            RunStatus::Completed => "Completed".to_string(),
            RunStatus::Stopped => "Stopped".to_string(),
            RunStatus::Aborted => "Aborted".to_string(),
            RunStatus::Other(s) => s.clone(),
        }
    }

    pub fn decode(s: &str) -> Self {
        match s {
            "Idle" => RunStatus::Idle,
            "Running" => RunStatus::Running,
            "Completed" => RunStatus::Completed,
            "Stopped" => RunStatus::Stopped,
            "Aborted" => RunStatus::Aborted,
            other => RunStatus::Other(other.to_string()),
        }
    }

    /// A run is live exactly while its engine reports `Running`.
    #[must_use]
    pub fn is_running(&self) -> bool {
        matches!(self, RunStatus::Running)
    }

    /// Terminal runs are immutable; polling may stop once one is reached.
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            RunStatus::Completed | RunStatus::Stopped | RunStatus::Aborted
        )
    }
}

impl fmt::Display for RunStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.encode())
    }
}

impl From<RunStatus> for String {
    fn from(status: RunStatus) -> Self {
        status.encode()
    }
}

impl From<String> for RunStatus {
    fn from(s: String) -> Self {
        RunStatus::decode(&s)
    }
}

/// Selects which runtime's state a synchronization fetch should return.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "String", from = "String")]
pub enum RuntimeSelector {
    /// The server's default view (per-device latest results).
    Normal,
    /// The most recently created runtime.
    Latest,
    /// An explicitly chosen runtime.
    Id(RuntimeId),
}

impl RuntimeSelector {
    #[must_use]
    pub fn encode(&self) -> String {
        match self {
            RuntimeSelector::Normal => "normal".to_string(),
            RuntimeSelector::Latest => "latest".to_string(),
            RuntimeSelector::Id(id) => id.0.clone(),
        }
    }

    pub fn decode(s: &str) -> Self {
        match s {
            "normal" => RuntimeSelector::Normal,
            "latest" => RuntimeSelector::Latest,
            other => RuntimeSelector::Id(RuntimeId::new(other)),
        }
    }
}

impl fmt::Display for RuntimeSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.encode())
    }
}

impl From<RuntimeSelector> for String {
    fn from(sel: RuntimeSelector) -> Self {
        sel.encode()
    }
}

impl From<String> for RuntimeSelector {
    fn from(s: String) -> Self {
        RuntimeSelector::decode(&s)
    }
}

/// Overall color state a renderer should paint a node with.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StatusColor {
    /// All targets succeeded.
    Green,
    /// At least one target failed.
    Red,
    /// Still running (or no result reported yet).
    Blue,
    /// Every target was skipped.
    Gray,
    /// Complete but indeterminate/mixed outcome.
    Cyan,
}

impl fmt::Display for StatusColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            StatusColor::Green => "green",
            StatusColor::Red => "red",
            StatusColor::Blue => "blue",
            StatusColor::Gray => "gray",
            StatusColor::Cyan => "cyan",
        };
        write!(f, "{name}")
    }
}

/// A 2-D canvas position, serialized as `[x, y]` on the wire.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Position(pub f64, pub f64);

impl Position {
    #[must_use]
    pub fn x(&self) -> f64 {
        self.0
    }

    #[must_use]
    pub fn y(&self) -> f64 {
        self.1
    }
}
