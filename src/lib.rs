//! # Flowsync: Workflow Graph Model & Run-State Synchronization
//!
//! Flowsync is the client core underneath a workflow-automation UI: the
//! in-memory model of a workflow (a directed graph of automation services
//! and nested sub-workflows connected by conditional edges), plus the
//! protocol that keeps the displayed state synchronized with the server's
//! authoritative record of live runs.
//!
//! ## Core Concepts
//!
//! - **Workflow**: a named DAG of services/sub-workflows with `success`,
//!   `failure`, and `prerequisite` edges, anchored by mandatory
//!   `Start`/`End` sentinels
//! - **Path**: a `>`-delimited chain of node ids addressing one nested
//!   display/run context; distinct paths carry independent run state
//! - **Runtime**: one identified execution of a workflow, with a per-path
//!   state map polled from the server
//! - **Session**: the object owning the model, the current path/runtime,
//!   the derived view, and the cancellable poller that reconciles them
//!
//! ## Quick Start
//!
//! ```no_run
//! use std::sync::Arc;
//! use flowsync::path::WorkflowPath;
//! use flowsync::runs::{Poller, PollerConfig};
//! use flowsync::session::WorkflowSession;
//! use flowsync::transport::InMemoryTransport;
//! use flowsync::types::{RuntimeSelector, ServiceId};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let transport = Arc::new(InMemoryTransport::new());
//! let path = WorkflowPath::root(ServiceId(12));
//! let mut session = WorkflowSession::new(transport, path.clone());
//!
//! // First synchronization loads the definition and current run state.
//! session.switch_to(path, RuntimeSelector::Latest).await?;
//!
//! // Hand the session to the poller for live updates.
//! let session = Arc::new(tokio::sync::Mutex::new(session));
//! let poller = Poller::spawn(session, PollerConfig::default());
//!
//! // ... later: navigating away stops the loop deterministically.
//! poller.shutdown().await;
//! # Ok(())
//! # }
//! ```
//!
//! ## Module Guide
//!
//! - [`types`] - Identifiers and core enums
//! - [`model`] - Graph model, structural mutations, edge validation
//! - [`path`] - Hierarchical addressing of nested workflow instances
//! - [`placeholder`] - Per-path superworkflow slot resolution
//! - [`progress`] - Pure aggregation of per-target outcomes
//! - [`runs`] - Run registry, reconciliation, and the polling loop
//! - [`transport`] - Server contract, in-memory and HTTP implementations
//! - [`session`] - The session object and its command surface
//! - [`telemetry`] - Tracing subscriber setup

pub mod model;
pub mod path;
pub mod placeholder;
pub mod progress;
pub mod runs;
pub mod session;
pub mod telemetry;
pub mod transport;
pub mod types;
