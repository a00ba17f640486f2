//! In-memory workflow graph model.
//!
//! A [`Workflow`] is the client's copy of one server-side workflow
//! definition: an ordered collection of [`Service`] nodes (including the
//! mandatory `Start`/`End` sentinels), conditional [`Edge`]s, cosmetic
//! [`Label`]s, and the `last_modified` fencing token that the
//! synchronization layer compares to decide between a full reload and an
//! incremental recolor.
//!
//! Structural mutations (`add_service`, `remove_edge`, `set_skip`, ...) are
//! applied optimistically by the session layer and confirmed or rolled back
//! against the server's authoritative response; every mutation stamps a new
//! `last_modified`.
//!
//! Edge creation is validated before submission by
//! [`propose_edge`](crate::model::propose_edge), which enforces the
//! sentinel invariants (nothing targets `Start`, nothing leaves `End`, no
//! self-loops, no label endpoints).

mod definition;
mod edge;
mod label;
mod propose;
mod service;
mod workflow;

pub use definition::{EdgeDefinition, LabelDefinition, ServiceDefinition, WorkflowDefinition};
pub use edge::Edge;
pub use label::{Alignment, Label};
pub use propose::{EdgeError, EdgeProposal, propose_edge};
pub use service::{IterationSpec, Service};
pub use workflow::{ModelError, Workflow};
