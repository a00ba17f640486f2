//! The client-side workflow graph and its structural mutations.

use chrono::{DateTime, Utc};
use miette::Diagnostic;
use rustc_hash::FxHashMap;
use thiserror::Error;

use super::definition::WorkflowDefinition;
use super::edge::Edge;
use super::label::Label;
use super::service::{IterationSpec, Service};
use crate::types::{EdgeId, LabelId, Position, ServiceId, ServiceKind, WorkflowId};

/// Errors raised by graph lookups and structural mutations.
#[derive(Debug, Error, Diagnostic)]
pub enum ModelError {
    /// The referenced node, edge, or label does not exist.
    #[error("no {entity} with id {id}")]
    #[diagnostic(
        code(flowsync::model::not_found),
        help("The id may belong to another workflow, or the object was deleted by a concurrent editor.")
    )]
    NotFound { entity: &'static str, id: String },

    /// The operation would delete or alter a `Start`/`End` sentinel.
    #[error("the {kind} sentinel cannot be modified")]
    #[diagnostic(
        code(flowsync::model::sentinel_immutable),
        help("Start and End exist exactly once per workflow and anchor every execution path.")
    )]
    SentinelImmutable { kind: ServiceKind },

    /// A definition arrived without one of its mandatory sentinels.
    #[error("workflow {name:?} has no {kind} sentinel")]
    #[diagnostic(code(flowsync::model::sentinel_missing))]
    SentinelMissing { name: String, kind: ServiceKind },

    /// Two nodes in one workflow claimed the same id.
    #[error("duplicate node id {id}")]
    #[diagnostic(code(flowsync::model::duplicate_node))]
    DuplicateNode { id: ServiceId },
}

/// In-memory representation of one workflow definition.
///
/// Holds the ordered service nodes, the conditional edges, the cosmetic
/// labels, and the `last_modified` fencing token. Every structural mutation
/// stamps a fresh token and returns it; the synchronization layer later
/// overwrites the token with the server's authoritative `update_time`.
#[derive(Clone, Debug)]
pub struct Workflow {
    pub id: WorkflowId,
    /// Globally unique name.
    pub name: String,
    /// Name unique within the parent workflow, since the same underlying
    /// object can be shared across several parents.
    pub scoped_name: String,
    /// The template this instance is parametrized under, if any.
    pub superworkflow: Option<WorkflowId>,
    last_modified: DateTime<Utc>,
    services: Vec<Service>,
    edges: FxHashMap<EdgeId, Edge>,
    labels: FxHashMap<LabelId, Label>,
}

impl Workflow {
    /// Build the local model from a server-provided definition.
    ///
    /// Degenerate self-loop edges with synthetic negative ids are the
    /// server's iteration annotations; they are dropped here since the
    /// iteration spec already lives on the node.
    ///
    /// # Errors
    ///
    /// [`ModelError::SentinelMissing`] if `Start` or `End` is absent,
    /// [`ModelError::DuplicateNode`] on id collisions.
    pub fn from_definition(def: WorkflowDefinition) -> Result<Self, ModelError> {
        let mut services = Vec::with_capacity(def.services.len());
        let mut seen: FxHashMap<ServiceId, ()> = FxHashMap::default();
        for sd in def.services {
            if seen.insert(sd.id, ()).is_some() {
                return Err(ModelError::DuplicateNode { id: sd.id });
            }
            let iteration = {
                let spec = IterationSpec {
                    values: sd.iteration_values,
                    devices: sd.iteration_devices,
                    variable: sd.iteration_variable_name.unwrap_or_default(),
                };
                spec.is_configured().then_some(spec)
            };
            services.push(Service {
                id: sd.id,
                kind: sd.kind,
                scoped_name: sd.scoped_name,
                shared: sd.shared,
                skipped_in: sd
                    .skip
                    .into_iter()
                    .filter_map(|(name, flag)| flag.then_some(name))
                    .collect(),
                positions: sd.positions,
                iteration,
            });
        }

        for kind in [ServiceKind::Start, ServiceKind::End] {
            if !services.iter().any(|s| s.kind == kind) {
                return Err(ModelError::SentinelMissing {
                    name: def.name.clone(),
                    kind,
                });
            }
        }

        let edges = def
            .edges
            .into_iter()
            .filter(|ed| !(ed.id.is_synthetic() && ed.source_id == ed.destination_id))
            .map(|ed| {
                (
                    ed.id,
                    Edge {
                        id: ed.id,
                        kind: ed.subtype,
                        source: ed.source_id,
                        destination: ed.destination_id,
                    },
                )
            })
            .collect();

        let labels = def
            .labels
            .into_iter()
            .map(|ld| {
                (
                    ld.id,
                    Label {
                        id: ld.id,
                        content: ld.content,
                        alignment: ld.alignment,
                        position: ld.positions,
                    },
                )
            })
            .collect();

        Ok(Workflow {
            id: def.id,
            name: def.name,
            scoped_name: def.scoped_name,
            superworkflow: def.superworkflow,
            last_modified: def.last_modified,
            services,
            edges,
            labels,
        })
    }

    /// The structural-change fencing token.
    #[must_use]
    pub fn last_modified(&self) -> DateTime<Utc> {
        self.last_modified
    }

    /// Adopt the server's authoritative token after a confirmed mutation.
    pub fn set_last_modified(&mut self, token: DateTime<Utc>) {
        self.last_modified = token;
    }

    fn touch(&mut self) -> DateTime<Utc> {
        self.last_modified = Utc::now();
        self.last_modified
    }

    /// Service nodes in definition order.
    pub fn services(&self) -> impl Iterator<Item = &Service> {
        self.services.iter()
    }

    pub fn edges(&self) -> impl Iterator<Item = &Edge> {
        self.edges.values()
    }

    pub fn labels(&self) -> impl Iterator<Item = &Label> {
        self.labels.values()
    }

    #[must_use]
    pub fn service(&self, id: ServiceId) -> Option<&Service> {
        self.services.iter().find(|s| s.id == id)
    }

    #[must_use]
    pub fn edge(&self, id: EdgeId) -> Option<&Edge> {
        self.edges.get(&id)
    }

    #[must_use]
    pub fn label(&self, id: LabelId) -> Option<&Label> {
        self.labels.get(&id)
    }

    #[must_use]
    pub fn contains_node(&self, id: ServiceId) -> bool {
        self.service(id).is_some()
    }

    /// The entry sentinel.
    #[must_use]
    pub fn start(&self) -> &Service {
        self.sentinel(ServiceKind::Start)
    }

    /// The exit sentinel.
    #[must_use]
    pub fn end(&self) -> &Service {
        self.sentinel(ServiceKind::End)
    }

    fn sentinel(&self, kind: ServiceKind) -> &Service {
        self.services
            .iter()
            .find(|s| s.kind == kind)
            .expect("sentinels are validated at construction")
    }

    /// Add a node, rejecting id collisions and second sentinels.
    pub fn add_service(&mut self, service: Service) -> Result<DateTime<Utc>, ModelError> {
        if self.contains_node(service.id) {
            return Err(ModelError::DuplicateNode { id: service.id });
        }
        if service.kind.is_sentinel() {
            return Err(ModelError::SentinelImmutable {
                kind: service.kind,
            });
        }
        self.services.push(service);
        Ok(self.touch())
    }

    /// Remove a node and every edge incident to it.
    pub fn remove_service(&mut self, id: ServiceId) -> Result<DateTime<Utc>, ModelError> {
        let service = self.service(id).ok_or(ModelError::NotFound {
            entity: "service",
            id: id.to_string(),
        })?;
        if service.is_sentinel() {
            return Err(ModelError::SentinelImmutable {
                kind: service.kind.clone(),
            });
        }
        self.services.retain(|s| s.id != id);
        self.edges
            .retain(|_, e| e.source != id && e.destination != id);
        Ok(self.touch())
    }

    /// Insert a server-confirmed edge (id assigned server-side).
    pub fn confirm_edge(&mut self, edge: Edge) -> DateTime<Utc> {
        self.edges.insert(edge.id, edge);
        self.touch()
    }

    pub fn remove_edge(&mut self, id: EdgeId) -> Result<DateTime<Utc>, ModelError> {
        if self.edges.remove(&id).is_none() {
            return Err(ModelError::NotFound {
                entity: "edge",
                id: id.to_string(),
            });
        }
        Ok(self.touch())
    }

    pub fn add_label(&mut self, label: Label) -> DateTime<Utc> {
        self.labels.insert(label.id, label);
        self.touch()
    }

    pub fn remove_label(&mut self, id: LabelId) -> Result<DateTime<Utc>, ModelError> {
        if self.labels.remove(&id).is_none() {
            return Err(ModelError::NotFound {
                entity: "label",
                id: id.to_string(),
            });
        }
        Ok(self.touch())
    }

    /// Toggle the skip flag of `id` under the parent workflow `workflow_name`.
    ///
    /// The flag is per-(service, workflow): skipping a shared service in one
    /// parent leaves it active elsewhere. Sentinels are never skippable.
    pub fn set_skip(
        &mut self,
        id: ServiceId,
        workflow_name: &str,
        skip: bool,
    ) -> Result<DateTime<Utc>, ModelError> {
        let service = self
            .services
            .iter_mut()
            .find(|s| s.id == id)
            .ok_or(ModelError::NotFound {
                entity: "service",
                id: id.to_string(),
            })?;
        if service.kind.is_sentinel() {
            return Err(ModelError::SentinelImmutable {
                kind: service.kind.clone(),
            });
        }
        if skip {
            service.skipped_in.insert(workflow_name.to_string());
        } else {
            service.skipped_in.remove(workflow_name);
        }
        Ok(self.touch())
    }

    /// Record a node's canvas position under the parent `workflow_name`.
    pub fn set_position(
        &mut self,
        id: ServiceId,
        workflow_name: &str,
        position: Position,
    ) -> Result<DateTime<Utc>, ModelError> {
        let service = self
            .services
            .iter_mut()
            .find(|s| s.id == id)
            .ok_or(ModelError::NotFound {
                entity: "service",
                id: id.to_string(),
            })?;
        service
            .positions
            .insert(workflow_name.to_string(), position);
        Ok(self.touch())
    }
}
