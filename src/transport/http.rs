//! HTTP+JSON transport (feature `http`).
//!
//! Thin `reqwest` client mapping each [`Transport`] operation to one
//! endpoint. Non-success responses are decoded through the uniform
//! [`ErrorEnvelope`]; anything undecodable is reported as a network
//! failure so the poller retries it silently.

use async_trait::async_trait;
use rustc_hash::FxHashMap;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::json;

use super::{
    DisplayMode, EdgeCreated, ErrorEnvelope, NodeRemoved, RunStarted, ServiceStateResponse,
    SkipOutcome, Transport, TransportError, UpdateAck,
};
use crate::model::EdgeProposal;
use crate::path::WorkflowPath;
use crate::types::{EdgeId, Position, RuntimeId, RuntimeSelector, ServiceId, WorkflowId};

/// `Transport` over HTTP+JSON.
#[derive(Clone, Debug)]
pub struct HttpTransport {
    client: reqwest::Client,
    base: String,
}

impl HttpTransport {
    #[must_use]
    pub fn new(base_url: impl Into<String>) -> Self {
        HttpTransport {
            client: reqwest::Client::new(),
            base: base_url.into(),
        }
    }

    fn network(err: reqwest::Error) -> TransportError {
        TransportError::Network {
            message: err.to_string(),
        }
    }

    async fn post<T: DeserializeOwned>(
        &self,
        route: &str,
        body: &impl Serialize,
    ) -> Result<T, TransportError> {
        let response = self
            .client
            .post(format!("{}/{route}", self.base))
            .json(body)
            .send()
            .await
            .map_err(Self::network)?;
        if response.status().is_success() {
            return response.json::<T>().await.map_err(Self::network);
        }
        let status = response.status();
        match response.json::<ErrorEnvelope>().await {
            Ok(envelope) => Err(envelope.into()),
            Err(_) => Err(TransportError::Network {
                message: format!("unexpected status {status}"),
            }),
        }
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn get_service_state(
        &self,
        path: &WorkflowPath,
        runtime: &RuntimeSelector,
        display: Option<DisplayMode>,
    ) -> Result<ServiceStateResponse, TransportError> {
        self.post(
            "get_service_state",
            &json!({
                "path": path,
                "runtime": runtime,
                "display": display,
            }),
        )
        .await
    }

    async fn add_edge(
        &self,
        workflow: WorkflowId,
        proposal: &EdgeProposal,
    ) -> Result<EdgeCreated, TransportError> {
        self.post(
            "add_edge",
            &json!({
                "workflow_id": workflow,
                "subtype": proposal.kind,
                "source_id": proposal.source,
                "destination_id": proposal.destination,
            }),
        )
        .await
    }

    async fn delete_edge(
        &self,
        workflow: WorkflowId,
        edge: EdgeId,
    ) -> Result<UpdateAck, TransportError> {
        self.post(
            "delete_edge",
            &json!({ "workflow_id": workflow, "edge_id": edge }),
        )
        .await
    }

    async fn delete_node(
        &self,
        workflow: WorkflowId,
        node: ServiceId,
    ) -> Result<NodeRemoved, TransportError> {
        self.post(
            "delete_node",
            &json!({ "workflow_id": workflow, "node_id": node }),
        )
        .await
    }

    async fn skip_services(
        &self,
        workflow: WorkflowId,
        nodes: &[ServiceId],
    ) -> Result<SkipOutcome, TransportError> {
        self.post(
            "skip_services",
            &json!({ "workflow_id": workflow, "node_ids": nodes }),
        )
        .await
    }

    async fn save_positions(
        &self,
        workflow: WorkflowId,
        positions: &FxHashMap<ServiceId, Position>,
    ) -> Result<UpdateAck, TransportError> {
        self.post(
            "save_positions",
            &json!({ "workflow_id": workflow, "positions": positions }),
        )
        .await
    }

    async fn stop_run(&self, runtime: &RuntimeId) -> Result<bool, TransportError> {
        self.post("stop_run", &json!({ "runtime_id": runtime }))
            .await
    }

    async fn run_service(
        &self,
        path: &WorkflowPath,
        parametrization: Option<serde_json::Value>,
    ) -> Result<RunStarted, TransportError> {
        self.post(
            "run_service",
            &json!({ "path": path, "parametrization": parametrization }),
        )
        .await
    }
}
