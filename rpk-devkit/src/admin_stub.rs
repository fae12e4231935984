/*!
Admin API stub

Serves the subset of the Redpanda admin API rpk-agent talks to:
- `GET /v1/features/license`
- `POST /v1/brokers/{id}/maintenance` (enter maintenance)
- `DELETE /v1/brokers/{id}/maintenance` (leave maintenance)

Unknown node ids answer 404 with `{"message": "node not found", "code": 404}`.
*/

use crate::state::{new_state, Shared};
use crate::test_utils::StubServer;
use anyhow::Result;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::time::Duration;

/// Canned failure returned instead of the normal handler result
#[derive(Debug, Clone)]
struct Failure {
    status: StatusCode,
    body: String,
}

#[derive(Clone)]
pub struct AdminStub {
    license: Shared<Value>,
    nodes: Shared<HashMap<u32, bool>>,
    failure: Shared<Option<Failure>>,
    delay: Shared<Option<Duration>>,
    calls: Shared<Vec<String>>,
}

/// License endpoint body for a loaded license
pub fn license_json(organization: &str, license_type: &str, expires: i64) -> Value {
    json!({
        "loaded": true,
        "license": {
            "format_version": 0,
            "org": organization,
            "type": license_type,
            "expires": expires,
        }
    })
}

impl AdminStub {
    /// A cluster with no license and no known nodes
    pub fn new() -> Self {
        Self {
            license: new_state(json!({ "loaded": false })),
            nodes: new_state(HashMap::new()),
            failure: new_state(None),
            delay: new_state(None),
            calls: new_state(Vec::new()),
        }
    }

    pub fn set_license(&self, body: Value) {
        *self.license.lock() = body;
    }

    /// Register a node in normal (non-maintenance) state
    pub fn add_node(&self, node_id: u32) {
        self.nodes.lock().insert(node_id, false);
    }

    /// `Some(true)` while the node is in maintenance, `None` for unknown nodes
    pub fn maintenance_state(&self, node_id: u32) -> Option<bool> {
        self.nodes.lock().get(&node_id).copied()
    }

    /// Answer every request with `status` and a raw `body`
    pub fn fail_with(&self, status: u16, body: &str) {
        *self.failure.lock() = Some(Failure {
            status: StatusCode::from_u16(status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR),
            body: body.to_string(),
        });
    }

    pub fn delay_responses(&self, delay: Duration) {
        *self.delay.lock() = Some(delay);
    }

    /// Received calls as `"METHOD /path"`, in order
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().clone()
    }

    pub fn router(&self) -> Router {
        Router::new()
            .route("/v1/features/license", get(get_license))
            .route(
                "/v1/brokers/{id}/maintenance",
                post(enable_maintenance).delete(disable_maintenance),
            )
            .with_state(self.clone())
    }

    pub async fn start(&self) -> Result<StubServer> {
        StubServer::spawn(self.router()).await
    }

    /// Shared preamble: record the call, apply delay, return the canned failure if any
    async fn intercept(&self, call: String) -> Option<Response> {
        tracing::debug!(%call, "admin stub call");
        self.calls.lock().push(call);

        let delay = *self.delay.lock();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        let failure = self.failure.lock().clone();
        failure.map(|f| (f.status, f.body).into_response())
    }

    fn toggle(&self, node_id: u32, enabled: bool) -> Response {
        let mut nodes = self.nodes.lock();
        match nodes.get_mut(&node_id) {
            Some(state) => {
                *state = enabled;
                (StatusCode::OK, Json(json!({}))).into_response()
            }
            None => (
                StatusCode::NOT_FOUND,
                Json(json!({ "message": "node not found", "code": 404 })),
            )
                .into_response(),
        }
    }
}

impl Default for AdminStub {
    fn default() -> Self {
        Self::new()
    }
}

// GET /v1/features/license
async fn get_license(State(stub): State<AdminStub>) -> Response {
    if let Some(failure) = stub.intercept("GET /v1/features/license".to_string()).await {
        return failure;
    }
    let body = stub.license.lock().clone();
    Json(body).into_response()
}

// POST /v1/brokers/{id}/maintenance
async fn enable_maintenance(State(stub): State<AdminStub>, Path(id): Path<u32>) -> Response {
    if let Some(failure) = stub
        .intercept(format!("POST /v1/brokers/{id}/maintenance"))
        .await
    {
        return failure;
    }
    stub.toggle(id, true)
}

// DELETE /v1/brokers/{id}/maintenance
async fn disable_maintenance(State(stub): State<AdminStub>, Path(id): Path<u32>) -> Response {
    if let Some(failure) = stub
        .intercept(format!("DELETE /v1/brokers/{id}/maintenance"))
        .await
    {
        return failure;
    }
    stub.toggle(id, false)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_license_defaults_to_not_loaded() {
        let stub = AdminStub::new();
        let server = stub.start().await.unwrap();

        let body: Value = reqwest::get(format!("{}/v1/features/license", server.url()))
            .await
            .unwrap()
            .json()
            .await
            .unwrap();

        assert_eq!(body, json!({ "loaded": false }));
        assert_eq!(stub.calls(), vec!["GET /v1/features/license"]);
    }

    #[tokio::test]
    async fn test_maintenance_toggle_known_node() {
        let stub = AdminStub::new();
        stub.add_node(2);
        let server = stub.start().await.unwrap();
        let client = reqwest::Client::new();
        let url = format!("{}/v1/brokers/2/maintenance", server.url());

        let response = client.post(&url).send().await.unwrap();
        assert_eq!(response.status().as_u16(), 200);
        assert_eq!(stub.maintenance_state(2), Some(true));

        let response = client.delete(&url).send().await.unwrap();
        assert_eq!(response.status().as_u16(), 200);
        assert_eq!(stub.maintenance_state(2), Some(false));
    }

    #[tokio::test]
    async fn test_maintenance_unknown_node_is_not_found() {
        let stub = AdminStub::new();
        let server = stub.start().await.unwrap();

        let response = reqwest::Client::new()
            .delete(format!("{}/v1/brokers/9/maintenance", server.url()))
            .send()
            .await
            .unwrap();

        assert_eq!(response.status().as_u16(), 404);
        let body: Value = response.json().await.unwrap();
        assert_eq!(body["message"], "node not found");
        assert_eq!(stub.maintenance_state(9), None);
    }

    #[tokio::test]
    async fn test_fail_with_overrides_every_route() {
        let stub = AdminStub::new();
        stub.add_node(1);
        stub.fail_with(500, "boom");
        let server = stub.start().await.unwrap();

        let response = reqwest::Client::new()
            .post(format!("{}/v1/brokers/1/maintenance", server.url()))
            .send()
            .await
            .unwrap();

        assert_eq!(response.status().as_u16(), 500);
        assert_eq!(response.text().await.unwrap(), "boom");
        assert_eq!(stub.maintenance_state(1), Some(false));
    }
}
