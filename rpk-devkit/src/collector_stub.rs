/*!
Collector stub for usage reporting

Accepts any request on any path, records it verbatim and answers with a
configurable status. Tests use it to assert on the exact bytes a reporter
sent, or that nothing was sent at all.
*/

use crate::state::{new_state, Shared};
use crate::test_utils::StubServer;
use anyhow::Result;
use axum::body::Bytes;
use axum::extract::State;
use axum::http::{header, HeaderMap, Method, StatusCode, Uri};
use axum::Router;
use std::time::Duration;

/// One request as received by the collector
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub method: String,
    pub path: String,
    pub content_type: Option<String>,
    pub body: Vec<u8>,
}

#[derive(Clone)]
pub struct CollectorStub {
    requests: Shared<Vec<RecordedRequest>>,
    status: Shared<StatusCode>,
    delay: Shared<Option<Duration>>,
}

impl CollectorStub {
    pub fn new() -> Self {
        Self {
            requests: new_state(Vec::new()),
            status: new_state(StatusCode::OK),
            delay: new_state(None),
        }
    }

    /// Status returned for every subsequent request
    pub fn respond_with(&self, status: u16) {
        *self.status.lock() =
            StatusCode::from_u16(status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    }

    /// Hold every response for `delay` after recording the request
    pub fn delay_responses(&self, delay: Duration) {
        *self.delay.lock() = Some(delay);
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests.lock().clone()
    }

    pub fn request_count(&self) -> usize {
        self.requests.lock().len()
    }

    pub fn router(&self) -> Router {
        Router::new().fallback(record).with_state(self.clone())
    }

    /// Serve this collector on an ephemeral port
    pub async fn start(&self) -> Result<StubServer> {
        StubServer::spawn(self.router()).await
    }
}

impl Default for CollectorStub {
    fn default() -> Self {
        Self::new()
    }
}

async fn record(
    State(stub): State<CollectorStub>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> StatusCode {
    let content_type = headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);

    stub.requests.lock().push(RecordedRequest {
        method: method.to_string(),
        path: uri.path().to_string(),
        content_type,
        body: body.to_vec(),
    });
    tracing::debug!(%method, path = uri.path(), bytes = body.len(), "collector recorded request");

    let delay = *stub.delay.lock();
    if let Some(delay) = delay {
        tokio::time::sleep(delay).await;
    }

    *stub.status.lock()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_records_body_verbatim() {
        let stub = CollectorStub::new();
        let server = stub.start().await.unwrap();

        let response = reqwest::Client::new()
            .post(format!("{}/metrics", server.url()))
            .header("content-type", "application/json")
            .body(r#"{"a":1}"#)
            .send()
            .await
            .unwrap();

        assert_eq!(response.status().as_u16(), 200);
        let requests = stub.requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].method, "POST");
        assert_eq!(requests[0].path, "/metrics");
        assert_eq!(requests[0].content_type.as_deref(), Some("application/json"));
        assert_eq!(requests[0].body, br#"{"a":1}"#.to_vec());
    }

    #[tokio::test]
    async fn test_configured_status() {
        let stub = CollectorStub::new();
        stub.respond_with(503);
        let server = stub.start().await.unwrap();

        let response = reqwest::Client::new()
            .post(format!("{}/env", server.url()))
            .send()
            .await
            .unwrap();

        assert_eq!(response.status().as_u16(), 503);
        assert_eq!(stub.request_count(), 1);
    }
}
