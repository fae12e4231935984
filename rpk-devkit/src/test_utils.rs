/*!
Server harness for the stubs

Binds a router on `127.0.0.1:0` and serves it on the current tokio runtime
until the handle is dropped.
*/

use anyhow::{Context, Result};
use axum::Router;
use std::net::SocketAddr;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

/// A running stub server. Dropping it stops the server.
pub struct StubServer {
    addr: SocketAddr,
    handle: JoinHandle<()>,
}

impl StubServer {
    /// Serve `router` on an ephemeral local port
    pub async fn spawn(router: Router) -> Result<Self> {
        let listener = TcpListener::bind(SocketAddr::from(([127, 0, 0, 1], 0)))
            .await
            .context("Failed to bind stub listener")?;
        let addr = listener
            .local_addr()
            .context("Failed to read stub listener address")?;

        let handle = tokio::spawn(async move {
            if let Err(e) = axum::serve(listener, router).await {
                tracing::warn!(error = %e, "stub server stopped");
            }
        });

        tracing::debug!(%addr, "stub server listening");
        Ok(Self { addr, handle })
    }

    /// `host:port`, as found in an admin address list
    pub fn address(&self) -> String {
        self.addr.to_string()
    }

    /// Base URL with scheme, e.g. `http://127.0.0.1:40123`
    pub fn url(&self) -> String {
        format!("http://{}", self.addr)
    }
}

impl Drop for StubServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::routing::get;

    #[tokio::test]
    async fn test_spawn_serves_router() {
        let router = Router::new().route("/health", get(|| async { "ok" }));
        let server = StubServer::spawn(router).await.unwrap();

        assert!(server.url().starts_with("http://127.0.0.1:"));
        let body = reqwest::get(format!("{}/health", server.url()))
            .await
            .unwrap()
            .text()
            .await
            .unwrap();
        assert_eq!(body, "ok");
    }
}
