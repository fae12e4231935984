//! Opt-in usage reporting
//!
//! `UsageReporter` POSTs JSON payloads to the usage collector, but only when
//! the operator enabled `enable_usage_stats`. When disabled, nothing is
//! serialized and no request is made. Failures are returned, never retried.

use crate::config::ReportingConfig;
use crate::error::{Error, Result};
use crate::http::cancellable;
use crate::payload::{EnvironmentSnapshot, MetricsSnapshot};
use reqwest::header::CONTENT_TYPE;
use serde::Serialize;
use tokio_util::sync::CancellationToken;
use tracing::debug;

/// Sends reporting payloads. Holds no mutable state, so one instance may
/// serve concurrent calls.
#[derive(Debug, Clone)]
pub struct UsageReporter {
    config: ReportingConfig,
    client: reqwest::Client,
}

impl UsageReporter {
    pub fn new(config: ReportingConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()?;
        Ok(Self { config, client })
    }

    pub fn config(&self) -> &ReportingConfig {
        &self.config
    }

    /// Serialize `payload` and POST it to `url`.
    ///
    /// Returns `Ok(())` without touching the network when usage stats are
    /// disabled. The bytes sent are exactly `serde_json::to_vec(payload)`.
    pub async fn report<T: Serialize + ?Sized>(
        &self,
        payload: &T,
        url: &str,
        cancel: &CancellationToken,
    ) -> Result<()> {
        if !self.config.enable_usage_stats {
            debug!(url, "usage stats disabled, skipping report");
            return Ok(());
        }

        let body = serde_json::to_vec(payload).map_err(Error::Encode)?;
        debug!(url, bytes = body.len(), "sending usage report");

        cancellable(cancel, async {
            let response = self
                .client
                .post(url)
                .header(CONTENT_TYPE, "application/json")
                .body(body)
                .send()
                .await?;

            let status = response.status();
            if status.is_success() {
                return Ok(());
            }
            let body = response.text().await.unwrap_or_default();
            Err(Error::Http {
                status: status.as_u16(),
                body,
            })
        })
        .await
    }

    /// POST a metrics snapshot to `{url}/metrics`
    pub async fn send_metrics(
        &self,
        metrics: &MetricsSnapshot,
        cancel: &CancellationToken,
    ) -> Result<()> {
        let url = self.endpoint("metrics");
        self.report(metrics, &url, cancel).await
    }

    /// POST an environment snapshot to `{url}/env`, applying `environment`
    /// as the send-time override of the snapshot's `environment` field
    pub async fn send_environment(
        &self,
        snapshot: EnvironmentSnapshot,
        environment: Option<&str>,
        cancel: &CancellationToken,
    ) -> Result<()> {
        let snapshot = snapshot.with_environment_override(environment);
        let url = self.endpoint("env");
        self.report(&snapshot, &url, cancel).await
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.config.url.trim_end_matches('/'), path)
    }
}
