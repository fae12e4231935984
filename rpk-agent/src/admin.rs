//! Admin API client
//!
//! Typed wrappers over the Redpanda admin API:
//! - `GET /v1/features/license` for license information
//! - `POST|DELETE /v1/brokers/{id}/maintenance` to enter or leave maintenance
//!
//! HTTP outcomes are mapped to `Error` variants so callers can match on
//! `Error::NotFound` instead of inspecting status codes themselves.

use crate::config::AdminConfig;
use crate::error::{Error, Result};
use crate::http::cancellable;
use reqwest::{Method, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;
use tracing::debug;

const LICENSE_PATH: &str = "/v1/features/license";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LicenseProperties {
    #[serde(rename = "format_version", default)]
    pub version: i32,
    #[serde(rename = "org", default)]
    pub organization: String,
    #[serde(rename = "type", default)]
    pub license_type: String,
    /// Unix seconds; negative means the license already expired
    #[serde(default)]
    pub expires: i64,
}

impl LicenseProperties {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// Decoded license endpoint response. Check `loaded` before reading
/// `properties`; an unloaded license is a normal outcome.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct License {
    pub loaded: bool,
    #[serde(rename = "license", default)]
    pub properties: LicenseProperties,
}

/// Error body returned by the admin API alongside non-2xx statuses
#[derive(Debug, Deserialize)]
struct GenericErrorBody {
    message: String,
}

/// How a 404 from a given endpoint is reported
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum NotFoundPolicy {
    /// Decode `{"message": ...}` into `Error::NotFound`
    DecodeMessage,
    Generic,
}

#[derive(Debug, Clone)]
pub struct AdminClient {
    base_url: String,
    client: reqwest::Client,
}

impl AdminClient {
    /// Targets the first configured address; `http://` is assumed when the
    /// address carries no scheme
    pub fn new(config: AdminConfig) -> Result<Self> {
        let address = config
            .addresses
            .first()
            .map(|a| a.trim())
            .filter(|a| !a.is_empty())
            .ok_or_else(|| Error::InvalidAddress("no admin API address configured".to_string()))?;

        let base_url = if address.contains("://") {
            address.trim_end_matches('/').to_string()
        } else {
            format!("http://{}", address.trim_end_matches('/'))
        };

        let client = reqwest::Client::builder().timeout(config.timeout).build()?;
        Ok(Self { base_url, client })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Fetch the cluster license. `loaded == false` is returned as `Ok`.
    pub async fn license_info(&self, cancel: &CancellationToken) -> Result<License> {
        let body = self
            .send(Method::GET, LICENSE_PATH, NotFoundPolicy::Generic, cancel)
            .await?;
        decode(&body)
    }

    /// Put `node_id` into (`enabled`) or out of maintenance mode
    pub async fn set_maintenance_mode(
        &self,
        cancel: &CancellationToken,
        node_id: u32,
        enabled: bool,
    ) -> Result<()> {
        let method = if enabled { Method::POST } else { Method::DELETE };
        let path = format!("/v1/brokers/{node_id}/maintenance");
        self.send(method, &path, NotFoundPolicy::DecodeMessage, cancel)
            .await?;
        Ok(())
    }

    pub async fn enable_maintenance_mode(
        &self,
        cancel: &CancellationToken,
        node_id: u32,
    ) -> Result<()> {
        self.set_maintenance_mode(cancel, node_id, true).await
    }

    pub async fn disable_maintenance_mode(
        &self,
        cancel: &CancellationToken,
        node_id: u32,
    ) -> Result<()> {
        self.set_maintenance_mode(cancel, node_id, false).await
    }

    /// Issue one request and return the success body
    async fn send(
        &self,
        method: Method,
        path: &str,
        not_found: NotFoundPolicy,
        cancel: &CancellationToken,
    ) -> Result<Vec<u8>> {
        let url = format!("{}{}", self.base_url, path);
        debug!(%method, %url, "admin API request");

        cancellable(cancel, async {
            let response = self.client.request(method, &url).send().await?;
            let status = response.status();
            if status.is_success() {
                return Ok(response.bytes().await?.to_vec());
            }

            // The status already arrived; an unreadable body stays an HTTP failure
            let body = response.bytes().await.unwrap_or_default();
            Err(classify_failure(status, &body, not_found))
        })
        .await
    }
}

fn decode<T: DeserializeOwned>(body: &[u8]) -> Result<T> {
    serde_json::from_slice(body).map_err(Error::Decode)
}

/// Map a non-2xx response to an error; an undecodable 404 body degrades to
/// the generic `Http` variant
fn classify_failure(status: StatusCode, body: &[u8], not_found: NotFoundPolicy) -> Error {
    if status == StatusCode::NOT_FOUND && not_found == NotFoundPolicy::DecodeMessage {
        if let Ok(decoded) = serde_json::from_slice::<GenericErrorBody>(body) {
            return Error::NotFound {
                message: decoded.message,
            };
        }
    }
    Error::Http {
        status: status.as_u16(),
        body: String::from_utf8_lossy(body).into_owned(),
    }
}
