//! Human and JSON rendering of admin results
//!
//! Nothing here prints or exits: every function returns what should be shown
//! (and where), leaving stdout/stderr and exit codes to the caller.

use crate::admin::{License, LicenseProperties};
use crate::error::{Error, Result};
use chrono::{DateTime, Utc};
use serde::Serialize;

/// Licenses expiring in fewer days than this carry a warning
pub const EXPIRY_WARNING_DAYS: i64 = 30;

pub const EXPIRY_WARNING: &str = "warning: your license will expire soon";

const SECONDS_PER_DAY: i64 = 86_400;
const SECTION_TITLE: &str = "LICENSE INFORMATION";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

/// Rendered license: `body` goes to stdout, `warning` to stderr
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LicenseView {
    pub body: String,
    pub warning: Option<&'static str>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LicenseOutcome {
    Report(LicenseView),
    /// No usable license; `message` is the terminal output for the caller
    Missing { message: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MaintenanceOutcome {
    Success(String),
    NotFound(String),
    Failure(String),
}

impl MaintenanceOutcome {
    pub fn message(&self) -> &str {
        match self {
            MaintenanceOutcome::Success(m)
            | MaintenanceOutcome::NotFound(m)
            | MaintenanceOutcome::Failure(m) => m,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, MaintenanceOutcome::Success(_))
    }
}

#[derive(Serialize)]
struct LicenseJson<'a> {
    #[serde(rename = "Organization")]
    organization: &'a str,
    #[serde(rename = "Type")]
    license_type: &'a str,
    #[serde(rename = "Expires")]
    expires: String,
    #[serde(rename = "license_expired", skip_serializing_if = "std::ops::Not::not")]
    expired: bool,
}

pub fn is_expired(properties: &LicenseProperties) -> bool {
    properties.expires < 0
}

/// `Mon D YYYY` in UTC; out-of-range timestamps fall back to the raw number
pub fn format_expiry(expires: i64) -> String {
    DateTime::from_timestamp(expires, 0)
        .map(|t| t.format("%b %-d %Y").to_string())
        .unwrap_or_else(|| expires.to_string())
}

/// Whole days from `now` until `expires`, truncated toward zero
pub fn days_until(expires: i64, now: DateTime<Utc>) -> Option<i64> {
    DateTime::from_timestamp(expires, 0).map(|t| (t - now).num_seconds() / SECONDS_PER_DAY)
}

pub fn format_license(
    properties: &LicenseProperties,
    expired: bool,
    format: OutputFormat,
    now: DateTime<Utc>,
) -> Result<LicenseView> {
    let expires = format_expiry(properties.expires);

    let body = match format {
        OutputFormat::Json => {
            let json = LicenseJson {
                organization: &properties.organization,
                license_type: &properties.license_type,
                expires,
                expired,
            };
            serde_json::to_string_pretty(&json).map_err(Error::Encode)?
        }
        OutputFormat::Text => {
            let mut text = format!(
                "{SECTION_TITLE}\n{}\nOrganization:      {}\nType:              {}\nExpires:           {}\n",
                "=".repeat(SECTION_TITLE.len()),
                properties.organization,
                properties.license_type,
                expires,
            );
            if expired {
                text.push_str("License Expired:   true\n");
            }
            text
        }
    };

    let warning = days_until(properties.expires, now)
        .filter(|days| (0..EXPIRY_WARNING_DAYS).contains(days))
        .map(|_| EXPIRY_WARNING);

    Ok(LicenseView { body, warning })
}

/// Full `license info` presentation, including the unloaded cases
pub fn render_license_info(
    license: &License,
    format: OutputFormat,
    now: DateTime<Utc>,
) -> Result<LicenseOutcome> {
    if !license.loaded {
        let message = match format {
            OutputFormat::Json => "{}",
            OutputFormat::Text => "this cluster is missing a license",
        };
        return Ok(LicenseOutcome::Missing {
            message: message.to_string(),
        });
    }

    if license.properties.is_empty() {
        return Ok(LicenseOutcome::Missing {
            message: "no license loaded".to_string(),
        });
    }

    let expired = is_expired(&license.properties);
    format_license(&license.properties, expired, format, now).map(LicenseOutcome::Report)
}

pub fn maintenance_outcome(
    node_id: u32,
    enabled: bool,
    result: &Result<()>,
) -> MaintenanceOutcome {
    let verb = if enabled { "enabled" } else { "disabled" };
    match result {
        Ok(()) => MaintenanceOutcome::Success(format!(
            "Successfully {verb} maintenance mode for node {node_id}"
        )),
        Err(Error::NotFound { message }) => {
            MaintenanceOutcome::NotFound(format!("Not found: {message}"))
        }
        Err(err) => {
            let action = if enabled { "enabling" } else { "disabling" };
            MaintenanceOutcome::Failure(format!("error {action} maintenance mode: {err}"))
        }
    }
}
