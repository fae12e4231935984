//! rpk-agent - opt-in usage reporting and admin queries for Redpanda nodes
//!
//! This library provides:
//! - Payload building for metrics and environment reports
//! - Conditional reporting gated on the `enable_usage_stats` opt-in
//! - Typed admin API calls (license info, per-node maintenance mode)
//! - Text/JSON presentation of license and maintenance outcomes

pub mod admin;
pub mod config;
pub mod error;
pub mod format;
mod http;
pub mod payload;
pub mod reporter;
pub mod system;

pub use admin::{AdminClient, License, LicenseProperties};
pub use config::{AdminConfig, AgentConfig, ReportingConfig};
pub use error::{Error, Result};
pub use format::{LicenseOutcome, LicenseView, MaintenanceOutcome, OutputFormat};
pub use payload::{
    CheckRecord, EnvironmentFacts, EnvironmentPayload, EnvironmentSnapshot, MetricsSnapshot,
    NodeIdentity, PayloadBuilder, TunerRecord,
};
pub use reporter::UsageReporter;
pub use tokio_util::sync::CancellationToken;
