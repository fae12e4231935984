//! Reporting payloads and their construction
//!
//! Two payload kinds are sent to the usage collector:
//! - `MetricsSnapshot`: free memory, free disk and CPU load of a node
//! - `EnvironmentSnapshot`: hardware/OS facts plus check and tuner results
//!
//! Field names on the wire are camelCase and must match the collector exactly.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Process variable whose value, when set and non-empty, becomes the
/// `environment` field of environment reports
pub const ENVIRONMENT_VAR: &str = "REDPANDA_ENVIRONMENT";

/// Identity stamped on every payload
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct NodeIdentity {
    pub node_uuid: String,
    pub node_id: i64,
    pub organization: String,
}

/// Usage metrics for one reporting attempt
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricsSnapshot {
    #[serde(rename = "freeMemoryMB")]
    pub free_memory_mb: f64,
    #[serde(rename = "freeSpaceMB")]
    pub free_space_mb: f64,
    pub cpu_percentage: f64,
    pub sent_at: DateTime<Utc>,
    pub node_uuid: String,
    pub organization: String,
    pub node_id: i64,
}

/// A diagnostic comparison; callers infer pass/fail from `current` vs `required`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckRecord {
    pub name: String,
    pub current: String,
    pub required: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TunerRecord {
    pub name: String,
    #[serde(default)]
    pub error_msg: String,
    pub enabled: bool,
    pub supported: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnvironmentPayload {
    #[serde(default)]
    pub checks: Vec<CheckRecord>,
    #[serde(default)]
    pub tuners: Vec<TunerRecord>,
    #[serde(default)]
    pub error_msg: String,
}

/// Hardware and software facts describing where the node runs
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct EnvironmentFacts {
    pub cpu_cores: u32,
    pub cpu_model: String,
    pub cloud_vendor: String,
    pub rp_version: String,
    pub vm_type: String,
    pub os_info: String,
}

/// Environment report for one reporting attempt
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnvironmentSnapshot {
    pub payload: EnvironmentPayload,
    pub sent_at: DateTime<Utc>,
    pub node_uuid: String,
    pub organization: String,
    pub node_id: i64,
    pub cloud_vendor: String,
    pub vm_type: String,
    pub os_info: String,
    pub cpu_model: String,
    pub cpu_cores: u32,
    pub rp_version: String,
    pub environment: String,
}

impl EnvironmentSnapshot {
    /// Replace `environment` with `environment` when it is non-empty.
    ///
    /// Applied by the reporter right before sending so the field reflects the
    /// override in effect at send time rather than at construction time.
    pub fn with_environment_override(mut self, environment: Option<&str>) -> Self {
        if let Some(env) = environment.filter(|e| !e.is_empty()) {
            self.environment = env.to_string();
        }
        self
    }
}

/// Reads `REDPANDA_ENVIRONMENT`. This is the only place the process
/// environment is consulted; everything downstream takes the value explicitly.
pub fn environment_override_from_env() -> Option<String> {
    std::env::var(ENVIRONMENT_VAR)
        .ok()
        .filter(|value| !value.is_empty())
}

/// Builds payloads for one node. Construction never fails and does not
/// validate the measurements it is given.
#[derive(Debug, Clone)]
pub struct PayloadBuilder {
    identity: NodeIdentity,
    environment: Option<String>,
}

impl PayloadBuilder {
    pub fn new(identity: NodeIdentity) -> Self {
        Self {
            identity,
            environment: None,
        }
    }

    /// Environment label for environment reports; empty values are ignored
    pub fn with_environment(mut self, environment: Option<String>) -> Self {
        self.environment = environment.filter(|e| !e.is_empty());
        self
    }

    pub fn identity(&self) -> &NodeIdentity {
        &self.identity
    }

    pub fn metrics(
        &self,
        free_memory_mb: f64,
        free_space_mb: f64,
        cpu_percentage: f64,
    ) -> MetricsSnapshot {
        MetricsSnapshot {
            free_memory_mb,
            free_space_mb,
            cpu_percentage,
            sent_at: Utc::now(),
            node_uuid: self.identity.node_uuid.clone(),
            organization: self.identity.organization.clone(),
            node_id: self.identity.node_id,
        }
    }

    pub fn environment(
        &self,
        facts: EnvironmentFacts,
        payload: EnvironmentPayload,
    ) -> EnvironmentSnapshot {
        EnvironmentSnapshot {
            payload,
            sent_at: Utc::now(),
            node_uuid: self.identity.node_uuid.clone(),
            organization: self.identity.organization.clone(),
            node_id: self.identity.node_id,
            cloud_vendor: facts.cloud_vendor,
            vm_type: facts.vm_type,
            os_info: facts.os_info,
            cpu_model: facts.cpu_model,
            cpu_cores: facts.cpu_cores,
            rp_version: facts.rp_version,
            environment: self.environment.clone().unwrap_or_default(),
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) fn sample_identity() -> NodeIdentity {
        NodeIdentity {
            node_uuid: "awe-1231-sdfasd-13-saddasdf-as123sdf".to_string(),
            node_id: 1,
            organization: "test.vectorized.io".to_string(),
        }
    }

    pub(crate) fn sample_facts() -> EnvironmentFacts {
        EnvironmentFacts {
            cpu_cores: 12,
            cpu_model: "AMD Ryzen 9 3900X 12-Core Processor".to_string(),
            cloud_vendor: "AWS".to_string(),
            rp_version: "release-0.99.8 (rev a2b48491)".to_string(),
            vm_type: "i3.4xlarge".to_string(),
            os_info: "x86_64 5.8.9-200.fc32.x86_64 \"Fedora release 32 (Thirty Two)\"".to_string(),
        }
    }

    pub(crate) fn sample_payload() -> EnvironmentPayload {
        EnvironmentPayload {
            checks: vec![
                CheckRecord {
                    name: "check 1".to_string(),
                    current: "1".to_string(),
                    required: "2".to_string(),
                },
                CheckRecord {
                    name: "check 2".to_string(),
                    current: "something".to_string(),
                    required: "something better".to_string(),
                },
            ],
            tuners: vec![
                TunerRecord {
                    name: "tuner 1".to_string(),
                    error_msg: String::new(),
                    enabled: true,
                    supported: false,
                },
                TunerRecord {
                    name: "tuner 2".to_string(),
                    error_msg: "tuner 2 failed".to_string(),
                    enabled: true,
                    supported: true,
                },
            ],
            error_msg: "tuner 2 failed".to_string(),
        }
    }

    #[test]
    fn test_metrics_snapshot_fields() {
        let before = Utc::now();
        let metrics = PayloadBuilder::new(sample_identity()).metrics(100.0, 200.0, 89.0);

        assert_eq!(metrics.free_memory_mb, 100.0);
        assert_eq!(metrics.free_space_mb, 200.0);
        assert_eq!(metrics.cpu_percentage, 89.0);
        assert_eq!(metrics.node_id, 1);
        assert_eq!(metrics.organization, "test.vectorized.io");
        assert!(metrics.sent_at >= before);
    }

    #[test]
    fn test_metrics_wire_names() {
        let metrics = PayloadBuilder::new(sample_identity()).metrics(1.0, 2.0, 3.0);
        let value = serde_json::to_value(&metrics).unwrap();

        for key in [
            "freeMemoryMB",
            "freeSpaceMB",
            "cpuPercentage",
            "sentAt",
            "nodeUuid",
            "organization",
            "nodeId",
        ] {
            assert!(value.get(key).is_some(), "missing key {key}");
        }
    }

    #[test]
    fn test_environment_defaults_to_empty_string() {
        let snapshot =
            PayloadBuilder::new(sample_identity()).environment(sample_facts(), sample_payload());

        assert_eq!(snapshot.environment, "");
        let value = serde_json::to_value(&snapshot).unwrap();
        assert_eq!(value["environment"], "");
        assert_eq!(value["rpVersion"], "release-0.99.8 (rev a2b48491)");
        assert_eq!(value["payload"]["tuners"][1]["errorMsg"], "tuner 2 failed");
    }

    #[test]
    fn test_environment_from_builder_override() {
        let snapshot = PayloadBuilder::new(sample_identity())
            .with_environment(Some("staging".to_string()))
            .environment(sample_facts(), EnvironmentPayload::default());
        assert_eq!(snapshot.environment, "staging");

        let snapshot = PayloadBuilder::new(sample_identity())
            .with_environment(Some(String::new()))
            .environment(sample_facts(), EnvironmentPayload::default());
        assert_eq!(snapshot.environment, "");
    }

    #[test]
    fn test_send_time_override_wins() {
        let snapshot = PayloadBuilder::new(sample_identity())
            .with_environment(Some("built".to_string()))
            .environment(sample_facts(), sample_payload());

        let overridden = snapshot.clone().with_environment_override(Some("sent"));
        assert_eq!(overridden.environment, "sent");

        let untouched = snapshot.with_environment_override(Some(""));
        assert_eq!(untouched.environment, "built");
    }

    #[test]
    fn test_environment_override_from_env() {
        std::env::set_var(ENVIRONMENT_VAR, "only-testing-nbd");
        assert_eq!(
            environment_override_from_env().as_deref(),
            Some("only-testing-nbd")
        );

        std::env::set_var(ENVIRONMENT_VAR, "");
        assert_eq!(environment_override_from_env(), None);

        std::env::remove_var(ENVIRONMENT_VAR);
        assert_eq!(environment_override_from_env(), None);
    }

    #[test]
    fn test_environment_encode_decode_is_stable() {
        let snapshot =
            PayloadBuilder::new(sample_identity()).environment(sample_facts(), sample_payload());

        let first = serde_json::to_vec(&snapshot).unwrap();
        let decoded: EnvironmentSnapshot = serde_json::from_slice(&first).unwrap();
        let second = serde_json::to_vec(&decoded).unwrap();

        assert_eq!(decoded, snapshot);
        assert_eq!(first, second);
    }

    #[test]
    fn test_payload_decodes_without_optional_fields() {
        let payload: EnvironmentPayload =
            serde_json::from_str(r#"{"tuners":[{"name":"t","enabled":true,"supported":false}]}"#)
                .unwrap();

        assert!(payload.checks.is_empty());
        assert_eq!(payload.tuners[0].error_msg, "");
        assert_eq!(payload.error_msg, "");
    }
}
