//! Local system measurements feeding the payload builder
//!
//! Samples free memory, free disk space across mounted filesystems, global CPU
//! load and static host facts (CPU model, core count, OS description).

use crate::payload::EnvironmentFacts;
use sysinfo::{Disks, System, MINIMUM_CPU_UPDATE_INTERVAL};
use tracing::debug;

const BYTES_PER_MB: f64 = 1024.0 * 1024.0;

/// One sample of the local host
#[derive(Debug, Clone, PartialEq)]
pub struct SystemSample {
    pub free_memory_mb: f64,
    pub free_space_mb: f64,
    pub cpu_percentage: f64,
    pub cpu_cores: u32,
    pub cpu_model: String,
    pub os_info: String,
}

impl SystemSample {
    /// Combine with facts only the operator knows
    pub fn into_environment_facts(
        self,
        cloud_vendor: String,
        vm_type: String,
        rp_version: String,
    ) -> EnvironmentFacts {
        EnvironmentFacts {
            cpu_cores: self.cpu_cores,
            cpu_model: self.cpu_model,
            cloud_vendor,
            rp_version,
            vm_type,
            os_info: self.os_info,
        }
    }
}

/// Sample the host. CPU usage needs two refreshes, so this waits for
/// `sysinfo`'s minimum update interval.
pub async fn sample() -> SystemSample {
    debug!("Sampling system metrics...");

    let mut sys = System::new();
    sys.refresh_memory();
    sys.refresh_cpu();
    tokio::time::sleep(MINIMUM_CPU_UPDATE_INTERVAL).await;
    sys.refresh_cpu();

    let disks = Disks::new_with_refreshed_list();
    let free_space_bytes: u64 = disks.list().iter().map(|d| d.available_space()).sum();

    let cpu_model = sys
        .cpus()
        .first()
        .map(|cpu| cpu.brand().trim().to_string())
        .unwrap_or_default();
    let cpu_cores = sys
        .physical_core_count()
        .unwrap_or_else(|| sys.cpus().len()) as u32;

    SystemSample {
        free_memory_mb: sys.available_memory() as f64 / BYTES_PER_MB,
        free_space_mb: free_space_bytes as f64 / BYTES_PER_MB,
        cpu_percentage: f64::from(sys.global_cpu_info().cpu_usage()),
        cpu_cores,
        cpu_model,
        os_info: os_info(),
    }
}

/// `<arch> <kernel> "<long os version>"`, skipping parts sysinfo can't read
fn os_info() -> String {
    let mut parts = vec![std::env::consts::ARCH.to_string()];
    if let Some(kernel) = System::kernel_version() {
        parts.push(kernel);
    }
    if let Some(os) = System::long_os_version() {
        parts.push(format!("\"{os}\""));
    }
    parts.join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_sample_collection() {
        let sample = sample().await;
        assert!(sample.free_memory_mb > 0.0);
        assert!(sample.cpu_cores > 0);
        assert!(sample.cpu_percentage >= 0.0);
        assert!(sample.os_info.starts_with(std::env::consts::ARCH));
    }

    #[test]
    fn test_into_environment_facts() {
        let sample = SystemSample {
            free_memory_mb: 1.0,
            free_space_mb: 2.0,
            cpu_percentage: 3.0,
            cpu_cores: 8,
            cpu_model: "Test CPU".to_string(),
            os_info: "x86_64 6.1".to_string(),
        };

        let facts = sample.into_environment_facts(
            "GCP".to_string(),
            "n2-standard-8".to_string(),
            "v24.1.1".to_string(),
        );
        assert_eq!(facts.cpu_cores, 8);
        assert_eq!(facts.cpu_model, "Test CPU");
        assert_eq!(facts.cloud_vendor, "GCP");
        assert_eq!(facts.vm_type, "n2-standard-8");
        assert_eq!(facts.rp_version, "v24.1.1");
        assert_eq!(facts.os_info, "x86_64 6.1");
    }
}
