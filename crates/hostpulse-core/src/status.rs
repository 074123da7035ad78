//! Combined host status document.

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::provider::{MetricsProvider, UsageStat};
use crate::sampler::RateSample;

/// Everything the `/status` endpoint reports in one document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HostStatus {
    pub cpu_usage: f64,
    pub memory_usage: f64,
    /// Names of running processes, unnamed ones omitted.
    pub processes: Vec<String>,
    pub network: Vec<RateSample>,
    #[serde(rename = "storage")]
    pub storage_usage: Vec<UsageStat>,
}

/// Assemble a status document from `provider` plus already-computed rates.
///
/// Any provider failure aborts the whole document; nothing is fabricated.
pub fn collect_status(provider: &dyn MetricsProvider, network: Vec<RateSample>) -> Result<HostStatus> {
    let processes = provider
        .processes()?
        .into_iter()
        .map(|p| p.name)
        .filter(|name| !name.is_empty())
        .collect();

    Ok(HostStatus {
        cpu_usage: provider.cpu_usage()?,
        memory_usage: provider.memory_usage()?,
        processes,
        network,
        storage_usage: provider.storage_usage()?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::{ProcessInfo, StaticProvider};

    fn named(pid: u32, name: &str) -> ProcessInfo {
        ProcessInfo {
            pid,
            name: name.to_string(),
            executable: None,
            cpu_percent: 1.0,
            memory_percent: 2.0,
            status: "Run".to_string(),
            create_time: 1,
        }
    }

    #[test]
    fn status_skips_unnamed_processes() {
        let provider = StaticProvider::new(12.5, 40.0)
            .with_processes(vec![named(1, "init"), named(2, ""), named(3, "sshd")])
            .with_storage(vec![UsageStat::from_space("/", 100, 40)]);
        let s = collect_status(&provider, Vec::new()).unwrap();
        assert_eq!(s.processes, vec!["init", "sshd"]);
        assert_eq!(s.cpu_usage, 12.5);
        assert_eq!(s.memory_usage, 40.0);
        assert_eq!(s.storage_usage.len(), 1);
    }

    #[test]
    fn status_json_uses_camel_case() {
        let provider = StaticProvider::new(1.0, 2.0);
        let s = collect_status(&provider, Vec::new()).unwrap();
        let v = serde_json::to_value(&s).unwrap();
        assert!(v.get("cpuUsage").is_some());
        assert!(v.get("memoryUsage").is_some());
        assert!(v.get("processes").is_some());
        assert!(v.get("network").is_some());
        assert!(v.get("storage").is_some());
    }
}
