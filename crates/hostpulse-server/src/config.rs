//! Server configuration.

use std::path::PathBuf;
use std::time::Duration;

use hostpulse_core::EvictionPolicy;

/// Settings for [`crate::run_server`].
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Collector period. `Duration::ZERO` disables the collector and samples
    /// network counters on each `/network` request instead.
    pub sample_interval: Duration,
    /// Evict interfaces unseen for this many cycles; 0 keeps them forever.
    pub evict_after_cycles: u32,
    /// Directory served for paths that match no API route.
    pub static_dir: PathBuf,
    /// Enable `POST /processes/{pid}/kill` and `/restart`.
    pub allow_process_control: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8080,
            sample_interval: Duration::from_secs(5),
            evict_after_cycles: 0,
            static_dir: PathBuf::from("static"),
            allow_process_control: false,
        }
    }
}

impl ServerConfig {
    /// `host:port` bind address.
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn eviction(&self) -> EvictionPolicy {
        EvictionPolicy::from_cycles(self.evict_after_cycles)
    }

    pub fn collector_enabled(&self) -> bool {
        !self.sample_interval.is_zero()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let c = ServerConfig::default();
        assert_eq!(c.addr(), "127.0.0.1:8080");
        assert_eq!(c.sample_interval, Duration::from_secs(5));
        assert_eq!(c.eviction(), EvictionPolicy::KeepForever);
        assert!(c.collector_enabled());
        assert!(!c.allow_process_control);
    }

    #[test]
    fn zero_interval_disables_collector() {
        let c = ServerConfig {
            sample_interval: Duration::ZERO,
            evict_after_cycles: 4,
            ..ServerConfig::default()
        };
        assert!(!c.collector_enabled());
        assert_eq!(c.eviction(), EvictionPolicy::AfterMissedCycles(4));
    }
}
