//! Error taxonomy shared by the sampler, the metrics provider, and the server.

use thiserror::Error;

/// Errors produced by hostpulse operations.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum Error {
    /// Non-positive elapsed time between two snapshots of the same resource.
    ///
    /// Fatal only to that resource's rate for the current cycle.
    #[error("invalid sampling window for '{resource}': {elapsed_ms} ms elapsed")]
    InvalidWindow { resource: String, elapsed_ms: i128 },

    /// The OS metrics source could not produce a value.
    #[error("metrics provider failed to read {metric}: {reason}")]
    Provider { metric: &'static str, reason: String },

    /// No process with this PID is visible to the provider.
    #[error("no process with pid {0}")]
    ProcessNotFound(u32),

    /// The process exists but could not be signalled or re-spawned.
    #[error("process control failed for pid {pid}: {reason}")]
    ProcessControl { pid: u32, reason: String },
}

impl Error {
    pub(crate) fn provider(metric: &'static str, reason: impl Into<String>) -> Self {
        Self::Provider {
            metric,
            reason: reason.into(),
        }
    }
}

/// Result alias used across hostpulse crates.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_window_message_names_resource() {
        let e = Error::InvalidWindow {
            resource: "eth0".to_string(),
            elapsed_ms: 0,
        };
        assert_eq!(
            e.to_string(),
            "invalid sampling window for 'eth0': 0 ms elapsed"
        );
    }

    #[test]
    fn provider_helper_builds_variant() {
        let e = Error::provider("network counters", "no interfaces");
        assert!(matches!(
            e,
            Error::Provider {
                metric: "network counters",
                ..
            }
        ));
        assert!(e.to_string().contains("no interfaces"));
    }
}
