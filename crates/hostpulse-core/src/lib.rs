//! # hostpulse-core
//!
//! Host metrics primitives: a [`MetricsProvider`] that reads CPU, memory,
//! storage, process, and network counters from the OS, and a [`RateSampler`]
//! that turns cumulative network byte counters into true bytes/second rates.
//!
//! ## Quick Start
//!
//! ```no_run
//! use hostpulse_core::{RateSampler, default_provider};
//!
//! let provider = default_provider();
//! let sampler = RateSampler::new();
//!
//! // The first sample only establishes a baseline.
//! let _ = sampler.sample_network(provider.as_ref());
//! std::thread::sleep(std::time::Duration::from_secs(1));
//!
//! for rate in sampler.sample_network(provider.as_ref()).unwrap() {
//!     println!("{}: rx {:.0} B/s, tx {:.0} B/s",
//!         rate.resource_key, rate.receive_rate_bytes_per_sec, rate.send_rate_bytes_per_sec);
//! }
//! ```
//!
//! ## Architecture
//!
//! Provider (one OS call per metric) → RateSampler (per-key delta over time) → JSON
//!
//! The sampler owns its state behind a mutex, so one instance can be shared
//! between a periodic collector and on-demand request handlers.

pub mod error;
pub mod platform;
pub mod provider;
pub mod sampler;
pub mod status;

pub use error::{Error, Result};
pub use platform::{PlatformInfo, SysinfoProvider, default_provider, platform_info};
pub use provider::{MetricsProvider, ProcessInfo, StaticProvider, UsageStat};
pub use sampler::{
    CounterSnapshot, EvictionPolicy, RateSample, RateSampler, UpdateReport,
    unix_ms_now,
};
pub use status::{HostStatus, collect_status};

/// Library version (from Cargo.toml).
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
