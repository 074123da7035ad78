//! Per-resource rate sampling over cumulative byte counters.
//!
//! A [`RateSampler`] remembers the last [`CounterSnapshot`] seen for every
//! resource key (typically a network interface name). Each call to
//! [`RateSampler::update`] pairs the new snapshots with the stored ones by key
//! and turns the counter deltas into bytes/second rates:
//!
//! - a key seen for the first time is stored and produces no rate,
//! - a key that vanished produces no rate and is kept or evicted according to
//!   the [`EvictionPolicy`],
//! - a counter that went backwards (interface reset, wraparound, restart) is
//!   treated as having restarted from zero, so the delta is the current value,
//! - a non-positive elapsed time rejects that key with
//!   [`Error::InvalidWindow`] and leaves its stored snapshot untouched.
//!
//! Resource sets may differ freely between calls; mismatches never fail the
//! batch.

use std::collections::{HashMap, HashSet};
use std::sync::{Mutex, PoisonError};
use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::provider::MetricsProvider;

/// Cumulative counters for one resource at one instant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CounterSnapshot {
    #[serde(rename = "interface")]
    pub resource_key: String,
    #[serde(rename = "rxBytes")]
    pub received_bytes: u64,
    #[serde(rename = "txBytes")]
    pub sent_bytes: u64,
    #[serde(rename = "takenUnixMs")]
    pub taken_unix_ms: u64,
}

impl CounterSnapshot {
    pub fn new(
        resource_key: impl Into<String>,
        received_bytes: u64,
        sent_bytes: u64,
        taken_unix_ms: u64,
    ) -> Self {
        Self {
            resource_key: resource_key.into(),
            received_bytes,
            sent_bytes,
            taken_unix_ms,
        }
    }
}

/// Bytes/second rates for one resource over one sampling window.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RateSample {
    #[serde(rename = "interface")]
    pub resource_key: String,
    #[serde(rename = "rxBytesPerSec")]
    pub receive_rate_bytes_per_sec: f64,
    #[serde(rename = "txBytesPerSec")]
    pub send_rate_bytes_per_sec: f64,
    #[serde(rename = "windowSeconds")]
    pub window_seconds: f64,
}

/// What to do with stored entries whose resource stopped appearing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EvictionPolicy {
    /// Keep the last snapshot forever. Memory grows with resource churn.
    #[default]
    KeepForever,
    /// Drop an entry once it has been absent for this many consecutive updates.
    AfterMissedCycles(u32),
}

impl EvictionPolicy {
    /// `0` means keep forever, anything else evicts after that many misses.
    pub fn from_cycles(cycles: u32) -> Self {
        if cycles == 0 {
            Self::KeepForever
        } else {
            Self::AfterMissedCycles(cycles)
        }
    }
}

#[derive(Debug, Clone)]
struct StoredEntry {
    snapshot: CounterSnapshot,
    missed_cycles: u32,
}

/// Last observed snapshot per resource key.
#[derive(Debug, Default)]
struct SamplerState {
    entries: HashMap<String, StoredEntry>,
}

/// Result of one [`RateSampler::update_with_report`] call.
#[derive(Debug, Clone, Default)]
pub struct UpdateReport {
    /// Rates for every key that had usable history.
    pub samples: Vec<RateSample>,
    /// Keys skipped this cycle, always [`Error::InvalidWindow`].
    pub rejected: Vec<Error>,
    /// Keys stored for the first time (no rate yet).
    pub first_seen: Vec<String>,
    /// Keys dropped by the eviction policy.
    pub evicted: Vec<String>,
}

/// Thread-safe rate sampler. One instance per counter family.
#[derive(Debug, Default)]
pub struct RateSampler {
    state: Mutex<SamplerState>,
    eviction: EvictionPolicy,
}

impl RateSampler {
    /// Sampler that keeps vanished resources forever.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_eviction(eviction: EvictionPolicy) -> Self {
        Self {
            state: Mutex::new(SamplerState::default()),
            eviction,
        }
    }

    /// Feed a full set of current snapshots and return the computed rates.
    ///
    /// Rejected keys are logged and omitted; see [`Self::update_with_report`].
    pub fn update(&self, current: &[CounterSnapshot], now_unix_ms: u64) -> Vec<RateSample> {
        self.update_with_report(current, now_unix_ms).samples
    }

    /// Like [`Self::update`], but also reports rejected, new, and evicted keys.
    ///
    /// The read-compute-write over the stored state happens under a single
    /// lock, so concurrent callers observe whole updates only.
    pub fn update_with_report(&self, current: &[CounterSnapshot], now_unix_ms: u64) -> UpdateReport {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        let mut report = UpdateReport::default();
        let mut seen: HashSet<&str> = HashSet::with_capacity(current.len());

        for snap in current {
            let key = snap.resource_key.as_str();
            seen.insert(key);

            let Some(prev) = state.entries.get_mut(key) else {
                log::debug!("first sighting of '{key}', storing baseline");
                report.first_seen.push(key.to_string());
                state.entries.insert(
                    key.to_string(),
                    StoredEntry {
                        snapshot: stamped(snap, now_unix_ms),
                        missed_cycles: 0,
                    },
                );
                continue;
            };

            match compute_rate(&prev.snapshot, snap, now_unix_ms) {
                Ok(sample) => {
                    report.samples.push(sample);
                    prev.snapshot = stamped(snap, now_unix_ms);
                    prev.missed_cycles = 0;
                }
                Err(e) => {
                    log::warn!("skipping rate for '{key}': {e}");
                    prev.missed_cycles = 0;
                    report.rejected.push(e);
                }
            }
        }

        if let EvictionPolicy::AfterMissedCycles(limit) = self.eviction {
            let mut evicted = Vec::new();
            for (key, entry) in state.entries.iter_mut() {
                if seen.contains(key.as_str()) {
                    continue;
                }
                entry.missed_cycles = entry.missed_cycles.saturating_add(1);
                if entry.missed_cycles >= limit {
                    evicted.push(key.clone());
                }
            }
            for key in &evicted {
                log::debug!("evicting '{key}' after {limit} missed cycles");
                state.entries.remove(key);
            }
            evicted.sort();
            report.evicted = evicted;
        }

        report
    }

    /// Fetch network counters from `provider` and run one update with them.
    ///
    /// A provider failure is returned as-is and leaves the stored state
    /// untouched, so the next good cycle still has a valid baseline.
    pub fn sample_network(&self, provider: &dyn MetricsProvider) -> Result<Vec<RateSample>> {
        let counters = provider.network_counters()?;
        let now = counters
            .first()
            .map(|c| c.taken_unix_ms)
            .unwrap_or_else(unix_ms_now);
        Ok(self.update(&counters, now))
    }

    /// Copy of the stored snapshot for `key`.
    pub fn stored(&self, key: &str) -> Option<CounterSnapshot> {
        let state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        state.entries.get(key).map(|e| e.snapshot.clone())
    }

    /// Number of resources currently tracked.
    pub fn tracked(&self) -> usize {
        self.state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .entries
            .len()
    }
}

fn stamped(snap: &CounterSnapshot, now_unix_ms: u64) -> CounterSnapshot {
    CounterSnapshot {
        taken_unix_ms: now_unix_ms,
        ..snap.clone()
    }
}

/// Counter delta with reset recovery: a decrease means the counter restarted
/// from zero, so everything counted since is the current value.
fn counter_delta(previous: u64, current: u64) -> u64 {
    if current >= previous {
        current - previous
    } else {
        current
    }
}

fn compute_rate(prev: &CounterSnapshot, cur: &CounterSnapshot, now_unix_ms: u64) -> Result<RateSample> {
    let elapsed_ms = i128::from(now_unix_ms) - i128::from(prev.taken_unix_ms);
    if elapsed_ms <= 0 {
        return Err(Error::InvalidWindow {
            resource: cur.resource_key.clone(),
            elapsed_ms,
        });
    }
    let window_seconds = elapsed_ms as f64 / 1000.0;

    let rx = counter_delta(prev.received_bytes, cur.received_bytes) as f64;
    let tx = counter_delta(prev.sent_bytes, cur.sent_bytes) as f64;

    Ok(RateSample {
        resource_key: cur.resource_key.clone(),
        receive_rate_bytes_per_sec: rx.max(0.0) / window_seconds,
        send_rate_bytes_per_sec: tx.max(0.0) / window_seconds,
        window_seconds,
    })
}

/// Milliseconds since the Unix epoch, `0` if the clock is before it.
pub fn unix_ms_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}
