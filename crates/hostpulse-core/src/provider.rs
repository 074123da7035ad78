//! Metrics provider trait and the data it returns.
//!
//! Every OS backend implements [`MetricsProvider`]. Each method is one fetch of
//! one metric; nothing is cached between calls. [`StaticProvider`] is a
//! scripted in-memory backend for tests and offline demos.

use std::collections::VecDeque;
use std::sync::{Mutex, PoisonError};

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::sampler::CounterSnapshot;

/// One running process.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProcessInfo {
    pub pid: u32,
    pub name: String,
    /// Path of the executable, when the OS exposes it.
    pub executable: Option<String>,
    pub cpu_percent: f64,
    pub memory_percent: f64,
    pub status: String,
    /// Start time in seconds since the Unix epoch.
    pub create_time: u64,
}

/// Space usage of one mounted partition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UsageStat {
    pub path: String,
    pub total: u64,
    pub used: u64,
    pub free: u64,
    pub used_percent: f64,
}

impl UsageStat {
    /// Build from total and available bytes; `used_percent` is 0 for empty partitions.
    pub fn from_space(path: impl Into<String>, total: u64, free: u64) -> Self {
        let used = total.saturating_sub(free);
        let used_percent = if total == 0 {
            0.0
        } else {
            used as f64 / total as f64 * 100.0
        };
        Self {
            path: path.into(),
            total,
            used,
            free,
            used_percent,
        }
    }
}

/// Source of raw host metrics.
///
/// Implementations must be shareable between the collector task and request
/// handlers, so every method takes `&self`.
pub trait MetricsProvider: Send + Sync {
    /// Short backend name for logs and the API index.
    fn name(&self) -> &'static str;

    /// Cumulative byte counters for every network interface, all stamped
    /// with the same instant.
    fn network_counters(&self) -> Result<Vec<CounterSnapshot>>;

    /// Global CPU usage in percent (0–100).
    fn cpu_usage(&self) -> Result<f64>;

    /// Used memory in percent (0–100).
    fn memory_usage(&self) -> Result<f64>;

    /// Every process visible to this user.
    fn processes(&self) -> Result<Vec<ProcessInfo>>;

    /// Usage for each mounted partition.
    fn storage_usage(&self) -> Result<Vec<UsageStat>>;

    /// Terminate `pid`.
    fn kill_process(&self, pid: u32) -> Result<()>;

    /// Terminate `pid` and start its executable again with the same
    /// arguments. Returns the PID of the new process.
    fn restart_process(&self, pid: u32) -> Result<u32>;
}

/// Scripted provider: network counters are served from a queue, everything
/// else from fixed values.
#[derive(Debug, Default)]
pub struct StaticProvider {
    network: Mutex<VecDeque<Vec<CounterSnapshot>>>,
    cpu: f64,
    memory: f64,
    processes: Mutex<Vec<ProcessInfo>>,
    storage: Vec<UsageStat>,
}

impl StaticProvider {
    pub fn new(cpu: f64, memory: f64) -> Self {
        Self {
            cpu,
            memory,
            ..Self::default()
        }
    }

    pub fn with_processes(mut self, processes: Vec<ProcessInfo>) -> Self {
        self.processes = Mutex::new(processes);
        self
    }

    pub fn with_storage(mut self, storage: Vec<UsageStat>) -> Self {
        self.storage = storage;
        self
    }

    /// Queue the counters returned by the next `network_counters` call.
    pub fn push_network(&self, counters: Vec<CounterSnapshot>) {
        self.network
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push_back(counters);
    }

    fn with_process_list<T>(&self, f: impl FnOnce(&mut Vec<ProcessInfo>) -> T) -> T {
        let mut procs = self.processes.lock().unwrap_or_else(PoisonError::into_inner);
        f(&mut procs)
    }
}

impl MetricsProvider for StaticProvider {
    fn name(&self) -> &'static str {
        "static"
    }

    fn network_counters(&self) -> Result<Vec<CounterSnapshot>> {
        self.network
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .pop_front()
            .ok_or_else(|| Error::provider("network counters", "no scripted counters left"))
    }

    fn cpu_usage(&self) -> Result<f64> {
        Ok(self.cpu)
    }

    fn memory_usage(&self) -> Result<f64> {
        Ok(self.memory)
    }

    fn processes(&self) -> Result<Vec<ProcessInfo>> {
        Ok(self.with_process_list(|p| p.clone()))
    }

    fn storage_usage(&self) -> Result<Vec<UsageStat>> {
        Ok(self.storage.clone())
    }

    fn kill_process(&self, pid: u32) -> Result<()> {
        self.with_process_list(|procs| -> Result<()> {
            let idx = procs
                .iter()
                .position(|p| p.pid == pid)
                .ok_or(Error::ProcessNotFound(pid))?;
            procs.remove(idx);
            Ok(())
        })
    }

    fn restart_process(&self, pid: u32) -> Result<u32> {
        self.with_process_list(|procs| -> Result<u32> {
            let idx = procs
                .iter()
                .position(|p| p.pid == pid)
                .ok_or(Error::ProcessNotFound(pid))?;
            let new_pid = procs.iter().map(|p| p.pid).max().unwrap_or(pid) + 1;
            let mut restarted = procs.remove(idx);
            restarted.pid = new_pid;
            procs.push(restarted);
            Ok(new_pid)
        })
    }
}
