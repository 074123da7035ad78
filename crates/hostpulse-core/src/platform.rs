//! Platform detection and the sysinfo-backed metrics provider.
//!
//! [`default_provider`] picks the backend once at startup. OS differences are
//! handled inside [`SysinfoProvider`], so callers never branch on platform.

use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use sysinfo::{Disks, Networks, Pid, Process, ProcessesToUpdate, System};

use crate::error::{Error, Result};
use crate::provider::{MetricsProvider, ProcessInfo, UsageStat};
use crate::sampler::{CounterSnapshot, unix_ms_now};

/// PIDs that are kernel pseudo-processes and cannot be inspected or signalled.
#[cfg(windows)]
const PSEUDO_PIDS: &[u32] = &[0, 4];
#[cfg(not(windows))]
const PSEUDO_PIDS: &[u32] = &[];

/// Metrics provider for the current platform.
pub fn default_provider() -> Arc<dyn MetricsProvider> {
    Arc::new(SysinfoProvider::new())
}

/// Platform information.
pub fn platform_info() -> PlatformInfo {
    PlatformInfo {
        system: std::env::consts::OS.to_string(),
        machine: std::env::consts::ARCH.to_string(),
        family: std::env::consts::FAMILY.to_string(),
    }
}

#[derive(Debug, Clone, serde::Serialize)]
pub struct PlatformInfo {
    pub system: String,
    pub machine: String,
    pub family: String,
}

/// Cross-platform provider on top of the `sysinfo` crate.
///
/// CPU percentages are computed by sysinfo from the difference between two
/// refreshes, so the first `cpu_usage` after construction reports the load
/// since `new()`.
pub struct SysinfoProvider {
    system: Mutex<System>,
}

impl SysinfoProvider {
    pub fn new() -> Self {
        let mut system = System::new();
        // Baseline for the first CPU delta.
        system.refresh_cpu_usage();
        system.refresh_memory();
        Self {
            system: Mutex::new(system),
        }
    }

    fn system(&self) -> MutexGuard<'_, System> {
        self.system.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn refreshed_process<'a>(system: &'a mut System, pid: u32) -> Result<&'a Process> {
        if PSEUDO_PIDS.contains(&pid) {
            return Err(Error::ProcessControl {
                pid,
                reason: "kernel pseudo-process".to_string(),
            });
        }
        let target = Pid::from_u32(pid);
        system.refresh_processes(ProcessesToUpdate::Some(&[target]), true);
        system.process(target).ok_or(Error::ProcessNotFound(pid))
    }
}

impl Default for SysinfoProvider {
    fn default() -> Self {
        Self::new()
    }
}

fn guard_self(pid: u32) -> Result<()> {
    if pid == std::process::id() {
        return Err(Error::ProcessControl {
            pid,
            reason: "refusing to signal the metrics server itself".to_string(),
        });
    }
    Ok(())
}

fn path_string(path: &Path) -> String {
    path.to_string_lossy().into_owned()
}

impl MetricsProvider for SysinfoProvider {
    fn name(&self) -> &'static str {
        "sysinfo"
    }

    fn network_counters(&self) -> Result<Vec<CounterSnapshot>> {
        let networks = Networks::new_with_refreshed_list();
        let taken = unix_ms_now();
        let mut out: Vec<CounterSnapshot> = networks
            .iter()
            .map(|(name, data)| {
                CounterSnapshot::new(
                    name.clone(),
                    data.total_received(),
                    data.total_transmitted(),
                    taken,
                )
            })
            .collect();
        // Zero interfaces is a valid reading: every previously seen key vanished.
        out.sort_by(|a, b| a.resource_key.cmp(&b.resource_key));
        Ok(out)
    }

    fn cpu_usage(&self) -> Result<f64> {
        let mut sys = self.system();
        sys.refresh_cpu_usage();
        if sys.cpus().is_empty() {
            return Err(Error::provider("cpu usage", "no CPUs reported"));
        }
        Ok(f64::from(sys.global_cpu_usage()))
    }

    fn memory_usage(&self) -> Result<f64> {
        let mut sys = self.system();
        sys.refresh_memory();
        let total = sys.total_memory();
        if total == 0 {
            return Err(Error::provider("memory usage", "total memory reported as 0"));
        }
        Ok(sys.used_memory() as f64 / total as f64 * 100.0)
    }

    fn processes(&self) -> Result<Vec<ProcessInfo>> {
        let mut sys = self.system();
        sys.refresh_memory();
        sys.refresh_processes(ProcessesToUpdate::All, true);
        let total_memory = sys.total_memory();

        let mut out: Vec<ProcessInfo> = sys
            .processes()
            .iter()
            .filter(|(pid, _)| !PSEUDO_PIDS.contains(&pid.as_u32()))
            .map(|(pid, p)| ProcessInfo {
                pid: pid.as_u32(),
                name: p.name().to_string_lossy().into_owned(),
                executable: p.exe().map(path_string),
                cpu_percent: f64::from(p.cpu_usage()),
                memory_percent: if total_memory == 0 {
                    0.0
                } else {
                    p.memory() as f64 / total_memory as f64 * 100.0
                },
                status: p.status().to_string(),
                create_time: p.start_time(),
            })
            .collect();
        out.sort_by_key(|p| p.pid);
        Ok(out)
    }

    fn storage_usage(&self) -> Result<Vec<UsageStat>> {
        let disks = Disks::new_with_refreshed_list();
        Ok(disks
            .list()
            .iter()
            .map(|d| {
                UsageStat::from_space(
                    path_string(d.mount_point()),
                    d.total_space(),
                    d.available_space(),
                )
            })
            .collect())
    }

    fn kill_process(&self, pid: u32) -> Result<()> {
        guard_self(pid)?;
        let mut sys = self.system();
        let process = Self::refreshed_process(&mut sys, pid)?;
        if !process.kill() {
            return Err(Error::ProcessControl {
                pid,
                reason: "kill signal was not delivered".to_string(),
            });
        }
        log::info!("killed process {pid}");
        Ok(())
    }

    fn restart_process(&self, pid: u32) -> Result<u32> {
        guard_self(pid)?;
        let mut sys = self.system();
        let process = Self::refreshed_process(&mut sys, pid)?;

        let exe = process.exe().map(Path::to_path_buf).ok_or_else(|| Error::ProcessControl {
            pid,
            reason: "executable path is not visible".to_string(),
        })?;
        let args: Vec<_> = process.cmd().iter().skip(1).cloned().collect();

        if !process.kill() {
            return Err(Error::ProcessControl {
                pid,
                reason: "kill signal was not delivered".to_string(),
            });
        }
        drop(sys);

        let child = std::process::Command::new(&exe)
            .args(&args)
            .spawn()
            .map_err(|e| Error::ProcessControl {
                pid,
                reason: format!("failed to spawn {}: {e}", exe.display()),
            })?;
        log::info!("restarted process {pid} as {}", child.id());
        Ok(child.id())
    }
}
