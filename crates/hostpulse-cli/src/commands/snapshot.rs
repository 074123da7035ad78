//! One-shot JSON commands: `status`, `processes`, `storage`.

use hostpulse_core::{collect_status, default_provider};

use super::{emit_json, or_exit, parse_window};

pub fn run_status(window_sec: f64, output_path: Option<&str>) {
    let window = parse_window("--window-sec", window_sec, false);
    let provider = default_provider();
    let network = super::network::measure(provider.as_ref(), window);
    let status = or_exit(collect_status(provider.as_ref(), network));
    emit_json(&status, output_path, "Host status");
}

pub fn run_processes(output_path: Option<&str>) {
    let provider = default_provider();
    let processes = or_exit(provider.processes());
    emit_json(&processes, output_path, "Process list");
}

pub fn run_storage(output_path: Option<&str>) {
    let provider = default_provider();
    let storage = or_exit(provider.storage_usage());
    emit_json(&storage, output_path, "Storage usage");
}
