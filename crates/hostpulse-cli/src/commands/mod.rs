pub mod network;
pub mod serve;
pub mod snapshot;

use std::time::Duration;

use serde::Serialize;

/// Upper bound for any user-supplied window, one day.
const MAX_WINDOW_SEC: f64 = 86_400.0;

/// Validate a `--window-sec`/`--interval-sec` style flag, exiting on garbage.
pub fn parse_window(flag: &str, value: f64, allow_zero: bool) -> Duration {
    let valid = value.is_finite() && (value > 0.0 || (allow_zero && value == 0.0));
    if !valid {
        let bound = if allow_zero { ">= 0" } else { "> 0" };
        eprintln!("Invalid {flag} value: {value}. Expected a finite value {bound}.");
        std::process::exit(2);
    }
    Duration::from_secs_f64(value.min(MAX_WINDOW_SEC))
}

/// Serialize `value` as pretty JSON to `path`, or to stdout when `path` is `None`.
pub fn emit_json<T: Serialize>(value: &T, path: Option<&str>, label: &str) {
    let json = match serde_json::to_string_pretty(value) {
        Ok(j) => j,
        Err(e) => {
            eprintln!("Failed to serialize {label}: {e}");
            std::process::exit(1);
        }
    };
    match path {
        Some(path) => match std::fs::write(path, json) {
            Ok(()) => println!("{label} written to {path}"),
            Err(e) => {
                eprintln!("Failed to write {label} to {path}: {e}");
                std::process::exit(1);
            }
        },
        None => println!("{json}"),
    }
}

/// Unwrap a provider result or exit with its message.
pub fn or_exit<T>(result: hostpulse_core::Result<T>) -> T {
    match result {
        Ok(v) => v,
        Err(e) => {
            eprintln!("Error: {e}");
            std::process::exit(1);
        }
    }
}

/// Human-readable bytes/second with binary units.
pub fn format_rate(bytes_per_sec: f64) -> String {
    let units = ["B/s", "KiB/s", "MiB/s", "GiB/s", "TiB/s"];
    let mut v = bytes_per_sec.abs();
    let mut idx = 0usize;
    while v >= 1024.0 && idx < units.len() - 1 {
        v /= 1024.0;
        idx += 1;
    }
    format!("{v:.2} {}", units[idx])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_rate_small() {
        assert_eq!(format_rate(0.0), "0.00 B/s");
        assert_eq!(format_rate(512.0), "512.00 B/s");
    }

    #[test]
    fn test_format_rate_scales() {
        assert_eq!(format_rate(2048.0), "2.00 KiB/s");
        assert_eq!(format_rate(3.0 * 1024.0 * 1024.0), "3.00 MiB/s");
    }

    #[test]
    fn test_format_rate_caps_at_largest_unit() {
        let huge = 4.0 * 1024f64.powi(5);
        assert_eq!(format_rate(huge), "4096.00 TiB/s");
    }

    #[test]
    fn test_parse_window_accepts_positive() {
        assert_eq!(parse_window("--window-sec", 1.5, false), Duration::from_millis(1500));
    }

    #[test]
    fn test_parse_window_zero_when_allowed() {
        assert_eq!(parse_window("--interval-sec", 0.0, true), Duration::ZERO);
    }

    #[test]
    fn test_parse_window_clamps() {
        assert_eq!(
            parse_window("--window-sec", 1e9, false),
            Duration::from_secs(86_400)
        );
    }
}
