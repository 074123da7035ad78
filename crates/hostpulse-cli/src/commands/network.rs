//! `hostpulse network`: two counter samples through a [`RateSampler`], one
//! window apart.

use hostpulse_core::{MetricsProvider, RateSample, RateSampler, default_provider};

use super::{emit_json, format_rate, or_exit, parse_window};

/// Take a baseline, wait `window`, and return the rates for the window.
pub fn measure(provider: &dyn MetricsProvider, window: std::time::Duration) -> Vec<RateSample> {
    let sampler = RateSampler::new();
    or_exit(sampler.sample_network(provider));
    std::thread::sleep(window);
    let mut rates = or_exit(sampler.sample_network(provider));
    rates.sort_by(|a, b| a.resource_key.cmp(&b.resource_key));
    rates
}

pub fn print_table(rates: &[RateSample]) {
    println!("\n{:=<62}", "");
    println!("{:<20} {:>19} {:>19}", "Interface", "RX", "TX");
    println!("{:-<62}", "");
    for r in rates {
        println!(
            "{:<20} {:>19} {:>19}",
            r.resource_key,
            format_rate(r.receive_rate_bytes_per_sec),
            format_rate(r.send_rate_bytes_per_sec)
        );
    }
    if let Some(first) = rates.first() {
        println!("{:-<62}", "");
        println!("window: {:.2}s", first.window_seconds);
    }
}

pub fn run(window_sec: f64, json: bool, output_path: Option<&str>) {
    let window = parse_window("--window-sec", window_sec, false);
    let provider = default_provider();

    if !json {
        println!("Sampling network counters over {:.2}s...", window.as_secs_f64());
    }
    let rates = measure(provider.as_ref(), window);

    if json || output_path.is_some() {
        emit_json(&rates, output_path, "Network rates");
    }
    if !json {
        print_table(&rates);
    }
}
