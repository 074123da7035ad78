//! Integration tests for hostpulse-core.
//!
//! These tests drive the full sampling pipeline through the public API:
//! provider → rate sampler → status document.

use hostpulse_core::{
    CounterSnapshot, Error, EvictionPolicy, MetricsProvider, RateSampler, StaticProvider,
    SysinfoProvider, UsageStat, collect_status, default_provider,
};

fn eth0(rx: u64, tx: u64, t_secs: u64) -> CounterSnapshot {
    CounterSnapshot::new("eth0", rx, tx, t_secs * 1000)
}

#[test]
fn baseline_then_rate_then_reset() {
    let sampler = RateSampler::new();

    let out = sampler.update(&[eth0(1000, 500, 0)], 0);
    assert!(out.is_empty(), "first sighting must not produce a rate");

    let out = sampler.update(&[eth0(3000, 1500, 10)], 10_000);
    assert_eq!(out.len(), 1);
    assert_eq!(out[0].resource_key, "eth0");
    assert!((out[0].receive_rate_bytes_per_sec - 200.0).abs() < 1e-9);
    assert!((out[0].send_rate_bytes_per_sec - 100.0).abs() < 1e-9);

    let out = sampler.update(&[eth0(100, 50, 20)], 20_000);
    assert_eq!(out.len(), 1);
    assert!((out[0].receive_rate_bytes_per_sec - 10.0).abs() < 1e-9);
    assert!((out[0].send_rate_bytes_per_sec - 5.0).abs() < 1e-9);
}

#[test]
fn rates_are_never_negative() {
    let sampler = RateSampler::new();
    let mut t = 0;
    let mut rx = 10_000u64;
    sampler.update(&[eth0(rx, rx, t)], t * 1000);
    for _ in 0..20 {
        t += 1;
        rx = rx.wrapping_mul(7).wrapping_add(13) % 50_000;
        for r in sampler.update(&[eth0(rx, rx / 2, t)], t * 1000) {
            assert!(r.receive_rate_bytes_per_sec >= 0.0);
            assert!(r.send_rate_bytes_per_sec >= 0.0);
            assert!(r.window_seconds > 0.0);
        }
    }
}

#[test]
fn interface_churn_is_not_an_error() {
    let sampler = RateSampler::with_eviction(EvictionPolicy::AfterMissedCycles(3));
    sampler.update(
        &[
            CounterSnapshot::new("eth0", 0, 0, 0),
            CounterSnapshot::new("wg0", 0, 0, 0),
        ],
        0,
    );
    let report = sampler.update_with_report(
        &[
            CounterSnapshot::new("eth0", 500, 500, 5_000),
            CounterSnapshot::new("veth1", 1, 1, 5_000),
        ],
        5_000,
    );
    assert!(report.rejected.is_empty());
    assert_eq!(report.samples.len(), 1);
    assert_eq!(report.samples[0].resource_key, "eth0");
    assert_eq!(report.first_seen, vec!["veth1".to_string()]);
    assert_eq!(sampler.tracked(), 3);
}

#[test]
fn repeated_timestamp_is_invalid_window() {
    let sampler = RateSampler::new();
    sampler.update(&[eth0(1, 1, 3)], 3_000);
    let report = sampler.update_with_report(&[eth0(2, 2, 3)], 3_000);
    assert!(report.samples.is_empty());
    assert!(matches!(
        report.rejected.as_slice(),
        [Error::InvalidWindow { resource, .. }] if resource == "eth0"
    ));
    assert_eq!(sampler.stored("eth0"), Some(eth0(1, 1, 3)));
}

#[test]
fn status_from_scripted_provider() {
    let provider = StaticProvider::new(33.0, 66.0)
        .with_storage(vec![UsageStat::from_space("/data", 4096, 1024)]);
    provider.push_network(vec![eth0(0, 0, 0)]);
    provider.push_network(vec![eth0(4000, 2000, 2)]);

    let sampler = RateSampler::new();
    sampler.sample_network(&provider).unwrap();
    let rates = sampler.sample_network(&provider).unwrap();

    let status = collect_status(&provider, rates).unwrap();
    assert_eq!(status.cpu_usage, 33.0);
    assert_eq!(status.network.len(), 1);
    assert!((status.network[0].receive_rate_bytes_per_sec - 2000.0).abs() < 1e-9);
    assert_eq!(status.storage_usage[0].used, 3072);
}

#[test]
fn default_provider_reports_a_backend() {
    let provider = default_provider();
    assert_eq!(provider.name(), "sysinfo");
}

#[test]
#[ignore] // Run with: cargo test -- --ignored
fn live_network_rates_are_finite() {
    let provider = SysinfoProvider::new();
    let sampler = RateSampler::new();
    let first = sampler.sample_network(&provider).unwrap();
    assert!(first.is_empty());
    std::thread::sleep(std::time::Duration::from_millis(250));
    for rate in sampler.sample_network(&provider).unwrap() {
        assert!(rate.receive_rate_bytes_per_sec.is_finite());
        assert!(rate.send_rate_bytes_per_sec.is_finite());
    }
}

#[test]
#[ignore] // Run with: cargo test -- --ignored
fn live_storage_has_partitions() {
    let provider = SysinfoProvider::new();
    let storage = provider.storage_usage().unwrap();
    for u in storage {
        assert!(u.used <= u.total);
        assert!((0.0..=100.0).contains(&u.used_percent));
    }
}
