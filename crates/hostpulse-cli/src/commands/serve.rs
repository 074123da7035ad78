use std::path::PathBuf;

use hostpulse_server::ServerConfig;

pub struct ServeCommandConfig<'a> {
    pub host: &'a str,
    pub port: u16,
    pub interval_sec: f64,
    pub evict_after: u32,
    pub static_dir: &'a str,
    pub allow_process_control: bool,
}

pub fn server_config(cfg: &ServeCommandConfig<'_>) -> ServerConfig {
    ServerConfig {
        host: cfg.host.to_string(),
        port: cfg.port,
        sample_interval: super::parse_window("--interval-sec", cfg.interval_sec, true),
        evict_after_cycles: cfg.evict_after,
        static_dir: PathBuf::from(cfg.static_dir),
        allow_process_control: cfg.allow_process_control,
    }
}

pub fn run(cfg: ServeCommandConfig<'_>) {
    let config = server_config(&cfg);
    let provider = hostpulse_core::default_provider();

    let base = format!("http://{}", config.addr());

    println!("hostpulse server v{}", hostpulse_core::VERSION);
    println!("   {base}");
    println!("   provider: {}", provider.name());
    if config.collector_enabled() {
        println!(
            "   network sampled every {:.2}s",
            config.sample_interval.as_secs_f64()
        );
    } else {
        println!("   network sampled on each /network request");
    }
    println!();
    println!("   Endpoints:");
    println!("     GET  /                        Dashboard from the static directory");
    println!("     GET  /api                     API index (try: curl {base}/api)");
    println!("     GET  /status                  Combined host status");
    println!("     GET  /cpu                     CPU usage percent");
    println!("     GET  /memory                  Memory usage percent");
    println!("     GET  /network                 Per-interface rx/tx bytes per second");
    println!("     GET  /network/raw             Cumulative per-interface counters");
    println!("     GET  /storage                 Per-partition usage");
    println!("     GET  /processes               Running processes");
    println!("     POST /processes/{{pid}}/kill");
    println!("     POST /processes/{{pid}}/restart");
    if !config.allow_process_control {
        println!("     (process control requires --allow-process-control)");
    }
    println!("   Static files: {}", config.static_dir.display());
    println!();

    let rt = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(e) => {
            eprintln!("Failed to start async runtime: {e}");
            std::process::exit(1);
        }
    };
    if let Err(e) = rt.block_on(hostpulse_server::run_server(provider, &config)) {
        log::error!("server stopped: {e}");
        std::process::exit(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hostpulse_core::EvictionPolicy;

    #[test]
    fn test_server_config_from_flags() {
        let cfg = ServeCommandConfig {
            host: "0.0.0.0",
            port: 9000,
            interval_sec: 2.5,
            evict_after: 3,
            static_dir: "public",
            allow_process_control: true,
        };
        let config = server_config(&cfg);
        assert_eq!(config.addr(), "0.0.0.0:9000");
        assert_eq!(config.sample_interval.as_millis(), 2500);
        assert_eq!(config.eviction(), EvictionPolicy::AfterMissedCycles(3));
        assert_eq!(config.static_dir, PathBuf::from("public"));
        assert!(config.allow_process_control);
    }

    #[test]
    fn test_zero_interval_means_on_request() {
        let cfg = ServeCommandConfig {
            host: "127.0.0.1",
            port: 8080,
            interval_sec: 0.0,
            evict_after: 0,
            static_dir: "static",
            allow_process_control: false,
        };
        assert!(!server_config(&cfg).collector_enabled());
    }
}
