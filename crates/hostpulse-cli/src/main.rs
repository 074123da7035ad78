//! CLI for hostpulse: host metrics over HTTP or straight to the terminal.

mod commands;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "hostpulse")]
#[command(about = "hostpulse: CPU, memory, disk, process, and network rates as JSON")]
#[command(version = hostpulse_core::VERSION)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP metrics server
    Serve {
        /// Port to listen on
        #[arg(long, default_value = "8080")]
        port: u16,

        /// Bind address
        #[arg(long, default_value = "127.0.0.1")]
        host: String,

        /// Network sampling period in seconds (0 = sample on each /network request)
        #[arg(long, default_value = "5")]
        interval_sec: f64,

        /// Forget interfaces unseen for this many sampling cycles (0 = keep forever)
        #[arg(long, default_value = "0")]
        evict_after: u32,

        /// Directory served for paths that match no API route
        #[arg(long, default_value = "static")]
        static_dir: String,

        /// Enable POST /processes/{pid}/kill and /processes/{pid}/restart
        #[arg(long)]
        allow_process_control: bool,
    },

    /// Print one combined status document (CPU, memory, processes, network, storage)
    Status {
        /// Seconds between the two network samples used for rates
        #[arg(long, default_value = "1.0")]
        window_sec: f64,

        /// Write JSON to path instead of stdout
        #[arg(long)]
        output: Option<String>,
    },

    /// Measure per-interface network rates over a window
    Network {
        /// Window duration in seconds
        #[arg(long, default_value = "1.0")]
        window_sec: f64,

        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,

        /// Write JSON to path.
        #[arg(long)]
        output: Option<String>,
    },

    /// List running processes as JSON
    Processes {
        /// Write JSON to path instead of stdout
        #[arg(long)]
        output: Option<String>,
    },

    /// Show per-partition storage usage as JSON
    Storage {
        /// Write JSON to path instead of stdout
        #[arg(long)]
        output: Option<String>,
    },
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Serve {
            port,
            host,
            interval_sec,
            evict_after,
            static_dir,
            allow_process_control,
        } => commands::serve::run(commands::serve::ServeCommandConfig {
            host: &host,
            port,
            interval_sec,
            evict_after,
            static_dir: &static_dir,
            allow_process_control,
        }),
        Commands::Status { window_sec, output } => {
            commands::snapshot::run_status(window_sec, output.as_deref())
        }
        Commands::Network {
            window_sec,
            json,
            output,
        } => commands::network::run(window_sec, json, output.as_deref()),
        Commands::Processes { output } => commands::snapshot::run_processes(output.as_deref()),
        Commands::Storage { output } => commands::snapshot::run_storage(output.as_deref()),
    }
}
