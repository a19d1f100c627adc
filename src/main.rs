//! rpc-balancer command line.
//!
//! ```text
//! config file ──▶ BalancerConfig ──▶ WrrPickerBuilder ──▶ Balancer
//!                       ▲                                    │
//!      watch: file edit │                          simulate / stats / watch
//! ```

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::{Parser, Subcommand};
use rand::SeedableRng;
use rand::rngs::StdRng;
use serde::Serialize;

use rpc_balancer::config::watcher::ConfigWatcher;
use rpc_balancer::config::{load_config, BalancerConfig, LiveConfig};
use rpc_balancer::lifecycle::{signals, Shutdown};
use rpc_balancer::load_balancer::{Balancer, DefaultColor, PickerBuilder, WrrPicker, WrrPickerBuilder};
use rpc_balancer::observability::{logging, metrics};
use rpc_balancer::simulation::{self, SimulationOptions};

#[derive(Parser)]
#[command(name = "rpc-balancer")]
#[command(about = "Weighted, color-aware RPC picker", long_about = None)]
struct Cli {
    /// Path to the TOML configuration.
    #[arg(short, long, default_value = "rpc-balancer.toml")]
    config: PathBuf,

    /// Process-wide default color; overrides `balancer.default_color`.
    #[arg(long, env = "DEPLOY_COLOR")]
    color: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run synthetic calls and print the selection report
    Simulate {
        #[arg(short = 'n', long, default_value_t = 100)]
        calls: usize,

        /// Color attached to every call
        #[arg(long)]
        call_color: Option<String>,

        /// Probability that a call fails
        #[arg(long, default_value_t = 0.0)]
        error_rate: f64,

        /// RNG seed for reproducible runs
        #[arg(long, default_value_t = 0)]
        seed: u64,
    },
    /// Print the group layout built from the config
    Stats,
    /// Keep a picker in sync with the config file and report stats
    Watch,
}

#[derive(Serialize)]
struct GroupLayout {
    color: String,
    total_weight: i64,
    members: Vec<MemberLayout>,
}

#[derive(Serialize)]
struct MemberLayout {
    address: String,
    weight: u32,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let config = load_config(&cli.config)?;

    if let Err(e) = logging::init_logging(&config.observability) {
        eprintln!("Failed to initialize logging: {}", e);
    }

    let default_color = DefaultColor::new(cli.color.clone().or_else(|| config.balancer.default_color.clone()));
    tracing::info!(
        config = %cli.config.display(),
        backends = config.backends.len(),
        default_color = ?default_color.get(),
        "Configuration loaded"
    );

    let builder = WrrPickerBuilder::new(config.balancer.builder_options())
        .with_default_color(default_color);

    match cli.command {
        Commands::Simulate {
            calls,
            call_color,
            error_rate,
            seed,
        } => {
            let picker: WrrPicker<String> = builder.build(config.ready_set());
            let options = SimulationOptions {
                calls,
                color: call_color,
                error_rate,
                ..SimulationOptions::default()
            };
            let report = simulation::run(&picker, &options, &mut StdRng::seed_from_u64(seed));
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        Commands::Stats => {
            let picker: WrrPicker<String> = builder.build(config.ready_set());
            let layout: Vec<GroupLayout> = picker
                .groups()
                .into_iter()
                .map(|g| GroupLayout {
                    color: g.color().to_string(),
                    total_weight: g.total_weight(),
                    members: g
                        .members()
                        .iter()
                        .map(|m| MemberLayout {
                            address: m.address().to_string(),
                            weight: m.weight(),
                        })
                        .collect(),
                })
                .collect();
            println!("{}", serde_json::to_string_pretty(&layout)?);
        }
        Commands::Watch => watch(cli.config, config, builder, cli.color.is_some()).await?,
    }

    Ok(())
}

async fn watch(
    path: PathBuf,
    config: BalancerConfig,
    builder: WrrPickerBuilder,
    pinned_color: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    if config.observability.metrics_enabled {
        let addr = config.observability.metrics_address.parse()?;
        metrics::init_metrics(addr)?;
    }

    let balancer: Arc<Balancer<String>> = Arc::new(Balancer::new(builder));
    let mut live = LiveConfig::new(balancer.clone(), pinned_color, config.clone());

    let shutdown = Shutdown::new();
    tokio::spawn(signals::shutdown_on_signal(shutdown.clone()));

    let (watcher, mut updates) = ConfigWatcher::new(&path);
    let watcher = watcher.with_current(config.clone());
    // Dropping the watcher stops notifications.
    let _watcher = watcher.run()?;

    let mut ticker = stats_ticker(&config);
    let mut stop = shutdown.subscribe();

    loop {
        tokio::select! {
            Some(new_config) = updates.recv() => {
                if live.apply(new_config).stats_interval_changed {
                    ticker = stats_ticker(live.current());
                }
            }
            _ = ticker.tick() => {
                for stats in balancer.picker().stats() {
                    metrics::record_backend_stats(&stats);
                    tracing::debug!(
                        address = %stats.address,
                        color = %stats.color,
                        weight = stats.weight,
                        picks = stats.picks,
                        errors = stats.errors,
                        requests = stats.requests,
                        mean_latency_ms = stats.mean_latency_ms,
                        "Backend stats"
                    );
                }
            }
            _ = stop.recv() => {
                tracing::info!("Watch loop received shutdown signal, exiting");
                break;
            }
        }
    }

    Ok(())
}

fn stats_ticker(config: &BalancerConfig) -> tokio::time::Interval {
    tokio::time::interval(Duration::from_secs(config.balancer.stats_interval_secs.max(1)))
}
