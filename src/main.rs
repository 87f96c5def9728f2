//! Netpulse Binary Entry Point
//!
//! Loads the configuration, builds the CloudWatch sink, and runs the
//! probe-and-publish loop until the process is killed.

use clap::Parser;
use netpulse::{AppConfig, CloudWatchSink, Scheduler};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Netpulse - Periodic Network-Health Probe
#[derive(Parser, Debug)]
#[command(name = "netpulse", version, about, long_about = None)]
struct Cli {
    /// Path to configuration file
    #[arg(short, long)]
    filename: String,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,netpulse=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();

    tracing::info!("Loading configuration from: {}", cli.filename);
    let config = AppConfig::load(&cli.filename)?;

    tracing::info!(
        ping_endpoints = config.endpoints.s3_ipv4.len(),
        dns_endpoints = config.endpoints.dns.len(),
        timer_secs = config.global_settings.timer,
        "Configuration loaded"
    );

    let sink = CloudWatchSink::new().await;
    let scheduler = Scheduler::from_config(&config, sink);

    // Runs until killed; the only error that can surface is a failed publish.
    scheduler.run().await?;
    Ok(())
}
