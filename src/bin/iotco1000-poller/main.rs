mod args;

use std::{process::ExitCode, time::Duration};

use anyhow::{Context as _, Result};
use aq_monitor::{
    db::{PgMetricsClient, new_pool},
    iotco1000::Iotco1000,
    pipeline::{self, PipelineConfig},
};
use args::Args;
use clap::Parser as _;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> ExitCode {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    if let Err(e) = run().await {
        tracing::error!("{e:#}");
        return ExitCode::from(1);
    }

    ExitCode::from(0)
}

async fn run() -> Result<()> {
    let args = Args::parse();

    let sensor = Iotco1000::open(
        &args.serial_device_path,
        args.baud_rate,
        Duration::from_millis(args.read_timeout_ms),
        args.timezone,
    )
    .context("failed to open IOTCO1000")?;

    let pool = new_pool(&args.database_url).context("failed to create metrics client")?;
    let client = PgMetricsClient::new(pool);

    info!(
        device = %args.serial_device_path,
        namespace = %args.metric_namespace,
        poll_interval_ms = args.poll_interval,
        "polling IOTCO1000"
    );

    let config = PipelineConfig {
        poll_interval: Duration::from_millis(args.poll_interval),
        ..PipelineConfig::new(args.metric_namespace)
    };

    pipeline::run(sensor, client, config).await
}
