use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use site_pulse::{
    ResultKind,
    collectors::UptimeCollector,
    config::read_config_file,
    pipeline::{NotifyMode, Pipeline},
    util::apply_env_overrides,
};
use tracing::{info, level_filters::LevelFilter, trace, warn};
use tracing_subscriber::{filter, layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Debug, Clone, Parser)]
struct Args {
    /// Site registry
    #[arg(short)]
    file: String,

    /// Send an alert if any site is down or slow
    #[arg(long)]
    notify: bool,
}

fn init() {
    let filter = filter::Targets::new().with_targets(vec![
        ("site_pulse", LevelFilter::TRACE),
        ("pulse_uptime", LevelFilter::TRACE),
    ]);
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .compact()
                .with_ansi(false),
        )
        .with(filter)
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    dotenv::dotenv().ok();
    init();
    let args = Args::parse();
    trace!("started with args: {args:?}");

    let config = apply_env_overrides(read_config_file(&args.file)?);
    let pipeline = Pipeline::open(config).await?;

    let results = pipeline.collect(Arc::new(UptimeCollector::new()?)).await;
    let report = pipeline.ingest(ResultKind::Uptime, results).await?;

    if args.notify {
        pipeline.notify(&report, NotifyMode::Alerts).await;
    }

    if report.has_failures() {
        warn!("uptime check finished with failures");
        return Ok(ExitCode::FAILURE);
    }

    info!("all {} sites are up", report.outcomes.len());
    Ok(ExitCode::SUCCESS)
}
