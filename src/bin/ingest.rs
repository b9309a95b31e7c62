use std::process::ExitCode;

use anyhow::Context;
use clap::Parser;
use site_pulse::{
    ResultKind, SiteResult,
    config::read_config_file,
    pipeline::{NotifyMode, Pipeline},
    util::apply_env_overrides,
};
use tracing::{info, level_filters::LevelFilter, trace, warn};
use tracing_subscriber::{filter, layer::SubscriberExt, util::SubscriberInitExt};

/// Ingest results of an external collector (Lighthouse, Matomo, Shopify, WordPress probes)
#[derive(Debug, Clone, Parser)]
struct Args {
    /// Site registry
    #[arg(short)]
    file: String,

    /// Kind of the results in the input file
    #[arg(long)]
    kind: ResultKind,

    /// JSON array of results
    #[arg(long)]
    input: String,

    /// Send an alert if the results warrant one
    #[arg(long)]
    notify: bool,
}

fn init() {
    let filter = filter::Targets::new().with_targets(vec![
        ("site_pulse", LevelFilter::TRACE),
        ("pulse_ingest", LevelFilter::TRACE),
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

fn read_results(path: &str) -> anyhow::Result<Vec<SiteResult>> {
    let content = std::fs::read_to_string(path).with_context(|| format!("reading {path}"))?;
    serde_json::from_str(&content).with_context(|| format!("parsing results in {path}"))
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    dotenv::dotenv().ok();
    init();
    let args = Args::parse();
    trace!("started with args: {args:?}");

    let config = apply_env_overrides(read_config_file(&args.file)?);
    let results = read_results(&args.input)?;
    let pipeline = Pipeline::open(config).await?;

    let report = pipeline.ingest(args.kind, results).await?;

    if args.notify {
        pipeline.notify(&report, NotifyMode::Alerts).await;
    }

    if report.has_failures() {
        warn!("{} results contain failures or budget violations", args.kind);
        return Ok(ExitCode::FAILURE);
    }

    info!("ingested {} {} results", report.outcomes.len(), args.kind);
    Ok(ExitCode::SUCCESS)
}
