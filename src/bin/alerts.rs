use clap::Parser;
use site_pulse::{
    ResultKind,
    config::read_config_file,
    pipeline::{NotifyMode, Pipeline},
    storage::ResultStore,
    util::apply_env_overrides,
};
use tracing::{debug, info, level_filters::LevelFilter, trace};
use tracing_subscriber::{filter, layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Debug, Clone, Parser)]
struct Args {
    /// Site registry
    #[arg(short)]
    file: String,

    /// Send status updates instead of alerts
    #[arg(long)]
    status_only: bool,
}

fn init() {
    let filter = filter::Targets::new().with_targets(vec![
        ("site_pulse", LevelFilter::TRACE),
        ("pulse_alerts", LevelFilter::TRACE),
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
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();
    init();
    let args = Args::parse();
    trace!("started with args: {args:?}");

    let config = apply_env_overrides(read_config_file(&args.file)?);
    let pipeline = Pipeline::open(config).await?;
    debug!("{}", pipeline.store().get_stats().await);

    let mode = if args.status_only {
        NotifyMode::Status
    } else {
        NotifyMode::Alerts
    };

    let mut reports = vec![];
    for kind in ResultKind::ALL {
        reports.push(pipeline.report_latest(kind).await);
    }

    let sent = pipeline.notify_all(&reports, mode).await;

    info!("sent {sent} notifications ({mode:?})");
    Ok(())
}
