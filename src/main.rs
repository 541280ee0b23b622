//! CLI entry point for the UK air quality pipeline.
//!
//! Provides subcommands to run the collection loop forever, execute a single
//! cycle, and inspect the retained local history.

use anyhow::{Context, Result, bail};
use clap::{Args, Parser, Subcommand};
use std::ffi::OsStr;
use std::path::Path;
use std::time::Duration;
use tokio::sync::watch;
use tracing::{error, info};
use tracing_subscriber::{
    EnvFilter, Layer,
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};
use uk_air_pipeline::config::PipelineConfig;
use uk_air_pipeline::extract::{AirQualityApi, CarbonIntensityApi, HttpExtractor};
use uk_air_pipeline::fetch::{BasicClient, auth::UrlParam};
use uk_air_pipeline::geo::GeoMapper;
use uk_air_pipeline::history::{HistoryBackend, HistoryStore, JsonFileBackend};
use uk_air_pipeline::pipeline::{CycleOutcome, Orchestrator, Schedule};
use uk_air_pipeline::sink::S3Sink;

#[derive(Parser)]
#[command(name = "uk_air_pipeline")]
#[command(about = "Collects UK air quality and CO2 data into region-level records", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct PipelineArgs {
    /// Seconds between cycle starts
    #[arg(long, default_value_t = 1800)]
    interval_secs: u64,

    /// Consecutive failures before backoff kicks in
    #[arg(long, default_value_t = 5)]
    max_consecutive_failures: u32,

    /// Extra delay in seconds applied once the failure threshold is hit
    #[arg(long, default_value_t = 300)]
    backoff_secs: u64,

    /// Maximum number of records retained in the local history
    #[arg(long, default_value_t = 50)]
    retention_limit: usize,

    /// Milliseconds between per-city provider requests
    #[arg(long, default_value_t = 2000)]
    request_delay_ms: u64,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the collection loop until interrupted
    Run {
        #[command(flatten)]
        args: PipelineArgs,
    },
    /// Execute a single extract→transform→load cycle and exit
    Once {
        #[command(flatten)]
        args: PipelineArgs,
    },
    /// Summarize the retained local history
    History {
        /// History file to read (defaults to the configured path)
        #[arg(long)]
        path: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok(); // Load .env file

    // Logging setup: colored stderr + JSON rolling log file
    let log_file_path =
        std::env::var("LOG_FILE_PATH").unwrap_or_else(|_| "logs/uk_air_pipeline.log".to_string());
    let log_dir = Path::new(&log_file_path)
        .parent()
        .unwrap_or(Path::new("logs"));
    let log_file_name = Path::new(&log_file_path)
        .file_name()
        .unwrap_or(OsStr::new("uk_air_pipeline.log"));

    let file_appender = tracing_appender::rolling::daily(log_dir, log_file_name);
    let (non_blocking_file, _file_guard) = tracing_appender::non_blocking(file_appender);

    let stderr_layer = fmt::layer()
        .with_target(true)
        .with_span_events(FmtSpan::CLOSE)
        .with_ansi(true)
        .with_writer(std::io::stderr)
        .with_filter(EnvFilter::from_env("RUST_LOG").add_directive("info".parse().unwrap()));

    let json_layer = fmt::layer()
        .json()
        .with_current_span(true)
        .with_span_list(true)
        .with_writer(non_blocking_file)
        .with_filter(EnvFilter::from_env("RUST_LOG_JSON").add_directive("debug".parse().unwrap()));

    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(json_layer)
        .init();

    let cli = Cli::parse();
    let mut config = PipelineConfig::from_env();

    match cli.command {
        Commands::Run { args } => {
            apply_args(&mut config, &args);
            let orchestrator = build_orchestrator(&config).await?;

            let (shutdown_tx, shutdown_rx) = watch::channel(false);
            tokio::spawn(async move {
                if tokio::signal::ctrl_c().await.is_ok() {
                    info!("Interrupt received, finishing current work before exit");
                    let _ = shutdown_tx.send(true);
                }
            });

            orchestrator.run(shutdown_rx).await?;
        }
        Commands::Once { args } => {
            apply_args(&mut config, &args);
            let mut orchestrator = build_orchestrator(&config).await?;

            let outcome = orchestrator.run_once().await;
            if let CycleOutcome::Failed(stage) = outcome {
                error!(%stage, "Cycle failed");
                bail!("cycle failed in the {stage} stage");
            }
        }
        Commands::History { path } => {
            let path = path.unwrap_or(config.history_path);
            summarize_history(&path);
        }
    }

    Ok(())
}

fn apply_args(config: &mut PipelineConfig, args: &PipelineArgs) {
    config.schedule = Schedule {
        interval: Duration::from_secs(args.interval_secs),
        max_consecutive_failures: args.max_consecutive_failures,
        backoff: Duration::from_secs(args.backoff_secs),
    };
    config.retention_limit = args.retention_limit;
    config.request_delay = Duration::from_millis(args.request_delay_ms);
}

/// Wires the production extractor, history store, and optional remote sink.
async fn build_orchestrator(
    config: &PipelineConfig,
) -> Result<Orchestrator<HttpExtractor<UrlParam<BasicClient>, BasicClient>, JsonFileBackend, S3Sink>>
{
    let mapper = match &config.city_table_path {
        Some(path) => GeoMapper::load(path)?,
        None => GeoMapper::embedded(),
    };
    info!(cities = mapper.len(), "City table loaded");

    let api_key = config
        .air_api_key
        .clone()
        .context("AIR_API_KEY must be set to query the air quality provider")?;

    let air = AirQualityApi::new(
        UrlParam::new(BasicClient::new(), "key", api_key),
        mapper.collection_targets(),
        config.request_delay,
    );
    let co2 = CarbonIntensityApi::new(BasicClient::new());

    let sink = match &config.s3_bucket {
        Some(bucket) => {
            info!(bucket = %bucket, "Remote sink enabled");
            Some(S3Sink::from_env(bucket.clone()).await)
        }
        None => {
            info!("No bucket configured, remote sink disabled");
            None
        }
    };

    let history = HistoryStore::new(
        JsonFileBackend::new(&config.history_path),
        config.retention_limit,
    );

    Ok(Orchestrator::new(
        HttpExtractor::new(air, co2),
        mapper,
        history,
        sink,
        config.schedule,
    ))
}

fn summarize_history(path: &str) {
    let records = JsonFileBackend::new(path).load();

    if records.is_empty() {
        info!(path, "History is empty");
        return;
    }

    for record in &records {
        info!(
            timestamp = %record.timestamp,
            regions = record.regions.len(),
            co2_ppm = record.co2.ppm,
            "Record"
        );
    }

    info!(
        path,
        retained = records.len(),
        oldest = %records.first().map(|r| r.timestamp.to_rfc3339()).unwrap_or_default(),
        newest = %records.last().map(|r| r.timestamp.to_rfc3339()).unwrap_or_default(),
        "History summary"
    );
}
