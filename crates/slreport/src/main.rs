mod settings;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use slreport_bucket::{MemoryBucketStore, ObjectLocator};
use slreport_core::{db, ArtifactReference, ReportPipeline, RunContext, RunOutcome, StorageEvent};
use tokio::io::AsyncReadExt;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use crate::settings::Settings;

#[derive(Parser, Debug)]
#[command(author, version, about = "Service level report loader", long_about = None)]
struct Cli {
    #[command(flatten)]
    settings: Settings,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Process a report object already in storage
    Process(ProcessArgs),
    /// Process a storage trigger event
    ProcessEvent(EventArgs),
    /// Load a report from disk into the warehouse without archiving
    Local(LocalArgs),
    /// Run database migrations
    Migrate,
}

#[derive(Args, Debug)]
struct ProcessArgs {
    #[arg(long)]
    bucket: String,
    /// Object key of the report
    #[arg(long)]
    object: String,
}

#[derive(Args, Debug)]
struct EventArgs {
    /// Path to the event JSON, or `-` for stdin
    #[arg(long)]
    event: String,
}

#[derive(Args, Debug)]
struct LocalArgs {
    path: PathBuf,
}

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .json()
        .init();

    let cli = Cli::parse();

    if let Err(err) = run(cli).await {
        error!(error = %format!("{err:#}"), "run failed");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<()> {
    let settings = cli.settings;

    match cli.command {
        Command::Migrate => {
            let pool = settings.connect_pool().await?;
            db::run_migrations(&pool)
                .await
                .context("failed to run database migrations")?;
            info!("Database migrations applied");
            Ok(())
        }
        Command::Process(args) => {
            let pipeline = ReportPipeline::new(
                settings.bucket_store().await?,
                settings.warehouse().await?,
                settings.pipeline_config(),
            );
            let artifact = ArtifactReference::new(ObjectLocator::new(args.bucket, args.object));
            let outcome = pipeline
                .run(artifact, RunContext::now())
                .await
                .context("report processing failed")?;
            log_outcome(&outcome)
        }
        Command::ProcessEvent(args) => {
            let event = read_event(&args.event).await?;
            let pipeline = ReportPipeline::new(
                settings.bucket_store().await?,
                settings.warehouse().await?,
                settings.pipeline_config(),
            );
            let outcome = pipeline
                .handle_event(event)
                .await
                .context("report processing failed")?;
            log_outcome(&outcome)
        }
        Command::Local(args) => {
            // Local runs never touch storage.
            let pipeline = ReportPipeline::new(
                Arc::new(MemoryBucketStore::new()),
                settings.warehouse().await?,
                settings.pipeline_config(),
            );
            let outcome = pipeline
                .run_local(&args.path, RunContext::now())
                .await
                .with_context(|| format!("failed to load {}", args.path.display()))?;
            log_outcome(&outcome)
        }
    }
}

async fn read_event(source: &str) -> Result<StorageEvent> {
    let raw = if source == "-" {
        let mut buffer = String::new();
        tokio::io::stdin()
            .read_to_string(&mut buffer)
            .await
            .context("failed to read event from stdin")?;
        buffer
    } else {
        tokio::fs::read_to_string(source)
            .await
            .with_context(|| format!("failed to read event file {source}"))?
    };
    parse_event(&raw)
}

fn parse_event(raw: &str) -> Result<StorageEvent> {
    serde_json::from_str(raw).context("event must be JSON with `name` and `bucket`")
}

// Aborts are expected outcomes, not failures.
fn log_outcome(outcome: &RunOutcome) -> Result<()> {
    match outcome {
        RunOutcome::Completed(report) => {
            let summary = serde_json::to_string(report)?;
            info!(report = %summary, filename = %report.filename, "run completed");
        }
        RunOutcome::Aborted { stage, reason } => {
            warn!(stage = stage.as_str(), reason = %reason, "run aborted");
        }
    }
    Ok(())
}
