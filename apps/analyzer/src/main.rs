use std::{path::PathBuf, sync::Arc};

use anyhow::{anyhow, bail, Context, Result};
use clap::Parser;
use client_core::{
    AnalysisClient, CsvUpload, FileSource, IntakeSession, IntakeState, SubmitOutcome, ZipPolicy,
};
use tracing::info;
use tracing_subscriber::EnvFilter;

mod config;
mod report;

use config::{load_settings, resolve_endpoint, DEFAULT_CONFIG_PATH};

/// Upload a load-test CSV export and print the prediction results.
#[derive(Parser, Debug)]
#[command(name = "analyzer", version)]
struct Args {
    /// CSV export to analyse.
    file: PathBuf,
    /// Overrides the configured prediction endpoint.
    #[arg(long)]
    endpoint: Option<String>,
    #[arg(long, default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,
    /// Print the projected series as JSON instead of tables.
    #[arg(long)]
    json: bool,
    /// Truncate mismatched series to the shortest array instead of failing.
    #[arg(long)]
    lenient: bool,
}

fn init_tracing(default_filter: &str) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let mut settings = load_settings(&args.config);
    if let Some(endpoint) = args.endpoint {
        settings.endpoint_url = endpoint;
    }
    if args.lenient {
        settings.zip_policy = ZipPolicy::Truncate;
    }
    init_tracing(&settings.log_filter);

    let client = AnalysisClient::new(resolve_endpoint(&settings.endpoint_url)?);
    info!(
        endpoint = %client.endpoint(),
        zip_policy = ?settings.zip_policy,
        "analyzer starting"
    );

    let upload = CsvUpload::from_path(&args.file)
        .await
        .with_context(|| format!("failed to load '{}'", args.file.display()))?;
    let session = IntakeSession::new(Arc::new(client), settings.zip_policy);

    match session.submit(upload, FileSource::Picked).await? {
        SubmitOutcome::Settled(IntakeState::Ready(loaded)) => {
            let rendered = if args.json {
                report::render_json(&loaded).context("failed to encode projection")?
            } else {
                report::render_text(&loaded)
            };
            println!("{rendered}");
            Ok(())
        }
        SubmitOutcome::Settled(IntakeState::Error(message)) => Err(anyhow!(message)),
        SubmitOutcome::Settled(other) => {
            bail!("upload ended in unexpected state '{}'", other.name())
        }
        SubmitOutcome::Discarded => bail!("upload was abandoned before the response arrived"),
    }
}
