use anyhow::Context;
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;

use vodkeeper::capture::{Capture, CaptureOptions, FfmpegCapture};
use vodkeeper::channel::{ChannelStore, Poller};
use vodkeeper::config::Config;
use vodkeeper::inference::{self, CommandRunner, InferenceRunner};
use vodkeeper::monitor::Monitor;
use vodkeeper::service::{StreamService, StreamlinkService};

const LOOKUP_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Parser)]
#[command(name = "vodkeeper", version, about = "Automatic live-stream capture with a bounded inference pipeline")]
struct Cli {
    /// Path to the configuration file
    #[arg(short, long, default_value = "config.json")]
    config: PathBuf,

    #[command(subcommand)]
    command: CliCommand,
}

#[derive(Subcommand)]
enum CliCommand {
    /// Watch configured channels and capture them while live
    Watch,
    /// Enqueue every video file in a folder for inference
    Import { folder: PathBuf },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    vodkeeper::init_tracing();
    let cli = Cli::parse();
    let config = Config::load(&cli.config)
        .with_context(|| format!("loading config from {}", cli.config.display()))?;

    match cli.command {
        CliCommand::Watch => watch(config).await,
        CliCommand::Import { folder } => import(config, &folder).await,
    }
}

async fn watch(config: Config) -> anyhow::Result<()> {
    tracing::info!("starting vodkeeper v{}", env!("CARGO_PKG_VERSION"));

    let store = Arc::new(ChannelStore::new(config.channels.clone()));
    let service: Arc<dyn StreamService> = Arc::new(StreamlinkService::new(LOOKUP_TIMEOUT));
    let capture: Arc<dyn Capture> = Arc::new(FfmpegCapture::new(
        Arc::clone(&service),
        CaptureOptions {
            output_dir: config.output_dir.clone(),
            desired_quality: config.desired_quality.clone(),
            trim: config.trimming.window(),
            reencode: config.reencoding.target()?,
            stop_timeout: config.stop_timeout(),
        },
    ));
    let runner: Arc<dyn InferenceRunner> = Arc::new(CommandRunner::new(
        config.inference.program.clone(),
        config.inference.args.clone(),
    ));

    let (queue, dispatcher) =
        inference::pool::spawn(config.max_inference_jobs, Arc::clone(&store), runner);

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("shutdown signal received");
            let _ = shutdown_tx.send(true);
        }
    });

    let monitor = Monitor::new(
        config.channels.clone(),
        store,
        Poller::new(service),
        capture,
        queue,
        config.check_interval(),
    );
    monitor.run(shutdown_rx).await;

    // The monitor dropped the last queue handle; wait for the pool to drain.
    dispatcher.await.context("inference dispatcher panicked")?;
    Ok(())
}

async fn import(config: Config, folder: &Path) -> anyhow::Result<()> {
    let store = Arc::new(ChannelStore::new(config.channels.clone()));
    let runner: Arc<dyn InferenceRunner> = Arc::new(CommandRunner::new(
        config.inference.program.clone(),
        config.inference.args.clone(),
    ));
    let (queue, dispatcher) = inference::pool::spawn(config.max_inference_jobs, store, runner);

    let queued = vodkeeper::import::import_folder(folder, &config.import, &queue).await?;
    tracing::info!(queued, "folder import complete; draining inference pool");

    queue.close();
    dispatcher.await.context("inference dispatcher panicked")?;
    Ok(())
}
