//! Replay Sampler - builds a training dataset from decoded 1v1 replays
//!
//! This is the batch entry point. It:
//! - Reads the replay manifest
//! - Parses replays concurrently, sampling the match at a fixed rate
//! - Appends aligned records to the physics and control streams

use std::sync::atomic::Ordering;

use anyhow::Context;
use tokio::fs::OpenOptions;
use tokio::io::BufWriter;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use replay_sampler::config::Config;
use replay_sampler::dataset::{load_manifest, DatasetBuilder};
use replay_sampler::sink::SampleSink;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    // Load configuration
    let config = Config::from_env()?;

    // Initialize tracing
    init_tracing(&config.log_level);

    info!("Starting Replay Sampler");
    info!("Manifest: {}", config.manifest_path.display());

    let jobs = load_manifest(&config.manifest_path)
        .await
        .with_context(|| format!("loading {}", config.manifest_path.display()))?;
    info!("Loaded {} replay jobs", jobs.len());

    tokio::fs::create_dir_all(&config.dataset_root)
        .await
        .with_context(|| format!("creating {}", config.dataset_root.display()))?;

    let physics = open_append(&config.physics_path()).await?;
    let controls = open_append(&config.controls_path()).await?;
    info!(
        physics = %config.physics_path().display(),
        controls = %config.controls_path().display(),
        "Appending samples"
    );

    let sink = SampleSink::new(BufWriter::new(physics), BufWriter::new(controls));
    let builder = DatasetBuilder::new(
        sink.clone(),
        config.max_parallel_parses,
        config.frame_buffer,
    );

    // Stop starting new replays on shutdown; parses in flight still finish
    let stop = builder.shutdown_handle();
    tokio::spawn(async move {
        shutdown_signal().await;
        stop.store(true, Ordering::Relaxed);
    });

    let report = builder.run(jobs).await;

    let closed = sink.shutdown().await;
    if sink.is_poisoned().await {
        anyhow::bail!(
            "a sample write failed after {} complete records; the dataset files may be misaligned",
            sink.records_written().await
        );
    }
    closed.context("closing sample streams")?;

    if report.without_match_start > 0 {
        info!(
            replays = report.without_match_start,
            "Some replays never reached kickoff and produced no samples"
        );
    }
    info!(
        parsed = report.parsed,
        failed = report.failed,
        skipped = report.skipped,
        records = sink.records_written().await,
        "Dataset build complete"
    );
    Ok(())
}

async fn open_append(path: &std::path::Path) -> anyhow::Result<tokio::fs::File> {
    OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .await
        .with_context(|| format!("opening {}", path.display()))
}

/// Initialize tracing/logging
fn init_tracing(log_level: &str) {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_level));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().with_target(true))
        .init();
}

/// Resolves on Ctrl+C or SIGTERM
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to install signal handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, finishing replays in flight");
        }
        _ = terminate => {
            info!("Received terminate signal, finishing replays in flight");
        }
    }
}
