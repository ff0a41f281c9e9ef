//! Dataset builder - runs replay parses against the shared sample sinks

use std::pin::pin;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use futures::StreamExt;
use tokio::io::AsyncWrite;
use tracing::{error, info};

use crate::replay::stream::read_frames;
use crate::replay::{parse_replay, ParseError, ParseSummary};
use crate::sink::SampleSink;
use crate::util::time::Timer;

use super::manifest::ReplayJob;

/// Progress is logged every this many finished replays
pub const PROGRESS_EVERY: u64 = 100;

/// Outcome of a batch
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchReport {
    pub parsed: u64,
    pub failed: u64,
    pub samples: u64,
    /// Parsed replays in which kickoff was never seen
    pub without_match_start: u64,
    /// Jobs never started because shutdown was requested
    pub skipped: u64,
}

/// Runs parses concurrently; each parse owns its own parser state and only
/// shares the sinks.
pub struct DatasetBuilder<W> {
    sink: SampleSink<W>,
    max_parallel: usize,
    frame_buffer: usize,
    shutdown: Arc<AtomicBool>,
}

impl<W: AsyncWrite + Unpin + Send + 'static> DatasetBuilder<W> {
    pub fn new(sink: SampleSink<W>, max_parallel: usize, frame_buffer: usize) -> Self {
        Self {
            sink,
            max_parallel: max_parallel.max(1),
            frame_buffer,
            shutdown: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Flag that stops new replays from being started; in-flight parses finish
    pub fn shutdown_handle(&self) -> Arc<AtomicBool> {
        self.shutdown.clone()
    }

    /// Parse every job, logging per-replay failures without stopping the batch.
    /// A failed sink write does stop it: parses in flight finish, nothing new starts.
    pub async fn run(&self, jobs: Vec<ReplayJob>) -> BatchReport {
        let timer = Timer::new();
        let total = jobs.len() as u64;
        let mut report = BatchReport::default();

        info!(
            replays = total,
            max_parallel = self.max_parallel,
            "Started parsing replays"
        );

        let shutdown = self.shutdown.clone();
        let mut results = pin!(futures::stream::iter(jobs)
            .take_while(move |_| {
                let stop = shutdown.load(Ordering::Relaxed);
                async move { !stop }
            })
            .map(|job| self.process(job))
            .buffer_unordered(self.max_parallel));

        while let Some((job, result)) = results.next().await {
            match result {
                Ok(summary) => {
                    report.parsed += 1;
                    report.samples += summary.samples;
                    if !summary.recording_started {
                        report.without_match_start += 1;
                    }
                }
                Err(e) => {
                    report.failed += 1;
                    error!(replay = %job.path.display(), error = %e, "Replay parse failed");

                    if self.sink.is_poisoned().await
                        && !self.shutdown.swap(true, Ordering::Relaxed)
                    {
                        error!("Sample sink failed, no further replays will be started");
                    }
                }
            }

            let done = report.parsed + report.failed;
            if done % PROGRESS_EVERY == 0 {
                info!(
                    done,
                    remaining = total - done,
                    elapsed_secs = timer.elapsed_secs(),
                    "Parsed {} replays", done
                );
            }
        }

        report.skipped = total - report.parsed - report.failed;

        info!(
            parsed = report.parsed,
            failed = report.failed,
            skipped = report.skipped,
            samples = report.samples,
            elapsed_ms = timer.elapsed_ms(),
            "Batch finished"
        );

        report
    }

    async fn process(&self, job: ReplayJob) -> (ReplayJob, Result<ParseSummary, ParseError>) {
        let result = self.parse_file(&job).await;
        (job, result)
    }

    async fn parse_file(&self, job: &ReplayJob) -> Result<ParseSummary, ParseError> {
        let file = tokio::fs::File::open(&job.path).await?.into_std().await;
        let frames = read_frames(file, self.frame_buffer);
        parse_replay(frames, job.player1_team, &self.sink).await
    }
}
