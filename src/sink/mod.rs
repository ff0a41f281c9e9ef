//! Output sinks for the physics and control sample streams

use std::io;
use std::sync::Arc;

use tokio::io::{AsyncWrite, AsyncWriteExt};
use tokio::sync::Mutex;
use tracing::error;

use crate::replay::SamplePair;

struct SinkPair<W> {
    physics: W,
    controls: W,
    /// Sample pairs fully written so far
    records: u64,
    /// Set after any failed write; the streams may no longer line up
    poisoned: bool,
}

/// Pair of append-only writers shared by every parse in a batch.
/// Both records of a pair are written under one lock, so record N of the
/// physics stream always matches record N of the control stream. After a
/// failed write every later `write_pair` is refused.
pub struct SampleSink<W> {
    inner: Arc<Mutex<SinkPair<W>>>,
}

impl<W> Clone for SampleSink<W> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<W: AsyncWrite + Unpin + Send> SampleSink<W> {
    pub fn new(physics: W, controls: W) -> Self {
        Self {
            inner: Arc::new(Mutex::new(SinkPair {
                physics,
                controls,
                records: 0,
                poisoned: false,
            })),
        }
    }

    pub async fn write_pair(&self, pair: &SamplePair) -> io::Result<()> {
        let mut sinks = self.inner.lock().await;
        if sinks.poisoned {
            return Err(poisoned_error());
        }

        let written = sinks.physics.write_all(&pair.physics).await;
        if let Err(e) = written {
            sinks.poisoned = true;
            error!(record = sinks.records, error = %e, "Physics stream write failed");
            return Err(e);
        }
        let written = sinks.controls.write_all(&pair.controls).await;
        if let Err(e) = written {
            sinks.poisoned = true;
            error!(
                record = sinks.records,
                error = %e,
                "Control stream write failed after its physics record, streams are misaligned"
            );
            return Err(e);
        }

        sinks.records += 1;
        Ok(())
    }

    /// True once a write has failed; nothing more will be accepted
    pub async fn is_poisoned(&self) -> bool {
        self.inner.lock().await.poisoned
    }

    pub async fn records_written(&self) -> u64 {
        self.inner.lock().await.records
    }

    pub async fn flush(&self) -> io::Result<()> {
        let mut sinks = self.inner.lock().await;
        sinks.physics.flush().await?;
        sinks.controls.flush().await
    }

    /// Flush and close both writers. Only the batch owner calls this.
    pub async fn shutdown(&self) -> io::Result<()> {
        let mut sinks = self.inner.lock().await;
        sinks.physics.shutdown().await?;
        sinks.controls.shutdown().await
    }

    /// Recover the writers once every clone has been dropped
    pub fn into_inner(self) -> Option<(W, W)> {
        Arc::try_unwrap(self.inner).ok().map(|mutex| {
            let sinks = mutex.into_inner();
            (sinks.physics, sinks.controls)
        })
    }
}

fn poisoned_error() -> io::Error {
    io::Error::new(
        io::ErrorKind::Other,
        "sample sink refused write after an earlier failure",
    )
}
