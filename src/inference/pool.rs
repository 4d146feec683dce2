//! Inference queue and worker pool
//!
//! The dispatcher receives jobs one at a time and acquires a semaphore permit
//! before spawning each worker, so the concurrency bound is structural. The
//! queue closes when every [`JobQueue`] handle is dropped; the dispatcher then
//! drains what was already enqueued, waits for outstanding workers, and exits.
//! Workers are never cancelled.

use super::runner::InferenceRunner;
use super::{channel_from_path, InferenceJob};
use crate::channel::ChannelStore;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::{mpsc, Semaphore};
use tokio::task::JoinHandle;

/// Handle for appending jobs to the inference queue
#[derive(Clone)]
pub struct JobQueue {
    tx: mpsc::UnboundedSender<PathBuf>,
}

impl JobQueue {
    /// Append a job without blocking
    pub fn enqueue(&self, path: PathBuf) {
        if self.tx.send(path).is_err() {
            tracing::warn!("inference queue is closed; dropping job");
        }
    }

    /// Close this handle. The queue closes, and the dispatcher drains, once
    /// every handle is gone.
    pub fn close(self) {}
}

/// Spawn the dispatcher for a pool of `capacity` concurrent workers
pub fn spawn(
    capacity: usize,
    store: Arc<ChannelStore>,
    runner: Arc<dyn InferenceRunner>,
) -> (JobQueue, JoinHandle<()>) {
    let (tx, rx) = mpsc::unbounded_channel();
    let handle = tokio::spawn(dispatch(rx, capacity, store, runner));
    (JobQueue { tx }, handle)
}

async fn dispatch(
    mut rx: mpsc::UnboundedReceiver<PathBuf>,
    capacity: usize,
    store: Arc<ChannelStore>,
    runner: Arc<dyn InferenceRunner>,
) {
    let semaphore = Arc::new(Semaphore::new(capacity));
    let mut position: u64 = 0;

    while let Some(path) = rx.recv().await {
        // Sole backpressure point: a permit is held before the worker spawns.
        let permit = match Arc::clone(&semaphore).acquire_owned().await {
            Ok(permit) => permit,
            Err(_) => break,
        };
        position += 1;
        let job = InferenceJob { path, position };
        let store = Arc::clone(&store);
        let runner = Arc::clone(&runner);
        tokio::spawn(async move {
            // Dropping the permit when this task ends releases the slot.
            let _permit = permit;
            run_job(job, store, runner).await;
        });
    }

    // Queue closed and drained; wait for outstanding workers to finish.
    let _ = semaphore.acquire_many(capacity as u32).await;
    tracing::info!("inference queue closed; dispatcher exiting");
}

async fn run_job(job: InferenceJob, store: Arc<ChannelStore>, runner: Arc<dyn InferenceRunner>) {
    tracing::info!(path = %job.path.display(), slot = job.position, "starting inference");
    let input_dir = job
        .path
        .parent()
        .map(Path::to_path_buf)
        .unwrap_or_default();

    if let Err(e) = runner.run(&job.path, job.position, &input_dir).await {
        tracing::error!(path = %job.path.display(), "inference failed: {e:#}");
    }

    // Success or failure, the channel goes back to offline and its artifact
    // entry is removed; both happen under the store's single lock.
    if let Some(channel) = channel_from_path(&job.path) {
        store.finish_job(channel);
    }
}
