//! Monitor loop
//!
//! Drives the poll -> transition -> dispatch cycle for every configured
//! channel until shutdown.

use crate::capture::Capture;
use crate::channel::{ChannelStore, Poller, Status};
use crate::inference::JobQueue;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;

/// Drives channel polling, capture lifecycle, and inference dispatch
pub struct Monitor {
    channels: Vec<String>,
    store: Arc<ChannelStore>,
    poller: Poller,
    capture: Arc<dyn Capture>,
    queue: JobQueue,
    interval: Duration,
    downloads: HashMap<String, JoinHandle<()>>,
}

impl Monitor {
    pub fn new(
        channels: Vec<String>,
        store: Arc<ChannelStore>,
        poller: Poller,
        capture: Arc<dyn Capture>,
        queue: JobQueue,
        interval: Duration,
    ) -> Self {
        Self {
            channels,
            store,
            poller,
            capture,
            queue,
            interval,
            downloads: HashMap::new(),
        }
    }

    /// Run until `shutdown` flips to true.
    ///
    /// Consumes the monitor, dropping its queue handle on return; once every
    /// other handle is gone the inference queue closes and drains.
    pub async fn run(mut self, mut shutdown: watch::Receiver<bool>) {
        tracing::info!(channels = self.channels.len(), "monitoring channels");
        loop {
            let names = self.channels.clone();
            for channel in &names {
                self.tick_channel(channel).await;
            }

            tokio::select! {
                _ = tokio::time::sleep(self.interval) => {}
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        break;
                    }
                }
            }
            if *shutdown.borrow() {
                break;
            }
        }
        self.shutdown().await;
    }

    /// One state-machine step for one channel
    async fn tick_channel(&mut self, channel: &str) {
        let current = self.store.status(channel);
        let polled = self.poller.poll(channel, current).await;
        self.store.apply_polled(channel, polled);

        match polled {
            Status::Online => {
                if self.store.try_begin_download(channel) {
                    tracing::info!(channel, "channel went live; starting download");
                    self.spawn_download(channel);
                }
            }
            Status::Offline => {
                if self.store.is_active(channel) {
                    tracing::info!(channel, "channel went offline; stopping download");
                    // The download task finishes the transforms and queues
                    // the artifact on its own; only the bounded stop is
                    // awaited here so other channels keep ticking.
                    self.capture.stop(channel).await;
                }
            }
            Status::Inference | Status::Error => {}
            Status::Unknown => {
                tracing::warn!(channel, "unknown status");
            }
        }
    }

    /// Run the capture for a freshly live channel on its own task.
    ///
    /// The task owns the whole download lifecycle: when the capture exits,
    /// stopped or not, it claims the artifact for inference and enqueues it,
    /// then clears the active flag so the channel can be captured again. A
    /// capture that ends while the channel is still live therefore feeds
    /// inference immediately instead of waiting for the streamer to leave.
    fn spawn_download(&mut self, channel: &str) {
        let capture = Arc::clone(&self.capture);
        let store = Arc::clone(&self.store);
        let queue = self.queue.clone();
        let name = channel.to_string();
        let task = tokio::spawn(async move {
            match capture.start(&name).await {
                Ok(path) => {
                    tracing::info!(channel = %name, path = %path.display(), "download finished");
                    store.publish_artifact(&name, path);
                    if let Some(path) = store.mark_inference(&name) {
                        tracing::info!(channel = %name, path = %path.display(), "queued for inference");
                        queue.enqueue(path);
                    }
                    store.set_active(&name, false);
                }
                Err(e) => {
                    tracing::error!(channel = %name, "download failed: {e}");
                    // Leave the channel startable again on the next tick.
                    store.set_active(&name, false);
                    store.set_status(&name, Status::Offline);
                }
            }
        });

        if let Some(old) = self.downloads.insert(channel.to_string(), task) {
            if !old.is_finished() {
                tracing::warn!(channel, "previous download task still running");
            }
        }
    }

    /// Force every channel offline, stop all captures, and wait for the
    /// download tasks to queue their final artifacts
    async fn shutdown(mut self) {
        tracing::info!("stopping channel monitoring");
        self.store.force_all_offline();
        for channel in self.channels.clone() {
            self.capture.stop(&channel).await;
        }
        // Each task enqueues its capture before exiting, so draining them
        // here puts every shutdown-time recording on the queue before the
        // monitor's own handle drops.
        for (_, task) in self.downloads.drain() {
            let _ = task.await;
        }
    }
}
