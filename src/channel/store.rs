//! Shared channel state
//!
//! One store owns the status, active-download flag, and artifact-path maps for
//! every configured channel. All three live behind a single lock so that a
//! status transition and an artifact publication can never interleave.

use super::status::Status;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::path::PathBuf;

#[derive(Default)]
struct Inner {
    status: HashMap<String, Status>,
    active: HashMap<String, bool>,
    artifacts: HashMap<String, PathBuf>,
}

/// Locked accessor over per-channel state
pub struct ChannelStore {
    inner: Mutex<Inner>,
}

impl ChannelStore {
    /// Create a store with every configured channel starting offline
    pub fn new<I, S>(channels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut inner = Inner::default();
        for name in channels {
            let name = name.into();
            inner.status.insert(name.clone(), Status::Offline);
            inner.active.insert(name, false);
        }
        Self {
            inner: Mutex::new(inner),
        }
    }

    /// Get the current status of a channel
    pub fn status(&self, channel: &str) -> Status {
        self.inner
            .lock()
            .status
            .get(channel)
            .copied()
            .unwrap_or(Status::Unknown)
    }

    /// Set the status of a channel (no-op for unknown channels)
    pub fn set_status(&self, channel: &str, status: Status) {
        if let Some(slot) = self.inner.lock().status.get_mut(channel) {
            *slot = status;
        }
    }

    /// Record a polled status.
    ///
    /// A concurrent transition into or out of `inference` wins over the poll:
    /// a short-circuited `inference` read is never written back, and a polled
    /// presence never overwrites an `inference` set after the read was taken.
    /// Writing either way would wedge the channel, since the poller skips
    /// inferencing channels on every subsequent tick.
    pub fn apply_polled(&self, channel: &str, polled: Status) {
        if polled == Status::Inference {
            return;
        }
        let mut inner = self.inner.lock();
        if let Some(slot) = inner.status.get_mut(channel) {
            if *slot != Status::Inference {
                *slot = polled;
            }
        }
    }

    /// Whether a download is currently marked in flight for this channel
    pub fn is_active(&self, channel: &str) -> bool {
        self.inner
            .lock()
            .active
            .get(channel)
            .copied()
            .unwrap_or(false)
    }

    /// Set or clear the active-download flag
    pub fn set_active(&self, channel: &str, active: bool) {
        self.inner.lock().active.insert(channel.to_string(), active);
    }

    /// Guard for the offline-to-online transition.
    ///
    /// Marks the channel active and online in one locked step. Returns false
    /// when a download is already in flight, so the caller must not start a
    /// second capture.
    pub fn try_begin_download(&self, channel: &str) -> bool {
        let mut inner = self.inner.lock();
        let active = inner.active.entry(channel.to_string()).or_insert(false);
        if *active {
            return false;
        }
        *active = true;
        inner.status.insert(channel.to_string(), Status::Online);
        true
    }

    /// Record the finished capture for a channel
    pub fn publish_artifact(&self, channel: &str, path: PathBuf) {
        self.inner.lock().artifacts.insert(channel.to_string(), path);
    }

    /// Get the recorded artifact path, if any
    pub fn artifact(&self, channel: &str) -> Option<PathBuf> {
        self.inner.lock().artifacts.get(channel).cloned()
    }

    /// Claim the channel for inference.
    ///
    /// If an artifact path is recorded, sets the status to `inference` and
    /// returns the path in the same locked step. The artifact entry stays in
    /// place until [`finish_job`](Self::finish_job) removes it.
    pub fn mark_inference(&self, channel: &str) -> Option<PathBuf> {
        let mut inner = self.inner.lock();
        let path = inner.artifacts.get(channel).cloned()?;
        inner.status.insert(channel.to_string(), Status::Inference);
        Some(path)
    }

    /// Worker cleanup: drop the artifact entry and return the channel to
    /// offline in one locked step
    pub fn finish_job(&self, channel: &str) {
        let mut inner = self.inner.lock();
        inner.artifacts.remove(channel);
        if let Some(slot) = inner.status.get_mut(channel) {
            *slot = Status::Offline;
        }
    }

    /// Force every channel offline (shutdown path)
    pub fn force_all_offline(&self) {
        let mut inner = self.inner.lock();
        for status in inner.status.values_mut() {
            *status = Status::Offline;
        }
    }
}
