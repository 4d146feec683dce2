//! Download lifecycle management
//!
//! Starts and stops one external capture process per live channel and runs
//! the optional post-capture transform steps.

pub mod ffmpeg;
pub mod transform;

pub use ffmpeg::{CaptureOptions, FfmpegCapture};
pub use transform::{ReencodeFormat, TrimWindow};

use async_trait::async_trait;
use std::path::PathBuf;
use thiserror::Error;

/// Capture and transform errors
#[derive(Error, Debug)]
pub enum CaptureError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("no stream URL resolvable for {0}")]
    NoStream(String),

    #[error("capture produced no output file: {}", .0.display())]
    NoOutput(PathBuf),

    #[error("transform step produced no output file: {}", .0.display())]
    TransformFailed(PathBuf),

    #[error("invalid re-encoding format: {0}")]
    InvalidFormat(String),

    #[error("stream lookup failed: {0}")]
    Service(#[from] crate::service::ServiceError),
}

/// Start/stop seam for per-channel capture processes
///
/// At most one live capture process exists per channel; the monitor's
/// active-flag guard keeps `start` and `stop` paired.
#[async_trait]
pub trait Capture: Send + Sync {
    /// Run a capture to completion and return the final artifact path.
    ///
    /// Resolves the stream URL, records the process handle under the channel
    /// name, waits for the process to exit (naturally or via `stop`), applies
    /// the enabled transform steps, and returns the last output path.
    async fn start(&self, channel: &str) -> Result<PathBuf, CaptureError>;

    /// Gracefully stop the channel's capture process, escalating to a forced
    /// kill after a bounded timeout. No-op when no process is recorded.
    async fn stop(&self, channel: &str);
}
