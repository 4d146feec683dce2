//! Stream presence and resolution
//!
//! Platform-agnostic seam for the external stream lookup service.

pub mod streamlink;

pub use streamlink::StreamlinkService;

use async_trait::async_trait;
use thiserror::Error;

/// Errors from the stream lookup service
///
/// All variants are transient from the monitor's point of view; the poller
/// maps them to `Status::Error` and the next tick retries.
#[derive(Error, Debug)]
pub enum ServiceError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("stream lookup failed: {0}")]
    Lookup(String),

    #[error("stream lookup timed out for {0}")]
    Timeout(String),
}

/// External stream-presence and resolution service
#[async_trait]
pub trait StreamService: Send + Sync {
    /// Whether the channel currently has any live stream
    async fn presence(&self, channel: &str) -> Result<bool, ServiceError>;

    /// Resolve a playable URL for the desired quality, falling back to the
    /// best available stream. `None` means the channel has no streams.
    async fn resolve(&self, channel: &str, quality: &str)
        -> Result<Option<String>, ServiceError>;
}
