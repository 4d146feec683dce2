//! Channel status values
//!
//! Defines the per-channel state machine states.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Current state of a watched channel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    /// Not live, nothing in flight
    Offline,
    /// Live with a capture process running
    Online,
    /// A finished capture is queued or running through inference
    Inference,
    /// Last presence check failed; retried on the next poll
    Error,
    /// Channel is not known to the store
    Unknown,
}

impl Default for Status {
    fn default() -> Self {
        Self::Offline
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Status::Offline => "offline",
            Status::Online => "online",
            Status::Inference => "inference",
            Status::Error => "error",
            Status::Unknown => "unknown",
        };
        f.write_str(s)
    }
}
