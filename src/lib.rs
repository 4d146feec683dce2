//! vodkeeper - automatic live-stream capture, made simple.
//!
//! Watches a set of named channels, captures each with an external ffmpeg
//! process while it is live, and feeds finished captures through a
//! bounded-concurrency inference pool.

pub mod capture;
pub mod channel;
pub mod config;
pub mod import;
pub mod inference;
pub mod monitor;
pub mod service;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Initialize tracing/logging
pub fn init_tracing() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "vodkeeper=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}
