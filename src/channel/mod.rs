//! Channel state tracking
//!
//! Owns the per-channel state machine: status values, the shared state store,
//! and the state-aware status poller.

pub mod poll;
pub mod status;
pub mod store;

pub use poll::Poller;
pub use status::Status;
pub use store::ChannelStore;
