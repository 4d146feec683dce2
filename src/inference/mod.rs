//! Bounded inference scheduling
//!
//! A FIFO queue of finished captures drained by a dispatcher that holds a
//! concurrency permit before spawning each worker.

pub mod pool;
pub mod runner;

pub use pool::JobQueue;
pub use runner::{CommandRunner, InferenceRunner};

use std::path::{Path, PathBuf};

/// A dispatched inference job
#[derive(Debug, Clone)]
pub struct InferenceJob {
    /// File the worker runs against
    pub path: PathBuf,

    /// Slot label for concurrent runs; monotonically increasing, not a
    /// priority
    pub position: u64,
}

/// Channel name encoded in an artifact file name (`{channel}_{timestamp}...`)
pub fn channel_from_path(path: &Path) -> Option<&str> {
    path.file_name()?.to_str()?.split('_').next()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn channel_name_is_the_filename_prefix() {
        assert_eq!(
            channel_from_path(Path::new("vods/alice_20240101120000.mp4")),
            Some("alice")
        );
        assert_eq!(
            channel_from_path(Path::new("vods/alice_20240101120000-r.mp4")),
            Some("alice")
        );
        // Imported files without a timestamp suffix map to their own name.
        assert_eq!(channel_from_path(Path::new("clips/raw.mp4")), Some("raw.mp4"));
        assert_eq!(channel_from_path(Path::new("")), None);
    }
}
