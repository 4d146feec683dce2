//! Inference collaborator seam

use async_trait::async_trait;
use std::path::Path;
use std::process::Stdio;
use tokio::process::Command;

/// Runs the inference routine against one file
///
/// Implementations must return errors rather than panic; the worker logs a
/// failure and still performs its cleanup.
#[async_trait]
pub trait InferenceRunner: Send + Sync {
    /// Run inference on `path`. `slot` labels the concurrent run.
    async fn run(&self, path: &Path, slot: u64, input_dir: &Path) -> anyhow::Result<()>;
}

/// Invokes an external command with `<file> <slot> <input-dir>` appended to
/// the configured arguments
pub struct CommandRunner {
    program: String,
    args: Vec<String>,
}

impl CommandRunner {
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
        }
    }
}

#[async_trait]
impl InferenceRunner for CommandRunner {
    async fn run(&self, path: &Path, slot: u64, input_dir: &Path) -> anyhow::Result<()> {
        let status = Command::new(&self.program)
            .args(&self.args)
            .arg(path)
            .arg(slot.to_string())
            .arg(input_dir)
            .stdin(Stdio::null())
            .status()
            .await
            .map_err(|e| anyhow::anyhow!("failed to run {}: {e}", self.program))?;

        anyhow::ensure!(status.success(), "inference command exited with {status}");
        Ok(())
    }
}
