//! Batch folder import
//!
//! Enqueues pre-existing video files for inference, optionally normalizing
//! their resolution into a `tmp/` subfolder first. Imported files do not
//! participate in the channel state machine.

use crate::capture::transform;
use crate::config::ImportConfig;
use crate::inference::JobQueue;
use anyhow::Context;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::process::Command;

const VIDEO_EXTENSIONS: &[&str] = &["mp4", "mkv", "avi", "mov", "flv", "wmv"];

/// Whether a path looks like a video file we can process
pub fn is_video_file(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| VIDEO_EXTENSIONS.contains(&e.to_ascii_lowercase().as_str()))
        .unwrap_or(false)
}

/// Enqueue every video file in `folder`; returns the number queued
pub async fn import_folder(
    folder: &Path,
    options: &ImportConfig,
    queue: &JobQueue,
) -> anyhow::Result<usize> {
    anyhow::ensure!(folder.is_dir(), "folder does not exist: {}", folder.display());

    let mut files: Vec<PathBuf> = std::fs::read_dir(folder)
        .with_context(|| format!("reading {}", folder.display()))?
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| is_video_file(path))
        .collect();
    files.sort();

    if !options.resize {
        for file in &files {
            tracing::info!(file = %file.display(), "enqueued for inference");
            queue.enqueue(file.clone());
        }
        return Ok(files.len());
    }

    let tmp = folder.join("tmp");
    std::fs::create_dir_all(&tmp).context("creating tmp folder")?;

    for file in &files {
        let Some(name) = file.file_name() else {
            continue;
        };
        let resized = tmp.join(name);
        if !resized.exists() {
            let (width, height) = options.resolution;
            tracing::info!(file = %file.display(), "resizing to {width}x{height}");
            resize(file, &resized, options.resolution).await?;
        }
        tracing::info!(file = %resized.display(), "enqueued for inference");
        queue.enqueue(resized);
    }
    Ok(files.len())
}

async fn resize(input: &Path, output: &Path, resolution: (u32, u32)) -> anyhow::Result<()> {
    let args = transform::scale_args(input, output, resolution);
    let status = Command::new("ffmpeg")
        .args(&args)
        .stdin(Stdio::null())
        .status()
        .await
        .context("failed to run ffmpeg")?;
    anyhow::ensure!(status.success(), "resize failed for {}", input.display());
    Ok(())
}
