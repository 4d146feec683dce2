//! FFmpeg capture process management
//!
//! Spawns one ffmpeg process per live channel, tracks its handle for graceful
//! stop, and chains the optional trim and re-encode steps once the capture
//! exits. Each invocation writes its diagnostic stream to a sidecar `.log`
//! file next to the output.

use super::transform::{self, ReencodeFormat, TrimWindow};
use super::{Capture, CaptureError};
use crate::service::StreamService;
use async_trait::async_trait;
use chrono::Local;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::AsyncWriteExt;
use tokio::process::{Child, Command};
use tokio::sync::oneshot;

/// Options controlling capture output and the post-capture transforms
#[derive(Debug, Clone)]
pub struct CaptureOptions {
    /// Directory receiving capture output and sidecar logs
    pub output_dir: PathBuf,

    /// Quality requested from the stream service
    pub desired_quality: String,

    /// Time-windowed extraction, when enabled
    pub trim: Option<TrimWindow>,

    /// Resolution/frame-rate normalization, when enabled
    pub reencode: Option<ReencodeFormat>,

    /// How long `stop` waits for a graceful exit before killing
    pub stop_timeout: Duration,
}

/// Handle to a live capture process, keyed by channel name
struct CaptureHandle {
    stop_tx: oneshot::Sender<()>,
    exited_rx: oneshot::Receiver<()>,
}

/// Capture manager backed by external ffmpeg processes
pub struct FfmpegCapture {
    program: PathBuf,
    service: Arc<dyn StreamService>,
    options: CaptureOptions,
    handles: Mutex<HashMap<String, CaptureHandle>>,
}

impl FfmpegCapture {
    pub fn new(service: Arc<dyn StreamService>, options: CaptureOptions) -> Self {
        Self {
            program: PathBuf::from("ffmpeg"),
            service,
            options,
            handles: Mutex::new(HashMap::new()),
        }
    }

    /// Override the `ffmpeg` executable path
    pub fn with_program(mut self, program: impl Into<PathBuf>) -> Self {
        self.program = program.into();
        self
    }

    /// Output path stem for a capture starting now: `{dir}/{channel}_{ts}`
    fn output_base(&self, channel: &str) -> PathBuf {
        let timestamp = Local::now().format("%Y%m%d%H%M%S");
        self.options.output_dir.join(format!("{channel}_{timestamp}"))
    }

    /// Wait for the capture process, honoring a stop request.
    ///
    /// On a stop request, ffmpeg's `q` quit command is written to the piped
    /// stdin so the container gets finalized; if the process is still alive
    /// after the stop timeout it is killed.
    async fn supervise(&self, channel: &str, child: &mut Child, mut stop_rx: oneshot::Receiver<()>) {
        let interrupted = tokio::select! {
            status = child.wait() => {
                tracing::info!(channel, ?status, "capture process exited");
                false
            }
            _ = &mut stop_rx => true,
        };

        if interrupted {
            if let Some(mut stdin) = child.stdin.take() {
                let _ = stdin.write_all(b"q").await;
                let _ = stdin.shutdown().await;
            }
            match tokio::time::timeout(self.options.stop_timeout, child.wait()).await {
                Ok(status) => {
                    tracing::info!(channel, ?status, "capture process stopped gracefully");
                }
                Err(_) => {
                    tracing::warn!(channel, "graceful stop timed out; killing capture process");
                    let _ = child.kill().await;
                }
            }
        }
    }

    /// Run one ffmpeg transform step and verify its expected output exists
    async fn run_transform(
        &self,
        args: Vec<String>,
        log_path: &Path,
        expected: &Path,
    ) -> Result<(), CaptureError> {
        tracing::info!(?args, "running ffmpeg transform");
        let status = Command::new(&self.program)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::from(std::fs::File::create(log_path)?))
            .status()
            .await?;

        if !status.success() || !expected.exists() {
            return Err(CaptureError::TransformFailed(expected.to_path_buf()));
        }
        Ok(())
    }
}

#[async_trait]
impl Capture for FfmpegCapture {
    async fn start(&self, channel: &str) -> Result<PathBuf, CaptureError> {
        let url = self
            .service
            .resolve(channel, &self.options.desired_quality)
            .await?
            .ok_or_else(|| CaptureError::NoStream(channel.to_string()))?;

        std::fs::create_dir_all(&self.options.output_dir)?;
        let base = self.output_base(channel);
        let output = path_with_suffix(&base, "", "mp4");
        let log = path_with_suffix(&base, "", "log");

        let args = transform::capture_args(&url, &output);
        tracing::info!(channel, ?args, "starting capture");
        let mut child = Command::new(&self.program)
            .args(&args)
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::from(std::fs::File::create(&log)?))
            .spawn()?;

        let (stop_tx, stop_rx) = oneshot::channel();
        let (exited_tx, exited_rx) = oneshot::channel();
        {
            let mut handles = self.handles.lock();
            if handles
                .insert(channel.to_string(), CaptureHandle { stop_tx, exited_rx })
                .is_some()
            {
                tracing::warn!(channel, "replacing a stale capture handle");
            }
        }

        self.supervise(channel, &mut child, stop_rx).await;
        let _ = exited_tx.send(());
        self.handles.lock().remove(channel);

        if !output.exists() {
            return Err(CaptureError::NoOutput(output));
        }

        let mut current = output;
        let mut trimmed: Option<(PathBuf, PathBuf)> = None;

        if let Some(window) = self.options.trim {
            let out = path_with_suffix(&base, "-t", "mp4");
            let log = path_with_suffix(&base, "-t", "log");
            self.run_transform(transform::trim_args(&current, &out, window), &log, &out)
                .await?;
            trimmed = Some((out.clone(), log));
            current = out;
        }

        if let Some(format) = self.options.reencode {
            let suffix = if trimmed.is_some() { "-tr" } else { "-r" };
            let out = path_with_suffix(&base, suffix, "mp4");
            let log = path_with_suffix(&base, suffix, "log");
            self.run_transform(transform::reencode_args(&current, &out, format), &log, &out)
                .await?;
            // The trimmed intermediate is superseded by the re-encoded file.
            if let Some((file, log)) = trimmed.take() {
                let _ = std::fs::remove_file(&file);
                let _ = std::fs::remove_file(&log);
            }
            current = out;
        }

        tracing::info!(channel, path = %current.display(), "capture finished");
        Ok(current)
    }

    async fn stop(&self, channel: &str) {
        let handle = self.handles.lock().remove(channel);
        let Some(CaptureHandle { stop_tx, exited_rx }) = handle else {
            tracing::debug!(channel, "no capture process to stop");
            return;
        };

        tracing::info!(channel, "stopping capture");
        let _ = stop_tx.send(());
        let _ = exited_rx.await;
    }
}

/// `{base}{suffix}.{ext}` next to the capture output
fn path_with_suffix(base: &Path, suffix: &str, ext: &str) -> PathBuf {
    PathBuf::from(format!("{}{}.{}", base.display(), suffix, ext))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::service::ServiceError;

    struct NoStreams;

    #[async_trait]
    impl StreamService for NoStreams {
        async fn presence(&self, _channel: &str) -> Result<bool, ServiceError> {
            Ok(false)
        }

        async fn resolve(
            &self,
            _channel: &str,
            _quality: &str,
        ) -> Result<Option<String>, ServiceError> {
            Ok(None)
        }
    }

    fn manager() -> FfmpegCapture {
        FfmpegCapture::new(
            Arc::new(NoStreams),
            CaptureOptions {
                output_dir: PathBuf::from("vods"),
                desired_quality: "best".to_string(),
                trim: None,
                reencode: None,
                stop_timeout: Duration::from_secs(1),
            },
        )
    }

    #[tokio::test]
    async fn stop_without_a_capture_is_a_noop() {
        let capture = manager();
        capture.stop("ghost").await;
    }

    #[tokio::test]
    async fn start_without_a_stream_fails() {
        let capture = manager();
        let err = capture.start("alice").await.unwrap_err();
        assert!(matches!(err, CaptureError::NoStream(name) if name == "alice"));
    }

    #[test]
    fn suffixed_paths() {
        let base = PathBuf::from("vods/alice_20240101120000");
        assert_eq!(
            path_with_suffix(&base, "", "mp4"),
            PathBuf::from("vods/alice_20240101120000.mp4")
        );
        assert_eq!(
            path_with_suffix(&base, "-tr", "log"),
            PathBuf::from("vods/alice_20240101120000-tr.log")
        );
    }
}
