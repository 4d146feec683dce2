//! Capture pipeline sequencing against a fake ffmpeg executable.
//!
//! The stand-in records every invocation and creates the output file its
//! caller expects (always the last argument), so the transform chain runs
//! end to end without touching real media.

use async_trait::async_trait;
use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use vodkeeper::capture::{Capture, CaptureOptions, FfmpegCapture, TrimWindow};
use vodkeeper::service::{ServiceError, StreamService};

struct FixedUrl;

#[async_trait]
impl StreamService for FixedUrl {
    async fn presence(&self, _channel: &str) -> Result<bool, ServiceError> {
        Ok(true)
    }

    async fn resolve(
        &self,
        _channel: &str,
        _quality: &str,
    ) -> Result<Option<String>, ServiceError> {
        Ok(Some("https://cdn.example/live.m3u8".to_string()))
    }
}

fn fake_ffmpeg(dir: &Path) -> PathBuf {
    let path = dir.join("ffmpeg");
    fs::write(
        &path,
        concat!(
            "#!/bin/sh\n",
            "dir=\"$(dirname \"$0\")\"\n",
            "printf '%s\\n' \"$*\" >> \"$dir/invocations.log\"\n",
            "for last; do :; done\n",
            ": > \"$last\"\n",
        ),
    )
    .unwrap();
    fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).unwrap();
    path
}

fn invocations(dir: &Path) -> Vec<String> {
    fs::read_to_string(dir.join("invocations.log"))
        .unwrap_or_default()
        .lines()
        .map(str::to_string)
        .collect()
}

fn manager(dir: &Path, trim: Option<TrimWindow>, reencode: &str) -> FfmpegCapture {
    FfmpegCapture::new(
        Arc::new(FixedUrl),
        CaptureOptions {
            output_dir: dir.join("vods"),
            desired_quality: "best".to_string(),
            trim,
            reencode: Some(reencode.parse().unwrap()),
            stop_timeout: Duration::from_secs(1),
        },
    )
    .with_program(fake_ffmpeg(dir))
}

#[tokio::test]
async fn reencode_without_trim_keeps_the_raw_capture() {
    let dir = tempfile::tempdir().unwrap();
    let capture = manager(dir.path(), None, "720p30");

    let path = capture.start("alice").await.unwrap();
    let name = path.file_name().unwrap().to_string_lossy().into_owned();
    assert!(
        name.starts_with("alice_") && name.ends_with("-r.mp4"),
        "unexpected output name {name}"
    );

    let runs = invocations(dir.path());
    assert_eq!(runs.len(), 2, "expected capture + re-encode, got {runs:?}");
    assert!(runs[0].contains("https://cdn.example/live.m3u8"));
    assert!(runs[1].contains("scale=-2:720"));
    assert!(runs[1].contains("-r 30"));

    // The raw capture is not an intermediate; it stays on disk.
    let raw = PathBuf::from(path.to_string_lossy().replace("-r.mp4", ".mp4"));
    assert!(raw.exists(), "raw capture was removed");
    assert!(path.exists());
}

#[tokio::test]
async fn trimmed_intermediate_is_deleted_after_reencode() {
    let dir = tempfile::tempdir().unwrap();
    let window = TrimWindow {
        start_secs: 0,
        end_secs: 300,
    };
    let capture = manager(dir.path(), Some(window), "720p30");

    let path = capture.start("alice").await.unwrap();
    let name = path.file_name().unwrap().to_string_lossy().into_owned();
    assert!(name.ends_with("-tr.mp4"), "unexpected output name {name}");

    let runs = invocations(dir.path());
    assert_eq!(
        runs.len(),
        3,
        "expected capture + trim + re-encode, got {runs:?}"
    );

    let stem = path.to_string_lossy().replace("-tr.mp4", "");
    assert!(
        PathBuf::from(format!("{stem}.mp4")).exists(),
        "raw capture was removed"
    );
    assert!(
        !PathBuf::from(format!("{stem}-t.mp4")).exists(),
        "trimmed intermediate was retained"
    );
    assert!(!PathBuf::from(format!("{stem}-t.log")).exists());
}
