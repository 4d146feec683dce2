//! FFmpeg command construction
//!
//! Pure builders for the capture, trim, re-encode, and resize invocations.
//! Keeping these as plain argument vectors makes every pipeline step
//! testable without spawning a process.

use super::CaptureError;
use std::fmt;
use std::path::Path;
use std::str::FromStr;

/// Target resolution and frame rate parsed from a `"{height}p{fps}"` string
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReencodeFormat {
    pub height: u32,
    pub fps: u32,
}

impl FromStr for ReencodeFormat {
    type Err = CaptureError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.to_ascii_lowercase();
        let invalid = || CaptureError::InvalidFormat(s.to_string());

        let (height, fps) = lower.split_once('p').ok_or_else(invalid)?;
        if height.is_empty() || fps.is_empty() || fps.contains('p') {
            return Err(invalid());
        }
        Ok(Self {
            height: height.parse().map_err(|_| invalid())?,
            fps: fps.parse().map_err(|_| invalid())?,
        })
    }
}

impl fmt::Display for ReencodeFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}p{}", self.height, self.fps)
    }
}

/// Time window for the trim step, in seconds from the start of the capture
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TrimWindow {
    pub start_secs: u64,
    pub end_secs: u64,
}

/// Arguments for the stream capture itself (stream copy, no transcode)
pub fn capture_args(url: &str, output: &Path) -> Vec<String> {
    vec![
        "-i".to_string(),
        url.to_string(),
        "-c".to_string(),
        "copy".to_string(),
        "-bsf:a".to_string(),
        "aac_adtstoasc".to_string(),
        output.to_string_lossy().to_string(),
    ]
}

/// Arguments for the time-windowed trim step (stream copy)
pub fn trim_args(input: &Path, output: &Path, window: TrimWindow) -> Vec<String> {
    vec![
        "-i".to_string(),
        input.to_string_lossy().to_string(),
        "-c".to_string(),
        "copy".to_string(),
        "-ss".to_string(),
        window.start_secs.to_string(),
        "-to".to_string(),
        window.end_secs.to_string(),
        "-ignore_chapters".to_string(),
        "1".to_string(),
        output.to_string_lossy().to_string(),
    ]
}

/// Arguments for the resolution/frame-rate normalization step
pub fn reencode_args(input: &Path, output: &Path, format: ReencodeFormat) -> Vec<String> {
    vec![
        "-i".to_string(),
        input.to_string_lossy().to_string(),
        "-vf".to_string(),
        format!("scale=-2:{}", format.height),
        "-r".to_string(),
        format.fps.to_string(),
        "-c:v".to_string(),
        "libx264".to_string(),
        "-preset".to_string(),
        "fast".to_string(),
        "-c:a".to_string(),
        "aac".to_string(),
        "-strict".to_string(),
        "experimental".to_string(),
        output.to_string_lossy().to_string(),
    ]
}

/// Arguments for the batch-import resize pass (audio is copied untouched)
pub fn scale_args(input: &Path, output: &Path, resolution: (u32, u32)) -> Vec<String> {
    let (width, height) = resolution;
    vec![
        "-i".to_string(),
        input.to_string_lossy().to_string(),
        "-vf".to_string(),
        format!("scale={width}:{height}"),
        "-c:a".to_string(),
        "copy".to_string(),
        output.to_string_lossy().to_string(),
    ]
}
