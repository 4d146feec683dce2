//! Configuration
//!
//! Read once at startup from a JSON file. A malformed re-encoding format
//! string fails the load, before any process is spawned.

use crate::capture::{ReencodeFormat, TrimWindow};
use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Top-level configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Channel names to monitor
    pub channels: Vec<String>,

    /// Directory receiving captures and sidecar logs
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,

    /// Stream quality requested from the lookup service
    #[serde(default = "default_quality")]
    pub desired_quality: String,

    /// Seconds between monitor ticks
    #[serde(default = "default_check_interval")]
    pub check_interval_secs: u64,

    /// Worker-pool capacity for concurrent inference jobs
    #[serde(default = "default_max_inference_jobs")]
    pub max_inference_jobs: usize,

    /// Seconds to wait for a graceful capture stop before killing
    #[serde(default = "default_stop_timeout")]
    pub stop_timeout_secs: u64,

    #[serde(default)]
    pub trimming: TrimConfig,

    #[serde(default)]
    pub reencoding: ReencodeConfig,

    #[serde(default)]
    pub inference: InferenceConfig,

    #[serde(default)]
    pub import: ImportConfig,
}

/// Time-windowed extraction after capture
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrimConfig {
    #[serde(default)]
    pub enabled: bool,

    #[serde(default)]
    pub start_minutes: u64,

    #[serde(default = "default_trim_end")]
    pub end_minutes: u64,
}

impl Default for TrimConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            start_minutes: 0,
            end_minutes: default_trim_end(),
        }
    }
}

impl TrimConfig {
    pub fn window(&self) -> Option<TrimWindow> {
        self.enabled.then(|| TrimWindow {
            start_secs: self.start_minutes * 60,
            end_secs: self.end_minutes * 60,
        })
    }
}

/// Resolution/frame-rate normalization after capture
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReencodeConfig {
    #[serde(default)]
    pub enabled: bool,

    /// Target as `"{height}p{fps}"`, e.g. `"1080p60"`
    #[serde(default = "default_reencode_format")]
    pub format: String,
}

impl Default for ReencodeConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            format: default_reencode_format(),
        }
    }
}

impl ReencodeConfig {
    /// Parsed target when re-encoding is enabled
    pub fn target(&self) -> anyhow::Result<Option<ReencodeFormat>> {
        if !self.enabled {
            return Ok(None);
        }
        Ok(Some(self.format.parse()?))
    }
}

/// External inference command
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InferenceConfig {
    #[serde(default = "default_inference_program")]
    pub program: String,

    /// Leading arguments; the file path, slot, and input directory are
    /// appended per job
    #[serde(default = "default_inference_args")]
    pub args: Vec<String>,
}

impl Default for InferenceConfig {
    fn default() -> Self {
        Self {
            program: default_inference_program(),
            args: default_inference_args(),
        }
    }
}

/// Batch folder import
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImportConfig {
    /// Normalize resolution into a `tmp/` subfolder before enqueueing
    #[serde(default)]
    pub resize: bool,

    /// Target resolution for the resize pass
    #[serde(default = "default_resolution")]
    pub resolution: (u32, u32),
}

impl Default for ImportConfig {
    fn default() -> Self {
        Self {
            resize: false,
            resolution: default_resolution(),
        }
    }
}

impl Config {
    /// Load and validate configuration from a JSON file
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("reading {}", path.display()))?;
        let config: Config =
            serde_json::from_str(&content).with_context(|| format!("parsing {}", path.display()))?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> anyhow::Result<()> {
        self.reencoding
            .format
            .parse::<ReencodeFormat>()
            .with_context(|| format!("re-encoding format {:?}", self.reencoding.format))?;
        anyhow::ensure!(
            self.max_inference_jobs >= 1,
            "max_inference_jobs must be at least 1"
        );
        anyhow::ensure!(
            self.check_interval_secs >= 1,
            "check_interval_secs must be at least 1"
        );
        Ok(())
    }

    pub fn check_interval(&self) -> Duration {
        Duration::from_secs(self.check_interval_secs)
    }

    pub fn stop_timeout(&self) -> Duration {
        Duration::from_secs(self.stop_timeout_secs)
    }
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("vods")
}

fn default_quality() -> String {
    "best".to_string()
}

fn default_check_interval() -> u64 {
    60
}

fn default_max_inference_jobs() -> usize {
    2
}

fn default_stop_timeout() -> u64 {
    10
}

fn default_trim_end() -> u64 {
    5
}

fn default_reencode_format() -> String {
    "1080p60".to_string()
}

fn default_inference_program() -> String {
    "python3".to_string()
}

fn default_inference_args() -> Vec<String> {
    vec!["inference.py".to_string()]
}

fn default_resolution() -> (u32, u32) {
    (1920, 1080)
}
