//! Streamlink-backed stream lookup
//!
//! Shells out to the `streamlink` CLI in JSON mode and reads the quality map
//! from its output. An offline channel is reported as an empty stream map, not
//! an error.

use super::{ServiceError, StreamService};
use async_trait::async_trait;
use std::collections::HashMap;
use std::path::PathBuf;
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;

const NO_STREAMS_MARKER: &str = "No playable streams";

/// Stream lookup backed by the `streamlink` CLI
pub struct StreamlinkService {
    program: PathBuf,
    base_url: String,
    timeout: Duration,
}

impl StreamlinkService {
    pub fn new(timeout: Duration) -> Self {
        Self {
            program: PathBuf::from("streamlink"),
            base_url: "https://www.twitch.tv".to_string(),
            timeout,
        }
    }

    /// Override the `streamlink` executable path
    pub fn with_program(mut self, program: impl Into<PathBuf>) -> Self {
        self.program = program.into();
        self
    }

    /// Override the stream platform base URL
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Fetch the quality -> URL map for a channel
    async fn streams(&self, channel: &str) -> Result<HashMap<String, String>, ServiceError> {
        let url = format!("{}/{}", self.base_url, channel);
        // kill_on_drop: a timed-out lookup must not leave the child running
        // behind the abandoned future.
        let output = tokio::time::timeout(
            self.timeout,
            Command::new(&self.program)
                .args(["--json", &url])
                .stdin(Stdio::null())
                .kill_on_drop(true)
                .output(),
        )
        .await
        .map_err(|_| ServiceError::Timeout(channel.to_string()))??;

        // streamlink exits non-zero for offline channels; the JSON payload is
        // what distinguishes "no streams" from a real failure.
        let value: serde_json::Value = serde_json::from_slice(&output.stdout)
            .map_err(|e| ServiceError::Lookup(format!("unparseable streamlink output: {e}")))?;

        if let Some(err) = value.get("error").and_then(|e| e.as_str()) {
            if err.contains(NO_STREAMS_MARKER) {
                return Ok(HashMap::new());
            }
            return Err(ServiceError::Lookup(err.to_string()));
        }

        let mut streams = HashMap::new();
        if let Some(map) = value.get("streams").and_then(|s| s.as_object()) {
            for (name, entry) in map {
                if let Some(url) = entry.get("url").and_then(|u| u.as_str()) {
                    streams.insert(name.clone(), url.to_string());
                }
            }
        }
        Ok(streams)
    }
}

#[async_trait]
impl StreamService for StreamlinkService {
    async fn presence(&self, channel: &str) -> Result<bool, ServiceError> {
        Ok(!self.streams(channel).await?.is_empty())
    }

    async fn resolve(
        &self,
        channel: &str,
        quality: &str,
    ) -> Result<Option<String>, ServiceError> {
        let mut streams = self.streams(channel).await?;
        if let Some(url) = streams.remove(quality) {
            return Ok(Some(url));
        }
        Ok(streams.remove("best"))
    }
}
