//! Streamlink CLI lookup against fake executables.

use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use std::time::Duration;
use vodkeeper::service::{ServiceError, StreamService, StreamlinkService};

fn fake_streamlink(dir: &Path, body: &str) -> PathBuf {
    let path = dir.join("streamlink");
    fs::write(&path, format!("#!/bin/sh\n{body}\n")).unwrap();
    fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).unwrap();
    path
}

#[tokio::test]
async fn presence_reads_the_stream_map() {
    let dir = tempfile::tempdir().unwrap();
    let script = fake_streamlink(
        dir.path(),
        r#"echo '{"streams": {"best": {"url": "https://cdn.example/best.m3u8"}, "720p60": {"url": "https://cdn.example/720.m3u8"}}}'"#,
    );
    let service = StreamlinkService::new(Duration::from_secs(5)).with_program(script);

    assert!(service.presence("alice").await.unwrap());
    assert_eq!(
        service.resolve("alice", "720p60").await.unwrap(),
        Some("https://cdn.example/720.m3u8".to_string())
    );
    // Unavailable qualities fall back to the best stream.
    assert_eq!(
        service.resolve("alice", "1080p60").await.unwrap(),
        Some("https://cdn.example/best.m3u8".to_string())
    );
}

#[tokio::test]
async fn no_playable_streams_is_offline_not_an_error() {
    let dir = tempfile::tempdir().unwrap();
    let script = fake_streamlink(
        dir.path(),
        r#"echo '{"error": "No playable streams found on this URL: https://www.twitch.tv/alice"}'"#,
    );
    let service = StreamlinkService::new(Duration::from_secs(5)).with_program(script);

    assert!(!service.presence("alice").await.unwrap());
}

#[tokio::test]
async fn timed_out_lookup_kills_the_child() {
    let dir = tempfile::tempdir().unwrap();
    let script = fake_streamlink(
        dir.path(),
        "echo $$ > \"$(dirname \"$0\")/pid\"\nexec sleep 10",
    );
    let service = StreamlinkService::new(Duration::from_millis(100)).with_program(script);

    let err = service.presence("alice").await.unwrap_err();
    assert!(matches!(err, ServiceError::Timeout(_)), "got {err}");

    // The killed child may linger briefly as a zombie until it is reaped.
    tokio::time::sleep(Duration::from_millis(300)).await;
    let pid: u32 = fs::read_to_string(dir.path().join("pid"))
        .unwrap()
        .trim()
        .parse()
        .unwrap();
    assert!(
        !process_is_running(pid),
        "streamlink child survived the timeout"
    );
}

fn process_is_running(pid: u32) -> bool {
    match fs::read_to_string(format!("/proc/{pid}/stat")) {
        Err(_) => false,
        Ok(stat) => {
            let state = stat
                .rsplit_once(')')
                .and_then(|(_, rest)| rest.trim_start().chars().next());
            state != Some('Z')
        }
    }
}
