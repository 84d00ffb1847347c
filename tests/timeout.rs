//! Timeout Integration Tests
//!
//! Tests that external programs are bounded by their configured limits.

#![cfg(unix)]

use std::time::{Duration, Instant};

use calibcat::adapters::{
    AdapterError, BoardRenderer, CommandFrameSource, CommandRenderer, CommandSpec, FrameSource,
};
use calibcat::domain::{BoardSpec, ImageSize};
use tempfile::TempDir;

#[tokio::test]
async fn test_slow_renderer_times_out() {
    let temp = TempDir::new().unwrap();
    let renderer = CommandRenderer::new(
        CommandSpec::new("sleep").with_args(["5"]),
        Duration::from_millis(200),
    );
    let spec = BoardSpec::new(5, 7, 0.04, 0.02, 0).unwrap();

    let start = Instant::now();
    let result = renderer
        .render(&spec, ImageSize::default(), &temp.path().join("board.png"))
        .await;

    assert!(matches!(result, Err(AdapterError::Timeout { .. })));
    assert!(start.elapsed() < Duration::from_secs(4));
}

#[tokio::test]
async fn test_slow_camera_times_out() {
    let mut camera = CommandFrameSource::new(
        CommandSpec::new("sleep").with_args(["5"]),
        "fake-device",
        Duration::from_millis(200),
    );

    let start = Instant::now();
    let result = camera.grab().await;

    assert!(matches!(result, Err(AdapterError::Timeout { .. })));
    assert!(start.elapsed() < Duration::from_secs(4));
}

#[tokio::test]
async fn test_fast_command_within_limit() {
    let mut camera = CommandFrameSource::new(
        CommandSpec::new("printf").with_args(["frame"]),
        "fake-device",
        Duration::from_secs(10),
    );

    assert_eq!(camera.grab().await.unwrap(), b"frame");
}
