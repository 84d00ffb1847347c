//! Camera frames through an external grabber.
//!
//! The default grabber is ffmpeg, asked for a single PNG frame on stdout.

use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;

use super::command::{self, CommandSpec, Vars};
use super::{AdapterError, FrameSource};

/// Default video input device
pub fn default_device() -> String {
    if cfg!(target_os = "macos") {
        "0".to_string()
    } else {
        "/dev/video0".to_string()
    }
}

/// Default single-frame grab command, `{device}` filled in per call
pub fn default_grab_command() -> CommandSpec {
    let input_format = if cfg!(target_os = "macos") {
        "avfoundation"
    } else {
        "v4l2"
    };

    CommandSpec::new("ffmpeg").with_args([
        "-hide_banner",
        "-loglevel",
        "error",
        "-f",
        input_format,
        "-i",
        "{device}",
        "-frames:v",
        "1",
        "-f",
        "image2pipe",
        "-vcodec",
        "png",
        "-",
    ])
}

/// Frame source that runs a grab command per frame
#[derive(Debug, Clone)]
pub struct CommandFrameSource {
    spec: CommandSpec,
    device: String,
    timeout: Duration,
}

impl CommandFrameSource {
    pub fn new(spec: CommandSpec, device: impl Into<String>, timeout: Duration) -> Self {
        Self {
            spec,
            device: device.into(),
            timeout,
        }
    }

    fn vars(&self) -> Vars {
        let mut vars = Vars::new();
        vars.insert("device", self.device.clone());
        vars
    }
}

#[async_trait]
impl FrameSource for CommandFrameSource {
    fn name(&self) -> &str {
        &self.device
    }

    async fn check_available(&mut self) -> Result<(), AdapterError> {
        // Only device nodes can be checked up front; indexes and URLs
        // are left to the grabber
        if self.device.starts_with('/') && !Path::new(&self.device).exists() {
            return Err(AdapterError::DeviceUnavailable(format!(
                "{} does not exist",
                self.device
            )));
        }
        Ok(())
    }

    async fn grab(&mut self) -> Result<Vec<u8>, AdapterError> {
        let output = command::run(&self.spec, &self.vars(), self.timeout)
            .await
            .map_err(|e| e.into_device_error(&self.device))?;

        if output.stdout.is_empty() {
            return Err(AdapterError::NoFrame(self.device.clone()));
        }

        Ok(output.stdout)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_command_takes_device() {
        let spec = default_grab_command();
        assert_eq!(spec.program, "ffmpeg");
        assert!(spec.args.iter().any(|a| a == "{device}"));
        assert_eq!(spec.args.last().map(String::as_str), Some("-"));
    }

    #[tokio::test]
    async fn test_missing_device_node_is_unavailable() {
        let mut source = CommandFrameSource::new(
            default_grab_command(),
            "/dev/calibcat-no-such-camera",
            Duration::from_secs(1),
        );

        assert!(matches!(
            source.check_available().await,
            Err(AdapterError::DeviceUnavailable(_))
        ));
    }

    #[tokio::test]
    async fn test_device_index_is_available() {
        let mut source = CommandFrameSource::new(default_grab_command(), "0", Duration::from_secs(1));
        assert!(source.check_available().await.is_ok());
    }

    #[tokio::test]
    async fn test_missing_grabber_is_device_error() {
        let mut source = CommandFrameSource::new(
            CommandSpec::new("calibcat-no-such-grabber"),
            "0",
            Duration::from_secs(1),
        );

        assert!(matches!(
            source.grab().await,
            Err(AdapterError::DeviceUnavailable(_))
        ));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_grab_reads_stdout() {
        let spec = CommandSpec::new("sh").with_args(["-c", "printf 'frame-from-{device}'"]);
        let mut source = CommandFrameSource::new(spec, "cam", Duration::from_secs(5));

        assert_eq!(source.grab().await.unwrap(), b"frame-from-cam");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_empty_output_is_no_frame() {
        let mut source = CommandFrameSource::new(CommandSpec::new("true"), "cam", Duration::from_secs(5));

        assert!(matches!(source.grab().await, Err(AdapterError::NoFrame(_))));
    }
}
