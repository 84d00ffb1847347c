//! Adapter interfaces for external programs.
//!
//! calibcat never draws boards, talks to camera drivers or opens windows
//! itself. Each of those is an external command behind one of these traits,
//! so the rest of the crate can be exercised with in-process fakes.

pub mod camera;
pub mod command;
pub mod renderer;
pub mod viewer;

use std::io;
use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::{BoardSpec, ImageSize};

pub use camera::CommandFrameSource;
pub use command::CommandSpec;
pub use renderer::CommandRenderer;
pub use viewer::CommandViewer;

/// Errors raised by adapters
#[derive(Debug, Error)]
pub enum AdapterError {
    #[error("Device unavailable: {0}")]
    DeviceUnavailable(String),

    #[error("No frame received from {0}")]
    NoFrame(String),

    #[error("No board renderer configured; set renderer.program in .calibcat/config.yaml or pass --image")]
    RendererNotConfigured,

    #[error("Failed to start {program}: {source}")]
    Spawn { program: String, source: io::Error },

    #[error("{program} failed with exit code {code}: {stderr}")]
    CommandFailed {
        program: String,
        code: i32,
        stderr: String,
    },

    #[error("{program} timed out after {timeout:?}")]
    Timeout { program: String, timeout: Duration },

    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

impl AdapterError {
    /// Collapse launch failures into `DeviceUnavailable` for `device`
    pub(crate) fn into_device_error(self, device: &str) -> Self {
        match self {
            AdapterError::Spawn { program, source } => AdapterError::DeviceUnavailable(format!(
                "{} (could not start {}: {})",
                device, program, source
            )),
            AdapterError::CommandFailed { stderr, .. } => {
                AdapterError::DeviceUnavailable(format!("{}: {}", device, stderr))
            }
            other => other,
        }
    }
}

/// Draws a board image to a file
#[async_trait]
pub trait BoardRenderer: Send + Sync {
    /// Human-readable renderer name
    fn name(&self) -> &str;

    /// Render `spec` at `size` pixels into `output`
    async fn render(
        &self,
        spec: &BoardSpec,
        size: ImageSize,
        output: &Path,
    ) -> Result<(), AdapterError>;
}

/// Produces encoded camera frames
#[async_trait]
pub trait FrameSource: Send {
    /// Human-readable source name (device path, URL)
    fn name(&self) -> &str;

    /// Fail early with `DeviceUnavailable` if the source cannot work
    async fn check_available(&mut self) -> Result<(), AdapterError>;

    /// Grab one encoded frame
    async fn grab(&mut self) -> Result<Vec<u8>, AdapterError>;
}

/// Puts an image in front of the operator
#[async_trait]
pub trait ImageViewer: Send + Sync {
    async fn show(&self, path: &Path) -> Result<(), AdapterError>;
}
