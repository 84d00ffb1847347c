//! Showing images with the desktop's default viewer.

use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;

use super::command::{self, CommandSpec, Vars};
use super::{AdapterError, ImageViewer};

/// Platform opener, with the image path appended
pub fn default_view_command() -> CommandSpec {
    let program = if cfg!(target_os = "macos") {
        "open"
    } else {
        "xdg-open"
    };
    CommandSpec::new(program).with_args(["{path}"])
}

/// Viewer that hands the file to an external program
#[derive(Debug, Clone)]
pub struct CommandViewer {
    spec: CommandSpec,
    timeout: Duration,
}

impl CommandViewer {
    pub fn new(spec: CommandSpec, timeout: Duration) -> Self {
        Self { spec, timeout }
    }
}

#[async_trait]
impl ImageViewer for CommandViewer {
    async fn show(&self, path: &Path) -> Result<(), AdapterError> {
        let mut vars = Vars::new();
        vars.insert("path", path.display().to_string());

        command::run(&self.spec, &vars, self.timeout)
            .await
            .map_err(|e| e.into_device_error("display"))?;
        Ok(())
    }
}
