//! Board rendering through an external program.
//!
//! The program receives the board parameters and an output path through its
//! argument templates, for example an OpenCV script:
//!
//! ```yaml
//! renderer:
//!   program: python3
//!   args: ["tools/draw_charuco.py", "{width}", "{length}", "{square_length}",
//!          "{marker_length}", "{dictionary}", "{image_width}", "{image_height}",
//!          "{output}"]
//! ```

use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use tokio::fs;
use tracing::info;

use super::command::{self, CommandSpec, Vars};
use super::{AdapterError, BoardRenderer};
use crate::domain::{BoardSpec, ImageSize};

/// Renderer that shells out to a configured command
#[derive(Debug, Clone)]
pub struct CommandRenderer {
    spec: CommandSpec,
    timeout: Duration,
}

impl CommandRenderer {
    pub fn new(spec: CommandSpec, timeout: Duration) -> Self {
        Self { spec, timeout }
    }

    /// Build from optional config; no program means no renderer
    pub fn from_config(spec: Option<&CommandSpec>, timeout: Duration) -> Result<Self, AdapterError> {
        spec.cloned()
            .map(|spec| Self::new(spec, timeout))
            .ok_or(AdapterError::RendererNotConfigured)
    }

    /// Placeholder values for one render
    pub fn vars(board: &BoardSpec, size: ImageSize, output: &Path) -> Vars {
        let mut vars = Vars::new();
        vars.insert("width", board.width.to_string());
        vars.insert("length", board.length.to_string());
        vars.insert("square_length", board.square_length.to_string());
        vars.insert("marker_length", board.marker_length.to_string());
        vars.insert("dictionary", board.dictionary.selector().to_string());
        vars.insert("dictionary_name", board.dictionary.name().to_string());
        vars.insert("image_width", size.width.to_string());
        vars.insert("image_height", size.height.to_string());
        vars.insert("output", output.display().to_string());
        vars
    }
}

#[async_trait]
impl BoardRenderer for CommandRenderer {
    fn name(&self) -> &str {
        &self.spec.program
    }

    async fn render(
        &self,
        board: &BoardSpec,
        size: ImageSize,
        output: &Path,
    ) -> Result<(), AdapterError> {
        let vars = Self::vars(board, size, output);
        command::run(&self.spec, &vars, self.timeout).await?;

        // A renderer that exits 0 without writing anything is still a failure
        if !fs::try_exists(output).await.unwrap_or(false) {
            return Err(AdapterError::CommandFailed {
                program: self.spec.program.clone(),
                code: 0,
                stderr: format!("no image written to {}", output.display()),
            });
        }

        info!(renderer = %self.spec.program, output = %output.display(), "Board rendered");
        Ok(())
    }
}
