//! Keypress-driven capture session.
//!
//! Two states. While `Awaiting`, the capture key grabs a frame and writes
//! it as `image_<seq>.<ext>`; the exit key (or end of input) moves to
//! `Finished`. Every other key is ignored.

use std::path::{Path, PathBuf};

use thiserror::Error;
use tokio::fs;
use tokio::io::AsyncRead;
use tracing::{debug, info};

use super::keys::{KeyAction, KeyReader};
use crate::adapters::{AdapterError, FrameSource};
use crate::config::paths;
use crate::domain::{Artifact, ImageFormat};
use crate::library::write_atomic_async;

/// Errors that end a capture session
#[derive(Debug, Error)]
pub enum CaptureError {
    #[error(transparent)]
    Device(#[from] AdapterError),

    #[error("Failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to read key input: {0}")]
    Input(std::io::Error),
}

/// Session state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Awaiting,
    Finished,
}

/// What a single key did
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Transition {
    /// A frame was written to this path
    Captured(PathBuf),

    /// Key had no meaning in the current state
    Ignored,

    /// Session ended
    Finished,
}

/// Summary of a finished session
#[derive(Debug, Clone, Default)]
pub struct CaptureSummary {
    /// Frames written, in capture order
    pub written: Vec<PathBuf>,
    /// Sequence number the next session should start at
    pub next_seq: u32,
}

/// Capture state machine over a frame source
pub struct CaptureSession<F> {
    source: F,
    out_dir: PathBuf,
    next_seq: u32,
    state: SessionState,
    written: Vec<PathBuf>,
}

impl<F: FrameSource> CaptureSession<F> {
    pub fn new(source: F, out_dir: impl Into<PathBuf>, start_seq: u32) -> Self {
        Self {
            source,
            out_dir: out_dir.into(),
            next_seq: start_seq,
            state: SessionState::Awaiting,
            written: Vec::new(),
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn next_seq(&self) -> u32 {
        self.next_seq
    }

    /// Apply one key press
    pub async fn handle_key(&mut self, key: u8) -> Result<Transition, CaptureError> {
        if self.state == SessionState::Finished {
            return Ok(Transition::Ignored);
        }

        match KeyAction::from_byte(key) {
            KeyAction::Capture => {
                let path = self.capture_frame().await?;
                Ok(Transition::Captured(path))
            }
            KeyAction::Exit => {
                info!("Exit key pressed, closing");
                self.state = SessionState::Finished;
                Ok(Transition::Finished)
            }
            KeyAction::Ignore => {
                debug!(key, "Ignoring key");
                Ok(Transition::Ignored)
            }
        }
    }

    /// Check the source, then apply keys until the session finishes
    pub async fn run<R: AsyncRead + Unpin>(
        mut self,
        keys: &mut KeyReader<R>,
    ) -> Result<CaptureSummary, CaptureError> {
        self.source.check_available().await?;
        fs::create_dir_all(&self.out_dir)
            .await
            .map_err(|source| CaptureError::Write {
                path: self.out_dir.clone(),
                source,
            })?;

        info!(source = %self.source.name(), dir = %self.out_dir.display(), "Capture session started");

        while self.state == SessionState::Awaiting {
            match keys.next_key().await.map_err(CaptureError::Input)? {
                Some(key) => {
                    self.handle_key(key).await?;
                }
                None => {
                    debug!("Key input closed");
                    self.state = SessionState::Finished;
                }
            }
        }

        Ok(CaptureSummary {
            written: self.written,
            next_seq: self.next_seq,
        })
    }

    async fn capture_frame(&mut self) -> Result<PathBuf, CaptureError> {
        let bytes = self.source.grab().await?;
        let frame = Artifact::new(bytes, ImageFormat::Png);

        let name = paths::capture_file_name(self.next_seq, frame.format.extension());
        let path = self.out_dir.join(name);

        write_atomic_async(path.clone(), frame.bytes)
            .await
            .map_err(|source| CaptureError::Write {
                path: path.clone(),
                source,
            })?;

        info!(seq = self.next_seq, path = %path.display(), "Image written");
        self.next_seq = self.next_seq.saturating_add(1);
        self.written.push(path.clone());
        Ok(path)
    }
}

/// First sequence number not used by an existing capture in `dir`
pub async fn next_free_seq(dir: &Path) -> std::io::Result<u32> {
    let mut entries = match fs::read_dir(dir).await {
        Ok(entries) => entries,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(0),
        Err(e) => return Err(e),
    };

    let mut next = 0;
    while let Some(entry) = entries.next_entry().await? {
        if let Some(seq) = entry.file_name().to_str().and_then(paths::capture_seq) {
            next = next.max(seq.saturating_add(1));
        }
    }
    Ok(next)
}
