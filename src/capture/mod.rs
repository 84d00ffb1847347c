//! Interactive frame capture.
//!
//! A session reads single keys, grabs a frame from a [`FrameSource`] on the
//! capture key and writes it under a running sequence number.
//!
//! [`FrameSource`]: crate::adapters::FrameSource

pub mod keys;
pub mod session;

pub use keys::{KeyAction, KeyReader, CAPTURE_KEY, EXIT_KEY};
pub use session::{next_free_seq, CaptureError, CaptureSession, CaptureSummary, SessionState, Transition};
