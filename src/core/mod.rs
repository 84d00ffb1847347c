//! Core workflows.
//!
//! This module contains:
//! - Generator: render a board, store it by digest, record it in the catalog

pub mod generator;

// Re-export commonly used types
pub use generator::{render_board, BoardGenerator, BoardSource, GenerateOutcome, RenderedBoard};
