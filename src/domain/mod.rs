//! Domain types for calibcat.
//!
//! This module contains the core data structures:
//! - Record: Provenance entry stored in the catalog
//! - ContentDigest: Content hash that keys records and names artifacts
//! - BoardSpec: ChArUco board parameters and their validation
//! - Artifact: Image bytes produced by a renderer or a camera

pub mod artifact;
pub mod board;
pub mod digest;
pub mod record;

// Re-export commonly used types
pub use artifact::{Artifact, ImageFormat};
pub use board::{
    BoardError, BoardLayout, BoardSpec, Dictionary, ImageSize, DEFAULT_IMAGE_HEIGHT, DEFAULT_IMAGE_WIDTH,
};
pub use digest::ContentDigest;
pub use record::{ParamValue, Params, Record};
