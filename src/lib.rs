//! calibcat - ChArUco calibration board catalog
//!
//! Generates calibration boards, stores each rendered image under the
//! SHA-256 of its bytes and keeps a JSON catalog of the parameters that
//! produced it. Also captures numbered calibration frames from a camera.
//!
//! # Architecture
//!
//! The catalog is keyed by content hash:
//! - Rendering the same board twice yields the same hash
//! - Upserting a record with a known hash replaces it in place
//! - A new hash is appended, so stored order is generation order
//!
//! # Modules
//!
//! - `adapters`: External programs (renderer, frame grabber, viewer)
//! - `capture`: Keypress-driven capture session
//! - `core`: Board generation flow
//! - `domain`: Data structures (Record, BoardSpec, ContentDigest)
//! - `library`: Catalog and content-addressed image storage
//! - `cli`: Command-line interface
//!
//! # Usage
//!
//! ```bash
//! # Generate a 5x7 board with the 4x4_50 dictionary
//! calibcat generate -w 5 -l 7 -s 0.04 -m 0.02 -d 0
//!
//! # Look at a board before recording it
//! calibcat preview -w 5 -l 7 -d 0
//!
//! # Capture frames (space saves, escape quits)
//! calibcat capture
//! ```

pub mod adapters;
pub mod capture;
pub mod cli;
pub mod config;
pub mod core;
pub mod domain;
pub mod library;

// Re-export main types at crate root for convenience
pub use capture::{CaptureSession, KeyReader};
pub use core::{BoardGenerator, BoardSource};
pub use domain::{BoardSpec, ContentDigest, Dictionary, ImageSize, ParamValue, Record};
pub use library::{Catalog, CatalogError, CatalogStore, ContentStore, Upsert};
