//! Image artifacts produced by renderers and cameras.

use std::path::Path;

use serde::{Deserialize, Serialize};

use super::digest::ContentDigest;

/// Image file format, detected from content or file name
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ImageFormat {
    Png,
    Jpeg,
}

impl ImageFormat {
    const PNG_MAGIC: &'static [u8] = b"\x89PNG\r\n\x1a\n";
    const JPEG_MAGIC: &'static [u8] = &[0xff, 0xd8, 0xff];

    /// File extension without the dot
    pub fn extension(self) -> &'static str {
        match self {
            ImageFormat::Png => "png",
            ImageFormat::Jpeg => "jpg",
        }
    }

    /// Sniff the format from leading bytes
    pub fn detect(bytes: &[u8]) -> Option<Self> {
        if bytes.starts_with(Self::PNG_MAGIC) {
            Some(ImageFormat::Png)
        } else if bytes.starts_with(Self::JPEG_MAGIC) {
            Some(ImageFormat::Jpeg)
        } else {
            None
        }
    }

    /// Guess the format from a file extension
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_lowercase();
        match ext.as_str() {
            "png" => Some(ImageFormat::Png),
            "jpg" | "jpeg" => Some(ImageFormat::Jpeg),
            _ => None,
        }
    }
}

/// Image bytes plus what we know about them
#[derive(Debug, Clone)]
pub struct Artifact {
    pub format: ImageFormat,
    pub bytes: Vec<u8>,
}

impl Artifact {
    /// Wrap raw bytes, sniffing the format and falling back to `fallback`
    pub fn new(bytes: Vec<u8>, fallback: ImageFormat) -> Self {
        let format = ImageFormat::detect(&bytes).unwrap_or(fallback);
        Self { format, bytes }
    }

    /// Content digest of the bytes
    pub fn digest(&self) -> ContentDigest {
        ContentDigest::of(&self.bytes)
    }

    /// Size in bytes
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    /// Whether the artifact carries no data
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}
