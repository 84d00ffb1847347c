//! Content digests for artifacts.
//!
//! The digest identifies an artifact by its bytes. It is used for
//! deduplication and file naming only, never for security.

use std::fmt;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Lowercase hex SHA-256 of an artifact's raw bytes
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ContentDigest(String);

impl ContentDigest {
    /// Hex length of a SHA-256 digest
    pub const HEX_LEN: usize = 64;

    /// Hash raw bytes
    pub fn of(bytes: &[u8]) -> Self {
        let result = Sha256::digest(bytes);
        Self(hex::encode(result))
    }

    /// Wrap a digest string read from elsewhere (catalog, CLI).
    ///
    /// Accepts any non-empty hex string so catalogs written with a
    /// different digest length still resolve. Uppercase input is folded.
    pub fn parse(s: &str) -> Option<Self> {
        let s = s.trim();
        if s.is_empty() || !s.chars().all(|c| c.is_ascii_hexdigit()) {
            return None;
        }
        Some(Self(s.to_ascii_lowercase()))
    }

    /// Whether this is a SHA-256 digest that [`ContentDigest::of`] could produce
    pub fn is_sha256(&self) -> bool {
        self.0.len() == Self::HEX_LEN
    }

    /// Get the raw string value
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// First 12 hex chars, for tables and log lines
    pub fn short(&self) -> &str {
        &self.0[..self.0.len().min(12)]
    }

    /// File name for an artifact with this digest
    pub fn file_name(&self, extension: &str) -> String {
        format!("{}.{}", self.0, extension)
    }
}

impl fmt::Display for ContentDigest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AsRef<str> for ContentDigest {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
