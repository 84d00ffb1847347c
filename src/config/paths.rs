//! Canonical file names for calibcat.
//!
//! Single source of truth - import this instead of hardcoding names.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use calibcat::config::paths;
//!
//! let frame = images_dir.join(paths::capture_file_name(3, "png")); // image_3.png
//! ```

use std::path::PathBuf;

/// Catalog file, relative to the project root
pub const CATALOG_FILE: &str = "images.json";

/// Artifact directory, relative to the project root
pub const IMAGES_DIR: &str = "images";

/// Per-project configuration directory
pub const CONFIG_DIR: &str = ".calibcat";

/// Configuration file name inside [`CONFIG_DIR`]
pub const CONFIG_FILE: &str = "config.yaml";

/// Prefix of captured frame files
pub const CAPTURE_PREFIX: &str = "image_";

/// File name for the `seq`-th captured frame
pub fn capture_file_name(seq: u32, extension: &str) -> String {
    format!("{}{}.{}", CAPTURE_PREFIX, seq, extension)
}

/// Sequence number encoded in a captured frame's file name
pub fn capture_seq(file_name: &str) -> Option<u32> {
    let (stem, _ext) = file_name.strip_prefix(CAPTURE_PREFIX)?.split_once('.')?;
    stem.parse().ok()
}

/// Per-user configuration file (~/.config/calibcat/config.yaml)
pub fn user_config_file() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("calibcat").join(CONFIG_FILE))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_capture_file_name() {
        assert_eq!(capture_file_name(0, "png"), "image_0.png");
        assert_eq!(capture_file_name(12, "jpg"), "image_12.jpg");
    }

    #[test]
    fn test_capture_seq_round_trips() {
        assert_eq!(capture_seq(&capture_file_name(7, "png")), Some(7));
        assert_eq!(capture_seq("image_3.jpg"), Some(3));
        assert_eq!(capture_seq("image_x.png"), None);
        assert_eq!(capture_seq("image_4"), None);
        assert_eq!(capture_seq("board.png"), None);
    }

    #[test]
    fn test_user_config_file_location() {
        if let Some(path) = user_config_file() {
            assert!(path.ends_with("calibcat/config.yaml"));
        }
    }
}
