//! ChArUco board parameters.
//!
//! Rendering happens elsewhere; this module owns what the board *is*:
//! grid size, square and marker lengths, the marker dictionary, and the
//! geometric checks a renderer would otherwise reject with a vague error.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::record::Params;

/// Output size the board image is rendered at unless overridden
pub const DEFAULT_IMAGE_WIDTH: u32 = 988;
pub const DEFAULT_IMAGE_HEIGHT: u32 = 1400;

/// Errors from board validation
#[derive(Debug, Error, PartialEq)]
pub enum BoardError {
    #[error("Unknown dictionary selector: {0} (expected 0..={max})", max = Dictionary::ALL.len() - 1)]
    UnknownDictionary(u32),

    #[error("Board must be at least 2x2 squares, got {width}x{length}")]
    GridTooSmall { width: u32, length: u32 },

    #[error("{name} must be positive, got {value}")]
    NonPositiveLength { name: &'static str, value: f64 },

    #[error("Marker length {marker} must be smaller than square length {square}")]
    MarkerTooLarge { marker: f64, square: f64 },

    #[error("Board needs {needed} markers but {dictionary} only has {available}")]
    DictionaryTooSmall {
        dictionary: Dictionary,
        needed: u64,
        available: u32,
    },

    #[error("A {width}x{length} board does not fit in a {image} image at one pixel per square")]
    ImageTooSmall {
        width: u32,
        length: u32,
        image: ImageSize,
    },

    #[error("Image size must be non-zero, got {width}x{height}")]
    EmptyImage { width: u32, height: u32 },
}

/// Predefined marker dictionaries, numbered by their selector
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Dictionary {
    Dict4x4_50,
    Dict4x4_100,
    Dict4x4_250,
    Dict4x4_1000,
    Dict5x5_50,
    Dict5x5_100,
    Dict5x5_250,
    Dict5x5_1000,
    Dict6x6_50,
    Dict6x6_100,
    Dict6x6_250,
    Dict6x6_1000,
    Dict7x7_50,
    Dict7x7_100,
    Dict7x7_250,
    Dict7x7_1000,
    ArucoOriginal,
    AprilTag16h5,
    AprilTag25h9,
    AprilTag36h10,
    AprilTag36h11,
}

impl Dictionary {
    /// All dictionaries in selector order
    pub const ALL: [Dictionary; 21] = [
        Dictionary::Dict4x4_50,
        Dictionary::Dict4x4_100,
        Dictionary::Dict4x4_250,
        Dictionary::Dict4x4_1000,
        Dictionary::Dict5x5_50,
        Dictionary::Dict5x5_100,
        Dictionary::Dict5x5_250,
        Dictionary::Dict5x5_1000,
        Dictionary::Dict6x6_50,
        Dictionary::Dict6x6_100,
        Dictionary::Dict6x6_250,
        Dictionary::Dict6x6_1000,
        Dictionary::Dict7x7_50,
        Dictionary::Dict7x7_100,
        Dictionary::Dict7x7_250,
        Dictionary::Dict7x7_1000,
        Dictionary::ArucoOriginal,
        Dictionary::AprilTag16h5,
        Dictionary::AprilTag25h9,
        Dictionary::AprilTag36h10,
        Dictionary::AprilTag36h11,
    ];

    /// Look up a dictionary by its integer selector
    pub fn from_selector(selector: u32) -> Result<Self, BoardError> {
        Self::ALL
            .get(selector as usize)
            .copied()
            .ok_or(BoardError::UnknownDictionary(selector))
    }

    /// Integer selector, as passed on the command line
    pub fn selector(self) -> u32 {
        Self::ALL
            .iter()
            .position(|d| *d == self)
            .map(|i| i as u32)
            .unwrap_or_default()
    }

    /// Canonical name, e.g. `DICT_4X4_50`
    pub fn name(self) -> &'static str {
        match self {
            Dictionary::Dict4x4_50 => "DICT_4X4_50",
            Dictionary::Dict4x4_100 => "DICT_4X4_100",
            Dictionary::Dict4x4_250 => "DICT_4X4_250",
            Dictionary::Dict4x4_1000 => "DICT_4X4_1000",
            Dictionary::Dict5x5_50 => "DICT_5X5_50",
            Dictionary::Dict5x5_100 => "DICT_5X5_100",
            Dictionary::Dict5x5_250 => "DICT_5X5_250",
            Dictionary::Dict5x5_1000 => "DICT_5X5_1000",
            Dictionary::Dict6x6_50 => "DICT_6X6_50",
            Dictionary::Dict6x6_100 => "DICT_6X6_100",
            Dictionary::Dict6x6_250 => "DICT_6X6_250",
            Dictionary::Dict6x6_1000 => "DICT_6X6_1000",
            Dictionary::Dict7x7_50 => "DICT_7X7_50",
            Dictionary::Dict7x7_100 => "DICT_7X7_100",
            Dictionary::Dict7x7_250 => "DICT_7X7_250",
            Dictionary::Dict7x7_1000 => "DICT_7X7_1000",
            Dictionary::ArucoOriginal => "DICT_ARUCO_ORIGINAL",
            Dictionary::AprilTag16h5 => "DICT_APRILTAG_16h5",
            Dictionary::AprilTag25h9 => "DICT_APRILTAG_25h9",
            Dictionary::AprilTag36h10 => "DICT_APRILTAG_36h10",
            Dictionary::AprilTag36h11 => "DICT_APRILTAG_36h11",
        }
    }

    /// Number of distinct markers in the dictionary
    pub fn capacity(self) -> u32 {
        match self {
            Dictionary::Dict4x4_50
            | Dictionary::Dict5x5_50
            | Dictionary::Dict6x6_50
            | Dictionary::Dict7x7_50 => 50,
            Dictionary::Dict4x4_100
            | Dictionary::Dict5x5_100
            | Dictionary::Dict6x6_100
            | Dictionary::Dict7x7_100 => 100,
            Dictionary::Dict4x4_250
            | Dictionary::Dict5x5_250
            | Dictionary::Dict6x6_250
            | Dictionary::Dict7x7_250 => 250,
            Dictionary::Dict4x4_1000
            | Dictionary::Dict5x5_1000
            | Dictionary::Dict6x6_1000
            | Dictionary::Dict7x7_1000 => 1000,
            Dictionary::ArucoOriginal => 1024,
            Dictionary::AprilTag16h5 => 30,
            Dictionary::AprilTag25h9 => 35,
            Dictionary::AprilTag36h10 => 2320,
            Dictionary::AprilTag36h11 => 587,
        }
    }
}

impl fmt::Display for Dictionary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Pixel size of a rendered board image
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageSize {
    pub width: u32,
    pub height: u32,
}

impl Default for ImageSize {
    fn default() -> Self {
        Self {
            width: DEFAULT_IMAGE_WIDTH,
            height: DEFAULT_IMAGE_HEIGHT,
        }
    }
}

impl fmt::Display for ImageSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// ChArUco board description
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoardSpec {
    /// Squares along x
    pub width: u32,
    /// Squares along y
    pub length: u32,
    /// Side of one chessboard square
    pub square_length: f64,
    /// Side of one marker, inside a white square
    pub marker_length: f64,
    pub dictionary: Dictionary,
}

/// Where squares and markers land in a rendered image
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BoardLayout {
    pub image: ImageSize,
    /// Side of one square in pixels
    pub square_px: u32,
    /// Side of one marker in pixels
    pub marker_px: u32,
    /// Board area in pixels
    pub board_width_px: u32,
    pub board_height_px: u32,
    /// Left/top offset that centers the board
    pub margin_x: u32,
    pub margin_y: u32,
    /// Number of markers drawn
    pub markers: u64,
}

impl BoardSpec {
    /// Build a spec from raw CLI values
    pub fn new(
        width: u32,
        length: u32,
        square_length: f64,
        marker_length: f64,
        dictionary: u32,
    ) -> Result<Self, BoardError> {
        let spec = Self {
            width,
            length,
            square_length,
            marker_length,
            dictionary: Dictionary::from_selector(dictionary)?,
        };
        spec.validate()?;
        Ok(spec)
    }

    /// Markers on a ChArUco board sit in every other square
    pub fn marker_count(&self) -> u64 {
        u64::from(self.width) * u64::from(self.length) / 2
    }

    /// Inner chessboard corners, the points a calibration actually uses
    pub fn corner_count(&self) -> u64 {
        u64::from(self.width.saturating_sub(1)) * u64::from(self.length.saturating_sub(1))
    }

    /// Board extent in the units of `square_length`
    pub fn physical_size(&self) -> (f64, f64) {
        (
            f64::from(self.width) * self.square_length,
            f64::from(self.length) * self.square_length,
        )
    }

    /// Check the geometry holds together
    pub fn validate(&self) -> Result<(), BoardError> {
        if self.width < 2 || self.length < 2 {
            return Err(BoardError::GridTooSmall {
                width: self.width,
                length: self.length,
            });
        }
        // `!(x > 0.0)` also rejects NaN
        if !(self.square_length > 0.0) {
            return Err(BoardError::NonPositiveLength {
                name: "square_length",
                value: self.square_length,
            });
        }
        if !(self.marker_length > 0.0) {
            return Err(BoardError::NonPositiveLength {
                name: "marker_length",
                value: self.marker_length,
            });
        }
        if self.marker_length >= self.square_length {
            return Err(BoardError::MarkerTooLarge {
                marker: self.marker_length,
                square: self.square_length,
            });
        }
        let needed = self.marker_count();
        let available = self.dictionary.capacity();
        if needed > u64::from(available) {
            return Err(BoardError::DictionaryTooSmall {
                dictionary: self.dictionary,
                needed,
                available,
            });
        }
        Ok(())
    }

    /// Fit the board into an image, centered, with whole-pixel squares
    pub fn layout(&self, image: ImageSize) -> Result<BoardLayout, BoardError> {
        if image.width == 0 || image.height == 0 {
            return Err(BoardError::EmptyImage {
                width: image.width,
                height: image.height,
            });
        }

        let square_px = (image.width / self.width).min(image.height / self.length);
        if square_px == 0 {
            return Err(BoardError::ImageTooSmall {
                width: self.width,
                length: self.length,
                image,
            });
        }
        let ratio = self.marker_length / self.square_length;
        let marker_px = (f64::from(square_px) * ratio).round() as u32;
        let board_width_px = square_px * self.width;
        let board_height_px = square_px * self.length;

        Ok(BoardLayout {
            image,
            square_px,
            marker_px,
            board_width_px,
            board_height_px,
            margin_x: (image.width - board_width_px) / 2,
            margin_y: (image.height - board_height_px) / 2,
            markers: self.marker_count(),
        })
    }

    /// Parameters recorded in the catalog next to the artifact hash
    pub fn to_params(&self, image: ImageSize) -> Params {
        let mut params = Params::new();
        params.insert("width".to_string(), self.width.into());
        params.insert("length".to_string(), self.length.into());
        params.insert("square_length".to_string(), self.square_length.into());
        params.insert("marker_length".to_string(), self.marker_length.into());
        params.insert("dictionary".to_string(), self.dictionary.selector().into());
        params.insert("image_width".to_string(), image.width.into());
        params.insert("image_height".to_string(), image.height.into());
        params
    }
}
