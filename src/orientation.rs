//! Orientation correction.
//!
//! Cameras record how the sensor was held in the EXIF Orientation tag
//! (values 1–8) instead of rotating pixels. [`Orientation`] models that tag
//! and [`RotateFlip`] the transform that puts the asset upright again.
//!
//! ```text
//! EXIF  Orientation        RotateFlip
//! 1     TopLeft            Rotate0
//! 2     TopRight           FlipHorizontal
//! 3     BottomRight        Rotate180
//! 4     BottomLeft         FlipVertical
//! 5     LeftTop            Rotate90FlipHorizontal
//! 6     RightTop           Rotate90
//! 7     RightBottom        Rotate270FlipHorizontal
//! 8     LeftBottom         Rotate270
//! -     NotInitialized     NotSpecified
//! ```

use serde::{Deserialize, Serialize};

/// Orientation as recorded by the capturing device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Orientation {
    /// No orientation has been read (or it could not be parsed).
    #[default]
    NotInitialized,
    TopLeft,
    TopRight,
    BottomRight,
    BottomLeft,
    LeftTop,
    RightTop,
    RightBottom,
    LeftBottom,
}

impl Orientation {
    /// Map an EXIF orientation value. Out-of-range values are not an error,
    /// they simply leave the orientation uninitialized.
    pub fn from_exif(value: u16) -> Self {
        match value {
            1 => Self::TopLeft,
            2 => Self::TopRight,
            3 => Self::BottomRight,
            4 => Self::BottomLeft,
            5 => Self::LeftTop,
            6 => Self::RightTop,
            7 => Self::RightBottom,
            8 => Self::LeftBottom,
            _ => Self::NotInitialized,
        }
    }

    /// Parse the raw metadata text for an orientation (`"6"`, `" 3 "`).
    pub fn parse(raw: &str) -> Self {
        raw.trim()
            .parse::<u16>()
            .map(Self::from_exif)
            .unwrap_or(Self::NotInitialized)
    }

    /// The EXIF numeric value, or `None` when uninitialized.
    pub fn exif_value(self) -> Option<u16> {
        match self {
            Self::NotInitialized => None,
            Self::TopLeft => Some(1),
            Self::TopRight => Some(2),
            Self::BottomRight => Some(3),
            Self::BottomLeft => Some(4),
            Self::LeftTop => Some(5),
            Self::RightTop => Some(6),
            Self::RightBottom => Some(7),
            Self::LeftBottom => Some(8),
        }
    }

    /// Transform needed to present an asset with this orientation upright.
    pub fn needed_rotation(self) -> RotateFlip {
        match self {
            Self::NotInitialized => RotateFlip::NotSpecified,
            Self::TopLeft => RotateFlip::Rotate0,
            Self::TopRight => RotateFlip::FlipHorizontal,
            Self::BottomRight => RotateFlip::Rotate180,
            Self::BottomLeft => RotateFlip::FlipVertical,
            Self::LeftTop => RotateFlip::Rotate90FlipHorizontal,
            Self::RightTop => RotateFlip::Rotate90,
            Self::RightBottom => RotateFlip::Rotate270FlipHorizontal,
            Self::LeftBottom => RotateFlip::Rotate270,
        }
    }
}

/// A rotation (clockwise) optionally followed by a horizontal flip.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum RotateFlip {
    #[default]
    NotSpecified,
    Rotate0,
    Rotate90,
    Rotate180,
    Rotate270,
    FlipHorizontal,
    FlipVertical,
    Rotate90FlipHorizontal,
    Rotate270FlipHorizontal,
}

impl RotateFlip {
    /// True when the transform leaves pixels unchanged.
    pub fn is_identity(self) -> bool {
        matches!(self, Self::NotSpecified | Self::Rotate0)
    }

    /// True when width and height trade places after the transform.
    pub fn swaps_dimensions(self) -> bool {
        matches!(
            self,
            Self::Rotate90
                | Self::Rotate270
                | Self::Rotate90FlipHorizontal
                | Self::Rotate270FlipHorizontal
        )
    }

    /// Dimensions after applying the transform.
    pub fn apply_to_dimensions(self, (width, height): (u32, u32)) -> (u32, u32) {
        if self.swaps_dimensions() {
            (height, width)
        } else {
            (width, height)
        }
    }
}
