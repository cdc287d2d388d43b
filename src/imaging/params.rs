//! Parameter types for image operations.
//!
//! These structs describe *what* to produce, not *how*. Rendition generation
//! in [`display`](crate::display) builds them and hands them to an
//! [`ImageBackend`](super::ImageBackend), so tests can swap in a recording
//! backend without touching the planning logic.
//!
//! - [`Quality`] — lossy encoding quality (1–100), clamped on construction.
//! - [`Sharpening`] — unsharp-mask parameters for small renditions.
//! - [`ResizeParams`] — fit-inside resize of a source into an output file.
//! - [`ThumbnailParams`] — fill-and-crop to an exact box.

use crate::orientation::RotateFlip;
use std::path::PathBuf;

/// Quality setting for lossy image encoding (1-100).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Quality(pub u32);

impl Quality {
    pub fn new(value: u32) -> Self {
        Self(value.clamp(1, 100))
    }

    pub fn value(self) -> u32 {
        self.0
    }
}

impl Default for Quality {
    fn default() -> Self {
        Self(70)
    }
}

/// Sharpening parameters for unsharp mask.
///
/// - `sigma`: standard deviation of the Gaussian blur (higher = more sharpening)
/// - `threshold`: minimum brightness difference to sharpen (0 = every pixel)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sharpening {
    pub sigma: f32,
    pub threshold: i32,
}

impl Sharpening {
    /// Light sharpening suitable for thumbnails.
    pub fn light() -> Self {
        Self {
            sigma: 0.5,
            threshold: 0,
        }
    }
}

/// Resize so the result fits inside `width` x `height`.
#[derive(Debug, Clone, PartialEq)]
pub struct ResizeParams {
    pub source: PathBuf,
    pub output: PathBuf,
    pub width: u32,
    pub height: u32,
    pub quality: Quality,
    /// Applied to the decoded source before resizing.
    pub rotate_flip: RotateFlip,
    pub sharpening: Option<Sharpening>,
}

/// Resize to cover the crop box, then center-crop to it exactly.
#[derive(Debug, Clone, PartialEq)]
pub struct ThumbnailParams {
    pub source: PathBuf,
    pub output: PathBuf,
    pub crop_width: u32,
    pub crop_height: u32,
    pub quality: Quality,
    pub rotate_flip: RotateFlip,
    pub sharpening: Option<Sharpening>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quality_clamps_to_valid_range() {
        assert_eq!(Quality::new(0).value(), 1);
        assert_eq!(Quality::new(50).value(), 50);
        assert_eq!(Quality::new(150).value(), 100);
    }

    #[test]
    fn quality_default_is_70() {
        assert_eq!(Quality::default().value(), 70);
    }
}
