//! Pure Rust image backend built on the `image` crate.
//!
//! | Operation | Crate / function |
//! |---|---|
//! | Decode (JPEG, PNG, TIFF, WebP) | `image::ImageReader` |
//! | Orientation correction | `DynamicImage::rotate*` / `fliph` / `flipv` |
//! | Resize | `DynamicImage::resize` with `Lanczos3` |
//! | Thumbnail crop | `DynamicImage::resize_to_fill` |
//! | Sharpening | `image::imageops::unsharpen` |
//! | Encode | JPEG (quality), PNG, WebP (lossless), AVIF (rav1e) |
//! | IPTC / EXIF | in-crate parsers over the raw file bytes |

use super::backend::{BackendError, Dimensions, ImageBackend, ImageMetadata};
use super::exif_parser::read_exif_from_bytes;
use super::iptc_parser::read_iptc_from_bytes;
use super::params::{ResizeParams, Sharpening, ThumbnailParams};
use crate::orientation::RotateFlip;
use image::imageops::FilterType;
use image::{DynamicImage, ImageFormat, ImageReader};
use std::io::BufWriter;
use std::path::Path;
use std::sync::LazyLock;

const PHOTO_CANDIDATES: &[(&str, ImageFormat)] = &[
    ("jpg", ImageFormat::Jpeg),
    ("jpeg", ImageFormat::Jpeg),
    ("png", ImageFormat::Png),
    ("tif", ImageFormat::Tiff),
    ("tiff", ImageFormat::Tiff),
    ("webp", ImageFormat::WebP),
];

static SUPPORTED_EXTENSIONS: LazyLock<Vec<&'static str>> = LazyLock::new(|| {
    PHOTO_CANDIDATES
        .iter()
        .filter(|(_, fmt)| fmt.reading_enabled())
        .map(|(ext, _)| *ext)
        .collect()
});

/// Image extensions that have working decoders compiled in.
pub fn supported_input_extensions() -> &'static [&'static str] {
    &SUPPORTED_EXTENSIONS
}

/// Pure Rust backend using the `image` crate ecosystem.
#[derive(Debug, Default, Clone, Copy)]
pub struct RustBackend;

impl RustBackend {
    pub fn new() -> Self {
        Self
    }
}

fn lowercase_extension(path: &Path) -> String {
    path.extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_lowercase()
}

fn load_image(path: &Path) -> Result<DynamicImage, BackendError> {
    ImageReader::open(path)?
        .with_guessed_format()?
        .decode()
        .map_err(|e| {
            BackendError::ProcessingFailed(format!("Failed to decode {}: {}", path.display(), e))
        })
}

fn apply_rotate_flip(img: DynamicImage, rotate_flip: RotateFlip) -> DynamicImage {
    match rotate_flip {
        RotateFlip::NotSpecified | RotateFlip::Rotate0 => img,
        RotateFlip::Rotate90 => img.rotate90(),
        RotateFlip::Rotate180 => img.rotate180(),
        RotateFlip::Rotate270 => img.rotate270(),
        RotateFlip::FlipHorizontal => img.fliph(),
        RotateFlip::FlipVertical => img.flipv(),
        RotateFlip::Rotate90FlipHorizontal => img.rotate90().fliph(),
        RotateFlip::Rotate270FlipHorizontal => img.rotate270().fliph(),
    }
}

fn sharpen(img: DynamicImage, sharpening: Option<Sharpening>) -> DynamicImage {
    match sharpening {
        Some(s) => DynamicImage::from(image::imageops::unsharpen(&img, s.sigma, s.threshold)),
        None => img,
    }
}

/// Encode by output extension. The file is created (or truncated) here.
fn save_image(img: &DynamicImage, path: &Path, quality: u32) -> Result<(), BackendError> {
    let ext = lowercase_extension(path);
    let writer = || -> Result<BufWriter<std::fs::File>, BackendError> {
        Ok(BufWriter::new(std::fs::File::create(path)?))
    };
    let encode_err = |e: image::ImageError| {
        BackendError::ProcessingFailed(format!("Encoding {} failed: {}", path.display(), e))
    };

    match ext.as_str() {
        "jpg" | "jpeg" => {
            let encoder =
                image::codecs::jpeg::JpegEncoder::new_with_quality(writer()?, quality as u8);
            // JPEG has no alpha channel
            DynamicImage::ImageRgb8(img.to_rgb8())
                .write_with_encoder(encoder)
                .map_err(encode_err)
        }
        "png" => img
            .write_with_encoder(image::codecs::png::PngEncoder::new(writer()?))
            .map_err(encode_err),
        "webp" => DynamicImage::ImageRgba8(img.to_rgba8())
            .write_with_encoder(image::codecs::webp::WebPEncoder::new_lossless(writer()?))
            .map_err(encode_err),
        "avif" => {
            let encoder = image::codecs::avif::AvifEncoder::new_with_speed_quality(
                writer()?,
                6,
                quality as u8,
            );
            img.write_with_encoder(encoder).map_err(encode_err)
        }
        other => Err(BackendError::UnsupportedFormat(other.to_string())),
    }
}

impl ImageBackend for RustBackend {
    fn identify(&self, path: &Path) -> Result<Dimensions, BackendError> {
        let (width, height) = image::image_dimensions(path).map_err(|e| {
            BackendError::ProcessingFailed(format!("Failed to read dimensions: {}", e))
        })?;
        Ok(Dimensions { width, height })
    }

    /// Missing or unreadable files produce empty metadata, not an error:
    /// metadata is best effort.
    fn read_metadata(&self, path: &Path) -> Result<ImageMetadata, BackendError> {
        let Ok(bytes) = std::fs::read(path) else {
            return Ok(ImageMetadata::default());
        };
        let ext = lowercase_extension(path);
        let iptc = read_iptc_from_bytes(&ext, &bytes);
        let exif = read_exif_from_bytes(&ext, &bytes);

        Ok(ImageMetadata {
            title: iptc.object_name,
            description: iptc.caption,
            author: iptc.by_line.or(exif.artist),
            copyright: iptc.copyright.or(exif.copyright),
            keywords: iptc.keywords,
            camera_make: exif.camera_make,
            camera_model: exif.camera_model,
            date_taken: exif.date_taken,
            exposure_time: exif.exposure_time,
            f_number: exif.f_number,
            iso: exif.iso,
            focal_length: exif.focal_length,
            orientation: exif.orientation,
        })
    }

    fn resize(&self, params: &ResizeParams) -> Result<(), BackendError> {
        let img = apply_rotate_flip(load_image(&params.source)?, params.rotate_flip);
        let resized = img.resize(params.width, params.height, FilterType::Lanczos3);
        save_image(
            &sharpen(resized, params.sharpening),
            &params.output,
            params.quality.value(),
        )
    }

    fn thumbnail(&self, params: &ThumbnailParams) -> Result<(), BackendError> {
        let img = apply_rotate_flip(load_image(&params.source)?, params.rotate_flip);
        let filled =
            img.resize_to_fill(params.crop_width, params.crop_height, FilterType::Lanczos3);
        save_image(
            &sharpen(filled, params.sharpening),
            &params.output,
            params.quality.value(),
        )
    }
}
