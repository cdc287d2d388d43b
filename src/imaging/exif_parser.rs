//! EXIF subset parser.
//!
//! Reads the handful of EXIF tags the gallery displays. JPEG files carry EXIF
//! as a TIFF stream inside APP1 (`Exif\0\0` prefix); TIFF files are read
//! from their own IFD0. Camera settings live in the Exif sub-IFD (tag
//! 0x8769).

use super::tiff::{IfdEntry, TiffReader};

const EXIF_HEADER: &[u8] = b"Exif\0\0";

const TAG_MAKE: u16 = 0x010F;
const TAG_MODEL: u16 = 0x0110;
const TAG_ORIENTATION: u16 = 0x0112;
const TAG_ARTIST: u16 = 0x013B;
const TAG_COPYRIGHT: u16 = 0x8298;
const TAG_EXIF_IFD: u16 = 0x8769;
const TAG_EXPOSURE_TIME: u16 = 0x829A;
const TAG_F_NUMBER: u16 = 0x829D;
const TAG_ISO: u16 = 0x8827;
const TAG_DATE_TIME_ORIGINAL: u16 = 0x9003;
const TAG_FOCAL_LENGTH: u16 = 0x920A;

/// EXIF values as raw text, ready to become metadata items.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExifData {
    pub camera_make: Option<String>,
    pub camera_model: Option<String>,
    pub orientation: Option<u16>,
    pub artist: Option<String>,
    pub copyright: Option<String>,
    /// `"YYYY:MM:DD HH:MM:SS"` as written by the camera.
    pub date_taken: Option<String>,
    /// Rational seconds, e.g. `"1/250"`.
    pub exposure_time: Option<String>,
    /// Decimal aperture, e.g. `"2.8"`.
    pub f_number: Option<String>,
    pub iso: Option<u32>,
    /// Decimal millimetres, e.g. `"35"`.
    pub focal_length: Option<String>,
}

/// Parse EXIF from file bytes; `ext` is the lowercase extension.
pub fn read_exif_from_bytes(ext: &str, bytes: &[u8]) -> ExifData {
    let tiff = match ext {
        "jpg" | "jpeg" => super::jpeg_segments(bytes)
            .filter(|(marker, _)| *marker == 0xE1)
            .find_map(|(_, segment)| segment.strip_prefix(EXIF_HEADER)),
        "tif" | "tiff" => Some(bytes),
        _ => None,
    };
    tiff.and_then(parse_tiff_stream).unwrap_or_default()
}

fn parse_tiff_stream(data: &[u8]) -> Option<ExifData> {
    let reader = TiffReader::new(data)?;
    let (ifd0, _) = reader.ifd(reader.first_ifd()?)?;

    let mut exif = ExifData::default();
    apply_entries(&reader, &ifd0, &mut exif);

    let sub_ifd = ifd0
        .iter()
        .find(|e| e.tag == TAG_EXIF_IFD)
        .and_then(|e| reader.offset_value(e));
    if let Some((entries, _)) = sub_ifd.and_then(|offset| reader.ifd(offset)) {
        apply_entries(&reader, &entries, &mut exif);
    }
    Some(exif)
}

fn apply_entries(reader: &TiffReader<'_>, entries: &[IfdEntry], exif: &mut ExifData) {
    for entry in entries {
        match entry.tag {
            TAG_MAKE => exif.camera_make = reader.ascii_value(entry),
            TAG_MODEL => exif.camera_model = reader.ascii_value(entry),
            TAG_ARTIST => exif.artist = reader.ascii_value(entry),
            TAG_COPYRIGHT => exif.copyright = reader.ascii_value(entry),
            TAG_DATE_TIME_ORIGINAL => exif.date_taken = reader.ascii_value(entry),
            TAG_ORIENTATION => {
                exif.orientation = reader.short_value(entry).and_then(|v| u16::try_from(v).ok())
            }
            TAG_ISO => exif.iso = reader.short_value(entry),
            TAG_EXPOSURE_TIME => {
                exif.exposure_time = reader.rational_value(entry).and_then(format_exposure)
            }
            TAG_F_NUMBER => exif.f_number = reader.rational_value(entry).and_then(format_decimal),
            TAG_FOCAL_LENGTH => {
                exif.focal_length = reader.rational_value(entry).and_then(format_decimal)
            }
            _ => {}
        }
    }
}

/// `(1, 250)` → `"1/250"`, `(2, 1)` → `"2"`, `(10, 2500)` → `"1/250"`.
fn format_exposure((num, den): (u32, u32)) -> Option<String> {
    if den == 0 || num == 0 {
        return None;
    }
    if num % den == 0 {
        return Some((num / den).to_string());
    }
    if den % num == 0 {
        return Some(format!("1/{}", den / num));
    }
    Some(format!("{num}/{den}"))
}

/// `(28, 10)` → `"2.8"`, `(350, 10)` → `"35"`.
fn format_decimal((num, den): (u32, u32)) -> Option<String> {
    if den == 0 {
        return None;
    }
    let value = num as f64 / den as f64;
    let formatted = format!("{value:.1}");
    Some(
        formatted
            .strip_suffix(".0")
            .map(str::to_string)
            .unwrap_or(formatted),
    )
}
