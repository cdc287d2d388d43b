//! Minimal IPTC-IIM parser for JPEG and TIFF files.
//!
//! Reads these Record 2 datasets:
//! - ObjectName (2:05) — title
//! - Keywords (2:25) — repeatable
//! - By-line (2:80) — author
//! - CopyrightNotice (2:116)
//! - Caption-Abstract (2:120) — caption
//!
//! JPEG carries IPTC in the APP13 marker (Photoshop 8BIM resource 0x0404);
//! TIFF in IFD tag 33723 (raw IIM) or 34377 (8BIM block).

use super::tiff::TiffReader;

/// IPTC metadata extracted from an image file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IptcData {
    pub object_name: Option<String>,
    pub caption: Option<String>,
    pub by_line: Option<String>,
    pub copyright: Option<String>,
    pub keywords: Vec<String>,
}

impl IptcData {
    fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// Parse IPTC from file bytes; `ext` is the lowercase extension.
/// Unknown formats and malformed data yield empty metadata.
pub fn read_iptc_from_bytes(ext: &str, bytes: &[u8]) -> IptcData {
    match ext {
        "jpg" | "jpeg" => find_jpeg_app13_iptc(bytes)
            .map(parse_iptc_iim)
            .unwrap_or_default(),
        "tif" | "tiff" => read_iptc_from_tiff(bytes),
        _ => IptcData::default(),
    }
}

// ---------------------------------------------------------------------------
// IPTC-IIM record parsing
// ---------------------------------------------------------------------------

/// Parse raw IPTC-IIM bytes.
///
/// Each dataset: `0x1C`, record number, dataset number, big-endian u16
/// length, then the value bytes.
fn parse_iptc_iim(data: &[u8]) -> IptcData {
    let mut result = IptcData::default();
    let mut pos = 0;

    while pos + 5 <= data.len() {
        if data[pos] != 0x1C {
            pos += 1;
            continue;
        }

        let record = data[pos + 1];
        let dataset = data[pos + 2];
        let length = u16::from_be_bytes([data[pos + 3], data[pos + 4]]) as usize;
        pos += 5;

        let Some(raw) = data.get(pos..pos + length) else {
            break;
        };
        pos += length;

        if record != 2 {
            continue;
        }
        let value = String::from_utf8_lossy(raw).trim().to_string();
        if value.is_empty() {
            continue;
        }
        match dataset {
            5 => result.object_name = Some(value),
            25 => result.keywords.push(value),
            80 => result.by_line = Some(value),
            116 => result.copyright = Some(value),
            120 => result.caption = Some(value),
            _ => {}
        }
    }

    result
}

// ---------------------------------------------------------------------------
// JPEG: APP13 / Photoshop 8BIM
// ---------------------------------------------------------------------------

const PHOTOSHOP_HEADER: &[u8] = b"Photoshop 3.0\0";
const BIM_MARKER: &[u8] = b"8BIM";
const IPTC_RESOURCE_ID: u16 = 0x0404;

/// Find the raw IIM bytes inside a JPEG's APP13 segment.
fn find_jpeg_app13_iptc(data: &[u8]) -> Option<&[u8]> {
    super::jpeg_segments(data)
        .filter(|(marker, _)| *marker == 0xED)
        .find_map(|(_, segment)| extract_iptc_from_8bim(segment))
}

/// Extract IIM bytes from a Photoshop image resource block.
fn extract_iptc_from_8bim(segment: &[u8]) -> Option<&[u8]> {
    let data = segment.strip_prefix(PHOTOSHOP_HEADER).unwrap_or(segment);

    let mut pos = 0;
    while pos + 12 <= data.len() {
        // "8BIM", resource id (2), pascal name padded to even, length (4), data
        if &data[pos..pos + 4] != BIM_MARKER {
            pos += 1;
            continue;
        }
        let resource_id = u16::from_be_bytes([data[pos + 4], data[pos + 5]]);
        pos += 6;

        let pascal_len = *data.get(pos)? as usize;
        pos += 1 + pascal_len + ((1 + pascal_len) % 2);

        let len_bytes = data.get(pos..pos + 4)?;
        let res_len =
            u32::from_be_bytes([len_bytes[0], len_bytes[1], len_bytes[2], len_bytes[3]]) as usize;
        pos += 4;

        let body = data.get(pos..pos + res_len)?;
        if resource_id == IPTC_RESOURCE_ID {
            return Some(body);
        }
        pos += res_len + (res_len % 2);
    }

    None
}

// ---------------------------------------------------------------------------
// TIFF: IFD tags 33723 / 34377
// ---------------------------------------------------------------------------

const TAG_IPTC_NAA: u16 = 33723;
const TAG_PHOTOSHOP: u16 = 34377;

fn read_iptc_from_tiff(data: &[u8]) -> IptcData {
    let Some(reader) = TiffReader::new(data) else {
        return IptcData::default();
    };

    let mut offset = reader.first_ifd().unwrap_or(0);
    // Guard against IFD chains that loop back on themselves.
    let mut visited = Vec::new();
    while offset > 0 && !visited.contains(&offset) {
        visited.push(offset);
        let Some((entries, next)) = reader.ifd(offset) else {
            break;
        };

        for entry in &entries {
            let parsed = match entry.tag {
                TAG_IPTC_NAA => reader.value_bytes(entry).map(parse_iptc_iim),
                TAG_PHOTOSHOP => reader
                    .value_bytes(entry)
                    .and_then(extract_iptc_from_8bim)
                    .map(parse_iptc_iim),
                _ => None,
            };
            if let Some(iptc) = parsed.filter(|p| !p.is_empty()) {
                return iptc;
            }
        }
        offset = next;
    }

    IptcData::default()
}
