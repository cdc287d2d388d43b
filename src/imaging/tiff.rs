//! Byte-order aware reader for TIFF structures.
//!
//! Both embedded metadata formats we read live in TIFF image file
//! directories (IFDs): EXIF inside a JPEG APP1 segment is a complete TIFF
//! stream, and TIFF files carry IPTC in an IFD tag. Every read is bounds
//! checked and returns `None` instead of panicking on truncated data.

/// A single 12-byte IFD entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct IfdEntry {
    pub tag: u16,
    pub typ: u16,
    pub count: u32,
    /// Offset of the 4-byte value/offset field within the stream.
    pub value_field: usize,
}

pub(crate) struct TiffReader<'a> {
    data: &'a [u8],
    big_endian: bool,
}

impl<'a> TiffReader<'a> {
    /// Validate the byte-order mark and magic number (42).
    pub fn new(data: &'a [u8]) -> Option<Self> {
        let big_endian = match data.get(0..2)? {
            b"MM" => true,
            b"II" => false,
            _ => return None,
        };
        let reader = Self { data, big_endian };
        (reader.u16_at(2)? == 42).then_some(reader)
    }

    pub fn u16_at(&self, offset: usize) -> Option<u16> {
        let b = self.data.get(offset..offset + 2)?;
        Some(if self.big_endian {
            u16::from_be_bytes([b[0], b[1]])
        } else {
            u16::from_le_bytes([b[0], b[1]])
        })
    }

    pub fn u32_at(&self, offset: usize) -> Option<u32> {
        let b = self.data.get(offset..offset + 4)?;
        let bytes = [b[0], b[1], b[2], b[3]];
        Some(if self.big_endian {
            u32::from_be_bytes(bytes)
        } else {
            u32::from_le_bytes(bytes)
        })
    }

    /// Offset of the first IFD.
    pub fn first_ifd(&self) -> Option<usize> {
        self.u32_at(4).map(|o| o as usize)
    }

    /// Entries of the IFD at `offset` plus the offset of the next IFD (0 = none).
    pub fn ifd(&self, offset: usize) -> Option<(Vec<IfdEntry>, usize)> {
        let count = self.u16_at(offset)? as usize;
        let mut entries = Vec::with_capacity(count);
        for i in 0..count {
            let at = offset + 2 + i * 12;
            entries.push(IfdEntry {
                tag: self.u16_at(at)?,
                typ: self.u16_at(at + 2)?,
                count: self.u32_at(at + 4)?,
                value_field: at + 8,
            });
        }
        let next = self
            .u32_at(offset + 2 + count * 12)
            .map(|o| o as usize)
            .unwrap_or(0);
        Some((entries, next))
    }

    /// Raw bytes of an entry's value, inline or at its offset.
    pub fn value_bytes(&self, entry: &IfdEntry) -> Option<&'a [u8]> {
        let len = (entry.count as usize).checked_mul(type_size(entry.typ))?;
        let start = if len <= 4 {
            entry.value_field
        } else {
            self.u32_at(entry.value_field)? as usize
        };
        self.data.get(start..start.checked_add(len)?)
    }

    /// First SHORT (or LONG) value of an entry.
    pub fn short_value(&self, entry: &IfdEntry) -> Option<u32> {
        match entry.typ {
            3 => self.u16_at(entry.value_field).map(u32::from),
            4 => self.u32_at(entry.value_field),
            _ => None,
        }
    }

    /// Offset stored in a LONG entry (sub-IFD pointers).
    pub fn offset_value(&self, entry: &IfdEntry) -> Option<usize> {
        self.u32_at(entry.value_field).map(|o| o as usize)
    }

    /// NUL-terminated ASCII value, trimmed. Empty strings become `None`.
    pub fn ascii_value(&self, entry: &IfdEntry) -> Option<String> {
        if entry.typ != 2 {
            return None;
        }
        let bytes = self.value_bytes(entry)?;
        let end = bytes.iter().position(|&b| b == 0).unwrap_or(bytes.len());
        let s = String::from_utf8_lossy(&bytes[..end]).trim().to_string();
        (!s.is_empty()).then_some(s)
    }

    /// First unsigned RATIONAL value as `(numerator, denominator)`.
    pub fn rational_value(&self, entry: &IfdEntry) -> Option<(u32, u32)> {
        if entry.typ != 5 {
            return None;
        }
        let at = self.u32_at(entry.value_field)? as usize;
        Some((self.u32_at(at)?, self.u32_at(at + 4)?))
    }
}

/// Byte size of one value of a TIFF field type.
fn type_size(typ: u16) -> usize {
    match typ {
        1 | 2 | 6 | 7 => 1, // BYTE, ASCII, SBYTE, UNDEFINED
        3 | 8 => 2,         // SHORT, SSHORT
        4 | 9 | 11 => 4,    // LONG, SLONG, FLOAT
        5 | 10 | 12 => 8,   // RATIONAL, SRATIONAL, DOUBLE
        _ => 1,
    }
}
