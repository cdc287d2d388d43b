//! JPEG marker segment walker.
//!
//! Yields `(marker, payload)` for every length-carrying segment between SOI
//! and SOS. Scanning stops at the first malformed marker; callers treat that
//! the same as "segment not present".

pub(crate) fn jpeg_segments(data: &[u8]) -> JpegSegments<'_> {
    let valid = data.starts_with(&[0xFF, 0xD8]);
    JpegSegments {
        data,
        pos: if valid { 2 } else { data.len() },
    }
}

pub(crate) struct JpegSegments<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> Iterator for JpegSegments<'a> {
    type Item = (u8, &'a [u8]);

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if *self.data.get(self.pos)? != 0xFF {
                self.pos = self.data.len();
                return None;
            }
            let marker = *self.data.get(self.pos + 1)?;
            match marker {
                // Fill byte before the actual marker
                0xFF => self.pos += 1,
                // Start of scan / end of image: no more metadata segments
                0xDA | 0xD9 => {
                    self.pos = self.data.len();
                    return None;
                }
                0x01 | 0xD0..=0xD7 => self.pos += 2,
                _ => {
                    let len_bytes = self.data.get(self.pos + 2..self.pos + 4)?;
                    let len = u16::from_be_bytes([len_bytes[0], len_bytes[1]]) as usize;
                    let start = self.pos + 4;
                    let end = (self.pos + 2 + len).min(self.data.len());
                    self.pos += 2 + len;
                    if len < 2 || start > end {
                        self.pos = self.data.len();
                        return None;
                    }
                    return Some((marker, &self.data[start..end]));
                }
            }
        }
    }
}
