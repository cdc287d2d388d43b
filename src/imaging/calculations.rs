//! Pure calculation functions for rendition dimensions.
//!
//! Nothing here touches the filesystem or decodes pixels.

/// Dimensions of a crop box from an aspect ratio and the short edge length.
///
/// ```text
/// (4, 5),  400  →  400 x 500   portrait: width is the short edge
/// (16, 9), 180  →  320 x 180   landscape: height is the short edge
/// ```
pub fn calculate_thumbnail_dimensions(aspect: (u32, u32), short_edge: u32) -> (u32, u32) {
    let (aspect_w, aspect_h) = aspect;

    if aspect_w <= aspect_h {
        let w = short_edge;
        let h = (w as f64 * aspect_h as f64 / aspect_w as f64).round() as u32;
        (w, h)
    } else {
        let h = short_edge;
        let w = (h as f64 * aspect_w as f64 / aspect_h as f64).round() as u32;
        (w, h)
    }
}

/// Scale `original` so its longer edge is at most `max_length`.
///
/// Never upscales: a source already inside the bound keeps its size. The
/// shorter edge is rounded and never drops below one pixel.
pub fn calculate_fit_dimensions(original: (u32, u32), max_length: u32) -> (u32, u32) {
    let (orig_w, orig_h) = original;
    let longer_edge = orig_w.max(orig_h);

    if longer_edge == 0 || longer_edge <= max_length {
        return original;
    }

    let ratio = max_length as f64 / longer_edge as f64;
    if orig_w >= orig_h {
        let h = ((orig_h as f64 * ratio).round() as u32).max(1);
        (max_length, h)
    } else {
        let w = ((orig_w as f64 * ratio).round() as u32).max(1);
        (w, max_length)
    }
}

/// True when a rendition of `max_length` would just duplicate the original.
pub fn rendition_redundant(original: (u32, u32), max_length: u32) -> bool {
    original.0.max(original.1) <= max_length
}
