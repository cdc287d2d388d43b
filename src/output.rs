//! CLI output formatting for gallery objects and mime types.
//!
//! Output leads with the entity's identity (title, kind, id) and shows file
//! paths and properties as indented context lines:
//!
//! ```text
//! salt flats (media item #2)
//!     Source: /photos/010-salt-flats.jpg
//!     Type: image/jpeg (image)
//!     Original: 2000x1000, 812 KB
//!     Thumbnail: zThumb_010-salt-flats.jpg 115x58
//!     Optimized: zOpt_010-salt-flats.jpg 640x320
//!     Metadata
//!         Camera model: X100
//!         Caption: Evening light over the...
//! ```
//!
//! Each `format_*` function is pure and returns `Vec<String>`; the `print_*`
//! wrappers write to stdout.

use crate::display::DisplayObject;
use crate::mime::MimeType;
use crate::object::{GalleryObject, ObjectKind};
use serde_json::json;

const MAX_VALUE_LEN: usize = 40;

// ============================================================================
// Shared helpers
// ============================================================================

/// Return indentation string: 4 spaces per depth level.
fn indent(depth: usize) -> String {
    "    ".repeat(depth)
}

fn kind_label(kind: ObjectKind) -> &'static str {
    match kind {
        ObjectKind::Album => "album",
        ObjectKind::MediaItem => "media item",
        ObjectKind::Null => "null",
    }
}

/// Strip HTML tags from a string (simple angle-bracket stripping).
fn strip_html_tags(html: &str) -> String {
    let mut result = String::with_capacity(html.len());
    let mut in_tag = false;
    for c in html.chars() {
        match c {
            '<' => in_tag = true,
            '>' => in_tag = false,
            _ if !in_tag => result.push(c),
            _ => {}
        }
    }
    result
}

/// Truncate text to `max` characters, appending `...` if truncated.
fn truncate_value(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        text.to_string()
    } else {
        let head: String = text.chars().take(max).collect();
        format!("{head}...")
    }
}

/// `name WxH` for a rendition, or `none` for the null display object.
fn rendition_line(display: &DisplayObject) -> String {
    if display.is_null() {
        return "none".to_string();
    }
    match display.dimensions() {
        Some((w, h)) => format!("{} {}x{}", display.file_name(), w, h),
        None => display.file_name().to_string(),
    }
}

// ============================================================================
// Objects
// ============================================================================

/// Format one gallery object with its renditions and visible metadata.
pub fn format_object(object: &GalleryObject) -> Vec<String> {
    if object.is_null() {
        return vec!["(no object)".to_string()];
    }

    let title = if object.title().is_empty() {
        object.original().file_name()
    } else {
        object.title()
    };
    let identity = if object.is_new() {
        format!("{}, unsaved", kind_label(object.kind()))
    } else {
        format!("{} #{}", kind_label(object.kind()), object.id())
    };
    let mut lines = vec![format!("{title} ({identity})")];

    let i = indent(1);
    if object.is_album() {
        lines.push(format!("{i}Directory: {}", object.directory().display()));
        return lines;
    }

    let original = object.original();
    lines.push(format!("{i}Source: {}", original.file_name_physical_path().display()));
    lines.extend(format_mime_line(object.mime_type()).map(|l| format!("{i}{l}")));
    match original.dimensions() {
        Some((w, h)) => lines.push(format!("{i}Original: {w}x{h}, {} KB", original.file_size_kb())),
        None => lines.push(format!("{i}Original: {} KB", original.file_size_kb())),
    }
    if !object.rotate_flip().is_identity() {
        lines.push(format!("{i}Rotation: {:?}", object.rotate_flip()));
    }
    lines.push(format!("{i}Thumbnail: {}", rendition_line(object.thumbnail())));
    lines.push(format!("{i}Optimized: {}", rendition_line(object.optimized())));

    let visible: Vec<_> = object.metadata_items().visible().collect();
    if !visible.is_empty() {
        lines.push(format!("{i}Metadata"));
        let ii = indent(2);
        for item in visible {
            let value = truncate_value(&strip_html_tags(item.value()), MAX_VALUE_LEN);
            lines.push(format!("{ii}{}: {}", item.name().label(), value));
        }
    }
    lines
}

/// Format the renditions written for a media item.
pub fn format_renditions(object: &GalleryObject) -> Vec<String> {
    [object.thumbnail(), object.optimized()]
        .into_iter()
        .filter(|d| !d.is_null())
        .map(|d| match d.dimensions() {
            Some((w, h)) => format!(
                "{} → {} ({}x{}, {} KB)",
                d.file_name(),
                d.file_name_physical_path().display(),
                w,
                h,
                d.file_size_kb()
            ),
            None => format!("{} → {}", d.file_name(), d.file_name_physical_path().display()),
        })
        .collect()
}

/// JSON view of an object for `--json` output.
pub fn object_json(object: &GalleryObject) -> serde_json::Value {
    let metadata: serde_json::Map<String, serde_json::Value> = object
        .metadata_items()
        .iter()
        .map(|item| (item.name().label().to_string(), json!(item.value())))
        .collect();
    json!({
        "id": object.id(),
        "kind": kind_label(object.kind()),
        "title": object.title(),
        "caption": object.caption(),
        "hash": object.hash_key(),
        "mime_type": object.mime_type().full_type,
        "original": object.original().file_name_physical_path(),
        "thumbnail": object.thumbnail().file_name_physical_path(),
        "optimized": object.optimized().file_name_physical_path(),
        "metadata": metadata,
    })
}

// ============================================================================
// Mime types
// ============================================================================

fn format_mime_line(mime: &MimeType) -> Option<String> {
    if mime.is_null() {
        None
    } else {
        let category = format!("{:?}", mime.category).to_lowercase();
        Some(format!("Type: {} ({})", mime.full_type, category))
    }
}

/// Format a mime type lookup result.
pub fn format_mime(extension: &str, mime: &MimeType) -> Vec<String> {
    if mime.is_null() {
        return vec![format!(".{extension}: not a recognized file type")];
    }
    let i = indent(1);
    let mut lines = vec![format!(".{} → {}", mime.extension, mime.full_type)];
    lines.push(format!("{i}Category: {:?}", mime.category));
    if mime.browser_mime_type != mime.full_type {
        lines.push(format!("{i}Browser type: {}", mime.browser_mime_type));
    }
    lines.push(format!(
        "{i}Allowed in gallery: {}",
        if mime.allow_add_to_gallery { "yes" } else { "no" }
    ));
    lines
}

// ============================================================================
// Print wrappers
// ============================================================================

pub fn print_object(object: &GalleryObject) {
    for line in format_object(object) {
        println!("{}", line);
    }
}

pub fn print_renditions(object: &GalleryObject) {
    for line in format_renditions(object) {
        println!("{}", line);
    }
}

pub fn print_mime(extension: &str, mime: &MimeType) {
    for line in format_mime(extension, mime) {
        println!("{}", line);
    }
}
