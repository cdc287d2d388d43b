//! File and directory naming for gallery objects.
//!
//! Media files may carry an optional numeric prefix (`NNN-`) that orders
//! them; the rest of the stem, with dashes turned into spaces, is the
//! default title:
//! - `020-My-Best-Photos/` → "My Best Photos"
//! - `001-My-Museum.jpg` → "My Museum"
//!
//! Renditions live next to their original as `<prefix><stem>.<ext>`, and
//! copies that would land on an existing file get a `(n)` suffix.

use crate::fs::FileSystem;
use std::path::{Path, PathBuf};

const MAX_DIRECTORY_NAME_LEN: usize = 80;

/// Result of parsing a numbered entry name like `020-My-Best-Photos`.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedName {
    /// Number prefix if present (e.g., `20` from `020-My-Best-Photos`)
    pub number: Option<u32>,
    /// Name part after `NNN-`, dashes preserved. For unnumbered entries this
    /// is the full input.
    pub name: String,
    /// Name with dashes converted to spaces.
    pub display_title: String,
}

/// Parse an entry name following the `NNN-name` convention.
///
/// - `"020-My-Best-Photos"` → number=Some(20), display_title="My Best Photos"
/// - `"001"` → number=Some(1), name="", display_title=""
/// - `"wip-drafts"` → number=None, display_title="wip drafts"
pub fn parse_entry_name(name: &str) -> ParsedName {
    if let Some((prefix, rest)) = name.split_once('-') {
        if let Ok(number) = prefix.parse::<u32>() {
            return ParsedName {
                number: Some(number),
                name: rest.to_string(),
                display_title: rest.replace('-', " "),
            };
        }
    }
    if let Ok(number) = name.parse::<u32>() {
        return ParsedName {
            number: Some(number),
            name: String::new(),
            display_title: String::new(),
        };
    }
    ParsedName {
        number: None,
        name: name.to_string(),
        display_title: name.replace('-', " "),
    }
}

/// Title a media file gets when nothing better is known. Falls back to the
/// whole stem when the prefix is all there is.
pub fn default_title(path: &Path) -> String {
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let parsed = parse_entry_name(&stem);
    if parsed.display_title.trim().is_empty() {
        stem
    } else {
        parsed.display_title
    }
}

/// `zThumb_` + `010-beach.png` + `jpg` → `zThumb_010-beach.jpg`
pub fn rendition_file_name(prefix: &str, original: &Path, extension: &str) -> String {
    let stem = original
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    format!("{prefix}{stem}.{extension}")
}

/// Rendition path next to `original`.
pub fn rendition_path(prefix: &str, original: &Path, extension: &str) -> PathBuf {
    original.with_file_name(rendition_file_name(prefix, original, extension))
}

/// `dir/file_name`, or `dir/stem(n).ext` with the smallest `n` that is free.
pub fn unique_path(fs: &dyn FileSystem, dir: &Path, file_name: &str) -> PathBuf {
    let candidate = dir.join(file_name);
    if !fs.exists(&candidate) {
        return candidate;
    }
    let as_path = Path::new(file_name);
    let stem = as_path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let extension = as_path.extension().map(|e| e.to_string_lossy().into_owned());
    (1..)
        .map(|n| match &extension {
            Some(ext) => dir.join(format!("{stem}({n}).{ext}")),
            None => dir.join(format!("{stem}({n})")),
        })
        .find(|p| !fs.exists(p))
        .unwrap_or(candidate)
}

/// Filesystem-safe directory name for an album title.
///
/// Non-alphanumeric characters become dashes, runs of dashes collapse and
/// long names are cut at a dash boundary. Empty results become `album`.
pub fn directory_name(title: &str) -> String {
    let mut collapsed = String::with_capacity(title.len());
    let mut prev_dash = false;
    for c in title.chars() {
        if c.is_ascii_alphanumeric() {
            collapsed.push(c);
            prev_dash = false;
        } else if !prev_dash {
            collapsed.push('-');
            prev_dash = true;
        }
    }
    let mut name = collapsed.trim_matches('-').to_string();

    if name.len() > MAX_DIRECTORY_NAME_LEN {
        let cut = name[..MAX_DIRECTORY_NAME_LEN]
            .rfind('-')
            .unwrap_or(MAX_DIRECTORY_NAME_LEN);
        name.truncate(cut);
        name = name.trim_end_matches('-').to_string();
    }

    if name.is_empty() {
        "album".to_string()
    } else {
        name
    }
}
