//! Mime type classification and media templates.
//!
//! Every file in the gallery is classified by extension into a
//! [`MimeTypeCategory`]. Registered types are shared immutable reference
//! data handed out as `Arc<MimeType>`; callers wanting to edit one take a
//! [`MimeType::copy`].
//!
//! ## Lookup contract
//!
//! [`MimeTypeRegistry::lookup_extension`] never fails:
//!
//! | Input | Result |
//! |---|---|
//! | registered extension (`jpg`) | the registered entry |
//! | unregistered extension (`xyz`) | an inferred entry, category `Other` unless the mime database knows the major type |
//! | empty extension | the shared null mime type (`NotSet`) |
//!
//! ## Media templates
//!
//! A [`MediaTemplate`] holds the HTML a browser needs to present an item.
//! Templates are keyed by mime pattern (`video/mp4` or `video/*`) and browser
//! id. Selection prefers the exact mime type, then the major-type wildcard;
//! within those, the first matching browser id from most to least specific,
//! then `"default"`. When nothing matches, the "no rendering" template is
//! returned instead of nothing.

use crate::config::MimeTypesConfig;
use crate::null;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

/// Browser id used when no browser-specific template matches.
pub const DEFAULT_BROWSER_ID: &str = "default";

const OCTET_STREAM: &str = "application/octet-stream";

/// Broad kind of media, derived from the major mime type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum MimeTypeCategory {
    #[default]
    NotSet,
    Other,
    Image,
    Video,
    Audio,
}

impl MimeTypeCategory {
    pub fn from_major_type(major: &str) -> Self {
        match major {
            "image" => Self::Image,
            "video" => Self::Video,
            "audio" => Self::Audio,
            "" => Self::NotSet,
            _ => Self::Other,
        }
    }
}

/// HTML used to present media of one mime pattern in one browser.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaTemplate {
    /// Full type (`video/mp4`) or major wildcard (`video/*`).
    pub mime_type: String,
    pub browser_id: String,
    pub html_template: String,
    pub script_template: String,
}

impl MediaTemplate {
    pub fn new(mime_type: &str, browser_id: &str, html_template: &str) -> Self {
        Self {
            mime_type: mime_type.to_string(),
            browser_id: browser_id.to_string(),
            html_template: html_template.to_string(),
            script_template: String::new(),
        }
    }

    /// The "no rendering" template: empty pattern, empty HTML.
    pub fn none() -> Self {
        Self {
            mime_type: String::new(),
            browser_id: String::new(),
            html_template: String::new(),
            script_template: String::new(),
        }
    }

    pub fn is_none(&self) -> bool {
        self.mime_type.is_empty()
    }
}

/// Classification of one file extension.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MimeType {
    /// Lowercase, without the leading dot.
    pub extension: String,
    pub full_type: String,
    pub major_type: String,
    pub subtype: String,
    pub category: MimeTypeCategory,
    /// Type to announce to browsers (can differ from `full_type`).
    pub browser_mime_type: String,
    pub allow_add_to_gallery: bool,
    pub media_templates: Vec<MediaTemplate>,
}

impl MimeType {
    /// The null mime type. Prefer [`null::mime_type`] for the shared instance.
    pub fn null() -> Self {
        Self {
            extension: String::new(),
            full_type: String::new(),
            major_type: String::new(),
            subtype: String::new(),
            category: MimeTypeCategory::NotSet,
            browser_mime_type: String::new(),
            allow_add_to_gallery: false,
            media_templates: Vec::new(),
        }
    }

    pub fn is_null(&self) -> bool {
        self.category == MimeTypeCategory::NotSet && self.extension.is_empty()
    }

    /// Classify an extension from the mime database alone.
    ///
    /// Pure function of the extension. Unknown extensions become
    /// `application/octet-stream` with category `Other`.
    pub fn infer(extension: &str) -> Self {
        let extension = normalize_extension(extension);
        if extension.is_empty() {
            return Self::null();
        }
        let full_type = mime_guess::from_ext(&extension)
            .first_raw()
            .unwrap_or(OCTET_STREAM);
        let (major, sub) = full_type.split_once('/').unwrap_or((full_type, ""));
        let category = if full_type == OCTET_STREAM {
            MimeTypeCategory::Other
        } else {
            MimeTypeCategory::from_major_type(major)
        };
        Self {
            browser_mime_type: browser_override(&extension)
                .unwrap_or(full_type)
                .to_string(),
            extension,
            full_type: full_type.to_string(),
            major_type: major.to_string(),
            subtype: sub.to_string(),
            category,
            allow_add_to_gallery: false,
            media_templates: Vec::new(),
        }
    }

    /// Independent, mutable clone. Copying the null mime type yields a
    /// fresh null mime type.
    pub fn copy(&self) -> Self {
        self.clone()
    }

    /// Template for the first matching browser id; see the module docs.
    pub fn media_template(&self, browser_ids: &[&str]) -> &MediaTemplate {
        let wildcard = format!("{}/*", self.major_type);
        let candidates = [self.full_type.as_str(), wildcard.as_str()];

        for pattern in candidates {
            let for_pattern: Vec<&MediaTemplate> = self
                .media_templates
                .iter()
                .filter(|t| t.mime_type.eq_ignore_ascii_case(pattern))
                .collect();
            if for_pattern.is_empty() {
                continue;
            }
            let chosen = browser_ids
                .iter()
                .chain(std::iter::once(&DEFAULT_BROWSER_ID))
                .find_map(|id| {
                    for_pattern
                        .iter()
                        .find(|t| t.browser_id.eq_ignore_ascii_case(id))
                });
            if let Some(template) = chosen {
                return template;
            }
        }
        null::media_template()
    }
}

/// Registered mime types, keyed by extension.
#[derive(Debug, Clone)]
pub struct MimeTypeRegistry {
    types: HashMap<String, Arc<MimeType>>,
}

/// Extensions known to the gallery out of the box.
const STOCK_EXTENSIONS: &[&str] = &[
    // images
    "jpg", "jpeg", "jpe", "png", "gif", "bmp", "tif", "tiff", "webp", "avif", "svg", "ico",
    // video
    "mp4", "m4v", "mov", "webm", "ogv", "avi", "wmv", "mkv", "mpg", "mpeg", "3gp",
    // audio
    "mp3", "m4a", "wav", "ogg", "oga", "flac", "aac", "wma",
    // documents and archives
    "pdf", "txt", "rtf", "doc", "docx", "xls", "xlsx", "ppt", "pptx", "zip",
];

/// Browser types that differ from the canonical type.
fn browser_override(extension: &str) -> Option<&'static str> {
    match extension {
        "m4v" => Some("video/mp4"),
        "mov" => Some("video/mp4"),
        "ogv" => Some("video/ogg"),
        "oga" => Some("audio/ogg"),
        "jpe" => Some("image/jpeg"),
        _ => None,
    }
}

fn stock_templates() -> Vec<MediaTemplate> {
    vec![
        MediaTemplate::new(
            "image/*",
            DEFAULT_BROWSER_ID,
            r#"<img src="{MediaObjectUrl}" width="{Width}" height="{Height}" alt="{TitleNoHtml}" />"#,
        ),
        MediaTemplate::new(
            "image/*",
            "ie",
            r#"<img src="{MediaObjectUrl}" width="{Width}" height="{Height}" alt="{TitleNoHtml}" galleryimg="no" />"#,
        ),
        MediaTemplate::new(
            "image/tiff",
            DEFAULT_BROWSER_ID,
            r#"<a href="{MediaObjectUrl}">{TitleNoHtml}</a>"#,
        ),
        MediaTemplate::new(
            "video/*",
            DEFAULT_BROWSER_ID,
            r#"<video src="{MediaObjectUrl}" width="{Width}" height="{Height}" controls preload="metadata"></video>"#,
        ),
        MediaTemplate::new(
            "audio/*",
            DEFAULT_BROWSER_ID,
            r#"<audio src="{MediaObjectUrl}" controls preload="metadata"></audio>"#,
        ),
        MediaTemplate::new(
            "application/pdf",
            DEFAULT_BROWSER_ID,
            r#"<iframe src="{MediaObjectUrl}" style="width:100%;height:100%;"></iframe>"#,
        ),
        MediaTemplate::new(
            "application/pdf",
            "safari",
            r#"<embed src="{MediaObjectUrl}" type="application/pdf" style="width:100%;height:100%;" />"#,
        ),
    ]
}

impl MimeTypeRegistry {
    /// Build the registry from the stock extension list and config.
    pub fn new(config: &MimeTypesConfig) -> Self {
        let templates = stock_templates();
        let allow_all = config.allowed_extensions.iter().any(|e| e == "*");
        let allowed: Vec<String> = config
            .allowed_extensions
            .iter()
            .map(|e| normalize_extension(e))
            .collect();

        let types = STOCK_EXTENSIONS
            .iter()
            .map(|ext| {
                let mut mime = MimeType::infer(ext);
                mime.allow_add_to_gallery = allow_all || allowed.contains(&mime.extension);
                let wildcard = format!("{}/*", mime.major_type);
                mime.media_templates = templates
                    .iter()
                    .filter(|t| t.mime_type == mime.full_type || t.mime_type == wildcard)
                    .cloned()
                    .collect();
                (mime.extension.clone(), Arc::new(mime))
            })
            .collect();

        Self { types }
    }

    /// Look up by extension (`"jpg"`, `".JPG"`). Never fails; see module docs.
    pub fn lookup_extension(&self, extension: &str) -> Arc<MimeType> {
        let extension = normalize_extension(extension);
        if extension.is_empty() {
            return null::mime_type();
        }
        match self.types.get(&extension) {
            Some(mime) => Arc::clone(mime),
            None => Arc::new(MimeType::infer(&extension)),
        }
    }

    /// Look up by file name or path.
    pub fn lookup_file(&self, path: &Path) -> Arc<MimeType> {
        let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");
        self.lookup_extension(ext)
    }

    /// True when files of this type may be added to the gallery.
    pub fn is_allowed(&self, path: &Path) -> bool {
        self.lookup_file(path).allow_add_to_gallery
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }
}

impl Default for MimeTypeRegistry {
    fn default() -> Self {
        Self::new(&MimeTypesConfig::default())
    }
}

/// `".JPG"` → `"jpg"`; surrounding whitespace is ignored.
fn normalize_extension(extension: &str) -> String {
    extension.trim().trim_start_matches('.').to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    // =========================================================================
    // Classification
    // =========================================================================

    #[test]
    fn jpg_is_image() {
        let registry = MimeTypeRegistry::default();
        let mime = registry.lookup_extension(".jpg");
        assert_eq!(mime.category, MimeTypeCategory::Image);
        assert_eq!(mime.full_type, "image/jpeg");
        assert_eq!(mime.major_type, "image");
        assert_eq!(mime.subtype, "jpeg");
    }

    #[test]
    fn unregistered_extension_is_other() {
        let registry = MimeTypeRegistry::default();
        let mime = registry.lookup_extension(".xyz");
        assert_eq!(mime.category, MimeTypeCategory::Other);
        assert_eq!(mime.extension, "xyz");
        assert!(!mime.allow_add_to_gallery);
        assert!(!mime.is_null());
    }

    #[test]
    fn unknown_to_mime_database_is_octet_stream() {
        let mime = MimeType::infer("qqqzzz");
        assert_eq!(mime.full_type, "application/octet-stream");
        assert_eq!(mime.category, MimeTypeCategory::Other);
    }

    #[test]
    fn empty_extension_is_null_mime_type() {
        let registry = MimeTypeRegistry::default();
        let mime = registry.lookup_extension("");
        assert!(mime.is_null());
        assert_eq!(mime.category, MimeTypeCategory::NotSet);
        assert!(Arc::ptr_eq(&mime, &null::mime_type()));
    }

    #[test]
    fn lookup_is_case_insensitive() {
        let registry = MimeTypeRegistry::default();
        let upper = registry.lookup_file(Path::new("/photos/IMG_001.JPG"));
        let lower = registry.lookup_extension("jpg");
        assert!(Arc::ptr_eq(&upper, &lower));
    }

    #[test]
    fn video_and_audio_categories() {
        let registry = MimeTypeRegistry::default();
        assert_eq!(registry.lookup_extension("mp4").category, MimeTypeCategory::Video);
        assert_eq!(registry.lookup_extension("mp3").category, MimeTypeCategory::Audio);
        assert_eq!(registry.lookup_extension("pdf").category, MimeTypeCategory::Other);
    }

    #[test]
    fn browser_type_override() {
        let registry = MimeTypeRegistry::default();
        assert_eq!(registry.lookup_extension("m4v").browser_mime_type, "video/mp4");
        assert_eq!(registry.lookup_extension("png").browser_mime_type, "image/png");
    }

    #[test]
    fn copy_is_independent() {
        let registry = MimeTypeRegistry::default();
        let shared = registry.lookup_extension("png");
        let mut copy = shared.copy();
        copy.allow_add_to_gallery = !copy.allow_add_to_gallery;
        assert_ne!(copy.allow_add_to_gallery, shared.allow_add_to_gallery);
    }

    #[test]
    fn copy_of_null_is_null() {
        let copy = null::mime_type().copy();
        assert!(copy.is_null());
    }

    // =========================================================================
    // Allow list
    // =========================================================================

    #[test]
    fn allow_list_restricts_additions() {
        let registry = MimeTypeRegistry::new(&MimeTypesConfig {
            allowed_extensions: vec!["jpg".into(), ".PNG".into()],
        });
        assert!(registry.is_allowed(Path::new("a.jpg")));
        assert!(registry.is_allowed(Path::new("a.png")));
        assert!(!registry.is_allowed(Path::new("a.mp4")));
        assert!(!registry.is_allowed(Path::new("README")));
    }

    #[test]
    fn wildcard_allows_all_registered() {
        let registry = MimeTypeRegistry::default();
        assert!(registry.is_allowed(Path::new("clip.webm")));
        assert!(!registry.is_allowed(Path::new("model.xyz")));
    }

    // =========================================================================
    // Media templates
    // =========================================================================

    #[test]
    fn template_falls_back_to_default_browser() {
        let registry = MimeTypeRegistry::default();
        let mime = registry.lookup_extension("jpg");
        let template = mime.media_template(&["firefox"]);
        assert_eq!(template.browser_id, DEFAULT_BROWSER_ID);
        assert!(template.html_template.starts_with("<img"));
    }

    #[test]
    fn template_prefers_most_specific_browser() {
        let registry = MimeTypeRegistry::default();
        let mime = registry.lookup_extension("jpg");
        let template = mime.media_template(&["ie9", "ie", DEFAULT_BROWSER_ID]);
        assert_eq!(template.browser_id, "ie");
    }

    #[test]
    fn template_prefers_exact_mime_over_wildcard() {
        let registry = MimeTypeRegistry::default();
        let mime = registry.lookup_extension("tif");
        let template = mime.media_template(&["ie"]);
        assert_eq!(template.mime_type, "image/tiff");
    }

    #[test]
    fn missing_template_is_none_sentinel() {
        let registry = MimeTypeRegistry::default();
        let zip = registry.lookup_extension("zip");
        let template = zip.media_template(&["chrome"]);
        assert!(template.is_none());
        assert!(null::mime_type().media_template(&[]).is_none());
    }
}
