//! Resolving title and caption from competing sources.
//!
//! A media item's title and caption can come from three places:
//!
//! - **File name**: `001-My-Photo.jpg` gives the title "My Photo" via the
//!   `NNN-name` convention (see [`naming`](crate::naming)).
//! - **Sidecar**: `001-My-Photo.txt` next to the file holds the caption as
//!   plain text. Caption edits are written back here.
//! - **Embedded**: IPTC Object Name (title) and Caption-Abstract (caption).
//!
//! Each field is resolved independently; the first non-empty value wins:
//!
//! - **Title**: embedded title → file name title
//! - **Caption**: sidecar → embedded caption
//!
//! Embedded titles are deliberate curation and beat the mechanical file name.
//! A sidecar is an explicit override and beats embedded captions.

use std::io;
use std::path::{Path, PathBuf};

/// First non-empty (after trimming) value, in priority order.
///
/// ```text
/// title:   resolve(&[embedded_title, file_name_title])
/// caption: resolve(&[sidecar_text,   embedded_caption])
/// ```
pub fn resolve(sources: &[Option<&str>]) -> Option<String> {
    sources
        .iter()
        .filter_map(|opt| {
            opt.map(str::trim)
                .filter(|s| !s.is_empty())
                .map(String::from)
        })
        .next()
}

/// Sidecar path for a media file: same stem, `.txt` extension.
pub fn sidecar_path(media_path: &Path) -> PathBuf {
    media_path.with_extension("txt")
}

/// Trimmed contents of the caption sidecar, if present and non-empty.
pub fn read_sidecar(media_path: &Path) -> Option<String> {
    std::fs::read_to_string(sidecar_path(media_path))
        .ok()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

/// Write the caption sidecar. An empty caption removes the sidecar.
pub fn write_sidecar(media_path: &Path, caption: &str) -> io::Result<()> {
    let sidecar = sidecar_path(media_path);
    let caption = caption.trim();
    if caption.is_empty() {
        return match std::fs::remove_file(&sidecar) {
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            other => other,
        };
    }
    std::fs::write(sidecar, format!("{caption}\n"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    // =========================================================================
    // resolve() tests
    // =========================================================================

    #[test]
    fn resolve_picks_first_non_none() {
        assert_eq!(
            resolve(&[Some("Embedded Title"), Some("File Name Title")]),
            Some("Embedded Title".to_string())
        );
    }

    #[test]
    fn resolve_skips_none() {
        assert_eq!(
            resolve(&[None, Some("Fallback")]),
            Some("Fallback".to_string())
        );
    }

    #[test]
    fn resolve_skips_empty_strings() {
        assert_eq!(
            resolve(&[Some(""), Some("Fallback")]),
            Some("Fallback".to_string())
        );
    }

    #[test]
    fn resolve_skips_whitespace_only() {
        assert_eq!(
            resolve(&[Some("  \n\t  "), Some("Fallback")]),
            Some("Fallback".to_string())
        );
    }

    #[test]
    fn resolve_returns_none_when_all_none() {
        assert_eq!(resolve(&[None, None]), None);
    }

    #[test]
    fn resolve_returns_none_for_empty_sources() {
        assert_eq!(resolve(&[]), None);
    }

    #[test]
    fn resolve_trims_whitespace() {
        assert_eq!(
            resolve(&[Some("  Padded Title  ")]),
            Some("Padded Title".to_string())
        );
    }

    // =========================================================================
    // read_sidecar() tests
    // =========================================================================

    #[test]
    fn read_sidecar_finds_matching_txt() {
        let dir = TempDir::new().unwrap();
        let img = dir.path().join("001-photo.jpg");
        let txt = dir.path().join("001-photo.txt");
        fs::write(&img, b"not really a jpeg").unwrap();
        fs::write(&txt, "A beautiful sunset over the mountains").unwrap();

        assert_eq!(
            read_sidecar(&img),
            Some("A beautiful sunset over the mountains".to_string())
        );
    }

    #[test]
    fn read_sidecar_returns_none_when_no_file() {
        let dir = TempDir::new().unwrap();
        let img = dir.path().join("001-photo.jpg");
        assert_eq!(read_sidecar(&img), None);
    }

    #[test]
    fn read_sidecar_returns_none_for_empty_file() {
        let dir = TempDir::new().unwrap();
        let img = dir.path().join("001-photo.jpg");
        let txt = dir.path().join("001-photo.txt");
        fs::write(&img, b"not really a jpeg").unwrap();
        fs::write(&txt, "").unwrap();
        assert_eq!(read_sidecar(&img), None);
    }

    #[test]
    fn read_sidecar_returns_none_for_whitespace_only() {
        let dir = TempDir::new().unwrap();
        let img = dir.path().join("001-photo.jpg");
        let txt = dir.path().join("001-photo.txt");
        fs::write(&img, b"not really a jpeg").unwrap();
        fs::write(&txt, "   \n  \t  ").unwrap();
        assert_eq!(read_sidecar(&img), None);
    }

    #[test]
    fn read_sidecar_trims_content() {
        let dir = TempDir::new().unwrap();
        let img = dir.path().join("001-photo.jpg");
        let txt = dir.path().join("001-photo.txt");
        fs::write(&img, b"not really a jpeg").unwrap();
        fs::write(&txt, "\n  Some description  \n").unwrap();

        assert_eq!(read_sidecar(&img), Some("Some description".to_string()));
    }

    // =========================================================================
    // write_sidecar() tests
    // =========================================================================

    #[test]
    fn write_sidecar_round_trips() {
        let dir = TempDir::new().unwrap();
        let img = dir.path().join("001-photo.jpg");
        write_sidecar(&img, "  Evening light ").unwrap();

        assert_eq!(
            fs::read_to_string(dir.path().join("001-photo.txt")).unwrap(),
            "Evening light\n"
        );
        assert_eq!(read_sidecar(&img), Some("Evening light".to_string()));
    }

    #[test]
    fn write_empty_caption_removes_sidecar() {
        let dir = TempDir::new().unwrap();
        let img = dir.path().join("001-photo.jpg");
        fs::write(dir.path().join("001-photo.txt"), "old").unwrap();

        write_sidecar(&img, "").unwrap();
        assert!(!dir.path().join("001-photo.txt").exists());
        // removing twice is fine
        write_sidecar(&img, "").unwrap();
    }
}
