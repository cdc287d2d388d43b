//! Metadata reader/writer collaborator.
//!
//! [`MetadataReader::read`] turns a media file into raw values keyed by
//! [`MetadataItemName`]; gallery objects merge those with their definitions.
//! The reference implementation reads embedded IPTC/EXIF through the image
//! backend and the caption sidecar, and writes captions back to the sidecar.

use super::definition::MetadataItemName;
use super::item::MetadataItemCollection;
use super::resolve::{read_sidecar, resolve, write_sidecar};
use crate::imaging::{BackendError, ImageBackend};
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;
use thiserror::Error;
use tracing::debug;

/// Raw values read from one file, ordered by name.
pub type RawMetadata = BTreeMap<MetadataItemName, String>;

#[derive(Error, Debug)]
pub enum MetadataError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Backend error: {0}")]
    Backend(#[from] BackendError),
}

pub trait MetadataReader: Send + Sync {
    fn read(&self, path: &Path) -> Result<RawMetadata, MetadataError>;

    /// Persist items marked `persist_to_file` back to the file.
    fn write(&self, path: &Path, items: &MetadataItemCollection) -> Result<(), MetadataError>;
}

/// Embedded IPTC/EXIF plus the caption sidecar.
pub struct EmbeddedMetadataReader {
    backend: Arc<dyn ImageBackend>,
    use_sidecar: bool,
}

impl EmbeddedMetadataReader {
    pub fn new(backend: Arc<dyn ImageBackend>, use_sidecar: bool) -> Self {
        Self {
            backend,
            use_sidecar,
        }
    }
}

fn insert_non_empty(map: &mut RawMetadata, name: MetadataItemName, value: Option<String>) {
    if let Some(value) = value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty()) {
        map.insert(name, value);
    }
}

impl MetadataReader for EmbeddedMetadataReader {
    fn read(&self, path: &Path) -> Result<RawMetadata, MetadataError> {
        use MetadataItemName as N;
        let embedded = self.backend.read_metadata(path)?;
        let sidecar = if self.use_sidecar { read_sidecar(path) } else { None };

        let mut raw = RawMetadata::new();
        insert_non_empty(&mut raw, N::Title, embedded.title);
        insert_non_empty(
            &mut raw,
            N::Caption,
            resolve(&[sidecar.as_deref(), embedded.description.as_deref()]),
        );
        insert_non_empty(&mut raw, N::Author, embedded.author);
        insert_non_empty(&mut raw, N::Copyright, embedded.copyright);
        if !embedded.keywords.is_empty() {
            raw.insert(N::Keywords, embedded.keywords.join(", "));
        }
        insert_non_empty(&mut raw, N::CameraMake, embedded.camera_make);
        insert_non_empty(&mut raw, N::CameraModel, embedded.camera_model);
        insert_non_empty(&mut raw, N::DateTaken, embedded.date_taken);
        insert_non_empty(&mut raw, N::ExposureTime, embedded.exposure_time);
        insert_non_empty(&mut raw, N::FNumber, embedded.f_number);
        insert_non_empty(&mut raw, N::IsoSpeed, embedded.iso.map(|v| v.to_string()));
        insert_non_empty(&mut raw, N::FocalLength, embedded.focal_length);
        insert_non_empty(&mut raw, N::Orientation, embedded.orientation.map(|v| v.to_string()));
        Ok(raw)
    }

    fn write(&self, path: &Path, items: &MetadataItemCollection) -> Result<(), MetadataError> {
        for item in items.iter().filter(|i| i.persist_to_file() && i.has_changes()) {
            match item.name() {
                MetadataItemName::Caption if self.use_sidecar => {
                    write_sidecar(path, item.raw_value())?;
                }
                name => debug!(?name, path = %path.display(), "no writer for metadata item"),
            }
        }
        Ok(())
    }
}
