//! Metadata extraction, orientation and rendition generation.
//!
//! Extraction merges what the metadata reader finds in the original file
//! with values the object already knows (title, file name, size, ...);
//! known values win. Each definition then yields one item, falling back to
//! its default template, and definitions that resolve to nothing leave no
//! item behind. Items carrying unsaved edits are left alone.

use super::{DATE_NOT_SET, GalleryObject, ObjectKind, ObjectRecord};
use crate::Gallery;
use crate::display::RenditionTools;
use crate::error::GalleryError;
use crate::imaging::get_dimensions;
use crate::metadata::{
    MetadataDefinition, MetadataDefinitionCollection, MetadataItem, MetadataItemName, RawMetadata,
};
use crate::mime::MimeTypeCategory;
use crate::orientation::{Orientation, RotateFlip};
use tracing::{debug, info};

impl GalleryObject {
    /// Re-extract every defined metadata item. Requires a writable
    /// instance.
    pub fn extract_metadata(&mut self, gallery: &Gallery) -> Result<(), GalleryError> {
        if self.is_null() {
            return Ok(());
        }
        self.ensure_writable()?;
        let raw = self.read_raw_metadata(gallery)?;
        self.extract_metadata_from(&raw, gallery.definitions());
        Ok(())
    }

    /// Re-extract a single item.
    pub fn extract_metadata_for(
        &mut self,
        definition: &MetadataDefinition,
        gallery: &Gallery,
    ) -> Result<(), GalleryError> {
        if self.is_null() || definition.is_null() {
            return Ok(());
        }
        self.ensure_writable()?;
        let mut values = self.read_raw_metadata(gallery)?;
        values.extend(self.known_values());
        self.apply_definition(definition, &values);
        Ok(())
    }

    pub(crate) fn extract_metadata_from(&mut self, raw: &RawMetadata, definitions: &MetadataDefinitionCollection) {
        let mut values = raw.clone();
        values.extend(self.known_values());
        for definition in definitions.iter() {
            self.apply_definition(definition, &values);
        }
        self.is_metadata_loaded = true;
        debug!(id = self.id(), items = self.record.metadata_items.len(), "metadata extracted");
    }

    /// An item for `definition` built from what this object knows, without
    /// reading the file. Never the null item.
    pub fn create_meta_item(&self, definition: &MetadataDefinition) -> MetadataItem {
        let values = self.known_values();
        let raw = values
            .get(&definition.name)
            .cloned()
            .unwrap_or_else(|| strip_unresolved(&definition.expand_default(&values)));
        MetadataItem::from_definition(definition, self.id(), &raw)
    }

    fn read_raw_metadata(&self, gallery: &Gallery) -> Result<RawMetadata, GalleryError> {
        let path = self.record.original.file_name_physical_path();
        if self.kind() != ObjectKind::MediaItem || path.as_os_str().is_empty() {
            return Ok(RawMetadata::new());
        }
        Ok(gallery.metadata_reader().read(path)?)
    }

    fn known_values(&self) -> RawMetadata {
        use MetadataItemName as N;
        let record = &self.record;
        let mut values = RawMetadata::new();
        let mut put = |name, value: String| {
            if !value.trim().is_empty() {
                values.insert(name, value);
            }
        };
        put(N::Title, record.title.clone());
        put(N::Caption, record.caption.clone());
        if !record.original.is_null() {
            put(N::FileName, record.original.file_name().to_string());
            if record.original.file_size_kb() > 0 {
                put(N::FileSizeKb, record.original.file_size_kb().to_string());
            }
            if let Some((width, height)) = record.original.dimensions() {
                put(N::Width, width.to_string());
                put(N::Height, height.to_string());
            }
        }
        if record.date_added != DATE_NOT_SET {
            put(N::DateAdded, record.date_added.format("%Y-%m-%d %H:%M:%S").to_string());
        }
        values
    }

    fn apply_definition(&mut self, definition: &MetadataDefinition, values: &RawMetadata) {
        let value = values
            .get(&definition.name)
            .cloned()
            .unwrap_or_else(|| strip_unresolved(&definition.expand_default(values)));
        let items = &mut self.record.metadata_items;
        if items.find(definition.name).is_some_and(|item| item.has_changes()) {
            debug!(id = self.record.id, item = ?definition.name, "unsaved edit kept");
            return;
        }
        if value.trim().is_empty() {
            if items.remove(definition.name).is_some() {
                self.has_changes = true;
            }
            return;
        }
        let item = MetadataItem::from_definition(definition, self.record.id, &value);
        if items.find(definition.name) != Some(&item) {
            items.upsert(item);
            self.has_changes = true;
        }
    }

    /// Orientation from the stored metadata item, else from the file.
    /// Anything unreadable is [`Orientation::NotInitialized`].
    pub fn orientation(&self, gallery: &Gallery) -> Orientation {
        if let Some(item) = self.record.metadata_items.find(MetadataItemName::Orientation) {
            return Orientation::parse(item.raw_value());
        }
        match self.read_raw_metadata(gallery) {
            Ok(raw) => raw
                .get(&MetadataItemName::Orientation)
                .map(|v| Orientation::parse(v))
                .unwrap_or_default(),
            Err(e) => {
                debug!(id = self.id(), error = %e, "orientation unreadable");
                Orientation::NotInitialized
            }
        }
    }

    /// Transform that puts the original upright.
    pub fn calculate_needed_rotation(&self, gallery: &Gallery) -> RotateFlip {
        self.orientation(gallery).needed_rotation()
    }

    /// Write the thumbnail and optimized renditions of an image.
    ///
    /// Other media keep whatever renditions they have. Requires a writable
    /// instance.
    pub fn generate_renditions(&mut self, gallery: &Gallery) -> Result<(), GalleryError> {
        if self.kind() != ObjectKind::MediaItem || self.mime_type().category != MimeTypeCategory::Image {
            return Ok(());
        }
        self.ensure_writable()?;
        let config = gallery.config();
        let tools = RenditionTools {
            backend: gallery.backend(),
            fs: gallery.fs(),
        };

        let ObjectRecord {
            thumbnail,
            optimized,
            original,
            rotate_flip,
            ..
        } = &mut self.record;
        if original.dimensions().is_none() {
            let (width, height) = get_dimensions(tools.backend, original.file_name_physical_path())?;
            original.set_dimensions(width, height);
        }
        thumbnail.generate_and_save_file(original, *rotate_flip, &config.thumbnails.rendition_spec(), tools)?;
        optimized.generate_and_save_file(original, *rotate_flip, &config.optimized.rendition_spec(), tools)?;
        self.has_changes = true;
        info!(
            id = self.id(),
            thumbnail = %self.record.thumbnail.file_name(),
            optimized = %self.record.optimized.file_name(),
            "renditions generated"
        );
        Ok(())
    }
}

/// Drop `{Name}` tokens a default template could not fill.
fn strip_unresolved(value: &str) -> String {
    if !value.contains('{') {
        return value.to_string();
    }
    MetadataItemName::ALL
        .iter()
        .fold(value.to_string(), |acc, name| acc.replace(&name.token(), ""))
}
