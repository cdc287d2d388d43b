//! Gallery objects: albums and media items.
//!
//! A [`GalleryObject`] is an [`ObjectRecord`] (the persisted data) plus the
//! runtime state that governs what may be done with it:
//!
//! | State | Values | Rule |
//! |---|---|---|
//! | inflation | shell → inflated | shells carry identity fields only; [`inflate`](GalleryObject::inflate) completes them once |
//! | writability | unset → writable / read-only | set once on real objects; shared cached instances are read-only |
//! | children | shells | albums only, in insertion order |
//!
//! The parent is a plain id resolved through the [`Gallery`](crate::Gallery)
//! context, so there are no reference cycles: ownership runs parent → child
//! only.
//!
//! ## The null object
//!
//! [`GalleryObject::null`] stands in wherever a lookup misses. Its identity
//! fields hold sentinels, it reports inflated and not new, its collections
//! are empty, its mutators do nothing and its [`parent`](GalleryObject::parent)
//! is another, freshly built null object.
//!
//! Operations live in submodules by concern: [`tree`] (children, move,
//! copy), [`lifecycle`] (inflate, save, delete), [`extract`] (metadata,
//! orientation, renditions) and [`hooks`] (save/delete listeners).

pub mod extract;
pub mod hooks;
pub mod lifecycle;
pub mod tree;

pub use hooks::{LifecycleEvent, LifecycleHooks};
pub use lifecycle::DeletePolicy;

use crate::Gallery;
use crate::display::DisplayObject;
use crate::error::GalleryError;
use crate::html::ValidationResult;
use crate::metadata::{MetadataItemCollection, MetadataItemName};
use crate::mime::MimeType;
use crate::orientation::RotateFlip;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Id of an object that has never been saved.
pub const ID_NOT_SET: i64 = i64::MIN;

/// Timestamp meaning "never".
pub const DATE_NOT_SET: DateTime<Utc> = DateTime::<Utc>::MIN_UTC;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ObjectKind {
    Album,
    MediaItem,
    Null,
}

/// Child filter for [`GalleryObject::children`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GalleryObjectType {
    #[default]
    All,
    Album,
    MediaItem,
}

impl GalleryObjectType {
    pub fn matches(self, kind: ObjectKind) -> bool {
        match self {
            Self::All => kind != ObjectKind::Null,
            Self::Album => kind == ObjectKind::Album,
            Self::MediaItem => kind == ObjectKind::MediaItem,
        }
    }
}

/// Persisted fields of a gallery object.
#[derive(Debug, Clone, PartialEq)]
pub struct ObjectRecord {
    pub id: i64,
    pub gallery_id: i64,
    pub parent_id: i64,
    pub kind: ObjectKind,
    pub sequence: i32,
    pub title: String,
    pub caption: String,
    pub date_added: DateTime<Utc>,
    pub date_last_modified: DateTime<Utc>,
    pub created_by: String,
    pub last_modified_by: String,
    pub is_private: bool,
    /// SHA-256 of the original file (media items).
    pub hash_key: String,
    /// Physical directory (albums).
    pub directory: PathBuf,
    pub rotate_flip: RotateFlip,
    pub thumbnail: DisplayObject,
    pub optimized: DisplayObject,
    pub original: DisplayObject,
    pub metadata_items: MetadataItemCollection,
}

impl ObjectRecord {
    /// A record with identity fields set and everything else empty.
    pub fn new(kind: ObjectKind, gallery_id: i64, parent_id: i64) -> Self {
        Self {
            id: ID_NOT_SET,
            gallery_id,
            parent_id,
            kind,
            sequence: 0,
            title: String::new(),
            caption: String::new(),
            date_added: DATE_NOT_SET,
            date_last_modified: DATE_NOT_SET,
            created_by: String::new(),
            last_modified_by: String::new(),
            is_private: false,
            hash_key: String::new(),
            directory: PathBuf::new(),
            rotate_flip: RotateFlip::NotSpecified,
            thumbnail: DisplayObject::null(),
            optimized: DisplayObject::null(),
            original: DisplayObject::null(),
            metadata_items: MetadataItemCollection::new(),
        }
    }

    fn null() -> Self {
        Self {
            sequence: i32::MIN,
            ..Self::new(ObjectKind::Null, ID_NOT_SET, ID_NOT_SET)
        }
    }

    /// Identity fields only.
    fn shell(&self) -> Self {
        Self {
            id: self.id,
            sequence: self.sequence,
            ..Self::new(self.kind, self.gallery_id, self.parent_id)
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Inflation {
    Shell,
    Inflated,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Writability {
    Unset,
    Writable,
    ReadOnly,
}

/// An album or media item. See the module docs for the state rules.
#[derive(Debug)]
pub struct GalleryObject {
    record: ObjectRecord,
    children: Vec<GalleryObject>,
    inflation: Inflation,
    writability: Writability,
    is_metadata_loaded: bool,
    has_changes: bool,
}

impl GalleryObject {
    /// The null gallery object. Prefer [`null::gallery_object`](crate::null::gallery_object)
    /// for the shared instance.
    pub fn null() -> Self {
        Self {
            record: ObjectRecord::null(),
            children: Vec::new(),
            inflation: Inflation::Inflated,
            writability: Writability::Unset,
            is_metadata_loaded: false,
            has_changes: false,
        }
    }

    /// A fresh, writable, fully-populated object that has not been saved.
    pub(crate) fn new_writable(record: ObjectRecord) -> Self {
        Self {
            record,
            children: Vec::new(),
            inflation: Inflation::Inflated,
            writability: Writability::Writable,
            is_metadata_loaded: false,
            has_changes: true,
        }
    }

    /// An un-inflated shell carrying identity fields only.
    pub fn shell(id: i64, gallery_id: i64, parent_id: i64, kind: ObjectKind, sequence: i32) -> Self {
        let mut record = ObjectRecord::new(kind, gallery_id, parent_id);
        record.id = id;
        record.sequence = sequence;
        Self::from_shell_record(&record)
    }

    fn from_shell_record(record: &ObjectRecord) -> Self {
        Self {
            record: record.shell(),
            children: Vec::new(),
            inflation: Inflation::Shell,
            writability: Writability::Unset,
            is_metadata_loaded: false,
            has_changes: false,
        }
    }

    /// The only way a shell becomes inflated.
    fn complete_inflation(&mut self, record: ObjectRecord, children: &[ObjectRecord]) {
        debug_assert_eq!(self.inflation, Inflation::Shell);
        self.record = record;
        self.children = children.iter().map(Self::from_shell_record).collect();
        self.is_metadata_loaded = !self.record.metadata_items.is_empty();
        self.has_changes = false;
        self.inflation = Inflation::Inflated;
    }

    // =========================================================================
    // Identity and state
    // =========================================================================

    pub fn is_null(&self) -> bool {
        self.record.kind == ObjectKind::Null
    }

    pub fn id(&self) -> i64 {
        self.record.id
    }

    pub fn gallery_id(&self) -> i64 {
        self.record.gallery_id
    }

    pub fn parent_id(&self) -> i64 {
        self.record.parent_id
    }

    pub fn kind(&self) -> ObjectKind {
        self.record.kind
    }

    pub fn is_album(&self) -> bool {
        self.record.kind == ObjectKind::Album
    }

    pub fn sequence(&self) -> i32 {
        self.record.sequence
    }

    /// Never saved. The null object is not new.
    pub fn is_new(&self) -> bool {
        !self.is_null() && self.record.id == ID_NOT_SET
    }

    pub fn is_inflated(&self) -> bool {
        self.inflation == Inflation::Inflated
    }

    pub fn is_writable(&self) -> bool {
        self.writability == Writability::Writable
    }

    pub fn has_changes(&self) -> bool {
        self.has_changes
    }

    /// Set writability once. A second call on a real object is an error;
    /// the null object ignores every call.
    pub fn set_writable(&mut self, writable: bool) -> Result<(), GalleryError> {
        if self.is_null() {
            return Ok(());
        }
        if self.writability != Writability::Unset {
            return Err(GalleryError::WritabilityAlreadySet { id: self.id() });
        }
        self.writability = if writable {
            Writability::Writable
        } else {
            Writability::ReadOnly
        };
        Ok(())
    }

    pub(crate) fn ensure_writable(&self) -> Result<(), GalleryError> {
        if self.is_writable() {
            Ok(())
        } else {
            Err(GalleryError::WritePermission { id: self.id() })
        }
    }

    pub(crate) fn ensure_album(&self) -> Result<(), GalleryError> {
        if self.is_album() {
            Ok(())
        } else {
            Err(GalleryError::NotAnAlbum { id: self.id() })
        }
    }

    /// The persisted half of this object.
    pub fn record(&self) -> &ObjectRecord {
        &self.record
    }

    /// Parent resolved through the gallery. Objects without a parent, and
    /// the null object, get a newly built null object on every call.
    pub fn parent(&self, gallery: &Gallery) -> Arc<GalleryObject> {
        if self.is_null() || self.record.parent_id == ID_NOT_SET {
            return Arc::new(GalleryObject::null());
        }
        gallery.get(self.record.parent_id)
    }

    /// Detach from the parent.
    pub fn set_parent_to_null(&mut self) -> Result<(), GalleryError> {
        if self.begin_edit()? {
            self.record.parent_id = ID_NOT_SET;
        }
        Ok(())
    }

    /// Clear the parent of a detached child shell, whatever its writability.
    pub(crate) fn detach(&mut self) {
        if !self.is_null() {
            self.record.parent_id = ID_NOT_SET;
            self.has_changes = true;
        }
    }

    // =========================================================================
    // Fields
    // =========================================================================

    pub fn title(&self) -> &str {
        &self.record.title
    }

    pub fn caption(&self) -> &str {
        &self.record.caption
    }

    pub fn date_added(&self) -> DateTime<Utc> {
        self.record.date_added
    }

    pub fn date_last_modified(&self) -> DateTime<Utc> {
        self.record.date_last_modified
    }

    pub fn created_by(&self) -> &str {
        &self.record.created_by
    }

    pub fn last_modified_by(&self) -> &str {
        &self.record.last_modified_by
    }

    pub fn is_private(&self) -> bool {
        self.record.is_private
    }

    pub fn hash_key(&self) -> &str {
        &self.record.hash_key
    }

    pub fn directory(&self) -> &Path {
        &self.record.directory
    }

    pub fn rotate_flip(&self) -> RotateFlip {
        self.record.rotate_flip
    }

    pub fn thumbnail(&self) -> &DisplayObject {
        &self.record.thumbnail
    }

    pub fn optimized(&self) -> &DisplayObject {
        &self.record.optimized
    }

    pub fn original(&self) -> &DisplayObject {
        &self.record.original
    }

    /// Mime type of the original file.
    pub fn mime_type(&self) -> &Arc<MimeType> {
        self.record.original.mime_type()
    }

    pub fn metadata_items(&self) -> &MetadataItemCollection {
        &self.record.metadata_items
    }

    pub fn is_metadata_loaded(&self) -> bool {
        self.is_metadata_loaded
    }

    /// Start an edit: `Ok(false)` for the null object, an error unless
    /// writable, otherwise marks the object changed.
    fn begin_edit(&mut self) -> Result<bool, GalleryError> {
        if self.is_null() {
            return Ok(false);
        }
        self.ensure_writable()?;
        self.has_changes = true;
        Ok(true)
    }

    pub fn set_title(&mut self, title: &str) -> Result<(), GalleryError> {
        if self.begin_edit()? {
            self.record.title = title.to_string();
        }
        Ok(())
    }

    pub fn set_caption(&mut self, caption: &str) -> Result<(), GalleryError> {
        if self.begin_edit()? {
            self.record.caption = caption.to_string();
        }
        Ok(())
    }

    pub fn set_sequence(&mut self, sequence: i32) -> Result<(), GalleryError> {
        if self.begin_edit()? {
            self.record.sequence = sequence;
        }
        Ok(())
    }

    pub fn set_is_private(&mut self, is_private: bool) -> Result<(), GalleryError> {
        if self.begin_edit()? {
            self.record.is_private = is_private;
        }
        Ok(())
    }

    pub fn set_rotate_flip(&mut self, rotate_flip: RotateFlip) -> Result<(), GalleryError> {
        if self.begin_edit()? {
            self.record.rotate_flip = rotate_flip;
        }
        Ok(())
    }

    pub fn set_last_modified_by(&mut self, user_name: &str) -> Result<(), GalleryError> {
        if self.begin_edit()? {
            self.record.last_modified_by = user_name.to_string();
        }
        Ok(())
    }

    /// Edit a metadata value through the gallery's HTML validator.
    ///
    /// Returns the validation outcome; rejected values change nothing.
    /// Missing items and the null object report valid and change nothing.
    pub fn set_metadata_value(
        &mut self,
        name: MetadataItemName,
        value: &str,
        gallery: &Gallery,
    ) -> Result<ValidationResult, GalleryError> {
        if self.is_null() {
            return Ok(ValidationResult::valid());
        }
        self.ensure_writable()?;
        let validator = gallery.html_validator();
        let result = match self.record.metadata_items.find_mut(name) {
            Some(item) => item.set_value(value, validator),
            None => return Ok(ValidationResult::valid()),
        };
        if result.is_valid {
            self.has_changes = true;
            match name {
                MetadataItemName::Title => self.record.title = value.to_string(),
                MetadataItemName::Caption => self.record.caption = value.to_string(),
                _ => {}
            }
        }
        Ok(result)
    }

    // =========================================================================
    // Ordering
    // =========================================================================

    /// Order by sequence. Anything null-equivalent sorts below this object.
    pub fn compare_to(&self, other: Option<&GalleryObject>) -> Ordering {
        match other {
            Some(other) if !other.is_null() => self.record.sequence.cmp(&other.record.sequence),
            _ => Ordering::Greater,
        }
    }
}
