//! Shared null-object sentinels.
//!
//! Every lookup that can miss hands back one of these instead of `None`.
//! Each sentinel is built once and shared; callers get `Arc` clones (or
//! `'static` references for values embedded in collections). Display
//! objects are owned by their record, so a missing one is a plain
//! [`DisplayObject::null`](crate::display::DisplayObject::null) value.
//!
//! The one exception is the parent of a null gallery object:
//! [`GalleryObject::parent`](crate::object::GalleryObject::parent) builds a
//! fresh null instance per call so that ascending `parent` from a sentinel
//! yields an endless chain of independent sentinels.

use crate::metadata::{MetadataDefinition, MetadataItem};
use crate::mime::{MediaTemplate, MimeType};
use crate::object::GalleryObject;
use std::sync::{Arc, LazyLock};

static NULL_GALLERY_OBJECT: LazyLock<Arc<GalleryObject>> =
    LazyLock::new(|| Arc::new(GalleryObject::null()));
static NULL_MIME_TYPE: LazyLock<Arc<MimeType>> = LazyLock::new(|| Arc::new(MimeType::null()));
static NO_MEDIA_TEMPLATE: LazyLock<MediaTemplate> = LazyLock::new(MediaTemplate::none);
static NULL_METADATA_ITEM: LazyLock<MetadataItem> = LazyLock::new(MetadataItem::null);
static NULL_METADATA_DEFINITION: LazyLock<MetadataDefinition> =
    LazyLock::new(MetadataDefinition::null);

pub fn gallery_object() -> Arc<GalleryObject> {
    Arc::clone(&NULL_GALLERY_OBJECT)
}

pub fn mime_type() -> Arc<MimeType> {
    Arc::clone(&NULL_MIME_TYPE)
}

/// The "no rendering" template.
pub fn media_template() -> &'static MediaTemplate {
    &NO_MEDIA_TEMPLATE
}

pub fn metadata_item() -> &'static MetadataItem {
    &NULL_METADATA_ITEM
}

pub fn metadata_definition() -> &'static MetadataDefinition {
    &NULL_METADATA_DEFINITION
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::display::{DisplayObject, DisplayType};
    use crate::mime::MimeTypeCategory;
    use crate::object::ID_NOT_SET;

    #[test]
    fn shared_sentinels_are_single_instances() {
        assert!(Arc::ptr_eq(&gallery_object(), &gallery_object()));
        assert!(Arc::ptr_eq(&mime_type(), &mime_type()));
        assert!(std::ptr::eq(metadata_item(), metadata_item()));
    }

    #[test]
    fn null_gallery_object_identity_is_sentinel() {
        let null = gallery_object();
        assert!(null.is_null());
        assert_eq!(null.id(), ID_NOT_SET);
        assert!(null.is_inflated());
        assert!(!null.is_new());
        assert!(null.title().is_empty());
        assert!(null.metadata_items().is_empty());
    }

    #[test]
    fn null_display_object_has_unknown_type() {
        let display = DisplayObject::null();
        assert!(display.is_null());
        assert_eq!(display.display_type(), DisplayType::Unknown);
        assert!(display.mime_type().is_null());
        assert!(display.size().is_empty());
    }

    #[test]
    fn null_mime_type_is_not_set() {
        assert_eq!(mime_type().category, MimeTypeCategory::NotSet);
        assert!(mime_type().full_type.is_empty());
    }

    #[test]
    fn null_metadata_values_are_empty() {
        assert!(metadata_item().is_null());
        assert!(metadata_item().value().is_empty());
        assert!(metadata_definition().is_null());
        assert!(media_template().is_none());
    }
}
