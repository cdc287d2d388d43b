//! The gallery context.
//!
//! A [`Gallery`] bundles what gallery objects need from the outside world:
//! the collaborators, configuration, the mime type registry, metadata
//! definitions, lifecycle hooks and the cache of shared read-only objects.
//! Objects never hold a reference to it; operations that need it take
//! `&Gallery`.
//!
//! ## Lookups
//!
//! | Call | Returns | Missing id | Store failure |
//! |---|---|---|---|
//! | [`get`](Gallery::get) | shared, read-only `Arc` | null object | null object, logged |
//! | [`try_get`](Gallery::try_get) | shared, read-only `Arc` | `None` | `Err` |
//! | [`load_writable`](Gallery::load_writable) | fresh, writable instance | null object | `Err` |

use crate::config::GalleryConfig;
use crate::display::{DisplayObject, DisplayType};
use crate::error::GalleryError;
use crate::fs::{FileSystem, LocalFileSystem};
use crate::html::{AllowListValidator, HtmlValidator};
use crate::imaging::{ImageBackend, RustBackend, get_dimensions};
use crate::metadata::resolve::resolve;
use crate::metadata::{
    EmbeddedMetadataReader, MetadataDefinitionCollection, MetadataItemName, MetadataReader, RawMetadata,
};
use crate::mime::{MimeTypeCategory, MimeTypeRegistry};
use crate::naming::{default_title, directory_name, rendition_path, unique_path};
use crate::null;
use crate::object::{GalleryObject, ID_NOT_SET, LifecycleHooks, ObjectKind, ObjectRecord};
use crate::orientation::Orientation;
use crate::store::GalleryStore;
use moka::sync::Cache;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Gallery id used when none is given.
pub const DEFAULT_GALLERY_ID: i64 = 1;

/// External services a gallery works through.
#[derive(Clone)]
pub struct Collaborators {
    pub store: Arc<dyn GalleryStore>,
    pub fs: Arc<dyn FileSystem>,
    pub backend: Arc<dyn ImageBackend>,
    pub metadata_reader: Arc<dyn MetadataReader>,
    pub html_validator: Arc<dyn HtmlValidator>,
}

impl Collaborators {
    /// Local disk, the pure-Rust image backend, embedded metadata and the
    /// stock HTML allow-list, around `store`.
    pub fn local(store: Arc<dyn GalleryStore>, config: &GalleryConfig) -> Self {
        let backend: Arc<dyn ImageBackend> = Arc::new(RustBackend::new());
        Self {
            store,
            fs: Arc::new(LocalFileSystem::new()),
            metadata_reader: Arc::new(EmbeddedMetadataReader::new(
                Arc::clone(&backend),
                config.metadata.caption_sidecar,
            )),
            backend,
            html_validator: Arc::new(AllowListValidator::default()),
        }
    }
}

pub struct Gallery {
    id: i64,
    config: GalleryConfig,
    collaborators: Collaborators,
    registry: MimeTypeRegistry,
    definitions: MetadataDefinitionCollection,
    hooks: LifecycleHooks,
    cache: Cache<i64, Arc<GalleryObject>>,
}

impl Gallery {
    pub fn new(config: GalleryConfig, collaborators: Collaborators) -> Self {
        Self::with_id(DEFAULT_GALLERY_ID, config, collaborators)
    }

    pub fn with_id(id: i64, config: GalleryConfig, collaborators: Collaborators) -> Self {
        let registry = MimeTypeRegistry::new(&config.mime_types);
        let definitions = MetadataDefinitionCollection::from_config(&config.metadata);
        let cache = Cache::builder().max_capacity(config.cache.capacity).build();
        debug!(id, mime_types = registry.len(), definitions = definitions.len(), "gallery ready");
        Self {
            id,
            config,
            collaborators,
            registry,
            definitions,
            hooks: LifecycleHooks::default(),
            cache,
        }
    }

    pub fn id(&self) -> i64 {
        self.id
    }

    pub fn config(&self) -> &GalleryConfig {
        &self.config
    }

    pub fn store(&self) -> &dyn GalleryStore {
        self.collaborators.store.as_ref()
    }

    pub fn fs(&self) -> &dyn FileSystem {
        self.collaborators.fs.as_ref()
    }

    pub fn backend(&self) -> &dyn ImageBackend {
        self.collaborators.backend.as_ref()
    }

    pub fn metadata_reader(&self) -> &dyn MetadataReader {
        self.collaborators.metadata_reader.as_ref()
    }

    pub fn html_validator(&self) -> &dyn HtmlValidator {
        self.collaborators.html_validator.as_ref()
    }

    pub fn mime_types(&self) -> &MimeTypeRegistry {
        &self.registry
    }

    pub fn definitions(&self) -> &MetadataDefinitionCollection {
        &self.definitions
    }

    pub fn hooks(&self) -> &LifecycleHooks {
        &self.hooks
    }

    pub fn hooks_mut(&mut self) -> &mut LifecycleHooks {
        &mut self.hooks
    }

    // =========================================================================
    // Lookups
    // =========================================================================

    /// Shared read-only instance, or the null object.
    pub fn get(&self, id: i64) -> Arc<GalleryObject> {
        match self.try_get(id) {
            Ok(Some(object)) => object,
            Ok(None) => null::gallery_object(),
            Err(e) => {
                warn!(id, error = %e, "lookup failed, using null object");
                null::gallery_object()
            }
        }
    }

    /// Shared read-only instance, surfacing store failures.
    pub fn try_get(&self, id: i64) -> Result<Option<Arc<GalleryObject>>, GalleryError> {
        if id == ID_NOT_SET {
            return Ok(None);
        }
        if let Some(object) = self.cache.get(&id) {
            return Ok(Some(object));
        }
        let Some(object) = GalleryObject::load(self.store(), id, false)? else {
            return Ok(None);
        };
        let object = Arc::new(object);
        self.cache.insert(id, Arc::clone(&object));
        Ok(Some(object))
    }

    /// A fresh instance that may be modified, saved and deleted. Never
    /// served from the cache.
    pub fn load_writable(&self, id: i64) -> Result<GalleryObject, GalleryError> {
        if id == ID_NOT_SET {
            return Ok(GalleryObject::null());
        }
        Ok(GalleryObject::load(self.store(), id, true)?.unwrap_or_else(GalleryObject::null))
    }

    /// Drop the shared instance of `id`, if any.
    pub fn invalidate(&self, id: i64) {
        if id != ID_NOT_SET {
            self.cache.invalidate(&id);
        }
    }

    // =========================================================================
    // Factories
    // =========================================================================

    /// A new top-level album over `directory`. Not saved.
    pub fn create_root_album(
        &self,
        directory: &Path,
        title: &str,
        user_name: &str,
    ) -> Result<GalleryObject, GalleryError> {
        self.fs().create_dir_all(directory)?;
        let record = ObjectRecord {
            title: title.to_string(),
            directory: directory.to_path_buf(),
            created_by: user_name.to_string(),
            last_modified_by: user_name.to_string(),
            ..ObjectRecord::new(ObjectKind::Album, self.id, ID_NOT_SET)
        };
        Ok(GalleryObject::new_writable(record))
    }

    /// A new album inside `parent`, with its own directory. Not saved.
    pub fn create_album(
        &self,
        parent: &GalleryObject,
        title: &str,
        user_name: &str,
    ) -> Result<GalleryObject, GalleryError> {
        parent.ensure_album()?;
        let name = directory_name(title);
        let directory = if parent.directory().as_os_str().is_empty() {
            Path::new(&name).to_path_buf()
        } else {
            unique_path(self.fs(), parent.directory(), &name)
        };
        self.fs().create_dir_all(&directory)?;
        let record = ObjectRecord {
            sequence: parent.next_sequence(),
            title: title.to_string(),
            directory,
            created_by: user_name.to_string(),
            last_modified_by: user_name.to_string(),
            ..ObjectRecord::new(ObjectKind::Album, self.id, parent.id())
        };
        Ok(GalleryObject::new_writable(record))
    }

    /// A new media item for `file` inside `parent`. Not saved.
    ///
    /// Files outside the album directory are copied in. Images are measured
    /// and get thumbnail and optimized rendition paths; nothing is rendered
    /// until [`GalleryObject::generate_renditions`].
    pub fn create_media_item(
        &self,
        parent: &GalleryObject,
        file: &Path,
        user_name: &str,
    ) -> Result<GalleryObject, GalleryError> {
        parent.ensure_album()?;
        if !self.registry.is_allowed(file) {
            return Err(GalleryError::FileTypeNotAllowed {
                path: file.to_path_buf(),
            });
        }
        let fs = self.fs();
        let mime_type = self.registry.lookup_file(file);
        let file_name = file
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();

        let target = match parent.directory() {
            dir if dir.as_os_str().is_empty() || file.parent() == Some(dir) => file.to_path_buf(),
            dir => {
                let target = unique_path(fs, dir, &file_name);
                fs.copy(file, &target)?;
                target
            }
        };

        let mut original = DisplayObject::new(DisplayType::Original, &target, Arc::clone(&mime_type));
        original.set_file_size_kb(fs.size_kb(file)?);
        let (mut thumbnail, mut optimized) = (DisplayObject::null(), DisplayObject::null());
        if mime_type.category == MimeTypeCategory::Image {
            match get_dimensions(self.backend(), file) {
                Ok((width, height)) => original.set_dimensions(width, height),
                Err(e) => warn!(file = %file.display(), error = %e, "could not measure image"),
            }
            let media = &self.config.media;
            let rendition_type = self.registry.lookup_extension(&media.rendition_file_type);
            thumbnail = DisplayObject::new(
                DisplayType::Thumbnail,
                &rendition_path(&media.thumbnail_prefix, &target, &media.rendition_file_type),
                Arc::clone(&rendition_type),
            );
            optimized = DisplayObject::new(
                DisplayType::Optimized,
                &rendition_path(&media.optimized_prefix, &target, &media.rendition_file_type),
                rendition_type,
            );
        }

        let raw = if self.config.metadata.extract_on_add {
            self.metadata_reader().read(file).unwrap_or_else(|e| {
                warn!(file = %file.display(), error = %e, "metadata unreadable");
                RawMetadata::new()
            })
        } else {
            RawMetadata::new()
        };
        let embedded = |name: MetadataItemName| raw.get(&name).map(String::as_str);
        let fallback_title = default_title(file);

        let record = ObjectRecord {
            sequence: parent.next_sequence(),
            title: resolve(&[embedded(MetadataItemName::Title), Some(fallback_title.as_str())]).unwrap_or_default(),
            caption: embedded(MetadataItemName::Caption).unwrap_or_default().to_string(),
            created_by: user_name.to_string(),
            last_modified_by: user_name.to_string(),
            hash_key: fs.hash(file)?,
            rotate_flip: embedded(MetadataItemName::Orientation)
                .map(Orientation::parse)
                .unwrap_or_default()
                .needed_rotation(),
            thumbnail,
            optimized,
            original,
            ..ObjectRecord::new(ObjectKind::MediaItem, self.id, parent.id())
        };
        let mut object = GalleryObject::new_writable(record);
        if self.config.metadata.extract_on_add {
            object.extract_metadata_from(&raw, &self.definitions);
        }
        info!(
            file = %target.display(),
            album = parent.id(),
            mime = %object.mime_type().full_type,
            "media item created"
        );
        Ok(object)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::object::GalleryObjectType;
    use crate::orientation::RotateFlip;
    use crate::test_helpers::Fixture;
    use std::path::PathBuf;

    // =========================================================================
    // Lookups
    // =========================================================================

    #[test]
    fn get_missing_is_null() {
        let fixture = Fixture::new();
        let missing = fixture.gallery.get(12345);
        assert!(missing.is_null());
        assert!(fixture.gallery.get(ID_NOT_SET).is_null());
    }

    #[test]
    fn get_is_cached_and_read_only() {
        let fixture = Fixture::new();
        let album = fixture.saved_album("Trips");
        let before = fixture.store.load_count();

        let a = fixture.gallery.get(album);
        let b = fixture.gallery.get(album);
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(fixture.store.load_count() - before, 1);
        assert!(!a.is_writable());
        assert!(a.is_inflated());
    }

    #[test]
    fn get_store_failure_is_null_but_try_get_errors() {
        let fixture = Fixture::new();
        let album = fixture.saved_album("Trips");
        fixture.store.set_unavailable(true);

        assert!(fixture.gallery.get(album).is_null());
        assert!(matches!(fixture.gallery.try_get(album), Err(GalleryError::Store(_))));
    }

    #[test]
    fn load_writable_is_fresh() {
        let fixture = Fixture::new();
        let album = fixture.saved_album("Trips");
        let shared = fixture.gallery.get(album);
        let writable = fixture.gallery.load_writable(album).unwrap();

        assert!(writable.is_writable());
        assert!(!shared.is_writable());
        assert!(fixture.gallery.load_writable(999).unwrap().is_null());
    }

    // =========================================================================
    // Albums
    // =========================================================================

    #[test]
    fn create_album_makes_directory_below_parent() {
        let fixture = Fixture::new();
        let root = fixture.saved_album("Root");
        let parent = fixture.gallery.get(root);

        let album = fixture.gallery.create_album(&parent, "Summer 2024!", "ana").unwrap();
        assert_eq!(album.directory(), parent.directory().join("Summer-2024"));
        assert_eq!(album.parent_id(), root);
        assert_eq!(album.sequence(), 1);
        assert!(album.is_new());
    }

    #[test]
    fn create_album_in_media_item_fails() {
        let fixture = Fixture::new();
        let album = fixture.saved_album("Trips");
        let item = fixture.gallery.get(fixture.saved_media_item(album, "a.jpg"));
        assert!(matches!(
            fixture.gallery.create_album(&item, "Nope", "ana"),
            Err(GalleryError::NotAnAlbum { .. })
        ));
    }

    // =========================================================================
    // Media items
    // =========================================================================

    #[test]
    fn create_media_item_fills_record() {
        let fixture = Fixture::new();
        let album = fixture.saved_album("Trips");
        let parent = fixture.gallery.get(album);
        let source = fixture.media_path("010-salt-flats.jpg");

        let item = fixture.gallery.create_media_item(&parent, &source, "ana").unwrap();

        assert_eq!(item.title(), "salt flats");
        assert_eq!(item.created_by(), "ana");
        assert_eq!(item.hash_key().len(), 64);
        assert_eq!(item.original().file_name_physical_path(), parent.directory().join("010-salt-flats.jpg"));
        assert_eq!(item.thumbnail().file_name(), "zThumb_010-salt-flats.jpg");
        assert_eq!(item.optimized().file_name(), "zOpt_010-salt-flats.jpg");
        assert_eq!(item.mime_type().category, MimeTypeCategory::Image);
        assert!(item.is_metadata_loaded());
        assert_eq!(item.metadata_items().get(MetadataItemName::FileName).value(), "010-salt-flats.jpg");
        assert!(fixture.fs.copied().contains(&(source, parent.directory().join("010-salt-flats.jpg"))));
    }

    #[test]
    fn create_media_item_uses_embedded_values() {
        let fixture = Fixture::new();
        let album = fixture.saved_album("Trips");
        let parent = fixture.gallery.get(album);
        fixture.reader.set_raw(RawMetadata::from([
            (MetadataItemName::Title, "Dawn".to_string()),
            (MetadataItemName::Caption, "First light".to_string()),
            (MetadataItemName::Orientation, "6".to_string()),
        ]));

        let item = fixture
            .gallery
            .create_media_item(&parent, &fixture.media_path("IMG_1.jpg"), "ana")
            .unwrap();
        assert_eq!(item.title(), "Dawn");
        assert_eq!(item.caption(), "First light");
        assert_eq!(item.rotate_flip(), RotateFlip::Rotate90);
    }

    #[test]
    fn non_image_has_no_renditions() {
        let fixture = Fixture::new();
        let album = fixture.saved_album("Trips");
        let parent = fixture.gallery.get(album);
        let item = fixture
            .gallery
            .create_media_item(&parent, &fixture.media_path("clip.mp4"), "ana")
            .unwrap();
        assert_eq!(item.mime_type().category, MimeTypeCategory::Video);
        assert!(item.thumbnail().is_null());
        assert!(item.optimized().is_null());
    }

    #[test]
    fn disallowed_type_is_rejected() {
        let fixture = Fixture::new();
        let album = fixture.saved_album("Trips");
        let parent = fixture.gallery.get(album);
        let result = fixture
            .gallery
            .create_media_item(&parent, &fixture.media_path("model.xyz"), "ana");
        assert!(matches!(
            result,
            Err(GalleryError::FileTypeNotAllowed { path }) if path.ends_with("model.xyz")
        ));
    }

    #[test]
    fn sequences_follow_existing_children() {
        let fixture = Fixture::new();
        let album = fixture.saved_album("Trips");
        fixture.saved_media_item(album, "a.jpg");
        fixture.saved_media_item(album, "b.jpg");
        let third = fixture.saved_media_item(album, "c.jpg");

        assert_eq!(fixture.gallery.get(third).sequence(), 3);
        let parent = fixture.gallery.get(album);
        let sequences: Vec<i32> = parent
            .children(GalleryObjectType::MediaItem, true)
            .iter()
            .map(|c| c.sequence())
            .collect();
        assert_eq!(sequences, vec![1, 2, 3]);
    }

    #[test]
    fn root_album_directory_is_created() {
        let fixture = Fixture::new();
        let dir = PathBuf::from("/galleries/main");
        let root = fixture.gallery.create_root_album(&dir, "Main", "ana").unwrap();
        assert_eq!(root.directory(), dir.as_path());
        assert_eq!(root.parent_id(), ID_NOT_SET);
        assert!(fixture.fs.created_dirs().contains(&dir));
    }
}
