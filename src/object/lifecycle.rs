//! Inflate, save and delete.
//!
//! ```text
//! shell ──inflate──► inflated ──(writable)──► save ─► saving · store · saved
//!                                     └────► delete ─► deleting · files · store · deleted
//! ```
//!
//! Save and delete refuse read-only instances with
//! [`GalleryError::WritePermission`]. The null object accepts both and does
//! nothing.

use super::{GalleryObject, ID_NOT_SET, LifecycleEvent, ObjectKind, Writability};
use crate::Gallery;
use crate::display::DisplayObject;
use crate::error::GalleryError;
use crate::metadata::resolve::sidecar_path;
use crate::store::GalleryStore;
use chrono::Utc;
use tracing::{debug, info};

/// What deleting a non-empty album does.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DeletePolicy {
    /// Delete every descendant first.
    #[default]
    Recursive,
    /// Fail with [`GalleryError::AlbumNotEmpty`].
    RefuseNonEmpty,
}

impl GalleryObject {
    /// Load an inflated object by id, or `None` when the store has no such
    /// record.
    pub(crate) fn load(store: &dyn GalleryStore, id: i64, writable: bool) -> Result<Option<Self>, GalleryError> {
        let Some(record) = store.load(id)? else {
            return Ok(None);
        };
        let mut object = Self::from_shell_record(&record);
        let children = match record.kind {
            ObjectKind::Album => store.children(id)?,
            _ => Vec::new(),
        };
        object.complete_inflation(record, &children);
        object.writability = if writable {
            Writability::Writable
        } else {
            Writability::ReadOnly
        };
        Ok(Some(object))
    }

    /// Populate a shell from the store.
    ///
    /// Idempotent: inflated objects (and the null object) return at once
    /// without touching the store. On any error, including the record having
    /// vanished, the object stays a shell.
    pub fn inflate(&mut self, gallery: &Gallery) -> Result<(), GalleryError> {
        if self.is_inflated() {
            return Ok(());
        }
        let id = self.id();
        let store = gallery.store();
        let record = store.load(id)?.ok_or(GalleryError::ObjectMissing { id })?;
        let children = match record.kind {
            ObjectKind::Album => store.children(id)?,
            _ => Vec::new(),
        };
        self.complete_inflation(record, &children);
        debug!(id, "inflated");
        Ok(())
    }

    /// Persist this object, notifying listeners before and after.
    ///
    /// Edited metadata marked `persist_to_file` is written back to the
    /// original file first. Returns the (possibly newly assigned) id.
    pub fn save(&mut self, gallery: &Gallery) -> Result<i64, GalleryError> {
        if self.is_null() {
            return Ok(ID_NOT_SET);
        }
        self.ensure_writable()?;
        gallery.hooks().fire(LifecycleEvent::Saving, self);

        let now = Utc::now();
        let was_new = self.is_new();
        if was_new && self.record.date_added == super::DATE_NOT_SET {
            self.record.date_added = now;
        }
        self.record.date_last_modified = now;

        if self.record.kind == ObjectKind::MediaItem
            && owns_file(&self.record.original)
            && self.record.metadata_items.has_changes()
        {
            gallery
                .metadata_reader()
                .write(self.record.original.file_name_physical_path(), &self.record.metadata_items)?;
        }

        let id = gallery.store().save(&self.record)?;
        if was_new {
            self.bind_to_id(id);
            gallery.store().save(&self.record)?;
        }
        self.record.metadata_items.mark_clean();
        self.has_changes = false;

        gallery.invalidate(id);
        gallery.invalidate(self.record.parent_id);
        gallery.hooks().fire(LifecycleEvent::Saved, self);
        info!(id, title = %self.record.title, kind = ?self.record.kind, "saved");
        Ok(id)
    }

    fn bind_to_id(&mut self, id: i64) {
        self.record.id = id;
        for display in [
            &mut self.record.thumbnail,
            &mut self.record.optimized,
            &mut self.record.original,
        ] {
            display.set_media_object_id(id);
        }
        self.record.metadata_items.bind_to(id);
        for child in &mut self.children {
            child.record.parent_id = id;
        }
    }

    /// Remove the object, its renditions, metadata and original file.
    /// Albums take their descendants with them.
    pub fn delete(self, gallery: &Gallery) -> Result<(), GalleryError> {
        self.remove(gallery, DeletePolicy::Recursive, true)
    }

    /// Like [`delete`](Self::delete) but originals stay on disk.
    pub fn delete_from_gallery(self, gallery: &Gallery) -> Result<(), GalleryError> {
        self.remove(gallery, DeletePolicy::Recursive, false)
    }

    /// [`delete`](Self::delete) with an explicit policy for non-empty albums.
    pub fn delete_with_policy(self, gallery: &Gallery, policy: DeletePolicy) -> Result<(), GalleryError> {
        self.remove(gallery, policy, true)
    }

    fn remove(self, gallery: &Gallery, policy: DeletePolicy, remove_original: bool) -> Result<(), GalleryError> {
        if self.is_null() {
            return Ok(());
        }
        self.ensure_writable()?;
        if self.is_album() && policy == DeletePolicy::RefuseNonEmpty && !self.children.is_empty() {
            return Err(GalleryError::AlbumNotEmpty { id: self.id() });
        }
        gallery.hooks().fire(LifecycleEvent::Deleting, &self);

        for shell in &self.children {
            let child = gallery.load_writable(shell.id())?;
            child.remove(gallery, policy, remove_original)?;
        }
        self.remove_files(gallery, remove_original)?;

        let id = self.id();
        if !self.is_new() {
            gallery.store().delete(id)?;
        }
        gallery.invalidate(id);
        gallery.invalidate(self.record.parent_id);
        gallery.hooks().fire(LifecycleEvent::Deleted, &self);
        info!(id, title = %self.record.title, keep_original = !remove_original, "deleted");
        Ok(())
    }

    fn remove_files(&self, gallery: &Gallery, remove_original: bool) -> Result<(), GalleryError> {
        let fs = gallery.fs();
        match self.record.kind {
            ObjectKind::MediaItem => {
                let original = self.record.original.file_name_physical_path();
                for rendition in [&self.record.thumbnail, &self.record.optimized] {
                    if owns_file(rendition) && rendition.rendition_path() != original {
                        fs.delete(rendition.rendition_path())?;
                    }
                }
                if remove_original && owns_file(&self.record.original) {
                    fs.delete(original)?;
                    fs.delete(&sidecar_path(original))?;
                }
            }
            ObjectKind::Album => {
                if remove_original && !self.record.directory.as_os_str().is_empty() {
                    fs.delete_dir_all(&self.record.directory)?;
                }
            }
            ObjectKind::Null => {}
        }
        Ok(())
    }
}

fn owns_file(display: &DisplayObject) -> bool {
    !display.is_null() && !display.file_name_physical_path().as_os_str().is_empty()
}
