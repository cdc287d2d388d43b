//! Album children, moving and copying.
//!
//! An album owns its children as shells in insertion order. Moving an object
//! re-parents it and relocates its files into the destination album's
//! directory; copying duplicates record and files under a new id. Both
//! refuse to place an album inside itself or one of its descendants.

use super::{DATE_NOT_SET, GalleryObject, GalleryObjectType, ID_NOT_SET, ObjectKind, ObjectRecord};
use crate::Gallery;
use crate::error::GalleryError;
use crate::fs::{FileSystem, FsError};
use crate::metadata::resolve::sidecar_path;
use crate::naming::{rendition_path, unique_path};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

impl GalleryObject {
    /// Child shells matching `filter`, by `(sequence, id)` when
    /// `sort_by_sequence` is set and in insertion order otherwise.
    pub fn children(&self, filter: GalleryObjectType, sort_by_sequence: bool) -> Vec<&GalleryObject> {
        let mut children: Vec<&GalleryObject> = self
            .children
            .iter()
            .filter(|c| filter.matches(c.kind()))
            .collect();
        if sort_by_sequence {
            children.sort_by_key(|c| (c.sequence(), c.id()));
        }
        children
    }

    /// Sequence for the next child: one past the highest, or 1.
    pub fn next_sequence(&self) -> i32 {
        self.children
            .iter()
            .map(GalleryObject::sequence)
            .max()
            .map_or(1, |max| max.saturating_add(1))
    }

    /// Adopt `child`: set its parent and sequence and record its shell.
    ///
    /// Both objects must be writable and `self` must be an album. The null
    /// object adopts nothing.
    pub fn add_child(&mut self, child: &mut GalleryObject, gallery: &Gallery) -> Result<(), GalleryError> {
        if self.is_null() || child.is_null() {
            return Ok(());
        }
        self.ensure_album()?;
        self.ensure_writable()?;
        child.ensure_writable()?;
        guard_cycle(child, self.id(), gallery)?;

        child.record.parent_id = self.id();
        child.record.sequence = self.next_sequence();
        child.has_changes = true;
        if !child.is_new() {
            self.children.retain(|c| c.id() != child.id());
        }
        self.children.push(GalleryObject::from_shell_record(&child.record));
        debug!(parent = self.id(), child = child.id(), sequence = child.sequence(), "child added");
        Ok(())
    }

    /// Drop the child shell with `id` and return it detached, or the null
    /// object when there is no such child.
    pub fn remove_child(&mut self, id: i64) -> Result<GalleryObject, GalleryError> {
        if self.is_null() {
            return Ok(GalleryObject::null());
        }
        self.ensure_writable()?;
        let Some(index) = self.children.iter().position(|c| c.id() == id) else {
            return Ok(GalleryObject::null());
        };
        let mut shell = self.children.remove(index);
        shell.detach();
        Ok(shell)
    }

    /// Move into `destination`, taking files along, and save.
    ///
    /// All or nothing: when a file transfer or the save fails, moved files
    /// are put back and both objects are left as they were.
    pub fn move_to(&mut self, destination: &mut GalleryObject, gallery: &Gallery) -> Result<(), GalleryError> {
        if self.is_null() {
            return Ok(());
        }
        self.ensure_writable()?;
        let old_parent = self.parent_id();
        let record = self.record.clone();
        let had_changes = self.has_changes;
        let siblings = destination.child_records();
        let mut journal = FileJournal::new(gallery.fs(), Transfer::Move);

        if let Err(e) = self.move_into(destination, &mut journal, gallery) {
            journal.roll_back();
            self.record = record;
            self.has_changes = had_changes;
            destination.restore_children(&siblings);
            warn!(id = self.id(), error = %e, "move rolled back");
            return Err(e);
        }
        gallery.invalidate(old_parent);
        info!(id = self.id(), from = old_parent, to = destination.id(), "moved");
        Ok(())
    }

    fn move_into(
        &mut self,
        destination: &mut GalleryObject,
        journal: &mut FileJournal<'_>,
        gallery: &Gallery,
    ) -> Result<(), GalleryError> {
        destination.add_child(self, gallery)?;

        let target_dir = destination.directory().to_path_buf();
        let mut rebased = None;
        if !target_dir.as_os_str().is_empty() {
            match self.kind() {
                ObjectKind::MediaItem => self.relocate_media_files(&target_dir, journal, gallery)?,
                ObjectKind::Album => rebased = self.relocate_album_directory(&target_dir, journal, gallery)?,
                ObjectKind::Null => {}
            }
        }

        if let Err(e) = self.save(gallery) {
            if let Some((old_dir, new_dir)) = rebased {
                restore_descendants(self.id(), &new_dir, &old_dir, gallery);
            }
            return Err(e);
        }
        Ok(())
    }

    fn relocate_media_files(
        &mut self,
        target_dir: &Path,
        journal: &mut FileJournal<'_>,
        gallery: &Gallery,
    ) -> Result<(), GalleryError> {
        if self.record.original.file_name_physical_path().parent() == Some(target_dir) {
            return Ok(());
        }
        transfer_media_files(&mut self.record, target_dir, journal, gallery)?;
        self.has_changes = true;
        Ok(())
    }

    /// Rename the album directory into `target_dir` and rebase every
    /// descendant. Returns the old and new directory when anything moved.
    fn relocate_album_directory(
        &mut self,
        target_dir: &Path,
        journal: &mut FileJournal<'_>,
        gallery: &Gallery,
    ) -> Result<Option<(PathBuf, PathBuf)>, GalleryError> {
        let old_dir = self.record.directory.clone();
        if old_dir.as_os_str().is_empty() || old_dir.parent() == Some(target_dir) {
            return Ok(None);
        }
        let name = old_dir
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let new_dir = unique_path(gallery.fs(), target_dir, &name);
        journal.transfer(&old_dir, &new_dir)?;
        self.record.directory = new_dir.clone();
        self.has_changes = true;
        if let Err(e) = rebase_descendants(self.id(), &old_dir, &new_dir, gallery) {
            restore_descendants(self.id(), &new_dir, &old_dir, gallery);
            return Err(e);
        }
        Ok(Some((old_dir, new_dir)))
    }

    /// Duplicate into `destination` under a new id, with copied files, and
    /// return the saved copy. Albums are copied with all descendants. The
    /// null object copies to the null object.
    ///
    /// When the copy itself cannot be saved, copied files are removed and
    /// `destination` is left as it was. Descendants already copied when a
    /// later descendant fails are kept.
    pub fn copy_to(
        &self,
        destination: &mut GalleryObject,
        user_name: &str,
        gallery: &Gallery,
    ) -> Result<GalleryObject, GalleryError> {
        if self.is_null() {
            return Ok(GalleryObject::null());
        }
        if self.is_album() {
            guard_cycle(self, destination.id(), gallery)?;
        }

        let source = if self.is_inflated() {
            self.record.clone()
        } else {
            gallery
                .store()
                .load(self.id())?
                .ok_or(GalleryError::ObjectMissing { id: self.id() })?
        };

        let record = ObjectRecord {
            id: ID_NOT_SET,
            created_by: user_name.to_string(),
            last_modified_by: user_name.to_string(),
            date_added: DATE_NOT_SET,
            date_last_modified: DATE_NOT_SET,
            ..source
        };
        let siblings = destination.child_records();
        let mut journal = FileJournal::new(gallery.fs(), Transfer::Copy);
        let mut copy = match copy_record_into(record, destination, &mut journal, gallery) {
            Ok(copy) => copy,
            Err(e) => {
                journal.roll_back();
                destination.restore_children(&siblings);
                warn!(source = self.id(), error = %e, "copy rolled back");
                return Err(e);
            }
        };
        info!(source = self.id(), copy = copy.id(), "copied");

        if self.is_album() && !self.is_new() {
            for child in gallery.store().children(self.id())? {
                gallery.get(child.id).copy_to(&mut copy, user_name, gallery)?;
            }
        }
        Ok(copy)
    }

    fn child_records(&self) -> Vec<ObjectRecord> {
        self.children.iter().map(|c| c.record.clone()).collect()
    }

    fn restore_children(&mut self, records: &[ObjectRecord]) {
        self.children = records.iter().map(GalleryObject::from_shell_record).collect();
    }
}

/// Place files for `record` below `destination`, adopt it and save it.
fn copy_record_into(
    mut record: ObjectRecord,
    destination: &mut GalleryObject,
    journal: &mut FileJournal<'_>,
    gallery: &Gallery,
) -> Result<GalleryObject, GalleryError> {
    let target_dir = destination.directory().to_path_buf();
    if !target_dir.as_os_str().is_empty() {
        match record.kind {
            ObjectKind::MediaItem => transfer_media_files(&mut record, &target_dir, journal, gallery)?,
            ObjectKind::Album => {
                let name = record
                    .directory
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_default();
                let new_dir = unique_path(gallery.fs(), &target_dir, &name);
                journal.create_dir(&new_dir)?;
                record.directory = new_dir;
            }
            ObjectKind::Null => {}
        }
    }

    let mut copy = GalleryObject::new_writable(record);
    destination.add_child(&mut copy, gallery)?;
    copy.save(gallery)?;
    Ok(copy)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Transfer {
    Move,
    Copy,
}

impl Transfer {
    fn apply(self, fs: &dyn FileSystem, from: &Path, to: &Path) -> Result<(), FsError> {
        match self {
            Transfer::Move => fs.rename(from, to),
            Transfer::Copy => fs.copy(from, to),
        }
    }
}

#[derive(Debug)]
enum JournalEntry {
    Transferred { from: PathBuf, to: PathBuf },
    CreatedDir(PathBuf),
}

/// File operations done so far by one move or copy, so a failure part way
/// can put things back.
struct FileJournal<'a> {
    fs: &'a dyn FileSystem,
    transfer: Transfer,
    entries: Vec<JournalEntry>,
}

impl<'a> FileJournal<'a> {
    fn new(fs: &'a dyn FileSystem, transfer: Transfer) -> Self {
        Self {
            fs,
            transfer,
            entries: Vec::new(),
        }
    }

    fn transfer(&mut self, from: &Path, to: &Path) -> Result<(), FsError> {
        self.transfer.apply(self.fs, from, to)?;
        self.entries.push(JournalEntry::Transferred {
            from: from.to_path_buf(),
            to: to.to_path_buf(),
        });
        Ok(())
    }

    fn create_dir(&mut self, dir: &Path) -> Result<(), FsError> {
        self.fs.create_dir_all(dir)?;
        self.entries.push(JournalEntry::CreatedDir(dir.to_path_buf()));
        Ok(())
    }

    /// Undo every recorded operation, newest first. Failures are logged and
    /// skipped so the rest still gets undone.
    fn roll_back(self) {
        for entry in self.entries.into_iter().rev() {
            let result = match (&entry, self.transfer) {
                (JournalEntry::Transferred { from, to }, Transfer::Move) => self.fs.rename(to, from),
                (JournalEntry::Transferred { to, .. }, Transfer::Copy) => self.fs.delete(to),
                (JournalEntry::CreatedDir(dir), _) => self.fs.delete_dir_all(dir),
            };
            if let Err(e) = result {
                warn!(?entry, error = %e, "could not undo file operation");
            }
        }
    }
}

/// Move or copy the original, its sidecar and its renditions into
/// `target_dir`, updating the record's paths. Renditions are renamed after
/// the new original; ones not yet written only get the new path, and ones
/// using the original follow it.
fn transfer_media_files(
    record: &mut ObjectRecord,
    target_dir: &Path,
    journal: &mut FileJournal<'_>,
    gallery: &Gallery,
) -> Result<(), GalleryError> {
    let fs = gallery.fs();
    let old_original = record.original.file_name_physical_path().to_path_buf();
    if old_original.as_os_str().is_empty() {
        return Ok(());
    }
    let new_original = unique_path(fs, target_dir, record.original.file_name());
    journal.transfer(&old_original, &new_original)?;
    let old_sidecar = sidecar_path(&old_original);
    if fs.exists(&old_sidecar) {
        journal.transfer(&old_sidecar, &sidecar_path(&new_original))?;
    }
    record.original.set_physical_path(&new_original);

    let media = &gallery.config().media;
    for (rendition, prefix) in [
        (&mut record.thumbnail, &media.thumbnail_prefix),
        (&mut record.optimized, &media.optimized_prefix),
    ] {
        let current = rendition.rendition_path().to_path_buf();
        if current.as_os_str().is_empty() {
            continue;
        }
        let extension = current
            .extension()
            .map(|e| e.to_string_lossy().into_owned())
            .unwrap_or_else(|| media.rendition_file_type.clone());
        let target = rendition_path(prefix, &new_original, &extension);
        if rendition.uses_original() {
            rendition.set_physical_path(&new_original);
            rendition.set_rendition_path(&target);
            continue;
        }
        if fs.exists(&current) {
            journal.transfer(&current, &target)?;
        }
        rendition.set_rendition_path(&target);
    }
    debug!(
        from = %old_original.display(),
        to = %new_original.display(),
        transfer = ?journal.transfer,
        "media files transferred"
    );
    Ok(())
}

/// Rewrite stored paths below `old_dir` to sit below `new_dir`, for every
/// descendant of `album_id`.
fn rebase_descendants(album_id: i64, old_dir: &Path, new_dir: &Path, gallery: &Gallery) -> Result<(), GalleryError> {
    let rebase = |path: &Path| -> Option<PathBuf> { path.strip_prefix(old_dir).ok().map(|rest| new_dir.join(rest)) };
    for child in gallery.store().children(album_id)? {
        let mut object = gallery.load_writable(child.id)?;
        if let Some(dir) = rebase(&object.record.directory) {
            object.record.directory = dir;
        }
        for display in [
            &mut object.record.original,
            &mut object.record.thumbnail,
            &mut object.record.optimized,
        ] {
            if let Some(path) = rebase(display.file_name_physical_path()) {
                display.set_physical_path(&path);
            }
            if display.uses_original() {
                if let Some(path) = rebase(display.rendition_path()) {
                    display.set_rendition_path(&path);
                }
            }
        }
        object.has_changes = true;
        object.save(gallery)?;
        if object.is_album() {
            rebase_descendants(object.id(), old_dir, new_dir, gallery)?;
        }
    }
    Ok(())
}

/// Best-effort reverse of [`rebase_descendants`] after a failed move.
fn restore_descendants(album_id: i64, from: &Path, to: &Path, gallery: &Gallery) {
    if let Err(e) = rebase_descendants(album_id, from, to, gallery) {
        warn!(album = album_id, error = %e, "could not restore descendant paths");
    }
}

/// Fail when placing `child` under `target_id` would make an album its own
/// ancestor.
fn guard_cycle(child: &GalleryObject, target_id: i64, gallery: &Gallery) -> Result<(), GalleryError> {
    let cycle = || GalleryError::CycleDetected {
        child: child.id(),
        target: target_id,
    };
    if child.is_new() || target_id == ID_NOT_SET {
        return Ok(());
    }
    if child.id() == target_id {
        return Err(cycle());
    }
    if !child.is_album() {
        return Ok(());
    }
    if child.children.iter().any(|c| c.id() == target_id) {
        return Err(cycle());
    }

    let mut visited = HashSet::new();
    let mut current = target_id;
    while current != ID_NOT_SET && visited.insert(current) {
        if current == child.id() {
            return Err(cycle());
        }
        let ancestor = gallery.get(current);
        if ancestor.is_null() {
            break;
        }
        current = ancestor.parent_id();
    }
    Ok(())
}
