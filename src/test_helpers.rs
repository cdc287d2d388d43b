//! Shared test utilities.
//!
//! Provides recording collaborators and a [`Fixture`] that wires them into a
//! [`Gallery`] over a [`MemoryStore`].
//!
//! # Usage
//!
//! ```ignore
//! use crate::test_helpers::*;
//!
//! let fixture = Fixture::new();
//! let album = fixture.saved_album("Trips");
//! let item = fixture.saved_media_item(album, "010-beach.jpg");
//!
//! let object = fixture.gallery.load_writable(item).unwrap();
//! object.delete(&fixture.gallery).unwrap();
//! assert!(fixture.fs.deleted().len() >= 2);
//! ```

use crate::config::GalleryConfig;
use crate::display::{DisplayObject, DisplayType};
use crate::fs::{FileSystem, FsError};
use crate::gallery::{Collaborators, Gallery};
use crate::html::AllowListValidator;
use crate::imaging::backend::tests::MockBackend;
use crate::metadata::{MetadataError, MetadataItemCollection, MetadataItemName, MetadataReader, RawMetadata};
use crate::mime::MimeTypeRegistry;
use crate::naming::directory_name;
use crate::object::{ID_NOT_SET, ObjectKind, ObjectRecord};
use crate::store::MemoryStore;
use sha2::{Digest, Sha256};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tempfile::TempDir;

// =========================================================================
// Records
// =========================================================================

/// A bare record of `kind` under `parent_id`.
pub fn record(kind: ObjectKind, parent_id: i64, sequence: i32) -> ObjectRecord {
    ObjectRecord {
        sequence,
        title: format!("{kind:?} {sequence}"),
        ..ObjectRecord::new(kind, 1, parent_id)
    }
}

/// A media item record with a measured JPEG original.
pub fn media_record(id: i64, sequence: i32) -> ObjectRecord {
    let jpeg = MimeTypeRegistry::default().lookup_extension("jpg");
    let mut original = DisplayObject::new(
        DisplayType::Original,
        Path::new("/gallery/trips/photo.jpg"),
        jpeg,
    );
    original.set_dimensions(800, 600);
    original.set_file_size_kb(120);
    ObjectRecord {
        id,
        sequence,
        title: "photo".into(),
        original,
        ..ObjectRecord::new(ObjectKind::MediaItem, 1, ID_NOT_SET)
    }
}

// =========================================================================
// Recording file system
// =========================================================================

#[derive(Debug, Clone, PartialEq)]
pub enum FsOp {
    Copy(PathBuf, PathBuf),
    Rename(PathBuf, PathBuf),
    Delete(PathBuf),
    DeleteDirAll(PathBuf),
    CreateDirAll(PathBuf),
}

/// File system that records calls and tracks which paths exist, without
/// touching disk. Sizes and hashes read real files when they exist.
#[derive(Default)]
pub struct MockFileSystem {
    files: Mutex<BTreeSet<PathBuf>>,
    ops: Mutex<Vec<FsOp>>,
    refused: Mutex<BTreeSet<PathBuf>>,
}

impl MockFileSystem {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_file(&self, path: impl AsRef<Path>) {
        self.files.lock().unwrap().insert(path.as_ref().to_path_buf());
    }

    /// Make every copy or rename onto `path` fail.
    pub fn refuse_writes_to(&self, path: impl AsRef<Path>) {
        self.refused.lock().unwrap().insert(path.as_ref().to_path_buf());
    }

    fn check_refused(&self, to: &Path) -> Result<(), FsError> {
        if self.refused.lock().unwrap().contains(to) {
            return Err(FsError::Io(std::io::Error::other(format!(
                "mock write refused: {}",
                to.display()
            ))));
        }
        Ok(())
    }

    pub fn ops(&self) -> Vec<FsOp> {
        self.ops.lock().unwrap().clone()
    }

    pub fn renamed(&self) -> Vec<(PathBuf, PathBuf)> {
        self.ops()
            .into_iter()
            .filter_map(|op| match op {
                FsOp::Rename(from, to) => Some((from, to)),
                _ => None,
            })
            .collect()
    }

    pub fn copied(&self) -> Vec<(PathBuf, PathBuf)> {
        self.ops()
            .into_iter()
            .filter_map(|op| match op {
                FsOp::Copy(from, to) => Some((from, to)),
                _ => None,
            })
            .collect()
    }

    pub fn deleted(&self) -> Vec<PathBuf> {
        self.ops()
            .into_iter()
            .filter_map(|op| match op {
                FsOp::Delete(path) | FsOp::DeleteDirAll(path) => Some(path),
                _ => None,
            })
            .collect()
    }

    pub fn created_dirs(&self) -> Vec<PathBuf> {
        self.ops()
            .into_iter()
            .filter_map(|op| match op {
                FsOp::CreateDirAll(path) => Some(path),
                _ => None,
            })
            .collect()
    }

    fn record(&self, op: FsOp) {
        self.ops.lock().unwrap().push(op);
    }
}

impl FileSystem for MockFileSystem {
    fn exists(&self, path: &Path) -> bool {
        self.files.lock().unwrap().contains(path)
    }

    fn copy(&self, from: &Path, to: &Path) -> Result<(), FsError> {
        self.check_refused(to)?;
        self.record(FsOp::Copy(from.to_path_buf(), to.to_path_buf()));
        self.add_file(to);
        Ok(())
    }

    fn rename(&self, from: &Path, to: &Path) -> Result<(), FsError> {
        self.check_refused(to)?;
        self.record(FsOp::Rename(from.to_path_buf(), to.to_path_buf()));
        let mut files = self.files.lock().unwrap();
        let moved: Vec<PathBuf> = files.iter().filter(|p| p.starts_with(from)).cloned().collect();
        for path in moved {
            files.remove(&path);
            if let Ok(rest) = path.strip_prefix(from) {
                files.insert(to.join(rest));
            }
        }
        files.insert(to.to_path_buf());
        Ok(())
    }

    fn delete(&self, path: &Path) -> Result<(), FsError> {
        self.record(FsOp::Delete(path.to_path_buf()));
        self.files.lock().unwrap().remove(path);
        Ok(())
    }

    fn delete_dir_all(&self, path: &Path) -> Result<(), FsError> {
        self.record(FsOp::DeleteDirAll(path.to_path_buf()));
        self.files.lock().unwrap().retain(|p| !p.starts_with(path));
        Ok(())
    }

    fn create_dir_all(&self, path: &Path) -> Result<(), FsError> {
        self.record(FsOp::CreateDirAll(path.to_path_buf()));
        self.add_file(path);
        Ok(())
    }

    fn size_kb(&self, path: &Path) -> Result<u64, FsError> {
        Ok(std::fs::metadata(path).map(|m| m.len().div_ceil(1024)).unwrap_or(0))
    }

    fn hash(&self, path: &Path) -> Result<String, FsError> {
        let bytes = std::fs::read(path).unwrap_or_else(|_| path.to_string_lossy().into_owned().into_bytes());
        Ok(format!("{:x}", Sha256::digest(&bytes)))
    }
}

// =========================================================================
// Recording metadata reader
// =========================================================================

/// Returns the same raw values for every file and counts reads.
#[derive(Default)]
pub struct MockMetadataReader {
    raw: Mutex<RawMetadata>,
    reads: AtomicUsize,
    fail: AtomicBool,
    writes: Mutex<Vec<(PathBuf, MetadataItemName, String)>>,
}

impl MockMetadataReader {
    pub fn set_raw(&self, raw: RawMetadata) {
        *self.raw.lock().unwrap() = raw;
    }

    pub fn fail_reads(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }

    pub fn read_count(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }

    pub fn written(&self) -> Vec<(PathBuf, MetadataItemName, String)> {
        self.writes.lock().unwrap().clone()
    }
}

impl MetadataReader for MockMetadataReader {
    fn read(&self, _path: &Path) -> Result<RawMetadata, MetadataError> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        if self.fail.load(Ordering::SeqCst) {
            return Err(MetadataError::Io(std::io::Error::other("mock read failure")));
        }
        Ok(self.raw.lock().unwrap().clone())
    }

    fn write(&self, path: &Path, items: &MetadataItemCollection) -> Result<(), MetadataError> {
        let mut writes = self.writes.lock().unwrap();
        for item in items.iter().filter(|i| i.persist_to_file() && i.has_changes()) {
            writes.push((path.to_path_buf(), item.name(), item.raw_value().to_string()));
        }
        Ok(())
    }
}

// =========================================================================
// Fixture
// =========================================================================

/// A gallery over recording collaborators, plus builders for saved objects.
pub struct Fixture {
    pub tmp: TempDir,
    pub store: Arc<MemoryStore>,
    pub fs: Arc<MockFileSystem>,
    pub reader: Arc<MockMetadataReader>,
    pub backend: Arc<MockBackend>,
    pub gallery: Gallery,
}

impl Fixture {
    pub fn new() -> Self {
        Self::with_config(GalleryConfig::default())
    }

    pub fn with_config(config: GalleryConfig) -> Self {
        let store = Arc::new(MemoryStore::new());
        let fs = Arc::new(MockFileSystem::new());
        let reader = Arc::new(MockMetadataReader::default());
        let backend = Arc::new(MockBackend::new());
        let collaborators = Collaborators {
            store: store.clone(),
            fs: fs.clone(),
            backend: backend.clone(),
            metadata_reader: reader.clone(),
            html_validator: Arc::new(AllowListValidator::default()),
        };
        Self {
            tmp: TempDir::new().unwrap(),
            store,
            fs,
            reader,
            backend,
            gallery: Gallery::new(config, collaborators),
        }
    }

    pub fn gallery_dir(&self) -> PathBuf {
        self.tmp.path().join("gallery")
    }

    /// A real file outside the gallery, ready to be added. Contents differ
    /// per name.
    pub fn media_path(&self, name: &str) -> PathBuf {
        let dir = self.tmp.path().join("incoming");
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join(name);
        std::fs::write(&path, format!("bytes of {name}")).unwrap();
        path
    }

    /// Saved top-level album; returns its id.
    pub fn saved_album(&self, title: &str) -> i64 {
        let dir = self.gallery_dir().join(directory_name(title));
        let mut album = self.gallery.create_root_album(&dir, title, "ana").unwrap();
        album.save(&self.gallery).unwrap()
    }

    /// Saved album inside `parent`; returns its id.
    pub fn saved_child_album(&self, parent: i64, title: &str) -> i64 {
        let parent = self.gallery.get(parent);
        let mut album = self.gallery.create_album(&parent, title, "ana").unwrap();
        album.save(&self.gallery).unwrap()
    }

    /// Saved media item for a fresh file named `file_name`; returns its id.
    pub fn saved_media_item(&self, album: i64, file_name: &str) -> i64 {
        let parent = self.gallery.get(album);
        let source = self.media_path(file_name);
        let mut item = self.gallery.create_media_item(&parent, &source, "ana").unwrap();
        item.save(&self.gallery).unwrap()
    }
}
