//! Display objects: one rendition of a media item.
//!
//! Every gallery object owns three display objects (thumbnail, optimized,
//! original). Thumbnail and optimized renditions are derived from the
//! original by [`DisplayObject::generate_and_save_file`]; originals and
//! external (embedded HTML) content are never regenerated.
//!
//! ## Generation
//!
//! ```text
//! original (w×h, RotateFlip)
//!   └─ plan_rendition ──► backend writes <dir>/.tmp_<file_name>
//!                          └─ rename over <dir>/<file_name>
//! ```
//!
//! The temp file is owned by a guard that deletes it on every exit path
//! that does not end in the rename, so a failed encode leaves no debris and
//! an earlier rendition stays in place. Re-running overwrites.

use crate::error::GalleryError;
use crate::fs::FileSystem;
use crate::imaging::{
    ImageBackend, RenditionSpec, execute_plan, get_dimensions, plan_rendition, rendition_redundant,
};
use crate::mime::{MimeType, MimeTypeCategory};
use crate::null;
use crate::object::ID_NOT_SET;
use crate::orientation::RotateFlip;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, warn};

/// Width/height value meaning "not measured".
pub const DIMENSION_NOT_SET: i32 = i32::MIN;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DisplayType {
    Thumbnail,
    Optimized,
    Original,
    External,
    Unknown,
}

/// Width and height of a rendition; [`Size::EMPTY`] when unknown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Size {
    pub width: i32,
    pub height: i32,
}

impl Size {
    pub const EMPTY: Size = Size {
        width: 0,
        height: 0,
    };

    pub fn is_empty(&self) -> bool {
        *self == Self::EMPTY
    }
}

/// Backend and file system used to produce rendition files.
#[derive(Clone, Copy)]
pub struct RenditionTools<'a> {
    pub backend: &'a dyn ImageBackend,
    pub fs: &'a dyn FileSystem,
}

/// Where a rendition's own file lives while it points at the original.
#[derive(Debug, Clone, PartialEq)]
struct RenditionFile {
    path: PathBuf,
    mime_type: Arc<MimeType>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DisplayObject {
    display_type: DisplayType,
    width: i32,
    height: i32,
    file_name: String,
    file_name_physical_path: PathBuf,
    temp_file_path: PathBuf,
    file_size_kb: u64,
    mime_type: Arc<MimeType>,
    media_object_id: i64,
    external_html_source: String,
    external_type: MimeTypeCategory,
    own_file: Option<RenditionFile>,
    sentinel: bool,
}

impl DisplayObject {
    /// The null display object.
    pub fn null() -> Self {
        Self {
            display_type: DisplayType::Unknown,
            width: DIMENSION_NOT_SET,
            height: DIMENSION_NOT_SET,
            file_name: String::new(),
            file_name_physical_path: PathBuf::new(),
            temp_file_path: PathBuf::new(),
            file_size_kb: 0,
            mime_type: null::mime_type(),
            media_object_id: ID_NOT_SET,
            external_html_source: String::new(),
            external_type: MimeTypeCategory::NotSet,
            own_file: None,
            sentinel: true,
        }
    }

    /// A file-backed rendition. Dimensions start unknown.
    pub fn new(display_type: DisplayType, path: &Path, mime_type: Arc<MimeType>) -> Self {
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        Self {
            display_type,
            file_name,
            file_name_physical_path: path.to_path_buf(),
            mime_type,
            sentinel: false,
            ..Self::null()
        }
    }

    /// Embedded content with no backing file, e.g. a video player snippet.
    pub fn external(html: &str, external_type: MimeTypeCategory) -> Self {
        Self {
            display_type: DisplayType::External,
            external_html_source: html.to_string(),
            external_type,
            sentinel: false,
            ..Self::null()
        }
    }

    pub fn is_null(&self) -> bool {
        self.sentinel
    }

    pub fn display_type(&self) -> DisplayType {
        self.display_type
    }

    pub fn width(&self) -> i32 {
        self.width
    }

    pub fn height(&self) -> i32 {
        self.height
    }

    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    pub fn file_name_physical_path(&self) -> &Path {
        &self.file_name_physical_path
    }

    /// Temp path of an in-flight generation; empty otherwise.
    pub fn temp_file_path(&self) -> &Path {
        &self.temp_file_path
    }

    pub fn file_size_kb(&self) -> u64 {
        self.file_size_kb
    }

    pub fn mime_type(&self) -> &Arc<MimeType> {
        &self.mime_type
    }

    pub fn media_object_id(&self) -> i64 {
        self.media_object_id
    }

    pub fn external_html_source(&self) -> &str {
        &self.external_html_source
    }

    pub fn external_type(&self) -> MimeTypeCategory {
        self.external_type
    }

    /// `(width, height)`, or [`Size::EMPTY`] for unmeasured or external
    /// content.
    pub fn size(&self) -> Size {
        if self.display_type == DisplayType::External
            || self.width == DIMENSION_NOT_SET
            || self.height == DIMENSION_NOT_SET
        {
            Size::EMPTY
        } else {
            Size {
                width: self.width,
                height: self.height,
            }
        }
    }

    /// Known dimensions as unsigned values.
    pub fn dimensions(&self) -> Option<(u32, u32)> {
        let size = self.size();
        if size.is_empty() {
            return None;
        }
        Some((
            u32::try_from(size.width).ok()?,
            u32::try_from(size.height).ok()?,
        ))
    }

    pub fn set_dimensions(&mut self, width: u32, height: u32) {
        if self.sentinel {
            return;
        }
        self.width = i32::try_from(width).unwrap_or(i32::MAX);
        self.height = i32::try_from(height).unwrap_or(i32::MAX);
    }

    pub fn set_file_size_kb(&mut self, kb: u64) {
        if !self.sentinel {
            self.file_size_kb = kb;
        }
    }

    /// Point at a new physical path; the file name follows.
    pub fn set_physical_path(&mut self, path: &Path) {
        if self.sentinel {
            return;
        }
        self.file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        self.file_name_physical_path = path.to_path_buf();
    }

    pub fn set_media_object_id(&mut self, id: i64) {
        if !self.sentinel {
            self.media_object_id = id;
        }
    }

    /// True for the renditions that are derived from the original.
    pub fn is_generated(&self) -> bool {
        !self.sentinel && matches!(self.display_type, DisplayType::Thumbnail | DisplayType::Optimized)
    }

    /// True while this rendition points at the original file instead of a
    /// file of its own.
    pub fn uses_original(&self) -> bool {
        self.own_file.is_some()
    }

    /// Path this rendition writes to when generated. Differs from
    /// [`file_name_physical_path`](Self::file_name_physical_path) only while
    /// it [uses the original](Self::uses_original).
    pub fn rendition_path(&self) -> &Path {
        match &self.own_file {
            Some(own) => &own.path,
            None => &self.file_name_physical_path,
        }
    }

    /// Move the rendition's own file location. While the original is used,
    /// the physical path is left alone.
    pub fn set_rendition_path(&mut self, path: &Path) {
        match &mut self.own_file {
            Some(own) => own.path = path.to_path_buf(),
            None => self.set_physical_path(path),
        }
    }

    fn point_at_original(&mut self, original: &DisplayObject, (width, height): (u32, u32)) {
        if self.own_file.is_none() {
            self.own_file = Some(RenditionFile {
                path: self.file_name_physical_path.clone(),
                mime_type: Arc::clone(&self.mime_type),
            });
        }
        self.set_physical_path(original.file_name_physical_path());
        self.mime_type = Arc::clone(original.mime_type());
        self.set_dimensions(width, height);
        self.file_size_kb = original.file_size_kb();
    }

    /// Regenerate this rendition from `original`.
    ///
    /// A no-op for originals, external content, unknown types and the null
    /// sentinel. When an optimized rendition would be no smaller than the
    /// original (and no rotation is needed), it points at the original file
    /// instead of writing a copy. The original is never written to: a later
    /// run that does need a file writes it to the rendition's own path.
    pub fn generate_and_save_file(
        &mut self,
        original: &DisplayObject,
        rotate_flip: RotateFlip,
        spec: &RenditionSpec,
        tools: RenditionTools<'_>,
    ) -> Result<(), GalleryError> {
        if !self.is_generated() {
            return Ok(());
        }

        let source = original.file_name_physical_path();
        let original_dims = match original.dimensions() {
            Some(dims) => dims,
            None => get_dimensions(tools.backend, source)?,
        };

        if self.display_type == DisplayType::Optimized
            && rotate_flip.is_identity()
            && rendition_redundant(original_dims, spec.max_length)
        {
            debug!(
                file = %original.file_name(),
                "optimized rendition not needed, using original"
            );
            self.point_at_original(original, original_dims);
            return Ok(());
        }

        let target = self.rendition_path().to_path_buf();
        if target == source {
            warn!(file = %original.file_name(), "rendition path is the original, not generated");
            return Ok(());
        }
        if let Some(dir) = target.parent() {
            tools.fs.create_dir_all(dir)?;
        }

        let temp = temp_path_for(&target);
        self.temp_file_path = temp.clone();
        let guard = TempFileGuard::new(tools.fs, temp.clone());

        let plan = plan_rendition(source, &temp, original_dims, spec, rotate_flip);
        let result = execute_plan(tools.backend, &plan)
            .map_err(GalleryError::from)
            .and_then(|()| tools.fs.rename(&temp, &target).map_err(GalleryError::from));
        self.temp_file_path = PathBuf::new();
        result?;
        guard.disarm();
        if let Some(own) = self.own_file.take() {
            self.set_physical_path(&own.path);
            self.mime_type = own.mime_type;
        }

        let (width, height) = plan.output_dimensions();
        self.set_dimensions(width, height);
        self.file_size_kb = tools.fs.size_kb(&target)?;
        debug!(
            file = %self.file_name,
            width,
            height,
            kind = ?self.display_type,
            "rendition written"
        );
        Ok(())
    }
}

/// `<dir>/<name>` → `<dir>/.tmp_<name>`; the extension is kept so the
/// backend picks the right encoder.
fn temp_path_for(target: &Path) -> PathBuf {
    let name = target
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    target.with_file_name(format!(".tmp_{name}"))
}

/// Deletes a temp file when dropped unless disarmed.
struct TempFileGuard<'a> {
    fs: &'a dyn FileSystem,
    path: PathBuf,
    armed: bool,
}

impl<'a> TempFileGuard<'a> {
    fn new(fs: &'a dyn FileSystem, path: PathBuf) -> Self {
        Self {
            fs,
            path,
            armed: true,
        }
    }

    fn disarm(mut self) {
        self.armed = false;
    }
}

impl Drop for TempFileGuard<'_> {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        if let Err(e) = self.fs.delete(&self.path) {
            warn!(path = %self.path.display(), error = %e, "could not remove temp file");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::imaging::backend::tests::{MockBackend, RecordedOp};
    use crate::imaging::{Dimensions, Quality, RustBackend};
    use crate::mime::MimeTypeRegistry;
    use crate::test_helpers::MockFileSystem;

    fn spec(max_length: u32) -> RenditionSpec {
        RenditionSpec {
            max_length,
            quality: Quality::new(70),
            sharpening: None,
            crop_aspect: None,
        }
    }

    fn jpeg() -> Arc<MimeType> {
        MimeTypeRegistry::default().lookup_extension("jpg")
    }

    fn original(width: u32, height: u32) -> DisplayObject {
        let mut display = DisplayObject::new(DisplayType::Original, Path::new("/album/a.jpg"), jpeg());
        display.set_dimensions(width, height);
        display.set_file_size_kb(900);
        display
    }

    // =========================================================================
    // Size and sentinel behaviour
    // =========================================================================

    #[test]
    fn unmeasured_size_is_empty() {
        let display = DisplayObject::new(DisplayType::Thumbnail, Path::new("/t.jpg"), jpeg());
        assert!(display.size().is_empty());
        assert_eq!(display.dimensions(), None);
    }

    #[test]
    fn external_size_is_empty() {
        let mut display = DisplayObject::external("<iframe></iframe>", MimeTypeCategory::Video);
        display.set_dimensions(640, 480);
        assert!(display.size().is_empty());
    }

    #[test]
    fn measured_size() {
        assert_eq!(original(800, 600).size(), Size { width: 800, height: 600 });
    }

    #[test]
    fn null_mutators_are_no_ops() {
        let mut display = DisplayObject::null();
        display.set_dimensions(10, 10);
        display.set_file_size_kb(5);
        display.set_physical_path(Path::new("/x.jpg"));
        display.set_media_object_id(3);
        assert_eq!(display, DisplayObject::null());
    }

    #[test]
    fn file_name_follows_path() {
        let mut display = DisplayObject::new(DisplayType::Thumbnail, Path::new("/a/zThumb_x.jpg"), jpeg());
        assert_eq!(display.file_name(), "zThumb_x.jpg");
        display.set_physical_path(Path::new("/b/zThumb_y.jpg"));
        assert_eq!(display.file_name(), "zThumb_y.jpg");
    }

    // =========================================================================
    // Generation with recording collaborators
    // =========================================================================

    #[test]
    fn generate_writes_temp_then_renames() {
        let backend = MockBackend::new();
        let fs = MockFileSystem::new();
        let tools = RenditionTools { backend: &backend, fs: &fs };
        let mut thumb = DisplayObject::new(DisplayType::Thumbnail, Path::new("/album/zThumb_a.jpg"), jpeg());

        thumb
            .generate_and_save_file(&original(2000, 1200), RotateFlip::NotSpecified, &spec(115), tools)
            .unwrap();

        let ops = backend.get_operations();
        assert!(matches!(
            &ops[0],
            RecordedOp::Resize { output, width: 115, height: 69, .. } if output == "/album/.tmp_zThumb_a.jpg"
        ));
        assert!(fs.renamed().contains(&(
            PathBuf::from("/album/.tmp_zThumb_a.jpg"),
            PathBuf::from("/album/zThumb_a.jpg")
        )));
        assert_eq!(thumb.size(), Size { width: 115, height: 69 });
        assert!(thumb.temp_file_path().as_os_str().is_empty());
    }

    #[test]
    fn generate_failure_removes_temp_file() {
        let backend = MockBackend::failing("encoder exploded");
        let fs = MockFileSystem::new();
        let tools = RenditionTools { backend: &backend, fs: &fs };
        let mut thumb = DisplayObject::new(DisplayType::Thumbnail, Path::new("/album/zThumb_a.jpg"), jpeg());

        let result =
            thumb.generate_and_save_file(&original(2000, 1200), RotateFlip::NotSpecified, &spec(115), tools);

        assert!(matches!(result, Err(GalleryError::Imaging(_))));
        assert!(fs.deleted().contains(&PathBuf::from("/album/.tmp_zThumb_a.jpg")));
        assert!(fs.renamed().is_empty());
        assert!(thumb.size().is_empty());
    }

    #[test]
    fn generate_identifies_unmeasured_original() {
        let backend = MockBackend::with_dimensions(vec![Dimensions { width: 1000, height: 500 }]);
        let fs = MockFileSystem::new();
        let tools = RenditionTools { backend: &backend, fs: &fs };
        let source = DisplayObject::new(DisplayType::Original, Path::new("/album/a.jpg"), jpeg());
        let mut thumb = DisplayObject::new(DisplayType::Thumbnail, Path::new("/album/zThumb_a.jpg"), jpeg());

        thumb
            .generate_and_save_file(&source, RotateFlip::NotSpecified, &spec(100), tools)
            .unwrap();

        assert!(matches!(&backend.get_operations()[0], RecordedOp::Identify(_)));
        assert_eq!(thumb.size(), Size { width: 100, height: 50 });
    }

    #[test]
    fn generate_applies_rotation() {
        let backend = MockBackend::new();
        let fs = MockFileSystem::new();
        let tools = RenditionTools { backend: &backend, fs: &fs };
        let mut optimized = DisplayObject::new(DisplayType::Optimized, Path::new("/album/zOpt_a.jpg"), jpeg());

        optimized
            .generate_and_save_file(&original(2000, 1000), RotateFlip::Rotate90, &spec(640), tools)
            .unwrap();

        assert_eq!(optimized.size(), Size { width: 320, height: 640 });
        assert!(matches!(
            &backend.get_operations()[0],
            RecordedOp::Resize { rotate_flip: RotateFlip::Rotate90, .. }
        ));
    }

    #[test]
    fn small_original_is_its_own_optimized_rendition() {
        let backend = MockBackend::new();
        let fs = MockFileSystem::new();
        let tools = RenditionTools { backend: &backend, fs: &fs };
        let mut optimized = DisplayObject::new(DisplayType::Optimized, Path::new("/album/zOpt_a.jpg"), jpeg());

        optimized
            .generate_and_save_file(&original(400, 300), RotateFlip::NotSpecified, &spec(640), tools)
            .unwrap();

        assert!(backend.get_operations().is_empty());
        assert_eq!(optimized.file_name_physical_path(), Path::new("/album/a.jpg"));
        assert_eq!(optimized.file_size_kb(), 900);
        assert!(optimized.uses_original());
        assert_eq!(optimized.rendition_path(), Path::new("/album/zOpt_a.jpg"));
    }

    #[test]
    fn rerun_after_using_original_writes_own_file() {
        let backend = MockBackend::new();
        let fs = MockFileSystem::new();
        let tools = RenditionTools { backend: &backend, fs: &fs };
        let source = original(400, 300);
        let mut optimized = DisplayObject::new(DisplayType::Optimized, Path::new("/album/zOpt_a.jpg"), jpeg());

        optimized
            .generate_and_save_file(&source, RotateFlip::NotSpecified, &spec(640), tools)
            .unwrap();
        optimized
            .generate_and_save_file(&source, RotateFlip::Rotate90, &spec(640), tools)
            .unwrap();

        let renamed = fs.renamed();
        assert_eq!(
            renamed,
            vec![(PathBuf::from("/album/.tmp_zOpt_a.jpg"), PathBuf::from("/album/zOpt_a.jpg"))]
        );
        assert!(renamed.iter().all(|(_, to)| to != Path::new("/album/a.jpg")));
        assert!(!optimized.uses_original());
        assert_eq!(optimized.file_name_physical_path(), Path::new("/album/zOpt_a.jpg"));
        assert_eq!(optimized.size(), Size { width: 300, height: 400 });
    }

    #[test]
    fn shrinking_max_length_after_using_original_keeps_original() {
        let backend = MockBackend::new();
        let fs = MockFileSystem::new();
        let tools = RenditionTools { backend: &backend, fs: &fs };
        let source = original(400, 300);
        let mut optimized = DisplayObject::new(DisplayType::Optimized, Path::new("/album/zOpt_a.jpg"), jpeg());

        optimized
            .generate_and_save_file(&source, RotateFlip::NotSpecified, &spec(640), tools)
            .unwrap();
        optimized
            .generate_and_save_file(&source, RotateFlip::NotSpecified, &spec(200), tools)
            .unwrap();

        assert!(matches!(
            &backend.get_operations()[0],
            RecordedOp::Resize { output, .. } if output == "/album/.tmp_zOpt_a.jpg"
        ));
        assert_eq!(fs.renamed()[0].1, PathBuf::from("/album/zOpt_a.jpg"));
        assert_eq!(optimized.size(), Size { width: 200, height: 150 });
    }

    #[test]
    fn rendition_path_moves_while_using_original() {
        let mut optimized = DisplayObject::new(DisplayType::Optimized, Path::new("/album/zOpt_a.jpg"), jpeg());
        optimized.point_at_original(&original(400, 300), (400, 300));

        optimized.set_rendition_path(Path::new("/other/zOpt_a.jpg"));

        assert_eq!(optimized.file_name_physical_path(), Path::new("/album/a.jpg"));
        assert_eq!(optimized.rendition_path(), Path::new("/other/zOpt_a.jpg"));
    }

    #[test]
    fn original_and_external_are_not_generated() {
        let backend = MockBackend::new();
        let fs = MockFileSystem::new();
        let tools = RenditionTools { backend: &backend, fs: &fs };
        let source = original(2000, 1000);

        let mut same = source.clone();
        same.generate_and_save_file(&source, RotateFlip::NotSpecified, &spec(100), tools)
            .unwrap();
        let mut external = DisplayObject::external("<video></video>", MimeTypeCategory::Video);
        external
            .generate_and_save_file(&source, RotateFlip::NotSpecified, &spec(100), tools)
            .unwrap();
        let mut null = DisplayObject::null();
        null.generate_and_save_file(&source, RotateFlip::NotSpecified, &spec(100), tools)
            .unwrap();

        assert!(backend.get_operations().is_empty());
        assert_eq!(same, source);
    }

    // =========================================================================
    // Real backend, real disk
    // =========================================================================

    #[test]
    fn generate_on_disk_is_rerunnable() {
        use crate::fs::LocalFileSystem;
        use crate::imaging::rust_backend::tests::create_test_jpeg;

        let tmp = tempfile::TempDir::new().unwrap();
        let source_path = tmp.path().join("a.jpg");
        create_test_jpeg(&source_path, 400, 200);
        let source = DisplayObject::new(DisplayType::Original, &source_path, jpeg());
        let mut thumb = DisplayObject::new(DisplayType::Thumbnail, &tmp.path().join("zThumb_a.jpg"), jpeg());
        let tools = RenditionTools { backend: &RustBackend::new(), fs: &LocalFileSystem };

        thumb
            .generate_and_save_file(&source, RotateFlip::NotSpecified, &spec(100), tools)
            .unwrap();
        thumb
            .generate_and_save_file(&source, RotateFlip::NotSpecified, &spec(100), tools)
            .unwrap();

        assert_eq!(image::image_dimensions(thumb.file_name_physical_path()).unwrap(), (100, 50));
        assert!(!tmp.path().join(".tmp_zThumb_a.jpg").exists());
        let entries = std::fs::read_dir(tmp.path()).unwrap().count();
        assert_eq!(entries, 2);
    }
}
