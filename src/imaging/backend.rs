//! Image processing backend trait and shared types.
//!
//! [`ImageBackend`] is the seam between rendition planning and pixel work:
//! identify, read embedded metadata, resize, thumbnail. The production
//! implementation is [`RustBackend`](super::rust_backend::RustBackend).

use super::params::{ResizeParams, ThumbnailParams};
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BackendError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Processing failed: {0}")]
    ProcessingFailed(String),
    #[error("Unsupported output format: {0}")]
    UnsupportedFormat(String),
}

/// Result of an identify operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Dimensions {
    pub width: u32,
    pub height: u32,
}

/// Embedded metadata read from IPTC and EXIF.
///
/// Values are raw text; formatting for display happens in
/// [`metadata`](crate::metadata).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImageMetadata {
    pub title: Option<String>,
    pub description: Option<String>,
    pub author: Option<String>,
    pub copyright: Option<String>,
    pub keywords: Vec<String>,
    pub camera_make: Option<String>,
    pub camera_model: Option<String>,
    pub date_taken: Option<String>,
    pub exposure_time: Option<String>,
    pub f_number: Option<String>,
    pub iso: Option<u32>,
    pub focal_length: Option<String>,
    pub orientation: Option<u16>,
}

/// Operations every image backend provides.
pub trait ImageBackend: Send + Sync {
    /// Get image dimensions.
    fn identify(&self, path: &Path) -> Result<Dimensions, BackendError>;

    /// Read embedded IPTC/EXIF metadata.
    fn read_metadata(&self, path: &Path) -> Result<ImageMetadata, BackendError>;

    /// Fit-inside resize.
    fn resize(&self, params: &ResizeParams) -> Result<(), BackendError>;

    /// Fill-resize then center crop.
    fn thumbnail(&self, params: &ThumbnailParams) -> Result<(), BackendError>;
}

#[cfg(test)]
pub mod tests {
    use super::*;
    use crate::orientation::RotateFlip;
    use std::sync::Mutex;

    /// Backend that records operations without decoding anything.
    #[derive(Default)]
    pub struct MockBackend {
        pub identify_results: Mutex<Vec<Dimensions>>,
        pub metadata_results: Mutex<Vec<ImageMetadata>>,
        pub operations: Mutex<Vec<RecordedOp>>,
        /// When set, resize/thumbnail fail with this message.
        pub fail_with: Option<String>,
    }

    #[derive(Debug, Clone, PartialEq)]
    pub enum RecordedOp {
        Identify(String),
        ReadMetadata(String),
        Resize {
            source: String,
            output: String,
            width: u32,
            height: u32,
            quality: u32,
            rotate_flip: RotateFlip,
        },
        Thumbnail {
            source: String,
            output: String,
            crop_width: u32,
            crop_height: u32,
            quality: u32,
            rotate_flip: RotateFlip,
        },
    }

    impl MockBackend {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn with_dimensions(dims: Vec<Dimensions>) -> Self {
            Self {
                identify_results: Mutex::new(dims),
                ..Self::default()
            }
        }

        pub fn with_metadata(dims: Vec<Dimensions>, metadata: Vec<ImageMetadata>) -> Self {
            Self {
                identify_results: Mutex::new(dims),
                metadata_results: Mutex::new(metadata),
                ..Self::default()
            }
        }

        pub fn failing(message: &str) -> Self {
            Self {
                fail_with: Some(message.to_string()),
                ..Self::default()
            }
        }

        pub fn get_operations(&self) -> Vec<RecordedOp> {
            self.operations.lock().unwrap().clone()
        }

        fn check_failure(&self) -> Result<(), BackendError> {
            match &self.fail_with {
                Some(message) => Err(BackendError::ProcessingFailed(message.clone())),
                None => Ok(()),
            }
        }
    }

    impl ImageBackend for MockBackend {
        fn identify(&self, path: &Path) -> Result<Dimensions, BackendError> {
            self.operations
                .lock()
                .unwrap()
                .push(RecordedOp::Identify(path.to_string_lossy().to_string()));

            self.identify_results
                .lock()
                .unwrap()
                .pop()
                .ok_or_else(|| BackendError::ProcessingFailed("No mock dimensions".to_string()))
        }

        fn read_metadata(&self, path: &Path) -> Result<ImageMetadata, BackendError> {
            self.operations
                .lock()
                .unwrap()
                .push(RecordedOp::ReadMetadata(path.to_string_lossy().to_string()));

            Ok(self
                .metadata_results
                .lock()
                .unwrap()
                .pop()
                .unwrap_or_default())
        }

        fn resize(&self, params: &ResizeParams) -> Result<(), BackendError> {
            self.operations.lock().unwrap().push(RecordedOp::Resize {
                source: params.source.to_string_lossy().to_string(),
                output: params.output.to_string_lossy().to_string(),
                width: params.width,
                height: params.height,
                quality: params.quality.value(),
                rotate_flip: params.rotate_flip,
            });
            self.check_failure()
        }

        fn thumbnail(&self, params: &ThumbnailParams) -> Result<(), BackendError> {
            self.operations.lock().unwrap().push(RecordedOp::Thumbnail {
                source: params.source.to_string_lossy().to_string(),
                output: params.output.to_string_lossy().to_string(),
                crop_width: params.crop_width,
                crop_height: params.crop_height,
                quality: params.quality.value(),
                rotate_flip: params.rotate_flip,
            });
            self.check_failure()
        }
    }

    #[test]
    fn mock_records_identify() {
        let backend = MockBackend::with_dimensions(vec![Dimensions {
            width: 800,
            height: 600,
        }]);

        let result = backend.identify(Path::new("/test/image.jpg")).unwrap();
        assert_eq!(result.width, 800);
        assert_eq!(result.height, 600);

        let ops = backend.get_operations();
        assert_eq!(ops.len(), 1);
        assert!(matches!(&ops[0], RecordedOp::Identify(p) if p == "/test/image.jpg"));
    }

    #[test]
    fn failing_mock_still_records() {
        let backend = MockBackend::failing("disk full");
        let result = backend.resize(&ResizeParams {
            source: "/a.jpg".into(),
            output: "/b.jpg".into(),
            width: 10,
            height: 10,
            quality: crate::imaging::Quality::default(),
            rotate_flip: RotateFlip::NotSpecified,
            sharpening: None,
        });
        assert!(matches!(result, Err(BackendError::ProcessingFailed(m)) if m == "disk full"));
        assert_eq!(backend.get_operations().len(), 1);
    }
}
