//! High-level rendition operations.
//!
//! Planning is pure ([`plan_rendition`]); execution hands the plan to a
//! backend ([`execute_plan`]). Display objects use both to regenerate their
//! files.

use super::backend::{BackendError, ImageBackend};
use super::calculations::{calculate_fit_dimensions, calculate_thumbnail_dimensions};
use super::params::{Quality, ResizeParams, Sharpening, ThumbnailParams};
use crate::orientation::RotateFlip;
use std::path::Path;

/// Result type for image operations.
pub type Result<T> = std::result::Result<T, BackendError>;

/// Get image dimensions using the backend.
pub fn get_dimensions(backend: &dyn ImageBackend, path: &Path) -> Result<(u32, u32)> {
    let dims = backend.identify(path)?;
    Ok((dims.width, dims.height))
}

/// How one rendition kind is produced.
#[derive(Debug, Clone, PartialEq)]
pub struct RenditionSpec {
    /// Bound on the longer edge (or the short edge of a crop box).
    pub max_length: u32,
    pub quality: Quality,
    pub sharpening: Option<Sharpening>,
    /// Crop to this aspect ratio instead of fitting.
    pub crop_aspect: Option<(u32, u32)>,
}

/// A planned backend call plus the dimensions it will produce.
#[derive(Debug, Clone, PartialEq)]
pub enum RenditionPlan {
    Resize(ResizeParams),
    Thumbnail(ThumbnailParams),
}

impl RenditionPlan {
    /// Width and height of the file the plan writes.
    pub fn output_dimensions(&self) -> (u32, u32) {
        match self {
            Self::Resize(p) => (p.width, p.height),
            Self::Thumbnail(p) => (p.crop_width, p.crop_height),
        }
    }
}

/// Plan a rendition of `source` (whose stored dimensions are `original`).
///
/// The rotation is folded in before sizing, so a portrait photo stored
/// sideways gets portrait rendition dimensions.
pub fn plan_rendition(
    source: &Path,
    output: &Path,
    original: (u32, u32),
    spec: &RenditionSpec,
    rotate_flip: RotateFlip,
) -> RenditionPlan {
    match spec.crop_aspect {
        Some(aspect) => {
            let (crop_width, crop_height) = calculate_thumbnail_dimensions(aspect, spec.max_length);
            RenditionPlan::Thumbnail(ThumbnailParams {
                source: source.to_path_buf(),
                output: output.to_path_buf(),
                crop_width,
                crop_height,
                quality: spec.quality,
                rotate_flip,
                sharpening: spec.sharpening,
            })
        }
        None => {
            let upright = rotate_flip.apply_to_dimensions(original);
            let (width, height) = calculate_fit_dimensions(upright, spec.max_length);
            RenditionPlan::Resize(ResizeParams {
                source: source.to_path_buf(),
                output: output.to_path_buf(),
                width,
                height,
                quality: spec.quality,
                rotate_flip,
                sharpening: spec.sharpening,
            })
        }
    }
}

/// Run a plan on the backend.
pub fn execute_plan(backend: &dyn ImageBackend, plan: &RenditionPlan) -> Result<()> {
    match plan {
        RenditionPlan::Resize(params) => backend.resize(params),
        RenditionPlan::Thumbnail(params) => backend.thumbnail(params),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::imaging::Dimensions;
    use crate::imaging::backend::tests::{MockBackend, RecordedOp};

    fn fit_spec(max_length: u32) -> RenditionSpec {
        RenditionSpec {
            max_length,
            quality: Quality::new(70),
            sharpening: None,
            crop_aspect: None,
        }
    }

    #[test]
    fn get_dimensions_calls_backend() {
        let backend = MockBackend::with_dimensions(vec![Dimensions {
            width: 1920,
            height: 1080,
        }]);

        let dims = get_dimensions(&backend, Path::new("/test.jpg")).unwrap();
        assert_eq!(dims, (1920, 1080));
    }

    #[test]
    fn plan_fit_scales_longer_edge() {
        let plan = plan_rendition(
            Path::new("/a.jpg"),
            Path::new("/zThumb_a.jpg"),
            (2000, 1200),
            &fit_spec(115),
            RotateFlip::NotSpecified,
        );
        assert_eq!(plan.output_dimensions(), (115, 69));
        assert!(matches!(plan, RenditionPlan::Resize(_)));
    }

    #[test]
    fn plan_fit_accounts_for_rotation() {
        let plan = plan_rendition(
            Path::new("/a.jpg"),
            Path::new("/zOpt_a.jpg"),
            (2000, 1000),
            &fit_spec(640),
            RotateFlip::Rotate270,
        );
        assert_eq!(plan.output_dimensions(), (320, 640));
    }

    #[test]
    fn plan_crop_uses_aspect_box() {
        let spec = RenditionSpec {
            crop_aspect: Some((4, 5)),
            ..fit_spec(115)
        };
        let plan = plan_rendition(
            Path::new("/a.jpg"),
            Path::new("/t.jpg"),
            (3000, 2000),
            &spec,
            RotateFlip::NotSpecified,
        );
        assert_eq!(plan.output_dimensions(), (115, 144));
        assert!(matches!(plan, RenditionPlan::Thumbnail(_)));
    }

    #[test]
    fn execute_dispatches_to_backend() {
        let backend = MockBackend::new();
        let plan = plan_rendition(
            Path::new("/a.jpg"),
            Path::new("/t.jpg"),
            (400, 300),
            &fit_spec(100),
            RotateFlip::Rotate180,
        );
        execute_plan(&backend, &plan).unwrap();

        let ops = backend.get_operations();
        assert!(matches!(
            &ops[0],
            RecordedOp::Resize {
                width: 100,
                height: 75,
                rotate_flip: RotateFlip::Rotate180,
                ..
            }
        ));
    }
}
