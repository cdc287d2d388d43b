//! Image processing — pure Rust.
//!
//! | Operation | Crate / function |
//! |---|---|
//! | **Identify** | `image::image_dimensions` |
//! | **IPTC / EXIF** | in-crate parsers (JPEG APP1/APP13, TIFF IFDs) |
//! | **Resize** | Lanczos3, fit inside the rendition bound |
//! | **Thumbnail** | `resize_to_fill` + `unsharpen` |
//!
//! - **Calculations**: pure dimension math
//! - **Parameters**: what an operation should produce
//! - **Backend**: [`ImageBackend`] trait + [`RustBackend`]
//! - **Operations**: rendition planning and execution

pub mod backend;
mod calculations;
mod exif_parser;
pub(crate) mod iptc_parser;
mod jpeg;
pub mod operations;
mod params;
pub mod rust_backend;
mod tiff;

pub(crate) use jpeg::jpeg_segments;

pub use backend::{BackendError, Dimensions, ImageBackend, ImageMetadata};
pub use calculations::{calculate_fit_dimensions, rendition_redundant};
pub use operations::{RenditionPlan, RenditionSpec, execute_plan, get_dimensions, plan_rendition};
pub use params::{Quality, ResizeParams, Sharpening, ThumbnailParams};
pub use rust_backend::RustBackend;
