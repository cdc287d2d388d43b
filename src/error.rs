//! Errors raised by gallery object operations.
//!
//! Missing entities are not errors: lookups substitute a null sentinel.
//! What remains are programming errors (writing through a read-only
//! instance, cycles) and collaborator failures, which are propagated.

use crate::fs::FsError;
use crate::imaging::BackendError;
use crate::metadata::MetadataError;
use crate::store::StoreError;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum GalleryError {
    #[error("gallery object {id} is read-only; load a writable instance to modify it")]
    WritePermission { id: i64 },
    #[error("writability of gallery object {id} was already set")]
    WritabilityAlreadySet { id: i64 },
    #[error("moving {child} under {target} would make it its own ancestor")]
    CycleDetected { child: i64, target: i64 },
    #[error("album {id} is not empty")]
    AlbumNotEmpty { id: i64 },
    #[error("gallery object {id} is not an album")]
    NotAnAlbum { id: i64 },
    #[error("gallery object {id} no longer exists in the store")]
    ObjectMissing { id: i64 },
    #[error("files of this type cannot be added to the gallery: {}", .path.display())]
    FileTypeNotAllowed { path: PathBuf },
    #[error("Store error: {0}")]
    Store(#[from] StoreError),
    #[error("File system error: {0}")]
    Fs(#[from] FsError),
    #[error("Image processing error: {0}")]
    Imaging(#[from] BackendError),
    #[error("Metadata error: {0}")]
    Metadata(#[from] MetadataError),
}
