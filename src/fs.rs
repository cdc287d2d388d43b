//! File system collaborator.
//!
//! Rendition generation, copy, move and delete touch disk only through
//! [`FileSystem`], so tests can observe and fail those calls. Writes that the
//! OS refuses for lack of permission surface as
//! [`FsError::CannotWriteToDirectory`], naming the directory; everything else
//! is [`FsError::Io`].

use sha2::{Digest, Sha256};
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum FsError {
    #[error("cannot write to directory {}: {source}", .directory.display())]
    CannotWriteToDirectory {
        directory: PathBuf,
        source: io::Error,
    },
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

pub trait FileSystem: Send + Sync {
    fn exists(&self, path: &Path) -> bool;

    /// Copy `from` to `to`, overwriting `to`.
    fn copy(&self, from: &Path, to: &Path) -> Result<(), FsError>;

    /// Rename `from` to `to`, overwriting `to`.
    fn rename(&self, from: &Path, to: &Path) -> Result<(), FsError>;

    /// Delete a file. A file that is already gone is not an error.
    fn delete(&self, path: &Path) -> Result<(), FsError>;

    /// Delete a directory and everything below it. Missing is not an error.
    fn delete_dir_all(&self, path: &Path) -> Result<(), FsError>;

    fn create_dir_all(&self, path: &Path) -> Result<(), FsError>;

    /// File size in kilobytes, rounded up.
    fn size_kb(&self, path: &Path) -> Result<u64, FsError>;

    /// SHA-256 of the file contents as lowercase hex.
    fn hash(&self, path: &Path) -> Result<String, FsError>;
}

/// The real disk.
#[derive(Debug, Default, Clone, Copy)]
pub struct LocalFileSystem;

impl LocalFileSystem {
    pub fn new() -> Self {
        Self
    }
}

/// Map permission failures on a write to the target's directory.
fn write_error(target: &Path, err: io::Error) -> FsError {
    if err.kind() == io::ErrorKind::PermissionDenied {
        let directory = target
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| target.to_path_buf());
        FsError::CannotWriteToDirectory {
            directory,
            source: err,
        }
    } else {
        FsError::Io(err)
    }
}

fn ignore_not_found(result: io::Result<()>) -> io::Result<()> {
    match result {
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
        other => other,
    }
}

impl FileSystem for LocalFileSystem {
    fn exists(&self, path: &Path) -> bool {
        path.exists()
    }

    fn copy(&self, from: &Path, to: &Path) -> Result<(), FsError> {
        std::fs::copy(from, to).map_err(|e| write_error(to, e))?;
        Ok(())
    }

    fn rename(&self, from: &Path, to: &Path) -> Result<(), FsError> {
        std::fs::rename(from, to).map_err(|e| write_error(to, e))
    }

    fn delete(&self, path: &Path) -> Result<(), FsError> {
        ignore_not_found(std::fs::remove_file(path)).map_err(|e| write_error(path, e))
    }

    fn delete_dir_all(&self, path: &Path) -> Result<(), FsError> {
        ignore_not_found(std::fs::remove_dir_all(path)).map_err(|e| write_error(path, e))
    }

    fn create_dir_all(&self, path: &Path) -> Result<(), FsError> {
        std::fs::create_dir_all(path).map_err(|e| write_error(path, e))
    }

    fn size_kb(&self, path: &Path) -> Result<u64, FsError> {
        let bytes = std::fs::metadata(path)?.len();
        Ok(bytes.div_ceil(1024))
    }

    fn hash(&self, path: &Path) -> Result<String, FsError> {
        let bytes = std::fs::read(path)?;
        Ok(format!("{:x}", Sha256::digest(&bytes)))
    }
}
