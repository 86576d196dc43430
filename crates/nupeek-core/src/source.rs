//! On-demand access to the backing package file.

use std::fs::File;
use std::fs::OpenOptions;
use std::io;
use std::path::Path;
use std::path::PathBuf;

use tracing::debug;

use crate::PackageConfig;
use crate::PackageError;
use crate::Result;

/// Factory for fresh handles over a package file.
///
/// A `PackageSource` never keeps the file open itself. Each call to
/// [`open`](Self::open) returns an independent handle owned by the caller,
/// so the package file is not locked between operations.
#[derive(Debug, Clone)]
pub struct PackageSource {
    path: PathBuf,
    prefer_writable: bool,
}

impl PackageSource {
    /// Creates a source after checking that `path` names an existing file.
    ///
    /// # Errors
    ///
    /// Returns [`PackageError::InvalidInput`] if the path is empty or does
    /// not reference a regular file.
    pub fn new<P: AsRef<Path>>(path: P, config: &PackageConfig) -> Result<Self> {
        let path = path.as_ref();

        if path.as_os_str().is_empty() {
            return Err(PackageError::InvalidInput {
                path: path.to_path_buf(),
                reason: "path is empty".to_string(),
            });
        }

        if !path.is_file() {
            return Err(PackageError::InvalidInput {
                path: path.to_path_buf(),
                reason: "file does not exist".to_string(),
            });
        }

        Ok(Self {
            path: path.to_path_buf(),
            prefer_writable: config.prefer_writable,
        })
    }

    /// Returns the path of the backing file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Opens a new handle over the package file.
    ///
    /// Read+write access is attempted first when configured; a
    /// `PermissionDenied` failure is retried once read-only. Any other error
    /// is returned unchanged.
    pub fn open(&self) -> io::Result<File> {
        if !self.prefer_writable {
            return File::open(&self.path);
        }

        match OpenOptions::new().read(true).write(true).open(&self.path) {
            Ok(file) => Ok(file),
            Err(e) if e.kind() == io::ErrorKind::PermissionDenied => {
                debug!(path = %self.path.display(), "write access denied, opening read-only");
                File::open(&self.path)
            }
            Err(e) => Err(e),
        }
    }
}
