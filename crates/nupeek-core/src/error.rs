//! Error types for package inspection operations.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias using `PackageError`.
pub type Result<T> = std::result::Result<T, PackageError>;

/// Errors that can occur while inspecting a package.
#[derive(Error, Debug)]
pub enum PackageError {
    /// I/O operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The package path is empty or does not reference a readable file.
    #[error("invalid package path '{}': {reason}", path.display())]
    InvalidInput {
        /// The offending path.
        path: PathBuf,
        /// Why the path was rejected.
        reason: String,
    },

    /// The manifest is missing, duplicated, or cannot be parsed.
    #[error("malformed package: {0}")]
    MalformedPackage(String),

    /// A version string is not a valid package version.
    #[error("invalid version '{version}': {reason}")]
    InvalidVersion {
        /// The rejected version string.
        version: String,
        /// Why parsing failed.
        reason: String,
    },

    /// Signature bytes could not be decoded into a publisher certificate.
    #[error("signature decode error: {0}")]
    SignatureDecode(String),

    /// The zip container could not be read.
    #[error("invalid archive: {0}")]
    InvalidArchive(String),

    /// An entry path is not present in the archive.
    #[error("file not found in package: {0}")]
    FileNotFound(String),

    /// The package has been closed and its readers released.
    #[error("package has been closed")]
    Closed,
}

impl PackageError {
    /// Returns `true` if this error can only be raised while opening a
    /// package.
    ///
    /// # Examples
    ///
    /// ```
    /// use nupeek_core::PackageError;
    ///
    /// let err = PackageError::MalformedPackage("no nuspec".to_string());
    /// assert!(err.is_construction_error());
    ///
    /// let err = PackageError::Closed;
    /// assert!(!err.is_construction_error());
    /// ```
    #[must_use]
    pub const fn is_construction_error(&self) -> bool {
        matches!(
            self,
            Self::InvalidInput { .. } | Self::MalformedPackage(_)
        )
    }

    /// Returns a context string for this error, if available.
    ///
    /// # Examples
    ///
    /// ```
    /// use nupeek_core::PackageError;
    ///
    /// let err = PackageError::InvalidArchive("bad header".to_string());
    /// assert_eq!(err.context(), Some("bad header"));
    ///
    /// let err = PackageError::Closed;
    /// assert_eq!(err.context(), None);
    /// ```
    #[must_use]
    pub fn context(&self) -> Option<&str> {
        match self {
            Self::MalformedPackage(msg)
            | Self::SignatureDecode(msg)
            | Self::InvalidArchive(msg)
            | Self::FileNotFound(msg) => Some(msg),
            Self::InvalidInput { reason, .. } | Self::InvalidVersion { reason, .. } => Some(reason),
            Self::Io(_) | Self::Closed => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = PackageError::Closed;
        assert_eq!(err.to_string(), "package has been closed");
    }

    #[test]
    fn test_invalid_input_carries_path() {
        let err = PackageError::InvalidInput {
            path: PathBuf::from("/tmp/missing.nupkg"),
            reason: "file does not exist".into(),
        };
        let display = err.to_string();
        assert!(display.contains("/tmp/missing.nupkg"));
        assert!(display.contains("file does not exist"));
        assert!(err.is_construction_error());
    }

    #[test]
    fn test_malformed_package_error() {
        let err = PackageError::MalformedPackage("multiple nuspec files".into());
        assert!(err.to_string().contains("malformed package"));
        assert!(err.is_construction_error());
        assert_eq!(err.context(), Some("multiple nuspec files"));
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: PackageError = io_err.into();
        assert!(matches!(err, PackageError::Io(_)));
        assert!(!err.is_construction_error());
        assert_eq!(err.context(), None);
    }

    #[test]
    fn test_runtime_errors_are_not_construction_errors() {
        assert!(!PackageError::SignatureDecode("x".into()).is_construction_error());
        assert!(!PackageError::InvalidArchive("x".into()).is_construction_error());
        assert!(!PackageError::FileNotFound("x".into()).is_construction_error());
        assert!(!PackageError::Closed.is_construction_error());
    }

    #[test]
    fn test_invalid_version_error() {
        let err = PackageError::InvalidVersion {
            version: "one.two".into(),
            reason: "non-numeric component".into(),
        };
        assert!(err.to_string().contains("one.two"));
        assert_eq!(err.context(), Some("non-numeric component"));
    }
}
