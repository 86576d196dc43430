//! Handles to content files inside a package.

use std::io;
use std::io::Write;
use std::sync::Arc;

use crate::PackageError;
use crate::Result;
use crate::resources::TrackedArchive;

/// Top-level folders whose second path segment is a target framework.
const FRAMEWORK_FOLDERS: &[&str] = &["lib", "ref", "content", "build", "buildTransitive", "tools"];

/// A content file inside a package.
///
/// The file shares the archive reader that listed it. The reader is owned by
/// the package's resource tracker, so reads fail with
/// [`PackageError::Closed`] once the package has been closed.
#[derive(Debug, Clone)]
pub struct PackageFile {
    path: String,
    index: usize,
    size: u64,
    archive: Arc<TrackedArchive>,
}

impl PackageFile {
    pub(crate) fn new(path: String, index: usize, size: u64, archive: Arc<TrackedArchive>) -> Self {
        Self {
            path,
            index,
            size,
            archive,
        }
    }

    /// Returns the entry path inside the archive, e.g. `lib/net8.0/Demo.dll`.
    #[must_use]
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Returns the last path segment.
    #[must_use]
    pub fn name(&self) -> &str {
        self.path.rsplit('/').next().unwrap_or(&self.path)
    }

    /// Returns the uncompressed size in bytes.
    #[must_use]
    pub fn size(&self) -> u64 {
        self.size
    }

    /// Returns the target framework folder the file sits in, if any.
    ///
    /// Recognizes `lib/<tfm>/...`, `ref/<tfm>/...`, `content/<tfm>/...`,
    /// `build/<tfm>/...`, `buildTransitive/<tfm>/...`, `tools/<tfm>/...` and
    /// `contentFiles/<lang>/<tfm>/...`.
    #[must_use]
    pub fn target_framework(&self) -> Option<&str> {
        let mut segments = self.path.split('/');
        let folder = segments.next()?;

        let candidate = if folder.eq_ignore_ascii_case("contentFiles") {
            segments.nth(1)?
        } else if FRAMEWORK_FOLDERS
            .iter()
            .any(|f| f.eq_ignore_ascii_case(folder))
        {
            segments.next()?
        } else {
            return None;
        };

        // The framework segment must be a folder, not the file itself.
        segments.next()?;
        Some(candidate).filter(|c| !c.is_empty())
    }

    /// Returns `true` while the underlying archive reader is open.
    #[must_use]
    pub fn is_available(&self) -> bool {
        self.archive.is_open()
    }

    /// Streams the decompressed content into `writer`.
    pub fn copy_to<W: Write>(&self, writer: &mut W) -> Result<u64> {
        self.archive.with_reader(|reader| {
            let mut entry = reader.by_index(self.index).map_err(|e| match e {
                zip::result::ZipError::FileNotFound => PackageError::FileNotFound(self.path.clone()),
                other => PackageError::InvalidArchive(format!(
                    "failed to read '{}': {other}",
                    self.path
                )),
            })?;
            Ok(io::copy(&mut entry, writer)?)
        })
    }

    /// Reads the decompressed content into memory.
    pub fn read_to_vec(&self) -> Result<Vec<u8>> {
        let capacity = usize::try_from(self.size).unwrap_or(0);
        let mut buffer = Vec::with_capacity(capacity);
        self.copy_to(&mut buffer)?;
        Ok(buffer)
    }
}

impl PartialEq for PackageFile {
    fn eq(&self, other: &Self) -> bool {
        self.path == other.path && self.index == other.index && self.size == other.size
    }
}

impl Eq for PackageFile {}
