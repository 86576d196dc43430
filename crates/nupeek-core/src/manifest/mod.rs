//! Locating and reading the package manifest.
//!
//! A package carries exactly one manifest: a `.nuspec` entry at the root of
//! the archive. [`load_metadata`] opens the archive once, finds that entry,
//! and hands its bytes to a [`ManifestReader`]. Every handle it opens is
//! dropped before it returns, whether parsing succeeds or not.

pub mod nuspec;

use std::io::Cursor;
use std::io::Read;

use tracing::debug;

use crate::Metadata;
use crate::PackageConfig;
use crate::PackageError;
use crate::PackageSource;
use crate::Result;

pub use nuspec::NuspecReader;

/// Manifest extension, compared case-insensitively.
pub const MANIFEST_EXTENSION: &str = ".nuspec";

/// Parses raw manifest bytes into a metadata record.
///
/// Implementations must return [`PackageError::MalformedPackage`] for
/// documents that cannot be turned into a record with an id and a version.
pub trait ManifestReader {
    /// Reads a manifest from `reader`, which is positioned at its first byte.
    fn read_manifest(&self, reader: &mut dyn Read) -> Result<Metadata>;
}

/// Returns `true` if `path` names a manifest: a root-level entry ending in
/// `.nuspec`. An entry named just `.nuspec` counts.
///
/// # Examples
///
/// ```
/// use nupeek_core::manifest::is_manifest_path;
///
/// assert!(is_manifest_path("Contoso.Utilities.nuspec"));
/// assert!(is_manifest_path("UPPER.NUSPEC"));
/// assert!(!is_manifest_path("content/copy.nuspec"));
/// ```
#[must_use]
pub fn is_manifest_path(path: &str) -> bool {
    !path.contains(['/', '\\'])
        && path
            .len()
            .checked_sub(MANIFEST_EXTENSION.len())
            .and_then(|start| path.get(start..))
            .is_some_and(|ext| ext.eq_ignore_ascii_case(MANIFEST_EXTENSION))
}

/// Loads package metadata from the single manifest entry.
///
/// # Errors
///
/// Returns [`PackageError::MalformedPackage`] if the file is not a zip
/// archive, has no manifest, has more than one manifest, the manifest
/// exceeds `config.max_manifest_size`, or `reader` rejects it. I/O errors
/// opening the file are returned as [`PackageError::Io`].
pub fn load_metadata(
    source: &PackageSource,
    config: &PackageConfig,
    reader: &dyn ManifestReader,
) -> Result<Metadata> {
    let file = source.open()?;
    let mut archive = zip::ZipArchive::new(file).map_err(|e| {
        PackageError::MalformedPackage(format!("failed to open ZIP archive: {e}"))
    })?;

    let index = find_manifest(&archive)?;
    let mut entry = archive.by_index(index).map_err(|e| {
        PackageError::MalformedPackage(format!("failed to read manifest entry: {e}"))
    })?;
    debug!(entry = entry.name(), size = entry.size(), "reading manifest");

    if entry.size() > config.max_manifest_size {
        return Err(PackageError::MalformedPackage(format!(
            "manifest is {} bytes, limit is {}",
            entry.size(),
            config.max_manifest_size
        )));
    }

    let mut bytes = Vec::new();
    (&mut entry)
        .take(config.max_manifest_size.saturating_add(1))
        .read_to_end(&mut bytes)
        .map_err(|e| PackageError::MalformedPackage(format!("failed to read manifest: {e}")))?;

    if bytes.len() as u64 > config.max_manifest_size {
        return Err(PackageError::MalformedPackage(format!(
            "manifest exceeds limit of {} bytes",
            config.max_manifest_size
        )));
    }

    reader.read_manifest(&mut Cursor::new(bytes))
}

fn find_manifest<R: Read + std::io::Seek>(archive: &zip::ZipArchive<R>) -> Result<usize> {
    let mut found: Option<usize> = None;

    for index in 0..archive.len() {
        let Some(name) = archive.name_for_index(index) else {
            continue;
        };
        if !is_manifest_path(name) {
            continue;
        }
        if found.is_some() {
            return Err(PackageError::MalformedPackage(
                "package contains multiple nuspec files".to_string(),
            ));
        }
        found = Some(index);
    }

    found.ok_or_else(|| {
        PackageError::MalformedPackage("nuspec file does not exist in package".to_string())
    })
}
