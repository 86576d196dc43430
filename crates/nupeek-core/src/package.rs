//! The package handle.

use std::borrow::Cow;
use std::fmt;
use std::fs;
use std::fs::File;
use std::io;
use std::io::Read;
use std::path::Path;
use std::sync::Arc;
use std::sync::OnceLock;
use std::time::SystemTime;

use tracing::debug;
use tracing::warn;
use x509_cert::Certificate;

use crate::Metadata;
use crate::PackageConfig;
use crate::PackageError;
use crate::PackageFile;
use crate::PackageSource;
use crate::PackageVersion;
use crate::Result;
use crate::files::EntryKind;
use crate::files::classify;
use crate::manifest::ManifestReader;
use crate::manifest::NuspecReader;
use crate::manifest::load_metadata;
use crate::resources::ResourceTracker;
use crate::resources::TrackedArchive;
use crate::signature::SignatureInfo;

/// A package opened from a zip container on disk.
///
/// Metadata is read once, when the package is opened. The container itself
/// is reopened by every call that needs its bytes; readers that back
/// returned [`PackageFile`]s are tracked and released by
/// [`close`](Self::close), which also runs on drop.
///
/// Signature state is only discovered by [`files`](Self::files): until the
/// first enumeration, [`is_signed`](Self::is_signed) reports `false`.
///
/// A `Package` performs no internal locking across operations. Share it
/// between threads only behind external synchronization.
///
/// # Examples
///
/// ```no_run
/// use nupeek_core::Package;
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let mut package = Package::open("Contoso.Utilities.1.4.0.nupkg")?;
/// package.set_tags(Some("utilities helpers"));
///
/// let files = package.files()?;
/// if let Some(readme) = files.iter().find(|f| f.name() == "README.md") {
///     let text = String::from_utf8(readme.read_to_vec()?)?;
///     println!("{text}");
/// }
///
/// package.close();
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct Package {
    source: PackageSource,
    config: PackageConfig,
    metadata: Metadata,
    signature: SignatureInfo,
    published: Option<SystemTime>,
    last_updated: OnceLock<SystemTime>,
    package_size: OnceLock<u64>,
    tracker: ResourceTracker,
    closed: bool,
}

impl Package {
    /// Opens a package with the default configuration and nuspec reader.
    ///
    /// # Errors
    ///
    /// Returns [`PackageError::InvalidInput`] if the path is empty or not a
    /// file, and [`PackageError::MalformedPackage`] if the manifest is
    /// missing, duplicated, or invalid.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::open_with_config(path, PackageConfig::default())
    }

    /// Opens a package with an explicit configuration.
    pub fn open_with_config<P: AsRef<Path>>(path: P, config: PackageConfig) -> Result<Self> {
        Self::open_with_reader(path, config, &NuspecReader::new())
    }

    /// Opens a package, parsing the manifest with `reader`.
    pub fn open_with_reader<P: AsRef<Path>>(
        path: P,
        config: PackageConfig,
        reader: &dyn ManifestReader,
    ) -> Result<Self> {
        let source = PackageSource::new(path, &config)?;
        let metadata = load_metadata(&source, &config, reader)?;
        debug!(
            path = %source.path().display(),
            package = %metadata.full_name(),
            "opened package"
        );

        Ok(Self {
            source,
            config,
            metadata,
            signature: SignatureInfo::new(),
            published: None,
            last_updated: OnceLock::new(),
            package_size: OnceLock::new(),
            tracker: ResourceTracker::new(),
            closed: false,
        })
    }

    /// Returns the path of the backing file.
    #[must_use]
    pub fn source(&self) -> &Path {
        self.source.path()
    }

    /// Returns the configuration the package was opened with.
    #[must_use]
    pub fn config(&self) -> &PackageConfig {
        &self.config
    }

    /// Returns the package metadata.
    #[must_use]
    pub fn metadata(&self) -> &Metadata {
        &self.metadata
    }

    /// Returns the package metadata for modification.
    pub fn metadata_mut(&mut self) -> &mut Metadata {
        &mut self.metadata
    }

    /// Returns the package id.
    #[must_use]
    pub fn id(&self) -> &str {
        &self.metadata.id
    }

    /// Returns the package version.
    #[must_use]
    pub fn version(&self) -> &PackageVersion {
        &self.metadata.version
    }

    /// Returns the tags wrapped in boundary spaces; see [`Metadata::tags`].
    #[must_use]
    pub fn tags(&self) -> Option<Cow<'_, str>> {
        self.metadata.tags()
    }

    /// Replaces the tags; see [`Metadata::set_tags`].
    pub fn set_tags(&mut self, tags: Option<&str>) {
        self.metadata.set_tags(tags);
    }

    /// Returns `true` if the version has a pre-release label.
    #[must_use]
    pub fn is_prerelease(&self) -> bool {
        self.metadata.version.is_prerelease()
    }

    /// Always `true`: a standalone package is never compared against other
    /// versions.
    #[must_use]
    pub fn is_latest_version(&self) -> bool {
        true
    }

    /// Always `true`, see [`is_latest_version`](Self::is_latest_version).
    #[must_use]
    pub fn is_absolute_latest_version(&self) -> bool {
        true
    }

    /// Always 0: download counts live in a repository index.
    #[must_use]
    pub fn download_count(&self) -> u64 {
        0
    }

    /// Always 0: download counts live in a repository index.
    #[must_use]
    pub fn version_download_count(&self) -> u64 {
        0
    }

    /// Always `None`: the package hash is not computed.
    #[must_use]
    pub fn package_hash(&self) -> Option<&str> {
        None
    }

    /// Always `None`: there is no repository to report abuse to.
    #[must_use]
    pub fn report_abuse_url(&self) -> Option<&str> {
        None
    }

    /// Always `false`: certificate trust is not evaluated.
    #[must_use]
    pub fn is_verified(&self) -> bool {
        false
    }

    /// Always `None`: repository countersignatures are not read.
    #[must_use]
    pub fn repository_certificate(&self) -> Option<&Certificate> {
        None
    }

    /// Returns the publish timestamp set by the caller.
    #[must_use]
    pub fn published(&self) -> Option<SystemTime> {
        self.published
    }

    /// Sets the publish timestamp.
    pub fn set_published(&mut self, published: Option<SystemTime>) {
        self.published = published;
    }

    /// Returns `"<id> <version>"`.
    #[must_use]
    pub fn full_name(&self) -> String {
        self.metadata.full_name()
    }

    /// Returns `true` once enumeration has seen a signature entry.
    #[must_use]
    pub fn is_signed(&self) -> bool {
        self.signature.is_signed()
    }

    /// Returns the publisher certificate extracted during enumeration.
    ///
    /// May be `None` for a signed package whose signature could not be
    /// decoded.
    #[must_use]
    pub fn publisher_certificate(&self) -> Option<&Certificate> {
        self.signature.certificate()
    }

    /// Returns the signature state.
    #[must_use]
    pub fn signature(&self) -> &SignatureInfo {
        &self.signature
    }

    /// Returns the modification time of the backing file, read once.
    pub fn last_updated(&self) -> Result<SystemTime> {
        if let Some(modified) = self.last_updated.get() {
            return Ok(*modified);
        }
        let modified = fs::metadata(self.source.path())?.modified()?;
        Ok(*self.last_updated.get_or_init(|| modified))
    }

    /// Returns the size of the backing file in bytes, read once.
    pub fn package_size(&self) -> Result<u64> {
        if let Some(size) = self.package_size.get() {
            return Ok(*size);
        }
        let size = fs::metadata(self.source.path())?.len();
        Ok(*self.package_size.get_or_init(|| size))
    }

    /// Lists the package content files in archive order.
    ///
    /// Directory markers, infrastructure entries, signature entries and the
    /// manifest are skipped. While scanning, each signature entry is read
    /// and recorded: the package becomes signed, and the publisher
    /// certificate is set if the signature decodes. A signature that fails
    /// to decode does not fail enumeration.
    ///
    /// The archive reader backing the returned files stays open until
    /// [`close`](Self::close).
    ///
    /// # Errors
    ///
    /// Returns [`PackageError::Closed`] after `close`,
    /// [`PackageError::InvalidArchive`] if the container cannot be read, and
    /// [`PackageError::Io`] if the file cannot be opened.
    pub fn files(&mut self) -> Result<Vec<PackageFile>> {
        if self.closed {
            return Err(PackageError::Closed);
        }

        let file = self.source.open()?;
        let reader = zip::ZipArchive::new(file).map_err(|e| {
            PackageError::InvalidArchive(format!("failed to open ZIP archive: {e}"))
        })?;
        let archive = self.tracker.track(reader);

        let config = &self.config;
        let signature = &mut self.signature;
        let files =
            archive.with_reader(|reader| scan_entries(reader, &archive, config, signature))?;

        debug!(
            files = files.len(),
            signed = self.signature.is_signed(),
            "enumerated package files"
        );
        Ok(files)
    }

    /// Opens a fresh stream over the whole container.
    ///
    /// The stream is owned by the caller and is not tracked.
    pub fn stream(&self) -> Result<File> {
        if self.closed {
            return Err(PackageError::Closed);
        }
        Ok(self.source.open()?)
    }

    /// Returns every archive reader opened by enumeration.
    #[must_use]
    pub fn tracked_resources(&self) -> &[Arc<TrackedArchive>] {
        self.tracker.resources()
    }

    /// Returns `true` after [`close`](Self::close).
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// Releases every tracked archive reader and returns how many were
    /// still open.
    ///
    /// The package cannot be enumerated afterwards. Calling `close` again
    /// releases nothing.
    pub fn close(&mut self) -> usize {
        self.closed = true;
        self.tracker.release_all()
    }
}

impl Drop for Package {
    fn drop(&mut self) {
        self.close();
    }
}

impl fmt::Display for Package {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.metadata.id, self.metadata.version)
    }
}

fn scan_entries(
    reader: &mut zip::ZipArchive<File>,
    archive: &Arc<TrackedArchive>,
    config: &PackageConfig,
    signature: &mut SignatureInfo,
) -> Result<Vec<PackageFile>> {
    let mut files = Vec::new();

    for index in 0..reader.len() {
        let Some(path) = reader.name_for_index(index).map(str::to_string) else {
            continue;
        };

        match classify(&path, config) {
            EntryKind::Signature => read_signature(reader, index, &path, config, signature)?,
            EntryKind::Content => {
                let size = reader
                    .by_index_raw(index)
                    .map_err(|e| {
                        PackageError::InvalidArchive(format!("failed to read '{path}': {e}"))
                    })?
                    .size();
                files.push(PackageFile::new(path, index, size, Arc::clone(archive)));
            }
            EntryKind::Directory | EntryKind::Infrastructure | EntryKind::Manifest => {}
        }
    }

    Ok(files)
}

fn read_signature(
    reader: &mut zip::ZipArchive<File>,
    index: usize,
    path: &str,
    config: &PackageConfig,
    signature: &mut SignatureInfo,
) -> Result<()> {
    signature.mark_signed();

    let mut entry = match reader.by_index(index) {
        Ok(entry) => entry,
        Err(e) => {
            warn!(entry = path, error = %e, "signature entry cannot be opened");
            return Ok(());
        }
    };

    if entry.size() > config.max_signature_size {
        warn!(
            entry = path,
            size = entry.size(),
            limit = config.max_signature_size,
            "signature entry too large, not decoded"
        );
        return Ok(());
    }

    let mut bytes = Vec::new();
    match (&mut entry)
        .take(config.max_signature_size.saturating_add(1))
        .read_to_end(&mut bytes)
    {
        Ok(_) => {}
        Err(e) if e.kind() == io::ErrorKind::InvalidData => {
            warn!(entry = path, error = %e, "signature entry is corrupt");
            return Ok(());
        }
        Err(e) => return Err(e.into()),
    }

    if bytes.len() as u64 > config.max_signature_size {
        warn!(entry = path, "signature entry too large, not decoded");
        return Ok(());
    }

    signature.record(path, &bytes);
    Ok(())
}
