//! Package file classification and handles.
//!
//! An archive entry is package content unless it is a directory marker, an
//! OPC infrastructure entry (`_rels/`, `package/`, `[Content_Types].xml`), a
//! signature entry, or the manifest.

pub mod entry;

pub use entry::PackageFile;

use crate::PackageConfig;
use crate::manifest::is_manifest_path;

/// What an archive entry is, from the package's point of view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    /// Package content, returned by enumeration.
    Content,
    /// Directory marker (path ends in `/`).
    Directory,
    /// Container infrastructure.
    Infrastructure,
    /// Package signature entry.
    Signature,
    /// The nuspec manifest.
    Manifest,
}

impl EntryKind {
    /// Returns `true` for entries exposed as package files.
    #[must_use]
    pub const fn is_content(self) -> bool {
        matches!(self, Self::Content)
    }
}

/// Classifies an archive entry path.
///
/// The signature check runs first so that a signature entry is recognized
/// even though its prefix is also excluded as infrastructure.
///
/// # Examples
///
/// ```
/// use nupeek_core::PackageConfig;
/// use nupeek_core::files::{EntryKind, classify};
///
/// let config = PackageConfig::default();
/// assert_eq!(classify("lib/net8.0/Demo.dll", &config), EntryKind::Content);
/// assert_eq!(classify("_rels/.rels", &config), EntryKind::Infrastructure);
/// assert_eq!(classify(".signature.p7s", &config), EntryKind::Signature);
/// assert_eq!(classify("Demo.nuspec", &config), EntryKind::Manifest);
/// ```
#[must_use]
pub fn classify(path: &str, config: &PackageConfig) -> EntryKind {
    if is_signature_path(path, config) {
        EntryKind::Signature
    } else if path.ends_with('/') {
        EntryKind::Directory
    } else if config
        .excluded_prefixes
        .iter()
        .any(|prefix| starts_with_ignore_case(path, prefix))
    {
        EntryKind::Infrastructure
    } else if is_manifest_path(path) {
        EntryKind::Manifest
    } else {
        EntryKind::Content
    }
}

/// Returns `true` if `path` starts with the configured signature prefix.
#[must_use]
pub fn is_signature_path(path: &str, config: &PackageConfig) -> bool {
    !config.signature_prefix.is_empty() && starts_with_ignore_case(path, &config.signature_prefix)
}

/// Returns `true` if `path` is package content.
#[must_use]
pub fn is_package_file(path: &str, config: &PackageConfig) -> bool {
    classify(path, config).is_content()
}

fn starts_with_ignore_case(path: &str, prefix: &str) -> bool {
    path.get(..prefix.len())
        .is_some_and(|head| head.eq_ignore_ascii_case(prefix))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_content_paths() {
        let config = PackageConfig::default();
        for path in [
            "lib/net45/Demo.dll",
            "content/readme.txt",
            "tools/install.ps1",
            "icon.png",
            "docs/package.md",
        ] {
            assert_eq!(classify(path, &config), EntryKind::Content, "{path}");
        }
    }

    #[test]
    fn test_directory_markers() {
        let config = PackageConfig::default();
        assert_eq!(classify("lib/", &config), EntryKind::Directory);
        assert_eq!(classify("lib/net45/", &config), EntryKind::Directory);
    }

    #[test]
    fn test_infrastructure_prefixes_any_case() {
        let config = PackageConfig::default();
        for path in [
            "_rels/.rels",
            "_RELS/.rels",
            "package/services/metadata/core-properties/abc.psmdcp",
            "Package/services/metadata/core-properties/abc.psmdcp",
            "[Content_Types].xml",
            "[content_types].xml",
        ] {
            assert_eq!(classify(path, &config), EntryKind::Infrastructure, "{path}");
        }
    }

    #[test]
    fn test_package_prefix_matches_any_root_name() {
        let config = PackageConfig::default();
        assert_eq!(classify("packageIcon.png", &config), EntryKind::Infrastructure);
    }

    #[test]
    fn test_signature_paths() {
        let config = PackageConfig::default();
        assert_eq!(classify(".signature.p7s", &config), EntryKind::Signature);
        assert_eq!(classify(".SIGNATURE.P7S", &config), EntryKind::Signature);
        assert!(!is_package_file(".signature.p7s", &config));
    }

    #[test]
    fn test_manifest_excluded() {
        let config = PackageConfig::default();
        assert_eq!(classify("Demo.nuspec", &config), EntryKind::Manifest);
        assert_eq!(classify("content/Demo.nuspec", &config), EntryKind::Content);
    }

    #[test]
    fn test_custom_prefixes() {
        let config = PackageConfig {
            excluded_prefixes: vec!["meta/".to_string()],
            signature_prefix: String::new(),
            ..Default::default()
        };
        assert_eq!(classify("meta/info.xml", &config), EntryKind::Infrastructure);
        assert_eq!(classify("_rels/.rels", &config), EntryKind::Content);
        assert_eq!(classify(".signature.p7s", &config), EntryKind::Content);
    }

    #[test]
    fn test_prefix_on_multibyte_boundary() {
        let config = PackageConfig::default();
        assert_eq!(classify("ü", &config), EntryKind::Content);
        assert_eq!(classify("péckage/x", &config), EntryKind::Content);
    }
}
