//! Configuration for package inspection.

/// Maximum manifest size read into memory by default (10 MiB).
pub const DEFAULT_MAX_MANIFEST_SIZE: u64 = 10 * 1024 * 1024;

/// Maximum signature entry size read into memory by default (10 MiB).
pub const DEFAULT_MAX_SIGNATURE_SIZE: u64 = 10 * 1024 * 1024;

/// Settings that control how a package is opened and enumerated.
///
/// # Examples
///
/// ```
/// use nupeek_core::PackageConfig;
///
/// // Use defaults
/// let config = PackageConfig::default();
///
/// // Never ask for write access to the package file
/// let read_only = PackageConfig {
///     prefer_writable: false,
///     ..Default::default()
/// };
/// ```
#[derive(Debug, Clone)]
pub struct PackageConfig {
    /// Open the backing file read+write first, falling back to read-only on
    /// permission denial.
    pub prefer_writable: bool,

    /// Maximum uncompressed size of the nuspec entry in bytes.
    pub max_manifest_size: u64,

    /// Maximum uncompressed size of a signature entry in bytes.
    pub max_signature_size: u64,

    /// Entry prefix that marks a package signature (case-insensitive).
    pub signature_prefix: String,

    /// Entry prefixes that are container infrastructure rather than package
    /// content (case-insensitive).
    pub excluded_prefixes: Vec<String>,
}

impl Default for PackageConfig {
    /// Creates a `PackageConfig` with the standard OPC layout.
    ///
    /// Default values:
    /// - `prefer_writable`: true
    /// - `max_manifest_size`: 10 MiB
    /// - `max_signature_size`: 10 MiB
    /// - `signature_prefix`: `.signature`
    /// - `excluded_prefixes`: `["_rels", "package", "[Content_Types]",
    ///   ".signature"]`
    fn default() -> Self {
        Self {
            prefer_writable: true,
            max_manifest_size: DEFAULT_MAX_MANIFEST_SIZE,
            max_signature_size: DEFAULT_MAX_SIGNATURE_SIZE,
            signature_prefix: ".signature".to_string(),
            excluded_prefixes: vec![
                "_rels".to_string(),
                "package".to_string(),
                "[Content_Types]".to_string(),
                ".signature".to_string(),
            ],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = PackageConfig::default();
        assert!(config.prefer_writable);
        assert_eq!(config.max_manifest_size, DEFAULT_MAX_MANIFEST_SIZE);
        assert_eq!(config.max_signature_size, DEFAULT_MAX_SIGNATURE_SIZE);
        assert_eq!(config.signature_prefix, ".signature");
        assert_eq!(config.excluded_prefixes.len(), 4);
    }

    #[test]
    fn test_signature_prefix_is_excluded_by_default() {
        let config = PackageConfig::default();
        assert!(config.excluded_prefixes.contains(&config.signature_prefix));
    }
}
