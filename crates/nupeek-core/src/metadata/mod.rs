//! Descriptive package metadata read from the nuspec manifest.

pub mod types;
pub mod version;

use std::borrow::Cow;

pub use types::ContentFileEntry;
pub use types::DependencyGroup;
pub use types::FrameworkReference;
pub use types::LicenseMetadata;
pub use types::LicenseType;
pub use types::PackageDependency;
pub use types::PackageType;
pub use types::ReferenceGroup;
pub use types::RepositoryMetadata;
pub use version::PackageVersion;

/// Owned record of every descriptive package field.
///
/// `id` and `version` are always present on a record produced by the
/// manifest loader. Every field may be reassigned by the owner.
///
/// Tags are private so they can be normalized: see [`tags`](Self::tags).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Metadata {
    /// Package id.
    pub id: String,
    /// Package version.
    pub version: PackageVersion,
    /// Human-friendly title.
    pub title: Option<String>,
    /// Authors in manifest order.
    pub authors: Vec<String>,
    /// Owners in manifest order.
    pub owners: Vec<String>,
    /// Icon URL (deprecated in favor of `icon`).
    pub icon_url: Option<String>,
    /// Path of the icon file inside the package.
    pub icon: Option<String>,
    /// Path of the readme file inside the package.
    pub readme: Option<String>,
    /// License URL.
    pub license_url: Option<String>,
    /// License expression or file.
    pub license: Option<LicenseMetadata>,
    /// Project URL.
    pub project_url: Option<String>,
    /// Whether consumers must accept the license before install.
    pub require_license_acceptance: bool,
    /// Whether the package is a development-only dependency.
    pub development_dependency: bool,
    /// Whether the package is serviceable.
    pub serviceable: bool,
    /// Long description.
    pub description: Option<String>,
    /// Short summary.
    pub summary: Option<String>,
    /// Release notes.
    pub release_notes: Option<String>,
    /// Locale of the package, e.g. `en-US`.
    pub language: Option<String>,
    /// Copyright notice.
    pub copyright: Option<String>,
    tags: Option<String>,
    /// Minimum client version able to install the package.
    pub min_client_version: Option<PackageVersion>,
    /// Dependency groups in manifest order.
    pub dependency_groups: Vec<DependencyGroup>,
    /// Explicit assembly reference groups.
    pub package_assembly_references: Vec<ReferenceGroup>,
    /// Framework assembly references.
    pub framework_references: Vec<FrameworkReference>,
    /// `contentFiles` mapping rules.
    pub content_files: Vec<ContentFileEntry>,
    /// Declared package types.
    pub package_types: Vec<PackageType>,
    /// Source repository.
    pub repository: Option<RepositoryMetadata>,
}

impl Metadata {
    /// Creates a record with the required identity and every other field
    /// empty.
    #[must_use]
    pub fn new(id: impl Into<String>, version: PackageVersion) -> Self {
        Self {
            id: id.into(),
            version,
            title: None,
            authors: Vec::new(),
            owners: Vec::new(),
            icon_url: None,
            icon: None,
            readme: None,
            license_url: None,
            license: None,
            project_url: None,
            require_license_acceptance: false,
            development_dependency: false,
            serviceable: false,
            description: None,
            summary: None,
            release_notes: None,
            language: None,
            copyright: None,
            tags: None,
            min_client_version: None,
            dependency_groups: Vec::new(),
            package_assembly_references: Vec::new(),
            framework_references: Vec::new(),
            content_files: Vec::new(),
            package_types: Vec::new(),
            repository: None,
        }
    }

    /// Returns the tags wrapped in single leading and trailing spaces.
    ///
    /// The wrapping lets callers test for a whole tag with a plain substring
    /// search such as `tags.contains(" json ")`. A blank value is returned
    /// unmodified.
    ///
    /// # Examples
    ///
    /// ```
    /// use nupeek_core::{Metadata, PackageVersion};
    ///
    /// let mut metadata = Metadata::new("Demo", PackageVersion::new(1, 0, 0));
    /// metadata.set_tags(Some("json serializer"));
    /// assert_eq!(metadata.tags().as_deref(), Some(" json serializer "));
    /// ```
    #[must_use]
    pub fn tags(&self) -> Option<Cow<'_, str>> {
        let tags = self.tags.as_deref()?;
        if tags.trim().is_empty() {
            Some(Cow::Borrowed(tags))
        } else {
            Some(Cow::Owned(format!(" {tags} ")))
        }
    }

    /// Returns the tags exactly as stored.
    #[must_use]
    pub fn raw_tags(&self) -> Option<&str> {
        self.tags.as_deref()
    }

    /// Returns the individual tags.
    pub fn tag_list(&self) -> impl Iterator<Item = &str> {
        self.tags.as_deref().unwrap_or_default().split_whitespace()
    }

    /// Replaces the tags. Non-blank values are trimmed; blank values are
    /// stored as given.
    pub fn set_tags(&mut self, tags: Option<&str>) {
        self.tags = tags.map(|t| {
            let trimmed = t.trim();
            let kept = if trimmed.is_empty() { t } else { trimmed };
            kept.to_string()
        });
    }

    /// Returns `"<id> <version>"`.
    #[must_use]
    pub fn full_name(&self) -> String {
        format!("{} {}", self.id, self.version)
    }
}
