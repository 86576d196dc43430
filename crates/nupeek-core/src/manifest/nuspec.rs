//! Nuspec XML reader built on `quick-xml`'s serde support.

use std::io::Read;

use serde::Deserialize;

use crate::PackageError;
use crate::Result;
use crate::manifest::ManifestReader;
use crate::metadata::ContentFileEntry;
use crate::metadata::DependencyGroup;
use crate::metadata::FrameworkReference;
use crate::metadata::LicenseMetadata;
use crate::metadata::LicenseType;
use crate::metadata::Metadata;
use crate::metadata::PackageDependency;
use crate::metadata::PackageType;
use crate::metadata::PackageVersion;
use crate::metadata::ReferenceGroup;
use crate::metadata::RepositoryMetadata;

/// Reads `.nuspec` documents into [`Metadata`].
///
/// Only the `<metadata>` element is interpreted; `<files>` and unknown
/// elements are ignored. Schema validation is not performed.
#[derive(Debug, Clone, Copy, Default)]
pub struct NuspecReader;

impl NuspecReader {
    /// Creates a new nuspec reader.
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// Parses a nuspec document held in memory.
    pub fn parse_str(&self, xml: &str) -> Result<Metadata> {
        let xml = xml.strip_prefix('\u{feff}').unwrap_or(xml);
        let raw: RawPackage = quick_xml::de::from_str(xml)
            .map_err(|e| PackageError::MalformedPackage(format!("invalid nuspec XML: {e}")))?;
        let metadata = raw.metadata.ok_or_else(|| {
            PackageError::MalformedPackage("nuspec has no <metadata> element".to_string())
        })?;
        metadata.into_metadata()
    }
}

impl ManifestReader for NuspecReader {
    fn read_manifest(&self, reader: &mut dyn Read) -> Result<Metadata> {
        let mut bytes = Vec::new();
        reader.read_to_end(&mut bytes)?;
        let xml = String::from_utf8(bytes)
            .map_err(|e| PackageError::MalformedPackage(format!("nuspec is not UTF-8: {e}")))?;
        self.parse_str(&xml)
    }
}

#[derive(Debug, Deserialize)]
struct RawPackage {
    metadata: Option<RawMetadata>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct RawMetadata {
    #[serde(rename = "@minClientVersion")]
    min_client_version: Option<String>,
    id: Option<String>,
    version: Option<String>,
    title: Option<String>,
    authors: Option<String>,
    owners: Option<String>,
    icon_url: Option<String>,
    icon: Option<String>,
    readme: Option<String>,
    license_url: Option<String>,
    license: Option<RawLicense>,
    project_url: Option<String>,
    require_license_acceptance: Option<String>,
    development_dependency: Option<String>,
    serviceable: Option<String>,
    description: Option<String>,
    summary: Option<String>,
    release_notes: Option<String>,
    language: Option<String>,
    copyright: Option<String>,
    tags: Option<String>,
    repository: Option<RawRepository>,
    package_types: Option<RawPackageTypes>,
    dependencies: Option<RawDependencies>,
    references: Option<RawReferences>,
    framework_assemblies: Option<RawFrameworkAssemblies>,
    content_files: Option<RawContentFiles>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawLicense {
    #[serde(rename = "@type")]
    kind: Option<String>,
    #[serde(rename = "@version")]
    version: Option<String>,
    #[serde(rename = "$text")]
    value: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawRepository {
    #[serde(rename = "@type")]
    kind: Option<String>,
    #[serde(rename = "@url")]
    url: Option<String>,
    #[serde(rename = "@branch")]
    branch: Option<String>,
    #[serde(rename = "@commit")]
    commit: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawPackageTypes {
    #[serde(rename = "packageType")]
    items: Vec<RawPackageType>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawPackageType {
    #[serde(rename = "@name")]
    name: Option<String>,
    #[serde(rename = "@version")]
    version: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawDependencies {
    #[serde(rename = "group")]
    groups: Vec<RawDependencyGroup>,
    #[serde(rename = "dependency")]
    dependencies: Vec<RawDependency>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawDependencyGroup {
    #[serde(rename = "@targetFramework")]
    target_framework: Option<String>,
    #[serde(rename = "dependency")]
    dependencies: Vec<RawDependency>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawDependency {
    #[serde(rename = "@id")]
    id: Option<String>,
    #[serde(rename = "@version")]
    version: Option<String>,
    #[serde(rename = "@include")]
    include: Option<String>,
    #[serde(rename = "@exclude")]
    exclude: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawReferences {
    #[serde(rename = "group")]
    groups: Vec<RawReferenceGroup>,
    #[serde(rename = "reference")]
    references: Vec<RawReference>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawReferenceGroup {
    #[serde(rename = "@targetFramework")]
    target_framework: Option<String>,
    #[serde(rename = "reference")]
    references: Vec<RawReference>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawReference {
    #[serde(rename = "@file")]
    file: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawFrameworkAssemblies {
    #[serde(rename = "frameworkAssembly")]
    items: Vec<RawFrameworkAssembly>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawFrameworkAssembly {
    #[serde(rename = "@assemblyName")]
    assembly_name: Option<String>,
    #[serde(rename = "@targetFramework")]
    target_framework: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawContentFiles {
    #[serde(rename = "files")]
    items: Vec<RawContentFile>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawContentFile {
    #[serde(rename = "@include")]
    include: Option<String>,
    #[serde(rename = "@exclude")]
    exclude: Option<String>,
    #[serde(rename = "@buildAction")]
    build_action: Option<String>,
    #[serde(rename = "@copyToOutput")]
    copy_to_output: Option<String>,
    #[serde(rename = "@flatten")]
    flatten: Option<String>,
}

impl RawMetadata {
    fn into_metadata(self) -> Result<Metadata> {
        let id = non_blank(self.id).ok_or_else(|| {
            PackageError::MalformedPackage("nuspec <id> is missing or empty".to_string())
        })?;
        let version_text = non_blank(self.version).ok_or_else(|| {
            PackageError::MalformedPackage("nuspec <version> is missing or empty".to_string())
        })?;
        let version = PackageVersion::parse(&version_text)
            .map_err(|e| PackageError::MalformedPackage(e.to_string()))?;

        let min_client_version = non_blank(self.min_client_version)
            .map(|v| PackageVersion::parse(&v))
            .transpose()
            .map_err(|e| PackageError::MalformedPackage(e.to_string()))?;

        let license = self.license.map(RawLicense::into_license).transpose()?.flatten();

        let mut metadata = Metadata::new(id, version);
        metadata.min_client_version = min_client_version;
        metadata.title = non_blank(self.title);
        metadata.authors = split_list(self.authors.as_deref());
        metadata.owners = split_list(self.owners.as_deref());
        metadata.icon_url = non_blank(self.icon_url);
        metadata.icon = non_blank(self.icon);
        metadata.readme = non_blank(self.readme);
        metadata.license_url = non_blank(self.license_url);
        metadata.license = license;
        metadata.project_url = non_blank(self.project_url);
        metadata.require_license_acceptance = parse_flag(self.require_license_acceptance.as_deref());
        metadata.development_dependency = parse_flag(self.development_dependency.as_deref());
        metadata.serviceable = parse_flag(self.serviceable.as_deref());
        metadata.description = non_blank(self.description);
        metadata.summary = non_blank(self.summary);
        metadata.release_notes = non_blank(self.release_notes);
        metadata.language = non_blank(self.language);
        metadata.copyright = non_blank(self.copyright);
        metadata.set_tags(self.tags.as_deref());
        metadata.repository = self.repository.map(RawRepository::into_repository);
        metadata.package_types = self
            .package_types
            .map(|types| {
                types
                    .items
                    .into_iter()
                    .filter_map(RawPackageType::into_package_type)
                    .collect()
            })
            .unwrap_or_default();
        metadata.dependency_groups = self
            .dependencies
            .map(RawDependencies::into_groups)
            .transpose()?
            .unwrap_or_default();
        metadata.package_assembly_references = self
            .references
            .map(RawReferences::into_groups)
            .unwrap_or_default();
        metadata.framework_references = self
            .framework_assemblies
            .map(|assemblies| {
                assemblies
                    .items
                    .into_iter()
                    .filter_map(RawFrameworkAssembly::into_reference)
                    .collect()
            })
            .unwrap_or_default();
        metadata.content_files = self
            .content_files
            .map(|files| {
                files
                    .items
                    .into_iter()
                    .filter_map(RawContentFile::into_entry)
                    .collect()
            })
            .unwrap_or_default();

        Ok(metadata)
    }
}

impl RawLicense {
    fn into_license(self) -> Result<Option<LicenseMetadata>> {
        let Some(value) = non_blank(self.value) else {
            return Ok(None);
        };
        let kind = match self.kind.as_deref().map(str::trim) {
            Some(k) if k.eq_ignore_ascii_case("expression") => LicenseType::Expression,
            Some(k) if k.eq_ignore_ascii_case("file") => LicenseType::File,
            other => {
                return Err(PackageError::MalformedPackage(format!(
                    "unknown license type: {}",
                    other.unwrap_or("<missing>")
                )));
            }
        };
        Ok(Some(LicenseMetadata {
            kind,
            value,
            version: non_blank(self.version),
        }))
    }
}

impl RawRepository {
    fn into_repository(self) -> RepositoryMetadata {
        RepositoryMetadata {
            kind: non_blank(self.kind),
            url: non_blank(self.url),
            branch: non_blank(self.branch),
            commit: non_blank(self.commit),
        }
    }
}

impl RawPackageType {
    fn into_package_type(self) -> Option<PackageType> {
        Some(PackageType {
            name: non_blank(self.name)?,
            version: non_blank(self.version),
        })
    }
}

impl RawDependencies {
    fn into_groups(self) -> Result<Vec<DependencyGroup>> {
        // A flat dependency list is the framework-agnostic group.
        if self.groups.is_empty() {
            if self.dependencies.is_empty() {
                return Ok(Vec::new());
            }
            return Ok(vec![DependencyGroup {
                target_framework: None,
                dependencies: convert_dependencies(self.dependencies)?,
            }]);
        }

        self.groups
            .into_iter()
            .map(|group| {
                Ok(DependencyGroup {
                    target_framework: non_blank(group.target_framework),
                    dependencies: convert_dependencies(group.dependencies)?,
                })
            })
            .collect()
    }
}

fn convert_dependencies(raw: Vec<RawDependency>) -> Result<Vec<PackageDependency>> {
    raw.into_iter()
        .map(|dependency| {
            let id = non_blank(dependency.id).ok_or_else(|| {
                PackageError::MalformedPackage("dependency without an id".to_string())
            })?;
            Ok(PackageDependency {
                id,
                version_range: non_blank(dependency.version),
                include: split_list(dependency.include.as_deref()),
                exclude: split_list(dependency.exclude.as_deref()),
            })
        })
        .collect()
}

impl RawReferences {
    fn into_groups(self) -> Vec<ReferenceGroup> {
        if self.groups.is_empty() {
            let references = collect_references(self.references);
            if references.is_empty() {
                return Vec::new();
            }
            return vec![ReferenceGroup {
                target_framework: None,
                references,
            }];
        }

        self.groups
            .into_iter()
            .map(|group| ReferenceGroup {
                target_framework: non_blank(group.target_framework),
                references: collect_references(group.references),
            })
            .collect()
    }
}

fn collect_references(raw: Vec<RawReference>) -> Vec<String> {
    raw.into_iter()
        .filter_map(|reference| non_blank(reference.file))
        .collect()
}

impl RawFrameworkAssembly {
    fn into_reference(self) -> Option<FrameworkReference> {
        Some(FrameworkReference {
            assembly_name: non_blank(self.assembly_name)?,
            target_frameworks: split_list(self.target_framework.as_deref()),
        })
    }
}

impl RawContentFile {
    fn into_entry(self) -> Option<ContentFileEntry> {
        Some(ContentFileEntry {
            include: non_blank(self.include)?,
            exclude: non_blank(self.exclude),
            build_action: non_blank(self.build_action),
            copy_to_output: self.copy_to_output.as_deref().map(|v| parse_flag(Some(v))),
            flatten: self.flatten.as_deref().map(|v| parse_flag(Some(v))),
        })
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.and_then(|v| {
        let trimmed = v.trim();
        if trimmed.is_empty() {
            None
        } else if trimmed.len() == v.len() {
            Some(v)
        } else {
            Some(trimmed.to_string())
        }
    })
}

fn split_list(value: Option<&str>) -> Vec<String> {
    value
        .unwrap_or_default()
        .split(',')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(ToString::to_string)
        .collect()
}

fn parse_flag(value: Option<&str>) -> bool {
    value.is_some_and(|v| v.trim().eq_ignore_ascii_case("true"))
}
