//! Structural manifest records: dependencies, references, package types.

/// A dependency on another package.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PackageDependency {
    /// Id of the dependency.
    pub id: String,
    /// Version range as written in the manifest (e.g. `[1.0,2.0)`).
    pub version_range: Option<String>,
    /// Asset types to include from the dependency.
    pub include: Vec<String>,
    /// Asset types to exclude from the dependency.
    pub exclude: Vec<String>,
}

/// Dependencies that apply to one target framework.
///
/// A group without a target framework applies to every framework.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct DependencyGroup {
    /// Target framework moniker, if any.
    pub target_framework: Option<String>,
    /// Dependencies in manifest order.
    pub dependencies: Vec<PackageDependency>,
}

/// Assembly references exposed to one target framework.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ReferenceGroup {
    /// Target framework moniker, if any.
    pub target_framework: Option<String>,
    /// Referenced assembly file names.
    pub references: Vec<String>,
}

/// A framework assembly the package requires from the GAC/shared framework.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FrameworkReference {
    /// Assembly name, e.g. `System.Net.Http`.
    pub assembly_name: String,
    /// Frameworks the reference applies to; empty means all.
    pub target_frameworks: Vec<String>,
}

/// A `contentFiles` mapping rule.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ContentFileEntry {
    /// Glob of files the rule applies to.
    pub include: String,
    /// Glob of files excluded from the rule.
    pub exclude: Option<String>,
    /// MSBuild action (`Compile`, `None`, `Content`, ...).
    pub build_action: Option<String>,
    /// Whether matching files are copied to the output directory.
    pub copy_to_output: Option<bool>,
    /// Whether matching files are copied without their folder structure.
    pub flatten: Option<bool>,
}

/// A declared package type such as `Dependency` or `DotnetTool`.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PackageType {
    /// Package type name.
    pub name: String,
    /// Optional package type version.
    pub version: Option<String>,
}

/// Source repository the package was built from.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RepositoryMetadata {
    /// Repository kind, e.g. `git`.
    pub kind: Option<String>,
    /// Repository URL.
    pub url: Option<String>,
    /// Branch name.
    pub branch: Option<String>,
    /// Commit id.
    pub commit: Option<String>,
}

/// How a license is declared.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LicenseType {
    /// An SPDX license expression.
    Expression,
    /// A license file inside the package.
    File,
}

/// The `<license>` element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LicenseMetadata {
    /// Expression or file.
    pub kind: LicenseType,
    /// The expression text or the file path.
    pub value: String,
    /// License expression version.
    pub version: Option<String>,
}
