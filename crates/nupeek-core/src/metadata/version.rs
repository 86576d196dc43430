//! Package version parsing on top of `semver`.

use std::cmp::Ordering;
use std::fmt;
use std::hash::Hash;
use std::hash::Hasher;
use std::str::FromStr;

use crate::PackageError;
use crate::Result;

/// A NuGet-style package version.
///
/// Accepts one to four numeric components (`1`, `1.2`, `1.2.3`, `1.2.3.4`)
/// followed by optional `-prerelease` and `+build` labels. Missing
/// components are zero. The first three components and both labels are
/// held in a [`semver::Version`]; the fourth component is kept separately as
/// the revision.
///
/// Equality and ordering ignore build metadata and the original spelling.
///
/// # Examples
///
/// ```
/// use nupeek_core::PackageVersion;
///
/// let v: PackageVersion = "1.0".parse()?;
/// assert_eq!(v.to_string(), "1.0.0");
///
/// let beta: PackageVersion = "2.1.0-beta.1".parse()?;
/// assert!(beta.is_prerelease());
/// # Ok::<(), nupeek_core::PackageError>(())
/// ```
#[derive(Debug, Clone)]
pub struct PackageVersion {
    version: semver::Version,
    revision: u64,
    original: String,
}

impl PackageVersion {
    /// Parses a version string.
    ///
    /// # Errors
    ///
    /// Returns [`PackageError::InvalidVersion`] for empty input, a
    /// non-numeric or missing component, more than four components, or
    /// labels that are not valid semver identifiers.
    pub fn parse(input: &str) -> Result<Self> {
        let trimmed = input.trim();
        let invalid = |reason: String| PackageError::InvalidVersion {
            version: input.to_string(),
            reason,
        };

        if trimmed.is_empty() {
            return Err(invalid("version is empty".to_string()));
        }

        let (without_build, build) = match trimmed.split_once('+') {
            Some((head, build)) => (head, Some(build)),
            None => (trimmed, None),
        };
        let (numbers, pre) = match without_build.split_once('-') {
            Some((head, pre)) => (head, Some(pre)),
            None => (without_build, None),
        };

        let mut parts = [0u64; 4];
        let mut count = 0;
        for component in numbers.split('.') {
            if count == parts.len() {
                return Err(invalid("more than four numeric components".to_string()));
            }
            parts[count] = component
                .parse::<u64>()
                .map_err(|e| invalid(format!("component '{component}': {e}")))?;
            count += 1;
        }

        let mut semver_text = format!("{}.{}.{}", parts[0], parts[1], parts[2]);
        if let Some(pre) = pre {
            semver_text.push('-');
            semver_text.push_str(pre);
        }
        if let Some(build) = build {
            semver_text.push('+');
            semver_text.push_str(build);
        }

        let version = semver::Version::parse(&semver_text).map_err(|e| invalid(e.to_string()))?;

        Ok(Self {
            version,
            revision: parts[3],
            original: trimmed.to_string(),
        })
    }

    /// Creates a release version from numeric components.
    #[must_use]
    pub fn new(major: u64, minor: u64, patch: u64) -> Self {
        let version = semver::Version::new(major, minor, patch);
        Self {
            original: version.to_string(),
            version,
            revision: 0,
        }
    }

    /// Returns the major component.
    #[must_use]
    pub fn major(&self) -> u64 {
        self.version.major
    }

    /// Returns the minor component.
    #[must_use]
    pub fn minor(&self) -> u64 {
        self.version.minor
    }

    /// Returns the patch component.
    #[must_use]
    pub fn patch(&self) -> u64 {
        self.version.patch
    }

    /// Returns the fourth (legacy) numeric component.
    #[must_use]
    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Returns `true` if the version carries a pre-release label.
    #[must_use]
    pub fn is_prerelease(&self) -> bool {
        !self.version.pre.is_empty()
    }

    /// Returns the pre-release label, empty for release versions.
    #[must_use]
    pub fn prerelease(&self) -> &str {
        self.version.pre.as_str()
    }

    /// Returns the version as written in the manifest.
    #[must_use]
    pub fn original(&self) -> &str {
        &self.original
    }

    /// Returns the underlying semantic version (without the revision).
    #[must_use]
    pub fn as_semver(&self) -> &semver::Version {
        &self.version
    }
}

impl FromStr for PackageVersion {
    type Err = PackageError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl fmt::Display for PackageVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}.{}.{}",
            self.version.major, self.version.minor, self.version.patch
        )?;
        if self.revision != 0 {
            write!(f, ".{}", self.revision)?;
        }
        if !self.version.pre.is_empty() {
            write!(f, "-{}", self.version.pre)?;
        }
        if !self.version.build.is_empty() {
            write!(f, "+{}", self.version.build)?;
        }
        Ok(())
    }
}

impl PartialEq for PackageVersion {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for PackageVersion {}

impl Hash for PackageVersion {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.version.major.hash(state);
        self.version.minor.hash(state);
        self.version.patch.hash(state);
        self.revision.hash(state);
        self.version.pre.hash(state);
    }
}

impl PartialOrd for PackageVersion {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for PackageVersion {
    fn cmp(&self, other: &Self) -> Ordering {
        (self.version.major, self.version.minor, self.version.patch, self.revision)
            .cmp(&(
                other.version.major,
                other.version.minor,
                other.version.patch,
                other.revision,
            ))
            .then_with(|| self.version.pre.cmp(&other.version.pre))
    }
}
