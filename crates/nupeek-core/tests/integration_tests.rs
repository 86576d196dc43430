//! Integration tests for nupeek-core.
//!
//! These tests open real package files written to a temporary directory.

#![allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::field_reassign_with_default
)]

use nupeek_core::Package;
use nupeek_core::PackageConfig;
use nupeek_core::PackageError;
use nupeek_core::PackageFile;
use nupeek_core::test_utils::PackageBuilder;
use nupeek_core::test_utils::minimal_nuspec;
use nupeek_core::test_utils::signed_message_fixture;
use nupeek_core::test_utils::signed_message_without_signers;
use std::fs;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::PathBuf;
use tempfile::TempDir;

fn write_package(dir: &TempDir, name: &str, data: &[u8]) -> PathBuf {
    let path = dir.path().join(name);
    fs::write(&path, data).unwrap();
    path
}

fn paths(files: &[PackageFile]) -> Vec<&str> {
    files.iter().map(PackageFile::path).collect()
}

#[test]
fn test_open_valid_package() {
    let temp = TempDir::new().unwrap();
    let path = write_package(
        &temp,
        "Contoso.Utilities.1.4.0.nupkg",
        &PackageBuilder::nupkg("Contoso.Utilities", "1.4.0").build(),
    );

    let package = Package::open(&path).unwrap();
    assert_eq!(package.id(), "Contoso.Utilities");
    assert_eq!(package.version().to_string(), "1.4.0");
    assert_eq!(package.metadata().authors, ["Test Author"]);
    assert!(!package.is_signed());
}

#[test]
fn test_open_full_nuspec() {
    let nuspec = r#"<?xml version="1.0" encoding="utf-8"?>
<package xmlns="http://schemas.microsoft.com/packaging/2013/05/nuspec.xsd">
  <metadata minClientVersion="5.0">
    <id>Contoso.Full</id>
    <version>2.1.0-rc.1</version>
    <title>Contoso Full</title>
    <authors>Alice, Bob</authors>
    <requireLicenseAcceptance>true</requireLicenseAcceptance>
    <license type="expression">MIT</license>
    <description>Everything set.</description>
    <tags>json  parsing</tags>
    <dependencies>
      <group targetFramework="net8.0">
        <dependency id="Contoso.Core" version="[1.0,2.0)" />
      </group>
    </dependencies>
  </metadata>
</package>"#;
    let temp = TempDir::new().unwrap();
    let path = write_package(
        &temp,
        "full.nupkg",
        &PackageBuilder::new().nuspec("Contoso.Full.nuspec", nuspec).build(),
    );

    let package = Package::open(&path).unwrap();
    let metadata = package.metadata();
    assert_eq!(metadata.title.as_deref(), Some("Contoso Full"));
    assert_eq!(metadata.authors, ["Alice", "Bob"]);
    assert!(metadata.require_license_acceptance);
    assert_eq!(metadata.dependency_groups.len(), 1);
    assert_eq!(metadata.dependency_groups[0].dependencies[0].id, "Contoso.Core");
    assert!(package.is_prerelease());
    assert_eq!(package.tags().as_deref(), Some(" json  parsing "));
}

#[test]
fn test_missing_manifest_is_malformed() {
    let temp = TempDir::new().unwrap();
    let path = write_package(
        &temp,
        "empty.nupkg",
        &PackageBuilder::new().add_file("lib/a.dll", b"MZ").build(),
    );

    let err = Package::open(&path).unwrap_err();
    assert!(matches!(err, PackageError::MalformedPackage(_)));
    assert!(err.is_construction_error());
}

#[test]
fn test_multiple_manifests_are_malformed() {
    let temp = TempDir::new().unwrap();
    let path = write_package(
        &temp,
        "two.nupkg",
        &PackageBuilder::new()
            .nuspec("A.nuspec", &minimal_nuspec("A", "1.0.0"))
            .nuspec("B.nuspec", &minimal_nuspec("B", "1.0.0"))
            .build(),
    );

    assert!(matches!(
        Package::open(&path),
        Err(PackageError::MalformedPackage(_))
    ));
}

#[test]
fn test_invalid_paths() {
    let temp = TempDir::new().unwrap();

    assert!(matches!(
        Package::open(""),
        Err(PackageError::InvalidInput { .. })
    ));
    assert!(matches!(
        Package::open(temp.path().join("missing.nupkg")),
        Err(PackageError::InvalidInput { .. })
    ));
    assert!(matches!(
        Package::open(temp.path()),
        Err(PackageError::InvalidInput { .. })
    ));
}

#[test]
fn test_files_exclude_infrastructure_in_any_case() {
    let temp = TempDir::new().unwrap();
    let path = write_package(
        &temp,
        "mixed.nupkg",
        &PackageBuilder::nupkg("Demo", "1.0.0")
            .add_file("_RELS/extra.rels", b"x")
            .add_file("Package/services/other.psmdcp", b"x")
            .add_file("[content_types].xml", b"x")
            .add_directory("lib/")
            .add_file("lib/net8.0/Demo.dll", b"MZ")
            .add_file("README.md", b"# Demo")
            .build(),
    );

    let mut package = Package::open(&path).unwrap();
    let files = package.files().unwrap();
    assert_eq!(paths(&files), ["lib/net8.0/Demo.dll", "README.md"]);
    assert_eq!(files[0].target_framework(), Some("net8.0"));
    assert_eq!(files[1].read_to_vec().unwrap(), b"# Demo");
}

#[test]
fn test_package_prefix_also_matches_file_names() {
    let temp = TempDir::new().unwrap();
    let path = write_package(
        &temp,
        "icon.nupkg",
        &PackageBuilder::nupkg("Demo", "1.0.0")
            .add_file("packageIcon.png", b"PNG")
            .add_file("images/packageIcon.png", b"PNG")
            .build(),
    );

    let mut package = Package::open(&path).unwrap();
    assert_eq!(paths(&package.files().unwrap()), ["images/packageIcon.png"]);
}

#[test]
fn test_custom_excluded_prefixes() {
    let temp = TempDir::new().unwrap();
    let path = write_package(
        &temp,
        "custom.nupkg",
        &PackageBuilder::nupkg("Demo", "1.0.0")
            .add_file("packageIcon.png", b"PNG")
            .build(),
    );
    let mut config = PackageConfig::default();
    config.excluded_prefixes = vec![
        "_rels/".to_string(),
        "package/".to_string(),
        "[Content_Types]".to_string(),
        ".signature".to_string(),
    ];

    let mut package = Package::open_with_config(&path, config).unwrap();
    assert_eq!(paths(&package.files().unwrap()), ["packageIcon.png"]);
}

#[test]
fn test_tags_round_trip() {
    let temp = TempDir::new().unwrap();
    let path = write_package(
        &temp,
        "tags.nupkg",
        &PackageBuilder::nupkg("Demo", "1.0.0").build(),
    );
    let mut package = Package::open(&path).unwrap();

    package.set_tags(Some("a b"));
    assert!(package.tags().unwrap().contains(" a b "));

    package.set_tags(Some("   "));
    assert_eq!(package.tags().as_deref(), Some("   "));

    package.set_tags(None);
    assert!(package.tags().is_none());
}

#[test]
fn test_signed_package_exposes_certificate() {
    let (cert, message) = signed_message_fixture("CN=Contoso Publisher,O=Contoso");
    let temp = TempDir::new().unwrap();
    let path = write_package(
        &temp,
        "signed.nupkg",
        &PackageBuilder::nupkg("Demo", "1.0.0")
            .signature(&message)
            .add_file("lib/net8.0/Demo.dll", b"MZ")
            .build(),
    );

    let mut package = Package::open(&path).unwrap();
    assert!(!package.is_signed());

    let files = package.files().unwrap();
    assert_eq!(paths(&files), ["lib/net8.0/Demo.dll"]);
    assert!(package.is_signed());
    assert_eq!(package.publisher_certificate(), Some(&cert));
    assert!(!package.is_verified());
    assert!(package.repository_certificate().is_none());
}

#[test]
fn test_corrupt_signature_is_tolerated() {
    let temp = TempDir::new().unwrap();
    let path = write_package(
        &temp,
        "corrupt.nupkg",
        &PackageBuilder::nupkg("Demo", "1.0.0")
            .signature(b"\x30\x82\xff\xff garbage")
            .add_file("content/a.txt", b"a")
            .build(),
    );

    let mut package = Package::open(&path).unwrap();
    let files = package.files().unwrap();
    assert_eq!(paths(&files), ["content/a.txt"]);
    assert!(package.is_signed());
    assert!(package.publisher_certificate().is_none());
}

#[test]
fn test_signature_without_signers_is_tolerated() {
    let temp = TempDir::new().unwrap();
    let path = write_package(
        &temp,
        "nosigners.nupkg",
        &PackageBuilder::nupkg("Demo", "1.0.0")
            .signature(&signed_message_without_signers("CN=Nobody"))
            .build(),
    );

    let mut package = Package::open(&path).unwrap();
    assert!(package.files().unwrap().is_empty());
    assert!(package.is_signed());
    assert!(package.publisher_certificate().is_none());
}

#[test]
fn test_repeated_enumeration_is_stable() {
    let temp = TempDir::new().unwrap();
    let path = write_package(
        &temp,
        "stable.nupkg",
        &PackageBuilder::nupkg("Demo", "1.0.0")
            .add_file("lib/net8.0/a.dll", b"a")
            .add_file("lib/net8.0/b.dll", b"bb")
            .add_file("content/c.txt", b"ccc")
            .build(),
    );

    let mut package = Package::open(&path).unwrap();
    let first = package.files().unwrap();
    let second = package.files().unwrap();
    assert_eq!(first, second);
    assert_eq!(package.tracked_resources().len(), 2);
}

#[test]
fn test_close_releases_all_resources() {
    let temp = TempDir::new().unwrap();
    let path = write_package(
        &temp,
        "close.nupkg",
        &PackageBuilder::nupkg("Demo", "1.0.0")
            .add_file("content/a.txt", b"a")
            .build(),
    );

    let mut package = Package::open(&path).unwrap();
    let files = package.files().unwrap();
    package.files().unwrap();
    assert!(package.tracked_resources().iter().all(|r| r.is_open()));

    assert_eq!(package.close(), 2);
    assert!(package.tracked_resources().iter().all(|r| !r.is_open()));
    assert!(matches!(files[0].read_to_vec(), Err(PackageError::Closed)));

    assert_eq!(package.close(), 0);
    assert!(matches!(package.files(), Err(PackageError::Closed)));
}

#[test]
fn test_size_and_timestamp_are_memoized() {
    let temp = TempDir::new().unwrap();
    let data = PackageBuilder::nupkg("Demo", "1.0.0").build();
    let path = write_package(&temp, "memo.nupkg", &data);

    let package = Package::open(&path).unwrap();
    let size = package.package_size().unwrap();
    let modified = package.last_updated().unwrap();
    assert_eq!(size, data.len() as u64);
    assert_eq!(modified, fs::metadata(&path).unwrap().modified().unwrap());

    let mut file = OpenOptions::new().append(true).open(&path).unwrap();
    file.write_all(b"trailing bytes").unwrap();
    drop(file);

    assert_eq!(package.package_size().unwrap(), size);
    assert_eq!(package.last_updated().unwrap(), modified);
}

#[test]
fn test_files_read_after_enumeration_call() {
    let temp = TempDir::new().unwrap();
    let path = write_package(
        &temp,
        "read.nupkg",
        &PackageBuilder::nupkg("Demo", "1.0.0")
            .add_file("content/one.txt", b"one")
            .add_file("content/two.txt", b"two")
            .build(),
    );

    let mut package = Package::open(&path).unwrap();
    let files = package.files().unwrap();
    let mut out = Vec::new();
    for file in &files {
        file.copy_to(&mut out).unwrap();
    }
    assert_eq!(out, b"onetwo");
}

#[cfg(unix)]
#[test]
fn test_read_only_package_opens() {
    use std::os::unix::fs::PermissionsExt;

    let temp = TempDir::new().unwrap();
    let path = write_package(
        &temp,
        "readonly.nupkg",
        &PackageBuilder::nupkg("Demo", "1.0.0")
            .add_file("content/a.txt", b"a")
            .build(),
    );
    fs::set_permissions(&path, fs::Permissions::from_mode(0o444)).unwrap();

    let mut package = Package::open(&path).unwrap();
    assert_eq!(package.files().unwrap().len(), 1);
    assert!(package.stream().is_ok());
}
