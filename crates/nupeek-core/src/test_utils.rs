//! Test utilities for package fixtures.
//!
//! This module provides helpers for building in-memory `.nupkg` archives and
//! CMS signature messages, reducing duplication across unit and integration
//! tests.
//!
//! # Panics
//!
//! All functions in this module may panic on encoding errors since they are
//! designed for test use only where panics are acceptable.

#![allow(clippy::unwrap_used, clippy::missing_panics_doc)]

use std::io::Cursor;
use std::io::Write;
use std::str::FromStr;
use std::time::Duration;

use cms::cert::CertificateChoices;
use cms::cert::IssuerAndSerialNumber;
use cms::content_info::CmsVersion;
use cms::content_info::ContentInfo;
use cms::signed_data::CertificateSet;
use cms::signed_data::EncapsulatedContentInfo;
use cms::signed_data::SignedData;
use cms::signed_data::SignerIdentifier;
use cms::signed_data::SignerInfo;
use cms::signed_data::SignerInfos;
use der::Any;
use der::Decode;
use der::Encode;
use der::asn1::BitString;
use der::asn1::OctetString;
use der::asn1::SetOfVec;
use der::oid::ObjectIdentifier;
use x509_cert::Certificate;
use x509_cert::TbsCertificate;
use x509_cert::Version;
use x509_cert::ext::Extension;
use x509_cert::ext::pkix::SubjectKeyIdentifier;
use x509_cert::name::Name;
use x509_cert::serial_number::SerialNumber;
use x509_cert::spki::AlgorithmIdentifierOwned;
use x509_cert::spki::SubjectPublicKeyInfoOwned;
use x509_cert::time::Validity;
use zip::write::SimpleFileOptions;
use zip::write::ZipWriter;

use crate::signature::ID_SIGNED_DATA;

const ID_DATA: ObjectIdentifier = ObjectIdentifier::new_unwrap("1.2.840.113549.1.7.1");
const ID_SHA_256: ObjectIdentifier = ObjectIdentifier::new_unwrap("2.16.840.1.101.3.4.2.1");
const RSA_ENCRYPTION: ObjectIdentifier = ObjectIdentifier::new_unwrap("1.2.840.113549.1.1.1");
const SHA_256_WITH_RSA: ObjectIdentifier = ObjectIdentifier::new_unwrap("1.2.840.113549.1.1.11");
const ID_CE_SUBJECT_KEY_IDENTIFIER: ObjectIdentifier =
    ObjectIdentifier::new_unwrap("2.5.29.14");

/// Default signature entry name used by NuGet.
pub const SIGNATURE_ENTRY: &str = ".signature.p7s";

/// Returns a nuspec document with only the required fields.
///
/// # Examples
///
/// ```
/// use nupeek_core::test_utils::minimal_nuspec;
///
/// let xml = minimal_nuspec("Demo", "1.0.0");
/// assert!(xml.contains("<id>Demo</id>"));
/// ```
#[must_use]
pub fn minimal_nuspec(id: &str, version: &str) -> String {
    format!(
        r#"<?xml version="1.0" encoding="utf-8"?>
<package xmlns="http://schemas.microsoft.com/packaging/2013/05/nuspec.xsd">
  <metadata>
    <id>{id}</id>
    <version>{version}</version>
    <authors>Test Author</authors>
    <description>Test package.</description>
  </metadata>
</package>"#
    )
}

/// Builder for creating package archives.
///
/// # Examples
///
/// ```
/// use nupeek_core::test_utils::PackageBuilder;
///
/// let data = PackageBuilder::nupkg("Demo", "1.0.0")
///     .add_file("lib/net8.0/Demo.dll", b"MZ")
///     .add_directory("content/")
///     .build();
/// ```
pub struct PackageBuilder {
    zip: ZipWriter<Cursor<Vec<u8>>>,
}

impl PackageBuilder {
    /// Creates an empty archive builder.
    #[must_use]
    pub fn new() -> Self {
        Self {
            zip: ZipWriter::new(Cursor::new(Vec::new())),
        }
    }

    /// Creates a builder with the layout `nuget pack` produces: relationship
    /// and content-type parts, core properties, and a minimal manifest.
    #[must_use]
    pub fn nupkg(id: &str, version: &str) -> Self {
        Self::new()
            .add_file("_rels/.rels", b"<Relationships />")
            .nuspec(&format!("{id}.nuspec"), &minimal_nuspec(id, version))
            .add_file(
                "package/services/metadata/core-properties/0123456789abcdef.psmdcp",
                b"<coreProperties />",
            )
            .add_file("[Content_Types].xml", b"<Types />")
    }

    /// Adds a manifest entry, deflate-compressed.
    #[must_use]
    pub fn nuspec(mut self, path: &str, xml: &str) -> Self {
        let options =
            SimpleFileOptions::default().compression_method(zip::CompressionMethod::Deflated);

        self.zip.start_file(path, options).unwrap();
        self.zip.write_all(xml.as_bytes()).unwrap();
        self
    }

    /// Adds a regular file, stored uncompressed.
    #[must_use]
    pub fn add_file(mut self, path: &str, data: &[u8]) -> Self {
        let options = SimpleFileOptions::default()
            .compression_method(zip::CompressionMethod::Stored)
            .unix_permissions(0o644);

        self.zip.start_file(path, options).unwrap();
        self.zip.write_all(data).unwrap();
        self
    }

    /// Adds a directory marker.
    #[must_use]
    pub fn add_directory(mut self, path: &str) -> Self {
        let options = SimpleFileOptions::default().unix_permissions(0o755);
        self.zip.add_directory(path, options).unwrap();
        self
    }

    /// Adds a `.signature.p7s` entry with the given bytes.
    #[must_use]
    pub fn signature(self, data: &[u8]) -> Self {
        self.add_file(SIGNATURE_ENTRY, data)
    }

    /// Builds and returns the archive bytes.
    #[must_use]
    pub fn build(self) -> Vec<u8> {
        self.zip.finish().unwrap().into_inner()
    }
}

impl Default for PackageBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Creates a self-issued certificate for `subject` (e.g. `CN=Contoso`).
///
/// The key and signature bytes are placeholders; the certificate only needs
/// to encode and decode.
#[must_use]
pub fn test_certificate(subject: &str, key_id: Option<&[u8]>) -> Certificate {
    let name = Name::from_str(subject).unwrap();
    let algorithm = AlgorithmIdentifierOwned {
        oid: SHA_256_WITH_RSA,
        parameters: None,
    };

    let extensions = key_id.map(|id| {
        let value = SubjectKeyIdentifier(OctetString::new(id).unwrap())
            .to_der()
            .unwrap();
        vec![Extension {
            extn_id: ID_CE_SUBJECT_KEY_IDENTIFIER,
            critical: false,
            extn_value: OctetString::new(value).unwrap(),
        }]
    });

    let tbs_certificate = TbsCertificate {
        version: Version::V3,
        serial_number: SerialNumber::new(&[0x01, 0x23, 0x45]).unwrap(),
        signature: algorithm.clone(),
        issuer: name.clone(),
        validity: Validity::from_now(Duration::from_secs(3600)).unwrap(),
        subject: name,
        subject_public_key_info: SubjectPublicKeyInfoOwned {
            algorithm: AlgorithmIdentifierOwned {
                oid: RSA_ENCRYPTION,
                parameters: None,
            },
            subject_public_key: BitString::from_bytes(&[0x5a; 16]).unwrap(),
        },
        issuer_unique_id: None,
        subject_unique_id: None,
        extensions,
    };

    Certificate {
        tbs_certificate,
        signature_algorithm: algorithm,
        signature: BitString::from_bytes(&[0xa5; 32]).unwrap(),
    }
}

/// Returns a certificate and a DER `SignedData` message whose single signer
/// refers to it by issuer and serial number.
///
/// # Examples
///
/// ```
/// use nupeek_core::test_utils::signed_message_fixture;
///
/// let (cert, message) = signed_message_fixture("CN=Contoso");
/// assert!(!message.is_empty());
/// ```
#[must_use]
pub fn signed_message_fixture(subject: &str) -> (Certificate, Vec<u8>) {
    let cert = test_certificate(subject, None);
    let sid = SignerIdentifier::IssuerAndSerialNumber(IssuerAndSerialNumber {
        issuer: cert.tbs_certificate.issuer.clone(),
        serial_number: cert.tbs_certificate.serial_number.clone(),
    });
    let message = build_signed_message(&cert, Some(sid));
    (cert, message)
}

/// Like [`signed_message_fixture`], but the signer refers to the
/// certificate by subject key identifier.
#[must_use]
pub fn signed_message_fixture_with_key_id(subject: &str, key_id: &[u8]) -> (Certificate, Vec<u8>) {
    let cert = test_certificate(subject, Some(key_id));
    let sid = SignerIdentifier::SubjectKeyIdentifier(SubjectKeyIdentifier(
        OctetString::new(key_id).unwrap(),
    ));
    let message = build_signed_message(&cert, Some(sid));
    (cert, message)
}

/// Returns a well-formed `SignedData` message with a certificate but no
/// signer records.
#[must_use]
pub fn signed_message_without_signers(subject: &str) -> Vec<u8> {
    build_signed_message(&test_certificate(subject, None), None)
}

fn build_signed_message(cert: &Certificate, sid: Option<SignerIdentifier>) -> Vec<u8> {
    let digest_alg = AlgorithmIdentifierOwned {
        oid: ID_SHA_256,
        parameters: None,
    };

    let signers: Vec<SignerInfo> = sid
        .into_iter()
        .map(|sid| SignerInfo {
            version: match sid {
                SignerIdentifier::IssuerAndSerialNumber(_) => CmsVersion::V1,
                SignerIdentifier::SubjectKeyIdentifier(_) => CmsVersion::V3,
            },
            sid,
            digest_alg: digest_alg.clone(),
            signed_attrs: None,
            signature_algorithm: AlgorithmIdentifierOwned {
                oid: RSA_ENCRYPTION,
                parameters: None,
            },
            signature: OctetString::new(vec![0x42; 32]).unwrap(),
            unsigned_attrs: None,
        })
        .collect();

    let signed_data = SignedData {
        version: CmsVersion::V1,
        digest_algorithms: SetOfVec::try_from(vec![digest_alg]).unwrap(),
        encap_content_info: EncapsulatedContentInfo {
            econtent_type: ID_DATA,
            econtent: None,
        },
        certificates: Some(CertificateSet(
            SetOfVec::try_from(vec![CertificateChoices::Certificate(cert.clone())]).unwrap(),
        )),
        crls: None,
        signer_infos: SignerInfos(SetOfVec::try_from(signers).unwrap()),
    };

    let content_info = ContentInfo {
        content_type: ID_SIGNED_DATA,
        content: Any::from_der(&signed_data.to_der().unwrap()).unwrap(),
    };
    content_info.to_der().unwrap()
}
