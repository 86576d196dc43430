//! Package signature detection and publisher certificate extraction.
//!
//! A signed package carries a CMS `SignedData` message in its signature
//! entry. Only the signer certificate is extracted; the signature itself and
//! the certificate chain are not validated.

use cms::cert::CertificateChoices;
use cms::content_info::ContentInfo;
use cms::signed_data::SignedData;
use cms::signed_data::SignerIdentifier;
use der::Decode;
use der::Encode;
use der::oid::ObjectIdentifier;
use tracing::debug;
use tracing::warn;
use x509_cert::Certificate;
use x509_cert::ext::pkix::SubjectKeyIdentifier;

use crate::PackageError;
use crate::Result;

/// `id-signedData` content type (RFC 5652).
pub const ID_SIGNED_DATA: ObjectIdentifier = ObjectIdentifier::new_unwrap("1.2.840.113549.1.7.2");

/// `id-ce-subjectKeyIdentifier` extension (RFC 5280).
const ID_CE_SUBJECT_KEY_IDENTIFIER: ObjectIdentifier = ObjectIdentifier::new_unwrap("2.5.29.14");

/// Extracts the first signer's certificate from a DER-encoded CMS message.
///
/// # Errors
///
/// Returns [`PackageError::SignatureDecode`] if the bytes are not a
/// `SignedData` content info, the message has no signer records, or the
/// first signer's certificate is not embedded in the message.
pub fn extract_publisher_certificate(bytes: &[u8]) -> Result<Certificate> {
    let content_info = ContentInfo::from_der(bytes)
        .map_err(|e| PackageError::SignatureDecode(format!("invalid content info: {e}")))?;

    if content_info.content_type != ID_SIGNED_DATA {
        return Err(PackageError::SignatureDecode(format!(
            "unexpected content type {}",
            content_info.content_type
        )));
    }

    let signed_data = content_info
        .content
        .to_der()
        .and_then(|der| SignedData::from_der(&der))
        .map_err(|e| PackageError::SignatureDecode(format!("invalid signed data: {e}")))?;

    let signer = signed_data.signer_infos.0.iter().next().ok_or_else(|| {
        PackageError::SignatureDecode("signature has no signer records".to_string())
    })?;

    let certificate = signed_data
        .certificates
        .iter()
        .flat_map(|set| set.0.iter())
        .filter_map(|choice| match choice {
            CertificateChoices::Certificate(cert) => Some(cert),
            _ => None,
        })
        .find(|cert| signer_matches(&signer.sid, cert))
        .ok_or_else(|| {
            PackageError::SignatureDecode("signer certificate is not embedded".to_string())
        })?;

    debug!(subject = %certificate.tbs_certificate.subject, "extracted publisher certificate");
    Ok(certificate.clone())
}

fn signer_matches(sid: &SignerIdentifier, cert: &Certificate) -> bool {
    match sid {
        SignerIdentifier::IssuerAndSerialNumber(id) => {
            cert.tbs_certificate.issuer == id.issuer
                && cert.tbs_certificate.serial_number == id.serial_number
        }
        SignerIdentifier::SubjectKeyIdentifier(key_id) => {
            subject_key_identifier(cert).is_some_and(|id| &id == key_id)
        }
    }
}

fn subject_key_identifier(cert: &Certificate) -> Option<SubjectKeyIdentifier> {
    cert.tbs_certificate
        .extensions
        .as_ref()?
        .iter()
        .find(|ext| ext.extn_id == ID_CE_SUBJECT_KEY_IDENTIFIER)
        .and_then(|ext| SubjectKeyIdentifier::from_der(ext.extn_value.as_bytes()).ok())
}

/// Signature state discovered by file enumeration.
///
/// `is_signed` and the certificate are independent: a package whose
/// signature entry cannot be decoded is still reported as signed, with no
/// certificate.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SignatureInfo {
    signed: bool,
    certificate: Option<Certificate>,
}

impl SignatureInfo {
    /// Creates an unsigned state.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `true` once a signature entry has been seen.
    #[must_use]
    pub fn is_signed(&self) -> bool {
        self.signed
    }

    /// Returns the publisher certificate, if one was extracted.
    #[must_use]
    pub fn certificate(&self) -> Option<&Certificate> {
        self.certificate.as_ref()
    }

    /// Returns the publisher certificate subject as an RFC 4514 string.
    #[must_use]
    pub fn publisher_subject(&self) -> Option<String> {
        self.certificate
            .as_ref()
            .map(|cert| cert.tbs_certificate.subject.to_string())
    }

    /// Marks the package as signed without attempting extraction.
    pub(crate) fn mark_signed(&mut self) {
        self.signed = true;
    }

    /// Marks the package as signed and extracts the certificate from
    /// `bytes`. Extraction failures are logged and leave the certificate
    /// unchanged.
    pub(crate) fn record(&mut self, entry: &str, bytes: &[u8]) {
        self.signed = true;
        match extract_publisher_certificate(bytes) {
            Ok(cert) => self.certificate = Some(cert),
            Err(e) => warn!(entry, error = %e, "package signature could not be decoded"),
        }
    }
}
