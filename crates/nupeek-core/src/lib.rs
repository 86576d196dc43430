//! Lazy inspection of zip-based NuGet packages.
//!
//! `nupeek-core` opens a `.nupkg` container, reads its nuspec manifest into
//! an owned [`Metadata`] record, lists the package content files while
//! skipping OPC infrastructure entries, and extracts the publisher
//! certificate from an embedded package signature.
//!
//! The backing file is never held open between calls: every operation that
//! needs archive bytes reopens it, and readers that must outlive a call are
//! tracked and released together when the package is closed or dropped.
//!
//! # Examples
//!
//! ```no_run
//! use nupeek_core::Package;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let mut package = Package::open("Newtonsoft.Json.13.0.3.nupkg")?;
//! println!("{}", package.full_name());
//!
//! for file in package.files()? {
//!     println!("{} ({} bytes)", file.path(), file.size());
//! }
//!
//! if package.is_signed() {
//!     println!("signed, certificate: {}", package.publisher_certificate().is_some());
//! }
//! # Ok(())
//! # }
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod config;
pub mod error;
pub mod files;
pub mod manifest;
pub mod metadata;
pub mod package;
pub mod resources;
pub mod signature;
pub mod source;
#[cfg(any(test, feature = "test-utils"))]
#[doc(hidden)]
pub mod test_utils;

// Re-export main API types
pub use config::PackageConfig;
pub use error::PackageError;
pub use error::Result;
pub use files::PackageFile;
pub use manifest::ManifestReader;
pub use manifest::NuspecReader;
pub use metadata::Metadata;
pub use metadata::PackageVersion;
pub use package::Package;
pub use resources::ResourceTracker;
pub use resources::TrackedArchive;
pub use signature::SignatureInfo;
pub use source::PackageSource;

// Certificates are handed out as-is from the signature decoder.
pub use x509_cert::Certificate;
