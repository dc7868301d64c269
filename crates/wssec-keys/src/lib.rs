#![forbid(unsafe_code)]

//! Certificates and keys for wssec.
//!
//! Provides the parsed `X509Certificate`, public keys, `<ds:KeyInfo>`
//! extraction and the `CredentialStore` used to resolve certificate
//! references.

pub mod key;
pub mod keyinfo;
pub mod store;
pub mod x509;

pub use key::PublicKey;
pub use keyinfo::{extract_key_info, KeyInfoMaterial};
pub use store::{CertificateEncoding, CertificateIdentifier, CertificateStore, CredentialStore};
pub use x509::X509Certificate;
