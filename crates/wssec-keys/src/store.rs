#![forbid(unsafe_code)]

//! Credential store: turns certificate bytes, issuer/serial pairs and key
//! identifiers into certificates.

use std::path::Path;

use wssec_core::Error;

use crate::x509::X509Certificate;

/// How the bytes of a binary security token encode certificates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CertificateEncoding {
    /// One DER certificate (`#X509v3`).
    SingleCertificate,
    /// A DER `PkiPath` (`#X509PKIPathv1`).
    PkiPath,
}

/// Key identifier kinds that name a certificate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CertificateIdentifier {
    /// The identifier value is the whole DER certificate.
    X509V3,
    SubjectKeyIdentifier,
    ThumbprintSha1,
}

/// Read-only source of certificates, shared across documents.
pub trait CredentialStore: Send + Sync {
    /// Decode the certificates carried by a token. The returned chain is
    /// ordered end entity first.
    fn certificates_from_token(
        &self,
        encoding: CertificateEncoding,
        der: &[u8],
    ) -> Result<Vec<X509Certificate>, Error> {
        match encoding {
            CertificateEncoding::SingleCertificate => Ok(vec![X509Certificate::from_der(der)?]),
            CertificateEncoding::PkiPath => X509Certificate::from_pki_path(der),
        }
    }

    /// Find the certificate with the given issuer DN and decimal serial number.
    fn certificate_by_issuer_serial(
        &self,
        issuer: &str,
        serial: &str,
    ) -> Result<Option<X509Certificate>, Error>;

    /// Find the certificate a key identifier value names.
    fn certificate_by_key_identifier(
        &self,
        kind: CertificateIdentifier,
        value: &[u8],
    ) -> Result<Option<X509Certificate>, Error>;
}

/// In-memory certificate store.
#[derive(Debug, Default, Clone)]
pub struct CertificateStore {
    certs: Vec<X509Certificate>,
}

impl CertificateStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, cert: X509Certificate) {
        if !self.certs.contains(&cert) {
            self.certs.push(cert);
        }
    }

    /// Parse and add a PEM or DER certificate.
    pub fn add_pem_or_der(&mut self, data: &[u8]) -> Result<(), Error> {
        self.add(X509Certificate::from_pem_or_der(data)?);
        Ok(())
    }

    /// Load a PEM or DER certificate file.
    pub fn load_file(&mut self, path: impl AsRef<Path>) -> Result<(), Error> {
        let data = std::fs::read(path)?;
        self.add_pem_or_der(&data)
    }

    pub fn len(&self) -> usize {
        self.certs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.certs.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &X509Certificate> {
        self.certs.iter()
    }
}

impl CredentialStore for CertificateStore {
    fn certificate_by_issuer_serial(
        &self,
        issuer: &str,
        serial: &str,
    ) -> Result<Option<X509Certificate>, Error> {
        Ok(self
            .certs
            .iter()
            .find(|c| c.matches_issuer_serial(issuer, serial))
            .cloned())
    }

    fn certificate_by_key_identifier(
        &self,
        kind: CertificateIdentifier,
        value: &[u8],
    ) -> Result<Option<X509Certificate>, Error> {
        let found = match kind {
            // the identifier carries the certificate itself
            CertificateIdentifier::X509V3 => return X509Certificate::from_der(value).map(Some),
            CertificateIdentifier::SubjectKeyIdentifier => self
                .certs
                .iter()
                .find(|c| c.subject_key_identifier() == value),
            CertificateIdentifier::ThumbprintSha1 => self
                .certs
                .iter()
                .find(|c| c.thumbprint_sha1().as_slice() == value),
        };
        Ok(found.cloned())
    }
}
