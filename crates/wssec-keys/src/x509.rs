#![forbid(unsafe_code)]

//! X.509 certificates as they travel through token resolution.
//!
//! Certificates are parsed to check their encoding and to expose the fields
//! references are matched against (issuer, serial number, subject key
//! identifier, thumbprint). Trust is not evaluated here.

use der::{Decode, DecodePem, Encode};
use wssec_core::Error;
use wssec_crypto::digest;

use crate::key::PublicKey;

/// SubjectKeyIdentifier extension OID.
const SKI_OID: der::oid::ObjectIdentifier = der::oid::ObjectIdentifier::new_unwrap("2.5.29.14");
/// BasicConstraints extension OID.
const BASIC_CONSTRAINTS_OID: der::oid::ObjectIdentifier =
    der::oid::ObjectIdentifier::new_unwrap("2.5.29.19");

/// A parsed X.509 certificate together with its DER encoding.
#[derive(Clone)]
pub struct X509Certificate {
    cert: x509_cert::Certificate,
    der: Vec<u8>,
}

impl X509Certificate {
    /// Parse a DER-encoded certificate.
    pub fn from_der(der: &[u8]) -> Result<Self, Error> {
        let cert = x509_cert::Certificate::from_der(der)
            .map_err(|e| Error::Certificate(format!("failed to parse X.509 certificate: {e}")))?;
        Ok(Self {
            cert,
            der: der.to_vec(),
        })
    }

    /// Parse a PEM or DER certificate, detected by the PEM armour.
    pub fn from_pem_or_der(data: &[u8]) -> Result<Self, Error> {
        if data.starts_with(b"-----BEGIN") {
            let cert = x509_cert::Certificate::from_pem(data)
                .map_err(|e| Error::Certificate(format!("failed to parse PEM certificate: {e}")))?;
            let der = cert
                .to_der()
                .map_err(|e| Error::Certificate(format!("failed to encode certificate: {e}")))?;
            Ok(Self { cert, der })
        } else {
            Self::from_der(data)
        }
    }

    /// Decode a DER `PkiPath` (a SEQUENCE OF Certificate ordered from the
    /// trust anchor towards the end entity). The result is ordered end
    /// entity first.
    pub fn from_pki_path(der: &[u8]) -> Result<Vec<Self>, Error> {
        let certs = Vec::<x509_cert::Certificate>::from_der(der)
            .map_err(|e| Error::Certificate(format!("failed to parse PkiPath: {e}")))?;
        if certs.is_empty() {
            return Err(Error::Certificate("PkiPath contains no certificates".into()));
        }
        certs
            .into_iter()
            .rev()
            .map(|cert| {
                let der = cert
                    .to_der()
                    .map_err(|e| Error::Certificate(format!("failed to encode certificate: {e}")))?;
                Ok(Self { cert, der })
            })
            .collect()
    }

    /// The raw DER bytes.
    pub fn der(&self) -> &[u8] {
        &self.der
    }

    /// The parsed certificate.
    pub fn certificate(&self) -> &x509_cert::Certificate {
        &self.cert
    }

    /// Subject distinguished name in RFC 4514 form.
    pub fn subject_name(&self) -> String {
        self.cert.tbs_certificate.subject.to_string()
    }

    /// Issuer distinguished name in RFC 4514 form.
    pub fn issuer_name(&self) -> String {
        self.cert.tbs_certificate.issuer.to_string()
    }

    /// Serial number as an unsigned decimal string, the form used by
    /// `<ds:X509SerialNumber>`.
    pub fn serial_number(&self) -> String {
        format_serial_decimal(self.cert.tbs_certificate.serial_number.as_bytes())
    }

    /// SHA-1 over the DER encoding (`ThumbprintSHA1`).
    pub fn thumbprint_sha1(&self) -> [u8; 20] {
        digest::sha1(&self.der)
    }

    /// The SubjectKeyIdentifier extension value, or, when the extension is
    /// absent, the SHA-1 of the subject public key bits (RFC 5280 4.2.1.2
    /// method 1).
    pub fn subject_key_identifier(&self) -> Vec<u8> {
        if let Some(exts) = &self.cert.tbs_certificate.extensions {
            for ext in exts.iter().filter(|e| e.extn_id == SKI_OID) {
                if let Ok(ski) =
                    x509_cert::ext::pkix::SubjectKeyIdentifier::from_der(ext.extn_value.as_bytes())
                {
                    return ski.0.as_bytes().to_vec();
                }
            }
        }
        let key_bits = self
            .cert
            .tbs_certificate
            .subject_public_key_info
            .subject_public_key
            .raw_bytes();
        digest::sha1(key_bits).to_vec()
    }

    /// Check if this certificate is a CA (has BasicConstraints with cA=true).
    pub fn is_ca(&self) -> bool {
        if let Some(exts) = &self.cert.tbs_certificate.extensions {
            for ext in exts.iter().filter(|e| e.extn_id == BASIC_CONSTRAINTS_OID) {
                if let Ok(bc) =
                    x509_cert::ext::pkix::BasicConstraints::from_der(ext.extn_value.as_bytes())
                {
                    return bc.ca;
                }
            }
        }
        false
    }

    /// The subject public key.
    pub fn public_key(&self) -> Result<PublicKey, Error> {
        let spki_der = self
            .cert
            .tbs_certificate
            .subject_public_key_info
            .to_der()
            .map_err(|e| Error::Key(format!("failed to encode SPKI: {e}")))?;
        PublicKey::from_spki_der(&spki_der)
    }

    /// True if this certificate was issued by `issuer` (a DN string as found
    /// in `<ds:X509IssuerName>`) with the decimal serial number `serial`.
    pub fn matches_issuer_serial(&self, issuer: &str, serial: &str) -> bool {
        normalize_serial(serial) == self.serial_number()
            && normalize_dn(issuer) == normalize_dn(&self.issuer_name())
    }
}

impl PartialEq for X509Certificate {
    fn eq(&self, other: &Self) -> bool {
        self.der == other.der
    }
}

impl Eq for X509Certificate {}

impl std::fmt::Debug for X509Certificate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("X509Certificate")
            .field("subject", &self.subject_name())
            .field("issuer", &self.issuer_name())
            .field("serial", &self.serial_number())
            .finish()
    }
}

/// Convert a big-endian ASN.1 INTEGER to an unsigned decimal string.
fn format_serial_decimal(bytes: &[u8]) -> String {
    // little-endian base-10 digits
    let mut digits: Vec<u8> = vec![0];
    for &byte in bytes {
        let mut carry = byte as u32;
        for d in digits.iter_mut() {
            let v = (*d as u32) * 256 + carry;
            *d = (v % 10) as u8;
            carry = v / 10;
        }
        while carry > 0 {
            digits.push((carry % 10) as u8);
            carry /= 10;
        }
    }
    while digits.len() > 1 && digits.last() == Some(&0) {
        digits.pop();
    }
    digits.iter().rev().map(|d| (b'0' + d) as char).collect()
}

fn normalize_serial(serial: &str) -> String {
    let trimmed = serial.trim().trim_start_matches('0');
    if trimmed.is_empty() {
        "0".to_string()
    } else {
        trimmed.to_string()
    }
}

/// Normalize a distinguished name for comparison: split into RDNs on
/// unescaped commas, upper-case attribute types, trim and lower-case values.
fn normalize_dn(dn: &str) -> Vec<(String, String)> {
    let mut rdns = Vec::new();
    let mut current = String::new();
    let mut escaped = false;
    for c in dn.chars() {
        if escaped {
            current.push(c);
            escaped = false;
        } else if c == '\\' {
            current.push(c);
            escaped = true;
        } else if c == ',' || c == ';' {
            rdns.push(std::mem::take(&mut current));
        } else {
            current.push(c);
        }
    }
    if !current.trim().is_empty() {
        rdns.push(current);
    }

    rdns.iter()
        .map(|rdn| match rdn.split_once('=') {
            Some((t, v)) => (
                canonical_attr_type(t.trim()),
                v.trim().to_lowercase(),
            ),
            None => (String::new(), rdn.trim().to_lowercase()),
        })
        .collect()
}

fn canonical_attr_type(t: &str) -> String {
    match t.to_ascii_uppercase().as_str() {
        "S" | "ST" | "2.5.4.8" => "ST".into(),
        "E" | "EMAILADDRESS" | "1.2.840.113549.1.9.1" => "EMAILADDRESS".into(),
        "CN" | "2.5.4.3" => "CN".into(),
        "O" | "2.5.4.10" => "O".into(),
        "OU" | "2.5.4.11" => "OU".into(),
        "C" | "2.5.4.6" => "C".into(),
        "L" | "2.5.4.7" => "L".into(),
        other => other.to_string(),
    }
}
