#![forbid(unsafe_code)]

//! `<ds:KeyInfo>` extraction: certificates and bare public keys carried
//! inline, as found in SAML holder-of-key subject confirmations.

use base64::Engine;
use wssec_core::{ns, Error};
use wssec_xml::document::{child_element, element_text, is_element};

use crate::key::PublicKey;
use crate::x509::X509Certificate;

/// Key material found directly inside a `<ds:KeyInfo>`.
#[derive(Debug, Clone, Default)]
pub struct KeyInfoMaterial {
    /// Certificates from `<ds:X509Data>`, end entity first.
    pub certificates: Vec<X509Certificate>,
    /// Public key from `<ds:KeyValue>`, or from the leading certificate.
    pub public_key: Option<PublicKey>,
}

impl KeyInfoMaterial {
    pub fn is_empty(&self) -> bool {
        self.certificates.is_empty() && self.public_key.is_none()
    }
}

/// Read the certificates and public key a `<ds:KeyInfo>` element carries.
///
/// Malformed certificate or key encodings are errors; a KeyInfo holding only
/// elements this function does not understand yields an empty result.
pub fn extract_key_info(key_info: roxmltree::Node<'_, '_>) -> Result<KeyInfoMaterial, Error> {
    let mut material = KeyInfoMaterial::default();

    for child in key_info.children().filter(|n| n.is_element()) {
        if is_element(child, ns::DSIG, ns::node::X509_DATA) {
            material.certificates.extend(extract_x509_certificates(child)?);
        } else if is_element(child, ns::DSIG, ns::node::KEY_VALUE) && material.public_key.is_none() {
            material.public_key = Some(parse_key_value(child)?);
        }
    }

    if material.public_key.is_none() {
        if let Some(leaf) = material.certificates.first() {
            material.public_key = Some(leaf.public_key()?);
        }
    }
    Ok(material)
}

/// Decode a base64 element body, ignoring embedded whitespace.
pub fn decode_base64_text(text: &str, what: &str) -> Result<Vec<u8>, Error> {
    let clean: String = text.chars().filter(|c| !c.is_whitespace()).collect();
    if clean.is_empty() {
        return Err(Error::Base64(format!("{what}: empty value")));
    }
    base64::engine::general_purpose::STANDARD
        .decode(clean)
        .map_err(|e| Error::Base64(format!("{what}: {e}")))
}

/// All `<ds:X509Certificate>` children, reordered so the end-entity
/// certificate comes first. The remaining certificates keep document order.
fn extract_x509_certificates(x509_data: roxmltree::Node<'_, '_>) -> Result<Vec<X509Certificate>, Error> {
    let mut certs = Vec::new();
    for child in x509_data.children() {
        if is_element(child, ns::DSIG, ns::node::X509_CERTIFICATE) {
            let der = decode_base64_text(element_text(child), "X509Certificate")?;
            certs.push(X509Certificate::from_der(&der)?);
        }
    }
    if certs.len() > 1 {
        let leaf = find_leaf_cert(&certs);
        let cert = certs.remove(leaf);
        certs.insert(0, cert);
    }
    Ok(certs)
}

/// Index of the end-entity certificate: prefer a non-CA certificate whose
/// subject issues none of the others, then any certificate that issues
/// none of the others, then the last one.
fn find_leaf_cert(certs: &[X509Certificate]) -> usize {
    let issues_another = |i: usize| {
        let subject = certs[i].subject_name();
        certs
            .iter()
            .enumerate()
            .any(|(j, c)| i != j && c.issuer_name() == subject)
    };

    let not_issuers: Vec<usize> = (0..certs.len()).filter(|&i| !issues_another(i)).collect();
    if let Some(&i) = not_issuers.iter().find(|&&i| !certs[i].is_ca()) {
        return i;
    }
    not_issuers
        .first()
        .copied()
        .unwrap_or(certs.len().saturating_sub(1))
}

/// Parse `<ds:KeyValue>` holding an `<ds:RSAKeyValue>` or `<dsig11:ECKeyValue>`.
fn parse_key_value(key_value: roxmltree::Node<'_, '_>) -> Result<PublicKey, Error> {
    if let Some(rsa_kv) = child_element(key_value, ns::DSIG, ns::node::RSA_KEY_VALUE) {
        return parse_rsa_key_value(rsa_kv);
    }
    let ec_kv = child_element(key_value, ns::DSIG11, ns::node::EC_KEY_VALUE)
        .or_else(|| child_element(key_value, ns::DSIG, ns::node::EC_KEY_VALUE));
    match ec_kv {
        Some(ec_kv) => parse_ec_key_value(ec_kv),
        None => Err(Error::Key("KeyValue holds no supported key".into())),
    }
}

fn parse_rsa_key_value(rsa_kv: roxmltree::Node<'_, '_>) -> Result<PublicKey, Error> {
    let field = |name: &str| -> Result<Vec<u8>, Error> {
        let node = child_element(rsa_kv, ns::DSIG, name)
            .ok_or_else(|| Error::XmlStructure(format!("RSAKeyValue is missing {name}")))?;
        decode_base64_text(element_text(node), name)
    };
    let n = rsa::BigUint::from_bytes_be(&field(ns::node::RSA_MODULUS)?);
    let e = rsa::BigUint::from_bytes_be(&field(ns::node::RSA_EXPONENT)?);
    let public = rsa::RsaPublicKey::new(n, e)
        .map_err(|err| Error::Key(format!("invalid RSA public key: {err}")))?;
    Ok(PublicKey::Rsa(public))
}

fn parse_ec_key_value(ec_kv: roxmltree::Node<'_, '_>) -> Result<PublicKey, Error> {
    let curve_uri = ec_kv
        .children()
        .find(|n| n.is_element() && n.tag_name().name() == ns::node::NAMED_CURVE)
        .and_then(|n| n.attribute(ns::attr::URI))
        .ok_or_else(|| Error::XmlStructure("ECKeyValue is missing NamedCurve URI".into()))?;
    let point = ec_kv
        .children()
        .find(|n| n.is_element() && n.tag_name().name() == ns::node::PUBLIC_KEY)
        .map(element_text)
        .ok_or_else(|| Error::XmlStructure("ECKeyValue is missing PublicKey".into()))?;
    let point = decode_base64_text(point, "EC PublicKey")?;

    match curve_uri {
        "urn:oid:1.2.840.10045.3.1.7" => p256::ecdsa::VerifyingKey::from_sec1_bytes(&point)
            .map(PublicKey::EcP256)
            .map_err(|e| Error::Key(format!("invalid P-256 point: {e}"))),
        "urn:oid:1.3.132.0.34" => p384::ecdsa::VerifyingKey::from_sec1_bytes(&point)
            .map(PublicKey::EcP384)
            .map_err(|e| Error::Key(format!("invalid P-384 point: {e}"))),
        other => Err(Error::Key(format!("unsupported EC curve: {other}"))),
    }
}
