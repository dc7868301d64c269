#![forbid(unsafe_code)]

//! Parsers for the security-header tokens references point at, and the
//! processing steps that turn them into [`crate::PriorResult`]s.

use wssec_core::{algorithm, ns, Error};
use wssec_crypto::kdf::{self, DerivationAlgorithm, DerivationSpec};
use wssec_keys::keyinfo::decode_base64_text;
use wssec_keys::{CertificateEncoding, CredentialStore, X509Certificate};
use wssec_xml::document::{child_element, element_text, is_element, wsu_id};
use zeroize::Zeroizing;

use crate::callback::SecretUsage;
use crate::context::ResolveContext;
use crate::credential::DerivedKeyPrincipal;
use crate::reference::SecurityTokenReference;
use crate::result::{BinaryTokenResult, DerivedKeyTokenResult, SecurityContextResult};

fn parse_u32(node: roxmltree::Node<'_, '_>, what: &str) -> Result<u32, Error> {
    element_text(node)
        .parse()
        .map_err(|_| Error::XmlStructure(format!("{what} is not a non-negative integer")))
}

// ── BinarySecurityToken ──────────────────────────────────────────────

/// A `<wsse:BinarySecurityToken>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BinarySecurityToken {
    pub id: Option<String>,
    pub value_type: String,
    /// Decoded token bytes.
    pub data: Vec<u8>,
}

impl BinarySecurityToken {
    pub fn from_node(node: roxmltree::Node<'_, '_>) -> Result<Self, Error> {
        if !is_element(node, ns::WSSE, ns::node::BINARY_SECURITY_TOKEN) {
            return Err(Error::XmlStructure("expected wsse:BinarySecurityToken".into()));
        }
        let value_type = node
            .attribute(ns::attr::VALUE_TYPE)
            .ok_or_else(|| Error::XmlStructure("BinarySecurityToken without ValueType".into()))?;
        match node.attribute(ns::attr::ENCODING_TYPE) {
            None | Some(ns::BASE64_ENCODING) => {}
            Some(other) => {
                return Err(Error::UnsupportedTokenType(format!(
                    "BinarySecurityToken EncodingType {other}"
                )))
            }
        }
        Ok(Self {
            id: wsu_id(node).map(str::to_owned),
            value_type: value_type.to_owned(),
            data: decode_base64_text(element_text(node), "BinarySecurityToken")?,
        })
    }

    /// How the token bytes encode certificates.
    pub fn certificate_encoding(&self) -> Result<CertificateEncoding, Error> {
        match self.value_type.as_str() {
            ns::X509_V3_TYPE => Ok(CertificateEncoding::SingleCertificate),
            ns::X509_PKI_PATH_TYPE => Ok(CertificateEncoding::PkiPath),
            other => Err(Error::UnsupportedTokenType(format!(
                "BinarySecurityToken ValueType {other}"
            ))),
        }
    }

    /// Decode the certificates through the credential store, end entity first.
    pub fn certificates(&self, store: &dyn CredentialStore) -> Result<Vec<X509Certificate>, Error> {
        store.certificates_from_token(self.certificate_encoding()?, &self.data)
    }

    /// Decode the token into a prior result. `validated` records whether a
    /// validator has already established trust in it.
    pub fn process(
        &self,
        store: &dyn CredentialStore,
        validated: bool,
    ) -> Result<BinaryTokenResult, Error> {
        Ok(BinaryTokenResult {
            id: self.id.clone().unwrap_or_default(),
            value_type: self.value_type.clone(),
            certificates: self.certificates(store)?,
            validated,
        })
    }
}

// ── UsernameToken ────────────────────────────────────────────────────

/// A `<wsse:UsernameToken>`.
#[derive(Clone)]
pub struct UsernameToken {
    pub id: Option<String>,
    pub username: String,
    pub password: Option<Zeroizing<String>>,
    pub password_type: Option<String>,
    pub nonce: Option<Vec<u8>>,
    pub created: Option<String>,
    pub salt: Option<Vec<u8>>,
    pub iterations: Option<u32>,
}

impl std::fmt::Debug for UsernameToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UsernameToken")
            .field("id", &self.id)
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .field("password_type", &self.password_type)
            .field("created", &self.created)
            .field("salt", &self.salt.is_some())
            .field("iterations", &self.iterations)
            .finish()
    }
}

impl UsernameToken {
    pub fn from_node(node: roxmltree::Node<'_, '_>) -> Result<Self, Error> {
        if !is_element(node, ns::WSSE, ns::node::USERNAME_TOKEN) {
            return Err(Error::XmlStructure("expected wsse:UsernameToken".into()));
        }
        let username = child_element(node, ns::WSSE, ns::node::USERNAME)
            .map(element_text)
            .filter(|u| !u.is_empty())
            .ok_or_else(|| Error::XmlStructure("UsernameToken without Username".into()))?;

        let password_node = child_element(node, ns::WSSE, ns::node::PASSWORD);
        let nonce = child_element(node, ns::WSSE, ns::node::NONCE)
            .map(|n| decode_base64_text(element_text(n), "UsernameToken Nonce"))
            .transpose()?;
        let salt = child_element(node, ns::WSSE11, ns::node::SALT)
            .map(|n| decode_base64_text(element_text(n), "UsernameToken Salt"))
            .transpose()?;
        let iterations = child_element(node, ns::WSSE11, ns::node::ITERATION)
            .map(|n| parse_u32(n, "UsernameToken Iteration"))
            .transpose()?;
        if let Some(iterations) = iterations {
            kdf::check_iterations(iterations)?;
        }

        Ok(Self {
            id: wsu_id(node).map(str::to_owned),
            username: username.to_owned(),
            password: password_node.map(|p| Zeroizing::new(element_text(p).to_owned())),
            password_type: password_node
                .map(|p| p.attribute(ns::attr::TYPE).unwrap_or(ns::PASSWORD_TEXT).to_owned()),
            nonce,
            created: child_element(node, ns::WSU, ns::node::CREATED)
                .map(|n| element_text(n).to_owned()),
            salt,
            iterations,
        })
    }

    /// True when the token carries Salt and Iteration, so the key comes from
    /// the UsernameToken Profile 1.1 derivation.
    pub fn is_derived_key(&self) -> bool {
        self.salt.is_some() && self.iterations.is_some()
    }

    /// The cleartext password, if the token carries one.
    pub fn cleartext_password(&self) -> Option<&str> {
        match self.password_type.as_deref() {
            Some(ns::PASSWORD_DIGEST) => None,
            _ => self.password.as_deref().map(String::as_str),
        }
    }

    /// UsernameToken Profile 1.1 derived key.
    pub fn derived_key(&self, password: &[u8]) -> Result<Zeroizing<Vec<u8>>, Error> {
        match (&self.salt, self.iterations) {
            (Some(salt), Some(iterations)) => Ok(Zeroizing::new(kdf::username_token_key(
                password, salt, iterations,
            )?)),
            _ => Err(Error::DerivationFailure(
                "UsernameToken has no Salt and Iteration".into(),
            )),
        }
    }

    /// WSE-style secret of `length` bytes computed from password, nonce and
    /// creation time.
    pub fn secret_key(&self, password: &[u8], length: u32) -> Result<Zeroizing<Vec<u8>>, Error> {
        let nonce = self
            .nonce
            .as_deref()
            .ok_or_else(|| Error::DerivationFailure("UsernameToken has no Nonce".into()))?;
        let created = self
            .created
            .as_deref()
            .ok_or_else(|| Error::DerivationFailure("UsernameToken has no Created".into()))?;
        Ok(Zeroizing::new(kdf::username_token_secret(
            password,
            nonce,
            created.as_bytes(),
            length,
        )?))
    }
}

// ── DerivedKeyToken ──────────────────────────────────────────────────

/// A `<wsc:DerivedKeyToken>` (WS-SecureConversation 2005/02 or 2005/12).
#[derive(Debug, Clone)]
pub struct DerivedKeyToken {
    pub id: Option<String>,
    pub algorithm: DerivationAlgorithm,
    /// Reference to the token holding the base secret.
    pub reference: Option<SecurityTokenReference>,
    pub offset: Option<u32>,
    pub length: Option<u32>,
    pub generation: Option<u32>,
    pub label: Option<String>,
    pub nonce: Vec<u8>,
}

impl DerivedKeyToken {
    pub fn from_node(node: roxmltree::Node<'_, '_>) -> Result<Self, Error> {
        let wsc = [ns::WSC_0502, ns::WSC_0512]
            .into_iter()
            .find(|wsc| is_element(node, wsc, ns::node::DERIVED_KEY_TOKEN))
            .ok_or_else(|| Error::XmlStructure("expected wsc:DerivedKeyToken".into()))?;

        let algorithm = match node.attribute(ns::attr::ALGORITHM) {
            Some(uri) => DerivationAlgorithm::from_uri(uri)?,
            None => DerivationAlgorithm::default(),
        };
        let number = |name: &str| {
            child_element(node, wsc, name)
                .map(|n| parse_u32(n, name))
                .transpose()
        };
        let offset = number(ns::node::OFFSET)?;
        let generation = number(ns::node::GENERATION)?;
        if offset.is_some() && generation.is_some() {
            return Err(Error::XmlStructure(
                "DerivedKeyToken has both Offset and Generation".into(),
            ));
        }
        let length = number(ns::node::LENGTH)?;
        let window_start = match (offset, generation, length) {
            (Some(offset), _, _) => offset,
            (None, Some(generation), Some(length)) => generation
                .checked_mul(length)
                .ok_or_else(|| Error::DerivationFailure("Generation * Length overflows".into()))?,
            _ => 0,
        };
        kdf::check_derivation_bounds(window_start, length.unwrap_or(0))?;

        let nonce = child_element(node, wsc, ns::node::NONCE)
            .ok_or_else(|| Error::XmlStructure("DerivedKeyToken without Nonce".into()))?;

        Ok(Self {
            id: wsu_id(node).map(str::to_owned),
            algorithm,
            reference: child_element(node, ns::WSSE, ns::node::SECURITY_TOKEN_REFERENCE)
                .map(SecurityTokenReference::from_node)
                .transpose()?,
            offset,
            length,
            generation,
            label: child_element(node, wsc, ns::node::LABEL).map(|n| element_text(n).to_owned()),
            nonce: decode_base64_text(element_text(nonce), "DerivedKeyToken Nonce")?,
        })
    }

    /// The label, defaulting to `"WS-SecureConversationWS-SecureConversation"`.
    pub fn effective_label(&self) -> String {
        match self.label.as_deref() {
            Some(label) if !label.is_empty() => label.to_owned(),
            _ => algorithm::WSC_DEFAULT_LABEL.repeat(2),
        }
    }

    /// Start of the derived key in the P_SHA1 output: `Offset`, or
    /// `Generation * length`.
    pub fn effective_offset(&self, length: u32) -> Result<u32, Error> {
        match (self.offset, self.generation) {
            (Some(offset), _) => Ok(offset),
            (None, Some(generation)) => generation
                .checked_mul(length)
                .ok_or_else(|| Error::DerivationFailure("Generation * Length overflows".into())),
            (None, None) => Ok(0),
        }
    }

    /// Derive `length` bytes from `secret`.
    pub fn derive_key(&self, length: u32, secret: &[u8]) -> Result<Zeroizing<Vec<u8>>, Error> {
        let label = self.effective_label();
        let spec = DerivationSpec {
            secret,
            label: label.as_bytes(),
            nonce: &self.nonce,
            offset: self.effective_offset(length)?,
            length,
            algorithm: self.algorithm,
        };
        Ok(Zeroizing::new(kdf::derive(&spec)?))
    }

    pub fn principal(&self, length: u32, base_secret: &[u8]) -> Result<DerivedKeyPrincipal, Error> {
        Ok(DerivedKeyPrincipal {
            id: self.id.clone().unwrap_or_default(),
            nonce: self.nonce.clone(),
            label: self.effective_label(),
            offset: self.effective_offset(length)?,
            length,
            base_secret: Zeroizing::new(base_secret.to_vec()),
        })
    }
}

/// Parse a DerivedKeyToken and resolve the base secret its reference points
/// at. The caller registers the result in the [`crate::ResultIndex`].
pub fn process_derived_key_token(
    node: roxmltree::Node<'_, '_>,
    ctx: &ResolveContext<'_, '_, '_>,
) -> Result<DerivedKeyTokenResult, Error> {
    let token = DerivedKeyToken::from_node(node)?;
    let reference = token.reference.as_ref().ok_or_else(|| {
        Error::MalformedReference("DerivedKeyToken without SecurityTokenReference".into())
    })?;
    let base = crate::resolve(reference, ctx)?;
    let base_secret = base.secret_key.ok_or_else(|| {
        Error::NotFound(format!(
            "base token of DerivedKeyToken {} holds no secret",
            token.id.as_deref().unwrap_or("")
        ))
    })?;
    tracing::debug!(id = ?token.id, base = %base.principal.name, "processed DerivedKeyToken");
    Ok(DerivedKeyTokenResult { token, base_secret })
}

// ── SecurityContextToken ─────────────────────────────────────────────

/// Read a `<wsc:SecurityContextToken>` and obtain its secret from the
/// secret callback, keyed by the context identifier.
pub fn process_security_context_token(
    node: roxmltree::Node<'_, '_>,
    ctx: &ResolveContext<'_, '_, '_>,
) -> Result<SecurityContextResult, Error> {
    let wsc = [ns::WSC_0502, ns::WSC_0512]
        .into_iter()
        .find(|wsc| is_element(node, wsc, ns::node::SECURITY_CONTEXT_TOKEN))
        .ok_or_else(|| Error::XmlStructure("expected wsc:SecurityContextToken".into()))?;
    let identifier = child_element(node, wsc, ns::node::IDENTIFIER)
        .map(element_text)
        .filter(|i| !i.is_empty())
        .ok_or_else(|| Error::XmlStructure("SecurityContextToken without Identifier".into()))?;

    let secret = crate::resolve::request_secret(ctx, identifier, Some(wsc), SecretUsage::SecretKey)?
        .ok_or_else(|| Error::NotFound(format!("no secret for security context {identifier}")))?;

    Ok(SecurityContextResult {
        id: wsu_id(node).unwrap_or(identifier).to_owned(),
        identifier: identifier.to_owned(),
        secret,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use base64::Engine;
    use wssec_keys::CertificateStore;

    fn b64(data: &[u8]) -> String {
        base64::engine::general_purpose::STANDARD.encode(data)
    }

    #[test]
    fn test_binary_security_token() {
        let certified = rcgen::generate_simple_self_signed(vec!["alice.example".into()]).unwrap();
        let xml = format!(
            r#"<wsse:BinarySecurityToken xmlns:wsse="{}" xmlns:wsu="{}" wsu:Id="X509-1"
                 ValueType="{}" EncodingType="{}">{}</wsse:BinarySecurityToken>"#,
            ns::WSSE,
            ns::WSU,
            ns::X509_V3_TYPE,
            ns::BASE64_ENCODING,
            b64(certified.cert.der())
        );
        let doc = roxmltree::Document::parse(&xml).unwrap();
        let bst = BinarySecurityToken::from_node(doc.root_element()).unwrap();
        assert_eq!(bst.id.as_deref(), Some("X509-1"));
        assert_eq!(bst.certificate_encoding().unwrap(), CertificateEncoding::SingleCertificate);

        let result = bst.process(&CertificateStore::new(), false).unwrap();
        assert_eq!(result.id, "X509-1");
        assert_eq!(result.certificates.len(), 1);
        assert!(!result.validated);
    }

    #[test]
    fn test_binary_security_token_unknown_type() {
        let xml = format!(
            r#"<wsse:BinarySecurityToken xmlns:wsse="{}" ValueType="urn:example:kerberos">AAAA</wsse:BinarySecurityToken>"#,
            ns::WSSE
        );
        let doc = roxmltree::Document::parse(&xml).unwrap();
        let bst = BinarySecurityToken::from_node(doc.root_element()).unwrap();
        assert!(matches!(
            bst.certificate_encoding(),
            Err(Error::UnsupportedTokenType(_))
        ));
    }

    #[test]
    fn test_username_token_fields() {
        let xml = format!(
            r#"<wsse:UsernameToken xmlns:wsse="{}" xmlns:wsse11="{}" xmlns:wsu="{}" wsu:Id="UT-1">
                 <wsse:Username>alice</wsse:Username>
                 <wsse11:Salt>AQIDBAUGBwgJCgsMDQ4PEA==</wsse11:Salt>
                 <wsse11:Iteration>1000</wsse11:Iteration>
               </wsse:UsernameToken>"#,
            ns::WSSE,
            ns::WSSE11,
            ns::WSU
        );
        let doc = roxmltree::Document::parse(&xml).unwrap();
        let ut = UsernameToken::from_node(doc.root_element()).unwrap();
        assert_eq!(ut.username, "alice");
        assert!(ut.is_derived_key());
        assert!(ut.cleartext_password().is_none());
        assert_eq!(ut.iterations, Some(1000));

        let key = ut.derived_key(b"verySecret").unwrap();
        let expected = kdf::username_token_key(b"verySecret", &(1u8..=16).collect::<Vec<_>>(), 1000).unwrap();
        assert_eq!(*key, expected);
    }

    #[test]
    fn test_username_token_password_types() {
        let xml = format!(
            r#"<wsse:UsernameToken xmlns:wsse="{}" xmlns:wsu="{}">
                 <wsse:Username>bob</wsse:Username>
                 <wsse:Password Type="{}">digest==</wsse:Password>
                 <wsse:Nonce>bm9uY2U=</wsse:Nonce>
                 <wsu:Created>2024-01-01T00:00:00Z</wsu:Created>
               </wsse:UsernameToken>"#,
            ns::WSSE,
            ns::WSU,
            ns::PASSWORD_DIGEST
        );
        let doc = roxmltree::Document::parse(&xml).unwrap();
        let ut = UsernameToken::from_node(doc.root_element()).unwrap();
        assert!(ut.cleartext_password().is_none());
        assert!(!ut.is_derived_key());
        assert_eq!(ut.nonce.as_deref(), Some(&b"nonce"[..]));
        assert_eq!(ut.secret_key(b"pw", 16).unwrap().len(), 16);
        assert!(!format!("{ut:?}").contains("digest=="));

        let plain = xml.replace(ns::PASSWORD_DIGEST, ns::PASSWORD_TEXT);
        let doc = roxmltree::Document::parse(&plain).unwrap();
        let ut = UsernameToken::from_node(doc.root_element()).unwrap();
        assert_eq!(ut.cleartext_password(), Some("digest=="));
    }

    fn dkt(body: &str) -> Result<DerivedKeyToken, Error> {
        let xml = format!(
            r#"<wsc:DerivedKeyToken xmlns:wsc="{}" xmlns:wsse="{}" xmlns:wsu="{}" wsu:Id="DK-1">{body}</wsc:DerivedKeyToken>"#,
            ns::WSC_0512,
            ns::WSSE,
            ns::WSU
        );
        let doc = roxmltree::Document::parse(&xml).unwrap();
        DerivedKeyToken::from_node(doc.root_element())
    }

    #[test]
    fn test_derived_key_token_fields() {
        let token = dkt(
            r##"<wsse:SecurityTokenReference><wsse:Reference URI="#EK-1"/></wsse:SecurityTokenReference>
               <wsc:Length>24</wsc:Length>
               <wsc:Offset>16</wsc:Offset>
               <wsc:Nonce>MDEyMzQ1Njc4OWFiY2RlZg==</wsc:Nonce>"##,
        )
        .unwrap();
        assert_eq!(token.id.as_deref(), Some("DK-1"));
        assert_eq!(token.length, Some(24));
        assert_eq!(token.offset, Some(16));
        assert_eq!(token.nonce, b"0123456789abcdef");
        assert_eq!(token.reference.as_ref().and_then(|r| r.lookup_id()), Some("EK-1"));
        assert_eq!(token.effective_label(), "WS-SecureConversationWS-SecureConversation");

        let secret = [0x42u8; 32];
        let key = token.derive_key(24, &secret).unwrap();
        let seed = [token.effective_label().as_bytes(), token.nonce.as_slice()].concat();
        assert_eq!(*key, kdf::p_sha1(&secret, &seed, 16, 24).unwrap());
    }

    #[test]
    fn test_derived_key_token_generation() {
        let token = dkt(
            r#"<wsc:Generation>2</wsc:Generation><wsc:Label>custom</wsc:Label><wsc:Nonce>AAAA</wsc:Nonce>"#,
        )
        .unwrap();
        assert_eq!(token.effective_offset(16).unwrap(), 32);
        assert_eq!(token.effective_label(), "custom");
        assert!(token.reference.is_none());

        let overflow = dkt(r#"<wsc:Generation>4294967295</wsc:Generation><wsc:Nonce>AAAA</wsc:Nonce>"#)
            .unwrap();
        assert!(overflow.effective_offset(16).is_err());
    }

    #[test]
    fn test_derived_key_token_rejects_bad_shapes() {
        assert!(dkt(r#"<wsc:Length>16</wsc:Length>"#).is_err());
        assert!(dkt(
            r#"<wsc:Offset>0</wsc:Offset><wsc:Generation>1</wsc:Generation><wsc:Nonce>AAAA</wsc:Nonce>"#
        )
        .is_err());
        assert!(dkt(r#"<wsc:Length>-1</wsc:Length><wsc:Nonce>AAAA</wsc:Nonce>"#).is_err());
    }

    #[test]
    fn test_derived_key_token_window_limits() {
        let oversized = [
            r#"<wsc:Length>4294967295</wsc:Length><wsc:Nonce>AAAA</wsc:Nonce>"#,
            r#"<wsc:Offset>4294967295</wsc:Offset><wsc:Nonce>AAAA</wsc:Nonce>"#,
            r#"<wsc:Offset>4294967280</wsc:Offset><wsc:Length>32</wsc:Length><wsc:Nonce>AAAA</wsc:Nonce>"#,
            r#"<wsc:Generation>4294967295</wsc:Generation><wsc:Length>32</wsc:Length><wsc:Nonce>AAAA</wsc:Nonce>"#,
            r#"<wsc:Generation>100000</wsc:Generation><wsc:Length>32</wsc:Length><wsc:Nonce>AAAA</wsc:Nonce>"#,
        ];
        for body in oversized {
            assert!(
                matches!(dkt(body), Err(Error::DerivationFailure(_))),
                "accepted {body}"
            );
        }

        let token = dkt(r#"<wsc:Generation>4</wsc:Generation><wsc:Nonce>AAAA</wsc:Nonce>"#).unwrap();
        assert!(matches!(
            token.derive_key(u32::MAX, &[1; 32]),
            Err(Error::DerivationFailure(_))
        ));
        let plain = dkt(r#"<wsc:Nonce>AAAA</wsc:Nonce>"#).unwrap();
        assert!(matches!(
            plain.derive_key(u32::MAX, &[1; 32]),
            Err(Error::DerivationFailure(_))
        ));
        assert_eq!(plain.derive_key(32, &[1; 32]).unwrap().len(), 32);
    }

    #[test]
    fn test_username_token_iteration_limit() {
        let ut = |iterations: &str| {
            let xml = format!(
                r#"<wsse:UsernameToken xmlns:wsse="{}" xmlns:wsse11="{}">
                     <wsse:Username>alice</wsse:Username>
                     <wsse11:Salt>AQIDBAUGBwgJCgsMDQ4PEA==</wsse11:Salt>
                     <wsse11:Iteration>{iterations}</wsse11:Iteration>
                   </wsse:UsernameToken>"#,
                ns::WSSE,
                ns::WSSE11
            );
            let doc = roxmltree::Document::parse(&xml).unwrap();
            UsernameToken::from_node(doc.root_element()).map(|t| t.iterations)
        };
        assert_eq!(ut("1000").unwrap(), Some(1000));
        assert!(matches!(ut("4294967295"), Err(Error::DerivationFailure(_))));
        assert!(matches!(ut("0"), Err(Error::DerivationFailure(_))));
    }
}
