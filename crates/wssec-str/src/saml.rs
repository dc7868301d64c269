#![forbid(unsafe_code)]

//! SAML 1.1 and 2.0 assertions, read for their subject and the key the
//! subject confirms.

use wssec_core::{ns, Error};
use wssec_keys::keyinfo::{extract_key_info, KeyInfoMaterial};
use wssec_xml::document::{child_element, child_elements, element_text, is_element};
use zeroize::Zeroizing;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SamlVersion {
    V1_1,
    V2_0,
}

impl SamlVersion {
    /// The `wsse11:TokenType` a reference to this assertion must carry.
    pub fn token_type(&self) -> &'static str {
        match self {
            Self::V1_1 => ns::SAML_TOKEN_TYPE,
            Self::V2_0 => ns::SAML2_TOKEN_TYPE,
        }
    }

    /// The `KeyIdentifier` value type that names this assertion.
    pub fn key_identifier_value_type(&self) -> &'static str {
        match self {
            Self::V1_1 => ns::SAML_KI_VALUE_TYPE,
            Self::V2_0 => ns::SAML2_KI_VALUE_TYPE,
        }
    }
}

/// A parsed SAML assertion.
#[derive(Debug, Clone)]
pub struct SamlAssertion {
    pub id: String,
    pub version: SamlVersion,
    pub issuer: Option<String>,
    /// `NameIdentifier` (1.1) or `NameID` (2.0) of the subject.
    pub subject_name: Option<String>,
    /// Subject confirmation methods in document order.
    pub confirmation_methods: Vec<String>,
    /// True if the assertion carries an enveloped `ds:Signature`. Says
    /// nothing about whether that signature is valid.
    pub has_signature: bool,
    /// Set by a [`crate::TokenProcessor`] after it verified the enveloped
    /// signature. Parsing always leaves it false.
    pub signature_verified: bool,
    /// Certificates and public key from the subject confirmation `ds:KeyInfo`.
    pub subject_key_info: KeyInfoMaterial,
    /// Symmetric proof key, when the processor decrypted one.
    pub secret: Option<Zeroizing<Vec<u8>>>,
}

impl SamlAssertion {
    /// Parse a `saml:Assertion` or `saml2:Assertion` element.
    pub fn from_node(node: roxmltree::Node<'_, '_>) -> Result<Self, Error> {
        if is_element(node, ns::SAML1, ns::node::ASSERTION) {
            Self::from_saml1(node)
        } else if is_element(node, ns::SAML2, ns::node::ASSERTION) {
            Self::from_saml2(node)
        } else {
            Err(Error::UnsupportedTokenType(format!(
                "not a SAML assertion: {{{}}}{}",
                node.tag_name().namespace().unwrap_or(""),
                node.tag_name().name()
            )))
        }
    }

    fn from_saml1(node: roxmltree::Node<'_, '_>) -> Result<Self, Error> {
        let id = node
            .attribute(ns::attr::ASSERTION_ID)
            .ok_or_else(|| Error::XmlStructure("SAML 1.1 assertion without AssertionID".into()))?;

        // 1.1 subjects live inside each statement
        let subjects: Vec<_> = node
            .children()
            .filter(|n| n.is_element())
            .filter_map(|stmt| child_element(stmt, ns::SAML1, ns::node::SUBJECT))
            .collect();

        let subject_name = subjects
            .iter()
            .find_map(|s| child_element(*s, ns::SAML1, ns::node::NAME_IDENTIFIER))
            .map(|n| element_text(n).to_owned());

        let mut confirmation_methods = Vec::new();
        let mut subject_key_info = KeyInfoMaterial::default();
        for confirmation in subjects
            .iter()
            .filter_map(|s| child_element(*s, ns::SAML1, ns::node::SUBJECT_CONFIRMATION))
        {
            for method in child_elements(confirmation, ns::SAML1, ns::node::CONFIRMATION_METHOD) {
                confirmation_methods.push(element_text(method).to_owned());
            }
            if subject_key_info.is_empty() {
                if let Some(ki) = child_element(confirmation, ns::DSIG, ns::node::KEY_INFO) {
                    subject_key_info = extract_key_info(ki)?;
                }
            }
        }

        Ok(Self {
            id: id.to_owned(),
            version: SamlVersion::V1_1,
            issuer: node.attribute(ns::attr::ISSUER).map(str::to_owned),
            subject_name,
            confirmation_methods,
            has_signature: child_element(node, ns::DSIG, ns::node::SIGNATURE).is_some(),
            signature_verified: false,
            subject_key_info,
            secret: None,
        })
    }

    fn from_saml2(node: roxmltree::Node<'_, '_>) -> Result<Self, Error> {
        let id = node
            .attribute(ns::attr::SAML2_ID)
            .ok_or_else(|| Error::XmlStructure("SAML 2.0 assertion without ID".into()))?;

        let subject = child_element(node, ns::SAML2, ns::node::SUBJECT);
        let subject_name = subject
            .and_then(|s| child_element(s, ns::SAML2, ns::node::NAME_ID))
            .map(|n| element_text(n).to_owned());

        let mut confirmation_methods = Vec::new();
        let mut subject_key_info = KeyInfoMaterial::default();
        let confirmations = subject
            .map(|s| child_elements(s, ns::SAML2, ns::node::SUBJECT_CONFIRMATION))
            .unwrap_or_default();
        for confirmation in confirmations {
            if let Some(method) = confirmation.attribute(ns::attr::METHOD) {
                confirmation_methods.push(method.to_owned());
            }
            let key_info = child_element(confirmation, ns::SAML2, ns::node::SUBJECT_CONFIRMATION_DATA)
                .and_then(|data| child_element(data, ns::DSIG, ns::node::KEY_INFO));
            if let (true, Some(ki)) = (subject_key_info.is_empty(), key_info) {
                subject_key_info = extract_key_info(ki)?;
            }
        }

        Ok(Self {
            id: id.to_owned(),
            version: SamlVersion::V2_0,
            issuer: child_element(node, ns::SAML2, ns::node::ISSUER)
                .map(|n| element_text(n).to_owned()),
            subject_name,
            confirmation_methods,
            has_signature: child_element(node, ns::DSIG, ns::node::SIGNATURE).is_some(),
            signature_verified: false,
            subject_key_info,
            secret: None,
        })
    }

    /// True if the first confirmation method is holder-of-key.
    pub fn is_holder_of_key(&self) -> bool {
        matches!(
            self.confirmation_methods.first().map(String::as_str),
            Some(ns::SAML1_HOLDER_OF_KEY | ns::SAML2_HOLDER_OF_KEY)
        )
    }

    /// Holder-of-key assertions whose signature was verified vouch for their
    /// subject key.
    // TODO: also require the signing certificate to belong to a trusted issuer.
    pub fn is_trusted(&self) -> bool {
        self.is_holder_of_key() && self.signature_verified
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use base64::Engine;

    fn saml2(method: &str, signed: bool, key_info: &str) -> String {
        let signature = if signed {
            r#"<ds:Signature><ds:SignedInfo/></ds:Signature>"#
        } else {
            ""
        };
        format!(
            r#"<saml2:Assertion xmlns:saml2="{}" xmlns:ds="{}" ID="_a1" Version="2.0">
                 <saml2:Issuer>https://idp.example</saml2:Issuer>
                 {signature}
                 <saml2:Subject>
                   <saml2:NameID>alice</saml2:NameID>
                   <saml2:SubjectConfirmation Method="{method}">
                     <saml2:SubjectConfirmationData>{key_info}</saml2:SubjectConfirmationData>
                   </saml2:SubjectConfirmation>
                 </saml2:Subject>
               </saml2:Assertion>"#,
            ns::SAML2,
            ns::DSIG
        )
    }

    #[test]
    fn test_saml2_holder_of_key() {
        let certified = rcgen::generate_simple_self_signed(vec!["alice.example".into()]).unwrap();
        let key_info = format!(
            "<ds:KeyInfo><ds:X509Data><ds:X509Certificate>{}</ds:X509Certificate></ds:X509Data></ds:KeyInfo>",
            base64::engine::general_purpose::STANDARD.encode(certified.cert.der())
        );
        let xml = saml2(ns::SAML2_HOLDER_OF_KEY, true, &key_info);
        let doc = roxmltree::Document::parse(&xml).unwrap();
        let assertion = SamlAssertion::from_node(doc.root_element()).unwrap();

        assert_eq!(assertion.id, "_a1");
        assert_eq!(assertion.version, SamlVersion::V2_0);
        assert_eq!(assertion.issuer.as_deref(), Some("https://idp.example"));
        assert_eq!(assertion.subject_name.as_deref(), Some("alice"));
        assert!(assertion.has_signature);
        assert!(assertion.is_holder_of_key());
        assert!(!assertion.is_trusted());

        let verified = SamlAssertion {
            signature_verified: true,
            ..assertion.clone()
        };
        assert!(verified.is_trusted());
        assert_eq!(assertion.subject_key_info.certificates.len(), 1);
    }

    #[test]
    fn test_unsigned_or_bearer_is_not_trusted() {
        let doc_xml = saml2(ns::SAML2_HOLDER_OF_KEY, false, "");
        let doc = roxmltree::Document::parse(&doc_xml).unwrap();
        let assertion = SamlAssertion::from_node(doc.root_element()).unwrap();
        assert!(assertion.is_holder_of_key());
        assert!(!assertion.is_trusted());

        let doc_xml = saml2(ns::SAML2_BEARER, true, "");
        let doc = roxmltree::Document::parse(&doc_xml).unwrap();
        let assertion = SamlAssertion::from_node(doc.root_element()).unwrap();
        let assertion = SamlAssertion {
            signature_verified: true,
            ..assertion
        };
        assert!(!assertion.is_trusted());
        assert!(assertion.subject_key_info.is_empty());
    }

    #[test]
    fn test_saml1_assertion() {
        let xml = format!(
            r#"<saml:Assertion xmlns:saml="{}" AssertionID="_s11" Issuer="www.example.com"
                               MajorVersion="1" MinorVersion="1">
                 <saml:AuthenticationStatement>
                   <saml:Subject>
                     <saml:NameIdentifier>bob</saml:NameIdentifier>
                     <saml:SubjectConfirmation>
                       <saml:ConfirmationMethod>{}</saml:ConfirmationMethod>
                     </saml:SubjectConfirmation>
                   </saml:Subject>
                 </saml:AuthenticationStatement>
               </saml:Assertion>"#,
            ns::SAML1,
            ns::SAML1_SENDER_VOUCHES
        );
        let doc = roxmltree::Document::parse(&xml).unwrap();
        let assertion = SamlAssertion::from_node(doc.root_element()).unwrap();
        assert_eq!(assertion.id, "_s11");
        assert_eq!(assertion.version, SamlVersion::V1_1);
        assert_eq!(assertion.issuer.as_deref(), Some("www.example.com"));
        assert_eq!(assertion.subject_name.as_deref(), Some("bob"));
        assert_eq!(assertion.confirmation_methods, vec![ns::SAML1_SENDER_VOUCHES]);
        assert!(!assertion.has_signature);
        assert!(!assertion.is_holder_of_key());
        assert_eq!(assertion.version.token_type(), ns::SAML_TOKEN_TYPE);
    }

    #[test]
    fn test_not_an_assertion() {
        let doc = roxmltree::Document::parse("<Assertion/>").unwrap();
        assert!(matches!(
            SamlAssertion::from_node(doc.root_element()),
            Err(Error::UnsupportedTokenType(_))
        ));
    }
}
