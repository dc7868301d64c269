#![forbid(unsafe_code)]

//! Classification of `<wsse:SecurityTokenReference>` elements.

use wssec_core::{ns, Error};
use wssec_xml::document::{child_element, element_text, is_element, wsu_id};

/// The `ValueType` of a `<wsse:KeyIdentifier>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeyIdentifierType {
    X509V3,
    SubjectKeyIdentifier,
    ThumbprintSha1,
    EncryptedKeySha1,
    SamlAssertionId,
    Saml2Id,
    Unrecognized(String),
    Missing,
}

impl KeyIdentifierType {
    pub fn from_value_type(value_type: Option<&str>) -> Self {
        match value_type {
            None => Self::Missing,
            Some(ns::X509_V3_TYPE) => Self::X509V3,
            Some(ns::X509_SKI_TYPE) => Self::SubjectKeyIdentifier,
            Some(ns::THUMBPRINT_SHA1_TYPE) => Self::ThumbprintSha1,
            Some(ns::ENC_KEY_SHA1_TYPE) => Self::EncryptedKeySha1,
            Some(ns::SAML_KI_VALUE_TYPE) => Self::SamlAssertionId,
            Some(ns::SAML2_KI_VALUE_TYPE) => Self::Saml2Id,
            Some(other) => Self::Unrecognized(other.to_string()),
        }
    }

    /// The `ValueType` URI, if the type was recognised.
    pub fn uri(&self) -> Option<&'static str> {
        match self {
            Self::X509V3 => Some(ns::X509_V3_TYPE),
            Self::SubjectKeyIdentifier => Some(ns::X509_SKI_TYPE),
            Self::ThumbprintSha1 => Some(ns::THUMBPRINT_SHA1_TYPE),
            Self::EncryptedKeySha1 => Some(ns::ENC_KEY_SHA1_TYPE),
            Self::SamlAssertionId => Some(ns::SAML_KI_VALUE_TYPE),
            Self::Saml2Id => Some(ns::SAML2_KI_VALUE_TYPE),
            Self::Unrecognized(_) | Self::Missing => None,
        }
    }

    pub fn is_saml(&self) -> bool {
        matches!(self, Self::SamlAssertionId | Self::Saml2Id)
    }
}

/// The single form a reference takes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReferenceKind {
    /// `<wsse:Reference URI="..." ValueType="..."/>`
    DirectReference {
        uri: String,
        value_type: Option<String>,
    },
    /// `<wsse:KeyIdentifier ValueType="..." EncodingType="...">value</wsse:KeyIdentifier>`
    KeyIdentifier {
        value_type: KeyIdentifierType,
        encoding_type: Option<String>,
        value: String,
    },
    /// `<ds:X509Data><ds:X509IssuerSerial>...</ds:X509IssuerSerial></ds:X509Data>`
    X509Data { issuer: String, serial: String },
}

/// A parsed `<wsse:SecurityTokenReference>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SecurityTokenReference {
    /// `wsu:Id` of the reference element itself.
    pub id: Option<String>,
    /// `wsse11:TokenType`.
    pub token_type: Option<String>,
    /// Number of child elements; the Basic Security Profile allows exactly one.
    pub child_count: usize,
    pub kind: ReferenceKind,
}

impl SecurityTokenReference {
    /// Classify a `<wsse:SecurityTokenReference>` element.
    ///
    /// The first recognised child decides the kind: `Reference`, then
    /// `KeyIdentifier`, then `X509Data/X509IssuerSerial`.
    pub fn from_node(node: roxmltree::Node<'_, '_>) -> Result<Self, Error> {
        if !is_element(node, ns::WSSE, ns::node::SECURITY_TOKEN_REFERENCE) {
            return Err(Error::MalformedReference(format!(
                "expected wsse:SecurityTokenReference, found {}",
                node.tag_name().name()
            )));
        }

        let token_type = node
            .attribute((ns::WSSE11, ns::attr::TOKEN_TYPE))
            .map(str::to_owned);
        let child_count = node.children().filter(|n| n.is_element()).count();

        let kind = classify(node)?.ok_or_else(|| {
            Error::MalformedReference(
                "SecurityTokenReference holds no Reference, KeyIdentifier or X509IssuerSerial".into(),
            )
        })?;

        Ok(Self {
            id: wsu_id(node).map(str::to_owned),
            token_type,
            child_count,
            kind,
        })
    }

    /// The identifier used to look the referenced token up: the URI without
    /// its leading `#`, or the raw key identifier value. Issuer/serial
    /// references have none.
    pub fn lookup_id(&self) -> Option<&str> {
        match &self.kind {
            ReferenceKind::DirectReference { uri, .. } => {
                Some(uri.strip_prefix('#').unwrap_or(uri))
            }
            ReferenceKind::KeyIdentifier { value, .. } => Some(value),
            ReferenceKind::X509Data { .. } => None,
        }
    }

    pub fn is_direct_reference(&self) -> bool {
        matches!(self.kind, ReferenceKind::DirectReference { .. })
    }

    /// `ValueType` of a direct reference.
    pub fn reference_value_type(&self) -> Option<&str> {
        match &self.kind {
            ReferenceKind::DirectReference { value_type, .. } => value_type.as_deref(),
            _ => None,
        }
    }

    /// Type tag of a key identifier.
    pub fn key_identifier_type(&self) -> Option<&KeyIdentifierType> {
        match &self.kind {
            ReferenceKind::KeyIdentifier { value_type, .. } => Some(value_type),
            _ => None,
        }
    }
}

fn classify(node: roxmltree::Node<'_, '_>) -> Result<Option<ReferenceKind>, Error> {
    if let Some(reference) = child_element(node, ns::WSSE, ns::node::REFERENCE) {
        let uri = reference
            .attribute(ns::attr::URI)
            .filter(|u| !u.is_empty())
            .ok_or_else(|| Error::MalformedReference("wsse:Reference without URI".into()))?;
        return Ok(Some(ReferenceKind::DirectReference {
            uri: uri.to_owned(),
            value_type: reference.attribute(ns::attr::VALUE_TYPE).map(str::to_owned),
        }));
    }

    if let Some(ki) = child_element(node, ns::WSSE, ns::node::KEY_IDENTIFIER) {
        let value: String = element_text(ki)
            .chars()
            .filter(|c| !c.is_whitespace())
            .collect();
        if value.is_empty() {
            return Err(Error::MalformedReference("empty wsse:KeyIdentifier".into()));
        }
        return Ok(Some(ReferenceKind::KeyIdentifier {
            value_type: KeyIdentifierType::from_value_type(ki.attribute(ns::attr::VALUE_TYPE)),
            encoding_type: ki.attribute(ns::attr::ENCODING_TYPE).map(str::to_owned),
            value,
        }));
    }

    let issuer_serial = child_element(node, ns::DSIG, ns::node::X509_DATA)
        .and_then(|data| child_element(data, ns::DSIG, ns::node::X509_ISSUER_SERIAL));
    if let Some(is) = issuer_serial {
        let issuer = child_element(is, ns::DSIG, ns::node::X509_ISSUER_NAME).map(element_text);
        let serial = child_element(is, ns::DSIG, ns::node::X509_SERIAL_NUMBER).map(element_text);
        return match (issuer, serial) {
            (Some(issuer), Some(serial)) if !issuer.is_empty() && !serial.is_empty() => {
                Ok(Some(ReferenceKind::X509Data {
                    issuer: issuer.to_owned(),
                    serial: serial.to_owned(),
                }))
            }
            _ => Err(Error::MalformedReference(
                "X509IssuerSerial needs X509IssuerName and X509SerialNumber".into(),
            )),
        };
    }

    Ok(None)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(inner: &str) -> Result<SecurityTokenReference, Error> {
        let xml = format!(
            r#"<wsse:SecurityTokenReference
                 xmlns:wsse="{}" xmlns:wsse11="{}" xmlns:wsu="{}" xmlns:ds="{}"
                 wsu:Id="STR-1">{inner}</wsse:SecurityTokenReference>"#,
            ns::WSSE,
            ns::WSSE11,
            ns::WSU,
            ns::DSIG
        );
        let doc = roxmltree::Document::parse(&xml).unwrap();
        SecurityTokenReference::from_node(doc.root_element())
    }

    #[test]
    fn test_direct_reference() {
        let str_ref = parse(&format!(
            r##"<wsse:Reference URI="#X509-1" ValueType="{}"/>"##,
            ns::X509_V3_TYPE
        ))
        .unwrap();
        assert_eq!(str_ref.id.as_deref(), Some("STR-1"));
        assert_eq!(str_ref.child_count, 1);
        assert_eq!(str_ref.lookup_id(), Some("X509-1"));
        assert_eq!(str_ref.reference_value_type(), Some(ns::X509_V3_TYPE));
        assert!(str_ref.is_direct_reference());
    }

    #[test]
    fn test_external_reference_keeps_uri() {
        let str_ref = parse(r#"<wsse:Reference URI="urn:uuid:secret-1"/>"#).unwrap();
        assert_eq!(str_ref.lookup_id(), Some("urn:uuid:secret-1"));
    }

    #[test]
    fn test_key_identifier() {
        let str_ref = parse(&format!(
            r#"<wsse:KeyIdentifier ValueType="{}" EncodingType="{}">
                 c29tZS10aHVtYnByaW50
               </wsse:KeyIdentifier>"#,
            ns::THUMBPRINT_SHA1_TYPE,
            ns::BASE64_ENCODING
        ))
        .unwrap();
        assert_eq!(
            str_ref.key_identifier_type(),
            Some(&KeyIdentifierType::ThumbprintSha1)
        );
        assert_eq!(str_ref.lookup_id(), Some("c29tZS10aHVtYnByaW50"));
    }

    #[test]
    fn test_key_identifier_type_tags() {
        let str_ref = parse(r#"<wsse:KeyIdentifier>abc</wsse:KeyIdentifier>"#).unwrap();
        assert_eq!(str_ref.key_identifier_type(), Some(&KeyIdentifierType::Missing));

        let str_ref =
            parse(r#"<wsse:KeyIdentifier ValueType="urn:example:custom">abc</wsse:KeyIdentifier>"#)
                .unwrap();
        assert_eq!(
            str_ref.key_identifier_type(),
            Some(&KeyIdentifierType::Unrecognized("urn:example:custom".into()))
        );
        assert_eq!(KeyIdentifierType::Saml2Id.uri(), Some(ns::SAML2_KI_VALUE_TYPE));
    }

    #[test]
    fn test_issuer_serial() {
        let str_ref = parse(
            r#"<ds:X509Data><ds:X509IssuerSerial>
                 <ds:X509IssuerName>CN=Test CA,O=Example</ds:X509IssuerName>
                 <ds:X509SerialNumber>1234567</ds:X509SerialNumber>
               </ds:X509IssuerSerial></ds:X509Data>"#,
        )
        .unwrap();
        assert_eq!(
            str_ref.kind,
            ReferenceKind::X509Data {
                issuer: "CN=Test CA,O=Example".into(),
                serial: "1234567".into(),
            }
        );
        assert_eq!(str_ref.lookup_id(), None);
    }

    #[test]
    fn test_first_child_wins_and_is_counted() {
        let str_ref = parse(
            r##"<wsse:Reference URI="#a"/><wsse:KeyIdentifier ValueType="x">b</wsse:KeyIdentifier>"##,
        )
        .unwrap();
        assert_eq!(str_ref.child_count, 2);
        assert_eq!(str_ref.lookup_id(), Some("a"));
    }

    #[test]
    fn test_malformed_references() {
        assert!(matches!(parse(""), Err(Error::MalformedReference(_))));
        assert!(matches!(
            parse("<wsse:Embedded/>"),
            Err(Error::MalformedReference(_))
        ));
        assert!(matches!(
            parse("<wsse:Reference/>"),
            Err(Error::MalformedReference(_))
        ));
        assert!(matches!(
            parse("<wsse:KeyIdentifier ValueType=\"x\">  </wsse:KeyIdentifier>"),
            Err(Error::MalformedReference(_))
        ));
        assert!(matches!(
            parse("<ds:X509Data><ds:X509IssuerSerial/></ds:X509Data>"),
            Err(Error::MalformedReference(_))
        ));
    }

    #[test]
    fn test_wrong_element() {
        let doc = roxmltree::Document::parse("<Other/>").unwrap();
        assert!(matches!(
            SecurityTokenReference::from_node(doc.root_element()),
            Err(Error::MalformedReference(_))
        ));
    }
}
