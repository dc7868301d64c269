#![forbid(unsafe_code)]

//! Parsed SOAP document with a WS-Security aware ID index.

use std::collections::HashMap;

use wssec_core::{ns, Error};

/// ID attributes registered by default. `wsu:Id` is namespace qualified, the
/// others are matched without a namespace.
const DEFAULT_ID_ATTRS: [&str; 3] = [ns::attr::ID, ns::attr::SAML2_ID, ns::attr::ASSERTION_ID];

/// Where an ID value points.
#[derive(Debug, Clone, Copy)]
enum IdTarget {
    Unique(roxmltree::NodeId),
    /// The same value appeared on more than one element.
    Duplicate,
}

/// A borrowed view over a parsed document plus the ID → element index used to
/// dereference `#fragment` URIs.
///
/// The index is built once; the document must not change while references
/// taken from it are being resolved.
pub struct SecurityDocument<'a, 'input> {
    doc: &'a roxmltree::Document<'input>,
    ids: HashMap<String, IdTarget>,
}

impl<'a, 'input> SecurityDocument<'a, 'input> {
    /// Index a parsed document using the default ID attributes.
    pub fn new(doc: &'a roxmltree::Document<'input>) -> Self {
        Self::with_id_attrs(doc, &[])
    }

    /// Index a parsed document, registering additional unqualified ID
    /// attribute names.
    pub fn with_id_attrs(doc: &'a roxmltree::Document<'input>, extra: &[&str]) -> Self {
        let mut ids = HashMap::new();
        for node in doc.descendants().filter(|n| n.is_element()) {
            let mut register = |value: &str| {
                ids.entry(value.to_owned())
                    .and_modify(|t| {
                        if let IdTarget::Unique(existing) = *t {
                            if existing != node.id() {
                                *t = IdTarget::Duplicate;
                            }
                        }
                    })
                    .or_insert(IdTarget::Unique(node.id()));
            };
            if let Some(v) = node.attribute((ns::WSU, ns::attr::ID)) {
                register(v);
            }
            for name in DEFAULT_ID_ATTRS.iter().chain(extra.iter()) {
                if let Some(v) = node.attribute(*name) {
                    register(v);
                }
            }
        }
        Self { doc, ids }
    }

    /// The underlying parsed document.
    pub fn document(&self) -> &'a roxmltree::Document<'input> {
        self.doc
    }

    /// Find the element carrying the given ID (without a leading `#`).
    ///
    /// An ID that appears on several elements is rejected rather than
    /// resolved to an arbitrary one of them.
    pub fn element_by_id(&self, id: &str) -> Result<Option<roxmltree::Node<'a, 'input>>, Error> {
        match self.ids.get(id) {
            None => Ok(None),
            Some(IdTarget::Duplicate) => Err(Error::XmlStructure(format!(
                "ID \"{id}\" is used by more than one element"
            ))),
            Some(IdTarget::Unique(node_id)) => Ok(self.doc.get_node(*node_id)),
        }
    }

    /// Find the first descendant element with the given namespace and local name.
    pub fn find_element(&self, ns: &str, local_name: &str) -> Option<roxmltree::Node<'a, 'input>> {
        self.doc.descendants().find(|n| is_element(*n, ns, local_name))
    }

    /// Find all descendant elements with the given namespace and local name.
    pub fn find_elements(&self, ns: &str, local_name: &str) -> Vec<roxmltree::Node<'a, 'input>> {
        self.doc
            .descendants()
            .filter(|n| is_element(*n, ns, local_name))
            .collect()
    }
}

/// True if `node` is an element named `{ns}local_name`.
pub fn is_element(node: roxmltree::Node<'_, '_>, ns: &str, local_name: &str) -> bool {
    node.is_element()
        && node.tag_name().name() == local_name
        && node.tag_name().namespace().unwrap_or("") == ns
}

/// First child element named `{ns}local_name`.
pub fn child_element<'a, 'input>(
    node: roxmltree::Node<'a, 'input>,
    ns: &str,
    local_name: &str,
) -> Option<roxmltree::Node<'a, 'input>> {
    node.children().find(|n| is_element(*n, ns, local_name))
}

/// All child elements named `{ns}local_name`, in document order.
pub fn child_elements<'a, 'input>(
    node: roxmltree::Node<'a, 'input>,
    ns: &str,
    local_name: &str,
) -> Vec<roxmltree::Node<'a, 'input>> {
    node.children()
        .filter(|n| is_element(*n, ns, local_name))
        .collect()
}

/// Trimmed text content of an element, empty if it has none.
pub fn element_text<'a>(node: roxmltree::Node<'a, '_>) -> &'a str {
    node.text().unwrap_or("").trim()
}

/// The `wsu:Id` of an element, falling back to an unqualified `Id`.
pub fn wsu_id<'a>(node: roxmltree::Node<'a, '_>) -> Option<&'a str> {
    node.attribute((ns::WSU, ns::attr::ID))
        .or_else(|| node.attribute(ns::attr::ID))
}

#[cfg(test)]
mod tests {
    use super::*;

    const DOC: &str = r#"<soap:Envelope xmlns:soap="http://schemas.xmlsoap.org/soap/envelope/"
        xmlns:wsse="http://docs.oasis-open.org/wss/2004/01/oasis-200401-wss-wssecurity-secext-1.0.xsd"
        xmlns:wsu="http://docs.oasis-open.org/wss/2004/01/oasis-200401-wss-wssecurity-utility-1.0.xsd">
        <soap:Header>
            <wsse:Security>
                <wsse:BinarySecurityToken wsu:Id="X509-1">AAAA</wsse:BinarySecurityToken>
                <Assertion xmlns="urn:oasis:names:tc:SAML:2.0:assertion" ID="_saml2"/>
            </wsse:Security>
        </soap:Header>
        <soap:Body wsu:Id="body"/>
    </soap:Envelope>"#;

    #[test]
    fn test_element_by_wsu_id() {
        let doc = roxmltree::Document::parse(DOC).unwrap();
        let sdoc = SecurityDocument::new(&doc);
        let bst = sdoc.element_by_id("X509-1").unwrap().unwrap();
        assert!(is_element(bst, ns::WSSE, ns::node::BINARY_SECURITY_TOKEN));
        assert_eq!(wsu_id(bst), Some("X509-1"));
    }

    #[test]
    fn test_element_by_saml2_id() {
        let doc = roxmltree::Document::parse(DOC).unwrap();
        let sdoc = SecurityDocument::new(&doc);
        let assertion = sdoc.element_by_id("_saml2").unwrap().unwrap();
        assert!(is_element(assertion, ns::SAML2, ns::node::ASSERTION));
        assert!(sdoc.element_by_id("missing").unwrap().is_none());
    }

    #[test]
    fn test_duplicate_id_is_rejected() {
        let xml = r#"<root xmlns:wsu="http://docs.oasis-open.org/wss/2004/01/oasis-200401-wss-wssecurity-utility-1.0.xsd">
            <a wsu:Id="dup"/><b Id="dup"/>
        </root>"#;
        let doc = roxmltree::Document::parse(xml).unwrap();
        let sdoc = SecurityDocument::new(&doc);
        assert!(sdoc.element_by_id("dup").is_err());
    }

    #[test]
    fn test_same_element_registered_twice_is_not_duplicate() {
        let xml = r#"<root xmlns:wsu="http://docs.oasis-open.org/wss/2004/01/oasis-200401-wss-wssecurity-utility-1.0.xsd">
            <a wsu:Id="same" Id="same"/>
        </root>"#;
        let doc = roxmltree::Document::parse(xml).unwrap();
        let sdoc = SecurityDocument::new(&doc);
        assert!(sdoc.element_by_id("same").unwrap().is_some());
    }
}
