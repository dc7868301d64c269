#![forbid(unsafe_code)]

//! A minimal `wsse:Security` header pass: index the tokens a header carries,
//! then collect the references found in signature and encryption `KeyInfo`.

use tracing::{debug, warn};
use wssec_core::{ns, Error};
use wssec_keys::CredentialStore;
use wssec_str::{
    process_derived_key_token, process_security_context_token, BinarySecurityToken,
    ComplianceMode, DerivationParams, EncryptedKeyResult, PriorResult, ResolveContext,
    ResultIndex, SamlAssertion, SecretCallback, SecretRequest, SecretUsage,
    SecurityTokenReference, TokenProcessor, UsernameToken,
};
use wssec_xml::document::{child_element, child_elements, is_element, wsu_id};
use wssec_xml::SecurityDocument;

/// Token processor that parses assertions without verifying them and takes
/// EncryptedKey secrets from a secret callback keyed by the element Id.
/// Assertions it returns are never marked `signature_verified`, so
/// credentials drawn from them are never trusted.
pub struct ParsingProcessor<'s> {
    secrets: &'s dyn SecretCallback,
}

impl<'s> ParsingProcessor<'s> {
    pub fn new(secrets: &'s dyn SecretCallback) -> Self {
        Self { secrets }
    }
}

impl TokenProcessor for ParsingProcessor<'_> {
    fn process_assertion(&self, node: roxmltree::Node<'_, '_>) -> Result<SamlAssertion, Error> {
        SamlAssertion::from_node(node)
    }

    fn process_encrypted_key(
        &self,
        node: roxmltree::Node<'_, '_>,
    ) -> Result<EncryptedKeyResult, Error> {
        let id = wsu_id(node)
            .ok_or_else(|| Error::XmlStructure("EncryptedKey without Id".into()))?;
        let request = SecretRequest {
            id,
            type_hint: Some(ns::ENC_KEY_TOKEN_TYPE),
            usage: SecretUsage::SecretKey,
        };
        let secret = self
            .secrets
            .request_secret(&request)
            .map_err(|source| Error::CallbackFailure {
                id: id.to_owned(),
                source,
            })?
            .filter(|s| !s.is_empty())
            .ok_or_else(|| Error::NotFound(format!("no key for EncryptedKey {id}")))?;
        Ok(EncryptedKeyResult {
            id: id.to_owned(),
            secret: zeroize::Zeroizing::new(secret),
        })
    }
}

/// Collaborators shared by every step of a header pass.
#[derive(Clone, Copy)]
pub struct HeaderPass<'c> {
    pub store: &'c dyn CredentialStore,
    pub callback: &'c dyn SecretCallback,
    pub processor: &'c dyn TokenProcessor,
    pub compliance: ComplianceMode,
    pub derivation: &'c DerivationParams,
}

impl<'c> HeaderPass<'c> {
    /// Context for resolving against `results`.
    pub fn context<'r, 'a, 'input>(
        &self,
        document: &'r SecurityDocument<'a, 'input>,
        results: &'r ResultIndex,
    ) -> ResolveContext<'r, 'a, 'input>
    where
        'c: 'r,
    {
        ResolveContext::new(document, results, self.derivation)
            .with_store(self.store)
            .with_callback(self.callback)
            .with_processor(self.processor)
            .with_compliance(self.compliance)
    }

    /// Process the children of `security` in document order. Tokens may
    /// refer only to tokens that precede them.
    ///
    /// EncryptedKeys whose secret is unknown are skipped; every other failure
    /// aborts the pass.
    pub fn index_tokens(
        &self,
        document: &SecurityDocument<'_, '_>,
        security: roxmltree::Node<'_, '_>,
    ) -> Result<ResultIndex, Error> {
        let mut results = ResultIndex::new();
        for child in security.children().filter(|n| n.is_element()) {
            let name = child.tag_name().name();
            let entry = {
                let ctx = self.context(document, &results);
                self.process_token(child, &ctx)?
            };
            match entry {
                Some((id, result)) => {
                    debug!(%id, kind = result.kind(), "indexed security token");
                    results.insert(id, result)?;
                }
                None => debug!(element = name, "skipping header element"),
            }
        }
        Ok(results)
    }

    fn process_token(
        &self,
        node: roxmltree::Node<'_, '_>,
        ctx: &ResolveContext<'_, '_, '_>,
    ) -> Result<Option<(String, PriorResult)>, Error> {
        let keyed = |id: Option<&str>, result: PriorResult| {
            id.filter(|id| !id.is_empty())
                .map(|id| (id.to_owned(), result))
        };

        if is_element(node, ns::WSSE, ns::node::BINARY_SECURITY_TOKEN) {
            let token = BinarySecurityToken::from_node(node)?;
            let result = token.process(self.store, false)?;
            Ok(keyed(token.id.as_deref(), PriorResult::BinaryToken(result)))
        } else if is_element(node, ns::WSSE, ns::node::USERNAME_TOKEN) {
            let token = UsernameToken::from_node(node)?;
            let id = token.id.clone();
            Ok(keyed(id.as_deref(), PriorResult::UsernameToken(token)))
        } else if is_wsc(node, ns::node::DERIVED_KEY_TOKEN) {
            let result = process_derived_key_token(node, ctx)?;
            let id = result.token.id.clone();
            Ok(keyed(id.as_deref(), PriorResult::DerivedKeyToken(result)))
        } else if is_wsc(node, ns::node::SECURITY_CONTEXT_TOKEN) {
            let result = process_security_context_token(node, ctx)?;
            let id = result.id.clone();
            Ok(keyed(Some(id.as_str()), PriorResult::SecurityContextToken(result)))
        } else if is_element(node, ns::SAML1, ns::node::ASSERTION)
            || is_element(node, ns::SAML2, ns::node::ASSERTION)
        {
            let assertion = self.processor.process_assertion(node)?;
            let id = assertion.id.clone();
            Ok(keyed(Some(id.as_str()), PriorResult::SamlAssertion(Box::new(assertion))))
        } else if is_element(node, ns::ENC, ns::node::ENCRYPTED_KEY) {
            match self.processor.process_encrypted_key(node) {
                Ok(result) => {
                    let id = result.id.clone();
                    Ok(keyed(Some(id.as_str()), PriorResult::EncryptedKey(result)))
                }
                Err(Error::NotFound(detail)) => {
                    warn!(%detail, "leaving EncryptedKey unprocessed");
                    Ok(None)
                }
                Err(e) => Err(e),
            }
        } else {
            Ok(None)
        }
    }
}

fn is_wsc(node: roxmltree::Node<'_, '_>, local_name: &str) -> bool {
    is_element(node, ns::WSC_0502, local_name) || is_element(node, ns::WSC_0512, local_name)
}

/// Where a reference was found.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReferenceSite {
    Signature,
    EncryptedData,
    EncryptedKey,
}

/// Every `SecurityTokenReference` directly inside the `KeyInfo` of a
/// signature, an EncryptedData or an EncryptedKey, in document order.
pub fn key_info_references<'a, 'input>(
    document: &SecurityDocument<'a, 'input>,
) -> Vec<(ReferenceSite, roxmltree::Node<'a, 'input>)> {
    let mut found = Vec::new();
    for node in document.document().descendants().filter(|n| n.is_element()) {
        let site = if is_element(node, ns::DSIG, ns::node::SIGNATURE) {
            ReferenceSite::Signature
        } else if is_element(node, ns::ENC, ns::node::ENCRYPTED_DATA) {
            ReferenceSite::EncryptedData
        } else if is_element(node, ns::ENC, ns::node::ENCRYPTED_KEY) {
            ReferenceSite::EncryptedKey
        } else {
            continue;
        };
        if let Some(key_info) = child_element(node, ns::DSIG, ns::node::KEY_INFO) {
            found.extend(
                child_elements(key_info, ns::WSSE, ns::node::SECURITY_TOKEN_REFERENCE)
                    .into_iter()
                    .map(|str_node| (site, str_node)),
            );
        }
    }
    found
}

/// Parse every reference [`key_info_references`] finds.
pub fn parse_references<'a, 'input>(
    document: &SecurityDocument<'a, 'input>,
) -> Result<Vec<(ReferenceSite, SecurityTokenReference)>, Error> {
    key_info_references(document)
        .into_iter()
        .map(|(site, node)| Ok((site, SecurityTokenReference::from_node(node)?)))
        .collect()
}
