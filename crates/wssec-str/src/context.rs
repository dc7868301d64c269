#![forbid(unsafe_code)]

//! Everything a resolution may consult, passed explicitly.

use wssec_core::{algorithm, Error};
use wssec_keys::CredentialStore;
use wssec_xml::SecurityDocument;

use crate::callback::SecretCallback;
use crate::result::{EncryptedKeyResult, ResultIndex};
use crate::saml::SamlAssertion;

/// Whether Basic Security Profile 1.1 checks are enforced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ComplianceMode {
    #[default]
    Strict,
    Permissive,
}

impl ComplianceMode {
    pub fn is_strict(self) -> bool {
        self == Self::Strict
    }
}

/// Inputs for secrets whose length is not carried by the token.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DerivationParams {
    /// Signature or encryption algorithm URI the resolved key will be used with.
    pub algorithm: Option<String>,
    /// Explicit secret length in bytes; overrides the algorithm's.
    pub secret_key_length: Option<u32>,
}

impl DerivationParams {
    pub fn for_algorithm(uri: impl Into<String>) -> Self {
        Self {
            algorithm: Some(uri.into()),
            secret_key_length: None,
        }
    }

    /// Length of a symmetric key for the configured algorithm.
    pub fn algorithm_key_length(&self) -> Result<u32, Error> {
        let uri = self
            .algorithm
            .as_deref()
            .ok_or_else(|| Error::DerivationFailure("no algorithm to size the key for".into()))?;
        algorithm::key_length(uri)
            .map(|len| len as u32)
            .ok_or_else(|| Error::DerivationFailure(format!("unknown key length for {uri}")))
    }

    /// The explicit secret length, else the algorithm's key length.
    pub fn secret_key_length(&self) -> Result<u32, Error> {
        match self.secret_key_length {
            Some(0) => Err(Error::DerivationFailure("secret key length must be positive".into())),
            Some(len) => Ok(len),
            None => self.algorithm_key_length(),
        }
    }
}

/// Hooks into the enclosing security-header pass for tokens a reference
/// points at before they were processed.
pub trait TokenProcessor: Send + Sync {
    /// Process (verify, decrypt proof keys of) a SAML assertion element.
    fn process_assertion(&self, node: roxmltree::Node<'_, '_>) -> Result<SamlAssertion, Error>;

    /// Decrypt an `xenc:EncryptedKey` element.
    fn process_encrypted_key(&self, node: roxmltree::Node<'_, '_>)
        -> Result<EncryptedKeyResult, Error>;
}

/// Parameters of one call to [`crate::resolve`].
#[derive(Clone, Copy)]
pub struct ResolveContext<'c, 'a, 'input> {
    pub document: &'c SecurityDocument<'a, 'input>,
    pub results: &'c ResultIndex,
    pub store: Option<&'c dyn CredentialStore>,
    pub callback: Option<&'c dyn SecretCallback>,
    pub processor: Option<&'c dyn TokenProcessor>,
    pub compliance: ComplianceMode,
    pub derivation: &'c DerivationParams,
}

impl<'c, 'a, 'input> ResolveContext<'c, 'a, 'input> {
    /// A strict context with no collaborators.
    pub fn new(
        document: &'c SecurityDocument<'a, 'input>,
        results: &'c ResultIndex,
        derivation: &'c DerivationParams,
    ) -> Self {
        Self {
            document,
            results,
            store: None,
            callback: None,
            processor: None,
            compliance: ComplianceMode::Strict,
            derivation,
        }
    }

    pub fn with_store(mut self, store: &'c dyn CredentialStore) -> Self {
        self.store = Some(store);
        self
    }

    pub fn with_callback(mut self, callback: &'c dyn SecretCallback) -> Self {
        self.callback = Some(callback);
        self
    }

    pub fn with_processor(mut self, processor: &'c dyn TokenProcessor) -> Self {
        self.processor = Some(processor);
        self
    }

    pub fn with_compliance(mut self, compliance: ComplianceMode) -> Self {
        self.compliance = compliance;
        self
    }

    pub(crate) fn require_store(&self) -> Result<&'c dyn CredentialStore, Error> {
        self.store
            .ok_or_else(|| Error::Configuration("no credential store configured".into()))
    }

    pub(crate) fn require_processor(&self) -> Result<&'c dyn TokenProcessor, Error> {
        self.processor
            .ok_or_else(|| Error::Configuration("no token processor configured".into()))
    }
}
