#![forbid(unsafe_code)]

//! Results of security-header elements that were already processed, indexed
//! by the identifiers references use to reach them.

use std::collections::HashMap;

use wssec_core::Error;
use wssec_keys::X509Certificate;
use zeroize::Zeroizing;

use crate::saml::SamlAssertion;
use crate::token::{DerivedKeyToken, UsernameToken};

/// A processed `wsse:BinarySecurityToken`.
#[derive(Debug, Clone)]
pub struct BinaryTokenResult {
    pub id: String,
    pub value_type: String,
    /// End entity first.
    pub certificates: Vec<X509Certificate>,
    /// Set once a validator has checked trust in the certificates.
    pub validated: bool,
}

/// A decrypted `xenc:EncryptedKey`.
#[derive(Clone)]
pub struct EncryptedKeyResult {
    pub id: String,
    pub secret: Zeroizing<Vec<u8>>,
}

/// An established `wsc:SecurityContextToken`.
#[derive(Clone)]
pub struct SecurityContextResult {
    pub id: String,
    pub identifier: String,
    pub secret: Zeroizing<Vec<u8>>,
}

/// A `wsc:DerivedKeyToken` whose base secret has been resolved.
#[derive(Clone)]
pub struct DerivedKeyTokenResult {
    pub token: DerivedKeyToken,
    pub base_secret: Zeroizing<Vec<u8>>,
}

/// Outcome of processing one security-header element.
#[derive(Debug, Clone)]
pub enum PriorResult {
    UsernameToken(UsernameToken),
    BinaryToken(BinaryTokenResult),
    EncryptedKey(EncryptedKeyResult),
    SecurityContextToken(SecurityContextResult),
    DerivedKeyToken(DerivedKeyTokenResult),
    SamlAssertion(Box<SamlAssertion>),
}

impl PriorResult {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::UsernameToken(_) => "UsernameToken",
            Self::BinaryToken(_) => "BinarySecurityToken",
            Self::EncryptedKey(_) => "EncryptedKey",
            Self::SecurityContextToken(_) => "SecurityContextToken",
            Self::DerivedKeyToken(_) => "DerivedKeyToken",
            Self::SamlAssertion(_) => "SamlAssertion",
        }
    }
}

macro_rules! redacted_debug {
    ($ty:ident, $secret:ident, $($field:ident),*) => {
        impl std::fmt::Debug for $ty {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.debug_struct(stringify!($ty))
                    $(.field(stringify!($field), &self.$field))*
                    .field(stringify!($secret), &format_args!("<{} bytes>", self.$secret.len()))
                    .finish()
            }
        }
    };
}

redacted_debug!(EncryptedKeyResult, secret, id);
redacted_debug!(SecurityContextResult, secret, id, identifier);
redacted_debug!(DerivedKeyTokenResult, base_secret, token);

/// Identifier → prior result, for one document pass.
#[derive(Debug, Default)]
pub struct ResultIndex {
    entries: HashMap<String, PriorResult>,
}

impl ResultIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a result under `id`. An identifier can only be bound once.
    pub fn insert(&mut self, id: impl Into<String>, result: PriorResult) -> Result<(), Error> {
        let id = id.into();
        if self.entries.contains_key(&id) {
            return Err(Error::XmlStructure(format!(
                "security header element id \"{id}\" was processed twice"
            )));
        }
        self.entries.insert(id, result);
        Ok(())
    }

    pub fn get(&self, id: &str) -> Option<&PriorResult> {
        self.entries.get(id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn encrypted_key(id: &str) -> PriorResult {
        PriorResult::EncryptedKey(EncryptedKeyResult {
            id: id.to_string(),
            secret: Zeroizing::new(vec![7u8; 16]),
        })
    }

    #[test]
    fn test_insert_and_get() {
        let mut index = ResultIndex::new();
        assert!(index.is_empty());
        index.insert("EK-1", encrypted_key("EK-1")).unwrap();
        // also reachable through its EncryptedKeySHA1 identifier
        index.insert("c2hhMQ==", encrypted_key("EK-1")).unwrap();
        assert_eq!(index.len(), 2);
        assert_eq!(index.get("EK-1").map(PriorResult::kind), Some("EncryptedKey"));
        assert!(index.get("EK-2").is_none());
    }

    #[test]
    fn test_duplicate_id_rejected() {
        let mut index = ResultIndex::new();
        index.insert("EK-1", encrypted_key("EK-1")).unwrap();
        assert!(matches!(
            index.insert("EK-1", encrypted_key("EK-1")),
            Err(Error::XmlStructure(_))
        ));
    }

    #[test]
    fn test_debug_redacts_secret() {
        let shown = format!("{:?}", encrypted_key("EK-1"));
        assert!(shown.contains("<16 bytes>"));
        assert!(!shown.contains("7, 7"));
    }
}
