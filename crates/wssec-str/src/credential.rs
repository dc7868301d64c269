#![forbid(unsafe_code)]

//! The outcome of resolving a reference.

use wssec_keys::{PublicKey, X509Certificate};
use zeroize::Zeroizing;

use crate::saml::SamlAssertion;

/// Identity attached to a credential.
#[derive(Debug, Clone, Default)]
pub struct Principal {
    /// Subject DN, username, token id or context identifier.
    pub name: String,
    /// The token the principal was created from, when the caller may need it.
    pub token: Option<PrincipalToken>,
}

impl Principal {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            token: None,
        }
    }
}

#[derive(Debug, Clone)]
pub enum PrincipalToken {
    UsernameToken(UsernameTokenPrincipal),
    DerivedKey(DerivedKeyPrincipal),
    Saml(Box<SamlAssertion>),
}

#[derive(Debug, Clone)]
pub struct UsernameTokenPrincipal {
    pub password_type: Option<String>,
    pub nonce: Option<Vec<u8>>,
    pub created: Option<String>,
}

/// Parameters of a DerivedKeyToken plus the base secret it was derived from.
#[derive(Clone)]
pub struct DerivedKeyPrincipal {
    pub id: String,
    pub nonce: Vec<u8>,
    pub label: String,
    pub offset: u32,
    pub length: u32,
    pub base_secret: Zeroizing<Vec<u8>>,
}

impl std::fmt::Debug for DerivedKeyPrincipal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DerivedKeyPrincipal")
            .field("id", &self.id)
            .field("label", &self.label)
            .field("offset", &self.offset)
            .field("length", &self.length)
            .finish_non_exhaustive()
    }
}

/// Key material and identity a reference resolved to.
///
/// At least one of `certificates`, `public_key` and `secret_key` is set.
#[derive(Clone, Default)]
pub struct Credential {
    /// Certificate chain, end entity first.
    pub certificates: Vec<X509Certificate>,
    pub public_key: Option<PublicKey>,
    pub secret_key: Option<Zeroizing<Vec<u8>>>,
    pub principal: Principal,
    /// True when resolution already established trust in the material.
    pub trusted: bool,
}

impl Credential {
    pub fn is_empty(&self) -> bool {
        self.certificates.is_empty() && self.public_key.is_none() && self.secret_key.is_none()
    }

    /// The leading certificate.
    pub fn certificate(&self) -> Option<&X509Certificate> {
        self.certificates.first()
    }

    pub fn secret_key(&self) -> Option<&[u8]> {
        self.secret_key.as_deref().map(Vec::as_slice)
    }
}

impl std::fmt::Debug for Credential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credential")
            .field("certificates", &self.certificates)
            .field("public_key", &self.public_key)
            .field(
                "secret_key",
                &self.secret_key.as_ref().map(|k| format!("<{} bytes>", k.len())),
            )
            .field("principal", &self.principal)
            .field("trusted", &self.trusted)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_debug_redacts_secret() {
        let credential = Credential {
            secret_key: Some(Zeroizing::new(b"hunter2hunter2".to_vec())),
            principal: Principal::named("EK-1"),
            ..Default::default()
        };
        let shown = format!("{credential:?}");
        assert!(shown.contains("<14 bytes>"));
        assert!(!shown.contains("hunter2"));
        assert!(!credential.is_empty());
        assert_eq!(credential.secret_key(), Some(&b"hunter2hunter2"[..]));
    }

    #[test]
    fn test_empty_credential() {
        let credential = Credential::default();
        assert!(credential.is_empty());
        assert!(credential.certificate().is_none());
        assert!(!credential.trusted);
    }
}
