#![forbid(unsafe_code)]

//! Out-of-band retrieval of secrets and passwords.

use std::collections::HashMap;

use zeroize::Zeroizing;

/// Error type returned by [`SecretCallback`] implementations.
pub type CallbackError = Box<dyn std::error::Error + Send + Sync>;

/// What the requested secret will be used for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SecretUsage {
    /// A symmetric key named by an identifier or an external URI.
    SecretKey,
    /// The cleartext password of a UsernameToken.
    Password,
}

/// One secret request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SecretRequest<'a> {
    /// Identifier of the secret: an element id, external URI, EncryptedKeySHA1
    /// value or username.
    pub id: &'a str,
    /// The reference's value type or the token's password type, if known.
    pub type_hint: Option<&'a str>,
    pub usage: SecretUsage,
}

/// Application hook that supplies secrets the message does not carry.
///
/// `Ok(None)` means the secret is unknown; `Err` aborts resolution.
pub trait SecretCallback: Send + Sync {
    fn request_secret(&self, request: &SecretRequest<'_>) -> Result<Option<Vec<u8>>, CallbackError>;
}

/// A fixed table of secrets keyed by identifier.
#[derive(Default)]
pub struct SecretMap {
    secrets: HashMap<String, Zeroizing<Vec<u8>>>,
    passwords: HashMap<String, Zeroizing<String>>,
}

impl SecretMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_secret(&mut self, id: impl Into<String>, secret: Vec<u8>) {
        self.secrets.insert(id.into(), Zeroizing::new(secret));
    }

    pub fn insert_password(&mut self, username: impl Into<String>, password: impl Into<String>) {
        self.passwords
            .insert(username.into(), Zeroizing::new(password.into()));
    }
}

impl std::fmt::Debug for SecretMap {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SecretMap")
            .field("secrets", &self.secrets.keys().collect::<Vec<_>>())
            .field("passwords", &self.passwords.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl SecretCallback for SecretMap {
    fn request_secret(&self, request: &SecretRequest<'_>) -> Result<Option<Vec<u8>>, CallbackError> {
        Ok(match request.usage {
            SecretUsage::SecretKey => self.secrets.get(request.id).map(|s| s.to_vec()),
            SecretUsage::Password => self
                .passwords
                .get(request.id)
                .map(|p| p.as_bytes().to_vec()),
        })
    }
}
