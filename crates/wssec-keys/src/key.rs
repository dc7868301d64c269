#![forbid(unsafe_code)]

//! Public key material attached to a resolved credential.

use spki::DecodePublicKey;
use wssec_core::Error;

/// A public key taken from a certificate or a `<ds:KeyValue>`.
#[derive(Clone, PartialEq, Eq)]
pub enum PublicKey {
    Rsa(rsa::RsaPublicKey),
    EcP256(p256::ecdsa::VerifyingKey),
    EcP384(p384::ecdsa::VerifyingKey),
}

impl PublicKey {
    /// Decode a DER `SubjectPublicKeyInfo`, trying each supported key type in turn.
    pub fn from_spki_der(spki_der: &[u8]) -> Result<Self, Error> {
        if let Ok(pk) = rsa::RsaPublicKey::from_public_key_der(spki_der) {
            return Ok(Self::Rsa(pk));
        }
        if let Ok(vk) = p256::ecdsa::VerifyingKey::from_public_key_der(spki_der) {
            return Ok(Self::EcP256(vk));
        }
        if let Ok(vk) = p384::ecdsa::VerifyingKey::from_public_key_der(spki_der) {
            return Ok(Self::EcP384(vk));
        }
        Err(Error::Key("unsupported SubjectPublicKeyInfo".into()))
    }

    /// Short name of the key type, for logs and the CLI.
    pub fn algorithm_name(&self) -> &'static str {
        match self {
            Self::Rsa(_) => "RSA",
            Self::EcP256(_) => "EC P-256",
            Self::EcP384(_) => "EC P-384",
        }
    }

    pub fn rsa(&self) -> Option<&rsa::RsaPublicKey> {
        match self {
            Self::Rsa(pk) => Some(pk),
            _ => None,
        }
    }
}

impl std::fmt::Debug for PublicKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Rsa(pk) => {
                use rsa::traits::PublicKeyParts;
                write!(f, "RSA public key ({} bits)", pk.n().bits())
            }
            Self::EcP256(_) => write!(f, "EC P-256 public key"),
            Self::EcP384(_) => write!(f, "EC P-384 public key"),
        }
    }
}
