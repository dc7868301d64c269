#![forbid(unsafe_code)]

//! Key derivation: the WS-SecureConversation P_SHA1 function and the
//! UsernameToken Profile 1.1 password-based derivation.

use digest::Digest;
use hmac::{Hmac, Mac};
use wssec_core::{algorithm, Error};

type HmacSha1 = Hmac<sha1::Sha1>;

/// Largest derived key, in bytes, that [`p_sha1`] will produce.
pub const MAX_DERIVED_KEY_LENGTH: u32 = 1024;

/// Largest output position (`offset + length`) [`p_sha1`] will reach.
pub const MAX_DERIVATION_OUTPUT: u32 = 64 * 1024;

/// Largest UsernameToken iteration count [`username_token_key`] accepts.
pub const MAX_ITERATIONS: u32 = 100_000;

/// Pseudo-random function used to expand a secret.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DerivationAlgorithm {
    /// HMAC-SHA1 based P_hash (RFC 2246, Section 5).
    #[default]
    PSha1,
}

impl DerivationAlgorithm {
    /// Parse a derivation algorithm from a DerivedKeyToken `Algorithm` URI.
    pub fn from_uri(uri: &str) -> Result<Self, Error> {
        match uri {
            algorithm::P_SHA1_0502 | algorithm::P_SHA1_0512 => Ok(Self::PSha1),
            _ => Err(Error::DerivationFailure(format!(
                "unsupported derivation algorithm: {uri}"
            ))),
        }
    }

    /// The WS-SecureConversation 2005/02 URI for this algorithm.
    pub fn uri(&self) -> &'static str {
        match self {
            Self::PSha1 => algorithm::P_SHA1_0502,
        }
    }
}

/// Inputs to one key derivation.
#[derive(Clone, Copy)]
pub struct DerivationSpec<'a> {
    /// The base secret being expanded.
    pub secret: &'a [u8],
    pub label: &'a [u8],
    pub nonce: &'a [u8],
    /// Number of leading output bytes to skip.
    pub offset: u32,
    /// Number of bytes to return.
    pub length: u32,
    pub algorithm: DerivationAlgorithm,
}

impl std::fmt::Debug for DerivationSpec<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DerivationSpec")
            .field("secret", &format_args!("<{} bytes>", self.secret.len()))
            .field("label", &String::from_utf8_lossy(self.label))
            .field("nonce_len", &self.nonce.len())
            .field("offset", &self.offset)
            .field("length", &self.length)
            .field("algorithm", &self.algorithm)
            .finish()
    }
}

/// Derive a key of exactly `spec.length` bytes.
///
/// The seed is `label || nonce`, as in WS-SecureConversation Section 7.
pub fn derive(spec: &DerivationSpec<'_>) -> Result<Vec<u8>, Error> {
    let mut seed = Vec::with_capacity(spec.label.len() + spec.nonce.len());
    seed.extend_from_slice(spec.label);
    seed.extend_from_slice(spec.nonce);

    tracing::trace!(?spec, "deriving key");
    match spec.algorithm {
        DerivationAlgorithm::PSha1 => p_sha1(spec.secret, &seed, spec.offset, spec.length),
    }
}

/// P_SHA1(secret, seed), returning bytes `[offset, offset + length)` of the
/// output stream.
///
/// ```text
/// A(0) = seed
/// A(i) = HMAC_SHA1(secret, A(i-1))
/// P_SHA1 = HMAC_SHA1(secret, A(1) || seed) || HMAC_SHA1(secret, A(2) || seed) || ...
/// ```
pub fn p_sha1(secret: &[u8], seed: &[u8], offset: u32, length: u32) -> Result<Vec<u8>, Error> {
    if secret.is_empty() {
        return Err(Error::DerivationFailure("empty secret".into()));
    }
    if length == 0 {
        return Err(Error::DerivationFailure("derived key length must be positive".into()));
    }
    check_derivation_bounds(offset, length)?;
    let offset = offset as usize;
    let required = offset + length as usize;

    let mac = <HmacSha1 as Mac>::new_from_slice(secret)
        .map_err(|e| Error::DerivationFailure(format!("HMAC key: {e}")))?;

    let mut output = Vec::with_capacity(required + 20);
    let mut a = seed.to_vec();
    while output.len() < required {
        let mut m = mac.clone();
        m.update(&a);
        a = m.finalize().into_bytes().to_vec();

        let mut m = mac.clone();
        m.update(&a);
        m.update(seed);
        output.extend_from_slice(&m.finalize().into_bytes());
    }

    Ok(output[offset..required].to_vec())
}

/// Reject a derivation window that would make [`p_sha1`] allocate or
/// iterate more than [`MAX_DERIVED_KEY_LENGTH`] and [`MAX_DERIVATION_OUTPUT`]
/// allow. Callers parsing untrusted tokens check this before deriving.
pub fn check_derivation_bounds(offset: u32, length: u32) -> Result<(), Error> {
    if length > MAX_DERIVED_KEY_LENGTH {
        return Err(Error::DerivationFailure(format!(
            "derived key length {length} exceeds {MAX_DERIVED_KEY_LENGTH} bytes"
        )));
    }
    match offset.checked_add(length) {
        Some(end) if end <= MAX_DERIVATION_OUTPUT => Ok(()),
        _ => Err(Error::DerivationFailure(format!(
            "derivation window {offset}+{length} exceeds {MAX_DERIVATION_OUTPUT} bytes"
        ))),
    }
}

/// Reject a UsernameToken iteration count outside `1..=MAX_ITERATIONS`.
pub fn check_iterations(iterations: u32) -> Result<(), Error> {
    match iterations {
        0 => Err(Error::DerivationFailure("iteration count must be positive".into())),
        n if n > MAX_ITERATIONS => Err(Error::DerivationFailure(format!(
            "iteration count {n} exceeds {MAX_ITERATIONS}"
        ))),
        _ => Ok(()),
    }
}

/// UsernameToken Profile 1.1 key derivation:
/// `K1 = SHA1(password || salt)`, `Ki = SHA1(K(i-1))`, returning `K(iterations)`.
pub fn username_token_key(password: &[u8], salt: &[u8], iterations: u32) -> Result<Vec<u8>, Error> {
    if password.is_empty() {
        return Err(Error::DerivationFailure("empty password".into()));
    }
    check_iterations(iterations)?;
    let mut hasher = sha1::Sha1::new();
    hasher.update(password);
    hasher.update(salt);
    let mut k = hasher.finalize();
    for _ in 1..iterations {
        k = sha1::Sha1::digest(k);
    }
    Ok(k.to_vec())
}

/// Non-standard secret derived from a UsernameToken by WSE-compatible peers:
/// P_SHA1 over the password with seed `"WS-SecureConversation" || nonce || created`.
pub fn username_token_secret(
    password: &[u8],
    nonce: &[u8],
    created: &[u8],
    length: u32,
) -> Result<Vec<u8>, Error> {
    let label = algorithm::WSC_DEFAULT_LABEL.as_bytes();
    let mut seed = Vec::with_capacity(label.len() + nonce.len() + created.len());
    seed.extend_from_slice(label);
    seed.extend_from_slice(nonce);
    seed.extend_from_slice(created);
    p_sha1(password, &seed, 0, length)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hmac_sha1(key: &[u8], parts: &[&[u8]]) -> Vec<u8> {
        let mut m = <HmacSha1 as Mac>::new_from_slice(key).unwrap();
        for p in parts {
            m.update(p);
        }
        m.finalize().into_bytes().to_vec()
    }

    #[test]
    fn test_p_sha1_matches_hmac_chain() {
        let secret: &[u8] = b"shared secret";
        let seed: &[u8] = b"WS-SecureConversationWS-SecureConversation0123456789abcdef";

        let a1 = hmac_sha1(secret, &[seed]);
        let a2 = hmac_sha1(secret, &[a1.as_slice()]);
        let mut expected = hmac_sha1(secret, &[a1.as_slice(), seed]);
        expected.extend(hmac_sha1(secret, &[a2.as_slice(), seed]));

        let out = p_sha1(secret, seed, 0, 40).unwrap();
        assert_eq!(out, expected);
    }

    #[test]
    fn test_p_sha1_offset_is_a_window() {
        let secret = hex::decode("000102030405060708090a0b0c0d0e0f").unwrap();
        let seed = b"label-and-nonce";
        let full = p_sha1(&secret, seed, 0, 64).unwrap();
        let window = p_sha1(&secret, seed, 21, 32).unwrap();
        assert_eq!(window, full[21..53]);
    }

    #[test]
    fn test_derive_exact_length_and_deterministic() {
        let secret = [0x42u8; 32];
        let spec = DerivationSpec {
            secret: &secret,
            label: b"WS-SecureConversationWS-SecureConversation",
            nonce: b"0123456789abcdef",
            offset: 0,
            length: 16,
            algorithm: DerivationAlgorithm::PSha1,
        };
        let k1 = derive(&spec).unwrap();
        let k2 = derive(&spec).unwrap();
        assert_eq!(k1.len(), 16);
        assert_eq!(k1, k2);

        let other_nonce = DerivationSpec {
            nonce: b"fedcba9876543210",
            ..spec
        };
        assert_ne!(derive(&other_nonce).unwrap(), k1);
    }

    #[test]
    fn test_derive_rejects_bad_inputs() {
        let spec = DerivationSpec {
            secret: &[],
            label: b"l",
            nonce: b"n",
            offset: 0,
            length: 16,
            algorithm: DerivationAlgorithm::PSha1,
        };
        assert!(matches!(derive(&spec), Err(Error::DerivationFailure(_))));

        let spec = DerivationSpec {
            secret: b"k",
            length: 0,
            ..spec
        };
        assert!(matches!(derive(&spec), Err(Error::DerivationFailure(_))));
    }

    #[test]
    fn test_algorithm_from_uri() {
        assert_eq!(
            DerivationAlgorithm::from_uri(algorithm::P_SHA1_0502).unwrap(),
            DerivationAlgorithm::PSha1
        );
        assert_eq!(
            DerivationAlgorithm::from_uri(algorithm::P_SHA1_0512).unwrap(),
            DerivationAlgorithm::PSha1
        );
        assert!(matches!(
            DerivationAlgorithm::from_uri("http://example.com/dk/p_sha256"),
            Err(Error::DerivationFailure(_))
        ));
    }

    #[test]
    fn test_username_token_key_iterations() {
        let salt = hex::decode("01000000000000000000000000000000").unwrap();
        let once = username_token_key(b"verySecret", &salt, 1).unwrap();

        let mut joined = b"verySecret".to_vec();
        joined.extend_from_slice(&salt);
        assert_eq!(once, sha1::Sha1::digest(&joined).to_vec());

        let twice = username_token_key(b"verySecret", &salt, 2).unwrap();
        assert_eq!(twice, sha1::Sha1::digest(&once).to_vec());
        assert_eq!(twice.len(), 20);

        assert!(username_token_key(b"verySecret", &salt, 0).is_err());
    }

    #[test]
    fn test_username_token_key_iteration_cap() {
        let salt = [1u8; 16];
        assert!(username_token_key(b"verySecret", &salt, MAX_ITERATIONS).is_ok());
        assert!(matches!(
            username_token_key(b"verySecret", &salt, MAX_ITERATIONS + 1),
            Err(Error::DerivationFailure(_))
        ));
        assert!(matches!(
            username_token_key(b"verySecret", &salt, u32::MAX),
            Err(Error::DerivationFailure(_))
        ));
    }

    #[test]
    fn test_p_sha1_rejects_oversized_windows() {
        let secret = [1u8; 32];
        let seed = b"label-and-nonce";
        assert_eq!(
            p_sha1(&secret, seed, 0, MAX_DERIVED_KEY_LENGTH).unwrap().len(),
            MAX_DERIVED_KEY_LENGTH as usize
        );
        let last = MAX_DERIVATION_OUTPUT - 16;
        assert_eq!(p_sha1(&secret, seed, last, 16).unwrap().len(), 16);

        for (offset, length) in [
            (0, u32::MAX),
            (0, MAX_DERIVED_KEY_LENGTH + 1),
            (u32::MAX, 16),
            (last + 1, 16),
        ] {
            assert!(
                matches!(p_sha1(&secret, seed, offset, length), Err(Error::DerivationFailure(_))),
                "offset {offset} length {length}"
            );
        }
        assert!(username_token_secret(b"pw", b"n", b"c", u32::MAX).is_err());
    }

    #[test]
    fn test_username_token_secret_length() {
        let key = username_token_secret(b"verySecret", b"nonce", b"2024-01-01T00:00:00Z", 24).unwrap();
        assert_eq!(key.len(), 24);
    }
}
