#![forbid(unsafe_code)]

//! Algorithm URI constants and the symmetric key lengths they imply.
//!
//! A DerivedKeyToken without an explicit `<Length>` derives as many bytes as
//! the signature or encryption algorithm that consumes the key requires;
//! [`key_length`] provides that mapping.

// ── Digest algorithms ────────────────────────────────────────────────

pub const SHA1: &str = "http://www.w3.org/2000/09/xmldsig#sha1";
pub const SHA256: &str = "http://www.w3.org/2001/04/xmlenc#sha256";

// ── HMAC signature algorithms ────────────────────────────────────────

pub const HMAC_SHA1: &str = "http://www.w3.org/2000/09/xmldsig#hmac-sha1";
pub const HMAC_SHA224: &str = "http://www.w3.org/2001/04/xmldsig-more#hmac-sha224";
pub const HMAC_SHA256: &str = "http://www.w3.org/2001/04/xmldsig-more#hmac-sha256";
pub const HMAC_SHA384: &str = "http://www.w3.org/2001/04/xmldsig-more#hmac-sha384";
pub const HMAC_SHA512: &str = "http://www.w3.org/2001/04/xmldsig-more#hmac-sha512";
pub const HMAC_MD5: &str = "http://www.w3.org/2001/04/xmldsig-more#hmac-md5";

// ── Block cipher algorithms ──────────────────────────────────────────

pub const AES128_CBC: &str = "http://www.w3.org/2001/04/xmlenc#aes128-cbc";
pub const AES192_CBC: &str = "http://www.w3.org/2001/04/xmlenc#aes192-cbc";
pub const AES256_CBC: &str = "http://www.w3.org/2001/04/xmlenc#aes256-cbc";
pub const AES128_GCM: &str = "http://www.w3.org/2009/xmlenc11#aes128-gcm";
pub const AES192_GCM: &str = "http://www.w3.org/2009/xmlenc11#aes192-gcm";
pub const AES256_GCM: &str = "http://www.w3.org/2009/xmlenc11#aes256-gcm";
pub const TRIPLEDES_CBC: &str = "http://www.w3.org/2001/04/xmlenc#tripledes-cbc";

// ── Key wrap algorithms ──────────────────────────────────────────────

pub const KW_AES128: &str = "http://www.w3.org/2001/04/xmlenc#kw-aes128";
pub const KW_AES192: &str = "http://www.w3.org/2001/04/xmlenc#kw-aes192";
pub const KW_AES256: &str = "http://www.w3.org/2001/04/xmlenc#kw-aes256";
pub const KW_TRIPLEDES: &str = "http://www.w3.org/2001/04/xmlenc#kw-tripledes";

// ── Key derivation algorithms ────────────────────────────────────────

/// P_SHA1 as named by WS-SecureConversation 2005/02.
pub const P_SHA1_0502: &str = "http://schemas.xmlsoap.org/ws/2005/02/sc/dk/p_sha1";
/// P_SHA1 as named by WS-SecureConversation 1.3 (2005/12).
pub const P_SHA1_0512: &str =
    "http://docs.oasis-open.org/ws-sx/ws-secureconversation/200512/dk/p_sha1";

/// Label used by WS-SecureConversation when a DerivedKeyToken carries none.
pub const WSC_DEFAULT_LABEL: &str = "WS-SecureConversation";

/// Symmetric key length in bytes required by a signature or encryption
/// algorithm, or `None` if the algorithm is not a symmetric one we know.
pub fn key_length(uri: &str) -> Option<usize> {
    match uri {
        TRIPLEDES_CBC | KW_TRIPLEDES => Some(24),
        AES128_CBC | AES128_GCM | KW_AES128 => Some(16),
        AES192_CBC | AES192_GCM | KW_AES192 => Some(24),
        AES256_CBC | AES256_GCM | KW_AES256 => Some(32),
        HMAC_SHA1 => Some(20),
        HMAC_SHA224 => Some(28),
        HMAC_SHA256 => Some(32),
        HMAC_SHA384 => Some(48),
        HMAC_SHA512 => Some(64),
        HMAC_MD5 => Some(16),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_length_for_symmetric_algorithms() {
        assert_eq!(key_length(AES128_CBC), Some(16));
        assert_eq!(key_length(AES256_GCM), Some(32));
        assert_eq!(key_length(TRIPLEDES_CBC), Some(24));
        assert_eq!(key_length(HMAC_SHA1), Some(20));
    }

    #[test]
    fn test_key_length_unknown_algorithm() {
        assert_eq!(key_length(SHA256), None);
        assert_eq!(key_length("urn:example:not-an-algorithm"), None);
    }
}
