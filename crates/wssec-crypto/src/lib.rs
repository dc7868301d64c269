#![forbid(unsafe_code)]

//! Cryptographic helpers for wssec: the Derived Key Engine (P_SHA1 and the
//! UsernameToken key derivation) and the SHA-1 digest used to fingerprint tokens.

pub mod digest;
pub mod kdf;

pub use kdf::{derive, DerivationAlgorithm, DerivationSpec};
