#![forbid(unsafe_code)]

//! Resolution of WS-Security `SecurityTokenReference` elements.
//!
//! A reference found in a signature or encryption `KeyInfo` is parsed into a
//! [`SecurityTokenReference`] and handed to [`resolve`] together with a
//! [`ResolveContext`]. The result is a [`Credential`]: the certificates,
//! public key or secret key the reference denotes, plus the principal that
//! owns it.

pub mod bsp;
pub mod callback;
pub mod context;
pub mod credential;
pub mod reference;
pub mod resolve;
pub mod result;
pub mod saml;
pub mod token;

pub use callback::{CallbackError, SecretCallback, SecretMap, SecretRequest, SecretUsage};
pub use context::{ComplianceMode, DerivationParams, ResolveContext, TokenProcessor};
pub use credential::{
    Credential, DerivedKeyPrincipal, Principal, PrincipalToken, UsernameTokenPrincipal,
};
pub use reference::{KeyIdentifierType, ReferenceKind, SecurityTokenReference};
pub use resolve::resolve;
pub use result::{
    BinaryTokenResult, DerivedKeyTokenResult, EncryptedKeyResult, PriorResult, ResultIndex,
    SecurityContextResult,
};
pub use saml::{SamlAssertion, SamlVersion};
pub use token::{
    process_derived_key_token, process_security_context_token, BinarySecurityToken,
    DerivedKeyToken, UsernameToken,
};
