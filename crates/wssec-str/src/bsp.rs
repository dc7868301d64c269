#![forbid(unsafe_code)]

//! Basic Security Profile 1.1 checks on how a reference is encoded.
//!
//! Each check inspects attribute strings only and fails closed with
//! [`Error::ComplianceViolation`]. Callers run them before any key material
//! is touched, and only in [`crate::ComplianceMode::Strict`].

use wssec_core::{ns, Error};

use crate::reference::{KeyIdentifierType, ReferenceKind, SecurityTokenReference};
use crate::saml::SamlVersion;

fn violation(rule: &str, detail: impl std::fmt::Display) -> Error {
    tracing::warn!(rule, %detail, "rejecting non-compliant SecurityTokenReference");
    Error::ComplianceViolation(format!("{rule}: {detail}"))
}

/// Structural rules every reference must satisfy.
pub fn check_reference_structure(str_ref: &SecurityTokenReference) -> Result<(), Error> {
    if str_ref.child_count != 1 {
        return Err(violation(
            "R3061",
            format_args!(
                "SecurityTokenReference must have exactly one child element, found {}",
                str_ref.child_count
            ),
        ));
    }
    if let ReferenceKind::KeyIdentifier {
        value_type,
        encoding_type,
        ..
    } = &str_ref.kind
    {
        if *value_type == KeyIdentifierType::Missing {
            return Err(violation("R3054", "KeyIdentifier has no ValueType"));
        }
        if !value_type.is_saml() && encoding_type.as_deref() != Some(ns::BASE64_ENCODING) {
            return Err(violation(
                "R3070",
                format_args!(
                    "KeyIdentifier EncodingType must be Base64Binary, found {:?}",
                    encoding_type
                ),
            ));
        }
    }
    Ok(())
}

/// A reference to a binary security token of type `token_value_type`, or a
/// key identifier naming a certificate (`token_value_type` is `None`).
pub fn check_binary_token(
    str_ref: &SecurityTokenReference,
    token_value_type: Option<&str>,
) -> Result<(), Error> {
    match &str_ref.kind {
        ReferenceKind::DirectReference { value_type, .. } => {
            if let Some(token_type) = token_value_type {
                if value_type.as_deref() != Some(token_type) {
                    return Err(violation(
                        "R3058",
                        format_args!(
                            "Reference ValueType {:?} does not match token type {token_type}",
                            value_type
                        ),
                    ));
                }
            }
        }
        ReferenceKind::KeyIdentifier { value_type, .. } => {
            if !matches!(
                value_type,
                KeyIdentifierType::SubjectKeyIdentifier
                    | KeyIdentifierType::ThumbprintSha1
                    | KeyIdentifierType::X509V3
            ) {
                return Err(violation(
                    "R3063",
                    format_args!("KeyIdentifier type {:?} cannot name a certificate", value_type),
                ));
            }
        }
        ReferenceKind::X509Data { .. } => {}
    }

    if token_value_type == Some(ns::X509_PKI_PATH_TYPE)
        && str_ref.token_type.as_deref() != Some(ns::X509_PKI_PATH_TYPE)
    {
        return Err(violation(
            "R5215",
            "reference to a PKIPath token must carry TokenType X509PKIPathv1",
        ));
    }
    Ok(())
}

/// A reference to an `xenc:EncryptedKey`.
pub fn check_encrypted_key(str_ref: &SecurityTokenReference) -> Result<(), Error> {
    if let Some(value_type) = str_ref.key_identifier_type() {
        if *value_type != KeyIdentifierType::EncryptedKeySha1 {
            return Err(violation(
                "R3063",
                format_args!("KeyIdentifier type {:?} cannot name an EncryptedKey", value_type),
            ));
        }
    }
    if str_ref.token_type.as_deref() != Some(ns::ENC_KEY_TOKEN_TYPE) {
        return Err(violation(
            "R5215",
            "reference to an EncryptedKey must carry TokenType EncryptedKey",
        ));
    }
    Ok(())
}

/// A reference to a SAML assertion of the given version.
pub fn check_saml(str_ref: &SecurityTokenReference, version: SamlVersion) -> Result<(), Error> {
    let expected = match version {
        SamlVersion::V1_1 => KeyIdentifierType::SamlAssertionId,
        SamlVersion::V2_0 => KeyIdentifierType::Saml2Id,
    };
    if let Some(value_type) = str_ref.key_identifier_type() {
        if *value_type != expected {
            return Err(violation(
                "R6603",
                format_args!("KeyIdentifier type {:?} does not match a {version:?} assertion", value_type),
            ));
        }
    }
    if str_ref.token_type.as_deref() != Some(version.token_type()) {
        return Err(violation(
            "R6611",
            format_args!("reference to a {version:?} assertion must carry TokenType {}", version.token_type()),
        ));
    }
    Ok(())
}

/// A reference to a UsernameToken.
pub fn check_username_token(str_ref: &SecurityTokenReference) -> Result<(), Error> {
    match &str_ref.kind {
        ReferenceKind::DirectReference { value_type, .. }
            if value_type.as_deref() == Some(ns::USERNAME_TOKEN_VALUE_TYPE) =>
        {
            Ok(())
        }
        ReferenceKind::DirectReference { value_type, .. } => Err(violation(
            "R4214",
            format_args!("Reference ValueType {:?} is not UsernameToken", value_type),
        )),
        _ => Err(violation(
            "R4215",
            "a UsernameToken can only be referenced with a direct Reference",
        )),
    }
}
