#![forbid(unsafe_code)]

//! Resolution of a `SecurityTokenReference` to a [`Credential`].

use tracing::debug;
use wssec_core::{ns, Error};
use wssec_keys::CertificateIdentifier;
use wssec_xml::document::{is_element, wsu_id};
use zeroize::Zeroizing;

use crate::bsp;
use crate::callback::{SecretRequest, SecretUsage};
use crate::context::ResolveContext;
use crate::credential::{Credential, Principal, PrincipalToken, UsernameTokenPrincipal};
use crate::reference::{KeyIdentifierType, ReferenceKind, SecurityTokenReference};
use crate::result::PriorResult;
use crate::saml::SamlAssertion;
use crate::token::BinarySecurityToken;

/// What a KeyIdentifier names, decided from its type tag alone.
#[derive(Debug, Clone, Copy)]
enum KeyIdentifierTarget {
    EncryptedKey,
    SamlAssertion,
    Certificate(CertificateIdentifier),
}

impl KeyIdentifierTarget {
    fn for_type(value_type: &KeyIdentifierType) -> Result<Self, Error> {
        match value_type {
            KeyIdentifierType::EncryptedKeySha1 => Ok(Self::EncryptedKey),
            KeyIdentifierType::SamlAssertionId | KeyIdentifierType::Saml2Id => {
                Ok(Self::SamlAssertion)
            }
            KeyIdentifierType::X509V3 => Ok(Self::Certificate(CertificateIdentifier::X509V3)),
            KeyIdentifierType::SubjectKeyIdentifier => {
                Ok(Self::Certificate(CertificateIdentifier::SubjectKeyIdentifier))
            }
            KeyIdentifierType::ThumbprintSha1 => {
                Ok(Self::Certificate(CertificateIdentifier::ThumbprintSha1))
            }
            KeyIdentifierType::Unrecognized(_) | KeyIdentifierType::Missing => Err(
                Error::UnsupportedTokenType(format!("KeyIdentifier ValueType {value_type:?}")),
            ),
        }
    }
}

/// The lookup a reference asks for once its KeyIdentifier type is known.
enum Lookup<'r> {
    Direct(&'r str),
    IssuerSerial { issuer: &'r str, serial: &'r str },
    KeyIdentifier(KeyIdentifierTarget, &'r str),
}

impl<'r> Lookup<'r> {
    fn of(reference: &'r SecurityTokenReference) -> Result<Self, Error> {
        Ok(match &reference.kind {
            ReferenceKind::DirectReference { uri, .. } => Self::Direct(uri),
            ReferenceKind::X509Data { issuer, serial } => Self::IssuerSerial { issuer, serial },
            ReferenceKind::KeyIdentifier {
                value_type, value, ..
            } => Self::KeyIdentifier(KeyIdentifierTarget::for_type(value_type)?, value),
        })
    }
}

/// Resolve `reference` to the key material and identity it denotes.
///
/// A result already recorded for the referenced identifier takes precedence
/// over the element in the document. The returned credential holds at least
/// one of certificates, a public key or a secret key.
pub fn resolve(
    reference: &SecurityTokenReference,
    ctx: &ResolveContext<'_, '_, '_>,
) -> Result<Credential, Error> {
    if ctx.compliance.is_strict() {
        bsp::check_reference_structure(reference)?;
    }
    let lookup = Lookup::of(reference)?;

    let prior = reference.lookup_id().and_then(|id| ctx.results.get(id));
    let mut credential = match (prior, lookup) {
        (Some(prior), _) => {
            debug!(id = reference.lookup_id(), kind = prior.kind(), "resolving from prior result");
            from_prior_result(reference, prior, ctx)?
        }
        (None, Lookup::Direct(uri)) => from_direct_reference(reference, uri, ctx)?,
        (None, Lookup::IssuerSerial { issuer, serial }) => {
            debug!(%issuer, %serial, "resolving X509IssuerSerial");
            let store = ctx.require_store()?;
            let cert = store
                .certificate_by_issuer_serial(issuer, serial)?
                .ok_or_else(|| {
                    Error::NotFound(format!("certificate issued by {issuer} with serial {serial}"))
                })?;
            Credential {
                certificates: vec![cert],
                ..Default::default()
            }
        }
        (None, Lookup::KeyIdentifier(target, value)) => {
            from_key_identifier(reference, target, value, ctx)?
        }
    };

    if credential.principal.name.is_empty() && credential.principal.token.is_none() {
        if let Some(cert) = credential.certificates.first() {
            credential.principal = Principal::named(cert.subject_name());
        }
    }
    if credential.is_empty() {
        return Err(Error::NotFound(format!(
            "no key material for reference {}",
            reference.lookup_id().unwrap_or("<X509IssuerSerial>")
        )));
    }
    Ok(credential)
}

fn from_prior_result(
    reference: &SecurityTokenReference,
    prior: &PriorResult,
    ctx: &ResolveContext<'_, '_, '_>,
) -> Result<Credential, Error> {
    let strict = ctx.compliance.is_strict();
    match prior {
        PriorResult::UsernameToken(token) => {
            if strict {
                bsp::check_username_token(reference)?;
            }
            let password = match token.cleartext_password() {
                Some(password) => Zeroizing::new(password.as_bytes().to_vec()),
                None => request_secret(
                    ctx,
                    &token.username,
                    token.password_type.as_deref(),
                    SecretUsage::Password,
                )?
                .ok_or_else(|| Error::NotFound(format!("no password for user {}", token.username)))?,
            };
            let secret = if token.is_derived_key() {
                token.derived_key(&password)?
            } else {
                token.secret_key(&password, ctx.derivation.secret_key_length()?)?
            };
            Ok(Credential {
                secret_key: Some(secret),
                principal: Principal {
                    name: token.username.clone(),
                    token: Some(PrincipalToken::UsernameToken(UsernameTokenPrincipal {
                        password_type: token.password_type.clone(),
                        nonce: token.nonce.clone(),
                        created: token.created.clone(),
                    })),
                },
                ..Default::default()
            })
        }
        PriorResult::BinaryToken(bst) => {
            if strict {
                bsp::check_binary_token(reference, Some(&bst.value_type))?;
            }
            Ok(Credential {
                certificates: bst.certificates.clone(),
                trusted: bst.validated,
                ..Default::default()
            })
        }
        PriorResult::EncryptedKey(ek) => {
            if strict {
                bsp::check_encrypted_key(reference)?;
            }
            Ok(Credential {
                secret_key: Some(ek.secret.clone()),
                principal: Principal::named(ek.id.clone()),
                ..Default::default()
            })
        }
        PriorResult::SecurityContextToken(sct) => Ok(Credential {
            secret_key: Some(sct.secret.clone()),
            principal: Principal::named(sct.identifier.clone()),
            ..Default::default()
        }),
        PriorResult::DerivedKeyToken(dkt) => {
            let length = match dkt.token.length {
                Some(length) if length > 0 => length,
                _ => ctx.derivation.algorithm_key_length()?,
            };
            let secret = dkt.token.derive_key(length, &dkt.base_secret)?;
            let principal = dkt.token.principal(length, &dkt.base_secret)?;
            Ok(Credential {
                secret_key: Some(secret),
                principal: Principal {
                    name: principal.id.clone(),
                    token: Some(PrincipalToken::DerivedKey(principal)),
                },
                ..Default::default()
            })
        }
        PriorResult::SamlAssertion(assertion) => {
            if strict {
                bsp::check_saml(reference, assertion.version)?;
            }
            Ok(from_assertion(assertion))
        }
    }
}

fn from_direct_reference(
    reference: &SecurityTokenReference,
    uri: &str,
    ctx: &ResolveContext<'_, '_, '_>,
) -> Result<Credential, Error> {
    let strict = ctx.compliance.is_strict();
    let Some(id) = uri.strip_prefix('#') else {
        debug!(uri, "external reference, asking secret callback");
        return secret_credential(ctx, uri, reference.reference_value_type());
    };
    let element = ctx
        .document
        .element_by_id(id)?
        .ok_or_else(|| Error::NotFound(format!("no element with id \"{id}\"")))?;

    if is_element(element, ns::WSSE, ns::node::BINARY_SECURITY_TOKEN) {
        debug!(id, "resolving BinarySecurityToken");
        let store = ctx.require_store()?;
        let token = BinarySecurityToken::from_node(element)?;
        token.certificate_encoding()?;
        if strict {
            bsp::check_binary_token(reference, Some(&token.value_type))?;
        }
        Ok(Credential {
            certificates: token.certificates(store)?,
            ..Default::default()
        })
    } else if is_element(element, ns::SAML1, ns::node::ASSERTION)
        || is_element(element, ns::SAML2, ns::node::ASSERTION)
    {
        debug!(id, "resolving SAML assertion");
        let assertion = ctx.require_processor()?.process_assertion(element)?;
        if strict {
            bsp::check_saml(reference, assertion.version)?;
        }
        Ok(from_assertion(&assertion))
    } else if is_element(element, ns::ENC, ns::node::ENCRYPTED_KEY) {
        debug!(id, "resolving EncryptedKey");
        if strict {
            bsp::check_encrypted_key(reference)?;
        }
        let ek = ctx.require_processor()?.process_encrypted_key(element)?;
        let name = wsu_id(element).unwrap_or(id).to_owned();
        Ok(Credential {
            secret_key: Some(ek.secret),
            principal: Principal::named(name),
            ..Default::default()
        })
    } else {
        debug!(id, element = element.tag_name().name(), "opaque token, asking secret callback");
        secret_credential(ctx, id, reference.reference_value_type())
    }
}

fn from_key_identifier(
    reference: &SecurityTokenReference,
    target: KeyIdentifierTarget,
    value: &str,
    ctx: &ResolveContext<'_, '_, '_>,
) -> Result<Credential, Error> {
    let strict = ctx.compliance.is_strict();
    debug!(?target, "resolving KeyIdentifier");
    let identifier = match target {
        KeyIdentifierTarget::EncryptedKey => {
            if strict {
                bsp::check_encrypted_key(reference)?;
            }
            return secret_credential(ctx, value, Some(ns::ENC_KEY_SHA1_TYPE));
        }
        KeyIdentifierTarget::SamlAssertion => {
            let element = ctx
                .document
                .element_by_id(value)?
                .ok_or_else(|| Error::NotFound(format!("no SAML assertion with id \"{value}\"")))?;
            let assertion = ctx.require_processor()?.process_assertion(element)?;
            if strict {
                bsp::check_saml(reference, assertion.version)?;
            }
            return Ok(from_assertion(&assertion));
        }
        KeyIdentifierTarget::Certificate(identifier) => identifier,
    };

    if strict {
        bsp::check_binary_token(reference, None)?;
    }
    let store = ctx.require_store()?;
    let raw = wssec_keys::keyinfo::decode_base64_text(value, "KeyIdentifier")?;
    let cert = store
        .certificate_by_key_identifier(identifier, &raw)?
        .ok_or_else(|| Error::NotFound(format!("no certificate for {identifier:?} {value}")))?;
    Ok(Credential {
        certificates: vec![cert],
        ..Default::default()
    })
}

/// Credential for a SAML subject: the first subject certificate, the subject
/// public key and any proof secret.
fn from_assertion(assertion: &SamlAssertion) -> Credential {
    let key_info = &assertion.subject_key_info;
    Credential {
        certificates: key_info.certificates.iter().take(1).cloned().collect(),
        public_key: key_info.public_key.clone(),
        secret_key: assertion.secret.clone(),
        principal: Principal {
            name: assertion.id.clone(),
            token: Some(PrincipalToken::Saml(Box::new(assertion.clone()))),
        },
        trusted: assertion.is_trusted(),
    }
}

fn secret_credential(
    ctx: &ResolveContext<'_, '_, '_>,
    id: &str,
    type_hint: Option<&str>,
) -> Result<Credential, Error> {
    let secret = request_secret(ctx, id, type_hint, SecretUsage::SecretKey)?
        .ok_or_else(|| Error::NotFound(format!("no secret for \"{id}\"")))?;
    Ok(Credential {
        secret_key: Some(secret),
        principal: Principal::named(id),
        ..Default::default()
    })
}

/// Ask the secret callback for `id`. An empty answer counts as none.
pub(crate) fn request_secret(
    ctx: &ResolveContext<'_, '_, '_>,
    id: &str,
    type_hint: Option<&str>,
    usage: SecretUsage,
) -> Result<Option<Zeroizing<Vec<u8>>>, Error> {
    let callback = ctx
        .callback
        .ok_or_else(|| Error::Configuration("no secret callback configured".into()))?;
    let request = SecretRequest { id, type_hint, usage };
    debug!(id, ?usage, "requesting secret");
    match callback.request_secret(&request) {
        Ok(Some(secret)) if !secret.is_empty() => Ok(Some(Zeroizing::new(secret))),
        Ok(_) => Ok(None),
        Err(source) => Err(Error::CallbackFailure {
            id: id.to_owned(),
            source,
        }),
    }
}
