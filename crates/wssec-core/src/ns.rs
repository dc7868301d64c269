#![forbid(unsafe_code)]

//! Namespace, value-type and token-type URIs from the WS-Security family of
//! specifications. These strings are matched exactly during dispatch.

/// WS-Security 1.0 secext namespace
pub const WSSE: &str =
    "http://docs.oasis-open.org/wss/2004/01/oasis-200401-wss-wssecurity-secext-1.0.xsd";

/// WS-Security 1.1 secext namespace
pub const WSSE11: &str = "http://docs.oasis-open.org/wss/oasis-wss-wssecurity-secext-1.1.xsd";

/// WS-Security utility namespace (`wsu:Id`)
pub const WSU: &str =
    "http://docs.oasis-open.org/wss/2004/01/oasis-200401-wss-wssecurity-utility-1.0.xsd";

/// XML Digital Signature namespace
pub const DSIG: &str = "http://www.w3.org/2000/09/xmldsig#";

/// XML Digital Signature 1.1 namespace
pub const DSIG11: &str = "http://www.w3.org/2009/xmldsig11#";

/// XML Encryption namespace
pub const ENC: &str = "http://www.w3.org/2001/04/xmlenc#";

/// SAML 1.x assertion namespace
pub const SAML1: &str = "urn:oasis:names:tc:SAML:1.0:assertion";

/// SAML 2.0 assertion namespace
pub const SAML2: &str = "urn:oasis:names:tc:SAML:2.0:assertion";

/// WS-SecureConversation 2005/02 namespace
pub const WSC_0502: &str = "http://schemas.xmlsoap.org/ws/2005/02/sc";

/// WS-SecureConversation 2005/12 namespace
pub const WSC_0512: &str = "http://docs.oasis-open.org/ws-sx/ws-secureconversation/200512";

// ── Element names ────────────────────────────────────────────────────

pub mod node {
    // WS-Security header
    pub const SECURITY: &str = "Security";
    pub const SECURITY_TOKEN_REFERENCE: &str = "SecurityTokenReference";
    pub const REFERENCE: &str = "Reference";
    pub const KEY_IDENTIFIER: &str = "KeyIdentifier";
    pub const BINARY_SECURITY_TOKEN: &str = "BinarySecurityToken";
    pub const USERNAME_TOKEN: &str = "UsernameToken";
    pub const USERNAME: &str = "Username";
    pub const PASSWORD: &str = "Password";
    pub const NONCE: &str = "Nonce";
    pub const CREATED: &str = "Created";
    pub const SALT: &str = "Salt";
    pub const ITERATION: &str = "Iteration";

    // WS-SecureConversation
    pub const DERIVED_KEY_TOKEN: &str = "DerivedKeyToken";
    pub const SECURITY_CONTEXT_TOKEN: &str = "SecurityContextToken";
    pub const IDENTIFIER: &str = "Identifier";
    pub const OFFSET: &str = "Offset";
    pub const LENGTH: &str = "Length";
    pub const GENERATION: &str = "Generation";
    pub const LABEL: &str = "Label";

    // DSig / XML-Enc
    pub const SIGNATURE: &str = "Signature";
    pub const KEY_INFO: &str = "KeyInfo";
    pub const KEY_VALUE: &str = "KeyValue";
    pub const RSA_KEY_VALUE: &str = "RSAKeyValue";
    pub const RSA_MODULUS: &str = "Modulus";
    pub const RSA_EXPONENT: &str = "Exponent";
    pub const EC_KEY_VALUE: &str = "ECKeyValue";
    pub const NAMED_CURVE: &str = "NamedCurve";
    pub const PUBLIC_KEY: &str = "PublicKey";
    pub const X509_DATA: &str = "X509Data";
    pub const X509_CERTIFICATE: &str = "X509Certificate";
    pub const X509_ISSUER_SERIAL: &str = "X509IssuerSerial";
    pub const X509_ISSUER_NAME: &str = "X509IssuerName";
    pub const X509_SERIAL_NUMBER: &str = "X509SerialNumber";
    pub const ENCRYPTED_KEY: &str = "EncryptedKey";
    pub const ENCRYPTED_DATA: &str = "EncryptedData";

    // SAML
    pub const ASSERTION: &str = "Assertion";
    pub const SUBJECT: &str = "Subject";
    pub const SUBJECT_CONFIRMATION: &str = "SubjectConfirmation";
    pub const SUBJECT_CONFIRMATION_DATA: &str = "SubjectConfirmationData";
    pub const CONFIRMATION_METHOD: &str = "ConfirmationMethod";
    pub const NAME_IDENTIFIER: &str = "NameIdentifier";
    pub const NAME_ID: &str = "NameID";
    pub const ISSUER: &str = "Issuer";
    pub const AUTHENTICATION_STATEMENT: &str = "AuthenticationStatement";
    pub const ATTRIBUTE_STATEMENT: &str = "AttributeStatement";
    pub const AUTHORIZATION_DECISION_STATEMENT: &str = "AuthorizationDecisionStatement";
}

// ── Attribute names ──────────────────────────────────────────────────

pub mod attr {
    pub const ID: &str = "Id";
    pub const URI: &str = "URI";
    pub const VALUE_TYPE: &str = "ValueType";
    pub const ENCODING_TYPE: &str = "EncodingType";
    pub const TOKEN_TYPE: &str = "TokenType";
    pub const TYPE: &str = "Type";
    pub const ALGORITHM: &str = "Algorithm";
    pub const METHOD: &str = "Method";
    /// SAML 1.x assertion issuer
    pub const ISSUER: &str = "Issuer";
    /// SAML 1.x assertion identifier
    pub const ASSERTION_ID: &str = "AssertionID";
    /// SAML 2.0 assertion identifier
    pub const SAML2_ID: &str = "ID";
}

// ── Value types ──────────────────────────────────────────────────────

pub const X509_V3_TYPE: &str =
    "http://docs.oasis-open.org/wss/2004/01/oasis-200401-wss-x509-token-profile-1.0#X509v3";
pub const X509_PKI_PATH_TYPE: &str =
    "http://docs.oasis-open.org/wss/2004/01/oasis-200401-wss-x509-token-profile-1.0#X509PKIPathv1";
pub const X509_SKI_TYPE: &str =
    "http://docs.oasis-open.org/wss/2004/01/oasis-200401-wss-x509-token-profile-1.0#X509SubjectKeyIdentifier";
pub const THUMBPRINT_SHA1_TYPE: &str =
    "http://docs.oasis-open.org/wss/oasis-wss-soap-message-security-1.1#ThumbprintSHA1";
pub const ENC_KEY_SHA1_TYPE: &str =
    "http://docs.oasis-open.org/wss/oasis-wss-soap-message-security-1.1#EncryptedKeySHA1";
pub const SAML_KI_VALUE_TYPE: &str =
    "http://docs.oasis-open.org/wss/oasis-wss-saml-token-profile-1.0#SAMLAssertionID";
pub const SAML2_KI_VALUE_TYPE: &str =
    "http://docs.oasis-open.org/wss/oasis-wss-saml-token-profile-1.1#SAMLID";
pub const USERNAME_TOKEN_VALUE_TYPE: &str =
    "http://docs.oasis-open.org/wss/2004/01/oasis-200401-wss-username-token-profile-1.0#UsernameToken";

// ── Token types ──────────────────────────────────────────────────────

pub const ENC_KEY_TOKEN_TYPE: &str =
    "http://docs.oasis-open.org/wss/oasis-wss-soap-message-security-1.1#EncryptedKey";
pub const SAML_TOKEN_TYPE: &str =
    "http://docs.oasis-open.org/wss/oasis-wss-saml-token-profile-1.1#SAMLV1.1";
pub const SAML2_TOKEN_TYPE: &str =
    "http://docs.oasis-open.org/wss/oasis-wss-saml-token-profile-1.1#SAMLV2.0";

// ── Encodings ────────────────────────────────────────────────────────

pub const BASE64_ENCODING: &str =
    "http://docs.oasis-open.org/wss/2004/01/oasis-200401-wss-soap-message-security-1.0#Base64Binary";

// ── UsernameToken password types ─────────────────────────────────────

pub const PASSWORD_TEXT: &str =
    "http://docs.oasis-open.org/wss/2004/01/oasis-200401-wss-username-token-profile-1.0#PasswordText";
pub const PASSWORD_DIGEST: &str =
    "http://docs.oasis-open.org/wss/2004/01/oasis-200401-wss-username-token-profile-1.0#PasswordDigest";

// ── SAML confirmation methods ────────────────────────────────────────

pub const SAML1_HOLDER_OF_KEY: &str = "urn:oasis:names:tc:SAML:1.0:cm:holder-of-key";
pub const SAML2_HOLDER_OF_KEY: &str = "urn:oasis:names:tc:SAML:2.0:cm:holder-of-key";
pub const SAML1_SENDER_VOUCHES: &str = "urn:oasis:names:tc:SAML:1.0:cm:sender-vouches";
pub const SAML2_SENDER_VOUCHES: &str = "urn:oasis:names:tc:SAML:2.0:cm:sender-vouches";
pub const SAML1_BEARER: &str = "urn:oasis:names:tc:SAML:1.0:cm:bearer";
pub const SAML2_BEARER: &str = "urn:oasis:names:tc:SAML:2.0:cm:bearer";
