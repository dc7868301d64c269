#![forbid(unsafe_code)]

/// Errors produced while resolving security token references.
///
/// Any of these aborts resolution of the whole reference; the caller treats
/// it as a verification failure of the message.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("malformed SecurityTokenReference: {0}")]
    MalformedReference(String),

    #[error("unsupported security token: {0}")]
    UnsupportedTokenType(String),

    #[error("Basic Security Profile violation: {0}")]
    ComplianceViolation(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("secret callback failed for {id}")]
    CallbackFailure {
        id: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("key derivation failed: {0}")]
    DerivationFailure(String),

    #[error("configuration error: {0}")]
    Configuration(String),

    #[error("XML parsing error: {0}")]
    XmlParse(String),

    #[error("invalid XML structure: {0}")]
    XmlStructure(String),

    #[error("base64 decode error: {0}")]
    Base64(String),

    #[error("certificate error: {0}")]
    Certificate(String),

    #[error("key error: {0}")]
    Key(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// True for errors raised by the Basic Security Profile checks.
    pub fn is_compliance_violation(&self) -> bool {
        matches!(self, Self::ComplianceViolation(_))
    }
}

pub type Result<T> = std::result::Result<T, Error>;
