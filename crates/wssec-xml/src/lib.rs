#![forbid(unsafe_code)]

//! XML document access for the wssec workspace.
//!
//! Wraps a parsed `roxmltree` document with the ID index needed to
//! dereference `wsse:Reference` URIs, plus small element helpers.

pub mod document;

pub use document::SecurityDocument;

use wssec_core::Error;

/// Return roxmltree parsing options for SOAP messages.
///
/// SOAP forbids a document type declaration, so DTDs are rejected outright.
pub fn parsing_options() -> roxmltree::ParsingOptions {
    roxmltree::ParsingOptions {
        allow_dtd: false,
        ..roxmltree::ParsingOptions::default()
    }
}

/// Parse a SOAP message.
pub fn parse(text: &str) -> Result<roxmltree::Document<'_>, Error> {
    roxmltree::Document::parse_with_options(text, parsing_options())
        .map_err(|e| Error::XmlParse(e.to_string()))
}
