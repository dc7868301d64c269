#![forbid(unsafe_code)]

pub use wssec_core as core;
pub use wssec_xml as xml;
pub use wssec_crypto as crypto;
pub use wssec_keys as keys;
pub use wssec_str as str_ref;

pub mod header;

pub use wssec_core::{Error, Result};
pub use wssec_str::{resolve, Credential, ResolveContext, SecurityTokenReference};
