#![forbid(unsafe_code)]

//! Shared definitions for the wssec workspace: the error type, WS-Security
//! namespace and value-type URIs, and algorithm constants.

pub mod algorithm;
pub mod error;
pub mod ns;

pub use error::{Error, Result};
