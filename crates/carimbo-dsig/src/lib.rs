#![forbid(unsafe_code)]

//! Enveloped XML digital signatures.
//!
//! [`sign_enveloped`] appends a `<ds:Signature>` to the first child element
//! of the document root and fills in digest and signature values over
//! canonical forms. [`verify`] checks the first signature found in a
//! document against the certificates it embeds.

pub mod sign;
pub mod verify;

pub use sign::sign_enveloped;
pub use verify::{verify, VerifyResult};
