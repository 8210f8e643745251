#![forbid(unsafe_code)]

//! Cryptographic primitives for the carimbo signature library.
//!
//! Digest and signature algorithms are dispatched from their XML-DSig
//! algorithm URIs.

pub mod digest;
pub mod sign;

pub use sign::{KeyAlgorithm, SignatureAlgorithm, SigningKey};
