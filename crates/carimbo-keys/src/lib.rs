#![forbid(unsafe_code)]

//! Key material and X.509 certificate handling for the carimbo
//! signature library.
//!
//! Keys come from two places: a PKCS#12 container on the signing side,
//! and `<X509Data>` inside a `<KeyInfo>` on the verification side.

pub mod key;
pub mod keyinfo;
pub mod loader;
pub mod x509;

pub use key::{Key, KeyData};
pub use loader::{load_pkcs12, select_key};
