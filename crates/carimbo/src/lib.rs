#![forbid(unsafe_code)]

//! Certificate-backed enveloped XML signatures for Brazilian fiscal
//! documents.
//!
//! An [`Identity`] is loaded from a PKCS#12 container, exposes the holder's
//! ICP-Brasil tax identifier when the certificate carries one, and signs
//! XML documents with an enveloped XML-DSig signature. [`verify`] checks
//! such a signature against the certificate it embeds.
//!
//! The lower layers are exposed for callers that need them directly.

pub use carimbo_core as core;
pub use carimbo_xml as xml;
pub use carimbo_c14n as c14n;
pub use carimbo_crypto as crypto;
pub use carimbo_keys as keys;
pub use carimbo_pkcs12 as pkcs12;
pub use carimbo_transforms as transforms;
pub use carimbo_dsig as dsig;

pub mod identity;
pub mod taxid;

mod serialize;

pub use carimbo_core::{AlgorithmSuite, Error, Result};
pub use carimbo_dsig::VerifyResult;
pub use identity::{verify, Identity, INTERNAL_PASSWORD};
pub use taxid::{extract_tax_id, Cnpj, Cpf, CpfCnpj};
