#![forbid(unsafe_code)]

//! A signing identity loaded from a PKCS#12 container.

use carimbo_core::{AlgorithmSuite, Error};
use carimbo_keys::Key;

use crate::taxid::{extract_tax_id, CpfCnpj};

/// Password used when a container is loaded without one and for the
/// re-encoded blob the serde adapter persists. A fixed password gives no
/// secrecy; the re-encoded container is integrity-protected, not secret.
pub const INTERNAL_PASSWORD: &str = "opes";

/// A private key with its certificate chain, ready to sign documents.
///
/// Construction goes through [`Identity::load`] only; every live identity
/// has a usable key, a non-empty leaf-first chain, and a re-encoded
/// container blob behind it.
pub struct Identity {
    container: Vec<u8>,
    tax_id: Option<CpfCnpj>,
    expires_at: der::DateTime,
    key: Key,
}

impl Identity {
    /// Load an identity from PKCS#12 container bytes.
    ///
    /// With no password the internal bootstrap default is tried. The
    /// container must pair a private key with at least one certificate;
    /// the certificate matching the key becomes the chain leaf and
    /// supplies the expiry. The selected key and its chain are then
    /// re-encoded under [`INTERNAL_PASSWORD`] and the blob kept for
    /// serialization; any further private-key entries in the original
    /// container are not carried over.
    pub fn load(bytes: &[u8], password: Option<&str>) -> Result<Self, Error> {
        let password = password.unwrap_or(INTERNAL_PASSWORD);
        let key = carimbo_keys::load_pkcs12(bytes, password)?;

        let leaf_der = key.x509_chain.first().ok_or(Error::NoUsableEntry)?;
        let leaf = carimbo_keys::x509::parse_certificate(leaf_der)?;
        let expires_at = carimbo_keys::x509::not_after(&leaf);
        let tax_id = extract_tax_id(&key.x509_chain);

        let key_der = key.private_key_pkcs8_der()?;
        let container =
            carimbo_pkcs12::write_pkcs12(&key_der, &key.x509_chain, INTERNAL_PASSWORD)?;

        Ok(Self {
            container,
            tax_id,
            expires_at,
            key,
        })
    }

    /// Sign a document with the default legacy suite (SHA-1, RSA-SHA1).
    pub fn sign(&self, xml: &str) -> Result<String, Error> {
        self.sign_with(xml, &AlgorithmSuite::default())
    }

    /// Sign a document with an explicit digest/signature suite.
    ///
    /// Input validation errors keep their kind; everything else that goes
    /// wrong while building the signature is reported as `Signing`.
    pub fn sign_with(&self, xml: &str, suite: &AlgorithmSuite) -> Result<String, Error> {
        carimbo_dsig::sign_enveloped(xml, &self.key, suite).map_err(|e| match e {
            Error::InvalidArgument(_) | Error::NoSignableChild => e,
            other => Error::Signing(other.to_string()),
        })
    }

    /// The tax identifier from the certificate, when it carries one.
    pub fn tax_id(&self) -> Option<&CpfCnpj> {
        self.tax_id.as_ref()
    }

    /// When the leaf certificate expires.
    pub fn expires_at(&self) -> der::DateTime {
        self.expires_at
    }

    /// DER certificate chain, leaf first. Never empty.
    pub fn certificate_chain(&self) -> &[Vec<u8>] {
        &self.key.x509_chain
    }

    pub(crate) fn container_bytes(&self) -> &[u8] {
        &self.container
    }
}

impl std::fmt::Debug for Identity {
    /// Never prints key material or container bytes.
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Identity")
            .field("tax_id", &self.tax_id)
            .field("expires_at", &self.expires_at)
            .field("certificates", &self.key.x509_chain.len())
            .field("key", &self.key.data)
            .finish()
    }
}

/// Verify the first enveloped signature in a document.
///
/// A well-formed signature that does not match yields
/// [`VerifyResult::Invalid`]; a document whose signature cannot even be
/// checked (missing elements, no usable certificate, unknown algorithms)
/// is a `Verification` error.
pub fn verify(xml: &str) -> Result<carimbo_dsig::VerifyResult, Error> {
    carimbo_dsig::verify(xml).map_err(|e| match e {
        Error::Verification(_) => e,
        other => Error::Verification(other.to_string()),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn garbage_container_is_rejected() {
        let err = Identity::load(b"not a pkcs12 container", None).unwrap_err();
        assert!(matches!(err, Error::Container(_)));
    }

    #[test]
    fn empty_container_is_rejected() {
        let err = Identity::load(&[], Some("password")).unwrap_err();
        assert!(matches!(err, Error::Container(_)));
    }

    #[test]
    fn verify_wraps_structural_failures() {
        let err = verify("<doc><child/></doc>").unwrap_err();
        assert!(matches!(err, Error::Verification(_)));
    }
}
