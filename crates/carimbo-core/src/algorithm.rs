#![forbid(unsafe_code)]

//! Algorithm URI constants for XML-DSig `Algorithm` attributes, and the
//! digest/signature pairing used when producing signatures.

// ── Canonicalization ─────────────────────────────────────────────────

pub const C14N: &str = "http://www.w3.org/TR/2001/REC-xml-c14n-20010315";
pub const C14N_WITH_COMMENTS: &str =
    "http://www.w3.org/TR/2001/REC-xml-c14n-20010315#WithComments";

// ── Digest algorithms ────────────────────────────────────────────────

pub const SHA1: &str = "http://www.w3.org/2000/09/xmldsig#sha1";
pub const SHA256: &str = "http://www.w3.org/2001/04/xmlenc#sha256";

// ── Signature algorithms ─────────────────────────────────────────────

pub const RSA_SHA1: &str = "http://www.w3.org/2000/09/xmldsig#rsa-sha1";
pub const RSA_SHA256: &str = "http://www.w3.org/2001/04/xmldsig-more#rsa-sha256";
pub const DSA_SHA1: &str = "http://www.w3.org/2000/09/xmldsig#dsa-sha1";

// ── Transform algorithms ─────────────────────────────────────────────

pub const ENVELOPED_SIGNATURE: &str = "http://www.w3.org/2000/09/xmldsig#enveloped-signature";

/// The digest/signature method pair used when producing a signature.
///
/// The default pair is SHA-1 with RSA-SHA1, required by the legacy fiscal
/// signature profile this library targets. Callers signing for a modern
/// profile should use [`AlgorithmSuite::sha256`]. Canonicalization always
/// runs before digesting regardless of the pair chosen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlgorithmSuite {
    pub digest_method: &'static str,
    pub signature_method: &'static str,
}

impl AlgorithmSuite {
    /// SHA-256 digests with RSA-SHA256 signatures.
    pub fn sha256() -> Self {
        Self {
            digest_method: SHA256,
            signature_method: RSA_SHA256,
        }
    }
}

impl Default for AlgorithmSuite {
    fn default() -> Self {
        Self {
            digest_method: SHA1,
            signature_method: RSA_SHA1,
        }
    }
}
