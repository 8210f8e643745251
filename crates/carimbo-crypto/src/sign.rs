#![forbid(unsafe_code)]

//! Signature algorithm implementations (RSA PKCS#1 v1.5 and DSA).

use carimbo_core::{algorithm, Error};
use signature::SignatureEncoding;

/// Key material for signature operations.
pub enum SigningKey {
    Rsa(rsa::RsaPrivateKey),
    RsaPublic(rsa::RsaPublicKey),
    DsaPublic(dsa::VerifyingKey),
}

/// The public-key algorithm family a signature method accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyAlgorithm {
    Rsa,
    Dsa,
}

/// Signature method URI → accepted key algorithm.
///
/// Kept as a data table so new algorithm pairs are additive.
const KEY_ALGORITHM_PAIRS: &[(&str, KeyAlgorithm)] = &[
    (algorithm::RSA_SHA1, KeyAlgorithm::Rsa),
    (algorithm::RSA_SHA256, KeyAlgorithm::Rsa),
    (algorithm::DSA_SHA1, KeyAlgorithm::Dsa),
];

/// Look up the key algorithm accepted by a signature method URI.
pub fn accepted_key_algorithm(sig_method_uri: &str) -> Option<KeyAlgorithm> {
    KEY_ALGORITHM_PAIRS
        .iter()
        .find(|(uri, _)| *uri == sig_method_uri)
        .map(|(_, alg)| *alg)
}

/// Trait for signature algorithms.
pub trait SignatureAlgorithm: Send {
    fn uri(&self) -> &'static str;
    fn sign(&self, key: &SigningKey, data: &[u8]) -> Result<Vec<u8>, Error>;
    fn verify(&self, key: &SigningKey, data: &[u8], signature: &[u8]) -> Result<bool, Error>;
}

/// Create a signature algorithm from its URI.
pub fn from_uri(uri: &str) -> Result<Box<dyn SignatureAlgorithm>, Error> {
    match uri {
        algorithm::RSA_SHA1 => Ok(Box::new(RsaPkcs1v15 {
            uri: algorithm::RSA_SHA1,
            hash: HashType::Sha1,
        })),
        algorithm::RSA_SHA256 => Ok(Box::new(RsaPkcs1v15 {
            uri: algorithm::RSA_SHA256,
            hash: HashType::Sha256,
        })),
        algorithm::DSA_SHA1 => Ok(Box::new(DsaSha1)),
        _ => Err(Error::UnsupportedAlgorithm(format!(
            "signature algorithm: {uri}"
        ))),
    }
}

#[derive(Debug, Clone, Copy)]
enum HashType {
    Sha1,
    Sha256,
}

// ── RSA PKCS#1 v1.5 ─────────────────────────────────────────────────

struct RsaPkcs1v15 {
    uri: &'static str,
    hash: HashType,
}

impl RsaPkcs1v15 {
    fn sign_with_key(
        &self,
        private_key: &rsa::RsaPrivateKey,
        data: &[u8],
    ) -> Result<Vec<u8>, Error> {
        use signature::Signer;
        macro_rules! do_sign {
            ($hasher:ty) => {{
                let sk = rsa::pkcs1v15::SigningKey::<$hasher>::new(private_key.clone());
                Ok(sk.sign(data).to_vec())
            }};
        }
        match self.hash {
            HashType::Sha1 => do_sign!(sha1::Sha1),
            HashType::Sha256 => do_sign!(sha2::Sha256),
        }
    }

    fn verify_with_key(
        &self,
        public_key: &rsa::RsaPublicKey,
        data: &[u8],
        sig_bytes: &[u8],
    ) -> Result<bool, Error> {
        use signature::Verifier;
        let sig = rsa::pkcs1v15::Signature::try_from(sig_bytes)
            .map_err(|e| Error::Crypto(format!("invalid RSA signature: {e}")))?;
        macro_rules! do_verify {
            ($hasher:ty) => {{
                let vk = rsa::pkcs1v15::VerifyingKey::<$hasher>::new(public_key.clone());
                Ok(vk.verify(data, &sig).is_ok())
            }};
        }
        match self.hash {
            HashType::Sha1 => do_verify!(sha1::Sha1),
            HashType::Sha256 => do_verify!(sha2::Sha256),
        }
    }
}

impl SignatureAlgorithm for RsaPkcs1v15 {
    fn uri(&self) -> &'static str {
        self.uri
    }

    fn sign(&self, key: &SigningKey, data: &[u8]) -> Result<Vec<u8>, Error> {
        match key {
            SigningKey::Rsa(pk) => self.sign_with_key(pk, data),
            _ => Err(Error::Key("RSA private key required".into())),
        }
    }

    fn verify(&self, key: &SigningKey, data: &[u8], sig_bytes: &[u8]) -> Result<bool, Error> {
        let pubk = match key {
            SigningKey::Rsa(pk) => pk.to_public_key(),
            SigningKey::RsaPublic(pk) => pk.clone(),
            _ => return Err(Error::Key("RSA key required".into())),
        };
        self.verify_with_key(&pubk, data, sig_bytes)
    }
}

// ── DSA with SHA-1 ───────────────────────────────────────────────────

/// DSA-SHA1, verification only. Signatures produced by this library are
/// always RSA; DSA appears only on the verification side when an embedded
/// certificate carries a DSA key.
struct DsaSha1;

impl SignatureAlgorithm for DsaSha1 {
    fn uri(&self) -> &'static str {
        algorithm::DSA_SHA1
    }

    fn sign(&self, _key: &SigningKey, _data: &[u8]) -> Result<Vec<u8>, Error> {
        Err(Error::UnsupportedAlgorithm(
            "DSA-SHA1 signing is not supported".into(),
        ))
    }

    fn verify(&self, key: &SigningKey, data: &[u8], sig_bytes: &[u8]) -> Result<bool, Error> {
        use digest::Digest;
        use signature::DigestVerifier;
        let SigningKey::DsaPublic(vk) = key else {
            return Err(Error::Key("DSA public key required".into()));
        };
        let sig = dsa_sig_from_xmldsig(sig_bytes)?;
        let digest = sha1::Sha1::new_with_prefix(data);
        Ok(vk.verify_digest(digest, &sig).is_ok())
    }
}

/// Convert an XML-DSig DSA signature (r||s, two 20-byte big-endian
/// integers) into a typed signature.
fn dsa_sig_from_xmldsig(rs: &[u8]) -> Result<dsa::Signature, Error> {
    if rs.len() != 40 {
        return Err(Error::Crypto(format!(
            "DSA signature must be 40 bytes, got {}",
            rs.len()
        )));
    }
    let r = num_bigint_dig::BigUint::from_bytes_be(&rs[..20]);
    let s = num_bigint_dig::BigUint::from_bytes_be(&rs[20..]);
    dsa::Signature::from_components(r, s)
        .map_err(|e| Error::Crypto(format!("invalid DSA signature: {e}")))
}
