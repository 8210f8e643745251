#![forbid(unsafe_code)]

//! Key types and data structures.

/// The underlying key data.
///
/// The `Debug` impl never prints key material, only the algorithm and
/// whether a private component is present.
pub enum KeyData {
    Rsa {
        private: Option<rsa::RsaPrivateKey>,
        public: rsa::RsaPublicKey,
    },
    Dsa {
        public: dsa::VerifyingKey,
    },
}

impl std::fmt::Debug for KeyData {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Rsa { private, .. } => {
                if private.is_some() {
                    write!(f, "RSA private+public key")
                } else {
                    write!(f, "RSA public key")
                }
            }
            Self::Dsa { .. } => write!(f, "DSA public key"),
        }
    }
}

/// A key with its associated certificate chain.
#[derive(Debug)]
pub struct Key {
    /// The key data.
    pub data: KeyData,
    /// X.509 certificate chain (DER-encoded), leaf first when loaded
    /// from a PKCS#12 container.
    pub x509_chain: Vec<Vec<u8>>,
}

impl Key {
    /// Create a new key with an empty certificate chain.
    pub fn new(data: KeyData) -> Self {
        Self {
            data,
            x509_chain: Vec::new(),
        }
    }

    /// Convert to a `SigningKey` for use with crypto algorithms.
    pub fn to_signing_key(&self) -> carimbo_crypto::sign::SigningKey {
        match &self.data {
            KeyData::Rsa {
                private: Some(pk), ..
            } => carimbo_crypto::sign::SigningKey::Rsa(pk.clone()),
            KeyData::Rsa { public, .. } => {
                carimbo_crypto::sign::SigningKey::RsaPublic(public.clone())
            }
            KeyData::Dsa { public } => carimbo_crypto::sign::SigningKey::DsaPublic(public.clone()),
        }
    }

    /// Get the RSA private key if available.
    pub fn rsa_private_key(&self) -> Option<&rsa::RsaPrivateKey> {
        match &self.data {
            KeyData::Rsa {
                private: Some(pk), ..
            } => Some(pk),
            _ => None,
        }
    }

    /// Encode the private key as PKCS#8 DER, for PKCS#12 re-encoding.
    pub fn private_key_pkcs8_der(&self) -> Result<Vec<u8>, carimbo_core::Error> {
        use pkcs8::EncodePrivateKey;
        match &self.data {
            KeyData::Rsa {
                private: Some(pk), ..
            } => Ok(pk
                .to_pkcs8_der()
                .map_err(|e| carimbo_core::Error::Key(format!("PKCS#8 encoding failed: {e}")))?
                .as_bytes()
                .to_vec()),
            _ => Err(carimbo_core::Error::Key(
                "no private key available to encode".into(),
            )),
        }
    }

    /// The key algorithm accepted by a verification key of this type.
    pub fn algorithm(&self) -> carimbo_crypto::sign::KeyAlgorithm {
        match &self.data {
            KeyData::Rsa { .. } => carimbo_crypto::sign::KeyAlgorithm::Rsa,
            KeyData::Dsa { .. } => carimbo_crypto::sign::KeyAlgorithm::Dsa,
        }
    }
}
