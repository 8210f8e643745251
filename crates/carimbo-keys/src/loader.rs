#![forbid(unsafe_code)]

//! Key loading from PKCS#12 containers and DER-encoded material.

use crate::key::{Key, KeyData};
use crate::x509;
use carimbo_core::Error;
use carimbo_pkcs12::Pkcs12Contents;

/// Load an RSA private key from PKCS#8 DER bytes.
pub fn load_rsa_private_pkcs8_der(der: &[u8]) -> Result<Key, Error> {
    use pkcs8::DecodePrivateKey;
    let pk = rsa::RsaPrivateKey::from_pkcs8_der(der)
        .map_err(|e| Error::Key(format!("failed to parse RSA private key: {e}")))?;
    let public = pk.to_public_key();
    Ok(Key::new(KeyData::Rsa {
        private: Some(pk),
        public,
    }))
}

/// Load a public key from a DER-encoded X.509 certificate.
///
/// Tries RSA first, then DSA. The certificate itself becomes the single
/// entry of the key's chain.
pub fn load_x509_cert_der(data: &[u8]) -> Result<Key, Error> {
    let cert = x509::parse_certificate(data)?;
    let spki_der = x509::spki_der(&cert)?;

    use spki::DecodePublicKey;
    if let Ok(pk) = rsa::RsaPublicKey::from_public_key_der(&spki_der) {
        let mut key = Key::new(KeyData::Rsa {
            private: None,
            public: pk,
        });
        key.x509_chain = vec![data.to_vec()];
        return Ok(key);
    }

    {
        use der::Decode;
        if let Ok(spki_ref) = spki::SubjectPublicKeyInfoRef::from_der(&spki_der) {
            if let Ok(vk) = dsa::VerifyingKey::try_from(spki_ref) {
                let mut key = Key::new(KeyData::Dsa { public: vk });
                key.x509_chain = vec![data.to_vec()];
                return Ok(key);
            }
        }
    }

    Err(Error::Key(
        "unsupported public key algorithm in X.509 certificate".into(),
    ))
}

/// Load the signing identity from a PKCS#12 (.p12/.pfx) container.
pub fn load_pkcs12(data: &[u8], password: &str) -> Result<Key, Error> {
    let contents = carimbo_pkcs12::parse_pkcs12(data, password)?;
    select_key(&contents)
}

/// Pick the usable entry from parsed container contents.
///
/// Key entries are tried in container order: one qualifies when it parses
/// as RSA PKCS#8 and some certificate carries its public key. Entries that
/// fail either test are skipped. The matching certificate becomes the
/// chain leaf; the remaining certificates keep container order. When no
/// entry qualifies the container has no usable identity,
/// [`Error::NoUsableEntry`].
pub fn select_key(contents: &Pkcs12Contents) -> Result<Key, Error> {
    for der in &contents.private_keys {
        let Ok(mut key) = load_rsa_private_pkcs8_der(der) else {
            continue;
        };
        if let Some(chain) = order_chain_leaf_first(&key, &contents.certificates) {
            key.x509_chain = chain;
            return Ok(key);
        }
    }
    Err(Error::NoUsableEntry)
}

/// Reorder certificates so the one matching the private key comes first.
/// The rest keep their container order. `None` when no certificate
/// matches the key.
fn order_chain_leaf_first(key: &Key, certs: &[Vec<u8>]) -> Option<Vec<Vec<u8>>> {
    let KeyData::Rsa { public, .. } = &key.data else {
        return None;
    };

    let leaf_idx = certs.iter().position(|der| {
        x509::parse_certificate(der)
            .ok()
            .and_then(|cert| x509::rsa_public_key(&cert))
            .map_or(false, |cert_pub| cert_pub == *public)
    })?;

    let mut chain = certs.to_vec();
    let leaf = chain.remove(leaf_idx);
    chain.insert(0, leaf);
    Some(chain)
}
