#![forbid(unsafe_code)]

//! DER encoding of a fresh PKCS#12 (PFX) container.
//!
//! The encoder always emits the modern shape: one pkcs8ShroudedKeyBag
//! encrypted with PBES2 (PBKDF2-HMAC-SHA256 + AES-256-CBC), certificate
//! bags in a plain Data ContentInfo, and an HMAC-SHA256 MacData.

use carimbo_core::Error;
use rand::RngCore;
use yasna::{DERWriter, Tag};

use crate::kdf;
use crate::oid::{self, oid};

const PBKDF2_ITERATIONS: u32 = 2048;
const MAC_ITERATIONS: u32 = 2048;

pub fn write_pfx(
    private_key_der: &[u8],
    certificates: &[Vec<u8>],
    password: &str,
) -> Result<Vec<u8>, Error> {
    let mut rng = rand::thread_rng();
    let mut key_salt = [0u8; 16];
    rng.fill_bytes(&mut key_salt);
    let mut key_iv = [0u8; 16];
    rng.fill_bytes(&mut key_iv);
    let mut mac_salt = [0u8; 8];
    rng.fill_bytes(&mut mac_salt);

    let encrypted_key = kdf::encrypt_pbes2_aes256cbc(
        private_key_der,
        password,
        &key_salt,
        PBKDF2_ITERATIONS,
        &key_iv,
    )?;

    // SafeContents holding the single pkcs8ShroudedKeyBag
    let key_safe_contents = yasna::construct_der(|w| {
        w.write_sequence(|w| {
            w.next().write_sequence(|w| {
                w.next().write_oid(&oid(oid::PKCS8_SHROUDED_KEY_BAG));
                w.next().write_tagged(Tag::context(0), |w| {
                    // EncryptedPrivateKeyInfo
                    w.write_sequence(|w| {
                        write_pbes2_algorithm(w.next(), &key_salt, &key_iv);
                        w.next().write_bytes(&encrypted_key);
                    });
                });
            });
        });
    });

    // SafeContents holding one certBag per certificate
    let cert_safe_contents = yasna::construct_der(|w| {
        w.write_sequence(|w| {
            for cert in certificates {
                w.next().write_sequence(|w| {
                    w.next().write_oid(&oid(oid::CERT_BAG));
                    w.next().write_tagged(Tag::context(0), |w| {
                        w.write_sequence(|w| {
                            w.next().write_oid(&oid(oid::X509_CERTIFICATE));
                            w.next()
                                .write_tagged(Tag::context(0), |w| w.write_bytes(cert));
                        });
                    });
                });
            }
        });
    });

    // authSafe: SEQUENCE OF ContentInfo, both plain Data
    let auth_safe = yasna::construct_der(|w| {
        w.write_sequence(|w| {
            write_data_content_info(w.next(), &key_safe_contents);
            write_data_content_info(w.next(), &cert_safe_contents);
        });
    });

    let bmp_password = kdf::password_to_bmp(password);
    let mac_key = kdf::pkcs12_kdf_sha256(kdf::ID_MAC, &bmp_password, &mac_salt, MAC_ITERATIONS, 32);
    let mac_value = kdf::compute_hmac_sha256(&mac_key, &auth_safe);

    let pfx = yasna::construct_der(|w| {
        w.write_sequence(|w| {
            // version
            w.next().write_u32(3);
            // authSafe ContentInfo
            write_data_content_info(w.next(), &auth_safe);
            // MacData
            w.next().write_sequence(|w| {
                // DigestInfo
                w.next().write_sequence(|w| {
                    w.next().write_sequence(|w| {
                        w.next().write_oid(&oid(oid::SHA256));
                        w.next().write_null();
                    });
                    w.next().write_bytes(&mac_value);
                });
                w.next().write_bytes(&mac_salt);
                w.next().write_u32(MAC_ITERATIONS);
            });
        });
    });

    Ok(pfx)
}

/// Write a ContentInfo of type data: SEQUENCE { OID data, [0] OCTET STRING }.
fn write_data_content_info(w: DERWriter, payload: &[u8]) {
    w.write_sequence(|w| {
        w.next().write_oid(&oid(oid::DATA));
        w.next()
            .write_tagged(Tag::context(0), |w| w.write_bytes(payload));
    });
}

/// Write the PBES2 AlgorithmIdentifier with an explicit HMAC-SHA256 PRF.
fn write_pbes2_algorithm(w: DERWriter, salt: &[u8], iv: &[u8]) {
    w.write_sequence(|w| {
        w.next().write_oid(&oid(oid::PBES2));
        w.next().write_sequence(|w| {
            // keyDerivationFunc
            w.next().write_sequence(|w| {
                w.next().write_oid(&oid(oid::PBKDF2));
                w.next().write_sequence(|w| {
                    w.next().write_bytes(salt);
                    w.next().write_u32(PBKDF2_ITERATIONS);
                    w.next().write_sequence(|w| {
                        w.next().write_oid(&oid(oid::HMAC_SHA256));
                        w.next().write_null();
                    });
                });
            });
            // encryptionScheme
            w.next().write_sequence(|w| {
                w.next().write_oid(&oid(oid::AES_256_CBC));
                w.next().write_bytes(iv);
            });
        });
    });
}
