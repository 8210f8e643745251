#![forbid(unsafe_code)]

//! End-to-end flow: build a PKCS#12 container around a self-signed
//! certificate, load it, sign a document, verify the signature, and run
//! the serde round trip.

use carimbo::{verify, AlgorithmSuite, Error, Identity};

const CNPJ: &str = "19861350000170";
const PASSWORD: &str = "test-password";

// ── Test certificate construction ────────────────────────────────────

fn icp_brasil_san(tax_id: &str) -> Vec<u8> {
    yasna::construct_der(|writer| {
        writer.write_sequence_of(|writer| {
            writer
                .next()
                .write_tagged_implicit(yasna::Tag::context(0), |writer| {
                    writer.write_sequence(|writer| {
                        writer.next().write_oid(
                            &yasna::models::ObjectIdentifier::from_slice(&[2, 16, 76, 1, 3, 3]),
                        );
                        writer
                            .next()
                            .write_tagged(yasna::Tag::context(0), |writer| {
                                writer.write_bytes(tax_id.as_bytes());
                            });
                    });
                });
        })
    })
}

fn write_name(writer: yasna::DERWriter<'_>, common_name: &str) {
    writer.write_sequence_of(|writer| {
        writer.next().write_set_of(|writer| {
            writer.next().write_sequence(|writer| {
                writer
                    .next()
                    .write_oid(&yasna::models::ObjectIdentifier::from_slice(&[2, 5, 4, 3]));
                writer.next().write_utf8_string(common_name);
            });
        });
    });
}

fn write_sha256_rsa_alg_id(writer: yasna::DERWriter<'_>) {
    writer.write_sequence(|writer| {
        writer
            .next()
            .write_oid(&yasna::models::ObjectIdentifier::from_slice(&[
                1, 2, 840, 113549, 1, 1, 11,
            ]));
        writer.next().write_null();
    });
}

fn write_utctime(writer: yasna::DERWriter<'_>, stamp: &str) {
    let mut tlv = vec![0x17, stamp.len() as u8];
    tlv.extend_from_slice(stamp.as_bytes());
    writer.write_der(&tlv);
}

/// Minimal self-signed v3 certificate carrying an ICP-Brasil otherName.
fn self_signed_cert(key: &rsa::RsaPrivateKey, tax_id: &str) -> Vec<u8> {
    use pkcs8::EncodePublicKey;
    use signature::{SignatureEncoding, Signer};

    let spki_der = key
        .to_public_key()
        .to_public_key_der()
        .expect("SPKI encoding")
        .into_vec();
    let san = icp_brasil_san(tax_id);

    let tbs = yasna::construct_der(|writer| {
        writer.write_sequence(|writer| {
            writer
                .next()
                .write_tagged(yasna::Tag::context(0), |writer| {
                    writer.write_i64(2);
                });
            writer.next().write_u32(1);
            write_sha256_rsa_alg_id(writer.next());
            write_name(writer.next(), "carimbo test");
            writer.next().write_sequence(|writer| {
                write_utctime(writer.next(), "200101000000Z");
                write_utctime(writer.next(), "401231235959Z");
            });
            write_name(writer.next(), "carimbo test");
            writer.next().write_der(&spki_der);
            writer
                .next()
                .write_tagged(yasna::Tag::context(3), |writer| {
                    writer.write_sequence_of(|writer| {
                        writer.next().write_sequence(|writer| {
                            writer.next().write_oid(
                                &yasna::models::ObjectIdentifier::from_slice(&[2, 5, 29, 17]),
                            );
                            writer.next().write_bytes(&san);
                        });
                    });
                });
        })
    });

    let signer = rsa::pkcs1v15::SigningKey::<sha2::Sha256>::new(key.clone());
    let sig = signer.sign(&tbs).to_vec();

    yasna::construct_der(|writer| {
        writer.write_sequence(|writer| {
            writer.next().write_der(&tbs);
            write_sha256_rsa_alg_id(writer.next());
            writer.next().write_bitvec_bytes(&sig, sig.len() * 8);
        })
    })
}

fn test_container() -> Vec<u8> {
    use pkcs8::EncodePrivateKey;

    let mut rng = rand::thread_rng();
    let key = rsa::RsaPrivateKey::new(&mut rng, 2048).expect("RSA key generation");
    let cert = self_signed_cert(&key, CNPJ);
    let key_der = key.to_pkcs8_der().expect("PKCS#8 encoding");
    carimbo::pkcs12::write_pkcs12(key_der.as_bytes(), &[cert], PASSWORD)
        .expect("PKCS#12 encoding")
}

// ── Tests ────────────────────────────────────────────────────────────

#[test]
fn load_extracts_tax_id_and_chain() {
    let container = test_container();
    let identity = Identity::load(&container, Some(PASSWORD)).unwrap();

    let tax_id = identity.tax_id().expect("certificate carries a CNPJ");
    assert!(tax_id.is_cnpj());
    assert_eq!(tax_id.digits(), CNPJ);
    assert_eq!(tax_id.to_string(), "19.861.350/0001-70");

    assert_eq!(identity.certificate_chain().len(), 1);
    assert_eq!(identity.expires_at().year(), 2040);
}

#[test]
fn wrong_password_is_a_container_error() {
    let container = test_container();
    let err = Identity::load(&container, Some("wrong")).unwrap_err();
    assert!(matches!(err, Error::Container(_)));
}

#[test]
fn sign_then_verify_round_trip() {
    let container = test_container();
    let identity = Identity::load(&container, Some(PASSWORD)).unwrap();

    let xml = r#"<invoice><body Id="doc1"><total>100.00</total></body></invoice>"#;
    let signed = identity.sign(xml).unwrap();
    assert!(verify(&signed).unwrap().is_valid());
}

#[test]
fn sha256_suite_round_trip() {
    let container = test_container();
    let identity = Identity::load(&container, Some(PASSWORD)).unwrap();

    let xml = "<invoice><body><total>100.00</total></body></invoice>";
    let signed = identity
        .sign_with(xml, &AlgorithmSuite::sha256())
        .unwrap();
    assert!(verify(&signed).unwrap().is_valid());
}

#[test]
fn tampered_document_fails_verification() {
    let container = test_container();
    let identity = Identity::load(&container, Some(PASSWORD)).unwrap();

    let xml = r#"<invoice><body Id="doc1"><total>100.00</total></body></invoice>"#;
    let signed = identity.sign(xml).unwrap();
    let tampered = signed.replace("100.00", "999.99");
    assert!(!verify(&tampered).unwrap().is_valid());
}

#[test]
fn serde_round_trip_preserves_identity() {
    let container = test_container();
    let identity = Identity::load(&container, Some(PASSWORD)).unwrap();

    let json = serde_json::to_string(&identity).unwrap();
    let restored: Identity = serde_json::from_str(&json).unwrap();

    assert_eq!(restored.tax_id(), identity.tax_id());
    assert_eq!(restored.certificate_chain(), identity.certificate_chain());

    let xml = "<invoice><body><total>7</total></body></invoice>";
    let signed = restored.sign(xml).unwrap();
    assert!(verify(&signed).unwrap().is_valid());
}

#[test]
fn serialized_form_is_only_container_bytes() {
    let container = test_container();
    let identity = Identity::load(&container, Some(PASSWORD)).unwrap();

    let json = serde_json::to_string(&identity).unwrap();
    assert!(!json.contains(CNPJ));
    assert!(!json.contains("tax_id"));
    assert!(!json.contains("key"));
}

#[test]
fn debug_output_redacts_everything_sensitive() {
    let container = test_container();
    let identity = Identity::load(&container, Some(PASSWORD)).unwrap();
    let rendered = format!("{identity:?}");
    assert!(rendered.contains("RSA private+public key"));
    assert!(!rendered.contains("modulus"));
    assert!(!rendered.contains("container"));
}

#[test]
fn load_without_password_uses_bootstrap_default() {
    use pkcs8::EncodePrivateKey;

    let mut rng = rand::thread_rng();
    let key = rsa::RsaPrivateKey::new(&mut rng, 2048).unwrap();
    let cert = self_signed_cert(&key, CNPJ);
    let key_der = key.to_pkcs8_der().unwrap();
    let container =
        carimbo::pkcs12::write_pkcs12(key_der.as_bytes(), &[cert], carimbo::INTERNAL_PASSWORD)
            .unwrap();

    assert!(Identity::load(&container, None).is_ok());
}

#[test]
fn loader_skips_keys_without_matching_certificate() {
    use pkcs8::EncodePrivateKey;

    let mut rng = rand::thread_rng();
    let stray = rsa::RsaPrivateKey::new(&mut rng, 1024).unwrap();
    let holder = rsa::RsaPrivateKey::new(&mut rng, 1024).unwrap();
    let cert = self_signed_cert(&holder, CNPJ);

    // The stray key comes first but no certificate carries its public
    // key, so selection must move on to the holder's entry.
    let contents = carimbo_pkcs12::Pkcs12Contents {
        private_keys: vec![
            stray.to_pkcs8_der().unwrap().as_bytes().to_vec(),
            holder.to_pkcs8_der().unwrap().as_bytes().to_vec(),
        ],
        certificates: vec![cert.clone()],
    };

    let key = carimbo_keys::select_key(&contents).unwrap();
    assert_eq!(key.x509_chain, vec![cert]);
    assert_eq!(
        key.private_key_pkcs8_der().unwrap(),
        holder.to_pkcs8_der().unwrap().as_bytes()
    );
}

#[test]
fn container_without_usable_key_entry_is_rejected() {
    let mut rng = rand::thread_rng();
    let key = rsa::RsaPrivateKey::new(&mut rng, 1024).unwrap();
    let cert = self_signed_cert(&key, CNPJ);

    // A key bag that is not PKCS#8 leaves the certificate orphaned.
    let bogus_key = vec![0x30, 0x03, 0x02, 0x01, 0x2a];
    let container = carimbo::pkcs12::write_pkcs12(&bogus_key, &[cert], PASSWORD).unwrap();

    let err = Identity::load(&container, Some(PASSWORD)).unwrap_err();
    assert!(matches!(err, Error::NoUsableEntry));
}

#[test]
fn signature_method_without_matching_certificate_key_is_an_error() {
    let container = test_container();
    let identity = Identity::load(&container, Some(PASSWORD)).unwrap();

    let xml = r#"<invoice><body Id="doc1"><total>100.00</total></body></invoice>"#;
    let signed = identity.sign(xml).unwrap();

    // Swapping the signature method leaves the references intact but no
    // key in the embedded certificate can pair with DSA.
    let swapped = signed.replace(
        "http://www.w3.org/2000/09/xmldsig#rsa-sha1",
        "http://www.w3.org/2000/09/xmldsig#dsa-sha1",
    );
    let err = verify(&swapped).unwrap_err();
    assert!(matches!(err, Error::Verification(_)));
}

#[test]
fn reencoded_container_is_normalized_to_the_selected_key() {
    let container = test_container();
    let identity = Identity::load(&container, Some(PASSWORD)).unwrap();

    let json = serde_json::to_string(&identity).unwrap();
    let bytes: Vec<u8> = serde_json::from_str(&json).unwrap();

    let contents =
        carimbo_pkcs12::parse_pkcs12(&bytes, carimbo::INTERNAL_PASSWORD).unwrap();
    assert_eq!(contents.private_keys.len(), 1);
    assert_eq!(contents.certificates.len(), 1);
}

#[test]
fn identity_is_send_and_sync() {
    fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<Identity>();
}
