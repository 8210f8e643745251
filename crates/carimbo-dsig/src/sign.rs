#![forbid(unsafe_code)]

//! Enveloped signature construction.
//!
//! The signature element is built as a template with empty DigestValue and
//! SignatureValue, spliced into the document text, and then filled in over
//! canonical forms. roxmltree is a read-only tree, so all document edits
//! are textual splices at positions taken from node ranges.

use carimbo_core::{algorithm, ns, AlgorithmSuite, Error};
use carimbo_crypto::digest;
use carimbo_keys::Key;
use carimbo_transforms::{C14nTransform, EnvelopedSignatureTransform, Transform, TransformData};
use carimbo_xml::{document, uri, NodeSet, XmlWriter};

/// Sign an XML document with an enveloped signature.
///
/// The first child element of the document root is the signing target. It
/// gets an `Id` attribute if it has none, and the signature is appended as
/// its last child. Returns the new document text.
pub fn sign_enveloped(xml: &str, key: &Key, suite: &AlgorithmSuite) -> Result<String, Error> {
    let doc = roxmltree::Document::parse_with_options(xml, carimbo_xml::parsing_options())
        .map_err(|e| Error::InvalidArgument(format!("input is not an XML document: {e}")))?;

    let target = doc
        .root_element()
        .children()
        .find(|n| n.is_element())
        .ok_or(Error::NoSignableChild)?;

    let leaf_der = key
        .x509_chain
        .first()
        .ok_or_else(|| Error::Key("signing key has no certificate chain".into()))?;

    // Ensure the target carries an Id the reference can point at
    let (mut text, target_id) = match existing_id(target) {
        Some(id) => (xml.to_owned(), id.to_owned()),
        None => {
            let id = mint_id();
            let mut text = xml.to_owned();
            let insert_at = target.range().start + 1 + written_name(xml, target.range().start).len();
            text.insert_str(insert_at, &format!(" Id=\"{id}\""));
            (text, id)
        }
    };

    let template = signature_template(&target_id, leaf_der, suite);

    // Splice the template in as the last child of the target element
    let splice = {
        let doc = roxmltree::Document::parse_with_options(&text, carimbo_xml::parsing_options())
            .map_err(|e| Error::XmlParse(e.to_string()))?;
        let target = doc
            .root_element()
            .children()
            .find(|n| n.is_element())
            .ok_or(Error::NoSignableChild)?;
        let range = target.range();
        let elem_text = &text[range.clone()];

        match elem_text.rfind("</") {
            Some(pos) => Splice::Insert(range.start + pos),
            None => {
                // Self-closing target: expand it
                let name = written_name(&text, range.start).to_owned();
                let open = elem_text[..elem_text.len() - 2].trim_end().to_owned();
                Splice::Replace(range, format!("{open}>{template}</{name}>"))
            }
        }
    };
    match splice {
        Splice::Insert(at) => text.insert_str(at, &template),
        Splice::Replace(range, replacement) => text.replace_range(range, &replacement),
    }

    // Compute and fill in the reference digest
    let digest_b64 = {
        let doc = roxmltree::Document::parse_with_options(&text, carimbo_xml::parsing_options())
            .map_err(|e| Error::XmlParse(e.to_string()))?;
        let id_map = document::build_id_map(&doc);
        let sig_node = locate_signature(&doc)?;
        let target = uri::resolve_id(&doc, &id_map, &target_id)?;

        let data = TransformData::Xml {
            xml_text: text.clone(),
            node_set: Some(NodeSet::tree_without_comments(target)),
        };
        let data = EnvelopedSignatureTransform::from_node(sig_node).execute(data)?;
        let data = C14nTransform::new(carimbo_c14n::C14nMode::Inclusive).execute(data)?;
        let bytes = data.to_binary()?;
        let computed = digest::digest(suite.digest_method, &bytes)?;

        use base64::Engine;
        base64::engine::general_purpose::STANDARD.encode(computed)
    };
    text = text.replacen(
        "<DigestValue></DigestValue>",
        &format!("<DigestValue>{digest_b64}</DigestValue>"),
        1,
    );

    // Canonicalize SignedInfo and compute the signature value
    let sig_b64 = {
        let doc = roxmltree::Document::parse_with_options(&text, carimbo_xml::parsing_options())
            .map_err(|e| Error::XmlParse(e.to_string()))?;
        let sig_node = locate_signature(&doc)?;
        let signed_info = document::find_child_element(sig_node, ns::DSIG, ns::node::SIGNED_INFO)
            .ok_or_else(|| Error::MissingElement("SignedInfo".into()))?;

        let signed_info_ns = NodeSet::tree_without_comments(signed_info);
        let c14n_signed_info = carimbo_c14n::canonicalize_doc(
            &doc,
            carimbo_c14n::C14nMode::Inclusive,
            Some(&signed_info_ns),
        )?;

        let signing_key = key.to_signing_key();
        let sig_alg = carimbo_crypto::sign::from_uri(suite.signature_method)?;
        let signature = sig_alg.sign(&signing_key, &c14n_signed_info)?;

        use base64::Engine;
        base64::engine::general_purpose::STANDARD.encode(signature)
    };
    text = text.replacen(
        "<SignatureValue></SignatureValue>",
        &format!("<SignatureValue>{sig_b64}</SignatureValue>"),
        1,
    );

    Ok(text)
}

enum Splice {
    Insert(usize),
    Replace(std::ops::Range<usize>, String),
}

/// Build the unprefixed signature template with empty DigestValue and
/// SignatureValue elements.
fn signature_template(target_id: &str, leaf_der: &[u8], suite: &AlgorithmSuite) -> String {
    use base64::Engine;
    let engine = base64::engine::general_purpose::STANDARD;
    let leaf_b64 = engine.encode(leaf_der);

    let mut w = XmlWriter::new();
    w.start_element(ns::node::SIGNATURE, &[("xmlns", ns::DSIG)]);
    w.start_element(ns::node::SIGNED_INFO, &[]);
    w.empty_element(
        ns::node::CANONICALIZATION_METHOD,
        &[(ns::attr::ALGORITHM, algorithm::C14N)],
    );
    w.empty_element(
        ns::node::SIGNATURE_METHOD,
        &[(ns::attr::ALGORITHM, suite.signature_method)],
    );
    w.start_element(ns::node::REFERENCE, &[(ns::attr::URI, &format!("#{target_id}"))]);
    w.start_element(ns::node::TRANSFORMS, &[]);
    w.empty_element(
        ns::node::TRANSFORM,
        &[(ns::attr::ALGORITHM, algorithm::ENVELOPED_SIGNATURE)],
    );
    w.empty_element(ns::node::TRANSFORM, &[(ns::attr::ALGORITHM, algorithm::C14N)]);
    w.end_element(ns::node::TRANSFORMS);
    w.empty_element(
        ns::node::DIGEST_METHOD,
        &[(ns::attr::ALGORITHM, suite.digest_method)],
    );
    w.empty_element(ns::node::DIGEST_VALUE, &[]);
    w.end_element(ns::node::REFERENCE);
    w.end_element(ns::node::SIGNED_INFO);
    w.empty_element(ns::node::SIGNATURE_VALUE, &[]);
    w.start_element(ns::node::KEY_INFO, &[]);
    w.start_element(ns::node::X509_DATA, &[]);
    w.start_element(ns::node::X509_CERTIFICATE, &[]);
    w.text(&leaf_b64);
    w.end_element(ns::node::X509_CERTIFICATE);
    w.end_element(ns::node::X509_DATA);
    w.end_element(ns::node::KEY_INFO);
    w.end_element(ns::node::SIGNATURE);
    w.into_string()
}

/// Locate the signature appended to the signing target: the last Signature
/// child of the first child element of the root.
fn locate_signature<'a>(
    doc: &'a roxmltree::Document<'a>,
) -> Result<roxmltree::Node<'a, 'a>, Error> {
    let target = doc
        .root_element()
        .children()
        .find(|n| n.is_element())
        .ok_or(Error::NoSignableChild)?;
    target
        .children()
        .filter(|n| {
            n.is_element()
                && n.tag_name().name() == ns::node::SIGNATURE
                && n.tag_name().namespace().unwrap_or("") == ns::DSIG
        })
        .last()
        .ok_or_else(|| Error::MissingElement("Signature".into()))
}

fn existing_id<'a>(node: roxmltree::Node<'a, '_>) -> Option<&'a str> {
    ["Id", "ID", "id"].iter().find_map(|a| node.attribute(*a))
}

/// Mint a reference id: `id-` followed by 16 random hex characters.
fn mint_id() -> String {
    use rand::RngCore;
    let mut bytes = [0u8; 8];
    rand::thread_rng().fill_bytes(&mut bytes);
    let mut id = String::from("id-");
    for b in bytes {
        id.push_str(&format!("{b:02x}"));
    }
    id
}

/// The element name exactly as written in the text, prefix included.
fn written_name(xml: &str, start: usize) -> &str {
    let bytes = xml.as_bytes();
    let mut i = start + 1;
    while i < bytes.len() && !bytes[i].is_ascii_whitespace() && bytes[i] != b'>' && bytes[i] != b'/'
    {
        i += 1;
    }
    &xml[start + 1..i]
}

#[cfg(test)]
mod tests {
    use super::*;
    use carimbo_keys::KeyData;

    fn test_key_with_chain() -> Key {
        let mut rng = rand::thread_rng();
        let pk = rsa::RsaPrivateKey::new(&mut rng, 1024).unwrap();
        let public = pk.to_public_key();
        let mut key = Key::new(KeyData::Rsa {
            private: Some(pk),
            public,
        });
        // The template only base64-encodes the leaf, so opaque bytes suffice
        key.x509_chain = vec![vec![0x30, 0x03, 0x02, 0x01, 0x2a]];
        key
    }

    #[test]
    fn signature_lands_inside_first_child_element(){
        let key = test_key_with_chain();
        let xml = r#"<env><doc Id="d1"><v>42</v></doc></env>"#;
        let signed = sign_enveloped(xml, &key, &AlgorithmSuite::default()).unwrap();

        let doc = roxmltree::Document::parse(&signed).unwrap();
        let target = doc.root_element().children().find(|n| n.is_element()).unwrap();
        let sig = target
            .children()
            .filter(|n| n.is_element())
            .last()
            .unwrap();
        assert_eq!(sig.tag_name().name(), "Signature");
        assert_eq!(sig.tag_name().namespace(), Some(ns::DSIG));

        let reference = doc
            .descendants()
            .find(|n| n.tag_name().name() == "Reference")
            .unwrap();
        assert_eq!(reference.attribute("URI"), Some("#d1"));

        let digest_value = doc
            .descendants()
            .find(|n| n.tag_name().name() == "DigestValue")
            .unwrap();
        assert!(!digest_value.text().unwrap_or("").is_empty());
        let sig_value = doc
            .descendants()
            .find(|n| n.tag_name().name() == "SignatureValue")
            .unwrap();
        assert!(!sig_value.text().unwrap_or("").is_empty());
    }

    #[test]
    fn missing_id_is_minted() {
        let key = test_key_with_chain();
        let xml = "<env><doc><v>42</v></doc></env>";
        let signed = sign_enveloped(xml, &key, &AlgorithmSuite::default()).unwrap();

        let doc = roxmltree::Document::parse(&signed).unwrap();
        let target = doc.root_element().children().find(|n| n.is_element()).unwrap();
        let id = target.attribute("Id").unwrap();
        assert!(id.starts_with("id-"));
        assert_eq!(id.len(), 19);

        let reference = doc
            .descendants()
            .find(|n| n.tag_name().name() == "Reference")
            .unwrap();
        assert_eq!(reference.attribute("URI").unwrap(), format!("#{id}"));
    }

    #[test]
    fn self_closing_target_is_expanded() {
        let key = test_key_with_chain();
        let xml = r#"<env><doc Id="d1"/></env>"#;
        let signed = sign_enveloped(xml, &key, &AlgorithmSuite::default()).unwrap();
        let doc = roxmltree::Document::parse(&signed).unwrap();
        let target = doc.root_element().children().find(|n| n.is_element()).unwrap();
        assert!(target
            .children()
            .any(|n| n.tag_name().name() == "Signature"));
    }

    #[test]
    fn root_without_child_element_is_rejected() {
        let key = test_key_with_chain();
        let err = sign_enveloped("<env>only text</env>", &key, &AlgorithmSuite::default())
            .unwrap_err();
        assert!(matches!(err, Error::NoSignableChild));
    }

    #[test]
    fn non_xml_input_is_invalid_argument() {
        let key = test_key_with_chain();
        let err = sign_enveloped("not xml at all", &key, &AlgorithmSuite::default()).unwrap_err();
        assert!(matches!(err, Error::InvalidArgument(_)));
    }

    #[test]
    fn chainless_key_cannot_sign() {
        let mut rng = rand::thread_rng();
        let pk = rsa::RsaPrivateKey::new(&mut rng, 1024).unwrap();
        let public = pk.to_public_key();
        let key = Key::new(KeyData::Rsa {
            private: Some(pk),
            public,
        });
        let err = sign_enveloped("<env><doc/></env>", &key, &AlgorithmSuite::default())
            .unwrap_err();
        assert!(matches!(err, Error::Key(_)));
    }

    #[test]
    fn sha256_suite_is_reflected_in_methods() {
        let key = test_key_with_chain();
        let xml = r#"<env><doc Id="d1"><v>42</v></doc></env>"#;
        let signed = sign_enveloped(xml, &key, &AlgorithmSuite::sha256()).unwrap();
        assert!(signed.contains(algorithm::RSA_SHA256));
        assert!(signed.contains(algorithm::SHA256));
    }
}
