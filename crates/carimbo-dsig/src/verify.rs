#![forbid(unsafe_code)]

//! Enveloped signature verification.
//!
//! Verification checks the first `<ds:Signature>` in the document: every
//! reference digest is recomputed over its transformed content, and the
//! signature value is checked over the canonicalized SignedInfo using a
//! key taken from the certificates embedded in `<ds:KeyInfo>`. No trust
//! chain is built; the caller decides whether to trust the certificate.

use carimbo_core::{algorithm, ns, Error};
use carimbo_crypto::digest;
use carimbo_crypto::sign::accepted_key_algorithm;
use carimbo_transforms::{
    C14nTransform, EnvelopedSignatureTransform, Transform, TransformData, TransformPipeline,
};
use carimbo_xml::{document, uri, NodeSet};

/// The outcome of signature verification.
///
/// Structural problems (missing elements, unknown algorithms, unparsable
/// input) are errors; a well-formed signature that does not match the
/// document is `Invalid` with a reason.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VerifyResult {
    Valid,
    Invalid { reason: String },
}

impl VerifyResult {
    pub fn is_valid(&self) -> bool {
        matches!(self, VerifyResult::Valid)
    }
}

/// Verify the first enveloped signature in an XML document.
pub fn verify(xml: &str) -> Result<VerifyResult, Error> {
    let doc = roxmltree::Document::parse_with_options(xml, carimbo_xml::parsing_options())
        .map_err(|e| Error::XmlParse(e.to_string()))?;
    let id_map = document::build_id_map(&doc);

    let sig_node = document::find_element(&doc, ns::DSIG, ns::node::SIGNATURE)
        .ok_or_else(|| Error::MissingElement("Signature".into()))?;
    let signed_info = document::find_child_element(sig_node, ns::DSIG, ns::node::SIGNED_INFO)
        .ok_or_else(|| Error::MissingElement("SignedInfo".into()))?;

    let c14n_uri = required_algorithm(signed_info, ns::node::CANONICALIZATION_METHOD)?;
    let c14n_mode = carimbo_c14n::C14nMode::from_uri(c14n_uri).ok_or_else(|| {
        Error::UnsupportedAlgorithm(format!("canonicalization method: {c14n_uri}"))
    })?;
    let sig_method_uri = required_algorithm(signed_info, ns::node::SIGNATURE_METHOD)?;

    for reference in document::find_child_elements(signed_info, ns::DSIG, ns::node::REFERENCE) {
        if let VerifyResult::Invalid { reason } =
            verify_reference(xml, &doc, &id_map, sig_node, reference)?
        {
            return Ok(VerifyResult::Invalid { reason });
        }
    }

    // Key resolution: first embedded certificate whose key family matches
    // the signature method
    let expected = accepted_key_algorithm(sig_method_uri).ok_or_else(|| {
        Error::UnsupportedAlgorithm(format!("signature method: {sig_method_uri}"))
    })?;
    let key_info = document::find_child_element(sig_node, ns::DSIG, ns::node::KEY_INFO)
        .ok_or_else(|| Error::MissingElement("KeyInfo".into()))?;
    let key = carimbo_keys::keyinfo::certificate_keys(key_info)
        .into_iter()
        .find(|k| k.algorithm() == expected)
        .ok_or_else(|| {
            Error::Key("no certificate in KeyInfo matches the signature algorithm".into())
        })?;

    let signed_info_ns = NodeSet::tree_without_comments(signed_info);
    let c14n_signed_info = carimbo_c14n::canonicalize_doc(&doc, c14n_mode, Some(&signed_info_ns))?;

    let sig_value_node = document::find_child_element(sig_node, ns::DSIG, ns::node::SIGNATURE_VALUE)
        .ok_or_else(|| Error::MissingElement("SignatureValue".into()))?;
    let sig_bytes = decode_base64_text(sig_value_node.text().unwrap_or(""))?;

    let sig_alg = carimbo_crypto::sign::from_uri(sig_method_uri)?;
    if sig_alg.verify(&key.to_signing_key(), &c14n_signed_info, &sig_bytes)? {
        Ok(VerifyResult::Valid)
    } else {
        Ok(VerifyResult::Invalid {
            reason: "signature value verification failed".into(),
        })
    }
}

/// Recompute one reference digest and compare it with the stored value.
fn verify_reference(
    xml: &str,
    doc: &roxmltree::Document<'_>,
    id_map: &std::collections::HashMap<String, roxmltree::NodeId>,
    sig_node: roxmltree::Node<'_, '_>,
    reference: roxmltree::Node<'_, '_>,
) -> Result<VerifyResult, Error> {
    let ref_uri = reference
        .attribute(ns::attr::URI)
        .ok_or_else(|| Error::MissingAttribute("Reference URI".into()))?;
    let digest_uri = required_algorithm(reference, ns::node::DIGEST_METHOD)?;
    let digest_value = document::find_child_element(reference, ns::DSIG, ns::node::DIGEST_VALUE)
        .ok_or_else(|| Error::MissingElement("DigestValue".into()))?;
    let expected = decode_base64_text(digest_value.text().unwrap_or(""))?;

    let node_set = if ref_uri.is_empty() {
        None
    } else if let Some(id) = uri::parse_same_document_ref(ref_uri) {
        let target = uri::resolve_id(doc, id_map, id)?;
        Some(NodeSet::tree_without_comments(target))
    } else {
        return Err(Error::InvalidUri(format!(
            "external reference URIs are not supported: {ref_uri}"
        )));
    };

    let mut pipeline = TransformPipeline::new();
    if let Some(transforms) =
        document::find_child_element(reference, ns::DSIG, ns::node::TRANSFORMS)
    {
        for transform in document::find_child_elements(transforms, ns::DSIG, ns::node::TRANSFORM) {
            let uri = transform
                .attribute(ns::attr::ALGORITHM)
                .ok_or_else(|| Error::MissingAttribute("Transform Algorithm".into()))?;
            pipeline.push(transform_from_uri(uri, sig_node)?);
        }
    }
    let data = pipeline.execute(TransformData::Xml {
        xml_text: xml.to_owned(),
        node_set,
    })?;

    let bytes = data.to_binary()?;
    let computed = digest::digest(digest_uri, &bytes)?;
    if computed == expected {
        Ok(VerifyResult::Valid)
    } else {
        Ok(VerifyResult::Invalid {
            reason: format!("Reference digest failed: URI={ref_uri}"),
        })
    }
}

fn transform_from_uri(
    uri: &str,
    sig_node: roxmltree::Node<'_, '_>,
) -> Result<Box<dyn Transform>, Error> {
    match uri {
        algorithm::ENVELOPED_SIGNATURE => {
            Ok(Box::new(EnvelopedSignatureTransform::from_node(sig_node)))
        }
        algorithm::C14N => Ok(Box::new(C14nTransform::new(
            carimbo_c14n::C14nMode::Inclusive,
        ))),
        algorithm::C14N_WITH_COMMENTS => Ok(Box::new(C14nTransform::new(
            carimbo_c14n::C14nMode::InclusiveWithComments,
        ))),
        _ => Err(Error::UnsupportedAlgorithm(format!("transform: {uri}"))),
    }
}

/// Read the Algorithm attribute of a named child element.
fn required_algorithm<'a>(
    parent: roxmltree::Node<'a, '_>,
    child_name: &str,
) -> Result<&'a str, Error> {
    let child = document::find_child_element(parent, ns::DSIG, child_name)
        .ok_or_else(|| Error::MissingElement(child_name.into()))?;
    child
        .attribute(ns::attr::ALGORITHM)
        .ok_or_else(|| Error::MissingAttribute(format!("{child_name} Algorithm")))
}

fn decode_base64_text(text: &str) -> Result<Vec<u8>, Error> {
    use base64::Engine;
    let clean: String = text.chars().filter(|c| !c.is_whitespace()).collect();
    base64::engine::general_purpose::STANDARD
        .decode(&clean)
        .map_err(|e| Error::Base64(e.to_string()))
}
