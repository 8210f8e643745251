#![forbid(unsafe_code)]

//! Enveloped signature transform.
//!
//! Removes the `<Signature>` element and its descendants from the node set,
//! so the digest covers the document as it was before signing.

use crate::pipeline::{Transform, TransformData};
use carimbo_core::{algorithm, Error};
use carimbo_xml::NodeSet;

/// The enveloped signature transform.
///
/// Holds the `NodeId` of the `<Signature>` element to remove; the id must
/// come from the same parse of the document that the transform runs on.
pub struct EnvelopedSignatureTransform {
    signature_node_id: roxmltree::NodeId,
}

impl EnvelopedSignatureTransform {
    /// Create from the Signature element node.
    pub fn from_node(sig_node: roxmltree::Node<'_, '_>) -> Self {
        Self {
            signature_node_id: sig_node.id(),
        }
    }
}

impl Transform for EnvelopedSignatureTransform {
    fn uri(&self) -> &str {
        algorithm::ENVELOPED_SIGNATURE
    }

    fn execute(&self, input: TransformData) -> Result<TransformData, Error> {
        match input {
            TransformData::Xml { xml_text, node_set } => {
                let doc =
                    roxmltree::Document::parse_with_options(&xml_text, carimbo_xml::parsing_options())
                        .map_err(|e| Error::XmlParse(e.to_string()))?;

                let mut ns = node_set.unwrap_or_else(|| NodeSet::all_without_comments(&doc));
                let sig_node = doc.get_node(self.signature_node_id).ok_or_else(|| {
                    Error::Transform("signature node not found in document".into())
                })?;
                ns.remove_subtree(sig_node);

                Ok(TransformData::Xml {
                    xml_text,
                    node_set: Some(ns),
                })
            }
            TransformData::Binary(_) => Err(Error::Transform(
                "enveloped-signature transform requires XML input".into(),
            )),
        }
    }
}
