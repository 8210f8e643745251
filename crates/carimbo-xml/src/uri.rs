#![forbid(unsafe_code)]

//! Same-document URI reference resolution for XML-DSig processing.

use carimbo_core::Error;
use std::collections::HashMap;

/// Parse a same-document reference (e.g., `#foo` → `foo`).
pub fn parse_same_document_ref(uri: &str) -> Option<&str> {
    uri.strip_prefix('#')
}

/// Resolve an ID value in a parsed document using a pre-built ID map.
pub fn resolve_id<'a>(
    doc: &'a roxmltree::Document<'a>,
    id_map: &HashMap<String, roxmltree::NodeId>,
    id: &str,
) -> Result<roxmltree::Node<'a, 'a>, Error> {
    id_map
        .get(id)
        .and_then(|nid| doc.get_node(*nid))
        .ok_or_else(|| Error::InvalidUri(format!("ID not found: {id}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::build_id_map;

    #[test]
    fn same_document_ref() {
        assert_eq!(parse_same_document_ref("#abc"), Some("abc"));
        assert_eq!(parse_same_document_ref("abc"), None);
    }

    #[test]
    fn resolve_known_and_unknown_ids() {
        let xml = r#"<r><a Id="target"/></r>"#;
        let doc = roxmltree::Document::parse(xml).unwrap();
        let map = build_id_map(&doc);
        let node = resolve_id(&doc, &map, "target").unwrap();
        assert!(node.has_tag_name("a"));
        assert!(resolve_id(&doc, &map, "missing").is_err());
    }
}
