#![forbid(unsafe_code)]

//! Inclusive Canonical XML 1.0 (C14N 1.0).
//!
//! Algorithm URI: `http://www.w3.org/TR/2001/REC-xml-c14n-20010315`
//! With comments: `http://www.w3.org/TR/2001/REC-xml-c14n-20010315#WithComments`
//!
//! Per the spec, the canonical form:
//! - Outputs namespace declarations sorted by prefix (default first)
//! - Outputs attributes sorted by (namespace-URI, local-name)
//! - Escapes text and attribute values per C14N rules
//! - Optionally preserves or strips comments
//! - Supports document-subset canonicalization via NodeSet

use crate::escape;
use crate::render::{Attr, NsDecl};
use carimbo_core::Error;
use carimbo_xml::NodeSet;
use std::collections::BTreeMap;

/// Canonicalize a document using Inclusive C14N 1.0.
pub fn canonicalize(
    doc: &roxmltree::Document<'_>,
    with_comments: bool,
    node_set: Option<&NodeSet>,
) -> Result<Vec<u8>, Error> {
    let mut output = Vec::new();
    let ctx = C14nContext {
        with_comments,
        node_set,
    };
    ctx.process_node(doc.root(), &mut output, &BTreeMap::new())?;
    Ok(output)
}

struct C14nContext<'a> {
    with_comments: bool,
    node_set: Option<&'a NodeSet>,
}

impl C14nContext<'_> {
    fn is_visible(&self, node: &roxmltree::Node<'_, '_>) -> bool {
        match self.node_set {
            None => true,
            Some(ns) => ns.contains(node),
        }
    }

    fn process_node(
        &self,
        node: roxmltree::Node<'_, '_>,
        output: &mut Vec<u8>,
        inherited_ns: &BTreeMap<String, String>,
    ) -> Result<(), Error> {
        match node.node_type() {
            roxmltree::NodeType::Root => {
                for child in node.children() {
                    self.process_node(child, output, inherited_ns)?;
                }
            }
            roxmltree::NodeType::Element => {
                self.process_element(node, output, inherited_ns)?;
            }
            roxmltree::NodeType::Text => {
                if self.is_visible(&node) {
                    let text = node.text().unwrap_or("");
                    output.extend_from_slice(escape::escape_text(text).as_bytes());
                }
            }
            roxmltree::NodeType::Comment => {
                if self.with_comments && self.is_visible(&node) {
                    // Comments outside the document element get newline
                    // separators in the canonical form.
                    let parent_is_root = node
                        .parent()
                        .is_some_and(|p| p.node_type() == roxmltree::NodeType::Root);

                    if parent_is_root && node.prev_siblings().any(|s| s.is_element()) {
                        output.push(b'\n');
                    }

                    output.extend_from_slice(b"<!--");
                    output.extend_from_slice(node.text().unwrap_or("").as_bytes());
                    output.extend_from_slice(b"-->");

                    if parent_is_root && node.next_siblings().any(|s| s.is_element()) {
                        output.push(b'\n');
                    }
                }
            }
            roxmltree::NodeType::PI => {
                if self.is_visible(&node) {
                    let parent_is_root = node
                        .parent()
                        .is_some_and(|p| p.node_type() == roxmltree::NodeType::Root);

                    if parent_is_root && node.prev_siblings().any(|s| s.is_element()) {
                        output.push(b'\n');
                    }

                    output.extend_from_slice(b"<?");
                    output.extend_from_slice(node.tag_name().name().as_bytes());
                    if let Some(value) = node.text() {
                        if !value.is_empty() {
                            output.push(b' ');
                            output.extend_from_slice(escape::escape_pi(value).as_bytes());
                        }
                    }
                    output.extend_from_slice(b"?>");

                    if parent_is_root && node.next_siblings().any(|s| s.is_element()) {
                        output.push(b'\n');
                    }
                }
            }
        }
        Ok(())
    }

    fn process_element(
        &self,
        node: roxmltree::Node<'_, '_>,
        output: &mut Vec<u8>,
        inherited_ns: &BTreeMap<String, String>,
    ) -> Result<(), Error> {
        if !self.is_visible(&node) {
            // Per C14N 1.0 section 2.3: an element not in the node set
            // contributes nothing itself; its children in the node set are
            // still processed, inheriting the namespace context of the
            // nearest visible ancestor.
            for child in node.children() {
                self.process_node(child, output, inherited_ns)?;
            }
            return Ok(());
        }

        // All namespaces in scope at this element: declarations on the
        // element and on ancestors, closer declarations winning.
        let current_ns = collect_inscope_namespaces(&node);

        // Output a declaration for every in-scope namespace that is new or
        // different from the inherited context. The xml namespace is never
        // declared.
        let mut ns_decls: Vec<NsDecl> = Vec::new();
        for (prefix, uri) in &current_ns {
            if prefix == "xml" {
                continue;
            }
            if inherited_ns.get(prefix) != Some(uri) {
                ns_decls.push(NsDecl {
                    prefix: prefix.clone(),
                    uri: uri.clone(),
                });
            }
        }
        ns_decls.sort();

        let mut attrs: Vec<Attr> = Vec::new();
        for attr in node.attributes() {
            let ns_uri = attr.namespace().unwrap_or("");
            let qname = if let Some(prefix) = attr_prefix(&node, &attr) {
                format!("{}:{}", prefix, attr.name())
            } else {
                attr.name().to_owned()
            };
            attrs.push(Attr {
                ns_uri: ns_uri.to_owned(),
                local_name: attr.name().to_owned(),
                qualified_name: qname,
                value: attr.value().to_owned(),
            });
        }

        // xml:* attributes are inherited from ancestors when the element is
        // visible but its immediate parent is not (document-subset case).
        if self.node_set.is_some() {
            let parent_not_visible = node
                .parent()
                .map_or(true, |p| !p.is_element() || !self.is_visible(&p));
            if parent_not_visible {
                let extra = collect_inherited_xml_attrs(&node, &attrs);
                attrs.extend(extra);
            }
        }
        attrs.sort();

        let elem_name = qualified_element_name(&node);

        output.push(b'<');
        output.extend_from_slice(elem_name.as_bytes());
        for ns_decl in &ns_decls {
            output.extend_from_slice(ns_decl.to_string().as_bytes());
        }
        for attr in &attrs {
            output.extend_from_slice(attr.to_string().as_bytes());
        }
        output.push(b'>');

        // Children see this element's full in-scope namespace context.
        let mut child_ns = inherited_ns.clone();
        for (prefix, uri) in &current_ns {
            if prefix != "xml" {
                child_ns.insert(prefix.clone(), uri.clone());
            }
        }
        for child in node.children() {
            self.process_node(child, output, &child_ns)?;
        }

        output.extend_from_slice(b"</");
        output.extend_from_slice(elem_name.as_bytes());
        output.push(b'>');
        Ok(())
    }
}

/// For document-subset C14N: collect xml:* attributes inherited from
/// ancestors, nearest ancestor winning, skipping any already present on the
/// element's own attribute axis.
fn collect_inherited_xml_attrs(
    node: &roxmltree::Node<'_, '_>,
    existing_attrs: &[Attr],
) -> Vec<Attr> {
    let xml_ns = "http://www.w3.org/XML/1998/namespace";
    let mut inherited_xml: BTreeMap<String, String> = BTreeMap::new();

    let mut current = node.parent();
    while let Some(ancestor) = current {
        if ancestor.is_element() {
            for attr in ancestor.attributes() {
                if attr.namespace() == Some(xml_ns) && !inherited_xml.contains_key(attr.name()) {
                    inherited_xml.insert(attr.name().to_owned(), attr.value().to_owned());
                }
            }
        }
        current = ancestor.parent();
    }

    let mut result = Vec::new();
    for (name, value) in &inherited_xml {
        let already_present = existing_attrs
            .iter()
            .any(|a| a.ns_uri == xml_ns && a.local_name == *name);
        if !already_present {
            result.push(Attr {
                ns_uri: xml_ns.to_owned(),
                local_name: name.clone(),
                qualified_name: format!("xml:{name}"),
                value: value.clone(),
            });
        }
    }
    result
}

/// Collect all in-scope namespaces for an element.
///
/// Walks up the ancestor chain collecting namespace declarations, with
/// closer declarations overriding more distant ones.
fn collect_inscope_namespaces(node: &roxmltree::Node<'_, '_>) -> BTreeMap<String, String> {
    let mut ns_stack: Vec<BTreeMap<String, String>> = Vec::new();

    let mut current = Some(*node);
    while let Some(n) = current {
        if n.is_element() {
            let mut level = BTreeMap::new();
            for ns in n.namespaces() {
                level.insert(ns.name().unwrap_or("").to_owned(), ns.uri().to_owned());
            }
            ns_stack.push(level);
        }
        current = n.parent();
    }

    // Merge from root down (root is last in stack)
    let mut result = BTreeMap::new();
    for level in ns_stack.into_iter().rev() {
        for (prefix, uri) in level {
            if uri.is_empty() {
                // Un-declaration of default namespace
                result.remove(&prefix);
            } else {
                result.insert(prefix, uri);
            }
        }
    }
    result
}

/// The qualified element name (prefix:local or just local). The prefix is
/// resolved from the element's in-scope declarations; an empty prefix means
/// the default namespace.
fn qualified_element_name(node: &roxmltree::Node<'_, '_>) -> String {
    let prefix = node
        .tag_name()
        .namespace()
        .and_then(|uri| node.lookup_prefix(uri))
        .filter(|p| !p.is_empty());
    match prefix {
        Some(prefix) => format!("{}:{}", prefix, node.tag_name().name()),
        None => node.tag_name().name().to_owned(),
    }
}

/// The prefix for a namespaced attribute, resolved against the owning
/// element's in-scope declarations. Unqualified attributes have none.
fn attr_prefix(
    node: &roxmltree::Node<'_, '_>,
    attr: &roxmltree::Attribute<'_, '_>,
) -> Option<String> {
    let uri = attr.namespace()?;
    node.lookup_prefix(uri)
        .filter(|p| !p.is_empty())
        .map(str::to_owned)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn c14n(xml: &str) -> String {
        let doc = roxmltree::Document::parse(xml).unwrap();
        String::from_utf8(canonicalize(&doc, false, None).unwrap()).unwrap()
    }

    #[test]
    fn attributes_sorted() {
        assert_eq!(
            c14n(r#"<root><a b="1" a="2"/></root>"#),
            r#"<root><a a="2" b="1"></a></root>"#
        );
    }

    #[test]
    fn namespaces_rendered_once() {
        let out = c14n(r#"<root xmlns:a="http://a" xmlns:b="http://b"><a:child/></root>"#);
        assert!(out.contains("xmlns:a=\"http://a\""));
        assert!(out.contains("xmlns:b=\"http://b\""));
        // Declarations inherited by the child are not repeated.
        assert_eq!(out.matches("xmlns:a").count(), 1);
    }

    #[test]
    fn default_namespace_sorts_first() {
        let out = c14n(r#"<r xmlns="urn:d" xmlns:z="urn:z"/>"#);
        assert_eq!(out, r#"<r xmlns="urn:d" xmlns:z="urn:z"></r>"#);
    }

    #[test]
    fn text_escaping() {
        assert_eq!(
            c14n(r#"<root>a &amp; b &lt; c</root>"#),
            "<root>a &amp; b &lt; c</root>"
        );
    }

    #[test]
    fn comments_stripped_without_comments_mode() {
        assert_eq!(c14n("<r><!-- x --><a/></r>"), "<r><a></a></r>");
    }

    #[test]
    fn prefixed_element_and_attribute_keep_their_prefixes() {
        let out = c14n(r#"<p:r xmlns:p="urn:p" xmlns:q="urn:q" q:a="1"/>"#);
        assert_eq!(
            out,
            r#"<p:r xmlns:p="urn:p" xmlns:q="urn:q" q:a="1"></p:r>"#
        );
    }

    #[test]
    fn xml_space_attribute_is_qualified() {
        let out = c14n(r#"<r xml:space="preserve"/>"#);
        assert_eq!(out, r#"<r xml:space="preserve"></r>"#);
    }

    #[test]
    fn subset_skips_invisible_elements() {
        let xml = r#"<r><keep><inner/></keep><drop/></r>"#;
        let doc = roxmltree::Document::parse(xml).unwrap();
        let keep = doc.descendants().find(|n| n.has_tag_name("keep")).unwrap();
        let set = NodeSet::tree_without_comments(keep);
        let out = String::from_utf8(canonicalize(&doc, false, Some(&set)).unwrap()).unwrap();
        assert_eq!(out, "<keep><inner></inner></keep>");
    }
}
