#![forbid(unsafe_code)]

//! Output fragments the canonicalizer collects per element: namespace
//! declarations and attributes. Both sort into canonical order through
//! their derived `Ord`, and both render through `Display` with a leading
//! space so they concatenate directly after the element name.

use crate::escape;
use std::fmt;

/// A namespace declaration pending output.
///
/// Canonical order is the default declaration first, then prefixed
/// declarations by prefix. Deriving `Ord` with `prefix` as the leading
/// field gives exactly that, since the empty string sorts ahead of every
/// other prefix.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct NsDecl {
    pub prefix: String,
    pub uri: String,
}

impl fmt::Display for NsDecl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.prefix.is_empty() {
            write!(f, " xmlns=\"{}\"", escape::escape_attr(&self.uri))
        } else {
            write!(
                f,
                " xmlns:{}=\"{}\"",
                self.prefix,
                escape::escape_attr(&self.uri)
            )
        }
    }
}

/// An attribute pending output.
///
/// Canonical order keys on (namespace URI, local name), so unqualified
/// attributes (empty URI) come ahead of qualified ones; the derived `Ord`
/// over the field order encodes that.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct Attr {
    pub ns_uri: String,
    pub local_name: String,
    pub qualified_name: String,
    pub value: String,
}

impl fmt::Display for Attr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            " {}=\"{}\"",
            self.qualified_name,
            escape::escape_attr(&self.value)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decl(prefix: &str, uri: &str) -> NsDecl {
        NsDecl {
            prefix: prefix.into(),
            uri: uri.into(),
        }
    }

    #[test]
    fn default_declaration_sorts_ahead_of_prefixed() {
        let mut decls = vec![decl("z", "urn:z"), decl("", "urn:d"), decl("a", "urn:a")];
        decls.sort();
        let rendered: String = decls.iter().map(NsDecl::to_string).collect();
        assert_eq!(
            rendered,
            r#" xmlns="urn:d" xmlns:a="urn:a" xmlns:z="urn:z""#
        );
    }

    #[test]
    fn unqualified_attributes_sort_ahead_of_qualified() {
        let mut attrs = vec![
            Attr {
                ns_uri: "urn:n".into(),
                local_name: "a".into(),
                qualified_name: "n:a".into(),
                value: "1".into(),
            },
            Attr {
                ns_uri: String::new(),
                local_name: "z".into(),
                qualified_name: "z".into(),
                value: "2".into(),
            },
        ];
        attrs.sort();
        assert_eq!(attrs[0].qualified_name, "z");
    }

    #[test]
    fn rendering_escapes_the_value() {
        let attr = Attr {
            ns_uri: String::new(),
            local_name: "a".into(),
            qualified_name: "a".into(),
            value: "say \"hi\"".into(),
        };
        assert_eq!(attr.to_string(), r#" a="say &quot;hi&quot;""#);
    }
}
