#![forbid(unsafe_code)]

//! XML document abstraction for the carimbo signature library.
//!
//! Provides a thin layer over `roxmltree`, plus the `NodeSet` type used for
//! document-subset canonicalization and the enveloped-signature transform.

pub mod document;
pub mod nodeset;
pub mod uri;
pub mod writer;

pub use nodeset::NodeSet;
pub use writer::XmlWriter;

/// Return roxmltree parsing options that allow DTD.
///
/// DTD is allowed because roxmltree does not expand external entities or
/// perform entity substitution beyond the five predefined XML entities.
pub fn parsing_options() -> roxmltree::ParsingOptions {
    roxmltree::ParsingOptions {
        allow_dtd: true,
        ..roxmltree::ParsingOptions::default()
    }
}
