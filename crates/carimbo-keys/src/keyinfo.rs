#![forbid(unsafe_code)]

//! KeyInfo XML processing. Reads `<ds:X509Data>` entries to extract
//! candidate verification keys from embedded certificates.

use crate::key::Key;
use crate::loader;
use carimbo_core::ns;

/// Collect candidate keys from the `<X509Certificate>` entries under a
/// `<KeyInfo>` element, in document order.
///
/// Entries that fail to decode or parse are skipped; certificate material
/// inside a signature is attacker-controlled, so a bad entry must not
/// abort processing of the rest.
pub fn certificate_keys(key_info_node: roxmltree::Node<'_, '_>) -> Vec<Key> {
    use base64::Engine;
    let engine = base64::engine::general_purpose::STANDARD;

    let mut keys = Vec::new();
    for x509_data in key_info_node.children() {
        if !x509_data.is_element() || x509_data.tag_name().name() != ns::node::X509_DATA {
            continue;
        }
        for child in x509_data.children() {
            if !child.is_element() || child.tag_name().name() != ns::node::X509_CERTIFICATE {
                continue;
            }
            let b64 = child.text().unwrap_or("").trim();
            let clean: String = b64.chars().filter(|c| !c.is_whitespace()).collect();
            let Ok(der) = engine.decode(&clean) else {
                continue;
            };
            if let Ok(key) = loader::load_x509_cert_der(&der) {
                keys.push(key);
            }
        }
    }
    keys
}
