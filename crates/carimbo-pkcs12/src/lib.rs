#![forbid(unsafe_code)]

//! PKCS#12 (.p12/.pfx) container support for the carimbo signature library.
//!
//! Parsing accepts both legacy PBE (SHA-1 + 3DES-CBC) and modern PBES2
//! (PBKDF2 + AES-256-CBC) encryption. Encoding always produces PBES2 with
//! PBKDF2-HMAC-SHA256, AES-256-CBC and an HMAC-SHA256 integrity MAC.

mod kdf;
mod oid;
mod parse;
mod write;

pub use kdf::password_to_bmp;

/// Contents extracted from a PKCS#12 file.
#[derive(Debug)]
pub struct Pkcs12Contents {
    /// PKCS#8 DER-encoded private keys.
    pub private_keys: Vec<Vec<u8>>,
    /// DER-encoded X.509 certificates.
    pub certificates: Vec<Vec<u8>>,
}

/// Parse a PKCS#12 file, decrypting with the given password.
pub fn parse_pkcs12(data: &[u8], password: &str) -> Result<Pkcs12Contents, carimbo_core::Error> {
    parse::parse_pfx(data, password)
}

/// Encode a private key and certificate chain as a fresh PKCS#12 blob
/// encrypted under the given password.
pub fn write_pkcs12(
    private_key_der: &[u8],
    certificates: &[Vec<u8>],
    password: &str,
) -> Result<Vec<u8>, carimbo_core::Error> {
    write::write_pfx(private_key_der, certificates, password)
}
