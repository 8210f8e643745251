#![forbid(unsafe_code)]

//! X.509 certificate helpers: parsing, SPKI extraction, validity and
//! extension access.

use carimbo_core::Error;
use der::{Decode, Encode};
use x509_cert::Certificate;

/// Parse a DER-encoded X.509 certificate.
pub fn parse_certificate(der: &[u8]) -> Result<Certificate, Error> {
    Certificate::from_der(der)
        .map_err(|e| Error::Certificate(format!("failed to parse X.509 certificate: {e}")))
}

/// Encode a certificate's SubjectPublicKeyInfo as DER.
pub fn spki_der(cert: &Certificate) -> Result<Vec<u8>, Error> {
    cert.tbs_certificate
        .subject_public_key_info
        .to_der()
        .map_err(|e| Error::Certificate(format!("failed to encode SPKI: {e}")))
}

/// Extract the RSA public key from a certificate, if it carries one.
pub fn rsa_public_key(cert: &Certificate) -> Option<rsa::RsaPublicKey> {
    use spki::DecodePublicKey;
    let der = spki_der(cert).ok()?;
    rsa::RsaPublicKey::from_public_key_der(&der).ok()
}

/// The notAfter bound of the certificate's validity period.
pub fn not_after(cert: &Certificate) -> der::DateTime {
    cert.tbs_certificate.validity.not_after.to_date_time()
}

/// Raw extension value (the inner OCTET STRING content) of the
/// subjectAltName extension, if present.
pub fn subject_alt_name_der(cert: &Certificate) -> Option<Vec<u8>> {
    // subjectAltName: 2.5.29.17
    let san_oid = der::asn1::ObjectIdentifier::new_unwrap("2.5.29.17");
    cert.tbs_certificate
        .extensions
        .as_ref()?
        .iter()
        .find(|ext| ext.extn_id == san_oid)
        .map(|ext| ext.extn_value.as_bytes().to_vec())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn garbage_der_rejected() {
        let err = parse_certificate(b"not a certificate").unwrap_err();
        assert!(matches!(err, Error::Certificate(_)));
    }
}
