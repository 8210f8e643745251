#![forbid(unsafe_code)]

/// Errors produced by the carimbo signature library.
///
/// Error strings never contain key material. Certificate and key errors
/// carry descriptive context only.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("certificate container error: {0}")]
    Container(String),

    #[error("container has no entry with both a private key and a certificate chain")]
    NoUsableEntry,

    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("no child element available to sign")]
    NoSignableChild,

    #[error("signing failed: {0}")]
    Signing(String),

    #[error("verification error: {0}")]
    Verification(String),

    #[error("XML parsing error: {0}")]
    XmlParse(String),

    #[error("invalid XML structure: {0}")]
    XmlStructure(String),

    #[error("unsupported algorithm: {0}")]
    UnsupportedAlgorithm(String),

    #[error("cryptographic error: {0}")]
    Crypto(String),

    #[error("key error: {0}")]
    Key(String),

    #[error("canonicalization error: {0}")]
    Canonicalization(String),

    #[error("transform error: {0}")]
    Transform(String),

    #[error("base64 decode error: {0}")]
    Base64(String),

    #[error("missing required element: {0}")]
    MissingElement(String),

    #[error("missing required attribute: {0}")]
    MissingAttribute(String),

    #[error("invalid URI reference: {0}")]
    InvalidUri(String),

    #[error("certificate error: {0}")]
    Certificate(String),
}

pub type Result<T> = std::result::Result<T, Error>;
