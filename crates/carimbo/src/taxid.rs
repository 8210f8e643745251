#![forbid(unsafe_code)]

//! Brazilian tax identifier value objects (CPF and CNPJ) and extraction of
//! the identifier from ICP-Brasil certificates.
//!
//! Both identifier kinds validate the same way: strip everything that is
//! not a digit, reject all-equal-digit strings, and check two weighted
//! modulo-11 sums, one over the digits without the last check digit and
//! one over the full string.

use carimbo_core::Error;

/// ICP-Brasil otherName type-id carrying the holder's CNPJ.
const OID_ICP_BRASIL_CNPJ: &[u64] = &[2, 16, 76, 1, 3, 3];

// ── Value objects ────────────────────────────────────────────────────

/// An 11-digit CPF (natural-person tax id), stored as its digit string.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Cpf(String);

/// A 14-digit CNPJ (legal-entity tax id), stored as its digit string.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Cnpj(String);

/// Either kind of tax identifier, as found in a certificate.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum CpfCnpj {
    Cpf(Cpf),
    Cnpj(Cnpj),
}

impl Cpf {
    pub fn parse(value: &str) -> Result<Self, Error> {
        let digits = digit_string(value);
        if digits.len() != 11 {
            return Err(Error::InvalidArgument(format!(
                "CPF must have 11 digits, got {}",
                digits.len()
            )));
        }
        validate(&digits, cpf_weight)?;
        Ok(Self(digits))
    }

    /// The raw 11-digit string.
    pub fn digits(&self) -> &str {
        &self.0
    }
}

impl Cnpj {
    pub fn parse(value: &str) -> Result<Self, Error> {
        let digits = digit_string(value);
        if digits.len() != 14 {
            return Err(Error::InvalidArgument(format!(
                "CNPJ must have 14 digits, got {}",
                digits.len()
            )));
        }
        validate(&digits, cnpj_weight)?;
        Ok(Self(digits))
    }

    /// The raw 14-digit string.
    pub fn digits(&self) -> &str {
        &self.0
    }
}

impl CpfCnpj {
    /// Parse a tax identifier, deciding the kind by digit count.
    pub fn parse(value: &str) -> Result<Self, Error> {
        let digits = digit_string(value);
        match digits.len() {
            11 => Ok(Self::Cpf(Cpf::parse(&digits)?)),
            14 => Ok(Self::Cnpj(Cnpj::parse(&digits)?)),
            n => Err(Error::InvalidArgument(format!(
                "tax id must have 11 or 14 digits, got {n}"
            ))),
        }
    }

    pub fn is_cpf(&self) -> bool {
        matches!(self, Self::Cpf(_))
    }

    pub fn is_cnpj(&self) -> bool {
        matches!(self, Self::Cnpj(_))
    }

    /// The raw digit string.
    pub fn digits(&self) -> &str {
        match self {
            Self::Cpf(cpf) => cpf.digits(),
            Self::Cnpj(cnpj) => cnpj.digits(),
        }
    }
}

impl std::fmt::Display for Cpf {
    /// Renders `123.456.789-09`.
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let d = &self.0;
        write!(f, "{}.{}.{}-{}", &d[0..3], &d[3..6], &d[6..9], &d[9..11])
    }
}

impl std::fmt::Display for Cnpj {
    /// Renders `12.345.678/0001-90`.
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let d = &self.0;
        write!(
            f,
            "{}.{}.{}/{}-{}",
            &d[0..2],
            &d[2..5],
            &d[5..8],
            &d[8..12],
            &d[12..14]
        )
    }
}

impl std::fmt::Display for CpfCnpj {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Cpf(cpf) => cpf.fmt(f),
            Self::Cnpj(cnpj) => cnpj.fmt(f),
        }
    }
}

// ── Checksum validation ──────────────────────────────────────────────

fn digit_string(value: &str) -> String {
    value.chars().filter(|c| c.is_ascii_digit()).collect()
}

/// Both check digits must hold: the weighted sum over the digits without
/// the final check digit and over the full string.
fn validate(digits: &str, weight: fn(usize, usize) -> u32) -> Result<(), Error> {
    let first = digits.chars().next();
    if digits.chars().all(|c| Some(c) == first) {
        return Err(Error::InvalidArgument(
            "tax id digits must not all be equal".into(),
        ));
    }
    if checksum_holds(&digits[..digits.len() - 1], weight) && checksum_holds(digits, weight) {
        Ok(())
    } else {
        Err(Error::InvalidArgument("tax id checksum failed".into()))
    }
}

fn checksum_holds(digits: &str, weight: fn(usize, usize) -> u32) -> bool {
    let len = digits.len();
    let sum: u32 = digits
        .chars()
        .enumerate()
        .map(|(i, c)| c.to_digit(10).unwrap_or(0) * weight(len, i))
        .sum();
    if digits.ends_with('0') {
        sum % 11 < 2
    } else {
        sum % 11 == 0
    }
}

fn cpf_weight(len: usize, i: usize) -> u32 {
    (len - i) as u32
}

fn cnpj_weight(len: usize, i: usize) -> u32 {
    let index = (len - i - 1) as u32;
    (index % 9 + 1) + (index / 9)
}

// ── Certificate extraction ───────────────────────────────────────────

/// Scan a DER certificate chain for an ICP-Brasil tax identifier.
///
/// Looks at each certificate's subjectAltName extension for an otherName
/// entry with type-id 2.16.76.1.3.3 and parses its value as a tax id.
/// Certificates without the extension, with undecodable entries, or with
/// a value that fails validation are skipped; the failures are logged at
/// debug level since absence is an expected outcome.
pub fn extract_tax_id(chain: &[Vec<u8>]) -> Option<CpfCnpj> {
    for der in chain {
        let cert = match carimbo_keys::x509::parse_certificate(der) {
            Ok(cert) => cert,
            Err(e) => {
                tracing::debug!("skipping unparsable certificate: {e}");
                continue;
            }
        };
        let Some(san) = carimbo_keys::x509::subject_alt_name_der(&cert) else {
            continue;
        };
        match icp_brasil_value(&san) {
            Ok(Some(text)) => match CpfCnpj::parse(&text) {
                Ok(id) => return Some(id),
                Err(e) => tracing::debug!("otherName value is not a valid tax id: {e}"),
            },
            Ok(None) => {}
            Err(e) => tracing::debug!("skipping malformed subjectAltName: {e}"),
        }
    }
    None
}

/// Walk the GeneralNames sequence of a subjectAltName extension value and
/// return the UTF-8 contents of the ICP-Brasil otherName, if present.
///
/// ```text
/// GeneralNames ::= SEQUENCE OF GeneralName
/// GeneralName  ::= CHOICE { otherName [0] OtherName, ... }
/// OtherName    ::= SEQUENCE { type-id OID, value [0] EXPLICIT ANY }
/// ```
fn icp_brasil_value(san_der: &[u8]) -> Result<Option<String>, Error> {
    let wanted = yasna::models::ObjectIdentifier::from_slice(OID_ICP_BRASIL_CNPJ);
    let entries = yasna::parse_der(san_der, |reader| {
        reader.collect_sequence_of(|mut entry| {
            let tag = entry.lookahead_tag()?;
            if tag != yasna::Tag::context(0) {
                // Some other GeneralName alternative
                entry.read_der()?;
                return Ok(None);
            }
            entry.read_tagged_implicit(yasna::Tag::context(0), |other_name| {
                other_name.read_sequence(|seq| {
                    let type_id = seq.next().read_oid()?;
                    let value = seq
                        .next()
                        .read_tagged(yasna::Tag::context(0), |inner| inner.read_tagged_der())?;
                    if type_id == wanted {
                        Ok(Some(value.value().to_vec()))
                    } else {
                        Ok(None)
                    }
                })
            })
        })
    })
    .map_err(|e| Error::Certificate(format!("malformed subjectAltName: {e}")))?;

    for bytes in entries.into_iter().flatten() {
        match String::from_utf8(bytes) {
            Ok(text) => return Ok(Some(text)),
            Err(_) => tracing::debug!("otherName value is not UTF-8"),
        }
    }
    Ok(None)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn valid_cnpjs_accepted() {
        for s in ["19861350000170", "23144170000145", "00881753000153"] {
            assert!(Cnpj::parse(s).is_ok(), "{s}");
        }
    }

    #[test]
    fn valid_cpfs_accepted() {
        for s in [
            "185.302.491-00",
            "18530249100",
            "297.276.931-72",
            "04642835903",
            "13187110703",
        ] {
            assert!(Cpf::parse(s).is_ok(), "{s}");
        }
    }

    #[test]
    fn bad_check_digits_rejected() {
        assert!(Cnpj::parse("19861350000171").is_err());
        assert!(Cpf::parse("04642835913").is_err());
        assert!(Cpf::parse("005.333.839-18").is_err());
    }

    #[test]
    fn repeated_digits_rejected() {
        assert!(Cpf::parse("11111111111").is_err());
        assert!(Cnpj::parse("00000000000000").is_err());
    }

    #[test]
    fn wrong_length_rejected() {
        assert!(CpfCnpj::parse("0123456789").is_err());
        assert!(CpfCnpj::parse("012345678901").is_err());
        assert!(CpfCnpj::parse("").is_err());
    }

    #[test]
    fn punctuation_is_stripped() {
        assert_eq!(
            Cnpj::parse("19.861.350/0001-70").unwrap(),
            Cnpj::parse("19861350000170").unwrap()
        );
    }

    #[test]
    fn kind_follows_digit_count() {
        let cnpj = CpfCnpj::parse("19861350000170").unwrap();
        assert!(cnpj.is_cnpj());
        assert!(!cnpj.is_cpf());
        let cpf = CpfCnpj::parse("18530249100").unwrap();
        assert!(cpf.is_cpf());
    }

    #[test]
    fn display_renders_formatted() {
        assert_eq!(
            Cnpj::parse("19861350000170").unwrap().to_string(),
            "19.861.350/0001-70"
        );
        assert_eq!(
            Cpf::parse("18530249100").unwrap().to_string(),
            "185.302.491-00"
        );
    }

    #[test]
    fn digits_accessor_returns_raw_string() {
        let id = CpfCnpj::parse("19.861.350/0001-70").unwrap();
        assert_eq!(id.digits(), "19861350000170");
    }

    fn san_with_other_name(oid: &[u64], value: &[u8]) -> Vec<u8> {
        yasna::construct_der(|writer| {
            writer.write_sequence_of(|writer| {
                writer.next().write_tagged_implicit(
                    yasna::Tag::context(0),
                    |writer| {
                        writer.write_sequence(|writer| {
                            writer
                                .next()
                                .write_oid(&yasna::models::ObjectIdentifier::from_slice(oid));
                            writer
                                .next()
                                .write_tagged(yasna::Tag::context(0), |writer| {
                                    writer.write_bytes(value);
                                });
                        });
                    },
                );
            })
        })
    }

    #[test]
    fn icp_brasil_other_name_is_found() {
        let san = san_with_other_name(&[2, 16, 76, 1, 3, 3], b"19861350000170");
        let value = icp_brasil_value(&san).unwrap();
        assert_eq!(value.as_deref(), Some("19861350000170"));
    }

    #[test]
    fn unrelated_other_name_is_ignored() {
        let san = san_with_other_name(&[1, 2, 3, 4], b"19861350000170");
        assert_eq!(icp_brasil_value(&san).unwrap(), None);
    }

    #[test]
    fn garbage_san_is_an_error() {
        assert!(icp_brasil_value(b"not a sequence").is_err());
    }

    #[test]
    fn chain_without_extension_yields_none() {
        assert_eq!(extract_tax_id(&[vec![0x30, 0x00]]), None);
    }
}
