//! Application model: candidates, directories and the data a session collects

use std::fmt;
use std::ops::RangeInclusive;

use emv_common::tags::ids;
use emv_common::{TagContext, TagRegistry, Tlv};

use crate::error::ParseError;
use crate::terminal::{country_numeric, numeric_code};

/// Application Interchange Profile
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Aip(pub [u8; 2]);

impl Aip {
    /// Parse the two AIP bytes
    pub fn from_bytes(data: &[u8]) -> Result<Self, ParseError> {
        let bytes = data.try_into().map_err(|_| ParseError::InvalidLength {
            name: "Application Interchange Profile",
            expected: 2,
            actual: data.len(),
        })?;
        Ok(Self(bytes))
    }

    pub const fn sda_supported(self) -> bool {
        self.0[0] & 0x40 != 0
    }

    pub const fn dda_supported(self) -> bool {
        self.0[0] & 0x20 != 0
    }

    pub const fn cardholder_verification_supported(self) -> bool {
        self.0[0] & 0x10 != 0
    }

    pub const fn terminal_risk_management_required(self) -> bool {
        self.0[0] & 0x08 != 0
    }

    pub const fn issuer_authentication_supported(self) -> bool {
        self.0[0] & 0x04 != 0
    }

    pub const fn cda_supported(self) -> bool {
        self.0[0] & 0x01 != 0
    }

    /// Names of the capabilities this profile advertises
    pub fn capabilities(self) -> Vec<&'static str> {
        [
            (self.sda_supported(), "SDA"),
            (self.dda_supported(), "DDA"),
            (self.cardholder_verification_supported(), "Cardholder verification"),
            (self.terminal_risk_management_required(), "Terminal risk management"),
            (self.issuer_authentication_supported(), "Issuer authentication"),
            (self.cda_supported(), "CDA"),
        ]
        .into_iter()
        .filter_map(|(set, name)| set.then_some(name))
        .collect()
    }
}

impl fmt::Display for Aip {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02X}{:02X}", self.0[0], self.0[1])
    }
}

/// One 4-byte Application File Locator group
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AflEntry {
    /// Short file identifier
    pub sfi: u8,
    pub first_record: u8,
    pub last_record: u8,
    /// Records involved in offline data authentication
    pub offline_auth_records: u8,
}

impl AflEntry {
    /// Record numbers covered by this entry
    pub const fn records(&self) -> RangeInclusive<u8> {
        self.first_record..=self.last_record
    }
}

/// Parse an AFL into its entries
///
/// Each group is `SFI << 3`, first record, last record and the offline data
/// authentication count. A group starting at record 0 or ending before it
/// starts rejects the whole AFL.
pub fn parse_afl(data: &[u8]) -> Result<Vec<AflEntry>, ParseError> {
    if data.len() % 4 != 0 {
        return Err(ParseError::AflLength(data.len()));
    }
    data.chunks_exact(4)
        .enumerate()
        .map(|(index, chunk)| {
            let entry = AflEntry {
                sfi: chunk[0] >> 3,
                first_record: chunk[1],
                last_record: chunk[2],
                offline_auth_records: chunk[3],
            };
            if entry.first_record == 0 {
                return Err(ParseError::AflStartRecord { index });
            }
            if entry.last_record < entry.first_record {
                return Err(ParseError::AflRecordRange {
                    index,
                    first: entry.first_record,
                    last: entry.last_record,
                });
            }
            Ok(entry)
        })
        .collect()
}

/// Raw record read from an application elementary file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileRecord {
    pub sfi: u8,
    pub number: u8,
    pub data: Vec<u8>,
}

/// An application discovered on the card, or named by the caller
///
/// Data objects the session does not interpret are kept in two append-only
/// lists: tags the registry knows and tags it does not.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ApplicationCandidate {
    pub aid: Vec<u8>,
    pub label: Option<String>,
    pub preferred_name: Option<String>,
    pub priority: Option<u8>,
    pub pdol: Option<Vec<u8>>,
    pub language_preference: Option<String>,
    pub issuer_code_table_index: Option<u8>,
    /// Issuer Identification Number
    pub iin: Option<Vec<u8>>,
    /// Issuer country, alpha-3 or alpha-2
    pub issuer_country: Option<String>,
    pub issuer_url: Option<String>,
    pub log_entry: Option<Vec<u8>>,
    pub aip: Option<Aip>,
    pub afl: Vec<AflEntry>,
    /// Application currency, BCD
    pub currency_code: Option<[u8; 2]>,
    /// Issuer country code, BCD
    pub country_code: Option<[u8; 2]>,
    pub records: Vec<FileRecord>,
    unprocessed: Vec<Tlv>,
    unknown: Vec<Tlv>,
}

impl ApplicationCandidate {
    pub fn new(aid: impl Into<Vec<u8>>) -> Self {
        Self {
            aid: aid.into(),
            ..Self::default()
        }
    }

    pub fn aid_hex(&self) -> String {
        hex::encode_upper(&self.aid)
    }

    /// Preferred name, label or AID, whichever is known first
    pub fn display_name(&self) -> String {
        self.preferred_name
            .clone()
            .or_else(|| self.label.clone())
            .unwrap_or_else(|| self.aid_hex())
    }

    /// Context for resolving this application's tags
    pub fn tag_context(&self) -> TagContext<'_> {
        TagContext::for_application(&self.aid, self.iin.as_deref())
    }

    /// Issuer country as a BCD numeric code, from the records or the FCI
    pub fn issuer_country_code(&self) -> Option<[u8; 2]> {
        self.country_code.or_else(|| {
            self.issuer_country
                .as_deref()
                .and_then(country_numeric)
                .map(numeric_code)
        })
    }

    /// File the object under known or unknown tags
    pub fn classify(&mut self, object: Tlv, registry: &TagRegistry) {
        if registry.lookup(&self.tag_context(), object.tag()).is_known() {
            self.unprocessed.push(object);
        } else {
            self.unknown.push(object);
        }
    }

    /// Capture the values later phases depend on, classify everything else
    pub fn absorb(&mut self, object: Tlv, registry: &TagRegistry) {
        let value = object.value();
        match object.tag() {
            ids::APPLICATION_CURRENCY_CODE if value.len() == 2 => {
                self.currency_code = Some([value[0], value[1]]);
            }
            ids::ISSUER_COUNTRY_CODE if value.len() == 2 => {
                self.country_code = Some([value[0], value[1]]);
            }
            _ => self.classify(object, registry),
        }
    }

    /// Known tags no phase interpreted
    pub fn unprocessed(&self) -> &[Tlv] {
        &self.unprocessed
    }

    /// Tags the registry cannot name
    pub fn unknown(&self) -> &[Tlv] {
        &self.unknown
    }
}

/// Payment system directory returned by SELECT of the PPSE or PSE
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Directory {
    /// Dedicated file name
    pub name: Vec<u8>,
    /// SFI of the directory elementary file (contact PSE)
    pub sfi: Option<u8>,
    pub language_preference: Option<String>,
    pub issuer_code_table_index: Option<u8>,
    pub candidates: Vec<ApplicationCandidate>,
    /// FCI objects the directory parser does not interpret
    pub unprocessed: Vec<Tlv>,
}

impl Directory {
    /// Candidates sorted by priority indicator, unprioritised last
    pub fn by_priority(&self) -> Vec<&ApplicationCandidate> {
        let mut candidates: Vec<_> = self.candidates.iter().collect();
        candidates.sort_by_key(|c| c.priority.map_or(u8::MAX, |p| p & 0x0F));
        candidates
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_afl() {
        let entries = parse_afl(&[0x08, 0x01, 0x03, 0x01, 0x10, 0x02, 0x02, 0x00]).unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].sfi, 1);
        assert_eq!(entries[0].records().collect::<Vec<_>>(), vec![1, 2, 3]);
        assert_eq!(entries[1].sfi, 2);
        assert_eq!(entries[1].offline_auth_records, 0);
    }

    #[test]
    fn test_parse_afl_first_byte_below_sfi_bits() {
        let entries = parse_afl(&[0x01, 0x02, 0x03, 0x01]).unwrap();
        assert_eq!(
            entries[0],
            AflEntry {
                sfi: 0,
                first_record: 2,
                last_record: 3,
                offline_auth_records: 1
            }
        );
    }

    #[test]
    fn test_parse_afl_errors() {
        assert_eq!(parse_afl(&[0x08, 0x01, 0x01]), Err(ParseError::AflLength(3)));
        assert_eq!(
            parse_afl(&[0x08, 0x01, 0x01, 0x00, 0x10, 0x00, 0x01, 0x00]),
            Err(ParseError::AflStartRecord { index: 1 })
        );
        assert_eq!(
            parse_afl(&[0x08, 0x03, 0x02, 0x00]),
            Err(ParseError::AflRecordRange {
                index: 0,
                first: 3,
                last: 2
            })
        );
        assert!(parse_afl(&[]).unwrap().is_empty());
    }

    #[test]
    fn test_aip() {
        let aip = Aip::from_bytes(&[0x19, 0x80]).unwrap();
        assert!(aip.cardholder_verification_supported());
        assert!(aip.terminal_risk_management_required());
        assert!(aip.cda_supported());
        assert!(!aip.sda_supported());
        assert_eq!(aip.to_string(), "1980");
        assert!(Aip::from_bytes(&[0x19]).is_err());
    }

    #[test]
    fn test_classify() {
        let registry = TagRegistry::global();
        let mut app = ApplicationCandidate::new(vec![0xA0, 0x00, 0x00, 0x00, 0x03, 0x10, 0x10]);
        app.classify(Tlv::new(vec![0x5F, 0x20], b"CARDHOLDER".to_vec()), registry);
        app.classify(Tlv::new(vec![0xDF, 0x7F], vec![0x01]), registry);
        app.absorb(Tlv::new(vec![0x9F, 0x42], vec![0x09, 0x78]), registry);

        assert_eq!(app.unprocessed().len(), 1);
        assert_eq!(app.unknown().len(), 1);
        assert_eq!(app.currency_code, Some([0x09, 0x78]));
    }

    #[test]
    fn test_issuer_country_code() {
        let mut app = ApplicationCandidate::new(vec![0xA0]);
        app.issuer_country = Some("GBR".into());
        assert_eq!(app.issuer_country_code(), Some([0x08, 0x26]));
        app.country_code = Some([0x02, 0x76]);
        assert_eq!(app.issuer_country_code(), Some([0x02, 0x76]));
    }

    #[test]
    fn test_directory_priority() {
        let mut low = ApplicationCandidate::new(vec![0x01]);
        low.priority = Some(0x02);
        let mut high = ApplicationCandidate::new(vec![0x02]);
        high.priority = Some(0x81);
        let none = ApplicationCandidate::new(vec![0x03]);
        let directory = Directory {
            candidates: vec![none, low, high],
            ..Directory::default()
        };
        let order: Vec<_> = directory.by_priority().iter().map(|c| c.aid[0]).collect();
        assert_eq!(order, vec![0x02, 0x01, 0x03]);
    }
}
