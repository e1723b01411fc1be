//! Data Object List engine
//!
//! A DOL is a card's request for terminal data: a sequence of tag and length
//! pairs. The response is the concatenation of one value per entry, each
//! exactly the requested length.

use emv_common::tags::ids;
use emv_common::{TagContext, TagRegistry, TlvReader};
use rand::Rng;
use tracing::debug;

use crate::application::ApplicationCandidate;
use crate::error::ParseError;
use crate::terminal::TerminalContext;

/// One requested data object
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagAndLength {
    pub tag: Vec<u8>,
    pub length: usize,
}

/// Parse a DOL into its entries
pub fn parse_dol(data: &[u8]) -> Result<Vec<TagAndLength>, ParseError> {
    let mut reader = TlvReader::new(data);
    let mut entries = Vec::new();
    while !reader.is_empty() {
        let tag = reader.read_tag_id()?;
        let offset = reader.position();
        let length = match reader.read_value(1) {
            Ok(octet) => usize::from(octet[0]),
            Err(_) => {
                return Err(ParseError::DolTruncated {
                    tag: hex::encode_upper(&tag),
                    offset,
                });
            }
        };
        entries.push(TagAndLength { tag, length });
    }
    Ok(entries)
}

/// Where a DOL value came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueSource {
    Override,
    Computed,
    Default,
    ZeroFill,
}

/// Builds DOL responses from terminal and application data
///
/// Each entry is resolved in order from the configured override, a computed
/// value, the static default properties, and finally zero fill. A candidate
/// value is only used when its length matches the requested length.
#[derive(Debug, Clone, Copy)]
pub struct DolBuilder<'a> {
    terminal: &'a TerminalContext,
    registry: &'a TagRegistry,
    context: TagContext<'a>,
    issuer_country: Option<[u8; 2]>,
    currency: Option<[u8; 2]>,
}

impl<'a> DolBuilder<'a> {
    pub fn new(terminal: &'a TerminalContext, registry: &'a TagRegistry) -> Self {
        Self {
            terminal,
            registry,
            context: TagContext::global(),
            issuer_country: None,
            currency: None,
        }
    }

    /// Take the issuer country and currency from an application
    pub fn for_application(mut self, application: &'a ApplicationCandidate) -> Self {
        self.context = application.tag_context();
        self.issuer_country = application.issuer_country_code();
        self.currency = application.currency_code;
        self
    }

    /// Parse `dol` and build its response
    pub fn build(&self, dol: &[u8]) -> Result<Vec<u8>, ParseError> {
        let entries = parse_dol(dol)?;
        Ok(self.build_entries(&entries))
    }

    /// Concatenate the resolved value of every entry
    pub fn build_entries(&self, entries: &[TagAndLength]) -> Vec<u8> {
        let mut data = Vec::with_capacity(entries.iter().map(|e| e.length).sum());
        for entry in entries {
            let (value, _) = self.resolve(entry);
            data.extend_from_slice(&value);
        }
        data
    }

    /// Value for one entry and where it came from
    pub fn resolve(&self, entry: &TagAndLength) -> (Vec<u8>, ValueSource) {
        let (value, source) = self
            .fitting(entry, ValueSource::Override, || self.terminal.override_for(&entry.tag).map(<[u8]>::to_vec))
            .or_else(|| self.fitting(entry, ValueSource::Computed, || self.computed(entry)))
            .or_else(|| self.fitting(entry, ValueSource::Default, || self.terminal.default_for(&entry.tag).map(<[u8]>::to_vec)))
            .unwrap_or_else(|| (vec![0; entry.length], ValueSource::ZeroFill));

        debug!(
            tag = %hex::encode_upper(&entry.tag),
            name = self.registry.lookup(&self.context, &entry.tag).name(),
            length = entry.length,
            ?source,
            "Resolved DOL entry"
        );
        (value, source)
    }

    fn fitting(
        &self,
        entry: &TagAndLength,
        source: ValueSource,
        value: impl FnOnce() -> Option<Vec<u8>>,
    ) -> Option<(Vec<u8>, ValueSource)> {
        let value = value()?;
        if value.len() == entry.length {
            return Some((value, source));
        }
        debug!(
            tag = %hex::encode_upper(&entry.tag),
            ?source,
            requested = entry.length,
            available = value.len(),
            "Ignoring DOL value of the wrong length"
        );
        None
    }

    fn computed(&self, entry: &TagAndLength) -> Option<Vec<u8>> {
        let value = match entry.tag.as_slice() {
            ids::TERMINAL_COUNTRY_CODE => self
                .issuer_country
                .unwrap_or_else(|| self.terminal.country_code())
                .to_vec(),
            ids::TRANSACTION_CURRENCY_CODE => self
                .currency
                .or_else(|| self.terminal.locale_currency())
                .unwrap_or_else(|| self.terminal.currency_code())
                .to_vec(),
            ids::UNPREDICTABLE_NUMBER => {
                let mut value = vec![0; entry.length];
                rand::thread_rng().fill(value.as_mut_slice());
                value
            }
            ids::TERMINAL_TRANSACTION_QUALIFIERS => self.terminal.ttq().to_vec(),
            ids::TVR => self.terminal.tvr().to_vec(),
            ids::TRANSACTION_DATE => self.terminal.transaction_date().to_vec(),
            _ => return None,
        };
        Some(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn terminal() -> TerminalContext {
        TerminalContext::default().with_date(NaiveDate::from_ymd_opt(2025, 12, 31).unwrap())
    }

    #[test]
    fn test_parse_dol() {
        let entries = parse_dol(&[0x9F, 0x66, 0x04, 0x9F, 0x02, 0x06, 0x95, 0x05]).unwrap();
        assert_eq!(
            entries,
            vec![
                TagAndLength { tag: vec![0x9F, 0x66], length: 4 },
                TagAndLength { tag: vec![0x9F, 0x02], length: 6 },
                TagAndLength { tag: vec![0x95], length: 5 },
            ]
        );
        assert!(parse_dol(&[]).unwrap().is_empty());
    }

    #[test]
    fn test_parse_dol_missing_length() {
        assert_eq!(
            parse_dol(&[0x9F, 0x66, 0x04, 0x9F, 0x37]),
            Err(ParseError::DolTruncated { tag: "9F37".into(), offset: 5 })
        );
    }

    #[test]
    fn test_build_concatenates_requested_lengths() {
        let terminal = terminal();
        let builder = DolBuilder::new(&terminal, TagRegistry::global());
        let dol = [0x9F, 0x66, 0x04, 0x9F, 0x02, 0x06, 0x9F, 0x37, 0x04, 0x9A, 0x03, 0x9F, 0x7F, 0x02];
        let data = builder.build(&dol).unwrap();

        assert_eq!(data.len(), 4 + 6 + 4 + 3 + 2);
        assert_eq!(&data[..4], &terminal.ttq());
        assert_eq!(&data[4..10], &[0x00, 0x00, 0x00, 0x00, 0x01, 0x00]);
        assert_eq!(&data[14..17], &[0x25, 0x12, 0x31]);
        assert_eq!(&data[17..], &[0x00, 0x00]);
    }

    #[test]
    fn test_override_wins() {
        let terminal = terminal().with_override(vec![0x9A], vec![0x20, 0x01, 0x01]);
        let builder = DolBuilder::new(&terminal, TagRegistry::global());
        let entry = TagAndLength { tag: vec![0x9A], length: 3 };
        assert_eq!(builder.resolve(&entry), (vec![0x20, 0x01, 0x01], ValueSource::Override));
    }

    #[test]
    fn test_wrong_length_falls_through() {
        let terminal = terminal().with_override(vec![0x9F, 0x66], vec![0x01]);
        let builder = DolBuilder::new(&terminal, TagRegistry::global());

        let ttq = TagAndLength { tag: vec![0x9F, 0x66], length: 4 };
        assert_eq!(builder.resolve(&ttq).1, ValueSource::Computed);

        let short_ttq = TagAndLength { tag: vec![0x9F, 0x66], length: 2 };
        assert_eq!(builder.resolve(&short_ttq), (vec![0, 0], ValueSource::ZeroFill));
    }

    #[test]
    fn test_country_and_currency_prefer_application() {
        let terminal = terminal().with_locale_currency(Some(978));
        let country = TagAndLength { tag: vec![0x9F, 0x1A], length: 2 };
        let currency = TagAndLength { tag: vec![0x5F, 0x2A], length: 2 };

        let builder = DolBuilder::new(&terminal, TagRegistry::global());
        assert_eq!(builder.resolve(&country).0, vec![0x08, 0x40]);
        assert_eq!(builder.resolve(&currency).0, vec![0x09, 0x78]);

        let mut app = ApplicationCandidate::new(vec![0xA0, 0x00, 0x00, 0x00, 0x04, 0x10, 0x10]);
        app.issuer_country = Some("GBR".into());
        app.currency_code = Some([0x08, 0x26]);
        let builder = builder.for_application(&app);
        assert_eq!(builder.resolve(&country).0, vec![0x08, 0x26]);
        assert_eq!(builder.resolve(&currency).0, vec![0x08, 0x26]);
    }

    #[test]
    fn test_unpredictable_number_is_fresh() {
        let terminal = terminal();
        let builder = DolBuilder::new(&terminal, TagRegistry::global());
        let entry = TagAndLength { tag: vec![0x9F, 0x37], length: 8 };
        let (first, source) = builder.resolve(&entry);
        let (second, _) = builder.resolve(&entry);
        assert_eq!(source, ValueSource::Computed);
        assert_eq!(first.len(), 8);
        assert_ne!(first, second);
    }
}
