//! Terminal context
//!
//! The values a terminal contributes when a card asks for them through a data
//! object list: configured overrides, computed values such as the transaction
//! date, and static default properties.

use std::collections::{BTreeMap, HashMap};

use chrono::{Datelike, Local, NaiveDate};
use emv_common::tlv::parse_tag;
use serde::{Deserialize, Serialize};

use crate::error::ParseError;

/// Terminal Transaction Qualifiers advertised when none are configured:
/// EMV contactless and contact chip, online PIN, signature, consumer device CVM
pub const DEFAULT_TTQ: [u8; 4] = [0x36, 0x00, 0x40, 0x00];

/// Static default properties, by tag
const DEFAULT_PROPERTIES: &[(&[u8], &[u8])] = &[
    // Amount, Authorised: 1.00
    (&[0x9F, 0x02], &[0x00, 0x00, 0x00, 0x00, 0x01, 0x00]),
    (&[0x9F, 0x03], &[0x00, 0x00, 0x00, 0x00, 0x00, 0x00]),
    // Transaction Type: purchase
    (&[0x9C], &[0x00]),
    // Terminal Type: attended, offline with online capability, merchant
    (&[0x9F, 0x35], &[0x22]),
    (&[0x9F, 0x33], &[0xE0, 0xF0, 0xC8]),
    (&[0x9F, 0x40], &[0x60, 0x00, 0xF0, 0xA0, 0x01]),
    // Merchant Category Code: miscellaneous retail
    (&[0x9F, 0x15], &[0x59, 0x99]),
];

/// Terminal settings, typically loaded from a configuration file
///
/// Tag keys and values in `overrides` and `defaults` are hex strings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TerminalConfig {
    /// ISO 3166-1 numeric terminal country
    pub country_code: u16,
    /// ISO 4217 numeric transaction currency
    pub currency_code: u16,
    /// Terminal Transaction Qualifiers in hex
    pub ttq: String,
    /// Fixed transaction date (YYYY-MM-DD); today when unset
    pub transaction_date: Option<NaiveDate>,
    /// Values that win over everything else
    pub overrides: BTreeMap<String, String>,
    /// Values merged over the built-in default properties
    pub defaults: BTreeMap<String, String>,
}

impl Default for TerminalConfig {
    fn default() -> Self {
        Self {
            country_code: 840,
            currency_code: 840,
            ttq: hex::encode_upper(DEFAULT_TTQ),
            transaction_date: None,
            overrides: BTreeMap::new(),
            defaults: BTreeMap::new(),
        }
    }
}

/// Resolved terminal values used when building DOL responses
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TerminalContext {
    country_code: [u8; 2],
    currency_code: [u8; 2],
    locale_currency: Option<[u8; 2]>,
    ttq: [u8; 4],
    tvr: [u8; 5],
    date: Option<NaiveDate>,
    overrides: HashMap<Vec<u8>, Vec<u8>>,
    defaults: HashMap<Vec<u8>, Vec<u8>>,
}

impl Default for TerminalContext {
    fn default() -> Self {
        Self {
            country_code: numeric_code(840),
            currency_code: numeric_code(840),
            locale_currency: None,
            ttq: DEFAULT_TTQ,
            tvr: [0; 5],
            date: None,
            overrides: HashMap::new(),
            defaults: builtin_defaults(),
        }
    }
}

fn builtin_defaults() -> HashMap<Vec<u8>, Vec<u8>> {
    DEFAULT_PROPERTIES
        .iter()
        .map(|(tag, value)| (tag.to_vec(), value.to_vec()))
        .collect()
}

impl TerminalContext {
    /// Resolve a configuration
    pub fn from_config(config: &TerminalConfig) -> Result<Self, ParseError> {
        let ttq = decode_hex("ttq", &config.ttq)?;
        let ttq: [u8; 4] = ttq.as_slice().try_into().map_err(|_| ParseError::InvalidLength {
            name: "Terminal Transaction Qualifiers",
            expected: 4,
            actual: ttq.len(),
        })?;

        let mut defaults = builtin_defaults();
        defaults.extend(decode_tag_map("defaults", &config.defaults)?);

        Ok(Self {
            country_code: checked_numeric_code("country_code", config.country_code)?,
            currency_code: checked_numeric_code("currency_code", config.currency_code)?,
            locale_currency: None,
            ttq,
            tvr: [0; 5],
            date: config.transaction_date,
            overrides: decode_tag_map("overrides", &config.overrides)?,
            defaults,
        })
    }

    /// Use `code` (ISO 4217 numeric) as the locale currency
    pub fn with_locale_currency(mut self, code: Option<u16>) -> Self {
        self.locale_currency = code.filter(|code| *code <= 999).map(numeric_code);
        self
    }

    /// Pin the transaction date
    pub const fn with_date(mut self, date: NaiveDate) -> Self {
        self.date = Some(date);
        self
    }

    /// Force `value` for `tag`
    pub fn with_override(mut self, tag: impl Into<Vec<u8>>, value: impl Into<Vec<u8>>) -> Self {
        self.overrides.insert(tag.into(), value.into());
        self
    }

    /// Configured override for `tag`
    pub fn override_for(&self, tag: &[u8]) -> Option<&[u8]> {
        self.overrides.get(tag).map(Vec::as_slice)
    }

    /// Static default property for `tag`
    pub fn default_for(&self, tag: &[u8]) -> Option<&[u8]> {
        self.defaults.get(tag).map(Vec::as_slice)
    }

    /// Configured terminal country, BCD
    pub const fn country_code(&self) -> [u8; 2] {
        self.country_code
    }

    /// Configured transaction currency, BCD
    pub const fn currency_code(&self) -> [u8; 2] {
        self.currency_code
    }

    /// Currency of the host locale, BCD
    pub const fn locale_currency(&self) -> Option<[u8; 2]> {
        self.locale_currency
    }

    /// Terminal Transaction Qualifiers
    pub const fn ttq(&self) -> [u8; 4] {
        self.ttq
    }

    /// Terminal Verification Results accumulated so far
    pub const fn tvr(&self) -> [u8; 5] {
        self.tvr
    }

    /// Set a TVR bit; `byte` is 1-based as in the EMV books
    pub fn set_tvr_bit(&mut self, byte: usize, mask: u8) {
        if let Some(b) = byte.checked_sub(1).and_then(|i| self.tvr.get_mut(i)) {
            *b |= mask;
        }
    }

    /// Transaction date as YYMMDD BCD
    pub fn transaction_date(&self) -> [u8; 3] {
        let date = self.date.unwrap_or_else(|| Local::now().date_naive());
        let year = date.year().rem_euclid(100) as u8;
        [bcd(year), bcd(date.month() as u8), bcd(date.day() as u8)]
    }
}

const fn bcd(value: u8) -> u8 {
    ((value / 10) << 4) | (value % 10)
}

/// Two-byte BCD form of an ISO numeric code (840 becomes `08 40`)
pub const fn numeric_code(code: u16) -> [u8; 2] {
    let hundreds = (code / 100 % 10) as u8;
    let rest = (code % 100) as u8;
    [hundreds, bcd(rest)]
}

fn checked_numeric_code(key: &str, code: u16) -> Result<[u8; 2], ParseError> {
    if code > 999 {
        return Err(ParseError::Config {
            key: key.to_string(),
            reason: format!("{code} is not a three digit code"),
        });
    }
    Ok(numeric_code(code))
}

fn decode_hex(key: &str, text: &str) -> Result<Vec<u8>, ParseError> {
    hex::decode(text.trim()).map_err(|err| ParseError::Config {
        key: key.to_string(),
        reason: err.to_string(),
    })
}

fn decode_tag_map(
    key: &str,
    entries: &BTreeMap<String, String>,
) -> Result<HashMap<Vec<u8>, Vec<u8>>, ParseError> {
    entries
        .iter()
        .map(|(tag, value)| {
            let entry_key = format!("{key}.{tag}");
            let tag = parse_tag(tag).map_err(|err| ParseError::Config {
                key: entry_key.clone(),
                reason: err.to_string(),
            })?;
            Ok((tag, decode_hex(&entry_key, value)?))
        })
        .collect()
}

/// ISO 4217 numeric currency of an ISO 3166-1 alpha-2 region
pub fn currency_for_region(region: &str) -> Option<u16> {
    let code = match region.to_ascii_uppercase().as_str() {
        "US" | "EC" | "SV" | "PR" | "PA" => 840,
        "AT" | "BE" | "CY" | "DE" | "EE" | "ES" | "FI" | "FR" | "GR" | "HR" | "IE" | "IT" | "LT"
        | "LU" | "LV" | "MT" | "NL" | "PT" | "SI" | "SK" => 978,
        "GB" => 826,
        "CH" | "LI" => 756,
        "JP" => 392,
        "CN" => 156,
        "CA" => 124,
        "AU" => 36,
        "NZ" => 554,
        "SE" => 752,
        "NO" => 578,
        "DK" => 208,
        "PL" => 985,
        "CZ" => 203,
        "HU" => 348,
        "IN" => 356,
        "BR" => 986,
        "MX" => 484,
        "ZA" => 710,
        "KR" => 410,
        "SG" => 702,
        "HK" => 344,
        "TR" => 949,
        "IL" => 376,
        "AE" => 784,
        _ => return None,
    };
    Some(code)
}

/// Currency of a POSIX locale name such as `en_US.UTF-8`
pub fn currency_for_locale(locale: &str) -> Option<u16> {
    let name = locale.split(['.', '@']).next()?;
    let (_, region) = name.split_once('_')?;
    currency_for_region(region)
}

/// Currency of the host locale, from `LC_ALL`, `LC_MONETARY` or `LANG`
pub fn locale_currency() -> Option<u16> {
    ["LC_ALL", "LC_MONETARY", "LANG"]
        .iter()
        .filter_map(|var| std::env::var(var).ok())
        .find(|value| !value.is_empty())
        .and_then(|locale| currency_for_locale(&locale))
}

/// ISO 3166-1 numeric code of an alpha-3 or alpha-2 country code
pub fn country_numeric(alpha: &str) -> Option<u16> {
    let code = match alpha.trim().to_ascii_uppercase().as_str() {
        "USA" | "US" => 840,
        "GBR" | "GB" => 826,
        "DEU" | "DE" => 276,
        "FRA" | "FR" => 250,
        "ITA" | "IT" => 380,
        "ESP" | "ES" => 724,
        "NLD" | "NL" => 528,
        "BEL" | "BE" => 56,
        "AUT" | "AT" => 40,
        "CHE" | "CH" => 756,
        "IRL" | "IE" => 372,
        "PRT" | "PT" => 620,
        "SWE" | "SE" => 752,
        "NOR" | "NO" => 578,
        "DNK" | "DK" => 208,
        "FIN" | "FI" => 246,
        "POL" | "PL" => 616,
        "CZE" | "CZ" => 203,
        "HUN" | "HU" => 348,
        "GRC" | "GR" => 300,
        "CAN" | "CA" => 124,
        "MEX" | "MX" => 484,
        "BRA" | "BR" => 76,
        "AUS" | "AU" => 36,
        "NZL" | "NZ" => 554,
        "JPN" | "JP" => 392,
        "CHN" | "CN" => 156,
        "KOR" | "KR" => 410,
        "IND" | "IN" => 356,
        "SGP" | "SG" => 702,
        "HKG" | "HK" => 344,
        "ZAF" | "ZA" => 710,
        "TUR" | "TR" => 792,
        "ISR" | "IL" => 376,
        "ARE" | "AE" => 784,
        _ => return None,
    };
    Some(code)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_numeric_code_is_bcd() {
        assert_eq!(numeric_code(840), [0x08, 0x40]);
        assert_eq!(numeric_code(978), [0x09, 0x78]);
        assert_eq!(numeric_code(36), [0x00, 0x36]);
    }

    #[test]
    fn test_transaction_date() {
        let terminal = TerminalContext::default().with_date(NaiveDate::from_ymd_opt(2024, 3, 9).unwrap());
        assert_eq!(terminal.transaction_date(), [0x24, 0x03, 0x09]);
    }

    #[test]
    fn test_from_config() {
        let mut config = TerminalConfig {
            country_code: 826,
            currency_code: 826,
            ..TerminalConfig::default()
        };
        config.overrides.insert("9F02".into(), "000000001000".into());
        config.defaults.insert("9F35".into(), "21".into());

        let terminal = TerminalContext::from_config(&config).unwrap();
        assert_eq!(terminal.country_code(), [0x08, 0x26]);
        assert_eq!(terminal.override_for(&[0x9F, 0x02]), Some(&[0, 0, 0, 0, 0x10, 0][..]));
        assert_eq!(terminal.default_for(&[0x9F, 0x35]), Some(&[0x21][..]));
        assert_eq!(terminal.default_for(&[0x9C]), Some(&[0x00][..]));
        assert_eq!(terminal.ttq(), DEFAULT_TTQ);
    }

    #[test]
    fn test_invalid_config() {
        let config = TerminalConfig {
            ttq: "3600".into(),
            ..TerminalConfig::default()
        };
        assert!(matches!(
            TerminalContext::from_config(&config),
            Err(ParseError::InvalidLength { expected: 4, actual: 2, .. })
        ));

        let mut config = TerminalConfig::default();
        config.overrides.insert("9F".into(), "00".into());
        assert!(matches!(TerminalContext::from_config(&config), Err(ParseError::Config { .. })));

        let config = TerminalConfig {
            currency_code: 1000,
            ..TerminalConfig::default()
        };
        assert!(TerminalContext::from_config(&config).is_err());
    }

    #[test]
    fn test_locale_currency() {
        assert_eq!(currency_for_locale("en_GB.UTF-8"), Some(826));
        assert_eq!(currency_for_locale("de_DE@euro"), Some(978));
        assert_eq!(currency_for_locale("C"), None);
        assert_eq!(country_numeric("CAN"), Some(124));
        assert_eq!(country_numeric("XXX"), None);
    }

    #[test]
    fn test_tvr_bits() {
        let mut terminal = TerminalContext::default();
        terminal.set_tvr_bit(1, 0x80);
        terminal.set_tvr_bit(6, 0x01);
        assert_eq!(terminal.tvr(), [0x80, 0, 0, 0, 0]);
    }
}
