//! Field formatters for human-readable output

use clap::ValueEnum;
use emv_common::render::format_value as format_by_kind;
use emv_common::{TagContext, TagRegistry};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum FormatMode {
    /// Raw hex output
    Raw,
    /// Human-readable formatted output
    Human,
}

impl FormatMode {
    pub const fn description(self) -> &'static str {
        match self {
            Self::Raw => "Raw",
            Self::Human => "Human-Readable",
        }
    }
}

/// Decimal value of a BCD encoded numeric field
fn bcd_number(value: &[u8]) -> Option<u64> {
    value.iter().try_fold(0u64, |acc, &byte| {
        let (high, low) = (byte >> 4, byte & 0x0F);
        (high < 10 && low < 10).then(|| acc * 100 + u64::from(high) * 10 + u64::from(low))
    })
}

/// Format a field value based on its tag
pub fn format_value(
    tag: &[u8],
    value: &[u8],
    mode: FormatMode,
    registry: &TagRegistry,
    context: &TagContext<'_>,
) -> String {
    if mode == FormatMode::Raw {
        return hex::encode_upper(value);
    }

    match tag {
        // Application Expiration Date (YYMMDD)
        [0x5F, 0x24] if value.len() == 3 => {
            format!("20{:02X}/{:02X} (Year/Month)", value[0], value[1])
        }

        // Application Effective Date, Transaction Date (YYMMDD)
        [0x5F, 0x25] | [0x9A] if value.len() == 3 => {
            format!("20{:02X}/{:02X}/{:02X} (YY/MM/DD)", value[0], value[1], value[2])
        }

        // Issuer Country Code, Terminal Country Code (ISO 3166-1 numeric)
        [0x5F, 0x28] | [0x9F, 0x1A] if value.len() == 2 => match bcd_number(value) {
            Some(code) => match country_name(code) {
                Some(country) => format!("{code} ({country})"),
                None => code.to_string(),
            },
            None => hex::encode_upper(value),
        },

        // Currency Codes (ISO 4217 numeric)
        [0x5F, 0x2A] | [0x9F, 0x42] if value.len() == 2 => match bcd_number(value) {
            Some(code) => currency_name(code).map_or_else(|| format!("Currency Code {code}"), str::to_string),
            None => hex::encode_upper(value),
        },

        // Amounts (n12, two implied decimals)
        [0x9F, 0x02] | [0x9F, 0x03] if value.len() == 6 => match bcd_number(value) {
            Some(amount) => format!("{}.{:02}", amount / 100, amount % 100),
            None => hex::encode_upper(value),
        },

        // Application PAN Sequence Number
        [0x5F, 0x34] if value.len() == 1 => value[0].to_string(),

        // Track 2 Data
        [0x57] | [0x9F, 0x6B] => hex::encode_upper(value).replace('D', " | "),

        _ => format_by_kind(registry.lookup(context, tag).kind(), value),
    }
}

/// ISO 3166-1 numeric country codes (subset)
fn country_name(code: u64) -> Option<&'static str> {
    match code {
        124 => Some("Canada"),
        840 => Some("United States"),
        826 => Some("United Kingdom"),
        276 => Some("Germany"),
        250 => Some("France"),
        380 => Some("Italy"),
        724 => Some("Spain"),
        528 => Some("Netherlands"),
        156 => Some("China"),
        392 => Some("Japan"),
        36 => Some("Australia"),
        756 => Some("Switzerland"),
        _ => None,
    }
}

/// ISO 4217 numeric currency codes (subset)
fn currency_name(code: u64) -> Option<&'static str> {
    match code {
        124 => Some("CAD (Canadian Dollar)"),
        840 => Some("USD (US Dollar)"),
        978 => Some("EUR (Euro)"),
        826 => Some("GBP (Pound Sterling)"),
        392 => Some("JPY (Japanese Yen)"),
        156 => Some("CNY (Chinese Yuan)"),
        36 => Some("AUD (Australian Dollar)"),
        756 => Some("CHF (Swiss Franc)"),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn human(tag: &[u8], value: &[u8]) -> String {
        format_value(tag, value, FormatMode::Human, TagRegistry::global(), &TagContext::global())
    }

    #[test]
    fn test_raw_is_hex() {
        let value = format_value(&[0x50], b"VISA", FormatMode::Raw, TagRegistry::global(), &TagContext::global());
        assert_eq!(value, "56495341");
    }

    #[test]
    fn test_human_formats() {
        assert_eq!(human(&[0x50], b"VISA"), "VISA");
        assert_eq!(human(&[0x5F, 0x28], &[0x08, 0x26]), "826 (United Kingdom)");
        assert_eq!(human(&[0x9F, 0x42], &[0x09, 0x78]), "EUR (Euro)");
        assert_eq!(human(&[0x9F, 0x02], &[0x00, 0x00, 0x00, 0x00, 0x12, 0x34]), "12.34");
        assert_eq!(human(&[0x5F, 0x24], &[0x27, 0x12, 0x31]), "2027/12 (Year/Month)");
    }

    #[test]
    fn test_bcd_number() {
        assert_eq!(bcd_number(&[0x08, 0x40]), Some(840));
        assert_eq!(bcd_number(&[0x0A, 0x40]), None);
    }
}
