//! Human-readable rendering of TLV trees

use std::fmt::Write;

use crate::tags::{TagContext, TagRegistry, ValueKind};
use crate::tlv::{self, Tlv};

/// Values longer than this are truncated in the output
const MAX_VALUE_BYTES: usize = 32;

/// Render encoded TLV data as an indented tree, one data object per line
///
/// Names come from `registry` resolved in `context`. Decoding stops at the
/// first malformed object of a template; the failure is rendered in place and
/// the surrounding templates are still shown.
pub fn render_tlv(data: &[u8], registry: &TagRegistry, context: &TagContext<'_>) -> String {
    let mut out = String::new();
    render_level(&mut out, data, 0, registry, context);
    out
}

fn render_level(
    out: &mut String,
    data: &[u8],
    depth: usize,
    registry: &TagRegistry,
    context: &TagContext<'_>,
) {
    let decoded = tlv::decode_partial(data);
    for object in &decoded.objects {
        render_object(out, object, depth, registry, context);
    }
    if let Some(err) = decoded.error {
        let _ = writeln!(out, "{}! {}", indent(depth), err);
    }
}

fn render_object(
    out: &mut String,
    object: &Tlv,
    depth: usize,
    registry: &TagRegistry,
    context: &TagContext<'_>,
) {
    let descriptor = registry.lookup(context, object.tag());
    let prefix = indent(depth);

    if object.is_constructed() {
        let _ = writeln!(out, "{prefix}[{}] {}", object.tag_hex(), descriptor.name());
        render_level(out, object.value(), depth + 1, registry, context);
        return;
    }

    let _ = writeln!(
        out,
        "{prefix}[{}] {}: {}",
        object.tag_hex(),
        descriptor.name(),
        format_value(descriptor.kind(), object.value())
    );
}

/// Format a primitive value according to its kind
pub fn format_value(kind: ValueKind, value: &[u8]) -> String {
    match kind {
        ValueKind::Text if is_printable(value) => String::from_utf8_lossy(value).trim_end().to_string(),
        ValueKind::Numeric => hex::encode_upper(value),
        _ if value.len() > MAX_VALUE_BYTES => format!(
            "{}... ({} bytes)",
            hex::encode_upper(&value[..MAX_VALUE_BYTES]),
            value.len()
        ),
        _ => hex::encode_upper(value),
    }
}

fn is_printable(value: &[u8]) -> bool {
    value.iter().all(|b| (0x20..0x7F).contains(b))
}

fn indent(depth: usize) -> String {
    " ".repeat(depth * 2)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_nested_fci() {
        let data = hex::decode("6F1A840E325041592E5359532E4444463031A5088801015F2D02656E").unwrap();
        let text = render_tlv(&data, TagRegistry::global(), &TagContext::global());
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "[6F] File Control Information (FCI) Template");
        assert_eq!(lines[1], "  [84] Dedicated File (DF) Name: 325041592E5359532E4444463031");
        assert_eq!(lines[2], "  [A5] FCI Proprietary Template");
        assert_eq!(lines[3], "    [88] Short File Identifier (SFI): 01");
        assert_eq!(lines[4], "    [5F2D] Language Preference: en");
    }

    #[test]
    fn test_render_reports_malformed_template() {
        let data = hex::decode("70035A0812").unwrap();
        let text = render_tlv(&data, TagRegistry::global(), &TagContext::global());
        assert!(text.starts_with("[70] READ RECORD Response Message Template\n"));
        assert!(text.contains("  ! Value of 8 bytes"));
    }

    #[test]
    fn test_format_value_truncates_binary() {
        let text = format_value(ValueKind::Binary, &[0xAB; 40]);
        assert!(text.ends_with("... (40 bytes)"));
        assert_eq!(format_value(ValueKind::Text, b"VISA CREDIT"), "VISA CREDIT");
        assert_eq!(format_value(ValueKind::Text, &[0x01, 0x02]), "0102");
    }
}
