//! Offline TLV decoding

use emv_common::tlv::decode_partial;
use emv_common::{TagContext, TagRegistry, render_tlv};

use super::parse_hex;
use crate::error::CliError;
use crate::formatters::FormatMode;

pub fn cmd_dump(data: &str, aid: Option<&str>, mode: FormatMode) -> Result<(), CliError> {
    let data = parse_hex("TLV data", data)?;
    let aid = aid.map(|aid| parse_hex("AID", aid)).transpose()?;
    let context = aid
        .as_deref()
        .map_or_else(TagContext::global, |aid| TagContext::for_application(aid, None));

    match mode {
        FormatMode::Human => print!("{}", render_tlv(&data, TagRegistry::global(), &context)),
        FormatMode::Raw => {
            let decoded = decode_partial(&data);
            for object in &decoded.objects {
                println!("{} {} {}", object.tag_hex(), hex::encode_upper(object.raw_length()), hex::encode_upper(object.value()));
            }
            if let Some(err) = decoded.error {
                eprintln!("! {err}");
            }
        }
    }
    Ok(())
}
