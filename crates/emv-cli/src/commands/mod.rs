pub mod dump;
pub mod read;
pub mod report;
pub mod tags;
pub mod watch;

use crate::error::CliError;

/// Decode a hex argument, ignoring spaces
pub(crate) fn parse_hex(what: &'static str, text: &str) -> Result<Vec<u8>, CliError> {
    let compact: String = text.chars().filter(|c| !c.is_whitespace()).collect();
    hex::decode(compact).map_err(CliError::hex(what))
}
