//! APDU (Application Protocol Data Unit) command and response model
//!
//! Pure encoding and decoding per ISO/IEC 7816-4 short APDUs; exchanging the
//! bytes with a card is the job of [`crate::transport::CardTransport`].

use std::fmt;

use crate::error::{Error, ParseError};

/// Largest command data field of a short APDU
pub const MAX_SHORT_DATA: usize = 255;

/// Two-byte status word ending every response
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct StatusWord {
    /// First status byte
    pub sw1: u8,
    /// Second status byte
    pub sw2: u8,
}

impl StatusWord {
    /// Normal processing
    pub const SUCCESS: Self = Self::new(0x90, 0x00);
    /// Record not found
    pub const RECORD_NOT_FOUND: Self = Self::new(0x6A, 0x83);
    /// File or application not found
    pub const FILE_NOT_FOUND: Self = Self::new(0x6A, 0x82);

    /// Build a status word from its two bytes
    pub const fn new(sw1: u8, sw2: u8) -> Self {
        Self { sw1, sw2 }
    }

    /// Status word as a 16-bit value
    pub const fn value(self) -> u16 {
        ((self.sw1 as u16) << 8) | self.sw2 as u16
    }

    /// Whether the status equals `expected`, e.g. `0x9000`
    pub const fn is(self, expected: u16) -> bool {
        self.value() == expected
    }

    /// Whether the status is `9000`
    pub const fn is_success(self) -> bool {
        self.is(0x9000)
    }
}

impl fmt::Display for StatusWord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02X}{:02X}", self.sw1, self.sw2)
    }
}

impl From<u16> for StatusWord {
    fn from(value: u16) -> Self {
        Self::new((value >> 8) as u8, value as u8)
    }
}

/// APDU response containing data and status word
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApduResponse {
    /// Response data (without status word)
    pub data: Vec<u8>,
    /// Status word SW1
    pub sw1: u8,
    /// Status word SW2
    pub sw2: u8,
}

impl ApduResponse {
    /// Split a raw response into data and the trailing status word
    pub fn from_bytes(raw: &[u8]) -> Result<Self, ParseError> {
        let Some(split) = raw.len().checked_sub(2) else {
            return Err(ParseError::ResponseTooShort(raw.len()));
        };
        Ok(Self {
            data: raw[..split].to_vec(),
            sw1: raw[split],
            sw2: raw[split + 1],
        })
    }

    /// Check if the response indicates success (9000)
    pub fn is_success(&self) -> bool {
        self.status().is_success()
    }

    /// Whether the status word equals `expected`
    pub fn is_status(&self, expected: u16) -> bool {
        self.status().is(expected)
    }

    /// The status word
    pub const fn status(&self) -> StatusWord {
        StatusWord::new(self.sw1, self.sw2)
    }

    /// Get the full status word as a 16-bit value
    pub const fn status_word(&self) -> u16 {
        self.status().value()
    }

    /// Get status word as hex string (e.g., "9000")
    pub fn status_string(&self) -> String {
        self.status().to_string()
    }
}

/// APDU command builder
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApduCommand {
    name: &'static str,
    cla: u8,
    ins: u8,
    p1: u8,
    p2: u8,
    data: Option<Vec<u8>>,
    le: Option<u8>,
}

impl ApduCommand {
    /// Create a new APDU command
    pub const fn new(name: &'static str, cla: u8, ins: u8, p1: u8, p2: u8) -> Self {
        Self {
            name,
            cla,
            ins,
            p1,
            p2,
            data: None,
            le: None,
        }
    }

    /// Set command data; an empty field still emits `Lc = 00`
    pub fn data(mut self, data: Vec<u8>) -> Self {
        self.data = Some(data);
        self
    }

    /// Set expected response length
    pub const fn le(mut self, le: u8) -> Self {
        self.le = Some(le);
        self
    }

    /// Command name used in logs and observer events
    pub const fn name(&self) -> &'static str {
        self.name
    }

    /// Instruction byte
    pub const fn instruction(&self) -> u8 {
        self.ins
    }

    /// Command data field, if any
    pub fn payload(&self) -> Option<&[u8]> {
        self.data.as_deref()
    }

    /// Build the APDU command bytes
    pub fn build(&self) -> Result<Vec<u8>, Error> {
        let mut apdu = vec![self.cla, self.ins, self.p1, self.p2];

        if let Some(data) = &self.data {
            if data.len() > MAX_SHORT_DATA {
                return Err(Error::CommandTooLong(data.len()));
            }
            apdu.push(data.len() as u8);
            apdu.extend_from_slice(data);
        }

        if let Some(le) = self.le {
            apdu.push(le);
        }

        Ok(apdu)
    }
}

/// Common EMV APDU commands
pub mod commands {
    use super::ApduCommand;
    use emv_common::tags::ids;
    use emv_common::tlv;

    /// SELECT command (by name/AID)
    pub fn select(aid: &[u8]) -> ApduCommand {
        ApduCommand::new("SELECT", 0x00, 0xA4, 0x04, 0x00)
            .data(aid.to_vec())
            .le(0x00)
    }

    /// GET PROCESSING OPTIONS command
    ///
    /// `pdol_data` is wrapped in the command template (tag 83); an empty PDOL
    /// yields `83 00`. Data of 128 bytes or more takes a long-form length.
    pub fn get_processing_options(pdol_data: &[u8]) -> ApduCommand {
        let mut data = Vec::with_capacity(pdol_data.len() + 3);
        data.extend_from_slice(ids::COMMAND_TEMPLATE);
        data.extend_from_slice(&tlv::encode_length(pdol_data.len()));
        data.extend_from_slice(pdol_data);
        ApduCommand::new("GET PROCESSING OPTIONS", 0x80, 0xA8, 0x00, 0x00)
            .data(data)
            .le(0x00)
    }

    /// READ RECORD command
    pub fn read_record(record_number: u8, sfi: u8) -> ApduCommand {
        let p2 = (sfi << 3) | 0x04;
        ApduCommand::new("READ RECORD", 0x00, 0xB2, record_number, p2).le(0x00)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_select_encoding() {
        let ppse = b"2PAY.SYS.DDF01";
        let bytes = commands::select(ppse).build().unwrap();
        assert_eq!(&bytes[..5], &[0x00, 0xA4, 0x04, 0x00, 0x0E]);
        assert_eq!(&bytes[5..19], ppse);
        assert_eq!(bytes[19], 0x00);
        assert_eq!(bytes.len(), 20);
    }

    #[test]
    fn test_read_record_encoding() {
        let bytes = commands::read_record(3, 2).build().unwrap();
        assert_eq!(bytes, vec![0x00, 0xB2, 0x03, 0x14, 0x00]);
    }

    #[test]
    fn test_gpo_empty_pdol() {
        let bytes = commands::get_processing_options(&[]).build().unwrap();
        assert_eq!(bytes, vec![0x80, 0xA8, 0x00, 0x00, 0x02, 0x83, 0x00, 0x00]);
    }

    #[test]
    fn test_gpo_with_pdol_data() {
        let bytes = commands::get_processing_options(&[0x08, 0x40]).build().unwrap();
        assert_eq!(bytes, vec![0x80, 0xA8, 0x00, 0x00, 0x04, 0x83, 0x02, 0x08, 0x40, 0x00]);
    }

    #[test]
    fn test_gpo_template_length_crosses_long_form() {
        let short = commands::get_processing_options(&[0xAB; 127]).build().unwrap();
        assert_eq!(&short[4..7], &[0x81, 0x83, 0x7F]);
        assert_eq!(short.len(), 4 + 1 + 129 + 1);

        let long = commands::get_processing_options(&[0xAB; 128]).build().unwrap();
        assert_eq!(&long[4..8], &[0x83, 0x83, 0x81, 0x80]);
        assert_eq!(long.len(), 4 + 1 + 131 + 1);

        let data = &long[5..long.len() - 1];
        let objects = emv_common::tlv::decode(data).unwrap();
        assert_eq!(objects.len(), 1);
        assert_eq!(objects[0].tag(), &[0x83]);
        assert_eq!(objects[0].value(), &[0xAB; 128][..]);
    }

    #[test]
    fn test_command_without_le_or_data() {
        let bytes = ApduCommand::new("TEST", 0x00, 0xCA, 0x9F, 0x17).build().unwrap();
        assert_eq!(bytes, vec![0x00, 0xCA, 0x9F, 0x17]);
    }

    #[test]
    fn test_oversized_data_rejected() {
        let err = commands::select(&[0xAA; 256]).build().unwrap_err();
        assert_eq!(err, Error::CommandTooLong(256));
    }

    #[test]
    fn test_response_split() {
        let response = ApduResponse::from_bytes(&[0x6F, 0x00, 0x90, 0x00]).unwrap();
        assert_eq!(response.data, vec![0x6F, 0x00]);
        assert!(response.is_success());
        assert!(response.is_status(0x9000));
        assert_eq!(response.status_string(), "9000");
    }

    #[test]
    fn test_status_only_exact_match() {
        for raw in [[0x90, 0x01], [0x91, 0x00], [0x61, 0x10], [0x6A, 0x83]] {
            let response = ApduResponse::from_bytes(&raw).unwrap();
            assert!(!response.is_status(0x9000));
            assert!(!response.is_success());
        }
    }

    #[test]
    fn test_short_response_rejected() {
        assert_eq!(
            ApduResponse::from_bytes(&[0x90]),
            Err(ParseError::ResponseTooShort(1))
        );
    }

    #[test]
    fn test_status_word_conversions() {
        let status = StatusWord::from(0x6A83);
        assert_eq!(status, StatusWord::RECORD_NOT_FOUND);
        assert_eq!(status.to_string(), "6A83");
        assert_eq!(status.value(), 0x6A83);
    }
}
