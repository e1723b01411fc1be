//! Error types for card sessions
//!
//! The taxonomy follows how a failure affects a session: transport failures
//! end it, status errors end it or skip a candidate depending on the phase,
//! parse errors abort the enclosing template, and data-sufficiency failures
//! abort the current candidate only.

use emv_common::TlvError;
use thiserror::Error;

use crate::apdu::StatusWord;
use crate::transport::TransportError;

/// Result type for card operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for card sessions
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    /// The card link failed or was lost
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// The card answered with a non-success status word
    #[error("{command} failed with status {status}")]
    Status {
        /// Command name
        command: &'static str,
        /// Returned status word
        status: StatusWord,
    },

    /// READ RECORD failed; all further reads of the application were skipped
    #[error("READ RECORD {record} of SFI {sfi} failed with status {status}")]
    RecordRead {
        /// Short file identifier
        sfi: u8,
        /// Record number
        record: u8,
        /// Returned status word
        status: StatusWord,
    },

    /// Malformed card data
    #[error("Failed to parse {context}: {source}")]
    Parse {
        /// What was being parsed
        context: &'static str,
        /// Underlying failure
        #[source]
        source: ParseError,
    },

    /// GET PROCESSING OPTIONS returned neither an AIP nor an AFL
    #[error("GET PROCESSING OPTIONS response for {aid} carried neither AIP nor AFL")]
    DataSufficiency {
        /// Application identifier in hex
        aid: String,
    },

    /// Command data does not fit a short APDU
    #[error("Command data of {0} bytes exceeds the 255 byte short APDU limit")]
    CommandTooLong(usize),
}

impl Error {
    /// Wrap a parse failure with what was being parsed
    pub const fn parse(context: &'static str, source: ParseError) -> Self {
        Self::Parse { context, source }
    }

    /// Whether the card link is gone
    pub const fn is_transport(&self) -> bool {
        matches!(self, Self::Transport(_))
    }
}

/// Malformed data received from the card or supplied by configuration
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    /// BER-TLV decoding failed
    #[error(transparent)]
    Tlv(#[from] TlvError),

    /// Response shorter than the two status bytes
    #[error("Response of {0} bytes is shorter than a status word")]
    ResponseTooShort(usize),

    /// DOL entry without its length octet
    #[error("DOL entry {tag} at offset {offset} has no length")]
    DolTruncated {
        /// Tag identifier in hex
        tag: String,
        /// Offset of the missing length
        offset: usize,
    },

    /// AFL length not a multiple of four
    #[error("AFL of {0} bytes is not a multiple of 4")]
    AflLength(usize),

    /// AFL entry starting at record 0
    #[error("AFL entry {index} starts at record 0")]
    AflStartRecord {
        /// Index of the 4-byte group
        index: usize,
    },

    /// AFL entry whose last record precedes its first
    #[error("AFL entry {index} ends at record {last} before its first record {first}")]
    AflRecordRange {
        /// Index of the 4-byte group
        index: usize,
        /// First record number
        first: u8,
        /// Last record number
        last: u8,
    },

    /// A required data object is absent
    #[error("Missing {0}")]
    Missing(&'static str),

    /// A data object has the wrong size
    #[error("{name} must be {expected} bytes, got {actual}")]
    InvalidLength {
        /// Data object name
        name: &'static str,
        /// Expected size
        expected: usize,
        /// Actual size
        actual: usize,
    },

    /// Response template tag not recognised
    #[error("Unexpected template {0}")]
    UnexpectedTemplate(String),

    /// Invalid terminal configuration value
    #[error("Invalid configuration value for {key}: {reason}")]
    Config {
        /// Configuration key
        key: String,
        /// What is wrong with it
        reason: String,
    },
}
