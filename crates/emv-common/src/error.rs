//! Error types for BER-TLV decoding and tag registry construction

use thiserror::Error;

/// Failure while decoding BER-TLV data
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TlvError {
    /// The stream ended in the middle of a tag or length field
    #[error("Unexpected end of data while reading {context} at offset {offset}")]
    Truncated {
        /// Field being read
        context: &'static str,
        /// Offset of the missing byte
        offset: usize,
    },

    /// Length octet `0x80` (indefinite form), which EMV never emits
    #[error("Indefinite length form at offset {offset} is not supported")]
    IndefiniteLength {
        /// Offset of the length octet
        offset: usize,
    },

    /// Long-form length with more subsequent octets than we accept
    #[error("Length field at offset {offset} uses {octets} subsequent octets")]
    LengthTooLong {
        /// Number of subsequent length octets announced
        octets: usize,
        /// Offset of the length octet
        offset: usize,
    },

    /// The announced value length runs past the end of the stream
    #[error("Value of {length} bytes at offset {offset} exceeds the {available} bytes available")]
    ValueOverrun {
        /// Announced value length
        length: usize,
        /// Bytes left in the stream
        available: usize,
        /// Offset of the first value byte
        offset: usize,
    },

    /// Nested objects were requested from a primitive data object
    #[error("Tag {0} is primitive and has no nested objects")]
    NotConstructed(String),

    /// Tag identifier text could not be parsed
    #[error("Invalid tag identifier: {0}")]
    InvalidTag(String),
}

/// Tag table inconsistency detected while building a [`crate::TagRegistry`]
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    /// The same tag appears twice within one scope
    #[error("Duplicate tag {tag} in {scope} scope")]
    DuplicateTag {
        /// Tag identifier in hex
        tag: String,
        /// Scope description (global, payment system RID or issuer IIN)
        scope: String,
    },
}
