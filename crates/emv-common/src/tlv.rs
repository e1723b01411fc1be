//! BER-TLV codec
//!
//! Implements the restricted BER subset of ISO/IEC 7816-4 used by EMV Book 3
//! Annex B: multi-byte tags, short and long definite lengths, and `00`/`FF`
//! filler bytes between data objects. The indefinite length form is rejected.

use crate::error::TlvError;

/// Padding bytes that may appear before and after a data object
const FILLER_BYTES: [u8; 2] = [0x00, 0xFF];

/// Largest number of subsequent octets accepted in a long-form length
const MAX_LENGTH_OCTETS: usize = 4;

/// Returns true when bit 6 of the first tag octet marks a constructed object
pub fn is_constructed(tag: &[u8]) -> bool {
    tag.first().is_some_and(|b| b & 0x20 != 0)
}

/// A decoded length field
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Length {
    /// Number of value bytes announced
    pub value: usize,
    /// Length octets exactly as they appeared on the wire
    pub raw: Vec<u8>,
}

/// A single BER-TLV data object
///
/// The value of a constructed object holds its nested objects in encoded form;
/// call [`Tlv::children`] to decode them. This lets callers abort a single
/// malformed template while keeping everything decoded around it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tlv {
    tag: Vec<u8>,
    raw_length: Vec<u8>,
    value: Vec<u8>,
}

impl Tlv {
    /// Create a data object with the minimal definite length encoding
    pub fn new(tag: impl Into<Vec<u8>>, value: impl Into<Vec<u8>>) -> Self {
        let value = value.into();
        Self {
            tag: tag.into(),
            raw_length: encode_length(value.len()),
            value,
        }
    }

    /// Create a constructed data object wrapping `children`
    pub fn constructed(tag: impl Into<Vec<u8>>, children: &[Self]) -> Self {
        Self::new(tag, encode(children))
    }

    /// Tag identifier bytes
    pub fn tag(&self) -> &[u8] {
        &self.tag
    }

    /// Tag identifier as upper-case hex
    pub fn tag_hex(&self) -> String {
        hex::encode_upper(&self.tag)
    }

    /// Length octets as decoded (or as generated by [`Tlv::new`])
    pub fn raw_length(&self) -> &[u8] {
        &self.raw_length
    }

    /// Number of value bytes
    pub fn length(&self) -> usize {
        self.value.len()
    }

    /// Value bytes
    pub fn value(&self) -> &[u8] {
        &self.value
    }

    /// Consume the object and return its value bytes
    pub fn into_value(self) -> Vec<u8> {
        self.value
    }

    /// Whether this object is a template holding nested objects
    pub fn is_constructed(&self) -> bool {
        is_constructed(&self.tag)
    }

    /// Decode the nested objects of a constructed data object
    pub fn children(&self) -> Result<Vec<Self>, TlvError> {
        if !self.is_constructed() {
            return Err(TlvError::NotConstructed(self.tag_hex()));
        }
        decode(&self.value)
    }

    /// Encode tag, length and value
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.tag.len() + self.raw_length.len() + self.value.len());
        out.extend_from_slice(&self.tag);
        out.extend_from_slice(&self.raw_length);
        out.extend_from_slice(&self.value);
        out
    }
}

/// Cursor over a BER-TLV byte stream
#[derive(Debug, Clone)]
pub struct TlvReader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> TlvReader<'a> {
    /// Start reading at the beginning of `data`
    pub const fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    /// Current offset into the stream
    pub const fn position(&self) -> usize {
        self.pos
    }

    /// Bytes not yet consumed
    pub fn remaining(&self) -> &'a [u8] {
        &self.data[self.pos.min(self.data.len())..]
    }

    /// Whether the whole stream has been consumed
    pub const fn is_empty(&self) -> bool {
        self.pos >= self.data.len()
    }

    /// Skip `00`/`FF` padding
    pub fn skip_filler(&mut self) {
        while let Some(b) = self.data.get(self.pos) {
            if !FILLER_BYTES.contains(b) {
                break;
            }
            self.pos += 1;
        }
    }

    fn next_byte(&mut self, context: &'static str) -> Result<u8, TlvError> {
        let byte = *self.data.get(self.pos).ok_or(TlvError::Truncated {
            context,
            offset: self.pos,
        })?;
        self.pos += 1;
        Ok(byte)
    }

    /// Read a tag identifier
    ///
    /// When the low five bits of the first octet are all set, subsequent octets
    /// belong to the tag for as long as their bit 8 is set.
    pub fn read_tag_id(&mut self) -> Result<Vec<u8>, TlvError> {
        let first = self.next_byte("tag")?;
        let mut tag = vec![first];
        if first & 0x1F == 0x1F {
            loop {
                let next = self.next_byte("tag")?;
                tag.push(next);
                if next & 0x80 == 0 {
                    break;
                }
            }
        }
        Ok(tag)
    }

    /// Read a definite length field
    pub fn read_length(&mut self) -> Result<Length, TlvError> {
        let offset = self.pos;
        let first = self.next_byte("length")?;
        if first & 0x80 == 0 {
            return Ok(Length {
                value: first as usize,
                raw: vec![first],
            });
        }

        let octets = (first & 0x7F) as usize;
        if octets == 0 {
            return Err(TlvError::IndefiniteLength { offset });
        }
        if octets > MAX_LENGTH_OCTETS {
            return Err(TlvError::LengthTooLong { octets, offset });
        }

        let mut raw = Vec::with_capacity(octets + 1);
        raw.push(first);
        let mut value = 0usize;
        for _ in 0..octets {
            let byte = self.next_byte("length")?;
            raw.push(byte);
            value = (value << 8) | byte as usize;
        }
        Ok(Length { value, raw })
    }

    /// Read exactly `length` value bytes
    pub fn read_value(&mut self, length: usize) -> Result<&'a [u8], TlvError> {
        let available = self.data.len().saturating_sub(self.pos);
        if length > available {
            return Err(TlvError::ValueOverrun {
                length,
                available,
                offset: self.pos,
            });
        }
        let value = &self.data[self.pos..self.pos + length];
        self.pos += length;
        Ok(value)
    }

    /// Read the next data object, or `None` once only padding remains
    pub fn read_tlv(&mut self) -> Result<Option<Tlv>, TlvError> {
        self.skip_filler();
        if self.is_empty() {
            return Ok(None);
        }
        let tag = self.read_tag_id()?;
        let length = self.read_length()?;
        let value = self.read_value(length.value)?.to_vec();
        self.skip_filler();
        Ok(Some(Tlv {
            tag,
            raw_length: length.raw,
            value,
        }))
    }
}

impl Iterator for TlvReader<'_> {
    type Item = Result<Tlv, TlvError>;

    fn next(&mut self) -> Option<Self::Item> {
        match self.read_tlv() {
            Ok(Some(tlv)) => Some(Ok(tlv)),
            Ok(None) => None,
            Err(err) => {
                // Nothing after a decode failure can be trusted
                self.pos = self.data.len();
                Some(Err(err))
            }
        }
    }
}

/// Objects decoded before a failure, together with that failure
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PartialDecode {
    /// Data objects decoded successfully, in stream order
    pub objects: Vec<Tlv>,
    /// The error that stopped decoding, if any
    pub error: Option<TlvError>,
}

/// Decode a sequence of data objects, failing on the first malformed one
pub fn decode(data: &[u8]) -> Result<Vec<Tlv>, TlvError> {
    TlvReader::new(data).collect()
}

/// Decode a sequence of data objects, keeping everything read before a failure
pub fn decode_partial(data: &[u8]) -> PartialDecode {
    let mut result = PartialDecode::default();
    for item in TlvReader::new(data) {
        match item {
            Ok(tlv) => result.objects.push(tlv),
            Err(err) => result.error = Some(err),
        }
    }
    result
}

/// Encode a length using the shortest definite form
pub fn encode_length(length: usize) -> Vec<u8> {
    if length < 0x80 {
        return vec![length as u8];
    }
    let bytes = length.to_be_bytes();
    let skip = bytes.iter().take_while(|b| **b == 0).count();
    let significant = &bytes[skip..];
    let mut out = Vec::with_capacity(significant.len() + 1);
    out.push(0x80 | significant.len() as u8);
    out.extend_from_slice(significant);
    out
}

/// Encode a sequence of data objects back to back
pub fn encode(objects: &[Tlv]) -> Vec<u8> {
    objects.iter().flat_map(Tlv::to_bytes).collect()
}

/// Find the first object carrying `tag` in a decoded sequence
pub fn find<'t>(objects: &'t [Tlv], tag: &[u8]) -> Option<&'t Tlv> {
    objects.iter().find(|tlv| tlv.tag() == tag)
}

/// Search the top level of encoded `data` for `tag` and return its value
///
/// Returns `None` when the tag is absent or the data is malformed before it.
pub fn find_tag<'a>(data: &'a [u8], tag: &[u8]) -> Option<&'a [u8]> {
    let mut reader = TlvReader::new(data);
    loop {
        reader.skip_filler();
        if reader.is_empty() {
            return None;
        }
        let current = reader.read_tag_id().ok()?;
        let length = reader.read_length().ok()?;
        let value = reader.read_value(length.value).ok()?;
        if current == tag {
            return Some(value);
        }
    }
}

/// Parse a tag identifier written in hex, e.g. `"9F38"`
pub fn parse_tag(text: &str) -> Result<Vec<u8>, TlvError> {
    let bytes = hex::decode(text.trim()).map_err(|_| TlvError::InvalidTag(text.to_string()))?;
    let mut reader = TlvReader::new(&bytes);
    let tag = reader
        .read_tag_id()
        .map_err(|_| TlvError::InvalidTag(text.to_string()))?;
    if !reader.is_empty() {
        return Err(TlvError::InvalidTag(text.to_string()));
    }
    Ok(tag)
}
