//! EMV Common - BER-TLV codec and tag dictionary for EMV processing
//!
//! - [`tlv`] decodes and encodes the restricted BER-TLV subset used by EMV.
//! - [`tags`] resolves raw tag identifiers through issuer, payment system and
//!   global scopes.
//! - [`render`] turns TLV data into an indented, named dump.

pub mod error;
pub mod render;
pub mod tags;
pub mod tlv;

pub use error::{RegistryError, TlvError};
pub use render::render_tlv;
pub use tags::{Tag, TagContext, TagDescriptor, TagRegistry, TagScope, ValueKind};
pub use tlv::{Tlv, TlvReader, find_tag};
