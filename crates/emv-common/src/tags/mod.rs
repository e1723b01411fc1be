//! Layered EMV tag registry
//!
//! Raw tag identifiers are resolved to [`Tag`] descriptors through three
//! scopes, most specific first: issuer (keyed by IIN), payment system (keyed
//! by the RID, the first five AID bytes) and the global EMV dictionary.
//! Lookups are total: an identifier missing from every scope resolves to
//! [`TagDescriptor::Unknown`].

mod emv;
mod schemes;

use std::collections::HashMap;
use std::fmt;
use std::sync::LazyLock;

use crate::error::RegistryError;

pub use emv::EMV_TAGS;
pub use schemes::{AMEX_TAGS, MASTERCARD_TAGS, VISA_TAGS};

/// Length of a Registered Application Provider Identifier
pub const RID_LEN: usize = 5;

/// Semantic format of a data object's value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueKind {
    /// Opaque bytes or bit flags
    Binary,
    /// BCD digits (EMV formats `n` and `cn`)
    Numeric,
    /// Printable characters (EMV formats `a`, `an`, `ans`)
    Text,
    /// Mixed or issuer-defined content
    Mixed,
    /// Data Object List: concatenated tag and length pairs
    Dol,
    /// Constructed template holding nested data objects
    Template,
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Binary => "binary",
            Self::Numeric => "numeric",
            Self::Text => "text",
            Self::Mixed => "mixed",
            Self::Dol => "DOL",
            Self::Template => "template",
        };
        f.write_str(name)
    }
}

/// Static description of a tag
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Tag {
    /// Identifier bytes
    pub id: &'static [u8],
    /// Value format
    pub kind: ValueKind,
    /// Short display name
    pub name: &'static str,
    /// Longer description
    pub description: &'static str,
}

impl Tag {
    /// Describe a tag
    pub const fn new(
        id: &'static [u8],
        kind: ValueKind,
        name: &'static str,
        description: &'static str,
    ) -> Self {
        Self {
            id,
            kind,
            name,
            description,
        }
    }

    /// Identifier as upper-case hex
    pub fn id_hex(&self) -> String {
        hex::encode_upper(self.id)
    }
}

/// Scope a descriptor was resolved from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TagScope {
    /// Issuer-specific dictionary
    Issuer,
    /// Payment system dictionary (Visa, Mastercard, ...)
    PaymentSystem,
    /// EMV dictionary shared by every application
    Global,
}

/// Result of a registry lookup
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TagDescriptor {
    /// Tag found in one of the scopes
    Known {
        /// The matching entry
        tag: &'static Tag,
        /// Scope that supplied it
        scope: TagScope,
    },
    /// Tag absent from every scope
    Unknown {
        /// Raw identifier bytes
        id: Vec<u8>,
    },
}

impl TagDescriptor {
    /// Identifier bytes
    pub fn id(&self) -> &[u8] {
        match self {
            Self::Known { tag, .. } => tag.id,
            Self::Unknown { id } => id,
        }
    }

    /// Display name
    pub fn name(&self) -> &'static str {
        match self {
            Self::Known { tag, .. } => tag.name,
            Self::Unknown { .. } => "Unknown tag",
        }
    }

    /// Description text
    pub fn description(&self) -> &'static str {
        match self {
            Self::Known { tag, .. } => tag.description,
            Self::Unknown { .. } => "",
        }
    }

    /// Value format; unknown constructed tags are reported as templates
    pub fn kind(&self) -> ValueKind {
        match self {
            Self::Known { tag, .. } => tag.kind,
            Self::Unknown { id } if crate::tlv::is_constructed(id) => ValueKind::Template,
            Self::Unknown { .. } => ValueKind::Binary,
        }
    }

    /// Whether any scope knew the tag
    pub const fn is_known(&self) -> bool {
        matches!(self, Self::Known { .. })
    }

    /// Scope the tag was resolved from
    pub const fn scope(&self) -> Option<TagScope> {
        match self {
            Self::Known { scope, .. } => Some(*scope),
            Self::Unknown { .. } => None,
        }
    }
}

/// Application context used to pick the issuer and payment system scopes
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TagContext<'a> {
    /// Application identifier, if an application is selected
    pub aid: Option<&'a [u8]>,
    /// Issuer Identification Number, if the card revealed it
    pub iin: Option<&'a [u8]>,
}

impl<'a> TagContext<'a> {
    /// Context without any application: only the global scope applies
    pub const fn global() -> Self {
        Self {
            aid: None,
            iin: None,
        }
    }

    /// Context of a selected application
    pub const fn for_application(aid: &'a [u8], iin: Option<&'a [u8]>) -> Self {
        Self {
            aid: Some(aid),
            iin,
        }
    }

    /// Registered Application Provider Identifier of the AID
    pub fn rid(&self) -> Option<&'a [u8]> {
        self.aid.filter(|aid| aid.len() >= RID_LEN).map(|aid| &aid[..RID_LEN])
    }
}

type TagMap = HashMap<&'static [u8], &'static Tag>;

/// Three-scope tag dictionary
///
/// Built once from static tables and read-only afterwards; share it through
/// [`TagRegistry::global`].
#[derive(Debug, Default)]
pub struct TagRegistry {
    issuers: HashMap<Vec<u8>, TagMap>,
    payment_systems: HashMap<Vec<u8>, TagMap>,
    global: TagMap,
}

impl TagRegistry {
    /// Start an empty registry
    pub fn builder() -> TagRegistryBuilder {
        TagRegistryBuilder::default()
    }

    /// Registry populated from the built-in EMV and payment system tables
    pub fn builtin() -> Result<Self, RegistryError> {
        Ok(Self::builder()
            .global(EMV_TAGS)?
            .payment_system(rids::VISA, VISA_TAGS)?
            .payment_system(rids::MASTERCARD, MASTERCARD_TAGS)?
            .payment_system(rids::AMEX, AMEX_TAGS)?
            .build())
    }

    /// Process-wide registry, built on first use
    pub fn global() -> &'static Self {
        static REGISTRY: LazyLock<TagRegistry> = LazyLock::new(|| {
            TagRegistry::builtin().unwrap_or_else(|err| panic!("built-in tag tables are inconsistent: {err}"))
        });
        &REGISTRY
    }

    /// Resolve `id` for an application context
    ///
    /// Precedence: issuer scope (when the IIN is known), payment system scope
    /// (by RID), global scope, then the unknown-tag sentinel.
    pub fn lookup(&self, context: &TagContext<'_>, id: &[u8]) -> TagDescriptor {
        let issuer = context
            .iin
            .and_then(|iin| self.issuers.get(iin))
            .and_then(|map| map.get(id).copied());
        if let Some(tag) = issuer {
            return TagDescriptor::Known {
                tag,
                scope: TagScope::Issuer,
            };
        }

        let payment_system = context
            .rid()
            .and_then(|rid| self.payment_systems.get(rid))
            .and_then(|map| map.get(id).copied());
        if let Some(tag) = payment_system {
            return TagDescriptor::Known {
                tag,
                scope: TagScope::PaymentSystem,
            };
        }

        self.lookup_global(id)
    }

    /// Resolve `id` against the global scope only
    pub fn lookup_global(&self, id: &[u8]) -> TagDescriptor {
        match self.global.get(id).copied() {
            Some(tag) => TagDescriptor::Known {
                tag,
                scope: TagScope::Global,
            },
            None => TagDescriptor::Unknown { id: id.to_vec() },
        }
    }

    /// Global entries sorted by identifier
    pub fn global_tags(&self) -> Vec<&'static Tag> {
        sorted(&self.global)
    }

    /// Entries registered for a payment system, sorted by identifier
    pub fn payment_system_tags(&self, rid: &[u8]) -> Vec<&'static Tag> {
        self.payment_systems.get(rid).map(sorted).unwrap_or_default()
    }

    /// Registered payment system RIDs
    pub fn payment_systems(&self) -> impl Iterator<Item = &[u8]> {
        self.payment_systems.keys().map(Vec::as_slice)
    }
}

fn sorted(map: &TagMap) -> Vec<&'static Tag> {
    let mut tags: Vec<_> = map.values().copied().collect();
    tags.sort_by_key(|tag| tag.id);
    tags
}

/// Incremental construction of a [`TagRegistry`]
#[derive(Debug, Default)]
pub struct TagRegistryBuilder {
    registry: TagRegistry,
}

impl TagRegistryBuilder {
    /// Add entries to the global scope
    pub fn global(mut self, tags: &'static [Tag]) -> Result<Self, RegistryError> {
        insert_all(&mut self.registry.global, tags, || "global".to_string())?;
        Ok(self)
    }

    /// Add entries to the scope of the payment system identified by `rid`
    pub fn payment_system(mut self, rid: &[u8], tags: &'static [Tag]) -> Result<Self, RegistryError> {
        let map = self.registry.payment_systems.entry(rid.to_vec()).or_default();
        insert_all(map, tags, || format!("payment system {}", hex::encode_upper(rid)))?;
        Ok(self)
    }

    /// Add entries to the scope of the issuer identified by `iin`
    pub fn issuer(mut self, iin: &[u8], tags: &'static [Tag]) -> Result<Self, RegistryError> {
        let map = self.registry.issuers.entry(iin.to_vec()).or_default();
        insert_all(map, tags, || format!("issuer {}", hex::encode_upper(iin)))?;
        Ok(self)
    }

    /// Finish construction
    pub fn build(self) -> TagRegistry {
        self.registry
    }
}

fn insert_all(
    map: &mut TagMap,
    tags: &'static [Tag],
    scope: impl Fn() -> String,
) -> Result<(), RegistryError> {
    for tag in tags {
        if map.insert(tag.id, tag).is_some() {
            return Err(RegistryError::DuplicateTag {
                tag: tag.id_hex(),
                scope: scope(),
            });
        }
    }
    Ok(())
}

/// Well-known tag identifiers used while parsing card responses
pub mod ids {
    pub const ISSUER_IDENTIFICATION_NUMBER: &[u8] = &[0x42];
    pub const APPLICATION_IDENTIFIER: &[u8] = &[0x4F];
    pub const APPLICATION_LABEL: &[u8] = &[0x50];
    pub const APPLICATION_PAN: &[u8] = &[0x5A];
    pub const ISSUER_COUNTRY_CODE: &[u8] = &[0x5F, 0x28];
    pub const TRANSACTION_CURRENCY_CODE: &[u8] = &[0x5F, 0x2A];
    pub const LANGUAGE_PREFERENCE: &[u8] = &[0x5F, 0x2D];
    pub const ISSUER_URL: &[u8] = &[0x5F, 0x50];
    pub const ISSUER_COUNTRY_CODE_ALPHA2: &[u8] = &[0x5F, 0x55];
    pub const ISSUER_COUNTRY_CODE_ALPHA3: &[u8] = &[0x5F, 0x56];
    pub const APPLICATION_TEMPLATE: &[u8] = &[0x61];
    pub const FCI_TEMPLATE: &[u8] = &[0x6F];
    pub const RECORD_TEMPLATE: &[u8] = &[0x70];
    pub const RESPONSE_MESSAGE_TEMPLATE_FORMAT_2: &[u8] = &[0x77];
    pub const RESPONSE_MESSAGE_TEMPLATE_FORMAT_1: &[u8] = &[0x80];
    pub const AIP: &[u8] = &[0x82];
    pub const COMMAND_TEMPLATE: &[u8] = &[0x83];
    pub const DF_NAME: &[u8] = &[0x84];
    pub const APPLICATION_PRIORITY_INDICATOR: &[u8] = &[0x87];
    pub const SFI: &[u8] = &[0x88];
    pub const AFL: &[u8] = &[0x94];
    pub const TVR: &[u8] = &[0x95];
    pub const TRANSACTION_DATE: &[u8] = &[0x9A];
    pub const FCI_PROPRIETARY_TEMPLATE: &[u8] = &[0xA5];
    pub const FCI_ISSUER_DISCRETIONARY_DATA: &[u8] = &[0xBF, 0x0C];
    pub const ISSUER_CODE_TABLE_INDEX: &[u8] = &[0x9F, 0x11];
    pub const APPLICATION_PREFERRED_NAME: &[u8] = &[0x9F, 0x12];
    pub const TERMINAL_COUNTRY_CODE: &[u8] = &[0x9F, 0x1A];
    pub const UNPREDICTABLE_NUMBER: &[u8] = &[0x9F, 0x37];
    pub const PDOL: &[u8] = &[0x9F, 0x38];
    pub const APPLICATION_CURRENCY_CODE: &[u8] = &[0x9F, 0x42];
    pub const LOG_ENTRY: &[u8] = &[0x9F, 0x4D];
    pub const TERMINAL_TRANSACTION_QUALIFIERS: &[u8] = &[0x9F, 0x66];
}

/// Registered Application Provider Identifiers of the major payment schemes
pub mod rids {
    /// Visa RID
    pub const VISA: &[u8] = &[0xA0, 0x00, 0x00, 0x00, 0x03];

    /// Mastercard RID
    pub const MASTERCARD: &[u8] = &[0xA0, 0x00, 0x00, 0x00, 0x04];

    /// American Express RID
    pub const AMEX: &[u8] = &[0xA0, 0x00, 0x00, 0x00, 0x25];

    /// Discover RID
    pub const DISCOVER: &[u8] = &[0xA0, 0x00, 0x00, 0x01, 0x52];

    /// JCB RID
    pub const JCB: &[u8] = &[0xA0, 0x00, 0x00, 0x00, 0x65];

    /// UnionPay RID
    pub const UNIONPAY: &[u8] = &[0xA0, 0x00, 0x00, 0x03, 0x33];
}
