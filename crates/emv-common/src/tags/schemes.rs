//! Payment system specific data elements
//!
//! Several schemes reuse the same proprietary tag numbers with different
//! meanings, which is why each table is scoped by RID.

use super::Tag;
use super::ValueKind::{Binary, Dol, Numeric};

/// Visa (RID `A000000003`)
pub static VISA_TAGS: &[Tag] = &[
    Tag::new(&[0x9F, 0x51], Numeric, "Application Currency Code (VIS)", "Currency of the offline counters"),
    Tag::new(&[0x9F, 0x56], Binary, "Issuer Authentication Indicator", "Whether online issuer authentication is mandatory"),
    Tag::new(&[0x9F, 0x5A], Binary, "Application Program Identifier", "Identifies the issuer program the card belongs to"),
    Tag::new(&[0x9F, 0x5B], Binary, "Issuer Script Results", "Results of issuer script processing"),
    Tag::new(&[0x9F, 0x5D], Binary, "Available Offline Spending Amount", "Remaining funds available for offline spending"),
    Tag::new(&[0x9F, 0x66], Binary, "Terminal Transaction Qualifiers", "Reader capabilities for Visa contactless transactions"),
    Tag::new(&[0x9F, 0x68], Binary, "Card Additional Processes", "Additional processing supported by the card"),
    Tag::new(&[0x9F, 0x69], Binary, "Card Authentication Related Data", "Data used for fDDA"),
    Tag::new(&[0x9F, 0x6C], Binary, "Card Transaction Qualifiers", "Card requirements for the current transaction"),
    Tag::new(&[0x9F, 0x6E], Binary, "Form Factor Indicator", "Form factor of the consumer payment device"),
    Tag::new(&[0x9F, 0x7C], Binary, "Customer Exclusive Data", "Issuer data passed to the issuer in the authorisation"),
];

/// Mastercard (RID `A000000004`)
pub static MASTERCARD_TAGS: &[Tag] = &[
    Tag::new(&[0x56], Binary, "Track 1 Data", "Track 1 data for mag-stripe mode"),
    Tag::new(&[0x9F, 0x50], Binary, "Offline Accumulator Balance", "Remaining offline spending amount"),
    Tag::new(&[0x9F, 0x5D], Binary, "Application Capabilities Information", "Card capabilities such as data storage and CDA support"),
    Tag::new(&[0x9F, 0x60], Binary, "CVC3 (Track 1)", "Dynamic card verification code for track 1"),
    Tag::new(&[0x9F, 0x61], Binary, "CVC3 (Track 2)", "Dynamic card verification code for track 2"),
    Tag::new(&[0x9F, 0x62], Binary, "PCVC3 (Track 1)", "Position of the CVC3 in track 1 discretionary data"),
    Tag::new(&[0x9F, 0x63], Binary, "PUNATC (Track 1)", "Positions of the UN and ATC in track 1 discretionary data"),
    Tag::new(&[0x9F, 0x64], Binary, "NATC (Track 1)", "Number of ATC digits in track 1 discretionary data"),
    Tag::new(&[0x9F, 0x65], Binary, "PCVC3 (Track 2)", "Position of the CVC3 in track 2 discretionary data"),
    Tag::new(&[0x9F, 0x66], Binary, "PUNATC (Track 2)", "Positions of the UN and ATC in track 2 discretionary data"),
    Tag::new(&[0x9F, 0x67], Binary, "NATC (Track 2)", "Number of ATC digits in track 2 discretionary data"),
    Tag::new(&[0x9F, 0x69], Dol, "UDOL", "Data objects for COMPUTE CRYPTOGRAPHIC CHECKSUM"),
    Tag::new(&[0x9F, 0x6A], Numeric, "Unpredictable Number (Numeric)", "Numeric unpredictable number for mag-stripe mode"),
    Tag::new(&[0x9F, 0x6B], Binary, "Track 2 Data", "Track 2 data for mag-stripe mode"),
    Tag::new(&[0x9F, 0x6C], Binary, "Mag-stripe Application Version Number (Card)", "Version of the mag-stripe application"),
    Tag::new(&[0x9F, 0x6D], Binary, "Mag-stripe Application Version Number (Reader)", "Version of the reader mag-stripe kernel"),
    Tag::new(&[0x9F, 0x6E], Binary, "Third Party Data", "Proprietary data of a third party"),
    Tag::new(&[0x9F, 0x7C], Binary, "Merchant Custom Data", "Proprietary merchant data"),
    Tag::new(&[0x9F, 0x7E], Binary, "Mobile Support Indicator", "Whether the reader supports mobile devices"),
    Tag::new(&[0xDF, 0x4B], Binary, "POS Cardholder Interaction Information", "Cardholder interaction required by a mobile device"),
];

/// American Express (RID `A000000025`)
pub static AMEX_TAGS: &[Tag] = &[
    Tag::new(&[0x9F, 0x6D], Binary, "Contactless Reader Capabilities", "Expresspay reader capabilities"),
    Tag::new(&[0x9F, 0x6E], Binary, "Enhanced Contactless Reader Capabilities", "Expresspay enhanced reader capabilities"),
    Tag::new(&[0x9F, 0x70], Binary, "Card Interface Capabilities", "Interfaces supported by the card"),
    Tag::new(&[0x9F, 0x71], Binary, "Mobile CVM Results", "Results of cardholder verification on a mobile device"),
];
