//! Hardware-dependent integration tests
//!
//! These tests require a physical EMV card in a card reader.
//! They are ignored by default and must be explicitly run with:
//!
//!     cargo test --package emv-card --test hardware_integration -- --ignored
//!
//! Or to run all tests including hardware tests:
//!
//!     cargo test --package emv-card --test hardware_integration -- --include-ignored

#![cfg(feature = "pcsc")]

use emv_card::apdu::{ApduResponse, commands};
use emv_card::protocol::aids;
use emv_card::{CardReader, CardTransport, EmvSession, SessionKind, SessionState, TracingObserver};

/// Test that we can connect to a card reader
///
/// **Requires**: Card reader connected (card not required)
#[test]
#[ignore = "requires hardware: card reader"]
fn test_connect_to_reader() {
    let reader = CardReader::new().expect("Failed to establish PC/SC context");
    let readers = reader.list_readers().expect("Failed to list readers");
    assert!(!readers.is_empty(), "No card reader found. Is a reader connected?");
}

/// Test that we can detect an inserted card
///
/// **Requires**: Card reader with card inserted
#[test]
#[ignore = "requires hardware: card inserted in reader"]
fn test_card_present() {
    let reader = CardReader::new().expect("Failed to establish PC/SC context");
    let name = reader.first_reader().expect("No card reader found");

    println!("Using reader: {}", name.to_string_lossy());
    assert!(reader.is_card_present(&name), "No card on the reader");
}

/// Test selecting the PPSE over a raw transport
///
/// **Requires**: Contactless EMV card on the reader
#[test]
#[ignore = "requires hardware: EMV card"]
fn test_select_ppse() {
    let reader = CardReader::new().expect("Failed to establish PC/SC context");
    let name = reader.first_reader().expect("No card reader found");
    let mut transport = reader.transport(&name);

    transport.connect().expect("Failed to connect to card");
    let command = commands::select(aids::PPSE).build().unwrap();
    let raw = transport.transceive(&command).expect("SELECT failed");
    transport.close().expect("Failed to disconnect");

    let response = ApduResponse::from_bytes(&raw).unwrap();
    println!("PPSE: {} ({})", hex::encode_upper(&response.data), response.status_string());
    assert!(response.is_success(), "PPSE not present on card");
}

/// Full end-to-end session: directory discovery, GPO and records
///
/// **Requires**: Contactless EMV card on the reader
#[test]
#[ignore = "requires hardware: EMV card"]
fn test_full_payment_session() {
    let reader = CardReader::new().expect("Failed to establish PC/SC context");
    let name = reader.first_reader().expect("No card reader found");
    let mut transport = reader.transport(&name);

    let mut observer = TracingObserver;
    let report = EmvSession::new(&mut observer).run(&mut transport, &SessionKind::payment());

    assert_eq!(report.state, SessionState::Done, "Session failed: {:?}", report.error);
    assert!(!transport.is_connected());
    for application in &report.applications {
        println!(
            "{}: {:?}, {} record(s)",
            application.application.display_name(),
            application.status,
            application.application.records.len()
        );
    }
}
