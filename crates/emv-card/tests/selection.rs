//! Application selection scenarios replayed against scripted cards

use emv_card::apdu::{ApduCommand, StatusWord, commands};
use emv_card::protocol::aids;
use emv_card::{
    Aip, ApplicationStatus, CardTransport, EmvSession, Error, ParseError, PaymentEnvironment, ReplayTransport,
    SessionEvent, SessionKind, SessionReport, SessionState, TerminalContext, TransportError,
};

const PPSE_VISA: &str = concat!(
    "6F29",
    "840E325041592E5359532E4444463031",
    "A517BF0C14",
    "61124F07A0000000031010500456495341870101",
    "9000",
);

const PPSE_VISA_MASTERCARD: &str = concat!(
    "6F40",
    "840E325041592E5359532E4444463031",
    "A52EBF0C2B",
    "61124F07A0000000031010500456495341870101",
    "61154F07A0000000041010500A4D415354455243415244",
    "9000",
);

const VISA_FCI: &str = "6F118407A0000000031010A5065004564953419000";

const VISA_FCI_WITH_PDOL: &str = concat!(
    "6F1A",
    "8407A0000000031010",
    "A50F5004564953419F38069F66049F3704",
    "9000",
);

const MASTERCARD_FCI: &str = "6F178407A0000000041010A50C500A4D4153544552434152449000";

const GPO_HEADER: [u8; 4] = [0x80, 0xA8, 0x00, 0x00];

fn bytes(hex: &str) -> Vec<u8> {
    hex::decode(hex).unwrap()
}

fn apdu(command: ApduCommand) -> Vec<u8> {
    command.build().unwrap()
}

fn visa() -> Vec<u8> {
    aids::VISA.to_vec()
}

fn run(transport: &mut ReplayTransport, kind: SessionKind) -> (SessionReport, Vec<SessionEvent>) {
    let mut events = Vec::new();
    let report = EmvSession::new(&mut events).run(transport, &kind);
    (report, events)
}

#[test]
fn test_ppse_lists_single_candidate() {
    let mut card = ReplayTransport::new()
        .expect(apdu(commands::select(aids::PPSE)), bytes(PPSE_VISA))
        .expect(apdu(commands::select(aids::VISA)), bytes(VISA_FCI))
        .expect_header(GPO_HEADER, bytes("80068200010203019000"))
        .expect(apdu(commands::read_record(2, 0)), bytes("70055F280208269000"))
        .expect(apdu(commands::read_record(3, 0)), bytes("70059F420209789000"));

    let (report, events) = run(&mut card, SessionKind::payment());

    assert_eq!(report.state, SessionState::Done);
    assert!(report.error.is_none());
    let directory = report.directory.as_ref().unwrap();
    assert_eq!(directory.candidates.len(), 1);
    assert_eq!(directory.candidates[0].aid, visa());
    assert_eq!(directory.candidates[0].label.as_deref(), Some("VISA"));

    assert_eq!(report.applications.len(), 1);
    let visa_report = &report.applications[0];
    assert_eq!(visa_report.status, ApplicationStatus::Completed);
    let app = &visa_report.application;
    assert_eq!(app.aip, Some(Aip([0x82, 0x00])));
    assert_eq!(app.afl.len(), 1);
    assert_eq!((app.afl[0].sfi, app.afl[0].first_record, app.afl[0].last_record), (0, 2, 3));
    assert_eq!(app.afl[0].offline_auth_records, 1);
    assert_eq!(app.records.len(), 2);
    assert_eq!(app.country_code, Some([0x08, 0x26]));
    assert_eq!(app.currency_code, Some([0x09, 0x78]));

    assert_eq!(card.sent()[2], bytes("80A8000002830000"));
    assert_eq!(card.unused(), 0);
    assert!(!card.is_connected());
    assert_eq!(card.close_count(), 1);
    assert_eq!(events.last(), Some(&SessionEvent::Finished(None)));
}

#[test]
fn test_pdol_is_answered_from_terminal_context() {
    let mut card = ReplayTransport::new()
        .expect(apdu(commands::select(aids::VISA)), bytes(VISA_FCI_WITH_PDOL))
        .expect_header(GPO_HEADER, bytes("80068200080101009000"))
        .expect(apdu(commands::read_record(1, 1)), bytes("70035A01129000"));

    let (report, _) = run(&mut card, SessionKind::Manual { aid: visa() });

    assert_eq!(report.state, SessionState::Done);
    assert_eq!(report.applications[0].status, ApplicationStatus::Completed);
    let gpo = &card.sent()[1];
    assert_eq!(&gpo[..7], &[0x80, 0xA8, 0x00, 0x00, 0x0A, 0x83, 0x08]);
    assert_eq!(&gpo[7..11], &TerminalContext::default().ttq());
    assert_eq!(gpo.len(), 4 + 1 + 10 + 1);
}

#[test]
fn test_record_not_found_stops_all_reads() {
    let mut card = ReplayTransport::new()
        .expect(apdu(commands::select(aids::VISA)), bytes(VISA_FCI))
        .expect_header(GPO_HEADER, bytes("770E82021980940808010300100101009000"))
        .expect(apdu(commands::read_record(1, 1)), bytes("70035A01129000"))
        .expect(apdu(commands::read_record(2, 1)), bytes("6A83"))
        .expect(apdu(commands::read_record(3, 1)), bytes("70035A01129000"));

    let (report, events) = run(&mut card, SessionKind::Manual { aid: visa() });

    assert_eq!(report.state, SessionState::Done);
    let app_report = &report.applications[0];
    assert_eq!(
        app_report.status,
        ApplicationStatus::Aborted(Error::RecordRead {
            sfi: 1,
            record: 2,
            status: StatusWord::RECORD_NOT_FOUND,
        })
    );
    assert_eq!(app_report.application.records.len(), 1);
    assert!(!card.sent().contains(&apdu(commands::read_record(3, 1))));
    assert!(!card.sent().contains(&apdu(commands::read_record(1, 2))));
    assert_eq!(app_report.application.afl.len(), 2);
    assert_eq!(card.sent().len(), 4);
    assert_eq!(card.unused(), 1);
    assert!(events.iter().any(|e| matches!(e, SessionEvent::Error(Error::RecordRead { .. }))));
}

#[test]
fn test_batch_skips_unselectable_candidate() {
    let mut card = ReplayTransport::new()
        .expect(apdu(commands::select(aids::PPSE)), bytes(PPSE_VISA_MASTERCARD))
        .expect(apdu(commands::select(aids::VISA)), bytes("6A82"))
        .expect(apdu(commands::select(aids::MASTERCARD)), bytes(MASTERCARD_FCI))
        .expect_header(GPO_HEADER, bytes("80061980080101009000"))
        .expect(apdu(commands::read_record(1, 1)), bytes("70035A01129000"));

    let (report, _) = run(&mut card, SessionKind::payment());

    assert_eq!(report.state, SessionState::Done);
    assert_eq!(report.applications.len(), 2);
    assert_eq!(
        report.applications[0].status,
        ApplicationStatus::Skipped(Error::Status {
            command: "SELECT",
            status: StatusWord::FILE_NOT_FOUND,
        })
    );
    assert_eq!(report.applications[1].status, ApplicationStatus::Completed);
    assert_eq!(report.applications[1].application.label.as_deref(), Some("MASTERCARD"));
    assert_eq!(card.unused(), 0);
}

#[test]
fn test_single_mode_select_failure_ends_session() {
    let mut card = ReplayTransport::new()
        .expect(apdu(commands::select(aids::PPSE)), bytes(PPSE_VISA))
        .expect(apdu(commands::select(aids::VISA)), bytes("6A82"));

    let kind = SessionKind::Payment {
        environment: PaymentEnvironment::Contactless,
        aid: Some(visa()),
    };
    let (report, events) = run(&mut card, kind);

    assert_eq!(report.state, SessionState::Failed);
    assert_eq!(
        report.error,
        Some(Error::Status {
            command: "SELECT",
            status: StatusWord::FILE_NOT_FOUND,
        })
    );
    assert!(report.applications.is_empty());
    assert!(!card.is_connected());
    assert!(matches!(events.last(), Some(SessionEvent::Finished(Some(_)))));
}

#[test]
fn test_ppse_status_error_ends_session() {
    let mut card = ReplayTransport::new();
    let (report, _) = run(&mut card, SessionKind::payment());

    assert_eq!(report.state, SessionState::Failed);
    assert!(matches!(report.error, Some(Error::Status { command: "SELECT", .. })));
    assert_eq!(card.sent().len(), 1);
}

#[test]
fn test_link_loss_fails_session_and_closes_transport() {
    let mut card = ReplayTransport::new()
        .expect(apdu(commands::select(aids::PPSE)), bytes(PPSE_VISA))
        .losing_link_after(1);

    let (report, events) = run(&mut card, SessionKind::payment());

    assert_eq!(report.state, SessionState::Failed);
    assert!(matches!(report.error, Some(Error::Transport(TransportError::LinkLost(_)))));
    assert!(report.error.as_ref().is_some_and(Error::is_transport));
    assert!(!card.is_connected());
    assert_eq!(card.close_count(), 1);
    assert!(matches!(
        events.last(),
        Some(SessionEvent::Finished(Some(Error::Transport(_))))
    ));
}

#[test]
fn test_connect_failure() {
    let mut card = ReplayTransport::new().refusing_connect();
    let (report, _) = run(&mut card, SessionKind::payment());

    assert_eq!(report.state, SessionState::Failed);
    assert!(matches!(report.error, Some(Error::Transport(TransportError::Connect(_)))));
    assert!(card.sent().is_empty());
}

#[test]
fn test_missing_aip_and_afl_aborts_candidate() {
    let mut card = ReplayTransport::new()
        .expect(apdu(commands::select(aids::VISA)), bytes(VISA_FCI))
        .expect_header(GPO_HEADER, bytes("77009000"));

    let (report, _) = run(&mut card, SessionKind::Manual { aid: visa() });

    assert_eq!(report.state, SessionState::Done);
    assert_eq!(
        report.applications[0].status,
        ApplicationStatus::Aborted(Error::DataSufficiency {
            aid: "A0000000031010".into()
        })
    );
    assert_eq!(card.sent().len(), 2);
}

#[test]
fn test_afl_without_aip_still_reads_records() {
    let mut card = ReplayTransport::new()
        .expect(apdu(commands::select(aids::VISA)), bytes(VISA_FCI))
        .expect_header(GPO_HEADER, bytes("77069404080101009000"))
        .expect(apdu(commands::read_record(1, 1)), bytes("70035A01129000"));

    let (report, _) = run(&mut card, SessionKind::Manual { aid: visa() });

    assert_eq!(report.state, SessionState::Done);
    let app_report = &report.applications[0];
    assert_eq!(app_report.status, ApplicationStatus::Completed);
    assert_eq!(app_report.application.aip, None);
    assert_eq!(app_report.application.afl.len(), 1);
    assert_eq!(app_report.application.records.len(), 1);
    assert_eq!(card.unused(), 0);
}

#[test]
fn test_gpo_status_error_aborts_candidate() {
    let mut card = ReplayTransport::new()
        .expect(apdu(commands::select(aids::VISA)), bytes(VISA_FCI))
        .expect_header(GPO_HEADER, bytes("6985"));

    let (report, _) = run(&mut card, SessionKind::Manual { aid: visa() });

    assert_eq!(report.state, SessionState::Done);
    assert!(matches!(
        report.applications[0].status,
        ApplicationStatus::Aborted(Error::Status {
            command: "GET PROCESSING OPTIONS",
            ..
        })
    ));
}

#[test]
fn test_malformed_ppse_fci_yields_empty_directory() {
    let mut card = ReplayTransport::new().expect(apdu(commands::select(aids::PPSE)), bytes("6F05849000"));

    let (report, events) = run(&mut card, SessionKind::payment());

    assert_eq!(report.state, SessionState::Done);
    assert!(report.directory.unwrap().candidates.is_empty());
    assert!(report.applications.is_empty());
    assert!(events.iter().any(|e| matches!(
        e,
        SessionEvent::Error(Error::Parse {
            source: ParseError::Tlv(_),
            ..
        })
    )));
}

#[test]
fn test_contact_pse_reads_directory_records() {
    let mut card = ReplayTransport::new()
        .expect(
            apdu(commands::select(aids::PSE)),
            bytes("6F15840E315041592E5359532E4444463031A5038801019000"),
        )
        .expect(apdu(commands::read_record(1, 1)), bytes("700F610D4F07A000000004101050024D439000"))
        .expect(apdu(commands::read_record(2, 1)), bytes("6A83"));

    let kind = SessionKind::Payment {
        environment: PaymentEnvironment::Contact,
        aid: None,
    };
    let (report, _) = run(&mut card, kind);

    let directory = report.directory.as_ref().unwrap();
    assert_eq!(directory.sfi, Some(1));
    assert_eq!(directory.candidates.len(), 1);
    assert_eq!(directory.candidates[0].label.as_deref(), Some("MC"));
    // The Mastercard SELECT is unscripted and falls back to 6A82
    assert!(matches!(report.applications[0].status, ApplicationStatus::Skipped(_)));
    assert_eq!(report.state, SessionState::Done);
}

#[test]
fn test_other_application_is_selected_only() {
    let aid = bytes("D2760000850101");
    let mut card = ReplayTransport::new().expect(apdu(commands::select(&aid)), bytes("9000"));

    let (report, _) = run(&mut card, SessionKind::Other { aid: aid.clone() });

    assert_eq!(report.state, SessionState::Done);
    assert_eq!(report.applications[0].status, ApplicationStatus::Selected);
    assert_eq!(report.applications[0].application.aid, aid);
    assert_eq!(card.sent().len(), 1);
}

#[test]
fn test_observer_sees_every_exchange() {
    let mut card = ReplayTransport::new().expect(apdu(commands::select(aids::PPSE)), bytes(PPSE_VISA));
    let (_, events) = run(&mut card, SessionKind::payment());

    let outbound = events
        .iter()
        .filter(|e| matches!(e, SessionEvent::Outbound { .. }))
        .count();
    let inbound: Vec<_> = events
        .iter()
        .filter_map(|e| match e {
            SessionEvent::Inbound { parsed, .. } => Some(parsed.clone()),
            _ => None,
        })
        .collect();

    assert_eq!(outbound, card.sent().len());
    assert_eq!(inbound.len(), outbound);
    let ppse_tree = inbound[0].as_deref().unwrap();
    assert!(ppse_tree.contains("[4F]"));
    assert_eq!(inbound[1], None);
}
