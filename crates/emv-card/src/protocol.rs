//! EMV application selection protocol
//!
//! [`EmvSession`] drives one card session as a state machine:
//!
//! ```text
//! Idle -> Connected -> PpseSelected -> AppSelected -> OptionsObtained -> RecordsRead -> Done
//! ```
//!
//! Any state can move to `Failed`. The transport is connected at the start of
//! [`EmvSession::run`] and closed before it returns, whatever the outcome.
//!
//! In single-application mode every failure up to and including SELECT ends
//! the session. In batch mode (all PPSE candidates) a candidate that cannot be
//! selected is skipped and the next one is tried. Later failures (GET
//! PROCESSING OPTIONS, data sufficiency, READ RECORD) abort the candidate
//! only. Transport failures always end the session.

use std::fmt;

use emv_common::{TagContext, TagRegistry, render_tlv};
use tracing::{debug, info, warn};

use crate::apdu::{ApduCommand, ApduResponse, StatusWord, commands};
use crate::application::{ApplicationCandidate, Directory, FileRecord};
use crate::dol::DolBuilder;
use crate::error::{Error, ParseError, Result};
use crate::observer::SessionObserver;
use crate::parse;
use crate::terminal::TerminalContext;
use crate::transport::{CardTransport, TransportGuard};

/// Known EMV Application Identifiers (AIDs)
pub mod aids {
    /// PPSE (Proximity Payment System Environment), contactless
    pub const PPSE: &[u8] = b"2PAY.SYS.DDF01";

    /// PSE (Payment System Environment), contact
    pub const PSE: &[u8] = b"1PAY.SYS.DDF01";

    /// Visa credit/debit
    pub const VISA: &[u8] = &[0xA0, 0x00, 0x00, 0x00, 0x03, 0x10, 0x10];

    /// Mastercard credit/debit
    pub const MASTERCARD: &[u8] = &[0xA0, 0x00, 0x00, 0x00, 0x04, 0x10, 0x10];

    /// American Express
    pub const AMEX: &[u8] = &[0xA0, 0x00, 0x00, 0x00, 0x25, 0x01, 0x08, 0x01];
}

/// Session state machine states
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Idle,
    Connected,
    PpseSelected,
    AppSelected,
    OptionsObtained,
    RecordsRead,
    Done,
    Failed,
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// Card interface used for payment system discovery
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum PaymentEnvironment {
    /// Contactless: the PPSE lists applications in its FCI
    #[default]
    Contactless,
    /// Contact: the PSE points at a directory file of application records
    Contact,
}

impl PaymentEnvironment {
    /// Directory name selected first
    pub const fn directory_name(self) -> &'static [u8] {
        match self {
            Self::Contactless => aids::PPSE,
            Self::Contact => aids::PSE,
        }
    }
}

/// What a session should do
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionKind {
    /// Select a non-payment application and report its FCI
    Other { aid: Vec<u8> },
    /// Discover applications through the payment system directory and read
    /// either the named application or every candidate
    Payment {
        environment: PaymentEnvironment,
        aid: Option<Vec<u8>>,
    },
    /// Read one application directly, without directory discovery
    Manual { aid: Vec<u8> },
}

impl SessionKind {
    /// Contactless discovery of all applications
    pub const fn payment() -> Self {
        Self::Payment {
            environment: PaymentEnvironment::Contactless,
            aid: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    Single,
    Batch,
}

/// How far an application got
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApplicationStatus {
    /// Selected, processing options obtained, and all records read
    Completed,
    /// Selected only (non-payment application)
    Selected,
    /// Could not be selected; the next candidate was tried
    Skipped(Error),
    /// Selected, then abandoned
    Aborted(Error),
}

/// Result of processing one application
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApplicationReport {
    pub application: ApplicationCandidate,
    pub status: ApplicationStatus,
}

/// Everything a session learned
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionReport {
    /// Final state, `Done` or `Failed`
    pub state: SessionState,
    pub directory: Option<Directory>,
    pub applications: Vec<ApplicationReport>,
    /// Error that ended the session
    pub error: Option<Error>,
}

impl SessionReport {
    const fn new() -> Self {
        Self {
            state: SessionState::Idle,
            directory: None,
            applications: Vec::new(),
            error: None,
        }
    }

    pub fn is_success(&self) -> bool {
        self.state == SessionState::Done
    }
}

/// EMV card session engine
pub struct EmvSession<'a, O: SessionObserver + ?Sized> {
    observer: &'a mut O,
    registry: &'a TagRegistry,
    terminal: TerminalContext,
    state: SessionState,
}

impl<O: SessionObserver + ?Sized> fmt::Debug for EmvSession<'_, O> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EmvSession")
            .field("state", &self.state)
            .field("terminal", &self.terminal)
            .finish_non_exhaustive()
    }
}

impl<'a, O: SessionObserver + ?Sized> EmvSession<'a, O> {
    /// Session reporting to `observer`, using the built-in tag registry and
    /// default terminal values
    pub fn new(observer: &'a mut O) -> Self {
        Self {
            observer,
            registry: TagRegistry::global(),
            terminal: TerminalContext::default(),
            state: SessionState::Idle,
        }
    }

    pub fn with_terminal(mut self, terminal: TerminalContext) -> Self {
        self.terminal = terminal;
        self
    }

    pub const fn with_registry(mut self, registry: &'a TagRegistry) -> Self {
        self.registry = registry;
        self
    }

    /// Current state
    pub const fn state(&self) -> SessionState {
        self.state
    }

    /// Run one session over `transport`
    ///
    /// The transport is connected first and always closed before returning.
    pub fn run<T: CardTransport + ?Sized>(&mut self, transport: &mut T, kind: &SessionKind) -> SessionReport {
        let mut report = SessionReport::new();
        self.state = SessionState::Idle;
        info!(?kind, "Starting card session");

        if let Err(err) = transport.connect() {
            if transport.is_connected() {
                if let Err(close_err) = transport.close() {
                    warn!(error = %close_err, "Failed to close card transport");
                }
            }
            self.fail(Error::from(err), &mut report);
            return report;
        }
        self.transition(SessionState::Connected);

        let mut link = TransportGuard::new(transport);
        let result = self.drive(&mut *link, kind, &mut report);
        let closed = link.release();

        match result {
            Ok(()) => {
                self.transition(SessionState::Done);
                if let Err(err) = closed {
                    self.report_error(&Error::from(err));
                }
                report.state = self.state;
                self.observer.finished(None);
            }
            Err(err) => {
                if let Err(close_err) = closed {
                    warn!(error = %close_err, "Failed to close card transport");
                }
                self.fail(err, &mut report);
            }
        }
        report
    }

    fn fail(&mut self, err: Error, report: &mut SessionReport) {
        self.report_error(&err);
        self.transition(SessionState::Failed);
        report.state = self.state;
        self.observer.finished(Some(&err));
        report.error = Some(err);
    }

    fn drive<T: CardTransport + ?Sized>(
        &mut self,
        card: &mut T,
        kind: &SessionKind,
        report: &mut SessionReport,
    ) -> Result<()> {
        match kind {
            SessionKind::Payment { environment, aid } => {
                let directory = self.select_directory(card, *environment)?;
                match aid {
                    Some(aid) => {
                        let candidate = directory
                            .candidates
                            .iter()
                            .find(|c| &c.aid == aid)
                            .cloned()
                            .unwrap_or_else(|| ApplicationCandidate::new(aid.clone()));
                        report.directory = Some(directory);
                        let application = self.process_application(card, candidate, Mode::Single)?;
                        report.applications.push(application);
                    }
                    None => {
                        let candidates = directory.candidates.clone();
                        report.directory = Some(directory);
                        if candidates.is_empty() {
                            self.observer.info("No applications found in the payment system directory");
                        }
                        for candidate in candidates {
                            let application = self.process_application(card, candidate, Mode::Batch)?;
                            report.applications.push(application);
                        }
                    }
                }
            }
            SessionKind::Manual { aid } => {
                let candidate = ApplicationCandidate::new(aid.clone());
                let application = self.process_application(card, candidate, Mode::Single)?;
                report.applications.push(application);
            }
            SessionKind::Other { aid } => {
                let application = self.select_other(card, aid)?;
                report.applications.push(application);
            }
        }
        Ok(())
    }

    fn transition(&mut self, next: SessionState) {
        debug!(from = %self.state, to = %next, "Session state change");
        self.state = next;
    }

    fn report_error(&mut self, err: &Error) {
        warn!(error = %err, "Card session error");
        self.observer.error(err);
    }

    fn exchange<T: CardTransport + ?Sized>(
        &mut self,
        card: &mut T,
        command: &ApduCommand,
        context: &TagContext<'_>,
    ) -> Result<ApduResponse> {
        let apdu = command.build()?;
        debug!(command = command.name(), apdu = %hex::encode_upper(&apdu), "Sending APDU");
        self.observer.outbound(command.name(), &apdu);

        let raw = card.transceive(&apdu)?;
        debug!(command = command.name(), apdu = %hex::encode_upper(&raw), "Received APDU");

        let parsed = match raw.len() {
            0..=2 => None,
            len => Some(render_tlv(&raw[..len - 2], self.registry, context)),
        };
        self.observer.inbound(command.name(), &raw, parsed.as_deref());

        ApduResponse::from_bytes(&raw).map_err(|err| Error::parse("response APDU", err))
    }

    fn select_directory<T: CardTransport + ?Sized>(
        &mut self,
        card: &mut T,
        environment: PaymentEnvironment,
    ) -> Result<Directory> {
        let name = environment.directory_name();
        self.observer
            .separator(&format!("Select {}", String::from_utf8_lossy(name)));

        let response = self.exchange(card, &commands::select(name), &TagContext::global())?;
        if !response.is_success() {
            return Err(Error::Status {
                command: "SELECT",
                status: response.status(),
            });
        }
        self.transition(SessionState::PpseSelected);

        let mut directory = match parse::parse_directory_fci(&response.data, self.registry) {
            Ok(directory) => directory,
            Err(err) => {
                self.report_error(&Error::parse("payment system directory", err));
                Directory {
                    name: name.to_vec(),
                    ..Directory::default()
                }
            }
        };

        if environment == PaymentEnvironment::Contact {
            self.read_directory_records(card, &mut directory)?;
        }

        self.observer
            .info(&format!("Found {} application(s)", directory.candidates.len()));
        Ok(directory)
    }

    /// Read the contact PSE directory file until the card runs out of records
    fn read_directory_records<T: CardTransport + ?Sized>(
        &mut self,
        card: &mut T,
        directory: &mut Directory,
    ) -> Result<()> {
        let Some(sfi) = directory.sfi else {
            self.report_error(&Error::parse(
                "payment system directory",
                ParseError::Missing("directory SFI"),
            ));
            return Ok(());
        };

        for record in 1..=u8::MAX {
            let response = self.exchange(card, &commands::read_record(record, sfi), &TagContext::global())?;
            if response.status() == StatusWord::RECORD_NOT_FOUND {
                break;
            }
            if !response.is_success() {
                self.report_error(&Error::RecordRead {
                    sfi,
                    record,
                    status: response.status(),
                });
                break;
            }
            match parse::parse_directory_record(&response.data, self.registry) {
                Ok(candidates) => directory.candidates.extend(candidates),
                Err(err) => self.report_error(&Error::parse("directory record", err)),
            }
        }
        Ok(())
    }

    fn process_application<T: CardTransport + ?Sized>(
        &mut self,
        card: &mut T,
        mut application: ApplicationCandidate,
        mode: Mode,
    ) -> Result<ApplicationReport> {
        self.observer
            .separator(&format!("Application {}", application.aid_hex()));

        if let Err(err) = self.select_application(card, &mut application) {
            if err.is_transport() || mode == Mode::Single {
                return Err(err);
            }
            self.report_error(&err);
            return Ok(ApplicationReport {
                application,
                status: ApplicationStatus::Skipped(err),
            });
        }

        let status = match self.read_application(card, &mut application) {
            Ok(()) => ApplicationStatus::Completed,
            Err(err) if err.is_transport() => return Err(err),
            Err(err) => {
                self.report_error(&err);
                ApplicationStatus::Aborted(err)
            }
        };

        Ok(ApplicationReport { application, status })
    }

    fn select_application<T: CardTransport + ?Sized>(
        &mut self,
        card: &mut T,
        application: &mut ApplicationCandidate,
    ) -> Result<()> {
        let context = application.tag_context();
        let response = self.exchange(card, &commands::select(&application.aid), &context)?;
        if !response.is_success() {
            return Err(Error::Status {
                command: "SELECT",
                status: response.status(),
            });
        }

        match parse::parse_application_fci(&response.data, application, self.registry) {
            Ok(None) => {}
            Ok(Some(err)) => self.report_error(&Error::parse("FCI issuer discretionary data", err)),
            Err(err) => return Err(Error::parse("application FCI", err)),
        }

        self.transition(SessionState::AppSelected);
        self.observer
            .info(&format!("Selected {}", application.display_name()));
        Ok(())
    }

    fn read_application<T: CardTransport + ?Sized>(
        &mut self,
        card: &mut T,
        application: &mut ApplicationCandidate,
    ) -> Result<()> {
        self.get_processing_options(card, application)?;
        self.read_records(card, application)
    }

    fn get_processing_options<T: CardTransport + ?Sized>(
        &mut self,
        card: &mut T,
        application: &mut ApplicationCandidate,
    ) -> Result<()> {
        let pdol_data = match &application.pdol {
            Some(pdol) => DolBuilder::new(&self.terminal, self.registry)
                .for_application(application)
                .build(pdol)
                .map_err(|err| Error::parse("PDOL", err))?,
            None => Vec::new(),
        };

        let context = application.tag_context();
        let response = self.exchange(card, &commands::get_processing_options(&pdol_data), &context)?;
        if !response.is_success() {
            return Err(Error::Status {
                command: "GET PROCESSING OPTIONS",
                status: response.status(),
            });
        }

        parse::parse_processing_options(&response.data, application, self.registry)
            .map_err(|err| Error::parse("GET PROCESSING OPTIONS response", err))?;
        if application.aip.is_none() && application.afl.is_empty() {
            return Err(Error::DataSufficiency {
                aid: application.aid_hex(),
            });
        }
        self.transition(SessionState::OptionsObtained);

        let aip = application.aip.map_or_else(
            || "absent".to_string(),
            |aip| format!("{aip} ({})", aip.capabilities().join(", ")),
        );
        self.observer
            .info(&format!("AIP {aip}, {} AFL entries", application.afl.len()));
        Ok(())
    }

    /// Read every record the AFL names; the first failure stops all reads
    fn read_records<T: CardTransport + ?Sized>(
        &mut self,
        card: &mut T,
        application: &mut ApplicationCandidate,
    ) -> Result<()> {
        for entry in application.afl.clone() {
            for record in entry.records() {
                let context = application.tag_context();
                let response = self.exchange(card, &commands::read_record(record, entry.sfi), &context)?;
                if !response.is_success() {
                    return Err(Error::RecordRead {
                        sfi: entry.sfi,
                        record,
                        status: response.status(),
                    });
                }

                if let Err(err) = parse::parse_record(&response.data, application, self.registry) {
                    self.report_error(&Error::parse("record", err));
                }
                application.records.push(FileRecord {
                    sfi: entry.sfi,
                    number: record,
                    data: response.data,
                });
            }
        }

        self.transition(SessionState::RecordsRead);
        self.observer
            .info(&format!("Read {} record(s)", application.records.len()));
        Ok(())
    }

    fn select_other<T: CardTransport + ?Sized>(&mut self, card: &mut T, aid: &[u8]) -> Result<ApplicationReport> {
        let mut application = ApplicationCandidate::new(aid);
        self.observer
            .separator(&format!("Application {}", application.aid_hex()));

        let context = application.tag_context();
        let response = self.exchange(card, &commands::select(aid), &context)?;
        if !response.is_success() {
            return Err(Error::Status {
                command: "SELECT",
                status: response.status(),
            });
        }
        self.transition(SessionState::AppSelected);

        // Non-payment applications need not answer with an EMV FCI
        if !response.data.is_empty() {
            match parse::parse_application_fci(&response.data, &mut application, self.registry) {
                Ok(None) => {}
                Ok(Some(err)) => self.report_error(&Error::parse("FCI issuer discretionary data", err)),
                Err(err) => self.report_error(&Error::parse("application FCI", err)),
            }
        }

        Ok(ApplicationReport {
            application,
            status: ApplicationStatus::Selected,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_aids() {
        assert_eq!(aids::VISA.len(), 7);
        assert_eq!(aids::MASTERCARD.len(), 7);
        assert_eq!(aids::PSE, b"1PAY.SYS.DDF01");
        assert_eq!(PaymentEnvironment::default().directory_name(), b"2PAY.SYS.DDF01");
    }
}
