//! Card sessions run in the foreground

use std::path::Path;

use emv_card::{CardReader, CardTransport, EmvSession, PaymentEnvironment, ReplayTransport, SessionKind};
use tracing::info;

use super::parse_hex;
use super::report::print_report;
use crate::config::terminal_context;
use crate::console::ConsoleObserver;
use crate::error::CliError;
use crate::formatters::FormatMode;

fn run_session<T: CardTransport + ?Sized>(
    transport: &mut T,
    kind: &SessionKind,
    config: Option<&Path>,
    mode: FormatMode,
) -> Result<(), CliError> {
    let terminal = terminal_context(config)?;
    let mut observer = ConsoleObserver::new(mode);
    let report = EmvSession::new(&mut observer)
        .with_terminal(terminal)
        .run(transport, kind);

    print_report(&report, mode);
    match report.error {
        Some(err) => Err(err.into()),
        None => Ok(()),
    }
}

fn run_on_first_reader(kind: &SessionKind, config: Option<&Path>, mode: FormatMode) -> Result<(), CliError> {
    let reader = CardReader::new()?;
    let name = reader.first_reader()?;
    println!("Reader: {}", name.to_string_lossy());
    info!(reader = %name.to_string_lossy(), ?kind, "Starting session");

    let mut transport = reader.transport(&name);
    run_session(&mut transport, kind, config, mode)
}

pub fn cmd_read(aid: Option<&str>, contact: bool, config: Option<&Path>, mode: FormatMode) -> Result<(), CliError> {
    let kind = SessionKind::Payment {
        environment: if contact { PaymentEnvironment::Contact } else { PaymentEnvironment::Contactless },
        aid: aid.map(|aid| parse_hex("AID", aid)).transpose()?,
    };
    run_on_first_reader(&kind, config, mode)
}

pub fn cmd_select(aid: &str, other: bool, config: Option<&Path>, mode: FormatMode) -> Result<(), CliError> {
    let aid = parse_hex("AID", aid)?;
    let kind = if other { SessionKind::Other { aid } } else { SessionKind::Manual { aid } };
    run_on_first_reader(&kind, config, mode)
}

pub fn cmd_replay(file: &Path, config: Option<&Path>, mode: FormatMode) -> Result<(), CliError> {
    let trace = std::fs::read_to_string(file).map_err(|source| CliError::Io {
        path: file.to_path_buf(),
        source,
    })?;
    let mut transport = ReplayTransport::from_trace(&trace).map_err(CliError::Trace)?;
    run_session(&mut transport, &SessionKind::payment(), config, mode)
}
