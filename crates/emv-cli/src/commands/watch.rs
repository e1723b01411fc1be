//! Read every card tapped on the first reader
//!
//! The reader is polled from the main thread. Each newly detected card gets
//! its own session worker; its events are printed as they stream in.

use std::path::Path;
use std::thread;
use std::time::{Duration, Instant};

use emv_card::{CardReader, SessionKind, spawn_session};
use tracing::{debug, info, warn};

use super::report::print_report;
use crate::config::terminal_context;
use crate::console::ConsoleObserver;
use crate::error::CliError;
use crate::formatters::FormatMode;

const POLL_INTERVAL: Duration = Duration::from_millis(250);
const READER_RETRY: Duration = Duration::from_secs(2);

pub fn cmd_watch(config: Option<&Path>, mode: FormatMode) -> Result<(), CliError> {
    let terminal = terminal_context(config)?;
    println!("Waiting for cards (Ctrl-C to stop)\n");

    let mut reader: Option<CardReader> = None;
    let mut card_present = false;
    let mut last_reader_check: Option<Instant> = None;

    loop {
        // Try to get reader if we don't have one (check every 2 seconds)
        if reader.is_none() && last_reader_check.is_none_or(|at| at.elapsed() > READER_RETRY) {
            match CardReader::new() {
                Ok(r) => {
                    info!("Card reader initialized");
                    reader = Some(r);
                }
                Err(e) => debug!("Card reader unavailable: {}", e),
            }
            last_reader_check = Some(Instant::now());
        }

        let mut reader_lost = false;
        if let Some(r) = &reader {
            match r.first_reader() {
                Ok(name) if r.is_card_present(&name) => {
                    if !card_present {
                        card_present = true;
                        info!(reader = %name.to_string_lossy(), "Card detected");
                        let handle = spawn_session(r.transport(&name), SessionKind::payment(), terminal.clone());
                        let mut observer = ConsoleObserver::new(mode);
                        for event in handle.events() {
                            event.dispatch(&mut observer);
                        }
                        let report = handle.join().map_err(|_| CliError::WorkerPanicked)?;
                        print_report(&report, mode);
                        println!("\nRemove the card to read another one\n");
                    }
                }
                Ok(_) => {
                    if card_present {
                        info!("Card removed");
                        card_present = false;
                    }
                }
                Err(e) => {
                    warn!(error = %e, "Card reader unavailable");
                    reader_lost = true;
                }
            }
        }
        if reader_lost {
            reader = None;
            card_present = false;
        }

        // Sleep briefly to avoid busy loop
        thread::sleep(POLL_INTERVAL);
    }
}
