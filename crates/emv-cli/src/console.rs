//! Terminal output for session events

use emv_card::{Error, SessionObserver};

use crate::formatters::FormatMode;

/// Prints every exchange as it happens
#[derive(Debug, Clone, Copy)]
pub struct ConsoleObserver {
    mode: FormatMode,
}

impl ConsoleObserver {
    pub const fn new(mode: FormatMode) -> Self {
        Self { mode }
    }
}

impl SessionObserver for ConsoleObserver {
    fn outbound(&mut self, command: &str, apdu: &[u8]) {
        println!(">> {command}: {}", hex::encode_upper(apdu));
    }

    fn inbound(&mut self, _command: &str, apdu: &[u8], parsed: Option<&str>) {
        println!("<< {}", hex::encode_upper(apdu));
        if let (FormatMode::Human, Some(parsed)) = (self.mode, parsed) {
            for line in parsed.lines() {
                println!("   {line}");
            }
        }
    }

    fn info(&mut self, message: &str) {
        println!("{message}");
    }

    fn error(&mut self, error: &Error) {
        eprintln!("! {error}");
    }

    fn separator(&mut self, title: &str) {
        println!("\n=== {title} ===\n");
    }

    fn finished(&mut self, error: Option<&Error>) {
        match error {
            Some(error) => eprintln!("\nSession failed: {error}"),
            None => println!("\nSession complete"),
        }
    }
}
