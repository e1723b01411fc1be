use std::path::PathBuf;

use emv_card::{ParseError, TransportError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CliError {
    #[error("Failed to load configuration: {0}")]
    Config(#[from] Box<figment::Error>),

    #[error("Invalid terminal configuration: {0}")]
    Terminal(#[from] ParseError),

    #[error("Invalid trace file: {0}")]
    Trace(#[source] ParseError),

    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error("Invalid hex for {what}: {source}")]
    Hex {
        what: &'static str,
        #[source]
        source: hex::FromHexError,
    },

    #[error("Failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Card session failed: {0}")]
    Session(#[from] emv_card::Error),

    #[error("Card session worker panicked")]
    WorkerPanicked,
}

impl CliError {
    pub fn hex(what: &'static str) -> impl FnOnce(hex::FromHexError) -> Self {
        move |source| Self::Hex { what, source }
    }
}
