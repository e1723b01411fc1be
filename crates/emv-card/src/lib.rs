//! EMV Card - APDU exchange and application selection for payment cards
//!
//! [`EmvSession`] runs the selection protocol over any [`CardTransport`]:
//! payment system directory discovery, application selection, GET PROCESSING
//! OPTIONS with a PDOL built by [`DolBuilder`], and reading the records the
//! AFL names. [`reader::PcscTransport`] talks to physical readers through
//! PC/SC; [`ReplayTransport`] answers from a recorded script.

pub mod apdu;
pub mod application;
pub mod dol;
pub mod error;
pub mod observer;
pub mod parse;
pub mod protocol;
#[cfg(feature = "pcsc")]
pub mod reader;
pub mod terminal;
pub mod transport;
pub mod worker;

pub use apdu::{ApduCommand, ApduResponse, StatusWord};
pub use application::{AflEntry, Aip, ApplicationCandidate, Directory, FileRecord};
pub use dol::{DolBuilder, TagAndLength};
pub use error::{Error, ParseError, Result};
pub use observer::{ChannelObserver, SessionEvent, SessionObserver, TracingObserver};
pub use protocol::{
    ApplicationReport, ApplicationStatus, EmvSession, PaymentEnvironment, SessionKind, SessionReport,
    SessionState,
};
#[cfg(feature = "pcsc")]
pub use reader::{CardReader, PcscTransport};
pub use terminal::{TerminalConfig, TerminalContext};
pub use transport::{CardTransport, ReplayTransport, TransportError, TransportGuard};
pub use worker::{SessionHandle, spawn_session};
