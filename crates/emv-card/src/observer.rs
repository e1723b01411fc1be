//! Session observers
//!
//! The engine reports every exchange and notable event to a
//! [`SessionObserver`]. Observers never influence control flow.

use std::sync::mpsc::Sender;

use tracing::{error, info};

use crate::error::Error;

/// Receives session events as they happen
#[allow(unused_variables)]
pub trait SessionObserver {
    /// A command APDU is about to be sent
    fn outbound(&mut self, command: &str, apdu: &[u8]) {}

    /// A response APDU arrived; `parsed` is its rendered TLV tree, if any
    fn inbound(&mut self, command: &str, apdu: &[u8], parsed: Option<&str>) {}

    fn info(&mut self, message: &str) {}

    fn error(&mut self, error: &Error) {}

    /// A new phase or application begins
    fn separator(&mut self, title: &str) {}

    /// The session ended; `error` is set when it failed
    fn finished(&mut self, error: Option<&Error>) {}
}

/// Owned form of an observer callback
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    Outbound {
        command: String,
        apdu: Vec<u8>,
    },
    Inbound {
        command: String,
        apdu: Vec<u8>,
        parsed: Option<String>,
    },
    Info(String),
    Error(Error),
    Separator(String),
    Finished(Option<Error>),
}

impl SessionEvent {
    /// Replay this event on another observer
    pub fn dispatch<O: SessionObserver + ?Sized>(&self, observer: &mut O) {
        match self {
            Self::Outbound { command, apdu } => observer.outbound(command, apdu),
            Self::Inbound { command, apdu, parsed } => observer.inbound(command, apdu, parsed.as_deref()),
            Self::Info(message) => observer.info(message),
            Self::Error(error) => observer.error(error),
            Self::Separator(title) => observer.separator(title),
            Self::Finished(error) => observer.finished(error.as_ref()),
        }
    }
}

/// Records every event, mostly for tests
impl SessionObserver for Vec<SessionEvent> {
    fn outbound(&mut self, command: &str, apdu: &[u8]) {
        self.push(SessionEvent::Outbound {
            command: command.to_string(),
            apdu: apdu.to_vec(),
        });
    }

    fn inbound(&mut self, command: &str, apdu: &[u8], parsed: Option<&str>) {
        self.push(SessionEvent::Inbound {
            command: command.to_string(),
            apdu: apdu.to_vec(),
            parsed: parsed.map(str::to_string),
        });
    }

    fn info(&mut self, message: &str) {
        self.push(SessionEvent::Info(message.to_string()));
    }

    fn error(&mut self, error: &Error) {
        self.push(SessionEvent::Error(error.clone()));
    }

    fn separator(&mut self, title: &str) {
        self.push(SessionEvent::Separator(title.to_string()));
    }

    fn finished(&mut self, error: Option<&Error>) {
        self.push(SessionEvent::Finished(error.cloned()));
    }
}

/// Forwards events to another thread
#[derive(Debug, Clone)]
pub struct ChannelObserver {
    sender: Sender<SessionEvent>,
}

impl ChannelObserver {
    pub const fn new(sender: Sender<SessionEvent>) -> Self {
        Self { sender }
    }

    fn send(&self, event: SessionEvent) {
        // The receiving side may have gone away; the session still completes
        let _ = self.sender.send(event);
    }
}

impl SessionObserver for ChannelObserver {
    fn outbound(&mut self, command: &str, apdu: &[u8]) {
        self.send(SessionEvent::Outbound {
            command: command.to_string(),
            apdu: apdu.to_vec(),
        });
    }

    fn inbound(&mut self, command: &str, apdu: &[u8], parsed: Option<&str>) {
        self.send(SessionEvent::Inbound {
            command: command.to_string(),
            apdu: apdu.to_vec(),
            parsed: parsed.map(str::to_string),
        });
    }

    fn info(&mut self, message: &str) {
        self.send(SessionEvent::Info(message.to_string()));
    }

    fn error(&mut self, error: &Error) {
        self.send(SessionEvent::Error(error.clone()));
    }

    fn separator(&mut self, title: &str) {
        self.send(SessionEvent::Separator(title.to_string()));
    }

    fn finished(&mut self, error: Option<&Error>) {
        self.send(SessionEvent::Finished(error.cloned()));
    }
}

/// Logs events through `tracing`
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingObserver;

impl SessionObserver for TracingObserver {
    fn outbound(&mut self, command: &str, apdu: &[u8]) {
        info!(command, apdu = %hex::encode_upper(apdu), ">>");
    }

    fn inbound(&mut self, command: &str, apdu: &[u8], parsed: Option<&str>) {
        info!(command, apdu = %hex::encode_upper(apdu), "<<");
        if let Some(parsed) = parsed {
            info!("\n{parsed}");
        }
    }

    fn info(&mut self, message: &str) {
        info!("{message}");
    }

    fn error(&mut self, error: &Error) {
        error!(%error, "Session error");
    }

    fn separator(&mut self, title: &str) {
        info!("--- {title} ---");
    }

    fn finished(&mut self, error: Option<&Error>) {
        match error {
            Some(error) => error!(%error, "Session failed"),
            None => info!("Session finished"),
        }
    }
}
