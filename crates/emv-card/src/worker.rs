//! Background card sessions
//!
//! Each tap runs on its own thread. Events stream back over a channel while
//! the session is in progress and the final report comes from joining it.

use std::sync::mpsc::{self, Receiver};
use std::thread::{self, JoinHandle};

use tracing::info;

use crate::observer::{ChannelObserver, SessionEvent};
use crate::protocol::{EmvSession, SessionKind, SessionReport};
use crate::terminal::TerminalContext;
use crate::transport::CardTransport;

/// Handle to a session running on a worker thread
#[derive(Debug)]
pub struct SessionHandle {
    events: Receiver<SessionEvent>,
    thread: JoinHandle<SessionReport>,
}

impl SessionHandle {
    /// Events emitted so far; the channel closes when the session ends
    pub const fn events(&self) -> &Receiver<SessionEvent> {
        &self.events
    }

    /// Wait for the session and return its report
    pub fn join(self) -> thread::Result<SessionReport> {
        self.thread.join()
    }
}

/// Run a session over `transport` on a new thread
pub fn spawn_session<T>(mut transport: T, kind: SessionKind, terminal: TerminalContext) -> SessionHandle
where
    T: CardTransport + Send + 'static,
{
    let (event_tx, events) = mpsc::channel();

    let thread = thread::spawn(move || {
        info!("Card session worker started");
        let mut observer = ChannelObserver::new(event_tx);
        let report = EmvSession::new(&mut observer)
            .with_terminal(terminal)
            .run(&mut transport, &kind);
        info!(state = %report.state, "Card session worker stopped");
        report
    });

    SessionHandle { events, thread }
}
