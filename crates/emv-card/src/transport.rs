//! Card transport collaborator
//!
//! A blocking request/response link to the card. The session engine owns the
//! transport for the duration of a session through [`TransportGuard`], which
//! closes the link on every exit path.

use std::ops::{Deref, DerefMut};

use thiserror::Error;
use tracing::{debug, warn};

use crate::error::ParseError;

/// Failure of the physical card link
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    /// The card left the field or the reader went away mid-session
    #[error("Card link lost: {0}")]
    LinkLost(String),

    /// An exchange was attempted without an open link
    #[error("Transport is not connected")]
    NotConnected,

    /// Opening the link failed
    #[error("Failed to connect to card: {0}")]
    Connect(String),

    /// Any other I/O failure
    #[error("Transport I/O error: {0}")]
    Io(String),
}

/// Blocking request/response link to a card
pub trait CardTransport {
    /// Open the link
    fn connect(&mut self) -> Result<(), TransportError>;

    /// Close the link; closing an already closed link succeeds
    fn close(&mut self) -> Result<(), TransportError>;

    /// Whether the link is open
    fn is_connected(&self) -> bool;

    /// Send a command APDU and return the raw response APDU
    fn transceive(&mut self, command: &[u8]) -> Result<Vec<u8>, TransportError>;
}

impl<T: CardTransport + ?Sized> CardTransport for &mut T {
    fn connect(&mut self) -> Result<(), TransportError> {
        (**self).connect()
    }

    fn close(&mut self) -> Result<(), TransportError> {
        (**self).close()
    }

    fn is_connected(&self) -> bool {
        (**self).is_connected()
    }

    fn transceive(&mut self, command: &[u8]) -> Result<Vec<u8>, TransportError> {
        (**self).transceive(command)
    }
}

impl<T: CardTransport + ?Sized> CardTransport for Box<T> {
    fn connect(&mut self) -> Result<(), TransportError> {
        (**self).connect()
    }

    fn close(&mut self) -> Result<(), TransportError> {
        (**self).close()
    }

    fn is_connected(&self) -> bool {
        (**self).is_connected()
    }

    fn transceive(&mut self, command: &[u8]) -> Result<Vec<u8>, TransportError> {
        (**self).transceive(command)
    }
}

/// Exclusive use of a connected transport, closed when the guard goes away
#[derive(Debug)]
pub struct TransportGuard<'a, T: CardTransport + ?Sized> {
    transport: &'a mut T,
    released: bool,
}

impl<'a, T: CardTransport + ?Sized> TransportGuard<'a, T> {
    /// Take charge of an already connected transport
    pub const fn new(transport: &'a mut T) -> Self {
        Self {
            transport,
            released: false,
        }
    }

    /// Close the link now and report the outcome
    pub fn release(mut self) -> Result<(), TransportError> {
        self.released = true;
        self.transport.close()
    }
}

impl<T: CardTransport + ?Sized> Deref for TransportGuard<'_, T> {
    type Target = T;

    fn deref(&self) -> &T {
        self.transport
    }
}

impl<T: CardTransport + ?Sized> DerefMut for TransportGuard<'_, T> {
    fn deref_mut(&mut self) -> &mut T {
        self.transport
    }
}

impl<T: CardTransport + ?Sized> Drop for TransportGuard<'_, T> {
    fn drop(&mut self) {
        if self.released {
            return;
        }
        if let Err(err) = self.transport.close() {
            warn!(error = %err, "Failed to close card transport");
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Matcher {
    Exact(Vec<u8>),
    Header([u8; 4]),
}

impl Matcher {
    fn matches(&self, command: &[u8]) -> bool {
        match self {
            Self::Exact(expected) => expected == command,
            Self::Header(header) => command.starts_with(header),
        }
    }
}

#[derive(Debug, Clone)]
struct Exchange {
    matcher: Matcher,
    response: Vec<u8>,
    used: bool,
}

/// In-memory transport answering from a script of recorded exchanges
///
/// Each scripted exchange answers once, in script order. Commands without a
/// matching exchange get the fallback response (`6A82` unless changed).
#[derive(Debug, Clone)]
pub struct ReplayTransport {
    exchanges: Vec<Exchange>,
    fallback: Vec<u8>,
    sent: Vec<Vec<u8>>,
    connected: bool,
    close_count: usize,
    refuse_connect: bool,
    lose_link_after: Option<usize>,
}

impl Default for ReplayTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl ReplayTransport {
    /// Empty script
    pub fn new() -> Self {
        Self {
            exchanges: Vec::new(),
            fallback: vec![0x6A, 0x82],
            sent: Vec::new(),
            connected: false,
            close_count: 0,
            refuse_connect: false,
            lose_link_after: None,
        }
    }

    /// Answer `command` (matched exactly) with `response`
    pub fn expect(mut self, command: impl Into<Vec<u8>>, response: impl Into<Vec<u8>>) -> Self {
        self.push(Matcher::Exact(command.into()), response.into());
        self
    }

    /// Answer any command starting with `header` (CLA INS P1 P2) with `response`
    pub fn expect_header(mut self, header: [u8; 4], response: impl Into<Vec<u8>>) -> Self {
        self.push(Matcher::Header(header), response.into());
        self
    }

    /// Response for commands the script does not cover
    pub fn with_fallback(mut self, response: impl Into<Vec<u8>>) -> Self {
        self.fallback = response.into();
        self
    }

    /// Make `connect` fail
    pub const fn refusing_connect(mut self) -> Self {
        self.refuse_connect = true;
        self
    }

    /// Report link loss once `exchanges` commands have been answered
    pub const fn losing_link_after(mut self, exchanges: usize) -> Self {
        self.lose_link_after = Some(exchanges);
        self
    }

    /// Load a trace of `>>` command and `<<` response lines in hex
    ///
    /// Blank lines and lines starting with `#` are ignored. GET PROCESSING
    /// OPTIONS commands are matched on their header only because their data
    /// field carries fresh terminal values on every run.
    pub fn from_trace(trace: &str) -> Result<Self, ParseError> {
        let mut transport = Self::new();
        let mut pending: Option<Vec<u8>> = None;

        for (index, line) in trace.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let key = format!("trace line {}", index + 1);
            let direction = line.get(..2).unwrap_or(line);
            let payload = line.get(2..).unwrap_or_default();
            let bytes = decode_hex(&key, payload)?;

            match direction {
                ">>" => {
                    if pending.replace(bytes).is_some() {
                        return Err(config_error(&key, "command without a response"));
                    }
                }
                "<<" => {
                    let command = pending
                        .take()
                        .ok_or_else(|| config_error(&key, "response without a command"))?;
                    let matcher = match <[u8; 4]>::try_from(command.get(..4).unwrap_or_default()) {
                        Ok(header) if header[1] == 0xA8 => Matcher::Header(header),
                        _ => Matcher::Exact(command),
                    };
                    transport.push(matcher, bytes);
                }
                _ => return Err(config_error(&key, "expected '>>' or '<<'")),
            }
        }

        if pending.is_some() {
            return Err(config_error("trace", "last command has no response"));
        }
        Ok(transport)
    }

    fn push(&mut self, matcher: Matcher, response: Vec<u8>) {
        self.exchanges.push(Exchange {
            matcher,
            response,
            used: false,
        });
    }

    /// Commands received so far
    pub fn sent(&self) -> &[Vec<u8>] {
        &self.sent
    }

    /// Number of times the link was closed
    pub const fn close_count(&self) -> usize {
        self.close_count
    }

    /// Scripted exchanges that were never requested
    pub fn unused(&self) -> usize {
        self.exchanges.iter().filter(|e| !e.used).count()
    }
}

fn decode_hex(key: &str, text: &str) -> Result<Vec<u8>, ParseError> {
    let compact: String = text.chars().filter(|c| !c.is_whitespace()).collect();
    hex::decode(compact).map_err(|err| config_error(key, &err.to_string()))
}

fn config_error(key: &str, reason: &str) -> ParseError {
    ParseError::Config {
        key: key.to_string(),
        reason: reason.to_string(),
    }
}

impl CardTransport for ReplayTransport {
    fn connect(&mut self) -> Result<(), TransportError> {
        if self.refuse_connect {
            return Err(TransportError::Connect("no card present".into()));
        }
        self.connected = true;
        Ok(())
    }

    fn close(&mut self) -> Result<(), TransportError> {
        self.connected = false;
        self.close_count += 1;
        Ok(())
    }

    fn is_connected(&self) -> bool {
        self.connected
    }

    fn transceive(&mut self, command: &[u8]) -> Result<Vec<u8>, TransportError> {
        if !self.connected {
            return Err(TransportError::NotConnected);
        }
        if self.lose_link_after.is_some_and(|limit| self.sent.len() >= limit) {
            self.connected = false;
            return Err(TransportError::LinkLost("card removed from field".into()));
        }
        self.sent.push(command.to_vec());

        let exchange = self
            .exchanges
            .iter_mut()
            .find(|e| !e.used && e.matcher.matches(command));
        match exchange {
            Some(exchange) => {
                exchange.used = true;
                Ok(exchange.response.clone())
            }
            None => {
                debug!(command = %hex::encode_upper(command), "No scripted response, using fallback");
                Ok(self.fallback.clone())
            }
        }
    }
}
