//! PC/SC card reader management

use std::ffi::{CStr, CString};
use std::fmt;

use pcsc::{Card, Context, Disposition, MAX_BUFFER_SIZE, Protocols, Scope, ShareMode};
use tracing::debug;

use crate::transport::{CardTransport, TransportError};

/// Card reader wrapper for managing PC/SC connections
pub struct CardReader {
    context: Context,
}

impl fmt::Debug for CardReader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CardReader").finish_non_exhaustive()
    }
}

impl CardReader {
    /// Create a new CardReader by establishing a PC/SC context
    pub fn new() -> Result<Self, TransportError> {
        let context = Context::establish(Scope::User).map_err(|err| TransportError::Connect(err.to_string()))?;
        Ok(Self { context })
    }

    /// List all available card readers
    pub fn list_readers(&self) -> Result<Vec<CString>, TransportError> {
        let mut readers_buf = [0; 2048];
        let readers = self
            .context
            .list_readers(&mut readers_buf)
            .map_err(|err| TransportError::Io(err.to_string()))?;
        Ok(readers.map(CStr::to_owned).collect())
    }

    /// First available reader
    pub fn first_reader(&self) -> Result<CString, TransportError> {
        self.list_readers()?
            .into_iter()
            .next()
            .ok_or_else(|| TransportError::Connect(pcsc::Error::NoReadersAvailable.to_string()))
    }

    /// Whether a card is in the field of `reader`
    pub fn is_card_present(&self, reader: &CStr) -> bool {
        match self.context.connect(reader, ShareMode::Shared, Protocols::ANY) {
            Ok(card) => {
                // Leave the card powered for the session that follows
                let _ = card.disconnect(Disposition::LeaveCard);
                true
            }
            Err(_) => false,
        }
    }

    /// Transport for `reader`; the link opens on [`CardTransport::connect`]
    pub fn transport(&self, reader: &CStr) -> PcscTransport {
        PcscTransport {
            context: self.context.clone(),
            reader: reader.to_owned(),
            card: None,
        }
    }
}

/// Card link through a PC/SC reader
pub struct PcscTransport {
    context: Context,
    reader: CString,
    card: Option<Card>,
}

impl fmt::Debug for PcscTransport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PcscTransport")
            .field("reader", &self.reader)
            .field("connected", &self.card.is_some())
            .finish()
    }
}

impl PcscTransport {
    /// Reader name
    pub fn reader_name(&self) -> String {
        self.reader.to_string_lossy().into_owned()
    }
}

impl CardTransport for PcscTransport {
    fn connect(&mut self) -> Result<(), TransportError> {
        let card = self
            .context
            .connect(&self.reader, ShareMode::Shared, Protocols::ANY)
            .map_err(|err| TransportError::Connect(err.to_string()))?;
        debug!(reader = %self.reader_name(), "Connected to card");
        self.card = Some(card);
        Ok(())
    }

    fn close(&mut self) -> Result<(), TransportError> {
        if let Some(card) = self.card.take() {
            card.disconnect(Disposition::LeaveCard)
                .map_err(|(_, err)| TransportError::Io(err.to_string()))?;
            debug!(reader = %self.reader_name(), "Disconnected from card");
        }
        Ok(())
    }

    fn is_connected(&self) -> bool {
        self.card.is_some()
    }

    fn transceive(&mut self, command: &[u8]) -> Result<Vec<u8>, TransportError> {
        let card = self.card.as_ref().ok_or(TransportError::NotConnected)?;
        let mut buf = [0; MAX_BUFFER_SIZE];
        match card.transmit(command, &mut buf) {
            Ok(response) => Ok(response.to_vec()),
            Err(err) => {
                let err = transmit_error(err);
                if matches!(err, TransportError::LinkLost(_)) {
                    self.card = None;
                }
                Err(err)
            }
        }
    }
}

fn transmit_error(err: pcsc::Error) -> TransportError {
    match err {
        pcsc::Error::RemovedCard
        | pcsc::Error::ResetCard
        | pcsc::Error::NoSmartcard
        | pcsc::Error::UnpoweredCard
        | pcsc::Error::UnresponsiveCard
        | pcsc::Error::ReaderUnavailable => TransportError::LinkLost(err.to_string()),
        other => TransportError::Io(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_card_removal_is_link_loss() {
        assert!(matches!(transmit_error(pcsc::Error::RemovedCard), TransportError::LinkLost(_)));
        assert!(matches!(transmit_error(pcsc::Error::Timeout), TransportError::Io(_)));
    }
}
