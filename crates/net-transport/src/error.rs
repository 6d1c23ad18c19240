//! Transport error types

use std::time::Duration;

use crypto_session::CryptoError;
use shared_protocol::ProtocolError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("Handshake failed while {stage}: {source}")]
    Handshake {
        stage: &'static str,
        #[source]
        source: std::io::Error,
    },

    #[error("Handshake timed out after {0:?}")]
    HandshakeTimeout(Duration),

    #[error("Message too large: {size} bytes (max: {max})")]
    MessageTooLarge { size: u64, max: u64 },

    #[error("Buffer too small: message is {needed} bytes, buffer holds {available}")]
    BufferTooSmall { needed: usize, available: usize },

    #[error("Write interrupted after {written} bytes: {source}")]
    PartialWrite {
        written: usize,
        #[source]
        source: std::io::Error,
    },

    #[error("Connection closed")]
    Closed,

    #[error("Session not secure: {0:?}")]
    NotSecure(shared_protocol::SessionState),

    #[error("Crypto error: {0}")]
    Crypto(#[from] CryptoError),

    #[error("Protocol error: {0}")]
    Protocol(ProtocolError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl TransportError {
    /// The peer's record failed authentication
    pub fn is_decryption_failure(&self) -> bool {
        matches!(self, TransportError::Crypto(CryptoError::DecryptionFailed))
    }

    /// Bytes that reached the stream before the failure
    pub fn bytes_written(&self) -> usize {
        match self {
            TransportError::PartialWrite { written, .. } => *written,
            _ => 0,
        }
    }
}

impl From<ProtocolError> for TransportError {
    fn from(err: ProtocolError) -> Self {
        match err {
            ProtocolError::FrameTooLarge { size, max } => {
                TransportError::MessageTooLarge { size, max }
            }
            other => TransportError::Protocol(other),
        }
    }
}

pub type TransportResult<T> = Result<T, TransportError>;
