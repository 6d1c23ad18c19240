//! Duplex secure channel

use std::net::SocketAddr;

use crypto_session::KeyPair;
use shared_protocol::{SecureConfig, SessionRole, SessionState};
use tokio::io::{ReadHalf, WriteHalf};
use tracing::{debug, info, warn};

use crate::{Duplex, SecureReader, SecureWriter, TransportError, TransportResult, exchange};

/// Encrypted, framed conversation over one stream.
///
/// Owns the reader and writer for both halves of the stream and the single
/// shared key they were built from.
pub struct SecureChannel<S> {
    reader: SecureReader<ReadHalf<S>>,
    writer: SecureWriter<WriteHalf<S>>,
    role: SessionRole,
    state: SessionState,
    peer_addr: Option<SocketAddr>,
}

impl<S: Duplex> SecureChannel<S> {
    /// Run the key exchange on a freshly connected stream and wrap it.
    ///
    /// The exchange is bounded by `config.handshake_timeout`; on failure
    /// the stream is dropped.
    pub async fn establish(
        mut stream: S,
        keypair: &mut KeyPair,
        role: SessionRole,
        config: SecureConfig,
    ) -> TransportResult<Self> {
        let mut state = SessionState::Connected;
        state.transition(SessionState::Handshaking)?;

        let shared_key = tokio::time::timeout(config.handshake_timeout, exchange(keypair, &mut stream))
            .await
            .map_err(|_| TransportError::HandshakeTimeout(config.handshake_timeout))??;

        state.transition(SessionState::Secure)?;
        info!(%role, "Handshake complete");

        let (read_half, write_half) = tokio::io::split(stream);
        Ok(Self {
            reader: SecureReader::new(read_half, &shared_key, config.clone()),
            writer: SecureWriter::new(write_half, &shared_key, config),
            role,
            state,
            peer_addr: None,
        })
    }

    /// Record the remote address for logging
    pub fn with_peer_addr(mut self, addr: SocketAddr) -> Self {
        self.peer_addr = Some(addr);
        self
    }

    /// Read one message into `buf`, returning its length
    pub async fn read(&mut self, buf: &mut [u8]) -> TransportResult<usize> {
        self.ensure_secure()?;
        let result = self.reader.read(buf).await;
        self.observe(result)
    }

    /// Read one message
    pub async fn read_message(&mut self) -> TransportResult<Vec<u8>> {
        self.ensure_secure()?;
        let result = self.reader.read_message().await;
        self.observe(result)
    }

    /// Seal and send one message, returning the bytes put on the wire.
    ///
    /// A write that fails after reaching the stream leaves a partial frame
    /// behind and ends the session. An oversized message is refused before
    /// any I/O and the session stays usable.
    pub async fn write(&mut self, plaintext: &[u8]) -> TransportResult<usize> {
        self.ensure_secure()?;
        let result = self.writer.write(plaintext).await;
        if let Err(e @ (TransportError::PartialWrite { .. } | TransportError::Io(_))) = &result {
            self.desync(e);
        }
        result
    }

    /// Close our direction of the stream. Closing twice is a no-op.
    pub async fn close(&mut self) -> TransportResult<()> {
        if self.state == SessionState::Closed {
            return Ok(());
        }
        self.state.transition(SessionState::Closed)?;
        debug!(role = %self.role, "Closing secure channel");
        self.writer.shutdown().await
    }

    /// Which side of the handshake this channel played
    pub fn role(&self) -> SessionRole {
        self.role
    }

    /// Current session state; only `Secure` channels accept reads and writes
    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Remote address, when the channel was built over a socket
    pub fn peer_addr(&self) -> Option<SocketAddr> {
        self.peer_addr
    }

    /// Limits shared by both directions
    pub fn config(&self) -> &SecureConfig {
        self.writer.config()
    }

    /// Separate the channel into its reader and writer so both directions
    /// can be driven from different tasks
    pub fn into_split(self) -> (SecureReader<ReadHalf<S>>, SecureWriter<WriteHalf<S>>) {
        (self.reader, self.writer)
    }

    fn ensure_secure(&self) -> TransportResult<()> {
        if !self.state.is_secure() {
            return Err(TransportError::NotSecure(self.state));
        }
        Ok(())
    }

    /// End the session on any read error that leaves the stream off a
    /// frame boundary. A record that fails authentication was consumed
    /// whole, so the next frame still lines up.
    fn observe<T>(&mut self, result: TransportResult<T>) -> TransportResult<T> {
        match &result {
            Err(TransportError::Closed) => self.state = SessionState::Closed,
            Err(
                e @ (TransportError::MessageTooLarge { .. }
                | TransportError::Io(_)
                | TransportError::Protocol(_)),
            ) => self.desync(e),
            _ => {}
        }
        result
    }

    fn desync(&mut self, err: &TransportError) {
        warn!(role = %self.role, "Stream out of sync, closing session: {}", err);
        self.state = SessionState::Closed;
    }
}
