//! Dialing side

use crypto_session::KeyPair;
use shared_protocol::{SecureConfig, SessionRole};
use tokio::net::{TcpStream, ToSocketAddrs};
use tracing::{Instrument, Span, info, info_span};

use crate::{Duplex, SecureChannel, TransportResult};

/// Secure echo client
pub struct Client {
    keypair: KeyPair,
    config: SecureConfig,
    span: Span,
}

impl Client {
    /// Create a client that will present `keypair` to every server it meets
    pub fn new(keypair: KeyPair, config: SecureConfig) -> Self {
        Self {
            keypair,
            config,
            span: info_span!("client"),
        }
    }

    /// Log under `span` instead of the default `client` span
    pub fn with_span(mut self, span: Span) -> Self {
        self.span = span;
        self
    }

    /// Perform the handshake on an already connected stream and return a
    /// secure channel over it
    pub async fn handshake<S: Duplex>(&self, stream: S) -> TransportResult<SecureChannel<S>> {
        let mut keypair = self.keypair.copy_for_connection();
        SecureChannel::establish(stream, &mut keypair, SessionRole::Client, self.config.clone())
            .instrument(self.span.clone())
            .await
    }

    /// Connect over TCP and perform the handshake
    pub async fn connect<A: ToSocketAddrs>(&self, addr: A) -> TransportResult<SecureChannel<TcpStream>> {
        let stream = TcpStream::connect(addr).await?;
        stream.set_nodelay(true)?;
        let peer_addr = stream.peer_addr()?;

        let span = info_span!(parent: &self.span, "connection", peer = %peer_addr);
        span.in_scope(|| info!("Connected"));

        let mut keypair = self.keypair.copy_for_connection();
        let channel =
            SecureChannel::establish(stream, &mut keypair, SessionRole::Client, self.config.clone())
                .instrument(span)
                .await?;
        Ok(channel.with_peer_addr(peer_addr))
    }
}

/// Generate a key pair, connect to `addr` and return a secure channel
pub async fn dial<A: ToSocketAddrs>(addr: A, config: SecureConfig) -> TransportResult<SecureChannel<TcpStream>> {
    config.validate()?;
    let keypair = KeyPair::generate()?;
    Client::new(keypair, config).connect(addr).await
}
