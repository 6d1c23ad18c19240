//! Listening side

use crypto_session::KeyPair;
use shared_protocol::{SecureConfig, SessionRole};
use tokio::net::TcpListener;
use tracing::{Instrument, Span, debug, info, info_span, warn};

use crate::{Duplex, SecureChannel, TransportError, TransportResult};

/// Secure echo server
///
/// Every accepted connection runs in its own task with its own copy of the
/// server key pair, so a stalled or failing client never affects another.
pub struct Server {
    keypair: KeyPair,
    config: SecureConfig,
    span: Span,
}

impl Server {
    /// Initialize a server with its long-lived key pair
    pub fn new(keypair: KeyPair, config: SecureConfig) -> Self {
        Self {
            keypair,
            config,
            span: info_span!("server"),
        }
    }

    /// Log under `span` instead of the default `server` span
    pub fn with_span(mut self, span: Span) -> Self {
        self.span = span;
        self
    }

    /// Accept connections until the listener fails.
    ///
    /// Only an accept error ends the loop; per-connection failures are
    /// logged and that connection is dropped.
    pub async fn serve(self, listener: TcpListener) -> TransportResult<()> {
        self.config.validate()?;
        if let Ok(addr) = listener.local_addr() {
            self.span.in_scope(|| info!("Listening on {}", addr));
        }

        loop {
            let (stream, peer_addr) = match listener.accept().await {
                Ok(accepted) => accepted,
                Err(e) => {
                    self.span.in_scope(|| warn!("Failed to accept client: {}", e));
                    return Err(e.into());
                }
            };

            let span = info_span!(parent: &self.span, "connection", peer = %peer_addr);
            if let Err(e) = stream.set_nodelay(true) {
                span.in_scope(|| debug!("Could not set TCP_NODELAY: {}", e));
            }

            let keypair = self.keypair.copy_for_connection();
            let config = self.config.clone();
            tokio::spawn(
                async move {
                    info!("Client connected");
                    match echo(stream, keypair, config).await {
                        Ok(echoed) => info!(echoed, "Client disconnected"),
                        Err(e) => warn!("Dropping connection: {}", e),
                    }
                }
                .instrument(span),
            );
        }
    }

    /// Serve a single connection on the current task: handshake, then echo
    /// every message back until the client closes. Returns the number of
    /// messages echoed.
    pub async fn handle_connection<S: Duplex>(&self, stream: S) -> TransportResult<u64> {
        let keypair = self.keypair.copy_for_connection();
        echo(stream, keypair, self.config.clone())
            .instrument(self.span.clone())
            .await
    }
}

async fn echo<S: Duplex>(stream: S, mut keypair: KeyPair, config: SecureConfig) -> TransportResult<u64> {
    let mut channel = SecureChannel::establish(stream, &mut keypair, SessionRole::Server, config).await?;

    let mut echoed = 0;
    loop {
        let message = match channel.read_message().await {
            Ok(message) => message,
            Err(TransportError::Closed) => break,
            Err(e) => return Err(e),
        };
        debug!(len = message.len(), "Echoing message");
        channel.write(&message).await?;
        echoed += 1;
    }

    if let Err(e) = channel.close().await {
        debug!("Close after peer hangup failed: {}", e);
    }
    Ok(echoed)
}

/// Generate a key pair and run an echo server on `listener`
pub async fn serve(listener: TcpListener, config: SecureConfig) -> TransportResult<()> {
    let keypair = KeyPair::generate()?;
    Server::new(keypair, config).serve(listener).await
}
