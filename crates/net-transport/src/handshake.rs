//! Public key exchange
//!
//! ```text
//!   client                          server
//!     | -- 32-byte public key -->     |
//!     | <-- 32-byte public key --     |
//! ```
//!
//! Both sides write before they read, so neither blocks waiting for the
//! other and no message type or version byte is needed. Roles are agreed
//! out of band (who dials, who listens).

use crypto_session::{KeyPair, PUBLIC_KEY_SIZE, SharedKey};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tracing::debug;

use crate::{TransportError, TransportResult};

/// Send our public key, receive the peer's, and derive the shared key.
///
/// Exactly one 32-byte write and one 32-byte read hit the stream. A short
/// read or write, or any stream error, fails the handshake; there is no
/// retry and the caller should drop the connection.
pub async fn exchange<S>(keypair: &mut KeyPair, stream: &mut S) -> TransportResult<SharedKey>
where
    S: AsyncRead + AsyncWrite + Unpin + ?Sized,
{
    debug!("Sending public key");
    stream
        .write_all(&keypair.public_key_bytes())
        .await
        .map_err(|source| TransportError::Handshake {
            stage: "sending public key",
            source,
        })?;
    stream
        .flush()
        .await
        .map_err(|source| TransportError::Handshake {
            stage: "sending public key",
            source,
        })?;

    let mut peer_public = [0u8; PUBLIC_KEY_SIZE];
    stream
        .read_exact(&mut peer_public)
        .await
        .map_err(|source| TransportError::Handshake {
            stage: "receiving peer public key",
            source,
        })?;
    debug!("Received peer public key");

    keypair.set_peer_public_key(peer_public);
    Ok(keypair.peer_shared_key()?)
}
