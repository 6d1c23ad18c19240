//! Opening side of the secure stream

use crypto_session::{CryptoSession, SharedKey};
use shared_protocol::{FrameHeader, LENGTH_HEADER_SIZE, SecureConfig};
use tokio::io::{AsyncRead, AsyncReadExt};
use tracing::debug;

use crate::{TransportError, TransportResult};

/// Reads one frame per call and returns its decrypted contents
pub struct SecureReader<R> {
    inner: R,
    session: CryptoSession,
    config: SecureConfig,
    /// Plaintext that did not fit the caller's buffer on the last read
    pending: Option<Vec<u8>>,
}

impl<R: AsyncRead + Unpin> SecureReader<R> {
    /// Wrap the read half of a stream with a session keyed by `shared_key`
    pub fn new(inner: R, shared_key: &SharedKey, config: SecureConfig) -> Self {
        Self {
            inner,
            session: CryptoSession::new(shared_key),
            config,
            pending: None,
        }
    }

    /// Read one frame and copy its plaintext into `out`.
    ///
    /// Returns the plaintext length. If `out` is too small the call fails
    /// with `BufferTooSmall` and keeps the message; the next call returns
    /// it. A peer that closes cleanly between frames yields `Closed`.
    pub async fn read(&mut self, out: &mut [u8]) -> TransportResult<usize> {
        let plaintext = match self.pending.take() {
            Some(plaintext) => plaintext,
            None => self.next_message().await?,
        };

        if plaintext.len() > out.len() {
            let needed = plaintext.len();
            self.pending = Some(plaintext);
            return Err(TransportError::BufferTooSmall {
                needed,
                available: out.len(),
            });
        }

        out[..plaintext.len()].copy_from_slice(&plaintext);
        Ok(plaintext.len())
    }

    /// Read one frame and return its plaintext
    pub async fn read_message(&mut self) -> TransportResult<Vec<u8>> {
        match self.pending.take() {
            Some(plaintext) => Ok(plaintext),
            None => self.next_message().await,
        }
    }

    async fn next_message(&mut self) -> TransportResult<Vec<u8>> {
        let header = self.read_header().await?;
        header.check_limit(&self.config)?;

        let mut sealed = vec![0u8; header.payload_len()];
        self.inner.read_exact(&mut sealed).await?;

        let plaintext = self.session.open(&sealed)?;
        debug!(
            plaintext = plaintext.len(),
            seq = self.session.opened_count(),
            "Read sealed frame"
        );
        Ok(plaintext)
    }

    /// Read the 8-byte length. EOF before the first byte is a clean close,
    /// EOF inside the header is a truncated frame.
    async fn read_header(&mut self) -> TransportResult<FrameHeader> {
        let mut buf = [0u8; LENGTH_HEADER_SIZE];
        let mut filled = 0;
        while filled < LENGTH_HEADER_SIZE {
            match self.inner.read(&mut buf[filled..]).await {
                Ok(0) if filled == 0 => return Err(TransportError::Closed),
                Ok(0) => {
                    return Err(std::io::Error::new(
                        std::io::ErrorKind::UnexpectedEof,
                        format!("stream ended after {filled} header bytes"),
                    )
                    .into());
                }
                Ok(n) => filled += n,
                Err(e) if e.kind() == std::io::ErrorKind::Interrupted => {}
                Err(e) => return Err(e.into()),
            }
        }
        Ok(FrameHeader::decode(&buf)?)
    }

    /// Limits applied to incoming frames
    pub fn config(&self) -> &SecureConfig {
        &self.config
    }

    /// Give back the underlying stream
    pub fn into_inner(self) -> R {
        self.inner
    }
}
