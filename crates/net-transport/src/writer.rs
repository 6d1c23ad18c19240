//! Sealing side of the secure stream

use crypto_session::{CryptoSession, SharedKey};
use shared_protocol::{FrameHeader, SecureConfig};
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tracing::debug;

use crate::{TransportError, TransportResult};

/// Seals each message under a fresh nonce and writes it as one frame
pub struct SecureWriter<W> {
    inner: W,
    session: CryptoSession,
    config: SecureConfig,
}

impl<W: AsyncWrite + Unpin> SecureWriter<W> {
    /// Wrap the write half of a stream with a session keyed by `shared_key`
    pub fn new(inner: W, shared_key: &SharedKey, config: SecureConfig) -> Self {
        Self {
            inner,
            session: CryptoSession::new(shared_key),
            config,
        }
    }

    /// Seal `plaintext` and write it as a single frame.
    ///
    /// Returns the number of bytes put on the wire (header + sealed
    /// payload). Oversized messages are rejected before any I/O. If the
    /// stream fails part way, the error reports how many bytes made it out
    /// and the rest of the frame is not attempted.
    pub async fn write(&mut self, plaintext: &[u8]) -> TransportResult<usize> {
        if plaintext.len() > self.config.max_message_size {
            return Err(TransportError::MessageTooLarge {
                size: plaintext.len() as u64,
                max: self.config.max_message_size as u64,
            });
        }

        let sealed = self.session.seal(plaintext)?;
        let header = FrameHeader::for_sealed(sealed.len()).encode();

        let mut written = 0;
        for part in [&header[..], &sealed[..]] {
            let n = write_counted(&mut self.inner, part)
                .await
                .map_err(|(partial, source)| TransportError::PartialWrite {
                    written: written + partial,
                    source,
                })?;
            written += n;
        }
        self.inner
            .flush()
            .await
            .map_err(|source| TransportError::PartialWrite { written, source })?;

        debug!(
            plaintext = plaintext.len(),
            wire = written,
            seq = self.session.sealed_count(),
            "Wrote sealed frame"
        );
        Ok(written)
    }

    /// Flush the underlying stream
    pub async fn flush(&mut self) -> TransportResult<()> {
        Ok(self.inner.flush().await?)
    }

    /// Close the write direction of the underlying stream
    pub async fn shutdown(&mut self) -> TransportResult<()> {
        Ok(self.inner.shutdown().await?)
    }

    /// Limits applied to outgoing messages
    pub fn config(&self) -> &SecureConfig {
        &self.config
    }

    /// Give back the underlying stream
    pub fn into_inner(self) -> W {
        self.inner
    }
}

/// Write all of `buf`, retrying short writes. On failure returns how many
/// bytes were accepted before the error.
async fn write_counted<W>(inner: &mut W, buf: &[u8]) -> Result<usize, (usize, std::io::Error)>
where
    W: AsyncWrite + Unpin,
{
    let mut written = 0;
    while written < buf.len() {
        match inner.write(&buf[written..]).await {
            Ok(0) => {
                return Err((
                    written,
                    std::io::Error::new(std::io::ErrorKind::WriteZero, "stream accepted no bytes"),
                ));
            }
            Ok(n) => written += n,
            Err(e) if e.kind() == std::io::ErrorKind::Interrupted => {}
            Err(e) => return Err((written, e)),
        }
    }
    Ok(written)
}

#[cfg(test)]
mod tests {
    use std::pin::Pin;
    use std::task::{Context, Poll};

    use shared_protocol::{LENGTH_HEADER_SIZE, SEAL_OVERHEAD};
    use tokio::io::AsyncReadExt;

    use super::*;
    use crate::memory_pipe;

    const MAX: usize = 3072;

    fn key() -> SharedKey {
        SharedKey::from_bytes([0u8; 32])
    }

    /// Sink that accepts a fixed number of bytes, a few at a time, then fails
    struct Trickle {
        accepted: Vec<u8>,
        budget: usize,
        chunk: usize,
        flush_fails: bool,
    }

    impl Trickle {
        fn new(budget: usize, chunk: usize) -> Self {
            Self {
                accepted: Vec::new(),
                budget,
                chunk,
                flush_fails: false,
            }
        }
    }

    impl AsyncWrite for Trickle {
        fn poll_write(
            mut self: Pin<&mut Self>,
            _cx: &mut Context<'_>,
            buf: &[u8],
        ) -> Poll<std::io::Result<usize>> {
            if self.budget == 0 {
                return Poll::Ready(Err(std::io::ErrorKind::BrokenPipe.into()));
            }
            let n = buf.len().min(self.chunk).min(self.budget);
            self.budget -= n;
            self.accepted.extend_from_slice(&buf[..n]);
            Poll::Ready(Ok(n))
        }

        fn poll_flush(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<std::io::Result<()>> {
            if self.flush_fails {
                return Poll::Ready(Err(std::io::ErrorKind::ConnectionReset.into()));
            }
            Poll::Ready(Ok(()))
        }

        fn poll_shutdown(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<std::io::Result<()>> {
            Poll::Ready(Ok(()))
        }
    }

    #[tokio::test]
    async fn test_write_max_size() {
        let (local, mut remote) = memory_pipe();
        let mut writer = SecureWriter::new(local, &key(), SecureConfig::with_max_message_size(MAX));

        let written = writer.write(&[0u8; MAX]).await.unwrap();
        assert_eq!(written, LENGTH_HEADER_SIZE + SEAL_OVERHEAD + MAX);

        drop(writer);
        let mut out = Vec::new();
        remote.read_to_end(&mut out).await.unwrap();
        assert_eq!(out.len(), written);

        let header = FrameHeader::decode(&out).unwrap();
        assert_eq!(header.payload_len() + LENGTH_HEADER_SIZE, written);
    }

    #[tokio::test]
    async fn test_write_too_long() {
        let mut sink = Trickle::new(usize::MAX, usize::MAX);
        let mut writer =
            SecureWriter::new(&mut sink, &key(), SecureConfig::with_max_message_size(MAX));

        let err = writer.write(&[0u8; MAX + 1]).await.unwrap_err();
        assert!(matches!(
            err,
            TransportError::MessageTooLarge { size: 3073, max: 3072 }
        ));
        assert_eq!(err.bytes_written(), 0);
        drop(writer);
        assert!(sink.accepted.is_empty());
    }

    #[tokio::test]
    async fn test_short_writes_are_retried() {
        let mut sink = Trickle::new(usize::MAX, 3);
        let mut writer = SecureWriter::new(&mut sink, &key(), SecureConfig::default());

        let written = writer.write(b"hello").await.unwrap();
        assert_eq!(written, LENGTH_HEADER_SIZE + SEAL_OVERHEAD + 5);
        drop(writer);
        assert_eq!(sink.accepted.len(), written);
        assert_eq!(&sink.accepted[..LENGTH_HEADER_SIZE], &45u64.to_be_bytes());
    }

    #[tokio::test]
    async fn test_partial_header_write() {
        let mut sink = Trickle::new(5, 2);
        let mut writer = SecureWriter::new(&mut sink, &key(), SecureConfig::default());

        let err = writer.write(b"hello").await.unwrap_err();
        assert!(matches!(err, TransportError::PartialWrite { written: 5, .. }));
        assert_eq!(err.bytes_written(), 5);
        drop(writer);
        assert_eq!(sink.accepted.len(), 5);
    }

    #[tokio::test]
    async fn test_failed_flush_counts_whole_frame() {
        let mut sink = Trickle::new(usize::MAX, usize::MAX);
        sink.flush_fails = true;
        let mut writer = SecureWriter::new(&mut sink, &key(), SecureConfig::default());

        let err = writer.write(b"hello").await.unwrap_err();
        let frame_len = LENGTH_HEADER_SIZE + SEAL_OVERHEAD + 5;
        assert!(matches!(err, TransportError::PartialWrite { written, .. } if written == frame_len));
        assert_eq!(err.bytes_written(), frame_len);
        drop(writer);
        assert_eq!(sink.accepted.len(), frame_len);
    }
}
