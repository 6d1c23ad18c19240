//! Byte stream abstraction

use tokio::io::{AsyncRead, AsyncWrite, DuplexStream};

/// Anything the handshake and the secure codec can run over.
///
/// Reads and writes may complete partially; closing is
/// `AsyncWriteExt::shutdown`. Implemented for `tokio::net::TcpStream` and
/// the in-memory [`MemoryPipe`].
pub trait Duplex: AsyncRead + AsyncWrite + Unpin + Send {}

impl<T> Duplex for T where T: AsyncRead + AsyncWrite + Unpin + Send {}

/// In-memory stream used in place of a socket
pub type MemoryPipe = DuplexStream;

/// Default buffer for [`memory_pipe`], large enough for one full frame
pub const MEMORY_PIPE_CAPACITY: usize = 64 * 1024;

/// Connected pair of in-memory streams
pub fn memory_pipe() -> (MemoryPipe, MemoryPipe) {
    tokio::io::duplex(MEMORY_PIPE_CAPACITY)
}
