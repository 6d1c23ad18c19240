//! Frame length header
//!
//! ```text
//! +----------------+---------------------------------------+
//! | Length (u64 BE)| Nonce (24) | Ciphertext | Tag (16)    |
//! | 8 bytes        | `length` bytes                        |
//! +----------------+---------------------------------------+
//! ```

use bytes::Buf;

use crate::{LENGTH_HEADER_SIZE, ProtocolError, ProtocolResult, SecureConfig};

/// Length prefix of a sealed record
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameHeader {
    /// Number of bytes following the header (nonce + ciphertext + tag)
    pub length: u64,
}

impl FrameHeader {
    /// Header for a sealed payload of `sealed_len` bytes
    pub fn for_sealed(sealed_len: usize) -> Self {
        Self {
            length: sealed_len as u64,
        }
    }

    /// Serialize to the 8-byte big-endian wire form
    pub fn encode(&self) -> [u8; LENGTH_HEADER_SIZE] {
        self.length.to_be_bytes()
    }

    /// Parse the header from the first 8 bytes of `data`
    pub fn decode(mut data: &[u8]) -> ProtocolResult<Self> {
        if data.len() < LENGTH_HEADER_SIZE {
            return Err(ProtocolError::ShortHeader { len: data.len() });
        }
        Ok(Self {
            length: data.get_u64(),
        })
    }

    /// Fail if the declared length is larger than the configuration allows
    pub fn check_limit(&self, config: &SecureConfig) -> ProtocolResult<()> {
        let max = config.max_frame_len();
        if self.length > max {
            return Err(ProtocolError::FrameTooLarge {
                size: self.length,
                max,
            });
        }
        Ok(())
    }

    /// Declared length as a buffer size
    pub fn payload_len(&self) -> usize {
        self.length as usize
    }
}
