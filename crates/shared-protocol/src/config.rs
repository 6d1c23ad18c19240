//! Transport configuration

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::{DEFAULT_MAX_MESSAGE_SIZE, ProtocolError, ProtocolResult, SEAL_OVERHEAD};

/// Default upper bound on the public key exchange
pub const DEFAULT_HANDSHAKE_TIMEOUT: Duration = Duration::from_secs(10);

/// Secure transport configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SecureConfig {
    /// Largest plaintext accepted by a single write, and the largest
    /// plaintext a peer may announce in a frame
    pub max_message_size: usize,
    /// Time allowed for the key exchange before the connection is dropped
    #[serde(with = "duration_secs")]
    pub handshake_timeout: Duration,
}

impl Default for SecureConfig {
    fn default() -> Self {
        Self {
            max_message_size: DEFAULT_MAX_MESSAGE_SIZE,
            handshake_timeout: DEFAULT_HANDSHAKE_TIMEOUT,
        }
    }
}

impl SecureConfig {
    /// Configuration with a custom message size cap
    pub fn with_max_message_size(max_message_size: usize) -> Self {
        Self {
            max_message_size,
            ..Self::default()
        }
    }

    /// Largest value a frame's length header may carry
    pub fn max_frame_len(&self) -> u64 {
        (self.max_message_size as u64).saturating_add(SEAL_OVERHEAD as u64)
    }

    /// Reject configurations no connection could work with
    pub fn validate(&self) -> ProtocolResult<()> {
        if self.max_message_size == 0 {
            return Err(ProtocolError::InvalidConfig(
                "max_message_size must be greater than zero".to_string(),
            ));
        }
        if self.handshake_timeout.is_zero() {
            return Err(ProtocolError::InvalidConfig(
                "handshake_timeout must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}

mod duration_secs {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(value.as_secs())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_secs)
    }
}
