//! Crypto session error types

use thiserror::Error;

/// Cryptographic operation error
#[derive(Debug, Error)]
pub enum CryptoError {
    #[error("Key generation failed: {0}")]
    KeyGeneration(String),

    #[error("Random source unavailable: {0}")]
    RandomSource(String),

    #[error("Encryption failed: {0}")]
    Encryption(String),

    #[error("Decryption failed: authentication tag mismatch")]
    DecryptionFailed,

    #[error("Buffer too short: need {needed} bytes, got {actual}")]
    ShortBuffer { needed: usize, actual: usize },

    #[error("Peer public key not received")]
    PeerKeyMissing,

    #[error("Invalid public key")]
    InvalidPublicKey,
}

pub type CryptoResult<T> = Result<T, CryptoError>;
