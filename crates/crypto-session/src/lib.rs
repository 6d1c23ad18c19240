//! Crypto Session - key agreement and sealed messages for Sealed Echo
//!
//! Provides X25519 key exchange, HKDF-SHA256 key derivation and
//! XChaCha20Poly1305 authenticated encryption with random 24-byte nonces.

mod error;
mod keypair;
mod nonce;
mod session;

pub use error::*;
pub use keypair::*;
pub use nonce::*;
pub use session::*;

pub use shared_protocol::{KEY_SIZE, NONCE_SIZE, SEAL_OVERHEAD, TAG_SIZE};

/// Public key size (256 bits / 32 bytes)
pub const PUBLIC_KEY_SIZE: usize = KEY_SIZE;

/// Shared secret size (256 bits / 32 bytes)
pub const SHARED_SECRET_SIZE: usize = KEY_SIZE;
