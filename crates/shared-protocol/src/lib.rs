//! Shared Protocol Definitions for Sealed Echo
//!
//! Wire constants, the frame length header, the per-connection session
//! state machine and the configuration shared by every crate in the
//! workspace.

mod config;
mod error;
mod frame;
mod session;

pub use config::*;
pub use error::*;
pub use frame::*;
pub use session::*;

/// Size of a public, private or shared key (256 bits / 32 bytes)
pub const KEY_SIZE: usize = 32;

/// Nonce size for XChaCha20Poly1305 (192 bits / 24 bytes)
pub const NONCE_SIZE: usize = 24;

/// Authentication tag size (128 bits / 16 bytes)
pub const TAG_SIZE: usize = 16;

/// Size of the big-endian length prefix in front of every frame
pub const LENGTH_HEADER_SIZE: usize = 8;

/// Bytes a sealed payload adds on top of the plaintext
pub const SEAL_OVERHEAD: usize = NONCE_SIZE + TAG_SIZE;

/// Default maximum plaintext size of a single message (32 KiB)
pub const DEFAULT_MAX_MESSAGE_SIZE: usize = 32 * 1024;

/// Message size cap used by early deployments of the protocol
pub const LEGACY_MAX_MESSAGE_SIZE: usize = 3072;
