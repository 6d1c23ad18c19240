//! Network Transport - sealed byte streams for Sealed Echo
//!
//! Runs the public key handshake over any duplex byte stream, then moves
//! length-framed XChaCha20Poly1305 records over it. `dial` and `serve`
//! wrap the same machinery around TCP.

mod channel;
mod client;
mod error;
mod handshake;
mod reader;
mod server;
mod stream;
mod writer;

pub use channel::*;
pub use client::*;
pub use error::*;
pub use handshake::*;
pub use reader::*;
pub use server::*;
pub use stream::*;
pub use writer::*;

pub use crypto_session::KeyPair;
pub use shared_protocol::{SecureConfig, SessionRole, SessionState};
