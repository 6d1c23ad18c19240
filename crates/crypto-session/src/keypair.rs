//! Long-lived X25519 key material and shared key derivation

use hkdf::Hkdf;
use rand::{RngCore, rngs::OsRng};
use sha2::Sha256;
use tracing::debug;
use x25519_dalek::{PublicKey, SharedSecret, StaticSecret};
use zeroize::{Zeroize, ZeroizeOnDrop, Zeroizing};

use crate::{CryptoError, CryptoResult, KEY_SIZE, PUBLIC_KEY_SIZE, SHARED_SECRET_SIZE};

/// HKDF info label binding derived keys to this protocol
const SHARED_KEY_LABEL: &[u8] = b"sealed-echo shared key v1";

/// Symmetric key agreed by both peers
#[derive(Clone, PartialEq, Eq, Zeroize, ZeroizeOnDrop)]
pub struct SharedKey([u8; SHARED_SECRET_SIZE]);

impl SharedKey {
    /// Wrap raw key bytes
    pub fn from_bytes(bytes: [u8; SHARED_SECRET_SIZE]) -> Self {
        Self(bytes)
    }

    /// Raw key bytes
    pub fn as_bytes(&self) -> &[u8; SHARED_SECRET_SIZE] {
        &self.0
    }
}

impl std::fmt::Debug for SharedKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("SharedKey(..)")
    }
}

/// Derive the shared key for a peer's public key and our private key.
///
/// Runs X25519 and feeds the result through HKDF-SHA256. Both sides reach
/// the same key: `shared_key(pub_a, priv_b) == shared_key(pub_b, priv_a)`.
pub fn shared_key(peer_public: &[u8; PUBLIC_KEY_SIZE], own_secret: &[u8; KEY_SIZE]) -> SharedKey {
    let secret = StaticSecret::from(*own_secret);
    derive(&secret, &PublicKey::from(*peer_public))
}

fn derive(secret: &StaticSecret, peer_public: &PublicKey) -> SharedKey {
    expand(&secret.diffie_hellman(peer_public))
}

fn expand(dh: &SharedSecret) -> SharedKey {
    let hkdf = Hkdf::<Sha256>::new(None, dh.as_bytes());

    let mut okm = [0u8; SHARED_SECRET_SIZE];
    let Ok(()) = hkdf.expand(SHARED_KEY_LABEL, &mut okm) else {
        unreachable!("32 bytes is a valid HKDF-SHA256 output length");
    };
    SharedKey(okm)
}

/// Our key pair plus, once the handshake has run, the peer's public key
pub struct KeyPair {
    secret: StaticSecret,
    public: PublicKey,
    peer_public: Option<PublicKey>,
}

impl KeyPair {
    /// Generate a new key pair from the OS random source
    pub fn generate() -> CryptoResult<Self> {
        let mut bytes = Zeroizing::new([0u8; KEY_SIZE]);
        OsRng
            .try_fill_bytes(&mut bytes[..])
            .map_err(|e| CryptoError::KeyGeneration(e.to_string()))?;

        let keypair = Self::from_secret_bytes(*bytes);
        debug!("Generated key pair");
        Ok(keypair)
    }

    /// Build a key pair from known private key bytes
    pub fn from_secret_bytes(secret: [u8; KEY_SIZE]) -> Self {
        let secret = StaticSecret::from(secret);
        let public = PublicKey::from(&secret);
        Self {
            secret,
            public,
            peer_public: None,
        }
    }

    /// Independent copy of our keys for a single connection.
    ///
    /// The copy never carries a peer key, so connections cannot observe
    /// each other's handshake results.
    pub fn copy_for_connection(&self) -> Self {
        Self {
            secret: self.secret.clone(),
            public: self.public,
            peer_public: None,
        }
    }

    /// Get the public key bytes
    pub fn public_key_bytes(&self) -> [u8; PUBLIC_KEY_SIZE] {
        *self.public.as_bytes()
    }

    /// Peer's public key, if the exchange has happened
    pub fn peer_public_key(&self) -> Option<[u8; PUBLIC_KEY_SIZE]> {
        self.peer_public.map(|key| *key.as_bytes())
    }

    /// Record the peer's public key
    pub fn set_peer_public_key(&mut self, peer_public: [u8; PUBLIC_KEY_SIZE]) {
        self.peer_public = Some(PublicKey::from(peer_public));
    }

    /// Shared key with an arbitrary peer public key
    pub fn shared_key_with(&self, peer_public: &[u8; PUBLIC_KEY_SIZE]) -> SharedKey {
        derive(&self.secret, &PublicKey::from(*peer_public))
    }

    /// Shared key with the peer recorded by the exchange.
    ///
    /// Rejects low-order peer keys, which would force an all-zero
    /// Diffie-Hellman output regardless of our secret.
    pub fn peer_shared_key(&self) -> CryptoResult<SharedKey> {
        let peer_public = self.peer_public.as_ref().ok_or(CryptoError::PeerKeyMissing)?;
        let dh = self.secret.diffie_hellman(peer_public);
        if !dh.was_contributory() {
            return Err(CryptoError::InvalidPublicKey);
        }
        Ok(expand(&dh))
    }
}

impl std::fmt::Debug for KeyPair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeyPair")
            .field("public", self.public.as_bytes())
            .field("peer_public", &self.peer_public.map(|key| *key.as_bytes()))
            .finish_non_exhaustive()
    }
}
