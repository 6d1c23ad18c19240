//! Sealed message session with XChaCha20Poly1305

use chacha20poly1305::{
    Key, XChaCha20Poly1305, XNonce,
    aead::{Aead, KeyInit},
};

use crate::{CryptoError, CryptoResult, NONCE_SIZE, Nonce, SEAL_OVERHEAD, SharedKey};

/// Established cryptographic session
///
/// Holds the cipher for one shared key for the lifetime of a connection.
/// Sealed payloads are self-describing: `[24-byte nonce][ciphertext][16-byte tag]`.
#[derive(Clone)]
pub struct CryptoSession {
    /// Cipher keyed by the shared key
    cipher: XChaCha20Poly1305,
    /// Messages sealed so far
    sealed_count: u64,
    /// Messages opened so far
    opened_count: u64,
}

impl CryptoSession {
    /// Create a new session from a derived shared key
    pub fn new(shared_key: &SharedKey) -> Self {
        let cipher = XChaCha20Poly1305::new(Key::from_slice(shared_key.as_bytes()));
        Self {
            cipher,
            sealed_count: 0,
            opened_count: 0,
        }
    }

    /// Seal `plaintext` under a fresh random nonce
    ///
    /// Returns: [nonce][ciphertext][16-byte auth tag]
    pub fn seal(&mut self, plaintext: &[u8]) -> CryptoResult<Vec<u8>> {
        let nonce = Nonce::generate()?;
        self.seal_with_nonce(&nonce, plaintext)
    }

    /// Seal under a caller-chosen nonce. The nonce must never repeat for
    /// this key.
    pub fn seal_with_nonce(&mut self, nonce: &Nonce, plaintext: &[u8]) -> CryptoResult<Vec<u8>> {
        let ciphertext = self
            .cipher
            .encrypt(XNonce::from_slice(nonce.as_bytes()), plaintext)
            .map_err(|e| CryptoError::Encryption(e.to_string()))?;

        let mut sealed = Vec::with_capacity(plaintext.len() + SEAL_OVERHEAD);
        sealed.extend_from_slice(nonce.as_bytes());
        sealed.extend_from_slice(&ciphertext);

        self.sealed_count += 1;

        Ok(sealed)
    }

    /// Authenticate and decrypt a sealed payload
    ///
    /// Anything too short to hold a nonce and tag is treated like any other
    /// corrupted record.
    pub fn open(&mut self, sealed: &[u8]) -> CryptoResult<Vec<u8>> {
        if sealed.len() < SEAL_OVERHEAD {
            return Err(CryptoError::DecryptionFailed);
        }
        let nonce = Nonce::from_slice(sealed)?;
        let ciphertext = &sealed[NONCE_SIZE..];

        let plaintext = self
            .cipher
            .decrypt(XNonce::from_slice(nonce.as_bytes()), ciphertext)
            .map_err(|_| CryptoError::DecryptionFailed)?;

        self.opened_count += 1;

        Ok(plaintext)
    }

    /// Messages sealed by this session (for debugging/stats)
    pub fn sealed_count(&self) -> u64 {
        self.sealed_count
    }

    /// Messages opened by this session (for debugging/stats)
    pub fn opened_count(&self) -> u64 {
        self.opened_count
    }
}
