//! Per-message nonces
//!
//! Nonces are always drawn from the OS random source, never from counters
//! or clocks, so no state has to survive restarts. With 192 random bits a
//! collision under one key is negligible.

use rand::{RngCore, rngs::OsRng};

use crate::{CryptoError, CryptoResult, NONCE_SIZE};

/// Unique input for a single encryption
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Nonce([u8; NONCE_SIZE]);

impl Nonce {
    /// Fresh random nonce
    pub fn generate() -> CryptoResult<Self> {
        let mut bytes = [0u8; NONCE_SIZE];
        OsRng
            .try_fill_bytes(&mut bytes)
            .map_err(|e| CryptoError::RandomSource(e.to_string()))?;
        Ok(Self(bytes))
    }

    /// Parse a nonce from the first 24 bytes of `buf`
    pub fn from_slice(buf: &[u8]) -> CryptoResult<Self> {
        let bytes = buf
            .get(..NONCE_SIZE)
            .ok_or(CryptoError::ShortBuffer {
                needed: NONCE_SIZE,
                actual: buf.len(),
            })?;

        let mut nonce = [0u8; NONCE_SIZE];
        nonce.copy_from_slice(bytes);
        Ok(Self(nonce))
    }

    /// Copy the nonce into the start of `buf`, returning the bytes written
    pub fn write_to(&self, buf: &mut [u8]) -> CryptoResult<usize> {
        let actual = buf.len();
        let dst = buf.get_mut(..NONCE_SIZE).ok_or(CryptoError::ShortBuffer {
            needed: NONCE_SIZE,
            actual,
        })?;
        dst.copy_from_slice(&self.0);
        Ok(NONCE_SIZE)
    }

    /// Raw nonce bytes
    pub fn as_bytes(&self) -> &[u8; NONCE_SIZE] {
        &self.0
    }
}

impl From<[u8; NONCE_SIZE]> for Nonce {
    fn from(bytes: [u8; NONCE_SIZE]) -> Self {
        Self(bytes)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    #[test]
    fn test_generate_non_zero() {
        let nonce = Nonce::generate().unwrap();
        assert_eq!(nonce.as_bytes().len(), 24);
        assert_ne!(nonce.as_bytes(), &[0u8; NONCE_SIZE]);
    }

    #[test]
    fn test_no_collisions() {
        const COUNT: usize = 100_000;

        let mut seen = HashSet::with_capacity(COUNT);
        for _ in 0..COUNT {
            assert!(seen.insert(Nonce::generate().unwrap()), "nonce repeated");
        }
    }

    #[test]
    fn test_from_slice_takes_prefix() {
        let mut buf = [0u8; NONCE_SIZE + 1];
        buf[..5].copy_from_slice(b"hello");
        buf[NONCE_SIZE] = 0xFF;

        let nonce = Nonce::from_slice(&buf).unwrap();

        let mut expected = [0u8; NONCE_SIZE];
        expected[..5].copy_from_slice(b"hello");
        assert_eq!(nonce.as_bytes(), &expected);
    }

    #[test]
    fn test_from_slice_short() {
        let err = Nonce::from_slice(&[0u8; NONCE_SIZE - 1]).unwrap_err();
        assert!(matches!(
            err,
            CryptoError::ShortBuffer {
                needed: 24,
                actual: 23
            }
        ));
    }

    #[test]
    fn test_write_to() {
        let nonce = Nonce::from([0xAB; NONCE_SIZE]);

        let mut buf = [0u8; NONCE_SIZE + 4];
        assert_eq!(nonce.write_to(&mut buf).unwrap(), NONCE_SIZE);
        assert_eq!(&buf[..NONCE_SIZE], nonce.as_bytes());
        assert_eq!(&buf[NONCE_SIZE..], &[0u8; 4]);

        let mut short = [0u8; 10];
        assert!(matches!(
            nonce.write_to(&mut short),
            Err(CryptoError::ShortBuffer { needed: 24, actual: 10 })
        ));
        assert_eq!(short, [0u8; 10]);
    }
}
