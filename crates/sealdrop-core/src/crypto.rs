//! Cipher engine: AES-256-GCM encryption of file payloads.
//!
//! Each upload gets a fresh random key *and* a fresh random nonce, so nonce
//! reuse under one key cannot occur by construction. Decryption is
//! authenticated; a failed tag never yields partial plaintext.

use aes_gcm::{
    aead::{rand_core::RngCore, Aead, KeyInit, OsRng},
    Aes256Gcm, Key, Nonce,
};

use crate::AppError;

pub const KEY_LEN: usize = 32;
pub const NONCE_LEN: usize = 12;

pub type FileKey = [u8; KEY_LEN];
pub type FileNonce = [u8; NONCE_LEN];

/// Ambient randomness, modeled as an injected capability so tests can
/// substitute deterministic bytes without touching process-wide state.
pub trait RandomSource: Send + Sync {
    fn fill(&self, buf: &mut [u8]);
}

/// Production randomness backed by the operating system.
#[derive(Debug, Clone, Copy, Default)]
pub struct OsRandom;

impl RandomSource for OsRandom {
    fn fill(&self, buf: &mut [u8]) {
        OsRng.fill_bytes(buf);
    }
}

/// Authenticated symmetric cipher over file payloads.
#[derive(Debug, Clone)]
pub struct CipherEngine<R: RandomSource = OsRandom> {
    random: R,
}

impl CipherEngine<OsRandom> {
    pub fn new() -> Self {
        Self { random: OsRandom }
    }
}

impl Default for CipherEngine<OsRandom> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R: RandomSource> CipherEngine<R> {
    pub fn with_random(random: R) -> Self {
        Self { random }
    }

    /// Fresh random 256-bit key.
    pub fn generate_key(&self) -> FileKey {
        let mut key = [0u8; KEY_LEN];
        self.random.fill(&mut key);
        key
    }

    /// Fresh random 96-bit nonce, unique per encryption operation.
    pub fn generate_nonce(&self) -> FileNonce {
        let mut nonce = [0u8; NONCE_LEN];
        self.random.fill(&mut nonce);
        nonce
    }

    /// Encrypt `plaintext`; the returned ciphertext carries the GCM tag.
    pub fn encrypt(
        &self,
        key: &FileKey,
        nonce: &FileNonce,
        plaintext: &[u8],
    ) -> Result<Vec<u8>, AppError> {
        let cipher = Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(key));
        cipher
            .encrypt(Nonce::from_slice(nonce), plaintext)
            .map_err(|_| AppError::Internal("Encryption failed".to_string()))
    }

    /// Decrypt and authenticate `ciphertext`. A tag failure is
    /// `AppError::Integrity`; no unauthenticated bytes are ever returned.
    pub fn decrypt(
        &self,
        key: &FileKey,
        nonce: &FileNonce,
        ciphertext: &[u8],
    ) -> Result<Vec<u8>, AppError> {
        let cipher = Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(key));
        cipher
            .decrypt(Nonce::from_slice(nonce), ciphertext)
            .map_err(|_| AppError::Integrity)
    }
}

#[cfg(test)]
pub mod testing {
    use super::RandomSource;

    /// Cycles through a fixed byte pattern. Tests only.
    pub struct FixedRandom(pub Vec<u8>);

    impl RandomSource for FixedRandom {
        fn fill(&self, buf: &mut [u8]) {
            for (i, b) in buf.iter_mut().enumerate() {
                *b = self.0[i % self.0.len()];
            }
        }
    }
}
