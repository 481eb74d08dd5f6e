//! Capability checksum: a short tag binding {object id, key, nonce} together.
//!
//! This is an integrity/binding check, not a secrecy mechanism. A link whose
//! checksum does not match its own id/key/nonce was either corrupted in
//! transit or assembled from mismatched parts, and must be rejected before
//! any decryption is attempted.

use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;

use crate::crypto::{FileKey, FileNonce};
use crate::AppError;

pub const CHECKSUM_LEN: usize = 8;

pub type LinkChecksum = [u8; CHECKSUM_LEN];

/// SHA-256 over `id_bytes || key || nonce`, truncated to the first 8 bytes.
pub fn derive(id: &str, key: &FileKey, nonce: &FileNonce) -> LinkChecksum {
    let mut hasher = Sha256::new();
    hasher.update(id.as_bytes());
    hasher.update(key);
    hasher.update(nonce);
    let digest = hasher.finalize();

    let mut checksum = [0u8; CHECKSUM_LEN];
    checksum.copy_from_slice(&digest[..CHECKSUM_LEN]);
    checksum
}

/// Recompute and compare byte-for-byte. Any mismatch is fatal to the
/// transfer; callers must not fall through to decryption.
pub fn verify(
    id: &str,
    key: &FileKey,
    nonce: &FileNonce,
    expected: &LinkChecksum,
) -> Result<(), AppError> {
    let actual = derive(id, key, nonce);
    if bool::from(actual.ct_eq(expected)) {
        Ok(())
    } else {
        Err(AppError::ChecksumMismatch)
    }
}
