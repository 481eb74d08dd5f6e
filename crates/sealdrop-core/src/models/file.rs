//! Persisted file metadata.

use serde::{Deserialize, Serialize};

use crate::AppError;

/// Display names longer than this are rejected at upload time.
pub const MAX_NAME_LEN: usize = 260;

/// Retention bounds, in hours.
pub const MIN_EXPIRY_HOURS: i64 = 1;
pub const MAX_EXPIRY_HOURS: i64 = 168;

pub const MILLIS_PER_HOUR: i64 = 60 * 60 * 1000;

/// One row in the `file` table. Created atomically with credential issuance,
/// read-only afterward, deleted exactly once by the reconciler after the
/// object store confirms removal. Timestamps are milliseconds since epoch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileRecord {
    /// Opaque unique id; doubles as the object-store key.
    pub id: String,
    /// Untrusted display name supplied by the uploader.
    pub name: String,
    /// Declared byte length. An upper bound, not a verified count.
    pub size: i64,
    pub created_at: i64,
    pub expires_at: i64,
}

impl FileRecord {
    pub fn is_expired(&self, now_ms: i64) -> bool {
        self.expires_at <= now_ms
    }
}

/// Public subset returned by the file-info endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileInfo {
    pub name: String,
    pub size: i64,
}

/// Validate the client-declared upload parameters. The declared size is
/// trusted only as an upper bound handed to the object store.
pub fn validate_upload(
    name: &str,
    size: i64,
    expiry_hours: i64,
    max_size_bytes: i64,
) -> Result<(), AppError> {
    if name.chars().count() > MAX_NAME_LEN {
        return Err(AppError::InvalidInput(format!(
            "name exceeds {} characters",
            MAX_NAME_LEN
        )));
    }
    if size < 0 {
        return Err(AppError::InvalidInput("size must not be negative".to_string()));
    }
    if size > max_size_bytes {
        return Err(AppError::InvalidInput(format!(
            "size {} exceeds the maximum of {} bytes",
            size, max_size_bytes
        )));
    }
    if !(MIN_EXPIRY_HOURS..=MAX_EXPIRY_HOURS).contains(&expiry_hours) {
        return Err(AppError::InvalidInput(format!(
            "expiryTimeHours must be between {} and {}",
            MIN_EXPIRY_HOURS, MAX_EXPIRY_HOURS
        )));
    }
    Ok(())
}
