//! Error types module
//!
//! All errors are unified under the `AppError` enum, which covers database,
//! storage, validation, crypto-integrity, and signing failures. Each variant
//! self-describes its HTTP presentation through the `ErrorMetadata` trait so
//! the API crate can render a consistent response shape.

use std::io;

use sqlx::Error as SqlxError;

/// Log level for error reporting
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    /// Debug level - for expected errors like validation failures
    Debug,
    /// Warning level - for recoverable issues
    Warn,
    /// Error level - for unexpected failures
    Error,
}

/// Metadata for error responses - defines how an error should be presented
pub trait ErrorMetadata {
    /// HTTP status code to return
    fn http_status_code(&self) -> u16;

    /// Machine-readable error code (e.g., "SIGNING_ERROR")
    fn error_code(&self) -> &'static str;

    /// Whether this error is recoverable (can be retried)
    fn is_recoverable(&self) -> bool;

    /// Client-facing message (may differ from internal error message)
    fn client_message(&self) -> String;

    /// Whether details should be hidden in production
    fn is_sensitive(&self) -> bool;

    /// Log level for this error
    fn log_level(&self) -> LogLevel;
}

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Database error: {0}")]
    Database(#[source] SqlxError),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Bot verification failed")]
    BotCheckFailed,

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Integrity check failed: ciphertext did not authenticate")]
    Integrity,

    #[error("Capability checksum mismatch")]
    ChecksumMismatch,

    #[error("Malformed capability link: {0}")]
    MalformedLink(String),

    #[error("Signing error: {0}")]
    Signing(String),

    #[error("Could not parse delete confirmation: {0}")]
    ReconciliationParse(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<SqlxError> for AppError {
    fn from(err: SqlxError) -> Self {
        AppError::Database(err)
    }
}

impl From<io::Error> for AppError {
    fn from(err: io::Error) -> Self {
        AppError::Internal(format!("IO error: {}", err))
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::InvalidInput(format!("JSON parsing error: {}", err))
    }
}

/// Static metadata for each variant: (http_status, error_code, recoverable, sensitive, log_level).
/// client_message stays per-variant for dynamic content.
fn app_error_static_metadata(err: &AppError) -> (u16, &'static str, bool, bool, LogLevel) {
    match err {
        AppError::Database(_) => (500, "DATABASE_ERROR", true, true, LogLevel::Error),
        AppError::Storage(_) => (500, "STORAGE_ERROR", true, true, LogLevel::Error),
        AppError::InvalidInput(_) => (400, "INVALID_INPUT", false, false, LogLevel::Debug),
        AppError::BotCheckFailed => (403, "BOT_CHECK_FAILED", false, false, LogLevel::Debug),
        AppError::NotFound(_) => (404, "NOT_FOUND", false, false, LogLevel::Debug),
        // Integrity-class failures are terminal for the transfer and must
        // never be retried automatically.
        AppError::Integrity => (400, "INTEGRITY_ERROR", false, false, LogLevel::Warn),
        AppError::ChecksumMismatch => (400, "CHECKSUM_MISMATCH", false, false, LogLevel::Warn),
        AppError::MalformedLink(_) => (400, "MALFORMED_LINK", false, false, LogLevel::Debug),
        AppError::Signing(_) => (500, "SIGNING_ERROR", false, true, LogLevel::Error),
        AppError::ReconciliationParse(_) => (
            500,
            "RECONCILIATION_PARSE_ERROR",
            true,
            true,
            LogLevel::Error,
        ),
        AppError::Internal(_) => (500, "INTERNAL_ERROR", true, true, LogLevel::Error),
    }
}

impl AppError {
    /// Get the error type name for detailed error responses
    pub fn error_type(&self) -> &'static str {
        match self {
            AppError::Database(_) => "Database",
            AppError::Storage(_) => "Storage",
            AppError::InvalidInput(_) => "InvalidInput",
            AppError::BotCheckFailed => "BotCheckFailed",
            AppError::NotFound(_) => "NotFound",
            AppError::Integrity => "Integrity",
            AppError::ChecksumMismatch => "ChecksumMismatch",
            AppError::MalformedLink(_) => "MalformedLink",
            AppError::Signing(_) => "Signing",
            AppError::ReconciliationParse(_) => "ReconciliationParse",
            AppError::Internal(_) => "Internal",
        }
    }

    /// Get detailed error information including the source chain
    pub fn detailed_message(&self) -> String {
        use std::error::Error;

        let mut details = self.to_string();

        let mut source = self.source();
        let mut depth = 0;
        while let Some(err) = source {
            depth += 1;
            if depth > 5 {
                details.push_str("\n  ... (truncated)");
                break;
            }
            details.push_str(&format!("\n  Caused by: {}", err));
            source = err.source();
        }

        details
    }
}

impl ErrorMetadata for AppError {
    fn http_status_code(&self) -> u16 {
        app_error_static_metadata(self).0
    }

    fn error_code(&self) -> &'static str {
        app_error_static_metadata(self).1
    }

    fn is_recoverable(&self) -> bool {
        app_error_static_metadata(self).2
    }

    fn is_sensitive(&self) -> bool {
        app_error_static_metadata(self).3
    }

    fn log_level(&self) -> LogLevel {
        app_error_static_metadata(self).4
    }

    fn client_message(&self) -> String {
        match self {
            AppError::Database(_) => "Failed to access database".to_string(),
            AppError::Storage(_) => "Failed to access storage".to_string(),
            AppError::InvalidInput(msg) => msg.clone(),
            AppError::BotCheckFailed => "Failed bot verification".to_string(),
            // Expired and never-existed are deliberately indistinguishable.
            AppError::NotFound(_) => "Not found".to_string(),
            AppError::Integrity => {
                "The file could not be decrypted. The link may be corrupted.".to_string()
            }
            AppError::ChecksumMismatch => {
                "This link does not match the file it points to. Request a new link.".to_string()
            }
            AppError::MalformedLink(_) => {
                "The download link is incomplete or damaged. Request a new link.".to_string()
            }
            AppError::Signing(_) => "Internal server error".to_string(),
            AppError::ReconciliationParse(_) => "Internal server error".to_string(),
            AppError::Internal(_) => "Internal server error".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_metadata_not_found() {
        let err = AppError::NotFound("file abc".to_string());
        assert_eq!(err.http_status_code(), 404);
        assert_eq!(err.error_code(), "NOT_FOUND");
        assert!(!err.is_recoverable());
        // Must not leak whether the id ever existed.
        assert_eq!(err.client_message(), "Not found");
        assert_eq!(err.log_level(), LogLevel::Debug);
    }

    #[test]
    fn test_error_metadata_bot_check() {
        let err = AppError::BotCheckFailed;
        assert_eq!(err.http_status_code(), 403);
        assert_eq!(err.error_code(), "BOT_CHECK_FAILED");
        assert!(!err.is_recoverable());
    }

    #[test]
    fn test_integrity_errors_are_not_recoverable() {
        for err in [AppError::Integrity, AppError::ChecksumMismatch] {
            assert!(!err.is_recoverable(), "{:?} must not be retried", err);
        }
    }

    #[test]
    fn test_error_metadata_signing_is_sensitive() {
        let err = AppError::Signing("missing credentials".to_string());
        assert_eq!(err.http_status_code(), 500);
        assert!(err.is_sensitive());
        assert_eq!(err.client_message(), "Internal server error");
        assert_eq!(err.log_level(), LogLevel::Error);
    }

    #[test]
    fn test_error_metadata_database() {
        let err = AppError::from(sqlx::Error::PoolClosed);
        assert_eq!(err.http_status_code(), 500);
        assert_eq!(err.error_code(), "DATABASE_ERROR");
        assert!(err.is_recoverable());
        assert!(err.is_sensitive());
    }
}
