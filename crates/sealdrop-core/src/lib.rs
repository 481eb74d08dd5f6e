//! Core types for Sealdrop: configuration, errors, the cipher engine,
//! the capability checksum, the link codec, and the persisted models.
//!
//! Everything here is transport-agnostic; the api, worker, and client
//! crates compose these pieces.

pub mod checksum;
pub mod config;
pub mod crypto;
pub mod error;
pub mod link;
pub mod models;

pub use config::Config;
pub use error::{AppError, ErrorMetadata, LogLevel};
