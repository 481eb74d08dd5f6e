//! Client-side transfer engine for Sealdrop.
//!
//! All key material lives here. The engine encrypts before anything leaves
//! the caller's process, builds the capability link whose fragment carries
//! the key, and on download verifies the link checksum before it will touch
//! the ciphertext with the key. The server side of these flows only ever
//! sees ciphertext and metadata.

pub mod download;
pub mod format;
pub mod state;
pub mod transport;
pub mod upload;

#[cfg(test)]
pub(crate) mod test_support;

pub use download::{DownloadOutcome, Downloader};
pub use state::{DownloadState, UploadState};
pub use transport::{
    ApiTransport, CreateUploadRequest, CreateUploadResponse, HttpTransport,
};
pub use upload::{UploadOutcome, Uploader};
