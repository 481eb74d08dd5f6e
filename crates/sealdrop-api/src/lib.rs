//! HTTP API for Sealdrop.
//!
//! Three endpoints: create-upload (mint metadata plus a scoped PUT
//! credential), download (relay ciphertext fetched with a scoped GET
//! credential), and file-info (public metadata). The server never sees key
//! material; that lives in the link fragment on the client side.

pub mod error;
pub mod handlers;
pub mod services;
pub mod setup;
pub mod state;
