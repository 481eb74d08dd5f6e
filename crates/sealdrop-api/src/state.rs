//! Application state shared by all handlers.

use std::sync::Arc;

use sealdrop_core::Config;
use sealdrop_db::FileRepository;
use sealdrop_storage::ScopedUrlSigner;

use crate::services::BotVerifier;

#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub files: FileRepository,
    pub signer: ScopedUrlSigner,
    pub bot_verifier: Arc<dyn BotVerifier>,
    /// Client used to relay ciphertext from the object store to downloaders.
    pub relay: reqwest::Client,
}

fn _assert_app_state_send_sync() {
    fn assert_send<T: Send>() {}
    fn assert_sync<T: Sync>() {}
    assert_send::<AppState>();
    assert_sync::<AppState>();
}
