//! Application setup and initialization
//!
//! All initialization logic lives here rather than in main.rs so integration
//! tests can assemble the same router against fakes.

pub mod database;
pub mod routes;
pub mod server;

use std::sync::Arc;

use anyhow::{Context, Result};

use sealdrop_core::Config;
use sealdrop_db::FileRepository;
use sealdrop_storage::ScopedUrlSigner;

use crate::services::TurnstileVerifier;
use crate::state::AppState;

/// Initialize the entire application: database, signer, bot check, routes.
pub async fn initialize_app(config: Config) -> Result<(Arc<AppState>, axum::Router)> {
    let pool = database::setup_database(&config).await?;
    let files = FileRepository::new(pool);
    files
        .ensure_schema()
        .await
        .context("Failed to prepare database schema")?;

    let signer =
        ScopedUrlSigner::from_config(&config).context("Failed to build credential signer")?;

    let http = reqwest::Client::new();
    let bot_verifier = Arc::new(TurnstileVerifier::new(http.clone(), &config.turnstile_secret));

    let state = Arc::new(AppState {
        config: config.clone(),
        files,
        signer,
        bot_verifier,
        relay: http,
    });

    let router = routes::setup_routes(&config, state.clone());

    Ok((state, router))
}
