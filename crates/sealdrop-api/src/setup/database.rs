//! Database setup

use anyhow::{Context, Result};

use sealdrop_core::Config;
use sealdrop_db::SqlitePool;

/// Connect the metadata pool.
pub async fn setup_database(config: &Config) -> Result<SqlitePool> {
    let pool = sealdrop_db::connect(&config.database_url, config.db_max_connections)
        .await
        .context("Failed to connect to database")?;

    tracing::info!(
        max_connections = config.db_max_connections,
        "Database pool ready"
    );

    Ok(pool)
}
