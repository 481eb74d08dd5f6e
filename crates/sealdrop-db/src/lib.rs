//! Metadata store for Sealdrop.
//!
//! The metadata store exclusively owns `file` rows; ciphertext blobs live in
//! the object store, keyed by the same id. All access goes through
//! [`FileRepository`] with atomic single-row operations. The reconciliation
//! protocol is designed to be re-run to fixpoint, so no cross-store
//! transaction is needed.

mod file;

pub use file::FileRepository;
pub use sqlx::SqlitePool;

use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use std::str::FromStr;

use sealdrop_core::AppError;

/// Open (and create if missing) the SQLite database behind `database_url`.
pub async fn connect(database_url: &str, max_connections: u32) -> Result<SqlitePool, AppError> {
    let options = SqliteConnectOptions::from_str(database_url)
        .map_err(AppError::Database)?
        .create_if_missing(true);

    let pool = SqlitePoolOptions::new()
        .max_connections(max_connections)
        .connect_with(options)
        .await?;

    Ok(pool)
}
