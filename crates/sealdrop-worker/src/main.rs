use std::time::Duration;

use chrono::Utc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use sealdrop_core::Config;
use sealdrop_db::FileRepository;
use sealdrop_storage::{ObjectStoreClient, ScopedUrlSigner};

#[tokio::main]
async fn main() -> Result<(), anyhow::Error> {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env()?;

    let pool = sealdrop_db::connect(&config.database_url, config.db_max_connections).await?;
    let files = FileRepository::new(pool);
    files.ensure_schema().await?;

    let signer = ScopedUrlSigner::from_config(&config)?;
    let store = ObjectStoreClient::new(reqwest::Client::new(), signer);

    tracing::info!(
        interval_secs = config.reconcile_interval_secs,
        "Reconciler started"
    );

    let mut interval = tokio::time::interval(Duration::from_secs(config.reconcile_interval_secs));
    interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            _ = interval.tick() => {
                let now_ms = Utc::now().timestamp_millis();
                // Errors are logged and the next tick retries from scratch.
                if let Err(err) = sealdrop_worker::run_once(&files, &store, now_ms).await {
                    tracing::error!(error = %err, "Reconciliation pass failed");
                }
            }
            _ = shutdown_signal() => {
                tracing::info!("Reconciler shutting down");
                break;
            }
        }
    }

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
