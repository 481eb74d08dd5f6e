use std::collections::HashSet;

use sealdrop_core::AppError;
use sealdrop_db::FileRepository;
use sealdrop_storage::ObjectStoreDelete;

/// Counters from one reconciliation pass.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ReconcileOutcome {
    /// Expired rows found in metadata.
    pub candidates: usize,
    /// Deletions the object store confirmed.
    pub confirmed: usize,
    /// Metadata rows removed.
    pub rows_deleted: u64,
}

/// One reconciliation pass at the given clock reading.
///
/// Confirmed-subset semantics: of N expired candidates, the store may
/// confirm any subset M. Exactly the rows in M are deleted; the other
/// N - M stay for a future run. A store or parse failure propagates
/// before any metadata mutation.
pub async fn run_once(
    files: &FileRepository,
    store: &dyn ObjectStoreDelete,
    now_ms: i64,
) -> Result<ReconcileOutcome, AppError> {
    let expired = files.find_expired_ids(now_ms).await?;
    if expired.is_empty() {
        return Ok(ReconcileOutcome::default());
    }

    tracing::info!(candidates = expired.len(), "Reconciling expired files");

    let confirmed = store.delete_objects(&expired).await?;

    // Trust only confirmations for ids we actually asked about.
    let requested: HashSet<&str> = expired.iter().map(String::as_str).collect();
    let confirmed: Vec<String> = confirmed
        .into_iter()
        .filter(|id| requested.contains(id.as_str()))
        .collect();

    let rows_deleted = files.delete_ids(&confirmed).await?;

    let outcome = ReconcileOutcome {
        candidates: expired.len(),
        confirmed: confirmed.len(),
        rows_deleted,
    };
    tracing::info!(
        candidates = outcome.candidates,
        confirmed = outcome.confirmed,
        rows_deleted = outcome.rows_deleted,
        "Reconciliation pass complete"
    );

    Ok(outcome)
}
