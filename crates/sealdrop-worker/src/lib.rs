//! Expiry reconciliation for Sealdrop.
//!
//! Deletion order is fixed: object store first, then metadata, and only for
//! ids the store explicitly confirmed. A row that outlives its blob is
//! harmless (it 404s and is retried next run); a blob that outlives its row
//! would be an orphan nothing can ever delete again.

pub mod reconciler;

pub use reconciler::{run_once, ReconcileOutcome};
