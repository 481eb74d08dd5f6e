use sqlx::{Row, SqlitePool};

use sealdrop_core::models::FileRecord;
use sealdrop_core::AppError;

/// Repository for file metadata rows.
#[derive(Clone)]
pub struct FileRepository {
    pool: SqlitePool,
}

impl FileRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Create the `file` table if it does not exist. Timestamps are
    /// milliseconds since epoch.
    pub async fn ensure_schema(&self) -> Result<(), AppError> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS file (
                id TEXT PRIMARY KEY,
                name TEXT,
                size INTEGER,
                created_at INTEGER,
                expires_at INTEGER
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Insert a new record. Rows are insert-once; the primary key rejects a
    /// colliding id rather than silently overwriting.
    pub async fn insert(&self, record: &FileRecord) -> Result<(), AppError> {
        sqlx::query(
            r#"
            INSERT INTO file (id, name, size, created_at, expires_at)
            VALUES (?, ?, ?, ?, ?)
            "#,
        )
        .bind(&record.id)
        .bind(&record.name)
        .bind(record.size)
        .bind(record.created_at)
        .bind(record.expires_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Look up a record that is still live. The `expires_at > now` predicate
    /// is authoritative: an expired-but-not-yet-reconciled row is treated as
    /// already gone.
    pub async fn find_active(
        &self,
        id: &str,
        now_ms: i64,
    ) -> Result<Option<FileRecord>, AppError> {
        let row = sqlx::query(
            r#"
            SELECT id, name, size, created_at, expires_at
            FROM file
            WHERE id = ? AND expires_at > ?
            "#,
        )
        .bind(id)
        .bind(now_ms)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|row| FileRecord {
            id: row.get("id"),
            name: row.get("name"),
            size: row.get("size"),
            created_at: row.get("created_at"),
            expires_at: row.get("expires_at"),
        }))
    }

    /// Ids of every expired row, oldest first. Candidates for reconciliation.
    pub async fn find_expired_ids(&self, now_ms: i64) -> Result<Vec<String>, AppError> {
        let rows = sqlx::query(
            r#"
            SELECT id FROM file
            WHERE expires_at < ?
            ORDER BY expires_at
            "#,
        )
        .bind(now_ms)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(|row| row.get("id")).collect())
    }

    /// Delete exactly the given rows. Called only with ids the object store
    /// has confirmed deleted; unconfirmed rows must stay for a future run.
    pub async fn delete_ids(&self, ids: &[String]) -> Result<u64, AppError> {
        if ids.is_empty() {
            return Ok(0);
        }

        let placeholders = vec!["?"; ids.len()].join(", ");
        let sql = format!("DELETE FROM file WHERE id IN ({})", placeholders);

        let mut query = sqlx::query(&sql);
        for id in ids {
            query = query.bind(id);
        }

        let result = query.execute(&self.pool).await?;
        Ok(result.rows_affected())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    async fn repo() -> FileRepository {
        let pool = crate::connect("sqlite::memory:", 1).await.unwrap();
        let repo = FileRepository::new(pool);
        repo.ensure_schema().await.unwrap();
        repo
    }

    fn record(id: &str, expires_at: i64) -> FileRecord {
        FileRecord {
            id: id.to_string(),
            name: "notes.txt".to_string(),
            size: 10,
            created_at: 1_000,
            expires_at,
        }
    }

    #[tokio::test]
    async fn test_insert_and_find_active() {
        let repo = repo().await;
        repo.insert(&record("a", 5_000)).await.unwrap();

        let found = repo.find_active("a", 4_999).await.unwrap().unwrap();
        assert_eq!(found.name, "notes.txt");
        assert_eq!(found.size, 10);
    }

    #[tokio::test]
    async fn test_expired_row_is_invisible_to_find_active() {
        let repo = repo().await;
        repo.insert(&record("a", 5_000)).await.unwrap();

        // expires_at == now is already gone.
        assert!(repo.find_active("a", 5_000).await.unwrap().is_none());
        assert!(repo.find_active("a", 6_000).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_unknown_id_is_none() {
        let repo = repo().await;
        assert!(repo.find_active("missing", 0).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_duplicate_id_rejected() {
        let repo = repo().await;
        repo.insert(&record("a", 5_000)).await.unwrap();
        assert!(repo.insert(&record("a", 9_000)).await.is_err());
    }

    #[tokio::test]
    async fn test_find_expired_ids() {
        let repo = repo().await;
        repo.insert(&record("old", 1_000)).await.unwrap();
        repo.insert(&record("older", 500)).await.unwrap();
        repo.insert(&record("live", 10_000)).await.unwrap();

        let expired = repo.find_expired_ids(2_000).await.unwrap();
        assert_eq!(expired, vec!["older".to_string(), "old".to_string()]);
    }

    #[tokio::test]
    async fn test_delete_ids_removes_only_named_rows() {
        let repo = repo().await;
        for id in ["a", "b", "c"] {
            repo.insert(&record(id, 1_000)).await.unwrap();
        }

        let deleted = repo
            .delete_ids(&["a".to_string(), "c".to_string()])
            .await
            .unwrap();
        assert_eq!(deleted, 2);

        let remaining = repo.find_expired_ids(2_000).await.unwrap();
        assert_eq!(remaining, vec!["b".to_string()]);
    }

    #[tokio::test]
    async fn test_delete_ids_empty_is_noop() {
        let repo = repo().await;
        assert_eq!(repo.delete_ids(&[]).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_concurrent_inserts_get_distinct_ids() {
        // Ids are drawn from a 122-bit random space; two inserts in the same
        // millisecond must still be distinct rows.
        let repo = repo().await;
        let a = Uuid::new_v4().to_string();
        let b = Uuid::new_v4().to_string();
        assert_ne!(a, b);

        let rec_a = record(&a, 5_000);
        let rec_b = record(&b, 5_000);
        let (ra, rb) = tokio::join!(repo.insert(&rec_a), repo.insert(&rec_b),);
        ra.unwrap();
        rb.unwrap();

        assert!(repo.find_active(&a, 0).await.unwrap().is_some());
        assert!(repo.find_active(&b, 0).await.unwrap().is_some());
    }
}
