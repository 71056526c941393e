use gtin_sync_models::{SyncError, UploadRecord};
use sqlx::{Row, SqlitePool};
use uuid::Uuid;

/// Append-only history of upload attempts.
#[derive(Clone)]
pub struct UploadLedger {
    pool: SqlitePool,
}

impl UploadLedger {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn record(&self, record: &UploadRecord) -> Result<(), SyncError> {
        sqlx::query(
            "INSERT INTO upload_log (id, dataset_id, gtin, name, product_id, status, error, created_at) VALUES (?, ?, ?, ?, ?, ?, ?, ?)"
        )
        .bind(record.id)
        .bind(record.dataset_id)
        .bind(&record.gtin)
        .bind(&record.name)
        .bind(record.product_id.map(|id| id as i64))
        .bind(&record.status)
        .bind(&record.error)
        .bind(record.created_at)
        .execute(&self.pool)
        .await
        .map_err(SyncError::SqlxError)?;
        Ok(())
    }

    /// Newest first.
    pub async fn list(
        &self,
        dataset_id: Option<Uuid>,
        limit: i64,
    ) -> Result<Vec<UploadRecord>, SyncError> {
        let rows = match dataset_id {
            Some(dataset_id) => {
                sqlx::query(
                    "SELECT * FROM upload_log WHERE dataset_id = ? ORDER BY rowid DESC LIMIT ?",
                )
                .bind(dataset_id)
                .bind(limit)
                .fetch_all(&self.pool)
                .await
            }
            None => {
                sqlx::query("SELECT * FROM upload_log ORDER BY rowid DESC LIMIT ?")
                    .bind(limit)
                    .fetch_all(&self.pool)
                    .await
            }
        }
        .map_err(SyncError::SqlxError)?;

        let mut records = Vec::with_capacity(rows.len());
        for row in rows.iter() {
            let product_id: Option<i64> =
                row.try_get("product_id").map_err(SyncError::SqlxError)?;
            records.push(UploadRecord {
                id: row.try_get("id").map_err(SyncError::SqlxError)?,
                dataset_id: row.try_get("dataset_id").map_err(SyncError::SqlxError)?,
                gtin: row.try_get("gtin").map_err(SyncError::SqlxError)?,
                name: row.try_get("name").map_err(SyncError::SqlxError)?,
                product_id: product_id.map(|id| id as u64),
                status: row.try_get("status").map_err(SyncError::SqlxError)?,
                error: row.try_get("error").map_err(SyncError::SqlxError)?,
                created_at: row.try_get("created_at").map_err(SyncError::SqlxError)?,
            });
        }
        Ok(records)
    }
}
