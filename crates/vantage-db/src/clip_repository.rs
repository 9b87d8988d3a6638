use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use vantage_core::models::ClipRecord;
use vantage_core::AppError;

/// Repository for clip metadata records.
///
/// The `(camera_id, start_time, end_time)` tuple is unique; `get_or_create`
/// relies on that constraint so concurrent requests for the same window
/// observe a single row.
#[derive(Clone)]
pub struct ClipRepository {
    pool: PgPool,
}

impl ClipRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Atomically fetch the clip record for a window, creating it on first
    /// sight. `ON CONFLICT DO NOTHING` plus the follow-up SELECT guarantees
    /// at most one row per tuple even under concurrent callers.
    pub async fn get_or_create(
        &self,
        camera_id: Uuid,
        start_time: DateTime<Utc>,
        end_time: DateTime<Utc>,
    ) -> Result<ClipRecord, AppError> {
        // Use dynamic SQLx queries to avoid requiring DATABASE_URL/sqlx prepare
        sqlx::query(
            r#"
            INSERT INTO clips (id, camera_id, start_time, end_time)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (camera_id, start_time, end_time) DO NOTHING
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(camera_id)
        .bind(start_time)
        .bind(end_time)
        .execute(&self.pool)
        .await?;

        let record = sqlx::query_as::<_, ClipRecord>(
            r#"
            SELECT id, camera_id, start_time, end_time,
                   remote_stream_name, expires_at, created_at, updated_at
            FROM clips
            WHERE camera_id = $1 AND start_time = $2 AND end_time = $3
            "#,
        )
        .bind(camera_id)
        .bind(start_time)
        .bind(end_time)
        .fetch_one(&self.pool)
        .await?;

        Ok(record)
    }

    /// Assign the stream name and expiration only while no name is set.
    /// Returns false when another request already claimed the record or it
    /// no longer exists.
    pub async fn claim_stream_assignment(
        &self,
        record_id: Uuid,
        remote_stream_name: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<bool, AppError> {
        let result = sqlx::query(
            r#"
            UPDATE clips
            SET remote_stream_name = $2, expires_at = $3, updated_at = NOW()
            WHERE id = $1 AND remote_stream_name IS NULL
            "#,
        )
        .bind(record_id)
        .bind(remote_stream_name)
        .bind(expires_at)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Overwrite the remote stream name and expiration in a single write.
    /// Returns false when the record no longer exists.
    pub async fn update_stream_name_and_expiration(
        &self,
        record_id: Uuid,
        remote_stream_name: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<bool, AppError> {
        let result = sqlx::query(
            r#"
            UPDATE clips
            SET remote_stream_name = $2, expires_at = $3, updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(record_id)
        .bind(remote_stream_name)
        .bind(expires_at)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Fetch a record by id.
    pub async fn get(&self, record_id: Uuid) -> Result<Option<ClipRecord>, AppError> {
        let record = sqlx::query_as::<_, ClipRecord>(
            r#"
            SELECT id, camera_id, start_time, end_time,
                   remote_stream_name, expires_at, created_at, updated_at
            FROM clips
            WHERE id = $1
            "#,
        )
        .bind(record_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(record)
    }
}
