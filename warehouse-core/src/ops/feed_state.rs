use sqlx::postgres::PgPool;

use crate::error::WarehouseError;
use crate::fingerprint::Fingerprint;

// Postgres column is TEXT but there is no point storing unbounded tracebacks.
const MAX_ERROR_LEN: usize = 2000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeedStatus {
    Success,
    Failed,
}

impl FeedStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            FeedStatus::Success => "SUCCESS",
            FeedStatus::Failed => "FAILED",
        }
    }
}

/// True if this exact file content was already loaded successfully.
///
/// A file whose hash differs from the recorded one is treated as changed and
/// reprocessed; a prior FAILED attempt is always retried.
pub async fn already_ingested(
    pool: &PgPool,
    source_system: &str,
    source_location: &str,
    file_id: &str,
    file_hash: &Fingerprint,
) -> Result<bool, WarehouseError> {
    let row: Option<(String, Option<String>)> = sqlx::query_as(
        r#"
SELECT status, file_hash
FROM etl_file_ingestion_state
WHERE source_system = $1 AND source_location = $2 AND file_id = $3
        "#,
    )
    .bind(source_system)
    .bind(source_location)
    .bind(file_id)
    .fetch_optional(pool)
    .await?;

    let Some((status, prev_hash)) = row else {
        return Ok(false);
    };
    if status != FeedStatus::Success.as_str() {
        return Ok(false);
    }
    Ok(prev_hash.as_deref() == Some(file_hash.as_str()))
}

/// Record the outcome of a feed file attempt, keyed by
/// (source_system, file_id, source_location). Re-attempts overwrite the
/// previous outcome rather than appending.
#[allow(clippy::too_many_arguments)]
pub async fn record_outcome(
    pool: &PgPool,
    source_system: &str,
    source_location: &str,
    file_id: &str,
    file_name: &str,
    status: FeedStatus,
    rows_loaded: i32,
    file_hash: Option<&Fingerprint>,
    error_message: Option<&str>,
) -> Result<(), WarehouseError> {
    let error_message = error_message.map(|msg| {
        let mut msg = msg.to_string();
        msg.truncate(MAX_ERROR_LEN);
        msg
    });

    sqlx::query(
        r#"
INSERT INTO etl_file_ingestion_state
    (source_system, source_location, file_id, file_name, file_hash, status,
     rows_loaded, error_message, ingested_at)
VALUES
    ($1, $2, $3, $4, $5, $6, $7, $8, NOW())
ON CONFLICT (source_system, file_id, source_location) DO UPDATE
SET file_name = EXCLUDED.file_name,
    file_hash = EXCLUDED.file_hash,
    status = EXCLUDED.status,
    rows_loaded = EXCLUDED.rows_loaded,
    error_message = EXCLUDED.error_message,
    ingested_at = NOW()
        "#,
    )
    .bind(source_system)
    .bind(source_location)
    .bind(file_id)
    .bind(file_name)
    .bind(file_hash.map(Fingerprint::as_str))
    .bind(status.as_str())
    .bind(rows_loaded)
    .bind(error_message)
    .execute(pool)
    .await?;

    Ok(())
}
