use common_database::is_unique_violation;
use sqlx::postgres::PgPool;
use tracing::warn;

use crate::error::WarehouseError;
use crate::fingerprint::Fingerprint;
use crate::types::{FactProduction, ProductionEvent, WriteOutcome};

const INSERT_FACT: &str = r#"
INSERT INTO fact_production
    (event_ts, plant_code, product_key, produced_qty_lb, scrap_qty_lb,
     unit_of_measure, source_system, source_event_id, content_fingerprint)
VALUES
    ($1, $2, $3, $4, $5, $6, $7, $8, $9)
RETURNING *
"#;

const INSERT_STATE: &str = r#"
INSERT INTO ingestion_state
    (content_fingerprint, source_system, source_event_id)
VALUES
    ($1, $2, $3)
"#;

/// Write a normalized production event at most once.
///
/// The content fingerprint is checked against the ingestion ledger first;
/// if two writers race past that check, the unique constraint on
/// `fact_production.content_fingerprint` is the final arbiter and the loser's
/// conflict is downgraded to a Duplicate outcome. Fact row and ledger row are
/// inserted in one transaction so no partial state is ever visible.
pub async fn write_production(
    pool: &PgPool,
    event: &ProductionEvent,
    product_key: i32,
) -> Result<WriteOutcome, WarehouseError> {
    let fingerprint = Fingerprint::of_production_event(event);

    if let Some(existing) = find_by_fingerprint(pool, &fingerprint).await? {
        return Ok(WriteOutcome::Duplicate(existing));
    }

    let mut tx = pool.begin().await?;

    let inserted: FactProduction = match sqlx::query_as(INSERT_FACT)
        .bind(event.event_ts)
        .bind(&event.plant_code)
        .bind(product_key)
        .bind(event.produced_qty)
        .bind(event.scrap_qty)
        .bind(&event.uom)
        .bind(&event.source_system)
        .bind(&event.source_event_id)
        .bind(fingerprint.as_str())
        .fetch_one(&mut *tx)
        .await
    {
        Ok(row) => row,
        Err(err) if is_unique_violation(&err) => {
            drop(tx); // rolls back
            return duplicate_of(pool, &fingerprint, event).await;
        }
        Err(err) => return Err(err.into()),
    };

    if let Err(err) = sqlx::query(INSERT_STATE)
        .bind(fingerprint.as_str())
        .bind(&event.source_system)
        .bind(&event.source_event_id)
        .execute(&mut *tx)
        .await
    {
        if is_unique_violation(&err) {
            drop(tx);
            return duplicate_of(pool, &fingerprint, event).await;
        }
        return Err(err.into());
    }

    tx.commit().await?;

    Ok(WriteOutcome::Inserted(inserted))
}

async fn find_by_fingerprint(
    pool: &PgPool,
    fingerprint: &Fingerprint,
) -> Result<Option<FactProduction>, WarehouseError> {
    let row = sqlx::query_as("SELECT * FROM fact_production WHERE content_fingerprint = $1")
        .bind(fingerprint.as_str())
        .fetch_optional(pool)
        .await?;
    Ok(row)
}

// A conflicting writer won the race; reconstruct their row for the caller.
async fn duplicate_of(
    pool: &PgPool,
    fingerprint: &Fingerprint,
    event: &ProductionEvent,
) -> Result<WriteOutcome, WarehouseError> {
    match find_by_fingerprint(pool, fingerprint).await? {
        Some(existing) => Ok(WriteOutcome::Duplicate(existing)),
        None => {
            // The constraint that fired must be uq_fact_src_event: same
            // (source, event id) with different content. Surface the stored
            // row for that key rather than inventing a new fact.
            warn!(
                source_system = %event.source_system,
                source_event_id = %event.source_event_id,
                "event id re-used with different content; returning stored fact"
            );
            let row: Option<FactProduction> = sqlx::query_as(
                "SELECT * FROM fact_production WHERE source_system = $1 AND source_event_id = $2",
            )
            .bind(&event.source_system)
            .bind(&event.source_event_id)
            .fetch_optional(pool)
            .await?;
            row.map(WriteOutcome::Duplicate)
                .ok_or(WarehouseError::Database(sqlx::Error::RowNotFound))
        }
    }
}
