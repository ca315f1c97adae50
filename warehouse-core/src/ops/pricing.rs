use chrono::NaiveDate;
use common_database::is_unique_violation;
use sqlx::postgres::PgPool;

use crate::error::WarehouseError;
use crate::types::{PriceObservation, PriceOutcome, PriceRecord};

const SELECT_CURRENT_FOR_UPDATE: &str = r#"
SELECT *
FROM fact_price_by_plant
WHERE product_key = $1 AND plant_code = $2 AND is_current
FOR UPDATE
"#;

const INSERT_CURRENT: &str = r#"
INSERT INTO fact_price_by_plant
    (product_key, plant_code, price_per_lb, currency, effective_start_dt,
     effective_end_dt, is_current)
VALUES
    ($1, $2, $3, $4, $5, NULL, TRUE)
RETURNING *
"#;

const CLOSE_ROW: &str = r#"
UPDATE fact_price_by_plant
SET is_current = FALSE, effective_end_dt = $1
WHERE price_key = $2
RETURNING *
"#;

/// Boundary rule for closing a superseded price row: the closed row ends the
/// day before the new row starts, so the two validity intervals are adjacent
/// and never overlap.
pub fn close_date_for(new_start: NaiveDate) -> NaiveDate {
    new_start
        .pred_opt()
        .expect("effective_start below calendar range")
}

/// Apply a price observation with SCD Type 2 semantics.
///
/// Within a single transaction: lock the current row for the (product, plant)
/// pair, no-op if the observation is identical, otherwise close the current
/// row and insert the new one as current. The close-before-insert ordering
/// inside one transaction is what preserves non-overlapping intervals; there
/// is no post-hoc cleanup.
pub async fn apply_price(
    pool: &PgPool,
    obs: &PriceObservation,
) -> Result<PriceOutcome, WarehouseError> {
    match apply_price_once(pool, obs).await? {
        Some(outcome) => Ok(outcome),
        // Lost the race to open the first row for this (product, plant).
        // The winner's row is current now, so a second pass locks it and
        // takes the normal unchanged/supersede/stale path.
        None => apply_price_once(pool, obs)
            .await?
            .ok_or(WarehouseError::Database(sqlx::Error::RowNotFound)),
    }
}

// Ok(None) means the empty->open insert hit the single-current constraint,
// i.e. a concurrent writer opened a row between our lock attempt (which
// locks nothing when no row exists) and our insert.
async fn apply_price_once(
    pool: &PgPool,
    obs: &PriceObservation,
) -> Result<Option<PriceOutcome>, WarehouseError> {
    let mut tx = pool.begin().await?;

    let current: Option<PriceRecord> = sqlx::query_as(SELECT_CURRENT_FOR_UPDATE)
        .bind(obs.product_key)
        .bind(&obs.plant_code)
        .fetch_optional(&mut *tx)
        .await?;

    let Some(current) = current else {
        // NoActivePrice -> HasActivePrice
        let opened = match insert_current(&mut tx, obs).await {
            Ok(row) => row,
            Err(err) if is_unique_violation(&err) => {
                drop(tx); // rolls back
                return Ok(None);
            }
            Err(err) => return Err(err.into()),
        };
        tx.commit().await?;
        return Ok(Some(PriceOutcome::Opened(opened)));
    };

    if current.price_per_lb == obs.price_per_lb
        && current.effective_start_dt == obs.effective_start
        && current.currency == obs.currency
    {
        // Redundant re-ingestion of the active price.
        tx.commit().await?;
        return Ok(Some(PriceOutcome::Unchanged(current)));
    }

    if obs.effective_start <= current.effective_start_dt {
        // History only moves forward; a superseding row must start after
        // the row it closes.
        return Err(WarehouseError::StalePriceObservation {
            product_key: obs.product_key,
            plant_code: obs.plant_code.clone(),
            new_start: obs.effective_start,
            current_start: current.effective_start_dt,
        });
    }

    let closed: PriceRecord = sqlx::query_as(CLOSE_ROW)
        .bind(close_date_for(obs.effective_start))
        .bind(current.price_key)
        .fetch_one(&mut *tx)
        .await?;

    let opened = insert_current(&mut tx, obs).await?;
    tx.commit().await?;

    Ok(Some(PriceOutcome::Superseded {
        closed,
        current: opened,
    }))
}

async fn insert_current(
    tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
    obs: &PriceObservation,
) -> Result<PriceRecord, sqlx::Error> {
    sqlx::query_as(INSERT_CURRENT)
        .bind(obs.product_key)
        .bind(&obs.plant_code)
        .bind(obs.price_per_lb)
        .bind(&obs.currency)
        .bind(obs.effective_start)
        .fetch_one(&mut **tx)
        .await
}
