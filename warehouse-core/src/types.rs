use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A production observation after adapter canonicalization.
///
/// Quantities are in `uom` until the normalizer rewrites them to pounds;
/// everything that reaches the fact writer is already pound-denominated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductionEvent {
    pub source_system: String,
    pub source_event_id: String,
    pub event_ts: NaiveDateTime,
    pub plant_code: String,
    pub source_item_id: String,
    pub source_item_desc: Option<String>,
    pub produced_qty: Decimal,
    pub scrap_qty: Decimal,
    pub uom: String,
}

/// A persisted production fact. Created once per distinct fingerprint,
/// never updated, never deleted by normal operation.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct FactProduction {
    pub production_key: i32,
    pub event_ts: NaiveDateTime,
    pub plant_code: String,
    pub product_key: i32,
    pub produced_qty_lb: Decimal,
    pub scrap_qty_lb: Decimal,
    pub unit_of_measure: String,
    pub source_system: String,
    pub source_event_id: String,
    pub content_fingerprint: String,
    pub created_at: DateTime<Utc>,
}

/// Outcome of an idempotent fact write. Both variants carry the stored row
/// so the caller can report identical canonical fields either way.
#[derive(Debug)]
pub enum WriteOutcome {
    Inserted(FactProduction),
    Duplicate(FactProduction),
}

impl WriteOutcome {
    pub fn fact(&self) -> &FactProduction {
        match self {
            WriteOutcome::Inserted(fact) | WriteOutcome::Duplicate(fact) => fact,
        }
    }

    pub fn is_duplicate(&self) -> bool {
        matches!(self, WriteOutcome::Duplicate(_))
    }
}

/// A new price observation for a (product, plant) pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceObservation {
    pub product_key: i32,
    pub plant_code: String,
    pub price_per_lb: Decimal,
    pub currency: String,
    pub effective_start: NaiveDate,
}

/// A temporally-versioned price row. `effective_end_dt = NULL` means
/// open-ended; at most one row per (product, plant) has `is_current`.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct PriceRecord {
    pub price_key: i32,
    pub product_key: i32,
    pub plant_code: String,
    pub price_per_lb: Decimal,
    pub currency: String,
    pub effective_start_dt: NaiveDate,
    pub effective_end_dt: Option<NaiveDate>,
    pub is_current: bool,
    pub created_at: DateTime<Utc>,
}

/// Outcome of applying a price observation.
#[derive(Debug)]
pub enum PriceOutcome {
    /// No price existed for the pair; a new open-ended row was inserted.
    Opened(PriceRecord),
    /// The prior current row was closed and a new current row inserted.
    Superseded {
        closed: PriceRecord,
        current: PriceRecord,
    },
    /// The observation matches the current row; nothing was written.
    Unchanged(PriceRecord),
}

impl PriceOutcome {
    pub fn current(&self) -> &PriceRecord {
        match self {
            PriceOutcome::Opened(row) | PriceOutcome::Unchanged(row) => row,
            PriceOutcome::Superseded { current, .. } => current,
        }
    }
}
