use chrono::NaiveDate;
use thiserror::Error;

/// Errors surfaced by the storage ops. Unique-constraint conflicts on the
/// fingerprint and price tables are recovered inside the ops themselves and
/// never reach callers as errors.
#[derive(Error, Debug)]
pub enum WarehouseError {
    #[error("no mapping for source_system={source_system:?}, source_item_id={source_item_id:?}, plant_code={plant_code:?}")]
    MappingNotFound {
        source_system: String,
        source_item_id: String,
        plant_code: String,
    },

    #[error("canonical_sku {0:?} not found in dim_product")]
    UnknownCanonicalSku(String),

    #[error("price for ({product_key}, {plant_code}) starting {new_start} does not supersede current row starting {current_start}")]
    StalePriceObservation {
        product_key: i32,
        plant_code: String,
        new_start: NaiveDate,
        current_start: NaiveDate,
    },

    #[error(transparent)]
    Database(#[from] sqlx::Error),
}
