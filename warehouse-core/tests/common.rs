use chrono::{NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;
use sqlx::PgPool;

use warehouse_core::ops::seed::{
    upsert_mapping, upsert_plant, upsert_product, MappingSeed, PlantSeed, ProductSeed,
};
use warehouse_core::{PriceObservation, ProductionEvent};

/// Seed one plant, one product and a plant-agnostic mapping for it.
/// Returns the product key.
#[allow(dead_code)]
pub async fn seed_catalog(db: &PgPool) -> i32 {
    upsert_plant(
        db,
        &PlantSeed {
            plant_code: "VA01".to_string(),
            plant_name: "Smithfield VA".to_string(),
            state: Some("VA".to_string()),
            region: Some("Southeast".to_string()),
        },
    )
    .await
    .expect("failed to seed plant");

    let product_key = upsert_product(
        db,
        &ProductSeed {
            canonical_sku: "PORK-LOIN-001".to_string(),
            product_name: "Boneless Pork Loin".to_string(),
            protein_type: "PORK".to_string(),
            cut_type: Some("LOIN".to_string()),
        },
    )
    .await
    .expect("failed to seed product");

    upsert_mapping(
        db,
        &MappingSeed {
            source_system: "PORK_ERP".to_string(),
            source_item_id: "ITM-100221".to_string(),
            source_item_desc: Some("LOIN BNLS".to_string()),
            plant_code: None,
            canonical_sku: "PORK-LOIN-001".to_string(),
        },
    )
    .await
    .expect("failed to seed mapping");

    product_key
}

/// A normalized canonical event matching the seeded mapping.
#[allow(dead_code)]
pub fn production_event(source_event_id: &str) -> ProductionEvent {
    ProductionEvent {
        source_system: "PORK_ERP".to_string(),
        source_event_id: source_event_id.to_string(),
        event_ts: "2026-02-21T09:00:00"
            .parse::<NaiveDateTime>()
            .expect("valid timestamp"),
        plant_code: "VA01".to_string(),
        source_item_id: "ITM-100221".to_string(),
        source_item_desc: Some("LOIN BNLS".to_string()),
        produced_qty: Decimal::new(1000, 1), // 100.0
        scrap_qty: Decimal::new(25, 1),      // 2.5
        uom: "LB".to_string(),
    }
}

#[allow(dead_code)]
pub fn price_observation(product_key: i32, price: Decimal, start: NaiveDate) -> PriceObservation {
    PriceObservation {
        product_key,
        plant_code: "VA01".to_string(),
        price_per_lb: price,
        currency: "USD".to_string(),
        effective_start: start,
    }
}
