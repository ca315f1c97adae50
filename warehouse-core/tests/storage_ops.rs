use rust_decimal::Decimal;
use sqlx::PgPool;

use warehouse_core::ops::{facts, mappings, seed};
use warehouse_core::{WarehouseError, WriteOutcome};

mod common;

#[sqlx::test(migrations = "./migrations")]
async fn same_event_inserts_then_duplicates(db: PgPool) {
    let product_key = common::seed_catalog(&db).await;
    let event = common::production_event("P-0001");

    let first = facts::write_production(&db, &event, product_key)
        .await
        .expect("first write failed");
    assert!(matches!(first, WriteOutcome::Inserted(_)));

    let second = facts::write_production(&db, &event, product_key)
        .await
        .expect("replay failed");
    assert!(second.is_duplicate());

    // Both responses report the same stored row.
    assert_eq!(first.fact().production_key, second.fact().production_key);
    assert_eq!(
        first.fact().content_fingerprint,
        second.fact().content_fingerprint
    );
    assert_eq!(second.fact().produced_qty_lb, Decimal::new(1000, 1));

    let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM fact_production")
        .fetch_one(&db)
        .await
        .expect("count failed");
    assert_eq!(count, 1);
}

#[sqlx::test(migrations = "./migrations")]
async fn reused_event_id_returns_the_stored_fact(db: PgPool) {
    let product_key = common::seed_catalog(&db).await;
    let event = common::production_event("P-0002");

    facts::write_production(&db, &event, product_key)
        .await
        .expect("first write failed");

    // Same source event id, different content: a new fingerprint, but the
    // (source_system, source_event_id) constraint still holds the line.
    let mut altered = event.clone();
    altered.produced_qty = Decimal::new(2000, 1);

    let outcome = facts::write_production(&db, &altered, product_key)
        .await
        .expect("altered replay failed");
    assert!(outcome.is_duplicate());
    assert_eq!(outcome.fact().produced_qty_lb, Decimal::new(1000, 1));

    let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM fact_production")
        .fetch_one(&db)
        .await
        .expect("count failed");
    assert_eq!(count, 1);
}

#[sqlx::test(migrations = "./migrations")]
async fn plants_auto_create_but_products_never_do(db: PgPool) {
    mappings::ensure_plant(&db, "ZZ09").await.expect("ensure failed");
    mappings::ensure_plant(&db, "ZZ09").await.expect("ensure failed");

    let (plants,): (i64,) =
        sqlx::query_as("SELECT COUNT(*) FROM dim_plant WHERE plant_code = 'ZZ09'")
            .fetch_one(&db)
            .await
            .expect("count failed");
    assert_eq!(plants, 1);

    let err = mappings::resolve_product_key(&db, "PORK_ERP", "ITM-UNSEEN", "ZZ09")
        .await
        .expect_err("unmapped item must not resolve");
    assert!(matches!(err, WarehouseError::MappingNotFound { .. }));

    let (products,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM dim_product")
        .fetch_one(&db)
        .await
        .expect("count failed");
    assert_eq!(products, 0);
}

#[sqlx::test(migrations = "./migrations")]
async fn exact_plant_mapping_beats_the_plant_agnostic_fallback(db: PgPool) {
    let fallback_key = common::seed_catalog(&db).await;

    let exact_key = seed::upsert_product(
        &db,
        &seed::ProductSeed {
            canonical_sku: "PORK-LOIN-VA".to_string(),
            product_name: "Boneless Pork Loin (VA pack)".to_string(),
            protein_type: "PORK".to_string(),
            cut_type: Some("LOIN".to_string()),
        },
    )
    .await
    .expect("failed to seed product");
    seed::upsert_mapping(
        &db,
        &seed::MappingSeed {
            source_system: "PORK_ERP".to_string(),
            source_item_id: "ITM-100221".to_string(),
            source_item_desc: None,
            plant_code: Some("VA01".to_string()),
            canonical_sku: "PORK-LOIN-VA".to_string(),
        },
    )
    .await
    .expect("failed to seed mapping");

    let resolved = mappings::resolve_product_key(&db, "PORK_ERP", "ITM-100221", "VA01")
        .await
        .expect("exact resolve failed");
    assert_eq!(resolved, exact_key);

    // Any other plant falls through to the plant-agnostic row.
    let resolved = mappings::resolve_product_key(&db, "PORK_ERP", "ITM-100221", "NC02")
        .await
        .expect("fallback resolve failed");
    assert_eq!(resolved, fallback_key);
}
