//! Idempotent natural-key upserts for dimensions and mappings.
//!
//! This is the administration boundary: plants and products upsert in place,
//! while mappings are append-only — a conflicting natural key is left
//! untouched because corrections are new rows, not updates.

use chrono::Utc;
use sqlx::postgres::PgPool;

use crate::error::WarehouseError;
use crate::ops::mappings::product_key_for_sku;

#[derive(Debug, Clone)]
pub struct PlantSeed {
    pub plant_code: String,
    pub plant_name: String,
    pub state: Option<String>,
    pub region: Option<String>,
}

#[derive(Debug, Clone)]
pub struct ProductSeed {
    pub canonical_sku: String,
    pub product_name: String,
    pub protein_type: String,
    pub cut_type: Option<String>,
}

#[derive(Debug, Clone)]
pub struct MappingSeed {
    pub source_system: String,
    pub source_item_id: String,
    pub source_item_desc: Option<String>,
    pub plant_code: Option<String>,
    pub canonical_sku: String,
}

pub async fn upsert_plant(pool: &PgPool, plant: &PlantSeed) -> Result<(), WarehouseError> {
    sqlx::query(
        r#"
INSERT INTO dim_plant (plant_code, plant_name, state, region)
VALUES ($1, $2, $3, $4)
ON CONFLICT (plant_code) DO UPDATE
SET plant_name = EXCLUDED.plant_name,
    state = EXCLUDED.state,
    region = EXCLUDED.region
        "#,
    )
    .bind(&plant.plant_code)
    .bind(&plant.plant_name)
    .bind(&plant.state)
    .bind(&plant.region)
    .execute(pool)
    .await?;

    Ok(())
}

pub async fn upsert_product(pool: &PgPool, product: &ProductSeed) -> Result<i32, WarehouseError> {
    let (product_key,): (i32,) = sqlx::query_as(
        r#"
INSERT INTO dim_product (canonical_sku, product_name, protein_type, cut_type)
VALUES ($1, $2, $3, $4)
ON CONFLICT (canonical_sku) DO UPDATE
SET product_name = EXCLUDED.product_name,
    protein_type = EXCLUDED.protein_type,
    cut_type = EXCLUDED.cut_type
RETURNING product_key
        "#,
    )
    .bind(&product.canonical_sku)
    .bind(&product.product_name)
    .bind(&product.protein_type)
    .bind(&product.cut_type)
    .fetch_one(pool)
    .await?;

    Ok(product_key)
}

pub async fn upsert_mapping(pool: &PgPool, mapping: &MappingSeed) -> Result<(), WarehouseError> {
    let product_key = product_key_for_sku(pool, &mapping.canonical_sku).await?;

    sqlx::query(
        r#"
INSERT INTO map_product_source_to_canonical
    (source_system, source_item_id, source_item_desc, product_key, plant_code,
     is_current, effective_start_dt)
VALUES
    ($1, $2, $3, $4, $5, TRUE, $6)
ON CONFLICT (source_system, source_item_id, plant_code) DO NOTHING
        "#,
    )
    .bind(&mapping.source_system)
    .bind(&mapping.source_item_id)
    .bind(&mapping.source_item_desc)
    .bind(product_key)
    .bind(&mapping.plant_code)
    .bind(Utc::now().date_naive())
    .execute(pool)
    .await?;

    Ok(())
}
