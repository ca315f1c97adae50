use sqlx::postgres::PgPool;

use crate::error::WarehouseError;

/// Create the plant dimension row if it does not exist yet.
///
/// Plant identifiers carry no business ambiguity, so they are safe to
/// auto-create during ingestion; products never are (see
/// [`resolve_product_key`]).
pub async fn ensure_plant<'c, E>(executor: E, plant_code: &str) -> Result<(), WarehouseError>
where
    E: sqlx::Executor<'c, Database = sqlx::Postgres>,
{
    sqlx::query(
        r#"
INSERT INTO dim_plant (plant_code, plant_name)
VALUES ($1, $2)
ON CONFLICT (plant_code) DO NOTHING
        "#,
    )
    .bind(plant_code)
    .bind(format!("Plant {plant_code}"))
    .execute(executor)
    .await?;

    Ok(())
}

/// Resolve a source-specific item to its canonical product key.
///
/// Lookup order: exact (source, item, plant) match on the current mapping,
/// then a plant-agnostic row (`plant_code IS NULL`). A miss is
/// `MappingNotFound` — canonical products are curated, never auto-created.
pub async fn resolve_product_key(
    pool: &PgPool,
    source_system: &str,
    source_item_id: &str,
    plant_code: &str,
) -> Result<i32, WarehouseError> {
    let exact: Option<(i32,)> = sqlx::query_as(
        r#"
SELECT product_key
FROM map_product_source_to_canonical
WHERE source_system = $1
  AND source_item_id = $2
  AND plant_code = $3
  AND is_current
ORDER BY map_key
LIMIT 1
        "#,
    )
    .bind(source_system)
    .bind(source_item_id)
    .bind(plant_code)
    .fetch_optional(pool)
    .await?;

    if let Some((product_key,)) = exact {
        return Ok(product_key);
    }

    let fallback: Option<(i32,)> = sqlx::query_as(
        r#"
SELECT product_key
FROM map_product_source_to_canonical
WHERE source_system = $1
  AND source_item_id = $2
  AND plant_code IS NULL
  AND is_current
ORDER BY map_key
LIMIT 1
        "#,
    )
    .bind(source_system)
    .bind(source_item_id)
    .fetch_optional(pool)
    .await?;

    match fallback {
        Some((product_key,)) => Ok(product_key),
        None => Err(WarehouseError::MappingNotFound {
            source_system: source_system.to_string(),
            source_item_id: source_item_id.to_string(),
            plant_code: plant_code.to_string(),
        }),
    }
}

/// Look up a product key by canonical SKU (pricing feed path). Unknown SKUs
/// are an error: the feed may not invent products either.
pub async fn product_key_for_sku(
    pool: &PgPool,
    canonical_sku: &str,
) -> Result<i32, WarehouseError> {
    let row: Option<(i32,)> =
        sqlx::query_as("SELECT product_key FROM dim_product WHERE canonical_sku = $1")
            .bind(canonical_sku)
            .fetch_optional(pool)
            .await?;

    row.map(|(key,)| key)
        .ok_or_else(|| WarehouseError::UnknownCanonicalSku(canonical_sku.to_string()))
}
