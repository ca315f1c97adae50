//! Batch loader for plant pricing feed files.
//!
//! Usage: `price_loader <file.csv> [<file.csv> ...]`
//!
//! Each file is hashed and checked against the feed state table first, so
//! re-running the loader over a directory of already-loaded files is a no-op.
//! A file fails as a unit: the first bad row records a FAILED attempt and the
//! loader moves on to the next file.

use std::path::Path;
use std::process::ExitCode;

use envconfig::Envconfig;
use tracing_subscriber::EnvFilter;

use warehouse_core::ops::feed_state::{already_ingested, record_outcome, FeedStatus};
use warehouse_core::ops::mappings::{ensure_plant, product_key_for_sku};
use warehouse_core::ops::pricing::apply_price;
use warehouse_core::{
    parse_pricing_csv, Fingerprint, PriceObservation, PriceOutcome, PricingRow, WarehouseError,
};

#[derive(Envconfig)]
struct LoaderConfig {
    pub database_url: String,

    #[envconfig(default = "4")]
    pub max_pg_connections: u32,

    /// Recorded as `source_system` in etl_file_ingestion_state.
    #[envconfig(default = "PRICING_FEED")]
    pub feed_source_system: String,
}

struct FileSummary {
    applied: usize,
    skipped_history: usize,
    unchanged: usize,
}

async fn load_rows(
    pool: &sqlx::PgPool,
    rows: &[PricingRow],
) -> Result<FileSummary, WarehouseError> {
    let mut summary = FileSummary {
        applied: 0,
        skipped_history: 0,
        unchanged: 0,
    };

    for row in rows {
        if !row.is_current {
            // Historical rows are the versioner's output, not its input.
            summary.skipped_history += 1;
            continue;
        }

        ensure_plant(pool, &row.plant_code).await?;
        let product_key = product_key_for_sku(pool, &row.canonical_sku).await?;

        let outcome = apply_price(
            pool,
            &PriceObservation {
                product_key,
                plant_code: row.plant_code.clone(),
                price_per_lb: row.price_per_lb,
                currency: row.currency.clone(),
                effective_start: row.effective_start_dt,
            },
        )
        .await?;

        match outcome {
            PriceOutcome::Unchanged(_) => summary.unchanged += 1,
            PriceOutcome::Opened(_) | PriceOutcome::Superseded { .. } => summary.applied += 1,
        }
    }

    Ok(summary)
}

async fn load_file(
    pool: &sqlx::PgPool,
    feed_source_system: &str,
    path: &Path,
) -> Result<bool, WarehouseError> {
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());
    let source_location = path
        .parent()
        .map(|p| p.display().to_string())
        .unwrap_or_default();

    let data = match std::fs::read(path) {
        Ok(data) => data,
        Err(e) => {
            tracing::error!(file = %path.display(), "could not read file: {}", e);
            return Ok(false);
        }
    };
    let file_hash = Fingerprint::of_bytes(&data);

    if already_ingested(pool, feed_source_system, &source_location, &file_name, &file_hash).await? {
        tracing::info!(file = %file_name, "unchanged since last successful load, skipping");
        return Ok(true);
    }

    let rows = match parse_pricing_csv(&data) {
        Ok(rows) => rows,
        Err(e) => {
            tracing::error!(file = %file_name, "parse failed: {}", e);
            record_outcome(
                pool,
                feed_source_system,
                &source_location,
                &file_name,
                &file_name,
                FeedStatus::Failed,
                0,
                Some(&file_hash),
                Some(&e.to_string()),
            )
            .await?;
            return Ok(false);
        }
    };

    match load_rows(pool, &rows).await {
        Ok(summary) => {
            record_outcome(
                pool,
                feed_source_system,
                &source_location,
                &file_name,
                &file_name,
                FeedStatus::Success,
                rows.len() as i32,
                Some(&file_hash),
                None,
            )
            .await?;
            tracing::info!(
                file = %file_name,
                applied = summary.applied,
                unchanged = summary.unchanged,
                skipped_history = summary.skipped_history,
                "loaded pricing file"
            );
            Ok(true)
        }
        Err(e) => {
            tracing::error!(file = %file_name, "load failed: {}", e);
            record_outcome(
                pool,
                feed_source_system,
                &source_location,
                &file_name,
                &file_name,
                FeedStatus::Failed,
                0,
                Some(&file_hash),
                Some(&e.to_string()),
            )
            .await?;
            Ok(false)
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let paths: Vec<String> = std::env::args().skip(1).collect();
    if paths.is_empty() {
        eprintln!("usage: price_loader <file.csv> [<file.csv> ...]");
        return ExitCode::FAILURE;
    }

    let config = match LoaderConfig::init_from_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("invalid configuration: {e}");
            return ExitCode::FAILURE;
        }
    };

    let pool = match common_database::get_pool(&config.database_url, config.max_pg_connections).await
    {
        Ok(pool) => pool,
        Err(e) => {
            tracing::error!("could not connect to database: {}", e);
            return ExitCode::FAILURE;
        }
    };

    if let Err(e) = warehouse_core::MIGRATOR.run(&pool).await {
        tracing::error!("migrations failed: {}", e);
        return ExitCode::FAILURE;
    }

    let mut failures = 0;
    for path in &paths {
        match load_file(&pool, &config.feed_source_system, Path::new(path)).await {
            Ok(true) => {}
            Ok(false) => failures += 1,
            Err(e) => {
                tracing::error!(file = %path, "aborting: {}", e);
                failures += 1;
            }
        }
    }

    if failures > 0 {
        tracing::warn!(failures, total = paths.len(), "some files failed");
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}
