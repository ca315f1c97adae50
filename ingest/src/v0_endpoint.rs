use axum::extract::State;
use axum::Json;
use bytes::Bytes;
use serde_json::Value;
use tracing::instrument;

use warehouse_core::{ops, ProductionEvent, CANONICAL_UOM};

use crate::api::{IngestError, IngestResponse, IngestStatus};
use crate::prometheus::{report_dropped_events, report_ingested_events};
use crate::router::AppState;
use crate::uom::to_pounds;

/// POST /ingest/production
///
/// Accepts one raw source payload, canonicalizes it through the registered
/// adapter, normalizes quantities to pounds, resolves the product mapping and
/// writes the fact idempotently. Replays of an already-stored event return
/// 200 with `status: duplicate` and the originally stored body.
#[instrument(
    skip_all,
    fields(source_system, source_event_id, plant_code)
)]
pub async fn ingest_production(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<IngestResponse>, IngestError> {
    match process_event(&state, &body).await {
        Ok(outcome) => Ok(outcome),
        Err(err) => {
            report_dropped_events(err.to_metric_tag(), 1);
            tracing::warn!("dropped ingest event: {}", err);
            Err(err)
        }
    }
}

async fn process_event(state: &AppState, body: &[u8]) -> Result<Json<IngestResponse>, IngestError> {
    let payload: crate::adapters::RawPayload = serde_json::from_slice(body)?;

    let source_system = match payload.get("source_system") {
        Some(Value::String(s)) if !s.is_empty() => s.clone(),
        _ => {
            return Err(IngestError::MalformedPayload(
                "missing required field: source_system".to_string(),
            ))
        }
    };
    tracing::Span::current().record("source_system", source_system.as_str());
    report_ingested_events(&source_system, 1);

    let adapter = state.registry.resolve(&source_system)?;
    let event = adapter.canonicalize(&payload)?;
    tracing::Span::current().record("source_event_id", event.source_event_id.as_str());
    tracing::Span::current().record("plant_code", event.plant_code.as_str());

    let event = normalize_to_pounds(event)?;

    ops::mappings::ensure_plant(&state.pool, &event.plant_code).await?;
    let product_key = ops::mappings::resolve_product_key(
        &state.pool,
        &event.source_system,
        &event.source_item_id,
        &event.plant_code,
    )
    .await?;

    let outcome = ops::facts::write_production(&state.pool, &event, product_key).await?;
    if outcome.is_duplicate() {
        tracing::debug!(
            fingerprint = outcome.fact().content_fingerprint,
            "replayed event, returning stored fact"
        );
    }

    Ok(Json(IngestResponse {
        status: IngestStatus::from(&outcome),
        event: outcome.fact().into(),
    }))
}

fn normalize_to_pounds(event: ProductionEvent) -> Result<ProductionEvent, IngestError> {
    let produced_qty = to_pounds(event.produced_qty, &event.uom)?;
    let scrap_qty = to_pounds(event.scrap_qty, &event.uom)?;
    Ok(ProductionEvent {
        produced_qty,
        scrap_qty,
        uom: CANONICAL_UOM.to_string(),
        ..event
    })
}
