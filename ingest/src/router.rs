use std::future::ready;
use std::sync::Arc;

use axum::extract::State;
use axum::http::Method;
use axum::routing::{get, post};
use axum::{middleware, Json, Router};
use serde_json::{json, Value};
use sqlx::postgres::PgPool;
use tower_http::cors::{AllowHeaders, AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::adapters::AdapterRegistry;
use crate::prometheus::{setup_metrics_recorder, track_metrics};
use crate::v0_endpoint;

#[derive(Clone)]
pub struct AppState {
    pub registry: Arc<AdapterRegistry>,
    pub pool: PgPool,
}

async fn index(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "service": "ingest",
        "status": "ok",
        "sources": state.registry.sources(),
    }))
}

pub fn router(registry: Arc<AdapterRegistry>, pool: PgPool, metrics: bool) -> Router {
    let state = AppState { registry, pool };

    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST])
        .allow_headers(AllowHeaders::mirror_request())
        .allow_credentials(true)
        .allow_origin(AllowOrigin::mirror_request());

    let router = Router::new()
        .route("/", get(index))
        .route("/_readiness", get(index))
        .route("/_liveness", get(|| ready(Json(json!({"status": "ok"})))))
        .route("/ingest/production", post(v0_endpoint::ingest_production))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .layer(middleware::from_fn(track_metrics))
        .with_state(state);

    // Don't install metrics unless asked
    if metrics {
        let recorder_handle = setup_metrics_recorder();
        router.route("/metrics", get(move || ready(recorder_handle.render())))
    } else {
        router
    }
}
