use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use warehouse_core::{FactProduction, WarehouseError, WriteOutcome};

#[derive(Debug, PartialEq, Eq, Deserialize, Serialize)]
pub enum IngestStatus {
    #[serde(rename = "inserted")]
    Inserted,
    #[serde(rename = "duplicate")]
    Duplicate,
}

impl From<&WriteOutcome> for IngestStatus {
    fn from(outcome: &WriteOutcome) -> Self {
        match outcome {
            WriteOutcome::Inserted(_) => IngestStatus::Inserted,
            WriteOutcome::Duplicate(_) => IngestStatus::Duplicate,
        }
    }
}

/// The canonical shape of a stored production event, echoed back to callers.
#[derive(Debug, Deserialize, Serialize)]
pub struct CanonicalEventBody {
    pub source_system: String,
    pub source_event_id: String,
    pub event_ts: NaiveDateTime,
    pub plant_code: String,
    pub product_key: i32,
    pub produced_qty_lb: Decimal,
    pub scrap_qty_lb: Decimal,
    pub content_fingerprint: String,
}

impl From<&FactProduction> for CanonicalEventBody {
    fn from(fact: &FactProduction) -> Self {
        CanonicalEventBody {
            source_system: fact.source_system.clone(),
            source_event_id: fact.source_event_id.clone(),
            event_ts: fact.event_ts,
            plant_code: fact.plant_code.clone(),
            product_key: fact.product_key,
            produced_qty_lb: fact.produced_qty_lb,
            scrap_qty_lb: fact.scrap_qty_lb,
            content_fingerprint: fact.content_fingerprint.clone(),
        }
    }
}

#[derive(Debug, Deserialize, Serialize)]
pub struct IngestResponse {
    pub status: IngestStatus,
    pub event: CanonicalEventBody,
}

#[derive(Error, Debug)]
pub enum IngestError {
    #[error("failed to decode request: {0}")]
    RequestDecodingError(#[from] serde_json::Error),

    #[error("no adapter registered for source system: {0}")]
    UnknownSource(String),

    #[error("malformed payload: {0}")]
    MalformedPayload(String),

    #[error("unsupported unit of measure: {0}")]
    UnsupportedUnit(String),

    #[error("no product mapping: {0}")]
    MappingNotFound(String),

    #[error("warehouse temporarily unavailable")]
    StorageUnavailable,
}

impl IngestError {
    /// Stable low-cardinality tag for the dropped-event counter.
    pub fn to_metric_tag(&self) -> &'static str {
        match self {
            IngestError::RequestDecodingError(_) => "request_decoding",
            IngestError::UnknownSource(_) => "unknown_source",
            IngestError::MalformedPayload(_) => "malformed_payload",
            IngestError::UnsupportedUnit(_) => "unsupported_unit",
            IngestError::MappingNotFound(_) => "mapping_not_found",
            IngestError::StorageUnavailable => "storage_unavailable",
        }
    }

    fn status_code(&self) -> StatusCode {
        match self {
            IngestError::RequestDecodingError(_)
            | IngestError::UnknownSource(_)
            | IngestError::MalformedPayload(_)
            | IngestError::UnsupportedUnit(_) => StatusCode::BAD_REQUEST,
            IngestError::MappingNotFound(_) => StatusCode::UNPROCESSABLE_ENTITY,
            IngestError::StorageUnavailable => StatusCode::SERVICE_UNAVAILABLE,
        }
    }
}

impl From<WarehouseError> for IngestError {
    fn from(err: WarehouseError) -> Self {
        match err {
            WarehouseError::MappingNotFound { .. } | WarehouseError::UnknownCanonicalSku(_) => {
                IngestError::MappingNotFound(err.to_string())
            }
            WarehouseError::Database(e) => {
                tracing::error!("warehouse error while ingesting event: {}", e);
                IngestError::StorageUnavailable
            }
            // Price versioning errors never surface on the event path.
            other => {
                tracing::error!("unexpected warehouse error: {}", other);
                IngestError::StorageUnavailable
            }
        }
    }
}

impl IntoResponse for IngestError {
    fn into_response(self) -> Response {
        (self.status_code(), self.to_string()).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn client_errors_map_to_400() {
        for err in [
            IngestError::UnknownSource("LAMB_ERP".to_string()),
            IngestError::MalformedPayload("missing event_ts".to_string()),
            IngestError::UnsupportedUnit("STONE".to_string()),
        ] {
            assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
        }
    }

    #[test]
    fn mapping_miss_maps_to_422() {
        let err = IngestError::MappingNotFound("PORK_ERP/P-1".to_string());
        assert_eq!(err.status_code(), StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[test]
    fn storage_failure_maps_to_503() {
        assert_eq!(
            IngestError::StorageUnavailable.status_code(),
            StatusCode::SERVICE_UNAVAILABLE
        );
    }

    #[test]
    fn warehouse_mapping_miss_converts_to_mapping_not_found() {
        let err: IngestError = WarehouseError::MappingNotFound {
            source_system: "PORK_ERP".to_string(),
            source_item_id: "P-1".to_string(),
            plant_code: "VA01".to_string(),
        }
        .into();
        assert!(matches!(err, IngestError::MappingNotFound(_)));
        assert_eq!(err.to_metric_tag(), "mapping_not_found");
    }

    #[test]
    fn warehouse_db_error_converts_to_storage_unavailable() {
        let err: IngestError = WarehouseError::Database(sqlx::Error::PoolClosed).into();
        assert!(matches!(err, IngestError::StorageUnavailable));
    }
}
