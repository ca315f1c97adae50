use rust_decimal::Decimal;

use warehouse_core::ProductionEvent;

use crate::adapters::{opt_str, parse_timestamp, quantity, required_str, RawPayload, SourceAdapter};
use crate::api::IngestError;

/// The beef warehouse system speaks in warehouse/sku terms and reports
/// quantities as `produced`/`scrap`.
pub struct BeefWmsAdapter;

impl SourceAdapter for BeefWmsAdapter {
    fn source_system(&self) -> &'static str {
        "BEEF_WMS"
    }

    fn canonicalize(&self, payload: &RawPayload) -> Result<ProductionEvent, IngestError> {
        Ok(ProductionEvent {
            source_system: self.source_system().to_string(),
            source_event_id: required_str(payload, &["source_event_id"], "source_event_id")?,
            event_ts: parse_timestamp(payload, &["event_ts", "ts"], "event_ts")?,
            plant_code: required_str(payload, &["plant_code", "warehouse"], "plant_code")?,
            source_item_id: required_str(payload, &["source_item_id", "sku"], "source_item_id")?,
            source_item_desc: opt_str(payload, &["source_item_desc", "sku_desc"]),
            produced_qty: quantity(payload, &["qty", "produced"], "qty", None)?,
            scrap_qty: quantity(payload, &["scrap_qty", "scrap"], "scrap_qty", Some(Decimal::ZERO))?,
            uom: opt_str(payload, &["uom"]).unwrap_or_else(|| "LB".to_string()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::payload;
    use serde_json::json;

    #[test]
    fn warehouse_dialect_canonicalizes() {
        let event = BeefWmsAdapter
            .canonicalize(&payload(json!({
                "source_event_id": "B-9912",
                "ts": "2026-03-02T14:15:00",
                "warehouse": "NC02",
                "sku": "BF-CHK-88",
                "sku_desc": "Chuck roll",
                "produced": "950.25",
                "scrap": 12,
                "uom": "KG",
            })))
            .unwrap();

        assert_eq!(event.source_system, "BEEF_WMS");
        assert_eq!(event.plant_code, "NC02");
        assert_eq!(event.source_item_id, "BF-CHK-88");
        assert_eq!(event.source_item_desc.as_deref(), Some("Chuck roll"));
        assert_eq!(event.produced_qty, Decimal::new(95_025, 2));
        assert_eq!(event.scrap_qty, Decimal::from(12));
        assert_eq!(event.uom, "KG");
    }

    #[test]
    fn canonical_names_take_precedence() {
        let event = BeefWmsAdapter
            .canonicalize(&payload(json!({
                "source_event_id": "B-1",
                "event_ts": "2026-03-02T14:15:00",
                "plant_code": "NC02",
                "warehouse": "XX99",
                "source_item_id": "BF-1",
                "qty": 5,
                "produced": 500,
            })))
            .unwrap();

        assert_eq!(event.plant_code, "NC02");
        assert_eq!(event.produced_qty, Decimal::from(5));
    }

    #[test]
    fn missing_produced_qty_is_rejected() {
        let err = BeefWmsAdapter
            .canonicalize(&payload(json!({
                "source_event_id": "B-2",
                "ts": "2026-03-02T14:15:00",
                "warehouse": "NC02",
                "sku": "BF-1",
                "scrap": 3,
            })))
            .unwrap_err();
        assert!(matches!(err, IngestError::MalformedPayload(_)));
    }

    #[test]
    fn missing_plant_and_warehouse_is_rejected() {
        let err = BeefWmsAdapter
            .canonicalize(&payload(json!({
                "source_event_id": "B-1",
                "event_ts": "2026-03-02T14:15:00",
                "sku": "BF-1",
            })))
            .unwrap_err();
        assert!(matches!(err, IngestError::MalformedPayload(_)));
    }
}
