use rust_decimal::Decimal;
use serde_json::Value;

use warehouse_core::ProductionEvent;

use crate::adapters::{opt_str, parse_timestamp, quantity, required_str, RawPayload, SourceAdapter};
use crate::api::IngestError;

/// The poultry MES nests item identity under `material` and quantities under
/// `quantities`; older line controllers still emit the flat spelling, so both
/// are accepted. When a nested object is present it wins outright.
pub struct PoultryMesAdapter;

fn nested<'a>(payload: &'a RawPayload, key: &str) -> Option<&'a RawPayload> {
    match payload.get(key) {
        Some(Value::Object(map)) => Some(map),
        _ => None,
    }
}

impl SourceAdapter for PoultryMesAdapter {
    fn source_system(&self) -> &'static str {
        "POULTRY_MES"
    }

    fn canonicalize(&self, payload: &RawPayload) -> Result<ProductionEvent, IngestError> {
        let material = nested(payload, "material");
        let quantities = nested(payload, "quantities");

        let (source_item_id, source_item_desc) = match material {
            Some(material) => (
                required_str(material, &["id"], "material.id")?,
                opt_str(material, &["desc"]),
            ),
            None => (
                required_str(payload, &["source_item_id"], "source_item_id")?,
                opt_str(payload, &["source_item_desc"]),
            ),
        };

        let (produced_qty, scrap_qty, uom) = match quantities {
            Some(quantities) => (
                quantity(quantities, &["good"], "quantities.good", None)?,
                quantity(quantities, &["scrap"], "quantities.scrap", Some(Decimal::ZERO))?,
                opt_str(quantities, &["uom"]),
            ),
            None => (
                quantity(payload, &["qty"], "qty", None)?,
                quantity(payload, &["scrap_qty"], "scrap_qty", Some(Decimal::ZERO))?,
                opt_str(payload, &["uom"]),
            ),
        };

        Ok(ProductionEvent {
            source_system: self.source_system().to_string(),
            source_event_id: required_str(payload, &["source_event_id"], "source_event_id")?,
            event_ts: parse_timestamp(payload, &["event_ts", "event_time"], "event_ts")?,
            plant_code: required_str(payload, &["plant_code"], "plant_code")?,
            source_item_id,
            source_item_desc,
            produced_qty,
            scrap_qty,
            uom: uom.unwrap_or_else(|| "LB".to_string()),
        })
    }
}
