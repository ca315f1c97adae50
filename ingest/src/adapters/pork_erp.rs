use rust_decimal::Decimal;

use warehouse_core::ProductionEvent;

use crate::adapters::{opt_str, parse_timestamp, quantity, required_str, RawPayload, SourceAdapter};
use crate::api::IngestError;

/// The pork ERP sends mostly-canonical payloads; older plant installs still
/// use `event_time` / `item_id` / `item_desc` spellings.
pub struct PorkErpAdapter;

impl SourceAdapter for PorkErpAdapter {
    fn source_system(&self) -> &'static str {
        "PORK_ERP"
    }

    fn canonicalize(&self, payload: &RawPayload) -> Result<ProductionEvent, IngestError> {
        Ok(ProductionEvent {
            source_system: self.source_system().to_string(),
            source_event_id: required_str(payload, &["source_event_id"], "source_event_id")?,
            event_ts: parse_timestamp(payload, &["event_ts", "event_time"], "event_ts")?,
            plant_code: required_str(payload, &["plant_code"], "plant_code")?,
            source_item_id: required_str(payload, &["source_item_id", "item_id"], "source_item_id")?,
            source_item_desc: opt_str(payload, &["source_item_desc", "item_desc"]),
            produced_qty: quantity(payload, &["qty"], "qty", None)?,
            scrap_qty: quantity(payload, &["scrap_qty"], "scrap_qty", Some(Decimal::ZERO))?,
            uom: opt_str(payload, &["uom"]).unwrap_or_else(|| "LB".to_string()),
        })
    }
}
