//! Source adapters translate each upstream system's payload dialect into a
//! canonical [`ProductionEvent`]. Adapters only rename, restructure, and
//! validate — unit conversion and product resolution happen downstream.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, NaiveDateTime};
use rust_decimal::Decimal;
use serde_json::Value;

use warehouse_core::ProductionEvent;

use crate::api::IngestError;

mod beef_wms;
mod pork_erp;
mod poultry_mes;

pub use beef_wms::BeefWmsAdapter;
pub use pork_erp::PorkErpAdapter;
pub use poultry_mes::PoultryMesAdapter;

pub type RawPayload = serde_json::Map<String, Value>;

pub trait SourceAdapter: Send + Sync {
    /// The source system identifier this adapter handles. Doubles as the
    /// registry key and the `source_system` value on canonical events.
    fn source_system(&self) -> &'static str;

    fn canonicalize(&self, payload: &RawPayload) -> Result<ProductionEvent, IngestError>;
}

/// Routes payloads to adapters by source system. Registering a second
/// adapter for the same source replaces the first.
#[derive(Default)]
pub struct AdapterRegistry {
    adapters: HashMap<&'static str, Arc<dyn SourceAdapter>>,
}

impl AdapterRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry with every built-in adapter registered.
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        registry.register(Arc::new(PorkErpAdapter));
        registry.register(Arc::new(BeefWmsAdapter));
        registry.register(Arc::new(PoultryMesAdapter));
        registry
    }

    pub fn register(&mut self, adapter: Arc<dyn SourceAdapter>) {
        self.adapters.insert(adapter.source_system(), adapter);
    }

    pub fn resolve(&self, source_system: &str) -> Result<&dyn SourceAdapter, IngestError> {
        self.adapters
            .get(source_system)
            .map(Arc::as_ref)
            .ok_or_else(|| IngestError::UnknownSource(source_system.to_string()))
    }

    /// Registered source systems, sorted for stable readiness output.
    pub fn sources(&self) -> Vec<&'static str> {
        let mut sources: Vec<_> = self.adapters.keys().copied().collect();
        sources.sort_unstable();
        sources
    }
}

/// First non-null value among the aliased field names.
fn lookup<'a>(payload: &'a RawPayload, aliases: &[&str]) -> Option<&'a Value> {
    aliases
        .iter()
        .filter_map(|name| payload.get(*name))
        .find(|v| !v.is_null())
}

pub(crate) fn required_str(
    payload: &RawPayload,
    aliases: &[&str],
    field: &str,
) -> Result<String, IngestError> {
    match lookup(payload, aliases) {
        Some(Value::String(s)) if !s.trim().is_empty() => Ok(s.trim().to_string()),
        Some(other) => Err(IngestError::MalformedPayload(format!(
            "field {field} must be a non-empty string, got: {other}"
        ))),
        None => Err(IngestError::MalformedPayload(format!(
            "missing required field: {field}"
        ))),
    }
}

pub(crate) fn opt_str(payload: &RawPayload, aliases: &[&str]) -> Option<String> {
    match lookup(payload, aliases) {
        Some(Value::String(s)) if !s.trim().is_empty() => Some(s.trim().to_string()),
        _ => None,
    }
}

/// Event timestamps arrive as naive `YYYY-MM-DDTHH:MM:SS`, as RFC 3339, or
/// with a space separator. Zoned timestamps are converted to UTC and the
/// offset dropped.
pub(crate) fn parse_timestamp(
    payload: &RawPayload,
    aliases: &[&str],
    field: &str,
) -> Result<NaiveDateTime, IngestError> {
    let raw = required_str(payload, aliases, field)?;

    if let Ok(ts) = raw.parse::<NaiveDateTime>() {
        return Ok(ts);
    }
    if let Ok(ts) = DateTime::parse_from_rfc3339(&raw) {
        return Ok(ts.naive_utc());
    }
    if let Ok(ts) = NaiveDateTime::parse_from_str(&raw, "%Y-%m-%d %H:%M:%S%.f") {
        return Ok(ts);
    }

    Err(IngestError::MalformedPayload(format!(
        "unparseable timestamp in {field}: {raw:?}"
    )))
}

fn decimal_from_value(value: &Value) -> Option<Decimal> {
    match value {
        Value::Number(n) => n.to_string().parse().ok(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// A non-negative decimal quantity, or `default` when every alias is absent.
pub(crate) fn quantity(
    payload: &RawPayload,
    aliases: &[&str],
    field: &str,
    default: Option<Decimal>,
) -> Result<Decimal, IngestError> {
    let value = match lookup(payload, aliases) {
        Some(value) => value,
        None => {
            return default.ok_or_else(|| {
                IngestError::MalformedPayload(format!("missing required field: {field}"))
            })
        }
    };

    let qty = decimal_from_value(value).ok_or_else(|| {
        IngestError::MalformedPayload(format!("field {field} is not a number: {value}"))
    })?;
    if qty < Decimal::ZERO {
        return Err(IngestError::MalformedPayload(format!(
            "field {field} must be non-negative, got: {qty}"
        )));
    }
    Ok(qty)
}

#[cfg(test)]
pub(crate) fn payload(json: serde_json::Value) -> RawPayload {
    match json {
        Value::Object(map) => map,
        other => panic!("test payload must be a JSON object, got: {other}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn registry_resolves_builtins() {
        let registry = AdapterRegistry::with_builtins();
        assert!(registry.resolve("PORK_ERP").is_ok());
        assert!(registry.resolve("BEEF_WMS").is_ok());
        assert!(registry.resolve("POULTRY_MES").is_ok());
        assert_eq!(
            registry.sources(),
            vec!["BEEF_WMS", "PORK_ERP", "POULTRY_MES"]
        );
    }

    #[test]
    fn unknown_source_is_an_error() {
        let registry = AdapterRegistry::with_builtins();
        assert!(matches!(
            registry.resolve("LAMB_ERP"),
            Err(IngestError::UnknownSource(s)) if s == "LAMB_ERP"
        ));
    }

    #[test]
    fn re_registering_replaces() {
        let mut registry = AdapterRegistry::new();
        registry.register(Arc::new(PorkErpAdapter));
        registry.register(Arc::new(PorkErpAdapter));
        assert_eq!(registry.sources(), vec!["PORK_ERP"]);
    }

    #[test]
    fn lookup_skips_nulls() {
        let payload = payload(json!({"event_time": null, "event_ts": "2026-01-05T06:30:00"}));
        let ts = parse_timestamp(&payload, &["event_time", "event_ts"], "event_ts").unwrap();
        assert_eq!(ts.to_string(), "2026-01-05 06:30:00");
    }

    #[test]
    fn rfc3339_timestamps_convert_to_utc() {
        let payload = payload(json!({"event_ts": "2026-01-05T06:30:00-05:00"}));
        let ts = parse_timestamp(&payload, &["event_ts"], "event_ts").unwrap();
        assert_eq!(ts.to_string(), "2026-01-05 11:30:00");
    }

    #[test]
    fn space_separated_timestamps_parse() {
        let payload = payload(json!({"event_ts": "2026-01-05 06:30:00.250"}));
        assert!(parse_timestamp(&payload, &["event_ts"], "event_ts").is_ok());
    }

    #[test]
    fn quantities_accept_numbers_and_strings() {
        let payload = payload(json!({"qty": 120.5, "scrap": "3.25"}));
        assert_eq!(
            quantity(&payload, &["qty"], "qty", None).unwrap(),
            Decimal::new(1205, 1)
        );
        assert_eq!(
            quantity(&payload, &["scrap"], "scrap", None).unwrap(),
            Decimal::new(325, 2)
        );
    }

    #[test]
    fn negative_quantities_are_rejected() {
        let payload = payload(json!({"qty": -1}));
        assert!(matches!(
            quantity(&payload, &["qty"], "qty", None),
            Err(IngestError::MalformedPayload(_))
        ));
    }

    #[test]
    fn missing_quantity_uses_default() {
        let payload = payload(json!({}));
        assert_eq!(
            quantity(&payload, &["scrap_qty"], "scrap_qty", Some(Decimal::ZERO)).unwrap(),
            Decimal::ZERO
        );
        assert!(quantity(&payload, &["qty"], "qty", None).is_err());
    }
}
