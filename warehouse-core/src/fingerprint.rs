use std::fmt;

use rust_decimal::Decimal;
use sha2::{Digest, Sha256};

use crate::types::ProductionEvent;

// Unit separator keeps adjacent fields from ever colliding
// ("AB" + "C" vs "A" + "BC").
const FIELD_SEP: u8 = 0x1f;

/// A SHA-256 content fingerprint, hex encoded.
///
/// For production events the fingerprint covers exactly the identity-bearing
/// fields: source system, source event id, event timestamp, plant, source
/// item id, the normalized quantities and the canonical unit. This field set
/// is the duplicate-detection contract; adding or removing a field changes
/// which deliveries count as duplicates.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Fingerprint(String);

impl Fingerprint {
    /// Fingerprint a canonical production event. Quantities must already be
    /// normalized to pounds.
    pub fn of_production_event(event: &ProductionEvent) -> Self {
        let mut hasher = Sha256::new();
        let fields = [
            event.source_system.as_str(),
            event.source_event_id.as_str(),
            &event.event_ts.to_string(),
            event.plant_code.as_str(),
            event.source_item_id.as_str(),
            &canonical_decimal(event.produced_qty),
            &canonical_decimal(event.scrap_qty),
            &event.uom.to_uppercase(),
        ];
        for (i, field) in fields.iter().enumerate() {
            if i > 0 {
                hasher.update([FIELD_SEP]);
            }
            hasher.update(field.as_bytes());
        }
        Fingerprint(hex::encode(hasher.finalize()))
    }

    /// Fingerprint an opaque byte blob (pricing feed files).
    pub fn of_bytes(data: &[u8]) -> Self {
        Fingerprint(hex::encode(Sha256::digest(data)))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// Strip trailing zeros so 100, 100.0 and 100.00 hash identically.
fn canonical_decimal(value: Decimal) -> String {
    value.normalize().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use rust_decimal::Decimal;

    fn event() -> ProductionEvent {
        ProductionEvent {
            source_system: "PORK_ERP".to_string(),
            source_event_id: "P-0001".to_string(),
            event_ts: NaiveDate::from_ymd_opt(2026, 2, 21)
                .unwrap()
                .and_hms_opt(9, 0, 0)
                .unwrap(),
            plant_code: "VA01".to_string(),
            source_item_id: "ITM-100221".to_string(),
            source_item_desc: Some("LOIN BNLS".to_string()),
            produced_qty: Decimal::new(1000, 1), // 100.0
            scrap_qty: Decimal::new(25, 1),      // 2.5
            uom: "LB".to_string(),
        }
    }

    #[test]
    fn fingerprint_is_deterministic() {
        let a = Fingerprint::of_production_event(&event());
        let b = Fingerprint::of_production_event(&event());
        assert_eq!(a, b);
        assert_eq!(a.as_str().len(), 64);
    }

    #[test]
    fn identity_fields_change_the_fingerprint() {
        let base = Fingerprint::of_production_event(&event());

        let mut changed = event();
        changed.source_event_id = "P-0002".to_string();
        assert_ne!(base, Fingerprint::of_production_event(&changed));

        let mut changed = event();
        changed.plant_code = "NC02".to_string();
        assert_ne!(base, Fingerprint::of_production_event(&changed));

        let mut changed = event();
        changed.produced_qty = Decimal::new(1001, 1);
        assert_ne!(base, Fingerprint::of_production_event(&changed));
    }

    #[test]
    fn description_is_not_identity_bearing() {
        let base = Fingerprint::of_production_event(&event());
        let mut changed = event();
        changed.source_item_desc = None;
        assert_eq!(base, Fingerprint::of_production_event(&changed));
    }

    #[test]
    fn quantity_scale_does_not_matter() {
        let base = Fingerprint::of_production_event(&event());
        let mut rescaled = event();
        rescaled.produced_qty = Decimal::new(100_00, 2); // 100.00
        assert_eq!(base, Fingerprint::of_production_event(&rescaled));
    }

    #[test]
    fn unit_comparison_is_case_insensitive() {
        let base = Fingerprint::of_production_event(&event());
        let mut lowered = event();
        lowered.uom = "lb".to_string();
        assert_eq!(base, Fingerprint::of_production_event(&lowered));
    }

    #[test]
    fn byte_fingerprints_match_known_sha256() {
        // sha256 of the empty string
        assert_eq!(
            Fingerprint::of_bytes(b"").as_str(),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }
}
