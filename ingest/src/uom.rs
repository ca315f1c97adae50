//! Unit-of-measure normalization. Every quantity in the warehouse is stored
//! in pounds; the conversion table is closed on purpose — an unknown unit is
//! a rejected event, not a guessed factor.

use rust_decimal::Decimal;

use crate::api::IngestError;

/// Digits kept after the decimal point on stored quantities.
pub const QTY_SCALE: u32 = 4;

fn factor(uom: &str) -> Option<Decimal> {
    match uom.to_uppercase().as_str() {
        "LB" => Some(Decimal::ONE),
        "KG" => Some(Decimal::new(220_462, 5)),
        "OZ" => Some(Decimal::new(625, 4)),
        "G" => Some(Decimal::new(220_462, 8)),
        _ => None,
    }
}

pub fn to_pounds(qty: Decimal, uom: &str) -> Result<Decimal, IngestError> {
    let factor = factor(uom).ok_or_else(|| IngestError::UnsupportedUnit(uom.to_string()))?;
    Ok((qty * factor).round_dp(QTY_SCALE))
}
