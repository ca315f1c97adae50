use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum FeedParseError {
    #[error("bad pricing CSV: {0}")]
    Csv(#[from] csv::Error),
    #[error("bad row at line {line}: {reason}")]
    BadRow { line: u64, reason: String },
}

/// One row of a `pricing_by_plant_*.csv` feed file.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct PricingRow {
    pub plant_code: String,
    pub canonical_sku: String,
    pub price_per_lb: Decimal,
    #[serde(default = "default_currency")]
    pub currency: String,
    pub effective_start_dt: NaiveDate,
    #[serde(default, deserialize_with = "empty_as_none")]
    pub effective_end_dt: Option<NaiveDate>,
    #[serde(deserialize_with = "loose_bool")]
    pub is_current: bool,
}

fn default_currency() -> String {
    "USD".to_string()
}

fn empty_as_none<'de, D>(deserializer: D) -> Result<Option<NaiveDate>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    match raw.as_deref().map(str::trim) {
        None | Some("") => Ok(None),
        Some(s) => s
            .parse::<NaiveDate>()
            .map(Some)
            .map_err(serde::de::Error::custom),
    }
}

// The feed writers disagree on how to spell a boolean.
fn loose_bool<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    Ok(matches!(
        raw.trim().to_lowercase().as_str(),
        "1" | "true" | "t" | "yes" | "y"
    ))
}

/// Parse a pricing feed file. Fails on the first malformed row; the caller
/// records the failure in the feed state table and skips the file.
pub fn parse_pricing_csv(data: &[u8]) -> Result<Vec<PricingRow>, FeedParseError> {
    // Excel exports lead with a UTF-8 BOM.
    let data = data.strip_prefix(b"\xef\xbb\xbf").unwrap_or(data);

    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(data);

    let mut rows = Vec::new();
    for result in reader.deserialize() {
        let row: PricingRow = result?;
        // +2: one for the header, one because positions are zero-based
        let line = rows.len() as u64 + 2;
        if row.plant_code.is_empty() || row.canonical_sku.is_empty() {
            return Err(FeedParseError::BadRow {
                line,
                reason: "plant_code and canonical_sku must be non-empty".to_string(),
            });
        }
        if row.price_per_lb < Decimal::ZERO {
            return Err(FeedParseError::BadRow {
                line,
                reason: format!("negative price_per_lb: {}", row.price_per_lb),
            });
        }
        rows.push(row);
    }

    Ok(rows)
}
