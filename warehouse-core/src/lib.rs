pub mod ops;

// We do this pattern (privately use a module, then re-export parts of it) so we
// can refactor the internals without breaking the public API.

// Types
mod types;
pub use types::FactProduction;
pub use types::PriceObservation;
pub use types::PriceOutcome;
pub use types::PriceRecord;
pub use types::ProductionEvent;
pub use types::WriteOutcome;

// Errors
mod error;
pub use error::WarehouseError;

// Content fingerprinting for duplicate detection
mod fingerprint;
pub use fingerprint::Fingerprint;

// Pricing feed CSV parsing
mod pricing_feed;
pub use pricing_feed::parse_pricing_csv;
pub use pricing_feed::FeedParseError;
pub use pricing_feed::PricingRow;

/// Embedded schema migrations, applied by the service at startup.
pub static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!("./migrations");

/// The canonical unit every quantity is normalized to before persistence.
pub const CANONICAL_UOM: &str = "LB";
