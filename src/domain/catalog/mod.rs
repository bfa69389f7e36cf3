// ============================================================================
// Catalog - Items, Categories, Businesses
// ============================================================================
//
// Read-only view of the catalog the order engine prices against, plus the
// commission-rate source. The catalog itself is managed elsewhere; this
// crate ships an in-memory implementation seeded from JSON.
//
// ============================================================================

pub mod models;
pub mod rates;
pub mod store;

pub use models::*;
pub use rates::*;
pub use store::*;
