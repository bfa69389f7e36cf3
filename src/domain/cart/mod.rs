// ============================================================================
// Cart Domain
// ============================================================================
//
// The mutable pre-checkout container. Totals are never edited directly:
// every event re-prices every line against the commission rate it carries.
//
// ============================================================================

pub mod aggregate;
pub mod commands;
pub mod errors;
pub mod events;
pub mod service;
pub mod value_objects;

pub use aggregate::*;
pub use commands::*;
pub use errors::*;
pub use events::*;
pub use service::*;
pub use value_objects::*;
