// ============================================================================
// Event Sourcing Infrastructure
// ============================================================================
//
// Generic aggregate/event plumbing shared by carts, orders and reservations.
// Domain-specific code lives in src/domain/.
//
// ============================================================================

mod core;
mod store;

pub use self::core::*;
pub use self::store::*;
