// ============================================================================
// Domain Layer
// ============================================================================
//
// Each aggregate (cart, order, reservation) has its own subdirectory with:
// - Value objects
// - Events
// - Commands
// - Errors
// - Aggregate implementation
// - Service (lock -> load -> command -> commit -> notify)
//
// `catalog` and `pricing` are the collaborators the aggregates price against.
//
// ============================================================================

pub mod cart;
pub mod catalog;
pub mod order;
pub mod pricing;
pub mod reservation;
