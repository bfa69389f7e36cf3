// ============================================================================
// Pricing Calculator
// ============================================================================
//
// Pure functions: (catalog item, selection, quantity, tax rate) resolve into
// line terms, and terms plus the commission rate price into line amounts.
// No I/O; callers look up the item, tax rate and commission rate first.
//
// ============================================================================

pub mod calculator;
pub mod errors;

pub use calculator::*;
pub use errors::*;
