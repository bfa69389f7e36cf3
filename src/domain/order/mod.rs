// ============================================================================
// Order Domain
// ============================================================================
//
// Immutable-priced, mutable-status record created from a cart snapshot.
// Owns the status state machine, the append-only transaction ledger and the
// refund/exchange sub-machine.
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
