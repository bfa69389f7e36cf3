// ============================================================================
// Reservation (Dine-Out) Domain
// ============================================================================
//
// Table-booking requests against a business. Creation is conflict-checked
// against the business's hours and existing live bookings; the partner then
// accepts or rejects.
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
