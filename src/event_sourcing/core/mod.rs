// ============================================================================
// Event Sourcing Core
// ============================================================================
//
// No domain-specific code here: only the traits every aggregate implements
// and the envelope every persisted event travels in.
//
// ============================================================================

pub mod aggregate;
pub mod event;

pub use aggregate::Aggregate;
pub use event::{serialize_event, DomainEvent, EventEnvelope};
