use serde::Serialize;

// ============================================================================
// Error Taxonomy
// ============================================================================
//
// Every domain error maps onto one of these kinds so callers can tell
// "your input was wrong" apart from "the object's state forbids this".
//
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Caller-fixable input problem
    Validation,
    /// Input was fine, the aggregate's current state forbids the operation
    StateGuard,
    NotFound,
    Unauthorized,
    /// Lost a race with another writer; the caller may resubmit
    Conflict,
    Infrastructure,
}

/// Implemented by every error surfaced from a service operation.
pub trait Classify {
    fn kind(&self) -> ErrorKind;

    /// Stable machine-readable reason code, e.g. `VARIANT_NOT_FOUND`
    fn code(&self) -> &'static str;
}
