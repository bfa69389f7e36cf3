use crate::error::{Classify, ErrorKind};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PricingError {
    #[error("no variant matches size {size:?} and color {color:?}")]
    VariantNotFound {
        size: Option<String>,
        color: Option<String>,
    },

    #[error("check-out must be at least one night after check-in")]
    InvalidDates,

    #[error("resolved price must be positive")]
    InvalidPrice,

    #[error("invalid quantity {0}")]
    InvalidQuantity(i64),

    #[error("guest count {guests} outside 1..={max}")]
    InvalidGuests { guests: u32, max: u32 },

    #[error("selection does not fit a {0} item")]
    SelectionMismatch(&'static str),
}

impl Classify for PricingError {
    fn kind(&self) -> ErrorKind {
        ErrorKind::Validation
    }

    fn code(&self) -> &'static str {
        match self {
            PricingError::VariantNotFound { .. } => "VARIANT_NOT_FOUND",
            PricingError::InvalidDates => "INVALID_DATES",
            PricingError::InvalidPrice => "INVALID_PRICE",
            PricingError::InvalidQuantity(_) => "INVALID_QUANTITY",
            PricingError::InvalidGuests { .. } => "INVALID_GUESTS",
            PricingError::SelectionMismatch(_) => "SELECTION_MISMATCH",
        }
    }
}
