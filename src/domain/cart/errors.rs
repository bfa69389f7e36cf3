use uuid::Uuid;

use crate::domain::pricing::PricingError;
use crate::error::{Classify, ErrorKind};
use crate::event_sourcing::StoreError;

#[derive(Debug, thiserror::Error)]
pub enum CartError {
    #[error("cart {0} not found")]
    NotFound(Uuid),

    #[error("item {0} not found")]
    ItemNotFound(Uuid),

    #[error("line {0} not in cart")]
    LineNotFound(Uuid),

    #[error("a delivery address is required for food and product lines")]
    AddressRequired,

    #[error("stay dates must be in the future with check-in before check-out")]
    InvalidDates,

    #[error("cart already holds items from business {current}")]
    BusinessMismatch { current: Uuid, requested: Uuid },

    #[error("invalid quantity {0}")]
    InvalidQuantity(i64),

    #[error(transparent)]
    Pricing(#[from] PricingError),

    #[error("cart not initialized")]
    NotInitialized,

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("upstream lookup failed: {0}")]
    Upstream(#[from] anyhow::Error),
}

impl Classify for CartError {
    fn kind(&self) -> ErrorKind {
        match self {
            CartError::NotFound(_) | CartError::ItemNotFound(_) | CartError::LineNotFound(_) => {
                ErrorKind::NotFound
            }
            CartError::AddressRequired
            | CartError::InvalidDates
            | CartError::BusinessMismatch { .. }
            | CartError::InvalidQuantity(_) => ErrorKind::Validation,
            CartError::Pricing(e) => e.kind(),
            CartError::Store(e) => e.kind(),
            CartError::NotInitialized | CartError::Upstream(_) => ErrorKind::Infrastructure,
        }
    }

    fn code(&self) -> &'static str {
        match self {
            CartError::NotFound(_) => "CART_NOT_FOUND",
            CartError::ItemNotFound(_) => "ITEM_NOT_FOUND",
            CartError::LineNotFound(_) => "LINE_NOT_FOUND",
            CartError::AddressRequired => "ADDRESS_REQUIRED",
            CartError::InvalidDates => "INVALID_DATES",
            CartError::BusinessMismatch { .. } => "BUSINESS_MISMATCH",
            CartError::InvalidQuantity(_) => "INVALID_QUANTITY",
            CartError::Pricing(e) => e.code(),
            CartError::Store(e) => e.code(),
            CartError::NotInitialized => "NOT_INITIALIZED",
            CartError::Upstream(_) => "UPSTREAM_FAILURE",
        }
    }
}
