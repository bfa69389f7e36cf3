use uuid::Uuid;

use super::value_objects::{OrderStatus, RequestKind};
use crate::error::{Classify, ErrorKind};
use crate::event_sourcing::StoreError;

// ============================================================================
// Order Business Rule Errors
// ============================================================================

#[derive(Debug, thiserror::Error)]
pub enum OrderError {
    #[error("order {0} not found")]
    NotFound(Uuid),

    #[error("business {0} not found")]
    BusinessNotFound(Uuid),

    #[error("order is {0}, no further status changes allowed")]
    TerminalState(OrderStatus),

    #[error("cannot move order from {from} to {to}")]
    InvalidTransition { from: OrderStatus, to: OrderStatus },

    #[error("order is {0}, partner can only respond while pending")]
    NotPending(OrderStatus),

    #[error("not allowed to act on this order")]
    Unauthorized,

    #[error("order is {0} and can no longer be cancelled")]
    NotCancellable(OrderStatus),

    #[error("order is {0}; returns open once delivered")]
    NotDelivered(OrderStatus),

    #[error("a {} request is already pending or approved", .0.as_str())]
    AlreadyPending(RequestKind),

    #[error("no open {} request", .0.as_str())]
    NoOpenRequest(RequestKind),

    #[error("line {0} is not a product line")]
    NotProductLine(Uuid),

    #[error("line {0} not in order")]
    LineNotFound(Uuid),

    #[error("line {0} was already refunded")]
    LineAlreadyRefunded(Uuid),

    #[error("at least one line must be selected")]
    NoLinesSelected,

    #[error("cart is empty")]
    CartEmpty,

    #[error("a delivery address is required for food and product orders")]
    AddressRequired,

    #[error("order not initialized")]
    NotInitialized,

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("upstream lookup failed: {0}")]
    Upstream(#[from] anyhow::Error),
}

impl Classify for OrderError {
    fn kind(&self) -> ErrorKind {
        match self {
            OrderError::NotFound(_) | OrderError::BusinessNotFound(_) | OrderError::LineNotFound(_) => {
                ErrorKind::NotFound
            }
            OrderError::Unauthorized => ErrorKind::Unauthorized,
            OrderError::NoLinesSelected | OrderError::CartEmpty | OrderError::AddressRequired => {
                ErrorKind::Validation
            }
            OrderError::TerminalState(_)
            | OrderError::InvalidTransition { .. }
            | OrderError::NotPending(_)
            | OrderError::NotCancellable(_)
            | OrderError::NotDelivered(_)
            | OrderError::AlreadyPending(_)
            | OrderError::NoOpenRequest(_)
            | OrderError::NotProductLine(_)
            | OrderError::LineAlreadyRefunded(_) => ErrorKind::StateGuard,
            OrderError::Store(e) => e.kind(),
            OrderError::NotInitialized | OrderError::Upstream(_) => ErrorKind::Infrastructure,
        }
    }

    fn code(&self) -> &'static str {
        match self {
            OrderError::NotFound(_) => "NOT_FOUND",
            OrderError::BusinessNotFound(_) => "BUSINESS_NOT_FOUND",
            OrderError::TerminalState(_) => "TERMINAL_STATE",
            OrderError::InvalidTransition { .. } => "INVALID_TRANSITION",
            OrderError::NotPending(_) => "NOT_PENDING",
            OrderError::Unauthorized => "UNAUTHORIZED",
            OrderError::NotCancellable(_) => "NOT_CANCELLABLE",
            OrderError::NotDelivered(_) => "NOT_DELIVERED",
            OrderError::AlreadyPending(_) => "ALREADY_PENDING",
            OrderError::NoOpenRequest(_) => "NO_OPEN_REQUEST",
            OrderError::NotProductLine(_) => "NOT_PRODUCT_LINE",
            OrderError::LineNotFound(_) => "LINE_NOT_FOUND",
            OrderError::LineAlreadyRefunded(_) => "LINE_ALREADY_REFUNDED",
            OrderError::NoLinesSelected => "NO_LINES_SELECTED",
            OrderError::CartEmpty => "CART_EMPTY",
            OrderError::AddressRequired => "ADDRESS_REQUIRED",
            OrderError::NotInitialized => "NOT_INITIALIZED",
            OrderError::Store(e) => e.code(),
            OrderError::Upstream(_) => "UPSTREAM_FAILURE",
        }
    }
}
