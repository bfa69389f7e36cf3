use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use std::fmt;

use crate::domain::cart::CartError;
use crate::domain::order::OrderError;
use crate::domain::reservation::ReservationError;
use crate::error::{Classify, ErrorKind};

/// Error body returned by every endpoint: `{"code": ..., "message": ...}`.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    code: &'static str,
    message: String,
}

impl ApiError {
    pub fn unauthenticated(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::UNAUTHORIZED,
            code: "UNAUTHENTICATED",
            message: message.into(),
        }
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::FORBIDDEN,
            code: "UNAUTHORIZED",
            message: message.into(),
        }
    }

    pub fn code(&self) -> &'static str {
        self.code
    }

    fn classified<E: Classify + fmt::Display>(error: E) -> Self {
        let kind = error.kind();
        let status = match kind {
            ErrorKind::Validation => StatusCode::UNPROCESSABLE_ENTITY,
            ErrorKind::StateGuard | ErrorKind::Conflict => StatusCode::CONFLICT,
            ErrorKind::NotFound => StatusCode::NOT_FOUND,
            ErrorKind::Unauthorized => StatusCode::FORBIDDEN,
            ErrorKind::Infrastructure => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let message = if kind == ErrorKind::Infrastructure {
            tracing::error!(code = error.code(), error = %error, "Request failed");
            "internal error".to_string()
        } else {
            error.to_string()
        };

        Self {
            status,
            code: error.code(),
            message,
        }
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code, self.message)
    }
}

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        self.status
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status).json(serde_json::json!({
            "code": self.code,
            "message": self.message,
        }))
    }
}

impl From<CartError> for ApiError {
    fn from(error: CartError) -> Self {
        Self::classified(error)
    }
}

impl From<OrderError> for ApiError {
    fn from(error: OrderError) -> Self {
        Self::classified(error)
    }
}

impl From<ReservationError> for ApiError {
    fn from(error: ReservationError) -> Self {
        Self::classified(error)
    }
}
