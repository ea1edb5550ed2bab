//! Rejections and faults of the booking services
//!
//! A [`Rejection`] is a business-rule outcome: it never changes stored state
//! and carries a stable code. A [`ReservationFault`] is an infrastructure
//! failure the caller may retry.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use medibook_common::{IntoHttpResponse, MedibookError};
use medibook_db::DbError;
use serde::Serialize;
use serde_json::json;
use thiserror::Error;

/// Stable machine-readable reason for a [`Rejection`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RejectionCode {
    ValidationError,
    SlotFull,
    DuplicateBooking,
    SlotNotFound,
    AlreadyConfirmedOrUnknown,
    BookingNotFound,
    InvalidCapacity,
}

impl RejectionCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            RejectionCode::ValidationError => "VALIDATION_ERROR",
            RejectionCode::SlotFull => "SLOT_FULL",
            RejectionCode::DuplicateBooking => "DUPLICATE_BOOKING",
            RejectionCode::SlotNotFound => "SLOT_NOT_FOUND",
            RejectionCode::AlreadyConfirmedOrUnknown => "ALREADY_CONFIRMED_OR_UNKNOWN",
            RejectionCode::BookingNotFound => "BOOKING_NOT_FOUND",
            RejectionCode::InvalidCapacity => "INVALID_CAPACITY",
        }
    }

    /// Numeric `errCode` understood by existing clients
    pub fn legacy_err_code(&self) -> i32 {
        match self {
            RejectionCode::ValidationError => 1,
            RejectionCode::SlotFull => 2,
            RejectionCode::DuplicateBooking => 3,
            RejectionCode::SlotNotFound => 4,
            RejectionCode::AlreadyConfirmedOrUnknown => 2,
            RejectionCode::BookingNotFound => 2,
            RejectionCode::InvalidCapacity => 1,
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            RejectionCode::ValidationError => StatusCode::BAD_REQUEST,
            RejectionCode::SlotFull => StatusCode::CONFLICT,
            RejectionCode::DuplicateBooking => StatusCode::CONFLICT,
            RejectionCode::SlotNotFound => StatusCode::NOT_FOUND,
            RejectionCode::AlreadyConfirmedOrUnknown => StatusCode::NOT_FOUND,
            RejectionCode::BookingNotFound => StatusCode::NOT_FOUND,
            RejectionCode::InvalidCapacity => StatusCode::CONFLICT,
        }
    }
}

/// A request refused by a business rule
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Error)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[error("{message}")]
pub struct Rejection {
    pub code: RejectionCode,
    pub message: String,
}

impl Rejection {
    pub fn new(code: RejectionCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::new(RejectionCode::ValidationError, message)
    }

    pub fn missing(field: &str) -> Self {
        Self::validation(format!("Missing required parameter: {}", field))
    }
}

impl IntoResponse for Rejection {
    fn into_response(self) -> Response {
        let status = self.code.status();
        let body = Json(json!({
            "errCode": self.code.legacy_err_code(),
            "error": {
                "message": self.message,
                "code": self.code.as_str(),
                "status": status.as_u16(),
                "retryable": false,
            }
        }));
        (status, body).into_response()
    }
}

/// Infrastructure failure while serving a request
#[derive(Debug, Error)]
pub enum ReservationFault {
    /// A lock or pooled connection was not acquired in time
    #[error("Timed out waiting for {0}")]
    ContentionTimeout(String),

    /// The store failed
    #[error("Storage failure: {0}")]
    Storage(#[source] DbError),
}

impl ReservationFault {
    pub fn code(&self) -> &'static str {
        match self {
            ReservationFault::ContentionTimeout(_) => "CONTENTION_TIMEOUT",
            ReservationFault::Storage(_) => "STORAGE_ERROR",
        }
    }
}

impl From<DbError> for ReservationFault {
    fn from(err: DbError) -> Self {
        if err.is_timeout() {
            ReservationFault::ContentionTimeout(err.to_string())
        } else {
            ReservationFault::Storage(err)
        }
    }
}

impl From<ReservationFault> for MedibookError {
    fn from(fault: ReservationFault) -> Self {
        match fault {
            ReservationFault::ContentionTimeout(what) => MedibookError::ContentionTimeout(what),
            ReservationFault::Storage(err) => MedibookError::DatabaseError(err.to_string()),
        }
    }
}

impl IntoResponse for ReservationFault {
    fn into_response(self) -> Response {
        MedibookError::from(self).into_http_response()
    }
}

/// Either kind of failure, for operations without a dedicated outcome type
#[derive(Debug, Error)]
pub enum BookingError {
    #[error(transparent)]
    Rejected(#[from] Rejection),

    #[error(transparent)]
    Fault(#[from] ReservationFault),
}

impl From<DbError> for BookingError {
    fn from(err: DbError) -> Self {
        BookingError::Fault(err.into())
    }
}

impl IntoResponse for BookingError {
    fn into_response(self) -> Response {
        match self {
            BookingError::Rejected(rejection) => rejection.into_response(),
            BookingError::Fault(fault) => fault.into_response(),
        }
    }
}
