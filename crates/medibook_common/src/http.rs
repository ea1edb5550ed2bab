// --- File: crates/medibook_common/src/http.rs ---
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

use crate::error::{HttpStatusCode, MedibookError};

pub mod client;

/// Extension trait for MedibookError to convert it to an Axum HTTP response.
pub trait IntoHttpResponse {
    /// Converts the error into an Axum HTTP response.
    fn into_http_response(self) -> Response;
}

impl IntoHttpResponse for MedibookError {
    fn into_http_response(self) -> Response {
        let status_code =
            StatusCode::from_u16(self.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

        let body = Json(json!({
            "error": {
                "message": self.to_string(),
                "code": self.code(),
                "status": status_code.as_u16(),
                "retryable": self.is_retryable(),
            }
        }));

        (status_code, body).into_response()
    }
}

impl IntoResponse for MedibookError {
    fn into_response(self) -> Response {
        self.into_http_response()
    }
}
