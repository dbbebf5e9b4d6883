// --- File: crates/saunabook_common/src/http.rs ---
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

use crate::error::{HttpStatusCode, SaunaError};

/// Extension trait for SaunaError to convert it to an Axum HTTP response.
pub trait IntoHttpResponse {
    /// Converts the error into an Axum HTTP response.
    fn into_http_response(self) -> Response;
}

impl IntoHttpResponse for SaunaError {
    fn into_http_response(self) -> Response {
        let status_code =
            StatusCode::from_u16(self.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

        // The UI renders a different message per code, so the code is part of the body.
        let body = Json(json!({
            "error": {
                "code": self.code(),
                "reason": self.cancel_reason(),
                "message": self.to_string(),
                "status": status_code.as_u16(),
            }
        }));

        (status_code, body).into_response()
    }
}

/// Implement IntoResponse for SaunaError to make it easier to use in Axum handlers.
impl IntoResponse for SaunaError {
    fn into_response(self) -> Response {
        self.into_http_response()
    }
}

/// Converts a `Result<T, SaunaError>` into the JSON result shape every handler returns.
pub fn handle_json_result<T>(result: Result<T, SaunaError>) -> Result<Json<T>, SaunaError>
where
    T: serde::Serialize,
{
    result.map(Json)
}
