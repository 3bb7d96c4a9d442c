//! Error responses.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;

use crate::pipeline::IngestError;

impl IngestError {
    pub fn status_code(&self) -> StatusCode {
        match self.category() {
            "validation_error" => StatusCode::BAD_REQUEST,
            "access_denied" => StatusCode::UNAUTHORIZED,
            "ledger_confirmation_timeout" | "ledger_confirmation_error" => StatusCode::GATEWAY_TIMEOUT,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for IngestError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = json!({
            "error": self.category(),
            "message": self.to_string(),
        });
        (status, Json(body)).into_response()
    }
}
