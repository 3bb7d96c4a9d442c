//! Request handlers.

use axum::body::Bytes;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

use crate::http::server::AppState;
use crate::http::{X_ANCHOR_OUTCOME, X_MEASUREMENT_HASH};
use crate::pipeline::{IngestError, Measurement};

/// `POST /notify`: ingest one measurement.
///
/// Success is an empty 200; the hash and outcome travel in headers.
pub async fn notify(State(state): State<AppState>, body: Bytes) -> Result<Response, IngestError> {
    let measurement = Measurement::from_slice(&body).inspect_err(|e| {
        tracing::debug!(error = %e, "Rejecting malformed notification");
    })?;

    let report = state.pipeline.ingest(&measurement).await?;

    Ok((
        StatusCode::OK,
        [
            (X_MEASUREMENT_HASH, report.hash.to_string()),
            (X_ANCHOR_OUTCOME, report.outcome.as_str().to_string()),
        ],
    )
        .into_response())
}

/// `GET /health`: liveness only.
pub async fn health() -> &'static str {
    "ok"
}
