//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs   (Axum router, timeout/body-limit/request-id/trace layers)
//!     → handlers.rs (POST /notify → IngestionPipeline, GET /health)
//!     → error.rs    (IngestError → status + JSON body)
//! ```

pub mod error;
pub mod handlers;
pub mod server;

pub use server::{build_router, AppState, HttpServer};

/// Content hash of the ingested measurement, `0x`-prefixed hex.
pub const X_MEASUREMENT_HASH: &str = "x-measurement-hash";

/// `anchored`, `resumed` or `already_recorded`.
pub const X_ANCHOR_OUTCOME: &str = "x-anchor-outcome";
