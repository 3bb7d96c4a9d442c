//! Measurement ingestion.
//!
//! # Data Flow
//! ```text
//! request body
//!     → measurement.rs (validate: id, dateObserved.value)
//!     → ingest.rs      access check → sign → ledger pre-check → admin key
//!                      → encrypt → store → encrypt secret → anchor
//! ```
//!
//! Stored payloads are never deleted when a later ledger step fails.

pub mod ingest;
pub mod measurement;

pub use ingest::{IngestError, IngestReport, IngestionPipeline};
pub use measurement::{Measurement, MeasurementError};
