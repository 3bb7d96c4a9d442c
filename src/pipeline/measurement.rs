//! Validated measurement record.

use serde_json::Value;
use thiserror::Error;

/// Reasons a notification body is not an acceptable measurement.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum MeasurementError {
    #[error("body is not valid JSON: {0}")]
    Json(String),

    #[error("measurement must be a JSON object")]
    NotAnObject,

    #[error("field '{0}' is missing or not a string")]
    MissingField(&'static str),
}

/// A measurement as received, with the fields the gateway depends on pulled
/// out and checked.
#[derive(Debug, Clone, PartialEq)]
pub struct Measurement {
    id: String,
    date_observed: Option<String>,
    raw: Value,
}

impl Measurement {
    pub fn from_slice(body: &[u8]) -> Result<Self, MeasurementError> {
        let raw: Value =
            serde_json::from_slice(body).map_err(|e| MeasurementError::Json(e.to_string()))?;
        Self::from_value(raw)
    }

    pub fn from_value(raw: Value) -> Result<Self, MeasurementError> {
        if !raw.is_object() {
            return Err(MeasurementError::NotAnObject);
        }

        let id = match raw.get("id") {
            Some(Value::String(id)) => id.clone(),
            _ => return Err(MeasurementError::MissingField("id")),
        };
        // Any other shape of dateObserved is treated as absent.
        let date_observed = raw
            .get("dateObserved")
            .and_then(|observed| observed.get("value"))
            .and_then(Value::as_str)
            .map(str::to_string);

        Ok(Self {
            id,
            date_observed,
            raw,
        })
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn date_observed(&self) -> Option<&str> {
        self.date_observed.as_deref()
    }

    /// The full object as received. This is what gets hashed and signed.
    pub fn raw(&self) -> &Value {
        &self.raw
    }

    /// Provenance line anchored next to the record. Requires
    /// `dateObserved.value`.
    pub fn description(&self, gateway_id: &str) -> Result<String, MeasurementError> {
        let observed = self
            .date_observed
            .as_deref()
            .ok_or(MeasurementError::MissingField("dateObserved.value"))?;
        Ok(format!("{} by {} at {}", self.id, gateway_id, observed))
    }
}
