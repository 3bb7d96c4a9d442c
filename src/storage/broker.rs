//! HTTP broker storage.
//!
//! The broker receives the signed measurement in plaintext and answers with
//! `{"url": "..."}`. Confidentiality at rest is the broker's concern.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use serde::Deserialize;
use url::Url;

use super::{reject, transport_error, Confidentiality, Locator, StorageBackend, StorageError, StorageResult};

#[derive(Debug, Deserialize)]
struct BrokerResponse {
    url: Option<String>,
}

#[derive(Debug, Clone)]
pub struct BrokerStore {
    client: reqwest::Client,
    url: Url,
}

impl BrokerStore {
    pub fn new(url: &str, timeout: Duration) -> StorageResult<Self> {
        let url = Url::parse(url)
            .map_err(|e| StorageError::Config(format!("invalid broker URL '{}': {}", url, e)))?;
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| StorageError::Config(e.to_string()))?;
        Ok(Self { client, url })
    }
}

#[async_trait]
impl StorageBackend for BrokerStore {
    fn kind(&self) -> &'static str {
        "broker"
    }

    fn confidentiality(&self) -> Confidentiality {
        Confidentiality::BackendDelegated
    }

    async fn store(&self, blob: Vec<u8>) -> StorageResult<Locator> {
        let response = self
            .client
            .post(self.url.clone())
            .header(CONTENT_TYPE, "application/octet-stream")
            .body(blob)
            .send()
            .await
            .map_err(transport_error)?;

        if !response.status().is_success() {
            return Err(reject(response).await);
        }

        let body: BrokerResponse = response
            .json()
            .await
            .map_err(|e| StorageError::MalformedResponse(e.to_string()))?;

        match body.url {
            Some(url) if !url.is_empty() => Ok(Locator::new(url)),
            _ => Err(StorageError::MalformedResponse(
                "response has no 'url' field".to_string(),
            )),
        }
    }
}
