//! Content-addressed storage through the IPFS HTTP API.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use serde::Deserialize;
use url::Url;

use super::{reject, transport_error, Confidentiality, Locator, StorageBackend, StorageError, StorageResult};

/// Response of `POST /api/v0/add`.
#[derive(Debug, Deserialize)]
struct AddResponse {
    #[serde(rename = "Hash")]
    hash: String,
}

/// IPFS node client. Cheap to clone; the HTTP pool is shared.
#[derive(Debug, Clone)]
pub struct IpfsStore {
    client: reqwest::Client,
    add_url: Url,
}

impl IpfsStore {
    /// `api_url` is the node's API base, e.g. `http://127.0.0.1:5001`.
    pub fn new(api_url: &str, timeout: Duration) -> StorageResult<Self> {
        let mut base = Url::parse(api_url)
            .map_err(|e| StorageError::Config(format!("invalid IPFS API URL '{}': {}", api_url, e)))?;
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }
        let mut add_url = base
            .join("api/v0/add")
            .map_err(|e| StorageError::Config(e.to_string()))?;
        add_url.set_query(Some("pin=true"));

        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| StorageError::Config(e.to_string()))?;

        Ok(Self { client, add_url })
    }
}

#[async_trait]
impl StorageBackend for IpfsStore {
    fn kind(&self) -> &'static str {
        "ipfs"
    }

    fn confidentiality(&self) -> Confidentiality {
        Confidentiality::ClientEncrypted
    }

    async fn store(&self, blob: Vec<u8>) -> StorageResult<Locator> {
        let form = Form::new().part("file", Part::bytes(blob).file_name("measurement"));

        let response = self
            .client
            .post(self.add_url.clone())
            .multipart(form)
            .send()
            .await
            .map_err(transport_error)?;

        if !response.status().is_success() {
            return Err(reject(response).await);
        }

        let added: AddResponse = response
            .json()
            .await
            .map_err(|e| StorageError::MalformedResponse(e.to_string()))?;
        if added.hash.is_empty() {
            return Err(StorageError::MalformedResponse("empty content identifier".to_string()));
        }

        Ok(Locator::new(added.hash))
    }
}
