//! Object storage for measurement payloads.
//!
//! # Variants
//! ```text
//! ipfs.rs    content-addressed store; receives AES-GCM ciphertext, returns a CID
//! broker.rs  HTTP broker; receives the signed plaintext, returns a URL
//! ```
//!
//! Both implement [`StorageBackend`] and are selected once at startup. They
//! differ in trust boundary: with the broker, confidentiality of the payload
//! is the broker's responsibility, which [`Confidentiality`] makes explicit.

pub mod broker;
pub mod ipfs;

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

use crate::config::StorageConfig;

pub use broker::BrokerStore;
pub use ipfs::IpfsStore;

/// Where a stored payload can be retrieved (CID or URL).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Locator(String);

impl Locator {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn as_bytes(&self) -> &[u8] {
        self.0.as_bytes()
    }
}

impl fmt::Display for Locator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Who keeps the payload confidential.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Confidentiality {
    /// The gateway encrypts before upload; the backend only sees ciphertext.
    ClientEncrypted,
    /// The backend receives the signed plaintext and must protect it itself.
    BackendDelegated,
}

/// Errors returned by storage backends.
#[derive(Debug, Error)]
pub enum StorageError {
    /// The backend could not be reached or did not answer in time.
    #[error("storage unavailable: {0}")]
    Unavailable(String),

    /// The backend answered with a non-success status.
    #[error("storage rejected the payload with status {status}: {body}")]
    Rejected { status: u16, body: String },

    /// The backend answered 2xx but the body carries no usable locator.
    #[error("malformed storage response: {0}")]
    MalformedResponse(String),

    #[error("invalid storage configuration: {0}")]
    Config(String),
}

pub type StorageResult<T> = Result<T, StorageError>;

/// Store-and-locate capability shared by all backends.
#[async_trait]
pub trait StorageBackend: Send + Sync {
    /// Short name for logs and metrics.
    fn kind(&self) -> &'static str;

    fn confidentiality(&self) -> Confidentiality;

    /// Persist `blob` and return its locator.
    async fn store(&self, blob: Vec<u8>) -> StorageResult<Locator>;
}

/// Build the backend selected in the configuration.
pub fn from_config(config: &StorageConfig) -> StorageResult<Arc<dyn StorageBackend>> {
    let backend: Arc<dyn StorageBackend> = match config {
        StorageConfig::Ipfs { api_url, timeout_secs } => {
            Arc::new(IpfsStore::new(api_url, Duration::from_secs(*timeout_secs))?)
        }
        StorageConfig::Broker { url, timeout_secs } => {
            Arc::new(BrokerStore::new(url, Duration::from_secs(*timeout_secs))?)
        }
    };
    Ok(backend)
}

/// Map a transport failure from reqwest.
pub(crate) fn transport_error(e: reqwest::Error) -> StorageError {
    if e.is_timeout() {
        StorageError::Unavailable(format!("request timed out: {}", e))
    } else {
        StorageError::Unavailable(e.to_string())
    }
}

/// Longest prefix of a backend error body kept in [`StorageError::Rejected`].
pub const MAX_REJECTION_BODY: usize = 256;

/// Turn a non-success response into [`StorageError::Rejected`].
pub(crate) async fn reject(response: reqwest::Response) -> StorageError {
    let status = response.status().as_u16();
    let body = response.text().await.unwrap_or_default();
    StorageError::Rejected {
        status,
        body: truncate_body(body),
    }
}

fn truncate_body(mut body: String) -> String {
    if body.len() > MAX_REJECTION_BODY {
        let mut end = MAX_REJECTION_BODY;
        while !body.is_char_boundary(end) {
            end -= 1;
        }
        body.truncate(end);
        body.push_str("...");
    }
    body
}
