//! Deadline enforcement for external calls.

use std::future::Future;
use std::time::Duration;

use crate::blockchain::types::{BlockchainError, BlockchainResult};

/// Run a ledger RPC future under `limit`.
///
/// A timeout maps to [`BlockchainError::Timeout`]; the inner error is kept
/// as-is.
pub async fn with_rpc_deadline<T, F>(limit: Duration, call: F) -> BlockchainResult<T>
where
    F: Future<Output = BlockchainResult<T>>,
{
    match tokio::time::timeout(limit, call).await {
        Ok(result) => result,
        Err(_) => Err(BlockchainError::Timeout(limit.as_secs())),
    }
}
