//! Cryptographic envelope for measurements.
//!
//! # Data Flow
//! ```text
//! Measurement (JSON object)
//!     → envelope.rs   canonical bytes, Keccak-256 content hash, secp256k1 signature
//!     → symmetric.rs  AES-256-GCM under a fresh per-measurement key
//!     → asymmetric.rs ECIES (secp256k1 ECDH + HKDF-SHA256 + AES-256-GCM)
//!                     of the secret for the ledger administrator
//! ```
//!
//! Everything here is pure: no I/O, only CPU and the OS random source.

pub mod asymmetric;
pub mod envelope;
pub mod symmetric;

use thiserror::Error;

pub use asymmetric::{parse_public_key, public_key_hex};
pub use envelope::{canonicalize, content_hash, open, sign, signed_message, OpenedMessage, SIGNATURE_LEN};
pub use symmetric::SymmetricKey;

/// Errors raised while building or opening an envelope.
#[derive(Debug, Error)]
pub enum CryptoError {
    /// The measurement could not be serialized deterministically.
    #[error("canonicalization failed: {0}")]
    Canonicalization(String),

    /// The signing key rejected the digest.
    #[error("signing failed: {0}")]
    Signing(String),

    /// A public or private key could not be decoded.
    #[error("invalid key format: {0}")]
    KeyFormat(String),

    #[error("encryption failed: {0}")]
    Encryption(String),

    #[error("decryption failed: {0}")]
    Decryption(String),

    /// A signed message is truncated or its signature does not recover.
    #[error("invalid signature: {0}")]
    InvalidSignature(String),
}

pub type CryptoResult<T> = Result<T, CryptoError>;
