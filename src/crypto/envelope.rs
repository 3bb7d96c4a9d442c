//! Canonical encoding, content hashing and measurement signatures.

use alloy::primitives::{keccak256, Address, B256};
use alloy::signers::local::PrivateKeySigner;
use alloy::signers::{Signature, SignerSync};

use super::{CryptoError, CryptoResult};

/// Length of a recoverable secp256k1 signature (r ‖ s ‖ v).
pub const SIGNATURE_LEN: usize = 65;

/// Serialize a JSON value deterministically (RFC 8785).
///
/// Object keys are sorted recursively, so two measurements that differ only
/// in field order produce identical bytes.
pub fn canonicalize(value: &serde_json::Value) -> CryptoResult<Vec<u8>> {
    serde_json_canonicalizer::to_vec(value)
        .map_err(|e| CryptoError::Canonicalization(e.to_string()))
}

/// Keccak-256 digest of the canonical bytes. This is the ledger key.
pub fn content_hash(canonical: &[u8]) -> B256 {
    keccak256(canonical)
}

/// Sign the content hash of `canonical` with the gateway key.
pub fn sign(signer: &PrivateKeySigner, canonical: &[u8]) -> CryptoResult<[u8; SIGNATURE_LEN]> {
    let digest = content_hash(canonical);
    let signature = signer
        .sign_hash_sync(&digest)
        .map_err(|e| CryptoError::Signing(e.to_string()))?;
    Ok(signature.as_bytes())
}

/// Append the signature to the canonical bytes.
pub fn signed_message(canonical: &[u8], signature: &[u8; SIGNATURE_LEN]) -> Vec<u8> {
    let mut message = Vec::with_capacity(canonical.len() + SIGNATURE_LEN);
    message.extend_from_slice(canonical);
    message.extend_from_slice(signature);
    message
}

/// A signed message split back into its parts.
#[derive(Debug, Clone)]
pub struct OpenedMessage {
    pub canonical: Vec<u8>,
    pub hash: B256,
    /// Address recovered from the signature.
    pub signer: Address,
}

/// Split a signed message and recover the address that signed it.
pub fn open(message: &[u8]) -> CryptoResult<OpenedMessage> {
    if message.len() <= SIGNATURE_LEN {
        return Err(CryptoError::InvalidSignature(format!(
            "message of {} bytes cannot carry a {}-byte signature",
            message.len(),
            SIGNATURE_LEN
        )));
    }

    let (canonical, raw_signature) = message.split_at(message.len() - SIGNATURE_LEN);
    let signature = Signature::try_from(raw_signature)
        .map_err(|e| CryptoError::InvalidSignature(e.to_string()))?;
    let hash = content_hash(canonical);
    let signer = signature
        .recover_address_from_prehash(&hash)
        .map_err(|e| CryptoError::InvalidSignature(e.to_string()))?;

    Ok(OpenedMessage {
        canonical: canonical.to_vec(),
        hash,
        signer,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    // Anvil's first account; publicly known, test use only
    const TEST_KEY: &str = "ac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";

    fn test_signer() -> PrivateKeySigner {
        TEST_KEY.parse().unwrap()
    }

    #[test]
    fn test_hash_ignores_field_order() {
        let a = json!({"id": "sensor-1", "temperature": {"value": 21.5, "unit": "C"}});
        let b = json!({"temperature": {"unit": "C", "value": 21.5}, "id": "sensor-1"});

        let bytes_a = canonicalize(&a).unwrap();
        let bytes_b = canonicalize(&b).unwrap();
        assert_eq!(bytes_a, bytes_b);
        assert_eq!(content_hash(&bytes_a), content_hash(&bytes_b));
    }

    #[test]
    fn test_hash_is_stable() {
        let value = json!({"id": "sensor-1", "dateObserved": {"value": "2023-01-01T00:00:00Z"}});
        let first = content_hash(&canonicalize(&value).unwrap());
        for _ in 0..10 {
            assert_eq!(content_hash(&canonicalize(&value).unwrap()), first);
        }
    }

    #[test]
    fn test_canonical_form() {
        let value = json!({"b": 1, "a": [true, null]});
        assert_eq!(canonicalize(&value).unwrap(), br#"{"a":[true,null],"b":1}"#.to_vec());
    }

    #[test]
    fn test_sign_and_open() {
        let signer = test_signer();
        let canonical = canonicalize(&json!({"id": "sensor-1"})).unwrap();

        let signature = sign(&signer, &canonical).unwrap();
        let message = signed_message(&canonical, &signature);
        assert_eq!(message.len(), canonical.len() + SIGNATURE_LEN);
        assert!(message.starts_with(&canonical));

        let opened = open(&message).unwrap();
        assert_eq!(opened.canonical, canonical);
        assert_eq!(opened.signer, signer.address());
        assert_eq!(opened.hash, content_hash(&canonical));
    }

    #[test]
    fn test_open_detects_tampering() {
        let signer = test_signer();
        let canonical = canonicalize(&json!({"id": "sensor-1"})).unwrap();
        let signature = sign(&signer, &canonical).unwrap();

        let mut message = signed_message(&canonical, &signature);
        message[2] ^= 0x01;

        // Either the signature no longer recovers, or it recovers a different signer
        match open(&message) {
            Ok(opened) => assert_ne!(opened.signer, signer.address()),
            Err(e) => assert!(matches!(e, CryptoError::InvalidSignature(_))),
        }
    }

    #[test]
    fn test_open_rejects_short_message() {
        let err = open(&[0u8; SIGNATURE_LEN]).unwrap_err();
        assert!(matches!(err, CryptoError::InvalidSignature(_)));
    }
}
