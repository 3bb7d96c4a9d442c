//! ECIES over secp256k1 for the ledger administrator.
//!
//! Wire format:
//! ```text
//! ephemeral public key (65 bytes, SEC1 uncompressed)
//!   ‖ nonce (12 bytes)
//!   ‖ AES-256-GCM ciphertext (includes tag)
//! ```
//! The AES key is HKDF-SHA256(salt = ephemeral public key, ikm = ECDH x-coordinate).

use hkdf::Hkdf;
use k256::ecdh::{diffie_hellman, EphemeralSecret, SharedSecret};
use k256::elliptic_curve::sec1::ToEncodedPoint;
use k256::{PublicKey, SecretKey};
use rand::rngs::OsRng;
use sha2::Sha256;

use super::symmetric::{self, SymmetricKey, KEY_LEN};
use super::{CryptoError, CryptoResult};

/// Length of an uncompressed SEC1 public key.
pub const PUBLIC_KEY_LEN: usize = 65;

const HKDF_INFO: &[u8] = b"measurement-gateway-ecies-v1";

/// Parse a hex-encoded SEC1 public key (with or without `0x`).
pub fn parse_public_key(hex_key: &str) -> CryptoResult<PublicKey> {
    let raw = hex_key.trim();
    let raw = raw.strip_prefix("0x").unwrap_or(raw);
    let bytes = hex::decode(raw).map_err(|e| CryptoError::KeyFormat(format!("not hex: {}", e)))?;
    PublicKey::from_sec1_bytes(&bytes)
        .map_err(|_| CryptoError::KeyFormat("not a secp256k1 public key".to_string()))
}

/// Hex encoding of the uncompressed public key (no `0x`).
pub fn public_key_hex(key: &PublicKey) -> String {
    hex::encode(key.to_encoded_point(false).as_bytes())
}

/// Parse a hex-encoded 32-byte secret key (with or without `0x`).
pub fn parse_secret_key(hex_key: &str) -> CryptoResult<SecretKey> {
    let raw = hex_key.trim();
    let raw = raw.strip_prefix("0x").unwrap_or(raw);
    let bytes = hex::decode(raw).map_err(|e| CryptoError::KeyFormat(format!("not hex: {}", e)))?;
    SecretKey::from_slice(&bytes)
        .map_err(|_| CryptoError::KeyFormat("not a secp256k1 secret key".to_string()))
}

fn derive_key(shared: &SharedSecret, ephemeral: &[u8]) -> CryptoResult<SymmetricKey> {
    let hk = Hkdf::<Sha256>::new(Some(ephemeral), shared.raw_secret_bytes());
    let mut okm = [0u8; KEY_LEN];
    hk.expand(HKDF_INFO, &mut okm)
        .map_err(|e| CryptoError::Encryption(format!("key derivation failed: {}", e)))?;
    Ok(SymmetricKey::from_bytes(okm))
}

/// Encrypt `plaintext` so that only the holder of `recipient`'s secret key can read it.
pub fn encrypt(recipient: &PublicKey, plaintext: &[u8]) -> CryptoResult<Vec<u8>> {
    let ephemeral = EphemeralSecret::random(&mut OsRng);
    let ephemeral_public = ephemeral.public_key().to_encoded_point(false);
    let shared = ephemeral.diffie_hellman(recipient);

    let key = derive_key(&shared, ephemeral_public.as_bytes())?;
    let sealed = symmetric::encrypt(&key, plaintext)?;

    let mut out = Vec::with_capacity(PUBLIC_KEY_LEN + sealed.len());
    out.extend_from_slice(ephemeral_public.as_bytes());
    out.extend_from_slice(&sealed);
    Ok(out)
}

/// Decrypt the output of [`encrypt`].
pub fn decrypt(secret: &SecretKey, data: &[u8]) -> CryptoResult<Vec<u8>> {
    if data.len() < PUBLIC_KEY_LEN {
        return Err(CryptoError::Decryption(format!(
            "ciphertext too short ({} bytes)",
            data.len()
        )));
    }

    let (ephemeral_bytes, sealed) = data.split_at(PUBLIC_KEY_LEN);
    let ephemeral = PublicKey::from_sec1_bytes(ephemeral_bytes)
        .map_err(|_| CryptoError::Decryption("invalid ephemeral public key".to_string()))?;
    let shared = diffie_hellman(secret.to_nonzero_scalar(), ephemeral.as_affine());

    let key = derive_key(&shared, ephemeral_bytes)?;
    symmetric::decrypt(&key, sealed)
}
