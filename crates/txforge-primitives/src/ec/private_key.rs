//! secp256k1 private key with WIF serialization and deterministic
//! ECDSA signing.

use k256::ecdsa::SigningKey;
use rand::rngs::OsRng;

use crate::base58;
use crate::ec::public_key::PublicKey;
use crate::ec::signature::Signature;
use crate::PrimitivesError;

/// Length of a serialized private key scalar in bytes.
const KEY_LEN: usize = 32;

/// WIF version prefix for mainnet keys.
pub const MAINNET_WIF_PREFIX: u8 = 0x80;

/// WIF version prefix for testnet keys.
pub const TESTNET_WIF_PREFIX: u8 = 0xef;

/// Flag byte appended to WIF payloads for compressed public keys.
const COMPRESSED_FLAG: u8 = 0x01;

/// A secp256k1 private key.
///
/// Wraps a k256 `SigningKey`. Signing is deterministic (RFC 6979) and
/// produces low-S signatures.
#[derive(Clone, Debug)]
pub struct PrivateKey {
    inner: SigningKey,
}

impl PrivateKey {
    /// Generate a random private key from the OS entropy source.
    pub fn new() -> Self {
        PrivateKey {
            inner: SigningKey::random(&mut OsRng),
        }
    }

    /// Create a private key from a raw 32-byte scalar.
    ///
    /// Fails if the length is wrong or the scalar is zero / not below
    /// the curve order.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, PrimitivesError> {
        if bytes.len() != KEY_LEN {
            return Err(PrimitivesError::InvalidPrivateKey(format!(
                "expected {} bytes, got {}",
                KEY_LEN,
                bytes.len()
            )));
        }
        let inner = SigningKey::from_bytes(bytes.into())
            .map_err(|e| PrimitivesError::InvalidPrivateKey(e.to_string()))?;
        Ok(PrivateKey { inner })
    }

    /// Create a private key from a 64-character hex string.
    pub fn from_hex(hex_str: &str) -> Result<Self, PrimitivesError> {
        if hex_str.is_empty() {
            return Err(PrimitivesError::InvalidPrivateKey(
                "private key hex is empty".to_string(),
            ));
        }
        Self::from_bytes(&hex::decode(hex_str)?)
    }

    /// Create a private key from a WIF (Wallet Import Format) string.
    ///
    /// Accepts compressed (34-byte payload) and uncompressed (33-byte
    /// payload) encodings with any network prefix; the Base58Check
    /// checksum is verified during decoding.
    pub fn from_wif(wif: &str) -> Result<Self, PrimitivesError> {
        let payload = base58::check_decode(wif)?;
        match payload.len() {
            // prefix + scalar + compression flag
            34 => {
                if payload[KEY_LEN + 1] != COMPRESSED_FLAG {
                    return Err(PrimitivesError::InvalidWif(
                        "invalid compression flag".to_string(),
                    ));
                }
            }
            // prefix + scalar
            33 => {}
            n => {
                return Err(PrimitivesError::InvalidWif(format!(
                    "invalid payload length {}",
                    n
                )));
            }
        }
        Self::from_bytes(&payload[1..1 + KEY_LEN])
    }

    /// Encode as a mainnet WIF string (compressed form).
    pub fn to_wif(&self) -> String {
        self.to_wif_prefix(MAINNET_WIF_PREFIX)
    }

    /// Encode as a WIF string with the given network prefix byte
    /// (compressed form).
    pub fn to_wif_prefix(&self, prefix: u8) -> String {
        let mut payload = Vec::with_capacity(1 + KEY_LEN + 1);
        payload.push(prefix);
        payload.extend_from_slice(&self.to_bytes());
        payload.push(COMPRESSED_FLAG);
        base58::check_encode(&payload)
    }

    /// The 32-byte big-endian scalar.
    pub fn to_bytes(&self) -> [u8; 32] {
        let mut out = [0u8; 32];
        out.copy_from_slice(&self.inner.to_bytes());
        out
    }

    /// The scalar as a 64-character lowercase hex string.
    pub fn to_hex(&self) -> String {
        hex::encode(self.to_bytes())
    }

    /// Derive the corresponding public key.
    pub fn pub_key(&self) -> PublicKey {
        PublicKey::from_k256_verifying_key(self.inner.verifying_key())
    }

    /// Sign a message hash (RFC 6979 deterministic nonce, low-S).
    ///
    /// The input should be a precomputed digest, typically 32 bytes.
    pub fn sign(&self, hash: &[u8]) -> Result<Signature, PrimitivesError> {
        Signature::sign(hash, self)
    }

    /// Access the underlying k256 `SigningKey`.
    pub(crate) fn signing_key(&self) -> &SigningKey {
        &self.inner
    }
}

impl Default for PrivateKey {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for PrivateKey {
    fn drop(&mut self) {
        use zeroize::Zeroize;
        // The scalar lives inside the SigningKey; wipe its byte form.
        let mut bytes = self.inner.to_bytes();
        bytes.zeroize();
    }
}

impl PartialEq for PrivateKey {
    fn eq(&self, other: &Self) -> bool {
        self.to_bytes() == other.to_bytes()
    }
}

impl Eq for PrivateKey {}
