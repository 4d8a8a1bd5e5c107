//! Base58 and Base58Check encoding.
//!
//! Base58Check appends the first four bytes of the payload's double
//! SHA-256 as a checksum; it is the encoding behind addresses and WIF
//! private keys. All checksum handling for the workspace lives here.

use crate::hash::sha256d;
use crate::PrimitivesError;

/// Number of checksum bytes appended by Base58Check.
const CHECKSUM_LEN: usize = 4;

/// Encode bytes with Bitcoin's Base58 alphabet.
///
/// Leading zero bytes become leading '1' characters.
pub fn encode(data: &[u8]) -> String {
    bs58::encode(data).into_string()
}

/// Decode a Base58 string to bytes.
pub fn decode(s: &str) -> Result<Vec<u8>, PrimitivesError> {
    bs58::decode(s)
        .into_vec()
        .map_err(|e| PrimitivesError::InvalidBase58(e.to_string()))
}

/// Encode bytes as Base58Check: `encode(data || sha256d(data)[..4])`.
pub fn check_encode(data: &[u8]) -> String {
    let checksum = sha256d(data);
    let mut payload = Vec::with_capacity(data.len() + CHECKSUM_LEN);
    payload.extend_from_slice(data);
    payload.extend_from_slice(&checksum[..CHECKSUM_LEN]);
    encode(&payload)
}

/// Decode a Base58Check string, verify the checksum, and return the
/// payload with the checksum stripped.
///
/// Fails `ChecksumMismatch` when the trailing four bytes do not match
/// the double SHA-256 of the payload.
pub fn check_decode(s: &str) -> Result<Vec<u8>, PrimitivesError> {
    let mut decoded = decode(s)?;
    if decoded.len() < CHECKSUM_LEN + 1 {
        return Err(PrimitivesError::InvalidBase58(format!(
            "base58check payload too short: {} bytes",
            decoded.len()
        )));
    }
    let split = decoded.len() - CHECKSUM_LEN;
    let expected = sha256d(&decoded[..split]);
    if decoded[split..] != expected[..CHECKSUM_LEN] {
        return Err(PrimitivesError::ChecksumMismatch);
    }
    decoded.truncate(split);
    Ok(decoded)
}
