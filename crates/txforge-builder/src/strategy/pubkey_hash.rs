//! Pay-to-pubkey-hash signing strategy.
//!
//! The unlocking script for a pubkey-hash output is `<sig> <pubkey>`. At
//! registration time the signature is not yet known, so the input carries
//! a placeholder with OP_0 where the signature will go; signing replaces
//! that first chunk with the encoded signature.

use txforge_primitives::ec::PublicKey;
use txforge_script::opcodes::OP_0;
use txforge_script::Script;

/// Build the placeholder unlocking script for a pubkey-hash input:
/// OP_0 followed by the compressed public key.
pub fn unlock_placeholder(pub_key: &PublicKey) -> Script {
    let key_bytes = pub_key.to_compressed();
    let mut bytes = Vec::with_capacity(2 + key_bytes.len());
    bytes.push(OP_0);
    bytes.push(key_bytes.len() as u8);
    bytes.extend_from_slice(&key_bytes);
    Script::from_bytes(bytes)
}
