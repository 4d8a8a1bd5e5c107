//! Pay-to-script-hash multisig signing strategy.
//!
//! An m-of-n multisig redeem script lists n public keys; the unlocking
//! script is `OP_0 <sig>... <redeem>`, where the leading OP_0 absorbs the
//! extra stack pop of OP_CHECKMULTISIG. At registration time the input
//! carries one blank OP_0 slot per listed key so that independent signers
//! can each fill their own slot, in any order; once m slots are filled the
//! remaining blanks are removed.

use txforge_primitives::ec::PublicKey;
use txforge_primitives::hash::hash160;
use txforge_script::opcodes::{OP_0, OP_CHECKMULTISIG, OP_EQUAL, OP_HASH160, OP_RESERVED};
use txforge_script::{Script, ScriptChunk};

use crate::BuilderError;

/// Build an m-of-n multisig locking script from a threshold and a list of
/// public keys, compressed-encoded in the given order.
pub fn lock_script(threshold: usize, pub_keys: &[PublicKey]) -> Result<Script, BuilderError> {
    let n = pub_keys.len();
    if threshold == 0 || threshold > n || n > 16 {
        return Err(BuilderError::InvalidThreshold { m: threshold, n });
    }
    let mut chunks = Vec::with_capacity(n + 3);
    chunks.push(ScriptChunk::op_only(OP_RESERVED + threshold as u8));
    for pub_key in pub_keys {
        chunks.push(ScriptChunk::push(pub_key.to_compressed().to_vec()));
    }
    chunks.push(ScriptChunk::op_only(OP_RESERVED + n as u8));
    chunks.push(ScriptChunk::op_only(OP_CHECKMULTISIG));
    Ok(Script::from_chunks(&chunks)?)
}

/// Build the pay-to-script-hash locking script for a redeem script:
/// OP_HASH160 <hash160(redeem)> OP_EQUAL.
pub fn p2sh_lock_script(redeem_script: &Script) -> Script {
    let hash = hash160(redeem_script.to_bytes());
    let mut bytes = Vec::with_capacity(23);
    bytes.push(OP_HASH160);
    bytes.push(hash.len() as u8);
    bytes.extend_from_slice(&hash);
    bytes.push(OP_EQUAL);
    Script::from_bytes(bytes)
}

/// Build the placeholder unlocking script for a scripthash multisig input:
/// the leading OP_0, one blank OP_0 slot per public key listed in the
/// redeem script, and the serialized redeem script as the final push.
pub fn unlock_placeholder(redeem_script: &Script) -> Result<Script, BuilderError> {
    let key_count = redeem_script.chunks()?.len().saturating_sub(3);
    let mut chunks = Vec::with_capacity(key_count + 2);
    chunks.push(ScriptChunk::op_only(OP_0));
    for _ in 0..key_count {
        chunks.push(ScriptChunk::op_only(OP_0));
    }
    chunks.push(ScriptChunk::push(redeem_script.to_bytes().to_vec()));
    Ok(Script::from_chunks(&chunks)?)
}

/// Whether the number of filled signature slots in an unlocking script
/// equals the redeem script's threshold. The first chunk is the leading
/// OP_0 and the last is the redeem script; everything between is a slot.
pub fn all_sigs_present(threshold: usize, chunks: &[ScriptChunk]) -> bool {
    if chunks.len() < 2 {
        return false;
    }
    let filled = chunks[1..chunks.len() - 1]
        .iter()
        .filter(|chunk| chunk.data.is_some())
        .count();
    filled == threshold
}

/// Remove every still-blank signature slot, preserving the leading OP_0,
/// the filled signatures in order, and the trailing redeem script.
pub fn remove_blank_sigs(chunks: &[ScriptChunk]) -> Vec<ScriptChunk> {
    if chunks.len() < 2 {
        return chunks.to_vec();
    }
    let mut compacted = Vec::with_capacity(chunks.len());
    compacted.push(chunks[0].clone());
    for chunk in &chunks[1..chunks.len() - 1] {
        if chunk.data.is_some() {
            compacted.push(chunk.clone());
        }
    }
    compacted.push(chunks[chunks.len() - 1].clone());
    compacted
}
