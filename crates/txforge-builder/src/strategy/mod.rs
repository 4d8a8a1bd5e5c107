//! Signing strategies, one per supported unlocking-script shape.
//!
//! Each strategy defines the placeholder unlocking script written at input
//! registration time and the mechanics for embedding a computed signature
//! into that placeholder. The builder dispatches to a strategy by
//! inspecting the input's current unlocking-script pattern.

pub mod multisig;
pub mod pubkey_hash;

use txforge_primitives::ec::Signature;

/// Encode a signature the way it is embedded in an unlocking script: the
/// DER bytes followed by a single sighash-type byte.
pub fn signature_tx_format(sig: &Signature, sighash_flag: u32) -> Vec<u8> {
    let mut bytes = sig.to_der();
    bytes.push((sighash_flag & 0xff) as u8);
    bytes
}
