//! Reference to a specific output of a previous transaction.
//!
//! An outpoint is the (txid, vout) pair every input spends and the key the
//! builder's UTXO store is indexed by.  The canonical string label is
//! `<txid hex>:<vout>` with the txid in internal (little-endian) byte order,
//! matching the order the txid appears on the wire.

use std::fmt;
use std::str::FromStr;

use crate::TransactionError;

/// A (txid, vout) pair identifying one transaction output.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Outpoint {
    /// The 32-byte transaction ID of the source transaction, in internal
    /// (little-endian) byte order.
    pub txid: [u8; 32],
    /// Index of the output within the source transaction.
    pub vout: u32,
}

impl Outpoint {
    /// Create an outpoint from a txid in internal byte order and an output index.
    pub fn new(txid: [u8; 32], vout: u32) -> Self {
        Outpoint { txid, vout }
    }
}

impl fmt::Display for Outpoint {
    /// Format as the canonical `<txid hex>:<vout>` label (internal byte order).
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", hex::encode(self.txid), self.vout)
    }
}

impl fmt::Debug for Outpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Outpoint({})", self)
    }
}

impl FromStr for Outpoint {
    type Err = TransactionError;

    /// Parse the canonical `<txid hex>:<vout>` label.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (txid_hex, vout_str) = s
            .rsplit_once(':')
            .ok_or_else(|| TransactionError::InvalidOutpoint(s.to_string()))?;
        let txid_bytes = hex::decode(txid_hex)
            .map_err(|_| TransactionError::InvalidOutpoint(s.to_string()))?;
        let txid: [u8; 32] = txid_bytes
            .try_into()
            .map_err(|_| TransactionError::InvalidOutpoint(s.to_string()))?;
        let vout = vout_str
            .parse::<u32>()
            .map_err(|_| TransactionError::InvalidOutpoint(s.to_string()))?;
        Ok(Outpoint { txid, vout })
    }
}
