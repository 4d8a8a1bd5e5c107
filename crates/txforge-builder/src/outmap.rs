//! Lookup table from outpoint to the spendable output it references.
//!
//! The builder consults this map during input selection (to learn each
//! input's satoshi value) and during signing (to recover the locking
//! script and value when the caller does not supply the output
//! explicitly).

use std::collections::HashMap;

use txforge_transaction::{Outpoint, TransactionOutput};

use crate::BuilderError;

/// Map of outpoint to spendable transaction output.
#[derive(Clone, Debug, Default)]
pub struct TxOutMap {
    map: HashMap<Outpoint, TransactionOutput>,
}

impl TxOutMap {
    /// Create an empty map.
    pub fn new() -> Self {
        Self { map: HashMap::new() }
    }

    /// Insert or overwrite the output stored for an outpoint.
    pub fn add(&mut self, outpoint: Outpoint, output: TransactionOutput) -> &mut Self {
        self.map.insert(outpoint, output);
        self
    }

    /// Look up the output stored for an outpoint.
    pub fn get(&self, outpoint: &Outpoint) -> Result<&TransactionOutput, BuilderError> {
        self.map
            .get(outpoint)
            .ok_or(BuilderError::MissingUtxo { outpoint: *outpoint })
    }

    /// Whether an output is stored for an outpoint.
    pub fn contains(&self, outpoint: &Outpoint) -> bool {
        self.map.contains_key(outpoint)
    }

    /// Number of stored outputs.
    pub fn len(&self) -> usize {
        self.map.len()
    }

    /// Whether the map is empty.
    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    /// Iterate over stored (outpoint, output) pairs in arbitrary order.
    pub fn iter(&self) -> impl Iterator<Item = (&Outpoint, &TransactionOutput)> {
        self.map.iter()
    }
}
