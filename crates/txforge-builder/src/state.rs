//! JSON codec for builder state.
//!
//! Serializes the builder to a structured record so a partially built or
//! partially signed transaction can be persisted or handed to another
//! party. Binary values travel as wire-format hex strings; spendable
//! outputs are keyed `"<txid hex>:<vout>"`. Field names are the
//! compatibility contract and must not change.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use txforge_script::Script;
use txforge_transaction::{Outpoint, Transaction, TransactionInput, TransactionOutput};

use crate::builder::TxBuilder;
use crate::outmap::TxOutMap;
use crate::BuilderError;

/// The persisted form of a builder.
#[derive(Serialize, Deserialize)]
struct BuilderState {
    tx: String,
    txins: Vec<String>,
    txouts: Vec<String>,
    utxoutmap: BTreeMap<String, String>,
    #[serde(rename = "changeScript", skip_serializing_if = "Option::is_none", default)]
    change_script: Option<Script>,
    #[serde(rename = "feePerKbNum")]
    fee_per_kb: u64,
}

impl TxBuilder {
    /// Serialize the builder state to a JSON record. Spendable outputs
    /// are emitted in sorted key order, so equal builders export equal
    /// strings.
    pub fn to_json(&self) -> Result<String, BuilderError> {
        let mut utxoutmap = BTreeMap::new();
        for (outpoint, output) in self.utxout_map.iter() {
            utxoutmap.insert(outpoint.to_string(), output.to_hex());
        }
        let state = BuilderState {
            tx: self.tx.to_hex(),
            txins: self.txins.iter().map(TransactionInput::to_hex).collect(),
            txouts: self.txouts.iter().map(TransactionOutput::to_hex).collect(),
            utxoutmap,
            change_script: self.change_script.clone(),
            fee_per_kb: self.fee_per_kb,
        };
        Ok(serde_json::to_string(&state)?)
    }

    /// Reconstruct a builder from a JSON record produced by
    /// [`TxBuilder::to_json`]. The whole record is decoded before any
    /// builder is constructed, so a malformed record cannot leave partial
    /// state behind.
    pub fn from_json(json: &str) -> Result<TxBuilder, BuilderError> {
        let state: BuilderState = serde_json::from_str(json)?;

        let tx = Transaction::from_hex(&state.tx)?;
        let txins = state
            .txins
            .iter()
            .map(|hex_str| TransactionInput::from_hex(hex_str))
            .collect::<Result<Vec<_>, _>>()?;
        let txouts = state
            .txouts
            .iter()
            .map(|hex_str| TransactionOutput::from_hex(hex_str))
            .collect::<Result<Vec<_>, _>>()?;
        let mut utxout_map = TxOutMap::new();
        for (key, value) in &state.utxoutmap {
            let outpoint: Outpoint = key.parse()?;
            let output = TransactionOutput::from_hex(value)?;
            utxout_map.add(outpoint, output);
        }

        let mut builder = TxBuilder::new();
        builder.tx = tx;
        builder.txins = txins;
        builder.txouts = txouts;
        builder.utxout_map = utxout_map;
        builder.change_script = state.change_script;
        builder.fee_per_kb = state.fee_per_kb;
        Ok(builder)
    }
}
