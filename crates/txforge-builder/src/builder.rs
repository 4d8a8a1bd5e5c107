//! Transaction builder: registration of inputs/outputs/change/fee policy,
//! the input-selection/fee/change algorithm, and per-input signing.
//!
//! The builder accumulates configuration through chainable mutators,
//! `build()` assembles a transaction with a correct fee and change output,
//! and `sign()`/`async_sign()` fill each input's unlocking script according
//! to its script shape.

use txforge_primitives::ec::{PrivateKey, PublicKey, Signature};
use txforge_script::opcodes::{OP_1, OP_16, OP_RESERVED};
use txforge_script::{Address, Script, ScriptChunk};
use txforge_transaction::sighash::{self, SIGHASH_ALL_FORKID};
use txforge_transaction::{Outpoint, Transaction, TransactionInput, TransactionOutput};

use crate::outmap::TxOutMap;
use crate::strategy::{multisig, pubkey_hash, signature_tx_format};
use crate::BuilderError;

/// Outputs at or below this many satoshis are not kept as change.
pub const DUST_LIMIT: u64 = 546;

/// Default fee rate in satoshis per kilobyte of estimated signed size.
pub const DEFAULT_FEE_PER_KB: u64 = 1_000;

/// Assembles and signs transactions.
///
/// Inputs and outputs are registered up front; `build()` then selects
/// inputs in registration order, computes the fee from the estimated
/// signed size, and appends a change output. Each registered input
/// carries a placeholder unlocking script shaped for its signing
/// strategy, so the size estimate accounts for the final script layout.
#[derive(Clone, Debug)]
pub struct TxBuilder {
    /// The working transaction, rebuilt from scratch on every build().
    pub tx: Transaction,
    /// Registered inputs, in consumption order.
    pub txins: Vec<TransactionInput>,
    /// Registered destination outputs, in final transaction order.
    pub txouts: Vec<TransactionOutput>,
    /// Spendable outputs referenced by the registered inputs.
    pub utxout_map: TxOutMap,
    /// Destination for leftover funds; required by build().
    pub change_script: Option<Script>,
    /// Fee rate in satoshis per kilobyte of estimated size.
    pub fee_per_kb: u64,
    /// Lock time stamped onto the transaction by build().
    pub lock_time: u32,
    /// Version stamped onto the transaction by build().
    pub version: u32,
    /// Change at or below this amount is not kept as an output.
    pub dust: u64,
    /// When set, sub-dust change is silently folded into the fee instead
    /// of failing the build.
    pub dust_change_to_fees: bool,
}

impl TxBuilder {
    /// Create a builder with default fee rate and dust threshold.
    pub fn new() -> Self {
        Self {
            tx: Transaction::new(),
            txins: Vec::new(),
            txouts: Vec::new(),
            utxout_map: TxOutMap::new(),
            change_script: None,
            fee_per_kb: DEFAULT_FEE_PER_KB,
            lock_time: 0,
            version: 1,
            dust: DUST_LIMIT,
            dust_change_to_fees: false,
        }
    }

    /// The working transaction.
    pub fn tx(&self) -> &Transaction {
        &self.tx
    }

    // -------------------------------------------------------------------
    // Configuration
    // -------------------------------------------------------------------

    /// Set the fee rate in satoshis per kilobyte.
    pub fn set_fee_per_kb(&mut self, fee_per_kb: u64) -> &mut Self {
        self.fee_per_kb = fee_per_kb;
        self
    }

    /// Send change to an address.
    pub fn set_change_address(&mut self, address: &Address) -> &mut Self {
        self.change_script = Some(address.to_lock_script());
        self
    }

    /// Send change to an explicit locking script.
    pub fn set_change_script(&mut self, change_script: Script) -> &mut Self {
        self.change_script = Some(change_script);
        self
    }

    /// Set the lock time stamped onto built transactions.
    pub fn set_lock_time(&mut self, lock_time: u32) -> &mut Self {
        self.lock_time = lock_time;
        self
    }

    /// Set the version stamped onto built transactions.
    pub fn set_version(&mut self, version: u32) -> &mut Self {
        self.version = version;
        self
    }

    /// Override the dust threshold.
    pub fn set_dust(&mut self, dust: u64) -> &mut Self {
        self.dust = dust;
        self
    }

    /// Fold sub-dust change into the fee instead of failing the build.
    pub fn set_dust_change_to_fees(&mut self, enabled: bool) -> &mut Self {
        self.dust_change_to_fees = enabled;
        self
    }

    /// Adopt a transaction partially signed elsewhere. The only thing to
    /// do after this is sign one or more inputs; build() is skipped
    /// entirely. The map is optional so long as the output is passed in
    /// at signing time.
    pub fn import_partially_signed_tx(
        &mut self,
        tx: Transaction,
        utxout_map: Option<TxOutMap>,
    ) -> &mut Self {
        self.tx = tx;
        if let Some(map) = utxout_map {
            self.utxout_map = map;
        }
        self
    }

    // -------------------------------------------------------------------
    // Input and output registration
    // -------------------------------------------------------------------

    /// Register an input spending `output` at `outpoint` with an explicit
    /// unlocking script (or placeholder).
    pub fn from_script(
        &mut self,
        outpoint: Outpoint,
        output: TransactionOutput,
        unlocking_script: Script,
        sequence_number: Option<u32>,
    ) -> &mut Self {
        let mut input = TransactionInput::from_outpoint(outpoint);
        if let Some(sequence) = sequence_number {
            input.sequence_number = sequence;
        }
        input.unlocking_script = Some(unlocking_script);
        self.txins.push(input);
        self.utxout_map.add(outpoint, output);
        self
    }

    /// Register an input spending a pay-to-pubkey-hash output. The input
    /// is given a placeholder unlocking script carrying the public key,
    /// to be completed by sign().
    pub fn from_pubkey_hash(
        &mut self,
        outpoint: Outpoint,
        output: TransactionOutput,
        pub_key: &PublicKey,
        sequence_number: Option<u32>,
    ) -> Result<&mut Self, BuilderError> {
        if !output.locking_script.is_p2pkh() {
            return Err(BuilderError::InvalidInputSpec(
                "output is not a pay-to-pubkey-hash lock".to_string(),
            ));
        }
        let placeholder = pubkey_hash::unlock_placeholder(pub_key);
        Ok(self.from_script(outpoint, output, placeholder, sequence_number))
    }

    /// Register an input spending a pay-to-script-hash multisig output.
    /// The input is given a placeholder unlocking script with one blank
    /// signature slot per key listed in the redeem script.
    pub fn from_scripthash_multisig(
        &mut self,
        outpoint: Outpoint,
        output: TransactionOutput,
        redeem_script: &Script,
        sequence_number: Option<u32>,
    ) -> Result<&mut Self, BuilderError> {
        if !output.locking_script.is_p2sh() {
            return Err(BuilderError::InvalidInputSpec(
                "output is not a pay-to-script-hash lock".to_string(),
            ));
        }
        if !redeem_script.is_multisig_out() {
            return Err(BuilderError::InvalidInputSpec(
                "redeem script is not a multisig lock".to_string(),
            ));
        }
        let placeholder = multisig::unlock_placeholder(redeem_script)?;
        Ok(self.from_script(outpoint, output, placeholder, sequence_number))
    }

    /// Register a destination output paying `satoshis` to an address.
    pub fn to_address(
        &mut self,
        satoshis: u64,
        address: &Address,
    ) -> Result<&mut Self, BuilderError> {
        self.to_script(satoshis, address.to_lock_script())
    }

    /// Register a destination output paying `satoshis` to a locking script.
    pub fn to_script(
        &mut self,
        satoshis: u64,
        locking_script: Script,
    ) -> Result<&mut Self, BuilderError> {
        if satoshis == 0 {
            return Err(BuilderError::InvalidOutputAmount);
        }
        self.txouts
            .push(TransactionOutput::with_script(satoshis, locking_script));
        Ok(self)
    }

    // -------------------------------------------------------------------
    // Size and fee estimation
    // -------------------------------------------------------------------

    /// Predict the signed size in bytes. Each input is given a fixed
    /// worst-case signature allowance, so the estimate is pessimistic and
    /// only suitable for fee sizing.
    // TODO: size a multisig input by its threshold instead of the
    // single-signature allowance.
    pub fn estimate_size(&self) -> u64 {
        // largest possible signature push
        let sig_size = 1 + 1 + 1 + 1 + 32 + 1 + 1 + 32 + 1;
        let mut size = self.tx.size() as u64;
        size += sig_size * self.tx.inputs.len() as u64;
        size += 1; // assume the input count varint grows by a byte
        size
    }

    /// The fee for the working transaction at the configured rate,
    /// rounded up to the next kilobyte so the fee is never underpaid.
    pub fn estimate_fee(&self) -> u64 {
        let kilobytes = (self.estimate_size() + 999) / 1000;
        kilobytes * self.fee_per_kb
    }

    // -------------------------------------------------------------------
    // Build
    // -------------------------------------------------------------------

    /// Append the registered outputs to the working transaction and
    /// return their satoshi total.
    fn build_outputs(&mut self) -> u64 {
        let mut out_amount = 0u64;
        for output in &self.txouts {
            out_amount += output.satoshis;
            self.tx.add_output(output.clone());
        }
        out_amount
    }

    /// Append registered inputs in order until they cover `out_amount`,
    /// plus up to `extra_inputs` more past the covering point. Each
    /// input's value comes from the spendable-output map.
    fn build_inputs(&mut self, out_amount: u64, extra_inputs: usize) -> Result<u64, BuilderError> {
        let mut extra = extra_inputs;
        let mut in_amount = 0u64;
        for input in &self.txins {
            let output = self.utxout_map.get(&input.outpoint)?;
            in_amount += output.satoshis;
            self.tx.add_input(input.clone());
            if in_amount >= out_amount {
                if extra == 0 {
                    break;
                }
                extra -= 1;
            }
        }
        if in_amount < out_amount {
            return Err(BuilderError::InsufficientFunds {
                needed: out_amount,
                available: in_amount,
            });
        }
        Ok(in_amount)
    }

    /// Build the transaction: select inputs, compute the fee, and set the
    /// change output appended after the registered outputs.
    ///
    /// The selection runs with a widening slack parameter: if the change
    /// left by the minimal covering set cannot pay the fee and stay above
    /// dust, the builder retries consuming one more input past the
    /// covering point, then two, and so on. Consuming more inputs can
    /// only grow the change, so the retries explore a non-decreasing
    /// change sequence. If no attempt satisfies the fee-and-dust check,
    /// the last (largest-change) candidate has the fee deducted in place,
    /// failing if the remainder is dust.
    pub fn build(&mut self) -> Result<&Transaction, BuilderError> {
        let change_script = self
            .change_script
            .clone()
            .ok_or(BuilderError::MissingChangeScript)?;
        if self.txins.is_empty() {
            return Err(BuilderError::NoInputs);
        }

        let mut change_amount = 0u64;
        let mut fee = 0u64;
        for extra_inputs in 0..self.txins.len() {
            self.tx = Transaction::new();
            let out_amount = self.build_outputs();
            let mut change_output = TransactionOutput::with_script(0, change_script.clone());
            change_output.change = true;
            self.tx.add_output(change_output);

            let in_amount = self.build_inputs(out_amount, extra_inputs)?;

            change_amount = in_amount - out_amount;
            if let Some(output) = self.tx.outputs.last_mut() {
                output.satoshis = change_amount;
            }

            fee = self.estimate_fee();
            if change_amount >= fee && change_amount - fee > self.dust {
                break;
            }
        }

        if change_amount < fee {
            return Err(BuilderError::InsufficientFundsForFee {
                change: change_amount,
                fee,
            });
        }

        change_amount -= fee;
        if let Some(output) = self.tx.outputs.last_mut() {
            output.satoshis = change_amount;
        }

        if change_amount <= self.dust {
            if self.dust_change_to_fees {
                self.tx.outputs.pop();
                if self.tx.outputs.is_empty() {
                    return Err(BuilderError::NoOutputs);
                }
            } else {
                return Err(BuilderError::BelowDustThreshold {
                    change: change_amount,
                    dust: self.dust,
                });
            }
        }

        self.tx.lock_time = self.lock_time;
        self.tx.version = self.version;
        Ok(&self.tx)
    }

    // -------------------------------------------------------------------
    // Signing
    // -------------------------------------------------------------------

    /// Sign an input without filling the signature into the transaction.
    pub fn get_sig(
        &self,
        key_pair: &PrivateKey,
        sighash_flag: u32,
        input_index: usize,
        sub_script: &Script,
        satoshis: u64,
    ) -> Result<Signature, BuilderError> {
        let digest = sighash::signature_hash(
            &self.tx,
            input_index,
            sub_script.to_bytes(),
            sighash_flag,
            satoshis,
        )?;
        Ok(key_pair.sign(&digest)?)
    }

    /// Like [`TxBuilder::get_sig`], with the signature computed on a
    /// blocking worker thread. Results are bit-identical to the
    /// synchronous path.
    pub async fn async_get_sig(
        &self,
        key_pair: &PrivateKey,
        sighash_flag: u32,
        input_index: usize,
        sub_script: &Script,
        satoshis: u64,
    ) -> Result<Signature, BuilderError> {
        let digest = sighash::signature_hash(
            &self.tx,
            input_index,
            sub_script.to_bytes(),
            sighash_flag,
            satoshis,
        )?;
        let key_pair = key_pair.clone();
        let sig = tokio::task::spawn_blocking(move || key_pair.sign(&digest)).await??;
        Ok(sig)
    }

    /// Fill a computed signature into a pay-to-pubkey-hash input,
    /// replacing the placeholder's first chunk.
    pub fn fill_pubkey_hash_sig(
        &mut self,
        input_index: usize,
        sig: &Signature,
        sighash_flag: u32,
    ) -> Result<(), BuilderError> {
        let len = self.tx.inputs.len();
        let input = self
            .tx
            .inputs
            .get_mut(input_index)
            .ok_or(BuilderError::InputOutOfRange { index: input_index, len })?;
        let script = input
            .unlocking_script
            .as_ref()
            .ok_or(BuilderError::UnknownScriptType { index: input_index })?;
        let mut chunks = script.chunks()?;
        if chunks.is_empty() {
            return Err(BuilderError::UnknownScriptType { index: input_index });
        }
        chunks[0] = ScriptChunk::push(signature_tx_format(sig, sighash_flag));
        input.unlocking_script = Some(Script::from_chunks(&chunks)?);
        Ok(())
    }

    /// Fill a computed signature into a scripthash multisig input at the
    /// slot of the matching public key. Every key listed in the redeem
    /// script is checked before giving up. Once the filled-slot count
    /// reaches the redeem script's threshold, the remaining blank slots
    /// are removed.
    pub fn fill_scripthash_multisig_sig(
        &mut self,
        input_index: usize,
        pub_key: &PublicKey,
        sig: &Signature,
        sighash_flag: u32,
        redeem_script: &Script,
    ) -> Result<(), BuilderError> {
        let redeem_chunks = redeem_script.chunks()?;
        if !redeem_script.is_multisig_out() || redeem_chunks.len() < 3 {
            return Err(BuilderError::NotMultisig { index: input_index });
        }
        let threshold_op = redeem_chunks[0].op;
        if !(OP_1..=OP_16).contains(&threshold_op) {
            return Err(BuilderError::NotMultisig { index: input_index });
        }
        let threshold = (threshold_op - OP_RESERVED) as usize;

        // Locate the signer among the listed keys.
        let key_bytes = pub_key.to_compressed();
        let candidates = &redeem_chunks[1..redeem_chunks.len() - 2];
        let slot = candidates
            .iter()
            .position(|chunk| chunk.data.as_deref() == Some(key_bytes.as_slice()))
            .ok_or(BuilderError::PubKeyNotFound { index: input_index })?;

        let len = self.tx.inputs.len();
        let input = self
            .tx
            .inputs
            .get_mut(input_index)
            .ok_or(BuilderError::InputOutOfRange { index: input_index, len })?;
        let script = input
            .unlocking_script
            .as_ref()
            .ok_or(BuilderError::UnknownScriptType { index: input_index })?;
        let mut chunks = script.chunks()?;
        // slot 0 maps to chunk 1: chunk 0 is the leading OP_0 and the
        // last chunk is the redeem script.
        if chunks.len() < slot + 3 {
            return Err(BuilderError::UnknownScriptType { index: input_index });
        }
        chunks[slot + 1] = ScriptChunk::push(signature_tx_format(sig, sighash_flag));
        if multisig::all_sigs_present(threshold, &chunks) {
            chunks = multisig::remove_blank_sigs(&chunks);
        }
        input.unlocking_script = Some(Script::from_chunks(&chunks)?);
        Ok(())
    }

    /// Resolve which strategy signs an input and the material it needs.
    fn signing_target(
        &self,
        input_index: usize,
        reference_output: Option<&TransactionOutput>,
    ) -> Result<SigningTarget, BuilderError> {
        let len = self.tx.inputs.len();
        let input = self
            .tx
            .inputs
            .get(input_index)
            .ok_or(BuilderError::InputOutOfRange { index: input_index, len })?;
        let script = input
            .unlocking_script
            .as_ref()
            .ok_or(BuilderError::UnknownScriptType { index: input_index })?;

        if script.is_p2pkh_in() {
            let output = match reference_output {
                Some(output) => output,
                None => self.utxout_map.get(&input.outpoint)?,
            };
            Ok(SigningTarget::PubKeyHash {
                sub_script: output.locking_script.clone(),
                satoshis: output.satoshis,
            })
        } else if script.is_p2sh_in() {
            let chunks = script.chunks()?;
            let redeem_bytes = chunks
                .last()
                .and_then(|chunk| chunk.data.clone())
                .ok_or(BuilderError::NotMultisig { index: input_index })?;
            let redeem_script = Script::from_bytes(redeem_bytes);
            if !redeem_script.is_multisig_out() {
                return Err(BuilderError::NotMultisig { index: input_index });
            }
            let satoshis = match reference_output {
                Some(output) => output.satoshis,
                None => self.utxout_map.get(&input.outpoint)?.satoshis,
            };
            Ok(SigningTarget::ScripthashMultisig {
                redeem_script,
                satoshis,
            })
        } else {
            Err(BuilderError::UnknownScriptType { index: input_index })
        }
    }

    /// Sign an input and fill the signature into the transaction. The
    /// spent output is taken from `reference_output` if given, else from
    /// the spendable-output map. Dispatches on the input's current
    /// unlocking-script shape.
    pub fn sign(
        &mut self,
        input_index: usize,
        key_pair: &PrivateKey,
        reference_output: Option<&TransactionOutput>,
    ) -> Result<&mut Self, BuilderError> {
        match self.signing_target(input_index, reference_output)? {
            SigningTarget::PubKeyHash {
                sub_script,
                satoshis,
            } => {
                let sig =
                    self.get_sig(key_pair, SIGHASH_ALL_FORKID, input_index, &sub_script, satoshis)?;
                self.fill_pubkey_hash_sig(input_index, &sig, SIGHASH_ALL_FORKID)?;
            }
            SigningTarget::ScripthashMultisig {
                redeem_script,
                satoshis,
            } => {
                let sig = self.get_sig(
                    key_pair,
                    SIGHASH_ALL_FORKID,
                    input_index,
                    &redeem_script,
                    satoshis,
                )?;
                self.fill_scripthash_multisig_sig(
                    input_index,
                    &key_pair.pub_key(),
                    &sig,
                    SIGHASH_ALL_FORKID,
                    &redeem_script,
                )?;
            }
        }
        Ok(self)
    }

    /// Like [`TxBuilder::sign`], with the signature computed on a
    /// blocking worker thread. The transaction is mutated only after the
    /// signature task completes; a call cancelled mid-await leaves the
    /// input untouched.
    pub async fn async_sign(
        &mut self,
        input_index: usize,
        key_pair: &PrivateKey,
        reference_output: Option<&TransactionOutput>,
    ) -> Result<&mut Self, BuilderError> {
        match self.signing_target(input_index, reference_output)? {
            SigningTarget::PubKeyHash {
                sub_script,
                satoshis,
            } => {
                let sig = self
                    .async_get_sig(key_pair, SIGHASH_ALL_FORKID, input_index, &sub_script, satoshis)
                    .await?;
                self.fill_pubkey_hash_sig(input_index, &sig, SIGHASH_ALL_FORKID)?;
            }
            SigningTarget::ScripthashMultisig {
                redeem_script,
                satoshis,
            } => {
                let sig = self
                    .async_get_sig(
                        key_pair,
                        SIGHASH_ALL_FORKID,
                        input_index,
                        &redeem_script,
                        satoshis,
                    )
                    .await?;
                self.fill_scripthash_multisig_sig(
                    input_index,
                    &key_pair.pub_key(),
                    &sig,
                    SIGHASH_ALL_FORKID,
                    &redeem_script,
                )?;
            }
        }
        Ok(self)
    }
}

impl Default for TxBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// The material a signing strategy needs for one input.
enum SigningTarget {
    PubKeyHash { sub_script: Script, satoshis: u64 },
    ScripthashMultisig { redeem_script: Script, satoshis: u64 },
}
