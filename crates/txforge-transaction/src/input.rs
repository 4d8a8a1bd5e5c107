//! Transaction input referencing a previous output.
//!
//! Contains the outpoint being spent, the unlocking script, and the
//! sequence number.  Knowledge about the spent output itself (its value and
//! locking script) lives in the builder's UTXO store, keyed by the same
//! outpoint.  Provides binary serialization/deserialization following the
//! Bitcoin wire format.

use txforge_primitives::util::{TxReader, TxWriter};
use txforge_script::Script;

use crate::outpoint::Outpoint;
use crate::TransactionError;

/// Default sequence number indicating a finalized input (no relative lock-time).
pub const DEFAULT_SEQUENCE_NUMBER: u32 = 0xFFFF_FFFF;

/// A single input in a transaction.
///
/// Each input references an output of a previous transaction by its
/// [`Outpoint`].  The `unlocking_script` (scriptSig) supplies the data
/// required to satisfy the referenced output's locking script; `None` means
/// the input has not been given a script yet.
///
/// # Wire format
///
/// | Field            | Size          |
/// |------------------|---------------|
/// | txid             | 32 bytes (LE) |
/// | vout             | 4 bytes (LE)  |
/// | script length    | VarInt        |
/// | unlocking_script | variable      |
/// | sequence_number  | 4 bytes (LE)  |
#[derive(Clone, Debug)]
pub struct TransactionInput {
    /// The output being spent.
    pub outpoint: Outpoint,

    /// Sequence number. Defaults to `0xFFFFFFFF` (finalized).
    pub sequence_number: u32,

    /// The unlocking script (scriptSig). `None` when the input has no
    /// script yet; serialized as a zero-length script.
    pub unlocking_script: Option<Script>,
}

impl TransactionInput {
    /// Create an input with a zeroed outpoint, finalized sequence, and no
    /// unlocking script.
    pub fn new() -> Self {
        TransactionInput {
            outpoint: Outpoint::new([0u8; 32], 0),
            sequence_number: DEFAULT_SEQUENCE_NUMBER,
            unlocking_script: None,
        }
    }

    /// Create an unsigned input spending the given outpoint.
    pub fn from_outpoint(outpoint: Outpoint) -> Self {
        TransactionInput {
            outpoint,
            sequence_number: DEFAULT_SEQUENCE_NUMBER,
            unlocking_script: None,
        }
    }

    /// Deserialize an input from a `TxReader`.
    ///
    /// Reads the standard wire format: 32-byte txid, 4-byte vout,
    /// varint-prefixed unlocking script, and 4-byte sequence number.
    pub fn read_from(reader: &mut TxReader) -> Result<Self, TransactionError> {
        let txid_bytes = reader.read_bytes(32).map_err(|e| {
            TransactionError::SerializationError(format!("reading source txid: {}", e))
        })?;
        let mut txid = [0u8; 32];
        txid.copy_from_slice(txid_bytes);

        let vout = reader.read_u32_le().map_err(|e| {
            TransactionError::SerializationError(format!("reading output index: {}", e))
        })?;

        let script_len = reader.read_varint().map_err(|e| {
            TransactionError::SerializationError(format!("reading script length: {}", e))
        })?;

        let script_bytes = reader.read_bytes(script_len as usize).map_err(|e| {
            TransactionError::SerializationError(format!("reading unlocking script: {}", e))
        })?;

        let sequence_number = reader.read_u32_le().map_err(|e| {
            TransactionError::SerializationError(format!("reading sequence number: {}", e))
        })?;

        let unlocking_script = if script_bytes.is_empty() {
            None
        } else {
            Some(Script::from_bytes(script_bytes.to_vec()))
        };

        Ok(TransactionInput {
            outpoint: Outpoint::new(txid, vout),
            sequence_number,
            unlocking_script,
        })
    }

    /// Serialize this input into a `TxWriter`.
    pub fn write_to(&self, writer: &mut TxWriter) {
        writer.write_bytes(&self.outpoint.txid);
        writer.write_u32_le(self.outpoint.vout);

        match &self.unlocking_script {
            Some(script) => {
                let script_bytes = script.to_bytes();
                writer.write_varint(script_bytes.len() as u64);
                writer.write_bytes(script_bytes);
            }
            None => writer.write_varint(0),
        }

        writer.write_u32_le(self.sequence_number);
    }

    /// Serialize this input to a byte vector.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut writer = TxWriter::new();
        self.write_to(&mut writer);
        writer.into_bytes()
    }

    /// Serialize this input to a hex string.
    pub fn to_hex(&self) -> String {
        hex::encode(self.to_bytes())
    }

    /// Parse an input from raw bytes, rejecting trailing data.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, TransactionError> {
        let mut reader = TxReader::new(bytes);
        let input = Self::read_from(&mut reader)?;
        if reader.remaining() != 0 {
            return Err(TransactionError::SerializationError(format!(
                "trailing {} bytes after input",
                reader.remaining()
            )));
        }
        Ok(input)
    }

    /// Parse an input from a hex string.
    pub fn from_hex(hex_str: &str) -> Result<Self, TransactionError> {
        let bytes = hex::decode(hex_str)
            .map_err(|e| TransactionError::SerializationError(format!("invalid hex: {}", e)))?;
        Self::from_bytes(&bytes)
    }
}

impl Default for TransactionInput {
    fn default() -> Self {
        Self::new()
    }
}
