//! Transaction output with satoshi value and locking script.
//!
//! Defines the spending conditions for the output's value.  Provides
//! binary serialization/deserialization following the Bitcoin wire format.

use txforge_primitives::util::{TxReader, TxWriter};
use txforge_script::Script;

use crate::TransactionError;

/// A single output in a transaction.
///
/// Each output specifies a satoshi value and a `locking_script`
/// (scriptPubKey) that defines the conditions under which the funds may be
/// spent.  The `change` flag is a local-only annotation marking the output
/// that receives leftover satoshis during fee calculation; it is not
/// serialized.
///
/// # Wire format
///
/// | Field          | Size         |
/// |----------------|--------------|
/// | satoshis       | 8 bytes (LE) |
/// | script length  | VarInt       |
/// | locking_script | variable     |
#[derive(Clone, Debug)]
pub struct TransactionOutput {
    /// The number of satoshis locked by this output.
    pub satoshis: u64,

    /// The locking script (scriptPubKey) that defines spending conditions.
    pub locking_script: Script,

    /// Local-only flag marking this output as the change output.
    /// Set by the builder; not serialized on the wire.
    pub change: bool,
}

impl TransactionOutput {
    /// Create an output with zero satoshis and an empty script.
    pub fn new() -> Self {
        TransactionOutput {
            satoshis: 0,
            locking_script: Script::new(),
            change: false,
        }
    }

    /// Create an output paying `satoshis` to `locking_script`.
    pub fn with_script(satoshis: u64, locking_script: Script) -> Self {
        TransactionOutput {
            satoshis,
            locking_script,
            change: false,
        }
    }

    /// Deserialize an output from a `TxReader`.
    ///
    /// Reads 8-byte LE satoshis, a varint script length, and the script bytes.
    pub fn read_from(reader: &mut TxReader) -> Result<Self, TransactionError> {
        let satoshis = reader
            .read_u64_le()
            .map_err(|e| TransactionError::SerializationError(format!("reading satoshis: {}", e)))?;

        let script_len = reader.read_varint().map_err(|e| {
            TransactionError::SerializationError(format!("reading script length: {}", e))
        })?;

        let script_bytes = reader.read_bytes(script_len as usize).map_err(|e| {
            TransactionError::SerializationError(format!("reading locking script: {}", e))
        })?;

        Ok(TransactionOutput {
            satoshis,
            locking_script: Script::from_bytes(script_bytes.to_vec()),
            change: false,
        })
    }

    /// Serialize this output into a `TxWriter`.
    pub fn write_to(&self, writer: &mut TxWriter) {
        writer.write_u64_le(self.satoshis);
        let script_bytes = self.locking_script.to_bytes();
        writer.write_varint(script_bytes.len() as u64);
        writer.write_bytes(script_bytes);
    }

    /// Serialize this output to a byte vector.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut writer = TxWriter::new();
        self.write_to(&mut writer);
        writer.into_bytes()
    }

    /// Serialize this output to a hex string.
    pub fn to_hex(&self) -> String {
        hex::encode(self.to_bytes())
    }

    /// Parse an output from raw bytes, rejecting trailing data.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, TransactionError> {
        let mut reader = TxReader::new(bytes);
        let output = Self::read_from(&mut reader)?;
        if reader.remaining() != 0 {
            return Err(TransactionError::SerializationError(format!(
                "trailing {} bytes after output",
                reader.remaining()
            )));
        }
        Ok(output)
    }

    /// Parse an output from a hex string.
    pub fn from_hex(hex_str: &str) -> Result<Self, TransactionError> {
        let bytes = hex::decode(hex_str)
            .map_err(|e| TransactionError::SerializationError(format!("invalid hex: {}", e)))?;
        Self::from_bytes(&bytes)
    }

    /// Serialize this output for use in signature hash computation.
    ///
    /// The format is identical to `to_bytes`: satoshis(8) + varint(len) + script.
    pub fn bytes_for_sig_hash(&self) -> Vec<u8> {
        self.to_bytes()
    }
}

impl Default for TransactionOutput {
    fn default() -> Self {
        Self::new()
    }
}
