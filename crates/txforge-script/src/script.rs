/// Bitcoin-style script type.
///
/// A `Script` owns raw script bytes and offers hex/ASM conversion, chunk
/// decoding, classification of the locking and unlocking script forms the
/// transaction builder works with, and append-style construction.

use std::fmt;

use crate::address::{Address, Network};
use crate::chunk::{decode_chunks, encode_chunks, push_data_prefix, ScriptChunk};
use crate::opcodes::*;
use crate::ScriptError;

/// A script, stored as its raw serialized bytes.
#[derive(Clone, PartialEq, Eq)]
pub struct Script(Vec<u8>);

impl Script {
    /// Create an empty script.
    pub fn new() -> Self {
        Script(Vec::new())
    }

    /// Create a script from raw bytes.
    pub fn from_bytes(bytes: Vec<u8>) -> Self {
        Script(bytes)
    }

    /// Parse a script from its hex encoding.
    pub fn from_hex(hex_str: &str) -> Result<Self, ScriptError> {
        let bytes = hex::decode(hex_str).map_err(|e| ScriptError::InvalidHex(e.to_string()))?;
        Ok(Script(bytes))
    }

    /// Parse a script from ASM notation.
    ///
    /// Each whitespace-separated token is either an opcode name or hex data
    /// to push.
    pub fn from_asm(asm: &str) -> Result<Self, ScriptError> {
        let mut script = Script::new();
        for token in asm.split_whitespace() {
            match string_to_opcode(token) {
                Some(op) => script.append_opcodes(&[op])?,
                None => script.append_push_data_hex(token)?,
            }
        }
        Ok(script)
    }

    /// Serialize a chunk sequence into a script.
    pub fn from_chunks(chunks: &[ScriptChunk]) -> Result<Self, ScriptError> {
        Ok(Script(encode_chunks(chunks)?))
    }

    /// The raw script bytes.
    pub fn to_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Hex encoding of the raw script bytes.
    pub fn to_hex(&self) -> String {
        hex::encode(&self.0)
    }

    /// Render the script in ASM notation.
    ///
    /// Returns an empty string for an empty or malformed script.
    pub fn to_asm(&self) -> String {
        let mut parts = Vec::new();
        let mut pos = 0usize;
        while pos < self.0.len() {
            match self.read_op(&mut pos) {
                Ok(chunk) => parts.push(chunk.to_asm_string()),
                Err(_) => return String::new(),
            }
        }
        parts.join(" ")
    }

    /// The script length in bytes.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// True if the script has no bytes.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Decode the script into chunks.
    pub fn chunks(&self) -> Result<Vec<ScriptChunk>, ScriptError> {
        decode_chunks(&self.0)
    }

    /// True for the canonical 25-byte P2PKH locking script form:
    /// OP_DUP OP_HASH160 <20 bytes> OP_EQUALVERIFY OP_CHECKSIG.
    pub fn is_p2pkh(&self) -> bool {
        let b = &self.0;
        b.len() == 25
            && b[0] == OP_DUP
            && b[1] == OP_HASH160
            && b[2] == OP_DATA_20
            && b[23] == OP_EQUALVERIFY
            && b[24] == OP_CHECKSIG
    }

    /// True for the canonical 23-byte P2SH locking script form:
    /// OP_HASH160 <20 bytes> OP_EQUAL.
    pub fn is_p2sh(&self) -> bool {
        let b = &self.0;
        b.len() == 23 && b[0] == OP_HASH160 && b[1] == OP_DATA_20 && b[22] == OP_EQUAL
    }

    /// True for a bare multisig locking script:
    /// OP_m <pubkey>... OP_n OP_CHECKMULTISIG.
    pub fn is_multisig_out(&self) -> bool {
        let parts = match self.chunks() {
            Ok(parts) => parts,
            Err(_) => return false,
        };
        if parts.len() < 3 || !is_small_int_op(parts[0].op) {
            return false;
        }
        for chunk in &parts[1..parts.len() - 2] {
            match &chunk.data {
                Some(data) if !data.is_empty() => {}
                _ => return false,
            }
        }
        is_small_int_op(parts[parts.len() - 2].op)
            && parts[parts.len() - 1].op == OP_CHECKMULTISIG
    }

    /// True for a P2PKH unlocking script: exactly two elements, each either
    /// OP_0 or a data push.
    ///
    /// Matches both the placeholder form (OP_0 in the signature slot) and the
    /// fully signed form.
    pub fn is_p2pkh_in(&self) -> bool {
        let parts = match self.chunks() {
            Ok(parts) => parts,
            Err(_) => return false,
        };
        parts.len() == 2
            && parts
                .iter()
                .all(|chunk| chunk.op == OP_0 || chunk.data.is_some())
    }

    /// True for a P2SH unlocking script: two or more elements, each either
    /// OP_0 or a data push, with the final element carrying the serialized
    /// redeem script.
    pub fn is_p2sh_in(&self) -> bool {
        let parts = match self.chunks() {
            Ok(parts) => parts,
            Err(_) => return false,
        };
        parts.len() >= 2
            && parts
                .iter()
                .all(|chunk| chunk.op == OP_0 || chunk.data.is_some())
            && matches!(parts.last(), Some(chunk) if chunk.data.is_some())
    }

    /// Extract the public key hash from a P2PKH locking script.
    pub fn public_key_hash(&self) -> Result<Vec<u8>, ScriptError> {
        if self.0.is_empty() {
            return Err(ScriptError::EmptyScript);
        }
        if self.0.len() < 2 || self.0[0] != OP_DUP || self.0[1] != OP_HASH160 {
            return Err(ScriptError::NotP2PKH);
        }
        let parts = decode_chunks(&self.0[2..])?;
        parts
            .first()
            .and_then(|chunk| chunk.data.clone())
            .ok_or(ScriptError::NotP2PKH)
    }

    /// Derive the address a P2PKH locking script pays to.
    pub fn to_address(&self, network: Network) -> Result<Address, ScriptError> {
        if !self.is_p2pkh() {
            return Err(ScriptError::NotP2PKH);
        }
        let data = self.public_key_hash()?;
        let hash: [u8; 20] = data
            .as_slice()
            .try_into()
            .map_err(|_| ScriptError::NotP2PKH)?;
        Ok(Address::from_public_key_hash(&hash, network))
    }

    /// Append a data push with the minimal push prefix.
    pub fn append_push_data(&mut self, data: &[u8]) -> Result<(), ScriptError> {
        let prefix = push_data_prefix(data.len())?;
        self.0.extend_from_slice(&prefix);
        self.0.extend_from_slice(data);
        Ok(())
    }

    /// Append a data push given as a hex string.
    pub fn append_push_data_hex(&mut self, hex_str: &str) -> Result<(), ScriptError> {
        let data = hex::decode(hex_str).map_err(|_| ScriptError::InvalidOpcodeData)?;
        self.append_push_data(&data)
    }

    /// Append raw opcodes.
    ///
    /// Push-data opcodes are rejected; use [`Script::append_push_data`] so the
    /// prefix and data stay consistent.
    pub fn append_opcodes(&mut self, ops: &[u8]) -> Result<(), ScriptError> {
        for &op in ops {
            if (OP_DATA_1..=OP_PUSHDATA4).contains(&op) {
                return Err(ScriptError::InvalidOpcodeType(opcode_to_string(op)));
            }
        }
        self.0.extend_from_slice(ops);
        Ok(())
    }

    /// Read the single script element at `pos`, advancing past it.
    ///
    /// Unlike [`Script::chunks`] this walks OP_RETURN scripts element by
    /// element, which is what ASM rendering wants.
    fn read_op(&self, pos: &mut usize) -> Result<ScriptChunk, ScriptError> {
        let bytes = &self.0;
        if *pos >= bytes.len() {
            return Err(ScriptError::IndexOutOfRange);
        }
        let op = bytes[*pos];
        *pos += 1;
        let data_len = match op {
            OP_PUSHDATA1 => {
                let len = *bytes.get(*pos).ok_or(ScriptError::DataTooSmall)? as usize;
                *pos += 1;
                Some(len)
            }
            OP_PUSHDATA2 => {
                if *pos + 2 > bytes.len() {
                    return Err(ScriptError::DataTooSmall);
                }
                let len = u16::from_le_bytes([bytes[*pos], bytes[*pos + 1]]) as usize;
                *pos += 2;
                Some(len)
            }
            OP_PUSHDATA4 => {
                if *pos + 4 > bytes.len() {
                    return Err(ScriptError::DataTooSmall);
                }
                let len = u32::from_le_bytes([
                    bytes[*pos],
                    bytes[*pos + 1],
                    bytes[*pos + 2],
                    bytes[*pos + 3],
                ]) as usize;
                *pos += 4;
                Some(len)
            }
            OP_DATA_1..=OP_DATA_75 => Some(op as usize),
            _ => None,
        };
        match data_len {
            None => Ok(ScriptChunk::op_only(op)),
            Some(len) => {
                if *pos + len > bytes.len() {
                    return Err(ScriptError::DataTooSmall);
                }
                let data = bytes[*pos..*pos + len].to_vec();
                *pos += len;
                Ok(ScriptChunk { op, data: Some(data) })
            }
        }
    }
}

impl Default for Script {
    fn default() -> Self {
        Script::new()
    }
}

impl fmt::Display for Script {
    /// Display the script as hex.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl fmt::Debug for Script {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Script({})", self.to_hex())
    }
}

impl serde::Serialize for Script {
    /// Serialize the script as its hex string.
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> serde::Deserialize<'de> for Script {
    /// Deserialize the script from its hex string.
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let hex_str = String::deserialize(deserializer)?;
        Script::from_hex(&hex_str).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    //! Tests for script parsing, rendering, classification, and construction.
    //!
    //! Covers hex and ASM roundtrips, the locking script predicates
    //! (is_p2pkh, is_p2sh, is_multisig_out), the unlocking script predicates
    //! (is_p2pkh_in, is_p2sh_in), public key hash extraction, address
    //! derivation, append-style construction, and serde hex encoding.

    use super::*;

    /// Canonical P2PKH locking script.
    const P2PKH_HEX: &str = "76a914e2a623699e81b291c0327f408fea765d534baa2a88ac";
    /// Canonical P2SH locking script.
    const P2SH_HEX: &str = "a9149de5aeaff9c48431ba4dd6e8af73d51f38e451cb87";
    /// Bare 2-of-3 multisig locking script with one-byte stand-in keys.
    const MULTISIG_HEX: &str = "5201110122013353ae";

    // -----------------------------------------------------------------------
    // hex roundtrip
    // -----------------------------------------------------------------------

    /// from_hex and to_hex are inverses.
    #[test]
    fn test_hex_roundtrip() {
        let script = Script::from_hex(P2PKH_HEX).expect("should parse");
        assert_eq!(script.to_hex(), P2PKH_HEX);
        assert_eq!(script.len(), 25);
        assert!(!script.is_empty());
    }

    /// Invalid hex is rejected.
    #[test]
    fn test_from_hex_invalid() {
        assert!(matches!(
            Script::from_hex("zzzz"),
            Err(ScriptError::InvalidHex(_))
        ));
    }

    // -----------------------------------------------------------------------
    // ASM
    // -----------------------------------------------------------------------

    /// A P2PKH script renders to the expected ASM and parses back.
    #[test]
    fn test_asm_roundtrip_p2pkh() {
        let script = Script::from_hex(P2PKH_HEX).expect("should parse");
        let asm = script.to_asm();
        assert_eq!(
            asm,
            "OP_DUP OP_HASH160 e2a623699e81b291c0327f408fea765d534baa2a OP_EQUALVERIFY OP_CHECKSIG"
        );
        let rebuilt = Script::from_asm(&asm).expect("should parse ASM");
        assert_eq!(rebuilt, script);
    }

    /// An empty script renders to an empty ASM string.
    #[test]
    fn test_to_asm_empty() {
        assert_eq!(Script::new().to_asm(), "");
    }

    /// A truncated push renders to an empty ASM string instead of failing.
    #[test]
    fn test_to_asm_malformed() {
        let script = Script::from_bytes(vec![0x05, 0x01]);
        assert_eq!(script.to_asm(), "");
    }

    /// ASM rendering walks OP_RETURN scripts element by element.
    #[test]
    fn test_to_asm_op_return() {
        let script = Script::from_bytes(vec![OP_FALSE, OP_RETURN, 0x02, 0xca, 0xfe]);
        assert_eq!(script.to_asm(), "OP_FALSE OP_RETURN cafe");
    }

    // -----------------------------------------------------------------------
    // locking script predicates
    // -----------------------------------------------------------------------

    /// The canonical P2PKH form is recognized; near misses are not.
    #[test]
    fn test_is_p2pkh() {
        assert!(Script::from_hex(P2PKH_HEX).unwrap().is_p2pkh());
        assert!(!Script::from_hex(P2SH_HEX).unwrap().is_p2pkh());
        // Truncated by one byte.
        assert!(!Script::from_hex("76a914e2a623699e81b291c0327f408fea765d534baa2a88")
            .unwrap()
            .is_p2pkh());
        assert!(!Script::new().is_p2pkh());
    }

    /// The canonical P2SH form is recognized.
    #[test]
    fn test_is_p2sh() {
        assert!(Script::from_hex(P2SH_HEX).unwrap().is_p2sh());
        assert!(!Script::from_hex(P2PKH_HEX).unwrap().is_p2sh());
        assert!(!Script::new().is_p2sh());
    }

    /// Bare multisig locking scripts are recognized.
    #[test]
    fn test_is_multisig_out() {
        assert!(Script::from_hex(MULTISIG_HEX).unwrap().is_multisig_out());
        assert!(!Script::from_hex(P2PKH_HEX).unwrap().is_multisig_out());
        // Missing the trailing OP_CHECKMULTISIG.
        assert!(!Script::from_hex("520111012201335375").unwrap().is_multisig_out());
        // Key-count slot is not a small int.
        assert!(!Script::from_hex("5201110122013361ae").unwrap().is_multisig_out());
        assert!(!Script::new().is_multisig_out());
    }

    // -----------------------------------------------------------------------
    // unlocking script predicates
    // -----------------------------------------------------------------------

    /// Both the placeholder and the signed P2PKH unlocking forms match.
    #[test]
    fn test_is_p2pkh_in() {
        let placeholder = Script::from_chunks(&[
            ScriptChunk::op_only(OP_0),
            ScriptChunk::push(vec![0x02; 33]),
        ])
        .expect("should encode");
        assert!(placeholder.is_p2pkh_in());

        let signed = Script::from_chunks(&[
            ScriptChunk::push(vec![0x30; 71]),
            ScriptChunk::push(vec![0x02; 33]),
        ])
        .expect("should encode");
        assert!(signed.is_p2pkh_in());

        // A locking script has opcode-only elements.
        assert!(!Script::from_hex(P2PKH_HEX).unwrap().is_p2pkh_in());
        // Wrong element count.
        let single = Script::from_chunks(&[ScriptChunk::push(vec![0x02; 33])])
            .expect("should encode");
        assert!(!single.is_p2pkh_in());
    }

    /// P2SH unlocking scripts need a trailing data push for the redeem script.
    #[test]
    fn test_is_p2sh_in() {
        let placeholder = Script::from_chunks(&[
            ScriptChunk::op_only(OP_0),
            ScriptChunk::op_only(OP_0),
            ScriptChunk::op_only(OP_0),
            ScriptChunk::push(hex::decode(MULTISIG_HEX).unwrap()),
        ])
        .expect("should encode");
        assert!(placeholder.is_p2sh_in());

        // No trailing data push.
        let blanks_only = Script::from_chunks(&[
            ScriptChunk::op_only(OP_0),
            ScriptChunk::op_only(OP_0),
        ])
        .expect("should encode");
        assert!(!blanks_only.is_p2sh_in());

        // Opcode-only element that is not OP_0.
        let with_dup = Script::from_chunks(&[
            ScriptChunk::op_only(OP_DUP),
            ScriptChunk::push(vec![0x51]),
        ])
        .expect("should encode");
        assert!(!with_dup.is_p2sh_in());

        assert!(!Script::new().is_p2sh_in());
    }

    // -----------------------------------------------------------------------
    // public_key_hash / to_address
    // -----------------------------------------------------------------------

    /// Extract the hash from a P2PKH locking script.
    #[test]
    fn test_public_key_hash() {
        let script = Script::from_hex("76a91404d03f746652cfcb6cb55119ab473a045137d26588ac")
            .expect("should parse");
        let hash = script.public_key_hash().expect("should extract");
        assert_eq!(hex::encode(hash), "04d03f746652cfcb6cb55119ab473a045137d265");
    }

    /// Empty and non-P2PKH scripts report distinct errors.
    #[test]
    fn test_public_key_hash_errors() {
        assert!(matches!(
            Script::new().public_key_hash(),
            Err(ScriptError::EmptyScript)
        ));
        assert!(matches!(
            Script::from_hex(P2SH_HEX).unwrap().public_key_hash(),
            Err(ScriptError::NotP2PKH)
        ));
    }

    /// A P2PKH locking script roundtrips through the address it pays to.
    #[test]
    fn test_to_address_roundtrip() {
        let script = Script::from_hex(P2PKH_HEX).expect("should parse");
        let addr = script.to_address(Network::Mainnet).expect("should derive");
        assert_eq!(
            hex::encode(addr.public_key_hash),
            "e2a623699e81b291c0327f408fea765d534baa2a"
        );
        assert_eq!(addr.to_lock_script(), script);
    }

    /// Address derivation refuses non-P2PKH scripts.
    #[test]
    fn test_to_address_not_p2pkh() {
        let script = Script::from_hex(MULTISIG_HEX).expect("should parse");
        assert!(matches!(
            script.to_address(Network::Mainnet),
            Err(ScriptError::NotP2PKH)
        ));
    }

    // -----------------------------------------------------------------------
    // append construction
    // -----------------------------------------------------------------------

    /// Rebuild the canonical P2PKH form with the append methods.
    #[test]
    fn test_append_builds_p2pkh() {
        let mut script = Script::new();
        script
            .append_opcodes(&[OP_DUP, OP_HASH160])
            .expect("should append");
        script
            .append_push_data_hex("e2a623699e81b291c0327f408fea765d534baa2a")
            .expect("should push");
        script
            .append_opcodes(&[OP_EQUALVERIFY, OP_CHECKSIG])
            .expect("should append");
        assert_eq!(script.to_hex(), P2PKH_HEX);
        assert!(script.is_p2pkh());
    }

    /// 76 bytes of data get a PUSHDATA1 prefix.
    #[test]
    fn test_append_push_data_pushdata1() {
        let mut script = Script::new();
        script.append_push_data(&[0xaa; 76]).expect("should push");
        assert_eq!(script.to_bytes()[0], OP_PUSHDATA1);
        assert_eq!(script.to_bytes()[1], 76);
        assert_eq!(script.len(), 78);
    }

    /// append_opcodes rejects push-data opcodes.
    #[test]
    fn test_append_opcodes_rejects_push_ops() {
        let mut script = Script::new();
        assert!(matches!(
            script.append_opcodes(&[0x21]),
            Err(ScriptError::InvalidOpcodeType(_))
        ));
        assert!(matches!(
            script.append_opcodes(&[OP_PUSHDATA2]),
            Err(ScriptError::InvalidOpcodeType(_))
        ));
    }

    /// Bad hex push data is rejected.
    #[test]
    fn test_append_push_data_hex_invalid() {
        let mut script = Script::new();
        assert!(matches!(
            script.append_push_data_hex("not-hex"),
            Err(ScriptError::InvalidOpcodeData)
        ));
    }

    // -----------------------------------------------------------------------
    // chunks / from_chunks
    // -----------------------------------------------------------------------

    /// chunks and from_chunks are inverses on canonical scripts.
    #[test]
    fn test_chunks_roundtrip() {
        let script = Script::from_hex(P2PKH_HEX).expect("should parse");
        let chunks = script.chunks().expect("should decode");
        assert_eq!(chunks.len(), 5);
        let rebuilt = Script::from_chunks(&chunks).expect("should encode");
        assert_eq!(rebuilt, script);
    }

    // -----------------------------------------------------------------------
    // display / serde
    // -----------------------------------------------------------------------

    /// Display shows bare hex; Debug wraps it.
    #[test]
    fn test_display_and_debug() {
        let script = Script::from_hex(MULTISIG_HEX).expect("should parse");
        assert_eq!(format!("{}", script), MULTISIG_HEX);
        assert_eq!(format!("{:?}", script), format!("Script({})", MULTISIG_HEX));
    }

    /// Scripts serialize to JSON hex strings and back.
    #[test]
    fn test_serde_roundtrip() {
        let script = Script::from_hex(P2PKH_HEX).expect("should parse");
        let json = serde_json::to_string(&script).expect("should serialize");
        assert_eq!(json, format!("\"{}\"", P2PKH_HEX));
        let back: Script = serde_json::from_str(&json).expect("should deserialize");
        assert_eq!(back, script);
    }

    /// Deserializing invalid hex fails.
    #[test]
    fn test_serde_invalid_hex() {
        let result: Result<Script, _> = serde_json::from_str("\"xyz\"");
        assert!(result.is_err());
    }
}
