/// Script chunk decoding and encoding.
///
/// A chunk is one opcode together with the data it pushes, if any. Scripts
/// are classified and rewritten at the chunk level; the raw byte form is
/// only reconstructed when a script is serialized back into a transaction.

use crate::opcodes::*;
use crate::ScriptError;

/// One decoded script element: an opcode and its optional push data.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ScriptChunk {
    /// The opcode byte.
    pub op: u8,
    /// The pushed data, or None for opcode-only elements.
    pub data: Option<Vec<u8>>,
}

impl ScriptChunk {
    /// Build an opcode-only chunk.
    pub fn op_only(op: u8) -> Self {
        ScriptChunk { op, data: None }
    }

    /// Build a push chunk for the given data, choosing the minimal push opcode.
    pub fn push(data: Vec<u8>) -> Self {
        let op = match data.len() {
            l if l <= OP_DATA_75 as usize => l as u8,
            l if l <= 0xff => OP_PUSHDATA1,
            l if l <= 0xffff => OP_PUSHDATA2,
            _ => OP_PUSHDATA4,
        };
        ScriptChunk { op, data: Some(data) }
    }

    /// Render this chunk as one ASM token.
    ///
    /// Push chunks render as the hex of their data; everything else renders
    /// as the opcode name.
    pub fn to_asm_string(&self) -> String {
        match &self.data {
            Some(data) if self.op > OP_0 && self.op <= OP_PUSHDATA4 => hex::encode(data),
            _ => opcode_to_string(self.op),
        }
    }
}

/// Decode a raw script into its chunks.
///
/// OP_RETURN outside a conditional block ends interpretation: the rest of the
/// script, including the OP_RETURN byte itself, is carried as the data of a
/// single final chunk. Inside an OP_IF/OP_NOTIF block OP_RETURN decodes as a
/// plain opcode.
pub fn decode_chunks(bytes: &[u8]) -> Result<Vec<ScriptChunk>, ScriptError> {
    let mut chunks = Vec::new();
    let mut pos = 0usize;
    // Nesting depth of conditional blocks; OP_RETURN only terminates at depth zero.
    let mut if_depth = 0i32;
    while pos < bytes.len() {
        let op = bytes[pos];
        pos += 1;
        match op {
            OP_IF | OP_NOTIF | OP_VERIF | OP_VERNOTIF => {
                if_depth += 1;
                chunks.push(ScriptChunk::op_only(op));
            }
            OP_ENDIF => {
                if_depth -= 1;
                chunks.push(ScriptChunk::op_only(op));
            }
            OP_RETURN if if_depth == 0 => {
                let data = bytes[pos - 1..].to_vec();
                chunks.push(ScriptChunk { op, data: Some(data) });
                pos = bytes.len();
            }
            OP_PUSHDATA1 => {
                let len = *bytes.get(pos).ok_or(ScriptError::DataTooSmall)? as usize;
                pos += 1;
                chunks.push(take_push(bytes, &mut pos, op, len)?);
            }
            OP_PUSHDATA2 => {
                if pos + 2 > bytes.len() {
                    return Err(ScriptError::DataTooSmall);
                }
                let len = u16::from_le_bytes([bytes[pos], bytes[pos + 1]]) as usize;
                pos += 2;
                chunks.push(take_push(bytes, &mut pos, op, len)?);
            }
            OP_PUSHDATA4 => {
                if pos + 4 > bytes.len() {
                    return Err(ScriptError::DataTooSmall);
                }
                let len = u32::from_le_bytes([
                    bytes[pos],
                    bytes[pos + 1],
                    bytes[pos + 2],
                    bytes[pos + 3],
                ]) as usize;
                pos += 4;
                chunks.push(take_push(bytes, &mut pos, op, len)?);
            }
            // Direct push: the opcode value is the byte count.
            OP_DATA_1..=OP_DATA_75 => {
                chunks.push(take_push(bytes, &mut pos, op, op as usize)?);
            }
            _ => chunks.push(ScriptChunk::op_only(op)),
        }
    }
    Ok(chunks)
}

/// Read `len` bytes of push data at `pos`, advancing past them.
fn take_push(
    bytes: &[u8],
    pos: &mut usize,
    op: u8,
    len: usize,
) -> Result<ScriptChunk, ScriptError> {
    if *pos + len > bytes.len() {
        return Err(ScriptError::DataTooSmall);
    }
    let data = bytes[*pos..*pos + len].to_vec();
    *pos += len;
    Ok(ScriptChunk { op, data: Some(data) })
}

/// Serialize chunks back into raw script bytes.
///
/// Push chunks are written with the minimal push prefix for their data
/// length. OP_RETURN chunks produced by [`decode_chunks`] carry the raw
/// script tail (opcode byte included) as data and are written back verbatim.
pub fn encode_chunks(chunks: &[ScriptChunk]) -> Result<Vec<u8>, ScriptError> {
    let mut bytes = Vec::new();
    for chunk in chunks {
        match &chunk.data {
            None => bytes.push(chunk.op),
            Some(data) if chunk.op == OP_RETURN => bytes.extend_from_slice(data),
            Some(data) => {
                bytes.extend_from_slice(&push_data_prefix(data.len())?);
                bytes.extend_from_slice(data);
            }
        }
    }
    Ok(bytes)
}

/// Build the minimal push prefix for `len` bytes of data.
pub fn push_data_prefix(len: usize) -> Result<Vec<u8>, ScriptError> {
    if len <= OP_DATA_75 as usize {
        Ok(vec![len as u8])
    } else if len <= 0xff {
        Ok(vec![OP_PUSHDATA1, len as u8])
    } else if len <= 0xffff {
        let mut prefix = vec![OP_PUSHDATA2];
        prefix.extend_from_slice(&(len as u16).to_le_bytes());
        Ok(prefix)
    } else if len <= 0xffff_ffff {
        let mut prefix = vec![OP_PUSHDATA4];
        prefix.extend_from_slice(&(len as u32).to_le_bytes());
        Ok(prefix)
    } else {
        Err(ScriptError::DataTooBig)
    }
}

#[cfg(test)]
mod tests {
    //! Tests for chunk decoding, encoding, push prefixes, and ASM rendering.
    //!
    //! Covers direct pushes, the three PUSHDATA forms, truncation errors,
    //! OP_RETURN handling inside and outside conditional blocks, and the
    //! chunk/byte roundtrip used by script rewriting.

    use super::*;

    // -----------------------------------------------------------------------
    // decode_chunks
    // -----------------------------------------------------------------------

    /// Decode a mix of opcode-only elements and a direct push.
    #[test]
    fn test_decode_opcodes_and_push() {
        let bytes = vec![OP_DUP, OP_HASH160, 0x02, 0xab, 0xcd, OP_EQUALVERIFY];
        let chunks = decode_chunks(&bytes).expect("should decode");
        assert_eq!(chunks.len(), 4);
        assert_eq!(chunks[0], ScriptChunk::op_only(OP_DUP));
        assert_eq!(chunks[1], ScriptChunk::op_only(OP_HASH160));
        assert_eq!(chunks[2].op, 0x02);
        assert_eq!(chunks[2].data, Some(vec![0xab, 0xcd]));
        assert_eq!(chunks[3], ScriptChunk::op_only(OP_EQUALVERIFY));
    }

    /// Decode each PUSHDATA form.
    #[test]
    fn test_decode_pushdata_forms() {
        let mut bytes = vec![OP_PUSHDATA1, 0x03, 0x01, 0x02, 0x03];
        bytes.extend_from_slice(&[OP_PUSHDATA2, 0x02, 0x00, 0xaa, 0xbb]);
        bytes.extend_from_slice(&[OP_PUSHDATA4, 0x01, 0x00, 0x00, 0x00, 0xee]);
        let chunks = decode_chunks(&bytes).expect("should decode");
        assert_eq!(chunks.len(), 3);
        assert_eq!(chunks[0].data, Some(vec![0x01, 0x02, 0x03]));
        assert_eq!(chunks[1].data, Some(vec![0xaa, 0xbb]));
        assert_eq!(chunks[2].data, Some(vec![0xee]));
    }

    /// A direct push that runs past the end of the script fails.
    #[test]
    fn test_decode_truncated_push() {
        let result = decode_chunks(&[0x05, 0x01, 0x02]);
        assert!(matches!(result, Err(ScriptError::DataTooSmall)));
    }

    /// A PUSHDATA1 with no length byte fails.
    #[test]
    fn test_decode_truncated_pushdata1() {
        let result = decode_chunks(&[OP_PUSHDATA1]);
        assert!(matches!(result, Err(ScriptError::DataTooSmall)));
    }

    /// A PUSHDATA2 with a partial length prefix fails.
    #[test]
    fn test_decode_truncated_pushdata2() {
        let result = decode_chunks(&[OP_PUSHDATA2, 0x02]);
        assert!(matches!(result, Err(ScriptError::DataTooSmall)));
    }

    // -----------------------------------------------------------------------
    // decode_chunks - OP_RETURN
    // -----------------------------------------------------------------------

    /// OP_RETURN at the top level swallows the remainder of the script,
    /// including the OP_RETURN byte itself.
    #[test]
    fn test_decode_op_return_top_level() {
        let bytes = vec![OP_FALSE, OP_RETURN, 0x02, 0x11, 0x22];
        let chunks = decode_chunks(&bytes).expect("should decode");
        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[0], ScriptChunk::op_only(OP_FALSE));
        assert_eq!(chunks[1].op, OP_RETURN);
        assert_eq!(chunks[1].data, Some(vec![OP_RETURN, 0x02, 0x11, 0x22]));
    }

    /// OP_RETURN inside a conditional block decodes as a plain opcode and
    /// parsing continues.
    #[test]
    fn test_decode_op_return_in_conditional() {
        let bytes = vec![OP_IF, OP_RETURN, OP_ENDIF, OP_1];
        let chunks = decode_chunks(&bytes).expect("should decode");
        assert_eq!(chunks.len(), 4);
        assert_eq!(chunks[1], ScriptChunk::op_only(OP_RETURN));
        assert_eq!(chunks[3], ScriptChunk::op_only(OP_1));
    }

    // -----------------------------------------------------------------------
    // encode_chunks
    // -----------------------------------------------------------------------

    /// Chunks built with op_only and push encode and decode back to themselves.
    #[test]
    fn test_encode_decode_roundtrip() {
        let chunks = vec![
            ScriptChunk::op_only(OP_DUP),
            ScriptChunk::push(vec![0x11; 20]),
            ScriptChunk::op_only(OP_EQUALVERIFY),
            ScriptChunk::push(vec![0x22; 200]),
        ];
        let bytes = encode_chunks(&chunks).expect("should encode");
        let decoded = decode_chunks(&bytes).expect("should decode");
        assert_eq!(decoded, chunks);
    }

    /// An OP_RETURN chunk from the decoder re-encodes to the original bytes.
    #[test]
    fn test_encode_op_return_verbatim() {
        let bytes = vec![OP_FALSE, OP_RETURN, 0x03, 0xde, 0xad, 0xbe];
        let chunks = decode_chunks(&bytes).expect("should decode");
        let encoded = encode_chunks(&chunks).expect("should encode");
        assert_eq!(encoded, bytes);
    }

    // -----------------------------------------------------------------------
    // push_data_prefix
    // -----------------------------------------------------------------------

    /// The prefix form switches at the documented length boundaries.
    #[test]
    fn test_push_data_prefix_boundaries() {
        assert_eq!(push_data_prefix(0).unwrap(), vec![0x00]);
        assert_eq!(push_data_prefix(1).unwrap(), vec![0x01]);
        assert_eq!(push_data_prefix(75).unwrap(), vec![0x4b]);
        assert_eq!(push_data_prefix(76).unwrap(), vec![OP_PUSHDATA1, 76]);
        assert_eq!(push_data_prefix(255).unwrap(), vec![OP_PUSHDATA1, 255]);
        assert_eq!(push_data_prefix(256).unwrap(), vec![OP_PUSHDATA2, 0x00, 0x01]);
        assert_eq!(
            push_data_prefix(65535).unwrap(),
            vec![OP_PUSHDATA2, 0xff, 0xff]
        );
        assert_eq!(
            push_data_prefix(65536).unwrap(),
            vec![OP_PUSHDATA4, 0x00, 0x00, 0x01, 0x00]
        );
    }

    // -----------------------------------------------------------------------
    // ScriptChunk constructors and ASM
    // -----------------------------------------------------------------------

    /// push picks the minimal opcode for each data length.
    #[test]
    fn test_push_op_selection() {
        assert_eq!(ScriptChunk::push(vec![0xaa; 75]).op, 75);
        assert_eq!(ScriptChunk::push(vec![0xaa; 76]).op, OP_PUSHDATA1);
        assert_eq!(ScriptChunk::push(vec![0xaa; 256]).op, OP_PUSHDATA2);
        assert_eq!(ScriptChunk::push(vec![0xaa; 65536]).op, OP_PUSHDATA4);
    }

    /// Push chunks render as hex, opcode chunks render as names.
    #[test]
    fn test_to_asm_string() {
        assert_eq!(
            ScriptChunk::push(vec![0xde, 0xad]).to_asm_string(),
            "dead"
        );
        assert_eq!(ScriptChunk::op_only(OP_DUP).to_asm_string(), "OP_DUP");
        assert_eq!(ScriptChunk::op_only(OP_0).to_asm_string(), "OP_FALSE");
    }

    /// The folded OP_RETURN chunk renders as the opcode name, not its data.
    #[test]
    fn test_to_asm_string_op_return() {
        let chunks = decode_chunks(&[OP_RETURN, 0x01, 0xff]).expect("should decode");
        assert_eq!(chunks[0].to_asm_string(), "OP_RETURN");
    }
}
