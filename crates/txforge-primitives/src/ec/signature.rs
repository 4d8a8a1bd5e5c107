//! ECDSA signatures: strict DER serialization, RFC 6979 deterministic
//! signing, and low-S normalization.

use k256::ecdsa::signature::hazmat::{PrehashSigner, PrehashVerifier};
use k256::ecdsa;

use crate::ec::private_key::PrivateKey;
use crate::ec::public_key::PublicKey;
use crate::util::TxReader;
use crate::PrimitivesError;

/// The secp256k1 group order N.
const CURVE_ORDER: [u8; 32] = [
    0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF,
    0xFE, 0xBA, 0xAE, 0xDC, 0xE6, 0xAF, 0x48, 0xA0, 0x3B, 0xBF, 0xD2, 0x5E, 0x8C, 0xD0, 0x36,
    0x41, 0x41,
];

/// N / 2, the boundary for low-S normalization.
const HALF_ORDER: [u8; 32] = [
    0x7F, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF,
    0xFF, 0x5D, 0x57, 0x6E, 0x73, 0x57, 0xA4, 0x50, 0x1D, 0xDF, 0xE9, 0x2F, 0x46, 0x68, 0x1B,
    0x20, 0xA0,
];

/// An ECDSA signature as a big-endian R/S pair.
///
/// `to_der` always emits the low-S form, which is what transaction
/// unlocking scripts carry.
#[derive(Clone, Debug)]
pub struct Signature {
    r: [u8; 32],
    s: [u8; 32],
}

impl Signature {
    /// Build a signature from raw 32-byte R and S values.
    pub fn new(r: [u8; 32], s: [u8; 32]) -> Self {
        Signature { r, s }
    }

    /// The R component.
    pub fn r(&self) -> &[u8; 32] {
        &self.r
    }

    /// The S component.
    pub fn s(&self) -> &[u8; 32] {
        &self.s
    }

    /// Parse a DER-encoded signature:
    /// `0x30 <len> 0x02 <r_len> <r> 0x02 <s_len> <s>`.
    ///
    /// R and S must be non-zero and below the curve order. Trailing
    /// bytes beyond the declared length are ignored.
    pub fn from_der(bytes: &[u8]) -> Result<Self, PrimitivesError> {
        if bytes.len() < 8 {
            return Err(PrimitivesError::InvalidSignature(
                "der signature too short".to_string(),
            ));
        }
        let mut reader = TxReader::new(bytes);
        if reader.read_u8()? != 0x30 {
            return Err(PrimitivesError::InvalidSignature(
                "missing der sequence header".to_string(),
            ));
        }
        let declared = reader.read_u8()? as usize;
        if declared < 6 || declared > reader.remaining() {
            return Err(PrimitivesError::InvalidSignature(
                "bad der sequence length".to_string(),
            ));
        }

        let r = read_der_integer(&mut reader)?;
        let s = read_der_integer(&mut reader)?;

        for (name, value) in [("R", &r), ("S", &s)] {
            if value == &[0u8; 32] {
                return Err(PrimitivesError::InvalidSignature(format!(
                    "signature {} is zero",
                    name
                )));
            }
            if *value >= CURVE_ORDER {
                return Err(PrimitivesError::InvalidSignature(format!(
                    "signature {} is not below the curve order",
                    name
                )));
            }
        }

        Ok(Signature { r, s })
    }

    /// Serialize as DER with low-S normalization.
    pub fn to_der(&self) -> Vec<u8> {
        let s = if self.s > HALF_ORDER {
            order_minus(&self.s)
        } else {
            self.s
        };

        let rb = der_integer(&self.r);
        let sb = der_integer(&s);

        let mut out = Vec::with_capacity(6 + rb.len() + sb.len());
        out.push(0x30);
        out.push((4 + rb.len() + sb.len()) as u8);
        out.push(0x02);
        out.push(rb.len() as u8);
        out.extend_from_slice(&rb);
        out.push(0x02);
        out.push(sb.len() as u8);
        out.extend_from_slice(&sb);
        out
    }

    /// Sign a message hash with RFC 6979 deterministic nonces and
    /// normalize S to the lower half of the order.
    ///
    /// Hashes shorter than 32 bytes are left-padded with zeros;
    /// longer ones are truncated.
    pub fn sign(hash: &[u8], priv_key: &PrivateKey) -> Result<Self, PrimitivesError> {
        let digest = normalize_hash(hash);
        let k256_sig: ecdsa::Signature = priv_key
            .signing_key()
            .sign_prehash(&digest)
            .map_err(|e| PrimitivesError::InvalidSignature(e.to_string()))?;

        let (r_bytes, s_bytes) = k256_sig.split_bytes();
        let mut r = [0u8; 32];
        let mut s = [0u8; 32];
        r.copy_from_slice(&r_bytes);
        s.copy_from_slice(&s_bytes);

        if s > HALF_ORDER {
            s = order_minus(&s);
        }

        Ok(Signature { r, s })
    }

    /// Verify this signature over a message hash.
    pub fn verify(&self, hash: &[u8], pub_key: &PublicKey) -> bool {
        let k256_sig = match ecdsa::Signature::from_scalars(
            k256::FieldBytes::from(self.r),
            k256::FieldBytes::from(self.s),
        ) {
            Ok(sig) => sig,
            Err(_) => return false,
        };
        let digest = normalize_hash(hash);
        pub_key
            .verifying_key()
            .verify_prehash(&digest, &k256_sig)
            .is_ok()
    }
}

impl PartialEq for Signature {
    fn eq(&self, other: &Self) -> bool {
        self.r == other.r && self.s == other.s
    }
}

impl Eq for Signature {}

/// Read one DER integer (`0x02 <len> <big-endian bytes>`) and left-pad
/// it to 32 bytes.
fn read_der_integer(reader: &mut TxReader<'_>) -> Result<[u8; 32], PrimitivesError> {
    if reader.read_u8()? != 0x02 {
        return Err(PrimitivesError::InvalidSignature(
            "missing der integer marker".to_string(),
        ));
    }
    let len = reader.read_u8()? as usize;
    if len == 0 {
        return Err(PrimitivesError::InvalidSignature(
            "empty der integer".to_string(),
        ));
    }
    let mut bytes = reader.read_bytes(len)?;
    // Strip sign-padding zeros
    while bytes.len() > 1 && bytes[0] == 0 {
        bytes = &bytes[1..];
    }
    if bytes.len() > 32 {
        return Err(PrimitivesError::InvalidSignature(
            "der integer wider than 32 bytes".to_string(),
        ));
    }
    let mut out = [0u8; 32];
    out[32 - bytes.len()..].copy_from_slice(bytes);
    Ok(out)
}

/// Encode a 32-byte big-endian integer for DER: leading zeros stripped,
/// a 0x00 prefix added when the high bit is set.
fn der_integer(value: &[u8; 32]) -> Vec<u8> {
    let mut start = 0;
    while start < 31 && value[start] == 0 {
        start += 1;
    }
    let trimmed = &value[start..];
    if trimmed[0] & 0x80 != 0 {
        let mut out = Vec::with_capacity(trimmed.len() + 1);
        out.push(0x00);
        out.extend_from_slice(trimmed);
        out
    } else {
        trimmed.to_vec()
    }
}

/// Compute N - value over big-endian bytes, for low-S normalization.
fn order_minus(value: &[u8; 32]) -> [u8; 32] {
    let mut out = [0u8; 32];
    let mut borrow = 0u16;
    for i in (0..32).rev() {
        let lhs = CURVE_ORDER[i] as u16;
        let rhs = value[i] as u16 + borrow;
        if lhs >= rhs {
            out[i] = (lhs - rhs) as u8;
            borrow = 0;
        } else {
            out[i] = (lhs + 0x100 - rhs) as u8;
            borrow = 1;
        }
    }
    out
}

/// Fit an arbitrary-length digest into the 32 bytes secp256k1 expects:
/// left-pad short inputs, truncate long ones.
fn normalize_hash(hash: &[u8]) -> [u8; 32] {
    let mut out = [0u8; 32];
    if hash.len() >= 32 {
        out.copy_from_slice(&hash[..32]);
    } else {
        out[32 - hash.len()..].copy_from_slice(hash);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hash::sha256;

    fn hex_32(s: &str) -> [u8; 32] {
        let bytes = hex::decode(s).unwrap();
        let mut out = [0u8; 32];
        out[32 - bytes.len()..].copy_from_slice(&bytes);
        out
    }

    /// DER parsing accepts a real on-chain signature and rejects
    /// structural corruption.
    #[test]
    fn test_der_parsing() {
        let valid = hex::decode(
            "304402204e45e16932b8af514961a1d3a1a25fdf3f4f7732e9d624c6c61548ab5fb8cd41\
             0220181522ec8eca07de4860a4acdd12909d831cc56cbbac4622082221a8768d1d09",
        )
        .unwrap();
        assert!(Signature::from_der(&valid).is_ok());

        assert!(Signature::from_der(&[]).is_err());

        let mut bad_header = valid.clone();
        bad_header[0] = 0x31;
        assert!(Signature::from_der(&bad_header).is_err());

        let mut bad_marker = valid.clone();
        bad_marker[2] = 0x03;
        assert!(Signature::from_der(&bad_marker).is_err());

        let truncated = &valid[..valid.len() - 4];
        assert!(Signature::from_der(truncated).is_err());
    }

    /// DER serialization: plain values, low-S normalization of a high-S
    /// input, and the degenerate zero signature.
    #[test]
    fn test_der_serialize() {
        let sig = Signature::new(
            hex_32("4e45e16932b8af514961a1d3a1a25fdf3f4f7732e9d624c6c61548ab5fb8cd41"),
            hex_32("181522ec8eca07de4860a4acdd12909d831cc56cbbac4622082221a8768d1d09"),
        );
        assert_eq!(
            hex::encode(sig.to_der()),
            "304402204e45e16932b8af514961a1d3a1a25fdf3f4f7732e9d624c6c61548ab5fb8cd41\
             0220181522ec8eca07de4860a4acdd12909d831cc56cbbac4622082221a8768d1d09"
        );

        // S above N/2 is replaced with N - S on serialization
        let sig = Signature::new(
            hex_32("a196ed0e7ebcbe7b63fe1d8eecbdbde03a67ceba4fc8f6482bdcb9606a911404"),
            hex_32("971729c7fa944b465b35250c6570a2f31acbb14b13d1565fab7330dcb2b3dfb1"),
        );
        assert_eq!(
            hex::encode(sig.to_der()),
            "3045022100a196ed0e7ebcbe7b63fe1d8eecbdbde03a67ceba4fc8f6482bdcb9606a911404\
             022068e8d638056bb4b9a4cadaf39a8f5d0b9fe32b9b9b7749dc145f2db01d826190"
        );

        let sig = Signature::new([0u8; 32], [0u8; 32]);
        assert_eq!(
            sig.to_der(),
            vec![0x30, 0x06, 0x02, 0x01, 0x00, 0x02, 0x01, 0x00]
        );
    }

    /// RFC 6979 known-answer vectors (Trezor/CoreBitcoin set).
    #[test]
    fn test_rfc6979_vectors() {
        let tests = [
            (
                "cca9fbcc1b41e5a95d369eaa6ddcff73b61a4efaa279cfc6567e8daa39cbaf50",
                "sample",
                "3045022100af340daf02cc15c8d5d08d7735dfe6b98a474ed373bdb5fbecf7571be52b384202205009fb27f37034a9b24b707b7c6b79ca23ddef9e25f7282e8a797efe53a8f124",
            ),
            (
                "0000000000000000000000000000000000000000000000000000000000000001",
                "Satoshi Nakamoto",
                "3045022100934b1ea10a4b3c1757e2b0c017d0b6143ce3c9a7e6a4a49860d7a6ab210ee3d802202442ce9d2b916064108014783e923ec36b49743e2ffa1c4496f01a512aafd9e5",
            ),
            (
                "fffffffffffffffffffffffffffffffebaaedce6af48a03bbfd25e8cd0364140",
                "Satoshi Nakamoto",
                "3045022100fd567d121db66e382991534ada77a6bd3106f0a1098c231e47993447cd6af2d002206b39cd0eb1bc8603e159ef5c20a5c8ad685a45b06ce9bebed3f153d10d93bed5",
            ),
            (
                "f8b8af8ce3c7cca5e300d33939540c10d45ce001b8f252bfbc57ba0342904181",
                "Alan Turing",
                "304402207063ae83e7f62bbb171798131b4a0564b956930092b33b07b395615d9ec7e15c022058dfcc1e00a35e1572f366ffe34ba0fc47db1e7189759b9fb233c5b05ab388ea",
            ),
        ];

        for (key_hex, msg, expected) in &tests {
            let priv_key = PrivateKey::from_hex(key_hex).unwrap();
            let hash = sha256(msg.as_bytes());
            let sig = priv_key.sign(&hash).unwrap();
            assert_eq!(hex::encode(sig.to_der()), *expected, "message '{}'", msg);
            assert!(priv_key.pub_key().verify(&hash, &sig));
        }
    }

    /// A parsed signature verifies under the right key and fails under
    /// another.
    #[test]
    fn test_verify_wrong_key() {
        let priv_key = PrivateKey::new();
        let hash = sha256(b"payload");
        let sig = priv_key.sign(&hash).unwrap();

        let reparsed = Signature::from_der(&sig.to_der()).unwrap();
        assert!(reparsed.verify(&hash, &priv_key.pub_key()));
        assert!(!reparsed.verify(&hash, &PrivateKey::new().pub_key()));
    }

    /// Equality compares both components.
    #[test]
    fn test_equality() {
        let a = Signature::new(
            hex_32("4e45e16932b8af514961a1d3a1a25fdf3f4f7732e9d624c6c61548ab5fb8cd41"),
            hex_32("181522ec8eca07de4860a4acdd12909d831cc56cbbac4622082221a8768d1d09"),
        );
        let b = Signature::new(*a.r(), [1u8; 32]);
        assert_eq!(a, a.clone());
        assert_ne!(a, b);
    }
}
