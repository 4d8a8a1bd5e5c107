/// Error types for primitive operations.
#[derive(Debug, thiserror::Error)]
pub enum PrimitivesError {
    /// The private key scalar is zero, out of range, or the wrong length.
    #[error("invalid private key: {0}")]
    InvalidPrivateKey(String),

    /// The public key bytes do not encode a point on secp256k1.
    #[error("invalid public key: {0}")]
    InvalidPublicKey(String),

    /// The signature is malformed or its components are out of range.
    #[error("invalid signature: {0}")]
    InvalidSignature(String),

    /// A WIF string has the wrong length or a bad compression flag.
    #[error("invalid wif: {0}")]
    InvalidWif(String),

    /// A Base58Check checksum does not match its payload.
    #[error("checksum mismatch")]
    ChecksumMismatch,

    /// Hex decoding failed.
    #[error("hex decode error: {0}")]
    InvalidHex(#[from] hex::FromHexError),

    /// Base58 decoding failed.
    #[error("invalid base58: {0}")]
    InvalidBase58(String),

    /// A read ran past the end of the input buffer.
    #[error("unexpected end of data")]
    UnexpectedEof,
}
