/// Bitcoin-style address handling.
///
/// Supports P2PKH address generation from public key hashes, address
/// validation, mainnet/testnet discrimination, and conversion back to the
/// locking script form. Uses Base58Check encoding with SHA-256d checksums.

use std::fmt;

use txforge_primitives::hash::{hash160, sha256d};

use crate::opcodes::{OP_CHECKSIG, OP_DATA_20, OP_DUP, OP_EQUALVERIFY, OP_HASH160};
use crate::script::Script;
use crate::ScriptError;

/// Mainnet P2PKH address version byte.
const MAINNET_P2PKH: u8 = 0x00;
/// Testnet P2PKH address version byte.
const TESTNET_P2PKH: u8 = 0x6f;

/// Network type for address prefix selection.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Network {
    /// Mainnet (address prefix 0x00, addresses start with '1').
    Mainnet,
    /// Testnet (address prefix 0x6f, addresses start with 'm' or 'n').
    Testnet,
}

/// A P2PKH address.
///
/// Holds the 20-byte public key hash and the network it belongs to, and can
/// produce the locking script that pays to it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Address {
    /// The human-readable Base58Check address string.
    pub address_string: String,
    /// The 20-byte RIPEMD-160(SHA-256(pubkey)) hash.
    pub public_key_hash: [u8; 20],
    /// The network this address belongs to.
    pub network: Network,
}

impl Address {
    /// Parse a Base58Check-encoded address string.
    ///
    /// Decodes the string, validates the checksum, and detects the network
    /// from the version byte (0x00 = mainnet, 0x6f = testnet).
    pub fn from_string(addr: &str) -> Result<Self, ScriptError> {
        let decoded = bs58::decode(addr)
            .into_vec()
            .map_err(|_| ScriptError::InvalidAddress(format!("bad char for '{}'", addr)))?;

        if decoded.len() != 25 {
            return Err(ScriptError::InvalidAddressLength(addr.to_string()));
        }

        // Last 4 bytes must equal the sha256d checksum of the first 21.
        let checksum = sha256d(&decoded[..21]);
        if decoded[21..25] != checksum[..4] {
            return Err(ScriptError::EncodingChecksumFailed);
        }

        let network = match decoded[0] {
            MAINNET_P2PKH => Network::Mainnet,
            TESTNET_P2PKH => Network::Testnet,
            _ => return Err(ScriptError::UnsupportedAddress(addr.to_string())),
        };

        let mut hash = [0u8; 20];
        hash.copy_from_slice(&decoded[1..21]);

        Ok(Address {
            address_string: addr.to_string(),
            public_key_hash: hash,
            network,
        })
    }

    /// Create an address from a 20-byte public key hash.
    pub fn from_public_key_hash(hash: &[u8; 20], network: Network) -> Self {
        let version = match network {
            Network::Mainnet => MAINNET_P2PKH,
            Network::Testnet => TESTNET_P2PKH,
        };

        let mut payload = Vec::with_capacity(25);
        payload.push(version);
        payload.extend_from_slice(hash);
        let checksum = sha256d(&payload);
        payload.extend_from_slice(&checksum[..4]);

        Address {
            address_string: bs58::encode(&payload).into_string(),
            public_key_hash: *hash,
            network,
        }
    }

    /// Create an address from a hex-encoded public key string.
    ///
    /// Computes hash160 of the decoded public key bytes.
    pub fn from_public_key_string(pub_key_hex: &str, mainnet: bool) -> Result<Self, ScriptError> {
        let pub_key_bytes =
            hex::decode(pub_key_hex).map_err(|e| ScriptError::InvalidHex(e.to_string()))?;
        let hash = hash160(&pub_key_bytes);
        let network = if mainnet {
            Network::Mainnet
        } else {
            Network::Testnet
        };
        Ok(Self::from_public_key_hash(&hash, network))
    }

    /// The P2PKH locking script paying to this address:
    /// OP_DUP OP_HASH160 <hash> OP_EQUALVERIFY OP_CHECKSIG.
    pub fn to_lock_script(&self) -> Script {
        let mut bytes = Vec::with_capacity(25);
        bytes.push(OP_DUP);
        bytes.push(OP_HASH160);
        bytes.push(OP_DATA_20);
        bytes.extend_from_slice(&self.public_key_hash);
        bytes.push(OP_EQUALVERIFY);
        bytes.push(OP_CHECKSIG);
        Script::from_bytes(bytes)
    }
}

impl fmt::Display for Address {
    /// Display the address as its Base58Check string.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.address_string)
    }
}
