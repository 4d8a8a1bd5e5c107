/// txforge SDK - Cryptographic primitives, hashing, and wire utilities.
///
/// Foundational building blocks for the transaction-construction crates:
/// - Hash functions (SHA-256, SHA-256d, RIPEMD-160, Hash160)
/// - Base58 and Base58Check encoding
/// - Elliptic curve cryptography (secp256k1 keys and signatures)
/// - Variable-length integers and little-endian byte cursors

pub mod base58;
pub mod ec;
pub mod hash;
pub mod util;

mod error;
pub use error::PrimitivesError;
