/// txforge SDK - Transaction wire codec and signature hashing.
///
/// Provides the Transaction type with inputs, outputs, outpoint references,
/// BIP-143 signature hash computation, and binary/hex serialization.

pub mod transaction;
pub mod outpoint;
pub mod input;
pub mod output;
pub mod sighash;

mod error;
pub use error::TransactionError;
pub use transaction::Transaction;
pub use outpoint::Outpoint;
pub use input::TransactionInput;
pub use output::TransactionOutput;
