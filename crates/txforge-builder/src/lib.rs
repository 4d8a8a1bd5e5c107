/// txforge SDK - Transaction assembly and signing.
///
/// Provides the TxBuilder with registration-order input selection, fee and
/// change computation against a configurable fee rate and dust threshold,
/// pay-to-pubkey-hash and pay-to-script-hash multisig signing strategies
/// (sync and async), and a JSON codec for persisting builder state.

pub mod builder;
pub mod outmap;
pub mod strategy;

mod error;
mod state;

pub use builder::{TxBuilder, DEFAULT_FEE_PER_KB, DUST_LIMIT};
pub use error::BuilderError;
pub use outmap::TxOutMap;
