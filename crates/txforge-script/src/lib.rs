/// txforge SDK - Script construction, classification, and address handling.
///
/// Provides the Bitcoin-style Script type, opcode definitions, script chunk
/// decoding/encoding, locking- and unlocking-script classification, and
/// Base58Check address generation and validation.

pub mod script;
pub mod opcodes;
pub mod chunk;
pub mod address;

mod error;
pub use error::ScriptError;
pub use script::Script;
pub use address::{Address, Network};
pub use chunk::ScriptChunk;
