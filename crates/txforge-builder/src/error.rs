/// Error types for transaction building and signing.
#[derive(Debug, thiserror::Error)]
pub enum BuilderError {
    /// build() was called with no registered inputs.
    #[error("cannot build a transaction with no inputs")]
    NoInputs,
    /// Folding dust change into the fee removed the only output.
    #[error("cannot build a transaction with no outputs")]
    NoOutputs,
    /// build() requires a change script or change address to be set first.
    #[error("change script is not set")]
    MissingChangeScript,
    /// The registered inputs do not cover the registered outputs.
    #[error("not enough funds for outputs: need {needed} satoshis, have {available}")]
    InsufficientFunds { needed: u64, available: u64 },
    /// Even with every input consumed, the leftover change cannot pay the fee.
    #[error("unable to gather enough inputs for outputs and fee: change {change} is less than fee {fee}")]
    InsufficientFundsForFee { change: u64, fee: u64 },
    /// The change left after the fee is at or under the dust threshold.
    #[error("unable to create change amount greater than dust: change {change}, dust {dust}")]
    BelowDustThreshold { change: u64, dust: u64 },
    /// An input registration argument has the wrong script shape.
    #[error("invalid input spec: {0}")]
    InvalidInputSpec(String),
    /// Output amounts must be greater than zero.
    #[error("output amount must be greater than zero")]
    InvalidOutputAmount,
    /// A multisig lock script needs 1 <= m <= n <= 16.
    #[error("invalid multisig threshold {m} of {n}")]
    InvalidThreshold { m: usize, n: usize },
    /// A signing call referenced an input index the transaction does not have.
    #[error("input index {index} out of range (tx has {len} inputs)")]
    InputOutOfRange { index: usize, len: usize },
    /// The input's unlocking script matches no supported signing strategy.
    #[error("cannot sign unknown script type for input {index}")]
    UnknownScriptType { index: usize },
    /// The redeem script of a scripthash input is not a multisig lock.
    #[error("cannot sign non-multisig scripthash script type for input {index}")]
    NotMultisig { index: usize },
    /// The signer's public key is not listed in the redeem script.
    #[error("cannot sign; public key not found in input {index}")]
    PubKeyNotFound { index: usize },
    /// No spendable output is stored for the referenced outpoint.
    #[error("missing utxo for outpoint {outpoint}")]
    MissingUtxo {
        outpoint: txforge_transaction::Outpoint,
    },
    /// An underlying script error (forwarded from `txforge-script`).
    #[error("script error: {0}")]
    Script(#[from] txforge_script::ScriptError),
    /// An underlying transaction error (forwarded from `txforge-transaction`).
    #[error("transaction error: {0}")]
    Transaction(#[from] txforge_transaction::TransactionError),
    /// An underlying key error (forwarded from `txforge-primitives`).
    #[error("key error: {0}")]
    Primitives(#[from] txforge_primitives::PrimitivesError),
    /// The builder state record could not be encoded or decoded.
    #[error("state encoding error: {0}")]
    Json(#[from] serde_json::Error),
    /// A blocking signing task panicked or was cancelled.
    #[error("signing task failed: {0}")]
    TaskJoin(#[from] tokio::task::JoinError),
}
