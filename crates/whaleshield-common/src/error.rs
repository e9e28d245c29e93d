//! Errors

use thiserror::Error;

use crate::address::Address;

/// Common Error
#[derive(Debug, Error)]
pub enum Error {
    /// Invalid address
    #[error("Invalid address: {0}")]
    InvalidAddress(String),
    /// Invalid asset
    #[error("Invalid asset: {0}")]
    InvalidAsset(String),
    /// Malformed transaction bytes
    #[error("Invalid transaction: {0}")]
    InvalidTransaction(String),
    /// Only legacy and v0 messages are understood
    #[error("Unsupported transaction version: {0}")]
    UnsupportedTransactionVersion(u8),
    /// Key is not one of the transaction's required signers
    #[error("`{0}` is not a required signer of this transaction")]
    SignerNotRequired(Address),
    /// Signature slot left empty
    #[error("Missing signature for `{0}`")]
    MissingSignature(Address),
    /// Signature does not verify
    #[error("Invalid signature for `{0}`")]
    InvalidSignature(Address),
    /// Insufficient Funds
    #[error("Insufficient Funds")]
    InsufficientFunds,
    /// Shielded pool service error
    #[error("Shielded pool error: {0}")]
    Pool(String),
    /// Ledger or RPC error
    #[error("Ledger error: {0}")]
    Ledger(String),
    /// Transaction failed on the ledger
    #[error("Transaction `{0}` failed: {1}")]
    TransactionFailed(String, String),
    /// Operation timeout
    #[error("Operation timeout")]
    Timeout,
    /// Amount Error
    #[error(transparent)]
    Amount(#[from] crate::amount::Error),
    /// Base64 decode error
    #[error(transparent)]
    Base64(#[from] base64::DecodeError),
    /// Serde Error
    #[error(transparent)]
    Serde(#[from] serde_json::Error),
    /// Custom Error
    #[error("`{0}`")]
    Custom(String),
}
