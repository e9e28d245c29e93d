//! Fake Backend Error

use thiserror::Error;
use whaleshield_common::{Address, Amount};

/// Fake Backend Error
#[derive(Debug, Error)]
pub enum Error {
    /// Signature was never broadcast
    #[error("Unknown transaction {0}")]
    UnknownTransaction(String),
    /// Account cannot cover a swap debit
    #[error("Insufficient balance at {address}: needed {needed}, available {available}")]
    InsufficientBalance {
        /// Debited account
        address: Address,
        /// Amount required
        needed: Amount,
        /// Amount held
        available: Amount,
    },
    /// Shielded balance cannot cover a withdraw
    #[error("Insufficient shielded balance")]
    InsufficientShieldedBalance,
    /// Deposits switched off
    #[error("Deposit rejected by pool")]
    DepositRejected,
    /// Common Error
    #[error(transparent)]
    Common(#[from] whaleshield_common::Error),
}

impl From<Error> for whaleshield_common::Error {
    fn from(e: Error) -> Self {
        match e {
            Error::Common(err) => err,
            Error::InsufficientShieldedBalance => Self::InsufficientFunds,
            err @ Error::DepositRejected => Self::Pool(err.to_string()),
            err => Self::Ledger(err.to_string()),
        }
    }
}
