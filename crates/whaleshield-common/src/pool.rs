//! Shielded pool service
//!
//! Note and proof mechanics live behind this interface. Implementations
//! hold the user's persistent shielded identity.

use std::fmt::Debug;

use async_trait::async_trait;

use crate::address::Address;
use crate::asset::AssetId;
use crate::error::Error;
use crate::signer::TransactionSigner;
use crate::transaction::TransactionRef;
use crate::Amount;

/// Unshield `amount` to `recipient`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WithdrawRequest {
    /// Amount in base units
    pub amount: Amount,
    /// Public address receiving the funds
    pub recipient: Address,
}

/// Shield `amount` of `asset` paid by `signer_address`
#[derive(Debug, Clone, Copy)]
pub struct DepositRequest<'a> {
    /// Asset moved into the pool
    pub asset: &'a AssetId,
    /// Amount in base units
    pub amount: Amount,
    /// Address that pays for and signs the deposit
    pub signer_address: Address,
    /// Capability used to sign the deposit transaction
    pub transaction_signer: &'a dyn TransactionSigner,
}

/// Privacy pool that commingles deposits
#[async_trait]
pub trait ShieldedPool: Debug + Send + Sync {
    /// Withdraw shielded value to a public address
    async fn withdraw(&self, request: WithdrawRequest) -> Result<TransactionRef, Error>;

    /// Deposit public value into the pool
    async fn deposit(&self, request: DepositRequest<'_>) -> Result<TransactionRef, Error>;

    /// Current shielded balance of the pool identity
    async fn private_balance(&self) -> Result<Amount, Error>;
}
