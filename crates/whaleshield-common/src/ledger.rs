//! Ledger connector

use std::fmt::Debug;

use async_trait::async_trait;

use crate::address::Address;
use crate::error::Error;
use crate::transaction::{TransactionRef, VersionedTransaction};
use crate::Amount;

/// Interface to the base-layer ledger, typically a JSON-RPC node
#[async_trait]
pub trait LedgerConnector: Debug + Send + Sync {
    /// Native balance of `address`
    async fn get_balance(&self, address: &Address) -> Result<Amount, Error>;

    /// Broadcast a fully signed transaction
    async fn send_transaction(
        &self,
        transaction: &VersionedTransaction,
    ) -> Result<TransactionRef, Error>;

    /// Wait until the transaction is confirmed, failing if it errored on chain
    async fn confirm_transaction(&self, signature: &TransactionRef) -> Result<(), Error>;
}
