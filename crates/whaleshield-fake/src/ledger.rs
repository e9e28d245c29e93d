//! Fake ledger

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::instrument;
use whaleshield_common::{
    Address, Amount, AssetId, LedgerConnector, TransactionRef, VersionedTransaction,
};

use crate::Error;

/// Balance changes applied when a swap transaction is broadcast
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SwapEffect {
    /// Account swapping
    pub owner: Address,
    /// Asset sold
    pub input_asset: AssetId,
    /// Amount sold
    pub input_amount: Amount,
    /// Asset bought
    pub output_asset: AssetId,
    /// Amount bought
    pub output_amount: Amount,
}

#[derive(Debug)]
struct PendingCredit {
    address: Address,
    amount: Amount,
    polls_left: u32,
}

#[derive(Debug, Default)]
struct LedgerState {
    balances: HashMap<(Address, AssetId), Amount>,
    pending: Vec<PendingCredit>,
    swap_effects: HashMap<Vec<u8>, SwapEffect>,
    confirmed: HashSet<TransactionRef>,
    balance_queries: usize,
}

impl LedgerState {
    fn balance(&self, address: &Address, asset: &AssetId) -> Amount {
        self.balances
            .get(&(*address, asset.clone()))
            .copied()
            .unwrap_or_default()
    }

    fn credit(&mut self, address: Address, asset: AssetId, amount: Amount) -> Result<(), Error> {
        let balance = self.balances.entry((address, asset)).or_default();
        *balance = balance
            .checked_add(amount)
            .ok_or(whaleshield_common::amount::Error::AmountOverflow)
            .map_err(whaleshield_common::Error::from)?;
        Ok(())
    }

    fn debit(&mut self, address: Address, asset: AssetId, amount: Amount) -> Result<(), Error> {
        let available = self.balance(&address, &asset);
        let remaining = available
            .checked_sub(amount)
            .ok_or(Error::InsufficientBalance {
                address,
                needed: amount,
                available,
            })?;
        self.balances.insert((address, asset), remaining);
        Ok(())
    }

    /// Land pending credits for `address` whose delay has run out
    fn settle_pending(&mut self, address: &Address) -> Result<(), Error> {
        let mut landed = Vec::new();
        self.pending.retain_mut(|credit| {
            if &credit.address != address {
                return true;
            }
            if credit.polls_left == 0 {
                landed.push((credit.address, credit.amount));
                return false;
            }
            credit.polls_left -= 1;
            true
        });

        for (address, amount) in landed {
            self.credit(address, AssetId::native(), amount)?;
        }

        Ok(())
    }
}

/// In-memory ledger
///
/// Clones share state, so the same ledger can back the pool, the aggregator
/// and the engine.
#[derive(Debug, Clone, Default)]
pub struct FakeLedger {
    state: Arc<RwLock<LedgerState>>,
    arrival_delay_polls: u32,
}

impl FakeLedger {
    /// Create new [`FakeLedger`] where transfers land immediately
    pub fn new() -> Self {
        Self::default()
    }

    /// Create new [`FakeLedger`] where transfers land after `polls` balance queries
    pub fn with_arrival_delay(polls: u32) -> Self {
        Self {
            state: Arc::default(),
            arrival_delay_polls: polls,
        }
    }

    /// Credit `asset` to `address` immediately
    pub async fn fund(&self, address: Address, asset: AssetId, amount: Amount) -> Result<(), Error> {
        self.state.write().await.credit(address, asset, amount)
    }

    /// Native transfer to `address`, subject to the arrival delay
    pub async fn transfer_native(&self, address: Address, amount: Amount) -> Result<(), Error> {
        let mut state = self.state.write().await;

        if self.arrival_delay_polls == 0 {
            return state.credit(address, AssetId::native(), amount);
        }

        state.pending.push(PendingCredit {
            address,
            amount,
            polls_left: self.arrival_delay_polls,
        });
        Ok(())
    }

    /// Take `amount` of `asset` from `address`
    ///
    /// Fails with [`Error::InsufficientBalance`] and leaves the balance
    /// untouched when it cannot cover the debit.
    pub async fn debit(&self, address: Address, asset: AssetId, amount: Amount) -> Result<(), Error> {
        self.state.write().await.debit(address, asset, amount)
    }

    /// Balance of `asset` at `address`, without settling pending transfers
    pub async fn balance_of(&self, address: &Address, asset: &AssetId) -> Amount {
        self.state.read().await.balance(address, asset)
    }

    /// Settle a swap when a transaction with exactly `message` is broadcast
    pub async fn register_swap(&self, message: Vec<u8>, effect: SwapEffect) {
        self.state.write().await.swap_effects.insert(message, effect);
    }

    /// Native balance queries served so far
    pub async fn balance_queries(&self) -> usize {
        self.state.read().await.balance_queries
    }
}

#[async_trait]
impl LedgerConnector for FakeLedger {
    async fn get_balance(&self, address: &Address) -> Result<Amount, whaleshield_common::Error> {
        let mut state = self.state.write().await;
        state.balance_queries += 1;
        state.settle_pending(address)?;
        Ok(state.balance(address, &AssetId::native()))
    }

    #[instrument(skip_all)]
    async fn send_transaction(
        &self,
        transaction: &VersionedTransaction,
    ) -> Result<TransactionRef, whaleshield_common::Error> {
        transaction.verify()?;

        let signature = transaction.id().ok_or(whaleshield_common::Error::Ledger(
            "transaction has no signature".to_string(),
        ))?;

        let mut state = self.state.write().await;

        if let Some(effect) = state.swap_effects.remove(transaction.message_bytes()) {
            if let Err(err) = state.debit(
                effect.owner,
                effect.input_asset.clone(),
                effect.input_amount,
            ) {
                state
                    .swap_effects
                    .insert(transaction.message_bytes().to_vec(), effect);
                return Err(whaleshield_common::Error::TransactionFailed(
                    signature.to_string(),
                    err.to_string(),
                ));
            }
            state.credit(effect.owner, effect.output_asset.clone(), effect.output_amount)?;

            tracing::debug!(
                "Settled swap {}: {} {} for {} {}",
                signature,
                effect.input_amount,
                effect.input_asset,
                effect.output_amount,
                effect.output_asset
            );
        }

        state.confirmed.insert(signature.clone());

        Ok(signature)
    }

    async fn confirm_transaction(
        &self,
        signature: &TransactionRef,
    ) -> Result<(), whaleshield_common::Error> {
        if self.state.read().await.confirmed.contains(signature) {
            Ok(())
        } else {
            Err(Error::UnknownTransaction(signature.to_string()).into())
        }
    }
}
