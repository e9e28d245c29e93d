//! Stranded funds
//!
//! Once a withdraw has succeeded, funds sit at the ephemeral identity until
//! they are deposited back into the pool. When a later stage fails, the
//! identity is parked here so the deposit can be retried. The registry is
//! in memory only: dropping the engine forgets the keys.

use std::collections::HashMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use uuid::Uuid;
use whaleshield_common::{Address, Amount, AssetId, TradeStep};

use crate::identity::EphemeralIdentity;

/// Funds left at an ephemeral identity after a failed run
#[derive(Debug)]
pub struct StrandedFunds {
    /// Operation that stranded the funds
    pub operation_id: Uuid,
    /// Identity holding the funds
    pub identity: EphemeralIdentity,
    /// Asset held
    pub asset: AssetId,
    /// Amount expected at the identity
    pub amount: Amount,
    /// Stage that failed
    pub stage: TradeStep,
    /// Failure message
    pub reason: String,
}

impl StrandedFunds {
    /// Summary without key material
    pub fn info(&self) -> StrandedFundsInfo {
        StrandedFundsInfo {
            operation_id: self.operation_id,
            address: self.identity.address(),
            asset: self.asset.clone(),
            amount: self.amount,
            stage: self.stage,
            reason: self.reason.clone(),
        }
    }
}

/// Stranded funds entry as listed to callers
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StrandedFundsInfo {
    /// Operation that stranded the funds
    pub operation_id: Uuid,
    /// Ephemeral address holding the funds
    pub address: Address,
    /// Asset held
    pub asset: AssetId,
    /// Amount expected at the address
    pub amount: Amount,
    /// Stage that failed
    pub stage: TradeStep,
    /// Failure message
    pub reason: String,
}

/// In-memory registry of stranded funds, keyed by operation
#[derive(Debug, Clone, Default)]
pub struct StrandedFundsRegistry {
    entries: Arc<RwLock<HashMap<Uuid, StrandedFunds>>>,
}

impl StrandedFundsRegistry {
    /// Create new [`StrandedFundsRegistry`]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an entry, replacing any entry for the same operation
    pub async fn insert(&self, funds: StrandedFunds) {
        tracing::warn!(
            "Operation {} stranded {} of {} at {} during {}",
            funds.operation_id,
            funds.amount,
            funds.asset,
            funds.identity.address(),
            funds.stage
        );

        self.entries.write().await.insert(funds.operation_id, funds);
    }

    /// Take the entry for `operation_id` out of the registry
    pub async fn remove(&self, operation_id: &Uuid) -> Option<StrandedFunds> {
        self.entries.write().await.remove(operation_id)
    }

    /// List entries, oldest stage first
    pub async fn list(&self) -> Vec<StrandedFundsInfo> {
        let mut entries: Vec<StrandedFundsInfo> = self
            .entries
            .read()
            .await
            .values()
            .map(StrandedFunds::info)
            .collect();
        entries.sort_by(|a, b| {
            a.stage
                .cmp(&b.stage)
                .then_with(|| a.operation_id.cmp(&b.operation_id))
        });
        entries
    }

    /// Number of entries
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    /// True when nothing is stranded
    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stranded(stage: TradeStep) -> StrandedFunds {
        StrandedFunds {
            operation_id: Uuid::new_v4(),
            identity: EphemeralIdentity::generate().unwrap(),
            asset: AssetId::usdc(),
            amount: Amount::from(500),
            stage,
            reason: "pool offline".to_string(),
        }
    }

    #[tokio::test]
    async fn test_insert_list_remove() {
        let registry = StrandedFundsRegistry::new();
        assert!(registry.is_empty().await);

        let late = stranded(TradeStep::ShieldingResults);
        let early = stranded(TradeStep::WaitingForFunds);
        let late_id = late.operation_id;
        let late_address = late.identity.address();

        registry.insert(late).await;
        registry.insert(early).await;

        let listed = registry.list().await;
        assert_eq!(listed.len(), 2);
        assert_eq!(listed[0].stage, TradeStep::WaitingForFunds);
        assert_eq!(listed[1].address, late_address);

        let removed = registry.remove(&late_id).await.unwrap();
        assert_eq!(removed.identity.address(), late_address);
        assert_eq!(registry.len().await, 1);
        assert!(registry.remove(&late_id).await.is_none());
    }
}
