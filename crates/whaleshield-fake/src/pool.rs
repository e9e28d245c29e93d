//! Fake shielded pool

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::instrument;
use whaleshield_common::transaction::LegacyMessage;
use whaleshield_common::{
    Address, Amount, AssetId, DepositRequest, ShieldedPool, TransactionRef, TransactionSigner,
    WithdrawRequest,
};

use crate::{Error, FakeLedger};

/// Program id the fake pool's deposit transactions call
pub const POOL_PROGRAM: Address = Address::new([0x70; 32]);

/// Deposit recorded by the pool
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedDeposit {
    /// Asset shielded
    pub asset: AssetId,
    /// Amount shielded
    pub amount: Amount,
    /// Account that signed the deposit
    pub depositor: Address,
    /// Deposit transaction signature
    pub reference: TransactionRef,
}

#[derive(Debug, Default)]
struct PoolState {
    shielded: HashMap<AssetId, Amount>,
    deposits: Vec<RecordedDeposit>,
}

impl PoolState {
    fn shielded(&self, asset: &AssetId) -> Amount {
        self.shielded.get(asset).copied().unwrap_or_default()
    }
}

/// In-memory shielded pool
///
/// Withdrawals pay out the native asset. Deposits move the depositor's
/// ledger balance into the pool, one shielded balance per asset.
#[derive(Debug, Clone)]
pub struct FakeShieldedPool {
    ledger: FakeLedger,
    state: Arc<RwLock<PoolState>>,
    reject_deposits: Arc<AtomicBool>,
}

impl FakeShieldedPool {
    /// Create new [`FakeShieldedPool`] holding `shielded` native units, paying out on `ledger`
    pub fn new(ledger: FakeLedger, shielded: Amount) -> Self {
        let mut state = PoolState::default();
        state.shielded.insert(AssetId::native(), shielded);

        Self {
            ledger,
            state: Arc::new(RwLock::new(state)),
            reject_deposits: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Make every deposit fail until switched back
    pub fn set_reject_deposits(&self, reject: bool) {
        self.reject_deposits.store(reject, Ordering::SeqCst);
    }

    /// Deposits accepted so far
    pub async fn deposits(&self) -> Vec<RecordedDeposit> {
        self.state.read().await.deposits.clone()
    }

    /// Shielded balance of `asset`
    pub async fn shielded_balance(&self, asset: &AssetId) -> Amount {
        self.state.read().await.shielded(asset)
    }
}

#[async_trait]
impl ShieldedPool for FakeShieldedPool {
    #[instrument(skip(self))]
    async fn withdraw(
        &self,
        request: WithdrawRequest,
    ) -> Result<TransactionRef, whaleshield_common::Error> {
        {
            let mut state = self.state.write().await;
            let remaining = state
                .shielded(&AssetId::native())
                .checked_sub(request.amount)
                .ok_or(Error::InsufficientShieldedBalance)?;
            state.shielded.insert(AssetId::native(), remaining);
        }

        self.ledger
            .transfer_native(request.recipient, request.amount)
            .await?;

        Ok(TransactionRef::new(format!(
            "fake-withdraw-{}",
            uuid::Uuid::new_v4()
        )))
    }

    #[instrument(skip_all, fields(asset = %request.asset, amount = %request.amount, depositor = %request.signer_address))]
    async fn deposit(
        &self,
        request: DepositRequest<'_>,
    ) -> Result<TransactionRef, whaleshield_common::Error> {
        if self.reject_deposits.load(Ordering::SeqCst) {
            return Err(Error::DepositRejected.into());
        }

        let transaction = LegacyMessage::new_with_payer(
            request.signer_address,
            POOL_PROGRAM,
            request.amount.to_u64().to_le_bytes().to_vec(),
            [0u8; 32],
        )
        .into_transaction()?;

        let transaction = request
            .transaction_signer
            .sign_transaction(transaction)
            .await?;
        transaction.verify()?;

        let reference = transaction.id().ok_or(whaleshield_common::Error::Pool(
            "deposit left unsigned".to_string(),
        ))?;

        self.ledger
            .debit(request.signer_address, request.asset.clone(), request.amount)
            .await
            .map_err(|err| whaleshield_common::Error::Pool(err.to_string()))?;

        let mut state = self.state.write().await;
        let shielded = state
            .shielded(request.asset)
            .checked_add(request.amount)
            .ok_or(whaleshield_common::amount::Error::AmountOverflow)?;
        state.shielded.insert(request.asset.clone(), shielded);
        state.deposits.push(RecordedDeposit {
            asset: request.asset.clone(),
            amount: request.amount,
            depositor: request.signer_address,
            reference: reference.clone(),
        });

        Ok(reference)
    }

    /// Shielded native balance
    async fn private_balance(&self) -> Result<Amount, whaleshield_common::Error> {
        Ok(self.state.read().await.shielded(&AssetId::native()))
    }
}
