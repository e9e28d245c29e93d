//! Private swap orchestration
//!
//! [`TradeEngine::execute_private_swap`] moves value out of the shielded pool
//! to a fresh ephemeral identity, swaps it through the aggregator and deposits
//! the result back into the pool.

use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::instrument;
use uuid::Uuid;
use whaleshield_common::{
    Address, Amount, AssetId, DepositRequest, LedgerConnector, ShieldedPool, TradeProgress,
    TradeStep, TransactionRef,
};

use self::saga::PrivateSwapSaga;
use crate::aggregator::{SwapAggregator, DEFAULT_SLIPPAGE_BPS};
use crate::wait::FundsWatcher;
use crate::Error;

mod builder;
mod recovery;
mod saga;

pub use builder::TradeEngineBuilder;
pub use recovery::{StrandedFunds, StrandedFundsInfo, StrandedFundsRegistry};

/// Native balance kept back at the ephemeral identity to pay fees
pub const DEFAULT_FEE_RESERVE: u64 = 5_000_000;

/// Message reported with [`TradeStep::Completed`]
pub const COMPLETED_MESSAGE: &str = "Private swap executed successfully. Wallet link broken.";

/// Trade tuning
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TradeConfig {
    /// Native amount left behind when reshielding native output
    pub fee_reserve: Amount,
    /// Maximum swap slippage in basis points
    pub slippage_bps: u16,
    /// Seconds between funds-arrival polls
    pub poll_interval_secs: u64,
    /// Funds-arrival polls before giving up
    pub max_poll_attempts: u32,
    /// Asset whose realized amount is read from the ledger balance
    pub native_asset: AssetId,
}

impl Default for TradeConfig {
    fn default() -> Self {
        Self {
            fee_reserve: Amount::from(DEFAULT_FEE_RESERVE),
            slippage_bps: DEFAULT_SLIPPAGE_BPS,
            poll_interval_secs: 2,
            max_poll_attempts: 30,
            native_asset: AssetId::native(),
        }
    }
}

impl TradeConfig {
    /// Delay between funds-arrival polls
    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }

    /// Funds-arrival watcher with these settings
    pub fn watcher(&self) -> FundsWatcher {
        FundsWatcher::new(self.poll_interval(), self.max_poll_attempts)
    }
}

/// A private swap to perform
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TradeRequest {
    /// Asset withdrawn from the pool and sold
    pub input_asset: AssetId,
    /// Asset bought and deposited back into the pool
    pub output_asset: AssetId,
    /// Amount of `input_asset` in base units
    pub amount: Amount,
}

impl TradeRequest {
    /// Create new [`TradeRequest`]
    pub fn new(input_asset: AssetId, output_asset: AssetId, amount: Amount) -> Result<Self, Error> {
        if amount.is_zero() {
            return Err(Error::InvalidAmount);
        }

        Ok(Self {
            input_asset,
            output_asset,
            amount,
        })
    }
}

/// Result of a successful private swap
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TradeOutcome {
    /// Operation id
    pub operation_id: Uuid,
    /// Ephemeral address the trade went through
    pub ephemeral_address: Address,
    /// Pool withdraw reference
    pub withdraw_ref: TransactionRef,
    /// Swap transaction signature
    pub swap_signature: TransactionRef,
    /// Pool deposit reference, `None` when there was nothing to shield
    pub deposit_ref: Option<TransactionRef>,
    /// Amount deposited, `None` when there was nothing to shield
    pub realized_amount: Option<Amount>,
}

/// Private swap engine
#[derive(Debug)]
pub struct TradeEngine {
    pub(crate) pool: Arc<dyn ShieldedPool>,
    pub(crate) ledger: Arc<dyn LedgerConnector>,
    pub(crate) aggregator: Arc<dyn SwapAggregator>,
    pub(crate) config: TradeConfig,
    pub(crate) stranded: StrandedFundsRegistry,
}

impl TradeEngine {
    /// Start building a [`TradeEngine`]
    pub fn builder() -> TradeEngineBuilder {
        TradeEngineBuilder::new()
    }

    /// Trade settings
    pub fn config(&self) -> &TradeConfig {
        &self.config
    }

    /// Execute a private swap
    ///
    /// `on_progress` is called synchronously when each stage starts, then
    /// once with [`TradeStep::Completed`] or exactly once with
    /// [`TradeStep::Failed`]. The error reported with `Failed` is the one
    /// returned. A zero amount is rejected before anything is reported.
    #[instrument(skip_all, fields(input = %request.input_asset, output = %request.output_asset, amount = %request.amount))]
    pub async fn execute_private_swap<F>(
        &self,
        request: TradeRequest,
        on_progress: F,
    ) -> Result<TradeOutcome, Error>
    where
        F: Fn(TradeProgress) + Send + Sync,
    {
        if request.amount.is_zero() {
            return Err(Error::InvalidAmount);
        }

        match self.run(&request, &on_progress).await {
            Ok(outcome) => {
                tracing::info!(
                    "Private swap {} completed through {}",
                    outcome.operation_id,
                    outcome.ephemeral_address
                );
                on_progress(TradeProgress::new(TradeStep::Completed, COMPLETED_MESSAGE));
                Ok(outcome)
            }
            Err(err) => {
                tracing::error!("Private swap failed: {}", err);
                on_progress(TradeProgress::new(
                    TradeStep::Failed,
                    format!("Trade failed: {err}"),
                ));
                Err(err)
            }
        }
    }

    async fn run(
        &self,
        request: &TradeRequest,
        on_progress: &(dyn Fn(TradeProgress) + Send + Sync),
    ) -> Result<TradeOutcome, Error> {
        let saga = PrivateSwapSaga::new(self, request, on_progress)
            .initialize()
            .await?
            .withdraw()
            .await?
            .wait_for_funds()
            .await?
            .swap()
            .await?
            .reshield()
            .await?;

        Ok(saga.into_outcome())
    }

    /// Funds left at ephemeral identities by failed runs
    pub async fn stranded(&self) -> Vec<StrandedFundsInfo> {
        self.stranded.list().await
    }

    /// Retry depositing the funds stranded by `operation_id`
    ///
    /// Returns the deposit reference, or `None` when there is currently
    /// nothing to shield; the entry is kept in that case. On failure the
    /// entry is kept with the new reason.
    #[instrument(skip(self))]
    pub async fn retry_reshield(&self, operation_id: Uuid) -> Result<Option<TransactionRef>, Error> {
        let mut funds = self
            .stranded
            .remove(&operation_id)
            .await
            .ok_or(Error::StrandedFundsUnknown(operation_id))?;

        let address = funds.identity.address();

        let deposited = match self.recoverable_amount(&funds, &address).await {
            Ok(None) => Ok(None),
            Ok(Some(amount)) => self
                .pool
                .deposit(DepositRequest {
                    asset: &funds.asset,
                    amount,
                    signer_address: address,
                    transaction_signer: &funds.identity,
                })
                .await
                .map(Some)
                .map_err(Error::from),
            Err(err) => Err(err),
        };

        match deposited {
            Ok(Some(deposit_ref)) => {
                tracing::info!(
                    "Recovered stranded funds of operation {}: {}",
                    operation_id,
                    deposit_ref
                );
                Ok(Some(deposit_ref))
            }
            Ok(None) => {
                tracing::info!(
                    "Nothing to shield yet at {} for operation {}",
                    address,
                    operation_id
                );
                self.stranded.insert(funds).await;
                Ok(None)
            }
            Err(err) => {
                let reason = err.to_string();
                funds.reason = reason.clone();
                self.stranded.insert(funds).await;
                Err(Error::ReshieldFailed {
                    operation_id,
                    reason,
                })
            }
        }
    }

    /// Amount of a stranded entry that can be deposited now
    ///
    /// Entries stranded while waiting for funds are only recovered once the
    /// identity holds a native balance, the same arrival signal the funds
    /// watcher uses.
    async fn recoverable_amount(
        &self,
        funds: &StrandedFunds,
        address: &Address,
    ) -> Result<Option<Amount>, Error> {
        if funds.stage == TradeStep::WaitingForFunds && funds.asset != self.config.native_asset {
            let balance = self.ledger.get_balance(address).await?;
            if balance.is_zero() {
                tracing::debug!(
                    "No funds have arrived at {} for operation {}",
                    address,
                    funds.operation_id
                );
                return Ok(None);
            }
        }

        self.realized_amount(&funds.asset, funds.amount, address)
            .await
    }

    /// Amount available to deposit back into the pool
    ///
    /// Native output is read from the ledger minus the fee reserve. Other
    /// assets use `expected`, the quoted output. Zero means nothing to shield.
    pub(crate) async fn realized_amount(
        &self,
        asset: &AssetId,
        expected: Amount,
        address: &Address,
    ) -> Result<Option<Amount>, Error> {
        let realized = if asset == &self.config.native_asset {
            let balance = self.ledger.get_balance(address).await?;
            tracing::debug!(
                "Native balance at {} is {}, reserving {}",
                address,
                balance,
                self.config.fee_reserve
            );
            balance.checked_sub(self.config.fee_reserve)
        } else {
            Some(expected)
        };

        Ok(realized.filter(|amount| !amount.is_zero()))
    }

    pub(crate) async fn strand(&self, funds: StrandedFunds) {
        self.stranded.insert(funds).await;
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use whaleshield_common::Error as CommonError;

    use super::*;
    use crate::test_utils::{test_quote, MockAggregator, MockLedger, MockPool};

    struct Harness {
        engine: TradeEngine,
        pool: Arc<MockPool>,
        ledger: Arc<MockLedger>,
        aggregator: Arc<MockAggregator>,
    }

    fn harness() -> Harness {
        let pool = Arc::new(MockPool::new());
        let ledger = Arc::new(MockLedger::new());
        let aggregator = Arc::new(MockAggregator::new());

        let engine = TradeEngine::builder()
            .shared_pool(pool.clone())
            .shared_ledger(ledger.clone())
            .shared_aggregator(aggregator.clone())
            .build()
            .unwrap();

        Harness {
            engine,
            pool,
            ledger,
            aggregator,
        }
    }

    fn recorder() -> (Arc<Mutex<Vec<TradeProgress>>>, impl Fn(TradeProgress) + Send + Sync) {
        let events = Arc::new(Mutex::new(Vec::new()));
        let sink = events.clone();
        (events, move |progress| sink.lock().unwrap().push(progress))
    }

    fn sol_to_usdc(amount: u64) -> TradeRequest {
        TradeRequest::new(AssetId::native(), AssetId::usdc(), Amount::from(amount)).unwrap()
    }

    #[test]
    fn test_trade_request_rejects_zero() {
        assert!(matches!(
            TradeRequest::new(AssetId::native(), AssetId::usdc(), Amount::ZERO),
            Err(Error::InvalidAmount)
        ));
    }

    #[test]
    fn test_trade_config_defaults() {
        let config = TradeConfig::default();
        assert_eq!(config.fee_reserve, Amount::from(5_000_000));
        assert_eq!(config.slippage_bps, 50);
        assert_eq!(config.watcher().max_wait(), Duration::from_secs(60));
        assert!(config.native_asset.is_native());
    }

    #[tokio::test]
    async fn test_zero_amount_touches_nothing() {
        let h = harness();
        let (events, sink) = recorder();

        let request = TradeRequest {
            input_asset: AssetId::native(),
            output_asset: AssetId::usdc(),
            amount: Amount::ZERO,
        };

        let result = h.engine.execute_private_swap(request, sink).await;

        assert!(matches!(result, Err(Error::InvalidAmount)));
        assert!(events.lock().unwrap().is_empty());
        assert_eq!(h.pool.withdraw_calls(), 0);
        assert_eq!(h.aggregator.quote_calls(), 0);
    }

    #[tokio::test]
    async fn test_happy_path_reports_every_step() {
        let h = harness();
        h.ledger.set_default_balance(Amount::from(1_000_000_000));
        h.aggregator
            .set_quote_response(Ok(test_quote(1_000_000_000, 500)));

        let (events, sink) = recorder();
        let outcome = h
            .engine
            .execute_private_swap(sol_to_usdc(1_000_000_000), sink)
            .await
            .unwrap();

        let steps: Vec<TradeStep> = events.lock().unwrap().iter().map(|e| e.step).collect();
        assert_eq!(steps, TradeStep::SUCCESS_PATH.to_vec());

        assert_eq!(outcome.realized_amount, Some(Amount::from(500)));
        assert!(outcome.deposit_ref.is_some());

        let withdraws = h.pool.withdraws();
        assert_eq!(withdraws.len(), 1);
        assert_eq!(withdraws[0].recipient, outcome.ephemeral_address);

        let deposits = h.pool.deposits();
        assert_eq!(deposits, vec![(Amount::from(500), outcome.ephemeral_address)]);

        let sent = h.ledger.sent_transactions();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].fee_payer(), Some(&outcome.ephemeral_address));
        assert!(sent[0].verify().is_ok());
    }

    #[tokio::test]
    async fn test_native_output_keeps_fee_reserve() {
        let h = harness();
        h.ledger.set_default_balance(Amount::from(12_000_000));
        h.aggregator.set_quote_response(Ok(test_quote(500, 7_000_000)));

        let request =
            TradeRequest::new(AssetId::usdc(), AssetId::native(), Amount::from(500)).unwrap();
        let outcome = h
            .engine
            .execute_private_swap(request, |_| {})
            .await
            .unwrap();

        assert_eq!(outcome.realized_amount, Some(Amount::from(7_000_000)));
    }

    #[tokio::test]
    async fn test_native_output_below_reserve_skips_deposit() {
        let h = harness();
        h.ledger.set_default_balance(Amount::from(5_000_000));
        h.aggregator.set_quote_response(Ok(test_quote(500, 10)));

        let (events, sink) = recorder();
        let request =
            TradeRequest::new(AssetId::usdc(), AssetId::native(), Amount::from(500)).unwrap();
        let outcome = h.engine.execute_private_swap(request, sink).await.unwrap();

        assert_eq!(outcome.deposit_ref, None);
        assert_eq!(outcome.realized_amount, None);
        assert!(h.pool.deposits().is_empty());
        assert_eq!(
            events.lock().unwrap().last().map(|e| e.step),
            Some(TradeStep::Completed)
        );
    }

    #[tokio::test]
    async fn test_withdraw_failure_stops_run() {
        let h = harness();
        h.pool
            .set_withdraw_response(Err(CommonError::Pool("proof rejected".to_string())));

        let (events, sink) = recorder();
        let result = h
            .engine
            .execute_private_swap(sol_to_usdc(1_000), sink)
            .await;

        assert!(matches!(result, Err(Error::WithdrawFailed(_))));
        assert_eq!(h.ledger.balance_calls(), 0);
        assert_eq!(h.aggregator.quote_calls(), 0);
        assert!(h.engine.stranded().await.is_empty());

        let events = events.lock().unwrap();
        let failed: Vec<_> = events
            .iter()
            .filter(|e| e.step == TradeStep::Failed)
            .collect();
        assert_eq!(failed.len(), 1);
        assert_eq!(
            failed[0].message,
            "Trade failed: Withdraw from privacy pool failed: Shielded pool error: proof rejected"
        );
    }

    #[tokio::test]
    async fn test_quote_failure_is_swap_execution_failure() {
        let h = harness();
        h.ledger.set_default_balance(Amount::from(1_000));
        h.aggregator
            .set_quote_response(Err(Error::QuoteUnavailable("no route".to_string())));

        let (events, sink) = recorder();
        let result = h
            .engine
            .execute_private_swap(sol_to_usdc(1_000), sink)
            .await;

        let err = result.unwrap_err();
        assert!(matches!(err, Error::SwapExecutionFailed(_)));
        assert_eq!(
            err.to_string(),
            "Swap execution failed: Quote unavailable: no route"
        );
        assert!(h.pool.deposits().is_empty());
        assert!(h.ledger.sent_transactions().is_empty());

        let events = events.lock().unwrap();
        let last = events.last().unwrap();
        assert_eq!(last.step, TradeStep::Failed);
        assert!(last.message.contains("Quote unavailable: no route"));

        let stranded = h.engine.stranded().await;
        assert_eq!(stranded.len(), 1);
        assert_eq!(stranded[0].stage, TradeStep::Swapping);
        assert_eq!(stranded[0].asset, AssetId::native());
    }

    #[tokio::test]
    async fn test_confirmation_failure_is_swap_execution_failure() {
        let h = harness();
        h.ledger.set_default_balance(Amount::from(1_000));
        h.ledger.set_confirm_response(Err(CommonError::TransactionFailed(
            "sig".to_string(),
            "InstructionError".to_string(),
        )));

        let result = h
            .engine
            .execute_private_swap(sol_to_usdc(1_000), |_| {})
            .await;

        assert!(matches!(result, Err(Error::SwapExecutionFailed(_))));
        assert!(h.pool.deposits().is_empty());
    }

    #[tokio::test]
    async fn test_reshield_failure_strands_and_retry_recovers() {
        let h = harness();
        h.ledger.set_default_balance(Amount::from(1_000));
        h.aggregator.set_quote_response(Ok(test_quote(1_000, 500)));
        h.pool
            .set_deposit_response(Err(CommonError::Pool("pool offline".to_string())));

        let result = h
            .engine
            .execute_private_swap(sol_to_usdc(1_000), |_| {})
            .await;

        let operation_id = match result {
            Err(Error::ReshieldFailed { operation_id, .. }) => operation_id,
            other => panic!("unexpected result {other:?}"),
        };

        let stranded = h.engine.stranded().await;
        assert_eq!(stranded.len(), 1);
        assert_eq!(stranded[0].operation_id, operation_id);
        assert_eq!(stranded[0].amount, Amount::from(500));
        assert_eq!(stranded[0].asset, AssetId::usdc());

        let deposit_ref = h.engine.retry_reshield(operation_id).await.unwrap();
        assert!(deposit_ref.is_some());
        assert!(h.engine.stranded().await.is_empty());
        assert_eq!(
            h.pool.deposits(),
            vec![(Amount::from(500), stranded[0].address)]
        );

        assert!(matches!(
            h.engine.retry_reshield(operation_id).await,
            Err(Error::StrandedFundsUnknown(id)) if id == operation_id
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn test_funds_never_arrive() {
        let h = harness();

        let (events, sink) = recorder();
        let result = h
            .engine
            .execute_private_swap(sol_to_usdc(1_000), sink)
            .await;

        assert!(matches!(result, Err(Error::FundsNotArrived)));
        assert_eq!(h.ledger.balance_calls(), 30);
        assert_eq!(h.aggregator.quote_calls(), 0);
        assert!(h.pool.deposits().is_empty());

        let steps: Vec<TradeStep> = events.lock().unwrap().iter().map(|e| e.step).collect();
        assert_eq!(
            steps,
            vec![
                TradeStep::Initializing,
                TradeStep::WithdrawingFromPool,
                TradeStep::WaitingForFunds,
                TradeStep::Failed
            ]
        );

        let stranded = h.engine.stranded().await;
        assert_eq!(stranded[0].stage, TradeStep::WaitingForFunds);
    }

    #[tokio::test(start_paused = true)]
    async fn test_retry_waits_for_arrival_of_non_native_input() {
        let h = harness();

        let request =
            TradeRequest::new(AssetId::usdc(), AssetId::native(), Amount::from(500)).unwrap();
        let result = h.engine.execute_private_swap(request, |_| {}).await;
        assert!(matches!(result, Err(Error::FundsNotArrived)));

        let stranded = h.engine.stranded().await;
        assert_eq!(stranded.len(), 1);
        assert_eq!(stranded[0].asset, AssetId::usdc());
        let operation_id = stranded[0].operation_id;

        // Nothing at the identity yet: no deposit and the entry stays
        assert_eq!(h.engine.retry_reshield(operation_id).await.unwrap(), None);
        assert!(h.pool.deposits().is_empty());
        assert_eq!(h.engine.stranded().await.len(), 1);

        h.ledger.set_default_balance(Amount::from(2_000_000));
        let deposit_ref = h.engine.retry_reshield(operation_id).await.unwrap();

        assert!(deposit_ref.is_some());
        assert_eq!(
            h.pool.deposits(),
            vec![(Amount::from(500), stranded[0].address)]
        );
        assert!(h.engine.stranded().await.is_empty());
    }
}
