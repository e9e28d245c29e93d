//! Private Swap Saga - Type State Pattern Implementation
//!
//! Drives one private swap through its stages. Each stage is a distinct type
//! so stages can only run in order, and the ephemeral identity is moved along
//! rather than shared.
//!
//! # State Flow
//!
//! ```text
//! Initial ──► Initialized ──► Withdrawn ──► Funded ──► Swapped ──► Finalized
//!                  │              │            │           │
//!                  │              │            │           └─ deposit fails ──► [stranded]
//!                  │              │            └─ swap fails ─────────────────► [stranded]
//!                  │              └─ funds never arrive ──────────────────────► [stranded]
//!                  └─ withdraw fails ─────────────────────────────────────────► [aborted]
//! ```
//!
//! Every stage reports its progress before doing any work. Once funds have
//! left the pool, a failure hands the identity to the stranded-funds registry
//! so the deposit can be retried later.

use tracing::instrument;
use whaleshield_common::{
    DepositRequest, TradeProgress, TradeStep, TransactionSigner, VersionedTransaction,
    WithdrawRequest,
};

use self::state::{Finalized, Funded, Initial, Initialized, Swapped, Withdrawn};
use super::{TradeEngine, TradeOutcome, TradeRequest};
use crate::aggregator::SwapQuote;
use crate::identity::EphemeralIdentity;
use crate::trade::recovery::StrandedFunds;
use crate::Error;

pub(crate) mod state;

/// Progress sink shared by every stage of a run
pub(crate) type ProgressFn<'a> = &'a (dyn Fn(TradeProgress) + Send + Sync);

/// Private swap saga using typestate pattern for compile-time state transition safety.
pub(crate) struct PrivateSwapSaga<'a, S> {
    engine: &'a TradeEngine,
    request: &'a TradeRequest,
    on_progress: ProgressFn<'a>,
    state_data: S,
}

impl<'a, S> PrivateSwapSaga<'a, S> {
    fn emit(&self, step: TradeStep, message: &str) {
        (self.on_progress)(TradeProgress::new(step, message));
    }

    fn advance<T>(self, state_data: T) -> PrivateSwapSaga<'a, T> {
        PrivateSwapSaga {
            engine: self.engine,
            request: self.request,
            on_progress: self.on_progress,
            state_data,
        }
    }
}

impl<'a> PrivateSwapSaga<'a, Initial> {
    /// Create a new saga in the Initial state.
    pub fn new(
        engine: &'a TradeEngine,
        request: &'a TradeRequest,
        on_progress: ProgressFn<'a>,
    ) -> Self {
        Self {
            engine,
            request,
            on_progress,
            state_data: Initial {
                operation_id: uuid::Uuid::new_v4(),
            },
        }
    }

    /// Generate the ephemeral identity for this run.
    #[instrument(skip_all)]
    pub async fn initialize(self) -> Result<PrivateSwapSaga<'a, Initialized>, Error> {
        self.emit(
            TradeStep::Initializing,
            "Generating ephemeral trading identity...",
        );

        let operation_id = self.state_data.operation_id;
        let identity = EphemeralIdentity::generate()?;

        tracing::info!(
            "Operation {} trading through ephemeral identity {}",
            operation_id,
            identity.address()
        );

        Ok(self.advance(Initialized {
            operation_id,
            identity,
        }))
    }
}

impl<'a> PrivateSwapSaga<'a, Initialized> {
    /// Withdraw the requested amount from the pool to the ephemeral identity.
    ///
    /// Nothing has left the pool if this fails, so there is nothing to recover.
    #[instrument(skip_all)]
    pub async fn withdraw(self) -> Result<PrivateSwapSaga<'a, Withdrawn>, Error> {
        self.emit(
            TradeStep::WithdrawingFromPool,
            "Withdrawing shielded funds to ephemeral wallet...",
        );

        let request = WithdrawRequest {
            amount: self.request.amount,
            recipient: self.state_data.identity.address(),
        };

        let withdraw_ref = self
            .engine
            .pool
            .withdraw(request)
            .await
            .map_err(|err| Error::WithdrawFailed(err.to_string()))?;

        tracing::info!(
            "Withdrew {} from pool for operation {}: {}",
            self.request.amount,
            self.state_data.operation_id,
            withdraw_ref
        );

        let Initialized {
            operation_id,
            identity,
        } = self.state_data;

        Ok(PrivateSwapSaga {
            engine: self.engine,
            request: self.request,
            on_progress: self.on_progress,
            state_data: Withdrawn {
                operation_id,
                identity,
                withdraw_ref,
            },
        })
    }
}

impl<'a> PrivateSwapSaga<'a, Withdrawn> {
    /// Wait for the withdrawn funds to land at the ephemeral identity.
    #[instrument(skip_all)]
    pub async fn wait_for_funds(self) -> Result<PrivateSwapSaga<'a, Funded>, Error> {
        self.emit(
            TradeStep::WaitingForFunds,
            "Waiting for funds to arrive in ephemeral wallet...",
        );

        let address = self.state_data.identity.address();
        let waited = self
            .engine
            .config
            .watcher()
            .wait_for_balance(
                self.engine.ledger.as_ref(),
                &address,
                whaleshield_common::Amount::ZERO,
            )
            .await;

        let Withdrawn {
            operation_id,
            identity,
            withdraw_ref,
        } = self.state_data;

        let observed_balance = match waited {
            Ok(balance) => balance,
            Err(err) => {
                tracing::error!(
                    "Funds for operation {} never reached {}: {}",
                    operation_id,
                    address,
                    err
                );
                let error = Error::FundsNotArrived;
                self.engine
                    .strand(StrandedFunds {
                        operation_id,
                        identity,
                        asset: self.request.input_asset.clone(),
                        amount: self.request.amount,
                        stage: TradeStep::WaitingForFunds,
                        reason: error.to_string(),
                    })
                    .await;
                return Err(error);
            }
        };

        Ok(PrivateSwapSaga {
            engine: self.engine,
            request: self.request,
            on_progress: self.on_progress,
            state_data: Funded {
                operation_id,
                identity,
                withdraw_ref,
                observed_balance,
            },
        })
    }
}

impl<'a> PrivateSwapSaga<'a, Funded> {
    /// Quote, build, sign, broadcast and confirm the swap.
    ///
    /// None of the sub-steps is retried. Any failure is reported as
    /// [`Error::SwapExecutionFailed`] wrapping the sub-step's error.
    #[instrument(skip_all)]
    pub async fn swap(self) -> Result<PrivateSwapSaga<'a, Swapped>, Error> {
        self.emit(TradeStep::Swapping, "Executing swap via Jupiter...");

        tracing::debug!(
            "Swapping {} of observed balance {} for operation {}",
            self.request.amount,
            self.state_data.observed_balance,
            self.state_data.operation_id
        );

        let executed = self.execute_swap().await;

        let Funded {
            operation_id,
            identity,
            withdraw_ref,
            ..
        } = self.state_data;

        let (quote, swap_signature) = match executed {
            Ok(executed) => executed,
            Err(err) => {
                let error = Error::swap_execution(err);
                tracing::error!("Swap for operation {} failed: {}", operation_id, error);
                self.engine
                    .strand(StrandedFunds {
                        operation_id,
                        identity,
                        asset: self.request.input_asset.clone(),
                        amount: self.request.amount,
                        stage: TradeStep::Swapping,
                        reason: error.to_string(),
                    })
                    .await;
                return Err(error);
            }
        };

        tracing::info!(
            "Swap {} confirmed for operation {}, quoted output {} {}",
            swap_signature,
            operation_id,
            quote.out_amount,
            quote.output_mint
        );

        Ok(PrivateSwapSaga {
            engine: self.engine,
            request: self.request,
            on_progress: self.on_progress,
            state_data: Swapped {
                operation_id,
                identity,
                withdraw_ref,
                quote,
                swap_signature,
            },
        })
    }

    async fn execute_swap(&self) -> Result<(SwapQuote, whaleshield_common::TransactionRef), Error> {
        let identity = &self.state_data.identity;
        let aggregator = self.engine.aggregator.as_ref();
        let ledger = self.engine.ledger.as_ref();

        let quote = aggregator
            .get_quote(
                &self.request.input_asset,
                &self.request.output_asset,
                self.request.amount,
                self.engine.config.slippage_bps,
            )
            .await?;

        let transaction_bytes = aggregator
            .get_swap_transaction(&quote, &identity.address())
            .await?;

        let transaction = VersionedTransaction::from_bytes(&transaction_bytes)?;
        let transaction = identity.sign_transaction(transaction).await?;

        let signature = ledger.send_transaction(&transaction).await?;
        ledger.confirm_transaction(&signature).await?;

        Ok((quote, signature))
    }
}

impl<'a> PrivateSwapSaga<'a, Swapped> {
    /// Deposit the swap output back into the pool, signed by the ephemeral identity.
    ///
    /// Skips the deposit when the realized amount is zero.
    #[instrument(skip_all)]
    pub async fn reshield(self) -> Result<PrivateSwapSaga<'a, Finalized>, Error> {
        self.emit(
            TradeStep::ShieldingResults,
            "Shielding resulting assets back into privacy pool...",
        );

        let Swapped {
            operation_id,
            identity,
            withdraw_ref,
            quote,
            swap_signature,
        } = self.state_data;

        let ephemeral_address = identity.address();
        let output_asset = &self.request.output_asset;

        let realized = self
            .engine
            .realized_amount(output_asset, quote.out_amount, &ephemeral_address)
            .await;

        let deposited = match realized {
            Ok(None) => {
                tracing::info!(
                    "Nothing to shield for operation {}, skipping deposit",
                    operation_id
                );
                Ok(None)
            }
            Ok(Some(amount)) => self
                .engine
                .pool
                .deposit(DepositRequest {
                    asset: output_asset,
                    amount,
                    signer_address: ephemeral_address,
                    transaction_signer: &identity,
                })
                .await
                .map(|deposit_ref| Some((deposit_ref, amount)))
                .map_err(Error::from),
            Err(err) => Err(err),
        };

        let deposited = match deposited {
            Ok(deposited) => deposited,
            Err(err) => {
                let reason = err.to_string();
                tracing::error!(
                    "Reshield for operation {} failed, funds remain at {}: {}",
                    operation_id,
                    ephemeral_address,
                    reason
                );
                self.engine
                    .strand(StrandedFunds {
                        operation_id,
                        identity,
                        asset: output_asset.clone(),
                        amount: quote.out_amount,
                        stage: TradeStep::ShieldingResults,
                        reason: reason.clone(),
                    })
                    .await;
                return Err(Error::ReshieldFailed {
                    operation_id,
                    reason,
                });
            }
        };

        if let Some((deposit_ref, amount)) = &deposited {
            tracing::info!(
                "Shielded {} for operation {}: {}",
                amount,
                operation_id,
                deposit_ref
            );
        }

        let (deposit_ref, realized_amount) = deposited.unzip();

        Ok(PrivateSwapSaga {
            engine: self.engine,
            request: self.request,
            on_progress: self.on_progress,
            state_data: Finalized {
                outcome: TradeOutcome {
                    operation_id,
                    ephemeral_address,
                    withdraw_ref,
                    swap_signature,
                    deposit_ref,
                    realized_amount,
                },
            },
        })
    }
}

impl PrivateSwapSaga<'_, Finalized> {
    /// Consume the saga and return its outcome.
    pub fn into_outcome(self) -> TradeOutcome {
        self.state_data.outcome
    }
}
