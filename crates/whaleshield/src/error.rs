//! Errors

use thiserror::Error;
use uuid::Uuid;

/// Trade Error
#[derive(Debug, Error)]
pub enum Error {
    /// Amount must be positive
    #[error("Amount must be greater than zero")]
    InvalidAmount,
    /// Could not create an ephemeral identity
    #[error("Could not generate ephemeral identity: {0}")]
    Identity(String),
    /// Shielded pool withdraw failed, no funds left the pool
    #[error("Withdraw from privacy pool failed: {0}")]
    WithdrawFailed(String),
    /// Shielded pool deposit from a public wallet failed
    #[error("Deposit into privacy pool failed: {0}")]
    DepositFailed(String),
    /// Withdrawn funds never reached the ephemeral identity
    #[error("Timed out waiting for funds to arrive in ephemeral wallet")]
    FundsNotArrived,
    /// Aggregator could not quote the swap
    #[error("Quote unavailable: {0}")]
    QuoteUnavailable(String),
    /// Aggregator could not build the swap transaction
    #[error("Swap transaction build failed: {0}")]
    SwapBuildFailed(String),
    /// Quote, build, sign, broadcast or confirmation failed
    #[error("Swap execution failed: {0}")]
    SwapExecutionFailed(Box<Error>),
    /// Swap output could not be deposited back into the pool
    #[error("Reshield failed for operation {operation_id}: {reason}. Funds remain at the ephemeral address")]
    ReshieldFailed {
        /// Operation whose funds are stranded
        operation_id: Uuid,
        /// Underlying pool error
        reason: String,
    },
    /// No stranded funds recorded for operation
    #[error("No stranded funds recorded for operation {0}")]
    StrandedFundsUnknown(Uuid),
    /// Operation timeout
    #[error("Operation timeout")]
    Timeout,
    /// Url Path segments could not be joined
    #[error("Url path segments could not be joined")]
    UrlPathSegments,
    /// HTTP error with optional status code and response body
    #[error("Http transport error {0:?}: {1}")]
    HttpError(Option<u16>, String),
    /// Common Error
    #[error(transparent)]
    Common(#[from] whaleshield_common::Error),
    /// Url parse error
    #[error(transparent)]
    Url(#[from] url::ParseError),
    /// Serde Error
    #[error(transparent)]
    Serde(#[from] serde_json::Error),
    /// Custom Error
    #[error("`{0}`")]
    Custom(String),
}

impl Error {
    /// Wrap a sub-step failure of the swap stage
    pub(crate) fn swap_execution(err: impl Into<Error>) -> Self {
        Self::SwapExecutionFailed(Box::new(err.into()))
    }
}
