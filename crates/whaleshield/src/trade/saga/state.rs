//! State types for the private swap saga.
//!
//! Each state holds what the following stage needs. The ephemeral identity
//! moves from state to state and is never copied.

use uuid::Uuid;
use whaleshield_common::{Amount, TransactionRef};

use crate::aggregator::SwapQuote;
use crate::identity::EphemeralIdentity;
use crate::trade::TradeOutcome;

/// Initial state - operation ID assigned but no work done yet.
#[derive(Debug)]
pub struct Initial {
    /// Unique operation identifier
    pub operation_id: Uuid,
}

/// Identity generated. Methods available: `withdraw()`
#[derive(Debug)]
pub struct Initialized {
    /// Unique operation identifier
    pub operation_id: Uuid,
    /// Single-use identity for this run
    pub identity: EphemeralIdentity,
}

/// Pool withdraw submitted. Methods available: `wait_for_funds()`
#[derive(Debug)]
pub struct Withdrawn {
    /// Unique operation identifier
    pub operation_id: Uuid,
    /// Single-use identity for this run
    pub identity: EphemeralIdentity,
    /// Pool withdraw reference
    pub withdraw_ref: TransactionRef,
}

/// Withdrawn funds observed at the identity. Methods available: `swap()`
#[derive(Debug)]
pub struct Funded {
    /// Unique operation identifier
    pub operation_id: Uuid,
    /// Single-use identity for this run
    pub identity: EphemeralIdentity,
    /// Pool withdraw reference
    pub withdraw_ref: TransactionRef,
    /// First balance seen above zero
    pub observed_balance: Amount,
}

/// Swap confirmed. Methods available: `reshield()`
#[derive(Debug)]
pub struct Swapped {
    /// Unique operation identifier
    pub operation_id: Uuid,
    /// Single-use identity for this run
    pub identity: EphemeralIdentity,
    /// Pool withdraw reference
    pub withdraw_ref: TransactionRef,
    /// Quote the swap was built from
    pub quote: SwapQuote,
    /// Signature of the confirmed swap
    pub swap_signature: TransactionRef,
}

/// Reshield done, or skipped because there was nothing to shield.
#[derive(Debug)]
pub struct Finalized {
    /// Result returned to the caller
    pub outcome: TradeOutcome,
}
