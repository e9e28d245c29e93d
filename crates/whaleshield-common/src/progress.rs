//! Trade progress notifications

use std::fmt;

use serde::{Deserialize, Serialize};

/// Stage of a private swap, in execution order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TradeStep {
    /// Generating the ephemeral identity
    Initializing,
    /// Withdrawing shielded funds to the ephemeral identity
    WithdrawingFromPool,
    /// Waiting for withdrawn funds to land
    WaitingForFunds,
    /// Quoting, signing and broadcasting the swap
    Swapping,
    /// Depositing the swap output back into the pool
    ShieldingResults,
    /// Terminal success
    Completed,
    /// Terminal failure
    Failed,
}

impl TradeStep {
    /// Non-terminal steps in the order a successful run visits them, followed by `Completed`
    pub const SUCCESS_PATH: [TradeStep; 6] = [
        TradeStep::Initializing,
        TradeStep::WithdrawingFromPool,
        TradeStep::WaitingForFunds,
        TradeStep::Swapping,
        TradeStep::ShieldingResults,
        TradeStep::Completed,
    ];

    /// `Completed` and `Failed` end a run
    pub fn is_terminal(&self) -> bool {
        matches!(self, TradeStep::Completed | TradeStep::Failed)
    }

    /// Rough completion percentage for progress bars
    pub fn percent(&self) -> u8 {
        match self {
            TradeStep::Initializing => 10,
            TradeStep::WithdrawingFromPool => 30,
            TradeStep::WaitingForFunds => 50,
            TradeStep::Swapping => 75,
            TradeStep::ShieldingResults => 90,
            TradeStep::Completed | TradeStep::Failed => 100,
        }
    }
}

impl fmt::Display for TradeStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            TradeStep::Initializing => "INITIALIZING",
            TradeStep::WithdrawingFromPool => "WITHDRAWING_FROM_POOL",
            TradeStep::WaitingForFunds => "WAITING_FOR_FUNDS",
            TradeStep::Swapping => "SWAPPING",
            TradeStep::ShieldingResults => "SHIELDING_RESULTS",
            TradeStep::Completed => "COMPLETED",
            TradeStep::Failed => "FAILED",
        };
        f.write_str(s)
    }
}

/// Progress notification emitted at every transition
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TradeProgress {
    /// Step being entered
    pub step: TradeStep,
    /// Human readable status
    pub message: String,
}

impl TradeProgress {
    /// Create new [`TradeProgress`]
    pub fn new<S: Into<String>>(step: TradeStep, message: S) -> Self {
        Self {
            step,
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_step_serde_matches_display() {
        for step in TradeStep::SUCCESS_PATH
            .iter()
            .chain(std::iter::once(&TradeStep::Failed))
        {
            let json = serde_json::to_string(step).unwrap();
            assert_eq!(json, format!("\"{step}\""));
        }
    }

    #[test]
    fn test_success_path_is_ordered() {
        assert!(TradeStep::SUCCESS_PATH.windows(2).all(|w| w[0] < w[1]));
        assert!(TradeStep::SUCCESS_PATH
            .iter()
            .filter(|s| s.is_terminal())
            .eq([TradeStep::Completed].iter()));
    }
}
