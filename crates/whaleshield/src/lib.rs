//! Private swaps routed through single-use identities
#![doc = include_str!("../README.md")]
#![warn(missing_docs)]
#![warn(rustdoc::bare_urls)]

pub mod aggregator;
pub mod error;
pub mod identity;
pub mod ledger;
pub mod shield;
pub mod trade;
pub mod wait;

#[cfg(test)]
mod test_utils;

/// Re-export shared types
#[doc(hidden)]
pub use whaleshield_common::{
    self as common, Address, Amount, AssetId, LedgerConnector, ShieldedPool, TradeProgress,
    TradeStep, TransactionRef, TransactionSigner,
};

pub use self::aggregator::{AggregatorConfig, SwapAggregator, SwapQuote};
#[cfg(feature = "http")]
pub use self::aggregator::HttpAggregatorClient;
pub use self::error::Error;
pub use self::identity::EphemeralIdentity;
pub use self::ledger::{Commitment, RpcConfig};
#[cfg(feature = "http")]
pub use self::ledger::RpcClient;
pub use self::shield::ShieldService;
pub use self::trade::{
    StrandedFundsInfo, TradeConfig, TradeEngine, TradeEngineBuilder, TradeOutcome, TradeRequest,
};
pub use self::wait::FundsWatcher;
