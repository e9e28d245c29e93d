//! Swap aggregator
//!
//! Stateless request/response wrapper around a remote quote service. No
//! retries happen here; callers decide whether to try again.

use std::fmt::Debug;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use whaleshield_common::amount::serde_string;
use whaleshield_common::{Address, Amount, AssetId};

use crate::Error;

#[cfg(feature = "http")]
pub mod http_client;

#[cfg(feature = "http")]
pub use http_client::HttpAggregatorClient;

/// Default aggregator endpoint
pub const DEFAULT_AGGREGATOR_URL: &str = "https://quote-api.jup.ag/v6";

/// Default maximum slippage in basis points
pub const DEFAULT_SLIPPAGE_BPS: u16 = 50;

/// Aggregator client settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AggregatorConfig {
    /// Base url of the quote API
    pub url: String,
    /// Let the aggregator wrap and unwrap the native asset
    pub wrap_and_unwrap_sol: bool,
}

impl Default for AggregatorConfig {
    fn default() -> Self {
        Self {
            url: DEFAULT_AGGREGATOR_URL.to_string(),
            wrap_and_unwrap_sol: true,
        }
    }
}

/// Quote returned by the aggregator
///
/// Only `out_amount` is read by the engine. The rest is routing data that is
/// posted back to the aggregator untouched when building the transaction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SwapQuote {
    /// Asset sold
    pub input_mint: AssetId,
    /// Asset bought
    pub output_mint: AssetId,
    /// Amount sold
    #[serde(with = "serde_string")]
    pub in_amount: Amount,
    /// Expected amount bought
    #[serde(with = "serde_string")]
    pub out_amount: Amount,
    /// Minimum amount bought after slippage
    #[serde(with = "serde_string")]
    pub other_amount_threshold: Amount,
    /// `ExactIn` or `ExactOut`
    pub swap_mode: String,
    /// Slippage tolerance in basis points
    pub slippage_bps: u16,
    /// Price impact as a decimal string
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price_impact_pct: Option<String>,
    /// Route legs
    #[serde(default)]
    pub route_plan: Vec<Value>,
    /// Slot the quote was computed at
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context_slot: Option<u64>,
    /// Seconds the aggregator spent routing
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_taken: Option<f64>,
    /// Fields not modelled above, preserved for the swap request
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Interface to a swap aggregator
#[async_trait]
pub trait SwapAggregator: Debug + Send + Sync {
    /// Quote swapping `amount` of `input` into `output`
    ///
    /// Fails with [`Error::QuoteUnavailable`] carrying the service's response.
    async fn get_quote(
        &self,
        input: &AssetId,
        output: &AssetId,
        amount: Amount,
        slippage_bps: u16,
    ) -> Result<SwapQuote, Error>;

    /// Build the unsigned swap transaction paid by `payer`
    ///
    /// Fails with [`Error::SwapBuildFailed`] carrying the service's response.
    async fn get_swap_transaction(
        &self,
        quote: &SwapQuote,
        payer: &Address,
    ) -> Result<Vec<u8>, Error>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quote_preserves_unknown_fields() {
        let json = serde_json::json!({
            "inputMint": "So11111111111111111111111111111111111111112",
            "outputMint": "EPjFWdd5AufqSSqeM2qN1xzybapC8G4wEGGkZwyTDt1v",
            "inAmount": "1000000000",
            "outAmount": "500",
            "otherAmountThreshold": "497",
            "swapMode": "ExactIn",
            "slippageBps": 50,
            "platformFee": null,
            "priceImpactPct": "0.0001",
            "routePlan": [{"percent": 100}],
            "contextSlot": 299283763,
            "timeTaken": 0.015
        });

        let quote: SwapQuote = serde_json::from_value(json.clone()).unwrap();

        assert_eq!(quote.out_amount, Amount::from(500));
        assert_eq!(quote.in_amount, Amount::from(1_000_000_000));
        assert!(quote.input_mint.is_native());
        assert_eq!(quote.extra.get("platformFee"), Some(&Value::Null));

        assert_eq!(serde_json::to_value(&quote).unwrap(), json);
    }
}
