//! Fake swap aggregator

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Map;
use whaleshield::aggregator::{SwapAggregator, SwapQuote};
use whaleshield::Error;
use whaleshield_common::transaction::LegacyMessage;
use whaleshield_common::{Address, Amount, AssetId};

use crate::{FakeLedger, SwapEffect};

/// Program id the fake aggregator's swap transactions call
pub const AGGREGATOR_PROGRAM: Address = Address::new([0x6a; 32]);

/// Aggregator quoting a fixed rate and settling swaps on a [`FakeLedger`]
#[derive(Debug, Clone)]
pub struct FakeAggregator {
    ledger: FakeLedger,
    numerator: u64,
    denominator: u64,
    fail_quotes: Arc<AtomicBool>,
    nonce: Arc<AtomicU64>,
}

impl FakeAggregator {
    /// Create new [`FakeAggregator`] swapping one to one
    pub fn new(ledger: FakeLedger) -> Self {
        Self {
            ledger,
            numerator: 1,
            denominator: 1,
            fail_quotes: Arc::new(AtomicBool::new(false)),
            nonce: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Quote `numerator / denominator` output units per input unit
    pub fn with_rate(mut self, numerator: u64, denominator: u64) -> Self {
        self.numerator = numerator;
        self.denominator = denominator.max(1);
        self
    }

    /// Make every quote fail until switched back
    pub fn set_fail_quotes(&self, fail: bool) {
        self.fail_quotes.store(fail, Ordering::SeqCst);
    }

    fn convert(&self, amount: Amount) -> Result<Amount, Error> {
        let out = u128::from(amount.to_u64()) * u128::from(self.numerator)
            / u128::from(self.denominator);
        u64::try_from(out)
            .map(Amount::from)
            .map_err(|_| Error::QuoteUnavailable("output amount overflows".to_string()))
    }
}

#[async_trait]
impl SwapAggregator for FakeAggregator {
    async fn get_quote(
        &self,
        input: &AssetId,
        output: &AssetId,
        amount: Amount,
        slippage_bps: u16,
    ) -> Result<SwapQuote, Error> {
        if self.fail_quotes.load(Ordering::SeqCst) {
            return Err(Error::QuoteUnavailable(
                r#"{"error":"No routes found","errorCode":"COULD_NOT_FIND_ANY_ROUTE"}"#
                    .to_string(),
            ));
        }

        let out_amount = self.convert(amount)?;
        let threshold =
            u128::from(out_amount.to_u64()) * u128::from(10_000 - slippage_bps.min(10_000)) / 10_000;

        Ok(SwapQuote {
            input_mint: input.clone(),
            output_mint: output.clone(),
            in_amount: amount,
            out_amount,
            other_amount_threshold: Amount::from(u64::try_from(threshold).unwrap_or_default()),
            swap_mode: "ExactIn".to_string(),
            slippage_bps,
            price_impact_pct: Some("0".to_string()),
            route_plan: Vec::new(),
            context_slot: None,
            time_taken: None,
            extra: Map::new(),
        })
    }

    async fn get_swap_transaction(
        &self,
        quote: &SwapQuote,
        payer: &Address,
    ) -> Result<Vec<u8>, Error> {
        let nonce = self.nonce.fetch_add(1, Ordering::SeqCst);

        let mut data = quote.in_amount.to_u64().to_le_bytes().to_vec();
        data.extend_from_slice(&nonce.to_le_bytes());

        let transaction =
            LegacyMessage::new_with_payer(*payer, AGGREGATOR_PROGRAM, data, [0u8; 32])
                .into_transaction()?;

        self.ledger
            .register_swap(
                transaction.message_bytes().to_vec(),
                SwapEffect {
                    owner: *payer,
                    input_asset: quote.input_mint.clone(),
                    input_amount: quote.in_amount,
                    output_asset: quote.output_mint.clone(),
                    output_amount: quote.out_amount,
                },
            )
            .await;

        Ok(transaction.to_bytes())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_rate_and_failure() {
        let aggregator = FakeAggregator::new(FakeLedger::new()).with_rate(1, 2_000_000);

        let quote = aggregator
            .get_quote(
                &AssetId::native(),
                &AssetId::usdc(),
                Amount::from(1_000_000_000),
                50,
            )
            .await
            .unwrap();
        assert_eq!(quote.out_amount, Amount::from(500));
        assert_eq!(quote.other_amount_threshold, Amount::from(497));

        aggregator.set_fail_quotes(true);
        let err = aggregator
            .get_quote(&AssetId::native(), &AssetId::usdc(), Amount::from(1), 50)
            .await
            .unwrap_err();
        assert!(err.to_string().starts_with("Quote unavailable"));
    }
}
