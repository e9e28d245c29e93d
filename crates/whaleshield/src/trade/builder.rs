//! Trade engine builder

use std::sync::Arc;

use whaleshield_common::{LedgerConnector, ShieldedPool};

use super::{StrandedFundsRegistry, TradeConfig, TradeEngine};
use crate::aggregator::SwapAggregator;
#[cfg(feature = "http")]
use crate::aggregator::AggregatorConfig;
#[cfg(feature = "http")]
use crate::ledger::RpcConfig;
use crate::Error;

/// Builder for creating a new [`TradeEngine`]
///
/// The shielded pool is required. Without the `http` feature the ledger and
/// aggregator are required too; with it they default to the JSON-RPC and
/// HTTP clients built from [`RpcConfig`] and [`AggregatorConfig`].
#[derive(Debug, Default)]
pub struct TradeEngineBuilder {
    pool: Option<Arc<dyn ShieldedPool>>,
    ledger: Option<Arc<dyn LedgerConnector>>,
    aggregator: Option<Arc<dyn SwapAggregator>>,
    config: TradeConfig,
    #[cfg(feature = "http")]
    rpc_config: RpcConfig,
    #[cfg(feature = "http")]
    aggregator_config: AggregatorConfig,
}

impl TradeEngineBuilder {
    /// Create a new TradeEngineBuilder
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the shielded pool
    pub fn pool<P: ShieldedPool + 'static>(mut self, pool: P) -> Self {
        self.pool = Some(Arc::new(pool));
        self
    }

    /// Set a shared shielded pool
    pub fn shared_pool(mut self, pool: Arc<dyn ShieldedPool>) -> Self {
        self.pool = Some(pool);
        self
    }

    /// Set the ledger connector
    pub fn ledger<L: LedgerConnector + 'static>(mut self, ledger: L) -> Self {
        self.ledger = Some(Arc::new(ledger));
        self
    }

    /// Set a shared ledger connector
    pub fn shared_ledger(mut self, ledger: Arc<dyn LedgerConnector>) -> Self {
        self.ledger = Some(ledger);
        self
    }

    /// Set the swap aggregator
    pub fn aggregator<A: SwapAggregator + 'static>(mut self, aggregator: A) -> Self {
        self.aggregator = Some(Arc::new(aggregator));
        self
    }

    /// Set a shared swap aggregator
    pub fn shared_aggregator(mut self, aggregator: Arc<dyn SwapAggregator>) -> Self {
        self.aggregator = Some(aggregator);
        self
    }

    /// Set trade settings
    pub fn config(mut self, config: TradeConfig) -> Self {
        self.config = config;
        self
    }

    /// Settings for the default JSON-RPC ledger client
    #[cfg(feature = "http")]
    pub fn rpc_config(mut self, rpc_config: RpcConfig) -> Self {
        self.rpc_config = rpc_config;
        self
    }

    /// Settings for the default HTTP aggregator client
    #[cfg(feature = "http")]
    pub fn aggregator_config(mut self, aggregator_config: AggregatorConfig) -> Self {
        self.aggregator_config = aggregator_config;
        self
    }

    /// Build the engine
    pub fn build(self) -> Result<TradeEngine, Error> {
        let pool = self
            .pool
            .ok_or(Error::Custom("Shielded pool required".to_string()))?;

        let ledger = match self.ledger {
            Some(ledger) => ledger,
            #[cfg(feature = "http")]
            None => Arc::new(crate::ledger::RpcClient::new(self.rpc_config)?),
            #[cfg(not(feature = "http"))]
            None => return Err(Error::Custom("Ledger connector required".to_string())),
        };

        let aggregator = match self.aggregator {
            Some(aggregator) => aggregator,
            #[cfg(feature = "http")]
            None => Arc::new(crate::aggregator::HttpAggregatorClient::new(
                self.aggregator_config,
            )?),
            #[cfg(not(feature = "http"))]
            None => return Err(Error::Custom("Swap aggregator required".to_string())),
        };

        if self.config.max_poll_attempts == 0 {
            return Err(Error::Custom(
                "Funds-arrival poll attempts must be positive".to_string(),
            ));
        }

        Ok(TradeEngine {
            pool,
            ledger,
            aggregator,
            config: self.config,
            stranded: StrandedFundsRegistry::new(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{MockAggregator, MockLedger, MockPool};

    #[test]
    fn test_pool_required() {
        let result = TradeEngineBuilder::new()
            .ledger(MockLedger::new())
            .aggregator(MockAggregator::new())
            .build();

        match result {
            Err(Error::Custom(msg)) => assert_eq!(msg, "Shielded pool required"),
            other => panic!("unexpected result {other:?}"),
        }
    }

    #[cfg(feature = "http")]
    #[test]
    fn test_invalid_rpc_url_rejected() {
        let result = TradeEngineBuilder::new()
            .pool(MockPool::new())
            .aggregator(MockAggregator::new())
            .rpc_config(RpcConfig {
                url: "not a url".to_string(),
                ..Default::default()
            })
            .build();

        assert!(matches!(result, Err(Error::Url(_))));
    }

    #[cfg(feature = "http")]
    #[test]
    fn test_http_defaults() {
        let engine = TradeEngineBuilder::new()
            .pool(MockPool::new())
            .build()
            .unwrap();

        assert_eq!(engine.config(), &TradeConfig::default());
    }
}
