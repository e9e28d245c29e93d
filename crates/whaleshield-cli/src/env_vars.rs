//! Environment variable overrides

use std::env;

use whaleshield::{AggregatorConfig, Commitment, RpcConfig, TradeConfig};

use crate::config::Settings;

// RPC
pub const ENV_RPC_URL: &str = "WHALESHIELD_RPC_URL";
pub const ENV_RPC_COMMITMENT: &str = "WHALESHIELD_RPC_COMMITMENT";
// Aggregator
pub const ENV_AGGREGATOR_URL: &str = "WHALESHIELD_AGGREGATOR_URL";
pub const ENV_AGGREGATOR_WRAP_AND_UNWRAP_SOL: &str = "WHALESHIELD_AGGREGATOR_WRAP_AND_UNWRAP_SOL";
// Trade
pub const ENV_SLIPPAGE_BPS: &str = "WHALESHIELD_SLIPPAGE_BPS";
pub const ENV_FEE_RESERVE: &str = "WHALESHIELD_FEE_RESERVE";
pub const ENV_POLL_INTERVAL_SECS: &str = "WHALESHIELD_POLL_INTERVAL_SECS";
pub const ENV_MAX_POLL_ATTEMPTS: &str = "WHALESHIELD_MAX_POLL_ATTEMPTS";

impl Settings {
    pub fn from_env(mut self) -> Self {
        self.rpc = from_env_rpc(self.rpc);
        self.aggregator = from_env_aggregator(self.aggregator);
        self.trade = from_env_trade(self.trade);
        self
    }
}

fn from_env_rpc(mut rpc: RpcConfig) -> RpcConfig {
    if let Ok(url) = env::var(ENV_RPC_URL) {
        rpc.url = url;
    }

    if let Ok(commitment_str) = env::var(ENV_RPC_COMMITMENT) {
        if let Ok(commitment) = commitment_str.parse::<Commitment>() {
            rpc.commitment = commitment;
        }
    }

    rpc
}

fn from_env_aggregator(mut aggregator: AggregatorConfig) -> AggregatorConfig {
    if let Ok(url) = env::var(ENV_AGGREGATOR_URL) {
        aggregator.url = url;
    }

    if let Ok(wrap_str) = env::var(ENV_AGGREGATOR_WRAP_AND_UNWRAP_SOL) {
        if let Ok(wrap) = wrap_str.parse() {
            aggregator.wrap_and_unwrap_sol = wrap;
        }
    }

    aggregator
}

fn from_env_trade(mut trade: TradeConfig) -> TradeConfig {
    if let Ok(slippage_str) = env::var(ENV_SLIPPAGE_BPS) {
        if let Ok(slippage) = slippage_str.parse() {
            trade.slippage_bps = slippage;
        }
    }

    if let Ok(reserve_str) = env::var(ENV_FEE_RESERVE) {
        if let Ok(reserve) = reserve_str.parse::<u64>() {
            trade.fee_reserve = reserve.into();
        }
    }

    if let Ok(interval_str) = env::var(ENV_POLL_INTERVAL_SECS) {
        if let Ok(interval) = interval_str.parse() {
            trade.poll_interval_secs = interval;
        }
    }

    if let Ok(attempts_str) = env::var(ENV_MAX_POLL_ATTEMPTS) {
        if let Ok(attempts) = attempts_str.parse() {
            trade.max_poll_attempts = attempts;
        }
    }

    trade
}
