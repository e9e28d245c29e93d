//! Ledger access

use std::time::Duration;

use serde::{Deserialize, Serialize};

#[cfg(feature = "http")]
pub mod rpc_client;

#[cfg(feature = "http")]
pub use rpc_client::RpcClient;

/// Default JSON-RPC endpoint
pub const DEFAULT_RPC_URL: &str = "https://api.mainnet-beta.solana.com";

/// How settled a transaction must be before it counts as confirmed
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Commitment {
    /// Seen by the connected node
    Processed,
    /// Voted on by a supermajority
    #[default]
    Confirmed,
    /// Rooted
    Finalized,
}

impl Commitment {
    /// Name used on the wire
    pub fn as_str(&self) -> &'static str {
        match self {
            Commitment::Processed => "processed",
            Commitment::Confirmed => "confirmed",
            Commitment::Finalized => "finalized",
        }
    }
}

impl std::str::FromStr for Commitment {
    type Err = crate::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "processed" => Ok(Commitment::Processed),
            "confirmed" => Ok(Commitment::Confirmed),
            "finalized" => Ok(Commitment::Finalized),
            other => Err(crate::Error::Custom(format!("Unknown commitment {other}"))),
        }
    }
}

/// JSON-RPC ledger settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RpcConfig {
    /// Node url
    pub url: String,
    /// Commitment required for confirmation and preflight
    pub commitment: Commitment,
    /// Milliseconds between signature status polls
    pub confirm_poll_interval_ms: u64,
    /// Signature status polls before giving up
    pub confirm_max_attempts: u32,
}

impl Default for RpcConfig {
    fn default() -> Self {
        Self {
            url: DEFAULT_RPC_URL.to_string(),
            commitment: Commitment::Confirmed,
            confirm_poll_interval_ms: 500,
            confirm_max_attempts: 60,
        }
    }
}

impl RpcConfig {
    /// Delay between signature status polls
    pub fn confirm_poll_interval(&self) -> Duration {
        Duration::from_millis(self.confirm_poll_interval_ms)
    }
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use super::*;

    #[test]
    fn test_commitment_order() {
        assert!(Commitment::Processed < Commitment::Confirmed);
        assert!(Commitment::Confirmed < Commitment::Finalized);
        assert_eq!(
            Commitment::from_str("Finalized").unwrap(),
            Commitment::Finalized
        );
        assert!(Commitment::from_str("max").is_err());
    }

    #[test]
    fn test_rpc_config_partial_toml_like_json() {
        let config: RpcConfig =
            serde_json::from_str(r#"{"url":"http://localhost:8899","commitment":"finalized"}"#)
                .unwrap();
        assert_eq!(config.url, "http://localhost:8899");
        assert_eq!(config.commitment, Commitment::Finalized);
        assert_eq!(config.confirm_max_attempts, 60);
    }
}
