use std::path::PathBuf;

use config::{Config, ConfigError, File};
use serde::{Deserialize, Serialize};
use whaleshield::{AggregatorConfig, RpcConfig, TradeConfig};

const DEFAULT_WORK_DIR: &str = ".whaleshield";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub rpc: RpcConfig,
    pub aggregator: AggregatorConfig,
    pub trade: TradeConfig,
}

impl Settings {
    /// Load settings from `config_file_name`, or `~/.whaleshield/config.toml`
    ///
    /// Falls back to defaults when the file cannot be read.
    #[must_use]
    pub fn new(config_file_name: Option<PathBuf>) -> Self {
        let default_settings = Self::default();
        // attempt to construct settings with file
        let from_file = Self::new_from_default(&default_settings, config_file_name);
        match from_file {
            Ok(f) => f,
            Err(e) => {
                tracing::error!(
                    "Error reading config file, falling back to defaults. Error: {e:?}"
                );
                default_settings
            }
        }
    }

    fn new_from_default(
        default: &Settings,
        config_file_name: Option<PathBuf>,
    ) -> Result<Self, ConfigError> {
        // An explicit path must exist, the default one may not
        let (path, required) = match config_file_name {
            Some(path) => (path, true),
            None => {
                let path = home::home_dir()
                    .ok_or(ConfigError::NotFound("Config Path".to_string()))?
                    .join(DEFAULT_WORK_DIR)
                    .join("config.toml");
                (path, false)
            }
        };

        let config: Config = Config::builder()
            // use defaults
            .add_source(Config::try_from(default)?)
            // override with file contents
            .add_source(File::from(path).required(required))
            .build()?;

        config.try_deserialize()
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use whaleshield::Commitment;

    use super::*;

    #[test]
    fn test_file_overrides_defaults() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(
            file,
            r#"
[rpc]
url = "http://localhost:8899"
commitment = "finalized"

[trade]
slippage_bps = 100
"#
        )
        .unwrap();

        let settings = Settings::new(Some(file.path().to_path_buf()));

        assert_eq!(settings.rpc.url, "http://localhost:8899");
        assert_eq!(settings.rpc.commitment, Commitment::Finalized);
        assert_eq!(settings.trade.slippage_bps, 100);
        assert_eq!(settings.trade.max_poll_attempts, 30);
        assert_eq!(settings.aggregator, AggregatorConfig::default());
    }

    #[test]
    fn test_missing_explicit_file_falls_back() {
        let settings = Settings::new(Some(PathBuf::from("/nonexistent/whaleshield.toml")));
        assert_eq!(settings, Settings::default());
    }
}
