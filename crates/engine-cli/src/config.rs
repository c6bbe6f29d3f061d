use anyhow::{Context, Result};
use portfolio_manager::{Deadband, DEFAULT_MAX_SECTOR_PERCENT};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::PathBuf;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    // Bar files live at <data_dir>/<SYMBOL>.csv
    pub data_dir: PathBuf,
    pub bar_cache_ttl_secs: i64,           // 300

    // Rebalancing
    pub max_sector_percent: f64,           // 25%
    pub min_trade_value: f64,              // $100
    pub min_trade_percent: f64,            // 1%
}

impl EngineConfig {
    pub fn from_env() -> Result<Self> {
        let config = Self {
            data_dir: env::var("ENGINE_DATA_DIR")
                .unwrap_or_else(|_| "data".to_string())
                .into(),
            bar_cache_ttl_secs: env::var("BAR_CACHE_TTL_SECS")
                .unwrap_or_else(|_| "300".to_string())
                .parse()
                .context("BAR_CACHE_TTL_SECS must be an integer")?,

            max_sector_percent: env::var("REBALANCE_MAX_SECTOR_PERCENT")
                .unwrap_or_else(|_| DEFAULT_MAX_SECTOR_PERCENT.to_string())
                .parse()
                .context("REBALANCE_MAX_SECTOR_PERCENT must be a number")?,
            min_trade_value: env::var("REBALANCE_MIN_TRADE_VALUE")
                .unwrap_or_else(|_| "100.0".to_string())
                .parse()
                .context("REBALANCE_MIN_TRADE_VALUE must be a number")?,
            min_trade_percent: env::var("REBALANCE_MIN_TRADE_PERCENT")
                .unwrap_or_else(|_| "1.0".to_string())
                .parse()
                .context("REBALANCE_MIN_TRADE_PERCENT must be a number")?,
        };

        Ok(config)
    }

    pub fn deadband(&self) -> Deadband {
        Deadband {
            min_trade_value: self.min_trade_value,
            min_trade_percent: self.min_trade_percent,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_library() {
        // Only asserts on values that no test sets through the environment
        let config = EngineConfig::from_env().unwrap();
        assert!(config.bar_cache_ttl_secs > 0);
        assert_eq!(
            EngineConfig {
                min_trade_value: 100.0,
                min_trade_percent: 1.0,
                ..config
            }
            .deadband(),
            Deadband::default()
        );
    }
}
