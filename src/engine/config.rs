//! Engine configuration options.

use crate::config::{ConfigError, FeeConfig, PoolConfig, TOKEN};
use crate::types::AccountId;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

/// Engine configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Maximum number of events to retain in memory.
    pub max_events: usize,
    /// Holds every role in the default role registry.
    pub owner: AccountId,
    pub pool: PoolConfig,
    pub fees: FeeConfig,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_events: 100_000,
            owner: AccountId(1),
            pool: PoolConfig::default(),
            fees: FeeConfig::default(),
        }
    }
}

impl EngineConfig {
    // Short timeouts, no house fee
    pub fn testnet() -> Self {
        let mut config = Self::default();
        config.pool.withdraw_timeout_ms = 60_000; // 1 minute
        config.pool.reinforcement_ability = dec!(0.8);
        config.fees.house_fee = dec!(0);
        config
    }

    // Conservative limits for real funds
    pub fn mainnet_conservative() -> Self {
        let mut config = Self::default();
        config.pool.min_deposit = 100 * TOKEN;
        config.pool.withdraw_timeout_ms = 7 * 24 * 60 * 60 * 1000; // 1 week
        config.pool.reinforcement_ability = dec!(0.3);
        config.pool.initial_capacity = 1024;
        config
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_events == 0 {
            return Err(ConfigError::InvalidEngine {
                reason: "Event log must hold at least one event".to_string(),
            });
        }
        self.pool.validate()?;
        self.fees.validate()
    }
}
