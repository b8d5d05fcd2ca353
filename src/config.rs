// 7.0 config.rs: all settings in one place. pool limits, fee shares, env presets.
// fractions are Decimal so config files stay human readable. they are converted to
// fixed point once, when the engine is built.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::engine::EngineConfig;
use crate::fees::FeeShares;
use crate::fixed::Fixed;
use crate::pool::PoolParams;
use crate::types::{AccountId, Amount};

/// One whole token with 18 decimals. presets are expressed in it.
pub const TOKEN: Amount = 1_000_000_000_000_000_000;

// Liquidity pool settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PoolConfig {
    // Smallest accepted deposit, raw token units
    pub min_deposit: Amount,
    // A node can only be withdrawn from this long after creation or transfer
    pub withdraw_timeout_ms: i64,
    // Share of free liquidity a single condition may lock (0.5 = 50%)
    pub reinforcement_ability: Decimal,
    // Leaf slots allocated up front. the tree doubles when full
    pub initial_capacity: usize,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            min_deposit: TOKEN,
            withdraw_timeout_ms: 0,
            reinforcement_ability: dec!(0.5),
            initial_capacity: 64,
        }
    }
}

impl PoolConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.min_deposit == 0 {
            return Err(ConfigError::InvalidPool {
                reason: "Minimum deposit must be positive".to_string(),
            });
        }
        if self.withdraw_timeout_ms < 0 {
            return Err(ConfigError::InvalidPool {
                reason: "Withdraw timeout cannot be negative".to_string(),
            });
        }
        if self.reinforcement_ability <= Decimal::ZERO || self.reinforcement_ability > Decimal::ONE {
            return Err(ConfigError::InvalidPool {
                reason: "Reinforcement ability must be in (0, 1]".to_string(),
            });
        }
        Ok(())
    }

    pub fn params(&self) -> Result<PoolParams, ConfigError> {
        self.validate()?;
        Ok(PoolParams {
            min_deposit: self.min_deposit,
            withdraw_timeout_ms: self.withdraw_timeout_ms,
            reinforcement_ability: to_fixed(self.reinforcement_ability)?,
            initial_capacity: self.initial_capacity,
        })
    }
}

/** 7.1: profit split. house, data provider and affiliates each take a fraction of
condition profit, the rest stays with liquidity providers */
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeeConfig {
    // House share of condition profit (e.g. 0.05 = 5%)
    pub house_fee: Decimal,
    // Share credited to the oracle that created the condition
    pub data_provider_fee: Decimal,
    // Share split between affiliates that referred bets
    pub affiliate_fee: Decimal,
    // Account the house share is credited to
    pub house_account: AccountId,
    // Affiliate used when a bet names none
    pub default_affiliate: AccountId,
}

impl Default for FeeConfig {
    fn default() -> Self {
        Self {
            house_fee: dec!(0.05),
            data_provider_fee: dec!(0.05),
            affiliate_fee: dec!(0.1),
            house_account: AccountId(1),
            default_affiliate: AccountId(1),
        }
    }
}

impl FeeConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        let fees = [self.house_fee, self.data_provider_fee, self.affiliate_fee];
        if fees.iter().any(|f| f.is_sign_negative() && !f.is_zero()) {
            return Err(ConfigError::InvalidFees {
                reason: "Fee shares cannot be negative".to_string(),
            });
        }
        if fees.iter().sum::<Decimal>() > Decimal::ONE {
            return Err(ConfigError::InvalidFees {
                reason: "Fee shares sum above 1".to_string(),
            });
        }
        Ok(())
    }

    pub fn shares(&self) -> Result<FeeShares, ConfigError> {
        self.validate()?;
        Ok(FeeShares {
            house: to_fixed(self.house_fee)?,
            data_provider: to_fixed(self.data_provider_fee)?,
            affiliate: to_fixed(self.affiliate_fee)?,
        })
    }
}

fn to_fixed(value: Decimal) -> Result<Fixed, ConfigError> {
    Fixed::from_decimal(value).map_err(|e| ConfigError::InvalidValue {
        value,
        reason: e.to_string(),
    })
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid pool config: {reason}")]
    InvalidPool { reason: String },

    #[error("Invalid fee config: {reason}")]
    InvalidFees { reason: String },

    #[error("Invalid engine config: {reason}")]
    InvalidEngine { reason: String },

    #[error("Value {value} not representable: {reason}")]
    InvalidValue { value: Decimal, reason: String },
}

// Environment presets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Environment {
    Development,
    Testnet,
    Mainnet,
}

impl Environment {
    pub fn config(&self) -> EngineConfig {
        match self {
            Environment::Development => EngineConfig::default(),
            Environment::Testnet => EngineConfig::testnet(),
            Environment::Mainnet => EngineConfig::mainnet_conservative(),
        }
    }
}
