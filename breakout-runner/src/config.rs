//! Run configuration loaded from TOML.
//!
//! ```toml
//! symbol = "SPY"
//!
//! [driver]
//! entry_size = 100.0
//! entry_style = "market"
//! price_tolerance = 0.0
//!
//! [broker]
//! cash = 100000.0
//! commission_per_unit = 0.005
//!
//! [entry_filter]
//! max_entry_td = 4
//! ```

use std::path::Path;

use anyhow::{Context, Result};
use breakout_core::signals::EntryFilter;
use breakout_core::{ConfigError, DriverConfig};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::sim::{SimBrokerConfig, SimBrokerConfigError};

#[derive(Debug, Error, PartialEq)]
pub enum RunConfigError {
    #[error("driver config: {0}")]
    Driver(#[from] ConfigError),

    #[error("broker config: {0}")]
    Broker(#[from] SimBrokerConfigError),

    #[error("symbol must not be empty")]
    EmptySymbol,
}

/// Everything needed to reproduce one strategy run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunConfig {
    pub symbol: String,
    #[serde(default)]
    pub driver: DriverConfig,
    #[serde(default)]
    pub broker: SimBrokerConfig,
    /// Breakout gating applied by [`run_rows`](crate::run_rows).
    #[serde(default)]
    pub entry_filter: EntryFilter,
}

impl RunConfig {
    pub fn new(symbol: impl Into<String>) -> Self {
        Self {
            symbol: symbol.into(),
            driver: DriverConfig::default(),
            broker: SimBrokerConfig::default(),
            entry_filter: EntryFilter::default(),
        }
    }

    pub fn validate(&self) -> Result<(), RunConfigError> {
        if self.symbol.trim().is_empty() {
            return Err(RunConfigError::EmptySymbol);
        }
        self.driver.validate()?;
        self.broker.validate()?;
        Ok(())
    }

    /// Parse and validate a config from TOML text.
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: RunConfig = toml::from_str(content).context("failed to parse run config TOML")?;
        config.validate().context("invalid run config")?;
        Ok(config)
    }

    /// Load and validate a config file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read run config: {}", path.display()))?;
        Self::from_toml_str(&content)
            .with_context(|| format!("failed to load run config: {}", path.display()))
    }

    pub fn to_toml_string(&self) -> Result<String> {
        toml::to_string_pretty(self).context("failed to serialize run config to TOML")
    }
}
