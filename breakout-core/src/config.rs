//! Driver configuration.

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("entry_size must be positive and finite, got {0}")]
    InvalidEntrySize(f64),

    #[error("price_tolerance must be non-negative and finite, got {0}")]
    InvalidPriceTolerance(f64),
}

/// How entry orders are placed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntryStyle {
    /// Market order at the next available price.
    #[default]
    Market,
    /// Limit order at the tick's `entry_price`; falls back to market when the
    /// tick carries no finite entry price.
    Limit,
}

/// Tunables for one order driver.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DriverConfig {
    /// Units bought or sold by an entry order.
    pub entry_size: f64,
    pub entry_style: EntryStyle,
    /// Protect-price moves at or below this distance do not re-price the stop.
    pub price_tolerance: f64,
}

impl Default for DriverConfig {
    fn default() -> Self {
        Self {
            entry_size: 1.0,
            entry_style: EntryStyle::Market,
            price_tolerance: 0.0,
        }
    }
}

impl DriverConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.entry_size.is_finite() && self.entry_size > 0.0) {
            return Err(ConfigError::InvalidEntrySize(self.entry_size));
        }
        if !(self.price_tolerance.is_finite() && self.price_tolerance >= 0.0) {
            return Err(ConfigError::InvalidPriceTolerance(self.price_tolerance));
        }
        Ok(())
    }
}
