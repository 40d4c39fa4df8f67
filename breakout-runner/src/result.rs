//! Run result and its deterministic fingerprints.

use breakout_core::domain::{Bar, OrderSide, Position};
use breakout_core::driver::TransitionRecord;
use breakout_core::DriverState;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::config::RunConfig;
use crate::sim::OrderEvent;
use crate::trace::TraceRow;

/// Current schema version for persisted artifacts.
pub const SCHEMA_VERSION: u32 = 1;

/// Complete result of a single strategy run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunResult {
    #[serde(default = "default_schema_version")]
    pub schema_version: u32,
    pub config: RunConfig,
    pub bar_count: usize,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub dataset_hash: String,
    /// BLAKE3 over the order log; equal inputs give equal fingerprints.
    pub fingerprint: String,
    pub final_state: DriverState,
    pub final_position: Position,
    pub cash: f64,
    pub equity: f64,
    pub realized_pnl: f64,
    pub commission: f64,
    pub round_trips: usize,
    pub state_changes: usize,
    /// Synchronous broker failures the driver reported, in order.
    pub driver_errors: Vec<String>,
    pub transitions: Vec<TransitionRecord>,
    pub trace: Vec<TraceRow>,
    pub orders: Vec<OrderEvent>,
}

fn default_schema_version() -> u32 {
    SCHEMA_VERSION
}

impl RunResult {
    pub fn symbol(&self) -> &str {
        &self.config.symbol
    }
}

/// Hash every order status change in sequence.
pub fn compute_fingerprint(orders: &[OrderEvent]) -> String {
    let mut hasher = blake3::Hasher::new();
    for e in orders {
        hasher.update(&(e.bar as u64).to_le_bytes());
        hasher.update(&e.id.0.to_le_bytes());
        hasher.update(&[match e.side {
            OrderSide::Buy => b'B',
            OrderSide::Sell => b'S',
        }]);
        hasher.update(e.order_type.as_bytes());
        hasher.update(&e.price.unwrap_or(f64::NAN).to_le_bytes());
        hasher.update(&e.size.to_le_bytes());
        hasher.update(e.status.to_string().as_bytes());
        hasher.update(&e.fill_price.unwrap_or(f64::NAN).to_le_bytes());
        hasher.update(&e.commission.to_le_bytes());
    }
    hasher.finalize().to_hex().to_string()
}

/// Hash the input bars in order.
pub fn compute_dataset_hash(symbol: &str, bars: &[Bar]) -> String {
    let mut hasher = blake3::Hasher::new();
    hasher.update(symbol.as_bytes());
    for bar in bars {
        hasher.update(bar.date.to_string().as_bytes());
        hasher.update(&bar.open.to_le_bytes());
        hasher.update(&bar.high.to_le_bytes());
        hasher.update(&bar.low.to_le_bytes());
        hasher.update(&bar.close.to_le_bytes());
        hasher.update(&bar.volume.to_le_bytes());
    }
    hasher.finalize().to_hex().to_string()
}
