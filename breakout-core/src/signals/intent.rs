//! Signal intent: the per-tick inputs the driver reacts to.

use crate::domain::OrderSide;
use serde::{Deserialize, Serialize};

/// Directional intent derived from a raw signal value.
///
/// Indicator lines report signals as numbers where the sign carries the
/// direction and zero means "nothing to do".
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Signal {
    Long,
    Short,
    #[default]
    Flat,
}

impl Signal {
    /// Map a raw signal value by sign. NaN (indicator not warmed up) is Flat.
    pub fn from_value(value: f64) -> Self {
        if value > 0.0 {
            Signal::Long
        } else if value < 0.0 {
            Signal::Short
        } else {
            Signal::Flat
        }
    }

    pub fn is_active(&self) -> bool {
        !matches!(self, Signal::Flat)
    }

    /// Order side that opens exposure in this direction.
    pub fn entry_side(&self) -> Option<OrderSide> {
        match self {
            Signal::Long => Some(OrderSide::Buy),
            Signal::Short => Some(OrderSide::Sell),
            Signal::Flat => None,
        }
    }
}

/// The tuple a signal source delivers once per tick.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Signals {
    pub entry: Signal,
    /// Desired protective stop price. NaN while the stop line is undefined.
    pub protect_price: f64,
    pub close: Signal,
    /// Optional limit price for limit-style entries.
    pub entry_price: Option<f64>,
}

impl Signals {
    pub fn new(entry: Signal, protect_price: f64, close: Signal) -> Self {
        Self {
            entry,
            protect_price,
            close,
            entry_price: None,
        }
    }

    /// Build from raw indicator values.
    pub fn from_values(entry: f64, protect_price: f64, close: f64) -> Self {
        Self::new(Signal::from_value(entry), protect_price, Signal::from_value(close))
    }

    /// No entry, no close, undefined stop.
    pub fn idle() -> Self {
        Self::new(Signal::Flat, f64::NAN, Signal::Flat)
    }

    pub fn with_entry_price(mut self, price: f64) -> Self {
        self.entry_price = Some(price);
        self
    }
}

impl Default for Signals {
    fn default() -> Self {
        Self::idle()
    }
}
