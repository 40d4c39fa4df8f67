//! Breakout entry gating by TD-sequential count.

use super::intent::Signal;
use serde::{Deserialize, Serialize};

/// Filters a breakout signal against the current TD count.
///
/// - `max_entry_td < 0`: no filtering, the breakout passes as is.
/// - `max_entry_td == 0`: the TD count must carry the breakout's sign.
/// - `max_entry_td > 0`: longs need `0 < td <= max`, shorts need `-max <= td < 0`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EntryFilter {
    pub max_entry_td: i32,
}

impl Default for EntryFilter {
    fn default() -> Self {
        Self { max_entry_td: -1 }
    }
}

impl EntryFilter {
    pub fn new(max_entry_td: i32) -> Self {
        Self { max_entry_td }
    }

    /// Combine a raw breakout value and TD count into an entry signal.
    /// Missing (NaN) inputs yield `Flat`.
    pub fn apply(&self, breakout: f64, td_count: f64) -> Signal {
        if breakout.is_nan() || td_count.is_nan() {
            return Signal::Flat;
        }
        let signal = Signal::from_value(breakout);
        let max = f64::from(self.max_entry_td);

        if self.max_entry_td < 0 {
            return signal;
        }

        let passes = match signal {
            Signal::Long if self.max_entry_td == 0 => td_count > 0.0,
            Signal::Short if self.max_entry_td == 0 => td_count < 0.0,
            Signal::Long => td_count > 0.0 && td_count <= max,
            Signal::Short => td_count < 0.0 && td_count >= -max,
            Signal::Flat => false,
        };

        if passes {
            signal
        } else {
            Signal::Flat
        }
    }
}
