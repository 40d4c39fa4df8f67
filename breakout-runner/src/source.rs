//! Precomputed indicator rows replayed as driver signals.
//!
//! Each row carries the raw breakout value and TD count for one bar; the
//! configured [`EntryFilter`] turns them into the entry signal on replay.

use breakout_core::domain::Bar;
use breakout_core::signals::{EntryFilter, Signal, SignalSource, Signals};
use serde::{Deserialize, Serialize};

/// Indicator values for one bar. Missing values are NaN.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SignalRow {
    pub breakout: f64,
    pub td_count: f64,
    pub protect_price: f64,
    pub close_signal: f64,
    #[serde(default)]
    pub entry_price: Option<f64>,
}

impl SignalRow {
    pub fn new(breakout: f64, td_count: f64, protect_price: f64, close_signal: f64) -> Self {
        Self {
            breakout,
            td_count,
            protect_price,
            close_signal,
            entry_price: None,
        }
    }

    fn to_signals(self, filter: &EntryFilter) -> Signals {
        Signals {
            entry: filter.apply(self.breakout, self.td_count),
            protect_price: self.protect_price,
            close: Signal::from_value(self.close_signal),
            entry_price: self.entry_price,
        }
    }
}

/// Replays [`SignalRow`]s through an entry filter. Bars past the end are idle.
#[derive(Debug, Clone)]
pub struct FilteredSignals {
    rows: Vec<SignalRow>,
    filter: EntryFilter,
}

impl FilteredSignals {
    pub fn new(rows: Vec<SignalRow>, filter: EntryFilter) -> Self {
        Self { rows, filter }
    }

    pub fn filter(&self) -> EntryFilter {
        self.filter
    }
}

impl SignalSource for FilteredSignals {
    fn next(&mut self, bar_index: usize, _bar: &Bar) -> Signals {
        self.rows
            .get(bar_index)
            .map(|row| row.to_signals(&self.filter))
            .unwrap_or_default()
    }
}
