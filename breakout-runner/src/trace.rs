//! Per-bar driver observations: state and the prices it was steering by.

use breakout_core::domain::Bar;
use breakout_core::{DriverState, Signals};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Driver snapshot taken after the bar's tick was handled.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TraceRow {
    pub bar: usize,
    pub date: NaiveDate,
    pub state: DriverState,
    pub state_index: usize,
    /// Tick entry price, only while an entry signal is active.
    pub entry_price: Option<f64>,
    /// Tick protect price; `None` while the stop line is undefined.
    pub protect_price: Option<f64>,
    pub position: f64,
}

#[derive(Debug, Clone, Default)]
pub struct TraceRecorder {
    rows: Vec<TraceRow>,
}

impl TraceRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(
        &mut self,
        bar_index: usize,
        bar: &Bar,
        state: DriverState,
        signals: &Signals,
        position: f64,
    ) {
        let entry_price = if signals.entry.is_active() {
            signals.entry_price.filter(|p| p.is_finite())
        } else {
            None
        };
        let protect_price = Some(signals.protect_price).filter(|p| p.is_finite());
        self.rows.push(TraceRow {
            bar: bar_index,
            date: bar.date,
            state,
            state_index: state.index(),
            entry_price,
            protect_price,
            position,
        });
    }

    pub fn rows(&self) -> &[TraceRow] {
        &self.rows
    }

    pub fn into_rows(self) -> Vec<TraceRow> {
        self.rows
    }

    /// Number of bars on which the state differs from the previous bar.
    pub fn state_changes(&self) -> usize {
        self.rows
            .windows(2)
            .filter(|w| w[0].state != w[1].state)
            .count()
    }
}
