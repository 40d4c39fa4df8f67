//! Signal source contract.

use super::intent::Signals;
use crate::domain::Bar;

/// Supplies one signal tuple per tick.
///
/// Implementations must only look at data available at `bar_index` (no
/// look-ahead) and must be deterministic so backtests reproduce.
pub trait SignalSource {
    fn next(&mut self, bar_index: usize, bar: &Bar) -> Signals;
}

/// Replays a precomputed signal series. Ticks past the end are idle.
#[derive(Debug, Clone, Default)]
pub struct ScriptedSignals {
    signals: Vec<Signals>,
}

impl ScriptedSignals {
    pub fn new(signals: Vec<Signals>) -> Self {
        Self { signals }
    }

    pub fn len(&self) -> usize {
        self.signals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.signals.is_empty()
    }
}

impl SignalSource for ScriptedSignals {
    fn next(&mut self, bar_index: usize, _bar: &Bar) -> Signals {
        self.signals.get(bar_index).copied().unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::signals::Signal;
    use chrono::NaiveDate;

    fn bar() -> Bar {
        Bar {
            date: NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
            open: 10.0,
            high: 11.0,
            low: 9.0,
            close: 10.5,
            volume: 1,
        }
    }

    #[test]
    fn scripted_replays_then_idles() {
        let mut src = ScriptedSignals::new(vec![Signals::new(Signal::Long, 9.0, Signal::Flat)]);
        assert_eq!(src.next(0, &bar()).entry, Signal::Long);
        let past_end = src.next(1, &bar());
        assert_eq!(past_end.entry, Signal::Flat);
        assert!(past_end.protect_price.is_nan());
    }
}
