//! Strategy host: one source, one driver, one simulated broker.
//!
//! Per bar the broker fills against the bar first, the driver hears about
//! those fills, then the source's signals are ticked into the driver and any
//! orders it placed are acknowledged before the next bar.

use breakout_core::domain::Bar;
use breakout_core::driver::DriverError;
use breakout_core::signals::SignalSource;
use breakout_core::{Broker, DriverConfig, DriverState, OrderDriver};
use thiserror::Error;
use tracing::{info, warn};

use crate::config::{RunConfig, RunConfigError};
use crate::result::{compute_dataset_hash, compute_fingerprint, RunResult, SCHEMA_VERSION};
use crate::sim::SimBroker;
use crate::source::{FilteredSignals, SignalRow};
use crate::trace::TraceRecorder;

/// Errors from the runner.
#[derive(Debug, Error)]
pub enum RunError {
    #[error("config error: {0}")]
    Config(#[from] RunConfigError),
    #[error("no bars to run on")]
    NoBars,
}

pub struct BreakoutStrategy<S> {
    source: S,
    driver: OrderDriver<SimBroker>,
    trace: TraceRecorder,
    errors: Vec<DriverError>,
    bars: usize,
}

impl<S: SignalSource> BreakoutStrategy<S> {
    pub fn new(source: S, driver: DriverConfig, broker: SimBroker) -> Result<Self, RunConfigError> {
        Ok(Self {
            source,
            driver: OrderDriver::new(broker, driver)?,
            trace: TraceRecorder::new(),
            errors: Vec::new(),
            bars: 0,
        })
    }

    pub fn from_config(source: S, config: &RunConfig) -> Result<Self, RunConfigError> {
        config.validate()?;
        Self::new(source, config.driver.clone(), SimBroker::new(config.broker.clone())?)
    }

    /// Advance one bar.
    pub fn on_bar(&mut self, bar: &Bar) -> DriverState {
        let index = self.bars;
        self.bars += 1;

        self.driver.broker_mut().process_bar(bar);
        self.deliver();

        let signals = self.source.next(index, bar);
        let result = self.driver.on_tick(signals);
        self.keep(result);
        self.deliver();

        let state = self.driver.state();
        let position = self.driver.broker().position().size;
        self.trace.record(index, bar, state, &signals, position);
        state
    }

    /// Ask the driver to unwind whatever it holds.
    pub fn stop(&mut self) -> DriverState {
        let result = self.driver.on_stop();
        self.keep(result);
        self.deliver();
        self.driver.state()
    }

    pub fn driver(&self) -> &OrderDriver<SimBroker> {
        &self.driver
    }

    pub fn broker(&self) -> &SimBroker {
        self.driver.broker()
    }

    pub fn trace(&self) -> &TraceRecorder {
        &self.trace
    }

    pub fn errors(&self) -> &[DriverError] {
        &self.errors
    }

    pub fn bars_processed(&self) -> usize {
        self.bars
    }

    /// Hand queued broker notifications to the driver until none remain.
    /// A notification may make the driver submit, which queues more.
    fn deliver(&mut self) {
        loop {
            let notes = self.driver.broker_mut().drain_notifications();
            if notes.is_empty() {
                break;
            }
            for order in &notes {
                let result = self.driver.on_order_notify(order);
                self.keep(result);
            }
        }
    }

    fn keep(&mut self, result: Result<DriverState, DriverError>) {
        if let Err(err) = result {
            warn!(bar = self.bars, error = %err, "driver action failed");
            self.errors.push(err);
        }
    }
}

/// Run raw indicator rows over `bars`, gating breakouts with the config's
/// entry filter.
pub fn run_rows(
    config: &RunConfig,
    bars: &[Bar],
    rows: Vec<SignalRow>,
) -> Result<RunResult, RunError> {
    run(config, bars, FilteredSignals::new(rows, config.entry_filter))
}

/// Run `source` over `bars` and stop the driver after the last bar.
///
/// The source's signals are used as delivered; `config.entry_filter` only
/// applies through [`run_rows`].
pub fn run<S: SignalSource>(
    config: &RunConfig,
    bars: &[Bar],
    source: S,
) -> Result<RunResult, RunError> {
    if bars.is_empty() {
        return Err(RunError::NoBars);
    }
    let mut strategy = BreakoutStrategy::from_config(source, config)?;
    for bar in bars {
        strategy.on_bar(bar);
    }
    let final_state = strategy.stop();

    let BreakoutStrategy {
        driver,
        trace,
        errors,
        ..
    } = strategy;
    let state_changes = trace.state_changes();
    let transitions = driver.history().to_vec();
    let broker = driver.into_broker();
    let orders = broker.order_log().to_vec();

    let result = RunResult {
        schema_version: SCHEMA_VERSION,
        config: config.clone(),
        bar_count: bars.len(),
        start_date: bars.first().map(|b| b.date),
        end_date: bars.last().map(|b| b.date),
        dataset_hash: compute_dataset_hash(&config.symbol, bars),
        fingerprint: compute_fingerprint(&orders),
        final_state,
        final_position: broker.position(),
        cash: broker.cash(),
        equity: broker.equity(),
        realized_pnl: broker.realized_pnl(),
        commission: broker.commission_paid(),
        round_trips: broker.round_trips(),
        state_changes,
        driver_errors: errors.iter().map(|e| e.to_string()).collect(),
        transitions,
        trace: trace.into_rows(),
        orders,
    };
    info!(
        symbol = %config.symbol,
        bars = result.bar_count,
        round_trips = result.round_trips,
        realized_pnl = result.realized_pnl,
        fingerprint = %result.fingerprint,
        "run complete"
    );
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use breakout_core::signals::{ScriptedSignals, Signal, Signals};
    use chrono::NaiveDate;

    fn bar(day: u32, open: f64, high: f64, low: f64, close: f64) -> Bar {
        Bar {
            date: NaiveDate::from_ymd_opt(2024, 5, day).unwrap(),
            open,
            high,
            low,
            close,
            volume: 1_000,
        }
    }

    fn flat_bar(day: u32, price: f64) -> Bar {
        bar(day, price, price + 1.0, price - 1.0, price)
    }

    fn strategy(signals: Vec<Signals>) -> BreakoutStrategy<ScriptedSignals> {
        BreakoutStrategy::from_config(ScriptedSignals::new(signals), &RunConfig::new("TEST")).unwrap()
    }

    #[test]
    fn entry_fills_next_bar_and_arms_stop() {
        let mut s = strategy(vec![
            Signals::new(Signal::Long, 95.0, Signal::Flat),
            Signals::new(Signal::Flat, 95.0, Signal::Flat),
        ]);
        assert_eq!(s.on_bar(&flat_bar(1, 100.0)), DriverState::Entry);
        // fill → stop submitted → accepted, all within bar 2
        assert_eq!(s.on_bar(&flat_bar(2, 100.0)), DriverState::Protect);
        assert_eq!(s.broker().position().size, 1.0);
        let stop = s.broker().working_orders().next().unwrap();
        assert_eq!(stop.price(), Some(95.0));
    }

    #[test]
    fn stop_loss_ends_cycle() {
        let mut s = strategy(vec![
            Signals::new(Signal::Long, 95.0, Signal::Flat),
            Signals::new(Signal::Flat, 95.0, Signal::Flat),
            Signals::new(Signal::Flat, 95.0, Signal::Flat),
        ]);
        s.on_bar(&flat_bar(1, 100.0));
        s.on_bar(&flat_bar(2, 100.0));
        assert_eq!(s.on_bar(&bar(3, 96.0, 97.0, 90.0, 91.0)), DriverState::Idle);
        assert!(s.broker().position().is_flat());
        assert_eq!(s.broker().realized_pnl(), -5.0);
    }

    #[test]
    fn stop_request_while_entry_working_cancels_it() {
        let mut s = strategy(vec![Signals::new(Signal::Long, 95.0, Signal::Flat)]);
        s.on_bar(&flat_bar(1, 100.0));
        assert_eq!(s.stop(), DriverState::Idle);
        assert_eq!(s.broker().working_orders().count(), 0);
        assert!(s.errors().is_empty());
    }

    #[test]
    fn run_requires_bars() {
        let err = run(&RunConfig::new("X"), &[], ScriptedSignals::default()).unwrap_err();
        assert!(matches!(err, RunError::NoBars));
    }

    #[test]
    fn run_rows_applies_configured_filter() {
        let rows = vec![
            SignalRow::new(1.0, 5.0, 95.0, 0.0),
            SignalRow::new(0.0, 6.0, 95.0, 0.0),
        ];
        let bars = [flat_bar(1, 100.0), flat_bar(2, 100.0)];

        let open = run_rows(&RunConfig::new("X"), &bars, rows.clone()).unwrap();
        assert!(!open.orders.is_empty());

        let mut gated = RunConfig::new("X");
        gated.entry_filter.max_entry_td = 4;
        let result = run_rows(&gated, &bars, rows).unwrap();
        assert!(result.orders.is_empty());
    }

    #[test]
    fn run_rejects_invalid_config() {
        let mut cfg = RunConfig::new("X");
        cfg.driver.entry_size = 0.0;
        let err = run(&cfg, &[flat_bar(1, 10.0)], ScriptedSignals::default()).unwrap_err();
        assert!(matches!(err, RunError::Config(RunConfigError::Driver(_))));
    }
}
