//! End-to-end runs of the breakout driver against the simulated broker.

use breakout_core::domain::{Bar, OrderId, OrderStatus};
use breakout_core::driver::Outcome;
use breakout_core::signals::{EntryFilter, ScriptedSignals, Signal, Signals};
use breakout_core::{DriverState, EntryStyle};
use breakout_runner::export::{export_json, import_json};
use breakout_runner::{load_artifacts, run, run_rows, save_artifacts, RunConfig, RunResult, SignalRow};
use chrono::{Duration, NaiveDate};

// ── Helpers ──────────────────────────────────────────────────────────

fn date(i: usize) -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 1, 2).unwrap() + Duration::days(i as i64)
}

fn bar(i: usize, open: f64, high: f64, low: f64, close: f64) -> Bar {
    Bar {
        date: date(i),
        open,
        high,
        low,
        close,
        volume: 100_000,
    }
}

fn flat_bars(n: usize, price: f64) -> Vec<Bar> {
    (0..n).map(|i| bar(i, price, price + 1.0, price - 1.0, price)).collect()
}

fn long(protect: f64) -> Signals {
    Signals::new(Signal::Long, protect, Signal::Flat)
}

fn hold(protect: f64) -> Signals {
    Signals::new(Signal::Flat, protect, Signal::Flat)
}

fn exit(protect: f64) -> Signals {
    Signals::new(Signal::Flat, protect, Signal::Short)
}

fn statuses_of(result: &RunResult, id: u64) -> Vec<OrderStatus> {
    result
        .orders
        .iter()
        .filter(|e| e.id == OrderId(id))
        .map(|e| e.status)
        .collect()
}

/// Entry, stop at 95, re-price to 97, close signal, flat.
fn reprice_then_close() -> RunResult {
    let signals = vec![long(95.0), hold(95.0), hold(97.0), exit(97.0), hold(97.0)];
    run(&RunConfig::new("SPY"), &flat_bars(5, 100.0), ScriptedSignals::new(signals)).unwrap()
}

// ── Trade cycles ─────────────────────────────────────────────────────

#[test]
fn reprice_and_close_cycle() {
    let result = reprice_then_close();
    let states: Vec<DriverState> = result.trace.iter().map(|r| r.state).collect();
    assert_eq!(
        states,
        vec![
            DriverState::Entry,
            DriverState::Protect,
            DriverState::Protect,
            DriverState::Close,
            DriverState::Idle,
        ]
    );

    // entry, first stop, re-priced stop, close
    assert_eq!(statuses_of(&result, 1).last(), Some(&OrderStatus::Completed));
    assert_eq!(
        statuses_of(&result, 2),
        vec![OrderStatus::Submitted, OrderStatus::Accepted, OrderStatus::Cancelled]
    );
    assert_eq!(statuses_of(&result, 3).last(), Some(&OrderStatus::Cancelled));
    assert_eq!(statuses_of(&result, 4).last(), Some(&OrderStatus::Completed));
    let repriced = result.orders.iter().find(|e| e.id == OrderId(3)).unwrap();
    assert_eq!(repriced.price, Some(97.0));

    assert_eq!(result.final_state, DriverState::Idle);
    assert!(result.final_position.is_flat());
    assert_eq!(result.round_trips, 1);
    assert!(result.driver_errors.is_empty());
}

#[test]
fn short_stopped_out_on_gap_up() {
    let signals = vec![
        Signals::new(Signal::Short, 105.0, Signal::Flat),
        hold(105.0),
        hold(105.0),
    ];
    let mut bars = flat_bars(2, 100.0);
    bars.push(bar(2, 108.0, 110.0, 107.0, 109.0));

    let result = run(&RunConfig::new("SPY"), &bars, ScriptedSignals::new(signals)).unwrap();
    assert_eq!(result.final_state, DriverState::Idle);
    assert!(result.final_position.is_flat());
    // sold at 100, bought back at the gap open
    assert_eq!(result.realized_pnl, -8.0);
    let fill = result
        .orders
        .iter()
        .rev()
        .find(|e| e.status == OrderStatus::Completed)
        .unwrap();
    assert_eq!(fill.fill_price, Some(108.0));
}

#[test]
fn end_of_data_unwinds_open_trade() {
    let signals = vec![long(95.0), hold(95.0)];
    let result = run(&RunConfig::new("SPY"), &flat_bars(2, 100.0), ScriptedSignals::new(signals)).unwrap();
    // the stop is cancelled and a close is working when data runs out
    assert_eq!(result.final_state, DriverState::Close);
    assert_eq!(result.final_position.size, 1.0);
    assert_eq!(statuses_of(&result, 2).last(), Some(&OrderStatus::Cancelled));
    assert_eq!(statuses_of(&result, 3), vec![OrderStatus::Submitted, OrderStatus::Accepted]);
}

#[test]
fn limit_entry_waits_for_price() {
    let mut config = RunConfig::new("SPY");
    config.driver.entry_style = EntryStyle::Limit;
    let signals = vec![long(90.0).with_entry_price(97.5), hold(90.0), hold(90.0)];
    let mut bars = flat_bars(2, 100.0);
    bars.push(bar(2, 99.0, 99.5, 96.0, 97.0));

    let result = run(&config, &bars, ScriptedSignals::new(signals)).unwrap();
    let entry = result.orders.iter().find(|e| e.id == OrderId(1)).unwrap();
    assert_eq!(entry.order_type, "limit");
    assert_eq!(result.trace[1].state, DriverState::Entry);
    assert_eq!(result.trace[2].state, DriverState::Protect);
    let fill = result.orders.iter().find(|e| e.status == OrderStatus::Completed).unwrap();
    assert_eq!(fill.fill_price, Some(97.5));
}

#[test]
fn margin_on_entry_recovers_to_idle() {
    let mut config = RunConfig::new("SPY");
    config.broker.cash = 50.0;
    let result = run(&config, &flat_bars(3, 100.0), ScriptedSignals::new(vec![long(95.0)])).unwrap();

    assert_eq!(statuses_of(&result, 1).last(), Some(&OrderStatus::Margin));
    assert!(result
        .transitions
        .iter()
        .any(|t| matches!(t.outcome, Outcome::Recovered { status: OrderStatus::Margin, .. })));
    assert_eq!(result.final_state, DriverState::Idle);
    assert!(result.final_position.is_flat());
    assert_eq!(result.cash, 50.0);
}

#[test]
fn undefined_stop_is_repriced_once_defined() {
    let signals = vec![long(f64::NAN), hold(f64::NAN), hold(94.0), hold(94.0)];
    let result = run(&RunConfig::new("SPY"), &flat_bars(4, 100.0), ScriptedSignals::new(signals)).unwrap();

    let first_stop = result.orders.iter().find(|e| e.id == OrderId(2)).unwrap();
    assert_eq!(first_stop.price, None);
    assert_eq!(statuses_of(&result, 2).last(), Some(&OrderStatus::Cancelled));
    let second = result.orders.iter().find(|e| e.id == OrderId(3)).unwrap();
    assert_eq!(second.price, Some(94.0));
    assert_eq!(result.trace[3].state, DriverState::Protect);
}

#[test]
fn td_filter_blocks_late_breakouts() {
    let mut config = RunConfig::new("SPY");
    config.entry_filter = EntryFilter::new(3);
    let rows = vec![
        SignalRow::new(1.0, 7.0, 95.0, 0.0),
        SignalRow::new(1.0, 8.0, 95.0, 0.0),
        SignalRow::new(0.0, 9.0, 95.0, 0.0),
    ];
    let result = run_rows(&config, &flat_bars(3, 100.0), rows).unwrap();
    assert!(result.orders.is_empty());
    assert!(result.trace.iter().all(|r| r.state == DriverState::Idle));
    assert_eq!(result.config.entry_filter.max_entry_td, 3);
}

#[test]
fn entry_filter_in_config_changes_entries() {
    let rows = vec![
        SignalRow::new(1.0, 6.0, 95.0, 0.0),
        SignalRow::new(0.0, 7.0, 95.0, 0.0),
        SignalRow::new(0.0, 8.0, 95.0, 0.0),
    ];
    let bars = flat_bars(3, 100.0);
    let toml_with = |max: i32| format!("symbol = \"SPY\"\n\n[entry_filter]\nmax_entry_td = {max}\n");

    let loose = RunConfig::from_toml_str(&toml_with(-1)).unwrap();
    let strict = RunConfig::from_toml_str(&toml_with(5)).unwrap();

    let entered = run_rows(&loose, &bars, rows.clone()).unwrap();
    let skipped = run_rows(&strict, &bars, rows).unwrap();

    assert!(statuses_of(&entered, 1).contains(&OrderStatus::Completed));
    assert_eq!(entered.final_position.size, 1.0);
    assert!(skipped.orders.is_empty());
    assert!(skipped.final_position.is_flat());
    assert_ne!(entered.fingerprint, skipped.fingerprint);
}

// ── Determinism and artifacts ────────────────────────────────────────

#[test]
fn identical_runs_share_a_fingerprint() {
    let a = reprice_then_close();
    let b = reprice_then_close();
    assert_eq!(a.fingerprint, b.fingerprint);
    assert_eq!(a.dataset_hash, b.dataset_hash);

    let other = run(
        &RunConfig::new("SPY"),
        &flat_bars(5, 100.0),
        ScriptedSignals::new(vec![long(95.0), hold(95.0), hold(96.0)]),
    )
    .unwrap();
    assert_ne!(a.fingerprint, other.fingerprint);
    assert_eq!(a.dataset_hash, other.dataset_hash);
}

#[test]
fn artifacts_round_trip_through_disk() {
    let result = reprice_then_close();
    let dir = tempfile::tempdir().unwrap();
    let run_dir = save_artifacts(&result, dir.path()).unwrap();

    assert!(run_dir.join("manifest.json").exists());
    let trace = std::fs::read_to_string(run_dir.join("trace.csv")).unwrap();
    assert_eq!(trace.lines().count(), result.trace.len() + 1);
    assert!(trace.lines().nth(1).unwrap().contains(",entry,1,"));
    let orders = std::fs::read_to_string(run_dir.join("orders.csv")).unwrap();
    assert_eq!(orders.lines().count(), result.orders.len() + 1);

    let loaded = load_artifacts(&run_dir).unwrap();
    assert_eq!(loaded, result);
}

#[test]
fn manifest_with_future_schema_is_rejected() {
    let result = reprice_then_close();
    let mut value: serde_json::Value = serde_json::from_str(&export_json(&result).unwrap()).unwrap();
    value["schema_version"] = serde_json::json!(breakout_runner::SCHEMA_VERSION + 1);
    let err = import_json(&value.to_string()).unwrap_err();
    assert!(err.to_string().contains("unsupported schema version"));
}

#[test]
fn config_file_drives_the_run() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("run.toml");
    std::fs::write(
        &path,
        "symbol = \"QQQ\"\n\n[driver]\nentry_size = 10.0\n\n[broker]\ncommission_per_unit = 0.1\n",
    )
    .unwrap();

    let config = RunConfig::load(&path).unwrap();
    let result = run(&config, &flat_bars(5, 100.0), ScriptedSignals::new(vec![long(95.0)])).unwrap();
    assert_eq!(result.symbol(), "QQQ");
    assert_eq!(result.final_position.size, 10.0);
    assert!((result.commission - 1.0).abs() < 1e-9);
}
