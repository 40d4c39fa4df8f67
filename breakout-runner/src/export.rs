//! Artifact export: JSON manifest plus CSV trace and order log.
//!
//! Every persisted manifest carries a `schema_version`; newer versions are
//! rejected on load.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};

use crate::result::{RunResult, SCHEMA_VERSION};
use crate::sim::OrderEvent;
use crate::trace::TraceRow;

// ─── JSON export ────────────────────────────────────────────────────

pub fn export_json(result: &RunResult) -> Result<String> {
    serde_json::to_string_pretty(result).context("failed to serialize RunResult to JSON")
}

/// Deserialize a `RunResult` from JSON, rejecting unknown schema versions.
pub fn import_json(json: &str) -> Result<RunResult> {
    let result: RunResult =
        serde_json::from_str(json).context("failed to deserialize RunResult from JSON")?;
    if result.schema_version > SCHEMA_VERSION {
        bail!(
            "unsupported schema version {} (max supported: {})",
            result.schema_version,
            SCHEMA_VERSION
        );
    }
    Ok(result)
}

// ─── CSV export ─────────────────────────────────────────────────────

/// Columns: bar, date, state, state_index, entry_price, protect_price, position.
/// Undefined prices are written as empty fields.
pub fn export_trace_csv(rows: &[TraceRow]) -> Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);
    wtr.write_record([
        "bar",
        "date",
        "state",
        "state_index",
        "entry_price",
        "protect_price",
        "position",
    ])?;
    for r in rows {
        wtr.write_record([
            &r.bar.to_string(),
            &r.date.to_string(),
            r.state.name(),
            &r.state_index.to_string(),
            &opt_price(r.entry_price),
            &opt_price(r.protect_price),
            &format!("{:.6}", r.position),
        ])?;
    }
    let data = wtr.into_inner().context("failed to flush CSV writer")?;
    String::from_utf8(data).context("CSV output is not valid UTF-8")
}

/// Columns: bar, date, id, side, order_type, price, size, status, fill_price, commission.
pub fn export_orders_csv(events: &[OrderEvent]) -> Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);
    wtr.write_record([
        "bar",
        "date",
        "id",
        "side",
        "order_type",
        "price",
        "size",
        "status",
        "fill_price",
        "commission",
    ])?;
    for e in events {
        wtr.write_record([
            &e.bar.to_string(),
            &e.date.map(|d| d.to_string()).unwrap_or_default(),
            &e.id.0.to_string(),
            &format!("{:?}", e.side),
            &e.order_type,
            &opt_price(e.price),
            &format!("{:.6}", e.size),
            &e.status.to_string(),
            &opt_price(e.fill_price),
            &format!("{:.2}", e.commission),
        ])?;
    }
    let data = wtr.into_inner().context("failed to flush CSV writer")?;
    String::from_utf8(data).context("CSV output is not valid UTF-8")
}

fn opt_price(price: Option<f64>) -> String {
    price.map(|p| format!("{:.6}", p)).unwrap_or_default()
}

// ─── Artifact bundle ────────────────────────────────────────────────

/// Save the full artifact set for a run.
///
/// Creates `{symbol}_{timestamp}/` under `output_dir` containing:
/// - `manifest.json`: the full `RunResult`
/// - `trace.csv`: per-bar driver state and prices
/// - `orders.csv`: every order status change
///
/// Returns the path to the created directory.
pub fn save_artifacts(result: &RunResult, output_dir: &Path) -> Result<PathBuf> {
    let dirname = format!(
        "{}_{}",
        result.symbol(),
        chrono::Local::now().format("%Y%m%d_%H%M%S")
    );
    let run_dir = output_dir.join(dirname);
    std::fs::create_dir_all(&run_dir)
        .with_context(|| format!("failed to create artifact dir: {}", run_dir.display()))?;

    let json = export_json(result)?;
    std::fs::write(run_dir.join("manifest.json"), &json)?;

    let trace_csv = export_trace_csv(&result.trace)?;
    std::fs::write(run_dir.join("trace.csv"), &trace_csv)?;

    let orders_csv = export_orders_csv(&result.orders)?;
    std::fs::write(run_dir.join("orders.csv"), &orders_csv)?;

    Ok(run_dir)
}

/// Load a `RunResult` from an artifact directory's manifest.json.
pub fn load_artifacts(dir: &Path) -> Result<RunResult> {
    let manifest_path = dir.join("manifest.json");
    let json = std::fs::read_to_string(&manifest_path)
        .with_context(|| format!("failed to read {}", manifest_path.display()))?;
    import_json(&json)
}

#[cfg(test)]
mod tests {
    use super::*;
    use breakout_core::domain::{OrderId, OrderSide, OrderStatus};
    use breakout_core::DriverState;
    use chrono::NaiveDate;

    fn row(bar: usize, state: DriverState, protect: Option<f64>) -> TraceRow {
        TraceRow {
            bar,
            date: NaiveDate::from_ymd_opt(2024, 1, 2).unwrap(),
            state,
            state_index: state.index(),
            entry_price: None,
            protect_price: protect,
            position: 0.0,
        }
    }

    #[test]
    fn trace_csv_blanks_missing_prices() {
        let csv = export_trace_csv(&[
            row(0, DriverState::Idle, None),
            row(1, DriverState::Protect, Some(97.5)),
        ])
        .unwrap();
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(
            lines[0],
            "bar,date,state,state_index,entry_price,protect_price,position"
        );
        assert!(lines[1].starts_with("0,2024-01-02,"));
        assert!(lines[1].contains(",,"));
        assert!(lines[2].contains("97.500000"));
    }

    #[test]
    fn orders_csv_has_one_row_per_event() {
        let events = vec![OrderEvent {
            bar: 3,
            date: NaiveDate::from_ymd_opt(2024, 1, 4),
            id: OrderId(7),
            side: OrderSide::Sell,
            order_type: "stop".into(),
            price: Some(98.0),
            size: 1.0,
            status: OrderStatus::Completed,
            fill_price: Some(97.0),
            commission: 0.25,
        }];
        let csv = export_orders_csv(&events).unwrap();
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(lines.len(), 2);
        assert_eq!(
            lines[1],
            "3,2024-01-04,7,Sell,stop,98.000000,1.000000,Completed,97.000000,0.25"
        );
    }

    #[test]
    fn import_rejects_future_schema() {
        let json = r#"{"schema_version": 999}"#;
        assert!(import_json(json).is_err());
    }
}
