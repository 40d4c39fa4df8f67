//! Breakout Runner: hosts the order driver over a bar series.
//!
//! This crate builds on `breakout-core` to provide:
//! - A simulated broker that fills orders against bars
//! - The strategy host loop wiring signals, driver and broker
//! - Per-bar driver traces and the order log
//! - Run fingerprinting and JSON/CSV artifacts
//! - TOML run configuration and logging setup

pub mod config;
pub mod export;
pub mod logging;
pub mod result;
pub mod sim;
pub mod source;
pub mod strategy;
pub mod trace;

pub use config::{RunConfig, RunConfigError};
pub use export::{load_artifacts, save_artifacts};
pub use result::{compute_fingerprint, RunResult, SCHEMA_VERSION};
pub use sim::{OrderEvent, SimBroker, SimBrokerConfig};
pub use source::{FilteredSignals, SignalRow};
pub use strategy::{run, run_rows, BreakoutStrategy, RunError};
pub use trace::{TraceRecorder, TraceRow};
