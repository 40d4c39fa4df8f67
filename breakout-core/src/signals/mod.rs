//! Signals: typed intent, entry gating and the source contract.

pub mod filter;
pub mod intent;
pub mod source;

pub use filter::EntryFilter;
pub use intent::{Signal, Signals};
pub use source::{ScriptedSignals, SignalSource};
