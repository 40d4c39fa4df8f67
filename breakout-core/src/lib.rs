//! Breakout Core: the order driver that turns per-bar trading signals into
//! broker orders.
//!
//! - Domain types (order handles, statuses, roles, positions, bars)
//! - Signals (typed intent, TD-count entry gating, the signal source contract)
//! - Broker port (buy, sell, buy-stop, sell-stop, close, cancel)
//! - The breakout state machine and the executor that applies its actions

pub mod broker;
pub mod config;
pub mod domain;
pub mod driver;
pub mod signals;

pub use broker::{Broker, BrokerError};
pub use config::{ConfigError, DriverConfig, EntryStyle};
pub use driver::{Action, DriverError, DriverState, Event, Machine, OrderDriver};
pub use signals::{Signal, Signals};

#[cfg(test)]
mod tests {
    use super::*;

    /// Compile-time check: the driver and its value types can move to a worker thread.
    #[allow(dead_code)]
    fn assert_send_sync() {
        fn require_send<T: Send>() {}
        fn require_sync<T: Sync>() {}

        require_send::<Machine>();
        require_sync::<Machine>();
        require_send::<Event>();
        require_sync::<Event>();
        require_send::<Action>();
        require_sync::<Action>();
        require_send::<domain::OrderHandle>();
        require_sync::<domain::OrderHandle>();
        require_send::<DriverError>();
        require_sync::<DriverError>();
    }
}
