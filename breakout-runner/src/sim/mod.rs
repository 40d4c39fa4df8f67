//! Bar-driven simulated broker.

pub mod broker;
pub mod trigger;

pub use broker::{OrderEvent, SimBroker, SimBrokerConfig, SimBrokerConfigError};
pub use trigger::{check_trigger, TriggerResult};
