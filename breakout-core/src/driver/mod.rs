//! Breakout order driver: states, events, actions, the pure machine and the
//! broker-facing executor.

pub mod action;
pub mod error;
pub mod event;
pub mod executor;
pub mod machine;
pub mod state;

pub use action::Action;
pub use error::DriverError;
pub use event::{Event, EventKind};
pub use executor::{OrderDriver, TransitionRecord};
pub use machine::{CancelReason, Machine, Outcome, Step, TrackedOrder};
pub use state::DriverState;
