use serde::{Deserialize, Serialize};
use std::fmt;

/// The seven states of the breakout order driver.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DriverState {
    /// Flat, waiting for an entry signal.
    #[default]
    Idle,
    /// Entry order working.
    Entry,
    /// Entry cancellation requested, waiting for confirmation.
    CancelEntry,
    /// Protective stop submitted, waiting for the broker to accept it.
    StartProtect,
    /// Protective stop accepted and resting.
    Protect,
    /// Protective stop cancellation requested.
    CancelProtect,
    /// Market close working.
    Close,
}

impl DriverState {
    pub const ALL: [DriverState; 7] = [
        DriverState::Idle,
        DriverState::Entry,
        DriverState::CancelEntry,
        DriverState::StartProtect,
        DriverState::Protect,
        DriverState::CancelProtect,
        DriverState::Close,
    ];

    /// Stable ordinal, used by the state observer line.
    pub fn index(self) -> usize {
        match self {
            DriverState::Idle => 0,
            DriverState::Entry => 1,
            DriverState::CancelEntry => 2,
            DriverState::StartProtect => 3,
            DriverState::Protect => 4,
            DriverState::CancelProtect => 5,
            DriverState::Close => 6,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            DriverState::Idle => "idle",
            DriverState::Entry => "entry",
            DriverState::CancelEntry => "cancel_entry",
            DriverState::StartProtect => "start_protect",
            DriverState::Protect => "protect",
            DriverState::CancelProtect => "cancel_protect",
            DriverState::Close => "close",
        }
    }
}

impl fmt::Display for DriverState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
