use crate::domain::{OrderId, OrderRole, OrderSide};
use serde::{Deserialize, Serialize};

/// Side effect requested by a transition. Executed by the caller against a
/// broker; the machine itself never touches one.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Action {
    /// Open a position. `limit_price` set means a limit entry.
    SubmitEntry {
        side: OrderSide,
        limit_price: Option<f64>,
    },
    /// Protective stop opposite the net position.
    SubmitProtect { price: f64 },
    /// Market close of the whole position.
    SubmitClose,
    /// Cancel a tracked order. The handle stays tracked until the broker
    /// confirms a terminal status.
    Cancel { role: OrderRole, id: OrderId },
}

impl Action {
    pub fn role(&self) -> OrderRole {
        match self {
            Action::SubmitEntry { .. } => OrderRole::Entry,
            Action::SubmitProtect { .. } => OrderRole::Protect,
            Action::SubmitClose => OrderRole::Close,
            Action::Cancel { role, .. } => *role,
        }
    }

    pub fn is_submission(&self) -> bool {
        !matches!(self, Action::Cancel { .. })
    }
}
