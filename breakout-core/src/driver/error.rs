use crate::broker::BrokerError;
use crate::domain::{OrderId, OrderRole};
use thiserror::Error;

/// Errors surfaced from a single driver event. The transition that produced
/// the failing action has already been applied. After a failed submission the
/// driver stays in the new state with that role's slot empty until `Stop`.
#[derive(Debug, Error, PartialEq)]
pub enum DriverError {
    #[error("{role} order submission failed: {source}")]
    Submission {
        role: OrderRole,
        source: BrokerError,
    },

    #[error("cancel of {role} order {id} failed: {source}")]
    Cancel {
        role: OrderRole,
        id: OrderId,
        source: BrokerError,
    },
}
