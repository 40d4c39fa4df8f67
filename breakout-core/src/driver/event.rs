use crate::domain::OrderHandle;
use crate::signals::Signals;
use serde::{Deserialize, Serialize};

/// Inputs to the driver state machine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Event {
    /// One evaluation step carrying the latest signals.
    Tick(Signals),
    /// An order's status changed.
    OrderNotify(OrderHandle),
    /// Abandon whatever is in flight.
    Stop,
}

impl Event {
    pub fn kind(&self) -> EventKind {
        match self {
            Event::Tick(_) => EventKind::Tick,
            Event::OrderNotify(_) => EventKind::OrderNotify,
            Event::Stop => EventKind::Stop,
        }
    }
}

/// Payload-free discriminant of [`Event`], for logs and transition records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventKind {
    Tick,
    OrderNotify,
    Stop,
}
