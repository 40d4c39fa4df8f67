//! Order handles, statuses and the roles an order plays within one trade cycle.

use super::ids::OrderId;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Buy or sell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OrderSide {
    Buy,
    Sell,
}

impl OrderSide {
    pub fn opposite(self) -> Self {
        match self {
            OrderSide::Buy => OrderSide::Sell,
            OrderSide::Sell => OrderSide::Buy,
        }
    }

    /// +1 for buys, -1 for sells.
    pub fn sign(self) -> f64 {
        match self {
            OrderSide::Buy => 1.0,
            OrderSide::Sell => -1.0,
        }
    }
}

/// Execution type and its price parameter.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum OrderKind {
    /// Fill at the next available price.
    Market,
    /// Fill at the limit price or better.
    Limit { price: f64 },
    /// Becomes a market order once price trades through the trigger.
    Stop { price: f64 },
}

impl OrderKind {
    /// Price attached to the order at submission, if any.
    pub fn price(&self) -> Option<f64> {
        match self {
            OrderKind::Market => None,
            OrderKind::Limit { price } | OrderKind::Stop { price } => Some(*price),
        }
    }
}

/// Broker-side order status.
///
/// Statuses only move forward: `Submitted → Accepted → {terminal}`. A terminal
/// order is never resurrected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OrderStatus {
    Submitted,
    Accepted,
    Completed,
    Cancelled,
    Margin,
    Rejected,
    Expired,
}

impl OrderStatus {
    pub fn is_terminal(self) -> bool {
        !matches!(self, OrderStatus::Submitted | OrderStatus::Accepted)
    }

    /// Position in the forward-only status order. All terminal statuses share
    /// the highest rank.
    pub fn rank(self) -> u8 {
        match self {
            OrderStatus::Submitted => 0,
            OrderStatus::Accepted => 1,
            _ => 2,
        }
    }

    /// Whether moving from `self` to `next` respects the forward-only order.
    pub fn can_advance_to(self, next: OrderStatus) -> bool {
        !self.is_terminal() && next.rank() > self.rank()
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// The purpose of a tracked order within one trade cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OrderRole {
    Entry,
    Protect,
    Close,
}

impl fmt::Display for OrderRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            OrderRole::Entry => "entry",
            OrderRole::Protect => "protect",
            OrderRole::Close => "close",
        };
        f.write_str(name)
    }
}

/// Snapshot of a submitted order as reported by the broker.
///
/// Returned from every submission and carried by every status notification.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderHandle {
    pub id: OrderId,
    pub side: OrderSide,
    pub kind: OrderKind,
    pub size: f64,
    pub status: OrderStatus,
    /// Execution price once Completed.
    pub fill_price: Option<f64>,
}

impl OrderHandle {
    /// Limit/stop price recorded at submission.
    pub fn price(&self) -> Option<f64> {
        self.kind.price()
    }

    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }

    /// Copy of this handle with a new status.
    pub fn with_status(&self, status: OrderStatus) -> Self {
        Self {
            status,
            ..self.clone()
        }
    }
}
