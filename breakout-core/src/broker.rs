//! Broker port: the fixed order vocabulary the driver places orders through.

use crate::domain::{OrderHandle, OrderId, OrderKind, OrderSide, OrderStatus, Position};
use thiserror::Error;

/// Errors a broker raises synchronously while accepting a request.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum BrokerError {
    #[error("no open position to close or protect")]
    NoPosition,

    #[error("invalid order price {0}")]
    InvalidPrice(f64),

    #[error("invalid order size {0}")]
    InvalidSize(f64),

    #[error("order {0} not found")]
    UnknownOrder(OrderId),

    #[error("order {0} is not active (status: {1})")]
    OrderNotActive(OrderId, OrderStatus),

    #[error("order rejected: {0}")]
    Rejected(String),
}

/// Order placement surface used by the driver.
///
/// Submissions return the broker's handle for the new order; all later status
/// changes arrive out of band as notifications carrying the same id.
pub trait Broker {
    /// Submit a new order.
    fn submit(
        &mut self,
        side: OrderSide,
        kind: OrderKind,
        size: f64,
    ) -> Result<OrderHandle, BrokerError>;

    /// Market order that flattens the whole current position.
    fn close(&mut self) -> Result<OrderHandle, BrokerError>;

    /// Request cancellation. Completion is reported by a later notification.
    fn cancel(&mut self, id: OrderId) -> Result<(), BrokerError>;

    /// Current net position.
    fn position(&self) -> Position;

    fn buy(&mut self, size: f64) -> Result<OrderHandle, BrokerError> {
        self.submit(OrderSide::Buy, OrderKind::Market, size)
    }

    fn sell(&mut self, size: f64) -> Result<OrderHandle, BrokerError> {
        self.submit(OrderSide::Sell, OrderKind::Market, size)
    }

    fn buy_stop(&mut self, price: f64, size: f64) -> Result<OrderHandle, BrokerError> {
        self.submit(OrderSide::Buy, OrderKind::Stop { price }, size)
    }

    fn sell_stop(&mut self, price: f64, size: f64) -> Result<OrderHandle, BrokerError> {
        self.submit(OrderSide::Sell, OrderKind::Stop { price }, size)
    }
}

impl<B: Broker + ?Sized> Broker for &mut B {
    fn submit(
        &mut self,
        side: OrderSide,
        kind: OrderKind,
        size: f64,
    ) -> Result<OrderHandle, BrokerError> {
        (**self).submit(side, kind, size)
    }

    fn close(&mut self) -> Result<OrderHandle, BrokerError> {
        (**self).close()
    }

    fn cancel(&mut self, id: OrderId) -> Result<(), BrokerError> {
        (**self).cancel(id)
    }

    fn position(&self) -> Position {
        (**self).position()
    }
}
