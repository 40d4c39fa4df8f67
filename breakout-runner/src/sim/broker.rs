//! Simulated broker: fills driver orders against daily bars.
//!
//! Orders submitted while bar `n` is being processed work from bar `n + 1`
//! on. Status changes are queued and handed to the host through
//! [`SimBroker::drain_notifications`], so the driver sees them out of band
//! exactly as it would from a live broker.

use std::collections::{BTreeMap, VecDeque};

use breakout_core::domain::{Bar, OrderHandle, OrderId, OrderKind, OrderSide, OrderStatus, Position};
use breakout_core::{Broker, BrokerError};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

use super::trigger::{check_trigger, TriggerResult};

#[derive(Debug, Error, PartialEq)]
pub enum SimBrokerConfigError {
    #[error("cash must be positive and finite, got {0}")]
    InvalidCash(f64),

    #[error("commission_per_unit must be non-negative and finite, got {0}")]
    InvalidCommission(f64),
}

/// Account and cost settings for the simulated broker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimBrokerConfig {
    /// Starting cash.
    pub cash: f64,
    /// Commission charged per unit filled.
    pub commission_per_unit: f64,
}

impl Default for SimBrokerConfig {
    fn default() -> Self {
        Self {
            cash: 100_000.0,
            commission_per_unit: 0.0,
        }
    }
}

impl SimBrokerConfig {
    pub fn validate(&self) -> Result<(), SimBrokerConfigError> {
        if !(self.cash.is_finite() && self.cash > 0.0) {
            return Err(SimBrokerConfigError::InvalidCash(self.cash));
        }
        if !(self.commission_per_unit.is_finite() && self.commission_per_unit >= 0.0) {
            return Err(SimBrokerConfigError::InvalidCommission(
                self.commission_per_unit,
            ));
        }
        Ok(())
    }
}

/// One status change in the order log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderEvent {
    /// Bars processed when the change happened.
    pub bar: usize,
    pub date: Option<NaiveDate>,
    pub id: OrderId,
    pub side: OrderSide,
    /// `market`, `limit` or `stop`.
    pub order_type: String,
    /// Limit/stop price; `None` for market orders and undefined stops.
    pub price: Option<f64>,
    pub size: f64,
    pub status: OrderStatus,
    pub fill_price: Option<f64>,
    pub commission: f64,
}

fn order_type(kind: OrderKind) -> &'static str {
    match kind {
        OrderKind::Market => "market",
        OrderKind::Limit { .. } => "limit",
        OrderKind::Stop { .. } => "stop",
    }
}

pub struct SimBroker {
    config: SimBrokerConfig,
    next_id: u64,
    bars_seen: usize,
    date: Option<NaiveDate>,
    last_close: Option<f64>,
    /// Every order ever submitted, keyed by id.
    orders: BTreeMap<OrderId, OrderHandle>,
    position: Position,
    cash: f64,
    commission_paid: f64,
    realized_pnl: f64,
    round_trips: usize,
    pending: VecDeque<OrderHandle>,
    log: Vec<OrderEvent>,
}

impl SimBroker {
    pub fn new(config: SimBrokerConfig) -> Result<Self, SimBrokerConfigError> {
        config.validate()?;
        Ok(Self::unchecked(config))
    }

    fn unchecked(config: SimBrokerConfig) -> Self {
        Self {
            cash: config.cash,
            config,
            next_id: 0,
            bars_seen: 0,
            date: None,
            last_close: None,
            orders: BTreeMap::new(),
            position: Position::flat(),
            commission_paid: 0.0,
            realized_pnl: 0.0,
            round_trips: 0,
            pending: VecDeque::new(),
            log: Vec::new(),
        }
    }

    // ── Bar processing ─────────────────────────────────────────────────

    /// Match every working order against `bar` in submission order.
    pub fn process_bar(&mut self, bar: &Bar) {
        self.bars_seen += 1;
        self.date = Some(bar.date);
        if !bar.is_sane() {
            warn!(date = %bar.date, "skipping fills on void or malformed bar");
            return;
        }

        let working: Vec<OrderId> = self
            .orders
            .values()
            .filter(|o| !o.is_terminal())
            .map(|o| o.id)
            .collect();

        for id in working {
            let Some(order) = self.orders.get(&id).cloned() else {
                continue;
            };
            if let TriggerResult::Fill {
                fill_price,
                gap_through,
            } = check_trigger(order.side, order.kind, bar)
            {
                if gap_through {
                    debug!(%id, trigger = ?order.price(), fill_price, "gap through trigger");
                }
                self.fill(order, fill_price);
            }
        }
        self.last_close = Some(bar.close);
    }

    /// Take every queued notification, oldest first.
    pub fn drain_notifications(&mut self) -> Vec<OrderHandle> {
        self.pending.drain(..).collect()
    }

    // ── Accessors ──────────────────────────────────────────────────────

    pub fn config(&self) -> &SimBrokerConfig {
        &self.config
    }

    pub fn cash(&self) -> f64 {
        self.cash
    }

    /// Cash plus the position marked at the last close.
    pub fn equity(&self) -> f64 {
        self.cash + self.position.size * self.last_close.unwrap_or(self.position.avg_price)
    }

    pub fn commission_paid(&self) -> f64 {
        self.commission_paid
    }

    pub fn realized_pnl(&self) -> f64 {
        self.realized_pnl
    }

    /// Fills that took the position from open back to flat.
    pub fn round_trips(&self) -> usize {
        self.round_trips
    }

    pub fn order(&self, id: OrderId) -> Option<&OrderHandle> {
        self.orders.get(&id)
    }

    pub fn working_orders(&self) -> impl Iterator<Item = &OrderHandle> {
        self.orders.values().filter(|o| !o.is_terminal())
    }

    pub fn order_log(&self) -> &[OrderEvent] {
        &self.log
    }

    // ── Internal helpers ───────────────────────────────────────────────

    fn fill(&mut self, order: OrderHandle, price: f64) {
        let commission = order.size * self.config.commission_per_unit;
        if !self.has_margin(order.side, order.size, price, commission) {
            warn!(id = %order.id, price, size = order.size, cash = self.cash, "insufficient margin");
            self.resolve(order.with_status(OrderStatus::Margin), 0.0);
            return;
        }

        let was_open = !self.position.is_flat();
        self.realized_pnl += self.position.apply_fill(order.side, order.size, price);
        self.cash -= order.side.sign() * order.size * price + commission;
        self.commission_paid += commission;
        if was_open && self.position.is_flat() {
            self.round_trips += 1;
        }

        let filled = OrderHandle {
            status: OrderStatus::Completed,
            fill_price: Some(price),
            ..order
        };
        debug!(
            id = %filled.id,
            side = ?filled.side,
            size = filled.size,
            price,
            position = self.position.size,
            "order filled"
        );
        self.resolve(filled, commission);
    }

    /// Exposure-increasing fills must be covered by equity at the fill price.
    fn has_margin(&self, side: OrderSide, size: f64, price: f64, commission: f64) -> bool {
        let new_size = self.position.size + side.sign() * size;
        if new_size.abs() <= self.position.size.abs() {
            return true;
        }
        let equity = self.cash + self.position.size * price;
        new_size.abs() * price + commission <= equity
    }

    fn resolve(&mut self, order: OrderHandle, commission: f64) {
        self.orders.insert(order.id, order.clone());
        self.notify(order, commission);
    }

    fn notify(&mut self, order: OrderHandle, commission: f64) {
        self.log.push(OrderEvent {
            bar: self.bars_seen,
            date: self.date,
            id: order.id,
            side: order.side,
            order_type: order_type(order.kind).to_string(),
            price: order.price().filter(|p| p.is_finite()),
            size: order.size,
            status: order.status,
            fill_price: order.fill_price,
            commission,
        });
        self.pending.push_back(order);
    }

    fn validate_order(kind: OrderKind, size: f64) -> Result<(), BrokerError> {
        if !(size.is_finite() && size > 0.0) {
            return Err(BrokerError::InvalidSize(size));
        }
        match kind {
            OrderKind::Market => Ok(()),
            // an undefined stop is accepted and simply never triggers
            OrderKind::Stop { price } if price.is_nan() => Ok(()),
            OrderKind::Stop { price } | OrderKind::Limit { price } => {
                if price.is_finite() && price > 0.0 {
                    Ok(())
                } else {
                    Err(BrokerError::InvalidPrice(price))
                }
            }
        }
    }
}

impl Default for SimBroker {
    fn default() -> Self {
        Self::unchecked(SimBrokerConfig::default())
    }
}

impl Broker for SimBroker {
    fn submit(
        &mut self,
        side: OrderSide,
        kind: OrderKind,
        size: f64,
    ) -> Result<OrderHandle, BrokerError> {
        Self::validate_order(kind, size)?;

        self.next_id += 1;
        let handle = OrderHandle {
            id: OrderId(self.next_id),
            side,
            kind,
            size,
            status: OrderStatus::Submitted,
            fill_price: None,
        };
        self.notify(handle.clone(), 0.0);
        let accepted = handle.with_status(OrderStatus::Accepted);
        self.orders.insert(handle.id, accepted.clone());
        self.notify(accepted, 0.0);
        Ok(handle)
    }

    fn close(&mut self) -> Result<OrderHandle, BrokerError> {
        let side = self.position.closing_side().ok_or(BrokerError::NoPosition)?;
        let size = self.position.size.abs();
        self.submit(side, OrderKind::Market, size)
    }

    fn cancel(&mut self, id: OrderId) -> Result<(), BrokerError> {
        let order = self
            .orders
            .get(&id)
            .cloned()
            .ok_or(BrokerError::UnknownOrder(id))?;
        if order.is_terminal() {
            return Err(BrokerError::OrderNotActive(id, order.status));
        }
        self.resolve(order.with_status(OrderStatus::Cancelled), 0.0);
        Ok(())
    }

    fn position(&self) -> Position {
        self.position
    }
}
