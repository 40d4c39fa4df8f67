use super::order::OrderSide;
use serde::{Deserialize, Serialize};

/// Net position in the traded instrument.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Position {
    /// Signed size: positive long, negative short.
    pub size: f64,
    pub avg_price: f64,
}

impl Position {
    pub fn flat() -> Self {
        Self::default()
    }

    pub fn is_long(&self) -> bool {
        self.size > 0.0
    }

    pub fn is_short(&self) -> bool {
        self.size < 0.0
    }

    pub fn is_flat(&self) -> bool {
        self.size == 0.0
    }

    /// Side of the order that would flatten this position.
    pub fn closing_side(&self) -> Option<OrderSide> {
        let opening = if self.is_long() {
            OrderSide::Buy
        } else if self.is_short() {
            OrderSide::Sell
        } else {
            return None;
        };
        Some(opening.opposite())
    }

    pub fn unrealized_pnl(&self, current_price: f64) -> f64 {
        self.size * (current_price - self.avg_price)
    }

    /// Apply a fill and return the realized PnL it produced.
    pub fn apply_fill(&mut self, side: OrderSide, size: f64, price: f64) -> f64 {
        let delta = side.sign() * size;
        let mut realized = 0.0;

        if self.size == 0.0 || self.size.signum() == delta.signum() {
            let new_size = self.size + delta;
            self.avg_price = (self.avg_price * self.size.abs() + price * size) / new_size.abs();
            self.size = new_size;
            return realized;
        }

        let closed = delta.abs().min(self.size.abs());
        realized += closed * (price - self.avg_price) * self.size.signum();
        let new_size = self.size + delta;
        if new_size == 0.0 {
            self.avg_price = 0.0;
        } else if new_size.signum() != self.size.signum() {
            // flipped through zero: remainder opens at the fill price
            self.avg_price = price;
        }
        self.size = new_size;
        realized
    }
}
