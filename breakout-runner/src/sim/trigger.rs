//! Trigger checking: does a bar fill a working order, and at what price?
//!
//! Market orders fill at the open. Stops fill at the trigger, or at the open
//! when the bar gaps through it. Limits fill at the limit, or at the better
//! open on a favourable gap.

use breakout_core::domain::{Bar, OrderKind, OrderSide};

/// Result of checking one order against one bar.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TriggerResult {
    NoTrigger,
    Fill { fill_price: f64, gap_through: bool },
}

/// Check whether an order of `side`/`kind` fills on `bar`.
///
/// A stop with an undefined (NaN) trigger never fills.
pub fn check_trigger(side: OrderSide, kind: OrderKind, bar: &Bar) -> TriggerResult {
    if bar.is_void() {
        return TriggerResult::NoTrigger;
    }
    match kind {
        OrderKind::Market => TriggerResult::Fill {
            fill_price: bar.open,
            gap_through: false,
        },
        OrderKind::Stop { price } if price.is_nan() => TriggerResult::NoTrigger,
        OrderKind::Stop { price } => check_stop(side, price, bar),
        OrderKind::Limit { price } => check_limit(side, price, bar),
    }
}

/// Sell stop: triggers if bar.low <= trigger. Buy stop: triggers if bar.high >= trigger.
fn check_stop(side: OrderSide, trigger: f64, bar: &Bar) -> TriggerResult {
    match side {
        OrderSide::Sell if bar.low <= trigger => {
            let gap_through = bar.open <= trigger;
            TriggerResult::Fill {
                fill_price: if gap_through { bar.open } else { trigger },
                gap_through,
            }
        }
        OrderSide::Buy if bar.high >= trigger => {
            let gap_through = bar.open >= trigger;
            TriggerResult::Fill {
                fill_price: if gap_through { bar.open } else { trigger },
                gap_through,
            }
        }
        _ => TriggerResult::NoTrigger,
    }
}

/// Buy limit: triggers if bar.low <= limit. Sell limit: triggers if bar.high >= limit.
fn check_limit(side: OrderSide, limit: f64, bar: &Bar) -> TriggerResult {
    match side {
        OrderSide::Buy if bar.low <= limit => {
            let gap_through = bar.open <= limit;
            TriggerResult::Fill {
                fill_price: if gap_through { bar.open } else { limit },
                gap_through,
            }
        }
        OrderSide::Sell if bar.high >= limit => {
            let gap_through = bar.open >= limit;
            TriggerResult::Fill {
                fill_price: if gap_through { bar.open } else { limit },
                gap_through,
            }
        }
        _ => TriggerResult::NoTrigger,
    }
}
