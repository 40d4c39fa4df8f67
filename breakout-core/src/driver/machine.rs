//! Breakout order driver state machine.
//!
//! The machine is a value: [`Machine::step`] takes an event and returns the
//! next machine plus the actions the caller must execute. Submissions are
//! bound back with [`Machine::bind`] once the broker has assigned an id.
//!
//! Transition table:
//!
//! | From          | Trigger     | Guard                         | Action             | To            |
//! |---------------|-------------|-------------------------------|--------------------|---------------|
//! | Idle          | Tick        | entry signal active           | submit entry       | Entry         |
//! | Entry         | OrderNotify | entry Completed               | submit protect     | StartProtect  |
//! | Entry         | Stop        | entry tracked                 | cancel entry       | CancelEntry   |
//! | Entry         | Stop        | no entry tracked              |                    | Idle          |
//! | CancelEntry   | OrderNotify | entry Cancelled               |                    | Idle          |
//! | CancelEntry   | OrderNotify | entry Completed               | submit close       | Close         |
//! | StartProtect  | OrderNotify | protect Completed             |                    | Idle          |
//! | StartProtect  | OrderNotify | protect Accepted              |                    | Protect       |
//! | StartProtect  | Stop        |                               | cancel protect     | CancelProtect |
//! | Protect       | OrderNotify | protect Cancelled             | resubmit protect   | StartProtect  |
//! | Protect       | OrderNotify | protect Completed             |                    | Idle          |
//! | Protect       | Tick        | close signal active           | cancel protect     | CancelProtect |
//! | Protect       | Tick        | protect price moved           | cancel protect     | CancelProtect |
//! | Protect       | Stop        |                               | cancel protect     | CancelProtect |
//! | CancelProtect | OrderNotify | protect Cancelled, unwinding  | submit close       | Close         |
//! | CancelProtect | OrderNotify | protect Cancelled, repricing  | resubmit protect   | StartProtect  |
//! | CancelProtect | OrderNotify | protect Completed             |                    | Idle          |
//! | Close         | OrderNotify | close Completed               |                    | Idle          |
//! | Close         | Stop        | no close tracked              | submit close       | Close         |
//!
//! Any other terminal status on a tracked order releases it and forces `Idle`.
//! Everything else is a no-op.
//!
//! A submission the broker refuses outright leaves the machine in the state
//! the edge led to with that role's slot empty. Only `Stop` moves it on from
//! there, so an open position is never mistaken for a flat one.

use super::action::Action;
use super::event::Event;
use super::state::DriverState;
use crate::config::{DriverConfig, EntryStyle};
use crate::domain::{OrderHandle, OrderId, OrderRole, OrderStatus};
use crate::signals::Signals;
use serde::{Deserialize, Serialize};

/// An order the machine owns, identified by broker id.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TrackedOrder {
    pub id: OrderId,
    pub role: OrderRole,
    /// Limit/stop price at submission.
    pub price: Option<f64>,
    /// Last status seen for this order.
    pub status: OrderStatus,
}

impl TrackedOrder {
    pub fn from_handle(role: OrderRole, handle: &OrderHandle) -> Self {
        Self {
            id: handle.id,
            role,
            price: handle.price(),
            status: handle.status,
        }
    }

    pub fn is_live(&self) -> bool {
        !self.status.is_terminal()
    }
}

/// Why the protective stop is being cancelled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CancelReason {
    /// Stop price moved; resubmit at the new price once cancelled.
    Reprice,
    /// Close or stop requested; flatten once cancelled.
    Unwind,
}

/// What a step did.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Outcome {
    /// A table row fired (possibly a self-loop).
    Transitioned,
    /// No row matched; the machine is unchanged apart from recorded order status.
    Ignored,
    /// A tracked order ended with a status no row handles; the machine was
    /// forced back to `Idle`.
    Recovered { role: OrderRole, status: OrderStatus },
}

/// Result of feeding one event to a [`Machine`].
#[derive(Debug, Clone)]
pub struct Step {
    pub from: DriverState,
    pub machine: Machine,
    pub actions: Vec<Action>,
    pub outcome: Outcome,
}

impl Step {
    pub fn to(&self) -> DriverState {
        self.machine.state()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Machine {
    state: DriverState,
    entry: Option<TrackedOrder>,
    protect: Option<TrackedOrder>,
    close: Option<TrackedOrder>,
    cancel_reason: Option<CancelReason>,
    /// Latest finite protect price delivered by a tick; NaN until one arrives.
    protect_price: f64,
    entry_style: EntryStyle,
    price_tolerance: f64,
}

impl Default for Machine {
    fn default() -> Self {
        Self::new(&DriverConfig::default())
    }
}

impl Machine {
    pub fn new(config: &DriverConfig) -> Self {
        Self {
            state: DriverState::Idle,
            entry: None,
            protect: None,
            close: None,
            cancel_reason: None,
            protect_price: f64::NAN,
            entry_style: config.entry_style,
            price_tolerance: config.price_tolerance,
        }
    }

    // ── Queries ────────────────────────────────────────────────────────

    pub fn state(&self) -> DriverState {
        self.state
    }

    pub fn tracked(&self, role: OrderRole) -> Option<&TrackedOrder> {
        self.slot(role).as_ref()
    }

    /// Tracked orders that have not reached a terminal status.
    pub fn live_count(&self) -> usize {
        [&self.entry, &self.protect, &self.close]
            .into_iter()
            .flatten()
            .filter(|o| o.is_live())
            .count()
    }

    pub fn protect_price(&self) -> f64 {
        self.protect_price
    }

    pub fn cancel_reason(&self) -> Option<CancelReason> {
        self.cancel_reason
    }

    // ── Transitions ────────────────────────────────────────────────────

    /// Compute the successor machine and the actions to execute for `event`.
    pub fn step(&self, event: &Event) -> Step {
        let mut next = self.clone();
        let (actions, outcome) = match event {
            Event::Tick(signals) => next.on_tick(signals),
            Event::OrderNotify(order) => next.on_notify(order),
            Event::Stop => next.on_stop(),
        };
        Step {
            from: self.state,
            machine: next,
            actions,
            outcome,
        }
    }

    /// Record the handle the broker returned for a submission of `role`.
    pub fn bind(&mut self, role: OrderRole, handle: &OrderHandle) {
        *self.slot_mut(role) = Some(TrackedOrder::from_handle(role, handle));
    }

    // ── Event handlers ─────────────────────────────────────────────────

    fn on_tick(&mut self, signals: &Signals) -> (Vec<Action>, Outcome) {
        let price_moved = self.protect_price_moved(signals.protect_price);
        if signals.protect_price.is_finite() {
            self.protect_price = signals.protect_price;
        }

        match self.state {
            DriverState::Idle => match signals.entry.entry_side() {
                Some(side) => {
                    let limit_price = match self.entry_style {
                        EntryStyle::Limit => signals.entry_price.filter(|p| p.is_finite()),
                        EntryStyle::Market => None,
                    };
                    self.state = DriverState::Entry;
                    (
                        vec![Action::SubmitEntry { side, limit_price }],
                        Outcome::Transitioned,
                    )
                }
                None => ignored(),
            },
            DriverState::Protect => {
                if signals.close.is_active() {
                    self.cancel_protect(CancelReason::Unwind)
                } else if price_moved {
                    self.cancel_protect(CancelReason::Reprice)
                } else {
                    ignored()
                }
            }
            // A cancel is already in flight: never issue a second one, but a
            // close request upgrades a re-price into an unwind.
            DriverState::CancelProtect => {
                if signals.close.is_active() && self.cancel_reason == Some(CancelReason::Reprice) {
                    self.cancel_reason = Some(CancelReason::Unwind);
                    (Vec::new(), Outcome::Transitioned)
                } else {
                    ignored()
                }
            }
            _ => ignored(),
        }
    }

    fn on_notify(&mut self, order: &OrderHandle) -> (Vec<Action>, Outcome) {
        let Some(role) = self.role_of(order.id) else {
            return ignored();
        };
        let Some(tracked) = self.slot_mut(role).as_mut() else {
            return ignored();
        };
        // duplicate or out-of-order delivery
        if !tracked.status.can_advance_to(order.status) {
            return ignored();
        }
        tracked.status = order.status;

        use DriverState as S;
        use OrderRole as R;
        use OrderStatus as St;

        match (self.state, role, order.status) {
            (S::Entry, R::Entry, St::Completed) => {
                self.release(R::Entry);
                self.state = S::StartProtect;
                (
                    vec![Action::SubmitProtect {
                        price: self.protect_price,
                    }],
                    Outcome::Transitioned,
                )
            }
            (S::CancelEntry, R::Entry, St::Cancelled) => {
                self.release(R::Entry);
                self.state = S::Idle;
                (Vec::new(), Outcome::Transitioned)
            }
            // the entry filled before the cancel landed: unwind it
            (S::CancelEntry, R::Entry, St::Completed) => {
                self.release(R::Entry);
                self.state = S::Close;
                (vec![Action::SubmitClose], Outcome::Transitioned)
            }
            (S::StartProtect, R::Protect, St::Accepted) => {
                self.state = S::Protect;
                (Vec::new(), Outcome::Transitioned)
            }
            (S::StartProtect | S::Protect | S::CancelProtect, R::Protect, St::Completed) => {
                self.release(R::Protect);
                self.cancel_reason = None;
                self.state = S::Idle;
                (Vec::new(), Outcome::Transitioned)
            }
            (S::Protect, R::Protect, St::Cancelled) => {
                self.release(R::Protect);
                self.state = S::StartProtect;
                (
                    vec![Action::SubmitProtect {
                        price: self.protect_price,
                    }],
                    Outcome::Transitioned,
                )
            }
            (S::CancelProtect, R::Protect, St::Cancelled) => {
                self.release(R::Protect);
                match self.cancel_reason.take().unwrap_or(CancelReason::Unwind) {
                    CancelReason::Unwind => {
                        self.state = S::Close;
                        (vec![Action::SubmitClose], Outcome::Transitioned)
                    }
                    CancelReason::Reprice => {
                        self.state = S::StartProtect;
                        (
                            vec![Action::SubmitProtect {
                                price: self.protect_price,
                            }],
                            Outcome::Transitioned,
                        )
                    }
                }
            }
            (S::Close, R::Close, St::Completed) => {
                self.release(R::Close);
                self.state = S::Idle;
                (Vec::new(), Outcome::Transitioned)
            }
            (_, _, status) if status.is_terminal() => {
                self.reset();
                (Vec::new(), Outcome::Recovered { role, status })
            }
            _ => ignored(),
        }
    }

    fn on_stop(&mut self) -> (Vec<Action>, Outcome) {
        match self.state {
            DriverState::Entry => match self.entry.as_ref() {
                Some(order) => {
                    let id = order.id;
                    self.state = DriverState::CancelEntry;
                    (
                        vec![Action::Cancel {
                            role: OrderRole::Entry,
                            id,
                        }],
                        Outcome::Transitioned,
                    )
                }
                None => {
                    self.reset();
                    (Vec::new(), Outcome::Transitioned)
                }
            },
            DriverState::StartProtect | DriverState::Protect => {
                self.cancel_protect(CancelReason::Unwind)
            }
            DriverState::CancelProtect if self.cancel_reason == Some(CancelReason::Reprice) => {
                self.cancel_reason = Some(CancelReason::Unwind);
                (Vec::new(), Outcome::Transitioned)
            }
            // the close was never accepted: ask again
            DriverState::Close if self.close.is_none() => {
                (vec![Action::SubmitClose], Outcome::Transitioned)
            }
            _ => ignored(),
        }
    }

    // ── Helpers ────────────────────────────────────────────────────────

    /// Request cancellation of the protective stop. Without a tracked stop the
    /// cancellation is already complete, so continue straight to the follow-up.
    fn cancel_protect(&mut self, reason: CancelReason) -> (Vec<Action>, Outcome) {
        match self.protect.as_ref() {
            Some(order) => {
                let id = order.id;
                self.state = DriverState::CancelProtect;
                self.cancel_reason = Some(reason);
                (
                    vec![Action::Cancel {
                        role: OrderRole::Protect,
                        id,
                    }],
                    Outcome::Transitioned,
                )
            }
            None => match reason {
                CancelReason::Unwind => {
                    self.state = DriverState::Close;
                    (vec![Action::SubmitClose], Outcome::Transitioned)
                }
                CancelReason::Reprice => {
                    self.state = DriverState::StartProtect;
                    (
                        vec![Action::SubmitProtect {
                            price: self.protect_price,
                        }],
                        Outcome::Transitioned,
                    )
                }
            },
        }
    }

    /// Whether `price` differs from the live stop's price. A non-finite price
    /// never counts as a move; a missing or undefined stop price always does.
    fn protect_price_moved(&self, price: f64) -> bool {
        if !price.is_finite() {
            return false;
        }
        match self.protect.as_ref().and_then(|o| o.price) {
            Some(current) if current.is_finite() => {
                (current - price).abs() > self.price_tolerance
            }
            _ => true,
        }
    }

    fn role_of(&self, id: OrderId) -> Option<OrderRole> {
        [&self.entry, &self.protect, &self.close]
            .into_iter()
            .flatten()
            .find(|o| o.id == id)
            .map(|o| o.role)
    }

    fn slot(&self, role: OrderRole) -> &Option<TrackedOrder> {
        match role {
            OrderRole::Entry => &self.entry,
            OrderRole::Protect => &self.protect,
            OrderRole::Close => &self.close,
        }
    }

    fn slot_mut(&mut self, role: OrderRole) -> &mut Option<TrackedOrder> {
        match role {
            OrderRole::Entry => &mut self.entry,
            OrderRole::Protect => &mut self.protect,
            OrderRole::Close => &mut self.close,
        }
    }

    fn release(&mut self, role: OrderRole) {
        *self.slot_mut(role) = None;
    }

    fn reset(&mut self) {
        self.entry = None;
        self.protect = None;
        self.close = None;
        self.cancel_reason = None;
        self.state = DriverState::Idle;
    }
}

fn ignored() -> (Vec<Action>, Outcome) {
    (Vec::new(), Outcome::Ignored)
}
