//! Order driver: feeds events to the machine and executes its actions
//! against a broker.

use super::action::Action;
use super::error::DriverError;
use super::event::{Event, EventKind};
use super::machine::{Machine, Outcome, Step};
use super::state::DriverState;
use crate::broker::{Broker, BrokerError};
use crate::config::{ConfigError, DriverConfig};
use crate::domain::{OrderHandle, OrderKind, OrderRole};
use crate::signals::Signals;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, trace, warn};

/// A step that changed the machine.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TransitionRecord {
    pub from: DriverState,
    pub to: DriverState,
    pub event: EventKind,
    pub outcome: Outcome,
}

/// Drives one logical trade at a time through entry, protection and close.
///
/// The driver owns its broker handle. Callers deliver one event at a time:
/// [`on_tick`](Self::on_tick) once per bar, [`on_order_notify`](Self::on_order_notify)
/// once per broker status change, [`on_stop`](Self::on_stop) to unwind.
pub struct OrderDriver<B> {
    machine: Machine,
    broker: B,
    config: DriverConfig,
    history: Vec<TransitionRecord>,
}

impl<B: Broker> OrderDriver<B> {
    pub fn new(broker: B, config: DriverConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            machine: Machine::new(&config),
            broker,
            config,
            history: Vec::new(),
        })
    }

    pub fn with_defaults(broker: B) -> Self {
        let config = DriverConfig::default();
        Self {
            machine: Machine::new(&config),
            broker,
            config,
            history: Vec::new(),
        }
    }

    // ── Entry points ───────────────────────────────────────────────────

    pub fn on_tick(&mut self, signals: Signals) -> Result<DriverState, DriverError> {
        self.handle(Event::Tick(signals))
    }

    pub fn on_order_notify(&mut self, order: &OrderHandle) -> Result<DriverState, DriverError> {
        self.handle(Event::OrderNotify(order.clone()))
    }

    pub fn on_stop(&mut self) -> Result<DriverState, DriverError> {
        self.handle(Event::Stop)
    }

    /// Process one event to completion.
    ///
    /// Every action of the step is attempted even if an earlier one failed;
    /// the first failure is returned.
    pub fn handle(&mut self, event: Event) -> Result<DriverState, DriverError> {
        let kind = event.kind();
        let step = self.machine.step(&event);
        self.record(&step, kind);

        let Step {
            machine, actions, ..
        } = step;
        self.machine = machine;

        let mut result = Ok(());
        for action in actions {
            if let Err(err) = self.execute(action, kind) {
                if result.is_ok() {
                    result = Err(err);
                }
            }
        }
        result.map(|()| self.state())
    }

    // ── Accessors ──────────────────────────────────────────────────────

    pub fn state(&self) -> DriverState {
        self.machine.state()
    }

    pub fn machine(&self) -> &Machine {
        &self.machine
    }

    pub fn config(&self) -> &DriverConfig {
        &self.config
    }

    pub fn broker(&self) -> &B {
        &self.broker
    }

    pub fn broker_mut(&mut self) -> &mut B {
        &mut self.broker
    }

    pub fn into_broker(self) -> B {
        self.broker
    }

    /// Every step that was not ignored, in order.
    pub fn history(&self) -> &[TransitionRecord] {
        &self.history
    }

    // ── Internal helpers ───────────────────────────────────────────────

    fn execute(&mut self, action: Action, event: EventKind) -> Result<(), DriverError> {
        match action {
            Action::SubmitEntry { side, limit_price } => {
                let kind = match limit_price {
                    Some(price) => OrderKind::Limit { price },
                    None => OrderKind::Market,
                };
                let result = self.broker.submit(side, kind, self.config.entry_size);
                self.bind_submitted(OrderRole::Entry, result, event)
            }
            Action::SubmitProtect { price } => {
                let position = self.broker.position();
                let result = match position.closing_side() {
                    Some(side) => {
                        self.broker
                            .submit(side, OrderKind::Stop { price }, position.size.abs())
                    }
                    None => Err(BrokerError::NoPosition),
                };
                self.bind_submitted(OrderRole::Protect, result, event)
            }
            Action::SubmitClose => {
                let result = self.broker.close();
                self.bind_submitted(OrderRole::Close, result, event)
            }
            Action::Cancel { role, id } => self.broker.cancel(id).map_err(|source| {
                warn!(%role, %id, error = %source, "cancel request failed");
                DriverError::Cancel { role, id, source }
            }),
        }
    }

    fn bind_submitted(
        &mut self,
        role: OrderRole,
        result: Result<OrderHandle, BrokerError>,
        event: EventKind,
    ) -> Result<(), DriverError> {
        match result {
            Ok(handle) => {
                debug!(
                    %role,
                    id = %handle.id,
                    side = ?handle.side,
                    kind = ?handle.kind,
                    size = handle.size,
                    "order submitted"
                );
                self.machine.bind(role, &handle);
                Ok(())
            }
            Err(source) => {
                warn!(
                    %role,
                    state = %self.state(),
                    ?event,
                    error = %source,
                    "submission failed, slot left empty"
                );
                Err(DriverError::Submission { role, source })
            }
        }
    }

    fn record(&mut self, step: &Step, event: EventKind) {
        let to = step.to();
        match step.outcome {
            Outcome::Ignored => {
                trace!(state = %step.from, ?event, "event ignored");
                return;
            }
            Outcome::Transitioned => {
                debug!(from = %step.from, %to, ?event, actions = step.actions.len(), "driver transition");
                if to == DriverState::Idle && step.from != DriverState::Idle {
                    info!(from = %step.from, "trade cycle complete");
                }
            }
            Outcome::Recovered { role, status } => {
                warn!(
                    from = %step.from,
                    %role,
                    status = ?status,
                    "tracked order ended unexpectedly, driver reset to idle"
                );
            }
        }
        self.history.push(TransitionRecord {
            from: step.from,
            to,
            event,
            outcome: step.outcome,
        });
    }
}
