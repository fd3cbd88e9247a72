//! Order Lifecycle State Machine
//!
//! ```text
//!  Created ──► SendingToProvider ──► Submitted ──► Filling ──► Filled ──► OverFilled
//!                    │    │              │            │
//!                    │    └► PreSubmission            │
//!                    ▼                   ▼            ▼
//!                 Rejected        CancelSubmitted ──► Cancelled
//!                                        │               │
//!                                        └──► FillingDuringCancel ◄┘
//! ```
//!
//! Status and quantities only change through the mutators on [`Order`].
//! Terminal statuses (Filled, Cancelled, CancelledWithPartialFill,
//! Rejected, OverFilled) are left only when an execution arrives after the
//! fact: a fill on a Filled order marks it OverFilled, a fill racing a
//! confirmed cancel marks it FillingDuringCancel, or Filled if it completes
//! the order. Rejected never changes; fills against it are booked and
//! logged.

use meridian_core::{
    Execution, InstrumentId, OrderErrorKind, OrderId, OrderStatus, OrderType, PositionId, Price,
    Quantity, Side, Timestamp,
};
use meridian_ports::Clock;
use rust_decimal::Decimal;
use std::fmt;
use std::sync::Arc;

use crate::error::{OrderError, Result};
use crate::events::{ListenerId, OrderListener};
use crate::record::OrderRecord;

struct Subscription {
    id: ListenerId,
    listener: Box<dyn OrderListener + Send>,
}

#[derive(Clone, Copy)]
enum Notification<'a> {
    Filled,
    PartialFill,
    Execution(&'a Execution),
    Commission,
}

pub struct Order {
    id: OrderId,
    position_id: Option<PositionId>,
    instrument: InstrumentId,
    description: String,
    status: OrderStatus,
    order_type: OrderType,
    side: Side,
    price1: Option<Price>,
    price2: Option<Price>,
    signal_price: Option<Price>,
    outside_rth: bool,
    requested: Quantity,
    remaining: Quantity,
    filled: Quantity,
    /// Sum of price × size over accepted fills
    price_x_quantity: Decimal,
    average_fill_price: Price,
    commission: Decimal,
    created_at: Timestamp,
    submitted_at: Option<Timestamp>,
    closed_at: Option<Timestamp>,
    clock: Arc<dyn Clock>,
    listeners: Vec<Subscription>,
    next_listener: u64,
}

impl Order {
    pub fn new(
        instrument: impl Into<InstrumentId>,
        order_type: OrderType,
        side: Side,
        quantity: Quantity,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let created_at = clock.now();
        Self {
            id: OrderId::NONE,
            position_id: None,
            instrument: instrument.into(),
            description: String::new(),
            status: OrderStatus::Created,
            order_type,
            side,
            price1: None,
            price2: None,
            signal_price: None,
            outside_rth: false,
            requested: quantity,
            remaining: quantity,
            filled: Decimal::ZERO,
            price_x_quantity: Decimal::ZERO,
            average_fill_price: Decimal::ZERO,
            commission: Decimal::ZERO,
            created_at,
            submitted_at: None,
            closed_at: None,
            clock,
            listeners: Vec::new(),
            next_listener: 0,
        }
    }

    pub fn market(
        instrument: impl Into<InstrumentId>,
        side: Side,
        quantity: Quantity,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self::new(instrument, OrderType::Market, side, quantity, clock)
    }

    pub fn limit(
        instrument: impl Into<InstrumentId>,
        side: Side,
        quantity: Quantity,
        price: Price,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self::new(instrument, OrderType::Limit, side, quantity, clock).with_price1(price)
    }

    /// Rebuild an order from a stored record
    ///
    /// Listeners are not part of the record; subscribe again after loading.
    pub fn from_record(record: OrderRecord, clock: Arc<dyn Clock>) -> Self {
        Self {
            id: record.order_id,
            position_id: record.position_id,
            instrument: record.instrument_id,
            description: record.description,
            status: record.status,
            order_type: record.order_type,
            side: record.side,
            price1: record.price1,
            price2: record.price2,
            signal_price: record.signal_price,
            outside_rth: record.outside_rth,
            requested: record.quantity_ordered,
            remaining: record.quantity_remaining,
            filled: record.quantity_filled,
            price_x_quantity: record.average_fill_price * record.quantity_filled,
            average_fill_price: record.average_fill_price,
            commission: record.commission,
            created_at: record.created_at,
            submitted_at: record.submitted_at,
            closed_at: record.closed_at,
            clock,
            listeners: Vec::new(),
            next_listener: 0,
        }
    }

    pub fn to_record(&self) -> OrderRecord {
        OrderRecord {
            order_id: self.id,
            position_id: self.position_id,
            instrument_id: self.instrument.clone(),
            description: self.description.clone(),
            status: self.status,
            order_type: self.order_type,
            side: self.side,
            price1: self.price1,
            price2: self.price2,
            signal_price: self.signal_price,
            outside_rth: self.outside_rth,
            quantity_ordered: self.requested,
            quantity_remaining: self.remaining,
            quantity_filled: self.filled,
            average_fill_price: self.average_fill_price,
            commission: self.commission,
            created_at: self.created_at,
            submitted_at: self.submitted_at,
            closed_at: self.closed_at,
        }
    }

    // Builders, for use before the order is sent

    /// Limit price, or stop price for Stop orders
    pub fn with_price1(mut self, price: Price) -> Self {
        self.price1 = Some(price);
        self
    }

    /// Limit price of a StopLimit, or trail amount
    pub fn with_price2(mut self, price: Price) -> Self {
        self.price2 = Some(price);
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Market price observed when the strategy decided to trade
    pub fn with_signal_price(mut self, price: Price) -> Self {
        self.signal_price = Some(price);
        self
    }

    pub fn with_position(mut self, position_id: PositionId) -> Self {
        self.position_id = Some(position_id);
        self
    }

    pub fn with_outside_rth(mut self, outside_rth: bool) -> Self {
        self.outside_rth = outside_rth;
        self
    }

    // Accessors

    pub fn id(&self) -> OrderId {
        self.id
    }

    pub fn position_id(&self) -> Option<PositionId> {
        self.position_id
    }

    pub fn instrument(&self) -> &InstrumentId {
        &self.instrument
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn status(&self) -> OrderStatus {
        self.status
    }

    pub fn order_type(&self) -> OrderType {
        self.order_type
    }

    pub fn side(&self) -> Side {
        self.side
    }

    pub fn price1(&self) -> Option<Price> {
        self.price1
    }

    pub fn price2(&self) -> Option<Price> {
        self.price2
    }

    pub fn signal_price(&self) -> Option<Price> {
        self.signal_price
    }

    pub fn outside_rth(&self) -> bool {
        self.outside_rth
    }

    pub fn quantity(&self) -> Quantity {
        self.requested
    }

    /// Negative once the order has been overfilled
    pub fn remaining(&self) -> Quantity {
        self.remaining
    }

    pub fn filled(&self) -> Quantity {
        self.filled
    }

    /// Volume-weighted price over accepted fills; zero before the first fill
    pub fn average_fill_price(&self) -> Price {
        self.average_fill_price
    }

    pub fn commission(&self) -> Decimal {
        self.commission
    }

    pub fn created_at(&self) -> Timestamp {
        self.created_at
    }

    pub fn submitted_at(&self) -> Option<Timestamp> {
        self.submitted_at
    }

    pub fn closed_at(&self) -> Option<Timestamp> {
        self.closed_at
    }

    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }

    // Listeners

    pub fn subscribe(&mut self, listener: Box<dyn OrderListener + Send>) -> ListenerId {
        let id = ListenerId(self.next_listener);
        self.next_listener += 1;
        self.listeners.push(Subscription { id, listener });
        id
    }

    /// Returns false if the id was not subscribed
    pub fn unsubscribe(&mut self, id: ListenerId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|s| s.id != id);
        self.listeners.len() != before
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }

    fn notify(&mut self, notification: Notification<'_>) {
        if self.listeners.is_empty() {
            return;
        }
        let mut listeners = std::mem::take(&mut self.listeners);
        for subscription in listeners.iter_mut() {
            let listener = &mut subscription.listener;
            match notification {
                Notification::Filled => listener.on_order_filled(self),
                Notification::PartialFill => listener.on_partial_fill(self),
                Notification::Execution(execution) => listener.on_execution(self, execution),
                Notification::Commission => listener.on_commission(self),
            }
        }
        self.listeners = listeners;
    }

    fn invalid_transition(&self, operation: &'static str) -> OrderError {
        let err = OrderError::InvalidTransition {
            order_id: self.id,
            from: self.status,
            operation,
        };
        log::error!("[{} #{}] {}", self.instrument, self.id, err);
        err
    }

    // Mutators

    /// Hand the order to the provider; only legal from Created
    pub fn set_sending_to_provider(&mut self) -> Result<()> {
        if self.status != OrderStatus::Created {
            return Err(self.invalid_transition("send to provider"));
        }
        self.status = OrderStatus::SendingToProvider;
        self.submitted_at = Some(self.clock.now());
        log::debug!("[{} #{}] sending to provider", self.instrument, self.id);
        Ok(())
    }

    /// Provider is holding the order before releasing it to the venue
    pub fn set_pre_submission(&mut self) -> Result<()> {
        if self.status != OrderStatus::SendingToProvider {
            return Err(self.invalid_transition("mark pre-submission"));
        }
        self.status = OrderStatus::PreSubmission;
        Ok(())
    }

    /// Provider acknowledged the order as working
    pub fn set_submitted(&mut self) -> Result<()> {
        match self.status {
            OrderStatus::SendingToProvider | OrderStatus::PreSubmission => {
                self.status = OrderStatus::Submitted;
                log::debug!("[{} #{}] submitted", self.instrument, self.id);
                Ok(())
            }
            _ => Err(self.invalid_transition("mark submitted")),
        }
    }

    /// A cancel request for this order is in flight
    pub fn set_cancel_submitted(&mut self) -> Result<()> {
        if !self.status.is_active() {
            return Err(self.invalid_transition("submit cancel"));
        }
        self.status = OrderStatus::CancelSubmitted;
        log::debug!("[{} #{}] cancel submitted", self.instrument, self.id);
        Ok(())
    }

    /// Apply a provider fill and return the resulting status
    ///
    /// Overfills are recorded, not rejected: the order moves to OverFilled
    /// and keeps the raw quantities so the anomaly stays visible. The order
    /// cannot tell a replayed execution from a new one; each report is
    /// applied as it comes.
    ///
    /// Terminal statuses move only along the fill races a provider can
    /// produce: Filled to OverFilled, and Cancelled or
    /// CancelledWithPartialFill to FillingDuringCancel, or to Filled when
    /// the late fill completes the order. A Rejected order books the fill
    /// but stays Rejected.
    pub fn report_execution(&mut self, execution: &Execution) -> Result<OrderStatus> {
        if execution.side != self.side {
            let err = OrderError::SideMismatch {
                order: self.side,
                execution: execution.side,
            };
            log::error!("[{} #{}] {}", self.instrument, self.id, err);
            return Err(err);
        }

        let mut overfilled = false;
        if self.remaining <= Decimal::ZERO {
            log::warn!(
                "[{} #{}] overfilled with +{} after completion",
                self.instrument,
                self.id,
                execution.size
            );
            self.status = OrderStatus::OverFilled;
            overfilled = true;
        } else {
            self.remaining -= execution.size;
            self.filled += execution.size;
            if self.filled > self.requested {
                log::warn!(
                    "[{} #{}] overfilled with +{}: filled {} of {}",
                    self.instrument,
                    self.id,
                    execution.size,
                    self.filled,
                    self.requested
                );
                self.status = OrderStatus::OverFilled;
                overfilled = true;
            }
        }

        if !overfilled {
            self.price_x_quantity += execution.price * execution.size;
            if !self.filled.is_zero() {
                self.average_fill_price = self.price_x_quantity / self.filled;
            }

            if self.remaining.is_zero() && self.status == OrderStatus::Rejected {
                log::warn!(
                    "[{} #{}] fill completes a rejected order, status kept",
                    self.instrument,
                    self.id
                );
            } else if self.remaining.is_zero() {
                self.status = OrderStatus::Filled;
                self.closed_at = Some(self.clock.now());
                log::debug!(
                    "[{} #{}] filled {} @ {}",
                    self.instrument,
                    self.id,
                    self.filled,
                    self.average_fill_price
                );
                self.notify(Notification::Filled);
            } else {
                self.status = match self.status {
                    OrderStatus::SendingToProvider
                    | OrderStatus::Submitted
                    | OrderStatus::Filling
                    | OrderStatus::PreSubmission => OrderStatus::Filling,
                    OrderStatus::Cancelled
                    | OrderStatus::CancelSubmitted
                    | OrderStatus::FillingDuringCancel
                    | OrderStatus::CancelledWithPartialFill => OrderStatus::FillingDuringCancel,
                    OrderStatus::OverFilled => OrderStatus::OverFilled,
                    other => {
                        log::warn!(
                            "[{} #{}] partial fill in unexpected status {:?}",
                            self.instrument,
                            self.id,
                            other
                        );
                        other
                    }
                };
                self.notify(Notification::PartialFill);
            }
        }

        self.notify(Notification::Execution(execution));
        Ok(self.status)
    }

    /// Apply a provider error code and return the resulting status
    ///
    /// Terminal orders keep their status.
    pub fn act_on_error(&mut self, kind: OrderErrorKind) -> OrderStatus {
        let next = match kind {
            OrderErrorKind::Cancelled => OrderStatus::Cancelled,
            OrderErrorKind::Rejected | OrderErrorKind::InstrumentNotFound => OrderStatus::Rejected,
            OrderErrorKind::NotCancellable => {
                log::info!(
                    "[{} #{}] cancel refused, order stays {:?}",
                    self.instrument,
                    self.id,
                    self.status
                );
                return self.status;
            }
        };

        if self.status.is_terminal() {
            log::warn!(
                "[{} #{}] ignoring {:?} on terminal status {:?}",
                self.instrument,
                self.id,
                kind,
                self.status
            );
            return self.status;
        }

        self.status = next;
        self.closed_at = Some(self.clock.now());
        log::info!("[{} #{}] {:?} by provider", self.instrument, self.id, next);
        self.status
    }

    /// Replace the commission charged so far; legal in any status
    pub fn set_commission(&mut self, commission: Decimal) {
        self.commission = commission;
        self.notify(Notification::Commission);
    }

    /// Record the provider-assigned id; allowed exactly once
    pub fn set_order_id(&mut self, id: OrderId) -> Result<()> {
        if id.is_none() {
            let err = OrderError::InvalidOrderId(id);
            log::error!("[{} #{}] {}", self.instrument, self.id, err);
            return Err(err);
        }
        if !self.id.is_none() {
            let err = OrderError::IdAlreadyAssigned {
                current: self.id,
                attempted: id,
            };
            log::error!("[{} #{}] {}", self.instrument, self.id, err);
            return Err(err);
        }
        self.id = id;
        Ok(())
    }

    pub(crate) fn assign_position(&mut self, position_id: PositionId) {
        self.position_id = Some(position_id);
    }
}

impl fmt::Debug for Order {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Order")
            .field("id", &self.id)
            .field("instrument", &self.instrument)
            .field("status", &self.status)
            .field("order_type", &self.order_type)
            .field("side", &self.side)
            .field("requested", &self.requested)
            .field("filled", &self.filled)
            .field("remaining", &self.remaining)
            .field("average_fill_price", &self.average_fill_price)
            .field("clock", &self.clock.name())
            .field("listeners", &self.listeners.len())
            .finish()
    }
}
