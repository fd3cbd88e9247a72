//! Order notifications
//!
//! Listeners subscribe to a single [`Order`] and are called synchronously,
//! in subscription order, from inside the mutator that caused the event.
//! They only ever see `&Order`, so a listener cannot mutate the order that
//! is notifying it.

use crossbeam_channel::{Receiver, Sender, TrySendError};
use meridian_core::Execution;
use std::fmt;

use crate::order::Order;
use crate::record::OrderRecord;

/// Callbacks fired by order mutators
///
/// All methods default to no-ops; implement the ones you care about.
pub trait OrderListener {
    /// Remaining quantity reached zero
    fn on_order_filled(&mut self, _order: &Order) {}

    /// A fill left quantity outstanding
    fn on_partial_fill(&mut self, _order: &Order) {}

    /// Any execution was applied, including overfills
    fn on_execution(&mut self, _order: &Order, _execution: &Execution) {}

    /// Commission was set
    fn on_commission(&mut self, _order: &Order) {}
}

/// Handle returned by [`Order::subscribe`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(pub(crate) u64);

impl fmt::Display for ListenerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "listener-{}", self.0)
    }
}

/// Owned snapshot of an order notification
#[derive(Debug, Clone, PartialEq)]
pub enum OrderEvent {
    Filled(OrderRecord),
    PartialFill(OrderRecord),
    Execution {
        order: OrderRecord,
        execution: Execution,
    },
    Commission(OrderRecord),
}

impl OrderEvent {
    /// The order as it was when the event fired
    pub fn order(&self) -> &OrderRecord {
        match self {
            OrderEvent::Filled(order)
            | OrderEvent::PartialFill(order)
            | OrderEvent::Commission(order) => order,
            OrderEvent::Execution { order, .. } => order,
        }
    }
}

/// Listener that forwards snapshots into a crossbeam channel
///
/// For callers that would rather drain events later, or on another
/// thread, than react inside the order mutator. A full or disconnected
/// channel drops the event with a warning; the order is never blocked.
pub struct ChannelListener {
    sender: Sender<OrderEvent>,
}

impl ChannelListener {
    pub fn new(sender: Sender<OrderEvent>) -> Self {
        Self { sender }
    }

    pub fn unbounded() -> (Self, Receiver<OrderEvent>) {
        let (sender, receiver) = crossbeam_channel::unbounded();
        (Self::new(sender), receiver)
    }

    pub fn bounded(capacity: usize) -> (Self, Receiver<OrderEvent>) {
        let (sender, receiver) = crossbeam_channel::bounded(capacity);
        (Self::new(sender), receiver)
    }

    fn forward(&self, event: OrderEvent) {
        match self.sender.try_send(event) {
            Ok(()) => {}
            Err(TrySendError::Full(event)) => {
                log::warn!(
                    "ChannelListener: channel full, dropping event for order {}",
                    event.order().order_id
                );
            }
            Err(TrySendError::Disconnected(event)) => {
                log::debug!(
                    "ChannelListener: receiver gone, dropping event for order {}",
                    event.order().order_id
                );
            }
        }
    }
}

impl OrderListener for ChannelListener {
    fn on_order_filled(&mut self, order: &Order) {
        self.forward(OrderEvent::Filled(order.to_record()));
    }

    fn on_partial_fill(&mut self, order: &Order) {
        self.forward(OrderEvent::PartialFill(order.to_record()));
    }

    fn on_execution(&mut self, order: &Order, execution: &Execution) {
        self.forward(OrderEvent::Execution {
            order: order.to_record(),
            execution: execution.clone(),
        });
    }

    fn on_commission(&mut self, order: &Order) {
        self.forward(OrderEvent::Commission(order.to_record()));
    }
}
