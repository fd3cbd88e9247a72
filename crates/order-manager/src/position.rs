//! Position aggregate
//!
//! A position owns the orders placed for one instrument and routes
//! provider callbacks to them by [`OrderId`]. Every execution an order
//! accepts is also booked against the position's net holding, including
//! overfills: the venue traded that quantity whether or not the order
//! expected it.

use meridian_core::{
    Execution, InstrumentId, OrderErrorKind, OrderId, OrderStatus, PositionId, Price, Quantity,
    Side,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{OrderError, Result};
use crate::order::Order;

/// Local handle to an order inside a [`Position`]
///
/// Valid from the moment the order is added, before the provider has
/// assigned an [`OrderId`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct OrderKey(usize);

impl fmt::Display for OrderKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "order-key-{}", self.0)
    }
}

/// Net holding built from executions
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Holding {
    /// Signed quantity: positive long, negative short
    pub quantity: Quantity,
    /// Average entry price of the open quantity
    pub average_price: Price,
    pub realized_pnl: Decimal,
    pub fill_count: u64,
    /// Absolute quantity traded
    pub volume: Quantity,
}

impl Holding {
    /// Book one fill, returning the PnL it realized
    pub fn apply_fill(&mut self, side: Side, size: Quantity, price: Price) -> Decimal {
        let signed = side.sign() * size;
        let before = self.quantity;
        let after = before + signed;

        let reducing = !before.is_zero() && before.is_sign_positive() != signed.is_sign_positive();
        let realized = if reducing {
            let closed = size.min(before.abs());
            if before > Decimal::ZERO {
                closed * (price - self.average_price)
            } else {
                closed * (self.average_price - price)
            }
        } else {
            Decimal::ZERO
        };

        if after.is_zero() {
            self.average_price = Decimal::ZERO;
        } else if !reducing {
            self.average_price = (before.abs() * self.average_price + size * price) / after.abs();
        } else if after.is_sign_positive() != before.is_sign_positive() {
            // flipped through flat; the remainder opened at this price
            self.average_price = price;
        }

        self.quantity = after;
        self.realized_pnl += realized;
        self.fill_count += 1;
        self.volume += size;
        realized
    }

    pub fn unrealized_pnl(&self, mark: Price) -> Decimal {
        self.quantity * (mark - self.average_price)
    }

    pub fn is_flat(&self) -> bool {
        self.quantity.is_zero()
    }
}

pub struct Position {
    id: PositionId,
    instrument: InstrumentId,
    /// Arena indexed by `OrderKey`; orders are never removed
    orders: Vec<Order>,
    holding: Holding,
}

impl Position {
    pub fn new(id: PositionId, instrument: impl Into<InstrumentId>) -> Self {
        Self {
            id,
            instrument: instrument.into(),
            orders: Vec::new(),
            holding: Holding::default(),
        }
    }

    pub fn id(&self) -> PositionId {
        self.id
    }

    pub fn instrument(&self) -> &InstrumentId {
        &self.instrument
    }

    /// Take ownership of an order for this position's instrument
    pub fn add_order(&mut self, mut order: Order) -> Result<OrderKey> {
        if order.instrument() != &self.instrument {
            return Err(OrderError::InstrumentMismatch {
                expected: self.instrument.clone(),
                actual: order.instrument().clone(),
            });
        }
        if !order.id().is_none() && self.find(order.id()).is_some() {
            return Err(OrderError::DuplicateOrderId(order.id()));
        }
        order.assign_position(self.id);
        let key = OrderKey(self.orders.len());
        log::debug!(
            "[position {}] added {:?} {} {} as {}",
            self.id,
            order.side(),
            order.quantity(),
            self.instrument,
            key
        );
        self.orders.push(order);
        Ok(key)
    }

    pub fn order(&self, key: OrderKey) -> Option<&Order> {
        self.orders.get(key.0)
    }

    /// Mutable access for lifecycle calls such as sending or subscribing
    ///
    /// Assign provider ids through [`Position::set_order_id`] so they stay
    /// unique within the position.
    pub fn order_mut(&mut self, key: OrderKey) -> Option<&mut Order> {
        self.orders.get_mut(key.0)
    }

    pub fn order_by_id(&self, id: OrderId) -> Option<&Order> {
        self.find(id).map(|index| &self.orders[index])
    }

    pub fn orders(&self) -> impl Iterator<Item = &Order> {
        self.orders.iter()
    }

    /// Orders that have not reached a terminal status
    pub fn working_orders(&self) -> impl Iterator<Item = &Order> {
        self.orders.iter().filter(|o| !o.is_terminal())
    }

    fn find(&self, id: OrderId) -> Option<usize> {
        if id.is_none() {
            return None;
        }
        self.orders.iter().position(|o| o.id() == id)
    }

    fn find_mut(&mut self, id: OrderId) -> Result<&mut Order> {
        match self.find(id) {
            Some(index) => Ok(&mut self.orders[index]),
            None => {
                log::warn!("[position {}] no order with id {}", self.id, id);
                Err(OrderError::UnknownOrder(id))
            }
        }
    }

    pub fn set_order_id(&mut self, key: OrderKey, id: OrderId) -> Result<()> {
        if self.find(id).is_some() {
            return Err(OrderError::DuplicateOrderId(id));
        }
        let order = self
            .orders
            .get_mut(key.0)
            .ok_or(OrderError::UnknownOrder(id))?;
        order.set_order_id(id)
    }

    /// Route an execution to its order and book it against the holding
    pub fn report_execution(&mut self, execution: &Execution) -> Result<OrderStatus> {
        let status = self.find_mut(execution.order_id)?.report_execution(execution)?;
        let realized = self
            .holding
            .apply_fill(execution.side, execution.size, execution.price);
        log::debug!(
            "[position {}] {:?} {} @ {} -> net {} (realized {})",
            self.id,
            execution.side,
            execution.size,
            execution.price,
            self.holding.quantity,
            realized
        );
        Ok(status)
    }

    pub fn act_on_error(&mut self, id: OrderId, kind: OrderErrorKind) -> Result<OrderStatus> {
        Ok(self.find_mut(id)?.act_on_error(kind))
    }

    pub fn set_commission(&mut self, id: OrderId, commission: Decimal) -> Result<()> {
        self.find_mut(id)?.set_commission(commission);
        Ok(())
    }

    pub fn holding(&self) -> &Holding {
        &self.holding
    }

    pub fn net_quantity(&self) -> Quantity {
        self.holding.quantity
    }

    pub fn average_price(&self) -> Price {
        self.holding.average_price
    }

    pub fn realized_pnl(&self) -> Decimal {
        self.holding.realized_pnl
    }

    pub fn unrealized_pnl(&self, mark: Price) -> Decimal {
        self.holding.unrealized_pnl(mark)
    }

    /// Commission across every order in the position
    pub fn total_commission(&self) -> Decimal {
        self.orders.iter().map(Order::commission).sum()
    }

    /// Realized plus unrealized PnL, net of commission
    pub fn net_pnl(&self, mark: Price) -> Decimal {
        self.realized_pnl() + self.unrealized_pnl(mark) - self.total_commission()
    }
}

impl fmt::Debug for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Position")
            .field("id", &self.id)
            .field("instrument", &self.instrument)
            .field("orders", &self.orders.len())
            .field("holding", &self.holding)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_holding_long_round_trip() {
        let mut holding = Holding::default();

        assert_eq!(holding.apply_fill(Side::Buy, dec!(1), dec!(100)), dec!(0));
        assert_eq!(holding.apply_fill(Side::Buy, dec!(1), dec!(110)), dec!(0));
        assert_eq!(holding.quantity, dec!(2));
        assert_eq!(holding.average_price, dec!(105));

        assert_eq!(holding.apply_fill(Side::Sell, dec!(1), dec!(120)), dec!(15));
        assert_eq!(holding.quantity, dec!(1));
        assert_eq!(holding.average_price, dec!(105));
        assert_eq!(holding.unrealized_pnl(dec!(130)), dec!(25));
    }

    #[test]
    fn test_holding_short_cover() {
        let mut holding = Holding::default();
        holding.apply_fill(Side::Sell, dec!(2), dec!(100));
        assert_eq!(holding.quantity, dec!(-2));
        assert_eq!(holding.unrealized_pnl(dec!(95)), dec!(10));

        assert_eq!(holding.apply_fill(Side::Buy, dec!(2), dec!(90)), dec!(20));
        assert!(holding.is_flat());
        assert_eq!(holding.average_price, dec!(0));
    }

    #[test]
    fn test_holding_flip_resets_entry_price() {
        let mut holding = Holding::default();
        holding.apply_fill(Side::Buy, dec!(1), dec!(100));
        let realized = holding.apply_fill(Side::Sell, dec!(3), dec!(104));
        assert_eq!(realized, dec!(4));
        assert_eq!(holding.quantity, dec!(-2));
        assert_eq!(holding.average_price, dec!(104));
        assert_eq!(holding.volume, dec!(4));
        assert_eq!(holding.fill_count, 2);
    }
}
