//! Order totals, derived on every read and never stored.

use serde::Serialize;
use store::{LineItem, Money, Order, StoreError};

use crate::error::DomainError;

/// Sums `unit_price * quantity` over the snapshot prices of `items`.
///
/// Returns `None` if the total does not fit in [`Money`].
pub fn order_total(items: &[LineItem]) -> Option<Money> {
    checked_total(items.iter().map(|item| (item.unit_price, item.quantity)))
}

pub(crate) fn checked_total(lines: impl IntoIterator<Item = (Money, u32)>) -> Option<Money> {
    lines
        .into_iter()
        .try_fold(Money::zero(), |total, (price, quantity)| {
            total.checked_add(price.checked_multiply(quantity)?)
        })
}

/// An order as returned to clients, with its computed total.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PricedOrder {
    #[serde(flatten)]
    pub order: Order,
    pub total: Money,
}

impl TryFrom<Order> for PricedOrder {
    type Error = DomainError;

    /// Fails only for a stored order whose total overflows, which order
    /// assembly never produces.
    fn try_from(order: Order) -> Result<Self, Self::Error> {
        let total = order_total(&order.items).ok_or_else(|| {
            DomainError::Store(StoreError::Corrupt(format!(
                "order {} total overflows",
                order.id
            )))
        })?;
        Ok(Self { order, total })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use store::{LineItemId, OrderId, ProductId};

    fn item(price: i64, quantity: u32) -> LineItem {
        LineItem {
            id: LineItemId::new(),
            order_id: OrderId::new(),
            product_id: ProductId::new(),
            quantity,
            unit_price: Money::from_cents(price),
        }
    }

    #[test]
    fn total_of_no_items_is_zero() {
        assert_eq!(order_total(&[]), Some(Money::zero()));
    }

    #[test]
    fn total_sums_price_times_quantity() {
        let items = [item(1000, 3), item(250, 2), item(1, 1)];
        assert_eq!(order_total(&items), Some(Money::from_cents(3501)));
    }

    #[test]
    fn overflowing_total_is_none() {
        assert_eq!(order_total(&[item(i64::MAX / 2, 3)]), None);
        assert_eq!(order_total(&[item(i64::MAX / 2, 2), item(2, 1)]), None);
    }

    #[test]
    fn priced_order_with_overflowing_total_is_an_error() {
        let now = chrono::Utc::now();
        let order = Order {
            id: OrderId::new(),
            user_id: store::UserId::new(),
            status: Default::default(),
            items: vec![item(i64::MAX / 2, 3)],
            created_at: now,
            updated_at: now,
        };

        let err = PricedOrder::try_from(order).unwrap_err();
        assert!(matches!(err, DomainError::Store(StoreError::Corrupt(_))));
    }

    #[test]
    fn priced_order_serializes_total_next_to_order_fields() {
        let now = chrono::Utc::now();
        let order = Order {
            id: OrderId::new(),
            user_id: store::UserId::new(),
            status: Default::default(),
            items: vec![item(500, 2)],
            created_at: now,
            updated_at: now,
        };

        let json = serde_json::to_value(PricedOrder::try_from(order).unwrap()).unwrap();
        assert_eq!(json["total"], 1000);
        assert_eq!(json["status"], "PENDING");
        assert_eq!(json["orderItems"][0]["unitPrice"], 500);
    }
}
