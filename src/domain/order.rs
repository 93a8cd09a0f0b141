use std::fmt;
use std::str::FromStr;

use bigdecimal::BigDecimal;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::errors::DomainError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    Pending,
    Confirmed,
    Rejected,
}

impl OrderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "pending",
            OrderStatus::Confirmed => "confirmed",
            OrderStatus::Rejected => "rejected",
        }
    }

    /// `confirmed` and `rejected` are final; nothing moves an order out of them.
    pub fn is_terminal(&self) -> bool {
        !matches!(self, OrderStatus::Pending)
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OrderStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(OrderStatus::Pending),
            "confirmed" => Ok(OrderStatus::Confirmed),
            "rejected" => Ok(OrderStatus::Rejected),
            other => Err(DomainError::InvalidInput(format!(
                "unknown order status '{}'",
                other
            ))),
        }
    }
}

/// A client's request for one medicine, before prices are resolved.
#[derive(Debug, Clone)]
pub struct OrderLineInput {
    pub medicine_id: Uuid,
    pub quantity: i32,
}

#[derive(Debug, Clone)]
pub struct PlaceOrder {
    pub client_id: Uuid,
    pub client_label: String,
    pub lines: Vec<OrderLineInput>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderItem {
    pub medicine_name: String,
    pub unit_price: BigDecimal,
    pub quantity: i32,
    pub line_total: BigDecimal,
}

impl OrderItem {
    pub fn new(
        medicine_name: impl Into<String>,
        unit_price: BigDecimal,
        quantity: i32,
    ) -> Result<Self, DomainError> {
        let medicine_name = medicine_name.into();
        if quantity <= 0 {
            return Err(DomainError::InvalidInput(format!(
                "quantity for '{}' must be positive, got {}",
                medicine_name, quantity
            )));
        }
        if unit_price < BigDecimal::from(0) {
            return Err(DomainError::InvalidInput(format!(
                "unit price for '{}' must not be negative",
                medicine_name
            )));
        }
        let line_total = &unit_price * BigDecimal::from(quantity);
        Ok(Self {
            medicine_name,
            unit_price,
            quantity,
            line_total,
        })
    }
}

/// Sum of line totals. No rounding is applied.
pub fn total_of(items: &[OrderItem]) -> BigDecimal {
    items
        .iter()
        .fold(BigDecimal::from(0), |acc, item| acc + &item.line_total)
}

/// An order as handed to the store, which assigns the key and timestamp.
#[derive(Debug, Clone)]
pub struct NewOrder {
    pub pharmacy_id: Uuid,
    pub client_id: Uuid,
    pub client_label: String,
    pub items: Vec<OrderItem>,
}

impl NewOrder {
    pub fn into_order(self, id: Uuid, created_at: DateTime<Utc>) -> Result<Order, DomainError> {
        if self.items.is_empty() {
            return Err(DomainError::InvalidInput(
                "an order needs at least one item".to_string(),
            ));
        }
        let total_price = total_of(&self.items);
        Ok(Order {
            id,
            pharmacy_id: self.pharmacy_id,
            client_id: self.client_id,
            client_label: self.client_label,
            items: self.items,
            total_price,
            created_at,
            status: OrderStatus::Pending,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    pub id: Uuid,
    pub pharmacy_id: Uuid,
    pub client_id: Uuid,
    pub client_label: String,
    pub items: Vec<OrderItem>,
    pub total_price: BigDecimal,
    pub created_at: DateTime<Utc>,
    pub status: OrderStatus,
}

impl Order {
    pub fn is_pending(&self) -> bool {
        self.status == OrderStatus::Pending
    }
}

/// Newest first; equal timestamps fall back to key order so the head is stable.
pub fn sort_newest_first(orders: &mut [Order]) {
    orders.sort_by(|a, b| {
        b.created_at
            .cmp(&a.created_at)
            .then_with(|| a.id.cmp(&b.id))
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(price: i64, quantity: i32) -> OrderItem {
        OrderItem::new("Paracetamol", BigDecimal::from(price), quantity).expect("valid item")
    }

    #[test]
    fn line_total_is_price_times_quantity() {
        assert_eq!(item(50, 2).line_total, BigDecimal::from(100));
    }

    #[test]
    fn total_price_is_sum_of_line_totals() {
        let new_order = NewOrder {
            pharmacy_id: Uuid::new_v4(),
            client_id: Uuid::new_v4(),
            client_label: "client@example.com".to_string(),
            items: vec![item(100, 2), item(50, 1)],
        };
        let order = new_order
            .into_order(Uuid::new_v4(), Utc::now())
            .expect("valid order");
        assert_eq!(order.total_price, BigDecimal::from(250));
        assert_eq!(order.status, OrderStatus::Pending);
    }

    #[test]
    fn decimal_prices_are_not_rounded() {
        let price: BigDecimal = "9.99".parse().expect("decimal");
        let line = OrderItem::new("Aspirine", price, 3).expect("valid item");
        assert_eq!(line.line_total, "29.97".parse::<BigDecimal>().expect("decimal"));
    }

    #[test]
    fn zero_quantity_is_rejected() {
        let err = OrderItem::new("Aspirine", BigDecimal::from(10), 0).unwrap_err();
        assert!(matches!(err, DomainError::InvalidInput(_)));
    }

    #[test]
    fn negative_price_is_rejected() {
        let err = OrderItem::new("Aspirine", BigDecimal::from(-1), 1).unwrap_err();
        assert!(matches!(err, DomainError::InvalidInput(_)));
    }

    #[test]
    fn empty_order_is_rejected() {
        let new_order = NewOrder {
            pharmacy_id: Uuid::new_v4(),
            client_id: Uuid::new_v4(),
            client_label: String::new(),
            items: vec![],
        };
        assert!(new_order.into_order(Uuid::new_v4(), Utc::now()).is_err());
    }

    #[test]
    fn status_parses_only_known_values() {
        assert_eq!("pending".parse::<OrderStatus>().unwrap(), OrderStatus::Pending);
        assert_eq!("confirmed".parse::<OrderStatus>().unwrap(), OrderStatus::Confirmed);
        assert_eq!("rejected".parse::<OrderStatus>().unwrap(), OrderStatus::Rejected);
        assert!("PENDING".parse::<OrderStatus>().is_err());
        assert!("delivered".parse::<OrderStatus>().is_err());
    }

    #[test]
    fn only_pending_is_not_terminal() {
        assert!(!OrderStatus::Pending.is_terminal());
        assert!(OrderStatus::Confirmed.is_terminal());
        assert!(OrderStatus::Rejected.is_terminal());
    }

    #[test]
    fn status_serializes_lowercase() {
        let json = serde_json::to_string(&OrderStatus::Confirmed).expect("serialize");
        assert_eq!(json, "\"confirmed\"");
    }

    #[test]
    fn sort_puts_newest_first_and_breaks_ties_by_key() {
        let base = Utc::now();
        let mk = |id: u128, secs: i64| Order {
            id: Uuid::from_u128(id),
            pharmacy_id: Uuid::nil(),
            client_id: Uuid::nil(),
            client_label: String::new(),
            items: vec![],
            total_price: BigDecimal::from(0),
            created_at: base + chrono::Duration::seconds(secs),
            status: OrderStatus::Pending,
        };
        let mut orders = vec![mk(3, 0), mk(1, 10), mk(2, 10)];
        sort_newest_first(&mut orders);
        let ids: Vec<u128> = orders.iter().map(|o| o.id.as_u128()).collect();
        assert_eq!(ids, vec![1, 2, 3]);
    }
}
