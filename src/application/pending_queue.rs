use std::collections::HashSet;

use uuid::Uuid;

use crate::domain::order::{sort_newest_first, Order};

/// Locally observed pending orders of one pharmacy, newest first.
#[derive(Debug, Clone, Default)]
pub struct PendingQueue {
    orders: Vec<Order>,
}

impl PendingQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Installs a full snapshot. Non-pending entries and repeated keys are dropped.
    pub fn replace(&mut self, snapshot: Vec<Order>) {
        let mut seen = HashSet::with_capacity(snapshot.len());
        let mut orders: Vec<Order> = snapshot
            .into_iter()
            .filter(|o| o.is_pending() && seen.insert(o.id))
            .collect();
        sort_newest_first(&mut orders);
        self.orders = orders;
    }

    /// The head order.
    pub fn current(&self) -> Option<&Order> {
        self.orders.first()
    }

    pub fn without(&self, id: Uuid) -> PendingQueue {
        PendingQueue {
            orders: self.orders.iter().filter(|o| o.id != id).cloned().collect(),
        }
    }

    pub fn contains(&self, id: Uuid) -> bool {
        self.orders.iter().any(|o| o.id == id)
    }

    pub fn orders(&self) -> &[Order] {
        &self.orders
    }

    pub fn len(&self) -> usize {
        self.orders.len()
    }

    pub fn is_empty(&self) -> bool {
        self.orders.is_empty()
    }
}
