//! The pharmacist's order desk: pending queue, notification timer and
//! accept/reject decisions for one pharmacy.
//!
//! A [`Desk`] is plain owned state. Every event (snapshot push, countdown tick,
//! pharmacist command) goes through `&mut self`, so checking for an open
//! session and opening one happen in the same turn. The runtime in
//! [`super::desk_runtime`] drives one desk per pharmacy from a single task.

use std::collections::HashSet;
use std::sync::Arc;

use log::{debug, error, info, warn};
use serde::Serialize;
use thiserror::Error;
use uuid::Uuid;

use super::alert::AlertController;
use super::pending_queue::PendingQueue;
use super::session::{NotificationTimer, OpenOutcome, TickOutcome};
use crate::domain::errors::DomainError;
use crate::domain::order::{Order, OrderStatus};
use crate::domain::ports::{Collection, OrderStore};

#[derive(Debug, Error)]
pub enum DeskError {
    #[error("No notification is open")]
    NoActiveSession,
    #[error("Order {requested} is not the order on screen ({active})")]
    NotPresented { requested: Uuid, active: Uuid },
    #[error("Order {0} has already been decided")]
    AlreadyDecided(Uuid),
    #[error("Could not record the decision for order {order_id}: {source}")]
    PrimaryWrite {
        order_id: Uuid,
        #[source]
        source: DomainError,
    },
    #[error("Desk closed")]
    Closed,
    #[error("Desk dropped response channel")]
    Dropped,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Accept,
    Reject,
}

impl Decision {
    pub fn status(&self) -> OrderStatus {
        match self {
            Decision::Accept => OrderStatus::Confirmed,
            Decision::Reject => OrderStatus::Rejected,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct DecisionOutcome {
    pub order_id: Uuid,
    pub status: OrderStatus,
    /// Whether the global copy was updated too.
    pub mirrored: bool,
    /// The order now on screen, if the queue had another one.
    pub next: Option<Uuid>,
}

/// Read-only copy of the open session, safe to hand out of the desk.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionView {
    pub order: Order,
    pub seconds_left: u32,
    pub halted: bool,
    pub alert_playing: bool,
    pub alert_source: String,
}

pub struct Desk {
    pharmacy_id: Uuid,
    store: Arc<dyn OrderStore>,
    alert: AlertController,
    queue: PendingQueue,
    timer: NotificationTimer,
    decided: HashSet<Uuid>,
    sessions_opened: u64,
}

impl Desk {
    pub fn new(
        pharmacy_id: Uuid,
        store: Arc<dyn OrderStore>,
        alert: AlertController,
        countdown_secs: u32,
    ) -> Self {
        Self {
            pharmacy_id,
            store,
            alert,
            queue: PendingQueue::new(),
            timer: NotificationTimer::new(countdown_secs),
            decided: HashSet::new(),
            sessions_opened: 0,
        }
    }

    pub fn pharmacy_id(&self) -> Uuid {
        self.pharmacy_id
    }

    /// Number of sessions opened so far; changes whenever a new one starts.
    pub fn sessions_opened(&self) -> u64 {
        self.sessions_opened
    }

    pub fn session(&self) -> Option<SessionView> {
        self.timer.active().map(|s| SessionView {
            order: s.order().clone(),
            seconds_left: s.seconds_left(),
            halted: s.is_halted(),
            alert_playing: s.alert_playing(),
            alert_source: self.alert.source().to_string(),
        })
    }

    pub fn pending(&self) -> Vec<Order> {
        self.queue.orders().to_vec()
    }

    pub fn on_snapshot(&mut self, snapshot: Result<Vec<Order>, DomainError>) {
        let orders = match snapshot {
            Ok(orders) => orders,
            Err(e) => {
                warn!(
                    "Pending feed for pharmacy {} failed, keeping last snapshot: {}",
                    self.pharmacy_id, e
                );
                return;
            }
        };

        // A decided key that no longer shows up has caught up in the store.
        self.decided
            .retain(|id| orders.iter().any(|o| o.id == *id));
        let fresh: Vec<Order> = orders
            .into_iter()
            .filter(|o| !self.decided.contains(&o.id))
            .collect();
        self.queue.replace(fresh);
        debug!(
            "Pharmacy {} has {} pending order(s)",
            self.pharmacy_id,
            self.queue.len()
        );

        if let Some(active) = self.timer.active_order_id() {
            if !self.queue.contains(active) {
                info!("Order {} is no longer pending, closing its notification", active);
                self.timer.close();
            }
        }
        self.offer(self.queue.clone());
    }

    pub fn on_tick(&mut self) {
        if let TickOutcome::Expired(order) = self.timer.tick() {
            info!(
                "Notification for order {} expired, order stays {}",
                order.id, order.status
            );
            self.offer(self.queue.without(order.id));
        }
    }

    pub async fn accept(&mut self, order_id: Uuid) -> Result<DecisionOutcome, DeskError> {
        self.decide(order_id, Decision::Accept).await
    }

    pub async fn reject(&mut self, order_id: Uuid) -> Result<DecisionOutcome, DeskError> {
        self.decide(order_id, Decision::Reject).await
    }

    pub async fn decide(
        &mut self,
        order_id: Uuid,
        decision: Decision,
    ) -> Result<DecisionOutcome, DeskError> {
        if self.decided.contains(&order_id) {
            return Err(DeskError::AlreadyDecided(order_id));
        }
        let active = self
            .timer
            .active_order_id()
            .ok_or(DeskError::NoActiveSession)?;
        if active != order_id {
            return Err(DeskError::NotPresented {
                requested: order_id,
                active,
            });
        }

        let status = decision.status();
        self.timer.halt();

        if let Err(source) = self
            .store
            .update_status(Collection::Pharmacy(self.pharmacy_id), order_id, status)
            .await
        {
            error!("Failed to mark order {} {}: {}", order_id, status, source);
            return Err(DeskError::PrimaryWrite { order_id, source });
        }
        self.decided.insert(order_id);

        let mirrored = match self
            .store
            .update_status(Collection::Global, order_id, status)
            .await
        {
            Ok(()) => true,
            Err(e) => {
                warn!("Global copy of order {} not updated: {}", order_id, e);
                false
            }
        };

        self.timer.close();
        self.queue = self.queue.without(order_id);
        info!("Order {} {}", order_id, status);
        self.offer(self.queue.clone());

        Ok(DecisionOutcome {
            order_id,
            status,
            mirrored,
            next: self.timer.active_order_id(),
        })
    }

    /// Closes the open notification without touching the order. Does not
    /// move on to the next order.
    pub fn dismiss(&mut self) -> Result<Uuid, DeskError> {
        let order = self.timer.close().ok_or(DeskError::NoActiveSession)?;
        info!("Notification for order {} dismissed", order.id);
        Ok(order.id)
    }

    /// Releases the open session, if any.
    pub fn shutdown(&mut self) {
        if let Some(order) = self.timer.close() {
            debug!("Desk for pharmacy {} closed with order {} on screen", self.pharmacy_id, order.id);
        }
    }

    fn offer(&mut self, candidates: PendingQueue) {
        if self.timer.is_active() {
            return;
        }
        let Some(head) = candidates.current().cloned() else {
            return;
        };
        let alert = &self.alert;
        let head_id = head.id;
        if self.timer.open(head, || alert.start()) == OpenOutcome::Opened {
            self.sessions_opened += 1;
            info!("Notifying pharmacy {} of order {}", self.pharmacy_id, head_id);
        }
    }
}
