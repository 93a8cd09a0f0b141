//! Shared fixtures for the integration tests.
#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use bigdecimal::BigDecimal;
use chrono::{Duration, TimeZone, Utc};
use parking_lot::Mutex;
use tokio::sync::mpsc;
use uuid::Uuid;

use pharmacy_service::domain::errors::{AlertError, DomainError};
use pharmacy_service::domain::order::{NewOrder, Order, OrderItem, OrderStatus};
use pharmacy_service::domain::ports::{AlertSound, Collection, OrderStore, PendingFeed, Playback};

pub const TONE: &str = "https://example.com/tone.mp3";

/// Counts how many loops were started and stopped.
#[derive(Default)]
pub struct RecordingSound {
    started: AtomicUsize,
    stopped: Arc<AtomicUsize>,
}

impl RecordingSound {
    pub fn started(&self) -> usize {
        self.started.load(Ordering::SeqCst)
    }

    pub fn stopped(&self) -> usize {
        self.stopped.load(Ordering::SeqCst)
    }

    pub fn playing(&self) -> usize {
        self.started() - self.stopped()
    }
}

impl AlertSound for RecordingSound {
    fn start_loop(&self, _source: &str) -> Result<Box<dyn Playback>, AlertError> {
        self.started.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(RecordingPlayback {
            stopped: self.stopped.clone(),
        }))
    }
}

struct RecordingPlayback {
    stopped: Arc<AtomicUsize>,
}

impl Playback for RecordingPlayback {
    fn stop(&mut self) {
        self.stopped.fetch_add(1, Ordering::SeqCst);
    }
}

/// Order store whose writes can be made to fail, keeping a log of the writes
/// that went through.
#[derive(Default)]
pub struct ScriptedStore {
    scoped: Mutex<HashMap<Uuid, Order>>,
    global: Mutex<HashMap<Uuid, Order>>,
    writes: Mutex<Vec<(Collection, Uuid, OrderStatus)>>,
    pub fail_primary: AtomicBool,
    pub fail_global: AtomicBool,
}

impl ScriptedStore {
    pub fn with_orders(orders: &[Order]) -> Self {
        let store = Self::default();
        for order in orders {
            store.scoped.lock().insert(order.id, order.clone());
            store.global.lock().insert(order.id, order.clone());
        }
        store
    }

    pub fn writes(&self) -> Vec<(Collection, Uuid, OrderStatus)> {
        self.writes.lock().clone()
    }

    pub fn writes_for(&self, id: Uuid) -> usize {
        self.writes.lock().iter().filter(|(_, w, _)| *w == id).count()
    }

    pub fn status(&self, collection: Collection, id: Uuid) -> Option<OrderStatus> {
        let orders = match collection {
            Collection::Pharmacy(_) => self.scoped.lock(),
            Collection::Global => self.global.lock(),
        };
        orders.get(&id).map(|o| o.status)
    }
}

#[async_trait]
impl OrderStore for ScriptedStore {
    async fn create(&self, order: NewOrder) -> Result<Order, DomainError> {
        let order = order.into_order(Uuid::new_v4(), Utc::now())?;
        self.scoped.lock().insert(order.id, order.clone());
        self.global.lock().insert(order.id, order.clone());
        Ok(order)
    }

    async fn find(&self, collection: Collection, id: Uuid) -> Result<Option<Order>, DomainError> {
        let orders = match collection {
            Collection::Pharmacy(_) => self.scoped.lock(),
            Collection::Global => self.global.lock(),
        };
        Ok(orders.get(&id).cloned())
    }

    async fn list_for_pharmacy(
        &self,
        pharmacy_id: Uuid,
        status: Option<OrderStatus>,
    ) -> Result<Vec<Order>, DomainError> {
        Ok(self
            .scoped
            .lock()
            .values()
            .filter(|o| o.pharmacy_id == pharmacy_id)
            .filter(|o| status.map_or(true, |s| o.status == s))
            .cloned()
            .collect())
    }

    async fn list_for_client(&self, client_id: Uuid) -> Result<Vec<Order>, DomainError> {
        Ok(self
            .global
            .lock()
            .values()
            .filter(|o| o.client_id == client_id)
            .cloned()
            .collect())
    }

    async fn update_status(
        &self,
        collection: Collection,
        id: Uuid,
        status: OrderStatus,
    ) -> Result<(), DomainError> {
        let (failing, orders) = match collection {
            Collection::Pharmacy(_) => (&self.fail_primary, &self.scoped),
            Collection::Global => (&self.fail_global, &self.global),
        };
        if failing.load(Ordering::SeqCst) {
            return Err(DomainError::Internal("write timed out".to_string()));
        }
        let mut orders = orders.lock();
        let order = orders
            .get_mut(&id)
            .ok_or_else(|| DomainError::NotFound(format!("order {}", id)))?;
        order.status = status;
        self.writes.lock().push((collection, id, status));
        Ok(())
    }

    fn watch_pending(&self, _pharmacy_id: Uuid) -> PendingFeed {
        let (_tx, rx) = mpsc::unbounded_channel();
        rx
    }
}

/// A pending order created `minutes_ago` before a fixed instant, so sort order
/// is predictable.
pub fn order_at(pharmacy_id: Uuid, minutes_ago: i64) -> Order {
    let base = Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap();
    NewOrder {
        pharmacy_id,
        client_id: Uuid::new_v4(),
        client_label: format!("client-{}@example.com", minutes_ago),
        items: vec![OrderItem::new("Paracetamol", BigDecimal::from(50), 2).unwrap()],
    }
    .into_order(Uuid::new_v4(), base - Duration::minutes(minutes_ago))
    .unwrap()
}
