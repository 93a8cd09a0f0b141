//! In-process store for tests and local runs without PostgreSQL.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use log::debug;
use parking_lot::Mutex;
use tokio::sync::mpsc;
use uuid::Uuid;

use crate::domain::errors::DomainError;
use crate::domain::medicine::{Medicine, MedicineQuery, NewMedicine};
use crate::domain::order::{sort_newest_first, NewOrder, Order, OrderStatus};
use crate::domain::pharmacy::{NewPharmacy, Pharmacy, PharmacyUpdate};
use crate::domain::ports::{
    Collection, MedicineCatalog, OrderStore, PendingFeed, PharmacyDirectory, ReferenceCatalog,
};
use crate::domain::reference::{
    sort_by_name, NewReferenceMedicine, ReferenceMedicine, ReferenceQuery,
};

type FeedSender = mpsc::UnboundedSender<Result<Vec<Order>, DomainError>>;

#[derive(Default)]
struct Inner {
    /// pharmacy id -> order id -> order
    pharmacy_orders: HashMap<Uuid, HashMap<Uuid, Order>>,
    global_orders: HashMap<Uuid, Order>,
    medicines: HashMap<Uuid, Medicine>,
    pharmacies: HashMap<Uuid, Pharmacy>,
    references: HashMap<Uuid, ReferenceMedicine>,
    watchers: HashMap<Uuid, Vec<FeedSender>>,
}

impl Inner {
    fn pending_of(&self, pharmacy_id: Uuid) -> Vec<Order> {
        let mut pending: Vec<Order> = self
            .pharmacy_orders
            .get(&pharmacy_id)
            .map(|orders| orders.values().filter(|o| o.is_pending()).cloned().collect())
            .unwrap_or_default();
        sort_newest_first(&mut pending);
        pending
    }

    fn publish(&mut self, pharmacy_id: Uuid) {
        let snapshot = self.pending_of(pharmacy_id);
        if let Some(senders) = self.watchers.get_mut(&pharmacy_id) {
            senders.retain(|tx| tx.send(Ok(snapshot.clone())).is_ok());
            debug!(
                "Published {} pending order(s) to {} watcher(s) of pharmacy {}",
                snapshot.len(),
                senders.len(),
                pharmacy_id
            );
        }
    }
}

/// Keeps both order collections, the catalog and the directory in memory.
/// Every change to a pharmacy's orders pushes a fresh pending snapshot to its
/// watchers.
#[derive(Default)]
pub struct InMemoryStore {
    inner: Mutex<Inner>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drops the global copy of an order, as when the mirror write never landed.
    pub fn forget_global(&self, id: Uuid) -> Option<Order> {
        self.inner.lock().global_orders.remove(&id)
    }
}

#[async_trait]
impl OrderStore for InMemoryStore {
    async fn create(&self, order: NewOrder) -> Result<Order, DomainError> {
        let order = order.into_order(Uuid::new_v4(), Utc::now())?;
        let mut inner = self.inner.lock();
        inner
            .pharmacy_orders
            .entry(order.pharmacy_id)
            .or_default()
            .insert(order.id, order.clone());
        inner.global_orders.insert(order.id, order.clone());
        inner.publish(order.pharmacy_id);
        Ok(order)
    }

    async fn find(&self, collection: Collection, id: Uuid) -> Result<Option<Order>, DomainError> {
        let inner = self.inner.lock();
        let found = match collection {
            Collection::Pharmacy(pharmacy_id) => inner
                .pharmacy_orders
                .get(&pharmacy_id)
                .and_then(|orders| orders.get(&id)),
            Collection::Global => inner.global_orders.get(&id),
        };
        Ok(found.cloned())
    }

    async fn list_for_pharmacy(
        &self,
        pharmacy_id: Uuid,
        status: Option<OrderStatus>,
    ) -> Result<Vec<Order>, DomainError> {
        let inner = self.inner.lock();
        let mut orders: Vec<Order> = inner
            .pharmacy_orders
            .get(&pharmacy_id)
            .map(|orders| {
                orders
                    .values()
                    .filter(|o| status.map_or(true, |s| o.status == s))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default();
        sort_newest_first(&mut orders);
        Ok(orders)
    }

    async fn list_for_client(&self, client_id: Uuid) -> Result<Vec<Order>, DomainError> {
        let inner = self.inner.lock();
        let mut orders: Vec<Order> = inner
            .global_orders
            .values()
            .filter(|o| o.client_id == client_id)
            .cloned()
            .collect();
        sort_newest_first(&mut orders);
        Ok(orders)
    }

    async fn update_status(
        &self,
        collection: Collection,
        id: Uuid,
        status: OrderStatus,
    ) -> Result<(), DomainError> {
        let mut inner = self.inner.lock();
        match collection {
            Collection::Pharmacy(pharmacy_id) => {
                let order = inner
                    .pharmacy_orders
                    .get_mut(&pharmacy_id)
                    .and_then(|orders| orders.get_mut(&id))
                    .ok_or_else(|| DomainError::NotFound(format!("order {}", id)))?;
                order.status = status;
                inner.publish(pharmacy_id);
            }
            Collection::Global => {
                let order = inner
                    .global_orders
                    .get_mut(&id)
                    .ok_or_else(|| DomainError::NotFound(format!("order {}", id)))?;
                order.status = status;
            }
        }
        Ok(())
    }

    fn watch_pending(&self, pharmacy_id: Uuid) -> PendingFeed {
        let (tx, rx) = mpsc::unbounded_channel();
        let mut inner = self.inner.lock();
        let _ = tx.send(Ok(inner.pending_of(pharmacy_id)));
        // Feeds of stopped desks go now, not on the next order for their pharmacy.
        inner.watchers.retain(|_, senders| {
            senders.retain(|tx| !tx.is_closed());
            !senders.is_empty()
        });
        inner.watchers.entry(pharmacy_id).or_default().push(tx);
        rx
    }
}

#[async_trait]
impl MedicineCatalog for InMemoryStore {
    async fn add(&self, pharmacy_id: Uuid, medicine: NewMedicine) -> Result<Medicine, DomainError> {
        let mut inner = self.inner.lock();
        if inner
            .medicines
            .values()
            .any(|m| m.pharmacy_id == pharmacy_id && m.reference_id == medicine.reference_id)
        {
            return Err(DomainError::Conflict(format!(
                "{} is already stocked",
                medicine.name
            )));
        }
        let medicine = Medicine {
            id: Uuid::new_v4(),
            pharmacy_id,
            reference_id: medicine.reference_id,
            name: medicine.name.trim().to_string(),
            category: medicine.category,
            unit_price: medicine.unit_price,
            available: true,
            created_at: Utc::now(),
        };
        inner.medicines.insert(medicine.id, medicine.clone());
        Ok(medicine)
    }

    async fn find(&self, pharmacy_id: Uuid, id: Uuid) -> Result<Option<Medicine>, DomainError> {
        Ok(self
            .inner
            .lock()
            .medicines
            .get(&id)
            .filter(|m| m.pharmacy_id == pharmacy_id)
            .cloned())
    }

    async fn list(&self, pharmacy_id: Uuid, query: &MedicineQuery) -> Result<Vec<Medicine>, DomainError> {
        let inner = self.inner.lock();
        let mut medicines: Vec<Medicine> = inner
            .medicines
            .values()
            .filter(|m| m.pharmacy_id == pharmacy_id && query.matches(m))
            .cloned()
            .collect();
        medicines.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(medicines)
    }

    async fn set_available(
        &self,
        pharmacy_id: Uuid,
        id: Uuid,
        available: bool,
    ) -> Result<Medicine, DomainError> {
        let mut inner = self.inner.lock();
        let medicine = inner
            .medicines
            .get_mut(&id)
            .filter(|m| m.pharmacy_id == pharmacy_id)
            .ok_or_else(|| DomainError::NotFound(format!("medicine {}", id)))?;
        medicine.available = available;
        Ok(medicine.clone())
    }
}

#[async_trait]
impl PharmacyDirectory for InMemoryStore {
    async fn register(&self, pharmacy: NewPharmacy) -> Result<Pharmacy, DomainError> {
        let pharmacy = Pharmacy {
            id: Uuid::new_v4(),
            name: pharmacy.name.trim().to_string(),
            location: pharmacy.location,
            is_open: true,
            created_at: Utc::now(),
        };
        self.inner
            .lock()
            .pharmacies
            .insert(pharmacy.id, pharmacy.clone());
        Ok(pharmacy)
    }

    async fn find(&self, id: Uuid) -> Result<Option<Pharmacy>, DomainError> {
        Ok(self.inner.lock().pharmacies.get(&id).cloned())
    }

    async fn list(&self) -> Result<Vec<Pharmacy>, DomainError> {
        Ok(self.inner.lock().pharmacies.values().cloned().collect())
    }

    async fn update(&self, id: Uuid, update: PharmacyUpdate) -> Result<Pharmacy, DomainError> {
        let mut inner = self.inner.lock();
        let pharmacy = inner
            .pharmacies
            .get_mut(&id)
            .ok_or_else(|| DomainError::NotFound(format!("pharmacy {}", id)))?;
        update.apply(pharmacy);
        Ok(pharmacy.clone())
    }
}

#[async_trait]
impl ReferenceCatalog for InMemoryStore {
    async fn add(&self, entry: NewReferenceMedicine) -> Result<ReferenceMedicine, DomainError> {
        let name = entry.name.trim().to_string();
        let mut inner = self.inner.lock();
        if inner
            .references
            .values()
            .any(|r| r.name.to_lowercase() == name.to_lowercase())
        {
            return Err(DomainError::Conflict(format!(
                "{} is already in the reference list",
                name
            )));
        }
        let entry = ReferenceMedicine {
            id: Uuid::new_v4(),
            name,
            category: entry.category.trim().to_string(),
            created_at: Utc::now(),
        };
        inner.references.insert(entry.id, entry.clone());
        Ok(entry)
    }

    async fn find(&self, id: Uuid) -> Result<Option<ReferenceMedicine>, DomainError> {
        Ok(self.inner.lock().references.get(&id).cloned())
    }

    async fn list(&self, query: &ReferenceQuery) -> Result<Vec<ReferenceMedicine>, DomainError> {
        let mut entries: Vec<ReferenceMedicine> = self
            .inner
            .lock()
            .references
            .values()
            .filter(|r| query.matches(r))
            .cloned()
            .collect();
        sort_by_name(&mut entries);
        Ok(entries)
    }
}
