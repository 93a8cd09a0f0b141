use async_trait::async_trait;
use tokio::sync::mpsc;
use uuid::Uuid;

use super::errors::{AlertError, DomainError};
use super::medicine::{Medicine, MedicineQuery, NewMedicine};
use super::order::{NewOrder, Order, OrderStatus};
use super::pharmacy::{NewPharmacy, Pharmacy, PharmacyUpdate};
use super::reference::{NewReferenceMedicine, ReferenceMedicine, ReferenceQuery};

/// Where an order record lives. Every order exists under its pharmacy and,
/// mirrored under the same key, in the global collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Collection {
    Pharmacy(Uuid),
    Global,
}

/// Live channel of full pending-order snapshots for one pharmacy. Each item
/// replaces the previous one; an `Err` reports a failed read.
pub type PendingFeed = mpsc::UnboundedReceiver<Result<Vec<Order>, DomainError>>;

#[async_trait]
pub trait OrderStore: Send + Sync + 'static {
    /// Writes the order to both collections with status `pending`.
    async fn create(&self, order: NewOrder) -> Result<Order, DomainError>;
    async fn find(&self, collection: Collection, id: Uuid) -> Result<Option<Order>, DomainError>;
    async fn list_for_pharmacy(
        &self,
        pharmacy_id: Uuid,
        status: Option<OrderStatus>,
    ) -> Result<Vec<Order>, DomainError>;
    async fn list_for_client(&self, client_id: Uuid) -> Result<Vec<Order>, DomainError>;
    /// `DomainError::NotFound` when the record does not exist in `collection`.
    async fn update_status(
        &self,
        collection: Collection,
        id: Uuid,
        status: OrderStatus,
    ) -> Result<(), DomainError>;
    fn watch_pending(&self, pharmacy_id: Uuid) -> PendingFeed;
}

#[async_trait]
pub trait MedicineCatalog: Send + Sync + 'static {
    async fn add(&self, pharmacy_id: Uuid, medicine: NewMedicine) -> Result<Medicine, DomainError>;
    async fn find(&self, pharmacy_id: Uuid, id: Uuid) -> Result<Option<Medicine>, DomainError>;
    async fn list(&self, pharmacy_id: Uuid, query: &MedicineQuery) -> Result<Vec<Medicine>, DomainError>;
    async fn set_available(
        &self,
        pharmacy_id: Uuid,
        id: Uuid,
        available: bool,
    ) -> Result<Medicine, DomainError>;
}

#[async_trait]
pub trait PharmacyDirectory: Send + Sync + 'static {
    async fn register(&self, pharmacy: NewPharmacy) -> Result<Pharmacy, DomainError>;
    async fn find(&self, id: Uuid) -> Result<Option<Pharmacy>, DomainError>;
    async fn list(&self) -> Result<Vec<Pharmacy>, DomainError>;
    /// `DomainError::NotFound` when no pharmacy has this id.
    async fn update(&self, id: Uuid, update: PharmacyUpdate) -> Result<Pharmacy, DomainError>;
}

/// The medicine reference list shared by every pharmacy.
#[async_trait]
pub trait ReferenceCatalog: Send + Sync + 'static {
    /// `DomainError::Conflict` when an entry with the same name exists.
    async fn add(&self, entry: NewReferenceMedicine) -> Result<ReferenceMedicine, DomainError>;
    async fn find(&self, id: Uuid) -> Result<Option<ReferenceMedicine>, DomainError>;
    /// Matching entries sorted by name.
    async fn list(&self, query: &ReferenceQuery) -> Result<Vec<ReferenceMedicine>, DomainError>;
}

/// Plays the alert tone. Playback loops until [`Playback::stop`] is called.
pub trait AlertSound: Send + Sync + 'static {
    fn start_loop(&self, source: &str) -> Result<Box<dyn Playback>, AlertError>;
}

pub trait Playback: Send {
    /// Halts playback and releases its resources. Called at most once.
    fn stop(&mut self);
}
