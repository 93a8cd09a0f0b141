use bigdecimal::BigDecimal;
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use serde_json::Value;
use uuid::Uuid;

use crate::domain::errors::DomainError;
use crate::domain::medicine::Medicine;
use crate::domain::order::{Order, OrderItem};
use crate::domain::pharmacy::{Coordinates, Pharmacy};
use crate::domain::reference::ReferenceMedicine;
use crate::schema::{medicines, orders, pharmacies, pharmacy_orders, reference_medicines};

#[derive(Debug, Clone, Queryable, Selectable, Insertable, Identifiable)]
#[diesel(table_name = pharmacies)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct PharmacyRow {
    pub id: Uuid,
    pub name: String,
    pub latitude: f64,
    pub longitude: f64,
    pub created_at: DateTime<Utc>,
    pub is_open: bool,
}

impl From<PharmacyRow> for Pharmacy {
    fn from(row: PharmacyRow) -> Self {
        Pharmacy {
            id: row.id,
            name: row.name,
            location: Coordinates {
                latitude: row.latitude,
                longitude: row.longitude,
            },
            is_open: row.is_open,
            created_at: row.created_at,
        }
    }
}

/// Profile columns written by a pharmacy update.
#[derive(Debug, AsChangeset)]
#[diesel(table_name = pharmacies)]
pub struct PharmacyChanges {
    pub name: Option<String>,
    pub is_open: Option<bool>,
}

#[derive(Debug, Clone, Queryable, Selectable, Insertable, Identifiable)]
#[diesel(table_name = reference_medicines)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct ReferenceMedicineRow {
    pub id: Uuid,
    pub name: String,
    pub category: String,
    pub created_at: DateTime<Utc>,
}

impl From<ReferenceMedicineRow> for ReferenceMedicine {
    fn from(row: ReferenceMedicineRow) -> Self {
        ReferenceMedicine {
            id: row.id,
            name: row.name,
            category: row.category,
            created_at: row.created_at,
        }
    }
}

#[derive(Debug, Clone, Queryable, Selectable, Insertable, Identifiable, Associations)]
#[diesel(table_name = medicines)]
#[diesel(belongs_to(PharmacyRow, foreign_key = pharmacy_id))]
#[diesel(belongs_to(ReferenceMedicineRow, foreign_key = reference_id))]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct MedicineRow {
    pub id: Uuid,
    pub pharmacy_id: Uuid,
    pub name: String,
    pub unit_price: BigDecimal,
    pub available: bool,
    pub created_at: DateTime<Utc>,
    pub reference_id: Uuid,
    pub category: String,
}

impl From<MedicineRow> for Medicine {
    fn from(row: MedicineRow) -> Self {
        Medicine {
            id: row.id,
            pharmacy_id: row.pharmacy_id,
            reference_id: row.reference_id,
            name: row.name,
            category: row.category,
            unit_price: row.unit_price,
            available: row.available,
            created_at: row.created_at,
        }
    }
}

/// Row shape shared by `pharmacy_orders` and `orders`; loaded positionally from
/// either table's full column list.
#[derive(Debug, Clone, Queryable)]
pub struct OrderRow {
    pub id: Uuid,
    pub pharmacy_id: Uuid,
    pub client_id: Uuid,
    pub client_label: String,
    pub items: Value,
    pub total_price: BigDecimal,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TryFrom<OrderRow> for Order {
    type Error = DomainError;

    fn try_from(row: OrderRow) -> Result<Self, Self::Error> {
        let items: Vec<OrderItem> = serde_json::from_value(row.items).map_err(|e| {
            DomainError::Internal(format!("order {} has unreadable items: {}", row.id, e))
        })?;
        Ok(Order {
            id: row.id,
            pharmacy_id: row.pharmacy_id,
            client_id: row.client_id,
            client_label: row.client_label,
            items,
            total_price: row.total_price,
            created_at: row.created_at,
            status: row.status.parse()?,
        })
    }
}

#[derive(Debug, Insertable)]
#[diesel(table_name = pharmacy_orders)]
pub struct NewPharmacyOrderRow {
    pub id: Uuid,
    pub pharmacy_id: Uuid,
    pub client_id: Uuid,
    pub client_label: String,
    pub items: Value,
    pub total_price: BigDecimal,
    pub status: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = orders)]
pub struct NewOrderRow {
    pub id: Uuid,
    pub pharmacy_id: Uuid,
    pub client_id: Uuid,
    pub client_label: String,
    pub items: Value,
    pub total_price: BigDecimal,
    pub status: String,
    pub created_at: DateTime<Utc>,
}

impl NewOrderRow {
    pub fn from_order(order: &Order) -> Result<Self, DomainError> {
        let items = serde_json::to_value(&order.items)
            .map_err(|e| DomainError::Internal(e.to_string()))?;
        Ok(NewOrderRow {
            id: order.id,
            pharmacy_id: order.pharmacy_id,
            client_id: order.client_id,
            client_label: order.client_label.clone(),
            items,
            total_price: order.total_price.clone(),
            status: order.status.as_str().to_string(),
            created_at: order.created_at,
        })
    }

    /// Same record, addressed to the pharmacy-scoped table.
    pub fn scoped(&self) -> NewPharmacyOrderRow {
        NewPharmacyOrderRow {
            id: self.id,
            pharmacy_id: self.pharmacy_id,
            client_id: self.client_id,
            client_label: self.client_label.clone(),
            items: self.items.clone(),
            total_price: self.total_price.clone(),
            status: self.status.clone(),
            created_at: self.created_at,
        }
    }
}
