use async_trait::async_trait;
use chrono::Utc;
use diesel::prelude::*;
use uuid::Uuid;

use crate::db::DbPool;
use crate::domain::errors::DomainError;
use crate::domain::medicine::{Medicine, MedicineQuery, NewMedicine};
use crate::domain::pharmacy::{NewPharmacy, Pharmacy, PharmacyUpdate};
use crate::domain::ports::{MedicineCatalog, PharmacyDirectory, ReferenceCatalog};
use crate::domain::reference::{
    sort_by_name, NewReferenceMedicine, ReferenceMedicine, ReferenceQuery,
};
use crate::schema::{medicines, pharmacies, reference_medicines};

use super::models::{MedicineRow, PharmacyChanges, PharmacyRow, ReferenceMedicineRow};
use super::order_repo::run_blocking;

/// Pharmacy directory, reference list and per-pharmacy medicine catalog
/// backed by PostgreSQL.
pub struct DieselCatalog {
    pool: DbPool,
}

impl DieselCatalog {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl MedicineCatalog for DieselCatalog {
    async fn add(&self, pharmacy_id: Uuid, medicine: NewMedicine) -> Result<Medicine, DomainError> {
        let row = MedicineRow {
            id: Uuid::new_v4(),
            pharmacy_id,
            name: medicine.name.trim().to_string(),
            unit_price: medicine.unit_price,
            available: true,
            created_at: Utc::now(),
            reference_id: medicine.reference_id,
            category: medicine.category,
        };
        let pool = self.pool.clone();
        let row = run_blocking(move || {
            let mut conn = pool.get()?;
            Ok(diesel::insert_into(medicines::table)
                .values(&row)
                .returning(MedicineRow::as_returning())
                .get_result::<MedicineRow>(&mut conn)?)
        })
        .await?;
        Ok(row.into())
    }

    async fn find(&self, pharmacy_id: Uuid, id: Uuid) -> Result<Option<Medicine>, DomainError> {
        let pool = self.pool.clone();
        let row = run_blocking(move || {
            let mut conn = pool.get()?;
            Ok(medicines::table
                .filter(medicines::id.eq(id))
                .filter(medicines::pharmacy_id.eq(pharmacy_id))
                .select(MedicineRow::as_select())
                .first::<MedicineRow>(&mut conn)
                .optional()?)
        })
        .await?;
        Ok(row.map(Medicine::from))
    }

    async fn list(&self, pharmacy_id: Uuid, query: &MedicineQuery) -> Result<Vec<Medicine>, DomainError> {
        let pool = self.pool.clone();
        let available_only = query.available_only;
        let rows = run_blocking(move || {
            let mut conn = pool.get()?;
            let mut select = medicines::table
                .filter(medicines::pharmacy_id.eq(pharmacy_id))
                .order(medicines::name.asc())
                .select(MedicineRow::as_select())
                .into_boxed();
            if available_only {
                select = select.filter(medicines::available.eq(true));
            }
            Ok(select.load::<MedicineRow>(&mut conn)?)
        })
        .await?;

        // Name search stays in Rust so both adapters match the same way.
        Ok(rows
            .into_iter()
            .map(Medicine::from)
            .filter(|m| query.matches(m))
            .collect())
    }

    async fn set_available(
        &self,
        pharmacy_id: Uuid,
        id: Uuid,
        available: bool,
    ) -> Result<Medicine, DomainError> {
        let pool = self.pool.clone();
        let row = run_blocking(move || {
            let mut conn = pool.get()?;
            Ok(diesel::update(
                medicines::table
                    .filter(medicines::id.eq(id))
                    .filter(medicines::pharmacy_id.eq(pharmacy_id)),
            )
            .set(medicines::available.eq(available))
            .returning(MedicineRow::as_returning())
            .get_result::<MedicineRow>(&mut conn)
            .optional()?)
        })
        .await?;
        row.map(Medicine::from)
            .ok_or_else(|| DomainError::NotFound(format!("medicine {}", id)))
    }
}

#[async_trait]
impl PharmacyDirectory for DieselCatalog {
    async fn register(&self, pharmacy: NewPharmacy) -> Result<Pharmacy, DomainError> {
        let row = PharmacyRow {
            id: Uuid::new_v4(),
            name: pharmacy.name.trim().to_string(),
            latitude: pharmacy.location.latitude,
            longitude: pharmacy.location.longitude,
            created_at: Utc::now(),
            is_open: true,
        };
        let pool = self.pool.clone();
        let row = run_blocking(move || {
            let mut conn = pool.get()?;
            Ok(diesel::insert_into(pharmacies::table)
                .values(&row)
                .returning(PharmacyRow::as_returning())
                .get_result::<PharmacyRow>(&mut conn)?)
        })
        .await?;
        Ok(row.into())
    }

    async fn find(&self, id: Uuid) -> Result<Option<Pharmacy>, DomainError> {
        let pool = self.pool.clone();
        let row = run_blocking(move || {
            let mut conn = pool.get()?;
            Ok(pharmacies::table
                .filter(pharmacies::id.eq(id))
                .select(PharmacyRow::as_select())
                .first::<PharmacyRow>(&mut conn)
                .optional()?)
        })
        .await?;
        Ok(row.map(Pharmacy::from))
    }

    async fn list(&self) -> Result<Vec<Pharmacy>, DomainError> {
        let pool = self.pool.clone();
        let rows = run_blocking(move || {
            let mut conn = pool.get()?;
            Ok(pharmacies::table
                .select(PharmacyRow::as_select())
                .load::<PharmacyRow>(&mut conn)?)
        })
        .await?;
        Ok(rows.into_iter().map(Pharmacy::from).collect())
    }

    async fn update(&self, id: Uuid, update: PharmacyUpdate) -> Result<Pharmacy, DomainError> {
        let changes = PharmacyChanges {
            name: update.name.map(|n| n.trim().to_string()),
            is_open: update.is_open,
        };
        let pool = self.pool.clone();
        let row = run_blocking(move || {
            let mut conn = pool.get()?;
            let target = pharmacies::table.filter(pharmacies::id.eq(id));
            // An empty changeset is an error in Diesel.
            if changes.name.is_none() && changes.is_open.is_none() {
                return Ok(target
                    .select(PharmacyRow::as_select())
                    .first::<PharmacyRow>(&mut conn)
                    .optional()?);
            }
            Ok(diesel::update(target)
                .set(&changes)
                .returning(PharmacyRow::as_returning())
                .get_result::<PharmacyRow>(&mut conn)
                .optional()?)
        })
        .await?;
        row.map(Pharmacy::from)
            .ok_or_else(|| DomainError::NotFound(format!("pharmacy {}", id)))
    }
}

#[async_trait]
impl ReferenceCatalog for DieselCatalog {
    async fn add(&self, entry: NewReferenceMedicine) -> Result<ReferenceMedicine, DomainError> {
        let row = ReferenceMedicineRow {
            id: Uuid::new_v4(),
            name: entry.name.trim().to_string(),
            category: entry.category.trim().to_string(),
            created_at: Utc::now(),
        };
        let pool = self.pool.clone();
        let row = run_blocking(move || {
            let mut conn = pool.get()?;
            Ok(diesel::insert_into(reference_medicines::table)
                .values(&row)
                .returning(ReferenceMedicineRow::as_returning())
                .get_result::<ReferenceMedicineRow>(&mut conn)?)
        })
        .await?;
        Ok(row.into())
    }

    async fn find(&self, id: Uuid) -> Result<Option<ReferenceMedicine>, DomainError> {
        let pool = self.pool.clone();
        let row = run_blocking(move || {
            let mut conn = pool.get()?;
            Ok(reference_medicines::table
                .filter(reference_medicines::id.eq(id))
                .select(ReferenceMedicineRow::as_select())
                .first::<ReferenceMedicineRow>(&mut conn)
                .optional()?)
        })
        .await?;
        Ok(row.map(ReferenceMedicine::from))
    }

    async fn list(&self, query: &ReferenceQuery) -> Result<Vec<ReferenceMedicine>, DomainError> {
        let pool = self.pool.clone();
        let rows = run_blocking(move || {
            let mut conn = pool.get()?;
            Ok(reference_medicines::table
                .select(ReferenceMedicineRow::as_select())
                .load::<ReferenceMedicineRow>(&mut conn)?)
        })
        .await?;

        let mut entries: Vec<ReferenceMedicine> = rows
            .into_iter()
            .map(ReferenceMedicine::from)
            .filter(|r| query.matches(r))
            .collect();
        sort_by_name(&mut entries);
        Ok(entries)
    }
}
