use std::sync::Arc;

use bigdecimal::BigDecimal;
use log::info;
use uuid::Uuid;

use crate::domain::errors::DomainError;
use crate::domain::medicine::{Medicine, MedicineQuery, NewMedicine};
use crate::domain::pharmacy::{
    nearby, Coordinates, NearbyPharmacy, NewPharmacy, Pharmacy, PharmacyUpdate,
};
use crate::domain::ports::{MedicineCatalog, PharmacyDirectory, ReferenceCatalog};
use crate::domain::reference::{NewReferenceMedicine, ReferenceMedicine, ReferenceQuery};

/// Pharmacies, the shared reference list, and the medicines each pharmacy
/// stocks from it.
#[derive(Clone)]
pub struct CatalogService {
    catalog: Arc<dyn MedicineCatalog>,
    directory: Arc<dyn PharmacyDirectory>,
    references: Arc<dyn ReferenceCatalog>,
}

impl CatalogService {
    pub fn new(
        catalog: Arc<dyn MedicineCatalog>,
        directory: Arc<dyn PharmacyDirectory>,
        references: Arc<dyn ReferenceCatalog>,
    ) -> Self {
        Self {
            catalog,
            directory,
            references,
        }
    }

    pub async fn register_pharmacy(&self, pharmacy: NewPharmacy) -> Result<Pharmacy, DomainError> {
        pharmacy.validate()?;
        let pharmacy = self.directory.register(pharmacy).await?;
        info!("Pharmacy {} registered as {}", pharmacy.name, pharmacy.id);
        Ok(pharmacy)
    }

    pub async fn get_pharmacy(&self, id: Uuid) -> Result<Option<Pharmacy>, DomainError> {
        self.directory.find(id).await
    }

    pub async fn update_pharmacy(
        &self,
        id: Uuid,
        update: PharmacyUpdate,
    ) -> Result<Pharmacy, DomainError> {
        update.validate()?;
        let pharmacy = self.directory.update(id, update).await?;
        info!(
            "Pharmacy {} is now {} ({})",
            pharmacy.id,
            pharmacy.name,
            if pharmacy.is_open { "open" } else { "closed" }
        );
        Ok(pharmacy)
    }

    pub async fn nearby(
        &self,
        origin: Coordinates,
        radius_km: f64,
    ) -> Result<Vec<NearbyPharmacy>, DomainError> {
        if !radius_km.is_finite() || radius_km < 0.0 {
            return Err(DomainError::InvalidInput(format!(
                "radius {} must be a non-negative number",
                radius_km
            )));
        }
        let all = self.directory.list().await?;
        Ok(nearby(all, &origin, radius_km))
    }

    pub async fn add_reference(
        &self,
        entry: NewReferenceMedicine,
    ) -> Result<ReferenceMedicine, DomainError> {
        entry.validate()?;
        let entry = self.references.add(entry).await?;
        info!("Reference medicine {} added as {}", entry.name, entry.id);
        Ok(entry)
    }

    pub async fn get_reference(&self, id: Uuid) -> Result<Option<ReferenceMedicine>, DomainError> {
        self.references.find(id).await
    }

    pub async fn list_references(
        &self,
        query: &ReferenceQuery,
    ) -> Result<Vec<ReferenceMedicine>, DomainError> {
        self.references.list(query).await
    }

    /// Stocks a reference entry at the pharmacy's own price.
    pub async fn add_medicine(
        &self,
        pharmacy_id: Uuid,
        reference_id: Uuid,
        unit_price: BigDecimal,
    ) -> Result<Medicine, DomainError> {
        self.require_pharmacy(pharmacy_id).await?;
        let reference = self.references.find(reference_id).await?.ok_or_else(|| {
            DomainError::InvalidInput(format!(
                "reference medicine {} does not exist",
                reference_id
            ))
        })?;
        let medicine = NewMedicine::from_reference(&reference, unit_price);
        medicine.validate()?;
        let medicine = self.catalog.add(pharmacy_id, medicine).await?;
        info!(
            "Pharmacy {} stocks {} at {}",
            pharmacy_id, medicine.name, medicine.unit_price
        );
        Ok(medicine)
    }

    pub async fn list_medicines(
        &self,
        pharmacy_id: Uuid,
        query: &MedicineQuery,
    ) -> Result<Vec<Medicine>, DomainError> {
        self.require_pharmacy(pharmacy_id).await?;
        self.catalog.list(pharmacy_id, query).await
    }

    pub async fn set_availability(
        &self,
        pharmacy_id: Uuid,
        medicine_id: Uuid,
        available: bool,
    ) -> Result<Medicine, DomainError> {
        self.catalog
            .set_available(pharmacy_id, medicine_id, available)
            .await
    }

    async fn require_pharmacy(&self, id: Uuid) -> Result<(), DomainError> {
        match self.directory.find(id).await? {
            Some(_) => Ok(()),
            None => Err(DomainError::NotFound(format!("pharmacy {}", id))),
        }
    }
}
