use bigdecimal::BigDecimal;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::errors::DomainError;
use super::reference::ReferenceMedicine;

/// A reference entry stocked by one pharmacy at its own price.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Medicine {
    pub id: Uuid,
    pub pharmacy_id: Uuid,
    pub reference_id: Uuid,
    pub name: String,
    pub category: String,
    pub unit_price: BigDecimal,
    pub available: bool,
    pub created_at: DateTime<Utc>,
}

impl Medicine {
    /// Case-insensitive substring match on the name. A blank term matches everything.
    pub fn matches_search(&self, term: &str) -> bool {
        let term = term.trim().to_lowercase();
        term.is_empty() || self.name.to_lowercase().contains(&term)
    }
}

#[derive(Debug, Clone)]
pub struct NewMedicine {
    pub reference_id: Uuid,
    pub name: String,
    pub category: String,
    pub unit_price: BigDecimal,
}

impl NewMedicine {
    /// Name and category are copied from the reference entry.
    pub fn from_reference(reference: &ReferenceMedicine, unit_price: BigDecimal) -> Self {
        Self {
            reference_id: reference.id,
            name: reference.name.clone(),
            category: reference.category.clone(),
            unit_price,
        }
    }

    pub fn validate(&self) -> Result<(), DomainError> {
        if self.name.trim().is_empty() {
            return Err(DomainError::InvalidInput(
                "medicine name must not be blank".to_string(),
            ));
        }
        if self.unit_price < BigDecimal::from(0) {
            return Err(DomainError::InvalidInput(format!(
                "unit price for '{}' must not be negative",
                self.name
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default)]
pub struct MedicineQuery {
    pub available_only: bool,
    pub search: Option<String>,
}

impl MedicineQuery {
    pub fn matches(&self, medicine: &Medicine) -> bool {
        if self.available_only && !medicine.available {
            return false;
        }
        self.search
            .as_deref()
            .map_or(true, |term| medicine.matches_search(term))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn medicine(name: &str, available: bool) -> Medicine {
        Medicine {
            id: Uuid::new_v4(),
            pharmacy_id: Uuid::new_v4(),
            reference_id: Uuid::new_v4(),
            name: name.to_string(),
            category: "Analgésiques".to_string(),
            unit_price: BigDecimal::from(50),
            available,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn search_is_case_insensitive_and_trimmed() {
        let m = medicine("Paracétamol 500mg", true);
        assert!(m.matches_search("  paracé "));
        assert!(m.matches_search("500MG"));
        assert!(!m.matches_search("ibuprofène"));
    }

    #[test]
    fn blank_search_matches_everything() {
        assert!(medicine("Aspirine", true).matches_search("   "));
    }

    #[test]
    fn query_filters_unavailable_when_asked() {
        let query = MedicineQuery {
            available_only: true,
            search: None,
        };
        assert!(query.matches(&medicine("Aspirine", true)));
        assert!(!query.matches(&medicine("Aspirine", false)));
        assert!(MedicineQuery::default().matches(&medicine("Aspirine", false)));
    }

    #[test]
    fn blank_name_is_invalid() {
        let new = NewMedicine {
            reference_id: Uuid::new_v4(),
            name: "  ".to_string(),
            category: "Antibiotiques".to_string(),
            unit_price: BigDecimal::from(1),
        };
        assert!(matches!(new.validate(), Err(DomainError::InvalidInput(_))));
    }

    #[test]
    fn stocked_medicine_copies_the_reference() {
        let reference = ReferenceMedicine {
            id: Uuid::new_v4(),
            name: "Amoxicilline".to_string(),
            category: "Antibiotiques".to_string(),
            created_at: Utc::now(),
        };
        let new = NewMedicine::from_reference(&reference, BigDecimal::from(300));
        assert_eq!(new.reference_id, reference.id);
        assert_eq!(new.name, "Amoxicilline");
        assert_eq!(new.category, "Antibiotiques");
        assert!(new.validate().is_ok());
    }

    #[test]
    fn negative_price_is_invalid() {
        let new = NewMedicine {
            reference_id: Uuid::new_v4(),
            name: "Aspirine".to_string(),
            category: "Analgésiques".to_string(),
            unit_price: BigDecimal::from(-1),
        };
        assert!(matches!(new.validate(), Err(DomainError::InvalidInput(_))));
    }
}
