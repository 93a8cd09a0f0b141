//! The shared medicine reference list. Pharmacies stock entries from it and
//! set their own price; the name travels with the stocked medicine.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::errors::DomainError;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReferenceMedicine {
    pub id: Uuid,
    pub name: String,
    pub category: String,
    pub created_at: DateTime<Utc>,
}

impl ReferenceMedicine {
    /// Case-insensitive substring match on the name. A blank term matches everything.
    pub fn matches_search(&self, term: &str) -> bool {
        let term = term.trim().to_lowercase();
        term.is_empty() || self.name.to_lowercase().contains(&term)
    }
}

#[derive(Debug, Clone)]
pub struct NewReferenceMedicine {
    pub name: String,
    pub category: String,
}

impl NewReferenceMedicine {
    pub fn validate(&self) -> Result<(), DomainError> {
        if self.name.trim().is_empty() {
            return Err(DomainError::InvalidInput(
                "medicine name must not be blank".to_string(),
            ));
        }
        if self.category.trim().is_empty() {
            return Err(DomainError::InvalidInput(format!(
                "category for '{}' must not be blank",
                self.name.trim()
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default)]
pub struct ReferenceQuery {
    pub search: Option<String>,
    /// Exact category, ignoring case.
    pub category: Option<String>,
}

impl ReferenceQuery {
    pub fn matches(&self, entry: &ReferenceMedicine) -> bool {
        let in_category = self.category.as_deref().map_or(true, |c| {
            let c = c.trim();
            c.is_empty() || entry.category.to_lowercase() == c.to_lowercase()
        });
        in_category
            && self
                .search
                .as_deref()
                .map_or(true, |term| entry.matches_search(term))
    }
}

/// Reference list order: by name, case-insensitively.
pub fn sort_by_name(entries: &mut [ReferenceMedicine]) {
    entries.sort_by_key(|e| e.name.to_lowercase());
}
