use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::errors::DomainError;

/// Kilometres per degree used by the flat distance approximation.
const KM_PER_DEGREE: f64 = 111.0;

pub const DEFAULT_NEARBY_RADIUS_KM: f64 = 5.0;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinates {
    pub fn new(latitude: f64, longitude: f64) -> Result<Self, DomainError> {
        if !(-90.0..=90.0).contains(&latitude) {
            return Err(DomainError::InvalidInput(format!(
                "latitude {} out of range",
                latitude
            )));
        }
        if !(-180.0..=180.0).contains(&longitude) {
            return Err(DomainError::InvalidInput(format!(
                "longitude {} out of range",
                longitude
            )));
        }
        Ok(Self {
            latitude,
            longitude,
        })
    }

    /// Flat-earth approximation, good enough for a few kilometres around a client.
    pub fn approx_distance_km(&self, other: &Coordinates) -> f64 {
        let dx = (other.latitude - self.latitude) * KM_PER_DEGREE;
        let dy = (other.longitude - self.longitude) * KM_PER_DEGREE;
        (dx * dx + dy * dy).sqrt()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Pharmacy {
    pub id: Uuid,
    pub name: String,
    pub location: Coordinates,
    /// Closed pharmacies are hidden from nearby searches and take no orders.
    pub is_open: bool,
    pub created_at: DateTime<Utc>,
}

impl Pharmacy {
    pub fn ensure_open(&self) -> Result<(), DomainError> {
        if self.is_open {
            Ok(())
        } else {
            Err(DomainError::Conflict(format!(
                "pharmacy {} is closed",
                self.name
            )))
        }
    }
}

/// Profile changes made by the pharmacist. Missing fields stay as they are.
#[derive(Debug, Clone, Default)]
pub struct PharmacyUpdate {
    pub name: Option<String>,
    pub is_open: Option<bool>,
}

impl PharmacyUpdate {
    pub fn validate(&self) -> Result<(), DomainError> {
        match &self.name {
            Some(name) if name.trim().is_empty() => Err(DomainError::InvalidInput(
                "pharmacy name must not be blank".to_string(),
            )),
            _ => Ok(()),
        }
    }

    pub fn apply(&self, pharmacy: &mut Pharmacy) {
        if let Some(name) = &self.name {
            pharmacy.name = name.trim().to_string();
        }
        if let Some(is_open) = self.is_open {
            pharmacy.is_open = is_open;
        }
    }
}

#[derive(Debug, Clone)]
pub struct NewPharmacy {
    pub name: String,
    pub location: Coordinates,
}

impl NewPharmacy {
    pub fn validate(&self) -> Result<(), DomainError> {
        if self.name.trim().is_empty() {
            return Err(DomainError::InvalidInput(
                "pharmacy name must not be blank".to_string(),
            ));
        }
        Coordinates::new(self.location.latitude, self.location.longitude).map(|_| ())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct NearbyPharmacy {
    pub pharmacy: Pharmacy,
    pub distance_km: f64,
}

/// Open pharmacies within `radius_km` of `origin`, closest first.
pub fn nearby(pharmacies: Vec<Pharmacy>, origin: &Coordinates, radius_km: f64) -> Vec<NearbyPharmacy> {
    let mut found: Vec<NearbyPharmacy> = pharmacies
        .into_iter()
        .filter(|p| p.is_open)
        .map(|p| {
            let distance_km = origin.approx_distance_km(&p.location);
            NearbyPharmacy {
                pharmacy: p,
                distance_km,
            }
        })
        .filter(|n| n.distance_km <= radius_km)
        .collect();
    found.sort_by(|a, b| a.distance_km.total_cmp(&b.distance_km));
    found
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pharmacy(name: &str, latitude: f64, longitude: f64) -> Pharmacy {
        Pharmacy {
            id: Uuid::new_v4(),
            name: name.to_string(),
            location: Coordinates {
                latitude,
                longitude,
            },
            is_open: true,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn distance_uses_111_km_per_degree() {
        let a = Coordinates::new(36.0, 3.0).unwrap();
        let b = Coordinates::new(36.03, 3.04).unwrap();
        let d = a.approx_distance_km(&b);
        assert!((d - 5.55).abs() < 1e-9, "got {}", d);
    }

    #[test]
    fn nearby_filters_by_radius_and_sorts_by_distance() {
        let origin = Coordinates::new(36.75, 3.06).unwrap();
        let result = nearby(
            vec![
                pharmacy("Far", 36.90, 3.06),
                pharmacy("El Amal", 36.77, 3.06),
                pharmacy("Centrale", 36.751, 3.06),
            ],
            &origin,
            DEFAULT_NEARBY_RADIUS_KM,
        );
        let names: Vec<&str> = result.iter().map(|n| n.pharmacy.name.as_str()).collect();
        assert_eq!(names, vec!["Centrale", "El Amal"]);
    }

    #[test]
    fn closed_pharmacies_are_not_nearby() {
        let origin = Coordinates::new(36.75, 3.06).unwrap();
        let mut closed = pharmacy("Nuit", 36.751, 3.06);
        closed.is_open = false;
        let result = nearby(vec![closed, pharmacy("Jour", 36.752, 3.06)], &origin, 5.0);
        let names: Vec<&str> = result.iter().map(|n| n.pharmacy.name.as_str()).collect();
        assert_eq!(names, vec!["Jour"]);
    }

    #[test]
    fn update_only_touches_given_fields() {
        let mut p = pharmacy("Centrale", 36.75, 3.06);
        PharmacyUpdate {
            name: None,
            is_open: Some(false),
        }
        .apply(&mut p);
        assert_eq!(p.name, "Centrale");
        assert!(!p.is_open);
        assert!(matches!(p.ensure_open(), Err(DomainError::Conflict(_))));

        PharmacyUpdate {
            name: Some("  El Amal ".to_string()),
            is_open: None,
        }
        .apply(&mut p);
        assert_eq!(p.name, "El Amal");
        assert!(!p.is_open);
    }

    #[test]
    fn blank_new_name_is_invalid() {
        let update = PharmacyUpdate {
            name: Some(" ".to_string()),
            is_open: None,
        };
        assert!(matches!(update.validate(), Err(DomainError::InvalidInput(_))));
        assert!(PharmacyUpdate::default().validate().is_ok());
    }

    #[test]
    fn out_of_range_coordinates_are_rejected() {
        assert!(Coordinates::new(91.0, 0.0).is_err());
        assert!(Coordinates::new(0.0, -181.0).is_err());
    }
}
