use actix_web::{web, HttpResponse};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::domain::pharmacy::{
    Coordinates, NearbyPharmacy, NewPharmacy, Pharmacy, PharmacyUpdate, DEFAULT_NEARBY_RADIUS_KM,
};
use crate::errors::AppError;
use crate::AppState;

#[derive(Debug, Deserialize, ToSchema)]
pub struct RegisterPharmacyRequest {
    pub name: String,
    pub latitude: f64,
    pub longitude: f64,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct PharmacyResponse {
    pub id: Uuid,
    pub name: String,
    pub latitude: f64,
    pub longitude: f64,
    pub is_open: bool,
    pub created_at: String,
}

/// Profile fields the pharmacist can change. Omitted fields are kept.
#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdatePharmacyRequest {
    pub name: Option<String>,
    pub is_open: Option<bool>,
}

impl From<Pharmacy> for PharmacyResponse {
    fn from(p: Pharmacy) -> Self {
        PharmacyResponse {
            id: p.id,
            name: p.name,
            latitude: p.location.latitude,
            longitude: p.location.longitude,
            is_open: p.is_open,
            created_at: p.created_at.to_rfc3339(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct NearbyPharmacyResponse {
    pub pharmacy: PharmacyResponse,
    pub distance_km: f64,
}

impl From<NearbyPharmacy> for NearbyPharmacyResponse {
    fn from(n: NearbyPharmacy) -> Self {
        NearbyPharmacyResponse {
            pharmacy: n.pharmacy.into(),
            distance_km: n.distance_km,
        }
    }
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct NearbyParams {
    pub latitude: f64,
    pub longitude: f64,
    /// Search radius in kilometres. Defaults to 5.
    pub radius_km: Option<f64>,
}

#[utoipa::path(
    post,
    path = "/pharmacies",
    request_body = RegisterPharmacyRequest,
    responses(
        (status = 201, description = "Pharmacy registered", body = PharmacyResponse),
        (status = 400, description = "Blank name or coordinates out of range"),
        (status = 500, description = "Internal server error"),
    ),
    tag = "pharmacies"
)]
pub async fn register_pharmacy(
    state: web::Data<AppState>,
    body: web::Json<RegisterPharmacyRequest>,
) -> Result<HttpResponse, AppError> {
    let body = body.into_inner();
    let pharmacy = NewPharmacy {
        name: body.name,
        location: Coordinates::new(body.latitude, body.longitude)?,
    };
    let pharmacy = state.catalog.register_pharmacy(pharmacy).await?;
    Ok(HttpResponse::Created().json(PharmacyResponse::from(pharmacy)))
}

/// GET /pharmacies/nearby
///
/// Open pharmacies within `radius_km` of the given point, closest first.
#[utoipa::path(
    get,
    path = "/pharmacies/nearby",
    params(
        ("latitude" = f64, Query, description = "Latitude of the client"),
        ("longitude" = f64, Query, description = "Longitude of the client"),
        ("radius_km" = Option<f64>, Query, description = "Search radius, default 5 km"),
    ),
    responses(
        (status = 200, description = "Pharmacies in range", body = [NearbyPharmacyResponse]),
        (status = 400, description = "Invalid coordinates or radius"),
        (status = 500, description = "Internal server error"),
    ),
    tag = "pharmacies"
)]
pub async fn nearby_pharmacies(
    state: web::Data<AppState>,
    query: web::Query<NearbyParams>,
) -> Result<HttpResponse, AppError> {
    let params = query.into_inner();
    let origin = Coordinates::new(params.latitude, params.longitude)?;
    let radius = params.radius_km.unwrap_or(DEFAULT_NEARBY_RADIUS_KM);

    let found = state.catalog.nearby(origin, radius).await?;
    let body: Vec<NearbyPharmacyResponse> =
        found.into_iter().map(NearbyPharmacyResponse::from).collect();
    Ok(HttpResponse::Ok().json(body))
}

#[utoipa::path(
    get,
    path = "/pharmacies/{id}",
    params(
        ("id" = Uuid, Path, description = "Pharmacy UUID"),
    ),
    responses(
        (status = 200, description = "Pharmacy found", body = PharmacyResponse),
        (status = 404, description = "Pharmacy not found"),
        (status = 500, description = "Internal server error"),
    ),
    tag = "pharmacies"
)]
pub async fn get_pharmacy(
    state: web::Data<AppState>,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
    match state.catalog.get_pharmacy(path.into_inner()).await? {
        Some(pharmacy) => Ok(HttpResponse::Ok().json(PharmacyResponse::from(pharmacy))),
        None => Err(AppError::NotFound),
    }
}

#[utoipa::path(
    put,
    path = "/pharmacies/{id}",
    params(
        ("id" = Uuid, Path, description = "Pharmacy UUID"),
    ),
    request_body = UpdatePharmacyRequest,
    responses(
        (status = 200, description = "Profile updated", body = PharmacyResponse),
        (status = 400, description = "Blank name"),
        (status = 404, description = "Pharmacy not found"),
        (status = 500, description = "Internal server error"),
    ),
    tag = "pharmacies"
)]
pub async fn update_pharmacy(
    state: web::Data<AppState>,
    path: web::Path<Uuid>,
    body: web::Json<UpdatePharmacyRequest>,
) -> Result<HttpResponse, AppError> {
    let body = body.into_inner();
    let update = PharmacyUpdate {
        name: body.name,
        is_open: body.is_open,
    };
    let pharmacy = state
        .catalog
        .update_pharmacy(path.into_inner(), update)
        .await?;
    Ok(HttpResponse::Ok().json(PharmacyResponse::from(pharmacy)))
}
