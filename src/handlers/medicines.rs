use actix_web::{web, HttpResponse};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use super::parse_price;
use crate::domain::medicine::{Medicine, MedicineQuery};
use crate::domain::reference::{NewReferenceMedicine, ReferenceMedicine, ReferenceQuery};
use crate::errors::AppError;
use crate::AppState;

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateReferenceRequest {
    pub name: String,
    pub category: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ReferenceResponse {
    pub id: Uuid,
    pub name: String,
    pub category: String,
    pub created_at: String,
}

impl From<ReferenceMedicine> for ReferenceResponse {
    fn from(r: ReferenceMedicine) -> Self {
        ReferenceResponse {
            id: r.id,
            name: r.name,
            category: r.category,
            created_at: r.created_at.to_rfc3339(),
        }
    }
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct ListReferencesParams {
    pub search: Option<String>,
    pub category: Option<String>,
}

/// Stocks a reference entry. The name comes from the reference list.
#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateMedicineRequest {
    pub reference_id: Uuid,
    /// Decimal price as a string, e.g. "4.50"
    pub unit_price: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct MedicineResponse {
    pub id: Uuid,
    pub pharmacy_id: Uuid,
    pub reference_id: Uuid,
    pub name: String,
    pub category: String,
    pub unit_price: String,
    pub available: bool,
    pub created_at: String,
}

impl From<Medicine> for MedicineResponse {
    fn from(m: Medicine) -> Self {
        MedicineResponse {
            id: m.id,
            pharmacy_id: m.pharmacy_id,
            reference_id: m.reference_id,
            name: m.name,
            category: m.category,
            unit_price: m.unit_price.to_string(),
            available: m.available,
            created_at: m.created_at.to_rfc3339(),
        }
    }
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct ListMedicinesParams {
    #[serde(default)]
    pub available_only: bool,
    pub search: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct AvailabilityRequest {
    pub available: bool,
}

#[utoipa::path(
    post,
    path = "/medicines",
    request_body = CreateReferenceRequest,
    responses(
        (status = 201, description = "Entry added to the reference list", body = ReferenceResponse),
        (status = 400, description = "Blank name or category"),
        (status = 409, description = "An entry with this name exists"),
        (status = 500, description = "Internal server error"),
    ),
    tag = "medicines"
)]
pub async fn add_reference(
    state: web::Data<AppState>,
    body: web::Json<CreateReferenceRequest>,
) -> Result<HttpResponse, AppError> {
    let body = body.into_inner();
    let entry = NewReferenceMedicine {
        name: body.name,
        category: body.category,
    };
    let entry = state.catalog.add_reference(entry).await?;
    Ok(HttpResponse::Created().json(ReferenceResponse::from(entry)))
}

/// GET /medicines
///
/// The shared reference list, sorted by name. `search` is a case-insensitive
/// substring match on the name; `category` must match exactly, ignoring case.
#[utoipa::path(
    get,
    path = "/medicines",
    params(
        ("search" = Option<String>, Query, description = "Name filter"),
        ("category" = Option<String>, Query, description = "Category filter"),
    ),
    responses(
        (status = 200, description = "Reference entries", body = [ReferenceResponse]),
        (status = 500, description = "Internal server error"),
    ),
    tag = "medicines"
)]
pub async fn list_references(
    state: web::Data<AppState>,
    query: web::Query<ListReferencesParams>,
) -> Result<HttpResponse, AppError> {
    let params = query.into_inner();
    let query = ReferenceQuery {
        search: params.search,
        category: params.category,
    };
    let entries = state.catalog.list_references(&query).await?;
    let body: Vec<ReferenceResponse> = entries.into_iter().map(ReferenceResponse::from).collect();
    Ok(HttpResponse::Ok().json(body))
}

#[utoipa::path(
    get,
    path = "/medicines/{id}",
    params(
        ("id" = Uuid, Path, description = "Reference entry UUID"),
    ),
    responses(
        (status = 200, description = "Reference entry", body = ReferenceResponse),
        (status = 404, description = "No such entry"),
        (status = 500, description = "Internal server error"),
    ),
    tag = "medicines"
)]
pub async fn get_reference(
    state: web::Data<AppState>,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
    match state.catalog.get_reference(path.into_inner()).await? {
        Some(entry) => Ok(HttpResponse::Ok().json(ReferenceResponse::from(entry))),
        None => Err(AppError::NotFound),
    }
}

#[utoipa::path(
    post,
    path = "/pharmacies/{id}/medicines",
    params(
        ("id" = Uuid, Path, description = "Pharmacy UUID"),
    ),
    request_body = CreateMedicineRequest,
    responses(
        (status = 201, description = "Medicine stocked", body = MedicineResponse),
        (status = 400, description = "Unknown reference entry or invalid price"),
        (status = 404, description = "Pharmacy not found"),
        (status = 409, description = "The pharmacy already stocks this entry"),
        (status = 500, description = "Internal server error"),
    ),
    tag = "medicines"
)]
pub async fn add_medicine(
    state: web::Data<AppState>,
    path: web::Path<Uuid>,
    body: web::Json<CreateMedicineRequest>,
) -> Result<HttpResponse, AppError> {
    let body = body.into_inner();
    let unit_price = parse_price("unit_price", &body.unit_price)?;
    let medicine = state
        .catalog
        .add_medicine(path.into_inner(), body.reference_id, unit_price)
        .await?;
    Ok(HttpResponse::Created().json(MedicineResponse::from(medicine)))
}

/// GET /pharmacies/{id}/medicines
///
/// `search` is a case-insensitive substring match on the name.
#[utoipa::path(
    get,
    path = "/pharmacies/{id}/medicines",
    params(
        ("id" = Uuid, Path, description = "Pharmacy UUID"),
        ("available_only" = Option<bool>, Query, description = "Hide unavailable medicines"),
        ("search" = Option<String>, Query, description = "Name filter"),
    ),
    responses(
        (status = 200, description = "Catalog of the pharmacy", body = [MedicineResponse]),
        (status = 404, description = "Pharmacy not found"),
        (status = 500, description = "Internal server error"),
    ),
    tag = "medicines"
)]
pub async fn list_medicines(
    state: web::Data<AppState>,
    path: web::Path<Uuid>,
    query: web::Query<ListMedicinesParams>,
) -> Result<HttpResponse, AppError> {
    let params = query.into_inner();
    let query = MedicineQuery {
        available_only: params.available_only,
        search: params.search,
    };
    let medicines = state
        .catalog
        .list_medicines(path.into_inner(), &query)
        .await?;
    let body: Vec<MedicineResponse> = medicines.into_iter().map(MedicineResponse::from).collect();
    Ok(HttpResponse::Ok().json(body))
}

#[utoipa::path(
    put,
    path = "/pharmacies/{id}/medicines/{medicine_id}/availability",
    params(
        ("id" = Uuid, Path, description = "Pharmacy UUID"),
        ("medicine_id" = Uuid, Path, description = "Medicine UUID"),
    ),
    request_body = AvailabilityRequest,
    responses(
        (status = 200, description = "Availability updated", body = MedicineResponse),
        (status = 404, description = "Medicine not found in this pharmacy"),
        (status = 500, description = "Internal server error"),
    ),
    tag = "medicines"
)]
pub async fn set_availability(
    state: web::Data<AppState>,
    path: web::Path<(Uuid, Uuid)>,
    body: web::Json<AvailabilityRequest>,
) -> Result<HttpResponse, AppError> {
    let (pharmacy_id, medicine_id) = path.into_inner();
    let medicine = state
        .catalog
        .set_availability(pharmacy_id, medicine_id, body.available)
        .await?;
    Ok(HttpResponse::Ok().json(MedicineResponse::from(medicine)))
}
