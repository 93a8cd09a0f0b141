use actix_web::{web, HttpResponse};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::domain::order::{Order, OrderItem, OrderLineInput, OrderStatus, PlaceOrder};
use crate::errors::AppError;
use crate::AppState;

// ── Request / response DTOs ──────────────────────────────────────────────────

#[derive(Debug, Deserialize, ToSchema)]
pub struct OrderLineRequest {
    pub medicine_id: Uuid,
    pub quantity: i32,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct PlaceOrderRequest {
    pub client_id: Uuid,
    /// Contact label shown to the pharmacist, usually the client's email.
    pub client_label: String,
    pub lines: Vec<OrderLineRequest>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct OrderItemResponse {
    pub medicine_name: String,
    pub unit_price: String,
    pub quantity: i32,
    pub line_total: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct OrderResponse {
    pub id: Uuid,
    pub pharmacy_id: Uuid,
    pub client_id: Uuid,
    pub client_label: String,
    pub status: String,
    pub total_price: String,
    pub created_at: String,
    pub items: Vec<OrderItemResponse>,
}

impl From<&OrderItem> for OrderItemResponse {
    fn from(item: &OrderItem) -> Self {
        OrderItemResponse {
            medicine_name: item.medicine_name.clone(),
            unit_price: item.unit_price.to_string(),
            quantity: item.quantity,
            line_total: item.line_total.to_string(),
        }
    }
}

impl From<Order> for OrderResponse {
    fn from(order: Order) -> Self {
        OrderResponse {
            items: order.items.iter().map(OrderItemResponse::from).collect(),
            id: order.id,
            pharmacy_id: order.pharmacy_id,
            client_id: order.client_id,
            client_label: order.client_label,
            status: order.status.to_string(),
            total_price: order.total_price.to_string(),
            created_at: order.created_at.to_rfc3339(),
        }
    }
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct ListOrdersParams {
    /// One of `pending`, `confirmed`, `rejected`. Omit for every order.
    pub status: Option<String>,
}

// ── Handlers ─────────────────────────────────────────────────────────────────

/// POST /pharmacies/{id}/orders
///
/// Places a pending order. Each line is priced from the pharmacy's catalog at
/// the time of the call; repeated medicines are merged into one line.
#[utoipa::path(
    post,
    path = "/pharmacies/{id}/orders",
    params(
        ("id" = Uuid, Path, description = "Pharmacy UUID"),
    ),
    request_body = PlaceOrderRequest,
    responses(
        (status = 201, description = "Order placed", body = OrderResponse),
        (status = 400, description = "Empty order, bad quantity or unavailable medicine"),
        (status = 404, description = "Pharmacy not found"),
        (status = 409, description = "Pharmacy is closed"),
        (status = 500, description = "Internal server error"),
    ),
    tag = "orders"
)]
pub async fn place_order(
    state: web::Data<AppState>,
    path: web::Path<Uuid>,
    body: web::Json<PlaceOrderRequest>,
) -> Result<HttpResponse, AppError> {
    let pharmacy_id = path.into_inner();
    let body = body.into_inner();
    let request = PlaceOrder {
        client_id: body.client_id,
        client_label: body.client_label,
        lines: body
            .lines
            .into_iter()
            .map(|l| OrderLineInput {
                medicine_id: l.medicine_id,
                quantity: l.quantity,
            })
            .collect(),
    };

    let order = state.orders.place_order(pharmacy_id, request).await?;
    Ok(HttpResponse::Created().json(OrderResponse::from(order)))
}

/// GET /pharmacies/{id}/orders
///
/// Lists the pharmacy's orders newest first, optionally filtered by status.
#[utoipa::path(
    get,
    path = "/pharmacies/{id}/orders",
    params(
        ("id" = Uuid, Path, description = "Pharmacy UUID"),
        ("status" = Option<String>, Query, description = "pending, confirmed or rejected"),
    ),
    responses(
        (status = 200, description = "Orders of the pharmacy", body = [OrderResponse]),
        (status = 400, description = "Unknown status"),
        (status = 500, description = "Internal server error"),
    ),
    tag = "orders"
)]
pub async fn list_pharmacy_orders(
    state: web::Data<AppState>,
    path: web::Path<Uuid>,
    query: web::Query<ListOrdersParams>,
) -> Result<HttpResponse, AppError> {
    let pharmacy_id = path.into_inner();
    let status = query
        .into_inner()
        .status
        .map(|s| s.parse::<OrderStatus>())
        .transpose()?;

    let orders = state
        .orders
        .list_pharmacy_orders(pharmacy_id, status)
        .await?;
    let body: Vec<OrderResponse> = orders.into_iter().map(OrderResponse::from).collect();
    Ok(HttpResponse::Ok().json(body))
}

/// GET /orders/{id}
///
/// Reads the global copy of an order.
#[utoipa::path(
    get,
    path = "/orders/{id}",
    params(
        ("id" = Uuid, Path, description = "Order UUID"),
    ),
    responses(
        (status = 200, description = "Order found", body = OrderResponse),
        (status = 404, description = "Order not found"),
        (status = 500, description = "Internal server error"),
    ),
    tag = "orders"
)]
pub async fn get_order(
    state: web::Data<AppState>,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
    match state.orders.get_order(path.into_inner()).await? {
        Some(order) => Ok(HttpResponse::Ok().json(OrderResponse::from(order))),
        None => Err(AppError::NotFound),
    }
}

/// GET /clients/{id}/orders
#[utoipa::path(
    get,
    path = "/clients/{id}/orders",
    params(
        ("id" = Uuid, Path, description = "Client UUID"),
    ),
    responses(
        (status = 200, description = "Orders placed by the client", body = [OrderResponse]),
        (status = 500, description = "Internal server error"),
    ),
    tag = "orders"
)]
pub async fn list_client_orders(
    state: web::Data<AppState>,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
    let orders = state.orders.list_client_orders(path.into_inner()).await?;
    let body: Vec<OrderResponse> = orders.into_iter().map(OrderResponse::from).collect();
    Ok(HttpResponse::Ok().json(body))
}
