//! The pharmacist's screen: the order currently being announced, the pending
//! queue behind it, and the accept/reject/dismiss actions.

use actix_web::{web, HttpResponse};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use super::orders::OrderResponse;
use crate::application::desk::{Decision, DecisionOutcome, SessionView};
use crate::errors::AppError;
use crate::AppState;

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct SessionResponse {
    pub order: OrderResponse,
    pub seconds_left: u32,
    /// True while a decision is being written, or after its write failed.
    pub halted: bool,
    pub alert_playing: bool,
    /// Where the client should stream the alert tone from.
    pub alert_source: String,
}

impl From<SessionView> for SessionResponse {
    fn from(view: SessionView) -> Self {
        SessionResponse {
            order: view.order.into(),
            seconds_left: view.seconds_left,
            halted: view.halted,
            alert_playing: view.alert_playing,
            alert_source: view.alert_source,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct DecisionResponse {
    pub order_id: Uuid,
    pub status: String,
    /// False when only the pharmacy's copy was updated.
    pub mirrored: bool,
    /// Order now on screen, if another one was waiting.
    pub next: Option<Uuid>,
}

impl From<DecisionOutcome> for DecisionResponse {
    fn from(outcome: DecisionOutcome) -> Self {
        DecisionResponse {
            order_id: outcome.order_id,
            status: outcome.status.to_string(),
            mirrored: outcome.mirrored,
            next: outcome.next,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct DismissResponse {
    pub order_id: Uuid,
}

#[utoipa::path(
    get,
    path = "/pharmacies/{id}/notification",
    params(
        ("id" = Uuid, Path, description = "Pharmacy UUID"),
    ),
    responses(
        (status = 200, description = "An order is being announced", body = SessionResponse),
        (status = 204, description = "Nothing on screen"),
        (status = 404, description = "Pharmacy not found"),
        (status = 500, description = "Internal server error"),
    ),
    tag = "notifications"
)]
pub async fn get_notification(
    state: web::Data<AppState>,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
    let desk = state.desks.desk(path.into_inner()).await?;
    match desk.session().await? {
        Some(view) => Ok(HttpResponse::Ok().json(SessionResponse::from(view))),
        None => Ok(HttpResponse::NoContent().finish()),
    }
}

/// GET /pharmacies/{id}/pending
///
/// The desk's view of the pending queue, newest first.
#[utoipa::path(
    get,
    path = "/pharmacies/{id}/pending",
    params(
        ("id" = Uuid, Path, description = "Pharmacy UUID"),
    ),
    responses(
        (status = 200, description = "Pending orders", body = [OrderResponse]),
        (status = 404, description = "Pharmacy not found"),
        (status = 500, description = "Internal server error"),
    ),
    tag = "notifications"
)]
pub async fn list_pending(
    state: web::Data<AppState>,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
    let pending = state.desks.desk(path.into_inner()).await?.pending().await?;
    let body: Vec<OrderResponse> = pending.into_iter().map(OrderResponse::from).collect();
    Ok(HttpResponse::Ok().json(body))
}

#[utoipa::path(
    post,
    path = "/pharmacies/{id}/orders/{order_id}/accept",
    params(
        ("id" = Uuid, Path, description = "Pharmacy UUID"),
        ("order_id" = Uuid, Path, description = "Order on screen"),
    ),
    responses(
        (status = 200, description = "Order confirmed", body = DecisionResponse),
        (status = 404, description = "Pharmacy not found"),
        (status = 409, description = "Order is not on screen or already decided"),
        (status = 503, description = "Status could not be written, session kept for retry"),
        (status = 500, description = "Internal server error"),
    ),
    tag = "notifications"
)]
pub async fn accept_order(
    state: web::Data<AppState>,
    path: web::Path<(Uuid, Uuid)>,
) -> Result<HttpResponse, AppError> {
    decide(state, path.into_inner(), Decision::Accept).await
}

#[utoipa::path(
    post,
    path = "/pharmacies/{id}/orders/{order_id}/reject",
    params(
        ("id" = Uuid, Path, description = "Pharmacy UUID"),
        ("order_id" = Uuid, Path, description = "Order on screen"),
    ),
    responses(
        (status = 200, description = "Order rejected", body = DecisionResponse),
        (status = 404, description = "Pharmacy not found"),
        (status = 409, description = "Order is not on screen or already decided"),
        (status = 503, description = "Status could not be written, session kept for retry"),
        (status = 500, description = "Internal server error"),
    ),
    tag = "notifications"
)]
pub async fn reject_order(
    state: web::Data<AppState>,
    path: web::Path<(Uuid, Uuid)>,
) -> Result<HttpResponse, AppError> {
    decide(state, path.into_inner(), Decision::Reject).await
}

async fn decide(
    state: web::Data<AppState>,
    (pharmacy_id, order_id): (Uuid, Uuid),
    decision: Decision,
) -> Result<HttpResponse, AppError> {
    let outcome = state
        .desks
        .desk(pharmacy_id)
        .await?
        .decide(order_id, decision)
        .await?;
    Ok(HttpResponse::Ok().json(DecisionResponse::from(outcome)))
}

/// POST /pharmacies/{id}/notification/dismiss
///
/// Closes the notification without touching the order. It stays pending and
/// may be announced again on the next update.
#[utoipa::path(
    post,
    path = "/pharmacies/{id}/notification/dismiss",
    params(
        ("id" = Uuid, Path, description = "Pharmacy UUID"),
    ),
    responses(
        (status = 200, description = "Notification closed", body = DismissResponse),
        (status = 404, description = "Pharmacy not found"),
        (status = 409, description = "Nothing on screen"),
        (status = 500, description = "Internal server error"),
    ),
    tag = "notifications"
)]
pub async fn dismiss_notification(
    state: web::Data<AppState>,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
    let order_id = state.desks.desk(path.into_inner()).await?.dismiss().await?;
    Ok(HttpResponse::Ok().json(DismissResponse { order_id }))
}
