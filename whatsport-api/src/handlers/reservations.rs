use axum::{
    extract::{Extension, Path, Query},
    Json,
};
use serde::Deserialize;
use uuid::Uuid;

use whatsport_core::types::{Actor, Reservation, ReservationStatus};
use whatsport_core::AppContext;
use whatsport_reservations::{CreateReservation, ManagerDashboard, ReservationService};

use crate::error::ApiResult;

#[derive(Deserialize)]
pub struct ReservationQuery {
    pub status: Option<ReservationStatus>,
    #[serde(default)]
    pub upcoming: bool,
}

pub async fn create(
    Extension(ctx): Extension<AppContext>,
    Extension(actor): Extension<Actor>,
    Json(req): Json<CreateReservation>,
) -> ApiResult<Json<Reservation>> {
    let reservation = ReservationService::new(ctx).create(&actor, req).await?;
    Ok(Json(reservation))
}

pub async fn list_mine(
    Extension(ctx): Extension<AppContext>,
    Extension(actor): Extension<Actor>,
    Query(params): Query<ReservationQuery>,
) -> ApiResult<Json<Vec<Reservation>>> {
    let reservations = ReservationService::new(ctx)
        .list_mine(&actor, params.status, params.upcoming)
        .await?;
    Ok(Json(reservations))
}

pub async fn get(
    Extension(ctx): Extension<AppContext>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<Reservation>> {
    let reservation = ReservationService::new(ctx).get(&actor, id).await?;
    Ok(Json(reservation))
}

pub async fn cancel(
    Extension(ctx): Extension<AppContext>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<Reservation>> {
    let reservation = ReservationService::new(ctx).cancel(&actor, id).await?;
    Ok(Json(reservation))
}

pub async fn list_for_space(
    Extension(ctx): Extension<AppContext>,
    Extension(actor): Extension<Actor>,
    Path(space_id): Path<Uuid>,
    Query(params): Query<ReservationQuery>,
) -> ApiResult<Json<Vec<Reservation>>> {
    let reservations = ReservationService::new(ctx)
        .list_for_space(&actor, space_id, params.status, params.upcoming)
        .await?;
    Ok(Json(reservations))
}

pub async fn approve(
    Extension(ctx): Extension<AppContext>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<Reservation>> {
    let reservation = ReservationService::new(ctx).approve(&actor, id).await?;
    Ok(Json(reservation))
}

#[derive(Deserialize)]
pub struct RejectRequest {
    pub rejection_reason: Option<String>,
}

pub async fn reject(
    Extension(ctx): Extension<AppContext>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<Uuid>,
    Json(req): Json<RejectRequest>,
) -> ApiResult<Json<Reservation>> {
    let reservation = ReservationService::new(ctx)
        .reject(&actor, id, req.rejection_reason)
        .await?;
    Ok(Json(reservation))
}

pub async fn complete(
    Extension(ctx): Extension<AppContext>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<Reservation>> {
    let reservation = ReservationService::new(ctx).complete(&actor, id).await?;
    Ok(Json(reservation))
}

pub async fn dashboard(
    Extension(ctx): Extension<AppContext>,
    Extension(actor): Extension<Actor>,
) -> ApiResult<Json<ManagerDashboard>> {
    let dashboard = ReservationService::new(ctx).dashboard(&actor).await?;
    Ok(Json(dashboard))
}
