use axum::{
    extract::{Extension, Path, Query},
    Json,
};
use serde::Deserialize;
use uuid::Uuid;

use whatsport_core::types::{Actor, Event};
use whatsport_core::AppContext;
use whatsport_events::{CreateEvent, EventService, ListEvents, NearbyEvent, UpdateEvent};

use crate::error::ApiResult;

pub async fn create(
    Extension(ctx): Extension<AppContext>,
    Extension(actor): Extension<Actor>,
    Json(req): Json<CreateEvent>,
) -> ApiResult<Json<Event>> {
    let event = EventService::new(ctx).create(&actor, req).await?;
    Ok(Json(event))
}

#[derive(Deserialize)]
pub struct ListQuery {
    #[serde(default)]
    pub participant: bool,
    #[serde(default)]
    pub upcoming: bool,
    pub sport_type: Option<String>,
    pub skill_level: Option<String>,
}

pub async fn list(
    Extension(ctx): Extension<AppContext>,
    Extension(actor): Extension<Actor>,
    Query(params): Query<ListQuery>,
) -> ApiResult<Json<Vec<Event>>> {
    let opts = ListEvents {
        participant_only: params.participant,
        upcoming: params.upcoming,
        sport_type: params.sport_type,
        skill_level: params.skill_level,
    };
    let events = EventService::new(ctx).list(&actor, &opts).await?;
    Ok(Json(events))
}

#[derive(Deserialize)]
pub struct NearbyQuery {
    pub lat: f64,
    pub lng: f64,
    pub radius: Option<f64>,
}

pub async fn nearby(
    Extension(ctx): Extension<AppContext>,
    Extension(actor): Extension<Actor>,
    Query(params): Query<NearbyQuery>,
) -> ApiResult<Json<Vec<NearbyEvent>>> {
    let radius = params.radius.unwrap_or(10.0);
    let events = EventService::new(ctx)
        .nearby(&actor, params.lat, params.lng, radius)
        .await?;
    Ok(Json(events))
}

pub async fn get(
    Extension(ctx): Extension<AppContext>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<Event>> {
    let event = EventService::new(ctx).get(&actor, id).await?;
    Ok(Json(event))
}

pub async fn update(
    Extension(ctx): Extension<AppContext>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateEvent>,
) -> ApiResult<Json<Event>> {
    let event = EventService::new(ctx).update(&actor, id, req).await?;
    Ok(Json(event))
}

pub async fn join(
    Extension(ctx): Extension<AppContext>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<Event>> {
    let event = EventService::new(ctx).join(&actor, id).await?;
    Ok(Json(event))
}

pub async fn leave(
    Extension(ctx): Extension<AppContext>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<Event>> {
    let event = EventService::new(ctx).leave(&actor, id).await?;
    Ok(Json(event))
}

pub async fn cancel(
    Extension(ctx): Extension<AppContext>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<Event>> {
    let event = EventService::new(ctx).cancel(&actor, id).await?;
    Ok(Json(event))
}

pub async fn complete(
    Extension(ctx): Extension<AppContext>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<Event>> {
    let event = EventService::new(ctx).complete(&actor, id).await?;
    Ok(Json(event))
}
