use axum::{
    extract::{Extension, Path, Query},
    Json,
};
use serde::Deserialize;
use uuid::Uuid;

use whatsport_core::store::SpaceSearch;
use whatsport_core::types::{Actor, Space, SpaceStatus};
use whatsport_core::AppContext;
use whatsport_reservations::{CreateSpace, SpaceService, UpdateSpace};

use crate::error::ApiResult;

pub async fn create(
    Extension(ctx): Extension<AppContext>,
    Extension(actor): Extension<Actor>,
    Json(req): Json<CreateSpace>,
) -> ApiResult<Json<Space>> {
    let space = SpaceService::new(ctx).create(&actor, req).await?;
    Ok(Json(space))
}

pub async fn update(
    Extension(ctx): Extension<AppContext>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateSpace>,
) -> ApiResult<Json<Space>> {
    let space = SpaceService::new(ctx).update(&actor, id, req).await?;
    Ok(Json(space))
}

#[derive(Deserialize)]
pub struct SetStatusRequest {
    pub status: SpaceStatus,
}

pub async fn set_status(
    Extension(ctx): Extension<AppContext>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<Uuid>,
    Json(req): Json<SetStatusRequest>,
) -> ApiResult<Json<Space>> {
    let space = SpaceService::new(ctx).set_status(&actor, id, req.status).await?;
    Ok(Json(space))
}

pub async fn delete(
    Extension(ctx): Extension<AppContext>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<serde_json::Value>> {
    SpaceService::new(ctx).delete(&actor, id).await?;
    Ok(Json(serde_json::json!({ "status": "deleted" })))
}

pub async fn get(
    Extension(ctx): Extension<AppContext>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<Space>> {
    let space = SpaceService::new(ctx).get(id).await?;
    Ok(Json(space))
}

pub async fn list_mine(
    Extension(ctx): Extension<AppContext>,
    Extension(actor): Extension<Actor>,
) -> ApiResult<Json<Vec<Space>>> {
    let spaces = SpaceService::new(ctx).list_mine(&actor).await?;
    Ok(Json(spaces))
}

#[derive(Deserialize)]
pub struct SearchQuery {
    pub q: Option<String>,
    pub sport_type: Option<String>,
    pub city: Option<String>,
}

pub async fn search(
    Extension(ctx): Extension<AppContext>,
    Query(params): Query<SearchQuery>,
) -> ApiResult<Json<Vec<Space>>> {
    let filter = SpaceSearch {
        term: params.q,
        sport_type: params.sport_type,
        city: params.city,
    };
    let spaces = SpaceService::new(ctx).search(&filter).await?;
    Ok(Json(spaces))
}
