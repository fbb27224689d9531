use axum::{
    extract::{Extension, Path, Query},
    Json,
};
use serde::Deserialize;
use uuid::Uuid;

use whatsport_core::types::{Actor, Notification};
use whatsport_core::AppContext;
use whatsport_notify::{NotificationCounts, NotificationService};

use crate::error::ApiResult;

#[derive(Deserialize)]
pub struct ListQuery {
    pub limit: Option<i64>,
}

pub async fn list(
    Extension(ctx): Extension<AppContext>,
    Extension(actor): Extension<Actor>,
    Query(params): Query<ListQuery>,
) -> ApiResult<Json<Vec<Notification>>> {
    let notifications = NotificationService::new(ctx)
        .list_for_user(&actor, params.limit)
        .await?;
    Ok(Json(notifications))
}

pub async fn counts(
    Extension(ctx): Extension<AppContext>,
    Extension(actor): Extension<Actor>,
) -> ApiResult<Json<NotificationCounts>> {
    let counts = NotificationService::new(ctx).counts(&actor).await?;
    Ok(Json(counts))
}

pub async fn mark_read(
    Extension(ctx): Extension<AppContext>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<Notification>> {
    let notification = NotificationService::new(ctx).mark_read(&actor, id).await?;
    Ok(Json(notification))
}

#[derive(Deserialize)]
pub struct MarkManyRequest {
    pub notification_ids: Vec<Uuid>,
}

pub async fn mark_many_read(
    Extension(ctx): Extension<AppContext>,
    Extension(actor): Extension<Actor>,
    Json(req): Json<MarkManyRequest>,
) -> ApiResult<Json<serde_json::Value>> {
    let marked = NotificationService::new(ctx)
        .mark_many_read(&actor, &req.notification_ids)
        .await?;
    Ok(Json(serde_json::json!({ "marked": marked })))
}
