use axum::{
    extract::{Extension, Path, Query},
    Json,
};
use serde::Deserialize;
use uuid::Uuid;

use whatsport_core::types::{Actor, Friendship, FriendshipStatus, Group, GroupRole};
use whatsport_core::AppContext;
use whatsport_social::{CreateGroup, FriendshipService, GroupService};

use crate::error::ApiResult;

// --- Friendships ---

#[derive(Deserialize)]
pub struct UserTarget {
    pub user_id: Uuid,
}

pub async fn send_friend_request(
    Extension(ctx): Extension<AppContext>,
    Extension(actor): Extension<Actor>,
    Json(req): Json<UserTarget>,
) -> ApiResult<Json<Friendship>> {
    let friendship = FriendshipService::new(ctx)
        .send_request(&actor, req.user_id)
        .await?;
    Ok(Json(friendship))
}

#[derive(Deserialize)]
pub struct RespondRequest {
    pub accept: bool,
}

pub async fn respond_friend_request(
    Extension(ctx): Extension<AppContext>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<Uuid>,
    Json(req): Json<RespondRequest>,
) -> ApiResult<Json<Friendship>> {
    let friendship = FriendshipService::new(ctx)
        .respond(&actor, id, req.accept)
        .await?;
    Ok(Json(friendship))
}

pub async fn cancel_friend_request(
    Extension(ctx): Extension<AppContext>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<serde_json::Value>> {
    FriendshipService::new(ctx).cancel(&actor, id).await?;
    Ok(Json(serde_json::json!({ "status": "canceled" })))
}

pub async fn remove_friend(
    Extension(ctx): Extension<AppContext>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<serde_json::Value>> {
    FriendshipService::new(ctx).remove(&actor, id).await?;
    Ok(Json(serde_json::json!({ "status": "removed" })))
}

pub async fn block_user(
    Extension(ctx): Extension<AppContext>,
    Extension(actor): Extension<Actor>,
    Json(req): Json<UserTarget>,
) -> ApiResult<Json<Friendship>> {
    let friendship = FriendshipService::new(ctx).block(&actor, req.user_id).await?;
    Ok(Json(friendship))
}

pub async fn unblock_user(
    Extension(ctx): Extension<AppContext>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<serde_json::Value>> {
    FriendshipService::new(ctx).unblock(&actor, id).await?;
    Ok(Json(serde_json::json!({ "status": "unblocked" })))
}

#[derive(Deserialize)]
pub struct FriendListQuery {
    pub status: Option<FriendshipStatus>,
}

pub async fn list_friendships(
    Extension(ctx): Extension<AppContext>,
    Extension(actor): Extension<Actor>,
    Query(params): Query<FriendListQuery>,
) -> ApiResult<Json<Vec<Friendship>>> {
    let friendships = FriendshipService::new(ctx)
        .list_for_user(&actor, params.status)
        .await?;
    Ok(Json(friendships))
}

#[derive(Deserialize)]
pub struct StatusQuery {
    pub user_id: Uuid,
}

pub async fn friendship_status(
    Extension(ctx): Extension<AppContext>,
    Extension(actor): Extension<Actor>,
    Query(params): Query<StatusQuery>,
) -> ApiResult<Json<Option<Friendship>>> {
    let friendship = FriendshipService::new(ctx)
        .status(actor.user_id, params.user_id)
        .await?;
    Ok(Json(friendship))
}

// --- Groups ---

pub async fn create_group(
    Extension(ctx): Extension<AppContext>,
    Extension(actor): Extension<Actor>,
    Json(req): Json<CreateGroup>,
) -> ApiResult<Json<Group>> {
    let group = GroupService::new(ctx).create(&actor, req).await?;
    Ok(Json(group))
}

pub async fn get_group(
    Extension(ctx): Extension<AppContext>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<Group>> {
    let group = GroupService::new(ctx).get(&actor, id).await?;
    Ok(Json(group))
}

pub async fn list_groups(
    Extension(ctx): Extension<AppContext>,
    Extension(actor): Extension<Actor>,
) -> ApiResult<Json<Vec<Group>>> {
    let groups = GroupService::new(ctx).list_for_user(&actor).await?;
    Ok(Json(groups))
}

pub async fn invite_to_group(
    Extension(ctx): Extension<AppContext>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<Uuid>,
    Json(req): Json<UserTarget>,
) -> ApiResult<Json<Group>> {
    let group = GroupService::new(ctx).invite(&actor, id, req.user_id).await?;
    Ok(Json(group))
}

#[derive(Deserialize)]
pub struct ChangeRoleRequest {
    pub user_id: Uuid,
    pub role: GroupRole,
}

pub async fn change_group_role(
    Extension(ctx): Extension<AppContext>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<Uuid>,
    Json(req): Json<ChangeRoleRequest>,
) -> ApiResult<Json<Group>> {
    let group = GroupService::new(ctx)
        .change_role(&actor, id, req.user_id, req.role)
        .await?;
    Ok(Json(group))
}

pub async fn remove_group_member(
    Extension(ctx): Extension<AppContext>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<Uuid>,
    Json(req): Json<UserTarget>,
) -> ApiResult<Json<Group>> {
    let group = GroupService::new(ctx)
        .remove_member(&actor, id, req.user_id)
        .await?;
    Ok(Json(group))
}

pub async fn leave_group(
    Extension(ctx): Extension<AppContext>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<serde_json::Value>> {
    let remaining = GroupService::new(ctx).leave(&actor, id).await?;
    Ok(Json(serde_json::json!({
        "status": "left",
        "group_deleted": remaining.is_none(),
    })))
}

pub async fn delete_group(
    Extension(ctx): Extension<AppContext>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<serde_json::Value>> {
    GroupService::new(ctx).delete(&actor, id).await?;
    Ok(Json(serde_json::json!({ "status": "deleted" })))
}
