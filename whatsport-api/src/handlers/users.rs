use axum::{extract::Extension, Json};
use chrono::Utc;
use serde::Deserialize;

use whatsport_core::types::{Actor, PlayerSport, User};
use whatsport_core::{AppContext, CoreError};

use crate::error::ApiResult;

pub async fn me(
    Extension(ctx): Extension<AppContext>,
    Extension(actor): Extension<Actor>,
) -> ApiResult<Json<User>> {
    let user = ctx
        .users
        .find(actor.user_id)
        .await?
        .ok_or(CoreError::NotFound("user"))?;
    Ok(Json(user))
}

#[derive(Deserialize)]
pub struct UpdateProfileRequest {
    pub full_name: Option<String>,
    pub phone: Option<String>,
    pub sports: Option<Vec<PlayerSport>>,
    pub company_name: Option<String>,
    pub company_document: Option<String>,
    pub bank_info: Option<serde_json::Value>,
}

/// Users mutate only their own record; the actor is the record.
pub async fn update_me(
    Extension(ctx): Extension<AppContext>,
    Extension(actor): Extension<Actor>,
    Json(req): Json<UpdateProfileRequest>,
) -> ApiResult<Json<User>> {
    let mut user = ctx
        .users
        .find(actor.user_id)
        .await?
        .ok_or(CoreError::NotFound("user"))?;

    if let Some(full_name) = req.full_name {
        user.full_name = Some(full_name);
    }
    if let Some(phone) = req.phone {
        user.phone = Some(phone);
    }
    if let Some(sports) = req.sports {
        user.sports = sports;
    }
    if let Some(company_name) = req.company_name {
        user.company_name = Some(company_name);
    }
    if let Some(company_document) = req.company_document {
        user.company_document = Some(company_document);
    }
    if let Some(bank_info) = req.bank_info {
        user.bank_info = Some(bank_info);
    }
    user.updated_at = Utc::now();

    ctx.users.update(&user).await?;
    Ok(Json(user))
}
