use axum::{
    extract::{Extension, Request},
    http::{header::AUTHORIZATION, StatusCode},
    response::Response,
    Json,
};
use chrono::Utc;
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::time::{SystemTime, UNIX_EPOCH};
use tracing;
use uuid::Uuid;

use whatsport_core::types::{Actor, PlayerSport, Role, User};
use whatsport_core::{AppContext, CoreError};

use crate::error::{ApiError, ApiResult};

/// JWT claims: subject is the user id, role rides along so the core never
/// needs a lookup just to authorize.
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid,
    pub role: Role,
    pub exp: usize,
}

fn extract_token(auth_header: Option<&str>) -> Option<String> {
    auth_header?
        .strip_prefix("Bearer ")
        .map(|s| s.trim().to_string())
}

pub fn generate_token(actor: &Actor, secret: &str, ttl_days: u64) -> Result<String, CoreError> {
    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_err(|e| CoreError::store(e.to_string()))?
        .as_secs() as usize;

    let claims = Claims {
        sub: actor.user_id,
        role: actor.role,
        exp: now + (ttl_days * 24 * 60 * 60) as usize,
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_ref()),
    )
    .map_err(|e| CoreError::store(format!("failed to sign token: {e}")))
}

pub fn verify_token(token: &str, secret: &str) -> Result<Actor, StatusCode> {
    let decoding_key = DecodingKey::from_secret(secret.as_ref());
    let validation = Validation::default();

    match decode::<Claims>(token, &decoding_key, &validation) {
        Ok(token_data) => Ok(Actor {
            user_id: token_data.claims.sub,
            role: token_data.claims.role,
        }),
        Err(e) => {
            tracing::debug!("JWT verification failed: {}", e);
            Err(StatusCode::UNAUTHORIZED)
        }
    }
}

/// Axum middleware resolving the acting user for every protected route.
pub async fn auth_middleware(
    mut req: Request,
    next: axum::middleware::Next,
) -> Result<Response, StatusCode> {
    let path = req.uri().path();
    if path == "/health" || path.starts_with("/api/v1/auth/") {
        return Ok(next.run(req).await);
    }

    let auth_header = req
        .headers()
        .get(AUTHORIZATION)
        .and_then(|h| h.to_str().ok());

    let token = match extract_token(auth_header) {
        Some(t) => t,
        None => {
            tracing::debug!("Missing Authorization header");
            return Err(StatusCode::UNAUTHORIZED);
        }
    };

    let ctx = req
        .extensions()
        .get::<AppContext>()
        .ok_or(StatusCode::INTERNAL_SERVER_ERROR)?;

    let actor = verify_token(&token, &ctx.config.server.jwt_secret)?;

    req.extensions_mut().insert(actor);

    Ok(next.run(req).await)
}

#[derive(Deserialize)]
pub struct RegisterRequest {
    pub email: String,
    pub role: Role,
    pub full_name: Option<String>,
    #[serde(default)]
    pub sports: Vec<PlayerSport>,
}

/// Development stand-in for the external auth subsystem: creates the user
/// record the services will resolve names from.
pub async fn register(
    Extension(ctx): Extension<AppContext>,
    Json(req): Json<RegisterRequest>,
) -> ApiResult<Json<User>> {
    if ctx.users.find_by_email(&req.email).await?.is_some() {
        return Err(ApiError::from(CoreError::AlreadyExists("user")));
    }

    let now = Utc::now();
    let user = User {
        id: Uuid::new_v4(),
        email: req.email,
        role: req.role,
        full_name: req.full_name,
        phone: None,
        sports: req.sports,
        company_name: None,
        company_document: None,
        bank_info: None,
        is_active: true,
        created_at: now,
        updated_at: now,
    };
    ctx.users.insert(&user).await?;
    Ok(Json(user))
}

#[derive(Deserialize)]
pub struct TokenRequest {
    pub user_id: Uuid,
}

pub async fn mint_token(
    Extension(ctx): Extension<AppContext>,
    Json(req): Json<TokenRequest>,
) -> ApiResult<Json<serde_json::Value>> {
    let user = ctx
        .users
        .find(req.user_id)
        .await?
        .ok_or(CoreError::NotFound("user"))?;

    let actor = Actor { user_id: user.id, role: user.role };
    let token = generate_token(
        &actor,
        &ctx.config.server.jwt_secret,
        ctx.config.server.token_ttl_days,
    )?;

    Ok(Json(serde_json::json!({
        "token": token,
        "user_id": user.id,
        "role": user.role,
    })))
}
