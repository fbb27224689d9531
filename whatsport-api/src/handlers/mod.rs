pub mod events;
pub mod geo;
pub mod notifications;
pub mod reservations;
pub mod social;
pub mod spaces;
pub mod users;

use axum::Json;

pub async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "ok",
        "service": "whatsport-api"
    }))
}
