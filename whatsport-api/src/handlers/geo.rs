use axum::{
    extract::{Extension, Query},
    Json,
};
use serde::Deserialize;

use whatsport_core::geo::GeocodingClient;

use crate::error::ApiResult;

#[derive(Deserialize)]
pub struct SearchQuery {
    pub q: String,
}

pub async fn search(
    Extension(geocoder): Extension<GeocodingClient>,
    Query(params): Query<SearchQuery>,
) -> ApiResult<Json<serde_json::Value>> {
    let candidates = geocoder.search(&params.q).await?;
    let result: Vec<serde_json::Value> = candidates
        .into_iter()
        .map(|c| {
            serde_json::json!({
                "lat": c.lat,
                "lng": c.lng,
                "display_name": c.display_name,
            })
        })
        .collect();
    Ok(Json(serde_json::json!(result)))
}

#[derive(Deserialize)]
pub struct ReverseQuery {
    pub lat: f64,
    pub lng: f64,
}

pub async fn reverse(
    Extension(geocoder): Extension<GeocodingClient>,
    Query(params): Query<ReverseQuery>,
) -> ApiResult<Json<serde_json::Value>> {
    let candidate = geocoder.reverse(params.lat, params.lng).await?;
    Ok(Json(match candidate {
        Some(c) => serde_json::json!({
            "lat": c.lat,
            "lng": c.lng,
            "display_name": c.display_name,
        }),
        None => serde_json::Value::Null,
    }))
}
