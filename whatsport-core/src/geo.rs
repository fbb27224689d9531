use serde::Deserialize;

use crate::config::GeocodingConfig;
use crate::error::CoreResult;

const EARTH_RADIUS_KM: f64 = 6371.0;

/// Great-circle distance between two coordinates in kilometers.
///
/// Returns a non-finite value when either coordinate is not a number;
/// callers filter those out rather than treating them as an error.
pub fn haversine_km(lat1: f64, lng1: f64, lat2: f64, lng2: f64) -> f64 {
    let dlat = (lat2 - lat1).to_radians();
    let dlng = (lng2 - lng1).to_radians();

    let a = (dlat / 2.0).sin().powi(2)
        + lat1.to_radians().cos() * lat2.to_radians().cos() * (dlng / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());

    EARTH_RADIUS_KM * c
}

/// A resolved address, as returned by the geocoding provider.
#[derive(Debug, Clone)]
pub struct AddressCandidate {
    pub lat: f64,
    pub lng: f64,
    pub display_name: String,
}

#[derive(Debug, Deserialize)]
struct NominatimPlace {
    lat: String,
    lon: String,
    display_name: String,
}

impl NominatimPlace {
    fn into_candidate(self) -> Option<AddressCandidate> {
        // Providers return coordinates as strings; unparsable entries are
        // dropped, not retried.
        let lat = self.lat.parse().ok()?;
        let lng = self.lon.parse().ok()?;
        Some(AddressCandidate { lat, lng, display_name: self.display_name })
    }
}

/// Thin client over a Nominatim-compatible geocoding endpoint. The two
/// vendors the frontend can be pointed at expose the same search/reverse
/// shape, so the provider stays swappable through `GEOCODING_BASE_URL`.
#[derive(Clone)]
pub struct GeocodingClient {
    http: reqwest::Client,
    base_url: String,
}

impl GeocodingClient {
    pub fn new(config: &GeocodingConfig) -> Self {
        let http = reqwest::Client::builder()
            .user_agent(config.user_agent.clone())
            .build()
            .unwrap_or_default();

        GeocodingClient {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        }
    }

    pub async fn search(&self, query: &str) -> CoreResult<Vec<AddressCandidate>> {
        let url = format!("{}/search", self.base_url);
        let places: Vec<NominatimPlace> = self
            .http
            .get(&url)
            .query(&[("q", query), ("format", "json"), ("limit", "5")])
            .send()
            .await?
            .json()
            .await?;

        Ok(places.into_iter().filter_map(NominatimPlace::into_candidate).collect())
    }

    pub async fn reverse(&self, lat: f64, lng: f64) -> CoreResult<Option<AddressCandidate>> {
        let url = format!("{}/reverse", self.base_url);
        let place: Option<NominatimPlace> = self
            .http
            .get(&url)
            .query(&[
                ("lat", lat.to_string()),
                ("lon", lng.to_string()),
                ("format", "json".to_string()),
            ])
            .send()
            .await?
            .json()
            .await
            .ok();

        Ok(place.and_then(NominatimPlace::into_candidate))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn haversine_known_distance() {
        // Sao Paulo to Rio de Janeiro, roughly 360 km.
        let d = haversine_km(-23.5505, -46.6333, -22.9068, -43.1729);
        assert!((d - 360.0).abs() < 10.0, "got {d}");
    }

    #[test]
    fn haversine_zero_distance() {
        let d = haversine_km(10.0, 20.0, 10.0, 20.0);
        assert!(d.abs() < 1e-9);
    }

    #[test]
    fn haversine_propagates_nan() {
        assert!(!haversine_km(f64::NAN, 0.0, 0.0, 0.0).is_finite());
    }
}
