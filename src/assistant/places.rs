//! Nearby safe places
//!
//! Queries a places service for each shelter category around the user,
//! keeps the first few hits per category, and returns the closest overall.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client as HttpClient;
use serde::Deserialize;

use super::error::AssistantError;
use super::types::{Coordinates, SafePlace, UserLocation};

/// Default Google Maps web service root
pub const DEFAULT_PLACES_API_URL: &str = "https://maps.googleapis.com/maps/api";

/// Default search radius in metres
pub const DEFAULT_RADIUS_M: u32 = 20_000;

/// Results kept per category
pub const PER_TYPE_LIMIT: usize = 3;

/// Results returned overall
pub const MAX_RESULTS: usize = 15;

/// Place categories searched, with their display labels
pub const SAFE_PLACE_TYPES: &[(&str, &str)] = &[
    ("hospital", "Hospital"),
    ("police", "Police Station"),
    ("fire_station", "Fire Station"),
    ("park", "Open Ground/Park"),
    ("stadium", "Stadium"),
    ("school", "School"),
    ("locality", "Open Area"),
];

const EARTH_RADIUS_KM: f64 = 6371.0;

/// Great-circle distance in kilometres (haversine)
pub fn distance_km(from: Coordinates, to: Coordinates) -> f64 {
    let d_lat = (to.lat - from.lat).to_radians();
    let d_lng = (to.lng - from.lng).to_radians();
    let a = (d_lat / 2.0).sin().powi(2)
        + from.lat.to_radians().cos() * to.lat.to_radians().cos() * (d_lng / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());
    EARTH_RADIUS_KM * c
}

/// Sort by distance and keep the closest [`MAX_RESULTS`]
pub fn closest(mut places: Vec<SafePlace>) -> Vec<SafePlace> {
    places.sort_by(|a, b| a.distance_km().total_cmp(&b.distance_km()));
    places.truncate(MAX_RESULTS);
    places
}

/// Source of nearby places and geocoding
#[async_trait]
pub trait PlacesLookup: Send + Sync {
    /// Safe places within `radius_m` of `center`, closest first
    async fn nearby_safe_places(&self, center: Coordinates, radius_m: u32) -> Vec<SafePlace>;

    /// Resolve a place name to coordinates (first match)
    async fn geocode(&self, place_name: &str) -> Result<Option<UserLocation>, AssistantError>;
}

#[derive(Debug, Deserialize)]
struct Geometry {
    location: Coordinates,
}

#[derive(Debug, Deserialize)]
struct PlaceResult {
    name: String,
    vicinity: Option<String>,
    formatted_address: Option<String>,
    geometry: Geometry,
    rating: Option<f64>,
    place_id: Option<String>,
}

#[derive(Debug, Deserialize)]
struct PlacesResponse {
    #[serde(default)]
    results: Vec<PlaceResult>,
}

#[derive(Debug, Deserialize)]
struct GeocodeResult {
    formatted_address: String,
    geometry: Geometry,
}

#[derive(Debug, Deserialize)]
struct GeocodeResponse {
    #[serde(default)]
    results: Vec<GeocodeResult>,
}

/// Google Places / Geocoding client
pub struct GooglePlaces {
    client: HttpClient,
    base_url: String,
    api_key: String,
}

impl GooglePlaces {
    pub fn new(
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, AssistantError> {
        let client = HttpClient::builder().timeout(timeout).build()?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
        })
    }

    async fn search_type(
        &self,
        center: Coordinates,
        radius_m: u32,
        place_type: &str,
        label: &str,
    ) -> Result<Vec<SafePlace>, AssistantError> {
        let response: PlacesResponse = self
            .client
            .get(format!("{}/place/nearbysearch/json", self.base_url))
            .query(&[
                ("location", format!("{},{}", center.lat, center.lng)),
                ("radius", radius_m.to_string()),
                ("type", place_type.to_string()),
                ("key", self.api_key.clone()),
            ])
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        Ok(response
            .results
            .into_iter()
            .take(PER_TYPE_LIMIT)
            .map(|place| SafePlace {
                distance: format!("{:.2}", distance_km(center, place.geometry.location)),
                address: place
                    .vicinity
                    .or(place.formatted_address)
                    .unwrap_or_else(|| "Address not available".to_string()),
                name: place.name,
                kind: label.to_string(),
                location: place.geometry.location,
                rating: place.rating,
                place_id: place.place_id,
            })
            .collect())
    }
}

#[async_trait]
impl PlacesLookup for GooglePlaces {
    async fn nearby_safe_places(&self, center: Coordinates, radius_m: u32) -> Vec<SafePlace> {
        let mut places = Vec::new();

        for (place_type, label) in SAFE_PLACE_TYPES {
            match self.search_type(center, radius_m, place_type, label).await {
                Ok(found) => places.extend(found),
                Err(e) => {
                    tracing::warn!(place_type = *place_type, error = %e, "Places lookup failed");
                }
            }
        }

        let places = closest(places);
        tracing::debug!(count = places.len(), "Safe places found");
        places
    }

    async fn geocode(&self, place_name: &str) -> Result<Option<UserLocation>, AssistantError> {
        let response: GeocodeResponse = self
            .client
            .get(format!("{}/geocode/json", self.base_url))
            .query(&[("address", place_name), ("key", self.api_key.as_str())])
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        Ok(response.results.into_iter().next().map(|result| UserLocation {
            lat: result.geometry.location.lat,
            lng: result.geometry.location.lng,
            place_name: Some(result.formatted_address),
        }))
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;

    const ORIGIN: Coordinates = Coordinates { lat: 0.0, lng: 0.0 };

    fn result(name: &str, lat: f64, lng: f64) -> serde_json::Value {
        json!({
            "name": name,
            "vicinity": format!("{} street", name),
            "geometry": { "location": { "lat": lat, "lng": lng } },
            "place_id": name,
        })
    }

    #[test]
    fn test_distance_one_degree_of_latitude() {
        let d = distance_km(ORIGIN, Coordinates { lat: 1.0, lng: 0.0 });

        assert!((d - 111.19).abs() < 0.01, "got {}", d);
        assert_eq!(distance_km(ORIGIN, ORIGIN), 0.0);
    }

    #[tokio::test]
    async fn test_nearby_keeps_three_per_type_sorted() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/place/nearbysearch/json"))
            .and(query_param("type", "hospital"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "results": [
                    result("H-far", 0.05, 0.0),
                    result("H-near", 0.01, 0.0),
                    result("H-mid", 0.03, 0.0),
                    result("H-dropped", 0.0001, 0.0),
                ]
            })))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/place/nearbysearch/json"))
            .and(query_param("type", "park"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "results": [result("Park", 0.02, 0.0)]
            })))
            .mount(&server)
            .await;
        // Every other category fails and is skipped
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let places = GooglePlaces::new(server.uri(), "k", Duration::from_secs(5)).unwrap();
        let found = places.nearby_safe_places(ORIGIN, DEFAULT_RADIUS_M).await;

        let names: Vec<&str> = found.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["H-near", "Park", "H-mid", "H-far"]);
        assert_eq!(found[0].kind, "Hospital");
        assert_eq!(found[1].kind, "Open Ground/Park");
        assert_eq!(found[0].distance, "1.11");
        assert_eq!(found[0].address, "H-near street");
    }

    #[tokio::test]
    async fn test_geocode_first_result() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/geocode/json"))
            .and(query_param("address", "Kakinada"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "results": [
                    { "formatted_address": "Kakinada, India", "geometry": { "location": { "lat": 16.98, "lng": 82.24 } } },
                    { "formatted_address": "Elsewhere", "geometry": { "location": { "lat": 0.0, "lng": 0.0 } } }
                ]
            })))
            .mount(&server)
            .await;

        let places = GooglePlaces::new(server.uri(), "k", Duration::from_secs(5)).unwrap();
        let location = places.geocode("Kakinada").await.unwrap().unwrap();

        assert_eq!(location.place_name.as_deref(), Some("Kakinada, India"));
        assert_eq!(location.lat, 16.98);
    }

    #[test]
    fn test_closest_truncates() {
        let many: Vec<SafePlace> = (0..20)
            .rev()
            .map(|i| SafePlace {
                name: format!("p{}", i),
                kind: "School".into(),
                address: String::new(),
                distance: format!("{:.2}", i as f64),
                location: ORIGIN,
                rating: None,
                place_id: None,
            })
            .collect();

        let kept = closest(many);

        assert_eq!(kept.len(), MAX_RESULTS);
        assert_eq!(kept[0].name, "p0");
        assert_eq!(kept[14].name, "p14");
    }
}
