//! Wire types of the assistant route

use serde::{Deserialize, Serialize};

/// A latitude/longitude pair
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub lat: f64,
    pub lng: f64,
}

/// Where the user is, optionally with a resolved place name
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserLocation {
    pub lat: f64,
    pub lng: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub place_name: Option<String>,
}

impl UserLocation {
    pub fn new(lat: f64, lng: f64) -> Self {
        Self {
            lat,
            lng,
            place_name: None,
        }
    }

    pub fn coordinates(&self) -> Coordinates {
        Coordinates {
            lat: self.lat,
            lng: self.lng,
        }
    }
}

/// A nearby place suitable for shelter or help
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SafePlace {
    pub name: String,
    /// Human label of the place category ("Hospital", "Open Ground/Park", ...)
    #[serde(rename = "type")]
    pub kind: String,
    pub address: String,
    /// Kilometres from the user, two decimals
    pub distance: String,
    pub location: Coordinates,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rating: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub place_id: Option<String>,
}

impl SafePlace {
    /// Distance as a number (infinite when unparseable)
    pub fn distance_km(&self) -> f64 {
        self.distance.parse().unwrap_or(f64::INFINITY)
    }
}

/// Body of `POST /api/gemini-assistant`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssistantRequest {
    pub input: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_location: Option<UserLocation>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub safe_places: Option<Vec<SafePlace>>,
}

impl AssistantRequest {
    pub fn new(input: impl Into<String>) -> Self {
        Self {
            input: input.into(),
            ..Default::default()
        }
    }

    pub fn with_location(mut self, location: UserLocation) -> Self {
        self.user_location = Some(location);
        self
    }

    pub fn with_safe_places(mut self, places: Vec<SafePlace>) -> Self {
        self.safe_places = Some(places);
        self
    }
}

/// Successful response body
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssistantReply {
    pub reply: String,
}

/// Error response body
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
    pub details: serde_json::Value,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_request_accepts_camel_case() {
        let body = json!({
            "input": "Earthquake, where do I go?",
            "userLocation": { "lat": 16.98, "lng": 82.24, "placeName": "Kakinada" },
            "safePlaces": [{
                "name": "Nehru Stadium",
                "type": "Stadium",
                "address": "Main Road",
                "distance": "1.20",
                "location": { "lat": 16.99, "lng": 82.25 },
                "placeId": "abc"
            }]
        });

        let request: AssistantRequest = serde_json::from_value(body).unwrap();

        let location = request.user_location.unwrap();
        assert_eq!(location.place_name.as_deref(), Some("Kakinada"));
        let places = request.safe_places.unwrap();
        assert_eq!(places[0].kind, "Stadium");
        assert_eq!(places[0].rating, None);
        assert!((places[0].distance_km() - 1.2).abs() < f64::EPSILON);
    }

    #[test]
    fn test_minimal_request() {
        let request: AssistantRequest = serde_json::from_value(json!({ "input": "hi" })).unwrap();

        assert_eq!(request, AssistantRequest::new("hi"));
        assert_eq!(serde_json::to_value(&request).unwrap(), json!({ "input": "hi" }));
    }
}
