//! Prompt assembly for the rescue assistant

use std::fmt::Write;

use super::types::AssistantRequest;

/// Instructions prepended to every user query
pub const SYSTEM_PROMPT: &str = "\
You are DroneX Rescue AI, the emergency response assistant of the DroneX disaster management application.

MISSION:
- Answer only emergency, rescue, disaster management and safety questions.
- Stay calm, professional and actionable; guide the user until rescue teams arrive.
- When nearby safe places are provided, recommend specific ones.

WITH SAFE PLACES DATA:
- Acknowledge the emergency first.
- Recommend the 3 to 5 most suitable places. For each give the name, distance in km, facility type, why it suits this emergency, and a direction from the user.
- Prioritise by emergency type:
  * Earthquake: parks, stadiums, open grounds away from buildings
  * Fire: fire stations, open areas, hospitals
  * Medical: hospitals and clinics
  * Flood: higher ground, schools, community centres
  * General: police stations, fire stations, hospitals
- Finish with short safety instructions and ask whether the user is safe or needs medical help.

OTHER QUERIES:
- Politely explain that you only handle emergencies, rescue alerts and safety guidance.

STYLE:
- Clear, specific and reassuring. Short emoji markers (🚨 ✅ 🏥 🔥 💧 📍 🏃) are welcome.
- Never answer generically when real location data is available.
";

/// Build the full prompt for a request
pub fn build_prompt(request: &AssistantRequest) -> String {
    let mut prompt = String::with_capacity(SYSTEM_PROMPT.len() + request.input.len() + 512);
    prompt.push_str(SYSTEM_PROMPT);
    prompt.push_str("\n\nUser query: ");
    prompt.push_str(&request.input);

    // Writing to a String cannot fail
    if let Some(location) = &request.user_location {
        let _ = write!(
            prompt,
            "\n\nUser's current location: Latitude {}, Longitude {}",
            location.lat, location.lng
        );
        if let Some(name) = &location.place_name {
            let _ = write!(prompt, "\nLocation name: {}", name);
        }
    }

    if let Some(places) = request.safe_places.as_deref().filter(|p| !p.is_empty()) {
        prompt.push_str("\n\n**NEARBY SAFE PLACES (live data from the places lookup):**");
        for (index, place) in places.iter().enumerate() {
            let _ = write!(prompt, "\n\n{}. **{}**", index + 1, place.name);
            let _ = write!(prompt, "\n   - Type: {}", place.kind);
            let _ = write!(prompt, "\n   - Distance: {} km", place.distance);
            let _ = write!(prompt, "\n   - Address: {}", place.address);
            if let Some(rating) = place.rating {
                let _ = write!(prompt, "\n   - Rating: {}/5", rating);
            }
            let _ = write!(
                prompt,
                "\n   - Coordinates: {}, {}",
                place.location.lat, place.location.lng
            );
        }
        prompt.push_str("\n\n**Use this real data to give specific, actionable recommendations.**");
    }

    prompt
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assistant::types::{Coordinates, SafePlace, UserLocation};

    fn place(name: &str, distance: &str, rating: Option<f64>) -> SafePlace {
        SafePlace {
            name: name.into(),
            kind: "Hospital".into(),
            address: "Main Road".into(),
            distance: distance.into(),
            location: Coordinates { lat: 1.5, lng: 2.5 },
            rating,
            place_id: None,
        }
    }

    #[test]
    fn test_query_only() {
        let prompt = build_prompt(&AssistantRequest::new("Flood near the river"));

        assert!(prompt.starts_with(SYSTEM_PROMPT));
        assert!(prompt.ends_with("User query: Flood near the river"));
        assert!(!prompt.contains("NEARBY SAFE PLACES"));
    }

    #[test]
    fn test_location_lines() {
        let mut location = UserLocation::new(16.98, 82.24);
        location.place_name = Some("Kakinada".into());

        let prompt = build_prompt(&AssistantRequest::new("help").with_location(location));

        assert!(prompt.contains("Latitude 16.98, Longitude 82.24"));
        assert!(prompt.contains("\nLocation name: Kakinada"));
    }

    #[test]
    fn test_numbered_safe_places() {
        let request = AssistantRequest::new("earthquake").with_safe_places(vec![
            place("General Hospital", "0.80", Some(4.2)),
            place("City Clinic", "1.25", None),
        ]);

        let prompt = build_prompt(&request);

        assert!(prompt.contains("1. **General Hospital**"));
        assert!(prompt.contains("2. **City Clinic**"));
        assert!(prompt.contains("Distance: 1.25 km"));
        assert_eq!(prompt.matches("Rating:").count(), 1);
        assert!(prompt.contains("Coordinates: 1.5, 2.5"));
    }

    #[test]
    fn test_empty_safe_places_omitted() {
        let prompt = build_prompt(&AssistantRequest::new("x").with_safe_places(Vec::new()));

        assert!(!prompt.contains("NEARBY SAFE PLACES"));
    }
}
