//! Emergency assistant
//!
//! The server side proxies a user query, plus optional location and nearby
//! safe places, to a text generation model. [`AssistantClient`] is the app
//! side of the same route, and [`PlacesLookup`] fetches the safe places the
//! app attaches to a query.

pub mod client;
pub mod error;
pub mod gemini;
pub mod places;
pub mod prompt;
pub mod types;

pub use client::AssistantClient;
pub use error::{AssistantError, ASSISTANT_UNAVAILABLE};
pub use gemini::{GeminiClient, TextGenerator};
pub use places::{distance_km, GooglePlaces, PlacesLookup, DEFAULT_PLACES_API_URL, DEFAULT_RADIUS_M};
pub use prompt::{build_prompt, SYSTEM_PROMPT};
pub use types::{AssistantReply, AssistantRequest, Coordinates, ErrorBody, SafePlace, UserLocation};
