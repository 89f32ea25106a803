//! Geocoding providers: the `Geocoder` seam and the Nominatim implementation.

use super::types::GeocodeError;
use crate::geo::Coordinate;
use serde::Deserialize;
use std::time::Duration;

pub const DEFAULT_NOMINATIM_URL: &str = "https://nominatim.openstreetmap.org";
pub const DEFAULT_USER_AGENT: &str = "FilmAtlas/0.1 (filming-location-map)";
pub const DEFAULT_TIMEOUT_SECS: u64 = 10;

/// Anything that turns free text into a coordinate.
pub trait Geocoder {
    fn geocode(&self, query: &str) -> Result<Coordinate, GeocodeError>;
}

impl<G: Geocoder + ?Sized> Geocoder for Box<G> {
    fn geocode(&self, query: &str) -> Result<Coordinate, GeocodeError> {
        (**self).geocode(query)
    }
}

/// Connection settings for the Nominatim provider.
#[derive(Debug, Clone)]
pub struct GeocoderConfig {
    pub base_url: String,
    pub user_agent: String,
    pub timeout: Duration,
}

impl Default for GeocoderConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_NOMINATIM_URL.to_string(),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }
}

// ─── Nominatim provider ─────────────────────────────────────────

#[derive(Deserialize, Debug, Clone)]
pub struct NominatimResult {
    pub lat: String,
    pub lon: String,
    #[serde(default)]
    pub display_name: Option<String>,
}

/// OpenStreetMap Nominatim search, first result only.
pub struct Nominatim {
    agent: ureq::Agent,
    search_url: String,
}

impl Nominatim {
    pub fn new(config: &GeocoderConfig) -> Self {
        let agent = ureq::AgentBuilder::new()
            .timeout(config.timeout)
            .user_agent(&config.user_agent)
            .build();
        Self {
            agent,
            search_url: format!("{}/search", config.base_url.trim_end_matches('/')),
        }
    }
}

impl Geocoder for Nominatim {
    fn geocode(&self, query: &str) -> Result<Coordinate, GeocodeError> {
        let response = self
            .agent
            .get(&self.search_url)
            .query("q", query)
            .query("format", "json")
            .query("limit", "1")
            .call()
            .map_err(classify_ureq_error)?;

        let body = response
            .into_string()
            .map_err(|e| GeocodeError::Network(e.to_string()))?;

        first_coordinate(query, &body)
    }
}

/// HTTP 429 and 5xx are worth retrying; other status codes are not.
fn classify_ureq_error(err: ureq::Error) -> GeocodeError {
    match err {
        ureq::Error::Status(code, _) if code == 429 || code >= 500 => {
            GeocodeError::Network(format!("HTTP {}", code))
        }
        ureq::Error::Status(code, _) => GeocodeError::InvalidResponse(format!("HTTP {}", code)),
        ureq::Error::Transport(t) => GeocodeError::Network(t.to_string()),
    }
}

/// Parse a Nominatim JSON body and take the first hit.
pub fn first_coordinate(query: &str, body: &str) -> Result<Coordinate, GeocodeError> {
    let results: Vec<NominatimResult> =
        serde_json::from_str(body).map_err(|e| GeocodeError::InvalidResponse(e.to_string()))?;

    let top = results
        .first()
        .ok_or_else(|| GeocodeError::NotFound(query.to_string()))?;

    let lat: f64 = top
        .lat
        .trim()
        .parse()
        .map_err(|_| GeocodeError::InvalidResponse(format!("bad latitude '{}'", top.lat)))?;
    let lon: f64 = top
        .lon
        .trim()
        .parse()
        .map_err(|_| GeocodeError::InvalidResponse(format!("bad longitude '{}'", top.lon)))?;

    let coordinate = Coordinate::new(lat, lon);
    if !coordinate.is_valid() {
        return Err(GeocodeError::InvalidResponse(format!(
            "coordinate out of range {}",
            coordinate
        )));
    }
    Ok(coordinate)
}
