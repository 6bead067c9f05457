use std::sync::mpsc::{self, Receiver};
use std::thread;

use serde::Deserialize;
use thiserror::Error;

use crate::contact::Location;

/// Coarse IP-based lookup; keyless and good enough to center the picker.
const GEO_ENDPOINT: &str = "http://ip-api.com/json/";

#[derive(Debug, Error)]
pub enum GeoError {
    #[error("geolocation unavailable: {0}")]
    Unavailable(String),
}

/// One in-flight lookup. The request carries the generation of the picker
/// that asked for it; a result whose generation no longer matches the open
/// picker is discarded instead of being applied to a stale target.
pub struct GeoRequest {
    generation: u64,
    rx: Receiver<Result<Location, GeoError>>,
}

impl GeoRequest {
    pub fn spawn(generation: u64) -> Self {
        let (tx, rx) = mpsc::channel();
        thread::spawn(move || {
            // Receiver may be gone if the picker closed meanwhile
            let _ = tx.send(fetch_current_location());
        });
        Self { generation, rx }
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Non-blocking poll, called from the event loop each tick.
    pub fn try_result(&self) -> Option<Result<Location, GeoError>> {
        self.rx.try_recv().ok()
    }
}

#[derive(Debug, Deserialize)]
struct GeoResponse {
    status: String,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    lat: Option<f64>,
    #[serde(default)]
    lon: Option<f64>,
}

fn fetch_current_location() -> Result<Location, GeoError> {
    let response = reqwest::blocking::get(GEO_ENDPOINT)
        .map_err(|err| GeoError::Unavailable(err.to_string()))?;
    let body: GeoResponse = response
        .json()
        .map_err(|err| GeoError::Unavailable(err.to_string()))?;

    if body.status != "success" {
        return Err(GeoError::Unavailable(
            body.message.unwrap_or_else(|| "lookup failed".to_string()),
        ));
    }

    match (body.lat, body.lon) {
        (Some(lat), Some(lon)) => Ok(Location::new(lat, lon)),
        _ => Err(GeoError::Unavailable(
            "response carried no coordinates".to_string(),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn response_parsing_accepts_the_success_shape() {
        let body: GeoResponse =
            serde_json::from_str(r#"{"status":"success","lat":35.69,"lon":51.39}"#).unwrap();
        assert_eq!(body.status, "success");
        assert_eq!(body.lat, Some(35.69));
        assert_eq!(body.lon, Some(51.39));
    }

    #[test]
    fn response_parsing_tolerates_failure_shape() {
        let body: GeoResponse =
            serde_json::from_str(r#"{"status":"fail","message":"private range"}"#).unwrap();
        assert_eq!(body.status, "fail");
        assert_eq!(body.message.as_deref(), Some("private range"));
        assert_eq!(body.lat, None);
    }

    #[test]
    fn request_generation_is_preserved() {
        // Spawn hits the network; only check the bookkeeping here.
        let (_tx, rx) = mpsc::channel();
        let request = GeoRequest { generation: 7, rx };
        assert_eq!(request.generation(), 7);
        assert!(request.try_result().is_none());
    }
}
