//! [`WeatherSource`] – environmental briefing for the drone's location.
//!
//! [`WeatherStationClient`] reads the current observation of a personal
//! weather station from the Weather Company PWS API.  Missing credentials
//! and empty observations are reported as sentinel text rather than errors;
//! only transport failures are errors.

use async_trait::async_trait;
use droneloop_types::DroneError;
use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

/// Returned when the API key or station id is blank.
pub const WEATHER_NOT_CONFIGURED: &str = "Weather info has not been configured.";

/// Returned when the station reports no observation.
pub const WEATHER_UNAVAILABLE: &str = "Weather info is currently unavailable.";

const OBSERVATIONS_URL: &str = "https://api.weather.com/v2/pws/observations/current";

#[async_trait]
pub trait WeatherSource: Send + Sync {
    /// Formatted briefing text, or one of the sentinel strings.
    async fn briefing(&self) -> Result<String, DroneError>;
}

// ─────────────────────────────────────────────────────────────────────────────
// Wire shapes
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct ObservationsResponse {
    #[serde(default)]
    observations: Vec<Observation>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Observation {
    #[serde(default)]
    obs_time_utc: String,
    #[serde(rename = "winddir", default)]
    wind_direction: Option<f64>,
    #[serde(default)]
    humidity: Option<f64>,
    #[serde(default)]
    imperial: Imperial,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Imperial {
    wind_speed: Option<f64>,
    wind_gust: Option<f64>,
    precip_rate: Option<f64>,
    precip_total: Option<f64>,
}

fn reading(value: Option<f64>) -> String {
    value.map_or_else(|| "n/a".to_string(), |v| v.to_string())
}

/// Render the first observation of a PWS response as briefing text.
fn format_briefing(body: Value) -> String {
    let response: ObservationsResponse = match serde_json::from_value(body) {
        Ok(r) => r,
        Err(e) => {
            debug!(error = %e, "weather payload did not match the observation shape");
            return WEATHER_UNAVAILABLE.to_string();
        }
    };
    let Some(obs) = response.observations.into_iter().next() else {
        return WEATHER_UNAVAILABLE.to_string();
    };

    format!(
        "Time Observed (UTC): {}\n\
         Wind Direction: {}\n\
         Wind Speed (MPH): {}\n\
         Wind Gust (MPH): {}\n\
         Humidity: {}\n\
         Precipitation Rate: {}\n\
         Precipitation Total: {}",
        obs.obs_time_utc,
        reading(obs.wind_direction),
        reading(obs.imperial.wind_speed),
        reading(obs.imperial.wind_gust),
        reading(obs.humidity),
        reading(obs.imperial.precip_rate),
        reading(obs.imperial.precip_total),
    )
}

// ─────────────────────────────────────────────────────────────────────────────
// WeatherStationClient
// ─────────────────────────────────────────────────────────────────────────────

pub struct WeatherStationClient {
    api_key: String,
    station_id: String,
    base_url: String,
    client: reqwest::Client,
}

impl WeatherStationClient {
    pub fn new(api_key: impl Into<String>, station_id: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            station_id: station_id.into(),
            base_url: OBSERVATIONS_URL.to_string(),
            client: reqwest::Client::new(),
        }
    }

    /// Point the client at a different observations endpoint.
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    pub fn is_configured(&self) -> bool {
        !self.api_key.trim().is_empty() && !self.station_id.trim().is_empty()
    }
}

fn transport(e: reqwest::Error) -> DroneError {
    DroneError::Transport {
        component: "weather".to_string(),
        details: e.to_string(),
    }
}

#[async_trait]
impl WeatherSource for WeatherStationClient {
    async fn briefing(&self) -> Result<String, DroneError> {
        if !self.is_configured() {
            return Ok(WEATHER_NOT_CONFIGURED.to_string());
        }

        let response = self
            .client
            .get(&self.base_url)
            .query(&[
                ("apiKey", self.api_key.as_str()),
                ("stationId", self.station_id.as_str()),
                ("numericPrecision", "decimal"),
                ("format", "json"),
                ("units", "e"),
            ])
            .send()
            .await
            .map_err(transport)?;

        // The PWS API answers 204 when the station has not reported recently.
        if response.status() == reqwest::StatusCode::NO_CONTENT {
            return Ok(WEATHER_UNAVAILABLE.to_string());
        }

        let body: Value = response
            .error_for_status()
            .map_err(transport)?
            .json()
            .await
            .map_err(transport)?;
        Ok(format_briefing(body))
    }
}

/// Weather source with a fixed answer.  Used in simulation runs.
pub struct StaticWeather(pub String);

#[async_trait]
impl WeatherSource for StaticWeather {
    async fn briefing(&self) -> Result<String, DroneError> {
        Ok(self.0.clone())
    }
}
