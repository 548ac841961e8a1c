use std::{fmt::Debug, time::Duration};

use async_trait::async_trait;
use reqwest::Client;
use tracing::{debug, instrument};

use crate::{
    error::FetchError,
    model::{Coordinates, WeatherSnapshot},
};

pub const DEFAULT_BASE_URL: &str = "https://api.open-meteo.com";
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Variables requested in the `current` query parameter.
///
/// Wind is additionally requested with `wind_speed_unit=ms` because reports label it in m/s
/// and Open-Meteo defaults to km/h.
pub const CURRENT_VARIABLES: &str = "temperature_2m,relative_humidity_2m,wind_speed_10m";

#[async_trait]
pub trait WeatherApi: Send + Sync + Debug {
    async fn current_weather(&self, coords: Coordinates) -> Result<WeatherSnapshot, FetchError>;
}

/// Open-Meteo forecast endpoint, asked only for the current block.
#[derive(Debug, Clone)]
pub struct OpenMeteoClient {
    base_url: String,
    http: Client,
}

impl OpenMeteoClient {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, FetchError> {
        let http = Client::builder().timeout(timeout).build().map_err(FetchError::Network)?;

        let base_url = base_url.into().trim_end_matches('/').to_string();
        Ok(Self { base_url, http })
    }

    fn forecast_url(&self) -> String {
        format!("{}/v1/forecast", self.base_url)
    }
}

#[async_trait]
impl WeatherApi for OpenMeteoClient {
    #[instrument(skip(self), fields(base_url = %self.base_url))]
    async fn current_weather(&self, coords: Coordinates) -> Result<WeatherSnapshot, FetchError> {
        let latitude = coords.latitude().to_string();
        let longitude = coords.longitude().to_string();

        debug!(%latitude, %longitude, "requesting current weather");

        let res = self
            .http
            .get(self.forecast_url())
            .query(&[
                ("latitude", latitude.as_str()),
                ("longitude", longitude.as_str()),
                ("current", CURRENT_VARIABLES),
                ("wind_speed_unit", "ms"),
            ])
            .send()
            .await
            .map_err(FetchError::Network)?;

        let status = res.status();
        let body = res.text().await.map_err(FetchError::Network)?;

        if !status.is_success() {
            return Err(FetchError::Status { status: status.as_u16(), body: truncate_body(&body) });
        }

        let snapshot: WeatherSnapshot = serde_json::from_str(&body)?;
        debug!(has_current = snapshot.current.is_some(), "decoded weather response");

        Ok(snapshot)
    }
}

fn truncate_body(body: &str) -> String {
    const MAX: usize = 200;
    if body.chars().count() > MAX {
        format!("{}...", body.chars().take(MAX).collect::<String>())
    } else {
        body.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trailing_slash_is_dropped_from_base_url() {
        let client = OpenMeteoClient::new("http://localhost:8080/", Duration::from_secs(1))
            .expect("client builds");
        assert_eq!(client.base_url, "http://localhost:8080");
        assert_eq!(client.forecast_url(), "http://localhost:8080/v1/forecast");
    }

    #[test]
    fn long_bodies_are_truncated() {
        let body = "é".repeat(300);
        let truncated = truncate_body(&body);
        assert_eq!(truncated.chars().count(), 203);
        assert!(truncated.ends_with("..."));

        assert_eq!(truncate_body("short"), "short");
    }
}
