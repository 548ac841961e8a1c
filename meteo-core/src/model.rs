use serde::{Deserialize, Serialize};

use crate::error::FetchError;

/// A validated latitude/longitude pair.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawCoordinates")]
pub struct Coordinates {
    latitude: f64,
    longitude: f64,
}

impl Coordinates {
    pub const LATITUDE_RANGE: std::ops::RangeInclusive<f64> = -90.0..=90.0;
    pub const LONGITUDE_RANGE: std::ops::RangeInclusive<f64> = -180.0..=180.0;

    /// Validate both components. NaN never falls inside a range, so it is rejected too.
    pub fn new(latitude: f64, longitude: f64) -> Result<Self, FetchError> {
        if !Self::LATITUDE_RANGE.contains(&latitude) || !Self::LONGITUDE_RANGE.contains(&longitude)
        {
            return Err(FetchError::CoordinatesOutOfRange { latitude, longitude });
        }

        Ok(Self { latitude, longitude })
    }

    /// Validate raw user input, where `None` means the field did not parse as a number.
    pub fn from_input(latitude: Option<f64>, longitude: Option<f64>) -> Result<Self, FetchError> {
        match (latitude, longitude) {
            (Some(lat), Some(lon)) => Self::new(lat, lon),
            _ => Err(FetchError::MissingCoordinates),
        }
    }

    pub fn latitude(&self) -> f64 {
        self.latitude
    }

    pub fn longitude(&self) -> f64 {
        self.longitude
    }
}

/// Unchecked wire form; deserialization goes through [`Coordinates::new`].
#[derive(Deserialize)]
struct RawCoordinates {
    latitude: f64,
    longitude: f64,
}

impl TryFrom<RawCoordinates> for Coordinates {
    type Error = FetchError;

    fn try_from(raw: RawCoordinates) -> Result<Self, Self::Error> {
        Self::new(raw.latitude, raw.longitude)
    }
}

impl std::fmt::Display for Coordinates {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}, {}", self.latitude, self.longitude)
    }
}

/// Body of `GET /v1/forecast`. Open-Meteo may omit any of these.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WeatherSnapshot {
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub timezone: Option<String>,
    pub elevation: Option<f64>,
    pub current: Option<CurrentConditions>,
}

/// The `current` block, restricted to the variables we request.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CurrentConditions {
    pub time: Option<String>,
    #[serde(rename = "temperature_2m")]
    pub temperature_c: Option<f64>,
    #[serde(rename = "relative_humidity_2m")]
    pub humidity_pct: Option<i64>,
    #[serde(rename = "wind_speed_10m")]
    pub wind_speed_mps: Option<f64>,
}
