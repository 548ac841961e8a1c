//! Single-slot UI state driven by user-initiated fetches.
//!
//! [`WeatherViewModel`] owns the current [`UiState`] and publishes every change on a
//! `tokio::sync::watch` channel. Each call to [`WeatherViewModel::load_weather`] runs one
//! fetch on the tokio runtime; a later call simply overwrites whatever an earlier one wrote.

use std::sync::Arc;

use tokio::{sync::watch, task::JoinHandle};
use tracing::{debug, warn};

use crate::{
    error::FetchError,
    model::{Coordinates, CurrentConditions, WeatherSnapshot},
    repository::WeatherRepository,
};

/// Label used when the caller gives none.
pub const DEFAULT_LABEL: &str = "Selected Location";

/// Shown in place of any value the API left out.
pub const PLACEHOLDER: &str = "-";

#[derive(Debug, Clone, PartialEq, Default)]
pub enum UiState {
    #[default]
    Idle,
    Loading,
    Success(WeatherReport),
    Error { message: String },
}

impl UiState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, UiState::Success(_) | UiState::Error { .. })
    }
}

/// Display-ready strings for one successful fetch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WeatherReport {
    pub label: String,
    pub temperature: String,
    pub humidity: String,
    pub wind: String,
    pub time: String,
}

impl WeatherReport {
    pub fn from_snapshot(
        label: Option<&str>,
        snapshot: &WeatherSnapshot,
    ) -> Result<Self, FetchError> {
        let current = snapshot.current.as_ref().ok_or(FetchError::NoCurrentData)?;
        Ok(Self::from_current(label, current))
    }

    fn from_current(label: Option<&str>, current: &CurrentConditions) -> Self {
        let label = label
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .unwrap_or(DEFAULT_LABEL);

        Self {
            label: label.to_string(),
            temperature: format!("{} °C", decimal_or_placeholder(current.temperature_c)),
            humidity: format!(
                "{} %",
                current.humidity_pct.map_or_else(|| PLACEHOLDER.to_string(), |h| h.to_string())
            ),
            wind: format!("{} m/s", decimal_or_placeholder(current.wind_speed_mps)),
            time: current.time.clone().unwrap_or_else(|| PLACEHOLDER.to_string()),
        }
    }
}

// Debug formatting keeps the fractional part, so 5.0 renders as "5.0" rather than "5".
fn decimal_or_placeholder(value: Option<f64>) -> String {
    value.map_or_else(|| PLACEHOLDER.to_string(), |v| format!("{v:?}"))
}

#[derive(Debug, Clone)]
pub struct WeatherViewModel {
    repository: WeatherRepository,
    state: Arc<watch::Sender<UiState>>,
}

impl WeatherViewModel {
    pub fn new(repository: WeatherRepository) -> Self {
        let (state, _) = watch::channel(UiState::Idle);
        Self { repository, state: Arc::new(state) }
    }

    /// Snapshot of the current state.
    pub fn state(&self) -> UiState {
        self.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<UiState> {
        self.state.subscribe()
    }

    /// Start a fetch for the given raw coordinates.
    ///
    /// Invalid coordinates move straight to [`UiState::Error`] and `None` is returned; no
    /// request is made. Otherwise the fetch is spawned on the current tokio runtime and its
    /// handle returned. Must be called from within a runtime.
    pub fn load_weather(
        &self,
        latitude: Option<f64>,
        longitude: Option<f64>,
        label: Option<&str>,
    ) -> Option<JoinHandle<()>> {
        self.state.send_replace(UiState::Loading);

        let coords = match Coordinates::from_input(latitude, longitude) {
            Ok(coords) => coords,
            Err(err) => {
                warn!(?latitude, ?longitude, "rejected coordinates: {err}");
                self.state.send_replace(UiState::Error { message: err.user_message() });
                return None;
            }
        };

        let repository = self.repository.clone();
        let state = Arc::clone(&self.state);
        let label = label.map(str::to_owned);

        Some(tokio::spawn(async move {
            let next = resolve(&repository, coords, label.as_deref()).await;
            state.send_replace(next);
        }))
    }
}

async fn resolve(
    repository: &WeatherRepository,
    coords: Coordinates,
    label: Option<&str>,
) -> UiState {
    let outcome = repository
        .fetch_current_weather(coords)
        .await
        .and_then(|snapshot| WeatherReport::from_snapshot(label, &snapshot));

    match outcome {
        Ok(report) => {
            debug!(%coords, label = %report.label, "weather loaded");
            UiState::Success(report)
        }
        Err(err) => {
            warn!(%coords, "weather fetch failed: {err}");
            UiState::Error { message: err.user_message() }
        }
    }
}
