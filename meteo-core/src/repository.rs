use std::sync::Arc;

use crate::{
    client::WeatherApi,
    error::FetchError,
    model::{Coordinates, WeatherSnapshot},
};

/// Forwards fetches to a [`WeatherApi`] and hands failures back untouched.
#[derive(Debug, Clone)]
pub struct WeatherRepository {
    api: Arc<dyn WeatherApi>,
}

impl WeatherRepository {
    pub fn new(api: Arc<dyn WeatherApi>) -> Self {
        Self { api }
    }

    pub async fn fetch_current_weather(
        &self,
        coords: Coordinates,
    ) -> Result<WeatherSnapshot, FetchError> {
        self.api.current_weather(coords).await
    }
}
