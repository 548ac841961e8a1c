use thiserror::Error;

/// Everything that can end a single weather fetch.
///
/// `Display` is meant for logs. Use [`FetchError::user_message`] for text shown to the user.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("latitude or longitude is missing")]
    MissingCoordinates,

    #[error("coordinates out of range: latitude {latitude}, longitude {longitude}")]
    CoordinatesOutOfRange { latitude: f64, longitude: f64 },

    #[error("weather API returned status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("network request failed: {0}")]
    Network(#[source] reqwest::Error),

    #[error("failed to decode weather response: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("response contained no current weather block")]
    NoCurrentData,
}

impl FetchError {
    pub fn user_message(&self) -> String {
        match self {
            FetchError::MissingCoordinates => "Invalid coordinates.".to_string(),
            FetchError::CoordinatesOutOfRange { .. } => "Invalid coordinates. Latitude must be \
                 between -90 and 90, and longitude between -180 and 180."
                .to_string(),
            FetchError::Status { status, .. } => status_message(*status),
            FetchError::Network(_) => {
                "Network error. Please check your internet connection.".to_string()
            }
            FetchError::Decode(err) => format!("An unexpected error occurred: {err}"),
            FetchError::NoCurrentData => "No current weather data available".to_string(),
        }
    }
}

/// User-facing text for a non-2xx HTTP status.
pub fn status_message(status: u16) -> String {
    match status {
        400 => "Bad request. Please check your input.".to_string(),
        401 => "Unauthorized. Please check your API key.".to_string(),
        404 => "Location not found. Please try another location.".to_string(),
        429 => "Too many requests. Please try again later.".to_string(),
        500 => "Server error. Please try again later.".to_string(),
        other => format!("Failed to fetch weather data. Code: {other}"),
    }
}
