use std::fmt::Write as _;

use meteo_core::{Config, UiState};

pub fn render(state: &UiState) -> String {
    match state {
        UiState::Idle => "Enter coordinates to fetch the current weather.".to_string(),
        UiState::Loading => "Fetching weather...".to_string(),
        UiState::Success(report) => format!(
            "{}\n  Temperature: {}\n  Humidity:    {}\n  Wind:        {}\n  Updated:     {}",
            report.label, report.temperature, report.humidity, report.wind, report.time
        ),
        UiState::Error { message } => format!("Error: {message}"),
    }
}

pub fn render_locations(config: &Config) -> String {
    if config.locations.is_empty() {
        return "No saved locations.\n".to_string();
    }

    let default = config.default_location.as_deref();
    let mut out = String::new();

    for (name, loc) in &config.locations {
        let marker = if Some(name.as_str()) == default { '*' } else { ' ' };
        let note = if loc.coordinates().is_err() { "  (invalid)" } else { "" };
        let _ = writeln!(out, "{marker} {name}: {}, {}{note}", loc.latitude, loc.longitude);
    }

    out
}
