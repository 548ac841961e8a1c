use std::{io::IsTerminal, sync::Arc};

use anyhow::{Context, anyhow, bail};
use clap::{Parser, Subcommand};
use meteo_core::{
    Config, Coordinates, UiState, WeatherApi, WeatherRepository, WeatherViewModel,
};
use tracing::{debug, info};

use crate::render;

/// Coordinates loaded when nothing else is given (lower Manhattan).
const FALLBACK_LATITUDE: f64 = 40.710335;
const FALLBACK_LONGITUDE: f64 = -73.99309;

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(name = "meteo", version, about = "Current weather from Open-Meteo")]
pub struct Cli {
    /// Increase log verbosity (-v info, -vv debug, -vvv trace).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Show current weather for a coordinate pair or a saved location.
    Show {
        /// Latitude in degrees, -90 to 90.
        #[arg(long, allow_hyphen_values = true)]
        lat: Option<f64>,

        /// Longitude in degrees, -180 to 180.
        #[arg(long, allow_hyphen_values = true)]
        lon: Option<f64>,

        /// Label to display instead of "Selected Location".
        #[arg(long)]
        label: Option<String>,

        /// Name of a saved location.
        #[arg(long, conflicts_with_all = ["lat", "lon"])]
        location: Option<String>,

        /// Never prompt, even on a terminal.
        #[arg(long)]
        no_prompt: bool,
    },

    /// Manage saved locations.
    Location {
        #[command(subcommand)]
        action: LocationAction,
    },

    /// Inspect configuration.
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Debug, Subcommand)]
pub enum LocationAction {
    /// Save a named location. The first one saved becomes the default.
    Add {
        name: String,
        #[arg(allow_hyphen_values = true)]
        lat: f64,
        #[arg(allow_hyphen_values = true)]
        lon: f64,
    },
    /// Forget a saved location.
    Remove { name: String },
    /// List saved locations.
    List,
    /// Make a saved location the default for `show`.
    Default { name: String },
}

#[derive(Debug, Subcommand)]
pub enum ConfigAction {
    /// Print the configuration file path.
    Path,
}

/// What `show` ends up asking the view model for.
#[derive(Debug, Clone, PartialEq)]
struct Request {
    latitude: Option<f64>,
    longitude: Option<f64>,
    label: Option<String>,
}

impl Cli {
    pub async fn run(self) -> anyhow::Result<()> {
        match self.command {
            Command::Show { lat, lon, label, location, no_prompt } => {
                let config = Config::load()?;
                let interactive = !no_prompt && std::io::stdin().is_terminal();

                let request = match resolve_request(&config, lat, lon, label, location)? {
                    Some(request) => request,
                    None if interactive => prompt_request()?,
                    None => Request {
                        latitude: Some(FALLBACK_LATITUDE),
                        longitude: Some(FALLBACK_LONGITUDE),
                        label: None,
                    },
                };

                show(&config, request).await
            }
            Command::Location { action } => run_location(action),
            Command::Config { action: ConfigAction::Path } => {
                println!("{}", Config::config_file_path()?.display());
                Ok(())
            }
        }
    }
}

/// Pick coordinates from flags, then a named location, then the configured default.
/// `None` means nothing was specified anywhere.
fn resolve_request(
    config: &Config,
    lat: Option<f64>,
    lon: Option<f64>,
    label: Option<String>,
    location: Option<String>,
) -> anyhow::Result<Option<Request>> {
    if lat.is_some() || lon.is_some() {
        return Ok(Some(Request { latitude: lat, longitude: lon, label }));
    }

    let named = match location.as_deref() {
        Some(name) => Some((name, config.require_location(name)?)),
        None => config.default_location()?,
    };

    Ok(named.map(|(name, saved)| Request {
        latitude: Some(saved.latitude),
        longitude: Some(saved.longitude),
        label: label.or_else(|| Some(name.to_string())),
    }))
}

fn prompt_request() -> anyhow::Result<Request> {
    let latitude = inquire::Text::new("Latitude:")
        .with_default(&FALLBACK_LATITUDE.to_string())
        .prompt()
        .context("Failed to read latitude")?;
    let longitude = inquire::Text::new("Longitude:")
        .with_default(&FALLBACK_LONGITUDE.to_string())
        .prompt()
        .context("Failed to read longitude")?;
    let label = inquire::Text::new("Label (optional):")
        .prompt()
        .context("Failed to read label")?;

    Ok(Request {
        latitude: parse_coordinate(&latitude),
        longitude: parse_coordinate(&longitude),
        label: Some(label),
    })
}

/// Lenient number parsing for typed input; anything unparsable is treated as missing.
fn parse_coordinate(input: &str) -> Option<f64> {
    input.trim().parse::<f64>().ok()
}

async fn show(config: &Config, request: Request) -> anyhow::Result<()> {
    let api: Arc<dyn WeatherApi> = Arc::new(config.client()?);
    let view_model = WeatherViewModel::new(WeatherRepository::new(api));

    debug!(?request, base_url = config.base_url(), "starting fetch");
    let outcome = watch_fetch(view_model, &request, |state| {
        eprintln!("{}", render::render(state));
    })
    .await?;

    match outcome {
        UiState::Error { message } => bail!("{message}"),
        state => {
            println!("{}", render::render(&state));
            Ok(())
        }
    }
}

/// Run one fetch and follow the view model's state channel until it settles.
///
/// `on_progress` sees `Loading` exactly once when a request was actually spawned, even if the
/// request finishes before the channel is polled. The terminal state is returned, not reported.
async fn watch_fetch(
    view_model: WeatherViewModel,
    request: &Request,
    mut on_progress: impl FnMut(&UiState),
) -> anyhow::Result<UiState> {
    let mut rx = view_model.subscribe();
    let spawned = view_model
        .load_weather(request.latitude, request.longitude, request.label.as_deref())
        .is_some();

    // From here only the fetch task holds the sender, so a panicking task closes the channel.
    drop(view_model);

    if spawned {
        on_progress(&UiState::Loading);
    }

    loop {
        let state = rx.borrow_and_update().clone();
        if state.is_terminal() {
            return Ok(state);
        }

        rx.changed()
            .await
            .map_err(|_| anyhow!("Weather fetch task ended without a result"))?;
    }
}

fn run_location(action: LocationAction) -> anyhow::Result<()> {
    let mut config = Config::load()?;

    match action {
        LocationAction::Add { name, lat, lon } => {
            let coords = Coordinates::new(lat, lon).map_err(|e| anyhow!(e.user_message()))?;
            config.upsert_location(&name, coords);
            config.save()?;
            info!(%name, %coords, "saved location");
            println!("Saved '{name}' ({coords}).");
        }
        LocationAction::Remove { name } => {
            config.remove_location(&name)?;
            config.save()?;
            println!("Removed '{name}'.");
        }
        LocationAction::List => {
            print!("{}", render::render_locations(&config));
        }
        LocationAction::Default { name } => {
            config.set_default_location(&name)?;
            config.save()?;
            println!("Default location is now '{name}'.");
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;
    use meteo_core::{CurrentConditions, FetchError, WeatherSnapshot};

    use super::*;

    #[derive(Debug)]
    struct InstantApi {
        status: Option<u16>,
    }

    #[async_trait]
    impl WeatherApi for InstantApi {
        async fn current_weather(
            &self,
            _coords: Coordinates,
        ) -> Result<WeatherSnapshot, FetchError> {
            match self.status {
                Some(status) => Err(FetchError::Status { status, body: String::new() }),
                None => Ok(WeatherSnapshot {
                    current: Some(CurrentConditions {
                        time: Some("2024-01-15T12:00".into()),
                        temperature_c: Some(5.5),
                        humidity_pct: Some(75),
                        wind_speed_mps: Some(3.0),
                    }),
                    ..Default::default()
                }),
            }
        }
    }

    fn instant_view_model(status: Option<u16>) -> WeatherViewModel {
        let api: Arc<dyn WeatherApi> = Arc::new(InstantApi { status });
        WeatherViewModel::new(WeatherRepository::new(api))
    }

    fn request(lat: f64, lon: f64) -> Request {
        Request { latitude: Some(lat), longitude: Some(lon), label: None }
    }

    fn config_with_home() -> Config {
        let mut cfg = Config::default();
        cfg.upsert_location("home", Coordinates::new(52.52, 13.41).expect("valid"));
        cfg
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn loading_is_reported_before_an_instant_success() {
        for _ in 0..200 {
            let mut progress = Vec::new();
            let outcome = watch_fetch(instant_view_model(None), &request(1.0, 1.0), |s| {
                progress.push(s.clone())
            })
            .await
            .expect("fetch settles");

            assert_eq!(progress, vec![UiState::Loading]);
            match outcome {
                UiState::Success(report) => assert_eq!(report.temperature, "5.5 °C"),
                other => panic!("unexpected state {other:?}"),
            }
        }
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn api_error_is_returned_once_and_not_reported_as_progress() {
        let mut progress = Vec::new();
        let outcome = watch_fetch(instant_view_model(Some(500)), &request(1.0, 1.0), |s| {
            progress.push(s.clone())
        })
        .await
        .expect("fetch settles");

        assert_eq!(progress, vec![UiState::Loading]);
        assert_eq!(
            outcome,
            UiState::Error { message: "Server error. Please try again later.".into() }
        );
    }

    #[tokio::test]
    async fn invalid_coordinates_skip_loading() {
        let mut progress = Vec::new();
        let outcome = watch_fetch(instant_view_model(None), &request(95.0, 1.0), |s| {
            progress.push(s.clone())
        })
        .await
        .expect("fetch settles");

        assert!(progress.is_empty());
        match outcome {
            UiState::Error { message } => assert!(message.starts_with("Invalid coordinates.")),
            other => panic!("unexpected state {other:?}"),
        }
    }

    #[test]
    fn cli_parses_negative_coordinates() {
        let cli = Cli::try_parse_from(["meteo", "show", "--lat", "-33.9", "--lon", "-70.6"])
            .expect("parses");
        match cli.command {
            Command::Show { lat, lon, .. } => {
                assert_eq!(lat, Some(-33.9));
                assert_eq!(lon, Some(-70.6));
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn location_conflicts_with_explicit_coordinates() {
        let res = Cli::try_parse_from(["meteo", "show", "--lat", "1", "--location", "home"]);
        assert!(res.is_err());
    }

    #[test]
    fn explicit_flags_win_even_when_partial() {
        let req = resolve_request(&config_with_home(), Some(10.0), None, None, None)
            .expect("ok")
            .expect("request");
        assert_eq!(req, Request { latitude: Some(10.0), longitude: None, label: None });
    }

    #[test]
    fn default_location_supplies_label() {
        let req = resolve_request(&config_with_home(), None, None, None, None)
            .expect("ok")
            .expect("request");
        assert_eq!(req.latitude, Some(52.52));
        assert_eq!(req.label.as_deref(), Some("home"));

        let req = resolve_request(&config_with_home(), None, None, Some("Berlin".into()), None)
            .expect("ok")
            .expect("request");
        assert_eq!(req.label.as_deref(), Some("Berlin"));
    }

    #[test]
    fn unknown_named_location_is_an_error() {
        let err = resolve_request(&config_with_home(), None, None, None, Some("moon".into()))
            .unwrap_err();
        assert!(err.to_string().contains("Unknown location 'moon'"));
    }

    #[test]
    fn nothing_configured_resolves_to_none() {
        let req = resolve_request(&Config::default(), None, None, None, None).expect("ok");
        assert!(req.is_none());
    }

    #[test]
    fn parse_coordinate_is_lenient() {
        assert_eq!(parse_coordinate(" 40.5 "), Some(40.5));
        assert_eq!(parse_coordinate("-73"), Some(-73.0));
        assert_eq!(parse_coordinate("north"), None);
        assert_eq!(parse_coordinate(""), None);
    }
}
