//! Core library for the `meteo` CLI.
//!
//! This crate defines:
//! - Coordinate validation and the Open-Meteo response model
//! - The HTTP client and a pass-through repository over it
//! - The four-state view model that turns a fetch into display strings
//! - Configuration handling (saved locations, base URL)
//!
//! It is used by `meteo-cli`, but can also be reused by other front ends.

pub mod client;
pub mod config;
pub mod error;
pub mod model;
pub mod repository;
pub mod state;

pub use client::{OpenMeteoClient, WeatherApi};
pub use config::{Config, SavedLocation};
pub use error::FetchError;
pub use model::{Coordinates, CurrentConditions, WeatherSnapshot};
pub use repository::WeatherRepository;
pub use state::{UiState, WeatherReport, WeatherViewModel};
