use anyhow::{Context, Result, anyhow};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::{
    collections::BTreeMap,
    fs,
    path::{Path, PathBuf},
    time::Duration,
};

use crate::{
    client::{DEFAULT_BASE_URL, DEFAULT_TIMEOUT_SECS, OpenMeteoClient},
    model::Coordinates,
};

/// A named coordinate pair saved by the user.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SavedLocation {
    pub latitude: f64,
    pub longitude: f64,
}

impl SavedLocation {
    pub fn coordinates(&self) -> Result<Coordinates> {
        Coordinates::new(self.latitude, self.longitude).map_err(|e| anyhow!(e.user_message()))
    }
}

impl From<Coordinates> for SavedLocation {
    fn from(c: Coordinates) -> Self {
        Self { latitude: c.latitude(), longitude: c.longitude() }
    }
}

/// Top-level configuration stored on disk.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct Config {
    /// Overrides the Open-Meteo base URL, e.g. for a self-hosted instance.
    pub base_url: Option<String>,

    /// HTTP timeout for the weather request.
    pub timeout_secs: Option<u64>,

    /// Name of the location used when `show` is given no coordinates.
    pub default_location: Option<String>,

    /// Example TOML:
    /// [locations.home]
    /// latitude = 40.710335
    /// longitude = -73.99309
    #[serde(default)]
    pub locations: BTreeMap<String, SavedLocation>,
}

impl Config {
    pub fn base_url(&self) -> &str {
        self.base_url.as_deref().unwrap_or(DEFAULT_BASE_URL)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs.unwrap_or(DEFAULT_TIMEOUT_SECS))
    }

    /// Build the HTTP client described by this config.
    pub fn client(&self) -> Result<OpenMeteoClient> {
        OpenMeteoClient::new(self.base_url(), self.timeout())
            .context("Failed to initialise the HTTP client")
    }

    pub fn location(&self, name: &str) -> Option<&SavedLocation> {
        self.locations.get(name)
    }

    /// Look up a saved location by name, with a hint when it is unknown.
    pub fn require_location(&self, name: &str) -> Result<&SavedLocation> {
        self.location(name).ok_or_else(|| {
            anyhow!(
                "Unknown location '{name}'.\n\
                 Hint: run `meteo location add {name} <lat> <lon>` first."
            )
        })
    }

    /// The default location, if one is configured. A dangling name is an error.
    pub fn default_location(&self) -> Result<Option<(&str, &SavedLocation)>> {
        match self.default_location.as_deref() {
            None => Ok(None),
            Some(name) => self.require_location(name).map(|loc| Some((name, loc))),
        }
    }

    /// Add or replace a location. The first saved location becomes the default.
    pub fn upsert_location(&mut self, name: &str, coords: Coordinates) {
        self.locations.insert(name.to_string(), coords.into());

        if self.default_location.is_none() {
            self.default_location = Some(name.to_string());
        }
    }

    /// Remove a location, clearing the default if it pointed there.
    pub fn remove_location(&mut self, name: &str) -> Result<SavedLocation> {
        let removed = self
            .locations
            .remove(name)
            .ok_or_else(|| anyhow!("Unknown location '{name}'."))?;

        if self.default_location.as_deref() == Some(name) {
            self.default_location = None;
        }

        Ok(removed)
    }

    pub fn set_default_location(&mut self, name: &str) -> Result<()> {
        self.require_location(name)?;
        self.default_location = Some(name.to_string());
        Ok(())
    }

    /// Load config from the platform path, or return an empty default if it doesn't exist yet.
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_file_path()?)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            // First run: no config file, return empty.
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let cfg: Config = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(cfg)
    }

    /// Save config to the platform path, creating parent directories as needed.
    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_file_path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }

        let toml =
            toml::to_string_pretty(self).context("Failed to serialize configuration to TOML")?;

        fs::write(path, toml)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;

        Ok(())
    }

    /// Path to the config file.
    pub fn config_file_path() -> Result<PathBuf> {
        let dirs = ProjectDirs::from("dev", "meteo", "meteo-cli")
            .ok_or_else(|| anyhow!("Could not determine platform config directory"))?;

        Ok(dirs.config_dir().join("config.toml"))
    }
}
