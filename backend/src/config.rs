//! Process configuration.
//!
//! Read from `timetable.toml` (path from `TIMETABLE_CONFIG`, else searched in
//! the usual locations), then overridden by `HOST`, `PORT` and `SEED_FILE`.
//! A missing file is not an error: every setting has a default.
//!
//! ```toml
//! seed_file = "data/reference.json"
//!
//! [server]
//! host = "0.0.0.0"
//! port = 8080
//!
//! [generation]
//! default_room = ""
//! max_duration_ms = 30000
//!
//! [time_grid]
//! days = [{ index = 1, name = "Lundi" }, { index = 3, name = "Mercredi", slots = [
//!     { start = "08:00", end = "12:00", category = "teaching" },
//! ] }]
//! slots = [
//!     { start = "08:00", end = "09:00", category = "teaching" },
//!     { start = "09:00", end = "09:15", category = "recess" },
//! ]
//! ```

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::db::repository::{ErrorContext, RepositoryError};
use crate::models::TimeGrid;
use crate::services::GenerationSettings;

/// Environment variable naming the configuration file.
pub const CONFIG_ENV: &str = "TIMETABLE_CONFIG";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerSettings,
    pub generation: GenerationConfig,
    /// JSON reference data loaded into the in-memory store.
    pub seed_file: Option<PathBuf>,
    /// Replaces the built-in grid when present.
    pub time_grid: Option<TimeGrid>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationConfig {
    pub default_room: String,
    /// Budget for one generation request; `0` disables the check.
    pub max_duration_ms: u64,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            default_room: String::new(),
            max_duration_ms: 30_000,
        }
    }
}

fn config_error(message: String, path: &Path) -> RepositoryError {
    RepositoryError::configuration_with_context(
        message,
        ErrorContext::new("load_config").with_details(path.display().to_string()),
    )
}

impl AppConfig {
    /// Load configuration from a TOML file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, RepositoryError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .map_err(|e| config_error(format!("Failed to read config file: {}", e), path))?;
        toml::from_str(&content)
            .map_err(|e| config_error(format!("Failed to parse config file: {}", e), path))
    }

    /// First `timetable.toml` found in the standard locations:
    /// 1. Current directory
    /// 2. `backend/` directory
    /// 3. Parent directory
    pub fn find_default_file() -> Option<PathBuf> {
        [
            PathBuf::from("timetable.toml"),
            PathBuf::from("backend/timetable.toml"),
            PathBuf::from("../timetable.toml"),
        ]
        .into_iter()
        .find(|p| p.exists())
    }

    /// Load from `TIMETABLE_CONFIG` or the default locations, then apply
    /// environment overrides.
    pub fn load() -> Result<Self, RepositoryError> {
        let explicit = std::env::var(CONFIG_ENV).ok().map(PathBuf::from);
        let mut config = match explicit.or_else(Self::find_default_file) {
            Some(path) => {
                log::info!("Loading configuration from {}", path.display());
                Self::from_file(path)?
            }
            None => Self::default(),
        };
        config.apply_overrides(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    /// Apply `HOST`, `PORT` and `SEED_FILE` as returned by `lookup`.
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<(), RepositoryError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(host) = lookup("HOST") {
            self.server.host = host;
        }
        if let Some(port) = lookup("PORT") {
            self.server.port = port.trim().parse().map_err(|_| {
                RepositoryError::configuration_with_context(
                    format!("Invalid PORT value '{}'", port),
                    ErrorContext::new("load_config").with_entity("PORT"),
                )
            })?;
        }
        if let Some(seed) = lookup("SEED_FILE") {
            self.seed_file = Some(PathBuf::from(seed));
        }
        Ok(())
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }

    pub fn time_grid(&self) -> TimeGrid {
        self.time_grid.clone().unwrap_or_default()
    }

    pub fn generation_settings(&self) -> GenerationSettings {
        GenerationSettings {
            default_room: self.generation.default_room.clone(),
            max_duration: match self.generation.max_duration_ms {
                0 => None,
                ms => Some(Duration::from_millis(ms)),
            },
        }
    }
}
