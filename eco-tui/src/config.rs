//! Settings read from the environment.

use std::path::PathBuf;
use std::time::Duration;

use eco_core::model::{Coordinate, LocationFix};

const DEFAULT_BACKEND_URL: &str = "http://192.168.100.11:8000";
const DEFAULT_STATE_DIR: &str = ".eco";

#[derive(thiserror::Error, Debug, PartialEq, Eq)]
pub(crate) enum ConfigError {
    #[error("{name} has an invalid value: {value}")]
    InvalidValue { name: &'static str, value: String },
    #[error("{name} entry {entry:?} must look like [source=]lat,lon,accuracy")]
    InvalidFix { name: &'static str, entry: String },
}

/// Platform location as the terminal pretends to see it.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct LocationConfig {
    pub permission: bool,
    pub gps_enabled: bool,
    pub fixes: Vec<LocationFix>,
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Config {
    pub backend_url: String,
    pub routing_url: String,
    pub routing_api_key: String,
    pub state_dir: PathBuf,
    pub http_timeout: Option<Duration>,
    pub location: LocationConfig,
}

impl Config {
    pub(crate) fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    pub(crate) fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let text = |name: &str, default: &str| lookup(name).unwrap_or_else(|| default.to_owned());

        let http_timeout = match lookup("ECO_HTTP_TIMEOUT_SECS") {
            Some(value) => Some(Duration::from_secs(value.trim().parse().map_err(|_err| {
                ConfigError::InvalidValue {
                    name: "ECO_HTTP_TIMEOUT_SECS",
                    value,
                }
            })?)),
            None => None,
        };

        let location = LocationConfig {
            permission: flag(&lookup, "ECO_LOCATION_PERMISSION", true)?,
            gps_enabled: flag(&lookup, "ECO_GPS_ENABLED", true)?,
            fixes: lookup("ECO_LOCATION_FIXES")
                .map(|value| parse_fixes("ECO_LOCATION_FIXES", &value))
                .transpose()?
                .unwrap_or_default(),
        };

        Ok(Self {
            backend_url: text("ECO_BACKEND_URL", DEFAULT_BACKEND_URL),
            routing_url: text("ECO_ROUTING_URL", eco_provider_openroute::DEFAULT_BASE_URL),
            routing_api_key: text("ECO_ROUTING_API_KEY", ""),
            state_dir: PathBuf::from(text("ECO_STATE_DIR", DEFAULT_STATE_DIR)),
            http_timeout,
            location,
        })
    }
}

fn flag(
    lookup: &impl Fn(&str) -> Option<String>,
    name: &'static str,
    default: bool,
) -> Result<bool, ConfigError> {
    let Some(value) = lookup(name) else {
        return Ok(default);
    };
    match value.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::InvalidValue { name, value }),
    }
}

// `gps=-34.76,-58.21,5;network=-34.7,-58.2,40`; the source name is optional.
fn parse_fixes(name: &'static str, value: &str) -> Result<Vec<LocationFix>, ConfigError> {
    value
        .split(';')
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .enumerate()
        .map(|(index, entry)| {
            let invalid = || ConfigError::InvalidFix {
                name,
                entry: entry.to_owned(),
            };
            let (source, numbers) = match entry.split_once('=') {
                Some((source, numbers)) => (source.trim().to_owned(), numbers),
                None => (format!("source-{}", index + 1), entry),
            };
            let parts: Vec<&str> = numbers.split(',').map(str::trim).collect();
            let [latitude, longitude, accuracy] = parts.as_slice() else {
                return Err(invalid());
            };
            let latitude = latitude.parse::<f64>().map_err(|_err| invalid())?;
            let longitude = longitude.parse::<f64>().map_err(|_err| invalid())?;
            let accuracy = accuracy.parse::<f32>().map_err(|_err| invalid())?;
            Ok(LocationFix {
                source,
                coordinate: Coordinate::new(latitude, longitude),
                accuracy,
            })
        })
        .collect()
}
