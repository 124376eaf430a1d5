//! User preferences, read from `$TIMELOG_CONFIG` or
//! `<config dir>/timelog/config.json`.

use std::env;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use serde_with::{DisplayFromStr, serde_as};

use crate::core::{DateFormat, Rounding, ShouldTotal, TimeFormat};
use crate::warnings::{Checker, DisabledCheckers};

pub const CONFIG_ENV: &str = "TIMELOG_CONFIG";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("cannot read config file {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("invalid config file {}: {source}", .path.display())]
    Malformed {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DateStyle {
    #[serde(rename = "YYYY-MM-DD")]
    Dashes,
    #[serde(rename = "YYYY/MM/DD")]
    Slashes,
}

impl From<DateStyle> for DateFormat {
    fn from(s: DateStyle) -> Self {
        DateFormat {
            use_dashes: s == DateStyle::Dashes,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TimeConvention {
    #[serde(rename = "24h")]
    TwentyFourHours,
    #[serde(rename = "12h")]
    TwelveHours,
}

impl From<TimeConvention> for TimeFormat {
    fn from(c: TimeConvention) -> Self {
        TimeFormat {
            use_24_hour_clock: c == TimeConvention::TwentyFourHours,
        }
    }
}

#[serde_as]
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Should-total for records created by `start`, `track` and `create`.
    #[serde_as(as = "Option<DisplayFromStr>")]
    pub default_should_total: Option<ShouldTotal>,
    /// Format of dates in new records; detected from the file when unset.
    pub date_format: Option<DateStyle>,
    /// Clock of new times; detected from the file when unset.
    pub time_convention: Option<TimeConvention>,
    /// Rounding of times that default to now.
    #[serde_as(as = "Option<DisplayFromStr>")]
    pub default_rounding: Option<Rounding>,
    #[serde_as(as = "Vec<DisplayFromStr>")]
    pub no_warnings: Vec<Checker>,
    pub colour: Option<bool>,
}

impl Config {
    pub fn from_json(text: &str, origin: &Path) -> Result<Config, ConfigError> {
        serde_json::from_str(text).map_err(|source| ConfigError::Malformed {
            path: origin.to_path_buf(),
            source,
        })
    }

    /// A missing file means defaults.
    pub fn from_file(path: &Path) -> Result<Config, ConfigError> {
        match fs::read_to_string(path) {
            Ok(text) => {
                log::debug!("loading config from {}", path.display());
                Config::from_json(&text, path)
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                log::debug!("no config at {}, using defaults", path.display());
                Ok(Config::default())
            }
            Err(source) => Err(ConfigError::Io {
                path: path.to_path_buf(),
                source,
            }),
        }
    }

    pub fn load() -> Result<Config, ConfigError> {
        match location() {
            Some(path) => Config::from_file(&path),
            None => Ok(Config::default()),
        }
    }

    pub fn disabled_checkers(&self) -> DisabledCheckers {
        self.no_warnings.iter().copied().collect()
    }
}

/// `$TIMELOG_CONFIG` wins over the platform config directory.
pub fn location() -> Option<PathBuf> {
    env::var_os(CONFIG_ENV)
        .filter(|v| !v.is_empty())
        .map(PathBuf::from)
        .or_else(|| dirs::config_dir().map(|d| d.join("timelog").join("config.json")))
}
