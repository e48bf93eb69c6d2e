//! dutylog configuration.
//!
//! Loaded from `~/.dutylog/config.toml`, or from `--config <path>`.
//! A missing default file means defaults; everything else must parse.

use std::fs;
use std::path::{Path, PathBuf};

use jiff::tz::TimeZone;
use serde::{Deserialize, Serialize};

use dutylog::{HosRules, PlanOptions, RestartStatus};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct Config {
    /// Time zone for trips that do not name one. UTC when unset.
    pub default_time_zone: Option<String>,

    /// Duty status logged for restart stops.
    pub restart_status: RestartStatus,

    /// Pad first and last days to a full 24-hour sheet.
    pub pad_partial_days: bool,

    pub rules: HosRules,
}

impl Config {
    /// Load from an explicit path, or from the default location.
    pub fn load(explicit: Option<&Path>) -> Result<Self, String> {
        match explicit {
            Some(path) => {
                if !path.exists() {
                    return Err(format!("no config file found at {}", path.display()));
                }
                Self::load_from(path)
            }
            None => {
                let path = Self::path().ok_or("could not determine home directory")?;
                if !path.exists() {
                    return Ok(Self::default());
                }
                Self::load_from(&path)
            }
        }
    }

    /// Read and validate a config file.
    pub fn load_from(path: &Path) -> Result<Self, String> {
        let contents = fs::read_to_string(path)
            .map_err(|e| format!("failed to read {}: {e}", path.display()))?;

        let config: Self = toml::from_str(&contents)
            .map_err(|e| format!("invalid config at {}: {e}", path.display()))?;

        config
            .validate()
            .map_err(|e| format!("invalid config at {}: {e}", path.display()))?;

        Ok(config)
    }

    /// The config file path: `~/.dutylog/config.toml`.
    pub fn path() -> Option<PathBuf> {
        dirs::home_dir().map(|h| h.join(".dutylog").join("config.toml"))
    }

    pub fn validate(&self) -> Result<(), String> {
        if let Some(name) = &self.default_time_zone {
            TimeZone::get(name).map_err(|e| format!("default-time-zone '{name}': {e}"))?;
        }
        self.rules.validate()
    }

    pub fn plan_options(&self) -> PlanOptions {
        PlanOptions {
            rules: self.rules.clone(),
            restart_status: self.restart_status,
            pad_partial_days: self.pad_partial_days,
            default_time_zone: self.default_time_zone.clone(),
        }
    }
}
