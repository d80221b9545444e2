use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::liveness::domain::thresholds::{LivenessThresholds, ThresholdError};
use crate::shared::constants::{
    APP_DIR_NAME, DEFAULT_BLINK_REFRACTORY_MS, DEFAULT_RETRY_DELAY_MS, DEFAULT_STABILITY_LOCK,
    DEFAULT_STABILITY_MAX, DEFAULT_TICK_INTERVAL_MS,
};

#[derive(Error, Debug)]
pub enum SettingsError {
    #[error("failed to read settings from {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to write settings to {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid settings JSON: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("invalid threshold: {0}")]
    Thresholds(#[from] ThresholdError),
    #[error("invalid setting: {0}")]
    Invalid(String),
    #[error("could not determine config directory")]
    NoConfigDir,
}

/// Session configuration, stored as JSON. Missing fields take defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub thresholds: LivenessThresholds,
    pub stability_max: u32,
    pub stability_lock: u32,
    pub blink_refractory_ms: u64,
    pub tick_interval_ms: u64,
    pub retry_delay_ms: u64,
    pub cue_enabled: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            thresholds: LivenessThresholds::default(),
            stability_max: DEFAULT_STABILITY_MAX,
            stability_lock: DEFAULT_STABILITY_LOCK,
            blink_refractory_ms: DEFAULT_BLINK_REFRACTORY_MS,
            tick_interval_ms: DEFAULT_TICK_INTERVAL_MS,
            retry_delay_ms: DEFAULT_RETRY_DELAY_MS,
            cue_enabled: true,
        }
    }
}

impl Settings {
    /// `<config_dir>/LiveGate/settings.json`
    pub fn default_path() -> Result<PathBuf, SettingsError> {
        dirs::config_dir()
            .map(|d| d.join(APP_DIR_NAME).join("settings.json"))
            .ok_or(SettingsError::NoConfigDir)
    }

    pub fn load(path: &Path) -> Result<Self, SettingsError> {
        let json = fs::read_to_string(path).map_err(|e| SettingsError::Read {
            path: path.to_path_buf(),
            source: e,
        })?;
        let settings: Settings = serde_json::from_str(&json)?;
        settings.validate()?;
        Ok(settings)
    }

    /// Loads the user's settings file, falling back to defaults when it is
    /// missing or unusable.
    pub fn load_default() -> Self {
        let Ok(path) = Self::default_path() else {
            return Self::default();
        };
        if !path.exists() {
            return Self::default();
        }
        match Self::load(&path) {
            Ok(settings) => settings,
            Err(e) => {
                log::warn!("Ignoring settings at {}: {e}", path.display());
                Self::default()
            }
        }
    }

    pub fn save(&self, path: &Path) -> Result<(), SettingsError> {
        let write_err = |e| SettingsError::Write {
            path: path.to_path_buf(),
            source: e,
        };
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(write_err)?;
        }
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json).map_err(write_err)
    }

    pub fn validate(&self) -> Result<(), SettingsError> {
        self.thresholds.validate()?;
        if self.stability_lock == 0 {
            return Err(SettingsError::Invalid(
                "stability_lock must be positive".into(),
            ));
        }
        if self.stability_max < self.stability_lock {
            return Err(SettingsError::Invalid(format!(
                "stability_max ({}) must be at least stability_lock ({})",
                self.stability_max, self.stability_lock
            )));
        }
        if self.tick_interval_ms == 0 {
            return Err(SettingsError::Invalid(
                "tick_interval_ms must be positive".into(),
            ));
        }
        Ok(())
    }

    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms)
    }

    pub fn retry_delay(&self) -> Duration {
        Duration::from_millis(self.retry_delay_ms)
    }

    pub fn blink_refractory(&self) -> Duration {
        Duration::from_millis(self.blink_refractory_ms)
    }
}
