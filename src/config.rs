//! System configuration parameters
//!
//! All tunable parameters for the dispenser.  Defaults reproduce the
//! calibrated constants of the bench machine; a JSON file passed with
//! `--config` can override any of them at startup.

use std::path::Path;
use std::time::Duration;

use log::error;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Core machine configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MachineConfig {
    // --- Input ---
    /// Minimum time between two accepted presses of the same button (ms)
    pub debounce_ms: u32,

    // --- Menu timing ---
    /// How long Start, ThatsIt, FinishDispensing and Error stay on screen (s)
    pub dwell_secs: u32,
    /// Controller poll interval (ms)
    pub poll_interval_ms: u32,
    /// How long the shutdown message stays on screen (s)
    pub shutdown_message_secs: u32,

    // --- Pouring ---
    /// Volume of one recipe part (ml)
    pub volume_per_part_ml: u32,
    /// Glass capacity (ml); every recipe must fit
    pub glass_volume_ml: u32,
    /// Pump run time per millilitre (s).  Same for every pump.
    pub time_per_ml_secs: f64,
}

impl Default for MachineConfig {
    fn default() -> Self {
        Self {
            // Input
            debounce_ms: 200,

            // Menu timing
            dwell_secs: 3,
            poll_interval_ms: 100, // 10 Hz
            shutdown_message_secs: 3,

            // Pouring
            volume_per_part_ml: 1,
            glass_volume_ml: 350,
            time_per_ml_secs: 0.25,
        }
    }
}

impl MachineConfig {
    /// Load a config file.  Missing fields fall back to [`Default`].
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path).map_err(|_| ConfigError::Unreadable)?;
        let config: Self = serde_json::from_str(&raw).map_err(|_| ConfigError::Malformed)?;
        config.validate()?;
        Ok(config)
    }

    /// [`load`](Self::load) `path` if given, defaults otherwise.  A failed
    /// load is logged before it is returned.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self, ConfigError> {
        match path {
            Some(path) => {
                Self::load(path).inspect_err(|e| error!("Config {}: {}", path.display(), e))
            }
            None => Ok(Self::default()),
        }
    }

    /// Reject values that would stall the poll loop or make pours meaningless.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.poll_interval_ms == 0 {
            return Err(ConfigError::ValidationFailed("poll_interval_ms must be > 0"));
        }
        if self.volume_per_part_ml == 0 {
            return Err(ConfigError::ValidationFailed("volume_per_part_ml must be > 0"));
        }
        if self.glass_volume_ml == 0 {
            return Err(ConfigError::ValidationFailed("glass_volume_ml must be > 0"));
        }
        if !(self.time_per_ml_secs.is_finite() && self.time_per_ml_secs > 0.0) {
            return Err(ConfigError::ValidationFailed(
                "time_per_ml_secs must be a positive number",
            ));
        }
        Ok(())
    }

    pub fn debounce_us(&self) -> u64 {
        u64::from(self.debounce_ms) * 1000
    }

    pub fn dwell(&self) -> Duration {
        Duration::from_secs(u64::from(self.dwell_secs))
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(u64::from(self.poll_interval_ms))
    }

    pub fn shutdown_message(&self) -> Duration {
        Duration::from_secs(u64::from(self.shutdown_message_secs))
    }
}
