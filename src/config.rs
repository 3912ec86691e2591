//! Simulator configuration.
//!
//! Loaded from a TOML file (default `cophotographer.toml` in the working
//! directory, or `--config <path>`). The file is optional and sparse: user
//! values are merged on top of stock defaults, so override only what you need.
//!
//! ## Configuration Options
//!
//! ```toml
//! # All options are optional - defaults shown below
//!
//! [camera]
//! aperture = 5.6            # Starting f-number (must be an available stop)
//! shutter = "1/125"         # Starting shutter speed
//! iso = 400                 # Starting ISO
//!
//! [preview]
//! max_width = 800           # Loaded images are scaled down to fit, never up
//! max_height = 500
//!
//! [simulation]
//! # seed = 42               # Seeds one noise RNG per run (omit for OS entropy)
//!
//! [suggestions]
//! enabled = true            # Ask the backend for advice on bad exposures
//! base_url = "http://127.0.0.1:8000"
//! # timeout_secs = 10       # Omit for no client-side timeout
//! ```
//!
//! Unknown keys are rejected to catch typos early.

use crate::camera::{CameraParameters, ParamError};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;

/// Default config file name, looked up in the working directory.
pub const DEFAULT_CONFIG_FILE: &str = "cophotographer.toml";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
    #[error("Config camera settings: {0}")]
    Camera(#[from] ParamError),
}

/// Simulator configuration loaded from TOML.
///
/// All fields have defaults. Unknown keys are rejected.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SimConfig {
    /// Starting camera parameters.
    pub camera: CameraConfig,
    /// Preview scaling bounds.
    pub preview: PreviewConfig,
    /// Noise simulation settings.
    pub simulation: SimulationConfig,
    /// Suggestion backend settings.
    pub suggestions: SuggestionsConfig,
}

impl SimConfig {
    /// Validate config values are within acceptable ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.camera.to_parameters()?;
        if self.preview.max_width == 0 || self.preview.max_height == 0 {
            return Err(ConfigError::Validation(
                "preview.max_width and preview.max_height must be non-zero".into(),
            ));
        }
        if self.suggestions.enabled && self.suggestions.base_url.trim().is_empty() {
            return Err(ConfigError::Validation(
                "suggestions.base_url must be set when suggestions are enabled".into(),
            ));
        }
        if self.suggestions.timeout_secs == Some(0) {
            return Err(ConfigError::Validation(
                "suggestions.timeout_secs must be positive (omit it for no timeout)".into(),
            ));
        }
        Ok(())
    }
}

/// Starting camera parameters. Each value must be one of the available stops.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CameraConfig {
    pub aperture: f64,
    pub shutter: String,
    pub iso: u32,
}

impl Default for CameraConfig {
    fn default() -> Self {
        let params = CameraParameters::default();
        Self {
            aperture: params.aperture(),
            shutter: params.shutter().to_string(),
            iso: params.iso(),
        }
    }
}

impl CameraConfig {
    pub fn to_parameters(&self) -> Result<CameraParameters, ParamError> {
        CameraParameters::from_values(self.aperture, &self.shutter, self.iso)
    }
}

/// Bounds the loaded image is scaled down to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PreviewConfig {
    pub max_width: u32,
    pub max_height: u32,
}

impl Default for PreviewConfig {
    fn default() -> Self {
        Self {
            max_width: 800,
            max_height: 500,
        }
    }
}

/// Noise simulation settings.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SimulationConfig {
    /// Seed for the run's noise RNG. One RNG serves a whole `simulate` or
    /// `dial` run, so a seeded run repeats exactly; absent means OS entropy.
    pub seed: Option<u64>,
}

/// Suggestion backend settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SuggestionsConfig {
    pub enabled: bool,
    /// Base URL of the backend serving `/api/config` and `/api/check-exposure`.
    pub base_url: String,
    /// Client-side request timeout. Absent means none.
    pub timeout_secs: Option<u64>,
}

impl Default for SuggestionsConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            base_url: "http://127.0.0.1:8000".to_string(),
            timeout_secs: None,
        }
    }
}

// =============================================================================
// Config loading, merging, and validation
// =============================================================================

/// Returns the stock default config as a `toml::Value::Table`.
pub fn stock_defaults_value() -> toml::Value {
    toml::Value::try_from(SimConfig::default()).expect("default config must serialize")
}

/// Recursively merge `overlay` on top of `base`.
///
/// - Tables are merged key-by-key (overlay keys override base keys).
/// - Non-table values in overlay replace base values entirely.
/// - Keys in base that are not in overlay are preserved.
pub fn merge_toml(base: toml::Value, overlay: toml::Value) -> toml::Value {
    match (base, overlay) {
        (toml::Value::Table(mut base_table), toml::Value::Table(overlay_table)) => {
            for (key, overlay_val) in overlay_table {
                let merged = match base_table.remove(&key) {
                    Some(base_val) => merge_toml(base_val, overlay_val),
                    None => overlay_val,
                };
                base_table.insert(key, merged);
            }
            toml::Value::Table(base_table)
        }
        (_, overlay) => overlay,
    }
}

/// Load a config file as a raw TOML value.
///
/// Returns `Ok(None)` if the file does not exist.
pub fn load_raw_config(path: &Path) -> Result<Option<toml::Value>, ConfigError> {
    if !path.exists() {
        return Ok(None);
    }
    let content = fs::read_to_string(path)?;
    let value: toml::Value = toml::from_str(&content)?;
    Ok(Some(value))
}

/// Merge an optional overlay onto a base value, then deserialize and validate.
pub fn resolve_config(
    base: toml::Value,
    overlay: Option<toml::Value>,
) -> Result<SimConfig, ConfigError> {
    let merged = match overlay {
        Some(ov) => merge_toml(base, ov),
        None => base,
    };
    let config: SimConfig = merged.try_into()?;
    config.validate()?;
    Ok(config)
}

/// Load config from `path`, falling back to stock defaults if it is absent.
pub fn load_config(path: &Path) -> Result<SimConfig, ConfigError> {
    let overlay = load_raw_config(path)?;
    resolve_config(stock_defaults_value(), overlay)
}

/// Returns a fully-commented stock config file.
///
/// Used by the `gen-config` CLI command.
pub fn stock_config_toml() -> &'static str {
    r##"# CoPhotographer Configuration
# ===========================
# All settings are optional. Remove or comment out any you don't need.
# Values shown below are the defaults.
#
# Unknown keys will cause an error.

# ---------------------------------------------------------------------------
# Starting camera parameters
# ---------------------------------------------------------------------------
[camera]
# f-number: 1.8, 2.0, 2.8, 4, 5.6, 8, 11, 14, 16, 18, 22
aperture = 5.6

# Shutter: 1/4, 1/8, 1/15, 1/30, 1/60, 1/125, 1/250, 1/500,
#          1/1000, 1/2000, 1/3000, 1/4000, 1/8000
shutter = "1/125"

# ISO: 200, 400, 800, 1600, 3200, 6400
iso = 400

# ---------------------------------------------------------------------------
# Preview
# ---------------------------------------------------------------------------
[preview]
# Loaded images are scaled down to fit these bounds (never scaled up).
max_width = 800
max_height = 500

# ---------------------------------------------------------------------------
# Simulation
# ---------------------------------------------------------------------------
[simulation]
# Seed for the ISO noise generator. One generator serves the whole run,
# so a seeded simulate or dial session repeats exactly. Omit for OS entropy.
# seed = 42

# ---------------------------------------------------------------------------
# Exposure suggestions
# ---------------------------------------------------------------------------
[suggestions]
# Ask the suggestion backend for advice when a render is over/under-exposed.
enabled = true

# Backend serving /api/config and /api/check-exposure.
base_url = "http://127.0.0.1:8000"

# Client-side request timeout in seconds. Omit for none.
# timeout_secs = 10
"##
}
