//! Defines all configuration structures for the Flipclock engine.
//!
//! These structs are deserialized with `serde` from layered sources: built-in
//! defaults, an optional TOML file, then `FLIPCLOCK_*` environment variables.
//! Nested keys use a double underscore, e.g. `FLIPCLOCK_AUDIO__ENABLED=false`.

use crate::error::Result;
use chrono_tz::Tz;
use config::{Config, Environment, File, FileFormat};
use serde::Deserialize;
use std::path::PathBuf;

/// Environment variable naming an explicit configuration file.
pub const CONFIG_PATH_ENV: &str = "FLIPCLOCK_CONFIG";

/// The top-level configuration for the `FlipclockEngine`.
#[derive(Debug, Clone, Deserialize)]
pub struct FlipclockConfig {
    /// The timezone used for the wall clock, as an IANA name
    /// (e.g. "America/New_York"). When absent the system local zone is used.
    #[serde(default)]
    pub timezone: Option<Tz>,

    /// Fallback `tracing` filter used when `RUST_LOG` is not set.
    #[serde(default = "default_log_filter")]
    pub log_filter: String,

    /// Settings for the completion alert tone.
    #[serde(default)]
    pub audio: AudioConfig,
}

/// Settings for the completion alert tone.
#[derive(Debug, Clone, Deserialize)]
pub struct AudioConfig {
    /// When false the synthesizer never opens an audio context.
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Linear output scale applied to the tone, clamped to `0.0..=1.0`.
    #[serde(default = "default_volume")]
    pub volume: f32,

    /// Sample rate the tone is rendered at.
    #[serde(default = "default_sample_rate")]
    pub sample_rate: u32,
}

impl FlipclockConfig {
    /// Loads configuration from `FLIPCLOCK_CONFIG` (or `./flipclock.toml` if
    /// present) and the environment.
    pub fn load() -> Result<Self> {
        Self::load_from(std::env::var_os(CONFIG_PATH_ENV).map(PathBuf::from))
    }

    /// Loads configuration from an explicit file, layered under the environment.
    ///
    /// An explicit path must exist; without one, `flipclock.toml` in the
    /// working directory is read when it is there.
    pub fn load_from(path: Option<PathBuf>) -> Result<Self> {
        let builder = match path {
            Some(path) => Config::builder().add_source(File::from(path)),
            None => Config::builder().add_source(File::with_name("flipclock").required(false)),
        };
        let settings = builder
            .add_source(
                Environment::with_prefix("FLIPCLOCK")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;
        Ok(settings.try_deserialize()?)
    }

    /// Parses configuration from TOML text alone, ignoring the environment.
    pub fn from_toml(text: &str) -> Result<Self> {
        let settings = Config::builder()
            .add_source(File::from_str(text, FileFormat::Toml))
            .build()?;
        Ok(settings.try_deserialize()?)
    }
}

// --- Default value functions for serde ---

fn default_log_filter() -> String {
    "info".to_string()
}

fn default_true() -> bool {
    true
}

fn default_volume() -> f32 {
    1.0
}

fn default_sample_rate() -> u32 {
    44_100
}

impl Default for FlipclockConfig {
    fn default() -> Self {
        Self {
            timezone: None,
            log_filter: default_log_filter(),
            audio: AudioConfig::default(),
        }
    }
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            enabled: default_true(),
            volume: default_volume(),
            sample_rate: default_sample_rate(),
        }
    }
}
