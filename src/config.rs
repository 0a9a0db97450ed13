//! Configuration System using Figment
//!
//! Configuration is layered, later sources overriding earlier ones:
//! 1. built-in defaults ([`AppConfig::default`])
//! 2. a TOML file (`config/thermo_daq.toml` unless another path is given)
//! 3. environment variables prefixed with `THERMO_DAQ_`, nested keys separated by `__`
//!
//! A missing file is not an error; the defaults reproduce the reference instrument
//! (base 26 °C, threshold 35 °C, 0.5 Hz, 40 s).
//!
//! # Example
//! ```no_run
//! use thermo_daq::config::AppConfig;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! // THERMO_DAQ_ACQUISITION__THRESHOLD_C=30 overrides the file value
//! let config = AppConfig::load()?;
//! config.validate()?;
//! println!("Threshold: {} °C", config.acquisition.threshold_c);
//! # Ok(())
//! # }
//! ```

use crate::error::{AppResult, DaqError};
use crate::validation::{is_finite, is_positive_finite, is_valid_path};
use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Default configuration file location.
pub const DEFAULT_CONFIG_PATH: &str = "config/thermo_daq.toml";

/// Environment variable prefix.
pub const ENV_PREFIX: &str = "THERMO_DAQ_";

/// Top-level configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Application settings
    pub application: ApplicationConfig,
    /// Instrument settings, fixed for the life of a session
    pub acquisition: AcquisitionConfig,
    /// Run control settings
    pub run: RunConfig,
    /// Export settings
    pub storage: StorageConfig,
}

/// Application-level configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApplicationConfig {
    /// Application name
    pub name: String,
    /// Logging level (trace, debug, info, warn, error)
    pub log_level: String,
    /// Log output format (pretty, compact, json)
    pub log_format: String,
}

impl Default for ApplicationConfig {
    fn default() -> Self {
        Self {
            name: "Temperature DAQ".to_string(),
            log_level: "info".to_string(),
            log_format: "pretty".to_string(),
        }
    }
}

/// Instrument configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AcquisitionConfig {
    /// Base temperature in °C
    pub base_temperature_c: f64,
    /// Alert threshold in °C
    pub threshold_c: f64,
    /// Samples per second
    pub sampling_rate_hz: f64,
    /// Seed for the simulated sensor; `None` seeds from OS entropy
    pub seed: Option<u64>,
}

impl Default for AcquisitionConfig {
    fn default() -> Self {
        Self {
            base_temperature_c: 26.0,
            threshold_c: 35.0,
            sampling_rate_hz: 0.5,
            seed: None,
        }
    }
}

impl AcquisitionConfig {
    /// Unseeded configuration.
    pub fn new(base_temperature_c: f64, threshold_c: f64, sampling_rate_hz: f64) -> Self {
        Self {
            base_temperature_c,
            threshold_c,
            sampling_rate_hz,
            seed: None,
        }
    }

    /// Sets the sensor seed.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Time between samples, `1 / sampling_rate_hz`.
    pub fn sampling_interval(&self) -> Duration {
        Duration::try_from_secs_f64(1.0 / self.sampling_rate_hz).unwrap_or(Duration::MAX)
    }

    /// Checks the values are usable.
    pub fn validate(&self) -> AppResult<()> {
        is_finite(self.base_temperature_c).map_err(|e| invalid("base_temperature_c", e))?;
        is_finite(self.threshold_c).map_err(|e| invalid("threshold_c", e))?;
        is_positive_finite(self.sampling_rate_hz)
            .map_err(|e| invalid("sampling_rate_hz", e))?;
        if self.sampling_interval() == Duration::ZERO {
            return Err(DaqError::Configuration(format!(
                "sampling_rate_hz {} is too high",
                self.sampling_rate_hz
            )));
        }
        Ok(())
    }
}

/// Run control configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunConfig {
    /// Acquisition duration in seconds
    pub duration_s: f64,
    /// Report per-tick status instead of periodic progress
    pub live_view: bool,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            duration_s: 40.0,
            live_view: true,
        }
    }
}

impl RunConfig {
    /// Run duration. Values too large for a `Duration` saturate to `Duration::MAX`.
    pub fn duration(&self) -> Duration {
        match Duration::try_from_secs_f64(self.duration_s) {
            Ok(d) => d,
            Err(_) if self.duration_s > 0.0 => Duration::MAX,
            Err(_) => Duration::ZERO,
        }
    }
}

/// Export configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Directory for exports written under a generated name
    pub output_dir: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("."),
        }
    }
}

fn invalid(field: &str, reason: &str) -> DaqError {
    DaqError::Configuration(format!("{field}: {reason}"))
}

impl AppConfig {
    /// Load configuration from [`DEFAULT_CONFIG_PATH`] and environment variables
    pub fn load() -> AppResult<Self> {
        Self::load_from(DEFAULT_CONFIG_PATH)
    }

    /// Load configuration from a specific file path
    pub fn load_from<P: AsRef<Path>>(path: P) -> AppResult<Self> {
        let config = Self::figment(path.as_ref()).extract()?;
        Ok(config)
    }

    /// The layered provider, exposed for callers that want to merge more sources.
    pub fn figment(path: &Path) -> Figment {
        Figment::from(Serialized::defaults(AppConfig::default()))
            .merge(Toml::file(path))
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
    }

    /// Validate configuration after loading
    pub fn validate(&self) -> AppResult<()> {
        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.application.log_level.to_lowercase().as_str()) {
            return Err(DaqError::Configuration(format!(
                "Invalid log_level '{}'. Must be one of: {}",
                self.application.log_level,
                valid_levels.join(", ")
            )));
        }

        let valid_formats = ["pretty", "compact", "json"];
        if !valid_formats.contains(&self.application.log_format.to_lowercase().as_str()) {
            return Err(DaqError::Configuration(format!(
                "Invalid log_format '{}'. Must be one of: {}",
                self.application.log_format,
                valid_formats.join(", ")
            )));
        }

        self.acquisition.validate()?;

        if !self.run.duration_s.is_finite() || self.run.duration_s < 0.0 {
            return Err(invalid(
                "duration_s",
                "Value must be a finite, non-negative number",
            ));
        }

        is_valid_path(&self.storage.output_dir.to_string_lossy())
            .map_err(|e| invalid("output_dir", e))?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use figment::Jail;

    #[test]
    fn defaults_match_reference_instrument() {
        let config = AppConfig::default();
        assert_eq!(config.acquisition.base_temperature_c, 26.0);
        assert_eq!(config.acquisition.threshold_c, 35.0);
        assert_eq!(config.acquisition.sampling_rate_hz, 0.5);
        assert_eq!(config.acquisition.sampling_interval(), Duration::from_secs(2));
        assert_eq!(config.run.duration(), Duration::from_secs(40));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn missing_file_yields_defaults() {
        Jail::expect_with(|_jail| {
            let config = AppConfig::load_from("does/not/exist.toml")
                .map_err(|e| e.to_string())?;
            assert_eq!(config, AppConfig::default());
            Ok(())
        });
    }

    #[test]
    fn file_and_env_layers() {
        Jail::expect_with(|jail| {
            jail.create_file(
                "thermo.toml",
                r#"
                [acquisition]
                base_temperature_c = 20.0
                threshold_c = 25.0

                [run]
                live_view = false
                "#,
            )?;
            jail.set_env("THERMO_DAQ_ACQUISITION__THRESHOLD_C", "30.5");
            jail.set_env("THERMO_DAQ_ACQUISITION__SEED", "99");

            let config = AppConfig::load_from("thermo.toml").map_err(|e| e.to_string())?;
            assert_eq!(config.acquisition.base_temperature_c, 20.0);
            assert_eq!(config.acquisition.threshold_c, 30.5);
            assert_eq!(config.acquisition.seed, Some(99));
            assert!(!config.run.live_view);
            // untouched keys keep their defaults
            assert_eq!(config.acquisition.sampling_rate_hz, 0.5);
            Ok(())
        });
    }

    #[test]
    fn malformed_file_is_a_config_error() {
        Jail::expect_with(|jail| {
            jail.create_file("bad.toml", "[acquisition]\nthreshold_c = \"hot\"\n")?;
            match AppConfig::load_from("bad.toml") {
                Err(DaqError::Config(_)) => Ok(()),
                other => Err(format!("unexpected result: {:?}", other).into()),
            }
        });
    }

    #[test]
    fn invalid_log_level() {
        let mut config = AppConfig::default();
        config.application.log_level = "loud".to_string();
        assert!(matches!(config.validate(), Err(DaqError::Configuration(_))));
    }

    #[test]
    fn invalid_sampling_rate() {
        for rate in [0.0, -1.0, f64::NAN, f64::INFINITY] {
            let config = AcquisitionConfig::new(26.0, 35.0, rate);
            assert!(config.validate().is_err(), "rate {rate} accepted");
        }
    }

    #[test]
    fn invalid_duration() {
        let mut config = AppConfig::default();
        config.run.duration_s = -1.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn huge_duration_saturates() {
        let mut config = AppConfig::default();
        config.run.duration_s = 1e20;
        assert!(config.validate().is_ok());
        assert_eq!(config.run.duration(), Duration::MAX);

        config.run.duration_s = 0.0;
        assert_eq!(config.run.duration(), Duration::ZERO);
    }

    #[test]
    fn empty_output_dir() {
        let mut config = AppConfig::default();
        config.storage.output_dir = PathBuf::new();
        assert!(config.validate().is_err());
    }
}
