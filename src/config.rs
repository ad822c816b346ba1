//! Pipeline configuration.
//!
//! Every stage works with built-in defaults; a TOML file can override any of
//! them, and command-line flags override the file.

use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Environment variable naming the configuration file.
pub const CONFIG_ENV_VAR: &str = "WEATHER_INSIGHTS_CONFIG";
/// Configuration file picked up from the working directory when present.
pub const DEFAULT_CONFIG_FILE: &str = "weather-insights.toml";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file '{0}'")]
    Io(PathBuf, #[source] std::io::Error),

    #[error("Invalid TOML in config file '{0}'")]
    Toml(PathBuf, #[source] toml::de::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PathsConfig {
    pub raw_dir: PathBuf,
    pub processed_dir: PathBuf,
    pub reports_dir: PathBuf,
    /// Download cache; the system cache directory is used when unset.
    pub cache_dir: Option<PathBuf>,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            raw_dir: PathBuf::from("data/raw"),
            processed_dir: PathBuf::from("data/processed"),
            reports_dir: PathBuf::from("reports"),
            cache_dir: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SourceConfig {
    pub geocoding_url: String,
    pub archive_url: String,
    pub timeout_secs: u64,
    pub use_cache: bool,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            geocoding_url: "https://geocoding-api.open-meteo.com/v1/search".to_string(),
            archive_url: "https://archive-api.open-meteo.com/v1/archive".to_string(),
            timeout_secs: 60,
            use_cache: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PreprocessConfig {
    /// Longest interior run of missing days that is interpolated.
    pub max_gap_days: usize,
    /// Trailing days flagged `is_test`.
    pub test_days: usize,
}

impl Default for PreprocessConfig {
    fn default() -> Self {
        Self {
            max_gap_days: 3,
            test_days: 365,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BacktestSection {
    pub horizon: usize,
    pub seasonal_period: usize,
    pub sarima_period: usize,
    pub ridge_alpha: f64,
    pub min_train: usize,
}

impl Default for BacktestSection {
    fn default() -> Self {
        Self {
            horizon: 7,
            seasonal_period: 365,
            sarima_period: 7,
            ridge_alpha: 1.0,
            min_train: 60,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PipelineConfig {
    pub paths: PathsConfig,
    pub source: SourceConfig,
    pub preprocess: PreprocessConfig,
    pub backtest: BacktestSection,
}

impl PipelineConfig {
    /// Loads the configuration from `explicit`, else from the file named by
    /// [`CONFIG_ENV_VAR`], else from [`DEFAULT_CONFIG_FILE`] if it exists.
    /// Falls back to defaults when no file is found.
    pub fn load(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        if let Some(path) = explicit {
            return Self::load_from(path);
        }
        if let Ok(path) = std::env::var(CONFIG_ENV_VAR) {
            return Self::load_from(Path::new(&path));
        }
        let default_path = Path::new(DEFAULT_CONFIG_FILE);
        if default_path.exists() {
            Self::load_from(default_path)
        } else {
            Ok(Self::default())
        }
    }

    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let text =
            fs::read_to_string(path).map_err(|e| ConfigError::Io(path.to_path_buf(), e))?;
        let config = Self::from_toml(&text).map_err(|e| match e {
            ConfigError::Toml(_, source) => ConfigError::Toml(path.to_path_buf(), source),
            other => other,
        })?;
        log::info!("Loaded configuration from {}", path.display());
        Ok(config)
    }

    pub fn from_toml(text: &str) -> Result<Self, ConfigError> {
        let config: Self =
            toml::from_str(text).map_err(|e| ConfigError::Toml(PathBuf::new(), e))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.backtest.horizon == 0 {
            return Err(ConfigError::Invalid("backtest.horizon must be at least 1".into()));
        }
        if self.backtest.seasonal_period == 0 || self.backtest.sarima_period < 2 {
            return Err(ConfigError::Invalid(
                "seasonal_period must be at least 1 and sarima_period at least 2".into(),
            ));
        }
        if !(self.backtest.ridge_alpha >= 0.0 && self.backtest.ridge_alpha.is_finite()) {
            return Err(ConfigError::Invalid(
                "backtest.ridge_alpha must be a finite, non-negative number".into(),
            ));
        }
        if self.source.timeout_secs == 0 {
            return Err(ConfigError::Invalid("source.timeout_secs must be positive".into()));
        }
        Ok(())
    }
}
