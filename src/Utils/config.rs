//! Server configuration read once at startup from a TOML file.
//!
//! Every field has a default, so an empty file (or no file at all) is a valid configuration.
//! The file is named by the first command line argument or, failing that, by the
//! `RUSTED_INTEGRALS_CONFIG` environment variable.
//!
//! ```toml
//! [server]
//! host = "127.0.0.1"
//! port = 5000
//! request_timeout_ms = 2000
//!
//! [sampling]
//! samples = 200
//! max_abs_value = 1e6
//!
//! [limits]
//! max_input_len = 500
//!
//! [logging]
//! level = "info"
//! log_to_file = false
//! ```
use std::fs;
use std::path::Path;

use log::LevelFilter;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// environment variable naming the configuration file
pub const CONFIG_ENV_VAR: &str = "RUSTED_INTEGRALS_CONFIG";

/// upper bound for every sample count
pub const SAMPLES_HARD_CAP: usize = 5000;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read configuration file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid TOML: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// wall-clock limit of one calculation
    pub request_timeout_ms: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        ServerConfig {
            host: "127.0.0.1".to_string(),
            port: 5000,
            request_timeout_ms: 2000,
        }
    }
}

/// Plot windows, sample counts and the singularity scan.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SamplingConfig {
    /// plot window when no bounds are given
    pub window_min: f64,
    pub window_max: f64,
    pub samples: usize,
    /// samples of the shaded area between the bounds
    pub area_samples: usize,
    /// the window around the bounds is widened by max((hi - lo)*margin_ratio, min_margin)
    pub margin_ratio: f64,
    pub min_margin: f64,
    /// points with a larger |y| are dropped from the plot
    pub max_abs_value: f64,
    /// odd, so that the midpoint of the bounds is probed
    pub singularity_probes: usize,
}

impl Default for SamplingConfig {
    fn default() -> Self {
        SamplingConfig {
            window_min: -10.0,
            window_max: 10.0,
            samples: 200,
            area_samples: 100,
            margin_ratio: 0.5,
            min_margin: 1.0,
            max_abs_value: 1e6,
            singularity_probes: 1001,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LimitsConfig {
    pub max_input_len: usize,
    pub max_depth: usize,
    pub max_integration_depth: usize,
    pub max_samples: usize,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        LimitsConfig {
            max_input_len: 500,
            max_depth: 64,
            max_integration_depth: 24,
            max_samples: SAMPLES_HARD_CAP,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// debug, info, warn or error
    pub level: String,
    /// also write the log to log_<date>_<time>.txt
    pub log_to_file: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        LoggingConfig {
            level: "info".to_string(),
            log_to_file: false,
        }
    }
}

impl LoggingConfig {
    pub fn level_filter(&self) -> Result<LevelFilter, ConfigError> {
        match self.level.trim().to_lowercase().as_str() {
            "debug" => Ok(LevelFilter::Debug),
            "info" => Ok(LevelFilter::Info),
            "warn" => Ok(LevelFilter::Warn),
            "error" => Ok(LevelFilter::Error),
            other => Err(ConfigError::Invalid(format!(
                "log level must be debug, info, warn or error, found '{}'",
                other
            ))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub sampling: SamplingConfig,
    pub limits: LimitsConfig,
    pub logging: LoggingConfig,
}

impl AppConfig {
    /// Parses and validates a TOML document.
    pub fn from_toml_str(content: &str) -> Result<AppConfig, ConfigError> {
        let config: AppConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<AppConfig, ConfigError> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        AppConfig::from_toml_str(&content)
    }

    /// Configuration named by the command line argument, else by `RUSTED_INTEGRALS_CONFIG`,
    /// else the defaults.
    pub fn load(cli_path: Option<&str>) -> Result<AppConfig, ConfigError> {
        let env_path = std::env::var(CONFIG_ENV_VAR).ok();
        match cli_path.map(str::to_string).or(env_path) {
            Some(path) if !path.trim().is_empty() => AppConfig::from_file(Path::new(path.trim())),
            _ => Ok(AppConfig::default()),
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let invalid = |msg: String| Err(ConfigError::Invalid(msg));
        let s = &self.sampling;
        let l = &self.limits;
        if !(s.window_min.is_finite() && s.window_max.is_finite() && s.window_min < s.window_max) {
            return invalid(format!(
                "sampling window [{}, {}] is empty or not finite",
                s.window_min, s.window_max
            ));
        }
        if l.max_samples < 2 || l.max_samples > SAMPLES_HARD_CAP {
            return invalid(format!(
                "max_samples must lie in [2, {}], found {}",
                SAMPLES_HARD_CAP, l.max_samples
            ));
        }
        for (name, count) in [("samples", s.samples), ("area_samples", s.area_samples)] {
            if count < 2 || count > l.max_samples {
                return invalid(format!(
                    "{} must lie in [2, {}], found {}",
                    name, l.max_samples, count
                ));
            }
        }
        if s.singularity_probes < 3 || s.singularity_probes % 2 == 0 {
            return invalid(format!(
                "singularity_probes must be odd and at least 3, found {}",
                s.singularity_probes
            ));
        }
        if !(s.margin_ratio >= 0.0 && s.min_margin >= 0.0) {
            return invalid("margins must be non-negative".to_string());
        }
        if !(s.max_abs_value > 0.0) {
            return invalid(format!("max_abs_value must be positive, found {}", s.max_abs_value));
        }
        if l.max_input_len == 0 || l.max_depth == 0 {
            return invalid("input limits must be positive".to_string());
        }
        if self.server.request_timeout_ms == 0 {
            return invalid("request_timeout_ms must be positive".to_string());
        }
        self.logging.level_filter()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_defaults_are_valid() {
        let config = AppConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.server.port, 5000);
        assert_eq!(config.sampling.samples, 200);
        assert_eq!(config.limits.max_integration_depth, 24);
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let config = AppConfig::from_toml_str(
            r#"
            [server]
            port = 8080

            [sampling]
            samples = 500
            "#,
        )
        .unwrap();
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.sampling.samples, 500);
        assert_eq!(config.sampling.area_samples, 100);
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_empty_document() {
        assert_eq!(AppConfig::from_toml_str("").unwrap(), AppConfig::default());
    }

    #[test]
    fn test_invalid_values() {
        let err = AppConfig::from_toml_str("[sampling]\nsamples = 6000").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
        let err = AppConfig::from_toml_str("[sampling]\nwindow_min = 5.0\nwindow_max = -5.0")
            .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
        let err = AppConfig::from_toml_str("[sampling]\nsingularity_probes = 1000").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
        let err = AppConfig::from_toml_str("[logging]\nlevel = \"loud\"").unwrap_err();
        assert!(err.to_string().contains("loud"));
    }

    #[test]
    fn test_invalid_toml() {
        let err = AppConfig::from_toml_str("[server\nport = 1").unwrap_err();
        assert!(matches!(err, ConfigError::Toml(_)));
        let err = AppConfig::from_toml_str("[server]\nport = \"high\"").unwrap_err();
        assert!(matches!(err, ConfigError::Toml(_)));
    }

    #[test]
    fn test_from_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "[limits]\nmax_input_len = 100\n[logging]\nlevel = \"debug\"").unwrap();
        let config = AppConfig::load(Some(file.path().to_str().unwrap())).unwrap();
        assert_eq!(config.limits.max_input_len, 100);
        assert_eq!(config.logging.level_filter().unwrap(), LevelFilter::Debug);
    }

    #[test]
    fn test_missing_file() {
        let err = AppConfig::from_file(Path::new("/nonexistent/config.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }
}
