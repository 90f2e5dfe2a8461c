//! # Lab Configuration
//!
//! Settings shared by every lab session, loaded in three tiers:
//!
//! 1. TOML file (`matrixlab.toml`, or the path in `MATRIXLAB_CONFIG_PATH`)
//! 2. Environment variable overrides
//! 3. Validation
//!
//! A missing file is not an error unless a path was requested explicitly;
//! the built-in defaults apply instead.
//!
//! ```toml
//! [validation]
//! tolerance = 0.01
//!
//! [workflow]
//! start_active = true
//!
//! [logging]
//! level = "info"
//! ```

use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::validation::DEFAULT_TOLERANCE;

/// Default config file name, looked up in the working directory.
pub const CONFIG_FILE_NAME: &str = "matrixlab.toml";

const LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error", "off"];

pub type ConfigResult<T> = Result<T, ConfigError>;

/// Errors raised while loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Config file not found: {0}")]
    FileNotFound(String),

    #[error("Failed to read config file: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Invalid TOML syntax: {0}")]
    ParseError(String),

    #[error("Invalid configuration value for {field}: {reason}")]
    InvalidValue { field: String, reason: String },
}

impl From<toml::de::Error> for ConfigError {
    fn from(err: toml::de::Error) -> Self {
        ConfigError::ParseError(err.to_string())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ValidationConfig {
    /// Strict bound on `|answer - expected|`.
    pub tolerance: f64,
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            tolerance: DEFAULT_TOLERANCE,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkflowConfig {
    /// Whether new sessions start with their workflow active.
    pub start_active: bool,
}

impl Default for WorkflowConfig {
    fn default() -> Self {
        Self { start_active: true }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

/// Complete lab configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LabConfig {
    pub validation: ValidationConfig,
    pub workflow: WorkflowConfig,
    pub logging: LoggingConfig,
}

impl LabConfig {
    /// Parse a TOML document, then validate it. No environment overrides.
    pub fn from_toml_str(content: &str) -> ConfigResult<Self> {
        let config: LabConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> ConfigResult<()> {
        let tolerance = self.validation.tolerance;
        if !(tolerance.is_finite() && tolerance > 0.0) {
            return Err(ConfigError::InvalidValue {
                field: "validation.tolerance".to_string(),
                reason: format!("{} is not a positive number", tolerance),
            });
        }
        if !LOG_LEVELS.contains(&self.logging.level.to_ascii_lowercase().as_str()) {
            return Err(ConfigError::InvalidValue {
                field: "logging.level".to_string(),
                reason: format!("unknown level {:?}", self.logging.level),
            });
        }
        Ok(())
    }
}

/// Locate the config file.
///
/// Search order:
/// 1. `MATRIXLAB_CONFIG_PATH` (must exist if set)
/// 2. `./matrixlab.toml`
///
/// Returns `Ok(None)` when neither is present.
pub fn find_config_file() -> ConfigResult<Option<PathBuf>> {
    if let Ok(env_path) = env::var("MATRIXLAB_CONFIG_PATH") {
        let path = PathBuf::from(env_path);
        if path.exists() {
            return Ok(Some(path));
        }
        return Err(ConfigError::FileNotFound(format!(
            "{} (from MATRIXLAB_CONFIG_PATH)",
            path.display()
        )));
    }

    let local = env::current_dir()?.join(CONFIG_FILE_NAME);
    Ok(local.exists().then_some(local))
}

/// Load configuration with environment overrides applied.
///
/// # Errors
///
/// Fails if an explicit `config_path` does not exist, the file is not valid
/// TOML, or the final values do not validate.
pub fn load_config(config_path: Option<&Path>) -> ConfigResult<LabConfig> {
    let config_file = match config_path {
        Some(path) if !path.exists() => {
            return Err(ConfigError::FileNotFound(path.display().to_string()))
        }
        Some(path) => Some(path.to_path_buf()),
        None => find_config_file()?,
    };

    let mut config = match config_file {
        Some(path) => toml::from_str(&fs::read_to_string(path)?)?,
        None => LabConfig::default(),
    };

    apply_environment_overrides(&mut config)?;
    config.validate()?;
    Ok(config)
}

/// Apply environment variable overrides.
///
/// - `MATRIXLAB_TOLERANCE` -> `validation.tolerance`
/// - `MATRIXLAB_START_ACTIVE` -> `workflow.start_active`
/// - `MATRIXLAB_LOG_LEVEL` -> `logging.level`
pub fn apply_environment_overrides(config: &mut LabConfig) -> ConfigResult<()> {
    if let Ok(value) = env::var("MATRIXLAB_TOLERANCE") {
        config.validation.tolerance =
            value.trim().parse().map_err(|_| ConfigError::InvalidValue {
                field: "MATRIXLAB_TOLERANCE".to_string(),
                reason: format!("{:?} is not a number", value),
            })?;
    }
    if let Ok(value) = env::var("MATRIXLAB_START_ACTIVE") {
        config.workflow.start_active =
            value.trim().parse().map_err(|_| ConfigError::InvalidValue {
                field: "MATRIXLAB_START_ACTIVE".to_string(),
                reason: format!("{:?} is not true or false", value),
            })?;
    }
    if let Ok(value) = env::var("MATRIXLAB_LOG_LEVEL") {
        config.logging.level = value;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = LabConfig::default();
        assert_eq!(config.validation.tolerance, 0.01);
        assert!(config.workflow.start_active);
        assert_eq!(config.logging.level, "info");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_toml() {
        let config = LabConfig::from_toml_str("[validation]\ntolerance = 0.5\n").unwrap();
        assert_eq!(config.validation.tolerance, 0.5);
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_invalid_tolerance() {
        let err = LabConfig::from_toml_str("[validation]\ntolerance = -1.0\n").unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { .. }));
    }

    #[test]
    fn test_invalid_level() {
        let err = LabConfig::from_toml_str("[logging]\nlevel = \"loud\"\n").unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { .. }));
    }

    #[test]
    fn test_bad_toml() {
        let err = LabConfig::from_toml_str("[validation\n").unwrap_err();
        assert!(matches!(err, ConfigError::ParseError(_)));
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[workflow]\nstart_active = false").unwrap();
        let config = load_config(Some(file.path())).unwrap();
        assert!(!config.workflow.start_active);
    }

    #[test]
    fn test_missing_explicit_file() {
        let err = load_config(Some(Path::new("/definitely/not/here.toml"))).unwrap_err();
        assert!(matches!(err, ConfigError::FileNotFound(_)));
    }
}
