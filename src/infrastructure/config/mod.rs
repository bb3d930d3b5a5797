use std::path::{Path, PathBuf};

use figment::providers::{Env, Format, Serialized, Toml};
use figment::Figment;
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::domain::compare_settings::CompareSettings;
use crate::domain::error::{AppError, Result};

pub const CONFIG_FILE_NAME: &str = "device-compare.toml";
pub const ENV_PREFIX: &str = "DEVICE_COMPARE_";
pub const DEFAULT_LOG_FILE: &str = "compare_and_export.log";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct AppConfig {
    /// Activity log shown to the user
    pub log_file: PathBuf,

    /// `tracing` filter directives for diagnostics on stderr
    #[validate(length(min = 1))]
    pub log_filter: String,

    /// Report "no matching devices" with a failing exit status
    pub no_match_is_error: bool,

    #[validate(nested)]
    pub compare: CompareSettings,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            log_file: PathBuf::from(DEFAULT_LOG_FILE),
            log_filter: "info".to_string(),
            no_match_is_error: false,
            compare: CompareSettings::default(),
        }
    }
}

/// Layered configuration: defaults, then the TOML file, then `DEVICE_COMPARE_*` env vars
pub struct ConfigService {
    figment: Figment,
}

impl ConfigService {
    /// Configuration from `device-compare.toml` in the working directory
    pub fn new() -> Self {
        Self::from_file(CONFIG_FILE_NAME)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Self {
        let figment = Figment::from(Serialized::defaults(AppConfig::default()))
            .merge(Toml::file(path.as_ref()))
            .merge(Env::prefixed(ENV_PREFIX).split("__"));
        Self { figment }
    }

    pub fn load(&self) -> Result<AppConfig> {
        let config: AppConfig = self
            .figment
            .extract()
            .map_err(|e| AppError::ConfigError(e.to_string()))?;

        config
            .validate()
            .map_err(|e| AppError::ValidationError(format!("Invalid configuration: {}", e)))?;

        Ok(config)
    }
}

impl Default for ConfigService {
    fn default() -> Self {
        Self::new()
    }
}
