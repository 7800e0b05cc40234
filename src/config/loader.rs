//! Configuration Loader
//!
//! Environment-aware configuration loading: YAML file discovery, environment
//! detection and merging of `environments.<env>` overrides into the base file.

use super::error::{ConfigResult, ConfigurationError};
use super::PublishingConfig;
use serde_yaml::Value as YamlValue;
use std::env;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info};

const CONFIG_FILE_NAMES: [&str; 2] = ["publishing-config.yaml", "publishing-config.yml"];
const ENVIRONMENTS_KEY: &str = "environments";

/// Loaded, validated configuration plus where it came from
#[derive(Debug)]
pub struct ConfigManager {
    config: PublishingConfig,
    environment: String,
    config_directory: PathBuf,
}

impl ConfigManager {
    /// Load configuration with environment auto-detection
    pub fn load() -> ConfigResult<Arc<ConfigManager>> {
        Self::load_from_directory(None)
    }

    /// Load configuration from a specific directory
    pub fn load_from_directory(config_dir: Option<PathBuf>) -> ConfigResult<Arc<ConfigManager>> {
        let environment = Self::detect_environment();
        Self::load_from_directory_with_env(config_dir, &environment)
    }

    /// Load configuration from a specific directory with explicit environment.
    /// Tests use this instead of touching process environment variables.
    pub fn load_from_directory_with_env(
        config_dir: Option<PathBuf>,
        environment: &str,
    ) -> ConfigResult<Arc<ConfigManager>> {
        let config_directory = config_dir.unwrap_or_else(|| PathBuf::from("config"));

        debug!(
            environment = %environment,
            directory = %config_directory.display(),
            "Loading publishing configuration"
        );

        let config = Self::load_and_merge_config(&config_directory, environment)?;
        config.validate()?;

        info!(
            environment = %environment,
            worker_slots = config.scheduler.worker_slots,
            jobs = config.scheduler.jobs.len(),
            page_size = config.history.page_size,
            "Configuration loaded successfully"
        );

        Ok(Arc::new(ConfigManager {
            config,
            environment: environment.to_string(),
            config_directory,
        }))
    }

    /// Wrap an in-memory configuration, validating it like a loaded one
    pub fn from_config(config: PublishingConfig, environment: &str) -> ConfigResult<Arc<ConfigManager>> {
        config.validate()?;
        Ok(Arc::new(ConfigManager {
            config,
            environment: environment.to_string(),
            config_directory: PathBuf::from("config"),
        }))
    }

    pub fn config(&self) -> &PublishingConfig {
        &self.config
    }

    pub fn environment(&self) -> &str {
        &self.environment
    }

    pub fn config_directory(&self) -> &Path {
        &self.config_directory
    }

    /// Detect current environment: PUBLISHING_ENV || APP_ENV || 'development'
    pub fn detect_environment() -> String {
        env::var("PUBLISHING_ENV")
            .or_else(|_| env::var("APP_ENV"))
            .unwrap_or_else(|_| "development".to_string())
            .to_lowercase()
    }

    fn find_config_file(config_directory: &Path) -> ConfigResult<PathBuf> {
        let mut searched_paths = Vec::new();

        for name in CONFIG_FILE_NAMES {
            let config_path = config_directory.join(name);
            if config_path.is_file() {
                debug!("Found configuration file: {}", config_path.display());
                return Ok(config_path);
            }
            searched_paths.push(config_path);
        }

        Err(ConfigurationError::config_file_not_found(searched_paths))
    }

    fn load_and_merge_config(
        config_directory: &Path,
        environment: &str,
    ) -> ConfigResult<PublishingConfig> {
        let config_file = Self::find_config_file(config_directory)?;
        let file_path = config_file.display().to_string();

        let yaml_content = std::fs::read_to_string(&config_file)
            .map_err(|e| ConfigurationError::file_read_error(file_path.clone(), e))?;

        let mut yaml_data: YamlValue = serde_yaml::from_str(&yaml_content)
            .map_err(|e| ConfigurationError::invalid_yaml(file_path.clone(), e))?;

        // Pull the environment table out before deserializing the base
        let environments = match &mut yaml_data {
            YamlValue::Mapping(map) => map.remove(YamlValue::String(ENVIRONMENTS_KEY.to_string())),
            YamlValue::Null => None,
            _ => {
                return Err(ConfigurationError::invalid_yaml(
                    file_path,
                    "top level must be a mapping",
                ))
            }
        };

        if let Some(overrides) = environments
            .as_ref()
            .and_then(|envs| envs.get(environment))
            .cloned()
        {
            debug!("Applying environment-specific overrides for: {}", environment);
            Self::merge_yaml_values(&mut yaml_data, overrides);
        }

        if yaml_data.is_null() {
            return Ok(PublishingConfig::default());
        }

        serde_yaml::from_value(yaml_data).map_err(|e| {
            ConfigurationError::invalid_yaml(
                file_path,
                format!("Failed to deserialize configuration: {e}"),
            )
        })
    }

    /// Recursively merge YAML values (environment overrides into base config)
    fn merge_yaml_values(base: &mut YamlValue, override_value: YamlValue) {
        match (&mut *base, override_value) {
            (YamlValue::Mapping(base_map), YamlValue::Mapping(override_map)) => {
                for (key, value) in override_map {
                    if let Some(existing_value) = base_map.get_mut(&key) {
                        Self::merge_yaml_values(existing_value, value);
                    } else {
                        base_map.insert(key, value);
                    }
                }
            }
            (base_ref, override_val) => {
                // Scalars and sequences are replaced wholesale
                *base_ref = override_val;
            }
        }
    }
}
