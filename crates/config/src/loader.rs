//! Configuration loader implementation

use crate::{schema::Config, validation::ConfigValidator};
use anyhow::{Context, Result};
use figment::{
    providers::{Env, Format, Yaml},
    Figment,
};
use std::path::Path;
use types::ConfigError;

/// Configuration loader that handles YAML files and environment variables
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration from file and environment variables
    pub fn load<P: AsRef<Path>>(config_path: P) -> Result<Config> {
        let config_path = config_path.as_ref();

        // Check if config file exists
        if !config_path.exists() {
            return Err(ConfigError::FileNotFound {
                path: config_path.display().to_string(),
            }
            .into());
        }

        Self::extract(Figment::new().merge(Yaml::file(config_path)))
    }

    /// Load configuration from a YAML string, with the same environment overrides as [`Self::load`]
    pub fn load_from_str(yaml_content: &str) -> Result<Config> {
        Self::extract(Figment::new().merge(Yaml::string(yaml_content)))
    }

    fn extract(base: Figment) -> Result<Config> {
        let config: Config = Self::figment(base)
            .extract()
            .map_err(|e| ConfigError::ParseError(e.to_string()))?;

        Self::validate(&config)?;
        Ok(config)
    }

    /// Layer environment overrides on top of a base provider
    fn figment(base: Figment) -> Figment {
        base
            // Override with environment variables, e.g. BUNDLER_BUNDLE__TIP_LAMPORTS
            .merge(Env::prefixed("BUNDLER_").split("__"))
            // Also support the unprefixed endpoint variables
            .merge(
                Env::raw()
                    .only(&["BLOCK_ENGINE_URL", "RPC_HTTPS_URL"])
                    .map(|key| {
                        if key.as_str().eq_ignore_ascii_case("BLOCK_ENGINE_URL") {
                            "block_engine.url".into()
                        } else {
                            "network.rpc_url".into()
                        }
                    }),
            )
    }

    /// Reject configurations with hard errors
    fn validate(config: &Config) -> Result<()> {
        let report = ConfigValidator::validate(config);
        if let Some(issue) = report.errors.first() {
            return Err(ConfigError::ValidationError {
                field: issue.field.clone(),
                message: issue.message.clone(),
            }
            .into());
        }
        Ok(())
    }

    /// Get default configuration
    pub fn default() -> Config {
        Config::default()
    }

    /// Create example configuration file
    pub fn create_example<P: AsRef<Path>>(path: P) -> Result<()> {
        let config = Self::default();
        let yaml_content = serde_yaml::to_string(&config)
            .context("Failed to serialize default configuration")?;

        std::fs::write(path.as_ref(), yaml_content)
            .context("Failed to write example configuration file")?;

        Ok(())
    }
}
