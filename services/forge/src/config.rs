//! services/forge/src/config.rs
//!
//! Defines the runtime configuration structure and loading logic.
//!
//! All configuration is loaded from environment variables at startup. The `.env`
//! file is used for local development.

use cardforge_core::ProviderChoice;
use std::path::PathBuf;
use std::time::Duration;
use tracing::Level;

/// A custom error type for configuration loading failures.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing the environment variable {0}")]
    MissingVar(String),
    #[error("Invalid value for the environment variable {0}: {1}")]
    InvalidValue(String, String),
}

/// Connection settings for one image vendor. Only present when its key is set.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ProviderSettings {
    pub endpoint: String,
    pub api_key: String,
    pub model: Option<String>,
}

/// Holds all configuration loaded from the environment at startup.
#[derive(Clone, Debug)]
pub struct Config {
    pub log_level: Level,
    pub default_provider: ProviderChoice,
    pub generation_timeout: Duration,
    pub card_art_dir: PathBuf,
    pub instance_provider: Option<ProviderSettings>,
    pub flat_provider: Option<ProviderSettings>,
    /// Fixed seed for reproducible spin sessions; entropy when absent.
    pub spin_seed: Option<u64>,
}

impl Config {
    /// Loads configuration from environment variables.
    ///
    /// It will look for a `.env` file in the current directory for development,
    /// but this is skipped in test environments to ensure tests are hermetic.
    pub fn from_env() -> Result<Self, ConfigError> {
        if !cfg!(test) {
            dotenvy::dotenv().ok();
        }
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the configuration from any key/value source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var_or = |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.to_string());

        // --- Logging ---
        let log_level_str = var_or("RUST_LOG", "INFO");
        let log_level = log_level_str.parse::<Level>().map_err(|_| {
            ConfigError::InvalidValue(
                "RUST_LOG".to_string(),
                format!("'{}' is not a valid log level", log_level_str),
            )
        })?;

        // --- Generation Settings ---
        let default_provider = var_or("DEFAULT_PROVIDER", "flat")
            .parse::<ProviderChoice>()
            .map_err(|e| ConfigError::InvalidValue("DEFAULT_PROVIDER".to_string(), e))?;

        let timeout_str = var_or("GENERATION_TIMEOUT_SECS", "60");
        let generation_timeout = timeout_str
            .parse::<u64>()
            .ok()
            .filter(|secs| *secs > 0)
            .map(Duration::from_secs)
            .ok_or_else(|| {
                ConfigError::InvalidValue(
                    "GENERATION_TIMEOUT_SECS".to_string(),
                    format!("'{}' is not a positive number of seconds", timeout_str),
                )
            })?;

        let card_art_dir = PathBuf::from(var_or("CARD_ART_DIR", "./card_art"));

        // --- Vendors (registered only when a key is present) ---
        let instance_provider = lookup("INSTANCE_PROVIDER_API_KEY").map(|api_key| ProviderSettings {
            endpoint: var_or(
                "INSTANCE_PROVIDER_ENDPOINT",
                "https://generativelanguage.googleapis.com/v1beta/models/imagen-3.0-generate-002:predict",
            ),
            api_key,
            model: None,
        });
        let flat_provider = lookup("FLAT_PROVIDER_API_KEY").map(|api_key| ProviderSettings {
            endpoint: var_or(
                "FLAT_PROVIDER_ENDPOINT",
                "https://api.openai.com/v1/images/generations",
            ),
            api_key,
            model: Some(var_or("FLAT_PROVIDER_MODEL", "dall-e-3")),
        });

        let spin_seed = match lookup("SPIN_SEED") {
            Some(raw) => Some(raw.parse::<u64>().map_err(|e| {
                ConfigError::InvalidValue("SPIN_SEED".to_string(), e.to_string())
            })?),
            None => None,
        };

        Ok(Self {
            log_level,
            default_provider,
            generation_timeout,
            card_art_dir,
            instance_provider,
            flat_provider,
            spin_seed,
        })
    }

    /// Settings for the default provider, or an error naming the missing key.
    pub fn default_provider_settings(&self) -> Result<&ProviderSettings, ConfigError> {
        let (settings, key) = match self.default_provider {
            ProviderChoice::InstanceBased => (&self.instance_provider, "INSTANCE_PROVIDER_API_KEY"),
            ProviderChoice::FlatPrompt => (&self.flat_provider, "FLAT_PROVIDER_API_KEY"),
        };
        settings
            .as_ref()
            .ok_or_else(|| ConfigError::MissingVar(key.to_string()))
    }
}
