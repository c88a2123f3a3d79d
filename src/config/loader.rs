//! Configuration loading from disk and environment.

use std::fs;
use std::path::Path;
use thiserror::Error;

use crate::config::schema::WalletConfig;
use crate::config::validation::{validate_config, ValidationError};

/// Environment variable overriding `xumm.api_key`.
pub const XUMM_API_KEY_ENV_VAR: &str = "WALLET_LINK_XUMM_API_KEY";

/// Environment variable overriding `xumm.api_secret`.
pub const XUMM_API_SECRET_ENV_VAR: &str = "WALLET_LINK_XUMM_API_SECRET";

/// Error type for configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation failed: {}", join(.0))]
    Validation(Vec<ValidationError>),
}

fn join(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Load and validate configuration from a TOML file.
pub fn load_config(path: &Path) -> Result<WalletConfig, ConfigError> {
    let content = fs::read_to_string(path)?;
    parse_config(&content)
}

/// Parse, apply environment overrides, and validate.
pub fn parse_config(content: &str) -> Result<WalletConfig, ConfigError> {
    let mut config: WalletConfig = toml::from_str(content)?;
    apply_env(&mut config);
    validate_config(&config).map_err(ConfigError::Validation)?;
    Ok(config)
}

/// Load from `path` when given, otherwise start from defaults.
pub fn load_or_default(path: Option<&Path>) -> Result<WalletConfig, ConfigError> {
    match path {
        Some(path) => load_config(path),
        None => parse_config(""),
    }
}

fn apply_env(config: &mut WalletConfig) {
    if let Ok(key) = std::env::var(XUMM_API_KEY_ENV_VAR) {
        config.xumm.api_key = key;
    }
    if let Ok(secret) = std::env::var(XUMM_API_SECRET_ENV_VAR) {
        config.xumm.api_secret = secret;
    }
}
