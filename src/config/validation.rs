//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Endpoint URLs must parse as http(s) URLs
//! - Intervals and timeouts must be non-zero
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: WalletConfig → Result<(), Vec<ValidationError>>

use thiserror::Error;
use url::Url;

use crate::config::schema::{EndpointOverride, WalletConfig};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("{field}: invalid URL '{value}' ({reason})")]
    InvalidUrl {
        field: String,
        value: String,
        reason: String,
    },

    #[error("{0} must be greater than zero")]
    Zero(&'static str),

    #[error("{0} must not be empty")]
    Empty(&'static str),
}

/// Validate a parsed configuration.
pub fn validate_config(config: &WalletConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    let overrides = [
        ("network.testnet", &config.network.testnet),
        ("network.mainnet", &config.network.mainnet),
        ("network.futurenet", &config.network.futurenet),
    ];
    for (section, entry) in overrides {
        if let Some(EndpointOverride { horizon_url, soroban_rpc_url }) = entry {
            if let Some(url) = horizon_url {
                check_url(&mut errors, format!("{section}.horizon_url"), url);
            }
            if let Some(url) = soroban_rpc_url {
                check_url(&mut errors, format!("{section}.soroban_rpc_url"), url);
            }
        }
    }

    check_url(&mut errors, "xumm.api_url".to_string(), &config.xumm.api_url);

    if config.xumm.poll_interval_ms == 0 {
        errors.push(ValidationError::Zero("xumm.poll_interval_ms"));
    }
    if config.xumm.payload_timeout_secs == 0 {
        errors.push(ValidationError::Zero("xumm.payload_timeout_secs"));
    }
    if config.xumm.max_poll_failures == 0 {
        errors.push(ValidationError::Zero("xumm.max_poll_failures"));
    }
    if config.xumm.request_timeout_secs == 0 {
        errors.push(ValidationError::Zero("xumm.request_timeout_secs"));
    }
    if config.submission.timeout_secs == 0 {
        errors.push(ValidationError::Zero("submission.timeout_secs"));
    }
    if config.session.key.trim().is_empty() {
        errors.push(ValidationError::Empty("session.key"));
    }
    if config.session.storage_dir.trim().is_empty() {
        errors.push(ValidationError::Empty("session.storage_dir"));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn check_url(errors: &mut Vec<ValidationError>, field: String, value: &str) {
    match Url::parse(value) {
        Ok(url) if url.scheme() == "http" || url.scheme() == "https" => {}
        Ok(url) => errors.push(ValidationError::InvalidUrl {
            field,
            value: value.to_string(),
            reason: format!("unsupported scheme '{}'", url.scheme()),
        }),
        Err(e) => errors.push(ValidationError::InvalidUrl {
            field,
            value: value.to_string(),
            reason: e.to_string(),
        }),
    }
}
