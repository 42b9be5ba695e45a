// SPDX-FileCopyrightText: 2026 RPCraft Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Post-deserialization validation for configuration values.
//!
//! Validates semantic constraints that cannot be expressed via serde
//! attributes, such as URL shape and non-zero timeouts.

use thiserror::Error;

use crate::model::RpcraftConfig;

/// A configuration error surfaced to the user at startup.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The config sources could not be parsed.
    #[error("config parse error: {message}")]
    Parse { message: String },

    /// A parsed value violates a semantic constraint.
    #[error("config validation error: {message}")]
    Validation { message: String },
}

const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

/// Validate a deserialized configuration for semantic correctness.
///
/// Returns `Ok(())` if all validations pass, or `Err(Vec<ConfigError>)` with
/// all collected validation errors (does not fail fast).
pub fn validate_config(config: &RpcraftConfig) -> Result<(), Vec<ConfigError>> {
    let mut errors = Vec::new();

    if !LOG_LEVELS.contains(&config.app.log_level.as_str()) {
        errors.push(ConfigError::Validation {
            message: format!(
                "app.log_level `{}` is not one of trace, debug, info, warn, error",
                config.app.log_level
            ),
        });
    }

    if let Some(url) = &config.remote.base_url {
        if !url.starts_with("http://") && !url.starts_with("https://") {
            errors.push(ConfigError::Validation {
                message: format!("remote.base_url `{url}` must start with http:// or https://"),
            });
        }
        if config.remote.api_key.as_deref().is_none_or(str::is_empty) {
            errors.push(ConfigError::Validation {
                message: "remote.api_key is required when remote.base_url is set".to_string(),
            });
        }
    }

    if config.remote.timeout_secs == 0 {
        errors.push(ConfigError::Validation {
            message: "remote.timeout_secs must be at least 1".to_string(),
        });
    }

    if config.storage.snapshot_path.trim().is_empty() {
        errors.push(ConfigError::Validation {
            message: "storage.snapshot_path must not be empty".to_string(),
        });
    }

    if errors.is_empty() { Ok(()) } else { Err(errors) }
}

/// Render collected configuration errors to stderr.
pub fn render_errors(errors: &[ConfigError]) {
    for error in errors {
        eprintln!("rpcraft: {error}");
    }
}
