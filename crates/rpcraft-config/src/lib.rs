// SPDX-FileCopyrightText: 2026 RPCraft Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration system for RPCraft.
//!
//! Provides TOML configuration parsing with strict validation
//! (`deny_unknown_fields`), XDG file hierarchy lookup, and environment
//! variable overrides.
//!
//! # Usage
//!
//! ```no_run
//! use rpcraft_config::load_and_validate;
//!
//! let config = load_and_validate().expect("config errors");
//! println!("snapshot path: {}", config.storage.snapshot_path);
//! ```

pub mod loader;
pub mod model;
pub mod validation;

pub use loader::{load_config, load_config_from_path, load_config_from_str};
pub use model::RpcraftConfig;
pub use validation::{ConfigError, render_errors};

/// Load configuration from the XDG hierarchy and validate it.
///
/// Returns either a valid [`RpcraftConfig`] or the list of collected errors.
pub fn load_and_validate() -> Result<RpcraftConfig, Vec<ConfigError>> {
    finish(loader::load_config())
}

/// Load configuration from a TOML string and validate it.
///
/// Useful for testing and explicit configuration.
pub fn load_and_validate_str(toml_content: &str) -> Result<RpcraftConfig, Vec<ConfigError>> {
    finish(loader::load_config_from_str(toml_content))
}

/// Load configuration from a specific file path and validate it.
pub fn load_and_validate_path(
    path: &std::path::Path,
) -> Result<RpcraftConfig, Vec<ConfigError>> {
    finish(loader::load_config_from_path(path))
}

fn finish(
    loaded: Result<RpcraftConfig, figment::Error>,
) -> Result<RpcraftConfig, Vec<ConfigError>> {
    match loaded {
        Ok(config) => {
            validation::validate_config(&config)?;
            Ok(config)
        }
        Err(err) => Err(err
            .into_iter()
            .map(|e| ConfigError::Parse {
                message: e.to_string(),
            })
            .collect()),
    }
}
