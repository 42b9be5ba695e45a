// SPDX-FileCopyrightText: 2026 RPCraft Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration loader using Figment for layered config merging.
//!
//! Supports XDG hierarchy: `./rpcraft.toml` > `~/.config/rpcraft/rpcraft.toml`
//! > `/etc/rpcraft/rpcraft.toml` with environment variable overrides via the
//! `RPCRAFT_` prefix.

#![allow(clippy::result_large_err)] // figment::Error is external and cannot be boxed without wrapper

use std::path::Path;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};

use crate::model::RpcraftConfig;

/// Load configuration from the standard XDG hierarchy with env var overrides.
///
/// Merge order (later overrides earlier):
/// 1. Compiled defaults
/// 2. `/etc/rpcraft/rpcraft.toml` (system-wide)
/// 3. `~/.config/rpcraft/rpcraft.toml` (user XDG config)
/// 4. `./rpcraft.toml` (local directory)
/// 5. `RPCRAFT_*` environment variables
pub fn load_config() -> Result<RpcraftConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(RpcraftConfig::default()))
        .merge(Toml::file("/etc/rpcraft/rpcraft.toml"))
        .merge(Toml::file(
            dirs::config_dir()
                .map(|d| d.join("rpcraft/rpcraft.toml"))
                .unwrap_or_default(),
        ))
        .merge(Toml::file("rpcraft.toml"))
        .merge(env_provider())
        .extract()
}

/// Load configuration from a TOML string only (no XDG lookup).
///
/// Used for testing and explicit config specification.
pub fn load_config_from_str(toml_content: &str) -> Result<RpcraftConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(RpcraftConfig::default()))
        .merge(Toml::string(toml_content))
        .extract()
}

/// Load configuration from a specific file path with env var overrides.
pub fn load_config_from_path(path: &Path) -> Result<RpcraftConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(RpcraftConfig::default()))
        .merge(Toml::file(path))
        .merge(env_provider())
        .extract()
}

/// Create the environment variable provider using explicit `map()` for
/// section-to-dot mapping.
///
/// Uses `Env::map()` NOT `Env::split("_")` to avoid ambiguity with
/// underscore-containing key names: `RPCRAFT_REMOTE_BASE_URL` must map to
/// `remote.base_url`, not `remote.base.url`. Keys arrive in the variable's
/// original (upper) case and must be lowercased before the section match.
/// `RPCRAFT_LOG` belongs to the tracing filter, not the config tree, and is
/// excluded so it never trips the unknown-field check.
fn env_provider() -> Env {
    Env::prefixed("RPCRAFT_").ignore(&["log"]).map(|key| {
        let lowered = key.as_str().to_ascii_lowercase();
        lowered
            .replacen("app_", "app.", 1)
            .replacen("remote_", "remote.", 1)
            .replacen("storage_", "storage.", 1)
            .into()
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn env_vars_override_toml_values() {
        figment::Jail::expect_with(|jail| {
            jail.create_file(
                "rpcraft.toml",
                r#"
                [remote]
                base_url = "https://from-toml.example"
                timeout_secs = 10
                "#,
            )?;
            jail.set_env("RPCRAFT_REMOTE_BASE_URL", "https://from-env.example");

            let config = load_config_from_path(Path::new("rpcraft.toml"))?;
            assert_eq!(
                config.remote.base_url.as_deref(),
                Some("https://from-env.example")
            );
            // Untouched keys keep the TOML value.
            assert_eq!(config.remote.timeout_secs, 10);
            Ok(())
        });
    }

    #[test]
    fn underscored_keys_map_to_the_right_section() {
        figment::Jail::expect_with(|jail| {
            jail.set_env("RPCRAFT_STORAGE_SNAPSHOT_PATH", "/tmp/kv.json");
            jail.set_env("RPCRAFT_APP_LOG_LEVEL", "debug");

            let config = load_config_from_path(Path::new("missing.toml"))?;
            assert_eq!(config.storage.snapshot_path, "/tmp/kv.json");
            assert_eq!(config.app.log_level, "debug");
            Ok(())
        });
    }

    #[test]
    fn log_filter_variable_does_not_reach_the_config_tree() {
        figment::Jail::expect_with(|jail| {
            jail.set_env("RPCRAFT_LOG", "rpcraft=trace");

            // `log` is no config field; the variable must be ignored, not
            // rejected as an unknown key.
            let config = load_config_from_path(Path::new("missing.toml"))?;
            assert_eq!(config.app.log_level, "info");
            Ok(())
        });
    }
}
