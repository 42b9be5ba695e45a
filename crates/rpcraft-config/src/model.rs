// SPDX-FileCopyrightText: 2026 RPCraft Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration model structs.
//!
//! All structs use `#[serde(deny_unknown_fields)]` to reject unrecognized
//! config keys at startup.

use serde::{Deserialize, Serialize};

/// Top-level RPCraft configuration.
///
/// Loaded from TOML files following the XDG hierarchy, with environment
/// variable overrides. All sections are optional and default to sensible
/// values; with no remote section configured the application runs offline.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct RpcraftConfig {
    /// Application-wide settings.
    #[serde(default)]
    pub app: AppConfig,

    /// Remote persistence service settings.
    #[serde(default)]
    pub remote: RemoteConfig,

    /// Local offline snapshot settings.
    #[serde(default)]
    pub storage: StorageConfig,
}

/// Application-wide settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct AppConfig {
    /// Logging level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
        }
    }
}

/// Remote persistence service settings.
///
/// When `base_url` is unset the sync controller starts directly in offline
/// mode without probing.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct RemoteConfig {
    /// Base URL of the RPC endpoint, e.g. `https://project.example.co/rest/v1`.
    #[serde(default)]
    pub base_url: Option<String>,

    /// API key sent as the `apikey` header and bearer token.
    #[serde(default)]
    pub api_key: Option<String>,

    /// Per-request timeout in seconds. Bounds every remote call so an
    /// unreachable service cannot suspend an operation indefinitely.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for RemoteConfig {
    fn default() -> Self {
        Self {
            base_url: None,
            api_key: None,
            timeout_secs: default_timeout_secs(),
        }
    }
}

/// Local offline snapshot settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct StorageConfig {
    /// Path of the JSON snapshot document.
    #[serde(default = "default_snapshot_path")]
    pub snapshot_path: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            snapshot_path: default_snapshot_path(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_snapshot_path() -> String {
    dirs::data_dir()
        .map(|d| d.join("rpcraft/state.json"))
        .unwrap_or_else(|| std::path::PathBuf::from("rpcraft-state.json"))
        .to_string_lossy()
        .to_string()
}
