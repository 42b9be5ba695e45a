// SPDX-FileCopyrightText: 2026 RPCraft Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error taxonomy for RPCraft store operations.

use thiserror::Error;

/// The primary error type used across both store variants and the sync layer.
#[derive(Debug, Error)]
pub enum RpcraftError {
    /// Input violates a data-model invariant (empty required field,
    /// deleting the last system prompt, checkpointing an empty
    /// conversation). Recoverable; never causes a mode transition.
    #[error("validation error: {0}")]
    Validation(String),

    /// A referenced entity id does not exist.
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    /// A remote call could not complete. The triggering operation's result
    /// is unknown server-side; the sync controller transitions to offline
    /// mode before this is re-raised to the caller.
    #[error("connectivity error: {message}")]
    Connectivity {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Local snapshot I/O or serialization failure.
    #[error("storage error: {source}")]
    Storage {
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Configuration errors (missing remote settings, invalid values).
    #[error("configuration error: {0}")]
    Config(String),

    /// Internal or unexpected errors.
    #[error("internal error: {0}")]
    Internal(String),
}

impl RpcraftError {
    /// Shorthand for a [`RpcraftError::NotFound`].
    pub fn not_found(entity: &'static str, id: impl Into<String>) -> Self {
        Self::NotFound {
            entity,
            id: id.into(),
        }
    }

    /// True when the error is a connectivity failure that should flip the
    /// sync controller offline.
    pub fn is_connectivity(&self) -> bool {
        matches!(self, Self::Connectivity { .. })
    }
}
