// SPDX-FileCopyrightText: 2026 RPCraft Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core library for the RPCraft conversation state manager.
//!
//! Provides the record types, error taxonomy, offline write journal, and
//! the [`ConversationStore`] trait implemented by both persistence
//! variants (remote RPC and local offline snapshot).

pub mod error;
pub mod journal;
pub mod store;
pub mod types;

// Re-export key items at crate root for ergonomic imports.
pub use error::RpcraftError;
pub use journal::WriteOp;
pub use store::ConversationStore;
pub use types::{
    Checkpoint, Conversation, HealthStatus, Message, Role, SystemPrompt, new_id, now_iso,
};
