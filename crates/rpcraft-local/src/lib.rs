// SPDX-FileCopyrightText: 2026 RPCraft Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Offline persistence for RPCraft.
//!
//! Implements the [`rpcraft_core::ConversationStore`] trait over an
//! in-process snapshot that is flushed to disk as a single JSON document of
//! `rpcraft.`-namespaced key-value entries. Also persists the offline write
//! journal and the active conversation/prompt pointers.

pub mod schema;
pub mod store;

pub use schema::{SCHEMA_VERSION, Snapshot, StoredConversation, default_prompt};
pub use store::LocalStore;
