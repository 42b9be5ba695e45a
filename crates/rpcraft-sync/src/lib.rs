// SPDX-FileCopyrightText: 2026 RPCraft Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Sync layer for RPCraft.
//!
//! Ties the two persistence adapter variants together: the
//! [`SyncController`] decides which one is authoritative, the
//! [`MessageCache`] keeps hot message lists in process, and the
//! [`ConversationManager`] facade exposes the message, checkpoint,
//! conversation, and system-prompt operations on top of both.

pub mod cache;
pub mod controller;
pub mod manager;
pub mod mode;

pub use cache::MessageCache;
pub use controller::{MigrationReport, SyncController, SyncNotice};
pub use manager::ConversationManager;
pub use mode::SyncMode;
