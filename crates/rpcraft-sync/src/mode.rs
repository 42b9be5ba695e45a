// SPDX-FileCopyrightText: 2026 RPCraft Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Sync mode of the application.

use strum::Display;

/// Which store variant is currently authoritative.
///
/// Exactly one variant is authoritative at a time; transitions are explicit
/// and performed only by the sync controller. There is no automatic
/// background reconnection: leaving `Offline` requires a user-triggered
/// migration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[strum(serialize_all = "lowercase")]
pub enum SyncMode {
    /// No probe has run yet. Writes are routed to the local store and
    /// journaled, the same as `Offline`.
    Uninitialized,
    /// The remote store is authoritative.
    Online,
    /// The local snapshot is authoritative; writes are journaled for a
    /// later migration.
    Offline,
}
