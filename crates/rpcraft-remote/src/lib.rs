// SPDX-FileCopyrightText: 2026 RPCraft Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Remote persistence for RPCraft.
//!
//! Implements the [`rpcraft_core::ConversationStore`] trait over a set of
//! named remote procedures exposed by the persistence service. Transport
//! failures surface as `Connectivity` errors for the sync controller to
//! act on; this crate itself never retries or falls back.

pub mod client;

pub use client::RemoteStore;
