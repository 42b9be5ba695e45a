// SPDX-FileCopyrightText: 2026 RPCraft Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test utilities for RPCraft.
//!
//! Provides [`MockRemote`], an in-memory stand-in for the remote
//! persistence service with connectivity-failure injection, used by the
//! sync layer's integration tests.

pub mod mock_remote;

pub use mock_remote::MockRemote;
