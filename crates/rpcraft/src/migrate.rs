// SPDX-FileCopyrightText: 2026 RPCraft Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `rpcraft migrate` command implementation.
//!
//! The explicit, user-triggered replay of queued offline writes. There is
//! no background sync; this command is the only way back online after a
//! connectivity drop.

use rpcraft_config::RpcraftConfig;
use rpcraft_core::RpcraftError;

/// Run the `rpcraft migrate` command.
pub async fn run_migrate(config: &RpcraftConfig) -> Result<(), RpcraftError> {
    let manager = crate::build_manager(config)?;
    manager.initialize().await?;

    let report = manager.migrate().await?;
    println!("replayed:  {}", report.replayed);
    println!("skipped:   {}", report.skipped);
    println!("remaining: {}", report.remaining);
    println!("mode:      {}", report.mode);
    if report.remaining > 0 {
        eprintln!("rpcraft: remote unreachable, run `rpcraft migrate` again later");
    }
    Ok(())
}
