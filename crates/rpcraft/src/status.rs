// SPDX-FileCopyrightText: 2026 RPCraft Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `rpcraft status` command implementation.
//!
//! Probes the remote service once, reports which store variant is
//! authoritative, and shows how many offline writes are queued.

use rpcraft_config::RpcraftConfig;
use rpcraft_core::RpcraftError;
use rpcraft_core::types::HealthStatus;

/// Run the `rpcraft status` command.
pub async fn run_status(config: &RpcraftConfig) -> Result<(), RpcraftError> {
    let manager = crate::build_manager(config)?;
    let notice = manager.initialize().await?;

    println!("mode:           {}", notice.mode);
    if let Some(detail) = &notice.detail {
        println!("detail:         {detail}");
    }
    println!("pending writes: {}", notice.pending_writes);
    match manager.probe().await? {
        HealthStatus::Healthy => println!("remote:         healthy"),
        HealthStatus::Degraded(reason) => println!("remote:         degraded ({reason})"),
        HealthStatus::Unhealthy(reason) => println!("remote:         unreachable ({reason})"),
    }
    Ok(())
}
