// SPDX-FileCopyrightText: 2026 RPCraft Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `rpcraft list` command implementation.
//!
//! Lists the conversations owned by the active system prompt, newest
//! first. Archived conversations are hidden unless `--archived` is passed.

use rpcraft_config::RpcraftConfig;
use rpcraft_core::RpcraftError;

/// Run the `rpcraft list` command.
pub async fn run_list(config: &RpcraftConfig, archived: bool) -> Result<(), RpcraftError> {
    let manager = crate::build_manager(config)?;
    manager.initialize().await?;

    let prompt = manager.ensure_active_prompt().await?;
    let conversations = manager.conversations(&prompt.id, archived).await?;

    println!("prompt: {} ({})", prompt.name, prompt.id);
    if conversations.is_empty() {
        println!("no conversations");
        return Ok(());
    }
    let active = manager.active_conversation_id()?;
    for conversation in conversations {
        let marker = match (
            active.as_deref() == Some(conversation.id.as_str()),
            conversation.is_archived,
        ) {
            (true, _) => " *",
            (false, true) => " [archived]",
            (false, false) => "",
        };
        println!(
            "{}  {}  {}{}",
            conversation.id, conversation.updated_at, conversation.name, marker
        );
    }
    Ok(())
}
