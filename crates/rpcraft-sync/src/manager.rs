// SPDX-FileCopyrightText: 2026 RPCraft Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The conversation manager facade.
//!
//! Owns the sync controller, the message cache, and the persisted active
//! pointers. Every operation validates its input, generates record ids and
//! timestamps, routes the write through the adapter the controller says is
//! authoritative, journals it when offline, and updates the cache only
//! after the store call succeeded.

use std::sync::Arc;

use tracing::debug;

use rpcraft_core::types::{
    Checkpoint, Conversation, HealthStatus, Message, Role, SystemPrompt, new_id, now_iso,
};
use rpcraft_core::{ConversationStore, RpcraftError, WriteOp};
use rpcraft_local::LocalStore;

use crate::cache::MessageCache;
use crate::controller::{MigrationReport, SyncController, SyncNotice};
use crate::mode::SyncMode;

const DEFAULT_PROMPT_NAME: &str = "Default";
const DEFAULT_PROMPT_CONTENT: &str = "You are a helpful assistant.";

/// Facade over both store variants.
///
/// The local store doubles as the journal and active-pointer persistence
/// even while the remote is authoritative.
pub struct ConversationManager {
    controller: SyncController,
    local: Arc<LocalStore>,
    cache: MessageCache,
}

fn require_name(name: &str, what: &str) -> Result<String, RpcraftError> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(RpcraftError::Validation(format!(
            "{what} name must not be empty"
        )));
    }
    Ok(trimmed.to_string())
}

impl ConversationManager {
    pub fn new(remote: Option<Arc<dyn ConversationStore>>, local: Arc<LocalStore>) -> Self {
        Self {
            controller: SyncController::new(remote, Arc::clone(&local)),
            local,
            cache: MessageCache::new(),
        }
    }

    // --- Sync surface ---

    /// Runs the startup probe. See [`SyncController::initialize`].
    pub async fn initialize(&self) -> Result<SyncNotice, RpcraftError> {
        let notice = self.controller.initialize().await?;
        self.cache.clear();
        Ok(notice)
    }

    pub fn mode(&self) -> SyncMode {
        self.controller.mode()
    }

    pub async fn probe(&self) -> Result<HealthStatus, RpcraftError> {
        self.controller.probe().await
    }

    /// Journal entries waiting for a migration.
    pub fn pending_writes(&self) -> Result<usize, RpcraftError> {
        self.local.journal_len()
    }

    /// Replays queued offline writes against the remote store. Explicit
    /// and user-triggered; a fully drained journal flips the mode back to
    /// online, which invalidates the cache.
    pub async fn migrate(&self) -> Result<MigrationReport, RpcraftError> {
        let report = self.controller.migrate().await?;
        if report.mode == SyncMode::Online {
            self.cache.clear();
        }
        Ok(report)
    }

    // --- Routing ---

    fn active_store(&self) -> Arc<dyn ConversationStore> {
        match self.controller.mode() {
            SyncMode::Online => match self.controller.remote_store() {
                Some(remote) => Arc::clone(remote),
                None => Arc::clone(&self.local) as Arc<dyn ConversationStore>,
            },
            _ => Arc::clone(&self.local) as Arc<dyn ConversationStore>,
        }
    }

    /// Inspects a store result: a connectivity failure while online flips
    /// the mode and drops the cache before the error is re-raised.
    fn after<T>(&self, result: Result<T, RpcraftError>) -> Result<T, RpcraftError> {
        if let Err(err) = &result {
            if err.is_connectivity() && self.controller.mode() == SyncMode::Online {
                self.controller.note_connectivity_failure(err);
                self.cache.clear();
            }
        }
        result
    }

    /// Routes one write. Online: straight to the remote. Otherwise: applied
    /// to the local snapshot, then journaled for migration.
    async fn run_write(&self, op: WriteOp) -> Result<(), RpcraftError> {
        match self.controller.mode() {
            SyncMode::Online => {
                let store = self.active_store();
                self.after(op.apply(store.as_ref()).await)
            }
            _ => {
                op.apply(self.local.as_ref()).await?;
                self.local.journal_append(op)
            }
        }
    }

    async fn require_message(&self, id: &str) -> Result<Message, RpcraftError> {
        let store = self.active_store();
        self.after(store.find_message(id).await)?
            .ok_or_else(|| RpcraftError::not_found("message", id))
    }

    async fn require_checkpoint(&self, id: &str) -> Result<Checkpoint, RpcraftError> {
        let store = self.active_store();
        self.after(store.find_checkpoint(id).await)?
            .ok_or_else(|| RpcraftError::not_found("checkpoint", id))
    }

    // --- System prompts ---

    /// Upserts remote prompt records into the local snapshot, without
    /// journaling. The local store tracks prompt metadata even while the
    /// remote is authoritative, so conversations started after a
    /// connectivity flip still find their prompt. Only called while
    /// online.
    async fn mirror_prompts(&self, prompts: &[SystemPrompt]) -> Result<(), RpcraftError> {
        let known = self.local.list_prompts().await?;
        for prompt in prompts {
            match known.iter().find(|p| p.id == prompt.id) {
                Some(existing) if existing == prompt => {}
                Some(_) => self.local.update_prompt(prompt).await?,
                None => self.local.create_prompt(prompt).await?,
            }
        }
        Ok(())
    }

    pub async fn prompts(&self) -> Result<Vec<SystemPrompt>, RpcraftError> {
        let store = self.active_store();
        let prompts = self.after(store.list_prompts().await)?;
        if self.controller.mode() == SyncMode::Online {
            self.mirror_prompts(&prompts).await?;
        }
        Ok(prompts)
    }

    pub async fn create_prompt(
        &self,
        name: &str,
        content: &str,
        description: Option<&str>,
    ) -> Result<SystemPrompt, RpcraftError> {
        let name = require_name(name, "prompt")?;
        if content.trim().is_empty() {
            return Err(RpcraftError::Validation(
                "prompt content must not be empty".into(),
            ));
        }
        let ts = now_iso();
        let prompt = SystemPrompt {
            id: new_id(),
            name,
            content: content.to_string(),
            description: description.map(str::to_string),
            created_at: ts.clone(),
            updated_at: ts,
        };
        self.run_write(WriteOp::CreatePrompt {
            prompt: prompt.clone(),
        })
        .await?;
        if self.controller.mode() == SyncMode::Online {
            self.mirror_prompts(std::slice::from_ref(&prompt)).await?;
        }
        debug!(id = %prompt.id, "created system prompt");
        Ok(prompt)
    }

    pub async fn update_prompt(
        &self,
        id: &str,
        name: &str,
        content: &str,
        description: Option<&str>,
    ) -> Result<SystemPrompt, RpcraftError> {
        let name = require_name(name, "prompt")?;
        if content.trim().is_empty() {
            return Err(RpcraftError::Validation(
                "prompt content must not be empty".into(),
            ));
        }
        let existing = self
            .prompts()
            .await?
            .into_iter()
            .find(|p| p.id == id)
            .ok_or_else(|| RpcraftError::not_found("prompt", id))?;
        let prompt = SystemPrompt {
            id: existing.id,
            name,
            content: content.to_string(),
            description: description.map(str::to_string),
            created_at: existing.created_at,
            updated_at: now_iso(),
        };
        self.run_write(WriteOp::UpdatePrompt {
            prompt: prompt.clone(),
        })
        .await?;
        if self.controller.mode() == SyncMode::Online {
            self.mirror_prompts(std::slice::from_ref(&prompt)).await?;
        }
        Ok(prompt)
    }

    /// Deletes a prompt and every conversation that references it.
    ///
    /// The last remaining prompt cannot be deleted. If the deleted prompt
    /// was active, the pointer moves to the first surviving prompt and the
    /// cache is dropped.
    pub async fn delete_prompt(&self, id: &str) -> Result<(), RpcraftError> {
        let prompts = self.prompts().await?;
        if !prompts.iter().any(|p| p.id == id) {
            return Err(RpcraftError::not_found("prompt", id));
        }
        if prompts.len() == 1 {
            return Err(RpcraftError::Validation(
                "cannot delete the last system prompt".into(),
            ));
        }

        let store = self.active_store();
        let owned = self.after(store.list_conversations(id, true).await)?;
        for conversation in owned {
            self.run_write(WriteOp::DeleteConversation {
                id: conversation.id.clone(),
            })
            .await?;
            self.cache.remove(&conversation.id);
            if self.local.active_conversation()?.as_deref() == Some(conversation.id.as_str()) {
                self.local.set_active_conversation(None)?;
            }
        }
        self.run_write(WriteOp::DeletePrompt { id: id.to_string() })
            .await?;
        if self.controller.mode() == SyncMode::Online {
            match self.local.delete_prompt(id).await {
                Ok(()) | Err(RpcraftError::NotFound { .. }) => {}
                Err(err) => return Err(err),
            }
        }

        if self.local.active_prompt()?.as_deref() == Some(id) {
            let fallback = prompts.iter().find(|p| p.id != id).map(|p| p.id.clone());
            self.local.set_active_prompt(fallback.as_deref())?;
            self.cache.clear();
        }
        debug!(id, "deleted system prompt and its conversations");
        Ok(())
    }

    // --- Active pointers ---

    pub fn active_prompt_id(&self) -> Result<Option<String>, RpcraftError> {
        self.local.active_prompt()
    }

    /// Switches the active prompt. Drops the cache: the visible
    /// conversation set changes wholesale.
    pub async fn set_active_prompt(&self, id: &str) -> Result<(), RpcraftError> {
        if !self.prompts().await?.iter().any(|p| p.id == id) {
            return Err(RpcraftError::not_found("prompt", id));
        }
        self.local.set_active_prompt(Some(id))?;
        self.cache.clear();
        Ok(())
    }

    /// The active prompt, creating and activating a default one when the
    /// store has none (a freshly provisioned backend).
    pub async fn ensure_active_prompt(&self) -> Result<SystemPrompt, RpcraftError> {
        let prompts = self.prompts().await?;
        if let Some(active) = self.local.active_prompt()? {
            if let Some(prompt) = prompts.iter().find(|p| p.id == active) {
                return Ok(prompt.clone());
            }
        }
        let prompt = match prompts.into_iter().next() {
            Some(prompt) => prompt,
            None => {
                self.create_prompt(DEFAULT_PROMPT_NAME, DEFAULT_PROMPT_CONTENT, None)
                    .await?
            }
        };
        self.local.set_active_prompt(Some(&prompt.id))?;
        self.cache.clear();
        Ok(prompt)
    }

    pub fn active_conversation_id(&self) -> Result<Option<String>, RpcraftError> {
        self.local.active_conversation()
    }

    pub async fn set_active_conversation(&self, id: Option<&str>) -> Result<(), RpcraftError> {
        if let Some(id) = id {
            let store = self.active_store();
            if self.after(store.get_conversation(id).await)?.is_none() {
                return Err(RpcraftError::not_found("conversation", id));
            }
        }
        self.local.set_active_conversation(id)
    }

    // --- Conversations ---

    pub async fn create_conversation(
        &self,
        system_prompt_id: &str,
        name: &str,
    ) -> Result<Conversation, RpcraftError> {
        let name = require_name(name, "conversation")?;
        let ts = now_iso();
        let conversation = Conversation {
            id: new_id(),
            name,
            system_prompt_id: system_prompt_id.to_string(),
            created_at: ts.clone(),
            updated_at: ts,
            is_archived: false,
        };
        self.run_write(WriteOp::CreateConversation {
            conversation: conversation.clone(),
        })
        .await?;
        self.cache.insert(&conversation.id, Vec::new());
        debug!(id = %conversation.id, "created conversation");
        Ok(conversation)
    }

    /// Conversations owned by a prompt, newest first. Archived ones are
    /// hidden unless asked for.
    pub async fn conversations(
        &self,
        system_prompt_id: &str,
        include_archived: bool,
    ) -> Result<Vec<Conversation>, RpcraftError> {
        let store = self.active_store();
        self.after(
            store
                .list_conversations(system_prompt_id, include_archived)
                .await,
        )
    }

    pub async fn get_conversation(&self, id: &str) -> Result<Option<Conversation>, RpcraftError> {
        let store = self.active_store();
        self.after(store.get_conversation(id).await)
    }

    pub async fn rename_conversation(&self, id: &str, name: &str) -> Result<(), RpcraftError> {
        let name = require_name(name, "conversation")?;
        self.run_write(WriteOp::RenameConversation {
            id: id.to_string(),
            name,
            updated_at: now_iso(),
        })
        .await
    }

    pub async fn set_archived(&self, id: &str, archived: bool) -> Result<(), RpcraftError> {
        self.run_write(WriteOp::SetArchived {
            id: id.to_string(),
            archived,
            updated_at: now_iso(),
        })
        .await
    }

    /// Deletes a conversation with its messages and checkpoints, and clears
    /// the active pointer if it pointed there.
    pub async fn delete_conversation(&self, id: &str) -> Result<(), RpcraftError> {
        self.run_write(WriteOp::DeleteConversation { id: id.to_string() })
            .await?;
        self.cache.remove(id);
        if self.local.active_conversation()?.as_deref() == Some(id) {
            self.local.set_active_conversation(None)?;
        }
        Ok(())
    }

    /// Copies a conversation under the same prompt: fresh ids and
    /// timestamps, message order and sequences preserved, no checkpoints.
    ///
    /// A failure mid-copy drops the partial copy on a best-effort basis
    /// before the error is re-raised; the source is never touched.
    pub async fn duplicate_conversation(&self, id: &str) -> Result<Conversation, RpcraftError> {
        let store = self.active_store();
        let source = self
            .after(store.get_conversation(id).await)?
            .ok_or_else(|| RpcraftError::not_found("conversation", id))?;
        let messages = self.messages(id).await?;

        let ts = now_iso();
        let copy = Conversation {
            id: new_id(),
            name: format!("{} (copy)", source.name),
            system_prompt_id: source.system_prompt_id.clone(),
            created_at: ts.clone(),
            updated_at: ts,
            is_archived: false,
        };
        self.run_write(WriteOp::CreateConversation {
            conversation: copy.clone(),
        })
        .await?;

        let mut copied = Vec::with_capacity(messages.len());
        for message in &messages {
            let duplicate = Message {
                id: new_id(),
                conversation_id: copy.id.clone(),
                role: message.role,
                content: message.content.clone(),
                sequence: message.sequence,
                created_at: now_iso(),
            };
            if let Err(err) = self
                .run_write(WriteOp::AppendMessage {
                    message: duplicate.clone(),
                })
                .await
            {
                let _ = self
                    .run_write(WriteOp::DeleteConversation { id: copy.id.clone() })
                    .await;
                return Err(err);
            }
            copied.push(duplicate);
        }
        self.cache.insert(&copy.id, copied);
        debug!(source = id, copy = %copy.id, "duplicated conversation");
        Ok(copy)
    }

    // --- Messages ---

    /// A conversation's messages in order, from the cache when warm.
    pub async fn messages(&self, conversation_id: &str) -> Result<Vec<Message>, RpcraftError> {
        if let Some(hit) = self.cache.get(conversation_id) {
            return Ok(hit);
        }
        let store = self.active_store();
        let messages = self.after(store.list_messages(conversation_id).await)?;
        self.cache.insert(conversation_id, messages.clone());
        Ok(messages)
    }

    /// Appends a message, assigning the next sequence number.
    pub async fn append(
        &self,
        conversation_id: &str,
        role: Role,
        content: &str,
    ) -> Result<Message, RpcraftError> {
        let current = self.messages(conversation_id).await?;
        let sequence = current.iter().map(|m| m.sequence).max().unwrap_or(0) + 1;
        let message = Message {
            id: new_id(),
            conversation_id: conversation_id.to_string(),
            role,
            content: content.to_string(),
            sequence,
            created_at: now_iso(),
        };
        self.run_write(WriteOp::AppendMessage {
            message: message.clone(),
        })
        .await?;
        let cached = message.clone();
        self.cache.update(conversation_id, |list| list.push(cached));
        Ok(message)
    }

    /// Replaces a message's content in place. Identity, role, sequence,
    /// and position are untouched.
    pub async fn edit(&self, message_id: &str, content: &str) -> Result<Message, RpcraftError> {
        let mut message = self.require_message(message_id).await?;
        self.run_write(WriteOp::UpdateMessage {
            id: message_id.to_string(),
            content: content.to_string(),
            updated_at: now_iso(),
        })
        .await?;
        message.content = content.to_string();
        let patched = message.clone();
        self.cache.update(&message.conversation_id, |list| {
            if let Some(slot) = list.iter_mut().find(|m| m.id == patched.id) {
                slot.content = patched.content;
            }
        });
        Ok(message)
    }

    /// Removes one message. Survivors keep their sequence numbers.
    pub async fn delete_message(&self, message_id: &str) -> Result<(), RpcraftError> {
        let message = self.require_message(message_id).await?;
        self.run_write(WriteOp::DeleteMessage {
            id: message_id.to_string(),
            updated_at: now_iso(),
        })
        .await?;
        self.cache.update(&message.conversation_id, |list| {
            list.retain(|m| m.id != message_id);
        });
        Ok(())
    }

    /// Drops every message after the named one; the named message stays.
    pub async fn truncate_after(&self, message_id: &str) -> Result<(), RpcraftError> {
        let message = self.require_message(message_id).await?;
        self.run_write(WriteOp::TruncateAfter {
            id: message_id.to_string(),
            updated_at: now_iso(),
        })
        .await?;
        self.cache.update(&message.conversation_id, |list| {
            list.retain(|m| m.sequence <= message.sequence);
        });
        Ok(())
    }

    // --- Checkpoints ---

    /// Checkpoints oldest first.
    pub async fn checkpoints(
        &self,
        conversation_id: &str,
    ) -> Result<Vec<Checkpoint>, RpcraftError> {
        let store = self.active_store();
        self.after(store.list_checkpoints(conversation_id).await)
    }

    /// Snapshots the conversation's current message list under a name.
    /// Empty conversations cannot be checkpointed.
    pub async fn create_checkpoint(
        &self,
        conversation_id: &str,
        name: &str,
    ) -> Result<Checkpoint, RpcraftError> {
        let name = require_name(name, "checkpoint")?;
        let messages = self.messages(conversation_id).await?;
        if messages.is_empty() {
            return Err(RpcraftError::Validation(
                "cannot checkpoint an empty conversation".into(),
            ));
        }
        let checkpoint = Checkpoint {
            id: new_id(),
            conversation_id: conversation_id.to_string(),
            name,
            messages,
            created_at: now_iso(),
        };
        self.run_write(WriteOp::CreateCheckpoint {
            checkpoint: checkpoint.clone(),
        })
        .await?;
        debug!(id = %checkpoint.id, conversation_id, "created checkpoint");
        Ok(checkpoint)
    }

    /// Replaces the live message list with the checkpoint's snapshot. The
    /// checkpoint itself, and every other checkpoint, survives.
    pub async fn restore_checkpoint(&self, checkpoint_id: &str) -> Result<(), RpcraftError> {
        let checkpoint = self.require_checkpoint(checkpoint_id).await?;
        self.run_write(WriteOp::RestoreCheckpoint {
            id: checkpoint_id.to_string(),
            updated_at: now_iso(),
        })
        .await?;
        self.cache
            .insert(&checkpoint.conversation_id, checkpoint.messages.clone());
        debug!(id = checkpoint_id, "restored checkpoint");
        Ok(())
    }

    /// Removes one checkpoint; live messages are unaffected.
    pub async fn delete_checkpoint(&self, checkpoint_id: &str) -> Result<(), RpcraftError> {
        self.run_write(WriteOp::DeleteCheckpoint {
            id: checkpoint_id.to_string(),
            updated_at: now_iso(),
        })
        .await
    }
}
