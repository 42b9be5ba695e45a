// SPDX-FileCopyrightText: 2026 RPCraft Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The uniform persistence surface implemented by both store variants.

use async_trait::async_trait;

use crate::error::RpcraftError;
use crate::types::{Checkpoint, Conversation, HealthStatus, Message, SystemPrompt};

/// Adapter over a conversation persistence backend.
///
/// Two variants exist: a remote RPC-backed store and a local offline
/// snapshot. Both must produce identical logical results for identical
/// inputs. All records and `updated_at` values are supplied by the caller;
/// an adapter never invents ids or timestamps.
///
/// Mutations to a conversation's messages or checkpoints refresh the owning
/// conversation's `updated_at` (for [`append_message`] and
/// [`create_checkpoint`] the record's own `created_at` is used as the new
/// value; the remaining mutations take an explicit `updated_at`).
///
/// Remote transport failures surface as [`RpcraftError::Connectivity`] and
/// never silently lose data; the offline variant fails only with
/// `Validation`, `NotFound`, or `Storage`.
///
/// [`append_message`]: ConversationStore::append_message
/// [`create_checkpoint`]: ConversationStore::create_checkpoint
#[async_trait]
pub trait ConversationStore: Send + Sync {
    /// Human-readable name of this store instance.
    fn name(&self) -> &str;

    /// Probes the backend. Never mutates data.
    async fn health_check(&self) -> Result<HealthStatus, RpcraftError>;

    // --- System prompts ---

    async fn create_prompt(&self, prompt: &SystemPrompt) -> Result<(), RpcraftError>;

    async fn list_prompts(&self) -> Result<Vec<SystemPrompt>, RpcraftError>;

    async fn update_prompt(&self, prompt: &SystemPrompt) -> Result<(), RpcraftError>;

    /// Deletes one prompt. Enforcing the "at least one prompt" invariant
    /// and cascading to owned conversations is the caller's job, so that
    /// both variants observe the same operation sequence.
    async fn delete_prompt(&self, id: &str) -> Result<(), RpcraftError>;

    // --- Conversations ---

    /// Fails with `NotFound` if the referenced system prompt does not exist.
    async fn create_conversation(&self, conversation: &Conversation) -> Result<(), RpcraftError>;

    /// Lists conversations owned by a prompt, newest-first by `created_at`.
    /// Archived conversations are excluded unless `include_archived`.
    async fn list_conversations(
        &self,
        prompt_id: &str,
        include_archived: bool,
    ) -> Result<Vec<Conversation>, RpcraftError>;

    async fn get_conversation(&self, id: &str) -> Result<Option<Conversation>, RpcraftError>;

    async fn rename_conversation(
        &self,
        id: &str,
        name: &str,
        updated_at: &str,
    ) -> Result<(), RpcraftError>;

    async fn set_archived(
        &self,
        id: &str,
        archived: bool,
        updated_at: &str,
    ) -> Result<(), RpcraftError>;

    /// Cascades: deletes the conversation's messages and checkpoints.
    async fn delete_conversation(&self, id: &str) -> Result<(), RpcraftError>;

    // --- Messages ---

    /// Messages in ascending `sequence` order. `NotFound` if the
    /// conversation does not exist.
    async fn list_messages(&self, conversation_id: &str) -> Result<Vec<Message>, RpcraftError>;

    async fn find_message(&self, id: &str) -> Result<Option<Message>, RpcraftError>;

    async fn append_message(&self, message: &Message) -> Result<(), RpcraftError>;

    /// Replaces a message's content in place; nothing else changes.
    async fn update_message(
        &self,
        id: &str,
        content: &str,
        updated_at: &str,
    ) -> Result<(), RpcraftError>;

    async fn delete_message(&self, id: &str, updated_at: &str) -> Result<(), RpcraftError>;

    /// Removes every message after the named one; the named message is kept.
    async fn truncate_after(&self, id: &str, updated_at: &str) -> Result<(), RpcraftError>;

    // --- Checkpoints ---

    /// Checkpoints oldest-to-newest by `created_at`.
    async fn list_checkpoints(
        &self,
        conversation_id: &str,
    ) -> Result<Vec<Checkpoint>, RpcraftError>;

    async fn find_checkpoint(&self, id: &str) -> Result<Option<Checkpoint>, RpcraftError>;

    async fn create_checkpoint(&self, checkpoint: &Checkpoint) -> Result<(), RpcraftError>;

    /// Replaces the owning conversation's live message list wholesale with
    /// the checkpoint's snapshot. The checkpoint itself is kept.
    async fn restore_checkpoint(&self, id: &str, updated_at: &str) -> Result<(), RpcraftError>;

    /// Removes one checkpoint; live messages are unaffected.
    async fn delete_checkpoint(&self, id: &str, updated_at: &str) -> Result<(), RpcraftError>;
}
