// SPDX-FileCopyrightText: 2026 RPCraft Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The offline write journal.
//!
//! Every write performed while the sync controller is offline is recorded
//! as a [`WriteOp`] in creation order and persisted alongside the local
//! snapshot. An explicit migrate action replays the journal against the
//! remote store oldest-first with at-least-once semantics: an entry is
//! removed only after its remote call succeeds.

use serde::{Deserialize, Serialize};

use crate::error::RpcraftError;
use crate::store::ConversationStore;
use crate::types::{Checkpoint, Conversation, Message, SystemPrompt};

/// One journaled write. Carries the full record data so replay needs no
/// lookups against local state that may have moved on since.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum WriteOp {
    CreatePrompt { prompt: SystemPrompt },
    UpdatePrompt { prompt: SystemPrompt },
    DeletePrompt { id: String },
    CreateConversation { conversation: Conversation },
    RenameConversation { id: String, name: String, updated_at: String },
    SetArchived { id: String, archived: bool, updated_at: String },
    DeleteConversation { id: String },
    AppendMessage { message: Message },
    UpdateMessage { id: String, content: String, updated_at: String },
    DeleteMessage { id: String, updated_at: String },
    TruncateAfter { id: String, updated_at: String },
    CreateCheckpoint { checkpoint: Checkpoint },
    RestoreCheckpoint { id: String, updated_at: String },
    DeleteCheckpoint { id: String, updated_at: String },
}

impl WriteOp {
    /// Applies this write to a store.
    pub async fn apply(&self, store: &dyn ConversationStore) -> Result<(), RpcraftError> {
        match self {
            Self::CreatePrompt { prompt } => store.create_prompt(prompt).await,
            Self::UpdatePrompt { prompt } => store.update_prompt(prompt).await,
            Self::DeletePrompt { id } => store.delete_prompt(id).await,
            Self::CreateConversation { conversation } => {
                store.create_conversation(conversation).await
            }
            Self::RenameConversation {
                id,
                name,
                updated_at,
            } => store.rename_conversation(id, name, updated_at).await,
            Self::SetArchived {
                id,
                archived,
                updated_at,
            } => store.set_archived(id, *archived, updated_at).await,
            Self::DeleteConversation { id } => store.delete_conversation(id).await,
            Self::AppendMessage { message } => store.append_message(message).await,
            Self::UpdateMessage {
                id,
                content,
                updated_at,
            } => store.update_message(id, content, updated_at).await,
            Self::DeleteMessage { id, updated_at } => store.delete_message(id, updated_at).await,
            Self::TruncateAfter { id, updated_at } => store.truncate_after(id, updated_at).await,
            Self::CreateCheckpoint { checkpoint } => store.create_checkpoint(checkpoint).await,
            Self::RestoreCheckpoint { id, updated_at } => {
                store.restore_checkpoint(id, updated_at).await
            }
            Self::DeleteCheckpoint { id, updated_at } => {
                store.delete_checkpoint(id, updated_at).await
            }
        }
    }

    /// Short label for logs and migration reports.
    pub fn label(&self) -> &'static str {
        match self {
            Self::CreatePrompt { .. } => "create_prompt",
            Self::UpdatePrompt { .. } => "update_prompt",
            Self::DeletePrompt { .. } => "delete_prompt",
            Self::CreateConversation { .. } => "create_conversation",
            Self::RenameConversation { .. } => "rename_conversation",
            Self::SetArchived { .. } => "set_archived",
            Self::DeleteConversation { .. } => "delete_conversation",
            Self::AppendMessage { .. } => "append_message",
            Self::UpdateMessage { .. } => "update_message",
            Self::DeleteMessage { .. } => "delete_message",
            Self::TruncateAfter { .. } => "truncate_after",
            Self::CreateCheckpoint { .. } => "create_checkpoint",
            Self::RestoreCheckpoint { .. } => "restore_checkpoint",
            Self::DeleteCheckpoint { .. } => "delete_checkpoint",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn write_op_round_trips_through_json() {
        let op = WriteOp::RenameConversation {
            id: "c1".into(),
            name: "renamed".into(),
            updated_at: "2026-01-01T00:00:00.000Z".into(),
        };
        let json = serde_json::to_string(&op).unwrap();
        assert!(json.contains("\"op\":\"rename_conversation\""), "got {json}");
        let parsed: WriteOp = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, op);
    }

    #[test]
    fn labels_are_stable() {
        let op = WriteOp::DeletePrompt { id: "p1".into() };
        assert_eq!(op.label(), "delete_prompt");
    }
}
