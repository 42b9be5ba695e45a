// SPDX-FileCopyrightText: 2026 RPCraft Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The offline variant of the persistence adapter.
//!
//! All operations mutate an in-process snapshot under a single mutex and
//! flush the whole document atomically (temp file + rename) when a path is
//! configured. Operations never perform network I/O and fail only on
//! invariant violations, missing ids, or a flush failure.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use async_trait::async_trait;
use tracing::{debug, warn};

use rpcraft_core::types::{
    Checkpoint, Conversation, HealthStatus, Message, SystemPrompt,
};
use rpcraft_core::{ConversationStore, RpcraftError, WriteOp};

use crate::schema::{Snapshot, StoredConversation};

/// Offline snapshot store.
///
/// The mutex is held only for the duration of one synchronous mutation plus
/// its flush; no lock is held across an await point.
pub struct LocalStore {
    path: Option<PathBuf>,
    state: Mutex<Snapshot>,
}

fn storage_err(e: impl std::error::Error + Send + Sync + 'static) -> RpcraftError {
    RpcraftError::Storage { source: Box::new(e) }
}

impl LocalStore {
    /// Opens the store at `path`, loading the existing snapshot if present.
    ///
    /// A missing file yields a fresh seeded snapshot; a malformed file is
    /// recovered entry by entry (see [`crate::schema`]).
    pub fn open(path: impl AsRef<Path>) -> Result<Self, RpcraftError> {
        let path = path.as_ref().to_path_buf();
        let snapshot = match fs::read_to_string(&path) {
            Ok(raw) => match serde_json::from_str(&raw) {
                Ok(doc) => Snapshot::from_document(&doc),
                Err(err) => {
                    warn!(path = %path.display(), %err, "snapshot is not valid JSON, starting fresh");
                    Snapshot::seeded()
                }
            },
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %path.display(), "no snapshot on disk, seeding defaults");
                Snapshot::seeded()
            }
            Err(err) => return Err(storage_err(err)),
        };
        Ok(Self {
            path: Some(path),
            state: Mutex::new(snapshot),
        })
    }

    /// An in-memory store that never touches the filesystem. Used by tests
    /// and as the throwaway backing for purely remote sessions.
    pub fn in_memory() -> Self {
        Self {
            path: None,
            state: Mutex::new(Snapshot::seeded()),
        }
    }

    /// Runs a mutation under the lock and flushes on success.
    fn mutate<R>(
        &self,
        f: impl FnOnce(&mut Snapshot) -> Result<R, RpcraftError>,
    ) -> Result<R, RpcraftError> {
        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        let result = f(&mut state)?;
        self.flush(&state)?;
        Ok(result)
    }

    /// Runs a read under the lock.
    fn read<R>(&self, f: impl FnOnce(&Snapshot) -> Result<R, RpcraftError>) -> Result<R, RpcraftError> {
        let state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        f(&state)
    }

    fn flush(&self, state: &Snapshot) -> Result<(), RpcraftError> {
        let Some(path) = &self.path else {
            return Ok(());
        };
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(storage_err)?;
        }
        let doc = state.to_document();
        let raw = serde_json::to_string_pretty(&doc).map_err(storage_err)?;
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, raw).map_err(storage_err)?;
        fs::rename(&tmp, path).map_err(storage_err)?;
        Ok(())
    }

    // --- Offline write journal ---

    /// Appends a journaled write, preserving creation order.
    pub fn journal_append(&self, op: WriteOp) -> Result<(), RpcraftError> {
        self.mutate(|state| {
            state.journal.push(op);
            Ok(())
        })
    }

    /// The oldest unreplayed journal entry, if any.
    pub fn journal_first(&self) -> Result<Option<WriteOp>, RpcraftError> {
        self.read(|state| Ok(state.journal.first().cloned()))
    }

    /// Removes the oldest journal entry after a successful (or permanently
    /// failed) replay.
    pub fn journal_pop_front(&self) -> Result<(), RpcraftError> {
        self.mutate(|state| {
            if !state.journal.is_empty() {
                state.journal.remove(0);
            }
            Ok(())
        })
    }

    pub fn journal_len(&self) -> Result<usize, RpcraftError> {
        self.read(|state| Ok(state.journal.len()))
    }

    /// A copy of the whole journal, oldest first.
    pub fn journal_entries(&self) -> Result<Vec<WriteOp>, RpcraftError> {
        self.read(|state| Ok(state.journal.clone()))
    }

    // --- Active pointers ---

    pub fn active_prompt(&self) -> Result<Option<String>, RpcraftError> {
        self.read(|state| Ok(state.active_prompt.clone()))
    }

    pub fn set_active_prompt(&self, id: Option<&str>) -> Result<(), RpcraftError> {
        self.mutate(|state| {
            state.active_prompt = id.map(str::to_string);
            Ok(())
        })
    }

    pub fn active_conversation(&self) -> Result<Option<String>, RpcraftError> {
        self.read(|state| Ok(state.active_conversation.clone()))
    }

    pub fn set_active_conversation(&self, id: Option<&str>) -> Result<(), RpcraftError> {
        self.mutate(|state| {
            state.active_conversation = id.map(str::to_string);
            Ok(())
        })
    }
}

fn conversation_mut<'a>(
    state: &'a mut Snapshot,
    id: &str,
) -> Result<&'a mut StoredConversation, RpcraftError> {
    state
        .conversations
        .iter_mut()
        .find(|c| c.meta.id == id)
        .ok_or_else(|| RpcraftError::not_found("conversation", id))
}

/// Locates the conversation holding a message and the message's index.
fn message_position(state: &Snapshot, id: &str) -> Option<(usize, usize)> {
    state.conversations.iter().enumerate().find_map(|(ci, conv)| {
        conv.messages
            .iter()
            .position(|m| m.id == id)
            .map(|mi| (ci, mi))
    })
}

fn checkpoint_position(state: &Snapshot, id: &str) -> Option<(usize, usize)> {
    state.conversations.iter().enumerate().find_map(|(ci, conv)| {
        conv.checkpoints
            .iter()
            .position(|k| k.id == id)
            .map(|ki| (ci, ki))
    })
}

#[async_trait]
impl ConversationStore for LocalStore {
    fn name(&self) -> &str {
        "local"
    }

    async fn health_check(&self) -> Result<HealthStatus, RpcraftError> {
        Ok(HealthStatus::Healthy)
    }

    // --- System prompts ---

    async fn create_prompt(&self, prompt: &SystemPrompt) -> Result<(), RpcraftError> {
        let prompt = prompt.clone();
        self.mutate(|state| {
            if state.prompts.iter().any(|p| p.id == prompt.id) {
                return Err(RpcraftError::Validation(format!(
                    "prompt id already exists: {}",
                    prompt.id
                )));
            }
            state.prompts.push(prompt);
            Ok(())
        })
    }

    async fn list_prompts(&self) -> Result<Vec<SystemPrompt>, RpcraftError> {
        self.read(|state| {
            let mut prompts = state.prompts.clone();
            prompts.sort_by(|a, b| (&a.created_at, &a.id).cmp(&(&b.created_at, &b.id)));
            Ok(prompts)
        })
    }

    async fn update_prompt(&self, prompt: &SystemPrompt) -> Result<(), RpcraftError> {
        let prompt = prompt.clone();
        self.mutate(|state| {
            let existing = state
                .prompts
                .iter_mut()
                .find(|p| p.id == prompt.id)
                .ok_or_else(|| RpcraftError::not_found("prompt", &prompt.id))?;
            *existing = prompt;
            Ok(())
        })
    }

    async fn delete_prompt(&self, id: &str) -> Result<(), RpcraftError> {
        self.mutate(|state| {
            let before = state.prompts.len();
            state.prompts.retain(|p| p.id != id);
            if state.prompts.len() == before {
                return Err(RpcraftError::not_found("prompt", id));
            }
            if state.active_prompt.as_deref() == Some(id) {
                state.active_prompt = state.prompts.first().map(|p| p.id.clone());
            }
            Ok(())
        })
    }

    // --- Conversations ---

    async fn create_conversation(&self, conversation: &Conversation) -> Result<(), RpcraftError> {
        let conversation = conversation.clone();
        self.mutate(|state| {
            if !state
                .prompts
                .iter()
                .any(|p| p.id == conversation.system_prompt_id)
            {
                return Err(RpcraftError::not_found(
                    "prompt",
                    &conversation.system_prompt_id,
                ));
            }
            if state.conversations.iter().any(|c| c.meta.id == conversation.id) {
                return Err(RpcraftError::Validation(format!(
                    "conversation id already exists: {}",
                    conversation.id
                )));
            }
            state.conversations.push(StoredConversation {
                meta: conversation,
                messages: Vec::new(),
                checkpoints: Vec::new(),
            });
            Ok(())
        })
    }

    async fn list_conversations(
        &self,
        prompt_id: &str,
        include_archived: bool,
    ) -> Result<Vec<Conversation>, RpcraftError> {
        self.read(|state| {
            let mut conversations: Vec<Conversation> = state
                .conversations
                .iter()
                .filter(|c| c.meta.system_prompt_id == prompt_id)
                .filter(|c| include_archived || !c.meta.is_archived)
                .map(|c| c.meta.clone())
                .collect();
            conversations
                .sort_by(|a, b| (&b.created_at, &a.id).cmp(&(&a.created_at, &b.id)));
            Ok(conversations)
        })
    }

    async fn get_conversation(&self, id: &str) -> Result<Option<Conversation>, RpcraftError> {
        self.read(|state| {
            Ok(state
                .conversations
                .iter()
                .find(|c| c.meta.id == id)
                .map(|c| c.meta.clone()))
        })
    }

    async fn rename_conversation(
        &self,
        id: &str,
        name: &str,
        updated_at: &str,
    ) -> Result<(), RpcraftError> {
        self.mutate(|state| {
            let conv = conversation_mut(state, id)?;
            conv.meta.name = name.to_string();
            conv.meta.updated_at = updated_at.to_string();
            Ok(())
        })
    }

    async fn set_archived(
        &self,
        id: &str,
        archived: bool,
        updated_at: &str,
    ) -> Result<(), RpcraftError> {
        self.mutate(|state| {
            let conv = conversation_mut(state, id)?;
            conv.meta.is_archived = archived;
            conv.meta.updated_at = updated_at.to_string();
            Ok(())
        })
    }

    async fn delete_conversation(&self, id: &str) -> Result<(), RpcraftError> {
        self.mutate(|state| {
            let before = state.conversations.len();
            state.conversations.retain(|c| c.meta.id != id);
            if state.conversations.len() == before {
                return Err(RpcraftError::not_found("conversation", id));
            }
            if state.active_conversation.as_deref() == Some(id) {
                state.active_conversation = None;
            }
            Ok(())
        })
    }

    // --- Messages ---

    async fn list_messages(&self, conversation_id: &str) -> Result<Vec<Message>, RpcraftError> {
        self.read(|state| {
            let conv = state
                .conversations
                .iter()
                .find(|c| c.meta.id == conversation_id)
                .ok_or_else(|| RpcraftError::not_found("conversation", conversation_id))?;
            let mut messages = conv.messages.clone();
            messages.sort_by_key(|m| m.sequence);
            Ok(messages)
        })
    }

    async fn find_message(&self, id: &str) -> Result<Option<Message>, RpcraftError> {
        self.read(|state| {
            Ok(message_position(state, id)
                .map(|(ci, mi)| state.conversations[ci].messages[mi].clone()))
        })
    }

    async fn append_message(&self, message: &Message) -> Result<(), RpcraftError> {
        let message = message.clone();
        self.mutate(|state| {
            if message_position(state, &message.id).is_some() {
                return Err(RpcraftError::Validation(format!(
                    "message id already exists: {}",
                    message.id
                )));
            }
            let conv = conversation_mut(state, &message.conversation_id)?;
            if conv.messages.iter().any(|m| m.sequence == message.sequence) {
                return Err(RpcraftError::Validation(format!(
                    "message sequence {} already taken in conversation {}",
                    message.sequence, message.conversation_id
                )));
            }
            conv.meta.updated_at = message.created_at.clone();
            conv.messages.push(message);
            Ok(())
        })
    }

    async fn update_message(
        &self,
        id: &str,
        content: &str,
        updated_at: &str,
    ) -> Result<(), RpcraftError> {
        self.mutate(|state| {
            let (ci, mi) = message_position(state, id)
                .ok_or_else(|| RpcraftError::not_found("message", id))?;
            let conv = &mut state.conversations[ci];
            conv.messages[mi].content = content.to_string();
            conv.meta.updated_at = updated_at.to_string();
            Ok(())
        })
    }

    async fn delete_message(&self, id: &str, updated_at: &str) -> Result<(), RpcraftError> {
        self.mutate(|state| {
            let (ci, mi) = message_position(state, id)
                .ok_or_else(|| RpcraftError::not_found("message", id))?;
            let conv = &mut state.conversations[ci];
            conv.messages.remove(mi);
            conv.meta.updated_at = updated_at.to_string();
            Ok(())
        })
    }

    async fn truncate_after(&self, id: &str, updated_at: &str) -> Result<(), RpcraftError> {
        self.mutate(|state| {
            let (ci, _) = message_position(state, id)
                .ok_or_else(|| RpcraftError::not_found("message", id))?;
            let conv = &mut state.conversations[ci];
            // Positions may not match sequence order in storage, so cut by
            // sequence of the named message.
            let keep_through = conv
                .messages
                .iter()
                .find(|m| m.id == id)
                .map(|m| m.sequence)
                .unwrap_or(i64::MAX);
            conv.messages.retain(|m| m.sequence <= keep_through);
            conv.meta.updated_at = updated_at.to_string();
            Ok(())
        })
    }

    // --- Checkpoints ---

    async fn list_checkpoints(
        &self,
        conversation_id: &str,
    ) -> Result<Vec<Checkpoint>, RpcraftError> {
        self.read(|state| {
            let conv = state
                .conversations
                .iter()
                .find(|c| c.meta.id == conversation_id)
                .ok_or_else(|| RpcraftError::not_found("conversation", conversation_id))?;
            let mut checkpoints = conv.checkpoints.clone();
            checkpoints.sort_by(|a, b| (&a.created_at, &a.id).cmp(&(&b.created_at, &b.id)));
            Ok(checkpoints)
        })
    }

    async fn find_checkpoint(&self, id: &str) -> Result<Option<Checkpoint>, RpcraftError> {
        self.read(|state| {
            Ok(checkpoint_position(state, id)
                .map(|(ci, ki)| state.conversations[ci].checkpoints[ki].clone()))
        })
    }

    async fn create_checkpoint(&self, checkpoint: &Checkpoint) -> Result<(), RpcraftError> {
        let checkpoint = checkpoint.clone();
        self.mutate(|state| {
            if checkpoint_position(state, &checkpoint.id).is_some() {
                return Err(RpcraftError::Validation(format!(
                    "checkpoint id already exists: {}",
                    checkpoint.id
                )));
            }
            let conv = conversation_mut(state, &checkpoint.conversation_id)?;
            conv.meta.updated_at = checkpoint.created_at.clone();
            conv.checkpoints.push(checkpoint);
            Ok(())
        })
    }

    async fn restore_checkpoint(&self, id: &str, updated_at: &str) -> Result<(), RpcraftError> {
        self.mutate(|state| {
            let (ci, ki) = checkpoint_position(state, id)
                .ok_or_else(|| RpcraftError::not_found("checkpoint", id))?;
            let conv = &mut state.conversations[ci];
            conv.messages = conv.checkpoints[ki].messages.clone();
            conv.meta.updated_at = updated_at.to_string();
            Ok(())
        })
    }

    async fn delete_checkpoint(&self, id: &str, updated_at: &str) -> Result<(), RpcraftError> {
        self.mutate(|state| {
            let (ci, ki) = checkpoint_position(state, id)
                .ok_or_else(|| RpcraftError::not_found("checkpoint", id))?;
            let conv = &mut state.conversations[ci];
            conv.checkpoints.remove(ki);
            conv.meta.updated_at = updated_at.to_string();
            Ok(())
        })
    }
}
