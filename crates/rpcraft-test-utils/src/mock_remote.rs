// SPDX-FileCopyrightText: 2026 RPCraft Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mock remote store for deterministic testing.
//!
//! `MockRemote` implements `ConversationStore` with flat id-keyed maps, a
//! deliberately different representation from the offline store's nested
//! snapshot, so the adapter-equivalence property exercises two independent
//! implementations. Connectivity failures can be injected per call.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;

use rpcraft_core::types::{
    Checkpoint, Conversation, HealthStatus, Message, SystemPrompt,
};
use rpcraft_core::{ConversationStore, RpcraftError};

#[derive(Default)]
struct Inner {
    prompts: HashMap<String, SystemPrompt>,
    conversations: HashMap<String, Conversation>,
    messages: HashMap<String, Message>,
    checkpoints: HashMap<String, Checkpoint>,
    skip_next: usize,
    fail_next: usize,
    healthy: bool,
}

/// An in-memory stand-in for the remote persistence service.
///
/// Starts empty (like a freshly provisioned remote project) and healthy.
pub struct MockRemote {
    inner: Mutex<Inner>,
}

impl MockRemote {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(Inner {
                healthy: true,
                ..Inner::default()
            }),
        }
    }

    /// Makes the next `n` store operations fail with `Connectivity`.
    pub fn fail_next(&self, n: usize) {
        self.lock().fail_next = n;
    }

    /// Lets `skip` store operations through, then fails the following `n`
    /// with `Connectivity`.
    pub fn fail_after(&self, skip: usize, n: usize) {
        let mut inner = self.lock();
        inner.skip_next = skip;
        inner.fail_next = n;
    }

    /// Controls what the startup probe sees.
    pub fn set_healthy(&self, healthy: bool) {
        self.lock().healthy = healthy;
    }

    /// Number of messages held, across all conversations.
    pub fn message_count(&self) -> usize {
        self.lock().messages.len()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn checked(&self) -> Result<std::sync::MutexGuard<'_, Inner>, RpcraftError> {
        let mut inner = self.lock();
        if inner.skip_next > 0 {
            inner.skip_next -= 1;
            return Ok(inner);
        }
        if inner.fail_next > 0 {
            inner.fail_next -= 1;
            return Err(RpcraftError::Connectivity {
                message: "injected connectivity failure".into(),
                source: None,
            });
        }
        Ok(inner)
    }
}

impl Default for MockRemote {
    fn default() -> Self {
        Self::new()
    }
}

fn touch(inner: &mut Inner, conversation_id: &str, updated_at: &str) {
    if let Some(conv) = inner.conversations.get_mut(conversation_id) {
        conv.updated_at = updated_at.to_string();
    }
}

#[async_trait]
impl ConversationStore for MockRemote {
    fn name(&self) -> &str {
        "mock-remote"
    }

    async fn health_check(&self) -> Result<HealthStatus, RpcraftError> {
        if self.lock().healthy {
            Ok(HealthStatus::Healthy)
        } else {
            Ok(HealthStatus::Unhealthy("mock remote is down".into()))
        }
    }

    // --- System prompts ---

    async fn create_prompt(&self, prompt: &SystemPrompt) -> Result<(), RpcraftError> {
        let mut inner = self.checked()?;
        if inner.prompts.contains_key(&prompt.id) {
            return Err(RpcraftError::Validation(format!(
                "prompt id already exists: {}",
                prompt.id
            )));
        }
        inner.prompts.insert(prompt.id.clone(), prompt.clone());
        Ok(())
    }

    async fn list_prompts(&self) -> Result<Vec<SystemPrompt>, RpcraftError> {
        let inner = self.checked()?;
        let mut prompts: Vec<_> = inner.prompts.values().cloned().collect();
        prompts.sort_by(|a, b| (&a.created_at, &a.id).cmp(&(&b.created_at, &b.id)));
        Ok(prompts)
    }

    async fn update_prompt(&self, prompt: &SystemPrompt) -> Result<(), RpcraftError> {
        let mut inner = self.checked()?;
        if !inner.prompts.contains_key(&prompt.id) {
            return Err(RpcraftError::not_found("prompt", &prompt.id));
        }
        inner.prompts.insert(prompt.id.clone(), prompt.clone());
        Ok(())
    }

    async fn delete_prompt(&self, id: &str) -> Result<(), RpcraftError> {
        let mut inner = self.checked()?;
        inner
            .prompts
            .remove(id)
            .map(|_| ())
            .ok_or_else(|| RpcraftError::not_found("prompt", id))
    }

    // --- Conversations ---

    async fn create_conversation(&self, conversation: &Conversation) -> Result<(), RpcraftError> {
        let mut inner = self.checked()?;
        if !inner.prompts.contains_key(&conversation.system_prompt_id) {
            return Err(RpcraftError::not_found(
                "prompt",
                &conversation.system_prompt_id,
            ));
        }
        if inner.conversations.contains_key(&conversation.id) {
            return Err(RpcraftError::Validation(format!(
                "conversation id already exists: {}",
                conversation.id
            )));
        }
        inner
            .conversations
            .insert(conversation.id.clone(), conversation.clone());
        Ok(())
    }

    async fn list_conversations(
        &self,
        prompt_id: &str,
        include_archived: bool,
    ) -> Result<Vec<Conversation>, RpcraftError> {
        let inner = self.checked()?;
        let mut conversations: Vec<_> = inner
            .conversations
            .values()
            .filter(|c| c.system_prompt_id == prompt_id)
            .filter(|c| include_archived || !c.is_archived)
            .cloned()
            .collect();
        conversations.sort_by(|a, b| (&b.created_at, &a.id).cmp(&(&a.created_at, &b.id)));
        Ok(conversations)
    }

    async fn get_conversation(&self, id: &str) -> Result<Option<Conversation>, RpcraftError> {
        let inner = self.checked()?;
        Ok(inner.conversations.get(id).cloned())
    }

    async fn rename_conversation(
        &self,
        id: &str,
        name: &str,
        updated_at: &str,
    ) -> Result<(), RpcraftError> {
        let mut inner = self.checked()?;
        let conv = inner
            .conversations
            .get_mut(id)
            .ok_or_else(|| RpcraftError::not_found("conversation", id))?;
        conv.name = name.to_string();
        conv.updated_at = updated_at.to_string();
        Ok(())
    }

    async fn set_archived(
        &self,
        id: &str,
        archived: bool,
        updated_at: &str,
    ) -> Result<(), RpcraftError> {
        let mut inner = self.checked()?;
        let conv = inner
            .conversations
            .get_mut(id)
            .ok_or_else(|| RpcraftError::not_found("conversation", id))?;
        conv.is_archived = archived;
        conv.updated_at = updated_at.to_string();
        Ok(())
    }

    async fn delete_conversation(&self, id: &str) -> Result<(), RpcraftError> {
        let mut inner = self.checked()?;
        if inner.conversations.remove(id).is_none() {
            return Err(RpcraftError::not_found("conversation", id));
        }
        inner.messages.retain(|_, m| m.conversation_id != id);
        inner.checkpoints.retain(|_, k| k.conversation_id != id);
        Ok(())
    }

    // --- Messages ---

    async fn list_messages(&self, conversation_id: &str) -> Result<Vec<Message>, RpcraftError> {
        let inner = self.checked()?;
        if !inner.conversations.contains_key(conversation_id) {
            return Err(RpcraftError::not_found("conversation", conversation_id));
        }
        let mut messages: Vec<_> = inner
            .messages
            .values()
            .filter(|m| m.conversation_id == conversation_id)
            .cloned()
            .collect();
        messages.sort_by_key(|m| m.sequence);
        Ok(messages)
    }

    async fn find_message(&self, id: &str) -> Result<Option<Message>, RpcraftError> {
        let inner = self.checked()?;
        Ok(inner.messages.get(id).cloned())
    }

    async fn append_message(&self, message: &Message) -> Result<(), RpcraftError> {
        let mut inner = self.checked()?;
        if inner.messages.contains_key(&message.id) {
            return Err(RpcraftError::Validation(format!(
                "message id already exists: {}",
                message.id
            )));
        }
        if !inner.conversations.contains_key(&message.conversation_id) {
            return Err(RpcraftError::not_found(
                "conversation",
                &message.conversation_id,
            ));
        }
        if inner
            .messages
            .values()
            .any(|m| m.conversation_id == message.conversation_id && m.sequence == message.sequence)
        {
            return Err(RpcraftError::Validation(format!(
                "message sequence {} already taken in conversation {}",
                message.sequence, message.conversation_id
            )));
        }
        touch(&mut inner, &message.conversation_id, &message.created_at);
        inner.messages.insert(message.id.clone(), message.clone());
        Ok(())
    }

    async fn update_message(
        &self,
        id: &str,
        content: &str,
        updated_at: &str,
    ) -> Result<(), RpcraftError> {
        let mut inner = self.checked()?;
        let conversation_id = {
            let message = inner
                .messages
                .get_mut(id)
                .ok_or_else(|| RpcraftError::not_found("message", id))?;
            message.content = content.to_string();
            message.conversation_id.clone()
        };
        touch(&mut inner, &conversation_id, updated_at);
        Ok(())
    }

    async fn delete_message(&self, id: &str, updated_at: &str) -> Result<(), RpcraftError> {
        let mut inner = self.checked()?;
        let message = inner
            .messages
            .remove(id)
            .ok_or_else(|| RpcraftError::not_found("message", id))?;
        touch(&mut inner, &message.conversation_id, updated_at);
        Ok(())
    }

    async fn truncate_after(&self, id: &str, updated_at: &str) -> Result<(), RpcraftError> {
        let mut inner = self.checked()?;
        let (conversation_id, keep_through) = {
            let message = inner
                .messages
                .get(id)
                .ok_or_else(|| RpcraftError::not_found("message", id))?;
            (message.conversation_id.clone(), message.sequence)
        };
        inner
            .messages
            .retain(|_, m| m.conversation_id != conversation_id || m.sequence <= keep_through);
        touch(&mut inner, &conversation_id, updated_at);
        Ok(())
    }

    // --- Checkpoints ---

    async fn list_checkpoints(
        &self,
        conversation_id: &str,
    ) -> Result<Vec<Checkpoint>, RpcraftError> {
        let inner = self.checked()?;
        if !inner.conversations.contains_key(conversation_id) {
            return Err(RpcraftError::not_found("conversation", conversation_id));
        }
        let mut checkpoints: Vec<_> = inner
            .checkpoints
            .values()
            .filter(|k| k.conversation_id == conversation_id)
            .cloned()
            .collect();
        checkpoints.sort_by(|a, b| (&a.created_at, &a.id).cmp(&(&b.created_at, &b.id)));
        Ok(checkpoints)
    }

    async fn find_checkpoint(&self, id: &str) -> Result<Option<Checkpoint>, RpcraftError> {
        let inner = self.checked()?;
        Ok(inner.checkpoints.get(id).cloned())
    }

    async fn create_checkpoint(&self, checkpoint: &Checkpoint) -> Result<(), RpcraftError> {
        let mut inner = self.checked()?;
        if inner.checkpoints.contains_key(&checkpoint.id) {
            return Err(RpcraftError::Validation(format!(
                "checkpoint id already exists: {}",
                checkpoint.id
            )));
        }
        if !inner.conversations.contains_key(&checkpoint.conversation_id) {
            return Err(RpcraftError::not_found(
                "conversation",
                &checkpoint.conversation_id,
            ));
        }
        touch(&mut inner, &checkpoint.conversation_id, &checkpoint.created_at);
        inner
            .checkpoints
            .insert(checkpoint.id.clone(), checkpoint.clone());
        Ok(())
    }

    async fn restore_checkpoint(&self, id: &str, updated_at: &str) -> Result<(), RpcraftError> {
        let mut inner = self.checked()?;
        let checkpoint = inner
            .checkpoints
            .get(id)
            .cloned()
            .ok_or_else(|| RpcraftError::not_found("checkpoint", id))?;
        inner
            .messages
            .retain(|_, m| m.conversation_id != checkpoint.conversation_id);
        for message in &checkpoint.messages {
            inner.messages.insert(message.id.clone(), message.clone());
        }
        touch(&mut inner, &checkpoint.conversation_id, updated_at);
        Ok(())
    }

    async fn delete_checkpoint(&self, id: &str, updated_at: &str) -> Result<(), RpcraftError> {
        let mut inner = self.checked()?;
        let checkpoint = inner
            .checkpoints
            .remove(id)
            .ok_or_else(|| RpcraftError::not_found("checkpoint", id))?;
        touch(&mut inner, &checkpoint.conversation_id, updated_at);
        Ok(())
    }
}
