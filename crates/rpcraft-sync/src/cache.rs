// SPDX-FileCopyrightText: 2026 RPCraft Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! In-process cache of conversation message lists.
//!
//! Keyed by conversation id. The manager consults it before hitting the
//! active store and writes through to it only after a store call succeeds,
//! so a failed write never leaves a stale entry behind. The whole cache is
//! dropped on a mode transition or an active-prompt change.

use std::collections::HashMap;
use std::sync::Mutex;

use rpcraft_core::types::Message;

/// Message lists by conversation id.
#[derive(Default)]
pub struct MessageCache {
    entries: Mutex<HashMap<String, Vec<Message>>>,
}

impl MessageCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cached messages for a conversation, if present.
    pub fn get(&self, conversation_id: &str) -> Option<Vec<Message>> {
        self.lock().get(conversation_id).cloned()
    }

    /// Stores (or replaces) the message list for a conversation.
    pub fn insert(&self, conversation_id: &str, messages: Vec<Message>) {
        self.lock().insert(conversation_id.to_string(), messages);
    }

    /// Applies `f` to the cached list, if one exists. A miss is a no-op;
    /// the next read repopulates from the store.
    pub fn update(&self, conversation_id: &str, f: impl FnOnce(&mut Vec<Message>)) {
        if let Some(entry) = self.lock().get_mut(conversation_id) {
            f(entry);
        }
    }

    /// Drops one conversation's entry.
    pub fn remove(&self, conversation_id: &str) {
        self.lock().remove(conversation_id);
    }

    /// Drops every entry.
    pub fn clear(&self) {
        self.lock().clear();
    }

    pub fn contains(&self, conversation_id: &str) -> bool {
        self.lock().contains_key(conversation_id)
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, Vec<Message>>> {
        self.entries.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rpcraft_core::types::{Role, now_iso};

    fn message(id: &str, sequence: i64) -> Message {
        Message {
            id: id.into(),
            conversation_id: "c1".into(),
            role: Role::User,
            content: "hi".into(),
            sequence,
            created_at: now_iso(),
        }
    }

    #[test]
    fn insert_then_get_round_trips() {
        let cache = MessageCache::new();
        assert!(cache.get("c1").is_none());
        cache.insert("c1", vec![message("m1", 1)]);
        assert_eq!(cache.get("c1").unwrap().len(), 1);
    }

    #[test]
    fn update_is_a_no_op_on_a_miss() {
        let cache = MessageCache::new();
        cache.update("c1", |list| list.push(message("m1", 1)));
        assert!(!cache.contains("c1"));

        cache.insert("c1", Vec::new());
        cache.update("c1", |list| list.push(message("m1", 1)));
        assert_eq!(cache.get("c1").unwrap().len(), 1);
    }

    #[test]
    fn remove_and_clear_drop_entries() {
        let cache = MessageCache::new();
        cache.insert("c1", Vec::new());
        cache.insert("c2", Vec::new());
        cache.remove("c1");
        assert!(!cache.contains("c1"));
        assert!(cache.contains("c2"));
        cache.clear();
        assert!(!cache.contains("c2"));
    }
}
