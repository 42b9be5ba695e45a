// SPDX-FileCopyrightText: 2026 RPCraft Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! On-disk layout of the offline snapshot.
//!
//! The snapshot is one JSON document holding a small number of named
//! key-value entries, all namespaced by the fixed `rpcraft.` prefix. Each
//! entry is parsed independently and tolerantly: a missing or malformed
//! entry falls back to its default instead of failing the whole load, so
//! the application is always usable on first run or after corruption.
//!
//! The document carries an explicit schema version; a migration step runs
//! once at load time before any entry is read.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};
use tracing::warn;

use rpcraft_core::types::{Checkpoint, Conversation, Message, SystemPrompt, new_id, now_iso};
use rpcraft_core::WriteOp;

/// Current snapshot document version.
pub const SCHEMA_VERSION: u64 = 1;

const KEY_VERSION: &str = "rpcraft.schema_version";
const KEY_PROMPTS: &str = "rpcraft.prompts";
const KEY_CONVERSATIONS: &str = "rpcraft.conversations";
const KEY_ACTIVE_CONVERSATION: &str = "rpcraft.active_conversation";
const KEY_ACTIVE_PROMPT: &str = "rpcraft.active_prompt";
const KEY_JOURNAL: &str = "rpcraft.journal";

/// A conversation as persisted offline: metadata with its owned messages
/// and checkpoints nested inline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredConversation {
    #[serde(flatten)]
    pub meta: Conversation,
    #[serde(default)]
    pub messages: Vec<Message>,
    #[serde(default)]
    pub checkpoints: Vec<Checkpoint>,
}

/// The in-memory image of the whole offline store.
#[derive(Debug, Clone, Default)]
pub struct Snapshot {
    pub prompts: Vec<SystemPrompt>,
    pub conversations: Vec<StoredConversation>,
    pub active_conversation: Option<String>,
    pub active_prompt: Option<String>,
    pub journal: Vec<WriteOp>,
}

impl Snapshot {
    /// An empty snapshot seeded with the default system prompt, used on
    /// first run and as the corruption fallback.
    pub fn seeded() -> Self {
        let prompt = default_prompt();
        let active = prompt.id.clone();
        Self {
            prompts: vec![prompt],
            active_prompt: Some(active),
            ..Self::default()
        }
    }

    /// Serializes the snapshot into the namespaced key-value document.
    pub fn to_document(&self) -> Value {
        json!({
            KEY_VERSION: SCHEMA_VERSION,
            KEY_PROMPTS: self.prompts,
            KEY_CONVERSATIONS: self.conversations,
            KEY_ACTIVE_CONVERSATION: self.active_conversation,
            KEY_ACTIVE_PROMPT: self.active_prompt,
            KEY_JOURNAL: self.journal,
        })
    }

    /// Parses a document, applying migration and per-entry fallbacks.
    pub fn from_document(doc: &Value) -> Self {
        let Some(entries) = doc.as_object() else {
            warn!("snapshot document is not an object, starting fresh");
            return Self::seeded();
        };
        let entries = match migrate(entries) {
            Some(entries) => entries,
            None => return Self::seeded(),
        };

        let mut snapshot = Self {
            prompts: read_entry(&entries, KEY_PROMPTS),
            conversations: read_entry(&entries, KEY_CONVERSATIONS),
            active_conversation: read_entry(&entries, KEY_ACTIVE_CONVERSATION),
            active_prompt: read_entry(&entries, KEY_ACTIVE_PROMPT),
            journal: read_entry(&entries, KEY_JOURNAL),
        };
        snapshot.repair();
        snapshot
    }

    /// Restores the invariants a partial fallback may have broken: at
    /// least one prompt exists and the active pointers reference records
    /// that are present.
    fn repair(&mut self) {
        if self.prompts.is_empty() {
            let prompt = default_prompt();
            self.active_prompt = Some(prompt.id.clone());
            self.prompts.push(prompt);
        }
        let prompt_exists = |id: &String| self.prompts.iter().any(|p| &p.id == id);
        if !self.active_prompt.as_ref().is_some_and(prompt_exists) {
            self.active_prompt = self.prompts.first().map(|p| p.id.clone());
        }
        let conv_exists = |id: &String| self.conversations.iter().any(|c| &c.meta.id == id);
        if !self.active_conversation.as_ref().is_some_and(conv_exists) {
            self.active_conversation = None;
        }
    }
}

/// Applies the load-time migration. Returns `None` when the document
/// cannot be carried forward (a version newer than this build understands).
fn migrate(entries: &Map<String, Value>) -> Option<Map<String, Value>> {
    let version = entries.get(KEY_VERSION).and_then(Value::as_u64);
    match version {
        Some(SCHEMA_VERSION) => Some(entries.clone()),
        Some(newer) if newer > SCHEMA_VERSION => {
            warn!(found = newer, supported = SCHEMA_VERSION, "snapshot schema is newer than this build, starting fresh");
            None
        }
        // Version 0 documents predate the version key entirely; their
        // entry shapes are identical to version 1.
        Some(_) | None => Some(entries.clone()),
    }
}

/// Reads one named entry, falling back to the default on a missing or
/// malformed value.
fn read_entry<T: Default + for<'de> Deserialize<'de>>(
    entries: &Map<String, Value>,
    key: &str,
) -> T {
    match entries.get(key) {
        None => T::default(),
        Some(value) => match serde_json::from_value(value.clone()) {
            Ok(parsed) => parsed,
            Err(err) => {
                warn!(key, %err, "malformed snapshot entry, using default");
                T::default()
            }
        },
    }
}

/// The system prompt seeded into every fresh or repaired snapshot.
pub fn default_prompt() -> SystemPrompt {
    let ts = now_iso();
    SystemPrompt {
        id: new_id(),
        name: "Default".to_string(),
        content: "You are a helpful assistant.".to_string(),
        description: Some("Seeded default prompt".to_string()),
        created_at: ts.clone(),
        updated_at: ts,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rpcraft_core::types::Role;

    fn sample_snapshot() -> Snapshot {
        let mut snapshot = Snapshot::seeded();
        let prompt_id = snapshot.prompts[0].id.clone();
        let ts = now_iso();
        let conv = Conversation {
            id: "c1".into(),
            name: "Demo".into(),
            system_prompt_id: prompt_id,
            created_at: ts.clone(),
            updated_at: ts.clone(),
            is_archived: false,
        };
        snapshot.conversations.push(StoredConversation {
            meta: conv,
            messages: vec![Message {
                id: "m1".into(),
                conversation_id: "c1".into(),
                role: Role::User,
                content: "hello".into(),
                sequence: 1,
                created_at: ts,
            }],
            checkpoints: vec![],
        });
        snapshot.active_conversation = Some("c1".into());
        snapshot
    }

    #[test]
    fn document_round_trips() {
        let snapshot = sample_snapshot();
        let doc = snapshot.to_document();
        let parsed = Snapshot::from_document(&doc);
        assert_eq!(parsed.prompts, snapshot.prompts);
        assert_eq!(parsed.conversations.len(), 1);
        assert_eq!(parsed.conversations[0].messages[0].content, "hello");
        assert_eq!(parsed.active_conversation.as_deref(), Some("c1"));
    }

    #[test]
    fn non_object_document_falls_back_to_seed() {
        let parsed = Snapshot::from_document(&json!("garbage"));
        assert_eq!(parsed.prompts.len(), 1);
        assert_eq!(parsed.prompts[0].name, "Default");
        assert!(parsed.conversations.is_empty());
    }

    #[test]
    fn malformed_entry_falls_back_per_key() {
        let mut doc = sample_snapshot().to_document();
        doc[KEY_PROMPTS] = json!(42);
        let parsed = Snapshot::from_document(&doc);
        // Prompts fell back and were re-seeded, conversations survived.
        assert_eq!(parsed.prompts.len(), 1);
        assert_eq!(parsed.prompts[0].name, "Default");
        assert_eq!(parsed.conversations.len(), 1);
    }

    #[test]
    fn future_schema_version_starts_fresh() {
        let mut doc = sample_snapshot().to_document();
        doc[KEY_VERSION] = json!(SCHEMA_VERSION + 1);
        let parsed = Snapshot::from_document(&doc);
        assert!(parsed.conversations.is_empty());
        assert_eq!(parsed.prompts.len(), 1);
    }

    #[test]
    fn missing_version_key_is_readable() {
        let mut doc = sample_snapshot().to_document();
        doc.as_object_mut().unwrap().remove(KEY_VERSION);
        let parsed = Snapshot::from_document(&doc);
        assert_eq!(parsed.conversations.len(), 1);
    }

    #[test]
    fn dangling_active_pointers_are_cleared() {
        let mut snapshot = sample_snapshot();
        snapshot.active_conversation = Some("no-such-conversation".into());
        snapshot.active_prompt = Some("no-such-prompt".into());
        let parsed = Snapshot::from_document(&snapshot.to_document());
        assert!(parsed.active_conversation.is_none());
        assert_eq!(
            parsed.active_prompt.as_deref(),
            Some(parsed.prompts[0].id.as_str())
        );
    }
}
