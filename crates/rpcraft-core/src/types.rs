// SPDX-FileCopyrightText: 2026 RPCraft Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Record types shared across both persistence adapter variants.
//!
//! Identity and timestamps are always generated by the caller (the
//! conversation manager), never inside an adapter, so both variants
//! receive identical records for identical inputs.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Who authored a message.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

/// A reusable instruction template that configures assistant behavior for
/// the conversations referencing it. At least one must exist at all times.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SystemPrompt {
    pub id: String,
    pub name: String,
    pub content: String,
    #[serde(default)]
    pub description: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

/// Conversation metadata. Messages and checkpoints are owned rows fetched
/// by conversation id; deleting a conversation cascades to both.
///
/// `updated_at` is refreshed on every mutation to the conversation's
/// messages, metadata, or checkpoints.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Conversation {
    pub id: String,
    pub name: String,
    pub system_prompt_id: String,
    pub created_at: String,
    pub updated_at: String,
    #[serde(default)]
    pub is_archived: bool,
}

/// One message in a conversation's ordered thread.
///
/// Identity is immutable; only `content` may be edited in place. Ordering
/// within a conversation is strictly by `sequence`, assigned monotonically
/// at append time and never reassigned (deleting a message shifts positions
/// but never renumbers the survivors).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub id: String,
    pub conversation_id: String,
    pub role: Role,
    pub content: String,
    pub sequence: i64,
    pub created_at: String,
}

/// A named, point-in-time snapshot of a conversation's message list.
///
/// `messages` is a deep copy taken at creation and is immutable afterward;
/// mutating the live conversation never alters an existing checkpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Checkpoint {
    pub id: String,
    pub conversation_id: String,
    pub name: String,
    pub messages: Vec<Message>,
    pub created_at: String,
}

/// Health reported by a store's connectivity probe.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HealthStatus {
    /// Store is fully operational.
    Healthy,
    /// Store is reachable but reporting issues.
    Degraded(String),
    /// Store is not reachable.
    Unhealthy(String),
}

/// Generate a fresh record id.
pub fn new_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

/// Current UTC time as an ISO-8601 string with millisecond precision,
/// e.g. `2026-01-01T00:00:00.000Z`.
pub fn now_iso() -> String {
    chrono::Utc::now()
        .format("%Y-%m-%dT%H:%M:%S%.3fZ")
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn role_round_trips_through_display_and_fromstr() {
        for role in [Role::User, Role::Assistant] {
            let s = role.to_string();
            assert_eq!(Role::from_str(&s).unwrap(), role);
        }
        assert_eq!(Role::User.to_string(), "user");
    }

    #[test]
    fn role_serializes_lowercase() {
        let json = serde_json::to_string(&Role::Assistant).unwrap();
        assert_eq!(json, "\"assistant\"");
        let parsed: Role = serde_json::from_str("\"user\"").unwrap();
        assert_eq!(parsed, Role::User);
    }

    #[test]
    fn conversation_deserializes_without_archived_flag() {
        // Older persisted records may predate the archival flag.
        let json = r#"{
            "id": "c1",
            "name": "Demo",
            "system_prompt_id": "p1",
            "created_at": "2026-01-01T00:00:00.000Z",
            "updated_at": "2026-01-01T00:00:00.000Z"
        }"#;
        let conv: Conversation = serde_json::from_str(json).unwrap();
        assert!(!conv.is_archived);
    }

    #[test]
    fn checkpoint_snapshot_is_an_owned_copy() {
        let mut live = vec![Message {
            id: "m1".into(),
            conversation_id: "c1".into(),
            role: Role::User,
            content: "hello".into(),
            sequence: 1,
            created_at: now_iso(),
        }];
        let checkpoint = Checkpoint {
            id: "k1".into(),
            conversation_id: "c1".into(),
            name: "after greeting".into(),
            messages: live.clone(),
            created_at: now_iso(),
        };
        live[0].content = "mutated".into();
        assert_eq!(checkpoint.messages[0].content, "hello");
    }

    #[test]
    fn now_iso_matches_expected_shape() {
        let ts = now_iso();
        assert_eq!(ts.len(), 24, "got {ts}");
        assert!(ts.ends_with('Z'));
        assert_eq!(&ts[10..11], "T");
    }
}
