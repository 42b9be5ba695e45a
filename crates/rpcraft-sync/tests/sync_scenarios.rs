// SPDX-FileCopyrightText: 2026 RPCraft Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! End-to-end scenarios across the manager, controller, and both stores.

use std::sync::Arc;

use rpcraft_core::types::{Role, SystemPrompt, now_iso};
use rpcraft_core::{ConversationStore, RpcraftError, WriteOp};
use rpcraft_local::LocalStore;
use rpcraft_sync::{ConversationManager, SyncMode};
use rpcraft_test_utils::MockRemote;

fn offline_manager() -> (ConversationManager, Arc<LocalStore>) {
    let local = Arc::new(LocalStore::in_memory());
    let manager = ConversationManager::new(None, Arc::clone(&local));
    (manager, local)
}

fn online_manager() -> (ConversationManager, Arc<MockRemote>, Arc<LocalStore>) {
    let remote = Arc::new(MockRemote::new());
    let local = Arc::new(LocalStore::in_memory());
    let manager = ConversationManager::new(
        Some(Arc::clone(&remote) as Arc<dyn ConversationStore>),
        Arc::clone(&local),
    );
    (manager, remote, local)
}

#[tokio::test]
async fn greeting_checkpoint_restore_scenario() {
    let (manager, _local) = offline_manager();
    let notice = manager.initialize().await.unwrap();
    assert_eq!(notice.mode, SyncMode::Offline);

    let prompt = manager.ensure_active_prompt().await.unwrap();
    let conv = manager
        .create_conversation(&prompt.id, "Greeting")
        .await
        .unwrap();

    let m1 = manager.append(&conv.id, Role::User, "Hello!").await.unwrap();
    let m2 = manager
        .append(&conv.id, Role::Assistant, "Hi! How can I help?")
        .await
        .unwrap();
    assert_eq!(m1.sequence, 1);
    assert_eq!(m2.sequence, 2);

    let checkpoint = manager
        .create_checkpoint(&conv.id, "after greeting")
        .await
        .unwrap();

    manager
        .append(&conv.id, Role::User, "Tell me a joke.")
        .await
        .unwrap();
    manager.edit(&m1.id, "Hello there!").await.unwrap();

    // The snapshot is a deep copy; the later edit never reaches it.
    let stored = manager.checkpoints(&conv.id).await.unwrap();
    assert_eq!(stored.len(), 1);
    assert_eq!(stored[0].messages[0].content, "Hello!");

    manager.restore_checkpoint(&checkpoint.id).await.unwrap();
    let messages = manager.messages(&conv.id).await.unwrap();
    let contents: Vec<&str> = messages.iter().map(|m| m.content.as_str()).collect();
    assert_eq!(contents, ["Hello!", "Hi! How can I help?"]);

    // The checkpoint survives its own restore, and appending resumes
    // after the restored tail.
    assert_eq!(manager.checkpoints(&conv.id).await.unwrap().len(), 1);
    let m4 = manager
        .append(&conv.id, Role::User, "Never mind.")
        .await
        .unwrap();
    assert_eq!(m4.sequence, 3);
}

#[tokio::test]
async fn truncate_after_keeps_the_named_message() {
    let (manager, _local) = offline_manager();
    manager.initialize().await.unwrap();
    let prompt = manager.ensure_active_prompt().await.unwrap();
    let conv = manager
        .create_conversation(&prompt.id, "Truncation")
        .await
        .unwrap();

    let mut ids = Vec::new();
    for text in ["one", "two", "three", "four"] {
        ids.push(manager.append(&conv.id, Role::User, text).await.unwrap().id);
    }
    manager.truncate_after(&ids[1]).await.unwrap();

    let messages = manager.messages(&conv.id).await.unwrap();
    let contents: Vec<&str> = messages.iter().map(|m| m.content.as_str()).collect();
    assert_eq!(contents, ["one", "two"]);
}

#[tokio::test]
async fn connectivity_failure_flips_offline_and_reraises() {
    let (manager, remote, _local) = online_manager();
    let notice = manager.initialize().await.unwrap();
    assert_eq!(notice.mode, SyncMode::Online);

    let prompt = manager.ensure_active_prompt().await.unwrap();
    let conv = manager
        .create_conversation(&prompt.id, "Flaky")
        .await
        .unwrap();
    manager.append(&conv.id, Role::User, "still online").await.unwrap();

    remote.fail_next(1);
    let err = manager
        .append(&conv.id, Role::User, "dropped")
        .await
        .unwrap_err();
    assert!(err.is_connectivity(), "got {err}");
    assert_eq!(manager.mode(), SyncMode::Offline);

    // The prompt record was mirrored into the snapshot while online, so
    // offline work continues in new conversations and is journaled.
    let offline_conv = manager
        .create_conversation(&prompt.id, "Offline work")
        .await
        .unwrap();
    manager
        .append(&offline_conv.id, Role::User, "queued")
        .await
        .unwrap();
    assert!(manager.pending_writes().unwrap() >= 2);
}

#[tokio::test]
async fn prompts_created_online_are_usable_after_the_flip() {
    let (manager, remote, _local) = online_manager();
    manager.initialize().await.unwrap();
    let custom = manager
        .create_prompt("Reviewer", "You review Rust code.", None)
        .await
        .unwrap();

    remote.fail_next(1);
    let err = manager.prompts().await.unwrap_err();
    assert!(err.is_connectivity(), "got {err}");
    assert_eq!(manager.mode(), SyncMode::Offline);

    let prompts = manager.prompts().await.unwrap();
    assert!(prompts.iter().any(|p| p.id == custom.id));
    manager.set_active_prompt(&custom.id).await.unwrap();
    let conv = manager
        .create_conversation(&custom.id, "Offline review")
        .await
        .unwrap();
    assert_eq!(conv.system_prompt_id, custom.id);
}

#[tokio::test]
async fn migration_replays_offline_work_and_goes_online() {
    let (manager, remote, _local) = online_manager();
    remote.set_healthy(false);
    let notice = manager.initialize().await.unwrap();
    assert_eq!(notice.mode, SyncMode::Offline);

    let prompt = manager.ensure_active_prompt().await.unwrap();
    let conv = manager
        .create_conversation(&prompt.id, "Queued")
        .await
        .unwrap();
    manager.append(&conv.id, Role::User, "first").await.unwrap();
    manager
        .append(&conv.id, Role::Assistant, "second")
        .await
        .unwrap();
    manager.create_checkpoint(&conv.id, "snap").await.unwrap();
    let queued = manager.pending_writes().unwrap();
    assert_eq!(queued, 4);

    remote.set_healthy(true);
    let report = manager.migrate().await.unwrap();
    assert_eq!(report.replayed, queued);
    assert_eq!(report.remaining, 0);
    assert_eq!(report.skipped, 0);
    assert_eq!(report.mode, SyncMode::Online);
    assert_eq!(manager.mode(), SyncMode::Online);

    // The seeded prompt was copied over before the replay, so the
    // journaled conversation found its owner.
    let remote_prompts = remote.list_prompts().await.unwrap();
    assert_eq!(remote_prompts.len(), 1);
    assert_eq!(remote_prompts[0].id, prompt.id);
    assert_eq!(remote.message_count(), 2);
    assert_eq!(remote.list_checkpoints(&conv.id).await.unwrap().len(), 1);
}

#[tokio::test]
async fn migration_seeds_missing_prompts_into_a_non_empty_remote() {
    let (manager, remote, _local) = online_manager();
    let ts = now_iso();
    remote
        .create_prompt(&SystemPrompt {
            id: "p-existing".into(),
            name: "Existing".into(),
            content: "Already provisioned.".into(),
            description: None,
            created_at: ts.clone(),
            updated_at: ts,
        })
        .await
        .unwrap();

    remote.set_healthy(false);
    manager.initialize().await.unwrap();
    let prompt = manager.ensure_active_prompt().await.unwrap();
    let conv = manager
        .create_conversation(&prompt.id, "Queued")
        .await
        .unwrap();
    manager.append(&conv.id, Role::User, "kept").await.unwrap();

    remote.set_healthy(true);
    let report = manager.migrate().await.unwrap();
    assert_eq!(report.skipped, 0);
    assert_eq!(report.remaining, 0);
    assert_eq!(report.mode, SyncMode::Online);

    // The local-only prompt was copied over alongside the one the remote
    // already had; the replayed conversation found its owner.
    let prompts = remote.list_prompts().await.unwrap();
    assert_eq!(prompts.len(), 2);
    assert!(prompts.iter().any(|p| p.id == prompt.id));
    assert_eq!(remote.message_count(), 1);
}

#[tokio::test]
async fn interrupted_migration_keeps_the_journal() {
    let (manager, remote, _local) = online_manager();
    remote.set_healthy(false);
    manager.initialize().await.unwrap();

    let prompt = manager.ensure_active_prompt().await.unwrap();
    manager
        .create_conversation(&prompt.id, "Stuck")
        .await
        .unwrap();
    let queued = manager.pending_writes().unwrap();

    remote.set_healthy(true);
    remote.fail_next(1);
    let report = manager.migrate().await.unwrap();
    assert_eq!(report.replayed, 0);
    assert_eq!(report.remaining, queued);
    assert_eq!(report.mode, SyncMode::Offline);

    // Nothing was lost; a second attempt drains the queue.
    let report = manager.migrate().await.unwrap();
    assert_eq!(report.replayed, queued);
    assert_eq!(report.remaining, 0);
    assert_eq!(report.mode, SyncMode::Online);
}

#[tokio::test]
async fn permanently_rejected_entries_are_skipped() {
    let (manager, _remote, local) = online_manager();
    local
        .journal_append(WriteOp::DeleteConversation { id: "ghost".into() })
        .unwrap();

    let report = manager.migrate().await.unwrap();
    assert_eq!(report.replayed, 0);
    assert_eq!(report.skipped, 1);
    assert_eq!(report.remaining, 0);
    assert_eq!(report.mode, SyncMode::Online);
}

#[tokio::test]
async fn last_prompt_cannot_be_deleted() {
    let (manager, _local) = offline_manager();
    manager.initialize().await.unwrap();
    let prompt = manager.ensure_active_prompt().await.unwrap();

    let err = manager.delete_prompt(&prompt.id).await.unwrap_err();
    assert!(matches!(err, RpcraftError::Validation(_)));
    assert_eq!(manager.prompts().await.unwrap().len(), 1);
}

#[tokio::test]
async fn deleting_a_prompt_cascades_to_its_conversations() {
    let (manager, _local) = offline_manager();
    manager.initialize().await.unwrap();
    manager.ensure_active_prompt().await.unwrap();

    let doomed = manager
        .create_prompt("Doomed", "Short-lived instructions.", None)
        .await
        .unwrap();
    let conv = manager
        .create_conversation(&doomed.id, "Orphan-to-be")
        .await
        .unwrap();
    manager.set_active_prompt(&doomed.id).await.unwrap();
    manager
        .set_active_conversation(Some(&conv.id))
        .await
        .unwrap();

    manager.delete_prompt(&doomed.id).await.unwrap();

    assert!(manager.get_conversation(&conv.id).await.unwrap().is_none());
    assert!(manager.active_conversation_id().unwrap().is_none());
    // The pointer moved to the surviving prompt.
    let active = manager.active_prompt_id().unwrap().unwrap();
    assert_ne!(active, doomed.id);
}

#[tokio::test]
async fn duplicate_copies_messages_but_not_checkpoints() {
    let (manager, _local) = offline_manager();
    manager.initialize().await.unwrap();
    let prompt = manager.ensure_active_prompt().await.unwrap();
    let conv = manager
        .create_conversation(&prompt.id, "Original")
        .await
        .unwrap();
    manager.append(&conv.id, Role::User, "hello").await.unwrap();
    manager
        .append(&conv.id, Role::Assistant, "hi")
        .await
        .unwrap();
    manager.create_checkpoint(&conv.id, "snap").await.unwrap();

    let copy = manager.duplicate_conversation(&conv.id).await.unwrap();
    assert_eq!(copy.name, "Original (copy)");
    assert_eq!(copy.system_prompt_id, prompt.id);

    let originals = manager.messages(&conv.id).await.unwrap();
    let copies = manager.messages(&copy.id).await.unwrap();
    assert_eq!(copies.len(), originals.len());
    for (orig, dup) in originals.iter().zip(&copies) {
        assert_ne!(orig.id, dup.id);
        assert_eq!(orig.sequence, dup.sequence);
        assert_eq!(orig.content, dup.content);
        assert_eq!(orig.role, dup.role);
    }
    assert!(manager.checkpoints(&copy.id).await.unwrap().is_empty());
}

#[tokio::test]
async fn failed_duplication_reraises_and_journals_nothing() {
    let (manager, remote, _local) = online_manager();
    manager.initialize().await.unwrap();
    let prompt = manager.ensure_active_prompt().await.unwrap();
    let conv = manager
        .create_conversation(&prompt.id, "Source")
        .await
        .unwrap();
    manager.append(&conv.id, Role::User, "one").await.unwrap();
    manager
        .append(&conv.id, Role::Assistant, "two")
        .await
        .unwrap();

    // Let the lookup, the copy's create, and the first copied message
    // through, then cut the connection on the second.
    remote.fail_after(3, 1);
    let err = manager.duplicate_conversation(&conv.id).await.unwrap_err();
    assert!(err.is_connectivity(), "got {err}");
    assert_eq!(manager.mode(), SyncMode::Offline);

    // The source is intact on the remote and nothing was journaled.
    assert_eq!(remote.list_messages(&conv.id).await.unwrap().len(), 2);
    assert_eq!(manager.pending_writes().unwrap(), 0);
}

#[tokio::test]
async fn empty_names_and_empty_checkpoints_are_rejected() {
    let (manager, _local) = offline_manager();
    manager.initialize().await.unwrap();
    let prompt = manager.ensure_active_prompt().await.unwrap();

    let err = manager
        .create_conversation(&prompt.id, "   ")
        .await
        .unwrap_err();
    assert!(matches!(err, RpcraftError::Validation(_)));

    let conv = manager
        .create_conversation(&prompt.id, "Empty")
        .await
        .unwrap();
    let err = manager.create_checkpoint(&conv.id, "snap").await.unwrap_err();
    assert!(matches!(err, RpcraftError::Validation(_)));
}

#[tokio::test]
async fn deleting_the_active_conversation_clears_the_pointer() {
    let (manager, _local) = offline_manager();
    manager.initialize().await.unwrap();
    let prompt = manager.ensure_active_prompt().await.unwrap();
    let conv = manager
        .create_conversation(&prompt.id, "Transient")
        .await
        .unwrap();
    manager
        .set_active_conversation(Some(&conv.id))
        .await
        .unwrap();

    manager.delete_conversation(&conv.id).await.unwrap();
    assert!(manager.active_conversation_id().unwrap().is_none());
    let err = manager.messages(&conv.id).await.unwrap_err();
    assert!(matches!(err, RpcraftError::NotFound { .. }));
}

#[tokio::test]
async fn offline_work_survives_a_restart() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("state.json");

    let conv_id;
    {
        let local = Arc::new(LocalStore::open(&path).unwrap());
        let manager = ConversationManager::new(None, local);
        manager.initialize().await.unwrap();
        let prompt = manager.ensure_active_prompt().await.unwrap();
        let conv = manager
            .create_conversation(&prompt.id, "Persistent")
            .await
            .unwrap();
        manager.append(&conv.id, Role::User, "saved").await.unwrap();
        conv_id = conv.id;
    }

    let local = Arc::new(LocalStore::open(&path).unwrap());
    let manager = ConversationManager::new(None, local);
    manager.initialize().await.unwrap();
    let messages = manager.messages(&conv_id).await.unwrap();
    assert_eq!(messages.len(), 1);
    assert_eq!(messages[0].content, "saved");
    assert_eq!(manager.pending_writes().unwrap(), 2);
}
