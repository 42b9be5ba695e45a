// SPDX-FileCopyrightText: 2026 RPCraft Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The sync controller state machine.
//!
//! Owns the current [`SyncMode`] and performs the only three transitions
//! that exist: the startup probe (`initialize`), the reaction to a remote
//! connectivity failure (`note_connectivity_failure`), and the explicit
//! user-triggered journal replay (`migrate`). Nothing here runs in the
//! background; an unreachable remote stays unreachable until the user asks
//! to migrate.

use std::collections::HashSet;
use std::sync::{Arc, Mutex};

use tracing::{debug, info, warn};

use rpcraft_core::types::HealthStatus;
use rpcraft_core::{ConversationStore, RpcraftError, WriteOp};
use rpcraft_local::LocalStore;

use crate::mode::SyncMode;

/// Outcome of the startup probe, surfaced to the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncNotice {
    pub mode: SyncMode,
    /// Human-readable reason when the probe did not land on a healthy
    /// remote.
    pub detail: Option<String>,
    /// Journal entries waiting for a migration.
    pub pending_writes: usize,
}

/// Outcome of one `migrate` run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MigrationReport {
    /// Entries replayed against the remote and removed from the journal.
    pub replayed: usize,
    /// Entries dropped because the remote rejected them permanently
    /// (validation or missing-record errors, not connectivity).
    pub skipped: usize,
    /// Entries still queued after this run.
    pub remaining: usize,
    /// Mode after the run. `Online` only when the journal fully drained.
    pub mode: SyncMode,
}

/// Single writer of the sync mode.
pub struct SyncController {
    remote: Option<Arc<dyn ConversationStore>>,
    local: Arc<LocalStore>,
    mode: Mutex<SyncMode>,
}

impl SyncController {
    pub fn new(remote: Option<Arc<dyn ConversationStore>>, local: Arc<LocalStore>) -> Self {
        Self {
            remote,
            local,
            mode: Mutex::new(SyncMode::Uninitialized),
        }
    }

    pub fn mode(&self) -> SyncMode {
        *self.mode.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn set_mode(&self, mode: SyncMode) {
        *self.mode.lock().unwrap_or_else(|e| e.into_inner()) = mode;
    }

    pub(crate) fn remote_store(&self) -> Option<&Arc<dyn ConversationStore>> {
        self.remote.as_ref()
    }

    /// Probes the remote once and settles on the initial mode.
    pub async fn initialize(&self) -> Result<SyncNotice, RpcraftError> {
        let pending_writes = self.local.journal_len()?;
        let Some(remote) = &self.remote else {
            self.set_mode(SyncMode::Offline);
            info!("no remote store configured, starting offline");
            return Ok(SyncNotice {
                mode: SyncMode::Offline,
                detail: Some("no remote store configured".into()),
                pending_writes,
            });
        };

        let (mode, detail) = match remote.health_check().await {
            Ok(HealthStatus::Healthy) => (SyncMode::Online, None),
            Ok(HealthStatus::Degraded(reason)) => {
                warn!(%reason, "remote is degraded, staying online");
                (SyncMode::Online, Some(reason))
            }
            Ok(HealthStatus::Unhealthy(reason)) => {
                warn!(%reason, "remote is unreachable, starting offline");
                (SyncMode::Offline, Some(reason))
            }
            Err(err) => {
                warn!(%err, "remote probe failed, starting offline");
                (SyncMode::Offline, Some(err.to_string()))
            }
        };
        self.set_mode(mode);
        debug!(%mode, pending_writes, "sync controller initialized");
        Ok(SyncNotice {
            mode,
            detail,
            pending_writes,
        })
    }

    /// Health of the remote store. Never mutates data or changes mode.
    pub async fn probe(&self) -> Result<HealthStatus, RpcraftError> {
        match &self.remote {
            Some(remote) => remote.health_check().await,
            None => Ok(HealthStatus::Unhealthy("no remote store configured".into())),
        }
    }

    /// Flips to offline after a remote call failed with `Connectivity`.
    /// The failed operation's error is re-raised by the caller; this only
    /// records the transition.
    pub fn note_connectivity_failure(&self, err: &RpcraftError) {
        if self.mode() == SyncMode::Online {
            warn!(%err, "remote call failed, switching to offline mode");
            self.set_mode(SyncMode::Offline);
        }
    }

    /// Replays the persisted journal against the remote store, oldest
    /// first.
    ///
    /// Each entry is removed only after its remote call returns, so a crash
    /// mid-replay re-sends at most one entry (at-least-once). A
    /// connectivity failure stops the run and keeps the remainder queued;
    /// a permanent rejection drops the entry with a warning. The mode flips
    /// to `Online` only when the journal fully drains.
    pub async fn migrate(&self) -> Result<MigrationReport, RpcraftError> {
        let Some(remote) = &self.remote else {
            return Err(RpcraftError::Config(
                "no remote store configured, nothing to migrate to".into(),
            ));
        };

        let mut replayed = 0;
        let mut skipped = 0;
        let mut interrupted = false;

        if let Err(err) = self.seed_remote_prompts(remote.as_ref()).await {
            if !err.is_connectivity() {
                return Err(err);
            }
            warn!(%err, "remote unreachable, keeping journal for a later attempt");
            interrupted = true;
        }

        while !interrupted {
            let Some(op) = self.local.journal_first()? else {
                break;
            };
            match op.apply(remote.as_ref()).await {
                Ok(()) => {
                    self.local.journal_pop_front()?;
                    replayed += 1;
                    debug!(op = op.label(), "replayed journal entry");
                }
                Err(err) if err.is_connectivity() => {
                    warn!(op = op.label(), %err, "replay interrupted, keeping remaining entries");
                    interrupted = true;
                }
                Err(err) => {
                    warn!(op = op.label(), %err, "dropping journal entry the remote rejected");
                    self.local.journal_pop_front()?;
                    skipped += 1;
                }
            }
        }

        let remaining = self.local.journal_len()?;
        // An interrupted run proved the remote unreachable; an empty
        // journal alone is not a successful reconnect.
        if remaining == 0 && !interrupted {
            self.set_mode(SyncMode::Online);
            info!(replayed, skipped, "migration complete, back online");
        }
        Ok(MigrationReport {
            replayed,
            skipped,
            remaining,
            mode: self.mode(),
        })
    }

    /// Copies prompts that exist only in the local snapshot to the remote
    /// before the replay, so journaled records referencing them find
    /// their owner even when the remote already holds prompts from
    /// earlier sessions. Prompts whose creation is itself journaled are
    /// left to the replay.
    async fn seed_remote_prompts(
        &self,
        remote: &dyn ConversationStore,
    ) -> Result<(), RpcraftError> {
        let remote_ids: HashSet<String> = remote
            .list_prompts()
            .await?
            .into_iter()
            .map(|p| p.id)
            .collect();
        let journaled: HashSet<String> = self
            .local
            .journal_entries()?
            .into_iter()
            .filter_map(|op| match op {
                WriteOp::CreatePrompt { prompt } => Some(prompt.id),
                _ => None,
            })
            .collect();
        for prompt in self.local.list_prompts().await? {
            if remote_ids.contains(&prompt.id) || journaled.contains(&prompt.id) {
                continue;
            }
            remote.create_prompt(&prompt).await?;
            debug!(id = %prompt.id, "seeded system prompt on remote");
        }
        Ok(())
    }
}
