// SPDX-FileCopyrightText: 2026 RPCraft Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP client for the remote persistence service.
//!
//! Every store operation maps to one named remote procedure invoked as
//! `POST {base_url}/rpc/{name}` with a JSON parameter object. There is no
//! retry loop here: the sync controller owns the retry/fallback decision,
//! so a transport failure surfaces immediately as
//! [`RpcraftError::Connectivity`].

use std::time::Duration;

use async_trait::async_trait;
use reqwest::StatusCode;
use reqwest::header::{HeaderMap, HeaderValue};
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::debug;

use rpcraft_config::model::RemoteConfig;
use rpcraft_core::types::{
    Checkpoint, Conversation, HealthStatus, Message, SystemPrompt,
};
use rpcraft_core::{ConversationStore, RpcraftError};

/// Error body returned by the remote procedures on failure.
#[derive(Debug, Deserialize)]
struct ApiError {
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    entity: Option<String>,
    #[serde(default)]
    id: Option<String>,
}

/// Remote RPC-backed store.
///
/// Manages the authenticated connection pool and a finite per-request
/// timeout so an unreachable service can never suspend a caller
/// indefinitely.
#[derive(Debug, Clone)]
pub struct RemoteStore {
    client: reqwest::Client,
    base_url: String,
}

impl RemoteStore {
    /// Creates a client from the remote configuration section.
    ///
    /// Fails with `Config` when `base_url` or `api_key` is missing.
    pub fn new(config: &RemoteConfig) -> Result<Self, RpcraftError> {
        let base_url = config
            .base_url
            .clone()
            .ok_or_else(|| RpcraftError::Config("remote.base_url is not set".into()))?;
        let api_key = config
            .api_key
            .clone()
            .ok_or_else(|| RpcraftError::Config("remote.api_key is not set".into()))?;

        let mut headers = HeaderMap::new();
        headers.insert(
            "apikey",
            HeaderValue::from_str(&api_key).map_err(|e| {
                RpcraftError::Config(format!("invalid api key header value: {e}"))
            })?,
        );
        headers.insert(
            "authorization",
            HeaderValue::from_str(&format!("Bearer {api_key}")).map_err(|e| {
                RpcraftError::Config(format!("invalid api key header value: {e}"))
            })?,
        );
        headers.insert("content-type", HeaderValue::from_static("application/json"));

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| RpcraftError::Internal(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Invokes a named procedure and parses the JSON result.
    async fn rpc<T: for<'de> Deserialize<'de>>(
        &self,
        procedure: &str,
        params: Value,
    ) -> Result<T, RpcraftError> {
        let body = self.call(procedure, params).await?;
        serde_json::from_str(&body).map_err(|e| {
            RpcraftError::Internal(format!("unexpected response from {procedure}: {e}"))
        })
    }

    /// Invokes a named procedure and discards the result body.
    async fn rpc_unit(&self, procedure: &str, params: Value) -> Result<(), RpcraftError> {
        self.call(procedure, params).await.map(|_| ())
    }

    async fn call(&self, procedure: &str, params: Value) -> Result<String, RpcraftError> {
        let url = format!("{}/rpc/{}", self.base_url, procedure);
        let response = self
            .client
            .post(&url)
            .json(&params)
            .send()
            .await
            .map_err(|e| RpcraftError::Connectivity {
                message: format!("{procedure}: {e}"),
                source: Some(Box::new(e)),
            })?;

        let status = response.status();
        debug!(procedure, status = %status, "remote procedure returned");

        let body = response
            .text()
            .await
            .map_err(|e| RpcraftError::Connectivity {
                message: format!("{procedure}: failed to read response body: {e}"),
                source: Some(Box::new(e)),
            })?;

        if status.is_success() {
            return Ok(body);
        }
        Err(map_failure(procedure, status, &body))
    }
}

/// Maps a non-success procedure response onto the error taxonomy.
fn map_failure(procedure: &str, status: StatusCode, body: &str) -> RpcraftError {
    let api_error: ApiError = serde_json::from_str(body).unwrap_or(ApiError {
        message: None,
        entity: None,
        id: None,
    });
    let message = api_error
        .message
        .unwrap_or_else(|| format!("{procedure} returned {status}"));

    match status {
        StatusCode::BAD_REQUEST | StatusCode::UNPROCESSABLE_ENTITY => {
            RpcraftError::Validation(message)
        }
        StatusCode::NOT_FOUND => RpcraftError::NotFound {
            entity: known_entity(api_error.entity.as_deref()),
            id: api_error.id.unwrap_or_default(),
        },
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
            RpcraftError::Config(format!("remote rejected credentials: {message}"))
        }
        // 5xx and everything else: the operation's outcome is unknown
        // server-side, so treat it as a connectivity failure.
        _ => RpcraftError::Connectivity {
            message,
            source: None,
        },
    }
}

fn known_entity(entity: Option<&str>) -> &'static str {
    match entity {
        Some("prompt") => "prompt",
        Some("conversation") => "conversation",
        Some("message") => "message",
        Some("checkpoint") => "checkpoint",
        _ => "record",
    }
}

#[async_trait]
impl ConversationStore for RemoteStore {
    fn name(&self) -> &str {
        "remote"
    }

    async fn health_check(&self) -> Result<HealthStatus, RpcraftError> {
        match self.client.get(format!("{}/", self.base_url)).send().await {
            Ok(response) if response.status().is_success() => Ok(HealthStatus::Healthy),
            Ok(response) => Ok(HealthStatus::Unhealthy(format!(
                "health endpoint returned {}",
                response.status()
            ))),
            Err(e) => Ok(HealthStatus::Unhealthy(e.to_string())),
        }
    }

    // --- System prompts ---

    async fn create_prompt(&self, prompt: &SystemPrompt) -> Result<(), RpcraftError> {
        self.rpc_unit("create_prompt", json!({ "prompt": prompt })).await
    }

    async fn list_prompts(&self) -> Result<Vec<SystemPrompt>, RpcraftError> {
        self.rpc("list_prompts", json!({})).await
    }

    async fn update_prompt(&self, prompt: &SystemPrompt) -> Result<(), RpcraftError> {
        self.rpc_unit("update_prompt", json!({ "prompt": prompt })).await
    }

    async fn delete_prompt(&self, id: &str) -> Result<(), RpcraftError> {
        self.rpc_unit("delete_prompt", json!({ "id": id })).await
    }

    // --- Conversations ---

    async fn create_conversation(&self, conversation: &Conversation) -> Result<(), RpcraftError> {
        self.rpc_unit("create_conversation", json!({ "conversation": conversation }))
            .await
    }

    async fn list_conversations(
        &self,
        prompt_id: &str,
        include_archived: bool,
    ) -> Result<Vec<Conversation>, RpcraftError> {
        self.rpc(
            "list_conversations",
            json!({ "prompt_id": prompt_id, "include_archived": include_archived }),
        )
        .await
    }

    async fn get_conversation(&self, id: &str) -> Result<Option<Conversation>, RpcraftError> {
        self.rpc("get_conversation", json!({ "id": id })).await
    }

    async fn rename_conversation(
        &self,
        id: &str,
        name: &str,
        updated_at: &str,
    ) -> Result<(), RpcraftError> {
        self.rpc_unit(
            "rename_conversation",
            json!({ "id": id, "name": name, "updated_at": updated_at }),
        )
        .await
    }

    async fn set_archived(
        &self,
        id: &str,
        archived: bool,
        updated_at: &str,
    ) -> Result<(), RpcraftError> {
        self.rpc_unit(
            "set_conversation_archived",
            json!({ "id": id, "archived": archived, "updated_at": updated_at }),
        )
        .await
    }

    async fn delete_conversation(&self, id: &str) -> Result<(), RpcraftError> {
        self.rpc_unit("delete_conversation", json!({ "id": id })).await
    }

    // --- Messages ---

    async fn list_messages(&self, conversation_id: &str) -> Result<Vec<Message>, RpcraftError> {
        self.rpc("list_messages", json!({ "conversation_id": conversation_id }))
            .await
    }

    async fn find_message(&self, id: &str) -> Result<Option<Message>, RpcraftError> {
        self.rpc("get_message", json!({ "id": id })).await
    }

    async fn append_message(&self, message: &Message) -> Result<(), RpcraftError> {
        self.rpc_unit("append_message", json!({ "message": message })).await
    }

    async fn update_message(
        &self,
        id: &str,
        content: &str,
        updated_at: &str,
    ) -> Result<(), RpcraftError> {
        self.rpc_unit(
            "update_message",
            json!({ "id": id, "content": content, "updated_at": updated_at }),
        )
        .await
    }

    async fn delete_message(&self, id: &str, updated_at: &str) -> Result<(), RpcraftError> {
        self.rpc_unit(
            "delete_message",
            json!({ "id": id, "updated_at": updated_at }),
        )
        .await
    }

    async fn truncate_after(&self, id: &str, updated_at: &str) -> Result<(), RpcraftError> {
        self.rpc_unit(
            "truncate_messages_after",
            json!({ "id": id, "updated_at": updated_at }),
        )
        .await
    }

    // --- Checkpoints ---

    async fn list_checkpoints(
        &self,
        conversation_id: &str,
    ) -> Result<Vec<Checkpoint>, RpcraftError> {
        self.rpc(
            "list_checkpoints",
            json!({ "conversation_id": conversation_id }),
        )
        .await
    }

    async fn find_checkpoint(&self, id: &str) -> Result<Option<Checkpoint>, RpcraftError> {
        self.rpc("get_checkpoint", json!({ "id": id })).await
    }

    async fn create_checkpoint(&self, checkpoint: &Checkpoint) -> Result<(), RpcraftError> {
        self.rpc_unit("create_checkpoint", json!({ "checkpoint": checkpoint }))
            .await
    }

    async fn restore_checkpoint(&self, id: &str, updated_at: &str) -> Result<(), RpcraftError> {
        self.rpc_unit(
            "restore_checkpoint",
            json!({ "id": id, "updated_at": updated_at }),
        )
        .await
    }

    async fn delete_checkpoint(&self, id: &str, updated_at: &str) -> Result<(), RpcraftError> {
        self.rpc_unit(
            "delete_checkpoint",
            json!({ "id": id, "updated_at": updated_at }),
        )
        .await
    }
}
