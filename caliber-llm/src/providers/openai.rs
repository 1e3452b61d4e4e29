//! OpenAI (and OpenAI-compatible, e.g. OpenRouter) `Oracle` implementation,
//! grounded on `caliber-llm/src/providers/openai/client.rs`'s rate-limited
//! HTTP client shape, mirroring `AnthropicOracle`'s structure.

use crate::cancellation::CancellationToken;
use crate::oracle::{Oracle, OracleMessage, OracleResponse};
use async_trait::async_trait;
use caliber_core::OracleError;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Semaphore;

#[derive(Debug, Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<WireMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_format: Option<ResponseFormat>,
}

#[derive(Debug, Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    kind: String,
}

#[derive(Debug, Serialize)]
struct WireMessage {
    role: String,
    content: String,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    content: String,
}

#[derive(Debug, Deserialize)]
struct ApiError {
    error: ErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ErrorDetail {
    message: String,
}

/// An OpenAI-compatible oracle. Pass a non-default `base_url` to target
/// OpenRouter or another compatible gateway, mirroring
/// `resolve_model_client`'s OpenRouter fallback in the original source.
pub struct OpenAiOracle {
    client: Client,
    api_key: String,
    model: String,
    base_url: String,
    rate_limiter: Arc<Semaphore>,
    last_request: Arc<AtomicU64>,
    min_request_interval_ms: u64,
    started: Instant,
}

impl OpenAiOracle {
    pub fn new(api_key: impl Into<String>, model: impl Into<String>, requests_per_minute: u32) -> Self {
        Self::with_base_url(api_key, model, requests_per_minute, "https://api.openai.com/v1")
    }

    pub fn with_base_url(
        api_key: impl Into<String>,
        model: impl Into<String>,
        requests_per_minute: u32,
        base_url: impl Into<String>,
    ) -> Self {
        let permits = (requests_per_minute as usize).max(1);
        let min_interval_ms = (60_000 / requests_per_minute.max(1) as u64).max(10);
        Self {
            client: Client::new(),
            api_key: api_key.into(),
            model: model.into(),
            base_url: base_url.into(),
            rate_limiter: Arc::new(Semaphore::new(permits)),
            last_request: Arc::new(AtomicU64::new(0)),
            min_request_interval_ms: min_interval_ms,
            started: Instant::now(),
        }
    }
}

#[async_trait]
impl Oracle for OpenAiOracle {
    async fn create(
        &self,
        messages: &[OracleMessage],
        json_output_hint: bool,
        cancellation_token: Option<&CancellationToken>,
    ) -> Result<OracleResponse, OracleError> {
        let _permit = self
            .rate_limiter
            .acquire()
            .await
            .map_err(|e| OracleError::Transport {
                reason: format!("rate limiter closed: {e}"),
            })?;

        let now_ms = self.started.elapsed().as_millis() as u64;
        let last_ms = self.last_request.load(Ordering::Relaxed);
        let elapsed = now_ms.saturating_sub(last_ms);
        if elapsed < self.min_request_interval_ms {
            tokio::time::sleep(Duration::from_millis(self.min_request_interval_ms - elapsed)).await;
        }
        self.last_request.store(now_ms, Ordering::Relaxed);

        if let Some(token) = cancellation_token {
            if token.is_cancelled() {
                return Err(OracleError::Cancelled);
            }
        }

        let wire_messages = messages
            .iter()
            .map(|m| WireMessage {
                role: match m.role {
                    crate::oracle::Role::System => "system".to_string(),
                    crate::oracle::Role::User => "user".to_string(),
                },
                content: m.content.clone(),
            })
            .collect();

        let body = ChatRequest {
            model: self.model.clone(),
            messages: wire_messages,
            response_format: json_output_hint.then(|| ResponseFormat {
                kind: "json_object".to_string(),
            }),
        };

        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("content-type", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(|e| OracleError::Transport {
                reason: e.to_string(),
            })?;

        let status = response.status();
        if status.is_success() {
            let mut parsed: ChatResponse = response.json().await.map_err(|e| OracleError::Transport {
                reason: format!("failed to parse response: {e}"),
            })?;
            let content = parsed
                .choices
                .drain(..)
                .next()
                .map(|c| c.message.content)
                .unwrap_or_default();
            Ok(OracleResponse { content })
        } else {
            let error_text = response.text().await.unwrap_or_default();
            let reason = serde_json::from_str::<ApiError>(&error_text)
                .map(|e| e.error.message)
                .unwrap_or(error_text);
            Err(OracleError::Transport { reason })
        }
    }
}

impl std::fmt::Debug for OpenAiOracle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenAiOracle")
            .field("model", &self.model)
            .field("base_url", &self.base_url)
            .field("api_key", &"[REDACTED]")
            .finish()
    }
}
