//! Anthropic `Oracle` implementation, grounded on
//! `caliber-llm/src/providers/anthropic/client.rs`'s rate-limited HTTP
//! client shape (semaphore permit + minimum-interval throttle), narrowed
//! to the single `create` capability spec.md §6 requires of an oracle.

use crate::cancellation::CancellationToken;
use crate::oracle::{Oracle, OracleMessage, OracleResponse, Role};
use async_trait::async_trait;
use caliber_core::OracleError;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Semaphore;

#[derive(Debug, Serialize)]
struct MessageRequest {
    model: String,
    messages: Vec<WireMessage>,
    max_tokens: i32,
    #[serde(skip_serializing_if = "Option::is_none")]
    system: Option<String>,
}

#[derive(Debug, Serialize)]
struct WireMessage {
    role: String,
    content: String,
}

#[derive(Debug, Deserialize)]
struct MessageResponse {
    content: Vec<ContentBlock>,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type")]
enum ContentBlock {
    #[serde(rename = "text")]
    Text { text: String },
    #[serde(other)]
    Other,
}

#[derive(Debug, Deserialize)]
struct ApiError {
    error: ErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ErrorDetail {
    message: String,
}

/// Anthropic Claude oracle with a semaphore-backed request-per-minute cap
/// and a minimum inter-request interval, same shape as the teacher's
/// `AnthropicClient`.
pub struct AnthropicOracle {
    client: Client,
    api_key: String,
    model: String,
    base_url: String,
    max_tokens: i32,
    rate_limiter: Arc<Semaphore>,
    last_request: Arc<AtomicU64>,
    min_request_interval_ms: u64,
    started: Instant,
}

impl AnthropicOracle {
    pub fn new(api_key: impl Into<String>, model: impl Into<String>, requests_per_minute: u32) -> Self {
        let permits = (requests_per_minute as usize).max(1);
        let min_interval_ms = (60_000 / requests_per_minute.max(1) as u64).max(10);
        Self {
            client: Client::new(),
            api_key: api_key.into(),
            model: model.into(),
            base_url: "https://api.anthropic.com/v1".to_string(),
            max_tokens: 1024,
            rate_limiter: Arc::new(Semaphore::new(permits)),
            last_request: Arc::new(AtomicU64::new(0)),
            min_request_interval_ms: min_interval_ms,
            started: Instant::now(),
        }
    }
}

#[async_trait]
impl Oracle for AnthropicOracle {
    async fn create(
        &self,
        messages: &[OracleMessage],
        _json_output_hint: bool,
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

        let system = messages
            .iter()
            .filter(|m| m.role == Role::System)
            .map(|m| m.content.clone())
            .collect::<Vec<_>>()
            .join("\n\n");
        let turns: Vec<WireMessage> = messages
            .iter()
            .filter(|m| m.role == Role::User)
            .map(|m| WireMessage {
                role: "user".to_string(),
                content: m.content.clone(),
            })
            .collect();

        let body = MessageRequest {
            model: self.model.clone(),
            messages: turns,
            max_tokens: self.max_tokens,
            system: if system.is_empty() { None } else { Some(system) },
        };

        let response = self
            .client
            .post(format!("{}/messages", self.base_url))
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", "2023-06-01")
            .header("content-type", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(|e| OracleError::Transport {
                reason: e.to_string(),
            })?;

        let status = response.status();
        if status.is_success() {
            let parsed: MessageResponse = response.json().await.map_err(|e| OracleError::Transport {
                reason: format!("failed to parse response: {e}"),
            })?;
            let text = parsed
                .content
                .into_iter()
                .filter_map(|b| match b {
                    ContentBlock::Text { text } => Some(text),
                    ContentBlock::Other => None,
                })
                .collect::<Vec<_>>()
                .join("");
            Ok(OracleResponse { content: text })
        } else {
            let error_text = response.text().await.unwrap_or_default();
            let reason = serde_json::from_str::<ApiError>(&error_text)
                .map(|e| e.error.message)
                .unwrap_or(error_text);
            match status {
                StatusCode::TOO_MANY_REQUESTS => Err(OracleError::Transport {
                    reason: "rate limited".to_string(),
                }),
                _ => Err(OracleError::Transport { reason }),
            }
        }
    }
}

impl std::fmt::Debug for AnthropicOracle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AnthropicOracle")
            .field("model", &self.model)
            .field("api_key", &"[REDACTED]")
            .finish()
    }
}
